//! Declaration API exposed to description units.
//!
//! A unit's global table contains:
//! - one constructor per registered target kind, e.g. `c_library { ... }`,
//!   returning the new target's identifier string
//! - `dep(ref, delta)` - a dependency reference carrying a delta
//! - `package` - `{ path = ..., root = ... }` describing the current package
//!
//! Constructors write into the [`Package`] under construction, which is the
//! only state a unit can affect.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use mlua::prelude::*;

use super::convert::{DEP_REF_TYPE, lua_to_deps, lua_to_delta, lua_to_value};
use crate::package::{Ident, Package, Params, Target};

/// The explicit context of one description unit.
#[derive(Debug, Clone)]
pub struct PackageCtx {
  /// Package path relative to the project root.
  pub path: String,
  /// Absolute project root.
  pub root: PathBuf,
}

/// Register the declaration API into `env`.
pub fn register_declarations<'k>(
  lua: &Lua,
  env: &LuaTable,
  ctx: &PackageCtx,
  kinds: impl IntoIterator<Item = &'k str>,
  package: Rc<RefCell<Package>>,
) -> LuaResult<()> {
  for kind in kinds {
    let constructor = create_constructor(lua, kind, ctx.path.clone(), package.clone())?;
    env.set(kind, constructor)?;
  }

  env.set("dep", create_dep(lua)?)?;

  let info = lua.create_table()?;
  info.set("path", ctx.path.as_str())?;
  info.set("root", ctx.root.to_string_lossy().as_ref())?;
  env.set("package", info)?;

  Ok(())
}

fn create_constructor(lua: &Lua, kind: &str, path: String, package: Rc<RefCell<Package>>) -> LuaResult<LuaFunction> {
  let kind = kind.to_string();
  lua.create_function(move |_, spec: LuaTable| {
    let name: String = spec
      .get::<Option<String>>("name")?
      .ok_or_else(|| LuaError::external(format!("{} requires a 'name' field", kind)))?;
    let ident = Ident::new(path.clone(), name).map_err(LuaError::external)?;

    let mut params = Params::new();
    let mut deps = Vec::new();
    for pair in spec.pairs::<String, LuaValue>() {
      let (key, value) = pair?;
      match key.as_str() {
        "name" => {}
        "deps" => deps = lua_to_deps(value, &path)?,
        _ => {
          let value = lua_to_value(&key, value).map_err(LuaError::external)?;
          params.insert(key, value);
        }
      }
    }

    let id = ident.to_string();
    package
      .borrow_mut()
      .add_target(Target::new(ident, kind.clone(), params, deps))
      .map_err(LuaError::external)?;
    Ok(id)
  })
}

fn create_dep(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_function(|lua, (target, delta): (String, Option<LuaTable>)| {
    let table = lua.create_table()?;
    table.set("target", target)?;
    if let Some(delta) = delta {
      // Validate eagerly so the error points at the dep() call.
      lua_to_delta(&delta)?;
      table.set("delta", delta)?;
    }

    let mt = lua.create_table()?;
    mt.set("__type", DEP_REF_TYPE)?;
    table.set_metatable(Some(mt))?;
    Ok(table)
  })
}
