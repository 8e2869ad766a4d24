//! Sandboxed Lua states for description units.
//!
//! Every description unit runs in its own state opened with the `table`,
//! `string`, `math`, and `utf8` libraries only. There is no `io`, `os`,
//! `package`, or `debug`, and the base functions that reach the filesystem
//! (`dofile`, `loadfile`) are removed, so a unit can only compute values and
//! call the declaration functions registered for it.

use std::fs;
use std::path::Path;

use mlua::prelude::*;
use tracing::info;

/// Base-library functions removed from every state.
const BLOCKED_GLOBALS: &[&str] = &["dofile", "loadfile", "collectgarbage"];

/// Create a new sandboxed Lua state.
///
/// `print` is redirected to the log, tagged with `unit`, so units can still
/// emit diagnostics without writing to the terminal directly.
pub fn create_runtime(unit: &str) -> LuaResult<Lua> {
  let libs = LuaStdLib::TABLE | LuaStdLib::STRING | LuaStdLib::MATH | LuaStdLib::UTF8;
  let lua = Lua::new_with(libs, LuaOptions::default())?;

  let globals = lua.globals();
  for name in BLOCKED_GLOBALS {
    globals.set(*name, LuaValue::Nil)?;
  }

  let unit = unit.to_string();
  let print = lua.create_function(move |_, args: LuaMultiValue| {
    let line = args
      .iter()
      .map(|v| v.to_string().unwrap_or_else(|_| format!("<{}>", v.type_name())))
      .collect::<Vec<_>>()
      .join("\t");
    info!(unit = %unit, "{}", line);
    Ok(())
  })?;
  globals.set("print", print)?;

  Ok(lua)
}

/// Load and execute a description unit with `env` as its global table.
///
/// `env` falls back to the state's globals for reads; writes stay local to
/// the unit.
pub fn load_unit(lua: &Lua, path: &Path, env: LuaTable) -> LuaResult<LuaValue> {
  let content = fs::read_to_string(path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", path.display(), e)))?;

  let mt = lua.create_table()?;
  mt.set("__index", lua.globals())?;
  env.set_metatable(Some(mt))?;

  lua
    .load(&content)
    .set_name(format!("@{}", path.display()))
    .set_environment(env)
    .eval::<LuaValue>()
}
