//! Conversions from Lua values to typed parameters.
//!
//! Declared parameters and deltas accept strings, booleans, integers, and
//! sequences of those. Anything else (floats, functions, userdata, tables
//! with non-sequence keys) is rejected with a [`ParameterError`] naming the
//! parameter.

use mlua::prelude::*;

use crate::env::{Delta, Environment, ParameterError, Value};
use crate::package::{DepRef, Ident};

/// Metatable marker for tables built by `dep()`.
pub const DEP_REF_TYPE: &str = "cobble.dep";

/// Convert a Lua value into a parameter value.
pub fn lua_to_value(key: &str, value: LuaValue) -> Result<Value, ParameterError> {
  let unsupported = |reason: String| ParameterError::Unsupported {
    key: key.to_string(),
    reason,
  };

  match value {
    LuaValue::String(s) => s
      .to_str()
      .map(|s| Value::Str(s.to_string()))
      .map_err(|e| unsupported(e.to_string())),
    LuaValue::Integer(i) => Ok(Value::Int(i)),
    LuaValue::Boolean(b) => Ok(Value::Bool(b)),
    LuaValue::Number(n) => Err(unsupported(format!("floating-point value {} is not supported", n))),
    LuaValue::Table(t) => {
      let len = t.raw_len();
      let mut items = Vec::with_capacity(len);
      for item in t.clone().sequence_values::<LuaValue>() {
        let item = item.map_err(|e| unsupported(e.to_string()))?;
        items.push(lua_to_value(key, item)?);
      }
      let entries = t.pairs::<LuaValue, LuaValue>().count();
      if entries != items.len() {
        return Err(unsupported("tables must be sequences".to_string()));
      }
      Ok(Value::List(items))
    }
    other => Err(unsupported(format!("{} values are not supported", other.type_name()))),
  }
}

/// Convert a `{ key = value }` table into a delta.
pub fn lua_to_delta(table: &LuaTable) -> LuaResult<Delta> {
  let mut delta = Delta::new();
  for pair in table.pairs::<String, LuaValue>() {
    let (key, value) = pair?;
    let value = lua_to_value(&key, value).map_err(LuaError::external)?;
    delta.insert(key, value);
  }
  Ok(delta)
}

/// Convert a `{ key = value }` table into an environment.
pub fn lua_to_environment(table: &LuaTable) -> LuaResult<Environment> {
  let mut values = Vec::new();
  for pair in table.pairs::<String, LuaValue>() {
    let (key, value) = pair?;
    let value = lua_to_value(&key, value).map_err(LuaError::external)?;
    values.push((key, value));
  }
  Ok(values.into_iter().collect())
}

/// Parse one dependency reference.
///
/// Accepts an identifier string (`"//lib:util"`, `":util"`) or a table with
/// a `target` field and an optional `delta` table, as returned by `dep()`.
pub fn lua_to_dep(value: LuaValue, current_package: &str) -> LuaResult<DepRef> {
  match value {
    LuaValue::String(s) => {
      let ident = Ident::parse_relative(&s.to_str()?, current_package).map_err(LuaError::external)?;
      Ok(DepRef::new(ident))
    }
    LuaValue::Table(t) => {
      let target: String = t
        .get::<Option<String>>("target")?
        .ok_or_else(|| LuaError::external("dependency table requires a 'target' field"))?;
      let ident = Ident::parse_relative(&target, current_package).map_err(LuaError::external)?;
      let delta = match t.get::<LuaValue>("delta")? {
        LuaValue::Nil => Delta::new(),
        LuaValue::Table(d) => lua_to_delta(&d)?,
        other => {
          return Err(LuaError::external(format!(
            "dependency delta must be a table, got {}",
            other.type_name()
          )));
        }
      };
      Ok(DepRef::with_delta(ident, delta))
    }
    other => Err(LuaError::external(format!(
      "dependency must be an identifier string or a dep() table, got {}",
      other.type_name()
    ))),
  }
}

/// Parse a `deps` field: a single reference or a sequence of them.
pub fn lua_to_deps(value: LuaValue, current_package: &str) -> LuaResult<Vec<DepRef>> {
  match value {
    LuaValue::Nil => Ok(Vec::new()),
    LuaValue::Table(t) if !is_single_dep(&t)? => {
      let mut deps = Vec::new();
      for item in t.sequence_values::<LuaValue>() {
        deps.push(lua_to_dep(item?, current_package)?);
      }
      Ok(deps)
    }
    single => Ok(vec![lua_to_dep(single, current_package)?]),
  }
}

fn is_single_dep(t: &LuaTable) -> LuaResult<bool> {
  if let Some(mt) = t.metatable()
    && let Ok(type_name) = mt.get::<String>("__type")
  {
    return Ok(type_name == DEP_REF_TYPE);
  }
  t.contains_key("target")
}
