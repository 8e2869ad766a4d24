//! Project configuration (`project.lua`).
//!
//! ```lua
//! return {
//!   plugins = { "c" },
//!   environment = {
//!     arch = "host",
//!     cc = "cc",
//!     ar = "ar",
//!     cflags = { "-O2" },
//!   },
//! }
//! ```
//!
//! `environment` is the default environment every top-level request starts
//! from; its keys and value types form the project's parameter schema.
//! `plugins` selects built-in plugins and defaults to all of them.

use std::path::Path;

use mlua::prelude::*;

use crate::env::{Environment, Schema};
use crate::lua::convert::lua_to_environment;
use crate::lua::runtime;
use crate::plugin::BUILTIN_PLUGINS;

const KNOWN_FIELDS: &[&str] = &["plugins", "environment"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
  pub plugins: Vec<String>,
  pub environment: Environment,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      plugins: BUILTIN_PLUGINS.iter().map(|p| p.to_string()).collect(),
      environment: Environment::new(),
    }
  }
}

impl ProjectConfig {
  pub fn schema(&self) -> Schema {
    Schema::from_environment(&self.environment)
  }

  /// Evaluate a `project.lua` file.
  pub fn from_file(path: &Path) -> LuaResult<Self> {
    let lua = runtime::create_runtime("project")?;
    let env = lua.create_table()?;
    let result = runtime::load_unit(&lua, path, env)?;

    let LuaValue::Table(table) = result else {
      return Err(LuaError::external("project.lua must return a table"));
    };

    for pair in table.pairs::<String, LuaValue>() {
      let (key, _) = pair?;
      if !KNOWN_FIELDS.contains(&key.as_str()) {
        return Err(LuaError::external(format!(
          "unknown field '{}' in project.lua (expected one of: {})",
          key,
          KNOWN_FIELDS.join(", ")
        )));
      }
    }

    let mut config = ProjectConfig::default();

    match table.get::<LuaValue>("plugins")? {
      LuaValue::Nil => {}
      LuaValue::Table(plugins) => {
        config.plugins = plugins
          .sequence_values::<String>()
          .collect::<LuaResult<Vec<_>>>()?;
      }
      other => {
        return Err(LuaError::external(format!(
          "'plugins' must be a list of names, got {}",
          other.type_name()
        )));
      }
    }

    match table.get::<LuaValue>("environment")? {
      LuaValue::Nil => {}
      LuaValue::Table(env) => config.environment = lua_to_environment(&env)?,
      other => {
        return Err(LuaError::external(format!(
          "'environment' must be a table, got {}",
          other.type_name()
        )));
      }
    }

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::env::{Value, ValueType};
  use std::fs;
  use tempfile::TempDir;

  fn write(content: &str) -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("project.lua");
    fs::write(&path, content).unwrap();
    (temp, path)
  }

  #[test]
  fn parses_plugins_and_environment() -> LuaResult<()> {
    let (_temp, path) = write(
      r#"
        return {
          plugins = { "c" },
          environment = { arch = "host", opt = 2, cflags = { "-O2" } },
        }
      "#,
    );
    let config = ProjectConfig::from_file(&path)?;

    assert_eq!(config.plugins, vec!["c"]);
    assert_eq!(config.environment.get("arch"), Some(&Value::from("host")));
    assert_eq!(config.schema().type_of("opt"), Some(ValueType::Int));
    assert_eq!(config.schema().type_of("cflags"), Some(ValueType::List));
    Ok(())
  }

  #[test]
  fn empty_table_uses_defaults() -> LuaResult<()> {
    let (_temp, path) = write("return {}");
    assert_eq!(ProjectConfig::from_file(&path)?, ProjectConfig::default());
    Ok(())
  }

  #[test]
  fn unknown_field_is_rejected() {
    let (_temp, path) = write("return { enviroment = {} }");
    let err = ProjectConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("unknown field 'enviroment'"), "{}", err);
  }

  #[test]
  fn non_table_result_is_rejected() {
    let (_temp, path) = write("return 42");
    assert!(ProjectConfig::from_file(&path).is_err());
  }
}
