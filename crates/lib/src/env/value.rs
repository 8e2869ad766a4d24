use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::hash::{Hashable, write_str};

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Bool(bool),
  Int(i64),
  Str(String),
  List(Vec<Value>),
}

/// The variant tag of a [`Value`], used in type checks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
  Bool,
  Int,
  Str,
  List,
}

impl fmt::Display for ValueType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ValueType::Bool => "boolean",
      ValueType::Int => "integer",
      ValueType::Str => "string",
      ValueType::List => "list",
    };
    f.write_str(name)
  }
}

/// Errors raised by the environment algebra and parameter validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
  /// A value's type disagrees with the type already established for the key.
  #[error("parameter '{key}' has type {expected}, got {found}")]
  TypeConflict {
    key: String,
    expected: ValueType,
    found: ValueType,
  },

  /// The key is not part of the project's parameter schema.
  #[error("unknown parameter '{key}'")]
  Unknown { key: String },

  /// A required parameter was not declared.
  #[error("missing required parameter '{key}'")]
  Missing { key: String },

  /// The value cannot be represented as a parameter value.
  #[error("parameter '{key}': {reason}")]
  Unsupported { key: String, reason: String },
}

impl Value {
  pub fn value_type(&self) -> ValueType {
    match self {
      Value::Bool(_) => ValueType::Bool,
      Value::Int(_) => ValueType::Int,
      Value::Str(_) => ValueType::Str,
      Value::List(_) => ValueType::List,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) => Some(items),
      _ => None,
    }
  }

  /// Check that this value has the expected type, naming `key` on failure.
  pub fn expect_type(&self, key: &str, expected: ValueType) -> Result<(), ParameterError> {
    let found = self.value_type();
    if found == expected {
      Ok(())
    } else {
      Err(ParameterError::TypeConflict {
        key: key.to_string(),
        expected,
        found,
      })
    }
  }

  /// Render the value as a list of string items.
  ///
  /// Scalars become a single item; lists are flattened. Used when a
  /// parameter feeds a command line.
  pub fn to_strings(&self) -> Vec<String> {
    match self {
      Value::List(items) => items.iter().flat_map(Value::to_strings).collect(),
      other => vec![other.to_string()],
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Bool(b) => write!(f, "{}", b),
      Value::Int(i) => write!(f, "{}", i),
      Value::Str(s) => f.write_str(s),
      Value::List(_) => f.write_str(&self.to_strings().join(" ")),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Str(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Str(s)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(items: Vec<T>) -> Self {
    Value::List(items.into_iter().map(Into::into).collect())
  }
}

impl Hashable for Value {
  fn write_canonical(&self, out: &mut Vec<u8>) {
    match self {
      Value::Bool(b) => {
        out.push(b'b');
        out.push(if *b { b'1' } else { b'0' });
      }
      Value::Int(i) => {
        out.push(b'i');
        write_str(out, &i.to_string());
      }
      Value::Str(s) => {
        out.push(b's');
        write_str(out, s);
      }
      Value::List(items) => {
        out.push(b'l');
        out.extend_from_slice(items.len().to_string().as_bytes());
        out.push(b'[');
        for item in items {
          item.write_canonical(out);
        }
        out.push(b']');
      }
    }
  }
}
