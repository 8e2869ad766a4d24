use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::util::hash::{Fingerprint, Hashable, write_str};

use super::value::{ParameterError, Value, ValueType};

/// An immutable parameter mapping describing one build variant.
///
/// Equality compares the full key/value set; construction order is
/// irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
  values: BTreeMap<String, Value>,
}

/// A partial environment override applied when traversing a dependency edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
  values: BTreeMap<String, Value>,
}

impl Environment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Get a string parameter. Absent keys yield `Ok(None)`.
  pub fn get_str(&self, key: &str) -> Result<Option<&str>, ParameterError> {
    self.typed(key, ValueType::Str, Value::as_str)
  }

  pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ParameterError> {
    self.typed(key, ValueType::Bool, Value::as_bool)
  }

  pub fn get_int(&self, key: &str) -> Result<Option<i64>, ParameterError> {
    self.typed(key, ValueType::Int, Value::as_int)
  }

  pub fn get_list(&self, key: &str) -> Result<Option<&[Value]>, ParameterError> {
    self.typed(key, ValueType::List, Value::as_list)
  }

  fn typed<'a, T>(
    &'a self,
    key: &str,
    expected: ValueType,
    access: impl FnOnce(&'a Value) -> Option<T>,
  ) -> Result<Option<T>, ParameterError> {
    match self.values.get(key) {
      None => Ok(None),
      Some(value) => match access(value) {
        Some(v) => Ok(Some(v)),
        None => Err(ParameterError::TypeConflict {
          key: key.to_string(),
          expected,
          found: value.value_type(),
        }),
      },
    }
  }

  /// Apply `delta` over this environment.
  ///
  /// Keys in `delta` replace the base value; every other key is inherited.
  /// A delta value whose type differs from the existing value's type is a
  /// [`ParameterError::TypeConflict`].
  pub fn derive(&self, delta: &Delta) -> Result<Environment, ParameterError> {
    let mut values = self.values.clone();
    for (key, value) in &delta.values {
      if let Some(existing) = values.get(key) {
        value.expect_type(key, existing.value_type())?;
      }
      values.insert(key.clone(), value.clone());
    }
    Ok(Environment { values })
  }

  /// Project this environment onto `keys`. Keys not present are skipped.
  pub fn narrow<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Environment {
    let values = keys
      .into_iter()
      .filter_map(|k| self.values.get(k).map(|v| (k.to_string(), v.clone())))
      .collect();
    Environment { values }
  }

  /// Every key of this environment as a delta, for overlaying it onto
  /// another environment.
  pub fn to_delta(&self) -> Delta {
    Delta {
      values: self.values.clone(),
    }
  }

  /// Canonical fingerprint of the full key/value set.
  pub fn digest(&self) -> Fingerprint {
    self.fingerprint()
  }
}

impl FromIterator<(String, Value)> for Environment {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Environment {
      values: iter.into_iter().collect(),
    }
  }
}

impl Hashable for Environment {
  fn write_canonical(&self, out: &mut Vec<u8>) {
    out.extend_from_slice(self.values.len().to_string().as_bytes());
    out.push(b'{');
    for (key, value) in &self.values {
      write_str(out, key);
      value.write_canonical(out);
    }
    out.push(b'}');
  }
}

impl Delta {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert.
  pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.values.insert(key.into(), value.into());
    self
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    self.values.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Compose two deltas; keys in `inner` win over keys in `self`.
  ///
  /// `env.derive(&a.then(&b))` equals `env.derive(&a)?.derive(&b)` whenever
  /// both succeed.
  pub fn then(&self, inner: &Delta) -> Delta {
    let mut values = self.values.clone();
    values.extend(inner.values.iter().map(|(k, v)| (k.clone(), v.clone())));
    Delta { values }
  }
}

impl FromIterator<(String, Value)> for Delta {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Delta {
      values: iter.into_iter().collect(),
    }
  }
}

/// The known parameters of a project and their types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
  types: BTreeMap<String, ValueType>,
}

impl Schema {
  /// Derive the schema from the project's default environment.
  pub fn from_environment(env: &Environment) -> Self {
    Schema {
      types: env.iter().map(|(k, v)| (k.to_string(), v.value_type())).collect(),
    }
  }

  pub fn type_of(&self, key: &str) -> Option<ValueType> {
    self.types.get(key).copied()
  }

  /// Check every key of `delta` is known and carries the declared type.
  pub fn check(&self, delta: &Delta) -> Result<(), ParameterError> {
    for (key, value) in delta.iter() {
      let expected = self
        .type_of(key)
        .ok_or_else(|| ParameterError::Unknown { key: key.to_string() })?;
      value.expect_type(key, expected)?;
    }
    Ok(())
  }
}
