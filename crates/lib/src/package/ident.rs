//! Target identifiers.
//!
//! Identifiers look like `//foo/bar:quux`, where `foo/bar` is the path from
//! the project root to the directory holding the `BUILD.lua` file and `quux`
//! is a target within it. When the target name equals the last path
//! component it may be omitted: `//foo/bar` names `//foo/bar:bar`.
//!
//! Inside a description unit, `:quux` refers to a target of the current
//! package. Only [`Ident::parse_relative`] accepts that form, since it needs
//! the current package path.
//!
//! Package path segments may not start with `@`; that prefix marks target
//! directories in the output tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::TARGET_DIR_MARKER;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentError {
  #[error("bad identifier '{0}': must start with '//' or ':'")]
  NotAbsolute(String),

  #[error("bad identifier '{0}': too many colons")]
  TooManyColons(String),

  #[error("bad identifier '{0}': empty target name")]
  EmptyName(String),

  #[error("bad identifier '{0}': invalid package path")]
  InvalidPackagePath(String),
}

/// A fully-qualified target identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ident {
  package: String,
  name: String,
}

impl Ident {
  /// Assemble an identifier from a package path and target name.
  pub fn new(package: impl Into<String>, name: impl Into<String>) -> Result<Self, IdentError> {
    let package = package.into();
    let name = name.into();
    if !is_valid_package_path(&package) {
      return Err(IdentError::InvalidPackagePath(format!("//{}:{}", package, name)));
    }
    if !is_valid_name(&name) {
      return Err(IdentError::EmptyName(format!("//{}:{}", package, name)));
    }
    Ok(Ident { package, name })
  }

  /// Parse an absolute identifier (`//pkg:name` or `//pkg`).
  pub fn parse(s: &str) -> Result<Self, IdentError> {
    let rest = s
      .strip_prefix("//")
      .ok_or_else(|| IdentError::NotAbsolute(s.to_string()))?;
    let mut parts = rest.split(':');
    let package = parts.next().unwrap_or_default();
    let name = parts.next();
    if parts.next().is_some() {
      return Err(IdentError::TooManyColons(s.to_string()));
    }
    if !is_valid_package_path(package) {
      return Err(IdentError::InvalidPackagePath(s.to_string()));
    }

    let name = match name {
      Some(n) => n,
      None => package.rsplit('/').next().unwrap_or_default(),
    };
    if !is_valid_name(name) {
      return Err(IdentError::EmptyName(s.to_string()));
    }

    Ok(Ident {
      package: package.to_string(),
      name: name.to_string(),
    })
  }

  /// Parse an identifier that may be relative (`:name`) to `current_package`.
  pub fn parse_relative(s: &str, current_package: &str) -> Result<Self, IdentError> {
    match s.strip_prefix(':') {
      Some(name) => {
        if name.contains(':') {
          return Err(IdentError::TooManyColons(s.to_string()));
        }
        if !is_valid_name(name) {
          return Err(IdentError::EmptyName(s.to_string()));
        }
        Ok(Ident {
          package: current_package.to_string(),
          name: name.to_string(),
        })
      }
      None => Ident::parse(s),
    }
  }

  /// Path of the owning package, relative to the project root.
  pub fn package(&self) -> &str {
    &self.package
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl fmt::Display for Ident {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "//{}:{}", self.package, self.name)
  }
}

/// Package paths are `/`-separated, relative, and free of `.`/`..` components.
/// The root package is the empty path.
pub(crate) fn is_valid_package_path(path: &str) -> bool {
  path.is_empty()
    || path.split('/').all(|c| {
      !c.is_empty()
        && c != "."
        && c != ".."
        && !c.starts_with(TARGET_DIR_MARKER)
        && !c.chars().any(char::is_whitespace)
    })
}

fn is_valid_name(name: &str) -> bool {
  !name.is_empty() && !name.contains(['/', ':']) && !name.chars().any(char::is_whitespace)
}
