//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Project description for a small C project: one library, one binary.
pub const PROJECT_LUA: &str = r#"
return {
  plugins = { "c" },
  environment = { arch = "host", cc = "cc", ar = "ar", cflags = { "-O2" } },
}
"#;

pub const LIB_BUILD: &str = r#"
c_library {
  name = "util",
  sources = { "util.c" },
  includes = { "include" },
}
"#;

pub const APP_BUILD: &str = r#"
c_binary {
  name = "app",
  sources = { "main.c" },
  deps = { "//lib/util" },
}
"#;

/// Isolated project tree and build directory.
pub struct TestEnv {
  pub project: TempDir,
  pub build: TempDir,
}

impl TestEnv {
  /// An empty project root and build directory.
  pub fn empty() -> Self {
    Self {
      project: TempDir::new().unwrap(),
      build: TempDir::new().unwrap(),
    }
  }

  /// The library/binary project.
  pub fn c_project() -> Self {
    let env = Self::empty();
    env.write_file("project.lua", PROJECT_LUA);
    env.write_file("lib/util/BUILD.lua", LIB_BUILD);
    env.write_file("app/BUILD.lua", APP_BUILD);
    env
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.project.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.project.path()).unwrap()
  }

  pub fn build_dir(&self) -> &Path {
    self.build.path()
  }

  pub fn ninja_path(&self) -> PathBuf {
    self.build_dir().join("build.ninja")
  }

  pub fn ninja(&self) -> String {
    std::fs::read_to_string(self.ninja_path()).unwrap()
  }

  /// A cobble command running inside the build directory.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("cobble");
    cmd.current_dir(self.build_dir());
    cmd
  }
}
