//! Tests for `cobble init`.

use predicates::prelude::*;

use super::common::TestEnv;

mod generation {
  use super::*;

  #[test]
  fn writes_build_file_and_launcher() {
    let env = TestEnv::c_project();
    env
      .cmd()
      .arg("init")
      .arg(env.root())
      .assert()
      .success()
      .stdout(predicate::str::contains("Nodes: 2"));

    let ninja = env.ninja();
    assert!(ninja.contains("rule cc\n"));
    assert!(ninja.contains("rule ar\n"));
    assert!(ninja.contains("rule link\n"));
    assert!(ninja.contains("libutil.a"));
    assert!(ninja.contains("rule cobble_regen\n"));

    let launcher = env.build_dir().join("cobble");
    assert!(std::fs::symlink_metadata(&launcher).is_ok());
  }

  #[cfg(unix)]
  #[test]
  fn launcher_is_a_symlink() {
    let env = TestEnv::c_project();
    env.cmd().arg("init").arg(env.root()).assert().success();

    let meta = std::fs::symlink_metadata(env.build_dir().join("cobble")).unwrap();
    assert!(meta.file_type().is_symlink());
  }

  #[test]
  fn explicit_build_dir() {
    let env = TestEnv::c_project();
    let out = env.build_dir().join("nested/out");
    env
      .cmd()
      .arg("init")
      .arg(env.root())
      .arg("--build-dir")
      .arg(&out)
      .assert()
      .success();
    assert!(out.join("build.ninja").is_file());
  }

  #[test]
  fn targets_are_recorded_in_regeneration_command() {
    let env = TestEnv::c_project();
    env
      .cmd()
      .args(["init", "--target", "//lib/util"])
      .arg(env.root())
      .assert()
      .success()
      .stdout(predicate::str::contains("Nodes: 1"));

    let ninja = env.ninja();
    assert!(ninja.contains("--target //lib/util"));
    assert!(!ninja.contains("rule link\n"), "only referenced rules are declared");
  }

  #[test]
  fn rerun_with_force_is_byte_identical() {
    let env = TestEnv::c_project();
    env.cmd().arg("init").arg(env.root()).assert().success();
    let first = env.ninja();
    env.cmd().args(["init", "--force"]).arg(env.root()).assert().success();
    assert_eq!(first, env.ninja());
  }
}

mod refusals {
  use super::*;

  #[test]
  fn missing_root() {
    let env = TestEnv::empty();
    env
      .cmd()
      .args(["init", "/nonexistent/cobble-project"])
      .assert()
      .failure()
      .stderr(predicate::str::contains("does not exist"));
    assert!(!env.ninja_path().exists());
  }

  #[test]
  fn build_dir_equals_root() {
    let env = TestEnv::c_project();
    env
      .cmd()
      .arg("init")
      .arg(env.root())
      .arg("--build-dir")
      .arg(env.root())
      .assert()
      .failure()
      .stderr(predicate::str::contains("must differ"));
    assert!(!env.root().join("build.ninja").exists());
  }

  #[test]
  fn existing_output_without_force() {
    let env = TestEnv::c_project();
    std::fs::write(env.ninja_path(), "# keep me\n").unwrap();

    env
      .cmd()
      .arg("init")
      .arg(env.root())
      .assert()
      .failure()
      .stderr(predicate::str::contains("--force"));
    assert_eq!(env.ninja(), "# keep me\n");

    env.cmd().args(["init", "--force"]).arg(env.root()).assert().success();
    assert_ne!(env.ninja(), "# keep me\n");
  }

  #[test]
  fn dependency_cycle() {
    let env = TestEnv::c_project();
    env.write_file(
      "loop/BUILD.lua",
      r#"
        c_library { name = "a", sources = { "a.c" }, deps = { ":b" } }
        c_library { name = "b", sources = { "b.c" }, deps = { ":a" } }
      "#,
    );
    env
      .cmd()
      .arg("init")
      .arg(env.root())
      .assert()
      .code(1)
      .stderr(predicate::str::contains("dependency cycle"));
    assert!(!env.ninja_path().exists());
  }

  #[test]
  fn broken_description_names_package() {
    let env = TestEnv::c_project();
    env.write_file("bad/BUILD.lua", "c_library {");
    env
      .cmd()
      .arg("init")
      .arg(env.root())
      .assert()
      .failure()
      .stderr(predicate::str::contains("//bad"));
  }

  #[cfg(unix)]
  #[test]
  fn launcher_failure_leaves_no_build_file() {
    let env = TestEnv::c_project();
    let blocker = env.build_dir().join("cobble");
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("keep"), "").unwrap();

    env
      .cmd()
      .args(["init", "--force"])
      .arg(env.root())
      .assert()
      .failure()
      .stderr(predicate::str::contains("Failed to remove"));
    assert!(!env.ninja_path().exists());
  }
}
