//! Tests for `cobble check`.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn reports_counts_and_writes_nothing() {
  let env = TestEnv::c_project();
  env
    .cmd()
    .arg("check")
    .arg(env.root())
    .assert()
    .success()
    .stdout(predicate::str::contains("Nodes: 2"))
    .stdout(predicate::str::contains("Build edges: 4"));

  assert!(std::fs::read_dir(env.build_dir()).unwrap().next().is_none());
}

#[test]
fn json_output() {
  let env = TestEnv::c_project();
  let output = env
    .cmd()
    .args(["check", "--output", "json"])
    .arg(env.root())
    .output()
    .unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["nodes"], 2);
  assert_eq!(report["products"], 4);
  assert!(report["output"].is_null());
}

#[test]
fn unknown_delta_parameter_fails() {
  let env = TestEnv::c_project();
  env.write_file(
    "tool/BUILD.lua",
    r#"c_binary { name = "tool", sources = { "t.c" }, deps = { dep("//lib/util", { acrh = "arm" }) } }"#,
  );
  env
    .cmd()
    .arg("check")
    .arg(env.root())
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown parameter 'acrh'"));
}
