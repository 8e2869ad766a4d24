//! The two-application, one-library scenario.
//!
//! `//lib` is sensitive to `arch` (default `host`). `//app1` requests it
//! with `arch = "arm"`, `//app2` with `arch = "host"`.

use super::common::{TestProject, product_edges, regen_edges};

fn scenario() -> TestProject {
  TestProject::new(r#"return { plugins = {}, environment = { arch = "host" } }"#)
    .package("lib", r#"toy_lib { name = "lib" }"#)
    .package("app1", r#"toy_app { name = "app1", deps = { dep("//lib", { arch = "arm" }) } }"#)
    .package("app2", r#"toy_app { name = "app2", deps = { dep("//lib", { arch = "host" }) } }"#)
}

#[test]
fn two_library_variants_four_edges() {
  let project = scenario();
  let report = project.generate(&[]).unwrap();
  let ninja = project.ninja().unwrap();

  assert_eq!(report.nodes, 4);
  assert_eq!(product_edges(&ninja).len(), 4);
  assert_eq!(regen_edges(&ninja).len(), 1);

  let lib_edges: Vec<_> = product_edges(&ninja)
    .into_iter()
    .filter(|l| l.contains("/lib/lib/out.txt:"))
    .collect();
  assert_eq!(lib_edges.len(), 2);
  assert_ne!(lib_edges[0], lib_edges[1]);
}

#[test]
fn each_app_links_its_own_variant() {
  let project = scenario();
  project.generate(&[]).unwrap();
  let ninja = project.ninja().unwrap();

  let edge_of = |app: &str| -> String {
    product_edges(&ninja)
      .into_iter()
      .find(|l| l.contains(&format!("/{app}/{app}/out.txt:")))
      .unwrap()
      .to_string()
  };
  let input_of = |edge: &str| edge.rsplit(' ').next().unwrap().to_string();

  let app1 = input_of(&edge_of("app1"));
  let app2 = input_of(&edge_of("app2"));
  assert!(app1.ends_with("/lib/@lib/out.txt"));
  assert!(app2.ends_with("/lib/@lib/out.txt"));
  assert_ne!(app1, app2);

  // The variable block records which arch each library variant builds for.
  assert!(ninja.contains(&format!("build {app1}: toy\n  arch = arm\n")));
  assert!(ninja.contains(&format!("build {app2}: toy\n  arch = host\n")));
}

#[test]
fn rerun_is_byte_identical() {
  let project = scenario();
  project.generate(&[]).unwrap();
  let first = project.ninja().unwrap();
  project.generate(&[]).unwrap();
  assert_eq!(first, project.ninja().unwrap());
}

#[test]
fn default_variant_is_shared_with_direct_requests() {
  let project = scenario();
  let report = project.generate(&["//app2", "//lib"]).unwrap();
  // app2 asks for arch=host, which is the default `//lib` is seeded with.
  assert_eq!(report.nodes, 2);
}
