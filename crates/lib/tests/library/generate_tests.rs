//! Pipeline-level guarantees: determinism, failure atomicity, regeneration.

use cobble_lib::generate::GenerateError;
use cobble_lib::resolve::ResolveError;
use tracing_test::traced_test;

use super::common::{TestProject, product_edges, regen_edges};

const PROJECT: &str = r#"return { plugins = {}, environment = { arch = "host" } }"#;

mod determinism {
  use super::*;

  #[test]
  fn separate_projects_render_identically_modulo_root() {
    let make = || {
      TestProject::new(PROJECT)
        .package("z", r#"toy_lib { name = "z" }"#)
        .package("a", r#"toy_app { name = "a", deps = { "//z" } }"#)
        .package("m", r#"toy_app { name = "m", deps = { "//z", "//a" } }"#)
    };
    let (one, two) = (make(), make());
    one.generate(&[]).unwrap();
    two.generate(&[]).unwrap();

    let normalize = |p: &TestProject| {
      let root = dunce::canonicalize(p.root()).unwrap();
      p.ninja().unwrap().replace(root.to_string_lossy().as_ref(), "<root>")
    };
    assert_eq!(normalize(&one), normalize(&two));
  }

  #[test]
  fn edges_are_sorted_by_node_identity() {
    let project = TestProject::new(PROJECT)
      .package("b", r#"toy_lib { name = "b" }"#)
      .package("a", r#"toy_lib { name = "a" }"#);
    project.generate(&["//b", "//a"]).unwrap();
    let ninja = project.ninja().unwrap();

    let a = ninja.find("# //a:a@").unwrap();
    let b = ninja.find("# //b:b@").unwrap();
    assert!(a < b);
  }
}

mod failures {
  use super::*;

  #[test]
  fn cycle_writes_nothing() {
    let project = TestProject::new(PROJECT)
      .package("a", r#"toy_lib { name = "a", deps = { "//b" } }"#)
      .package("b", r#"toy_lib { name = "b", deps = { "//a" } }"#);

    let err = project.generate(&[]).unwrap_err();
    assert!(matches!(err, GenerateError::Resolve(ResolveError::Cycle { .. })));
    assert!(project.ninja().is_none());
  }

  #[test]
  fn collision_writes_nothing() {
    let project = TestProject::new(PROJECT)
      .package("a", r#"toy_file { name = "a", out = "gen/out.txt" }"#)
      .package("b", r#"toy_file { name = "b", out = "gen/out.txt" }"#);

    let err = project.generate(&[]).unwrap_err();
    let GenerateError::Resolve(ResolveError::Collision { path, first, second }) = &err else {
      panic!("expected collision, got {err}");
    };
    assert_eq!(path, "gen/out.txt");
    assert_eq!(first.target.to_string(), "//a:a");
    assert_eq!(second.target.to_string(), "//b:b");
    assert!(project.ninja().is_none());
  }

  #[test]
  fn load_error_names_package() {
    let project = TestProject::new(PROJECT).package("bad/pkg", "toy_lib { name = 3 ");
    let err = project.generate(&[]).unwrap_err();
    assert!(err.to_string().contains("//bad/pkg"), "{err}");
  }

  #[test]
  fn missing_required_parameter() {
    let project = TestProject::new(PROJECT).package("f", r#"toy_file { name = "f" }"#);
    let err = project.generate(&[]).unwrap_err();
    assert!(err.to_string().contains("'out'"), "{err}");
  }
}

mod regeneration {
  use super::*;

  #[test]
  fn single_edge_over_loaded_description_files() {
    let project = TestProject::new(PROJECT)
      .package("lib", r#"toy_lib { name = "lib" }"#)
      .package("app", r#"toy_app { name = "app", deps = { "//lib" } }"#)
      .package("unused", r#"toy_lib { name = "unused" }"#);
    project.generate(&["//app"]).unwrap();
    let ninja = project.ninja().unwrap();

    let edges = regen_edges(&ninja);
    assert_eq!(edges.len(), 1);
    let edge = edges[0];
    assert!(edge.contains("project.lua"));
    assert!(edge.contains("app/BUILD.lua"));
    assert!(edge.contains("lib/BUILD.lua"));
    assert!(!edge.contains("unused/BUILD.lua"));
    assert_eq!(product_edges(&ninja).len(), 2);
  }

  #[test]
  fn command_reinvokes_init_with_requested_targets() {
    let project = TestProject::new(PROJECT).package("app", r#"toy_app { name = "app" }"#);
    project.generate(&["//app"]).unwrap();
    let ninja = project.ninja().unwrap();

    let command = ninja
      .lines()
      .skip_while(|l| *l != "rule cobble_regen")
      .nth(1)
      .unwrap();
    assert!(command.starts_with("  command = ./cobble init --force "));
    assert!(command.ends_with(" --target //app"));
  }
}

mod logging {
  use super::*;

  #[test]
  #[traced_test]
  fn package_loads_are_logged() {
    let project = TestProject::new(PROJECT).package("lib", r#"toy_lib { name = "lib" }"#);
    project.generate(&[]).unwrap();
    assert!(logs_contain("evaluating package"));
    assert!(logs_contain("graph resolved"));
  }
}
