//! Well-known file names and sizes shared across the crate.

/// File name of a package description unit.
pub const BUILD_FILE_NAME: &str = "BUILD.lua";

/// File name of the project configuration at the project root.
pub const PROJECT_FILE_NAME: &str = "project.lua";

/// File name of the emitted executor build file.
pub const NINJA_FILE_NAME: &str = "build.ninja";

/// Name of the launcher placed in every build directory.
pub const LAUNCHER_NAME: &str = "cobble";

/// Top-level output directory inside the build directory. Each environment
/// variant gets `env/<digest>/` below it.
pub const ENV_OUT_DIR: &str = "env";

/// Prefix of the per-target directory below a package's output directory.
/// Package path segments may not start with it, so the first marked
/// segment always ends the package path.
pub const TARGET_DIR_MARKER: char = '@';

/// Number of hex characters kept from an environment digest.
pub const DIGEST_LEN: usize = 16;

/// Name of the rule used by the regeneration edge.
pub const REGEN_RULE_NAME: &str = "cobble_regen";
