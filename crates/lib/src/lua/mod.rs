//! Lua description-unit runtime.
//!
//! Package description units (`BUILD.lua`) and the project configuration
//! (`project.lua`) are Lua 5.4 scripts evaluated in a sandbox. They may
//! compute values freely but can only affect the build by calling the
//! declaration functions registered for them.
//!
//! # Submodules
//!
//! - [`convert`] - Lua values to typed parameters, deltas, and dependency references
//! - [`globals`] - The declaration API (`c_library{}`, `dep()`, `package`)
//! - [`runtime`] - Sandboxed state creation and unit loading

pub mod convert;
pub mod globals;
pub mod runtime;
