//! cobble-lib: build-graph generation for multi-variant projects
//!
//! This crate turns a tree of Lua package descriptions into a Ninja build
//! file:
//! - [`env`]: environments, deltas, and their digests
//! - [`package`]: identifiers, targets, and packages
//! - [`plugin`]: the target-kind contract and the built-in C toolchain
//! - [`load`]: lazy, cached evaluation of description units
//! - [`resolve`]: deduplicated (target, environment) node graph
//! - [`emit`]: Ninja serialization with a self-regeneration edge
//! - [`generate`]: the pipeline tying them together

pub mod consts;
pub mod emit;
pub mod env;
pub mod generate;
pub mod load;
pub mod lua;
pub mod package;
pub mod plugin;
pub mod resolve;
pub mod util;
