//! Environment algebra.
//!
//! An [`Environment`] is an immutable mapping from parameter name to a typed
//! [`Value`]. Environments are never mutated: every configuration change is a
//! [`Delta`] applied with [`Environment::derive`], producing a new environment.
//!
//! # Identity
//!
//! [`Environment::digest`] fingerprints the full key/value set. Entries are
//! kept in a [`BTreeMap`](std::collections::BTreeMap), so the digest does not
//! depend on insertion order. Before computing a node identity the resolver
//! calls [`Environment::narrow`] with the target kind's sensitivity set, so
//! requests differing only in irrelevant keys collapse onto one node.
//!
//! # Schema
//!
//! The project's default environment defines the [`Schema`]: the set of known
//! parameters and their types. Deltas are checked against it so that a typo
//! in a dependency delta is reported instead of silently creating a variant.

mod environment;
mod value;

pub use environment::*;
pub use value::*;
