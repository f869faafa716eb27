//! Gridfall (workspace facade crate).
//!
//! This package keeps the public `gridfall::{core,proto,types}` API in one
//! place while the implementation lives in dedicated crates under `crates/`.

pub use gridfall_core as core;
pub use gridfall_proto as proto;
pub use gridfall_types as types;
