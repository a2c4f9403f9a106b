//! Security policy descriptors for embedded app surfaces.
//!
//! A [`SecurityPolicy`] is a declarative pair of origin allow-lists that
//! travels with a resource response. The hosting runtime enforces it when it
//! renders the resource in an isolated frame; nothing in this crate checks
//! requests against it.

mod csp;
mod error;

pub use csp::SecurityPolicy;
pub use error::{Error, Result};
