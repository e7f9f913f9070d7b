//! # envschema-config
//!
//! Turns a nested schema of environment variable references into a
//! configuration tree of the same shape.
//!
//! A schema node is one of:
//! - a string, naming an environment variable (`"DB_HOST"`);
//! - a record `{ env = "DB_PORT", default = 8000 }`;
//! - a mapping of further nodes.
//!
//! A variable that is present wins, even when empty. An absent variable falls
//! back to the default, or to `null` when there is none.

pub mod loader;
pub mod resolver;
pub mod schema;

pub use loader::{EnvLoader, SchemaLoader, load_configuration};
pub use resolver::{Resolved, ResolvedLeaf, resolve};
pub use schema::{SchemaEntry, SchemaNode};
