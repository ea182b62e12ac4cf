//! Core traits, types, and error handling for phab-tools.
//!
//! This crate provides the foundational abstractions used across all
//! phab-tools components: the domain types fetched from Phabricator, the
//! error taxonomy, configuration with credential resolution, and the
//! [`Conduit`] trait the tool layer programs against.

pub mod conduit;
pub mod config;
pub mod error;
pub mod types;

pub use conduit::Conduit;
pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use types::{CommentKind, RawComment, Revision, Task};
