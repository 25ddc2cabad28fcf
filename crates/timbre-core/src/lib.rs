//! Core domain model for timbre.
//!
//! This crate defines the song catalog, the embedding and search types
//! shared by every other crate, and the resolver that turns a user-facing
//! selection into a catalog record.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod selection;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use selection::{Seed, Selection, UploadedClip};
