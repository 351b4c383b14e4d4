//! Core types and trait definitions for the Grove post store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod cache;
pub mod callback;
pub mod change;
pub mod error;
pub mod event;
pub mod group;
pub mod identity;
pub mod location;
pub mod path;
pub mod post;
pub mod readmark;
pub mod store;
pub mod uid;
pub mod version;

pub use error::{Classify, Error, Failure, Result};
