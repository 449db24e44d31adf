//! core
//!
//! Domain types, projection models, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Token, Oid
//! - [`model`] - Flat projection records served to the transport layer
//! - [`config`] - Store configuration schema and loading

pub mod config;
pub mod model;
pub mod types;
