//! # Progcom Common Library
//!
//! Shared code for the progcom crates including:
//! - Wire types for the CfP service (proposals, speakers, reviews, rooms, ...)
//! - Localized display strings
//! - Reference/record expansion markers
//! - Configuration loading
//! - The shared error type

pub mod config;
pub mod error;
pub mod expand;
pub mod localized;
pub mod types;

pub use error::{Error, Result};
pub use expand::Expandable;
pub use localized::LocalizedString;
