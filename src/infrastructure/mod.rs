//! # Infrastructure Layer
//!
//! Concrete adapters for the external services.
//! Implements the traits defined in the Domain layer (TimelineSource, NoticeSink).

pub mod matrix;
pub mod twitter;
