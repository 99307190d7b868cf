//! # Blog Core
//!
//! The domain layer of the blog API.
//! This crate contains the entities, the ports infrastructure must implement,
//! and the services that apply one mutation per request. It has zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
