//! # Blog Shared
//!
//! Wire types shared by the API server and its clients.
//! Kept free of domain dependencies so it can be compiled for any client.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
