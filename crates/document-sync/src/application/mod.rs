//! # Application Module
//!
//! The document client orchestrating the domain, algorithms and outbound ports.

pub mod service;

pub use service::DocumentClient;
