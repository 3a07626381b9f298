//! # Adapters Module
//!
//! Concrete implementations of the outbound ports.

pub mod memory;
pub mod serializer;

pub use memory::InMemoryLedger;
pub use serializer::JsonCodec;
