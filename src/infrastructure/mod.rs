//! Adapters for the domain ports: HTTP clients and in-memory storage.

pub mod horizon;
pub mod in_memory;
pub mod platform;
