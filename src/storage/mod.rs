//! Document Storage Module
//!
//! Process-local document collections shared by the account directory, the
//! event catalogue, and the chat room repository.
//!
//! ## Core Concepts
//! - **`DocumentStore`**: a concurrent keyed collection of cloneable documents.
//!   Reads return snapshots; single-key updates are atomic.
//! - **Seeding**: an optional JSON file loaded once at startup.

pub mod memory;
pub mod seed;
