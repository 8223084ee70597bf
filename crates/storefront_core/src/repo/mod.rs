//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the save/query contract consumed by services.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Saves cascade from a store to its products and employees explicitly.
//! - Each save call is one transaction; ids reach the graph only after commit.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod store_repo;
