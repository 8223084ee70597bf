//! In-memory domain model for stores, products and employees.
//!
//! # Responsibility
//! - Define the entity records persisted by the repository layer.
//! - Own the association rules between stores, products and employees.
//!
//! # Invariants
//! - Entities live in a `StoreGraph` arena and reference each other by key.
//! - Store→product and store→employee edges can only change through
//!   `StoreGraph` methods, so both sides of every link stay consistent.
//! - Database identifiers are assigned by persistence, never by callers.

pub mod entity;
pub mod graph;
