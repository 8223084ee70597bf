//! Core domain logic for the storefront demo.
//! This crate is the single source of truth for association invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StorefrontConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::entity::{
    Employee, EmployeeId, ModelValidationError, Product, ProductId, Store, StoreId,
};
pub use model::graph::{
    AssociationError, AssociationResult, EmployeeKey, ProductKey, StoreGraph, StoreKey,
};
pub use repo::store_repo::{
    EmployeeRecord, ProductRecord, RepoError, RepoResult, SqliteStoreRepository, StoreRecord,
    StoreRepository,
};
pub use service::display::{render_stores, write_stores};
pub use service::seed::{build_sample_graph, SampleGraph, SeedError};
pub use service::store_service::{StoreService, StoreServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
