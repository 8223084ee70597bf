//! Store use-case service.
//!
//! # Responsibility
//! - Provide save/list entry points for core callers.
//! - Run the seed-then-persist flow of the demo.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::entity::StoreId;
use crate::model::graph::{StoreGraph, StoreKey};
use crate::repo::store_repo::{RepoError, RepoResult, StoreRecord, StoreRepository};
use crate::service::display::render_stores;
use crate::service::seed::{build_sample_graph, SampleGraph, SeedError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// Service error for store use-cases.
#[derive(Debug)]
pub enum StoreServiceError {
    Seed(SeedError),
    Repo(RepoError),
    Render(io::Error),
}

impl Display for StoreServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seed(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "rendering stores failed: {err}"),
        }
    }
}

impl Error for StoreServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Seed(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<SeedError> for StoreServiceError {
    fn from(value: SeedError) -> Self {
        Self::Seed(value)
    }
}

impl From<RepoError> for StoreServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for store persistence.
pub struct StoreService<R: StoreRepository> {
    repo: R,
}

impl<R: StoreRepository> StoreService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves one store and everything reachable from it.
    pub fn save_store(&mut self, graph: &mut StoreGraph, store: StoreKey) -> RepoResult<StoreId> {
        self.repo.save_store(graph, store)
    }

    /// Saves several stores atomically, in order.
    pub fn save_stores(
        &mut self,
        graph: &mut StoreGraph,
        stores: &[StoreKey],
    ) -> RepoResult<Vec<StoreId>> {
        self.repo.save_stores(graph, stores)
    }

    /// Builds the sample dataset and persists both stores in one transaction.
    ///
    /// Returns the graph with database ids assigned.
    pub fn seed_sample_data(&mut self) -> Result<SampleGraph, StoreServiceError> {
        let mut sample = build_sample_graph()?;
        self.repo.save_stores(&mut sample.graph, &sample.stores)?;
        Ok(sample)
    }

    pub fn get_store(&self, id: StoreId) -> RepoResult<Option<StoreRecord>> {
        self.repo.get_store(id)
    }

    pub fn list_stores(&self) -> RepoResult<Vec<StoreRecord>> {
        self.repo.list_stores()
    }

    /// Lists every store and renders it in console layout.
    pub fn stores_report(&self) -> Result<String, StoreServiceError> {
        let stores = self.repo.list_stores()?;
        render_stores(&stores).map_err(StoreServiceError::Render)
    }
}
