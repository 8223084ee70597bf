//! Sample dataset for the storefront demo.
//!
//! # Responsibility
//! - Build the fixed two-store graph the demo persists and prints.
//!
//! # Invariants
//! - Bread and Cheese are linked to both stores (many-to-many path).
//! - Every employee is assigned to exactly one store.
//! - Stores are returned in save order: "Bargin Basin", then "SuperMart".

use crate::model::entity::{Employee, ModelValidationError, Product, Store};
use crate::model::graph::{AssociationError, EmployeeKey, ProductKey, StoreGraph, StoreKey};
use log::debug;
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures while assembling the sample graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    Validation(ModelValidationError),
    Association(AssociationError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid sample entity: {err}"),
            Self::Association(err) => write!(f, "invalid sample association: {err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Association(err) => Some(err),
        }
    }
}

impl From<ModelValidationError> for SeedError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AssociationError> for SeedError {
    fn from(value: AssociationError) -> Self {
        Self::Association(value)
    }
}

/// Sample graph plus its store keys in save order.
#[derive(Debug, Clone)]
pub struct SampleGraph {
    pub graph: StoreGraph,
    pub stores: Vec<StoreKey>,
}

/// Builds the demo dataset: two stores, six products, five employees.
pub fn build_sample_graph() -> Result<SampleGraph, SeedError> {
    let mut graph = StoreGraph::new();

    let bargin_basin = graph.insert_store(Store::new("Bargin Basin")?);
    let super_mart = graph.insert_store(Store::new("SuperMart")?);

    let potatoes = stock(&mut graph, "Potatoes", 360)?;
    let fish = stock(&mut graph, "Fish", 449)?;
    let milk = stock(&mut graph, "Milk", 79)?;
    let bread = stock(&mut graph, "Bread", 129)?;
    let cheese = stock(&mut graph, "Cheese", 210)?;
    let waffles = stock(&mut graph, "Waffles", 241)?;

    let daisy = hire(&mut graph, "Daisy", "Harrison")?;
    let jack = hire(&mut graph, "Jack", "Torrance")?;
    let sue = hire(&mut graph, "Sue", "Walkters")?;
    let bill = hire(&mut graph, "Bill", "Taft")?;
    let joan = hire(&mut graph, "Joan", "Pope")?;

    graph.add_products_to_store(bargin_basin, &[potatoes, fish, milk, bread, cheese])?;
    graph.add_products_to_store(super_mart, &[bread, cheese, waffles])?;

    graph.add_employees_to_store(bargin_basin, &[daisy, jack, sue])?;
    graph.add_employees_to_store(super_mart, &[bill, joan])?;

    debug!("event=seed_build module=service status=ok stores=2 products=6 employees=5");

    Ok(SampleGraph {
        graph,
        stores: vec![bargin_basin, super_mart],
    })
}

/// `cents` is the price at scale 2, so `360` is `3.60`.
fn stock(graph: &mut StoreGraph, name: &str, cents: i64) -> Result<ProductKey, SeedError> {
    Ok(graph.insert_product(Product::new(name, Decimal::new(cents, 2))?))
}

fn hire(graph: &mut StoreGraph, first: &str, last: &str) -> Result<EmployeeKey, SeedError> {
    Ok(graph.insert_employee(Employee::new(first, last)?))
}
