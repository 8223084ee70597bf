//! Store, product and employee entity records.
//!
//! # Responsibility
//! - Define the attribute shape of each persisted entity.
//! - Validate attribute values at construction and after reads.
//!
//! # Invariants
//! - Names are non-blank after trimming.
//! - Product prices are non-negative.
//! - `id` is `None` until the entity has been saved once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Database identifier of a persisted store row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub i64);

/// Database identifier of a persisted product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

/// Database identifier of a persisted employee row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl Display for StoreId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for EmployeeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attribute validation failures for entity records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A required name field is empty or whitespace-only.
    BlankName(&'static str),
    /// Product price is below zero.
    NegativePrice { product: String, price: Decimal },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(field) => write!(f, "{field} must not be blank"),
            Self::NegativePrice { product, price } => {
                write!(f, "price of `{product}` must not be negative, got {price}")
            }
        }
    }
}

impl Error for ModelValidationError {}

/// A retail location selling products and employing staff.
///
/// Association edges are held by `StoreGraph`, not by this record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub(crate) id: Option<StoreId>,
    name: String,
}

impl Store {
    /// Creates an unsaved store.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelValidationError> {
        let store = Self {
            id: None,
            name: name.into(),
        };
        store.validate()?;
        Ok(store)
    }

    pub fn id(&self) -> Option<StoreId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("store name", &self.name)
    }
}

/// A sellable item with a decimal price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub(crate) id: Option<ProductId>,
    name: String,
    price: Decimal,
}

impl Product {
    /// Creates an unsaved product.
    ///
    /// # Errors
    /// - `BlankName` when `name` is blank.
    /// - `NegativePrice` when `price < 0`.
    pub fn new(name: impl Into<String>, price: Decimal) -> Result<Self, ModelValidationError> {
        let product = Self {
            id: None,
            name: name.into(),
            price,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn id(&self) -> Option<ProductId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("product name", &self.name)?;
        validate_price(&self.name, self.price)
    }
}

/// A staff member belonging to at most one store.
///
/// The owning store is tracked by `StoreGraph::employer_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub(crate) id: Option<EmployeeId>,
    first_name: String,
    last_name: String,
}

impl Employee {
    /// Creates an unsaved employee not yet assigned to any store.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, ModelValidationError> {
        let employee = Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
        };
        employee.validate()?;
        Ok(employee)
    }

    pub fn id(&self) -> Option<EmployeeId> {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Returns `"First Last"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("employee first name", &self.first_name)?;
        require_name("employee last name", &self.last_name)
    }
}

pub(crate) fn require_name(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankName(field));
    }
    Ok(())
}

pub(crate) fn validate_price(product: &str, price: Decimal) -> Result<(), ModelValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ModelValidationError::NegativePrice {
            product: product.to_string(),
            price,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Employee, ModelValidationError, Product, Store};
    use rust_decimal::Decimal;

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            Store::new("  ").unwrap_err(),
            ModelValidationError::BlankName("store name")
        );
        assert_eq!(
            Employee::new("Daisy", "").unwrap_err(),
            ModelValidationError::BlankName("employee last name")
        );
    }

    #[test]
    fn negative_price_is_rejected_but_zero_is_allowed() {
        let err = Product::new("Refund", Decimal::new(-1, 2)).unwrap_err();
        assert!(matches!(err, ModelValidationError::NegativePrice { .. }));

        let free = Product::new("Sample", Decimal::ZERO).unwrap();
        assert_eq!(free.price(), Decimal::ZERO);
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let employee = Employee::new("Jack", "Torrance").unwrap();
        assert_eq!(employee.full_name(), "Jack Torrance");
        assert_eq!(employee.id(), None);
    }
}
