//! Arena-backed entity graph and association rules.
//!
//! # Responsibility
//! - Own every in-memory store, product and employee of one unit of work.
//! - Maintain store↔product (many-to-many) and store↔employee (one-to-many)
//!   links without exposing mutators that could desynchronize them.
//!
//! # Invariants
//! - A store's product list never contains the same product twice.
//! - An employee with an employer appears in exactly that store's staff list,
//!   and every staff entry points back at its store.
//! - The product→stores side is derived from store edge lists, so it is
//!   always symmetric with them.
//! - Edge lists keep insertion order.
//! - Keys carry the id of the graph that issued them; a key from any other
//!   graph resolves to nothing.

use crate::model::entity::{Employee, EmployeeId, Product, ProductId, Store, StoreId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Arena index of a store inside one `StoreGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreKey {
    graph: u64,
    index: usize,
}

/// Arena index of a product inside one `StoreGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductKey {
    graph: u64,
    index: usize,
}

/// Arena index of an employee inside one `StoreGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmployeeKey {
    graph: u64,
    index: usize,
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "store#{}.{}", self.graph, self.index)
    }
}

impl Display for ProductKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "product#{}.{}", self.graph, self.index)
    }
}

impl Display for EmployeeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "employee#{}.{}", self.graph, self.index)
    }
}

/// Association rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationError {
    /// Employee already works for another store; use `reassign_employee`.
    EmployeeAlreadyAssigned {
        employee: EmployeeKey,
        current: StoreKey,
        requested: StoreKey,
    },
    /// Key does not belong to this graph.
    UnknownStore(StoreKey),
    UnknownProduct(ProductKey),
    UnknownEmployee(EmployeeKey),
}

impl Display for AssociationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmployeeAlreadyAssigned {
                employee,
                current,
                requested,
            } => write!(
                f,
                "{employee} already belongs to {current}; refusing implicit move to {requested}"
            ),
            Self::UnknownStore(key) => write!(f, "unknown {key}"),
            Self::UnknownProduct(key) => write!(f, "unknown {key}"),
            Self::UnknownEmployee(key) => write!(f, "unknown {key}"),
        }
    }
}

impl Error for AssociationError {}

pub type AssociationResult<T> = Result<T, AssociationError>;

#[derive(Debug, Clone)]
struct StoreNode {
    store: Store,
    products: Vec<ProductKey>,
    staff: Vec<EmployeeKey>,
}

#[derive(Debug, Clone)]
struct EmployeeNode {
    employee: Employee,
    employer: Option<StoreKey>,
}

/// Owner of all entities and association edges of one unit of work.
///
/// A clone keeps the graph id, so keys issued before cloning stay valid on
/// both copies.
#[derive(Debug, Clone)]
pub struct StoreGraph {
    id: u64,
    stores: Vec<StoreNode>,
    products: Vec<Product>,
    employees: Vec<EmployeeNode>,
}

impl Default for StoreGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreGraph {
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            stores: Vec::new(),
            products: Vec::new(),
            employees: Vec::new(),
        }
    }

    pub fn insert_store(&mut self, store: Store) -> StoreKey {
        self.stores.push(StoreNode {
            store,
            products: Vec::new(),
            staff: Vec::new(),
        });
        self.store_key(self.stores.len() - 1)
    }

    pub fn insert_product(&mut self, product: Product) -> ProductKey {
        self.products.push(product);
        ProductKey {
            graph: self.id,
            index: self.products.len() - 1,
        }
    }

    /// Adds an employee with no employer yet.
    pub fn insert_employee(&mut self, employee: Employee) -> EmployeeKey {
        self.employees.push(EmployeeNode {
            employee,
            employer: None,
        });
        EmployeeKey {
            graph: self.id,
            index: self.employees.len() - 1,
        }
    }

    pub fn store(&self, key: StoreKey) -> Option<&Store> {
        self.store_node(key).ok().map(|node| &node.store)
    }

    pub fn product(&self, key: ProductKey) -> Option<&Product> {
        self.product_ref(key).ok()
    }

    pub fn employee(&self, key: EmployeeKey) -> Option<&Employee> {
        self.employee_node(key).ok().map(|node| &node.employee)
    }

    /// Store keys in insertion order.
    pub fn store_keys(&self) -> impl Iterator<Item = StoreKey> + '_ {
        (0..self.stores.len()).map(|index| self.store_key(index))
    }

    /// Products carried by `store`, in the order they were added.
    pub fn products_of(&self, store: StoreKey) -> AssociationResult<&[ProductKey]> {
        Ok(&self.store_node(store)?.products)
    }

    /// Staff of `store`, in the order they were added.
    pub fn staff_of(&self, store: StoreKey) -> AssociationResult<&[EmployeeKey]> {
        Ok(&self.store_node(store)?.staff)
    }

    /// Stores carrying `product`, in store insertion order.
    pub fn stores_carrying(&self, product: ProductKey) -> AssociationResult<Vec<StoreKey>> {
        self.product_ref(product)?;
        Ok(self
            .stores
            .iter()
            .enumerate()
            .filter(|(_, node)| node.products.contains(&product))
            .map(|(index, _)| self.store_key(index))
            .collect())
    }

    pub fn employer_of(&self, employee: EmployeeKey) -> AssociationResult<Option<StoreKey>> {
        Ok(self.employee_node(employee)?.employer)
    }

    /// Links `product` to `store`.
    ///
    /// Returns `false` when the link already existed; repeated calls are no-ops.
    pub fn add_product(
        &mut self,
        store: StoreKey,
        product: ProductKey,
    ) -> AssociationResult<bool> {
        self.product_ref(product)?;
        let node = self.store_node_mut(store)?;
        if node.products.contains(&product) {
            return Ok(false);
        }
        node.products.push(product);
        Ok(true)
    }

    /// Assigns `employee` to `store` and records the back-reference.
    ///
    /// Returns `false` when the employee already works for `store`.
    ///
    /// # Errors
    /// - `EmployeeAlreadyAssigned` when the employee works for another store.
    ///   Neither store is modified.
    pub fn add_employee(
        &mut self,
        store: StoreKey,
        employee: EmployeeKey,
    ) -> AssociationResult<bool> {
        self.ensure_store(store)?;
        let employer = self.employee_node(employee)?.employer;
        match employer {
            Some(current) if current == store => Ok(false),
            Some(current) => Err(AssociationError::EmployeeAlreadyAssigned {
                employee,
                current,
                requested: store,
            }),
            None => {
                self.link_employee(store, employee);
                Ok(true)
            }
        }
    }

    /// Moves `employee` to `store`, detaching it from its previous employer first.
    ///
    /// Returns the previous employer, if any.
    pub fn reassign_employee(
        &mut self,
        store: StoreKey,
        employee: EmployeeKey,
    ) -> AssociationResult<Option<StoreKey>> {
        self.ensure_store(store)?;
        let previous = self.employee_node(employee)?.employer;
        if previous == Some(store) {
            return Ok(previous);
        }
        if let Some(old) = previous {
            self.stores[old.index].staff.retain(|member| *member != employee);
        }
        self.link_employee(store, employee);
        Ok(previous)
    }

    /// Links every product in order; duplicates are skipped, not fatal.
    ///
    /// Returns how many links were newly created.
    pub fn add_products_to_store(
        &mut self,
        store: StoreKey,
        products: &[ProductKey],
    ) -> AssociationResult<usize> {
        let mut added = 0;
        for product in products {
            if self.add_product(store, *product)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Assigns every employee in order; already-assigned-here entries are skipped.
    ///
    /// Stops at the first re-parenting conflict. Assignments made before the
    /// conflict are kept.
    pub fn add_employees_to_store(
        &mut self,
        store: StoreKey,
        employees: &[EmployeeKey],
    ) -> AssociationResult<usize> {
        let mut added = 0;
        for employee in employees {
            if self.add_employee(store, *employee)? {
                added += 1;
            }
        }
        Ok(added)
    }

    pub(crate) fn set_store_id(&mut self, key: StoreKey, id: StoreId) {
        if let Ok(node) = self.store_node_mut(key) {
            node.store.id = Some(id);
        }
    }

    pub(crate) fn set_product_id(&mut self, key: ProductKey, id: ProductId) {
        if key.graph != self.id {
            return;
        }
        if let Some(product) = self.products.get_mut(key.index) {
            product.id = Some(id);
        }
    }

    pub(crate) fn set_employee_id(&mut self, key: EmployeeKey, id: EmployeeId) {
        if key.graph != self.id {
            return;
        }
        if let Some(node) = self.employees.get_mut(key.index) {
            node.employee.id = Some(id);
        }
    }

    fn store_key(&self, index: usize) -> StoreKey {
        StoreKey {
            graph: self.id,
            index,
        }
    }

    // Both keys were resolved against this graph by the caller.
    fn link_employee(&mut self, store: StoreKey, employee: EmployeeKey) {
        self.stores[store.index].staff.push(employee);
        self.employees[employee.index].employer = Some(store);
    }

    fn store_node(&self, key: StoreKey) -> AssociationResult<&StoreNode> {
        if key.graph != self.id {
            return Err(AssociationError::UnknownStore(key));
        }
        self.stores
            .get(key.index)
            .ok_or(AssociationError::UnknownStore(key))
    }

    fn store_node_mut(&mut self, key: StoreKey) -> AssociationResult<&mut StoreNode> {
        if key.graph != self.id {
            return Err(AssociationError::UnknownStore(key));
        }
        self.stores
            .get_mut(key.index)
            .ok_or(AssociationError::UnknownStore(key))
    }

    fn employee_node(&self, key: EmployeeKey) -> AssociationResult<&EmployeeNode> {
        if key.graph != self.id {
            return Err(AssociationError::UnknownEmployee(key));
        }
        self.employees
            .get(key.index)
            .ok_or(AssociationError::UnknownEmployee(key))
    }

    fn product_ref(&self, key: ProductKey) -> AssociationResult<&Product> {
        if key.graph != self.id {
            return Err(AssociationError::UnknownProduct(key));
        }
        self.products
            .get(key.index)
            .ok_or(AssociationError::UnknownProduct(key))
    }

    fn ensure_store(&self, key: StoreKey) -> AssociationResult<()> {
        self.store_node(key).map(|_| ())
    }
}
