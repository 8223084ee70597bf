//! Store repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist a store together with its products and staff in one transaction.
//! - Load stores back with both associations resolved.
//!
//! # Invariants
//! - Unsaved entities are inserted; saved entities are updated in place.
//! - A product shared by several stores is stored once and linked many times.
//! - Product links keep insertion order through `store_products.position`.
//! - Staff keep staff-list order through `employees.position`.
//! - Employees that left the saved store are detached (`store_id = NULL`).

use crate::db::{schema_matches_mapping, DbError};
use crate::model::entity::{
    require_name, validate_price, EmployeeId, ModelValidationError, ProductId, StoreId,
};
use crate::model::graph::{AssociationError, EmployeeKey, ProductKey, StoreGraph, StoreKey};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for store persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Entity values failed validation before write or after read.
    Validation(ModelValidationError),
    /// Graph key passed to a save call does not resolve.
    Association(AssociationError),
    /// An entity carries an id whose row no longer exists.
    NotFound { entity: &'static str, id: i64 },
    /// Connection schema does not match the mapped tables.
    UninitializedSchema,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Association(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UninitializedSchema => {
                write!(f, "store repository requires an initialized storefront schema")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted store data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Association(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::UninitializedSchema => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AssociationError> for RepoError {
    fn from(value: AssociationError) -> Self {
        Self::Association(value)
    }
}

/// Read model of one persisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
}

/// Read model of one persisted employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
}

impl EmployeeRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Read model of one persisted store with resolved associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: StoreId,
    pub name: String,
    /// Products in link order.
    pub products: Vec<ProductRecord>,
    /// Staff in staff-list order.
    pub staff: Vec<EmployeeRecord>,
}

/// Repository interface for store aggregates.
pub trait StoreRepository {
    /// Saves one store with its products and staff; returns the store id.
    fn save_store(&mut self, graph: &mut StoreGraph, store: StoreKey) -> RepoResult<StoreId>;
    /// Saves several stores in one transaction, in the given order.
    fn save_stores(&mut self, graph: &mut StoreGraph, stores: &[StoreKey])
        -> RepoResult<Vec<StoreId>>;
    fn get_store(&self, id: StoreId) -> RepoResult<Option<StoreRecord>>;
    /// Lists every store ordered by id.
    fn list_stores(&self) -> RepoResult<Vec<StoreRecord>>;
}

/// SQLite-backed store repository.
pub struct SqliteStoreRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteStoreRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        if !schema_matches_mapping(conn)? {
            return Err(RepoError::UninitializedSchema);
        }
        Ok(Self { conn })
    }
}

impl StoreRepository for SqliteStoreRepository<'_> {
    fn save_store(&mut self, graph: &mut StoreGraph, store: StoreKey) -> RepoResult<StoreId> {
        let ids = self.save_stores(graph, &[store])?;
        ids.into_iter()
            .next()
            .ok_or_else(|| RepoError::InvalidData("save returned no store id".to_string()))
    }

    fn save_stores(
        &mut self,
        graph: &mut StoreGraph,
        stores: &[StoreKey],
    ) -> RepoResult<Vec<StoreId>> {
        let started_at = Instant::now();
        let result = save_in_transaction(self.conn, graph, stores);

        match result {
            Ok((ids, assigned)) => {
                let inserted = assigned.len();
                assigned.apply(graph);
                info!(
                    "event=store_save module=repo status=ok stores={} inserted_rows={} duration_ms={}",
                    ids.len(),
                    inserted,
                    started_at.elapsed().as_millis()
                );
                Ok(ids)
            }
            Err(err) => {
                error!(
                    "event=store_save module=repo status=error stores={} duration_ms={} error_code=store_save_failed error={}",
                    stores.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn get_store(&self, id: StoreId) -> RepoResult<Option<StoreRecord>> {
        let tx = self.conn.unchecked_transaction()?;
        let name: Option<String> = tx
            .query_row("SELECT name FROM stores WHERE id = ?1;", [id.0], |row| {
                row.get(0)
            })
            .optional()?;

        let record = match name {
            Some(name) => Some(load_store(&tx, id, name)?),
            None => None,
        };
        tx.commit()?;
        Ok(record)
    }

    fn list_stores(&self) -> RepoResult<Vec<StoreRecord>> {
        let started_at = Instant::now();
        let tx = self.conn.unchecked_transaction()?;

        let heads = {
            let mut stmt = tx.prepare("SELECT id, name FROM stores ORDER BY id ASC;")?;
            let mut rows = stmt.query([])?;
            let mut heads = Vec::new();
            while let Some(row) = rows.next()? {
                heads.push((StoreId(row.get("id")?), row.get::<_, String>("name")?));
            }
            heads
        };

        let mut stores = Vec::with_capacity(heads.len());
        for (id, name) in heads {
            stores.push(load_store(&tx, id, name)?);
        }
        tx.commit()?;

        info!(
            "event=store_list module=repo status=ok stores={} duration_ms={}",
            stores.len(),
            started_at.elapsed().as_millis()
        );
        Ok(stores)
    }
}

/// Ids inserted during one save, applied to the graph after commit.
#[derive(Debug, Default)]
struct AssignedIds {
    stores: HashMap<StoreKey, StoreId>,
    products: HashMap<ProductKey, ProductId>,
    employees: HashMap<EmployeeKey, EmployeeId>,
}

impl AssignedIds {
    fn len(&self) -> usize {
        self.stores.len() + self.products.len() + self.employees.len()
    }

    fn store_id(&self, graph: &StoreGraph, key: StoreKey) -> Option<StoreId> {
        self.stores
            .get(&key)
            .copied()
            .or_else(|| graph.store(key).and_then(|store| store.id()))
    }

    fn product_id(&self, graph: &StoreGraph, key: ProductKey) -> Option<ProductId> {
        self.products
            .get(&key)
            .copied()
            .or_else(|| graph.product(key).and_then(|product| product.id()))
    }

    fn employee_id(&self, graph: &StoreGraph, key: EmployeeKey) -> Option<EmployeeId> {
        self.employees
            .get(&key)
            .copied()
            .or_else(|| graph.employee(key).and_then(|employee| employee.id()))
    }

    fn apply(self, graph: &mut StoreGraph) {
        for (key, id) in self.stores {
            graph.set_store_id(key, id);
        }
        for (key, id) in self.products {
            graph.set_product_id(key, id);
        }
        for (key, id) in self.employees {
            graph.set_employee_id(key, id);
        }
    }
}

fn save_in_transaction(
    conn: &mut Connection,
    graph: &StoreGraph,
    stores: &[StoreKey],
) -> RepoResult<(Vec<StoreId>, AssignedIds)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut assigned = AssignedIds::default();
    // Products already written by this transaction; shared ones are written once.
    let mut written_products = HashSet::new();
    let mut ids = Vec::with_capacity(stores.len());

    for store in stores {
        ids.push(save_store_in_tx(
            &tx,
            graph,
            *store,
            &mut assigned,
            &mut written_products,
        )?);
    }

    tx.commit()?;
    Ok((ids, assigned))
}

fn save_store_in_tx(
    tx: &Transaction<'_>,
    graph: &StoreGraph,
    key: StoreKey,
    assigned: &mut AssignedIds,
    written_products: &mut HashSet<ProductKey>,
) -> RepoResult<StoreId> {
    let store = graph.store(key).ok_or(AssociationError::UnknownStore(key))?;
    store.validate()?;

    let store_id = match assigned.store_id(graph, key) {
        Some(id) => {
            let changed = tx.execute(
                "UPDATE stores SET name = ?1 WHERE id = ?2;",
                params![store.name(), id.0],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "store",
                    id: id.0,
                });
            }
            id
        }
        None => {
            tx.execute("INSERT INTO stores (name) VALUES (?1);", [store.name()])?;
            let id = StoreId(tx.last_insert_rowid());
            assigned.stores.insert(key, id);
            id
        }
    };

    tx.execute(
        "DELETE FROM store_products WHERE store_id = ?1;",
        [store_id.0],
    )?;
    for (position, product_key) in graph.products_of(key)?.iter().enumerate() {
        let product_id = save_product_in_tx(tx, graph, *product_key, assigned, written_products)?;
        tx.execute(
            "INSERT INTO store_products (store_id, product_id, position) VALUES (?1, ?2, ?3);",
            params![store_id.0, product_id.0, position as i64],
        )?;
    }

    let mut staff_ids = HashSet::new();
    for (position, employee_key) in graph.staff_of(key)?.iter().enumerate() {
        let employee_id =
            save_employee_in_tx(tx, graph, *employee_key, store_id, position, assigned)?;
        staff_ids.insert(employee_id.0);
    }
    detach_departed_staff(tx, store_id, &staff_ids)?;

    Ok(store_id)
}

fn save_product_in_tx(
    tx: &Transaction<'_>,
    graph: &StoreGraph,
    key: ProductKey,
    assigned: &mut AssignedIds,
    written_products: &mut HashSet<ProductKey>,
) -> RepoResult<ProductId> {
    let product = graph
        .product(key)
        .ok_or(AssociationError::UnknownProduct(key))?;
    product.validate()?;

    if let Some(id) = assigned.product_id(graph, key) {
        if written_products.insert(key) {
            let changed = tx.execute(
                "UPDATE products SET name = ?1, price = ?2 WHERE id = ?3;",
                params![product.name(), product.price().to_string(), id.0],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "product",
                    id: id.0,
                });
            }
        }
        return Ok(id);
    }

    tx.execute(
        "INSERT INTO products (name, price) VALUES (?1, ?2);",
        params![product.name(), product.price().to_string()],
    )?;
    let id = ProductId(tx.last_insert_rowid());
    assigned.products.insert(key, id);
    written_products.insert(key);
    Ok(id)
}

fn save_employee_in_tx(
    tx: &Transaction<'_>,
    graph: &StoreGraph,
    key: EmployeeKey,
    store_id: StoreId,
    position: usize,
    assigned: &mut AssignedIds,
) -> RepoResult<EmployeeId> {
    let employee = graph
        .employee(key)
        .ok_or(AssociationError::UnknownEmployee(key))?;
    employee.validate()?;

    match assigned.employee_id(graph, key) {
        Some(id) => {
            let changed = tx.execute(
                "UPDATE employees
                 SET first_name = ?1, last_name = ?2, store_id = ?3, position = ?4
                 WHERE id = ?5;",
                params![
                    employee.first_name(),
                    employee.last_name(),
                    store_id.0,
                    position as i64,
                    id.0
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "employee",
                    id: id.0,
                });
            }
            Ok(id)
        }
        None => {
            tx.execute(
                "INSERT INTO employees (first_name, last_name, store_id, position)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    employee.first_name(),
                    employee.last_name(),
                    store_id.0,
                    position as i64
                ],
            )?;
            let id = EmployeeId(tx.last_insert_rowid());
            assigned.employees.insert(key, id);
            Ok(id)
        }
    }
}

fn detach_departed_staff(
    tx: &Transaction<'_>,
    store_id: StoreId,
    staff_ids: &HashSet<i64>,
) -> RepoResult<()> {
    let persisted = {
        let mut stmt = tx.prepare("SELECT id FROM employees WHERE store_id = ?1;")?;
        let mut rows = stmt.query([store_id.0])?;
        let mut persisted = Vec::new();
        while let Some(row) = rows.next()? {
            persisted.push(row.get::<_, i64>(0)?);
        }
        persisted
    };

    for id in persisted {
        if !staff_ids.contains(&id) {
            tx.execute(
                "UPDATE employees SET store_id = NULL WHERE id = ?1;",
                [id],
            )?;
        }
    }
    Ok(())
}

fn load_store(conn: &Connection, id: StoreId, name: String) -> RepoResult<StoreRecord> {
    require_name("store name", &name)
        .map_err(|_| RepoError::InvalidData(format!("blank name in stores.name for id {id}")))?;

    let products = {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.price
             FROM store_products sp
             INNER JOIN products p ON p.id = sp.product_id
             WHERE sp.store_id = ?1
             ORDER BY sp.position ASC, p.id ASC;",
        )?;
        let mut rows = stmt.query([id.0])?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row)?);
        }
        products
    };

    let staff = {
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name
             FROM employees
             WHERE store_id = ?1
             ORDER BY position ASC, id ASC;",
        )?;
        let mut rows = stmt.query([id.0])?;
        let mut staff = Vec::new();
        while let Some(row) = rows.next()? {
            staff.push(parse_employee_row(row)?);
        }
        staff
    };

    Ok(StoreRecord {
        id,
        name,
        products,
        staff,
    })
}

fn parse_product_row(row: &Row<'_>) -> RepoResult<ProductRecord> {
    let id = ProductId(row.get(0)?);
    let name: String = row.get(1)?;
    let price_text: String = row.get(2)?;
    let price = Decimal::from_str(&price_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid price value `{price_text}` in products.price for id {id}"
        ))
    })?;

    require_name("product name", &name)?;
    validate_price(&name, price)?;
    Ok(ProductRecord { id, name, price })
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<EmployeeRecord> {
    let record = EmployeeRecord {
        id: EmployeeId(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
    };
    require_name("employee first name", &record.first_name)?;
    require_name("employee last name", &record.last_name)?;
    Ok(record)
}
