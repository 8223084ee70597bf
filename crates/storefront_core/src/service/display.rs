//! Console rendering of stored stores.
//!
//! Output per store, in the order given:
//!
//! ```text
//! <store name>
//!  Products:
//!  <product name>
//!  Staff:
//!  <first> <last>
//! <blank line>
//! ```

use crate::repo::store_repo::StoreRecord;
use std::io::{self, Write};

const INDENT: &str = " ";

/// Writes every store, its products and its staff to `out`.
pub fn write_stores(out: &mut impl Write, stores: &[StoreRecord]) -> io::Result<()> {
    for store in stores {
        write_store(out, store)?;
    }
    out.flush()
}

/// Writes one store block followed by a blank separator line.
pub fn write_store(out: &mut impl Write, store: &StoreRecord) -> io::Result<()> {
    writeln!(out, "{}", store.name)?;
    writeln!(out, "{INDENT}Products:")?;
    for product in &store.products {
        writeln!(out, "{INDENT}{}", product.name)?;
    }
    writeln!(out, "{INDENT}Staff:")?;
    for employee in &store.staff {
        writeln!(out, "{INDENT}{}", employee.full_name())?;
    }
    writeln!(out)
}

/// Renders stores into a `String` using the `write_stores` layout.
pub fn render_stores(stores: &[StoreRecord]) -> io::Result<String> {
    let mut buffer = Vec::new();
    write_stores(&mut buffer, stores)?;
    String::from_utf8(buffer).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod tests {
    use super::{render_stores, write_stores};
    use crate::model::entity::{EmployeeId, ProductId, StoreId};
    use crate::repo::store_repo::{EmployeeRecord, ProductRecord, StoreRecord};
    use rust_decimal::Decimal;
    use std::io::{self, Write};

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn store_without_products_or_staff_still_prints_labels() {
        let stores = vec![StoreRecord {
            id: StoreId(1),
            name: "Corner Shop".to_string(),
            products: Vec::new(),
            staff: Vec::new(),
        }];

        assert_eq!(render_stores(&stores).unwrap(), "Corner Shop\n Products:\n Staff:\n\n");
    }

    #[test]
    fn products_and_staff_are_indented_one_per_line() {
        let stores = vec![StoreRecord {
            id: StoreId(7),
            name: "Kiosk".to_string(),
            products: vec![ProductRecord {
                id: ProductId(3),
                name: "Tea".to_string(),
                price: Decimal::new(150, 2),
            }],
            staff: vec![EmployeeRecord {
                id: EmployeeId(9),
                first_name: "Ada".to_string(),
                last_name: "Byron".to_string(),
            }],
        }];

        assert_eq!(
            render_stores(&stores).unwrap(),
            "Kiosk\n Products:\n Tea\n Staff:\n Ada Byron\n\n"
        );
    }

    #[test]
    fn no_stores_renders_nothing() {
        assert_eq!(render_stores(&[]).unwrap(), "");
    }

    #[test]
    fn write_failure_is_returned_to_caller() {
        let stores = vec![StoreRecord {
            id: StoreId(1),
            name: "Corner Shop".to_string(),
            products: Vec::new(),
            staff: Vec::new(),
        }];

        let err = write_stores(&mut ClosedPipe, &stores).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
