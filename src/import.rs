//! Bulk import of customers from an XML document.
//!
//! The document root holds zero or more customer elements, each carrying
//! `name`, `balance` and `debt` children:
//!
//! ```xml
//! <customers>
//!   <customer><name>Ana</name><balance>100.0</balance><debt>50.0</debt></customer>
//! </customers>
//! ```
//!
//! Files written for the earlier Spanish-language tool (`cliente` elements
//! with `nombre`, `saldo` and `deuda`) are read the same way. Only direct
//! children of the root count; anything unrecognized is skipped.

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};
use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::insert_customer;
use crate::error::LedgerError;
use crate::models::{ImportSummary, NewCustomer};

const CUSTOMER_TAGS: &[&str] = &["customer", "cliente"];
const NAME_TAGS: &[&str] = &["name", "nombre"];
const BALANCE_TAGS: &[&str] = &["balance", "saldo"];
const DEBT_TAGS: &[&str] = &["debt", "deuda"];

/// Why a document (or one element of it) could not be read. Element indexes
/// are 1-based positions among the customer elements.
#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("customer #{index} is missing the `{field}` field")]
    MissingField { index: usize, field: &'static str },
    #[error("customer #{index} has a non-numeric {field}: {raw:?}")]
    InvalidNumber {
        index: usize,
        field: &'static str,
        raw: String,
    },
    #[error("customer #{index} has an empty name")]
    EmptyName { index: usize },
}

impl From<ImportError> for LedgerError {
    fn from(err: ImportError) -> Self {
        LedgerError::Parse(err.to_string())
    }
}

/// Parse every customer in `xml`, stopping at the first malformed element.
pub fn parse_customers(xml: &str) -> Result<Vec<NewCustomer>, ImportError> {
    let doc = Document::parse(xml).map_err(|err| ImportError::Malformed(err.to_string()))?;
    customer_nodes(&doc)
        .enumerate()
        .map(|(idx, node)| parse_customer(node, idx + 1))
        .collect()
}

/// Insert the customers described by `xml`, one element at a time. When an
/// element fails to parse the import stops there; rows inserted for earlier
/// elements stay in the ledger.
pub fn import_customers(conn: &Connection, xml: &str) -> Result<usize, LedgerError> {
    let doc = Document::parse(xml).map_err(|err| ImportError::Malformed(err.to_string()))?;

    let mut inserted = 0;
    for (idx, node) in customer_nodes(&doc).enumerate() {
        let customer = match parse_customer(node, idx + 1) {
            Ok(customer) => customer,
            Err(err) => {
                warn!(inserted, error = %err, "import stopped at malformed customer");
                return Err(err.into());
            }
        };
        insert_customer(conn, &customer)?;
        inserted += 1;
    }

    Ok(inserted)
}

/// Read `path` and import its customers.
pub fn import_file(conn: &Connection, path: &Path) -> Result<ImportSummary, LedgerError> {
    let xml = fs::read_to_string(path).map_err(|err| {
        LedgerError::Parse(format!("could not read {}: {err}", path.display()))
    })?;

    let inserted = import_customers(conn, &xml)?;
    info!(path = %path.display(), inserted, "customers imported");
    Ok(ImportSummary {
        source: path.to_path_buf(),
        inserted,
    })
}

fn customer_nodes<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.root_element()
        .children()
        .filter(|node| node.is_element() && CUSTOMER_TAGS.contains(&node.tag_name().name()))
}

fn parse_customer(node: Node<'_, '_>, index: usize) -> Result<NewCustomer, ImportError> {
    let name = child_text(node, NAME_TAGS).ok_or(ImportError::MissingField {
        index,
        field: "name",
    })?;
    if name.is_empty() {
        return Err(ImportError::EmptyName { index });
    }
    let balance = parse_amount(node, BALANCE_TAGS, "balance", index)?;
    let debt = parse_amount(node, DEBT_TAGS, "debt", index)?;

    Ok(NewCustomer {
        name: name.to_string(),
        balance,
        debt,
    })
}

fn parse_amount(
    node: Node<'_, '_>,
    tags: &[&str],
    field: &'static str,
    index: usize,
) -> Result<f64, ImportError> {
    let raw = child_text(node, tags).ok_or(ImportError::MissingField { index, field })?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ImportError::InvalidNumber {
            index,
            field,
            raw: raw.to_string(),
        }),
    }
}

/// Trimmed text of the first child whose tag is one of `tags`. A present but
/// empty element yields `Some("")`.
fn child_text<'a>(node: Node<'a, '_>, tags: &[&str]) -> Option<&'a str> {
    node.children()
        .find(|child| child.is_element() && tags.contains(&child.tag_name().name()))
        .map(|child| child.text().unwrap_or("").trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_customers, ensure_schema, fetch_customers};

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn parses_english_and_spanish_elements() {
        let xml = r#"
            <customers>
                <customer><name>Ana</name><balance>100.0</balance><debt>50</debt></customer>
                <cliente><nombre> Luis </nombre><saldo>20.5</saldo><deuda>-3</deuda></cliente>
            </customers>"#;

        let customers = parse_customers(xml).unwrap();
        assert_eq!(
            customers,
            vec![
                NewCustomer {
                    name: "Ana".to_string(),
                    balance: 100.0,
                    debt: 50.0,
                },
                NewCustomer {
                    name: "Luis".to_string(),
                    balance: 20.5,
                    debt: -3.0,
                },
            ]
        );
    }

    #[test]
    fn extra_fields_and_foreign_elements_are_ignored() {
        let xml = r#"
            <clientes>
                <note>exported yesterday</note>
                <cliente>
                    <id>17</id>
                    <nombre>Ana</nombre>
                    <saldo>1</saldo>
                    <deuda>2</deuda>
                    <email>ana@example.com</email>
                </cliente>
            </clientes>"#;

        let customers = parse_customers(xml).unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "Ana");
    }

    #[test]
    fn empty_document_imports_nothing() {
        let conn = store();
        assert_eq!(import_customers(&conn, "<customers/>").unwrap(), 0);
        assert_eq!(count_customers(&conn).unwrap(), 0);
    }

    #[test]
    fn non_numeric_balance_is_a_parse_failure() {
        let xml = "<customers><customer><name>Ana</name><balance>lots</balance><debt>0</debt></customer></customers>";
        assert_eq!(
            parse_customers(xml),
            Err(ImportError::InvalidNumber {
                index: 1,
                field: "balance",
                raw: "lots".to_string(),
            })
        );

        let conn = store();
        let err = import_customers(&conn, xml).unwrap_err();
        assert!(matches!(err, LedgerError::Parse(_)));
    }

    #[test]
    fn missing_debt_is_a_parse_failure() {
        let xml = "<customers><customer><name>Ana</name><balance>1</balance></customer></customers>";
        assert_eq!(
            parse_customers(xml),
            Err(ImportError::MissingField {
                index: 1,
                field: "debt",
            })
        );
    }

    #[test]
    fn blank_name_is_rejected() {
        let xml = "<customers><customer><name>  </name><balance>1</balance><debt>0</debt></customer></customers>";
        assert_eq!(
            parse_customers(xml),
            Err(ImportError::EmptyName { index: 1 })
        );
    }

    #[test]
    fn malformed_xml_is_reported() {
        let conn = store();
        let err = import_customers(&conn, "<customers><customer>").unwrap_err();
        assert!(matches!(err, LedgerError::Parse(_)));
        assert_eq!(count_customers(&conn).unwrap(), 0);
    }

    #[test]
    fn failure_keeps_earlier_rows() {
        let xml = r#"
            <customers>
                <customer><name>Ana</name><balance>100</balance><debt>50</debt></customer>
                <customer><name>Luis</name><balance>10</balance><debt>0</debt></customer>
                <customer><name>Broken</name><balance>x</balance><debt>0</debt></customer>
                <customer><name>Never</name><balance>1</balance><debt>0</debt></customer>
            </customers>"#;

        let conn = store();
        let err = import_customers(&conn, xml).unwrap_err();
        assert!(err.to_string().contains("customer #3"));

        let names: Vec<String> = fetch_customers(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Ana".to_string(), "Luis".to_string()]);
    }

    #[test]
    fn import_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clientes.xml");
        fs::write(
            &path,
            "<clientes><cliente><nombre>Ana</nombre><saldo>100</saldo><deuda>50</deuda></cliente></clientes>",
        )
        .unwrap();

        let conn = store();
        let summary = import_file(&conn, &path).unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.source, path);
    }

    #[test]
    fn missing_file_is_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let conn = store();
        let err = import_file(&conn, &dir.path().join("absent.xml")).unwrap_err();
        assert!(matches!(err, LedgerError::Parse(_)));
    }
}
