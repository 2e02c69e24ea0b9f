//! The vendor adapter contract (spec §6) that the Instance and Upgrade
//! Engines drive. Grounded on the role `schema-connector` plays ahead of
//! `sql-schema-connector` for the teacher's schema engine: one trait
//! object per target database, backed by its own query/DDL execution and
//! its own logical-to-physical type map.

mod ddl;
mod error;
mod processor;

pub use ddl::{ColumnSpec, ConstraintKind, DdlOperation, IndexSpec};
pub use error::{ConnectorError, ConnectorResult};
pub use processor::{DdlProcessor, StatementOutcome};

pub use sdl_core::{RefAction, TypeRequirements, VendorTypeMap};

/// Everything the engines need from a target database: connection and
/// transaction primitives, existence probes, and DDL rendering. A vendor
/// crate implements this once; the Instance and Upgrade Engines are
/// written against the trait only.
pub trait SchemaConnector: VendorTypeMap + Send + Sync {
    /// For diagnostics and `NotImplemented` errors only.
    fn provider_name(&self) -> &'static str;

    fn connect(&self) -> ConnectorResult<()>;
    fn disconnect(&self) -> ConnectorResult<()>;

    fn execute(&self, statement: &str) -> ConnectorResult<()>;
    fn query(&self, statement: &str) -> ConnectorResult<Vec<Vec<String>>>;

    fn savepoint(&self, name: &str) -> ConnectorResult<()>;
    fn release_savepoint(&self, name: &str) -> ConnectorResult<()>;
    fn rollback_to_savepoint(&self, name: &str) -> ConnectorResult<()>;

    fn schema_exists(&self, schema: &str) -> ConnectorResult<bool>;
    fn table_exists(&self, schema: &str, table: &str) -> ConnectorResult<bool>;
    fn column_exists(&self, schema: &str, table: &str, column: &str) -> ConnectorResult<bool>;
    fn index_exists(&self, schema: &str, table: &str, index: &str) -> ConnectorResult<bool>;

    /// Render one field's type into the vendor's type-spec string (e.g.
    /// `"numeric(10,2)"`), given the logical type name plus whatever
    /// `size`/`precision` the type requires.
    fn type_spec(&self, logical_type: &str, size: Option<u32>, precision: Option<(u32, u32)>) -> ConnectorResult<String>;

    /// Render one vendor-neutral [`DdlOperation`] into this vendor's SQL.
    fn render(&self, op: &DdlOperation) -> ConnectorResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// A connector stub exercising the DDL processor's fan-out and
    /// `ignore_exceptions` behavior without a real backend.
    struct FakeConnector {
        applied: RefCell<Vec<String>>,
        fail_statements_containing: &'static str,
    }

    impl VendorTypeMap for FakeConnector {
        fn resolve(&self, logical_name: &str) -> Option<TypeRequirements> {
            match logical_name {
                "integer" => Some(TypeRequirements::default()),
                _ => None,
            }
        }
    }

    impl SchemaConnector for FakeConnector {
        fn provider_name(&self) -> &'static str {
            "fake"
        }
        fn connect(&self) -> ConnectorResult<()> {
            Ok(())
        }
        fn disconnect(&self) -> ConnectorResult<()> {
            Ok(())
        }
        fn execute(&self, statement: &str) -> ConnectorResult<()> {
            if statement.contains(self.fail_statements_containing) {
                return Err(ConnectorError::Ddl {
                    statement: statement.to_owned(),
                    message: "simulated failure".to_owned(),
                });
            }
            self.applied.borrow_mut().push(statement.to_owned());
            Ok(())
        }
        fn query(&self, _statement: &str) -> ConnectorResult<Vec<Vec<String>>> {
            Ok(Vec::new())
        }
        fn savepoint(&self, _name: &str) -> ConnectorResult<()> {
            Ok(())
        }
        fn release_savepoint(&self, _name: &str) -> ConnectorResult<()> {
            Ok(())
        }
        fn rollback_to_savepoint(&self, _name: &str) -> ConnectorResult<()> {
            Ok(())
        }
        fn schema_exists(&self, _schema: &str) -> ConnectorResult<bool> {
            Ok(false)
        }
        fn table_exists(&self, _schema: &str, _table: &str) -> ConnectorResult<bool> {
            Ok(false)
        }
        fn column_exists(&self, _schema: &str, _table: &str, _column: &str) -> ConnectorResult<bool> {
            Ok(false)
        }
        fn index_exists(&self, _schema: &str, _table: &str, _index: &str) -> ConnectorResult<bool> {
            Ok(false)
        }
        fn type_spec(&self, logical_type: &str, _size: Option<u32>, _precision: Option<(u32, u32)>) -> ConnectorResult<String> {
            Ok(logical_type.to_owned())
        }
        fn render(&self, op: &DdlOperation) -> ConnectorResult<String> {
            match op {
                DdlOperation::CreateSchema { name } => Ok(format!("CREATE SCHEMA {name}")),
                DdlOperation::DropSchema { name, cascade } => Ok(format!("DROP SCHEMA {name}{}", if *cascade { " CASCADE" } else { "" })),
                _ => Ok("NOOP".to_owned()),
            }
        }
    }

    #[test]
    fn successful_statement_is_applied_and_logged() {
        let connector = FakeConnector {
            applied: RefCell::new(Vec::new()),
            fail_statements_containing: "never-matches",
        };
        let mut processor = DdlProcessor::new(&connector, false);
        let outcome = processor.process(&DdlOperation::CreateSchema { name: "s".into() }).unwrap();
        assert_eq!(outcome, StatementOutcome::Applied);
        assert_eq!(connector.applied.borrow().as_slice(), ["CREATE SCHEMA s"]);
    }

    #[test]
    fn failing_statement_aborts_by_default() {
        let connector = FakeConnector {
            applied: RefCell::new(Vec::new()),
            fail_statements_containing: "DROP",
        };
        let mut processor = DdlProcessor::new(&connector, false);
        let result = processor.process(&DdlOperation::DropSchema { name: "s".into(), cascade: false });
        assert!(result.is_err());
    }

    #[test]
    fn ignore_exceptions_swallows_the_failure() {
        let connector = FakeConnector {
            applied: RefCell::new(Vec::new()),
            fail_statements_containing: "DROP",
        };
        let mut processor = DdlProcessor::new(&connector, true);
        let outcome = processor.process(&DdlOperation::DropSchema { name: "s".into(), cascade: false }).unwrap();
        assert_eq!(outcome, StatementOutcome::Ignored);
    }

    #[test]
    fn sub_processors_see_every_statement() {
        let primary = FakeConnector {
            applied: RefCell::new(Vec::new()),
            fail_statements_containing: "never-matches",
        };
        let mirror = FakeConnector {
            applied: RefCell::new(Vec::new()),
            fail_statements_containing: "never-matches",
        };
        let mut primary_proc = DdlProcessor::new(&primary, false);
        primary_proc.attach(DdlProcessor::new(&mirror, false));

        primary_proc.process(&DdlOperation::CreateSchema { name: "s".into() }).unwrap();

        assert_eq!(primary.applied.borrow().as_slice(), ["CREATE SCHEMA s"]);
        assert_eq!(mirror.applied.borrow().as_slice(), ["CREATE SCHEMA s"]);
    }
}
