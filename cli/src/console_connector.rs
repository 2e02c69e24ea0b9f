//! The CLI's default backend: no concrete vendor adapter ships in this
//! workspace (`schema_connector::SchemaConnector` has no production
//! implementor here, only the trait), so `sdlc` renders a generic,
//! ANSI-ish SQL dialect and "executes" each statement by printing it.
//! Every existence probe answers `false`, matching a target that is
//! always empty: the CLI's create/drop/diff subcommands are plan-and-echo
//! tools, not a live migration runner.

use schema_connector::{ColumnSpec, ConnectorResult, DdlOperation, IndexSpec, SchemaConnector, TypeRequirements, VendorTypeMap};

pub struct ConsoleConnector;

impl VendorTypeMap for ConsoleConnector {
    fn resolve(&self, logical_name: &str) -> Option<TypeRequirements> {
        sdl::GenericTypeMap.resolve(logical_name)
    }
}

impl SchemaConnector for ConsoleConnector {
    fn provider_name(&self) -> &'static str {
        "console"
    }

    fn connect(&self) -> ConnectorResult<()> {
        Ok(())
    }

    fn disconnect(&self) -> ConnectorResult<()> {
        Ok(())
    }

    fn execute(&self, statement: &str) -> ConnectorResult<()> {
        println!("{statement};");
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

    fn type_spec(&self, logical_type: &str, size: Option<u32>, precision: Option<(u32, u32)>) -> ConnectorResult<String> {
        Ok(match (size, precision) {
            (_, Some((p, _))) => format!("{logical_type}({p})"),
            (Some(s), None) => format!("{logical_type}({s})"),
            (None, None) => logical_type.to_owned(),
        })
    }

    fn render(&self, op: &DdlOperation) -> ConnectorResult<String> {
        Ok(match op {
            DdlOperation::BeforeAll => "-- before all".to_owned(),
            DdlOperation::AfterAll => "-- after all".to_owned(),

            DdlOperation::CreateSchema { name } => format!("CREATE SCHEMA {name}"),
            DdlOperation::DropSchema { name, cascade } => format!("DROP SCHEMA {name}{}", if *cascade { " CASCADE" } else { "" }),

            DdlOperation::CreateTable { schema, table, pk_name, columns } => {
                let cols = columns.iter().map(render_column).collect::<Vec<_>>().join(", ");
                format!("CREATE TABLE {schema}.{table} ({cols}, CONSTRAINT {pk_name} PRIMARY KEY ({}))", columns.first().map(|c| c.name.as_str()).unwrap_or_default())
            }
            DdlOperation::DropTable { schema, table } => format!("DROP TABLE {schema}.{table}"),

            DdlOperation::RawStatement { statement } => statement.clone(),

            DdlOperation::AddForeignKey {
                schema,
                table,
                constraint_name,
                column,
                ref_table,
                ref_column,
                on_delete,
                on_update,
            } => {
                format!(
                    "ALTER TABLE {schema}.{table} ADD CONSTRAINT {constraint_name} FOREIGN KEY ({column}) REFERENCES {ref_table} ({ref_column}) ON DELETE {} ON UPDATE {}",
                    render_ref_action(*on_delete),
                    render_ref_action(*on_update)
                )
            }
            DdlOperation::AddCheckConstraint { schema, table, constraint_name, expression } => {
                format!("ALTER TABLE {schema}.{table} ADD CONSTRAINT {constraint_name} CHECK ({expression})")
            }
            DdlOperation::DropConstraint { schema, table, constraint_name, kind } => {
                let _ = kind;
                format!("ALTER TABLE {schema}.{table} DROP CONSTRAINT {constraint_name}")
            }

            DdlOperation::AddNotNull { schema, table, column } => format!("ALTER TABLE {schema}.{table} ALTER COLUMN {column} SET NOT NULL"),
            DdlOperation::DropNotNull { schema, table, column } => format!("ALTER TABLE {schema}.{table} ALTER COLUMN {column} DROP NOT NULL"),

            DdlOperation::CreateIndex { schema, table, index } => render_index(schema, table, index),
            DdlOperation::DropIndex { schema, table: _, index_name } => format!("DROP INDEX {schema}.{index_name}"),

            DdlOperation::CreateTrigger { schema, table, trigger_name, definition } => format!("CREATE TRIGGER {trigger_name} ON {schema}.{table} {definition}"),
            DdlOperation::DropTrigger { schema, table, trigger_name } => format!("DROP TRIGGER {trigger_name} ON {schema}.{table}"),

            DdlOperation::CreateView { schema, view, definition } => format!("CREATE VIEW {schema}.{view} AS {definition}"),
            DdlOperation::DropView { schema, view } => format!("DROP VIEW {schema}.{view}"),

            DdlOperation::CreateComment { schema, table, column, comment } => match column {
                Some(column) => format!("COMMENT ON COLUMN {schema}.{table}.{column} IS '{comment}'"),
                None => format!("COMMENT ON TABLE {schema}.{table} IS '{comment}'"),
            },

            DdlOperation::AddColumn { schema, table, column } => format!("ALTER TABLE {schema}.{table} ADD COLUMN {}", render_column(column)),
            DdlOperation::DropColumn { schema, table, column } => format!("ALTER TABLE {schema}.{table} DROP COLUMN {column}"),
            DdlOperation::ChangeColumnType { schema, table, column, new_type_spec } => format!("ALTER TABLE {schema}.{table} ALTER COLUMN {column} TYPE {new_type_spec}"),

            DdlOperation::RenameColumn { schema, table, old_name, new_name } => format!("ALTER TABLE {schema}.{table} RENAME COLUMN {old_name} TO {new_name}"),
        })
    }
}

fn render_column(column: &ColumnSpec) -> String {
    format!("{} {}{}", column.name, column.type_spec, if column.not_null { " NOT NULL" } else { "" })
}

fn render_index(schema: &str, table: &str, index: &IndexSpec) -> String {
    format!(
        "CREATE {}INDEX {} ON {schema}.{table} ({})",
        if index.cluster { "CLUSTERED " } else { "" },
        index.name,
        index.columns.join(", ")
    )
}

fn render_ref_action(action: schema_connector::RefAction) -> &'static str {
    match action {
        schema_connector::RefAction::Cascade => "CASCADE",
        schema_connector::RefAction::SetNull => "SET NULL",
        schema_connector::RefAction::NoAction => "NO ACTION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_connector::{ColumnSpec, RefAction};

    #[test]
    fn resolve_delegates_to_the_generic_type_map() {
        let connector = ConsoleConnector;
        assert!(connector.resolve("integer").is_some());
        assert!(connector.resolve("not-a-real-type").is_none());
    }

    #[test]
    fn type_spec_prefers_precision_over_size() {
        let connector = ConsoleConnector;
        assert_eq!(connector.type_spec("numeric", Some(10), Some((5, 0))).unwrap(), "numeric(5)");
        assert_eq!(connector.type_spec("varchar", Some(10), None).unwrap(), "varchar(10)");
        assert_eq!(connector.type_spec("integer", None, None).unwrap(), "integer");
    }

    #[test]
    fn create_table_renders_a_primary_key_on_the_first_column() {
        let connector = ConsoleConnector;
        let op = DdlOperation::CreateTable {
            schema: "a".to_owned(),
            table: "t".to_owned(),
            pk_name: "pk$t".to_owned(),
            columns: vec![
                ColumnSpec { name: "id".to_owned(), type_spec: "integer".to_owned(), not_null: true },
                ColumnSpec { name: "name".to_owned(), type_spec: "text".to_owned(), not_null: false },
            ],
        };
        let rendered = connector.render(&op).unwrap();
        assert_eq!(rendered, "CREATE TABLE a.t (id integer NOT NULL, name text, CONSTRAINT pk$t PRIMARY KEY (id))");
    }

    #[test]
    fn add_foreign_key_renders_both_ref_actions() {
        let connector = ConsoleConnector;
        let op = DdlOperation::AddForeignKey {
            schema: "a".to_owned(),
            table: "t".to_owned(),
            constraint_name: "fk$t$f".to_owned(),
            column: "f".to_owned(),
            ref_table: "u".to_owned(),
            ref_column: "id".to_owned(),
            on_delete: RefAction::Cascade,
            on_update: RefAction::NoAction,
        };
        let rendered = connector.render(&op).unwrap();
        assert!(rendered.contains("ON DELETE CASCADE"));
        assert!(rendered.contains("ON UPDATE NO ACTION"));
    }

    #[test]
    fn execute_does_not_fail_and_does_not_touch_a_real_backend() {
        let connector = ConsoleConnector;
        assert!(connector.execute("SELECT 1").is_ok());
        assert_eq!(connector.schema_exists("a").unwrap(), false);
        assert_eq!(connector.query("SELECT 1").unwrap(), Vec::<Vec<String>>::new());
    }
}
