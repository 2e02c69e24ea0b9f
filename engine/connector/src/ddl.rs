//! DDL operations the Instance and Upgrade Engines construct (spec §4.5,
//! §4.6) and hand to a [`crate::SchemaConnector`] for rendering.

use sdl_core::RefAction;

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub type_spec: String,
    pub not_null: bool,
}

#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    pub cluster: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Check,
}

/// One statement's worth of schema change, in the vendor-neutral shape the
/// engines assemble before asking the connector to render it.
#[derive(Debug, Clone)]
pub enum DdlOperation {
    BeforeAll,
    AfterAll,

    CreateSchema { name: String },
    DropSchema { name: String, cascade: bool },

    CreateTable { schema: String, table: String, pk_name: String, columns: Vec<ColumnSpec> },
    DropTable { schema: String, table: String },

    RawStatement { statement: String },

    AddForeignKey {
        schema: String,
        table: String,
        constraint_name: String,
        column: String,
        ref_table: String,
        ref_column: String,
        on_delete: RefAction,
        on_update: RefAction,
    },
    AddCheckConstraint { schema: String, table: String, constraint_name: String, expression: String },
    DropConstraint { schema: String, table: String, constraint_name: String, kind: ConstraintKind },

    AddNotNull { schema: String, table: String, column: String },
    DropNotNull { schema: String, table: String, column: String },

    CreateIndex { schema: String, table: String, index: IndexSpec },
    DropIndex { schema: String, table: String, index_name: String },

    CreateTrigger { schema: String, table: String, trigger_name: String, definition: String },
    DropTrigger { schema: String, table: String, trigger_name: String },

    CreateView { schema: String, view: String, definition: String },
    DropView { schema: String, view: String },

    CreateComment { schema: String, table: String, column: Option<String>, comment: String },

    AddColumn { schema: String, table: String, column: ColumnSpec },
    DropColumn { schema: String, table: String, column: String },
    ChangeColumnType { schema: String, table: String, column: String, new_type_spec: String },

    /// Present for the field-rename slot the upgrade plan reserves; never
    /// emitted today because fields have no stable GUID identity (spec §9,
    /// open question b).
    RenameColumn { schema: String, table: String, old_name: String, new_name: String },
}
