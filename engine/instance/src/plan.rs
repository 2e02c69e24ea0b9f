//! Ordered DDL plan construction (spec §4.5).

use sdl::{DefinitionKind, GlobalId, ValidatedSchema};
use schema_connector::{ColumnSpec, ConstraintKind, DdlOperation, IndexSpec};

use crate::error::EngineResult;
use crate::names::PhysicalNames;
use crate::props::{effective_notnull, effective_ref_action};

/// Vendor-specific content the grammar doesn't model (views, triggers,
/// comments, raw data) spliced into the named ordering slot verbatim.
#[derive(Debug, Clone, Default)]
pub struct PlanExtras {
    pub raw_data: Vec<DdlOperation>,
    pub triggers: Vec<DdlOperation>,
    pub views: Vec<DdlOperation>,
    pub comments: Vec<DdlOperation>,
    pub data: Vec<DdlOperation>,
}

fn column_spec(validated: &ValidatedSchema<'_>, names: &PhysicalNames, field_id: GlobalId, type_spec: &str) -> EngineResult<ColumnSpec> {
    Ok(ColumnSpec {
        name: names.field_pname(validated, field_id)?.to_owned(),
        type_spec: type_spec.to_owned(),
        not_null: effective_notnull(validated, field_id),
    })
}

/// Build the full create-order plan (spec §4.5): before-all, schemas,
/// tables with PK, raw data, table-level FK/check constraints, field
/// NOT NULL constraints, indexes, triggers, views, comments, data,
/// after-all.
///
/// `type_spec_of` renders a realized field's vendor type-spec string;
/// callers own vendor dispatch (phase 8 already validated every realized
/// field's type resolves).
pub fn create_plan(
    validated: &ValidatedSchema<'_>,
    names: &PhysicalNames,
    extras: &PlanExtras,
    type_spec_of: impl Fn(GlobalId) -> String,
) -> EngineResult<Vec<DdlOperation>> {
    let mut ops = vec![DdlOperation::BeforeAll];

    let mut tables: Vec<(GlobalId, &str)> = names.tables().collect();
    tables.sort_by_key(|(_, name)| name.to_string());

    for (idx, _) in validated.db.schemas() {
        if let Ok(name) = names.schema_pname(validated, idx) {
            ops.push(DdlOperation::CreateSchema { name: name.to_owned() });
        }
    }

    for &(table_id, table_name) in &tables {
        let schema_idx = validated
            .db
            .schemas()
            .find(|(idx, _)| validated.db.static_children(validated.db.schema_root(*idx)).any(|c| c == table_id))
            .map(|(idx, _)| idx)
            .expect("every physical table is a direct child of exactly one schema root");
        let schema_name = names.schema_pname(validated, schema_idx)?.to_owned();

        let field_ids: Vec<GlobalId> = validated
            .attrs(table_id)
            .effective_members
            .values()
            .copied()
            .filter(|m| validated.db.def(*m).kind == DefinitionKind::Field)
            .collect();
        let mut columns = Vec::with_capacity(field_ids.len());
        for field_id in &field_ids {
            columns.push(column_spec(validated, names, *field_id, &type_spec_of(*field_id))?);
        }

        ops.push(DdlOperation::CreateTable {
            schema: schema_name,
            table: table_name.to_owned(),
            pk_name: names.primary_key_pname(validated, table_id)?.to_owned(),
            columns,
        });
    }

    ops.extend(extras.raw_data.iter().cloned());

    for &(table_id, table_name) in &tables {
        let schema_name = schema_name_of(validated, names, table_id)?;

        for member_id in validated.attrs(table_id).effective_members.values() {
            if validated.db.def(*member_id).kind != DefinitionKind::Constraint {
                continue;
            }
            let constraint_name = names.constraint_pname(validated, *member_id)?.to_owned();
            ops.push(DdlOperation::AddCheckConstraint {
                schema: schema_name.clone(),
                table: table_name.to_owned(),
                constraint_name,
                expression: check_expression(validated, *member_id),
            });
        }

        for field_id in validated.attrs(table_id).effective_members.values().copied().collect::<Vec<_>>() {
            if validated.db.def(field_id).kind != DefinitionKind::Field {
                continue;
            }
            let Some(target) = validated.attrs(field_id).references_target else { continue };
            let target_table = validated.attrs(target).final_implementor();
            let Ok(ref_table_name) = names.table_pname(validated, target_table) else { continue };
            ops.push(DdlOperation::AddForeignKey {
                schema: schema_name.clone(),
                table: table_name.to_owned(),
                constraint_name: names.foreign_key_pname(validated, field_id)?.to_owned(),
                column: names.field_pname(validated, field_id)?.to_owned(),
                ref_table: ref_table_name.to_owned(),
                ref_column: names.primary_key_pname(validated, target_table)?.to_owned(),
                on_delete: effective_ref_action(validated, field_id, "ondelete"),
                on_update: effective_ref_action(validated, field_id, "onupdate"),
            });
        }
    }

    for &(table_id, table_name) in &tables {
        let schema_name = schema_name_of(validated, names, table_id)?;
        for field_id in validated.attrs(table_id).effective_members.values().copied().collect::<Vec<_>>() {
            if validated.db.def(field_id).kind != DefinitionKind::Field {
                continue;
            }
            if effective_notnull(validated, field_id) {
                ops.push(DdlOperation::AddNotNull {
                    schema: schema_name.clone(),
                    table: table_name.to_owned(),
                    column: names.field_pname(validated, field_id)?.to_owned(),
                });
            }
        }
    }

    for &(table_id, table_name) in &tables {
        let schema_name = schema_name_of(validated, names, table_id)?;
        for member_id in validated.attrs(table_id).effective_members.values() {
            if validated.db.def(*member_id).kind != DefinitionKind::Index {
                continue;
            }
            let cluster = sdl::find_properties(validated.db, *member_id, "cluster").into_iter().next().is_some();
            let columns: Vec<String> = validated
                .attrs(*member_id)
                .index_fields
                .iter()
                .filter_map(|f| names.field_pname(validated, *f).ok().map(str::to_owned))
                .collect();
            ops.push(DdlOperation::CreateIndex {
                schema: schema_name.clone(),
                table: table_name.to_owned(),
                index: IndexSpec { name: names.index_pname(validated, *member_id)?.to_owned(), columns, cluster },
            });
        }
    }

    ops.extend(extras.triggers.iter().cloned());
    ops.extend(extras.views.iter().cloned());
    ops.extend(extras.comments.iter().cloned());
    ops.extend(extras.data.iter().cloned());

    ops.push(DdlOperation::AfterAll);
    Ok(ops)
}

/// Build the drop-order plan (spec §4.5). `force` issues `DROP SCHEMA
/// CASCADE` per realized schema and skips the detailed order entirely.
pub fn drop_plan(validated: &ValidatedSchema<'_>, names: &PhysicalNames, extras: &PlanExtras, force: bool) -> EngineResult<Vec<DdlOperation>> {
    let mut ops = vec![DdlOperation::BeforeAll];

    if force {
        for (idx, _) in validated.db.schemas() {
            if let Ok(name) = names.schema_pname(validated, idx) {
                ops.push(DdlOperation::DropSchema { name: name.to_owned(), cascade: true });
            }
        }
        ops.push(DdlOperation::AfterAll);
        return Ok(ops);
    }

    let mut tables: Vec<(GlobalId, &str)> = names.tables().collect();
    tables.sort_by_key(|(_, name)| name.to_string());

    ops.extend(extras.data.iter().cloned());
    ops.extend(extras.comments.iter().cloned());
    ops.extend(extras.views.iter().cloned());
    ops.extend(extras.triggers.iter().cloned());

    for &(table_id, table_name) in &tables {
        let schema_name = schema_name_of(validated, names, table_id)?;
        for field_id in validated.attrs(table_id).effective_members.values().copied().collect::<Vec<_>>() {
            if validated.db.def(field_id).kind != DefinitionKind::Field {
                continue;
            }
            if let Some(target) = validated.attrs(field_id).references_target {
                let target_table = validated.attrs(target).final_implementor();
                if let Ok(constraint_name) = names.foreign_key_pname(validated, field_id) {
                    let _ = target_table;
                    ops.push(DdlOperation::DropConstraint {
                        schema: schema_name.clone(),
                        table: table_name.to_owned(),
                        constraint_name: constraint_name.to_owned(),
                        kind: ConstraintKind::ForeignKey,
                    });
                }
            }
        }
        for member_id in validated.attrs(table_id).effective_members.values() {
            if validated.db.def(*member_id).kind != DefinitionKind::Constraint {
                continue;
            }
            ops.push(DdlOperation::DropConstraint {
                schema: schema_name.clone(),
                table: table_name.to_owned(),
                constraint_name: names.constraint_pname(validated, *member_id)?.to_owned(),
                kind: ConstraintKind::Check,
            });
        }
    }

    for &(table_id, table_name) in &tables {
        let schema_name = schema_name_of(validated, names, table_id)?;
        for member_id in validated.attrs(table_id).effective_members.values() {
            if validated.db.def(*member_id).kind != DefinitionKind::Index {
                continue;
            }
            ops.push(DdlOperation::DropIndex { schema: schema_name.clone(), table: table_name.to_owned(), index_name: names.index_pname(validated, *member_id)?.to_owned() });
        }
    }

    ops.extend(extras.raw_data.iter().cloned());

    for &(table_id, table_name) in &tables {
        let schema_name = schema_name_of(validated, names, table_id)?;
        ops.push(DdlOperation::DropTable { schema: schema_name, table: table_name.to_owned() });
    }

    for (idx, _) in validated.db.schemas() {
        if let Ok(name) = names.schema_pname(validated, idx) {
            ops.push(DdlOperation::DropSchema { name: name.to_owned(), cascade: false });
        }
    }

    ops.push(DdlOperation::AfterAll);
    Ok(ops)
}

fn schema_name_of(validated: &ValidatedSchema<'_>, names: &PhysicalNames, table_id: GlobalId) -> EngineResult<String> {
    let idx = validated
        .db
        .schemas()
        .find(|(i, _)| validated.db.static_children(validated.db.schema_root(*i)).any(|c| c == table_id))
        .map(|(i, _)| i)
        .expect("every physical table is a direct child of exactly one schema root");
    Ok(names.schema_pname(validated, idx)?.to_owned())
}

fn check_expression(validated: &ValidatedSchema<'_>, constraint_id: GlobalId) -> String {
    sdl::find_properties(validated.db, constraint_id, "check")
        .into_iter()
        .next()
        .map(|(_, p)| {
            p.values
                .iter()
                .filter_map(|v| match v {
                    sdl::ValueAst::Literal(sdl::LiteralAst::Str(s)) => Some(s.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
