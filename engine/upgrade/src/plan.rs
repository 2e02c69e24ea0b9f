//! Upgrade plan construction (spec §4.6, "Upgrade plan ordering").
//!
//! Constraints and indexes on a changed table are not diffed
//! individually: spec §4.6 only diffs fields. A `has_change` table has
//! its whole constraint/index set dropped in step 5 and rebuilt from the
//! new side in step 7.

use instance_engine::{effective_notnull, effective_ref_action, PhysicalNames};
use sdl::{DefinitionKind, GlobalId, ValidatedSchema};
use schema_connector::{ColumnSpec, ConstraintKind, DdlOperation, IndexSpec};

use crate::diff::{self, schema_idx_of, FieldDiff};
use crate::error::UpgradeResult;

/// Vendor-specific content the grammar doesn't model, spliced into the
/// matching ordering slot verbatim (mirrors `instance_engine::PlanExtras`).
#[derive(Debug, Clone, Default)]
pub struct UpgradeExtras {
    pub raw_data_for_new_tables: Vec<DdlOperation>,
    pub drop_triggers: Vec<DdlOperation>,
    pub drop_views: Vec<DdlOperation>,
    pub create_triggers: Vec<DdlOperation>,
    pub create_views: Vec<DdlOperation>,
    pub comments: Vec<DdlOperation>,
    pub data: Vec<DdlOperation>,
}

struct TableUpgrade {
    old_id: GlobalId,
    new_id: GlobalId,
    fields: FieldDiff,
}

/// Run all three diff phases and assemble the ordered plan.
pub fn upgrade_plan(
    old: &ValidatedSchema<'_>,
    old_names: &PhysicalNames,
    new: &ValidatedSchema<'_>,
    new_names: &PhysicalNames,
    extras: &UpgradeExtras,
    old_type_spec_of: impl Fn(GlobalId) -> String,
    new_type_spec_of: impl Fn(GlobalId) -> String,
) -> UpgradeResult<Vec<DdlOperation>> {
    let schemas = diff::schema_diff(old, new);
    let tables = diff::table_diff(old, new)?;

    let mut changed: Vec<TableUpgrade> = tables
        .common
        .iter()
        .map(|&(old_id, new_id)| {
            let fields = diff::field_diff(old, old_names, old_id, new, new_names, new_id, &old_type_spec_of, &new_type_spec_of);
            TableUpgrade { old_id, new_id, fields }
        })
        .collect();
    changed.sort_by_key(|t| new_names.table_pname(new, t.new_id).ok().map(str::to_owned).unwrap_or_default());

    let mut to_create = tables.to_create.clone();
    to_create.sort_by_key(|id| new_names.table_pname(new, *id).ok().map(str::to_owned).unwrap_or_default());
    let mut to_drop = tables.to_drop.clone();
    to_drop.sort_by_key(|id| old_names.table_pname(old, *id).ok().map(str::to_owned).unwrap_or_default());

    let mut ops = vec![DdlOperation::BeforeAll];

    for &idx in &schemas.to_create {
        if let Ok(name) = new_names.schema_pname(new, idx) {
            ops.push(DdlOperation::CreateSchema { name: name.to_owned() });
        }
    }

    for &table_id in &to_create {
        emit_create_table(new, new_names, table_id, &new_type_spec_of, &mut ops)?;
    }

    ops.extend(extras.raw_data_for_new_tables.iter().cloned());

    for t in changed.iter().filter(|t| t.fields.has_change) {
        emit_drop_notnull(old, old_names, t.old_id, &t.fields.notnull_dropped, &mut ops)?;
    }
    for &table_id in &to_drop {
        let required: Vec<GlobalId> = old
            .attrs(table_id)
            .effective_members
            .values()
            .copied()
            .filter(|m| old.db.def(*m).kind == DefinitionKind::Field && effective_notnull(old, *m))
            .collect();
        emit_drop_notnull(old, old_names, table_id, &required, &mut ops)?;
    }
    for t in changed.iter().filter(|t| t.fields.has_change) {
        emit_drop_table_constraints_and_indexes(old, old_names, t.old_id, &mut ops)?;
    }
    for &table_id in &to_drop {
        emit_drop_table_constraints_and_indexes(old, old_names, table_id, &mut ops)?;
    }
    ops.extend(extras.drop_triggers.iter().cloned());
    ops.extend(extras.drop_views.iter().cloned());

    for t in &changed {
        if !t.fields.has_change {
            continue;
        }
        let schema_name = schema_name_of(new, new_names, t.new_id)?;
        let table_name = new_names.table_pname(new, t.new_id)?.to_owned();

        for &field_id in &t.fields.to_create {
            ops.push(DdlOperation::AddColumn {
                schema: schema_name.clone(),
                table: table_name.clone(),
                column: ColumnSpec {
                    name: new_names.field_pname(new, field_id)?.to_owned(),
                    type_spec: new_type_spec_of(field_id),
                    not_null: effective_notnull(new, field_id),
                },
            });
        }
        for &(old_field, new_field) in &t.fields.to_retype {
            ops.push(DdlOperation::ChangeColumnType {
                schema: schema_name.clone(),
                table: table_name.clone(),
                column: old_names.field_pname(old, old_field)?.to_owned(),
                new_type_spec: new_type_spec_of(new_field),
            });
        }
        for &field_id in &t.fields.to_drop {
            ops.push(DdlOperation::DropColumn { schema: schema_name.clone(), table: table_name.clone(), column: old_names.field_pname(old, field_id)?.to_owned() });
        }
    }

    for t in changed.iter().filter(|t| t.fields.has_change) {
        emit_create_table_constraints_and_indexes(new, new_names, t.new_id, &mut ops)?;
        emit_add_notnull(new, new_names, t.new_id, &t.fields.notnull_added, &mut ops)?;
    }
    for &table_id in &to_create {
        emit_create_table_constraints_and_indexes(new, new_names, table_id, &mut ops)?;
    }
    ops.extend(extras.create_triggers.iter().cloned());
    ops.extend(extras.create_views.iter().cloned());
    ops.extend(extras.comments.iter().cloned());
    ops.extend(extras.data.iter().cloned());

    for &table_id in &to_drop {
        let schema_name = schema_name_of(old, old_names, table_id)?;
        let table_name = old_names.table_pname(old, table_id)?.to_owned();
        ops.push(DdlOperation::DropTable { schema: schema_name, table: table_name });
    }
    for &idx in &schemas.to_drop {
        if let Ok(name) = old_names.schema_pname(old, idx) {
            ops.push(DdlOperation::DropSchema { name: name.to_owned(), cascade: false });
        }
    }

    ops.push(DdlOperation::AfterAll);
    Ok(ops)
}

fn schema_name_of(validated: &ValidatedSchema<'_>, names: &PhysicalNames, table_id: GlobalId) -> UpgradeResult<String> {
    let idx = schema_idx_of(validated, table_id);
    Ok(names.schema_pname(validated, idx)?.to_owned())
}

fn emit_create_table(validated: &ValidatedSchema<'_>, names: &PhysicalNames, table_id: GlobalId, type_spec_of: &impl Fn(GlobalId) -> String, ops: &mut Vec<DdlOperation>) -> UpgradeResult<()> {
    let schema_name = schema_name_of(validated, names, table_id)?;
    let table_name = names.table_pname(validated, table_id)?.to_owned();
    let field_ids: Vec<GlobalId> = validated.attrs(table_id).effective_members.values().copied().filter(|m| validated.db.def(*m).kind == DefinitionKind::Field).collect();
    let mut columns = Vec::with_capacity(field_ids.len());
    for field_id in &field_ids {
        columns.push(ColumnSpec {
            name: names.field_pname(validated, *field_id)?.to_owned(),
            type_spec: type_spec_of(*field_id),
            not_null: effective_notnull(validated, *field_id),
        });
    }
    ops.push(DdlOperation::CreateTable { schema: schema_name, table: table_name, pk_name: names.primary_key_pname(validated, table_id)?.to_owned(), columns });
    Ok(())
}

fn emit_drop_notnull(validated: &ValidatedSchema<'_>, names: &PhysicalNames, table_id: GlobalId, fields: &[GlobalId], ops: &mut Vec<DdlOperation>) -> UpgradeResult<()> {
    if fields.is_empty() {
        return Ok(());
    }
    let schema_name = schema_name_of(validated, names, table_id)?;
    let table_name = names.table_pname(validated, table_id)?.to_owned();
    for &field_id in fields {
        ops.push(DdlOperation::DropNotNull { schema: schema_name.clone(), table: table_name.clone(), column: names.field_pname(validated, field_id)?.to_owned() });
    }
    Ok(())
}

fn emit_add_notnull(validated: &ValidatedSchema<'_>, names: &PhysicalNames, table_id: GlobalId, fields: &[GlobalId], ops: &mut Vec<DdlOperation>) -> UpgradeResult<()> {
    if fields.is_empty() {
        return Ok(());
    }
    let schema_name = schema_name_of(validated, names, table_id)?;
    let table_name = names.table_pname(validated, table_id)?.to_owned();
    for &field_id in fields {
        ops.push(DdlOperation::AddNotNull { schema: schema_name.clone(), table: table_name.clone(), column: names.field_pname(validated, field_id)?.to_owned() });
    }
    Ok(())
}

fn emit_drop_table_constraints_and_indexes(validated: &ValidatedSchema<'_>, names: &PhysicalNames, table_id: GlobalId, ops: &mut Vec<DdlOperation>) -> UpgradeResult<()> {
    let schema_name = schema_name_of(validated, names, table_id)?;
    let table_name = names.table_pname(validated, table_id)?.to_owned();

    for field_id in validated.attrs(table_id).effective_members.values().copied().collect::<Vec<_>>() {
        if validated.db.def(field_id).kind != DefinitionKind::Field {
            continue;
        }
        if validated.attrs(field_id).references_target.is_some() {
            if let Ok(constraint_name) = names.foreign_key_pname(validated, field_id) {
                ops.push(DdlOperation::DropConstraint { schema: schema_name.clone(), table: table_name.clone(), constraint_name: constraint_name.to_owned(), kind: ConstraintKind::ForeignKey });
            }
        }
    }
    for member_id in validated.attrs(table_id).effective_members.values() {
        if validated.db.def(*member_id).kind != DefinitionKind::Constraint {
            continue;
        }
        ops.push(DdlOperation::DropConstraint {
            schema: schema_name.clone(),
            table: table_name.clone(),
            constraint_name: names.constraint_pname(validated, *member_id)?.to_owned(),
            kind: ConstraintKind::Check,
        });
    }
    for member_id in validated.attrs(table_id).effective_members.values() {
        if validated.db.def(*member_id).kind != DefinitionKind::Index {
            continue;
        }
        ops.push(DdlOperation::DropIndex { schema: schema_name.clone(), table: table_name.clone(), index_name: names.index_pname(validated, *member_id)?.to_owned() });
    }
    Ok(())
}

fn emit_create_table_constraints_and_indexes(validated: &ValidatedSchema<'_>, names: &PhysicalNames, table_id: GlobalId, ops: &mut Vec<DdlOperation>) -> UpgradeResult<()> {
    let schema_name = schema_name_of(validated, names, table_id)?;
    let table_name = names.table_pname(validated, table_id)?.to_owned();

    for member_id in validated.attrs(table_id).effective_members.values() {
        if validated.db.def(*member_id).kind != DefinitionKind::Constraint {
            continue;
        }
        ops.push(DdlOperation::AddCheckConstraint {
            schema: schema_name.clone(),
            table: table_name.clone(),
            constraint_name: names.constraint_pname(validated, *member_id)?.to_owned(),
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
            table: table_name.clone(),
            constraint_name: names.foreign_key_pname(validated, field_id)?.to_owned(),
            column: names.field_pname(validated, field_id)?.to_owned(),
            ref_table: ref_table_name.to_owned(),
            ref_column: names.primary_key_pname(validated, target_table)?.to_owned(),
            on_delete: effective_ref_action(validated, field_id, "ondelete"),
            on_update: effective_ref_action(validated, field_id, "onupdate"),
        });
    }
    for member_id in validated.attrs(table_id).effective_members.values() {
        if validated.db.def(*member_id).kind != DefinitionKind::Index {
            continue;
        }
        let cluster = sdl::find_properties(validated.db, *member_id, "cluster").into_iter().next().is_some();
        let columns: Vec<String> = validated.attrs(*member_id).index_fields.iter().filter_map(|f| names.field_pname(validated, *f).ok().map(str::to_owned)).collect();
        ops.push(DdlOperation::CreateIndex { schema: schema_name.clone(), table: table_name.clone(), index: IndexSpec { name: names.index_pname(validated, *member_id)?.to_owned(), columns, cluster } });
    }
    Ok(())
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
