//! The three diff phases (spec §4.6): schema diff by GUID, table diff by
//! GUID within matched schemas, field diff by physical name within
//! matched tables.

use rustc_hash::FxHashMap;
use sdl::{DefinitionKind, GlobalId, SchemaIdx, ValidatedSchema};

use crate::error::{UpgradeError, UpgradeResult};

pub(crate) fn guid_of(validated: &ValidatedSchema<'_>, id: GlobalId) -> Option<String> {
    sdl::find_properties(validated.db, id, "guid")
        .into_iter()
        .next()
        .and_then(|(_, p)| p.values.first().cloned())
        .and_then(|v| match v {
            sdl::ValueAst::Literal(sdl::LiteralAst::Str(s)) => Some(s),
            _ => None,
        })
}

pub(crate) fn schema_idx_of(validated: &ValidatedSchema<'_>, table_id: GlobalId) -> SchemaIdx {
    validated
        .db
        .schemas()
        .find(|(idx, _)| validated.db.static_children(validated.db.schema_root(*idx)).any(|c| c == table_id))
        .map(|(idx, _)| idx)
        .expect("every physical table is a direct child of exactly one schema root")
}

#[derive(Debug, Default)]
pub struct SchemaDiff {
    pub to_create: Vec<SchemaIdx>,
    pub to_drop: Vec<SchemaIdx>,
    /// `(old, new)` pairs sharing a GUID.
    pub common: Vec<(SchemaIdx, SchemaIdx)>,
}

pub fn schema_diff(old: &ValidatedSchema<'_>, new: &ValidatedSchema<'_>) -> SchemaDiff {
    let mut old_by_guid: FxHashMap<String, SchemaIdx> = FxHashMap::default();
    for (idx, _) in old.db.schemas() {
        if let Some(guid) = guid_of(old, old.db.schema_root(idx)) {
            old_by_guid.insert(guid, idx);
        }
    }
    let mut new_by_guid: FxHashMap<String, SchemaIdx> = FxHashMap::default();
    for (idx, _) in new.db.schemas() {
        if let Some(guid) = guid_of(new, new.db.schema_root(idx)) {
            new_by_guid.insert(guid, idx);
        }
    }

    let mut diff = SchemaDiff::default();
    for (guid, &new_idx) in &new_by_guid {
        match old_by_guid.get(guid) {
            Some(&old_idx) => diff.common.push((old_idx, new_idx)),
            None => diff.to_create.push(new_idx),
        }
    }
    for (guid, &old_idx) in &old_by_guid {
        if !new_by_guid.contains_key(guid) {
            diff.to_drop.push(old_idx);
        }
    }
    diff.to_create.sort_by_key(|idx| new.db.schema(*idx).package_name.clone());
    diff.to_drop.sort_by_key(|idx| old.db.schema(*idx).package_name.clone());
    diff.common.sort_by_key(|(old_idx, _)| old.db.schema(*old_idx).package_name.clone());
    diff
}

#[derive(Debug, Default)]
pub struct TableDiff {
    pub to_create: Vec<GlobalId>,
    pub to_drop: Vec<GlobalId>,
    /// `(old, new)` pairs sharing a GUID.
    pub common: Vec<(GlobalId, GlobalId)>,
}

/// Partition top-level fieldset GUIDs across the whole of `old`/`new` and
/// reject any table whose containing schema GUID changed between the two
/// compilations (spec §4.6, step 1).
pub fn table_diff(old: &ValidatedSchema<'_>, new: &ValidatedSchema<'_>) -> UpgradeResult<TableDiff> {
    let old_tables = physical_tables_by_guid(old);
    let new_tables = physical_tables_by_guid(new);

    let mut old_schema_guid: FxHashMap<SchemaIdx, String> = FxHashMap::default();
    for (idx, _) in old.db.schemas() {
        if let Some(guid) = guid_of(old, old.db.schema_root(idx)) {
            old_schema_guid.insert(idx, guid);
        }
    }
    let mut new_schema_guid: FxHashMap<SchemaIdx, String> = FxHashMap::default();
    for (idx, _) in new.db.schemas() {
        if let Some(guid) = guid_of(new, new.db.schema_root(idx)) {
            new_schema_guid.insert(idx, guid);
        }
    }

    let mut diff = TableDiff::default();
    for (guid, &new_id) in &new_tables {
        match old_tables.get(guid) {
            None => diff.to_create.push(new_id),
            Some(&old_id) => {
                let old_guid = old_schema_guid.get(&schema_idx_of(old, old_id));
                let new_guid = new_schema_guid.get(&schema_idx_of(new, new_id));
                if old_guid != new_guid {
                    return Err(UpgradeError::SchemaChanged {
                        table: sdl::path_of(new.db, new_id),
                        old_schema: old_guid.cloned().unwrap_or_default(),
                        new_schema: new_guid.cloned().unwrap_or_default(),
                    });
                }
                diff.common.push((old_id, new_id));
            }
        }
    }
    for (guid, &old_id) in &old_tables {
        if !new_tables.contains_key(guid) {
            diff.to_drop.push(old_id);
        }
    }
    Ok(diff)
}

fn physical_tables_by_guid(validated: &ValidatedSchema<'_>) -> FxHashMap<String, GlobalId> {
    let mut by_guid = FxHashMap::default();
    for (idx, _) in validated.db.schemas() {
        let root = validated.db.schema_root(idx);
        for id in validated.db.static_children(root) {
            if instance_engine::is_physical_table(validated, id) {
                if let Some(guid) = guid_of(validated, id) {
                    by_guid.insert(guid, id);
                }
            }
        }
    }
    by_guid
}

#[derive(Debug, Default)]
pub struct FieldDiff {
    /// Old-side field ids present only in the old table.
    pub to_drop: Vec<GlobalId>,
    /// New-side field ids present only in the new table.
    pub to_create: Vec<GlobalId>,
    /// `(old, new)` pairs whose rendered type-spec differs.
    pub to_retype: Vec<(GlobalId, GlobalId)>,
    /// New-side field ids that gained NOT NULL.
    pub notnull_added: Vec<GlobalId>,
    /// Old-side field ids that lost NOT NULL.
    pub notnull_dropped: Vec<GlobalId>,
    pub has_change: bool,
}

/// Diff the fields of one matched table pair, identifying fields by their
/// physical name under each side's own naming (spec §4.6, step 3). The
/// rename slot is intentionally absent: fields carry no GUID, so a
/// same-named-different-field and a genuine rename are indistinguishable.
pub fn field_diff(
    old: &ValidatedSchema<'_>,
    old_names: &instance_engine::PhysicalNames,
    old_table: GlobalId,
    new: &ValidatedSchema<'_>,
    new_names: &instance_engine::PhysicalNames,
    new_table: GlobalId,
    old_type_spec_of: impl Fn(GlobalId) -> String,
    new_type_spec_of: impl Fn(GlobalId) -> String,
) -> FieldDiff {
    let old_fields = fields_by_pname(old, old_names, old_table);
    let new_fields = fields_by_pname(new, new_names, new_table);

    let mut diff = FieldDiff::default();
    for (pname, &old_id) in &old_fields {
        if !new_fields.contains_key(pname) {
            diff.to_drop.push(old_id);
        }
    }
    for (pname, &new_id) in &new_fields {
        match old_fields.get(pname) {
            None => diff.to_create.push(new_id),
            Some(&old_id) => {
                if old_type_spec_of(old_id) != new_type_spec_of(new_id) {
                    diff.to_retype.push((old_id, new_id));
                }
                let old_nn = instance_engine::effective_notnull(old, old_id);
                let new_nn = instance_engine::effective_notnull(new, new_id);
                if old_nn && !new_nn {
                    diff.notnull_dropped.push(old_id);
                } else if !old_nn && new_nn {
                    diff.notnull_added.push(new_id);
                }
            }
        }
    }

    diff.has_change = !diff.to_drop.is_empty() || !diff.to_create.is_empty() || !diff.to_retype.is_empty() || !diff.notnull_added.is_empty() || !diff.notnull_dropped.is_empty();
    diff
}

fn fields_by_pname(validated: &ValidatedSchema<'_>, names: &instance_engine::PhysicalNames, table_id: GlobalId) -> FxHashMap<String, GlobalId> {
    let mut by_pname = FxHashMap::default();
    for member in validated.attrs(table_id).effective_members.values() {
        if validated.db.def(*member).kind != DefinitionKind::Field {
            continue;
        }
        if let Ok(pname) = names.field_pname(validated, *member) {
            by_pname.insert(pname.to_owned(), *member);
        }
    }
    by_pname
}
