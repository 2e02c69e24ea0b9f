//! Pre-computed physical names (spec §4.4, §4.5): every realized object's
//! physical identifier is mangled once, up front, and looked up by
//! [`crate::InstanceEngine::get_table_pname`] and friends thereafter.

use naming::NamingScheme;
use rustc_hash::FxHashMap;
use sdl::{path_of, DefinitionKind, GlobalId, SchemaIdx, ValidatedSchema};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Default)]
pub struct PhysicalNames {
    schemas: FxHashMap<SchemaIdx, String>,
    tables: FxHashMap<GlobalId, String>,
    fields: FxHashMap<GlobalId, String>,
    indexes: FxHashMap<GlobalId, String>,
    /// Keyed by the `Constraint` declaration's id.
    constraints: FxHashMap<GlobalId, String>,
    primary_keys: FxHashMap<GlobalId, String>,
    /// Keyed by the referencing field's id.
    foreign_keys: FxHashMap<GlobalId, String>,
}

/// A realized, top-level, self-implementing `fieldset` - the unit the
/// Instance and Upgrade Engines both treat as a physical table.
pub fn is_physical_table(validated: &ValidatedSchema<'_>, id: GlobalId) -> bool {
    let attrs = validated.attrs(id);
    validated.db.def(id).kind == DefinitionKind::FieldSet && attrs.toplevel && attrs.realized && attrs.final_implementor() == id
}

impl PhysicalNames {
    pub fn build(validated: &ValidatedSchema<'_>, scheme: &NamingScheme) -> Self {
        let mut names = PhysicalNames::default();

        for (idx, schema) in validated.db.schemas() {
            if !validated.is_realized(validated.db.schema_root(idx)) {
                continue;
            }
            let parts: Vec<&str> = schema.package_name.split('.').collect();
            names.schemas.insert(idx, scheme.schema_name(&parts));
        }

        for (idx, _) in validated.db.schemas() {
            let root = validated.db.schema_root(idx);
            if !validated.is_realized(root) {
                continue;
            }
            for table_id in validated.db.static_children(root) {
                if !is_physical_table(validated, table_id) {
                    continue;
                }
                names.add_table(validated, scheme, idx, table_id);
            }
        }

        names
    }

    fn add_table(&mut self, validated: &ValidatedSchema<'_>, scheme: &NamingScheme, schema_idx: SchemaIdx, table_id: GlobalId) {
        let schema_name = self.schemas[&schema_idx].clone();
        let table_local = &validated.db.def(table_id).name;
        let table_name = scheme.table_name(&schema_name, table_local);
        self.primary_keys.insert(table_id, scheme.primary_key_name(&table_name));
        self.tables.insert(table_id, table_name.clone());

        let members: Vec<GlobalId> = validated.attrs(table_id).effective_members.values().copied().collect();
        for member_id in members {
            match validated.db.def(member_id).kind {
                DefinitionKind::Field => {
                    let field_name = scheme.field_name(&table_name, &[&validated.db.def(member_id).name]);
                    self.fields.insert(member_id, field_name);
                }
                DefinitionKind::Index => {
                    let index_local = &validated.db.def(member_id).name;
                    let field_refpaths: Vec<String> = validated
                        .attrs(member_id)
                        .index_fields
                        .iter()
                        .map(|f| validated.db.def(*f).name.clone())
                        .collect();
                    let field_refs: Vec<&str> = field_refpaths.iter().map(String::as_str).collect();
                    self.indexes.insert(member_id, scheme.index_name(&table_name, index_local, &field_refs));
                }
                DefinitionKind::Constraint => {
                    let constraint_local = &validated.db.def(member_id).name;
                    self.constraints.insert(member_id, scheme.constraint_name(&table_name, constraint_local));
                }
                _ => {}
            }
        }

        for member_id in validated.attrs(table_id).effective_members.values() {
            if validated.db.def(*member_id).kind != DefinitionKind::Field {
                continue;
            }
            if let Some(target) = validated.attrs(*member_id).references_target {
                let target_table = validated.attrs(target).final_implementor();
                if self.tables.contains_key(&target_table) {
                    let field_path = [validated.db.def(*member_id).name.as_str()];
                    self.foreign_keys.insert(*member_id, scheme.foreign_key_name(&table_name, &field_path));
                }
            }
        }
    }

    pub fn schema_pname(&self, validated: &ValidatedSchema<'_>, idx: SchemaIdx) -> EngineResult<&str> {
        self.schemas.get(&idx).map(String::as_str).ok_or_else(|| EngineError::NotRealized(validated.db.schema(idx).package_name.clone()))
    }

    pub fn table_pname(&self, validated: &ValidatedSchema<'_>, id: GlobalId) -> EngineResult<&str> {
        self.tables.get(&id).map(String::as_str).ok_or_else(|| not_realized(validated, id))
    }

    pub fn field_pname(&self, validated: &ValidatedSchema<'_>, id: GlobalId) -> EngineResult<&str> {
        self.fields.get(&id).map(String::as_str).ok_or_else(|| not_realized(validated, id))
    }

    pub fn index_pname(&self, validated: &ValidatedSchema<'_>, id: GlobalId) -> EngineResult<&str> {
        self.indexes.get(&id).map(String::as_str).ok_or_else(|| not_realized(validated, id))
    }

    pub fn constraint_pname(&self, validated: &ValidatedSchema<'_>, id: GlobalId) -> EngineResult<&str> {
        self.constraints.get(&id).map(String::as_str).ok_or_else(|| not_realized(validated, id))
    }

    pub fn primary_key_pname(&self, validated: &ValidatedSchema<'_>, table_id: GlobalId) -> EngineResult<&str> {
        self.primary_keys.get(&table_id).map(String::as_str).ok_or_else(|| not_realized(validated, table_id))
    }

    pub fn foreign_key_pname(&self, validated: &ValidatedSchema<'_>, field_id: GlobalId) -> EngineResult<&str> {
        self.foreign_keys.get(&field_id).map(String::as_str).ok_or_else(|| not_realized(validated, field_id))
    }

    pub fn tables(&self) -> impl Iterator<Item = (GlobalId, &str)> {
        self.tables.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

fn not_realized(validated: &ValidatedSchema<'_>, id: GlobalId) -> EngineError {
    EngineError::NotRealized(path_of(validated.db, id))
}
