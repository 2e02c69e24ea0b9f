//! The Instance Engine (spec §4.5): pre-computes every physical name once,
//! then assembles and applies ordered create/drop DDL plans against a
//! [`schema_connector::SchemaConnector`].

mod error;
mod names;
mod plan;
mod props;

pub use error::{EngineError, EngineResult};
pub use names::{is_physical_table, PhysicalNames};
pub use plan::{create_plan, drop_plan, PlanExtras};
pub use props::{effective_notnull, effective_ref_action};

use naming::NamingScheme;
use sdl::ValidatedSchema;
use schema_connector::{DdlOperation, DdlProcessor, SchemaConnector};

pub struct InstanceEngine<'v, 'db> {
    validated: &'v ValidatedSchema<'db>,
    names: PhysicalNames,
}

impl<'v, 'db> InstanceEngine<'v, 'db> {
    pub fn new(validated: &'v ValidatedSchema<'db>, scheme: &NamingScheme) -> Self {
        let names = PhysicalNames::build(validated, scheme);
        InstanceEngine { validated, names }
    }

    pub fn names(&self) -> &PhysicalNames {
        &self.names
    }

    pub fn get_schema_pname(&self, idx: sdl::SchemaIdx) -> EngineResult<&str> {
        self.names.schema_pname(self.validated, idx)
    }

    pub fn get_table_pname(&self, id: sdl::GlobalId) -> EngineResult<&str> {
        self.names.table_pname(self.validated, id)
    }

    pub fn get_field_pname(&self, id: sdl::GlobalId) -> EngineResult<&str> {
        self.names.field_pname(self.validated, id)
    }

    pub fn get_index_pname(&self, id: sdl::GlobalId) -> EngineResult<&str> {
        self.names.index_pname(self.validated, id)
    }

    pub fn get_constraint_pname(&self, id: sdl::GlobalId) -> EngineResult<&str> {
        self.names.constraint_pname(self.validated, id)
    }

    pub fn create_plan(&self, extras: &PlanExtras, type_spec_of: impl Fn(sdl::GlobalId) -> String) -> EngineResult<Vec<DdlOperation>> {
        plan::create_plan(self.validated, &self.names, extras, type_spec_of)
    }

    pub fn drop_plan(&self, extras: &PlanExtras, force: bool) -> EngineResult<Vec<DdlOperation>> {
        plan::drop_plan(self.validated, &self.names, extras, force)
    }

    /// Apply `plan` statement by statement through a fresh [`DdlProcessor`].
    pub fn apply(&self, plan: &[DdlOperation], connector: &dyn SchemaConnector, ignore_exceptions: bool) -> EngineResult<()> {
        tracing::info!(operations = plan.len(), "applying instance plan");
        let mut processor = DdlProcessor::new(connector, ignore_exceptions);
        for op in plan {
            processor.process(op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn validated_from(files: impl IntoIterator<Item = (&'static str, &'static str)>, top: &'static str) -> sdl::ParserDatabase {
        let loader = sdl::MapSourceLoader::new(files);
        sdl::aggregate(&[PathBuf::from(top)], &[], &loader).unwrap()
    }

    #[test]
    fn precomputes_table_and_field_names_for_a_minimal_realization() {
        let db = validated_from(
            [
                ("a", "use b required;\nschema a {\n  guid = \"00000000-0000-0000-0000-000000000000\";\n}\n"),
                (
                    "b",
                    indoc::indoc! {r#"
                        schema b {
                          guid = "99999999-9999-9999-9999-999999999999";
                          required fieldset t {
                            guid = "11111111-1111-1111-1111-111111111111";
                            field f {
                              type = "integer";
                            }
                          }
                        }
                    "#},
                ),
            ],
            "a",
        );
        let validated = sdl::compile(&db, false, &sdl::GenericTypeMap).expect("should compile cleanly");
        let engine = InstanceEngine::new(&validated, &NamingScheme::default());

        let (table_id, table_name) = engine.names().tables().next().expect("one physical table");
        assert!(table_name.ends_with(".t") || table_name.contains("t"));

        let field_id = validated.attrs(table_id).effective_members["f"];
        assert!(engine.get_field_pname(field_id).is_ok());
    }

    #[test]
    fn create_plan_orders_schema_before_table_before_after_all() {
        let db = validated_from([("a", "schema a {\n  guid = \"00000000-0000-0000-0000-000000000000\";\n  required fieldset t {\n    guid = \"11111111-1111-1111-1111-111111111111\";\n    field f {\n      type = \"integer\";\n    }\n  }\n}\n")], "a");
        let validated = sdl::compile(&db, false, &sdl::GenericTypeMap).expect("should compile cleanly");
        let engine = InstanceEngine::new(&validated, &NamingScheme::default());

        let plan = engine.create_plan(&PlanExtras::default(), |_| "integer".to_owned()).unwrap();

        let schema_pos = plan.iter().position(|op| matches!(op, DdlOperation::CreateSchema { .. })).unwrap();
        let table_pos = plan.iter().position(|op| matches!(op, DdlOperation::CreateTable { .. })).unwrap();
        let after_all_pos = plan.iter().position(|op| matches!(op, DdlOperation::AfterAll)).unwrap();
        assert!(schema_pos < table_pos);
        assert!(table_pos < after_all_pos);
    }

    #[test]
    fn get_table_pname_fails_for_unrealized_declarations() {
        let db = validated_from(
            [(
                "a",
                indoc::indoc! {r#"
                    schema a {
                      guid = "00000000-0000-0000-0000-000000000000";
                      fieldset unused {
                        field f {
                          type = "integer";
                        }
                      }
                    }
                "#},
            )],
            "a",
        );
        let validated = sdl::compile(&db, false, &sdl::GenericTypeMap).expect("should compile cleanly");
        let engine = InstanceEngine::new(&validated, &NamingScheme::default());

        let root = validated.db.schema_root(validated.db.schema_by_package("a").unwrap());
        let unused_id = validated.db.static_children(root).find(|id| validated.db.def(*id).name == "unused").unwrap();

        assert!(matches!(engine.get_table_pname(unused_id), Err(EngineError::NotRealized(_))));
    }
}
