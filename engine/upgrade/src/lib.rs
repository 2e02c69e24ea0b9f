//! The Upgrade Engine (spec §4.6): diffs two independently compiled
//! instances by GUID (schemas, top-level fieldsets) and by physical name
//! (fields within a matched table pair), then assembles an ordered
//! migration plan.

mod diff;
mod error;
mod plan;

pub use diff::{field_diff, schema_diff, table_diff, FieldDiff, SchemaDiff, TableDiff};
pub use error::{UpgradeError, UpgradeResult};
pub use plan::{upgrade_plan, UpgradeExtras};

use instance_engine::PhysicalNames;
use sdl::{GlobalId, ValidatedSchema};
use schema_connector::{DdlOperation, DdlProcessor, SchemaConnector};

pub struct UpgradeEngine<'o, 'n, 'odb, 'ndb> {
    old: &'o ValidatedSchema<'odb>,
    new: &'n ValidatedSchema<'ndb>,
    old_names: PhysicalNames,
    new_names: PhysicalNames,
}

impl<'o, 'n, 'odb, 'ndb> UpgradeEngine<'o, 'n, 'odb, 'ndb> {
    pub fn new(old: &'o ValidatedSchema<'odb>, new: &'n ValidatedSchema<'ndb>, scheme: &naming::NamingScheme) -> Self {
        UpgradeEngine {
            old_names: PhysicalNames::build(old, scheme),
            new_names: PhysicalNames::build(new, scheme),
            old,
            new,
        }
    }

    pub fn plan(
        &self,
        extras: &UpgradeExtras,
        old_type_spec_of: impl Fn(GlobalId) -> String,
        new_type_spec_of: impl Fn(GlobalId) -> String,
    ) -> UpgradeResult<Vec<DdlOperation>> {
        upgrade_plan(self.old, &self.old_names, self.new, &self.new_names, extras, old_type_spec_of, new_type_spec_of)
    }

    pub fn apply(&self, plan: &[DdlOperation], connector: &dyn SchemaConnector, ignore_exceptions: bool) -> UpgradeResult<()> {
        tracing::info!(operations = plan.len(), "applying upgrade plan");
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

    fn compile(files: impl IntoIterator<Item = (&'static str, &'static str)>, top: &'static str) -> sdl::ParserDatabase {
        let loader = sdl::MapSourceLoader::new(files);
        sdl::aggregate(&[PathBuf::from(top)], &[], &loader).unwrap()
    }

    fn compile_multi(files: impl IntoIterator<Item = (&'static str, &'static str)>, tops: &[&'static str]) -> sdl::ParserDatabase {
        let loader = sdl::MapSourceLoader::new(files);
        let paths: Vec<PathBuf> = tops.iter().map(|t| PathBuf::from(*t)).collect();
        sdl::aggregate(&paths, &[], &loader).unwrap()
    }

    const TABLE: &str = indoc::indoc! {r#"
        schema a {
          guid = "00000000-0000-0000-0000-000000000000";
          required fieldset t {
            guid = "11111111-1111-1111-1111-111111111111";
            field a {
              type = "integer";
            }
            field b {
              type = "integer";
              required;
            }
          }
        }
    "#};

    const TABLE_CHANGED: &str = indoc::indoc! {r#"
        schema a {
          guid = "00000000-0000-0000-0000-000000000000";
          required fieldset t {
            guid = "11111111-1111-1111-1111-111111111111";
            field a {
              type = "text";
            }
            field c {
              type = "integer";
              required;
            }
          }
        }
    "#};

    fn type_spec_of(db: &sdl::ParserDatabase, validated: &ValidatedSchema<'_>) -> impl Fn(GlobalId) -> String {
        let _ = db;
        move |id: GlobalId| validated.db.def(id).name.clone()
    }

    #[test]
    fn diff_of_a_schema_against_itself_is_empty() {
        let db = compile([("a", TABLE)], "a");
        let validated = sdl::compile(&db, false, &sdl::GenericTypeMap).unwrap();
        let scheme = naming::NamingScheme::default();
        let engine = UpgradeEngine::new(&validated, &validated, &scheme);

        let type_spec = type_spec_of(&db, &validated);
        let plan = engine.plan(&UpgradeExtras::default(), &type_spec, &type_spec).unwrap();

        assert!(!plan.iter().any(|op| matches!(
            op,
            DdlOperation::CreateTable { .. } | DdlOperation::DropTable { .. } | DdlOperation::AddColumn { .. } | DdlOperation::DropColumn { .. } | DdlOperation::ChangeColumnType { .. }
        )));
    }

    #[test]
    fn retype_and_notnull_flip_produce_the_documented_plan_shape() {
        let old_db = compile([("a", TABLE)], "a");
        let old_validated = sdl::compile(&old_db, false, &sdl::GenericTypeMap).unwrap();
        let new_db = compile([("a", TABLE_CHANGED)], "a");
        let new_validated = sdl::compile(&new_db, false, &sdl::GenericTypeMap).unwrap();

        let scheme = naming::NamingScheme::default();
        let engine = UpgradeEngine::new(&old_validated, &new_validated, &scheme);

        let old_type_spec = type_spec_of(&old_db, &old_validated);
        let new_type_spec = type_spec_of(&new_db, &new_validated);
        let plan = engine.plan(&UpgradeExtras::default(), old_type_spec, new_type_spec).unwrap();

        let add_pos = plan.iter().position(|op| matches!(op, DdlOperation::AddColumn { .. }));
        let retype_pos = plan.iter().position(|op| matches!(op, DdlOperation::ChangeColumnType { .. }));
        let drop_pos = plan.iter().position(|op| matches!(op, DdlOperation::DropColumn { .. }));
        let dropnotnull_pos = plan.iter().position(|op| matches!(op, DdlOperation::DropNotNull { .. }));
        let addnotnull_pos = plan.iter().position(|op| matches!(op, DdlOperation::AddNotNull { .. }));

        assert!(add_pos.is_some() && retype_pos.is_some() && drop_pos.is_some());
        assert!(add_pos < retype_pos);
        assert!(retype_pos < drop_pos);
        assert!(dropnotnull_pos.unwrap() < add_pos.unwrap());
        assert!(addnotnull_pos.unwrap() > drop_pos.unwrap());
    }

    #[test]
    fn table_changing_schemas_is_rejected() {
        let old_db = compile(
            [(
                "a",
                indoc::indoc! {r#"
                    schema a {
                      guid = "00000000-0000-0000-0000-000000000000";
                      required fieldset t {
                        guid = "11111111-1111-1111-1111-111111111111";
                        field f { type = "integer"; }
                      }
                    }
                "#},
            )],
            "a",
        );
        let old_validated = sdl::compile(&old_db, false, &sdl::GenericTypeMap).unwrap();

        let new_db = compile_multi(
            [
                (
                    "a",
                    indoc::indoc! {r#"
                        schema a {
                          guid = "00000000-0000-0000-0000-000000000000";
                        }
                    "#},
                ),
                (
                    "b",
                    indoc::indoc! {r#"
                        schema b {
                          guid = "99999999-9999-9999-9999-999999999999";
                          required fieldset t {
                            guid = "11111111-1111-1111-1111-111111111111";
                            field f { type = "integer"; }
                          }
                        }
                    "#},
                ),
            ],
            &["a", "b"],
        );
        let new_validated = sdl::compile(&new_db, false, &sdl::GenericTypeMap).unwrap();

        let result = table_diff_for_test(&old_validated, &new_validated);
        assert!(matches!(result, Err(UpgradeError::SchemaChanged { .. })));
    }

    fn table_diff_for_test(old: &ValidatedSchema<'_>, new: &ValidatedSchema<'_>) -> UpgradeResult<TableDiff> {
        table_diff(old, new)
    }
}
