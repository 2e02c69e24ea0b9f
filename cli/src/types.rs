//! Turns a realized field's effective `type`/`size`/`precision` into the
//! `type_spec_of` closure the Instance and Upgrade Engines require.
//!
//! `sdl_core::effective_property` needs a live `Compiler`, which no longer
//! exists once `sdl::compile` has returned a `ValidatedSchema`. The walk
//! below re-derives the same "own declaration, else nearest ancestor"
//! lookup directly off `ValidatedSchema::attrs`, skipping the
//! deletion-stops-inheritance case: phase 8 already rejects a realized
//! field whose effective `type` is deleted or absent, so a `ValidatedSchema`
//! never reaches the CLI with one.

use sdl::{GlobalId, LiteralAst, PropertyAst, ValidatedSchema, ValueAst};
use schema_connector::{ConnectorResult, SchemaConnector};

fn effective_property<'db>(validated: &ValidatedSchema<'db>, id: GlobalId, name: &str) -> Option<&'db PropertyAst> {
    if let Some((_, prop)) = sdl::find_properties(validated.db, id, name).into_iter().next() {
        return Some(prop);
    }
    validated.attrs(id).ancestors.iter().find_map(|&ancestor| effective_property(validated, ancestor, name))
}

fn literal_str(values: &[ValueAst]) -> Option<&str> {
    match values.first() {
        Some(ValueAst::Literal(LiteralAst::Str(s))) => Some(s.as_str()),
        _ => None,
    }
}

fn literal_int(values: &[ValueAst]) -> Option<i64> {
    match values.first() {
        Some(ValueAst::Literal(LiteralAst::Int(n))) => Some(*n),
        _ => None,
    }
}

/// Render `field_id`'s vendor type-spec through `connector`. Panics if
/// `field_id` has no effective `type`, which phase 8 already rules out for
/// every realized field in a `ValidatedSchema`.
pub fn field_type_spec(validated: &ValidatedSchema<'_>, connector: &dyn SchemaConnector, field_id: GlobalId) -> ConnectorResult<String> {
    let logical_type = effective_property(validated, field_id, "type")
        .and_then(|p| literal_str(&p.values))
        .expect("phase 8 guarantees every realized field has an effective `type`");
    let size = effective_property(validated, field_id, "size").and_then(|p| literal_int(&p.values)).map(|n| n as u32);
    // The grammar's `precision` property is a single digit count; there is
    // no separate scale, so it is threaded through as `(precision, 0)`.
    let precision = effective_property(validated, field_id, "precision").and_then(|p| literal_int(&p.values)).map(|n| (n as u32, 0));
    connector.type_spec(logical_type, size, precision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::console_connector::ConsoleConnector;

    fn validated_from(files: impl IntoIterator<Item = (&'static str, &'static str)>, top: &'static str) -> sdl::ParserDatabase {
        let loader = sdl::MapSourceLoader::new(files);
        sdl::aggregate(&[PathBuf::from(top)], &[], &loader).unwrap()
    }

    #[test]
    fn field_type_spec_reads_own_type_and_size() {
        let db = validated_from(
            [(
                "a",
                indoc::indoc! {r#"
                    schema a {
                      guid = "00000000-0000-0000-0000-000000000000";
                      required fieldset t {
                        guid = "11111111-1111-1111-1111-111111111111";
                        field f {
                          type = "varchar";
                          size = 32;
                        }
                      }
                    }
                "#},
            )],
            "a",
        );
        let validated = sdl::compile(&db, false, &sdl::GenericTypeMap).expect("should compile cleanly");
        let table_id = validated.db.schema_root(validated.db.schema_by_package("a").unwrap());
        let table_id = validated.db.static_children(table_id).find(|id| validated.db.def(*id).name == "t").unwrap();
        let field_id = validated.attrs(table_id).effective_members["f"];

        let connector = ConsoleConnector;
        let spec = field_type_spec(&validated, &connector, field_id).unwrap();
        assert_eq!(spec, "varchar(32)");
    }

    #[test]
    fn field_type_spec_inherits_type_from_an_ancestor() {
        let db = validated_from(
            [(
                "a",
                indoc::indoc! {r#"
                    schema a {
                      guid = "00000000-0000-0000-0000-000000000000";
                      fieldset base {
                        field f {
                          type = "integer";
                        }
                      }
                      required fieldset t {
                        guid = "11111111-1111-1111-1111-111111111111";
                        ancestors = base;
                      }
                    }
                "#},
            )],
            "a",
        );
        let validated = sdl::compile(&db, false, &sdl::GenericTypeMap).expect("should compile cleanly");
        let table_id = validated.db.schema_root(validated.db.schema_by_package("a").unwrap());
        let table_id = validated.db.static_children(table_id).find(|id| validated.db.def(*id).name == "t").unwrap();
        let field_id = validated.attrs(table_id).effective_members["f"];

        let connector = ConsoleConnector;
        let spec = field_type_spec(&validated, &connector, field_id).unwrap();
        assert_eq!(spec, "integer");
    }
}
