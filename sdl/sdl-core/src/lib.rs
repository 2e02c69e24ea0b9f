//! The Semantic Compiler (spec §4.3): eight ordered phases that validate a
//! [`parser_database::ParserDatabase`] and compute the derived attributes
//! the Instance and Upgrade Engines need - realized sets, final
//! implementors, effective members, physical-naming inputs.
//!
//! A phase aborts the remainder when it produces any error, or any
//! warning in strict mode (spec §4.3).

mod bind;
mod compiler;
mod model;
mod phase1;
mod phase2;
mod phase3;
mod phase4;
mod phase5;
mod phase6;
mod phase7;
mod phase8;
mod properties;
mod vendor;

pub use bind::{bind, BindResult};
pub use compiler::{Compiler, RefKey};
pub use model::{DefAttrs, RefAction, ReqLevel, ValidatedSchema};
pub use properties::{effective_property, find_properties, literal_bool, literal_str, path_of, EffectiveProperty, RESERVED_PROPERTY_NAMES};
pub use vendor::{GenericTypeMap, TypeRequirements, VendorTypeMap};

use diagnostics::Diagnostics;
use parser_database::ParserDatabase;

/// Run all eight phases over `db`, stopping at the first one that
/// produces an abort-worthy diagnostic set.
pub fn compile<'db>(db: &'db ParserDatabase, strict: bool, vendor: &dyn VendorTypeMap) -> Result<ValidatedSchema<'db>, Diagnostics> {
    let mut c = Compiler::new(db, strict);

    let phase1_out = phase1::run(&mut c);
    if c.should_abort() {
        return Err(c.diags);
    }

    phase2::run(&mut c, &phase1_out);
    if c.should_abort() {
        return Err(c.diags);
    }

    phase3::run(&mut c, &phase1_out);
    if c.should_abort() {
        return Err(c.diags);
    }

    phase4::run(&mut c);
    if c.should_abort() {
        return Err(c.diags);
    }

    phase5::run(&mut c);
    if c.should_abort() {
        return Err(c.diags);
    }

    phase6::run(&mut c);
    if c.should_abort() {
        return Err(c.diags);
    }

    phase7::run(&mut c);
    if c.should_abort() {
        return Err(c.diags);
    }

    phase8::run(&mut c, vendor);
    if c.should_abort() {
        return Err(c.diags);
    }

    Ok(ValidatedSchema {
        db,
        attrs: c.attrs,
        resolved: c.resolved,
        diagnostics: c.diags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser_database::{aggregate, MapSourceLoader};
    use std::path::PathBuf;

    fn compile_str(files: impl IntoIterator<Item = (&'static str, &'static str)>, top: &'static str) -> Result<(), Diagnostics> {
        let loader = MapSourceLoader::new(files);
        let db = aggregate(&[PathBuf::from(top)], &[], &loader).map_err(|_| Diagnostics::new())?;
        compile(&db, false, &GenericTypeMap).map(|_| ())
    }

    #[test]
    fn minimal_realization_scenario() {
        let result = compile_str(
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
        assert!(result.is_ok(), "expected a clean compile");
    }

    #[test]
    fn implementation_indirection_scenario() {
        let loader = MapSourceLoader::new([(
            "a",
            indoc::indoc! {r#"
                schema a {
                  guid = "00000000-0000-0000-0000-000000000000";
                  required abstract fieldset iface {
                    field f {
                      type = "integer";
                    }
                  }
                  required fieldset impl {
                    guid = "33333333-3333-3333-3333-333333333333";
                    ancestors = iface;
                    implements = iface;
                  }
                }
            "#},
        )]);
        let db = aggregate(&[PathBuf::from("a")], &[], &loader).unwrap();
        let result = compile(&db, false, &GenericTypeMap);
        assert!(result.is_ok(), "expected the reference to resolve through `impl` and compile cleanly");
    }

    #[test]
    fn detects_missing_guid() {
        let result = compile_str([("a", "use b required;\nschema a {\n}\n"), ("b", "schema b {\n  required fieldset t {\n    field f {\n      type = \"integer\";\n    }\n  }\n}\n")], "a");
        assert!(result.is_err());
    }

    #[test]
    fn detects_cycles_in_implements() {
        let loader = MapSourceLoader::new([(
            "a",
            indoc::indoc! {r#"
                schema a {
                  fieldset x {
                    implements = y;
                  }
                  fieldset y {
                    implements = x;
                  }
                }
            "#},
        )]);
        let db = aggregate(&[PathBuf::from("a")], &[], &loader).unwrap();
        let result = compile(&db, false, &GenericTypeMap);
        assert!(result.is_err());
    }
}
