//! Persistence (spec §6): the compiled parse result survives as a
//! gzip-compressed binary blob in a known row of `venus_core.sys_parameter`.

mod error;
mod loader;
mod snapshot;
mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use loader::OwnedSourceLoader;
pub use snapshot::{decode, encode, SourceSnapshot};
pub use store::{load_parsed_schema, save_parsed_schema, InMemoryParameterStore, SysParameterStore, PARSED_SCHEMA_KEY};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn build_db() -> sdl::ParserDatabase {
        let loader = sdl::MapSourceLoader::new([
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
        ]);
        sdl::aggregate(&[PathBuf::from("a")], &[], &loader).unwrap()
    }

    #[test]
    fn round_trips_through_encode_decode_and_reaggregation() {
        let db = build_db();
        let snapshot = SourceSnapshot::capture(&db);

        let bytes = encode(&snapshot).expect("encoding should succeed");
        let decoded = decode(&bytes).expect("decoding should succeed");
        assert_eq!(decoded.top_level, snapshot.top_level);
        assert_eq!(decoded.sources.len(), snapshot.sources.len());

        let reconstituted = decoded.reconstitute().expect("reaggregation should succeed");
        let validated = sdl::compile(&reconstituted, false, &sdl::GenericTypeMap).expect("recompilation should succeed");
        assert!(!validated.diagnostics.has_errors());
    }

    #[test]
    fn round_trips_through_the_parameter_store() {
        let db = build_db();
        let mut store = InMemoryParameterStore::default();
        assert!(load_parsed_schema(&store).unwrap().is_none());

        save_parsed_schema(&mut store, &db).expect("save should succeed");
        let loaded = load_parsed_schema(&store).expect("load should succeed").expect("a value was stored");

        let reconstituted = loaded.reconstitute().expect("reaggregation should succeed");
        assert!(reconstituted.schema_by_package("a").is_some());
        assert!(reconstituted.schema_by_package("b").is_some());
    }
}
