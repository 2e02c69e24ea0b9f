use std::path::PathBuf;

#[test]
fn facade_reexports_compile_end_to_end() {
    let loader = sdl::MapSourceLoader::new([(
        "a",
        "schema a {\n  guid = \"00000000-0000-0000-0000-000000000000\";\n  required fieldset t {\n    guid = \"11111111-1111-1111-1111-111111111111\";\n    field f {\n      type = \"integer\";\n    }\n  }\n}\n",
    )]);
    let db = sdl::aggregate(&[PathBuf::from("a")], &[], &loader).expect("aggregation should succeed");
    let validated = sdl::compile(&db, false, &sdl::GenericTypeMap).expect("compilation should succeed");
    assert!(!validated.diagnostics.has_errors());
}
