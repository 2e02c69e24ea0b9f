//! The Parse Aggregator and the static half of the Name Resolver
//! (spec §4.1, §4.2).

mod aggregator;
mod containment;
mod ids;
mod loader;
mod resolver;

pub use aggregator::{aggregate, LoadedSchema};
pub use containment::ParentMap;
pub use ids::{GlobalId, SchemaIdx};
pub use loader::{FsSourceLoader, MapSourceLoader, SourceLoader};
pub use resolver::{bind_static, containers_from, BindStaticResult};

use rustc_hash::FxHashMap;

/// The flat, back-referenced set of schemas produced by the Parse
/// Aggregator, plus the static containment maps the Name Resolver needs.
pub struct ParserDatabase {
    schemas: Vec<LoadedSchema>,
    parent_maps: Vec<ParentMap>,
    package_index: FxHashMap<String, SchemaIdx>,
}

impl ParserDatabase {
    pub(crate) fn new(schemas: Vec<LoadedSchema>, package_index: FxHashMap<String, SchemaIdx>) -> Self {
        let parent_maps = schemas.iter().map(|s| ParentMap::build(&s.ast)).collect();
        ParserDatabase {
            schemas,
            parent_maps,
            package_index,
        }
    }

    pub fn schema(&self, idx: SchemaIdx) -> &LoadedSchema {
        &self.schemas[idx.index()]
    }

    pub fn schemas(&self) -> impl Iterator<Item = (SchemaIdx, &LoadedSchema)> {
        self.schemas.iter().enumerate().map(|(i, s)| (SchemaIdx(i as u32), s))
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    pub fn schema_by_package(&self, package_name: &str) -> Option<SchemaIdx> {
        self.package_index.get(package_name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn aggregates_a_required_import_chain() {
        let loader = MapSourceLoader::new([
            ("a", "use b as bb required;\nschema a {\n}\n"),
            ("b", "schema b {\n}\n"),
        ]);
        let db = aggregate(&[PathBuf::from("a")], &[], &loader).unwrap();
        assert_eq!(db.schema_count(), 3); // builtin core + a + b
        assert!(db.schema_by_package("a").is_some());
        assert!(db.schema_by_package("b").is_some());
    }

    #[test]
    fn detects_duplicate_package_names() {
        let loader = MapSourceLoader::new([
            ("a", "use c required;\nschema shared {\n}\n"),
            ("c", "schema shared {\n}\n"),
        ]);
        let err = aggregate(&[PathBuf::from("a")], &[], &loader).unwrap_err();
        assert!(err.has_errors());
    }

    #[test]
    fn reports_missing_schema_location() {
        let loader = MapSourceLoader::new([("a", "use missing required;\nschema a {\n}\n")]);
        let err = aggregate(&[PathBuf::from("a")], &[], &loader).unwrap_err();
        assert!(err.has_errors());
    }

    #[test]
    fn bind_static_resolves_through_containment() {
        let loader = MapSourceLoader::new([("a", "schema a {\n  fieldset t {\n    field f {\n    }\n  }\n}\n")]);
        let db = aggregate(&[PathBuf::from("a")], &[], &loader).unwrap();
        let a = db.schema_by_package("a").unwrap();
        let root = db.schema_root(a);
        let t = root_child(&db, root, "t");
        let name = schema_ast::NameRefAst {
            segments: vec!["t".into(), "f".into()],
            absolute: false,
            indirection: false,
            kind_filter: None,
            span: Default::default(),
        };
        let result = bind_static(&db, t, &name).unwrap();
        assert_eq!(db.def(result.target()).name, "f");
    }

    fn root_child(db: &ParserDatabase, container: GlobalId, name: &str) -> GlobalId {
        db.static_children(container).find(|c| db.def(*c).name == name).unwrap()
    }
}
