use crate::ids::{GlobalId, SchemaIdx};
use crate::ParserDatabase;
use schema_ast::DefId;

/// Per-schema parent pointers, built once from the AST's syntactic
/// nesting (spec §9: "owner back-references are set once after
/// parsing").
#[derive(Debug, Default)]
pub struct ParentMap {
    parents: Vec<Option<DefId>>,
}

impl ParentMap {
    pub fn build(ast: &schema_ast::SchemaAst) -> Self {
        let mut parents = vec![None; ast.defs.len()];
        let mut stack = vec![ast.root];
        while let Some(id) = stack.pop() {
            for child in ast.children(id) {
                parents[child.index()] = Some(id);
                stack.push(child);
            }
        }
        ParentMap { parents }
    }

    pub fn parent_of(&self, id: DefId) -> Option<DefId> {
        self.parents[id.index()]
    }
}

impl ParserDatabase {
    /// The syntactic parent of `id`, or `None` if `id` is a schema root.
    pub fn parent(&self, id: GlobalId) -> Option<GlobalId> {
        self.parent_maps[id.schema.index()]
            .parent_of(id.def)
            .map(|def| GlobalId::new(id.schema, def))
    }

    /// Direct syntactic (AST) children of `id`.
    pub fn static_children(&self, id: GlobalId) -> impl Iterator<Item = GlobalId> + '_ {
        self.schema(id.schema)
            .ast
            .children(id.def)
            .map(move |def| GlobalId::new(id.schema, def))
    }

    pub fn def(&self, id: GlobalId) -> &schema_ast::DefinitionAst {
        self.schema(id.schema).ast.def(id.def)
    }

    pub fn schema_root(&self, schema: SchemaIdx) -> GlobalId {
        GlobalId::new(schema, self.schema(schema).ast.root)
    }

    /// Whether `ancestor` statically contains `descendant` (reflexive:
    /// `ancestor == descendant` counts), per spec's containment-cycle
    /// invariants ("A declaration cannot statically contain its own
    /// specification, implementation, ancestor, or descendant").
    pub fn statically_contains(&self, ancestor: GlobalId, descendant: GlobalId) -> bool {
        if ancestor.schema != descendant.schema {
            return false;
        }
        let mut current = Some(descendant);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }
}
