//! Orchestration state shared by phases 1-8 (spec §4.3).

use crate::model::DefAttrs;
use crate::properties::path_of;
use diagnostics::{Code, Diagnostics, SourcePosition};
use parser_database::{GlobalId, ParserDatabase};
use rustc_hash::FxHashMap;

/// Identifies one `ValueAst::NameRef` occurrence: the definition that owns
/// the property, the property's position within that definition's item
/// list, and the value's position within the property's argument list.
pub type RefKey = (GlobalId, usize, usize);

pub struct Compiler<'db> {
    pub db: &'db ParserDatabase,
    pub diags: Diagnostics,
    pub strict: bool,
    pub attrs: FxHashMap<GlobalId, DefAttrs>,
    pub resolved: FxHashMap<RefKey, GlobalId>,
}

impl<'db> Compiler<'db> {
    pub fn new(db: &'db ParserDatabase, strict: bool) -> Self {
        let mut attrs = FxHashMap::default();
        for (idx, _) in db.schemas() {
            let root = db.schema_root(idx);
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                let toplevel = db.parent(id) == Some(root);
                attrs.insert(
                    id,
                    DefAttrs {
                        final_implementor: Some(id),
                        toplevel,
                        ..Default::default()
                    },
                );
                stack.extend(db.static_children(id));
            }
        }
        Compiler {
            db,
            diags: Diagnostics::new(),
            strict,
            attrs,
            resolved: FxHashMap::default(),
        }
    }

    pub fn attrs(&self, id: GlobalId) -> &DefAttrs {
        &self.attrs[&id]
    }

    pub fn attrs_mut(&mut self, id: GlobalId) -> &mut DefAttrs {
        self.attrs.get_mut(&id).expect("every definition has attrs from construction")
    }

    /// All definitions in the whole compilation, in schema load order and
    /// then pre-order AST traversal (stable iteration per spec §5).
    pub fn all_defs(&self) -> Vec<GlobalId> {
        let mut out = Vec::new();
        for (idx, _) in self.db.schemas() {
            let mut stack = vec![self.db.schema_root(idx)];
            let mut ordered = Vec::new();
            while let Some(id) = stack.pop() {
                ordered.push(id);
                let mut children: Vec<_> = self.db.static_children(id).collect();
                children.reverse();
                stack.extend(children);
            }
            ordered.reverse();
            out.extend(ordered);
        }
        out
    }

    pub fn file_of(&self, id: GlobalId) -> String {
        self.db.schema(id.schema).source.name().to_string()
    }

    pub fn pos_of(&self, id: GlobalId) -> SourcePosition {
        self.db.def(id).span.start
    }

    pub fn path_of(&self, id: GlobalId) -> String {
        path_of(self.db, id)
    }

    pub fn error(&mut self, code: Code, id: GlobalId, message: impl Into<String>) {
        let file = self.file_of(id);
        let pos = self.pos_of(id);
        let path = self.path_of(id);
        self.diags.push_error(code, file, pos, path, message);
    }

    pub fn warning(&mut self, code: Code, id: GlobalId, message: impl Into<String>) {
        let file = self.file_of(id);
        let pos = self.pos_of(id);
        let path = self.path_of(id);
        self.diags.push_warning(code, file, pos, path, message);
    }

    pub fn resolved_ref_value(&self, owner: GlobalId, item_index: usize, value_index: usize) -> Option<GlobalId> {
        self.resolved.get(&(owner, item_index, value_index)).copied()
    }

    pub fn should_abort(&self) -> bool {
        self.diags.should_abort(self.strict)
    }
}
