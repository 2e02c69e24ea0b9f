//! Phase 5 - realization fixed-point (spec §4.3).

use crate::compiler::Compiler;
use diagnostics::Code;
use parser_database::{GlobalId, SchemaIdx};
use rustc_hash::FxHashSet;
use schema_ast::{DefinitionKind, Modifier};
use std::collections::VecDeque;

pub fn run(c: &mut Compiler) {
    let mut realized_schemas: FxHashSet<SchemaIdx> = c.db.schemas().filter(|(_, s)| s.top_level).map(|(idx, _)| idx).collect();

    loop {
        let mut grew = false;
        let snapshot: Vec<SchemaIdx> = realized_schemas.iter().copied().collect();
        for idx in snapshot {
            let schema = c.db.schema(idx);
            for (u, target) in schema.ast.uses.iter().zip(schema.use_targets.iter()) {
                let (Some(t), true) = (target, u.required) else { continue };
                if realized_schemas.insert(*t) {
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    let mut realized: FxHashSet<GlobalId> = FxHashSet::default();
    let mut worklist: VecDeque<GlobalId> = VecDeque::new();

    let mut mark = |id: GlobalId, realized: &mut FxHashSet<GlobalId>, worklist: &mut VecDeque<GlobalId>| {
        if realized.insert(id) {
            worklist.push_back(id);
        }
    };

    for &idx in &realized_schemas {
        let root = c.db.schema_root(idx);
        mark(root, &mut realized, &mut worklist);
        for child in c.db.static_children(root) {
            if c.db.def(child).kind == DefinitionKind::FieldSet && c.db.def(child).modifiers.contains(Modifier::Required) {
                let target = c.attrs(child).final_implementor();
                if !c.attrs(target).toplevel {
                    c.error(Code(5, 1, 1), child, "final implementor of a required top-level fieldset is not itself top-level");
                    continue;
                }
                mark(target, &mut realized, &mut worklist);
            }
        }
    }

    while let Some(id) = worklist.pop_front() {
        if c.db.def(id).kind == DefinitionKind::FieldSet {
            let members: Vec<GlobalId> = c.attrs(id).effective_members.values().copied().collect();
            for m in members {
                mark(m, &mut realized, &mut worklist);
            }
        }

        if c.db.def(id).kind == DefinitionKind::Field {
            if let Some(target) = c.attrs(id).references_target {
                let final_target = c.attrs(target).final_implementor();
                mark(final_target, &mut realized, &mut worklist);
            }
        }

        let specs = c.attrs(id).specifications.clone();
        for s in specs {
            mark(s, &mut realized, &mut worklist);
        }
    }

    for &id in &realized {
        c.attrs_mut(id).realized = true;
    }

    for &idx in &realized_schemas {
        c.attrs_mut(c.db.schema_root(idx)).realized = true;
    }

    for &id in &realized {
        let modifiers = c.db.def(id).modifiers;
        let attrs = c.attrs(id);
        if modifiers.contains(Modifier::Abstract) && attrs.final_implementor() == id {
            c.error(Code(5, 2, 1), id, "a self-implementing realized declaration cannot be `abstract`");
        }
    }
}
