//! Phase 2 - implementation tree (spec §4.3).

use crate::compiler::Compiler;
use crate::phase1::Phase1Output;
use crate::properties::find_properties;
use diagnostics::Code;
use parser_database::GlobalId;
use rustc_hash::{FxHashMap, FxHashSet};
use schema_ast::{Modifier, ValueAst};

pub fn run(c: &mut Compiler, phase1: &Phase1Output) {
    // (a) multiple implementors.
    let mut direct_implementor: FxHashMap<GlobalId, GlobalId> = FxHashMap::default();
    for (target, candidates) in &phase1.implements_candidates {
        if candidates.len() > 1 {
            for &cand in candidates {
                c.error(
                    Code(2, 1, 1),
                    cand,
                    format!("`{}` already has a direct implementor; only one is allowed", c.path_of(*target)),
                );
            }
        }
        direct_implementor.insert(*target, candidates[0]);
    }

    // (b) forbid implementing a declaration whose raw `ancestors` list
    // contains any implementation-indirected element.
    for (&target, candidates) in &phase1.implements_candidates {
        let raw_ancestors: Vec<ValueAst> = find_properties(c.db, target, "ancestors").into_iter().flat_map(|(_, p)| p.values.clone()).collect();
        let has_indirection = raw_ancestors.iter().any(|v| matches!(v, ValueAst::NameRef(n) if n.indirection));
        if has_indirection {
            for &cand in candidates {
                c.error(
                    Code(2, 2, 1),
                    cand,
                    format!("cannot implement `{}`: its ancestor list uses `=` indirection", c.path_of(target)),
                );
            }
        }
    }

    for (target, implementor) in &direct_implementor {
        c.attrs_mut(*target).direct_implementor = Some(*implementor);
    }

    // (c) final implementor: follow the chain to a fixed point.
    let all = c.all_defs();
    for id in &all {
        let final_impl = resolve_final_implementor(c, &direct_implementor, *id);
        c.attrs_mut(*id).final_implementor = Some(final_impl);
    }

    // (d) abstract+required needs a non-self final implementor; `final`
    // cannot be implemented.
    for id in &all {
        let modifiers = c.db.def(*id).modifiers;
        let attrs = c.attrs(*id);
        if modifiers.contains(Modifier::Abstract) && modifiers.contains(Modifier::Required) && attrs.final_implementor() == *id {
            c.error(Code(2, 4, 1), *id, "abstract required declaration has no implementor");
        }
        if modifiers.contains(Modifier::Final) && direct_implementor.contains_key(id) {
            c.error(Code(2, 4, 2), *id, "a `final` declaration cannot be implemented");
        }
    }

    // (e) partition by final implementor; no two partition members may
    // statically contain each other; populate `specifications`.
    let mut partitions: FxHashMap<GlobalId, Vec<GlobalId>> = FxHashMap::default();
    for id in &all {
        partitions.entry(c.attrs(*id).final_implementor()).or_default().push(*id);
    }
    for members in partitions.values() {
        for (i, &a) in members.iter().enumerate() {
            for &b in members.iter().skip(i + 1) {
                if c.db.statically_contains(a, b) || c.db.statically_contains(b, a) {
                    c.error(Code(2, 5, 1), a, format!("`{}` and `{}` share a final implementor but statically contain each other", c.path_of(a), c.path_of(b)));
                }
            }
        }
        for &m in members {
            c.attrs_mut(m).specifications = members.clone();
        }
    }
}

fn resolve_final_implementor(c: &Compiler, direct_implementor: &FxHashMap<GlobalId, GlobalId>, start: GlobalId) -> GlobalId {
    let mut current = start;
    let mut seen = FxHashSet::default();
    seen.insert(current);
    while let Some(&next) = direct_implementor.get(&current) {
        if !seen.insert(next) {
            // A reported cycle; stop walking rather than loop forever.
            break;
        }
        current = next;
    }
    current
}
