//! Phase 6 - required-realization check (spec §4.3, supplemented by the
//! `reqlevel` tri-state per SPEC_FULL.md §C.1).

use crate::compiler::Compiler;
use crate::model::ReqLevel;
use crate::properties::{effective_property, literal_str, EffectiveProperty};
use diagnostics::Code;
use parser_database::GlobalId;
use schema_ast::{DefinitionKind, Modifier};

/// The member's effective `reqlevel`, falling back to `Required`/`Optional`
/// from the boolean `required` modifier when the property is absent.
fn effective_reqlevel(c: &Compiler, member: GlobalId) -> ReqLevel {
    let from_property = match effective_property(c, member, "reqlevel") {
        EffectiveProperty::Local(_, _, p) | EffectiveProperty::Inherited(_, _, p) => p.values.first().and_then(literal_str).and_then(ReqLevel::parse),
        EffectiveProperty::Deleted | EffectiveProperty::Absent => None,
    };
    from_property.unwrap_or(if c.db.def(member).modifiers.contains(Modifier::Required) { ReqLevel::Required } else { ReqLevel::Optional })
}

pub fn run(c: &mut Compiler) {
    for id in c.all_defs() {
        if c.db.def(id).kind != DefinitionKind::FieldSet || !c.attrs(id).realized {
            continue;
        }
        let specs = c.attrs(id).specifications.clone();
        for spec in specs {
            let members: Vec<(String, GlobalId)> = c.attrs(spec).effective_members.iter().map(|(n, d)| (n.clone(), *d)).collect();
            for (name, member) in members {
                if c.attrs(member).realized {
                    continue;
                }
                match effective_reqlevel(c, member) {
                    ReqLevel::Required => {
                        c.error(Code(6, 1, 1), id, format!("required member `{name}` of specification `{}` is not realized", c.path_of(spec)));
                    }
                    ReqLevel::Desired => {
                        c.warning(Code(6, 1, 2), id, format!("desired member `{name}` of specification `{}` is not realized", c.path_of(spec)));
                    }
                    ReqLevel::Optional => {}
                }
            }
        }
    }

    for id in c.all_defs() {
        if c.db.def(id).kind == DefinitionKind::Field && c.attrs(id).realized && c.attrs(id).has_empty_references {
            c.error(Code(6, 2, 1), id, "a realized field's `references` was declared with zero arguments");
        }
    }
}
