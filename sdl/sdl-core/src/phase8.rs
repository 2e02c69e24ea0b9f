//! Phase 8 - vendor-specific checks (spec §4.3).

use crate::compiler::Compiler;
use crate::properties::{effective_property, literal_str, EffectiveProperty};
use crate::vendor::VendorTypeMap;
use diagnostics::Code;
use schema_ast::DefinitionKind;

pub fn run(c: &mut Compiler, vendor: &dyn VendorTypeMap) {
    for id in c.all_defs() {
        if c.db.def(id).kind != DefinitionKind::Field || !c.attrs(id).realized {
            continue;
        }

        let type_name = match effective_property(c, id, "type") {
            EffectiveProperty::Local(_, _, p) | EffectiveProperty::Inherited(_, _, p) => p.values.first().and_then(literal_str).map(str::to_owned),
            EffectiveProperty::Deleted | EffectiveProperty::Absent => None,
        };
        let Some(type_name) = type_name else {
            c.error(Code(8, 1, 1), id, "realized field has no `type`");
            continue;
        };

        let Some(req) = vendor.resolve(&type_name) else {
            c.error(Code(8, 1, 2), id, format!("type `{type_name}` is not known to the target vendor"));
            continue;
        };

        if req.needs_size && !has_effective(c, id, "size") {
            c.error(Code(8, 1, 3), id, format!("type `{type_name}` requires a `size`"));
        }
        if req.needs_precision && !has_effective(c, id, "precision") {
            c.error(Code(8, 1, 4), id, format!("type `{type_name}` requires a `precision`"));
        }
    }
}

fn has_effective(c: &Compiler<'_>, id: parser_database::GlobalId, name: &str) -> bool {
    !matches!(effective_property(c, id, name), EffectiveProperty::Absent | EffectiveProperty::Deleted)
}
