//! The per-file AST. Nodes are arena-indexed (spec §9, "Graph of
//! cross-references"): cross-links within a single parsed file are plain
//! `u32` indices into the file's own arenas, never pointers or `Rc`s.

use diagnostics::SourcePosition;

macro_rules! new_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

new_id_type!(DefId);
new_id_type!(ItemId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start_offset: usize,
    pub end_offset: usize,
    pub start: SourcePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Schema,
    FieldSet,
    Field,
    Index,
    Constraint,
}

impl DefinitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::Schema => "schema",
            DefinitionKind::FieldSet => "fieldset",
            DefinitionKind::Field => "field",
            DefinitionKind::Index => "index",
            DefinitionKind::Constraint => "constraint",
        }
    }
}

#[enumflags2::bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Abstract = 1,
    Final = 2,
    Required = 4,
}

/// A small, order-independent set of [`Modifier`]s.
pub type ModifierSet = enumflags2::BitFlags<Modifier>;

/// The kind filter that may be attached to a dotted name reference
/// (spec §3, "Name reference").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Schema,
    FieldSet,
    Field,
    Index,
    Property,
}

impl NameKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "schema" => Some(NameKind::Schema),
            "fieldset" => Some(NameKind::FieldSet),
            "field" => Some(NameKind::Field),
            "index" => Some(NameKind::Index),
            "property" => Some(NameKind::Property),
            _ => None,
        }
    }
}

/// A dotted-path name occurrence, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct NameRefAst {
    /// Dotted segments, with any leading `schema.` absolute marker and any
    /// leading `=` indirection marker already stripped.
    pub segments: Vec<String>,
    pub absolute: bool,
    /// `=X` indirection: resolve to the final implementor of `X`.
    pub indirection: bool,
    pub kind_filter: Option<NameKind>,
    pub span: Span,
}

impl NameRefAst {
    pub fn text(&self) -> String {
        self.segments.join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralAst {
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    All,
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueAst {
    Literal(LiteralAst),
    NameRef(NameRefAst),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAst {
    pub name: String,
    pub values: Vec<ValueAst>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletionAst {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameAst {
    pub from: String,
    pub to: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemAst {
    Definition(DefId),
    Property(PropertyAst),
    Deletion(DeletionAst),
    Rename(RenameAst),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionAst {
    pub kind: DefinitionKind,
    /// Local name for every kind except `Schema`, where this is the full
    /// dotted package name.
    pub name: String,
    pub modifiers: ModifierSet,
    pub items: Vec<ItemId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseAst {
    pub path: String,
    pub alias: Option<String>,
    pub required: bool,
    pub span: Span,
}

/// The parsed shape of one source file: a list of `use` imports and
/// exactly one top-level schema declaration.
#[derive(Debug, Clone)]
pub struct SchemaAst {
    pub uses: Vec<UseAst>,
    pub defs: Vec<DefinitionAst>,
    pub items: Vec<ItemAst>,
    pub root: DefId,
}

impl SchemaAst {
    pub fn def(&self, id: DefId) -> &DefinitionAst {
        &self.defs[id.index()]
    }

    pub fn item(&self, id: ItemId) -> &ItemAst {
        &self.items[id.index()]
    }

    pub fn root(&self) -> &DefinitionAst {
        self.def(self.root)
    }

    /// Iterate the immediate child definitions of `id` (sub-definitions
    /// only, skipping properties/deletions/renames).
    pub fn children(&self, id: DefId) -> impl Iterator<Item = DefId> + '_ {
        self.def(id).items.iter().filter_map(move |item_id| match self.item(*item_id) {
            ItemAst::Definition(child) => Some(*child),
            _ => None,
        })
    }
}
