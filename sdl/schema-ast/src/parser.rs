use crate::ast::*;
use crate::source_file::SourceFile;
use diagnostics::{Code, Diagnostics, SourcePosition};
use pest::Parser;
use pest::iterators::Pair;

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct PestSchemaParser;

/// Parse one source file's text into a [`SchemaAst`].
///
/// This is the narrow "concrete-syntax parser" collaborator mentioned in
/// spec §1 as out of the compiler's core scope; it never resolves a name,
/// only shapes the tree.
pub fn parse(source: &SourceFile) -> Result<SchemaAst, Diagnostics> {
    let mut diags = Diagnostics::new();

    let mut pairs = match PestSchemaParser::parse(Rule::file, source.as_str()) {
        Ok(pairs) => pairs,
        Err(err) => {
            let (line, column) = match err.line_col {
                pest::error::LineColLocation::Pos((l, c)) => (l, c),
                pest::error::LineColLocation::Span((l, c), _) => (l, c),
            };
            diags.push_error(
                Code(0, 1, 1),
                source.name(),
                SourcePosition::new(line as u32, column as u32),
                "",
                format!("syntax error: {err}"),
            );
            return Err(diags);
        }
    };

    let file_pair = pairs.next().expect("grammar guarantees a `file` pair");
    let mut builder = Builder::default();
    let mut uses = Vec::new();
    let mut root = None;

    for pair in file_pair.into_inner() {
        match pair.as_rule() {
            Rule::use_stmt => uses.push(builder.parse_use(pair)),
            Rule::schema_decl => root = Some(builder.parse_schema_decl(pair)),
            Rule::EOI => {}
            other => unreachable!("unexpected top-level rule {other:?}"),
        }
    }

    let root = root.expect("grammar guarantees exactly one schema_decl");

    Ok(SchemaAst {
        uses,
        defs: builder.defs,
        items: builder.items,
        root,
    })
}

#[derive(Default)]
struct Builder {
    defs: Vec<DefinitionAst>,
    items: Vec<ItemAst>,
}

impl Builder {
    fn span_of(pair: &Pair<'_, Rule>) -> Span {
        let span = pair.as_span();
        let (line, column) = span.start_pos().line_col();
        Span {
            start_offset: span.start(),
            end_offset: span.end(),
            start: SourcePosition::new(line as u32, column as u32),
        }
    }

    fn parse_use(&mut self, pair: Pair<'_, Rule>) -> UseAst {
        let span = Self::span_of(&pair);
        let mut path = String::new();
        let mut alias = None;
        let mut required = false;
        let mut first_ident_seen = false;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::dotted_ident if !first_ident_seen => {
                    path = inner.as_str().to_string();
                    first_ident_seen = true;
                }
                Rule::ident => alias = Some(inner.as_str().to_string()),
                Rule::use_required => required = true,
                _ => {}
            }
        }

        UseAst {
            path,
            alias,
            required,
            span,
        }
    }

    fn parse_schema_decl(&mut self, pair: Pair<'_, Rule>) -> DefId {
        self.parse_definition_like(pair, DefinitionKind::Schema)
    }

    fn parse_definition(&mut self, pair: Pair<'_, Rule>) -> DefId {
        let span = Self::span_of(&pair);
        let mut inner = pair.into_inner().peekable();
        let mut modifiers = ModifierSet::default();

        while let Some(p) = inner.peek() {
            if p.as_rule() == Rule::modifier {
                push_modifier(&mut modifiers, inner.next().unwrap().as_str());
            } else {
                break;
            }
        }

        let kind_pair = inner.next().expect("def_kind");
        let kind = match kind_pair.as_str() {
            "schema" => DefinitionKind::Schema,
            "fieldset" => DefinitionKind::FieldSet,
            "field" => DefinitionKind::Field,
            "index" => DefinitionKind::Index,
            "constraint" => DefinitionKind::Constraint,
            other => unreachable!("unknown def_kind {other}"),
        };

        let name_pair = inner.next().expect("dotted_ident");
        let name = name_pair.as_str().to_string();

        let mut items = Vec::new();
        for item_pair in inner {
            items.push(self.parse_item(item_pair));
        }

        let def_id = DefId(self.defs.len() as u32);
        self.defs.push(DefinitionAst {
            kind,
            name,
            modifiers,
            items,
            span,
        });
        def_id
    }

    fn parse_definition_like(&mut self, pair: Pair<'_, Rule>, kind: DefinitionKind) -> DefId {
        let span = Self::span_of(&pair);
        let mut inner = pair.into_inner().peekable();
        let mut modifiers = ModifierSet::default();

        while let Some(p) = inner.peek() {
            if p.as_rule() == Rule::modifier {
                push_modifier(&mut modifiers, inner.next().unwrap().as_str());
            } else {
                break;
            }
        }

        let name_pair = inner.next().expect("dotted_ident");
        let name = name_pair.as_str().to_string();

        let mut items = Vec::new();
        for item_pair in inner {
            items.push(self.parse_item(item_pair));
        }

        let def_id = DefId(self.defs.len() as u32);
        self.defs.push(DefinitionAst {
            kind,
            name,
            modifiers,
            items,
            span,
        });
        def_id
    }

    fn parse_item(&mut self, pair: Pair<'_, Rule>) -> ItemId {
        debug_assert_eq!(pair.as_rule(), Rule::item);
        let inner = pair.into_inner().next().expect("item has one child");
        let item = match inner.as_rule() {
            Rule::definition => {
                let def_id = self.parse_definition(inner);
                ItemAst::Definition(def_id)
            }
            Rule::property => ItemAst::Property(self.parse_property(inner)),
            Rule::deletion => ItemAst::Deletion(self.parse_deletion(inner)),
            Rule::rename_stmt => ItemAst::Rename(self.parse_rename(inner)),
            other => unreachable!("unexpected item kind {other:?}"),
        };
        let item_id = ItemId(self.items.len() as u32);
        self.items.push(item);
        item_id
    }

    fn parse_property(&mut self, pair: Pair<'_, Rule>) -> PropertyAst {
        let span = Self::span_of(&pair);
        let mut inner = pair.into_inner();
        let name = inner.next().expect("property name").as_str().to_string();
        let values = inner.map(|v| self.parse_value(v)).collect();
        PropertyAst { name, values, span }
    }

    fn parse_deletion(&mut self, pair: Pair<'_, Rule>) -> DeletionAst {
        let span = Self::span_of(&pair);
        let name = pair.into_inner().next().expect("deletion name").as_str().to_string();
        DeletionAst { name, span }
    }

    fn parse_rename(&mut self, pair: Pair<'_, Rule>) -> RenameAst {
        let span = Self::span_of(&pair);
        let mut inner = pair.into_inner();
        let from = inner.next().expect("rename from").as_str().to_string();
        let to = inner.next().expect("rename to").as_str().to_string();
        RenameAst { from, to, span }
    }

    fn parse_value(&mut self, pair: Pair<'_, Rule>) -> ValueAst {
        debug_assert_eq!(pair.as_rule(), Rule::value);
        let inner = pair.into_inner().next().expect("value has one child");
        match inner.as_rule() {
            Rule::literal => ValueAst::Literal(parse_literal(inner)),
            Rule::name_ref => ValueAst::NameRef(parse_name_ref(inner)),
            other => unreachable!("unexpected value kind {other:?}"),
        }
    }
}

fn push_modifier(set: &mut ModifierSet, text: &str) {
    match text {
        "abstract" => set.insert(Modifier::Abstract),
        "final" => set.insert(Modifier::Final),
        "required" => set.insert(Modifier::Required),
        other => unreachable!("unknown modifier {other}"),
    }
}

fn parse_literal(pair: Pair<'_, Rule>) -> LiteralAst {
    let inner = pair.into_inner().next().expect("literal has one child");
    match inner.as_rule() {
        Rule::float_lit => LiteralAst::Float(inner.as_str().parse().expect("grammar guarantees valid float")),
        Rule::int_lit => LiteralAst::Int(inner.as_str().parse().expect("grammar guarantees valid int")),
        Rule::bool_lit => LiteralAst::Bool(inner.as_str() == "true"),
        Rule::none_lit => LiteralAst::None,
        Rule::all_lit => LiteralAst::All,
        Rule::string_lit => LiteralAst::Str(unescape_string(inner.as_str())),
        other => unreachable!("unexpected literal kind {other:?}"),
    }
}

fn unescape_string(raw: &str) -> String {
    let stripped = if let Some(s) = raw.strip_prefix("\"\"\"").and_then(|s| s.strip_suffix("\"\"\"")) {
        s
    } else {
        raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(raw)
    };

    let mut out = String::with_capacity(stripped.len());
    let mut chars = stripped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_name_ref(pair: Pair<'_, Rule>) -> NameRefAst {
    let span = Builder::span_of(&pair);
    let raw = pair.as_str();
    let indirection = raw.starts_with('=');

    let mut inner = pair.into_inner();
    let dotted = inner.next().expect("name_ref dotted_ident").as_str();
    let kind_filter = inner.next().map(|p| NameKind::parse(p.as_str()).expect("grammar-valid kind filter"));

    let mut segments: Vec<String> = dotted.split('.').map(|s| s.to_string()).collect();
    let absolute = segments.first().map(|s| s == "schema").unwrap_or(false) && segments.len() > 1;
    if absolute {
        segments.remove(0);
    }

    NameRefAst {
        segments,
        absolute,
        indirection,
        kind_filter,
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(s: &'static str) -> SourceFile {
        SourceFile::new_static("test.sdl", s)
    }

    #[test]
    fn parses_minimal_schema() {
        let ast = parse(&src("schema a { }")).unwrap();
        assert_eq!(ast.root().kind, DefinitionKind::Schema);
        assert_eq!(ast.root().name, "a");
    }

    #[test]
    fn parses_use_with_alias_and_required() {
        let ast = parse(&src("use b as bb required;\nschema a { }")).unwrap();
        assert_eq!(ast.uses.len(), 1);
        assert_eq!(ast.uses[0].path, "b");
        assert_eq!(ast.uses[0].alias.as_deref(), Some("bb"));
    }

    #[test]
    fn parses_nested_fieldset_with_field_and_property() {
        let ast = parse(&src(
            r#"
            schema a {
                required fieldset t {
                    field f {
                        type = integer;
                    }
                }
            }
            "#,
        ))
        .unwrap();
        let root = ast.root();
        let fieldset_id = ast.children(ast.root).next().unwrap();
        let fieldset = ast.def(fieldset_id);
        assert_eq!(fieldset.kind, DefinitionKind::FieldSet);
        assert_eq!(fieldset.name, "t");
        assert!(fieldset.modifiers.contains(Modifier::Required));
        let field_id = ast.children(fieldset_id).next().unwrap();
        assert_eq!(ast.def(field_id).name, "f");
        let _ = root;
    }

    #[test]
    fn parses_implementation_indirection_and_kind_filter() {
        let ast = parse(&src(
            r#"
            schema a {
                field f {
                    references = =iface[fieldset];
                }
            }
            "#,
        ))
        .unwrap();
        let field_id = ast.children(ast.root).next().unwrap();
        let prop_item = ast.def(field_id).items[0];
        match ast.item(prop_item) {
            ItemAst::Property(p) => match &p.values[0] {
                ValueAst::NameRef(r) => {
                    assert!(r.indirection);
                    assert_eq!(r.kind_filter, Some(NameKind::FieldSet));
                    assert_eq!(r.text(), "iface");
                }
                _ => panic!("expected name ref"),
            },
            _ => panic!("expected property"),
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse(&src("schema a {")).is_err());
    }
}
