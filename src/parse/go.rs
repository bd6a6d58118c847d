//! Go struct declarations via tree-sitter-go

use super::{Declarations, RawField, SourceText, TypeDecl, TypeRef, TypeTarget};
use crate::error::{Error, Result};
use crate::schema::TypeLocator;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

pub(crate) fn declarations(
    locator: &TypeLocator,
    sources: &[SourceText],
) -> Result<(Declarations, Vec<String>)> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| Error::load(locator, format!("Failed to set language: {}", e)))?;

    let mut decls = Declarations::default();
    let mut texts = Vec::with_capacity(sources.len());
    for source in sources {
        let Some(tree) = parser.parse(&source.text, None) else {
            tracing::warn!(path = %source.path.display(), "failed to parse Go source, skipping");
            continue;
        };
        let root = tree.root_node();
        if root.has_error() {
            tracing::warn!(path = %source.path.display(), "Go source has syntax errors");
        }
        collect_structs(root, &source.text, &mut decls);
        texts.push(source.text.clone());
    }
    tracing::debug!(module = %locator.module, types = decls.len(), "collected Go structs");
    Ok((decls, texts))
}

fn text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn collect_structs(root: Node, source: &str, decls: &mut Declarations) {
    let mut package = String::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_clause" => {
                let mut pc = child.walk();
                if let Some(id) = child
                    .named_children(&mut pc)
                    .find(|n| n.kind() == "package_identifier")
                {
                    package = text(id, source).to_string();
                };
            }
            "import_declaration" => collect_imports(child, source, &mut decls.imports),
            "type_declaration" => {
                let mut tc = child.walk();
                for spec in child.named_children(&mut tc) {
                    if spec.kind() != "type_spec" {
                        continue;
                    }
                    let (Some(name), Some(ty)) = (
                        spec.child_by_field_name("name"),
                        spec.child_by_field_name("type"),
                    ) else {
                        continue;
                    };
                    if ty.kind() == "struct_type" {
                        decls.insert(
                            text(name, source).to_string(),
                            TypeDecl {
                                namespace: package.clone(),
                                fields: struct_fields(ty, source),
                            },
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

fn struct_fields(struct_type: Node, source: &str) -> Vec<RawField> {
    let mut fields = Vec::new();
    let mut cursor = struct_type.walk();
    let Some(list) = struct_type
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return fields;
    };

    let mut lc = list.walk();
    for decl in list.named_children(&mut lc) {
        if decl.kind() != "field_declaration" {
            continue;
        }
        let Some(ty_node) = decl.child_by_field_name("type") else {
            continue;
        };
        let mut nc = decl.walk();
        let names: Vec<String> = decl
            .children_by_field_name("name", &mut nc)
            .map(|n| text(n, source).to_string())
            .collect();

        if names.is_empty() {
            // embedded field: named after its type, `*` is a sibling token
            let mut ec = decl.walk();
            let pointer = decl.children(&mut ec).any(|c| c.kind() == "*");
            let mut ty = type_ref(ty_node, source, false);
            ty.indirect = pointer;
            let name = ty
                .display
                .rsplit('.')
                .next()
                .unwrap_or(&ty.display)
                .to_string();
            fields.push(RawField { name, ty });
        } else {
            let ty = type_ref(ty_node, source, true);
            for name in names {
                fields.push(RawField {
                    name,
                    ty: ty.clone(),
                });
            }
        }
    }
    fields
}

/// Import paths of an `import` declaration, single or grouped
fn collect_imports(decl: Node, source: &str, imports: &mut Vec<String>) {
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                if let Some(path) = child.child_by_field_name("path") {
                    let path = text(path, source).trim_matches(|c| c == '"' || c == '`');
                    if !imports.iter().any(|i| i == path) {
                        imports.push(path.to_string());
                    }
                }
            }
            "import_spec_list" => collect_imports(child, source, imports),
            _ => {}
        }
    }
}

/// Directories of the imports that belong to the enclosing `go.mod` module
pub(crate) fn module_packages(start: &Path, imports: &[String]) -> Vec<PathBuf> {
    let Some((root, module)) = find_module(start) else {
        return Vec::new();
    };
    imports
        .iter()
        .filter_map(|import| {
            let rest = import.strip_prefix(module.as_str())?.strip_prefix('/')?;
            let dir = root.join(rest);
            dir.is_dir().then_some(dir)
        })
        .collect()
}

/// The nearest `go.mod` at or above `start`, with its module path
fn find_module(start: &Path) -> Option<(PathBuf, String)> {
    let start = fs::canonicalize(start).ok()?;
    start.ancestors().find_map(|dir| {
        let content = fs::read_to_string(dir.join("go.mod")).ok()?;
        let module = content
            .lines()
            .find_map(|line| line.trim().strip_prefix("module "))?
            .trim()
            .trim_matches('"')
            .to_string();
        Some((dir.to_path_buf(), module))
    })
}

/// Classify a Go type expression, stripping one pointer level
fn type_ref(node: Node, source: &str, strip: bool) -> TypeRef {
    match node.kind() {
        "pointer_type" if strip => match node.named_child(0) {
            Some(inner) => type_ref(inner, source, false).indirect(),
            None => TypeRef::opaque(text(node, source)),
        },
        "parenthesized_type" => match node.named_child(0) {
            Some(inner) => type_ref(inner, source, strip),
            None => TypeRef::opaque(text(node, source)),
        },
        "type_identifier" => TypeRef::named(text(node, source)),
        "qualified_type" => match (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) {
            (Some(package), Some(name)) => {
                TypeRef::qualified(text(node, source), text(package, source), text(name, source))
            }
            _ => TypeRef::opaque(text(node, source)),
        },
        // the literal type is the only valid name for an anonymous struct
        "struct_type" => TypeRef {
            display: text(node, source).split_whitespace().collect::<Vec<_>>().join(" "),
            indirect: false,
            target: TypeTarget::Inline(struct_fields(node, source)),
        },
        _ => TypeRef::opaque(text(node, source)),
    }
}
