//! Rust struct declarations via tree-sitter-rust

use super::{Declarations, RawField, SourceText, TypeDecl, TypeRef};
use crate::error::{Error, Result};
use crate::schema::TypeLocator;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Wrappers stripped as one level of indirection
const INDIRECT_WRAPPERS: &[&str] = &["Option", "Box", "Rc", "Arc"];

pub(crate) fn declarations(
    locator: &TypeLocator,
    sources: &[SourceText],
) -> Result<(Declarations, Vec<String>)> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_rust::LANGUAGE.into())
        .map_err(|e| Error::load(locator, format!("Failed to set language: {}", e)))?;

    let mut decls = Declarations::default();
    let mut texts = Vec::with_capacity(sources.len());
    for source in sources {
        let Some(tree) = parser.parse(&source.text, None) else {
            tracing::warn!(path = %source.path.display(), "failed to parse Rust source, skipping");
            continue;
        };
        let namespace = module_name(&source.path);
        collect_structs(tree.root_node(), &source.text, &namespace, &mut decls);
        texts.push(source.text.clone());
    }
    tracing::debug!(module = %locator.module, types = decls.len(), "collected Rust structs");
    Ok((decls, texts))
}

fn text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Named-field structs at top level and inside inline `mod` blocks
fn collect_structs(parent: Node, source: &str, namespace: &str, decls: &mut Declarations) {
    let mut cursor = parent.walk();
    for child in parent.named_children(&mut cursor) {
        match child.kind() {
            "struct_item" => {
                let (Some(name), Some(body)) = (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("body"),
                ) else {
                    continue;
                };
                if body.kind() != "field_declaration_list" {
                    continue;
                }
                decls.insert(
                    text(name, source).to_string(),
                    TypeDecl {
                        namespace: namespace.to_string(),
                        fields: struct_fields(body, source),
                    },
                );
            }
            "mod_item" => {
                if let (Some(name), Some(body)) = (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("body"),
                ) {
                    let inner = format!("{}::{}", namespace, text(name, source));
                    collect_structs(body, source, &inner, decls);
                }
            }
            _ => {}
        }
    }
}

fn struct_fields(body: Node, source: &str) -> Vec<RawField> {
    let mut fields = Vec::new();
    let mut cursor = body.walk();
    for decl in body.named_children(&mut cursor) {
        if decl.kind() != "field_declaration" {
            continue;
        }
        let (Some(name), Some(ty)) = (
            decl.child_by_field_name("name"),
            decl.child_by_field_name("type"),
        ) else {
            continue;
        };
        fields.push(RawField {
            name: text(name, source).to_string(),
            ty: type_ref(ty, source, true),
        });
    }
    fields
}

/// Classify a Rust type, stripping one reference or wrapper level
fn type_ref(node: Node, source: &str, strip: bool) -> TypeRef {
    match node.kind() {
        "type_identifier" => TypeRef::named(text(node, source)),
        "scoped_type_identifier" => scoped_type(node, source),
        "reference_type" if strip => match node.child_by_field_name("type") {
            Some(inner) => type_ref(inner, source, false).indirect(),
            None => TypeRef::opaque(text(node, source)),
        },
        "generic_type" if strip => match wrapped_type(node, source) {
            Some(inner) => type_ref(inner, source, false).indirect(),
            None => TypeRef::opaque(text(node, source)),
        },
        _ => TypeRef::opaque(text(node, source)),
    }
}

/// `model::Customer` is looked up in module `model`; `self::`, `super::`
/// and `crate::` paths are looked up among the current declarations
fn scoped_type(node: Node, source: &str) -> TypeRef {
    let display = text(node, source);
    let Some(name) = node.child_by_field_name("name") else {
        return TypeRef::opaque(display);
    };
    let name = text(name, source);
    let module = node
        .child_by_field_name("path")
        .map(|p| text(p, source).rsplit("::").next().unwrap_or("").trim())
        .unwrap_or("");
    match module {
        "" => TypeRef::opaque(display),
        "self" | "super" | "crate" => TypeRef {
            display: display.to_string(),
            ..TypeRef::named(name)
        },
        module => TypeRef::qualified(display, module, name),
    }
}

/// Module name of a source file: its stem, or its directory for `mod.rs`
fn module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem != "mod" {
        return stem;
    }
    path.parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or(stem)
}

/// `<module>.rs` or `<module>/mod.rs` next to the loaded sources
pub(crate) fn sibling_modules(dir: &Path, modules: &BTreeSet<String>) -> Vec<PathBuf> {
    modules
        .iter()
        .filter_map(|module| {
            let file = dir.join(format!("{}.rs", module));
            if file.is_file() {
                return Some(file);
            }
            let nested = dir.join(module).join("mod.rs");
            nested.is_file().then_some(nested)
        })
        .collect()
}

/// `Option<T>`, `Box<T>`, ... → `T`
fn wrapped_type<'t>(node: Node<'t>, source: &str) -> Option<Node<'t>> {
    let base = node.child_by_field_name("type")?;
    let last = text(base, source).rsplit("::").next().unwrap_or("");
    if !INDIRECT_WRAPPERS.contains(&last) {
        return None;
    }
    let args = node.child_by_field_name("type_arguments")?;
    if args.named_child_count() != 1 {
        return None;
    }
    args.named_child(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, SchemaNode};
    use std::path::PathBuf;

    const MODEL: &str = r#"
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub billing: Option<Address>,
    pub shipping: Box<Address>,
    pub contact: &'static Contact,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

pub struct Address {
    street: String,
    city: String,
}

pub struct Point(i32, i32);

mod contact {
    pub struct Contact {
        pub email: String,
    }
}
"#;

    fn load(type_name: &str) -> Result<SchemaNode> {
        let locator = TypeLocator {
            module: "src/customer.rs".into(),
            type_name: type_name.into(),
        };
        let sources = vec![SourceText {
            path: PathBuf::from("src/customer.rs"),
            text: MODEL.to_string(),
        }];
        let (decls, _) = declarations(&locator, &sources)?;
        decls.resolve(&locator, &[])
    }

    #[test]
    fn test_named_struct_fields() {
        let node = load("Customer").unwrap();
        assert_eq!(node.namespace, "customer");
        let names: Vec<_> = node.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "billing", "shipping", "contact", "tags", "created_at"]
        );
    }

    #[test]
    fn test_wrappers_are_stripped_once() {
        let node = load("Customer").unwrap();
        for idx in [2, 3] {
            let field = &node.fields[idx];
            assert!(field.indirect, "{} should be indirect", field.name);
            assert_eq!(field.type_name, "Address");
            assert!(field.as_record().is_some());
        }
        let contact = &node.fields[4];
        assert!(contact.indirect);
        let record = contact.as_record().unwrap();
        assert_eq!(record.namespace, "customer::contact");
    }

    #[test]
    fn test_generic_and_foreign_types_are_leaves() {
        let node = load("Customer").unwrap();
        assert_eq!(node.fields[5].kind, FieldKind::Scalar);
        assert_eq!(node.fields[5].type_name, "Vec<String>");
        assert_eq!(node.fields[6].kind, FieldKind::Scalar);
        assert_eq!(node.fields[6].type_name, "DateTime<Utc>");
    }

    #[test]
    fn test_tuple_structs_are_not_records() {
        assert!(load("Point").is_err());
    }

    #[test]
    fn test_scoped_types() {
        let source = r#"
pub struct Order {
    pub buyer: Option<customer::Customer>,
    pub placed_at: chrono::NaiveDate,
    pub line: crate::Line,
}

pub struct Line {
    pub sku: String,
}
"#;
        let locator = TypeLocator {
            module: "src/shop/mod.rs".into(),
            type_name: "Order".into(),
        };
        let sources = vec![SourceText {
            path: PathBuf::from("src/shop/mod.rs"),
            text: source.to_string(),
        }];
        let (decls, _) = declarations(&locator, &sources).unwrap();
        assert_eq!(
            decls.qualifiers().into_iter().collect::<Vec<_>>(),
            vec!["chrono", "customer"]
        );

        let node = decls.resolve(&locator, &[]).unwrap();
        assert_eq!(node.namespace, "shop");
        assert!(node.fields[0].indirect);
        assert_eq!(node.fields[0].type_name, "customer::Customer");
        assert_eq!(node.fields[0].kind, FieldKind::Scalar);
        assert_eq!(node.fields[2].type_name, "crate::Line");
        assert_eq!(node.fields[2].as_record().unwrap().fields[0].name, "sku");
    }

    #[test]
    fn test_sibling_modules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("customer.rs"), "pub struct Customer {}").unwrap();
        std::fs::create_dir_all(dir.path().join("billing")).unwrap();
        std::fs::write(dir.path().join("billing/mod.rs"), "").unwrap();

        let modules: BTreeSet<String> = ["billing", "chrono", "customer"]
            .into_iter()
            .map(String::from)
            .collect();
        let found = sibling_modules(dir.path(), &modules);
        assert_eq!(
            found,
            vec![
                dir.path().join("billing").join("mod.rs"),
                dir.path().join("customer.rs"),
            ]
        );
        assert_eq!(module_name(&found[0]), "billing");
        assert_eq!(module_name(&found[1]), "customer");
    }
}
