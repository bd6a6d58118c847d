//! Schema introspection: turn a type locator into a [`Schema`]
//!
//! Every source format is reduced to a declaration table (type name →
//! ordered raw fields). One resolver then builds the `SchemaNode` tree from
//! that table, so the matching engine never sees source text.
//!
//! Supported: Go and Rust source via tree-sitter, and YAML/JSON schema
//! documents.

mod document;
mod go;
mod rust;

pub use document::{DocumentField, DocumentType, SchemaDocument};

use crate::error::{Error, Result};
use crate::schema::{Field, FieldKind, Schema, SchemaNode, TypeLocator};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves type locators into schemas
pub trait SchemaSource {
    fn load(&self, locator: &TypeLocator) -> Result<Schema>;
}

/// Input format of a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Go,
    Rust,
    Document,
    Unknown,
}

/// Detect the format from a file extension
pub fn detect_format(path: &str) -> Format {
    let ext = path.rsplit('.').next().unwrap_or("");
    match ext {
        "go" => Format::Go,
        "rs" => Format::Rust,
        "yaml" | "yml" | "json" => Format::Document,
        _ => Format::Unknown,
    }
}

/// Dispatches on the locator's file extension, or scans a directory for
/// Go and then Rust files
///
/// Qualified field types (`model.Profile`, `model::Profile`) are resolved
/// against packages of the same project: Go imports under the enclosing
/// `go.mod` module, Rust sibling modules, and any directory in `packages`.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    /// Declared types that are never resolved into records
    pub opaque_types: Vec<String>,
    /// Extra package directories (or files) searched for qualified types
    pub packages: Vec<PathBuf>,
}

impl SchemaLoader {
    pub fn new(opaque_types: Vec<String>) -> Self {
        Self {
            opaque_types,
            packages: Vec::new(),
        }
    }

    pub fn with_packages(mut self, packages: Vec<PathBuf>) -> Self {
        self.packages = packages;
        self
    }

    fn format_of(&self, locator: &TypeLocator) -> Result<Format> {
        let path = Path::new(&locator.module);
        if !path.is_dir() {
            return Ok(detect_format(&locator.module));
        }
        for format in [Format::Go, Format::Rust] {
            if !source_files(path, format)
                .map_err(|e| Error::load(locator, e))?
                .is_empty()
            {
                return Ok(format);
            }
        }
        Ok(Format::Unknown)
    }

    fn declarations(
        &self,
        locator: &TypeLocator,
        format: Format,
        path: &Path,
    ) -> Result<(Declarations, Vec<String>)> {
        match format {
            Format::Go => go::declarations(locator, &read_sources(locator, path, format)?),
            Format::Rust => rust::declarations(locator, &read_sources(locator, path, format)?),
            Format::Document => document::declarations(locator, path),
            Format::Unknown => Err(Error::load(
                locator,
                "cannot detect format (expected .go, .rs, .yaml, .yml, .json or a source directory)",
            )),
        }
    }

    /// Packages referenced by qualified types in `decls`, loaded from `path`
    fn discover(&self, format: Format, path: &Path, decls: &Declarations) -> Vec<PathBuf> {
        let base = if path.is_dir() {
            path.to_path_buf()
        } else {
            match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            }
        };
        match format {
            Format::Go => go::module_packages(&base, &decls.imports),
            Format::Rust => rust::sibling_modules(&base, &decls.qualifiers()),
            Format::Document | Format::Unknown => Vec::new(),
        }
    }
}

impl SchemaSource for SchemaLoader {
    fn load(&self, locator: &TypeLocator) -> Result<Schema> {
        let format = self.format_of(locator)?;
        let own = Path::new(&locator.module);
        let (mut decls, mut texts) = self.declarations(locator, format, own)?;

        let canonical = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        let mut seen = vec![canonical(own)];
        let mut pending: Vec<PathBuf> = self.packages.clone();
        pending.extend(self.discover(format, own, &decls));
        pending.reverse();

        while let Some(path) = pending.pop() {
            let path = canonical(&path);
            if seen.contains(&path) {
                continue;
            }
            seen.push(path.clone());
            let (package, package_texts) = self.declarations(locator, format, &path)?;
            tracing::debug!(package = %path.display(), types = package.len(), "loaded package");
            let mut next = self.discover(format, &path, &package);
            next.reverse();
            pending.extend(next);
            decls.add_package(package);
            texts.extend(package_texts);
        }

        let root = decls.resolve(locator, &self.opaque_types)?;
        tracing::info!(
            %locator,
            ?format,
            fields = root.fields.len(),
            "loaded schema"
        );
        Ok(Schema {
            locator: locator.clone(),
            root,
            source_hash: source_hash(&texts),
        })
    }
}

/// Source file contents in stable order, with their paths
pub(crate) struct SourceText {
    pub path: PathBuf,
    pub text: String,
}

fn source_files(dir: &Path, format: Format) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| detect_format(&p.to_string_lossy()) == format)
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            !(format == Format::Go && name.ends_with("_test.go"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_sources(locator: &TypeLocator, path: &Path, format: Format) -> Result<Vec<SourceText>> {
    let files = if path.is_dir() {
        source_files(path, format).map_err(|e| Error::load(locator, e))?
    } else {
        vec![path.to_path_buf()]
    };
    files
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path)
                .map_err(|e| Error::load(locator, format!("{}: {}", path.display(), e)))?;
            Ok(SourceText { path, text })
        })
        .collect()
}

fn source_hash(texts: &[String]) -> String {
    let mut hasher = Sha256::new();
    for text in texts {
        hasher.update(text.as_bytes());
    }
    format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
}

/// A field as declared, before resolution
#[derive(Debug, Clone)]
pub(crate) struct RawField {
    pub name: String,
    pub ty: TypeRef,
}

/// A field type with one level of indirection already stripped
#[derive(Debug, Clone)]
pub(crate) struct TypeRef {
    /// Type as written
    pub display: String,
    pub indirect: bool,
    pub target: TypeTarget,
}

#[derive(Debug, Clone)]
pub(crate) enum TypeTarget {
    /// Never a record (builtin, generic, collection, ...)
    Opaque,
    /// A bare name; a record if the enclosing package declares it
    Named(String),
    /// `pkg.T` or `pkg::T`; a record if a loaded package declares it
    Qualified { namespace: String, name: String },
    /// Anonymous inline record
    Inline(Vec<RawField>),
}

impl TypeRef {
    pub fn opaque(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            indirect: false,
            target: TypeTarget::Opaque,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display: name.clone(),
            indirect: false,
            target: TypeTarget::Named(name),
        }
    }

    pub fn qualified(
        display: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            display: display.into(),
            indirect: false,
            target: TypeTarget::Qualified {
                namespace: namespace.into(),
                name: name.into(),
            },
        }
    }

    pub fn indirect(mut self) -> Self {
        self.indirect = true;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TypeDecl {
    pub namespace: String,
    pub fields: Vec<RawField>,
}

/// Record declarations found in one locator's sources, plus the packages
/// its qualified types may come from
#[derive(Debug, Default)]
pub(crate) struct Declarations {
    types: HashMap<String, TypeDecl>,
    /// Import paths seen in the sources
    pub imports: Vec<String>,
    packages: Vec<Declarations>,
}

impl Declarations {
    /// Register a record; the first declaration of a name wins
    pub fn insert(&mut self, name: String, decl: TypeDecl) {
        if self.types.contains_key(&name) {
            tracing::warn!(type_name = %name, "duplicate declaration ignored");
            return;
        }
        self.types.insert(name, decl);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn add_package(&mut self, package: Declarations) {
        self.packages.push(package);
    }

    /// Namespaces named by qualified field types
    pub fn qualifiers(&self) -> BTreeSet<String> {
        fn collect(fields: &[RawField], out: &mut BTreeSet<String>) {
            for field in fields {
                match &field.ty.target {
                    TypeTarget::Qualified { namespace, .. } => {
                        out.insert(namespace.clone());
                    }
                    TypeTarget::Inline(inner) => collect(inner, out),
                    TypeTarget::Opaque | TypeTarget::Named(_) => {}
                }
            }
        }
        let mut out = BTreeSet::new();
        for decl in self.types.values() {
            collect(&decl.fields, &mut out);
        }
        out
    }

    /// The package and declaration behind `namespace.name`
    fn lookup_qualified(&self, namespace: &str, name: &str) -> Option<(&Declarations, &TypeDecl)> {
        std::iter::once(self)
            .chain(self.packages.iter())
            .find_map(|scope| {
                scope
                    .types
                    .get(name)
                    .filter(|decl| namespace_matches(&decl.namespace, namespace))
                    .map(|decl| (scope, decl))
            })
    }

    /// Build the schema tree rooted at the locator's type
    pub fn resolve(&self, locator: &TypeLocator, opaque_types: &[String]) -> Result<SchemaNode> {
        let decl = self.types.get(&locator.type_name).ok_or_else(|| {
            Error::load(
                locator,
                format!("no record type named '{}'", locator.type_name),
            )
        })?;
        let mut resolver = Resolver {
            root: self,
            locator,
            opaque_types,
            chain: vec![(decl.namespace.clone(), locator.type_name.clone())],
        };
        resolver.record(self, &locator.type_name, &decl.namespace, &decl.fields)
    }
}

/// `model` matches the namespaces `model` and `shop::model`
fn namespace_matches(declared: &str, qualifier: &str) -> bool {
    declared == qualifier
        || declared
            .strip_suffix(qualifier)
            .is_some_and(|rest| rest.ends_with("::"))
}

struct Resolver<'d> {
    root: &'d Declarations,
    locator: &'d TypeLocator,
    opaque_types: &'d [String],
    /// (namespace, name) of the records being resolved
    chain: Vec<(String, String)>,
}

impl<'d> Resolver<'d> {
    fn record(
        &mut self,
        scope: &'d Declarations,
        name: &str,
        namespace: &str,
        raw: &'d [RawField],
    ) -> Result<SchemaNode> {
        let mut node = SchemaNode::new(name, namespace);
        for field in raw {
            self.check_field_name(name, &node, &field.name)?;
            let kind = self.kind_of(scope, &field.ty, namespace)?;
            node.fields.push(Field {
                name: field.name.clone(),
                type_name: field.ty.display.clone(),
                indirect: field.ty.indirect,
                kind,
            });
        }
        Ok(node)
    }

    /// Field names become path segments, so they must be unique and dot-free
    fn check_field_name(&self, record: &str, node: &SchemaNode, field: &str) -> Result<()> {
        let problem = if field.is_empty() {
            "empty field name"
        } else if field.contains('.') {
            "field name contains '.'"
        } else if node.fields.iter().any(|f| f.name == field) {
            "duplicate field name"
        } else {
            return Ok(());
        };
        Err(Error::load(
            self.locator,
            format!("{} in {}: {:?}", problem, record, field),
        ))
    }

    fn kind_of(
        &mut self,
        scope: &'d Declarations,
        ty: &'d TypeRef,
        namespace: &str,
    ) -> Result<FieldKind> {
        match &ty.target {
            TypeTarget::Opaque => Ok(FieldKind::Scalar),
            TypeTarget::Inline(fields) => {
                let node = self.record(scope, &ty.display, namespace, fields)?;
                Ok(FieldKind::Record(node))
            }
            TypeTarget::Named(name) => {
                if self.is_opaque(name, &ty.display) {
                    return Ok(FieldKind::Scalar);
                }
                match scope.types.get(name) {
                    Some(decl) => self.nested(scope, name, decl),
                    None => Ok(FieldKind::Scalar),
                }
            }
            TypeTarget::Qualified {
                namespace: qualifier,
                name,
            } => {
                if self.is_opaque(name, &ty.display) {
                    return Ok(FieldKind::Scalar);
                }
                let root = self.root;
                match root.lookup_qualified(qualifier, name) {
                    Some((package, decl)) => self.nested(package, name, decl),
                    None => Ok(FieldKind::Scalar),
                }
            }
        }
    }

    fn is_opaque(&self, name: &str, display: &str) -> bool {
        self.opaque_types.iter().any(|t| t == name || t == display)
    }

    fn nested(&mut self, scope: &'d Declarations, name: &str, decl: &'d TypeDecl) -> Result<FieldKind> {
        let key = (decl.namespace.clone(), name.to_string());
        if self.chain.contains(&key) {
            let mut chain: Vec<String> = self.chain.iter().map(|(_, n)| n.clone()).collect();
            chain.push(name.to_string());
            return Err(Error::RecursiveSchema { chain });
        }
        self.chain.push(key);
        let node = self.record(scope, name, &decl.namespace, &decl.fields)?;
        self.chain.pop();
        Ok(FieldKind::Record(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decls(entries: Vec<(&str, Vec<RawField>)>) -> Declarations {
        let mut d = Declarations::default();
        for (name, fields) in entries {
            d.insert(
                name.to_string(),
                TypeDecl {
                    namespace: "model".into(),
                    fields,
                },
            );
        }
        d
    }

    fn raw(name: &str, ty: TypeRef) -> RawField {
        RawField {
            name: name.into(),
            ty,
        }
    }

    fn locator(type_name: &str) -> TypeLocator {
        TypeLocator {
            module: "model.go".into(),
            type_name: type_name.into(),
        }
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("model/user.go"), Format::Go);
        assert_eq!(detect_format("src/lib.rs"), Format::Rust);
        assert_eq!(detect_format("schema.yml"), Format::Document);
        assert_eq!(detect_format("schema.json"), Format::Document);
        assert_eq!(detect_format("README"), Format::Unknown);
    }

    #[test]
    fn test_resolve_nested_and_unknown_names() {
        let d = decls(vec![
            (
                "User",
                vec![
                    raw("ID", TypeRef::named("int64")),
                    raw("Home", TypeRef::named("Address").indirect()),
                    raw("Created", TypeRef::opaque("time.Time")),
                ],
            ),
            ("Address", vec![raw("City", TypeRef::named("string"))]),
        ]);
        let node = d.resolve(&locator("User"), &[]).unwrap();
        assert_eq!(node.fields.len(), 3);
        assert_eq!(node.fields[0].kind, FieldKind::Scalar);
        let home = &node.fields[1];
        assert!(home.indirect);
        assert_eq!(home.as_record().map(|n| n.name.as_str()), Some("Address"));
        assert_eq!(node.fields[2].type_name, "time.Time");
    }

    #[test]
    fn test_resolve_rejects_recursion() {
        let d = decls(vec![
            ("Node", vec![raw("Next", TypeRef::named("Link").indirect())]),
            ("Link", vec![raw("Node", TypeRef::named("Node"))]),
        ]);
        let err = d.resolve(&locator("Node"), &[]).unwrap_err();
        match err {
            Error::RecursiveSchema { chain } => assert_eq!(chain, vec!["Node", "Link", "Node"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_opaque_types_break_recursion() {
        let d = decls(vec![(
            "Node",
            vec![
                raw("Value", TypeRef::named("int")),
                raw("Next", TypeRef::named("Node").indirect()),
            ],
        )]);
        let node = d.resolve(&locator("Node"), &["Node".to_string()]).unwrap();
        assert_eq!(node.fields[1].kind, FieldKind::Scalar);
    }

    #[test]
    fn test_resolve_missing_type() {
        let d = decls(vec![]);
        let err = d.resolve(&locator("Ghost"), &[]).unwrap_err();
        assert!(err.to_string().contains("no record type named 'Ghost'"));
    }

    #[test]
    fn test_source_hash_format() {
        let hash = source_hash(&["package model".to_string()]);
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 16);
    }

    fn package(namespace: &str, entries: Vec<(&str, Vec<RawField>)>) -> Declarations {
        let mut d = Declarations::default();
        for (name, fields) in entries {
            d.insert(
                name.to_string(),
                TypeDecl {
                    namespace: namespace.into(),
                    fields,
                },
            );
        }
        d
    }

    #[test]
    fn test_qualified_types_resolve_in_their_package() {
        let mut d = package(
            "service",
            vec![(
                "Item",
                vec![
                    raw("Meta", TypeRef::qualified("model.Item", "model", "Item").indirect()),
                    raw("Stock", TypeRef::qualified("other.Stock", "other", "Stock")),
                ],
            )],
        );
        d.add_package(package(
            "shop::model",
            vec![
                ("Item", vec![raw("Sku", TypeRef::named("Code"))]),
                ("Code", vec![raw("Value", TypeRef::named("string"))]),
            ],
        ));

        // same type name in two packages is not a cycle
        let node = d.resolve(&locator("Item"), &[]).unwrap();
        let meta = node.fields[0].as_record().unwrap();
        assert_eq!(meta.namespace, "shop::model");
        assert_eq!(node.fields[0].type_name, "model.Item");
        let sku = meta.fields[0].as_record().unwrap();
        assert_eq!(sku.fields[0].name, "Value");
        assert_eq!(node.fields[1].kind, FieldKind::Scalar);
    }

    #[test]
    fn test_cross_package_recursion_is_rejected() {
        let mut d = package(
            "service",
            vec![("Item", vec![raw("Meta", TypeRef::qualified("model.Item", "model", "Item"))])],
        );
        d.add_package(package(
            "model",
            vec![("Item", vec![raw("Back", TypeRef::qualified("service.Item", "service", "Item"))])],
        ));
        let err = d.resolve(&locator("Item"), &[]).unwrap_err();
        assert_eq!(err.to_string(), "recursive schema: Item -> Item -> Item");
    }

    #[test]
    fn test_opaque_qualified_type() {
        let mut d = package(
            "service",
            vec![("Item", vec![raw("Meta", TypeRef::qualified("model.Item", "model", "Item"))])],
        );
        d.add_package(package("model", vec![("Item", vec![raw("Sku", TypeRef::named("string"))])]));
        let node = d
            .resolve(&locator("Item"), &["model.Item".to_string()])
            .unwrap();
        assert_eq!(node.fields[0].kind, FieldKind::Scalar);
    }

    #[test]
    fn test_namespace_matches_last_segments() {
        assert!(namespace_matches("model", "model"));
        assert!(namespace_matches("shop::model", "model"));
        assert!(!namespace_matches("shopmodel", "model"));
        assert!(!namespace_matches("model::shop", "model"));
    }

    #[rstest]
    #[case::duplicate("Name", "duplicate field name in User")]
    #[case::dotted("Home.City", "field name contains '.' in User")]
    #[case::empty("", "empty field name in User")]
    fn test_field_names_must_form_distinct_paths(#[case] name: &str, #[case] expected: &str) {
        let d = decls(vec![(
            "User",
            vec![
                raw("Name", TypeRef::named("string")),
                raw(name, TypeRef::named("string")),
            ],
        )]);
        let err = d.resolve(&locator("User"), &[]).unwrap_err();
        assert!(matches!(err, Error::SchemaLoad { .. }));
        assert!(err.to_string().contains(expected), "{}", err);
    }
}
