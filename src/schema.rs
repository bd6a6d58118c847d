//! Record schemas: the input model of the matching engine
//!
//! A schema is an ordered tree of named fields. Leaves are scalar or opaque
//! types; interior nodes are nested records that a `SchemaSource` was able
//! to resolve. The engine only reads these trees.

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a record type lives: `<locator>#<TypeName>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TypeLocator {
    /// File, directory or module the type is declared in
    pub module: String,
    /// Type name inside that module
    pub type_name: String,
}

impl TypeLocator {
    /// Parse `<module>#<TypeName>`; exactly one `#` and no empty side.
    pub fn parse(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split('#').collect();
        match tokens.as_slice() {
            [module, type_name] if !module.is_empty() && !type_name.is_empty() => Ok(Self {
                module: module.to_string(),
                type_name: type_name.to_string(),
            }),
            _ => Err(Error::LocatorParse(s.to_string())),
        }
    }
}

impl fmt::Display for TypeLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.module, self.type_name)
    }
}

/// A record type with its fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaNode {
    pub name: String,
    /// Package, module or file the record was declared in
    #[serde(default)]
    pub namespace: String,
    pub fields: Vec<Field>,
}

/// One field of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub name: String,
    /// Short type name as declared, with one level of indirection stripped
    pub type_name: String,
    /// Declared behind a pointer, `Option`, `Box` or reference
    #[serde(default)]
    pub indirect: bool,
    pub kind: FieldKind,
}

/// Leaf or nested record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    Record(SchemaNode),
}

impl Field {
    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            indirect: false,
            kind: FieldKind::Scalar,
        }
    }

    pub fn record(name: impl Into<String>, node: SchemaNode) -> Self {
        Self {
            name: name.into(),
            type_name: node.name.clone(),
            indirect: false,
            kind: FieldKind::Record(node),
        }
    }

    pub fn indirect(mut self) -> Self {
        self.indirect = true;
        self
    }

    pub fn as_record(&self) -> Option<&SchemaNode> {
        match &self.kind {
            FieldKind::Record(node) => Some(node),
            FieldKind::Scalar => None,
        }
    }
}

impl SchemaNode {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            fields: Vec::new(),
        }
    }

    /// Builder: append a field
    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

/// A loaded root schema together with its provenance
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub locator: TypeLocator,
    pub root: SchemaNode,
    /// `sha256:` plus 16 hex chars over the source text the schema came from
    pub source_hash: String,
}

/// Dot-joined path from a schema root to a leaf, e.g. `x.Profile.Name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    text: String,
    depth: usize,
}

impl FieldPath {
    pub fn new<S: AsRef<str>>(root: &str, segments: &[S]) -> Self {
        let mut text = root.to_string();
        for seg in segments {
            text.push('.');
            text.push_str(seg.as_ref());
        }
        Self {
            text,
            depth: segments.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Field names below the root marker
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.text.split('.').skip(1)
    }

    /// Number of field names below the root marker
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<FieldPath> for String {
    fn from(p: FieldPath) -> Self {
        p.text
    }
}
