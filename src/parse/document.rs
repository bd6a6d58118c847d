//! YAML/JSON schema documents
//!
//! ```yaml
//! namespace: repository
//! types:
//!   - name: UserRow
//!     fields:
//!       - name: Id
//!         type: int64
//!       - name: Home
//!         type: "*AddressRow"
//!   - name: AddressRow
//!     fields:
//!       - name: City
//!         type: string
//! ```
//!
//! A leading `*` or `&`, or a trailing `?`, marks one level of indirection.
//! `shared.AddressRow` names a type declared under namespace `shared`.
//! Field names must be unique within a type and must not contain `.`.

use super::{Declarations, RawField, TypeDecl, TypeRef};
use crate::error::{Error, Result};
use crate::schema::TypeLocator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Schema document file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDocument {
    /// Default namespace for every type in the document
    #[serde(default)]
    pub namespace: String,
    pub types: Vec<DocumentType>,
}

/// A record type in a schema document
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentType {
    pub name: String,
    /// Overrides the document namespace
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub fields: Vec<DocumentField>,
}

/// A field in a schema document
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentField {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
}

impl SchemaDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_norway::from_str(yaml).map_err(Error::Yaml)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    fn declarations(&self) -> Declarations {
        let mut decls = Declarations::default();
        for ty in &self.types {
            let fields = ty
                .fields
                .iter()
                .map(|f| RawField {
                    name: f.name.clone(),
                    ty: parse_type(&f.typ),
                })
                .collect();
            decls.insert(
                ty.name.clone(),
                TypeDecl {
                    namespace: ty.namespace.clone().unwrap_or_else(|| self.namespace.clone()),
                    fields,
                },
            );
        }
        decls
    }
}

fn parse_type(expr: &str) -> TypeRef {
    let expr = expr.trim();
    let (stripped, indirect) = if let Some(rest) = expr.strip_prefix(['*', '&']) {
        (rest, true)
    } else if let Some(rest) = expr.strip_suffix('?') {
        (rest, true)
    } else {
        (expr, false)
    };
    let ty = match stripped.split_once('.') {
        None if is_ident(stripped) => TypeRef::named(stripped),
        Some((namespace, name)) if is_ident(namespace) && is_ident(name) => {
            TypeRef::qualified(stripped, namespace, name)
        }
        _ => TypeRef::opaque(stripped),
    };
    if indirect {
        ty.indirect()
    } else {
        ty
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

pub(crate) fn declarations(
    locator: &TypeLocator,
    path: &Path,
) -> Result<(Declarations, Vec<String>)> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::load(locator, format!("{}: {}", path.display(), e)))?;
    let doc = if path.extension().is_some_and(|ext| ext == "json") {
        SchemaDocument::from_json(&content)
    } else {
        SchemaDocument::from_yaml(&content)
    }
    .map_err(|e| Error::load(locator, e))?;
    Ok((doc.declarations(), vec![content]))
}
