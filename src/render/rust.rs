//! Rust struct expression syntax

use super::LiteralSyntax;
use crate::schema::{Field, SchemaNode};

pub(super) struct RustSyntax;

impl LiteralSyntax for RustSyntax {
    fn indent(&self) -> &'static str {
        "    "
    }

    fn comment(&self, text: &str) -> String {
        format!("// {}", text)
    }

    fn open_root(&self, node: &SchemaNode) -> String {
        format!("{} {{", node.name)
    }

    fn open_field(&self, field: &Field) -> String {
        format!("{}: {} {{", field.name, field.type_name)
    }

    fn leaf(&self, field: &Field, value: &str) -> String {
        format!("{}: {},", field.name, value)
    }

    fn close_field(&self, _field: &Field) -> String {
        "},".to_string()
    }

    fn close_root(&self) -> String {
        "}".to_string()
    }
}
