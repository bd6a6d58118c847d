//! Go composite literal syntax

use super::LiteralSyntax;
use crate::schema::{Field, SchemaNode};

pub(super) struct GoSyntax;

impl LiteralSyntax for GoSyntax {
    fn indent(&self) -> &'static str {
        "\t"
    }

    fn comment(&self, text: &str) -> String {
        format!("// {}", text)
    }

    fn open_root(&self, node: &SchemaNode) -> String {
        format!("{}{{", node.name)
    }

    /// The written type keeps package qualifiers and anonymous struct bodies
    fn open_field(&self, field: &Field) -> String {
        let amp = if field.indirect { "&" } else { "" };
        format!("{}: {}{}{{", field.name, amp, field.type_name)
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
