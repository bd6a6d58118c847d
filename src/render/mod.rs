//! Mapping rendering: emit the destination as a literal skeleton
//!
//! Re-walks the destination schema with the enter/leaf/exit traversal and
//! writes a nested struct literal in the target language, with the matched
//! source path at each leaf. The output is meant to be pasted into a
//! conversion function and corrected by hand.

mod go;
mod rust;

use crate::error::{Error, Result};
use crate::matcher::{Binding, Bindings, MatchOptions, MatchReport};
use crate::schema::{Field, FieldPath, Schema, SchemaNode};
use crate::walker::{walk, FieldVisitor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Literal syntax to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Go,
    Rust,
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "go" | "golang" => Ok(Target::Go),
            "rust" | "rs" => Ok(Target::Rust),
            other => Err(Error::InvalidArguments(format!(
                "unknown target '{}' (use go or rust)",
                other
            ))),
        }
    }
}

/// Render configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenderConfig {
    #[serde(default)]
    pub target: Target,
    /// Indentation unit; the target's convention when unset
    #[serde(default)]
    pub indent: Option<String>,
    /// Written at leaves that have no source
    #[serde(default)]
    pub placeholder: String,
    /// Prefix the skeleton with a header naming both inputs
    #[serde(default)]
    pub provenance: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target: Target::Go,
            indent: None,
            placeholder: String::new(),
            provenance: false,
        }
    }
}

/// Per-language literal syntax
trait LiteralSyntax {
    fn indent(&self) -> &'static str;
    fn comment(&self, text: &str) -> String;
    fn open_root(&self, node: &SchemaNode) -> String;
    fn open_field(&self, field: &Field) -> String;
    fn leaf(&self, field: &Field, value: &str) -> String;
    fn close_field(&self, field: &Field) -> String;
    fn close_root(&self) -> String;
}

fn syntax_for(target: Target) -> &'static dyn LiteralSyntax {
    match target {
        Target::Go => &go::GoSyntax,
        Target::Rust => &rust::RustSyntax,
    }
}

struct SkeletonWriter<'a> {
    syntax: &'static dyn LiteralSyntax,
    indent: &'a str,
    placeholder: &'a str,
    root: &'a str,
    bindings: Bindings<'a>,
    depth: usize,
    out: String,
}

impl SkeletonWriter<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(self.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

impl FieldVisitor for SkeletonWriter<'_> {
    fn enter_record(&mut self, _path: &[&str], field: &Field, _node: &SchemaNode) {
        let text = self.syntax.open_field(field);
        self.line(&text);
        self.depth += 1;
    }

    fn leaf(&mut self, path: &[&str], field: &Field) {
        let key = FieldPath::new(self.root, path);
        let value = match self.bindings.get(key.as_str()) {
            Binding::Excluded => return,
            Binding::Matched(source) => source,
            Binding::Unmatched => self.placeholder,
        };
        let text = self.syntax.leaf(field, value);
        self.line(&text);
    }

    fn exit_record(&mut self, _path: &[&str], field: &Field, _node: &SchemaNode) {
        self.depth -= 1;
        let text = self.syntax.close_field(field);
        self.line(&text);
    }
}

/// Render the destination skeleton annotated with matched source paths
pub fn render(
    destination: &SchemaNode,
    report: &MatchReport,
    options: &MatchOptions,
    config: &RenderConfig,
) -> Result<String> {
    let syntax = syntax_for(config.target);
    let mut writer = SkeletonWriter {
        syntax,
        indent: config.indent.as_deref().unwrap_or(syntax.indent()),
        placeholder: &config.placeholder,
        root: &options.destination_root,
        bindings: report.bindings(),
        depth: 0,
        out: String::new(),
    };

    let open = syntax.open_root(destination);
    writer.line(&open);
    writer.depth = 1;
    walk(destination, &options.walk, &mut writer)?;
    writer.depth = 0;
    let close = syntax.close_root();
    writer.line(&close);
    Ok(writer.out)
}

/// [`render`], prefixed with a provenance header when configured
pub fn render_schemas(
    destination: &Schema,
    source: &Schema,
    report: &MatchReport,
    options: &MatchOptions,
    config: &RenderConfig,
) -> Result<String> {
    let body = render(&destination.root, report, options, config)?;
    if !config.provenance {
        return Ok(body);
    }

    let syntax = syntax_for(config.target);
    let header = [
        format!("Generated by repack {}; review before use.", crate::VERSION),
        format!(
            "destination: {} ({})",
            destination.locator, destination.source_hash
        ),
        format!("source: {} ({})", source.locator, source.source_hash),
        format!(
            "matched {} of {} fields, total cost {}",
            report.matched_count(),
            report.pairs.len(),
            report.total_cost
        ),
    ];
    let mut out = String::new();
    for line in header {
        out.push_str(&syntax.comment(&line));
        out.push('\n');
    }
    out.push_str(&body);
    Ok(out)
}
