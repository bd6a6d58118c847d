// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # repack: struct-to-struct field mapping
//!
//! Given a destination record type and a source record type, repack
//! proposes which source field should populate each destination field and
//! prints the mapping, either as flat assignments or as a literal skeleton
//! to paste into a conversion function.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use repack::{match_schemas, render_schemas, MatchOptions, RenderConfig, SchemaLoader,
//!              SchemaSource, TypeLocator};
//!
//! let loader = SchemaLoader::default();
//! let dst = loader.load(&TypeLocator::parse("api/user.go#User")?)?;
//! let src = loader.load(&TypeLocator::parse("store/user.go#UserRow")?)?;
//!
//! let options = MatchOptions::default();
//! let report = match_schemas(&dst.root, &src.root, &options)?;
//! print!("{}", report.to_report());
//! print!("{}", render_schemas(&dst, &src, &report, &options, &RenderConfig::default())?);
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! locator ──► SchemaSource ──► SchemaNode ──► flatten ──► FieldPath leaves
//!                                                              │
//!                     CostModel ──► CostMatrix ──► solve ◄─────┘
//!                                                    │
//!                                               MatchReport ──► flat lines
//!                                                    │          --json
//!                                                    └────────► render skeleton
//! ```
//!
//! Leaves are scored by a weighted edit distance over the full path plus
//! the same distance over the last few characters, and paired by a
//! minimum-cost perfect assignment. Proposals are heuristic: review them.

pub mod config;
pub mod cost;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod parse;
pub mod render;
pub mod schema;
pub mod solver;
pub mod walker;

// Re-exports
pub use config::{Overrides, RepackConfig};
pub use cost::CostModel;
pub use error::{Error, Result};
pub use matcher::{
    match_leaves, match_schemas, Binding, Bindings, FieldPair, MatchOptions, MatchReport, Strategy,
};
pub use parse::{detect_format, Format, SchemaDocument, SchemaLoader, SchemaSource};
pub use render::{render, render_schemas, RenderConfig, Target};
pub use schema::{Field, FieldKind, FieldPath, Schema, SchemaNode, TypeLocator};
pub use solver::{solve, Assignment, CostMatrix};
pub use walker::{flatten, walk, FieldVisitor, WalkPolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
