//! Schema walking: flatten records into leaf field paths
//!
//! Two traversal modes share one recursion:
//! - [`flatten`] collects every leaf as a [`FieldPath`]
//! - [`walk`] fires enter/leaf/exit callbacks so a renderer can rebuild
//!   nesting without materializing another tree

use crate::error::{Error, Result};
use crate::schema::{Field, FieldPath, SchemaNode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which nested records are descended into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WalkPolicy {
    /// Maximum number of nested records along one path
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// If non-empty, only records declared in these namespaces are flattened
    #[serde(default)]
    pub flatten_namespaces: Vec<String>,

    /// Record types always treated as opaque leaves
    #[serde(default)]
    pub opaque_types: Vec<String>,

    /// Extra package directories searched for qualified field types
    #[serde(default)]
    pub packages: Vec<String>,
}

fn default_max_depth() -> usize {
    32
}

impl Default for WalkPolicy {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            flatten_namespaces: Vec::new(),
            opaque_types: Vec::new(),
            packages: Vec::new(),
        }
    }
}

impl WalkPolicy {
    /// Whether a resolved record belongs to the project and is flattened
    pub fn is_local(&self, node: &SchemaNode) -> bool {
        if self.opaque_types.iter().any(|t| t == &node.name) {
            return false;
        }
        self.flatten_namespaces.is_empty()
            || self.flatten_namespaces.iter().any(|ns| ns == &node.namespace)
    }

    fn descend_into<'a>(&self, field: &'a Field) -> Option<&'a SchemaNode> {
        field.as_record().filter(|node| self.is_local(node))
    }
}

/// Callbacks fired by [`walk`]
///
/// `path` is the stack of field names from the root down to (and including)
/// the current field.
pub trait FieldVisitor {
    fn enter_record(&mut self, path: &[&str], field: &Field, node: &SchemaNode);
    fn leaf(&mut self, path: &[&str], field: &Field);
    fn exit_record(&mut self, path: &[&str], field: &Field, node: &SchemaNode);
}

/// Walk a schema in declaration order
pub fn walk<V: FieldVisitor>(node: &SchemaNode, policy: &WalkPolicy, visitor: &mut V) -> Result<()> {
    let mut stack = Vec::new();
    walk_node(node, policy, visitor, &mut stack)
}

fn walk_node<'a, V: FieldVisitor>(
    node: &'a SchemaNode,
    policy: &WalkPolicy,
    visitor: &mut V,
    stack: &mut Vec<&'a str>,
) -> Result<()> {
    for field in &node.fields {
        stack.push(&field.name);
        match policy.descend_into(field) {
            Some(child) => {
                if stack.len() > policy.max_depth {
                    return Err(Error::DepthExceeded {
                        max_depth: policy.max_depth,
                        path: stack.join("."),
                    });
                }
                visitor.enter_record(stack, field, child);
                walk_node(child, policy, visitor, stack)?;
                visitor.exit_record(stack, field, child);
            }
            None => visitor.leaf(stack, field),
        }
        stack.pop();
    }
    Ok(())
}

struct LeafCollector<'r> {
    root: &'r str,
    leaves: Vec<FieldPath>,
}

impl FieldVisitor for LeafCollector<'_> {
    fn enter_record(&mut self, _path: &[&str], _field: &Field, _node: &SchemaNode) {}

    fn leaf(&mut self, path: &[&str], _field: &Field) {
        self.leaves.push(FieldPath::new(self.root, path));
    }

    fn exit_record(&mut self, _path: &[&str], _field: &Field, _node: &SchemaNode) {}
}

/// Flatten a schema into its leaf paths under `root` (e.g. `x` or `y`)
pub fn flatten(node: &SchemaNode, root: &str, policy: &WalkPolicy) -> Result<Vec<FieldPath>> {
    let mut collector = LeafCollector {
        root,
        leaves: Vec::new(),
    };
    walk(node, policy, &mut collector)?;
    tracing::debug!(
        record = %node.name,
        root,
        leaves = collector.leaves.len(),
        "flattened schema"
    );
    Ok(collector.leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_record() -> SchemaNode {
        let address = SchemaNode::new("Address", "model")
            .with(Field::scalar("Street", "string"))
            .with(Field::scalar("City", "string"));
        let stamp = SchemaNode::new("Time", "time").with(Field::scalar("wall", "uint64"));
        SchemaNode::new("User", "model")
            .with(Field::scalar("ID", "int64"))
            .with(Field::record("Home", address).indirect())
            .with(Field::record("CreatedAt", stamp))
    }

    fn texts(paths: &[FieldPath]) -> Vec<&str> {
        paths.iter().map(FieldPath::as_str).collect()
    }

    #[test]
    fn test_flatten_descends_into_records() {
        let leaves = flatten(&user_record(), "x", &WalkPolicy::default()).unwrap();
        assert_eq!(
            texts(&leaves),
            vec!["x.ID", "x.Home.Street", "x.Home.City", "x.CreatedAt.wall"]
        );
    }

    #[test]
    fn test_flatten_namespace_allow_list() {
        let policy = WalkPolicy {
            flatten_namespaces: vec!["model".into()],
            ..Default::default()
        };
        let leaves = flatten(&user_record(), "y", &policy).unwrap();
        assert_eq!(
            texts(&leaves),
            vec!["y.ID", "y.Home.Street", "y.Home.City", "y.CreatedAt"]
        );
    }

    #[test]
    fn test_flatten_opaque_types() {
        let policy = WalkPolicy {
            opaque_types: vec!["Address".into(), "Time".into()],
            ..Default::default()
        };
        let leaves = flatten(&user_record(), "x", &policy).unwrap();
        assert_eq!(texts(&leaves), vec!["x.ID", "x.Home", "x.CreatedAt"]);
    }

    #[test]
    fn test_depth_limit() {
        let mut node = SchemaNode::new("L0", "m").with(Field::scalar("v", "int"));
        for i in 1..=4 {
            node = SchemaNode::new(format!("L{}", i), "m").with(Field::record("n", node));
        }
        let policy = WalkPolicy {
            max_depth: 3,
            ..Default::default()
        };
        let err = flatten(&node, "x", &policy).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { max_depth: 3, ref path } if path == "n.n.n.n"));

        let policy = WalkPolicy {
            max_depth: 4,
            ..Default::default()
        };
        let leaves = flatten(&node, "x", &policy).unwrap();
        assert_eq!(texts(&leaves), vec!["x.n.n.n.n.v"]);
    }

    #[test]
    fn test_empty_record_has_no_leaves() {
        let node = SchemaNode::new("Empty", "m");
        assert!(flatten(&node, "x", &WalkPolicy::default()).unwrap().is_empty());
    }

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl FieldVisitor for Trace {
        fn enter_record(&mut self, path: &[&str], _field: &Field, node: &SchemaNode) {
            self.0.push(format!("enter {} {}", path.join("."), node.name));
        }
        fn leaf(&mut self, path: &[&str], _field: &Field) {
            self.0.push(format!("leaf {}", path.join(".")));
        }
        fn exit_record(&mut self, path: &[&str], _field: &Field, _node: &SchemaNode) {
            self.0.push(format!("exit {}", path.join(".")));
        }
    }

    #[test]
    fn test_walk_callback_order() {
        let mut trace = Trace::default();
        let policy = WalkPolicy {
            opaque_types: vec!["Time".into()],
            ..Default::default()
        };
        walk(&user_record(), &policy, &mut trace).unwrap();
        assert_eq!(
            trace.0,
            vec![
                "leaf ID",
                "enter Home Address",
                "leaf Home.Street",
                "leaf Home.City",
                "exit Home",
                "leaf CreatedAt",
            ]
        );
    }
}
