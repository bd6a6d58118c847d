//! Property-based tests for the matching engine
//!
//! Uses proptest to generate random schemas and weight matrices and check
//! the invariants the engine relies on

use proptest::prelude::*;
use repack::{flatten, solve, CostMatrix, CostModel, Field, SchemaNode, WalkPolicy};
use std::collections::HashSet;

fn any_node() -> impl Strategy<Value = SchemaNode> {
    let names = || prop::collection::btree_set("[A-Z][a-z]{1,4}", 0..5);
    let leaf = names().prop_map(|names| {
        names.into_iter().fold(SchemaNode::new("Leaf", "model"), |node, name| {
            node.with(Field::scalar(name, "string"))
        })
    });
    leaf.prop_recursive(3, 32, 4, move |inner| {
        (names(), prop::collection::vec(inner, 0..4)).prop_map(|(names, children)| {
            let mut node = SchemaNode::new("Branch", "model");
            for (i, name) in names.into_iter().enumerate() {
                node = match children.get(i) {
                    Some(child) => node.with(Field::record(name, child.clone())),
                    None => node.with(Field::scalar(name, "int")),
                };
            }
            node
        })
    })
}

fn scalar_count(node: &SchemaNode) -> usize {
    node.fields
        .iter()
        .map(|f| f.as_record().map_or(1, scalar_count))
        .sum()
}

fn any_matrix() -> impl Strategy<Value = Vec<Vec<i64>>> {
    (0usize..=6).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(-50i64..50, n), n)
    })
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for perm in permutations(n - 1) {
        for pos in 0..=perm.len() {
            let mut next = perm.clone();
            next.insert(pos, n - 1);
            out.push(next);
        }
    }
    out
}

proptest! {
    #[test]
    fn test_solution_is_permutation(rows in any_matrix()) {
        let n = rows.len();
        let solution = solve(&CostMatrix::from_rows(rows));
        prop_assert_eq!(solution.len(), n);
        let distinct: HashSet<_> = solution.iter().copied().collect();
        prop_assert_eq!(distinct.len(), n);
        prop_assert!(solution.iter().all(|&c| c < n));
    }

    #[test]
    fn test_solution_matches_brute_force(rows in any_matrix()) {
        let n = rows.len();
        let matrix = CostMatrix::from_rows(rows);
        let best = permutations(n)
            .iter()
            .map(|p| matrix.total(p))
            .max()
            .unwrap_or(0);
        prop_assert_eq!(matrix.total(&solve(&matrix)), best);
    }

    #[test]
    fn test_distance_symmetric(a in "[a-zA-Z.]{0,12}", b in "[a-zA-Z.]{0,12}") {
        let model = CostModel::default();
        prop_assert_eq!(model.distance(&a, &b), model.distance(&b, &a));
        prop_assert_eq!(model.distance(&a, &a), 0);
    }

    #[test]
    fn test_flatten_injective_and_deterministic(node in any_node()) {
        let policy = WalkPolicy::default();
        let first = flatten(&node, "x", &policy).unwrap();
        let second = flatten(&node, "x", &policy).unwrap();
        prop_assert_eq!(&first, &second);

        let distinct: HashSet<_> = first.iter().map(|p| p.as_str()).collect();
        prop_assert_eq!(distinct.len(), first.len());
        prop_assert_eq!(first.len(), scalar_count(&node));
        prop_assert!(first.iter().all(|p| p.as_str().starts_with("x.")));
    }
}
