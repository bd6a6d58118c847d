//! Optimal assignment: Kuhn–Munkres (Hungarian method), O(n³)
//!
//! Works on a square matrix and maximizes the total weight. Callers feed
//! negated costs, so the maximum-weight perfect matching is the pairing of
//! least total dissimilarity. Unequal sides are squared off with zero
//! padding, and anything matched to padding is "no counterpart".

use crate::cost::CostModel;
use crate::schema::FieldPath;
use std::collections::VecDeque;

/// Square weight matrix, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    dim: usize,
    cells: Vec<i64>,
}

impl CostMatrix {
    /// Score every (destination, source) pair; padding cells stay 0
    pub fn build(dst: &[FieldPath], src: &[FieldPath], model: &CostModel) -> Self {
        let dim = dst.len().max(src.len());
        let mut cells = vec![0; dim * dim];
        for (i, d) in dst.iter().enumerate() {
            for (j, s) in src.iter().enumerate() {
                cells[i * dim + j] = -model.cost(d, s);
            }
        }
        Self { dim, cells }
    }

    /// Build from explicit rows. Rows must all have `rows.len()` entries.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Self {
        let dim = rows.len();
        debug_assert!(rows.iter().all(|r| r.len() == dim));
        Self {
            dim,
            cells: rows.into_iter().flatten().collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.cells[row * self.dim + col]
    }

    /// Sum of the cells chosen by a row → column permutation
    pub fn total(&self, solution: &[usize]) -> i64 {
        solution
            .iter()
            .enumerate()
            .map(|(row, &col)| self.get(row, col))
            .sum()
    }
}

/// Destination index → source index, `None` where only padding matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pairs: Vec<Option<usize>>,
}

impl Assignment {
    /// Drop padding rows and columns from a square solution
    pub fn from_solution(solution: &[usize], dst_len: usize, src_len: usize) -> Self {
        let pairs = solution
            .iter()
            .take(dst_len)
            .map(|&col| (col < src_len).then_some(col))
            .collect();
        Self { pairs }
    }

    pub fn from_pairs(pairs: Vec<Option<usize>>) -> Self {
        Self { pairs }
    }

    pub fn source_of(&self, dst: usize) -> Option<usize> {
        self.pairs.get(dst).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
        self.pairs.iter().copied().enumerate()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Maximum-weight perfect matching; returns the column chosen for each row
pub fn solve(matrix: &CostMatrix) -> Vec<usize> {
    let n = matrix.dim();
    let mut solver = Hungarian::new(matrix);
    for _ in 0..n {
        solver.augment();
    }
    solver
        .row_match
        .into_iter()
        .map(|col| col.unwrap_or_default())
        .collect()
}

struct Hungarian<'m> {
    m: &'m CostMatrix,
    n: usize,
    row_label: Vec<i64>,
    col_label: Vec<i64>,
    row_match: Vec<Option<usize>>,
    col_match: Vec<Option<usize>>,
}

/// Alternating tree grown from one free row
struct Tree {
    in_rows: Vec<bool>,
    in_cols: Vec<bool>,
    parent: Vec<Option<usize>>,
    slack: Vec<i64>,
    slack_row: Vec<usize>,
    queue: VecDeque<usize>,
}

impl<'m> Hungarian<'m> {
    fn new(m: &'m CostMatrix) -> Self {
        let n = m.dim();
        let row_label = (0..n)
            .map(|i| (0..n).map(|j| m.get(i, j)).max().unwrap_or(0))
            .collect();
        Self {
            m,
            n,
            row_label,
            col_label: vec![0; n],
            row_match: vec![None; n],
            col_match: vec![None; n],
        }
    }

    fn reduced(&self, row: usize, col: usize) -> i64 {
        self.row_label[row] + self.col_label[col] - self.m.get(row, col)
    }

    /// Grow one augmenting path from a free row and flip it
    fn augment(&mut self) {
        let Some(root) = self.row_match.iter().position(Option::is_none) else {
            return;
        };

        let mut tree = Tree {
            in_rows: vec![false; self.n],
            in_cols: vec![false; self.n],
            parent: vec![None; self.n],
            slack: (0..self.n).map(|col| self.reduced(root, col)).collect(),
            slack_row: vec![root; self.n],
            queue: VecDeque::from([root]),
        };
        tree.in_rows[root] = true;

        loop {
            while let Some(row) = tree.queue.pop_front() {
                for col in 0..self.n {
                    if tree.in_cols[col] || self.reduced(row, col) != 0 {
                        continue;
                    }
                    let matched = self.col_match[col];
                    match matched {
                        None => return self.flip(&tree, row, col),
                        Some(next) => {
                            tree.in_cols[col] = true;
                            self.add_row(&mut tree, next, row);
                        }
                    }
                }
            }

            self.relabel(&mut tree);

            for col in 0..self.n {
                if tree.in_cols[col] || tree.slack[col] != 0 {
                    continue;
                }
                let parent = tree.slack_row[col];
                let matched = self.col_match[col];
                match matched {
                    None => return self.flip(&tree, parent, col),
                    Some(next) => {
                        tree.in_cols[col] = true;
                        if !tree.in_rows[next] {
                            self.add_row(&mut tree, next, parent);
                        }
                    }
                }
            }
        }
    }

    fn add_row(&self, tree: &mut Tree, row: usize, parent: usize) {
        tree.in_rows[row] = true;
        tree.parent[row] = Some(parent);
        tree.queue.push_back(row);
        for col in 0..self.n {
            let r = self.reduced(row, col);
            if r < tree.slack[col] {
                tree.slack[col] = r;
                tree.slack_row[col] = row;
            }
        }
    }

    /// Shift labels by the smallest frontier slack, exposing a tight edge
    fn relabel(&mut self, tree: &mut Tree) {
        let delta = (0..self.n)
            .filter(|&col| !tree.in_cols[col])
            .map(|col| tree.slack[col])
            .min()
            .unwrap_or(0);
        for row in 0..self.n {
            if tree.in_rows[row] {
                self.row_label[row] -= delta;
            }
        }
        for col in 0..self.n {
            if tree.in_cols[col] {
                self.col_label[col] += delta;
            } else {
                tree.slack[col] -= delta;
            }
        }
    }

    /// Flip matched/unmatched edges along the path ending at (row, col)
    fn flip(&mut self, tree: &Tree, row: usize, col: usize) {
        let (mut row, mut col) = (row, col);
        loop {
            let displaced = self.row_match[row];
            self.col_match[col] = Some(row);
            self.row_match[row] = Some(col);
            match (tree.parent[row], displaced) {
                (Some(parent), Some(next_col)) => {
                    row = parent;
                    col = next_col;
                }
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(solution: &[usize]) -> bool {
        let mut seen = vec![false; solution.len()];
        solution.iter().all(|&c| c < seen.len() && !std::mem::replace(&mut seen[c], true))
    }

    #[test]
    fn test_empty_matrix() {
        assert!(solve(&CostMatrix::from_rows(vec![])).is_empty());
    }

    #[test]
    fn test_single_cell() {
        assert_eq!(solve(&CostMatrix::from_rows(vec![vec![-7]])), vec![0]);
    }

    #[test]
    fn test_prefers_total_over_greedy_choice() {
        // row 0's best column is 0, but giving column 0 to row 1 wins overall
        let m = CostMatrix::from_rows(vec![vec![10, 9], vec![8, 1]]);
        let solution = solve(&m);
        assert_eq!(solution, vec![1, 0]);
        assert_eq!(m.total(&solution), 17);
    }

    #[test]
    fn test_classic_minimum_cost() {
        let costs: [[i64; 3]; 3] = [[4, 1, 3], [2, 0, 5], [3, 2, 2]];
        let m = CostMatrix::from_rows(
            costs
                .iter()
                .map(|r| r.iter().map(|c| -c).collect())
                .collect(),
        );
        let solution = solve(&m);
        assert!(is_permutation(&solution));
        assert_eq!(m.total(&solution), -5);
    }

    #[test]
    fn test_ties_produce_valid_permutation() {
        let m = CostMatrix::from_rows(vec![vec![0; 4]; 4]);
        let solution = solve(&m);
        assert!(is_permutation(&solution));
        assert_eq!(m.total(&solution), 0);
    }

    #[test]
    fn test_padding_becomes_unmatched() {
        let dst = vec![FieldPath::new("x", &["Created"]), FieldPath::new("x", &["ID"])];
        let src = vec![FieldPath::new("y", &["Id"])];
        let m = CostMatrix::build(&dst, &src, &CostModel::default());
        assert_eq!(m.dim(), 2);
        assert_eq!(m.get(0, 1), 0);
        assert_eq!(m.get(1, 1), 0);

        let assignment = Assignment::from_solution(&solve(&m), dst.len(), src.len());
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.source_of(0), None);
        assert_eq!(assignment.source_of(1), Some(0));
    }

    #[test]
    fn test_padding_rows_are_dropped() {
        let assignment = Assignment::from_solution(&[2, 0, 1], 1, 3);
        assert_eq!(assignment.iter().collect::<Vec<_>>(), vec![(0, Some(2))]);
    }
}
