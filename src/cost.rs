//! Name dissimilarity between field paths
//!
//! Destination and source trees are rooted at different markers and often
//! nest differently, so the full-path edit distance is topped up with the
//! distance over just the trailing characters. That biases matches toward
//! agreement in the field's own name rather than its ancestry.

use crate::schema::FieldPath;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Weighted edit distance with a suffix bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CostModel {
    #[serde(default = "default_unit")]
    pub insert: i64,
    #[serde(default = "default_unit")]
    pub delete: i64,
    #[serde(default = "default_substitute")]
    pub substitute: i64,
    /// Number of trailing characters counted a second time
    #[serde(default = "default_suffix_len")]
    pub suffix_len: usize,
}

fn default_unit() -> i64 {
    1
}

fn default_substitute() -> i64 {
    2
}

fn default_suffix_len() -> usize {
    5
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            insert: default_unit(),
            delete: default_unit(),
            substitute: default_substitute(),
            suffix_len: default_suffix_len(),
        }
    }
}

impl CostModel {
    /// Weighted edit distance turning `a` into `b`
    pub fn distance(&self, a: &str, b: &str) -> i64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut prev: Vec<i64> = (0..=b.len()).map(|j| j as i64 * self.insert).collect();
        let mut curr = vec![0; b.len() + 1];

        for (i, ca) in a.iter().enumerate() {
            curr[0] = (i as i64 + 1) * self.delete;
            for (j, cb) in b.iter().enumerate() {
                let replace = if ca == cb { 0 } else { self.substitute };
                curr[j + 1] = (prev[j] + replace)
                    .min(prev[j + 1] + self.delete)
                    .min(curr[j] + self.insert);
            }
            std::mem::swap(&mut prev, &mut curr);
        }
        prev[b.len()]
    }

    /// Full-path distance plus the distance over the last `suffix_len` chars
    pub fn cost(&self, dst: &FieldPath, src: &FieldPath) -> i64 {
        let (a, b) = (dst.as_str(), src.as_str());
        self.distance(a, b) + self.distance(tail(a, self.suffix_len), tail(b, self.suffix_len))
    }
}

/// Last `n` characters of `s` (all of `s` when shorter)
fn tail(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}
