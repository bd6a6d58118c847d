//! Field matching pipeline
//!
//! flatten both schemas → drop ignored leaves → score every pair → assign
//! → [`MatchReport`]. The report is what the renderers and `--json` consume.

use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::schema::{FieldPath, SchemaNode};
use crate::solver::{solve, Assignment, CostMatrix};
use crate::walker::{flatten, WalkPolicy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How destination leaves are paired with source leaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Exact minimum-total-cost assignment
    #[default]
    Optimal,
    /// Longest destination path first, each takes its nearest remaining source
    Greedy,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "optimal" | "hungarian" => Ok(Strategy::Optimal),
            "greedy" => Ok(Strategy::Greedy),
            other => Err(Error::InvalidArguments(format!(
                "unknown strategy '{}' (use optimal or greedy)",
                other
            ))),
        }
    }
}

/// Matching options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MatchOptions {
    #[serde(default)]
    pub strategy: Strategy,

    /// Field-name tokens; a leaf with any matching segment is dropped
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Refuse to solve when either side has more leaves than this
    #[serde(default = "default_max_leaves")]
    pub max_leaves: usize,

    #[serde(default = "default_destination_root")]
    pub destination_root: String,

    #[serde(default = "default_source_root")]
    pub source_root: String,

    #[serde(default)]
    pub cost: CostModel,

    #[serde(default)]
    pub walk: WalkPolicy,
}

fn default_max_leaves() -> usize {
    512
}

fn default_destination_root() -> String {
    "x".to_string()
}

fn default_source_root() -> String {
    "y".to_string()
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            ignore: Vec::new(),
            max_leaves: default_max_leaves(),
            destination_root: default_destination_root(),
            source_root: default_source_root(),
            cost: CostModel::default(),
            walk: WalkPolicy::default(),
        }
    }
}

/// Result of matching one destination schema against one source schema
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MatchReport {
    pub strategy: Strategy,
    /// One entry per participating destination leaf, in declaration order
    pub pairs: Vec<FieldPair>,
    /// Source leaves nobody claimed
    pub unmatched_sources: Vec<String>,
    /// Destination leaves dropped by the ignore list
    pub excluded_destinations: Vec<String>,
    /// Source leaves dropped by the ignore list
    pub excluded_sources: Vec<String>,
    /// Sum of the costs of all matched pairs
    pub total_cost: i64,
}

/// A destination leaf and the source chosen for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldPair {
    pub destination: String,
    /// `None` when the destination only matched padding
    pub source: Option<String>,
    /// Dissimilarity of the pair, `None` when unmatched
    pub cost: Option<i64>,
}

/// What the renderer should put at a destination leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding<'a> {
    Matched(&'a str),
    Unmatched,
    Excluded,
}

impl MatchReport {
    /// Matched pairs ordered by descending destination length, ties in
    /// declaration order
    pub fn matched_by_length(&self) -> Vec<(&str, &str)> {
        let mut matched: Vec<_> = self
            .pairs
            .iter()
            .filter_map(|p| p.source.as_deref().map(|s| (p.destination.as_str(), s)))
            .collect();
        matched.sort_by_key(|(d, _)| std::cmp::Reverse(d.chars().count()));
        matched
    }

    /// Flat `<destination> = <source>` listing
    pub fn to_report(&self) -> String {
        let mut out = String::new();
        for (dst, src) in self.matched_by_length() {
            out.push_str(dst);
            out.push_str(" = ");
            out.push_str(src);
            out.push('\n');
        }
        out
    }

    /// Index destination paths for rendering
    pub fn bindings(&self) -> Bindings<'_> {
        let mut map = HashMap::new();
        for pair in &self.pairs {
            let binding = match &pair.source {
                Some(src) => Binding::Matched(src.as_str()),
                None => Binding::Unmatched,
            };
            map.insert(pair.destination.as_str(), binding);
        }
        for dst in &self.excluded_destinations {
            map.insert(dst.as_str(), Binding::Excluded);
        }
        Bindings { map }
    }

    pub fn matched_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.source.is_some()).count()
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_report())
    }
}

/// Destination path → binding lookup
pub struct Bindings<'a> {
    map: HashMap<&'a str, Binding<'a>>,
}

impl<'a> Bindings<'a> {
    pub fn get(&self, destination: &str) -> Binding<'a> {
        self.map
            .get(destination)
            .copied()
            .unwrap_or(Binding::Unmatched)
    }
}

/// A leaf is ignored when any of its field segments equals an ignore token
fn is_ignored(path: &FieldPath, ignore: &[String]) -> bool {
    path.segments()
        .any(|seg| ignore.iter().any(|token| token == seg))
}

fn partition_ignored(paths: Vec<FieldPath>, ignore: &[String]) -> (Vec<FieldPath>, Vec<String>) {
    let (excluded, kept): (Vec<_>, Vec<_>) =
        paths.into_iter().partition(|p| is_ignored(p, ignore));
    (kept, excluded.into_iter().map(String::from).collect())
}

/// Match two schemas
pub fn match_schemas(
    destination: &SchemaNode,
    source: &SchemaNode,
    options: &MatchOptions,
) -> Result<MatchReport> {
    let dst = flatten(destination, &options.destination_root, &options.walk)?;
    let src = flatten(source, &options.source_root, &options.walk)?;
    match_leaves(dst, src, options)
}

/// Match two already-flattened leaf lists
pub fn match_leaves(
    dst: Vec<FieldPath>,
    src: Vec<FieldPath>,
    options: &MatchOptions,
) -> Result<MatchReport> {
    let (dst, excluded_destinations) = partition_ignored(dst, &options.ignore);
    let (src, excluded_sources) = partition_ignored(src, &options.ignore);

    for (side, count) in [("destination", dst.len()), ("source", src.len())] {
        if count > options.max_leaves {
            return Err(Error::TooManyLeaves {
                side,
                count,
                limit: options.max_leaves,
            });
        }
    }

    tracing::debug!(
        destination = dst.len(),
        source = src.len(),
        excluded = excluded_destinations.len() + excluded_sources.len(),
        strategy = ?options.strategy,
        "matching leaves"
    );

    let assignment = match options.strategy {
        Strategy::Optimal => {
            let matrix = CostMatrix::build(&dst, &src, &options.cost);
            Assignment::from_solution(&solve(&matrix), dst.len(), src.len())
        }
        Strategy::Greedy => greedy(&dst, &src, &options.cost),
    };

    let mut claimed = vec![false; src.len()];
    let mut pairs = Vec::with_capacity(dst.len());
    let mut total_cost = 0;
    for (i, chosen) in assignment.iter() {
        let destination = &dst[i];
        let pair = match chosen {
            Some(j) => {
                claimed[j] = true;
                let cost = options.cost.cost(destination, &src[j]);
                total_cost += cost;
                tracing::trace!(%destination, source = %src[j], cost, "paired");
                FieldPair {
                    destination: destination.to_string(),
                    source: Some(src[j].to_string()),
                    cost: Some(cost),
                }
            }
            None => FieldPair {
                destination: destination.to_string(),
                source: None,
                cost: None,
            },
        };
        pairs.push(pair);
    }

    let unmatched_sources = src
        .iter()
        .zip(&claimed)
        .filter(|(_, taken)| !**taken)
        .map(|(p, _)| p.to_string())
        .collect();

    Ok(MatchReport {
        strategy: options.strategy,
        pairs,
        unmatched_sources,
        excluded_destinations,
        excluded_sources,
        total_cost,
    })
}

/// Substitution weight of the greedy scan, which keeps its historical scoring
const GREEDY_SUBSTITUTE: i64 = 3;

/// Nearest-neighbour matching: longer destination paths choose first
///
/// Each destination scans the remaining sources from the front, swapping a
/// strictly closer source into the front slot, and takes the front. The
/// swaps reorder the pool seen by later destinations.
fn greedy(dst: &[FieldPath], src: &[FieldPath], model: &CostModel) -> Assignment {
    let model = CostModel {
        substitute: GREEDY_SUBSTITUTE,
        ..*model
    };
    let mut order: Vec<usize> = (0..dst.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(dst[i].len()));

    let mut pool: Vec<usize> = (0..src.len()).collect();
    let mut pairs = vec![None; dst.len()];
    for i in order {
        if pool.is_empty() {
            break;
        }
        let target = dst[i].as_str();
        let mut best = model.distance(target, src[pool[0]].as_str());
        for k in 1..pool.len() {
            let d = model.distance(target, src[pool[k]].as_str());
            if d < best {
                pool.swap(0, k);
                best = d;
            }
        }
        pairs[i] = Some(pool.remove(0));
    }
    Assignment::from_pairs(pairs)
}
