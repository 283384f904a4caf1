//! Solver configuration
//!
//! [`SolverConfig::default`] never looks at the environment.
//! [`SolverConfig::from_env`] starts from the defaults and applies the
//! `LINOPT_*` overrides:
//!
//! - `LINOPT_TIME_LIMIT` - wall-clock budget in seconds, e.g. `"2.5"`
//! - `LINOPT_BRANCHING` - `"first-fractional"` or `"most-fractional"`
//! - `LINOPT_NODE_SELECTION` - `"depth-first"` or `"best-bound"`

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

/// Wall-clock budget used when none is given
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30);

const TIME_LIMIT_VAR: &str = "LINOPT_TIME_LIMIT";
const BRANCHING_VAR: &str = "LINOPT_BRANCHING";
const NODE_SELECTION_VAR: &str = "LINOPT_NODE_SELECTION";

/// How the branch-and-bound search picks the variable to split on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// First fractional integer variable in declaration order
    #[default]
    FirstFractional,
    /// Integer variable whose fractional part is closest to 0.5; ties go to the
    /// earliest declared variable
    MostFractional,
}

impl FromStr for BranchingRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first-fractional" | "first_fractional" | "first" => Ok(BranchingRule::FirstFractional),
            "most-fractional" | "most_fractional" | "most" => Ok(BranchingRule::MostFractional),
            _ => Err(anyhow!(
                "Invalid branching rule '{}'. Valid options: first-fractional, most-fractional",
                s
            )),
        }
    }
}

/// Order in which open branch-and-bound nodes are explored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Last created node first; dives quickly towards integer-feasible points
    #[default]
    DepthFirst,
    /// Node with the best relaxation bound first
    BestBound,
}

impl FromStr for NodeSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "depth-first" | "depth_first" | "dfs" => Ok(NodeSelection::DepthFirst),
            "best-bound" | "best_bound" | "best-first" => Ok(NodeSelection::BestBound),
            _ => Err(anyhow!(
                "Invalid node selection '{}'. Valid options: depth-first, best-bound",
                s
            )),
        }
    }
}

/// Numerical tolerances
///
/// Feasibility checks scale the tolerance by `1 + |bound|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Allowed bound violation of rows and columns
    pub feasibility: f64,
    /// Reduced costs smaller than this do not improve the objective
    pub optimality: f64,
    /// Smallest tableau entry accepted as a pivot
    pub pivot: f64,
    /// Distance to the nearest integer still treated as integral
    pub integrality: f64,
    /// Absolute part of the pruning gap
    pub absolute_gap: f64,
    /// Relative part of the pruning gap, scaled by the incumbent objective
    pub relative_gap: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            feasibility: 1e-7,
            optimality: 1e-9,
            pivot: 1e-9,
            integrality: 1e-6,
            absolute_gap: 1e-9,
            relative_gap: 1e-9,
        }
    }
}

/// Configuration of a solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock budget for the whole branch-and-bound search
    pub time_limit: Duration,
    /// Maximum number of branch-and-bound nodes; `None` means unlimited
    pub node_limit: Option<usize>,
    /// Maximum simplex iterations per relaxation; `None` scales with the problem size
    pub max_simplex_iterations: Option<usize>,
    pub tolerances: Tolerances,
    pub branching: BranchingRule,
    pub node_selection: NodeSelection,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            node_limit: None,
            max_simplex_iterations: None,
            tolerances: Tolerances::default(),
            branching: BranchingRule::default(),
            node_selection: NodeSelection::default(),
        }
    }
}

impl SolverConfig {
    /// Defaults overridden by the `LINOPT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `LINOPT_*` keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(TIME_LIMIT_VAR) {
            let seconds: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("{TIME_LIMIT_VAR} is not a number: '{value}'"))?;
            config.time_limit = Duration::try_from_secs_f64(seconds)
                .with_context(|| format!("{TIME_LIMIT_VAR} out of range: '{value}'"))?;
        }
        if let Some(value) = lookup(BRANCHING_VAR) {
            config.branching = value.parse()?;
        }
        if let Some(value) = lookup(NODE_SELECTION_VAR) {
            config.node_selection = value.parse()?;
        }

        Ok(config)
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_node_limit(mut self, node_limit: usize) -> Self {
        self.node_limit = Some(node_limit);
        self
    }

    pub fn with_branching(mut self, branching: BranchingRule) -> Self {
        self.branching = branching;
        self
    }

    pub fn with_node_selection(mut self, node_selection: NodeSelection) -> Self {
        self.node_selection = node_selection;
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit, Duration::from_secs(30));
        assert_eq!(config.branching, BranchingRule::FirstFractional);
        assert_eq!(config.node_selection, NodeSelection::DepthFirst);
        assert!(config.node_limit.is_none());
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!(
            "Most-Fractional".parse::<BranchingRule>().unwrap(),
            BranchingRule::MostFractional
        );
        assert_eq!(
            " best-bound ".parse::<NodeSelection>().unwrap(),
            NodeSelection::BestBound
        );
        assert!("random".parse::<BranchingRule>().is_err());
        assert!("breadth-first".parse::<NodeSelection>().is_err());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = SolverConfig::from_lookup(lookup_from(&[
            ("LINOPT_TIME_LIMIT", "2.5"),
            ("LINOPT_BRANCHING", "most-fractional"),
            ("LINOPT_NODE_SELECTION", "best-bound"),
        ]))
        .unwrap();

        assert_eq!(config.time_limit, Duration::from_millis(2500));
        assert_eq!(config.branching, BranchingRule::MostFractional);
        assert_eq!(config.node_selection, NodeSelection::BestBound);
    }

    #[test]
    fn test_lookup_rejects_bad_values() {
        assert!(SolverConfig::from_lookup(lookup_from(&[("LINOPT_TIME_LIMIT", "soon")])).is_err());
        assert!(SolverConfig::from_lookup(lookup_from(&[("LINOPT_TIME_LIMIT", "-1")])).is_err());
        assert!(SolverConfig::from_lookup(lookup_from(&[("LINOPT_BRANCHING", "x")])).is_err());
    }

    #[test]
    fn test_empty_lookup_is_default() {
        let config = SolverConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, SolverConfig::default());
    }
}
