//! Branch-and-bound over the integer columns of an [`LpProblem`]
//!
//! Every node carries its own column bounds and the relaxation objective of its
//! parent, which is a valid lower bound (minimization form) for the whole subtree.
//! The deadline and node limit are checked at node boundaries only, so a single
//! relaxation is never interrupted.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use log::{debug, trace, warn};
use ordered_float::OrderedFloat;

use super::OptimizationStatus;
use super::config::{BranchingRule, NodeSelection, SolverConfig};
use super::simplex::{LpProblem, LpResult, LpStatus, solve_lp};

#[derive(Debug, Clone)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
    /// Relaxation objective of the parent node
    bound: f64,
    depth: usize,
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest bound first and,
/// among equal bounds, the node pushed first.
struct Ranked {
    bound: OrderedFloat<f64>,
    sequence: u64,
    node: Node,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.bound, other.sequence).cmp(&(self.bound, self.sequence))
    }
}

enum NodeQueue {
    Stack(Vec<Node>),
    Heap { heap: BinaryHeap<Ranked>, sequence: u64 },
}

impl NodeQueue {
    fn new(selection: NodeSelection) -> Self {
        match selection {
            NodeSelection::DepthFirst => NodeQueue::Stack(Vec::new()),
            NodeSelection::BestBound => NodeQueue::Heap {
                heap: BinaryHeap::new(),
                sequence: 0,
            },
        }
    }

    fn push(&mut self, node: Node) {
        match self {
            NodeQueue::Stack(stack) => stack.push(node),
            NodeQueue::Heap { heap, sequence } => {
                heap.push(Ranked {
                    bound: OrderedFloat(node.bound),
                    sequence: *sequence,
                    node,
                });
                *sequence += 1;
            }
        }
    }

    /// Queue two siblings so that `preferred` is explored before `other`.
    fn push_children(&mut self, preferred: Node, other: Node) {
        match self {
            NodeQueue::Stack(_) => {
                self.push(other);
                self.push(preferred);
            }
            NodeQueue::Heap { .. } => {
                self.push(preferred);
                self.push(other);
            }
        }
    }

    fn pop(&mut self) -> Option<Node> {
        match self {
            NodeQueue::Stack(stack) => stack.pop(),
            NodeQueue::Heap { heap, .. } => heap.pop().map(|ranked| ranked.node),
        }
    }

    /// Smallest bound among the open nodes
    fn best_bound(&self) -> Option<f64> {
        match self {
            NodeQueue::Stack(stack) => stack
                .iter()
                .map(|node| OrderedFloat(node.bound))
                .min()
                .map(|bound| bound.0),
            NodeQueue::Heap { heap, .. } => heap.peek().map(|ranked| ranked.bound.0),
        }
    }
}

/// Result of a search, in the minimization form of the problem
#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub status: OptimizationStatus,
    pub x: Option<Vec<f64>>,
    pub objective: f64,
    /// Proven lower bound on the optimum (minimization form)
    pub best_bound: f64,
    pub nodes: usize,
    pub iterations: usize,
    pub limit_reached: bool,
}

impl SearchOutcome {
    fn terminal(status: OptimizationStatus, nodes: usize, iterations: usize) -> Self {
        Self {
            status,
            x: None,
            objective: f64::NAN,
            best_bound: f64::NAN,
            nodes,
            iterations,
            limit_reached: false,
        }
    }
}

/// Solves the relaxation of a node given its column bounds
type Relaxation = fn(&LpProblem, &[f64], &[f64], &SolverConfig) -> LpResult;

pub(crate) struct BranchAndBound<'a> {
    problem: &'a LpProblem,
    config: &'a SolverConfig,
    deadline: Option<Instant>,
    relax: Relaxation,
}

impl<'a> BranchAndBound<'a> {
    pub fn new(problem: &'a LpProblem, config: &'a SolverConfig, deadline: Option<Instant>) -> Self {
        Self {
            problem,
            config,
            deadline,
            relax: solve_lp,
        }
    }

    #[cfg(test)]
    fn with_relaxation(mut self, relax: Relaxation) -> Self {
        self.relax = relax;
        self
    }

    pub fn run(&self) -> SearchOutcome {
        let Some(root) = self.root() else {
            debug!("integer bounds are empty after rounding");
            return SearchOutcome::terminal(OptimizationStatus::Infeasible, 0, 0);
        };

        let mut queue = NodeQueue::new(self.config.node_selection);
        queue.push(root);

        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        let mut nodes = 0;
        let mut iterations = 0;
        let mut dropped = 0;
        let mut limit_reached = false;

        while let Some(node) = queue.pop() {
            if nodes > 0 && self.budget_exhausted(nodes) {
                queue.push(node);
                limit_reached = true;
                break;
            }

            if let Some((_, best)) = &incumbent {
                if !self.improves(node.bound, *best) {
                    continue;
                }
            }

            nodes += 1;
            let relaxation = (self.relax)(self.problem, &node.lower, &node.upper, self.config);
            iterations += relaxation.iterations;

            match relaxation.status {
                LpStatus::Optimal => {}
                LpStatus::Infeasible => continue,
                LpStatus::Unbounded if nodes == 1 => {
                    return SearchOutcome::terminal(OptimizationStatus::Unbounded, nodes, iterations);
                }
                LpStatus::IterationLimit | LpStatus::Numerical if nodes == 1 => {
                    warn!("root relaxation failed: {:?}", relaxation.status);
                    return SearchOutcome::terminal(OptimizationStatus::Abnormal, nodes, iterations);
                }
                status => {
                    warn!("dropping node at depth {} after {:?}", node.depth, status);
                    dropped += 1;
                    continue;
                }
            }

            if let Some((_, best)) = &incumbent {
                if !self.improves(relaxation.objective, *best) {
                    continue;
                }
            }

            match self.select_branching_column(&relaxation.x) {
                None => {
                    let x = self.snap_integers(relaxation.x);
                    let objective = self.problem.objective(&x);
                    debug!(
                        "new incumbent {:.6} at node {} (depth {})",
                        objective, nodes, node.depth
                    );
                    incumbent = Some((x, objective));
                }
                Some((col, value)) => {
                    trace!(
                        "branching on column {} = {:.6} at depth {}",
                        col, value, node.depth
                    );
                    let (down, up) = self.split(&node, col, value, relaxation.objective);
                    if value - value.floor() < 0.5 {
                        queue.push_children(down, up);
                    } else {
                        queue.push_children(up, down);
                    }
                }
            }
        }

        if limit_reached {
            warn!("search budget exhausted after {} nodes", nodes);
        }

        match incumbent {
            Some((x, objective)) => {
                let proven = !limit_reached && dropped == 0;
                let best_bound = if proven {
                    objective
                } else {
                    queue.best_bound().map_or(objective, |bound| bound.min(objective))
                };
                SearchOutcome {
                    status: if proven {
                        OptimizationStatus::Optimal
                    } else {
                        OptimizationStatus::Feasible
                    },
                    x: Some(x),
                    objective,
                    best_bound,
                    nodes,
                    iterations,
                    limit_reached,
                }
            }
            None => {
                let status = if limit_reached {
                    OptimizationStatus::NotSolved
                } else if dropped > 0 {
                    OptimizationStatus::Abnormal
                } else {
                    OptimizationStatus::Infeasible
                };
                SearchOutcome {
                    limit_reached,
                    best_bound: queue.best_bound().unwrap_or(f64::NAN),
                    ..SearchOutcome::terminal(status, nodes, iterations)
                }
            }
        }
    }

    /// Root node with integer column bounds rounded inwards, or `None` if some
    /// integer column has no integer value left.
    fn root(&self) -> Option<Node> {
        let tolerance = self.config.tolerances.integrality;
        let mut lower = self.problem.col_lower.clone();
        let mut upper = self.problem.col_upper.clone();

        for (col, _) in self.problem.integer.iter().enumerate().filter(|(_, is_int)| **is_int) {
            lower[col] = (lower[col] - tolerance).ceil();
            upper[col] = (upper[col] + tolerance).floor();
            if lower[col] > upper[col] {
                return None;
            }
        }

        Some(Node {
            lower,
            upper,
            bound: f64::NEG_INFINITY,
            depth: 0,
        })
    }

    fn budget_exhausted(&self, nodes: usize) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
            || self.config.node_limit.is_some_and(|limit| nodes >= limit)
    }

    /// Whether a subtree bounded by `bound` can still beat `incumbent`.
    fn improves(&self, bound: f64, incumbent: f64) -> bool {
        let tolerances = &self.config.tolerances;
        let gap = tolerances
            .absolute_gap
            .max(tolerances.relative_gap * incumbent.abs());
        bound < incumbent - gap
    }

    fn is_fractional(&self, value: f64) -> bool {
        (value - value.round()).abs() > self.config.tolerances.integrality
    }

    fn select_branching_column(&self, x: &[f64]) -> Option<(usize, f64)> {
        let mut fractional = self
            .problem
            .integer
            .iter()
            .zip(x)
            .enumerate()
            .filter(|(_, (is_int, value))| **is_int && self.is_fractional(**value))
            .map(|(col, (_, value))| (col, *value));

        match self.config.branching {
            BranchingRule::FirstFractional => fractional.next(),
            BranchingRule::MostFractional => fractional
                .min_by_key(|(_, value)| OrderedFloat((value - value.floor() - 0.5).abs())),
        }
    }

    fn snap_integers(&self, mut x: Vec<f64>) -> Vec<f64> {
        for (value, _) in x
            .iter_mut()
            .zip(&self.problem.integer)
            .filter(|(_, is_int)| **is_int)
        {
            *value = value.round();
        }
        x
    }

    /// Children `x[col] <= floor(value)` and `x[col] >= ceil(value)`
    fn split(&self, node: &Node, col: usize, value: f64, bound: f64) -> (Node, Node) {
        let mut down = Node {
            lower: node.lower.clone(),
            upper: node.upper.clone(),
            bound,
            depth: node.depth + 1,
        };
        down.upper[col] = value.floor();

        let mut up = Node {
            lower: node.lower.clone(),
            upper: node.upper.clone(),
            bound,
            depth: node.depth + 1,
        };
        up.lower[col] = value.ceil();

        (down, up)
    }
}
