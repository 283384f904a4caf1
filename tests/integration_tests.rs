use std::time::Duration;

use linopt::constraint;
use linopt::lp_model_builder;
use linopt::lp_solver::{
    BranchingRule, LPModelBuilder, Model, ModelError, NodeSelection,
    OptimizationSense, OptimizationStatus, SolverConfig, VariableSpec, VariableType, solve_many,
};

const TOLERANCE: f64 = 1e-6;

// Route solver logs through the test harness; RUST_LOG=debug shows them
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// max x + y  s.t.  0 <= 2x + 5y <= 10,  0 <= 10x + 3y <= 20,  x in [0, 10], y in [0, 5]
fn two_constraint_model() -> LPModelBuilder {
    let mut builder = LPModelBuilder::new();
    builder
        .add_variable("x", VariableType::Continuous, 0.0, 10.0)
        .unwrap();
    builder
        .add_variable("y", VariableType::Continuous, 0.0, 5.0)
        .unwrap();
    builder
        .add_constraint(0.0, 10.0)
        .unwrap()
        .set_coefficient("x", 2.0)
        .unwrap()
        .set_coefficient("y", 5.0)
        .unwrap();
    builder
        .add_constraint(0.0, 20.0)
        .unwrap()
        .set_coefficient("x", 10.0)
        .unwrap()
        .set_coefficient("y", 3.0)
        .unwrap();
    builder.set_objective_coefficient("x", 1.0).unwrap();
    builder.set_objective_coefficient("y", 1.0).unwrap();
    builder.set_maximization();
    builder
}

const KNAPSACK_ITEMS: usize = 30;
const KNAPSACK_CAPACITY: f64 = 251.5;
const KNAPSACK_OPTIMUM: f64 = 344.0;

fn knapsack_weight(i: usize) -> f64 {
    (11 + (7 * i) % 13) as f64
}

fn knapsack_value(i: usize) -> f64 {
    (10 + (5 * i) % 17) as f64
}

// 0/1 knapsack; a half-integral capacity keeps the root relaxation fractional
fn knapsack_model(capacity: f64) -> Model {
    let mut builder = LPModelBuilder::new();
    builder
        .add_variables((0..KNAPSACK_ITEMS).map(|i| {
            VariableSpec::new(format!("item{i}"), VariableType::Binary, 0.0, 1.0)
                .with_objective(knapsack_value(i))
        }))
        .unwrap();

    let mut row = builder
        .add_named_constraint("capacity", f64::NEG_INFINITY, capacity)
        .unwrap();
    for i in 0..KNAPSACK_ITEMS {
        row
            .set_coefficient(&format!("item{i}"), knapsack_weight(i))
            .unwrap();
    }

    builder.set_maximization();
    builder.build()
}

fn assert_knapsack_point(solution: &linopt::Solution) {
    let mut weight = 0.0;
    let mut value = 0.0;
    for (i, (name, x)) in solution.values().enumerate() {
        assert_eq!(name, format!("item{i}"));
        assert!(x == 0.0 || x == 1.0, "{name} = {x} is not binary");
        weight += knapsack_weight(i) * x;
        value += knapsack_value(i) * x;
    }
    assert!(weight <= KNAPSACK_CAPACITY);
    assert!((value - solution.objective_value()).abs() < TOLERANCE);
}

#[cfg(test)]
mod builder_contract_tests {
    use super::*;

    /// Invalid bound pairs are rejected and leave the model untouched
    #[test]
    fn test_invalid_bounds_are_atomic() {
        let mut builder = two_constraint_model();
        let before = format!("{:?}", builder.model());

        for (lower, upper) in [
            (1.0, 0.0),
            (f64::NAN, 1.0),
            (f64::INFINITY, f64::INFINITY),
            (f64::NEG_INFINITY, f64::NEG_INFINITY),
        ] {
            assert!(matches!(
                builder.add_variable("z", VariableType::Continuous, lower, upper),
                Err(ModelError::InvalidBounds { .. })
            ));
            assert!(matches!(
                builder.add_constraint(lower, upper),
                Err(ModelError::InvalidBounds { .. })
            ));
        }

        let result = builder.add_variables([
            VariableSpec::continuous("a", 0.0, 1.0),
            VariableSpec::continuous("b", 2.0, 1.0),
        ]);
        assert!(result.is_err());

        let result = builder.add_constraints([(0.0, 1.0), (5.0, -5.0)]);
        assert!(result.is_err());

        assert_eq!(format!("{:?}", builder.model()), before);
        assert!(builder.model().variable("a").is_none());
    }

    /// Every well-formed bound pair is accepted
    #[test]
    fn test_valid_bounds_are_accepted() {
        let mut builder: LPModelBuilder = LPModelBuilder::new();
        for (i, (lower, upper)) in [
            (0.0, 0.0),
            (-1.0, 1.0),
            (f64::NEG_INFINITY, 3.0),
            (-3.0, f64::INFINITY),
            (f64::NEG_INFINITY, f64::INFINITY),
        ]
        .into_iter()
        .enumerate()
        {
            builder
                .add_variable(format!("v{i}"), VariableType::Continuous, lower, upper)
                .unwrap();
            builder.add_constraint(lower, upper).unwrap();
        }
        assert_eq!(builder.model().num_variables(), 5);
        assert_eq!(builder.model().num_constraints(), 5);
    }

    /// Coefficients can only reference declared variables
    #[test]
    fn test_unknown_variable_is_rejected() {
        let mut builder = two_constraint_model();
        let err = builder
            .add_constraint(0.0, 1.0)
            .unwrap()
            .set_coefficient("ghost", 1.0)
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownVariable("ghost".to_string()));
        assert!(builder.set_objective_coefficient("ghost", 1.0).is_err());

        // Ids are positional; the fourth row of another model does not exist here
        let mut other: LPModelBuilder = LPModelBuilder::new();
        let foreign = other.add_constraints([(0.0, 1.0); 4]).unwrap();
        assert_eq!(
            builder.set_coefficient(foreign[3], "x", 1.0).unwrap_err(),
            ModelError::UnknownConstraint(3)
        );
        assert!(builder.constraint_mut(foreign[3]).is_none());
    }

    /// The last objective coefficient written wins
    #[test]
    fn test_objective_coefficient_idempotence() {
        let mut builder = two_constraint_model();
        builder.set_objective_coefficient("x", 100.0).unwrap();
        builder.set_objective_coefficient("x", 1.0).unwrap();

        let solution = builder.solve();
        assert!((solution.objective_value() - 65.0 / 22.0).abs() < TOLERANCE);
    }
}

#[cfg(test)]
mod continuous_tests {
    use super::*;

    /// Both rows are tight at the optimum x = 35/22, y = 15/11
    #[test]
    fn test_two_constraint_optimum() {
        init_logging();
        let solution = two_constraint_model().solve();

        assert_eq!(solution.status(), OptimizationStatus::Optimal);
        assert!(solution.is_valid());
        assert!((solution.objective_value() - 65.0 / 22.0).abs() < TOLERANCE);
        assert!((solution.variable_value("x").unwrap() - 35.0 / 22.0).abs() < TOLERANCE);
        assert!((solution.variable_value("y").unwrap() - 15.0 / 11.0).abs() < TOLERANCE);
    }

    /// A relaxation that runs out of simplex iterations is reported, not returned
    #[test]
    fn test_iteration_limit_is_abnormal() {
        let config = SolverConfig {
            max_simplex_iterations: Some(1),
            ..SolverConfig::default()
        };
        let solution = two_constraint_model().solve_with(&config);

        assert_eq!(solution.status(), OptimizationStatus::Abnormal);
        assert!(!solution.is_valid());
        assert!(solution.objective_value().is_nan());
        assert!(solution.variable_value("x").is_none());
    }

    #[test]
    fn test_infeasible() {
        let mut builder: LPModelBuilder = LPModelBuilder::new();
        builder
            .add_variable("x", VariableType::Continuous, 0.0, 1.0)
            .unwrap();
        builder
            .add_constraint(5.0, f64::INFINITY)
            .unwrap()
            .set_coefficient("x", 1.0)
            .unwrap();

        let solution = builder.solve();
        assert_eq!(solution.status(), OptimizationStatus::Infeasible);
        assert!(!solution.is_valid());
        assert!(solution.objective_value().is_nan());
    }

    #[test]
    fn test_unbounded() {
        let mut builder: LPModelBuilder = LPModelBuilder::new();
        builder
            .add_variable_with_objective("x", VariableType::Continuous, 0.0, f64::INFINITY, 1.0)
            .unwrap();
        builder
            .add_variable("y", VariableType::Continuous, 0.0, 1.0)
            .unwrap();
        builder
            .add_constraint(f64::NEG_INFINITY, 1.0)
            .unwrap()
            .set_coefficient("y", 1.0)
            .unwrap();
        builder.set_maximization();

        assert_eq!(builder.solve().status(), OptimizationStatus::Unbounded);
    }

    /// Expression constraints land on the same rows as name-keyed ones
    #[test]
    fn test_expression_model_matches_name_keyed_model() {
        let mut builder = lp_model_builder!(Expressions);
        let x = builder
            .add_variable("x", VariableType::Continuous, 0.0, 10.0)
            .unwrap();
        let y = builder
            .add_variable("y", VariableType::Continuous, 0.0, 5.0)
            .unwrap();

        builder
            .add_linear_constraint(constraint!((2.0 * x + 5.0 * y) <= 10.0))
            .unwrap();
        builder
            .add_linear_constraint(constraint!("second", (10.0 * x + 2.0 * y + y + 1.0) <= 21.0))
            .unwrap();
        builder
            .set_objective(x + y, OptimizationSense::Maximize)
            .unwrap();

        let solution = builder.solve();
        assert_eq!(solution.status(), OptimizationStatus::Optimal);
        assert!((solution.objective_value() - 65.0 / 22.0).abs() < TOLERANCE);

        let row = &builder.model().constraints()[1];
        assert_eq!(row.coefficient("y"), 3.0);
        assert_eq!(row.upper_bound(), 20.0);

        let objective = x + y;
        assert!((objective.evaluate(&solution).unwrap() - 65.0 / 22.0).abs() < TOLERANCE);
    }

    /// A model without variables is decided by its constant and its rows
    #[test]
    fn test_empty_model() {
        let mut builder: LPModelBuilder = LPModelBuilder::new();
        builder.set_objective_constant(-2.5);
        let solution = builder.solve();
        assert_eq!(solution.status(), OptimizationStatus::Optimal);
        assert_eq!(solution.objective_value(), -2.5);
        assert_eq!(solution.values().count(), 0);
    }

    /// Non-finite coefficients are caught before solving
    #[test]
    fn test_model_invalid() {
        let mut builder = two_constraint_model();
        builder
            .add_constraint(f64::NEG_INFINITY, 1.0)
            .unwrap()
            .set_coefficient("x", f64::NAN)
            .unwrap();
        let solution = builder.solve();
        assert_eq!(solution.status(), OptimizationStatus::ModelInvalid);
        assert!(!solution.is_valid());
    }

    #[test]
    fn test_report() {
        let builder = two_constraint_model();
        let solution = builder.solve();

        let mut out = Vec::new();
        solution.print_report(builder.model(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("OPTIMAL"));
        assert!(text.contains("continuous"));
        assert!(text.contains("Activity"));
    }
}

#[cfg(test)]
mod integer_tests {
    use super::*;

    /// max x + y with x + y <= 1.5 over two integer variables
    #[test]
    fn test_small_integer_program() {
        init_logging();
        let mut builder: LPModelBuilder = LPModelBuilder::new();
        builder
            .add_variable_with_objective("x", VariableType::Integer, 0.0, 1.0, 1.0)
            .unwrap();
        builder
            .add_variable_with_objective("y", VariableType::Integer, 0.0, 1.0, 1.0)
            .unwrap();
        builder
            .add_constraint(f64::NEG_INFINITY, 1.5)
            .unwrap()
            .set_coefficient("x", 1.0)
            .unwrap()
            .set_coefficient("y", 1.0)
            .unwrap();
        builder.set_maximization();

        let solution = builder.solve();
        assert_eq!(solution.status(), OptimizationStatus::Optimal);
        assert_eq!(solution.objective_value(), 1.0);

        let x = solution.variable_value("x").unwrap();
        let y = solution.variable_value("y").unwrap();
        assert!((x, y) == (1.0, 0.0) || (x, y) == (0.0, 1.0));
    }

    /// A failed root relaxation ends the search without an incumbent
    #[test]
    fn test_root_iteration_limit_is_abnormal() {
        let model = knapsack_model(251.5);
        let config = SolverConfig {
            max_simplex_iterations: Some(1),
            ..SolverConfig::default()
        };
        let solution = linopt::Solver::new(config).solve(&model);

        assert_eq!(solution.status(), OptimizationStatus::Abnormal);
        assert!(!solution.is_valid());
        assert_eq!(solution.statistics().nodes, 1);
    }

    #[test]
    fn test_knapsack_optimum_for_every_strategy() {
        let model = knapsack_model(KNAPSACK_CAPACITY);
        for branching in [BranchingRule::FirstFractional, BranchingRule::MostFractional] {
            for selection in [NodeSelection::DepthFirst, NodeSelection::BestBound] {
                let config = SolverConfig::default()
                    .with_branching(branching)
                    .with_node_selection(selection);
                let solution = linopt::Solver::new(config).solve(&model);

                assert_eq!(solution.status(), OptimizationStatus::Optimal);
                assert!(
                    (solution.objective_value() - KNAPSACK_OPTIMUM).abs() < TOLERANCE,
                    "{:?}/{:?} found {}",
                    branching,
                    selection,
                    solution.objective_value()
                );
                assert_knapsack_point(&solution);
                assert!(!solution.statistics().limit_reached);
            }
        }
    }

    /// An exhausted node budget keeps the incumbent as a feasible answer
    #[test]
    fn test_node_limit_returns_incumbent() {
        let config = SolverConfig::default().with_node_limit(200);
        let solution = linopt::Solver::new(config).solve(&knapsack_model(KNAPSACK_CAPACITY));

        assert_eq!(solution.status(), OptimizationStatus::Feasible);
        assert!(solution.objective_value() <= KNAPSACK_OPTIMUM + TOLERANCE);
        assert!(solution.statistics().best_bound >= solution.objective_value() - TOLERANCE);
        assert!(solution.statistics().limit_reached);
        assert_eq!(solution.statistics().nodes, 200);
        assert_knapsack_point(&solution);
    }

    /// Without time for anything but the fractional root there is no answer
    #[test]
    fn test_zero_time_limit() {
        let solution = linopt::solve(&knapsack_model(KNAPSACK_CAPACITY), Duration::ZERO);
        assert_eq!(solution.status(), OptimizationStatus::NotSolved);
        assert!(solution.values().next().is_none());
        assert_eq!(solution.statistics().nodes, 1);
    }

    /// A tiny budget stops the search promptly
    #[test]
    fn test_tiny_time_limit_terminates() {
        let solution = linopt::solve(&knapsack_model(KNAPSACK_CAPACITY), Duration::from_millis(1));
        assert!(matches!(
            solution.status(),
            OptimizationStatus::Feasible | OptimizationStatus::NotSolved | OptimizationStatus::Optimal
        ));
        assert!(solution.statistics().elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_solve_many_matches_sequential() {
        let models: Vec<Model> = (0..4)
            .map(|shift| knapsack_model(KNAPSACK_CAPACITY - shift as f64 * 20.0))
            .collect();

        let config = SolverConfig::default();
        let parallel = solve_many(&models, &config);
        assert_eq!(parallel.len(), models.len());
        for (model, solution) in models.iter().zip(&parallel) {
            let sequential = linopt::Solver::new(config.clone()).solve(model);
            assert_eq!(solution.status(), OptimizationStatus::Optimal);
            assert!((solution.objective_value() - sequential.objective_value()).abs() < TOLERANCE);
        }
    }
}
