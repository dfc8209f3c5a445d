use std::sync::atomic::{AtomicUsize, Ordering};

use causa_core::data::DataSet;
use causa_core::graph::{Graph, Node};
use causa_core::knowledge::Knowledge;
use causa_core::resampling::{
    aggregate_graphs, EdgeEnsemble, ResamplingConfig, ResamplingMethod, ResamplingSearch,
    StabilityConfig, StabilitySelection,
};
use causa_core::search::{Algorithm, Pc, TestChoice};
use causa_core::CausalError;

fn fixed_graph() -> Graph {
    let (a, b, c) = (Node::new("A"), Node::new("B"), Node::new("C"));
    let mut g = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    g.add_directed_edge(&a, &b).unwrap();
    g.add_undirected_edge(&b, &c).unwrap();
    g
}

fn data() -> DataSet {
    let values: Vec<f64> = (0..40).map(f64::from).collect();
    DataSet::continuous(
        vec![Node::new("A"), Node::new("B"), Node::new("C")],
        vec![values.clone(), values.clone(), values],
    )
    .unwrap()
}

/// Returns the same graph on every call.
struct Fixed;

impl Algorithm for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    fn search(&self, _data: &DataSet, _knowledge: &Knowledge) -> Result<Graph, CausalError> {
        Ok(fixed_graph())
    }
}

/// Fails its first `errors` calls and panics on the next `panics`.
struct Flaky {
    calls: AtomicUsize,
    errors: usize,
    panics: usize,
}

impl Algorithm for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    fn search(&self, _data: &DataSet, _knowledge: &Knowledge) -> Result<Graph, CausalError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.errors {
            return Err(CausalError::Search(format!("injected failure {}", call)));
        }
        if call < self.errors + self.panics {
            panic!("injected panic {}", call);
        }
        Ok(fixed_graph())
    }
}

fn config(num_resamples: usize) -> ResamplingConfig {
    ResamplingConfig {
        num_resamples,
        ..ResamplingConfig::default()
    }
}

#[test]
fn stub_algorithm_yields_every_graph() {
    let result = ResamplingSearch::new(config(10))
        .run(&Fixed, &data(), &Knowledge::new())
        .unwrap();
    assert_eq!(result.graphs.len(), 10);
    assert_eq!(result.dropped, 0);
    assert!(result.graphs.iter().all(|g| *g == fixed_graph()));
}

#[test]
fn injected_failures_are_counted_exactly() {
    let flaky = Flaky {
        calls: AtomicUsize::new(0),
        errors: 2,
        panics: 1,
    };
    let result = ResamplingSearch::new(ResamplingConfig {
        add_original_dataset: true,
        ..config(10)
    })
    .run(&flaky, &data(), &Knowledge::new())
    .unwrap();
    assert_eq!(result.graphs.len(), 8);
    assert_eq!(result.dropped, 3);
}

#[test]
fn zero_tasks_is_an_argument_error() {
    let err = ResamplingSearch::new(config(0)).run(&Fixed, &data(), &Knowledge::new());
    assert!(matches!(err, Err(CausalError::InvalidArgument(_))));
}

fn chain() -> Graph {
    let (a, b, c) = (Node::new("A"), Node::new("B"), Node::new("C"));
    let mut g = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    g.add_directed_edge(&a, &b).unwrap();
    g.add_directed_edge(&b, &c).unwrap();
    g
}

#[test]
fn same_seed_same_result() {
    let truth = chain();
    let pc = Pc::new(TestChoice::MSep { graph: truth });
    let search = ResamplingSearch::new(ResamplingConfig {
        method: ResamplingMethod::Subsample,
        percent_resample_size: 50.0,
        seed: 99,
        ..config(6)
    });
    let first = search.run(&pc, &data(), &Knowledge::new()).unwrap();
    let second = search.run(&pc, &data(), &Knowledge::new()).unwrap();
    assert_eq!(first.graphs, second.graphs);
}

#[test]
fn aggregation_is_order_independent_and_sized_freely() {
    let (a, b, c) = (Node::new("A"), Node::new("B"), Node::new("C"));
    let mut other = Graph::with_nodes([c.clone(), b.clone(), a.clone()]);
    other.add_directed_edge(&b, &a).unwrap();

    let mut graphs = vec![fixed_graph(), fixed_graph(), other];
    let forward = aggregate_graphs(&graphs, EdgeEnsemble::Preserved);
    graphs.rotate_left(1);
    let rotated = aggregate_graphs(&graphs, EdgeEnsemble::Preserved);
    assert_eq!(forward, rotated);
    assert_eq!(forward.to_string(), rotated.to_string());
    assert!(forward.is_parent_of(&a, &b));

    let single = aggregate_graphs(&graphs[..1], EdgeEnsemble::Majority);
    assert_eq!(single.num_edges(), graphs[0].num_edges());
    assert_eq!(aggregate_graphs(&[], EdgeEnsemble::Highest).num_nodes(), 0);
}

#[test]
fn stability_selection_over_two_settings() {
    let dense = chain();
    let sparse = Graph::with_nodes([Node::new("A"), Node::new("B"), Node::new("C")]);
    let settings = [
        Pc::new(TestChoice::MSep { graph: dense }),
        Pc::new(TestChoice::MSep { graph: sparse }),
    ];
    let grid: Vec<&dyn Algorithm> = settings.iter().map(|p| p as &dyn Algorithm).collect();

    let result = StabilitySelection::new(StabilityConfig {
        leaf_size: 1,
        ..StabilityConfig::default()
    })
    .run(&grid, &data(), &Knowledge::new())
    .unwrap();

    assert_eq!(result.frequencies.len(), 2);
    assert_eq!(result.frequencies[1].num_edges(), 0);
    assert_eq!(result.dropped, vec![0, 0]);
    // A - B - C has no collider, so the oracle leaves both edges undirected.
    let (a, b, c) = (Node::new("A"), Node::new("B"), Node::new("C"));
    assert!(result.stable.is_adjacent_to(&a, &b));
    assert!(result.stable.is_adjacent_to(&b, &c));
    assert!(!result.stable.is_adjacent_to(&a, &c));
}
