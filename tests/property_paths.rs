use std::collections::BTreeSet;

use proptest::prelude::*;

use critpath::analysis::{critical, parallel};
use critpath::dag::{DependencyGraph, topo};
use critpath::errors::CritpathError;
use critpath::{InMemoryDirectory, ItemId};
use critpath_test_utils::builders::GraphBuilder;
use critpath_test_utils::id;

fn name(i: usize) -> String {
    format!("n{i:02}")
}

// Strategy to generate a random DAG.
// Acyclicity comes from only letting item `b` wait on item `a` when a < b.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = DependencyGraph> {
    (1..=max_nodes).prop_flat_map(|n| {
        let weights = proptest::collection::vec(1u64..6, n);
        let edges = proptest::collection::vec((0..n, 0..n), 0..(n * 2));

        (weights, edges).prop_map(move |(weights, edges)| {
            let mut builder = GraphBuilder::new();
            for (i, weight) in weights.iter().enumerate() {
                builder = builder.node(&name(i), *weight);
            }
            for (a, b) in edges {
                if a < b {
                    builder = builder.edge(&name(b), &name(a));
                }
            }
            builder.build()
        })
    })
}

proptest! {
    #[test]
    fn critical_length_matches_brute_force(graph in dag_strategy(8)) {
        let order = topo::build(&graph).unwrap();
        let all = parallel::enumerate_paths(&graph, &order, usize::MAX).unwrap();
        let result = critical::compute(&graph, &order, usize::MAX);

        let best = all
            .iter()
            .map(|p| critical::path_length(&graph, p))
            .max()
            .unwrap_or(0);
        prop_assert_eq!(result.length, best);

        let expected: BTreeSet<Vec<ItemId>> = all
            .iter()
            .filter(|p| critical::path_length(&graph, p) == best)
            .cloned()
            .collect();
        let actual: BTreeSet<Vec<ItemId>> = result.paths.iter().cloned().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn float_is_zero_exactly_on_critical_items(graph in dag_strategy(8)) {
        let snapshot =
            critpath::analysis::compute_snapshot(&graph, &InMemoryDirectory::new(), usize::MAX)
                .unwrap();

        for item in graph.nodes() {
            let on_critical = snapshot.is_on_critical_path(item);
            let float = snapshot.float_of(item).unwrap();
            prop_assert_eq!(float == 0, on_critical, "item {} float {}", item, float);
        }
        for ranked in &snapshot.ranked.paths {
            prop_assert_eq!(ranked.slack, snapshot.critical.length - ranked.length);
        }
    }

    #[test]
    fn back_edges_are_rejected_without_change(
        graph in dag_strategy(8),
        picks in proptest::collection::vec((0usize..8, 0usize..8), 1..6),
    ) {
        let mut graph = graph;
        for (a, b) in picks {
            let (from, to) = (id(&name(a)), id(&name(b)));
            if !graph.contains(&from) || !graph.contains(&to) {
                continue;
            }
            // `from` waiting on `to` closes a loop iff `to` already waits on `from`.
            let closes_loop = graph.is_reachable(&to, &from);
            let before = graph.clone();

            match graph.add_edge(&from, &to, "blocks", "proptest") {
                Err(CritpathError::Cycle { .. }) => {
                    prop_assert!(closes_loop);
                    prop_assert_eq!(&graph, &before);
                }
                Ok(_) => prop_assert!(!closes_loop),
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
            prop_assert!(topo::build(&graph).is_ok());
        }
    }
}
