//! Property-based checks of the structural invariants the engine promises
//! to maintain regardless of which reclamation algorithm is selected.

use proptest::prelude::*;
use treebuffer::{make_node, Algorithm, Tree};

/// A tiny scripted workload: grow a handful of chains off the root, letting
/// proptest choose branching factor and deactivation order.
#[derive(Debug, Clone)]
enum Step {
    AddChild { parent_idx: usize },
    Deactivate { idx: usize },
}

fn arb_script(max_steps: usize) -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            (0..max_steps).prop_map(|idx| Step::AddChild { parent_idx: idx }),
            (0..max_steps).prop_map(|idx| Step::Deactivate { idx }),
        ],
        1..max_steps,
    )
}

/// Runs `script` against a fresh tree built with `history`/`algorithm`,
/// returning the data payloads still reachable from the frontier (one
/// ancestor chain per active node, each truncated at `history`).
fn run_script(history: u32, algorithm: Algorithm, script: &[Step]) -> Vec<Vec<i64>> {
    let (mut tree, root) = Tree::initialize(history, algorithm, make_node(0)).unwrap();
    let mut nodes = vec![root];
    let mut next_data = 1i64;

    for step in script {
        match *step {
            Step::AddChild { parent_idx } => {
                let parent = nodes[parent_idx % nodes.len()];
                if tree.get_data(parent).is_ok() {
                    // add_child requires the parent still be active; skip
                    // silently if a previous deactivate already removed it.
                    if let Ok(child) = tree.add_child(parent, make_node(next_data)) {
                        next_data += 1;
                        nodes.push(child);
                    }
                }
            }
            Step::Deactivate { idx } => {
                let candidate = nodes[idx % nodes.len()];
                let _ = tree.deactivate(candidate);
            }
        }
    }

    let mut histories: Vec<Vec<i64>> = tree
        .iter_frontier()
        .map(|id| {
            let mut out = Vec::new();
            tree.history(id, &mut out).unwrap();
            out
        })
        .collect();
    histories.sort();

    tree.dispose().unwrap();
    histories
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The four algorithms must be indistinguishable from the outside: the
    /// same script against the same history window produces the same set
    /// of frontier ancestor chains no matter which reclamation strategy
    /// retired the rest of the tree.
    #[test]
    fn algorithms_agree_on_observable_state(
        history in 1u32..5,
        script in arb_script(12),
    ) {
        let naive = run_script(history, Algorithm::Naive, &script);
        for algorithm in [Algorithm::Mark, Algorithm::Amortized, Algorithm::RealTime] {
            let other = run_script(history, algorithm, &script);
            prop_assert_eq!(&naive, &other);
        }
    }

    /// No history query ever returns more than `history` entries, and it
    /// always starts with the queried node's own payload.
    #[test]
    fn history_query_is_bounded_and_self_prefixed(
        history in 1u32..6,
        script in arb_script(10),
    ) {
        let (mut tree, root) = Tree::initialize(history, Algorithm::Mark, make_node(0)).unwrap();
        let mut nodes = vec![root];
        let mut next_data = 1i64;
        for step in &script {
            if let Step::AddChild { parent_idx } = step {
                let parent = nodes[*parent_idx % nodes.len()];
                if let Ok(child) = tree.add_child(parent, make_node(next_data)) {
                    next_data += 1;
                    nodes.push(child);
                }
            }
        }

        for &id in &nodes {
            if tree.get_data(id).is_err() {
                continue;
            }
            // history() requires the node be active; frontier membership
            // may have changed, so just check currently-active ones.
            if tree.iter_frontier().any(|f| f == id) {
                let mut out = Vec::new();
                tree.history(id, &mut out).unwrap();
                prop_assert!(out.len() as u32 <= history);
                prop_assert_eq!(out.first().copied(), Some(tree.get_data(id).unwrap()));
            }
        }

        tree.dispose().unwrap();
    }

    /// Real-time's per-operation cost (`last_op_mems`) does not grow with
    /// how large the tree has become; it is bounded by a constant that
    /// depends only on `history`.
    #[test]
    fn real_time_op_cost_is_bounded_by_history_not_size(history in 1u32..5) {
        let (mut tree, root) = Tree::initialize(history, Algorithm::RealTime, make_node(0)).unwrap();
        let mut current = root;
        let mut max_mems = 0u64;
        for i in 0..300i64 {
            let parent = current;
            current = tree.add_child(parent, make_node(i)).unwrap();
            max_mems = max_mems.max(tree.last_op_mems());
            tree.deactivate(parent).unwrap();
            max_mems = max_mems.max(tree.last_op_mems());
        }
        // A generous constant: real cost scales with `history`, never with
        // the 300 generations grown above.
        prop_assert!(max_mems <= 64 * history as u64 + 64);
        tree.dispose().unwrap();
    }
}

#[test]
fn dispose_leaves_the_arena_empty_for_every_algorithm() {
    for algorithm in [
        Algorithm::Naive,
        Algorithm::Mark,
        Algorithm::Amortized,
        Algorithm::RealTime,
    ] {
        let (mut tree, root) = Tree::initialize(3, algorithm, make_node(0)).unwrap();
        let mut frontier = vec![root];
        for generation in 0..5 {
            let mut next = Vec::new();
            for &parent in &frontier {
                let ids = tree
                    .expand(parent, vec![make_node(generation), make_node(generation + 1)])
                    .unwrap();
                next.extend(ids);
            }
            frontier = next;
        }
        tree.dispose().unwrap();
    }
}

#[test]
fn expand_is_equivalent_to_add_children_then_deactivate() {
    let (mut a, root_a) = Tree::initialize(3, Algorithm::Naive, make_node(0)).unwrap();
    let ids_a = a
        .expand(root_a, vec![make_node(1), make_node(2)])
        .unwrap();

    let (mut b, root_b) = Tree::initialize(3, Algorithm::Naive, make_node(0)).unwrap();
    let c1 = b.add_child(root_b, make_node(1)).unwrap();
    let c2 = b.add_child(root_b, make_node(2)).unwrap();
    b.deactivate(root_b).unwrap();

    assert_eq!(
        ids_a.iter().map(|&id| a.get_data(id).unwrap()).collect::<Vec<_>>(),
        vec![c1, c2].iter().map(|&id| b.get_data(id).unwrap()).collect::<Vec<_>>()
    );

    a.dispose().unwrap();
    b.dispose().unwrap();
}
