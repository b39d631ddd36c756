//! Search orchestrator tests
//! Tests between-scaffold extension, within-scaffold closure and parallel extension

use ahash::AHashSet;
use anyhow::Result;
use scaffold_forge::core::{AdjacencyLinkageGraph, Extremity};
use scaffold_forge::scaffolding::{CancellationToken, ScaffoldPathSearcher, ScoredPath};
use scaffold_forge::utils::synthetic::{SyntheticGraphBuilder, SyntheticGraphConfig};
use scaffold_forge::PathSearchConfig;

fn r(id: u64) -> Extremity {
    Extremity::right(id)
}

fn l(id: u64) -> Extremity {
    Extremity::left(id)
}

fn params(score_cutoff: f64) -> PathSearchConfig {
    PathSearchConfig {
        score_cutoff,
        ..PathSearchConfig::default()
    }
}

fn assert_ascending(records: &[ScoredPath]) {
    for pair in records.windows(2) {
        assert!(pair[0].score <= pair[1].score, "records out of order");
    }
}

/// Two large scaffolds (1 and 10) joined through small contigs 2 and 3,
/// with a weaker detour through small contig 4
fn bridged_scaffolds() -> AdjacencyLinkageGraph {
    let mut graph = AdjacencyLinkageGraph::new();
    graph.add_contig(1, None);
    graph.add_contig(10, None);
    for id in 2..=4 {
        graph.add_contig(id, Some(300));
    }
    graph.add_link(r(1), l(2), 12.0).unwrap();
    graph.add_link(r(2), l(3), 10.0).unwrap();
    graph.add_link(r(3), l(10), 11.0).unwrap();
    graph.add_link(r(1), l(4), 2.0).unwrap();
    graph.add_link(r(4), l(10), 1.0).unwrap();
    graph
}

/// Start (5,R) can only leave through contig 1, whose (1,R) is an earlier
/// start. A dense block hung off (1,R) keeps that earlier search busy.
fn contested_start_graph() -> AdjacencyLinkageGraph {
    let mut graph = AdjacencyLinkageGraph::new();
    graph.add_link(r(5), l(1), 5.0).unwrap();
    graph.add_link(r(1), l(1000), 5.0).unwrap();
    let block: Vec<u64> = (100..110).collect();
    for &a in &block {
        graph.add_link(r(1), l(a), 1.0).unwrap();
        for &b in &block {
            if a != b {
                graph.add_link(r(a), l(b), 1.0).unwrap();
            }
        }
    }
    graph
}

/// Run both extension modes on copies of the same inputs and require identical results
fn assert_modes_agree(
    searcher: &ScaffoldPathSearcher<'_, AdjacencyLinkageGraph>,
    end: &AHashSet<Extremity>,
    iter_nodes: &[Extremity],
    num_threads: usize,
) -> Result<Vec<ScoredPath>> {
    let (mut seq_end, mut seq_nodes, mut seq_visited) =
        (end.clone(), iter_nodes.to_vec(), AHashSet::new());
    let sequential =
        searcher.extend_between_scaffolds(&mut seq_end, &mut seq_nodes, &mut seq_visited)?;

    let (mut par_end, mut par_nodes, mut par_visited) =
        (end.clone(), iter_nodes.to_vec(), AHashSet::new());
    let parallel = searcher.extend_between_scaffolds_parallel(
        &mut par_end,
        &mut par_nodes,
        &mut par_visited,
        num_threads,
    )?;

    assert_eq!(parallel.records, sequential.records);
    assert_eq!(parallel.summary, sequential.summary);
    assert_eq!(par_end, seq_end);
    assert_eq!(par_nodes, seq_nodes);
    assert_eq!(par_visited, seq_visited);
    Ok(sequential.records)
}

#[cfg(test)]
mod between_scaffolds {
    use super::*;

    #[test]
    fn test_bridge_between_large_scaffolds() -> Result<()> {
        let graph = bridged_scaffolds();
        let searcher = ScaffoldPathSearcher::new(&graph, params(1.0));

        let mut end: AHashSet<_> = [l(1), r(1), l(10), r(10)].into_iter().collect();
        let mut iter_nodes = vec![r(10), r(1)];
        let mut visited = AHashSet::new();
        let outcome = searcher.extend_between_scaffolds(&mut end, &mut iter_nodes, &mut visited)?;

        assert_ascending(&outcome.records);
        let best = outcome.records.last().expect("bridge path accepted");
        assert_eq!(best.path, vec![r(1), l(2), r(2), l(3), r(3), l(10)]);
        assert_eq!(best.path_len, 1 + 300 + 1 + 300 + 1 + 1);
        for record in &outcome.records {
            assert!(record.score >= 1.0);
            assert!(record.path.len() > 2);
        }
        assert!(visited.contains(&r(1)) && visited.contains(&r(10)));
        Ok(())
    }

    #[test]
    fn test_previous_starts_are_not_reentered() -> Result<()> {
        let graph = bridged_scaffolds();
        let searcher = ScaffoldPathSearcher::new(&graph, params(0.0));

        // (1,R) is searched first and then becomes visited; the search from
        // (10,L) cannot route back into it
        let mut end: AHashSet<_> = [r(1), l(10)].into_iter().collect();
        let mut iter_nodes = vec![l(10), r(1)];
        let outcome =
            searcher.extend_between_scaffolds(&mut end, &mut iter_nodes, &mut AHashSet::new())?;

        for record in &outcome.records {
            if record.start() == Some(l(10)) {
                assert!(!record.path[1..].contains(&r(1)));
            }
        }
        assert_eq!(outcome.summary.start_nodes_tried, 2);
        Ok(())
    }

    #[test]
    fn test_empty_inputs_give_empty_results() -> Result<()> {
        let graph = bridged_scaffolds();
        let searcher = ScaffoldPathSearcher::new(&graph, params(0.0));

        let outcome = searcher.extend_between_scaffolds(
            &mut AHashSet::new(),
            &mut Vec::new(),
            &mut AHashSet::new(),
        )?;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.start_nodes_tried, 0);
        Ok(())
    }

    #[test]
    fn test_unset_max_extensions_uses_end_size() -> Result<()> {
        let graph = bridged_scaffolds();
        let searcher = ScaffoldPathSearcher::new(&graph, params(0.0));

        let mut end: AHashSet<_> = [l(10)].into_iter().collect();
        let mut iter_nodes = vec![r(4), r(3), r(2), r(1)];
        let outcome =
            searcher.extend_between_scaffolds(&mut end, &mut iter_nodes, &mut AHashSet::new())?;

        assert_eq!(outcome.summary.start_nodes_tried, 1);
        assert_eq!(iter_nodes, vec![r(4), r(3), r(2)]);
        Ok(())
    }

    #[test]
    fn test_parallel_extension_on_synthetic_graph() -> Result<()> {
        let layout = SyntheticGraphBuilder::new(SyntheticGraphConfig {
            contigs: 30,
            noise: 1.0,
            anchor_every: 3,
            seed: 7,
            ..SyntheticGraphConfig::default()
        })?
        .build()?;
        let searcher = ScaffoldPathSearcher::new(&layout.graph, params(0.5));

        let mut iter_nodes = layout.anchor_extremities();
        let total = iter_nodes.len();
        let mut end: AHashSet<_> = iter_nodes.iter().copied().collect();
        let mut visited = AHashSet::new();
        let outcome =
            searcher.extend_between_scaffolds_parallel(&mut end, &mut iter_nodes, &mut visited, 4)?;

        assert_ascending(&outcome.records);
        assert_eq!(outcome.summary.start_nodes_tried, total);
        assert!(iter_nodes.is_empty());
        assert!(end.is_empty());
        assert_eq!(visited.len(), total);
        for record in &outcome.records {
            assert!(record.score >= 0.5);
            assert!(record.path.len() > 2);
        }
        Ok(())
    }

    #[test]
    fn test_parallel_respects_shared_budget() -> Result<()> {
        let layout = SyntheticGraphBuilder::new(SyntheticGraphConfig {
            contigs: 30,
            anchor_every: 3,
            ..SyntheticGraphConfig::default()
        })?
        .build()?;
        let mut search_params = params(0.0);
        search_params.max_extensions = 5;
        let searcher = ScaffoldPathSearcher::new(&layout.graph, search_params);

        let mut iter_nodes = layout.anchor_extremities();
        let before = iter_nodes.len();
        let mut end: AHashSet<_> = iter_nodes.iter().copied().collect();
        let outcome = searcher.extend_between_scaffolds_parallel(
            &mut end,
            &mut iter_nodes,
            &mut AHashSet::new(),
            3,
        )?;

        assert_eq!(outcome.summary.start_nodes_tried, 5);
        assert_eq!(iter_nodes.len(), before - 5);
        Ok(())
    }

    #[test]
    fn test_parallel_later_starts_avoid_earlier_starts() -> Result<()> {
        let graph = contested_start_graph();
        let mut search_params = params(0.0);
        search_params.path_threshold = 5_000;
        let searcher = ScaffoldPathSearcher::new(&graph, search_params);

        let end: AHashSet<_> = [l(1000), r(1), r(5)].into_iter().collect();
        let iter_nodes = vec![r(5), r(1)];
        for _ in 0..20 {
            let records = assert_modes_agree(&searcher, &end, &iter_nodes, 2)?;
            for record in &records {
                assert!(!record.path[1..].contains(&r(1)));
            }
            assert!(records.is_empty());
        }
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential_on_synthetic_graphs() -> Result<()> {
        for seed in [3, 7, 11, 19] {
            let layout = SyntheticGraphBuilder::new(SyntheticGraphConfig {
                contigs: 40,
                noise: 1.5,
                anchor_every: 3,
                seed,
                ..SyntheticGraphConfig::default()
            })?
            .build()?;
            let searcher = ScaffoldPathSearcher::new(&layout.graph, params(0.0));

            let iter_nodes = layout.anchor_extremities();
            let end: AHashSet<_> = iter_nodes.iter().copied().collect();
            assert_modes_agree(&searcher, &end, &iter_nodes, 4)?;
        }
        Ok(())
    }

    #[test]
    fn test_cancellation_keeps_partial_results() -> Result<()> {
        let graph = bridged_scaffolds();
        let token = CancellationToken::new();
        let searcher = ScaffoldPathSearcher::new(&graph, params(0.0)).with_cancellation(token.clone());

        let mut end: AHashSet<_> = [l(10), r(1)].into_iter().collect();
        let mut iter_nodes = vec![r(1)];
        let first = searcher.extend_between_scaffolds(&mut end, &mut iter_nodes, &mut AHashSet::new())?;
        assert_eq!(first.summary.start_nodes_tried, 1);

        token.cancel();
        let mut iter_nodes = vec![l(10)];
        let second =
            searcher.extend_between_scaffolds(&mut end, &mut iter_nodes, &mut AHashSet::new())?;
        assert_eq!(second.summary.start_nodes_tried, 0);
        assert!(second.records.is_empty());
        Ok(())
    }
}

#[cfg(test)]
mod within_scaffold {
    use super::*;

    #[test]
    fn test_closure_ranks_alternatives() -> Result<()> {
        let graph = bridged_scaffolds();
        let searcher = ScaffoldPathSearcher::new(&graph, params(1.0));
        let mut visited: AHashSet<_> = [l(1), r(1), l(10), r(10)].into_iter().collect();

        let outcome = searcher.close_within_scaffold(r(1), l(10), &mut visited, 10_000)?;

        assert_eq!(outcome.records.len(), 2);
        assert_ascending(&outcome.records);
        assert_eq!(outcome.records[1].path.len(), 6);
        assert_eq!(outcome.records[0].path, vec![r(1), l(4), r(4), l(10)]);
        assert_eq!(visited.len(), 4);
        Ok(())
    }

    #[test]
    fn test_closure_length_bound() -> Result<()> {
        let graph = bridged_scaffolds();
        let searcher = ScaffoldPathSearcher::new(&graph, params(0.0));

        // Only the single-contig detour fits, and one candidate is not enough
        let outcome = searcher.close_within_scaffold(r(1), l(10), &mut AHashSet::new(), 400)?;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.raw_paths, 1);
        Ok(())
    }

    #[test]
    fn test_closure_without_any_route() -> Result<()> {
        let mut graph = AdjacencyLinkageGraph::new();
        graph.add_contig(1, None);
        graph.add_contig(2, None);
        let searcher = ScaffoldPathSearcher::new(&graph, params(0.0));

        let outcome = searcher.close_within_scaffold(r(1), l(2), &mut AHashSet::new(), 10_000)?;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.raw_paths, 0);
        Ok(())
    }
}
