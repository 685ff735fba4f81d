//! RecursiveSolver: top-down tree construction around a split strategy

use super::{Partition, SplitContext, SplitStrategy};
use crate::config::SolverConfig;
use crate::error::{Result, SolverError};
use crate::matrix::{
    CharacterMatrix, PriorTransform, PriorTransformKind, Priors, UniqueCharacterMatrix, Weights,
};
use crate::tree::{Tree, TreeNode};
use log::{debug, info, warn};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

/// Recursively partitions samples with `S` and assembles the lineage tree
pub struct RecursiveSolver<S> {
    strategy: S,
    prior_transform: Box<dyn PriorTransform>,
}

impl<S: SplitStrategy> RecursiveSolver<S> {
    /// Solver with the default `-ln(p)` prior transform
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            prior_transform: Box::new(PriorTransformKind::default()),
        }
    }

    /// Solver using the prior transform selected in `config`
    pub fn from_config(strategy: S, config: &SolverConfig) -> Self {
        Self::new(strategy).with_prior_transform(config.prior_transform)
    }

    pub fn with_prior_transform<T: PriorTransform + 'static>(mut self, transform: T) -> Self {
        self.prior_transform = Box::new(transform);
        self
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Reconstruct the lineage of every sample in `matrix`.
    ///
    /// Identical samples end up as zero-length siblings under one node. Sets
    /// the strategy cannot separate become polytomies.
    pub fn solve(&self, matrix: &CharacterMatrix, priors: Option<&Priors>) -> Result<Tree> {
        if matrix.is_empty() {
            return Err(SolverError::EmptyInput);
        }
        let weights = priors
            .map(|p| Weights::from_priors(p, self.prior_transform.as_ref()))
            .transpose()?;
        let unique = matrix.deduplicate();
        let ctx = SplitContext::new(&unique, weights.as_ref());

        info!(
            "Solving {} samples ({} unique) with {} strategy",
            matrix.len(),
            unique.len(),
            self.strategy.name()
        );

        let mut graph: StableDiGraph<TreeNode, f64> = StableDiGraph::new();
        let mut root = None;
        let mut stack: Vec<(Vec<usize>, Option<NodeIndex>)> = vec![((0..unique.len()).collect(), None)];

        while let Some((samples, parent)) = stack.pop() {
            match samples.len() {
                0 => return Err(SolverError::EmptyPartition),
                1 => {
                    let node = add_row(&mut graph, &unique, samples[0]);
                    attach(&mut graph, &mut root, parent, node);
                }
                _ => {
                    let node = graph.add_node(TreeNode::Internal);
                    attach(&mut graph, &mut root, parent, node);

                    match self.split(&ctx, &samples)? {
                        Some(partition) => {
                            stack.push((partition.right, Some(node)));
                            stack.push((partition.left, Some(node)));
                        }
                        None => {
                            for &row in &samples {
                                let child = add_row(&mut graph, &unique, row);
                                graph.add_edge(node, child, 0.0);
                            }
                        }
                    }
                }
            }
        }

        let root = root.ok_or(SolverError::EmptyInput)?;
        let tree = Tree::from_graph(graph, root, matrix.meta_data().cloned());
        info!(
            "Solved tree with {} leaves and {} internal nodes",
            tree.leaves().len(),
            tree.internal_nodes().len()
        );
        Ok(tree)
    }

    /// Validated two-sided partition, or `None` when the set is a polytomy
    fn split(&self, ctx: &SplitContext<'_>, samples: &[usize]) -> Result<Option<Partition>> {
        let partition = match self.strategy.split(ctx, samples) {
            Ok(partition) => partition,
            Err(e) if e.is_recoverable() => {
                warn!("{}; keeping {} samples as a polytomy", e, samples.len());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        partition.validate(samples)?;
        if partition.is_degenerate() {
            warn!(
                "{} strategy could not separate {} samples; keeping them as a polytomy",
                self.strategy.name(),
                samples.len()
            );
            return Ok(None);
        }
        debug!(
            "Split {} samples into {} and {}",
            samples.len(),
            partition.left.len(),
            partition.right.len()
        );
        Ok(Some(partition))
    }
}

/// Node for a deduplicated row: a leaf, or a node over zero-length sibling
/// leaves when several samples share the row
fn add_row(
    graph: &mut StableDiGraph<TreeNode, f64>,
    unique: &UniqueCharacterMatrix,
    row: usize,
) -> NodeIndex {
    match unique.samples_of(row) {
        [sample] => graph.add_node(TreeNode::Leaf(sample.clone())),
        samples => {
            let node = graph.add_node(TreeNode::Internal);
            for sample in samples {
                let leaf = graph.add_node(TreeNode::Leaf(sample.clone()));
                graph.add_edge(node, leaf, 0.0);
            }
            node
        }
    }
}

fn attach(
    graph: &mut StableDiGraph<TreeNode, f64>,
    root: &mut Option<NodeIndex>,
    parent: Option<NodeIndex>,
    node: NodeIndex,
) {
    match parent {
        Some(parent) => {
            graph.add_edge(parent, node, 0.0);
        }
        None => *root = Some(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FnPriorTransform;
    use crate::solver::{MissingDataPolicy, PercolationSolver, VanillaGreedySolver};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn matrix(rows: Vec<Vec<i32>>) -> CharacterMatrix {
        CharacterMatrix::new(
            rows.into_iter().enumerate().map(|(i, r)| (i.to_string(), r)),
            -1,
        )
        .unwrap()
    }

    fn random_matrix(rng: &mut StdRng, n: usize, k: usize) -> CharacterMatrix {
        let rows = (0..n)
            .map(|_| {
                (0..k)
                    .map(|_| if rng.gen_bool(0.15) { -1 } else { rng.gen_range(0..4) })
                    .collect()
            })
            .collect();
        matrix(rows)
    }

    fn assert_well_formed(tree: &Tree, matrix: &CharacterMatrix) {
        let mut labels: Vec<String> = tree.leaf_labels().into_iter().map(String::from).collect();
        labels.sort();
        let mut samples = matrix.samples().to_vec();
        samples.sort();
        assert_eq!(labels, samples);
        assert!(!tree.has_unifurcations());
    }

    #[test]
    fn test_single_sample() {
        init_logger();
        let m = matrix(vec![vec![1, 0, 2]]);
        let tree = RecursiveSolver::new(VanillaGreedySolver::new()).solve(&m, None).unwrap();
        assert_eq!(tree.leaf_labels(), vec!["0"]);
        assert!(tree.internal_nodes().is_empty());
        assert_eq!(tree.to_newick(), "0;");
    }

    #[test]
    fn test_two_mutation_groups() {
        init_logger();
        let m = matrix(vec![vec![1, 0], vec![1, 0], vec![0, 1], vec![0, 1]]);
        let percolation = RecursiveSolver::new(PercolationSolver::new()).solve(&m, None).unwrap();
        assert_eq!(percolation.to_newick(), "((0,1),(2,3));");

        let greedy = RecursiveSolver::new(VanillaGreedySolver::new()).solve(&m, None).unwrap();
        assert_eq!(greedy.to_newick(), "((0,1),(2,3));");
    }

    #[test]
    fn test_duplicates_become_zero_length_siblings() {
        let m = matrix(vec![vec![3, 3], vec![3, 3], vec![3, 3]]);
        let tree = RecursiveSolver::new(PercolationSolver::new()).solve(&m, None).unwrap();
        assert_eq!(tree.to_newick(), "(0,1,2);");
        assert!(tree.edges().iter().all(|&(_, _, length)| length == 0.0));
    }

    #[test]
    fn test_non_separable_becomes_polytomy() {
        let m = matrix(vec![vec![1, -1], vec![-1, -1], vec![-1, 0]]);
        let tree = RecursiveSolver::new(VanillaGreedySolver::new()).solve(&m, None).unwrap();
        assert_eq!(tree.to_newick(), "(0,1,2);");

        let high = PercolationSolver::with_similarity(crate::similarity::SimilarityKind::default(), 5.0).unwrap();
        let tree = RecursiveSolver::new(high).solve(&m, None).unwrap();
        assert_eq!(tree.internal_nodes().len(), 1);
        assert_eq!(tree.leaves().len(), 3);
    }

    #[test]
    fn test_every_sample_in_exactly_one_leaf() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            let m = random_matrix(&mut rng, 16, 8);
            let greedy = RecursiveSolver::new(VanillaGreedySolver::new()).solve(&m, None).unwrap();
            assert_well_formed(&greedy, &m);
            let percolation = RecursiveSolver::new(PercolationSolver::new()).solve(&m, None).unwrap();
            assert_well_formed(&percolation, &m);
        }
    }

    #[test]
    fn test_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = random_matrix(&mut rng, 20, 10);

        let percolation = RecursiveSolver::new(PercolationSolver::new());
        let first = percolation.solve(&m, None).unwrap();
        let second = percolation.solve(&m, None).unwrap();
        assert_eq!(first.to_newick(), second.to_newick());
        assert_eq!(first.fingerprint(), second.fingerprint());

        let greedy = RecursiveSolver::new(VanillaGreedySolver::with_classifier(
            MissingDataPolicy::AverageSimilarity,
        ));
        let first = greedy.solve(&m, None).unwrap();
        let second = greedy.solve(&m, None).unwrap();
        assert_eq!(first.to_newick(), second.to_newick());
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_empty_matrix() {
        let m = CharacterMatrix::new(Vec::<(String, Vec<i32>)>::new(), -1).unwrap();
        let err = RecursiveSolver::new(VanillaGreedySolver::new()).solve(&m, None).unwrap_err();
        assert!(matches!(err, SolverError::EmptyInput));
    }

    /// State 1 at character 0 is carried by three samples, state 2 at
    /// character 1 by two
    fn weighted_matrix() -> CharacterMatrix {
        matrix(vec![vec![1, 2, 1], vec![1, 2, 2], vec![1, 0, 0], vec![0, 0, 0]])
    }

    fn weighted_priors() -> Priors {
        let mut priors = Priors::new();
        priors.insert(0, BTreeMap::from([(1, 0.5)]));
        priors.insert(1, BTreeMap::from([(2, 0.3)]));
        priors
    }

    #[test]
    fn test_priors_reach_the_strategy() {
        let m = weighted_matrix();
        let priors = weighted_priors();
        let solver = RecursiveSolver::new(VanillaGreedySolver::new());

        let unweighted = solver.solve(&m, None).unwrap();
        assert_eq!(unweighted.to_newick(), "(((0,1),2),3);");

        // 2 * -ln(0.3) outweighs 3 * -ln(0.5)
        let weighted = solver.solve(&m, Some(&priors)).unwrap();
        assert_eq!(weighted.to_newick(), "((0,1),(2,3));");
        assert_ne!(weighted.fingerprint(), unweighted.fingerprint());
    }

    #[test]
    fn test_custom_prior_transform() {
        let m = weighted_matrix();
        let priors = weighted_priors();

        let inverse = RecursiveSolver::new(VanillaGreedySolver::new())
            .with_prior_transform(FnPriorTransform(|p: f64| 1.0 / p));
        assert_eq!(inverse.solve(&m, Some(&priors)).unwrap().to_newick(), "((0,1),(2,3));");

        let flat = RecursiveSolver::new(VanillaGreedySolver::new())
            .with_prior_transform(FnPriorTransform(|_: f64| 1.0));
        assert_eq!(flat.solve(&m, Some(&priors)).unwrap().to_newick(), "(((0,1),2),3);");
    }

    #[test]
    fn test_from_config_applies_prior_transform() {
        let m = weighted_matrix();
        let priors = weighted_priors();

        let config = SolverConfig::default();
        let negative_log =
            RecursiveSolver::from_config(VanillaGreedySolver::from_config(&config), &config);
        let tree = negative_log.solve(&m, Some(&priors)).unwrap();
        assert_eq!(tree.to_newick(), "((0,1),(2,3));");

        // 3 / sqrt(0.5) outweighs 2 / sqrt(0.3)
        let config = SolverConfig {
            prior_transform: PriorTransformKind::SquareRootInverse,
            ..SolverConfig::default()
        };
        let root_inverse =
            RecursiveSolver::from_config(VanillaGreedySolver::from_config(&config), &config);
        let tree = root_inverse.solve(&m, Some(&priors)).unwrap();
        assert_eq!(tree.to_newick(), "(((0,1),2),3);");
    }

    #[test]
    fn test_invalid_prior() {
        let m = weighted_matrix();
        let mut priors = weighted_priors();
        priors.insert(2, BTreeMap::from([(2, 0.0)]));
        let err = RecursiveSolver::new(VanillaGreedySolver::new())
            .solve(&m, Some(&priors))
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidPrior { character: 2, state: 2, .. }));
    }

    #[test]
    fn test_meta_data_carried_over() {
        let meta = serde_json::json!({"0": {"tissue": "lung"}});
        let m = matrix(vec![vec![1, 0], vec![0, 1]]).with_meta_data(meta.clone());
        let tree = RecursiveSolver::new(VanillaGreedySolver::new()).solve(&m, None).unwrap();
        assert_eq!(tree.meta_data(), Some(&meta));
    }

    struct DropsSamples;

    impl SplitStrategy for DropsSamples {
        fn split(&self, _ctx: &SplitContext<'_>, samples: &[usize]) -> Result<Partition> {
            Ok(Partition::new(vec![samples[0]], vec![samples[1]]))
        }

        fn name(&self) -> &'static str {
            "drops"
        }
    }

    #[test]
    fn test_invalid_partition_is_fatal() {
        let m = matrix(vec![vec![1, 0], vec![0, 1], vec![2, 2]]);
        let err = RecursiveSolver::new(DropsSamples).solve(&m, None).unwrap_err();
        assert!(matches!(err, SolverError::InvalidPartition(_)));
    }
}
