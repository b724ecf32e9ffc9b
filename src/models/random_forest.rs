//! Random Forest (регрессия)

#![allow(non_snake_case)]

use linfa::traits::{Fit, PredictInplace};
use linfa::DatasetBase;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::ForestParams;
use crate::error::{PipelineError, Result};

/// Минимальная разница значений признака, при которой возможен порог
const FEATURE_THRESHOLD: f64 = 1e-7;
const IMPURITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
}

impl RandomForestParams {
    pub fn new() -> Self {
        Self::from(&ForestParams::default())
    }

    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&ForestParams> for RandomForestParams {
    fn from(p: &ForestParams) -> Self {
        Self {
            n_trees: p.n_trees,
            seed: p.seed,
            max_depth: p.max_depth,
            min_samples_split: p.min_samples_split,
            min_samples_leaf: p.min_samples_leaf,
            bootstrap: p.bootstrap,
        }
    }
}

enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Дерево регрессии (CART, критерий MSE)
struct RegressionTree {
    root: TreeNode,
    /// Суммарное уменьшение SSE по каждому признаку
    impurity_decrease: Array1<f64>,
}

struct TreeBuilder<'a> {
    X: &'a Array2<f64>,
    y: &'a Array1<f64>,
    params: &'a RandomForestParams,
    rng: StdRng,
    impurity_decrease: Array1<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self, indices: Vec<usize>) -> RegressionTree {
        let root = self.build_node(indices, 0);
        RegressionTree {
            root,
            impurity_decrease: self.impurity_decrease,
        }
    }

    fn build_node(&mut self, indices: Vec<usize>, depth: usize) -> TreeNode {
        let n = indices.len();
        let (mean, sse) = self.mean_and_sse(&indices);

        let depth_reached = self.params.max_depth.map_or(false, |d| depth >= d);
        if depth_reached
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || sse / n as f64 <= IMPURITY_EPSILON
        {
            return TreeNode::Leaf { value: mean };
        }

        let split = match self.find_best_split(&indices) {
            Some(split) => split,
            None => return TreeNode::Leaf { value: mean },
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.X[[i, split.feature]] <= split.threshold);

        let (_, left_sse) = self.mean_and_sse(&left_indices);
        let (_, right_sse) = self.mean_and_sse(&right_indices);
        self.impurity_decrease[split.feature] += (sse - left_sse - right_sse).max(0.0);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build_node(left_indices, depth + 1)),
            right: Box::new(self.build_node(right_indices, depth + 1)),
        }
    }

    /// Перебор всех признаков (в случайном порядке) и всех порогов между
    /// соседними различными значениями
    fn find_best_split(&mut self, indices: &[usize]) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        let total_sum: f64 = indices.iter().map(|&i| self.y[i]).sum();

        let mut features: Vec<usize> = (0..self.X.ncols()).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<BestSplit> = None;
        let mut sorted = indices.to_vec();

        for feature in features {
            let column = self.X.column(feature);
            sorted.sort_by(|&a, &b| {
                column[a]
                    .partial_cmp(&column[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let first = column[sorted[0]];
            let last = column[sorted[n - 1]];
            if last <= first + FEATURE_THRESHOLD {
                continue;
            }

            let mut left_sum = 0.0;
            for pos in 1..n {
                left_sum += self.y[sorted[pos - 1]];

                let prev = column[sorted[pos - 1]];
                let next = column[sorted[pos]];
                if next <= prev + FEATURE_THRESHOLD {
                    continue;
                }

                let n_left = pos;
                let n_right = n - pos;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                // Максимизация sum_l²/n_l + sum_r²/n_r эквивалентна минимизации SSE
                let right_sum = total_sum - left_sum;
                let score =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;

                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(BestSplit {
                        feature,
                        threshold: midpoint(prev, next),
                        score,
                    });
                }
            }
        }

        best
    }

    fn mean_and_sse(&self, indices: &[usize]) -> (f64, f64) {
        if indices.is_empty() {
            return (0.0, 0.0);
        }
        let mean = indices.iter().map(|&i| self.y[i]).sum::<f64>() / indices.len() as f64;
        let sse = indices.iter().map(|&i| (self.y[i] - mean).powi(2)).sum();
        (mean, sse)
    }
}

fn midpoint(prev: f64, next: f64) -> f64 {
    let mid = prev / 2.0 + next / 2.0;
    if mid >= next || !mid.is_finite() {
        prev
    } else {
        mid
    }
}

impl RegressionTree {
    fn is_split(&self) -> bool {
        matches!(self.root, TreeNode::Split { .. })
    }

    fn predict_single(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// Обученный лес
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    importances: Array1<f64>,
}

impl RandomForest {
    pub fn params() -> RandomForestParams {
        RandomForestParams::new()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Важность признаков (mean decrease in impurity), сумма = 1
    pub fn feature_importances(&self) -> &Array1<f64> {
        &self.importances
    }

    fn compute_importances(trees: &[RegressionTree], n_features: usize) -> Array1<f64> {
        let mut total = Array1::zeros(n_features);
        let mut counted = 0usize;

        // Деревья из одного листа не учитываются
        for tree in trees.iter().filter(|t| t.is_split()) {
            let sum = tree.impurity_decrease.sum();
            if sum > 0.0 {
                total += &(&tree.impurity_decrease / sum);
            }
            counted += 1;
        }

        if counted == 0 {
            return total;
        }
        total /= counted as f64;

        let sum = total.sum();
        if sum > 0.0 {
            total /= sum;
        }
        total
    }
}

impl Fit<Array2<f64>, Array1<f64>, PipelineError> for RandomForestParams {
    type Object = RandomForest;

    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<f64>>) -> Result<RandomForest> {
        let X = dataset.records();
        let y = dataset.targets();
        let n_samples = X.nrows();

        if n_samples == 0 || X.ncols() == 0 {
            return Err(PipelineError::Model("Empty dataset".to_string()));
        }
        if y.len() != n_samples {
            return Err(PipelineError::Model(format!(
                "Expected {} targets, got {}",
                n_samples,
                y.len()
            )));
        }
        if self.n_trees == 0 {
            return Err(PipelineError::Model("n_trees must be positive".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.n_trees);

        for _ in 0..self.n_trees {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());

            let indices: Vec<usize> = if self.bootstrap {
                (0..n_samples).map(|_| tree_rng.gen_range(0..n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };

            let builder = TreeBuilder {
                X,
                y,
                params: self,
                rng: tree_rng,
                impurity_decrease: Array1::zeros(X.ncols()),
            };
            trees.push(builder.build(indices));
        }

        let importances = RandomForest::compute_importances(&trees, X.ncols());
        tracing::debug!("Random forest trained: {} trees, {} features", trees.len(), X.ncols());

        Ok(RandomForest {
            trees,
            n_features: X.ncols(),
            importances,
        })
    }
}

impl PredictInplace<Array2<f64>, Array1<f64>> for RandomForest {
    fn predict_inplace(&self, x: &Array2<f64>, y: &mut Array1<f64>) {
        assert_eq!(
            x.ncols(),
            self.n_features,
            "Number of features must match the training data"
        );
        assert_eq!(x.nrows(), y.len(), "Target buffer must have one entry per sample");

        let n_trees = self.trees.len() as f64;
        for (i, sample) in x.rows().into_iter().enumerate() {
            let sum: f64 = self.trees.iter().map(|t| t.predict_single(sample)).sum();
            y[i] = sum / n_trees;
        }
    }

    fn default_target(&self, x: &Array2<f64>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}
