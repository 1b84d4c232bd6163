//! Classifier internals: label encoding, data splitting, and the two
//! supported model families fitted on embedding vectors.
//!
//! Pure Rust on ndarray; artifacts are plain serde-serializable weights.

use crate::error::{Result, ScreenerError};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

const LOGISTIC_LEARNING_RATE: f64 = 0.1;
const LOGISTIC_L2: f64 = 1e-4;
const FOREST_TREES: usize = 100;
const FOREST_MAX_DEPTH: usize = 12;
const MIN_SAMPLES_SPLIT: usize = 2;
const MAX_SPLIT_CANDIDATES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    Logistic,
    RandomForest,
}

impl FromStr for ModelType {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logistic" => Ok(ModelType::Logistic),
            "random_forest" => Ok(ModelType::RandomForest),
            other => Err(ScreenerError::TrainingConfig(format!(
                "Unknown model_type: {} (expected \"logistic\" or \"random_forest\")",
                other
            ))),
        }
    }
}

/// Maps category strings to dense indices; classes are sorted so encoding
/// is stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn transform(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| ScreenerError::TrainingConfig(format!("Unknown category: {}", label)))
    }

    pub fn inverse(&self, index: usize) -> &str {
        &self.classes[index]
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Seeded stratified split: every class contributes `test_size` of its
/// samples to the held-out set (at least one, never all). Classes with a
/// single sample cannot be stratified and fail fast.
pub fn stratified_split(
    labels: &[usize],
    num_classes: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(ScreenerError::TrainingConfig(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
    for (index, &label) in labels.iter().enumerate() {
        by_class[label].push(index);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (class, mut members) in by_class.into_iter().enumerate() {
        if members.len() < 2 {
            return Err(ScreenerError::TrainingConfig(format!(
                "Class {} has {} sample(s); at least 2 are required for a stratified split",
                class,
                members.len()
            )));
        }
        members.shuffle(&mut rng);

        let n_test = ((members.len() as f64 * test_size).round() as usize)
            .max(1)
            .min(members.len() - 1);
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

fn softmax_rows(logits: &mut Array2<f64>) {
    for mut row in logits.rows_mut() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for v in row.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in row.iter_mut() {
            *v /= sum;
        }
    }
}

/// Multinomial logistic regression trained with batch gradient descent and
/// L2 regularization. Deterministic: weights start at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl LogisticRegression {
    pub fn fit(x: &Array2<f64>, y: &[usize], num_classes: usize, max_iter: usize) -> Self {
        let (n_samples, n_features) = x.dim();
        let mut weights = Array2::<f64>::zeros((num_classes, n_features));
        let mut bias = Array1::<f64>::zeros(num_classes);

        let mut one_hot = Array2::<f64>::zeros((n_samples, num_classes));
        for (row, &label) in y.iter().enumerate() {
            one_hot[[row, label]] = 1.0;
        }

        let scale = 1.0 / n_samples as f64;
        for _ in 0..max_iter {
            let mut probs = x.dot(&weights.t()) + &bias;
            softmax_rows(&mut probs);

            let residual = &probs - &one_hot;
            let grad_weights = residual.t().dot(x) * scale + &weights * LOGISTIC_L2;
            let grad_bias = residual.sum_axis(ndarray::Axis(0)) * scale;

            weights = weights - grad_weights * LOGISTIC_LEARNING_RATE;
            bias = bias - grad_bias * LOGISTIC_LEARNING_RATE;
        }

        Self { weights, bias }
    }

    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let x = Array1::from(features.to_vec());
        let logits = self.weights.dot(&x) + &self.bias;

        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = logits.iter().map(|v| (v - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        exp.into_iter().map(|v| v / sum).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn fit(
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        num_classes: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, indices, num_classes, FOREST_MAX_DEPTH, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        num_classes: usize,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(y, indices, num_classes);
        let majority = argmax(&counts);

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure || depth == 0 || indices.len() < MIN_SAMPLES_SPLIT {
            self.nodes.push(TreeNode::Leaf { class: majority });
            return self.nodes.len() - 1;
        }

        match self.best_split(x, y, indices, num_classes, rng) {
            None => {
                self.nodes.push(TreeNode::Leaf { class: majority });
                self.nodes.len() - 1
            }
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| x[[i, feature]] <= threshold);

                // Reserve the split slot before growing children
                self.nodes.push(TreeNode::Leaf { class: majority });
                let node = self.nodes.len() - 1;

                let left = self.grow(x, y, &left_idx, num_classes, depth - 1, rng);
                let right = self.grow(x, y, &right_idx, num_classes, depth - 1, rng);
                self.nodes[node] = TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
                node
            }
        }
    }

    /// Best gini split over a random sqrt-d feature subset, or None when no
    /// candidate separates the samples.
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        num_classes: usize,
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        let subset_size = (n_features as f64).sqrt().ceil() as usize;
        let features = rand::seq::index::sample(rng, n_features, subset_size.min(n_features));

        let parent_size = indices.len() as f64;
        let mut best: Option<(usize, f64, f64)> = None;

        for feature in features {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());
            values.dedup();
            if values.len() < 2 {
                continue;
            }

            let step = (values.len() / MAX_SPLIT_CANDIDATES).max(1);
            for pair in values.windows(2).step_by(step) {
                let threshold = (pair[0] + pair[1]) / 2.0;

                let mut left_counts = vec![0usize; num_classes];
                let mut right_counts = vec![0usize; num_classes];
                for &i in indices {
                    if x[[i, feature]] <= threshold {
                        left_counts[y[i]] += 1;
                    } else {
                        right_counts[y[i]] += 1;
                    }
                }

                let left_total: usize = left_counts.iter().sum();
                let right_total: usize = right_counts.iter().sum();
                if left_total == 0 || right_total == 0 {
                    continue;
                }

                let impurity = (left_total as f64 / parent_size) * gini(&left_counts, left_total)
                    + (right_total as f64 / parent_size) * gini(&right_counts, right_total);

                if best.map_or(true, |(_, _, current)| impurity < current) {
                    best = Some((feature, threshold, impurity));
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    fn predict(&self, features: &[f64]) -> usize {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn class_counts(y: &[usize], indices: &[usize], num_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; num_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn argmax(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .max_by_key(|(_, &count)| count)
        .map(|(index, _)| index)
        .unwrap_or(0)
}

fn gini(counts: &[usize], total: usize) -> f64 {
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Bagged gini trees; probabilities are vote fractions across the forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    num_classes: usize,
}

impl RandomForest {
    pub fn fit(x: &Array2<f64>, y: &[usize], num_classes: usize, seed: u64) -> Self {
        let n_samples = x.nrows();
        let mut rng = StdRng::seed_from_u64(seed);

        let trees = (0..FOREST_TREES)
            .map(|_| {
                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                DecisionTree::fit(x, y, &bootstrap, num_classes, &mut rng)
            })
            .collect();

        Self { trees, num_classes }
    }

    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut votes = vec![0usize; self.num_classes];
        for tree in &self.trees {
            votes[tree.predict(features)] += 1;
        }
        votes
            .into_iter()
            .map(|v| v as f64 / self.trees.len() as f64)
            .collect()
    }
}

/// A fitted classifier of either supported family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FittedModel {
    Logistic(LogisticRegression),
    RandomForest(RandomForest),
}

impl FittedModel {
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        match self {
            FittedModel::Logistic(model) => model.predict_proba(features),
            FittedModel::RandomForest(model) => model.predict_proba(features),
        }
    }

    pub fn predict(&self, features: &[f64]) -> usize {
        let probs = self.predict_proba(features);
        probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(a, b)| a == b)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Per-class precision / recall / f1 / support, keyed by class name.
pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    encoder: &LabelEncoder,
) -> BTreeMap<String, ClassMetrics> {
    let mut report = BTreeMap::new();

    for (class, name) in encoder.classes().iter().enumerate() {
        let tp = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(&t, &p)| t == class && p == class)
            .count() as f64;
        let predicted = y_pred.iter().filter(|&&p| p == class).count() as f64;
        let support = y_true.iter().filter(|&&t| t == class).count();

        let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
        let recall = if support > 0 { tp / support as f64 } else { 0.0 };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        report.insert(
            name.clone(),
            ClassMetrics {
                precision,
                recall,
                f1_score,
                support,
            },
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two well-separated clusters in 2-d
    fn toy_data() -> (Array2<f64>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            let jitter = i as f64 * 0.01;
            rows.push([0.0 + jitter, 0.1 + jitter]);
            labels.push(0);
            rows.push([2.0 + jitter, 2.1 + jitter]);
            labels.push(1);
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        (Array2::from_shape_vec((20, 2), flat).unwrap(), labels)
    }

    #[test]
    fn test_label_encoder_sorts_classes() {
        let encoder = LabelEncoder::fit(&["web", "data", "web", "devops"]);
        assert_eq!(encoder.classes(), &["data", "devops", "web"]);
        assert_eq!(encoder.transform("devops").unwrap(), 1);
        assert_eq!(encoder.inverse(2), "web");
        assert!(encoder.transform("unknown").is_err());
    }

    #[test]
    fn test_stratified_split_keeps_class_balance() {
        let labels = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        let (train, test) = stratified_split(&labels, 2, 0.2, 42).unwrap();

        assert_eq!(train.len() + test.len(), labels.len());
        assert_eq!(test.iter().filter(|&&i| labels[i] == 0).count(), 1);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 1);
    }

    #[test]
    fn test_stratified_split_is_seeded() {
        let labels = vec![0, 0, 0, 1, 1, 1, 0, 1, 0, 1];
        let a = stratified_split(&labels, 2, 0.3, 7).unwrap();
        let b = stratified_split(&labels, 2, 0.3, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stratified_split_rejects_singleton_class() {
        let labels = vec![0, 0, 1];
        let err = stratified_split(&labels, 2, 0.2, 42).unwrap_err();
        assert!(matches!(err, ScreenerError::TrainingConfig(_)));
    }

    #[test]
    fn test_model_type_parsing() {
        assert_eq!(ModelType::from_str("logistic").unwrap(), ModelType::Logistic);
        assert_eq!(
            ModelType::from_str("random_forest").unwrap(),
            ModelType::RandomForest
        );
        assert!(matches!(
            ModelType::from_str("svm").unwrap_err(),
            ScreenerError::TrainingConfig(_)
        ));
    }

    #[test]
    fn test_logistic_separates_clusters() {
        let (x, y) = toy_data();
        let model = LogisticRegression::fit(&x, &y, 2, 500);

        assert_eq!(model.predict_proba(&[0.0, 0.0]).len(), 2);
        let probs = model.predict_proba(&[0.0, 0.0]);
        assert!(probs[0] > 0.7);
        let probs = model.predict_proba(&[2.0, 2.0]);
        assert!(probs[1] > 0.7);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_separates_clusters() {
        let (x, y) = toy_data();
        let model = RandomForest::fit(&x, &y, 2, 42);

        let probs = model.predict_proba(&[0.1, 0.1]);
        assert!(probs[0] > 0.8);
        let probs = model.predict_proba(&[2.2, 2.0]);
        assert!(probs[1] > 0.8);
    }

    #[test]
    fn test_forest_is_seeded() {
        let (x, y) = toy_data();
        let a = RandomForest::fit(&x, &y, 2, 42);
        let b = RandomForest::fit(&x, &y, 2, 42);
        assert_eq!(a.predict_proba(&[1.0, 1.0]), b.predict_proba(&[1.0, 1.0]));
    }

    #[test]
    fn test_fitted_model_roundtrips_through_json() {
        let (x, y) = toy_data();
        let model = FittedModel::Logistic(LogisticRegression::fit(&x, &y, 2, 100));

        let json = serde_json::to_string(&model).unwrap();
        let restored: FittedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model.predict(&[0.0, 0.0]), restored.predict(&[0.0, 0.0]));
        assert_eq!(model.predict_proba(&[1.0, 2.0]), restored.predict_proba(&[1.0, 2.0]));
    }

    #[test]
    fn test_classification_report_perfect() {
        let encoder = LabelEncoder::fit(&["a", "b"]);
        let y = vec![0, 0, 1, 1];
        let report = classification_report(&y, &y, &encoder);

        assert_eq!(accuracy(&y, &y), 1.0);
        let a = &report["a"];
        assert_eq!(a.precision, 1.0);
        assert_eq!(a.recall, 1.0);
        assert_eq!(a.f1_score, 1.0);
        assert_eq!(a.support, 2);
    }

    #[test]
    fn test_classification_report_partial() {
        let encoder = LabelEncoder::fit(&["a", "b"]);
        let y_true = vec![0, 0, 1, 1];
        let y_pred = vec![0, 1, 1, 1];
        let report = classification_report(&y_true, &y_pred, &encoder);

        assert_eq!(accuracy(&y_true, &y_pred), 0.75);
        assert_eq!(report["a"].recall, 0.5);
        assert_eq!(report["b"].precision, 2.0 / 3.0);
    }
}
