// src/analytics/ml.rs

//! Small statistical models over topic features, built on `nalgebra`.
//!
//! None of these feed the recommendation flow; they back the insights endpoint.

use nalgebra::{DMatrix, DVector, RowDVector};
use serde::Serialize;

use super::{features::TopicFeatures, scorer::Status};

/// Topics under this accuracy are labelled weak for classifier training.
const WEAK_LABEL_BELOW: f64 = 60.0;

const LEARNING_RATE: f64 = 0.5;
const TRAINING_EPOCHS: usize = 500;

/// Inverse regularization strength, as in the usual `C` parameter.
const REGULARIZATION_C: f64 = 1.0;

const MAX_KMEANS_ITERATIONS: usize = 100;

/// Singular values below this are treated as zero by the least-squares solve.
const SVD_EPSILON: f64 = 1e-12;

/// One row per topic.
fn feature_matrix<const N: usize>(
    features: &[TopicFeatures],
    row: impl Fn(&TopicFeatures) -> [f64; N],
) -> DMatrix<f64> {
    DMatrix::from_row_iterator(features.len(), N, features.iter().flat_map(row))
}

/// Zero-mean, unit-variance scaling per column.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: DVector<f64>,
    scales: DVector<f64>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self {
            means: DVector::zeros(0),
            scales: DVector::zeros(0),
        }
    }
}

impl StandardScaler {
    /// Columns with zero variance keep a scale of 1.
    pub fn fit(data: &DMatrix<f64>) -> Self {
        let means = DVector::from_iterator(data.ncols(), data.column_iter().map(|col| col.mean()));
        let scales = DVector::from_iterator(
            data.ncols(),
            data.column_iter().map(|col| {
                let var = col.variance();
                if var > 0.0 { var.sqrt() } else { 1.0 }
            }),
        );

        Self { means, scales }
    }

    pub fn transform(&self, data: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| {
            (data[(i, j)] - self.means[j]) / self.scales[j]
        })
    }

    pub fn inverse_transform(&self, data: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| {
            data[(i, j)] * self.scales[j] + self.means[j]
        })
    }
}

fn classifier_row(f: &TopicFeatures) -> [f64; 4] {
    [f.accuracy, f.avg_time, f.trend, f.consistency]
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierReport {
    /// Fraction of training rows predicted correctly.
    pub accuracy: f64,

    /// `[[true_strong, false_weak], [false_strong, true_weak]]`.
    pub confusion_matrix: [[usize; 2]; 2],
}

/// L2-regularized logistic regression predicting whether a topic is weak.
#[derive(Debug, Clone)]
pub struct WeakAreaClassifier {
    scaler: StandardScaler,
    weights: DVector<f64>,
    bias: f64,
    trained: bool,
}

impl Default for WeakAreaClassifier {
    fn default() -> Self {
        Self {
            scaler: StandardScaler::default(),
            weights: DVector::zeros(0),
            bias: 0.0,
            trained: false,
        }
    }
}

impl WeakAreaClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Needs at least two topics. Full-batch gradient descent on the
    /// regularized log loss.
    pub fn train(&mut self, features: &[TopicFeatures]) -> Option<ClassifierReport> {
        if features.len() < 2 {
            return None;
        }

        let raw = feature_matrix(features, classifier_row);
        let labels = DVector::from_iterator(
            features.len(),
            features
                .iter()
                .map(|f| if f.accuracy < WEAK_LABEL_BELOW { 1.0 } else { 0.0 }),
        );

        self.scaler = StandardScaler::fit(&raw);
        let x = self.scaler.transform(&raw);
        let n = x.nrows() as f64;

        self.weights = DVector::zeros(x.ncols());
        self.bias = 0.0;

        for _ in 0..TRAINING_EPOCHS {
            let errors = self.probabilities(&x) - &labels;
            let grad_w = x.transpose() * &errors;
            let step = (grad_w + &self.weights / REGULARIZATION_C) * (LEARNING_RATE / n);

            self.weights -= step;
            self.bias -= LEARNING_RATE * errors.sum() / n;
        }
        self.trained = true;

        let mut confusion = [[0usize; 2]; 2];
        for (p, label) in self.probabilities(&x).iter().zip(labels.iter()) {
            confusion[*label as usize][usize::from(*p >= 0.5)] += 1;
        }
        let hits = confusion[0][0] + confusion[1][1];

        Some(ClassifierReport {
            accuracy: hits as f64 / n,
            confusion_matrix: confusion,
        })
    }

    /// Probability that the topic is weak; `None` before training.
    pub fn predict(&self, features: &TopicFeatures) -> Option<f64> {
        if !self.trained {
            return None;
        }
        let x = self.scaler.transform(&feature_matrix(std::slice::from_ref(features), classifier_row));
        Some(self.probabilities(&x)[0])
    }

    /// `x` must already be scaled.
    fn probabilities(&self, x: &DMatrix<f64>) -> DVector<f64> {
        (x * &self.weights).add_scalar(self.bias).map(sigmoid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub topic: String,
    pub cluster: usize,
    pub label: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringReport {
    pub clusters: Vec<ClusterAssignment>,

    /// Centers in original units: `[accuracy, avg_time, total_attempts]`.
    pub centers: Vec<Vec<f64>>,

    /// Sum of squared distances to the assigned center, in scaled units.
    pub inertia: f64,
}

/// K-means over `[accuracy, avg_time, total_attempts]`.
#[derive(Debug, Clone)]
pub struct PerformanceClusterer {
    k: usize,
}

impl Default for PerformanceClusterer {
    fn default() -> Self {
        Self { k: 3 }
    }
}

impl PerformanceClusterer {
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    /// Needs at least `k` topics.
    pub fn fit_predict(&self, features: &[TopicFeatures]) -> Option<ClusteringReport> {
        if features.len() < self.k {
            return None;
        }

        let raw = feature_matrix(features, |f| [f.accuracy, f.avg_time, f.total_attempts as f64]);
        let scaler = StandardScaler::fit(&raw);
        let points = scaler.transform(&raw);

        let mut centers = farthest_point_init(&points, self.k);
        let mut assignments = vec![usize::MAX; points.nrows()];

        for _ in 0..MAX_KMEANS_ITERATIONS {
            let next: Vec<usize> = (0..points.nrows())
                .map(|i| nearest(&centers, &points, i).0)
                .collect();
            if next == assignments {
                break;
            }
            assignments = next;

            for c in 0..self.k {
                let members: Vec<usize> = (0..points.nrows()).filter(|i| assignments[*i] == c).collect();
                // An empty cluster keeps its previous center.
                if members.is_empty() {
                    continue;
                }
                let sum = members
                    .iter()
                    .fold(RowDVector::zeros(points.ncols()), |acc, i| acc + points.row(*i));
                centers.set_row(c, &(sum / members.len() as f64));
            }
        }

        let inertia = (0..points.nrows())
            .map(|i| (points.row(i) - centers.row(assignments[i])).norm_squared())
            .sum();

        let centers = scaler.inverse_transform(&centers);
        let labels: Vec<Status> = centers.row_iter().map(|c| cluster_label(c[0])).collect();

        let clusters = features
            .iter()
            .zip(&assignments)
            .map(|(f, a)| ClusterAssignment {
                topic: f.topic.clone(),
                cluster: *a,
                label: labels[*a],
            })
            .collect();

        Some(ClusteringReport {
            clusters,
            centers: centers
                .row_iter()
                .map(|c| c.iter().copied().collect())
                .collect(),
            inertia,
        })
    }
}

fn cluster_label(center_accuracy: f64) -> Status {
    if center_accuracy < 50.0 {
        Status::Weak
    } else if center_accuracy < 70.0 {
        Status::Moderate
    } else {
        Status::Strong
    }
}

/// Closest center to row `i` of `points`, with its squared distance.
fn nearest(centers: &DMatrix<f64>, points: &DMatrix<f64>, i: usize) -> (usize, f64) {
    centers
        .row_iter()
        .enumerate()
        .map(|(c, center)| (c, (center - points.row(i)).norm_squared()))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Deterministic seeding: start at the first point, then repeatedly take the
/// point farthest from every chosen center.
fn farthest_point_init(points: &DMatrix<f64>, k: usize) -> DMatrix<f64> {
    let mut chosen = vec![0usize];
    while chosen.len() < k {
        let centers = points.select_rows(chosen.iter());
        let (idx, _) = (0..points.nrows())
            .map(|i| (i, nearest(&centers, points, i).1))
            .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        chosen.push(idx);
    }
    points.select_rows(chosen.iter())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionReport {
    pub mse: f64,
    pub rmse: f64,
    pub r2_score: f64,

    /// Accuracy points gained per session.
    pub slope: f64,
    pub intercept: f64,
}

/// Least-squares line through (session number, accuracy).
#[derive(Debug, Clone, Default)]
pub struct ProgressPredictor {
    slope: f64,
    intercept: f64,
    trained: bool,
}

impl ProgressPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Needs at least two sessions.
    pub fn train(&mut self, sessions: &[(f64, f64)]) -> Option<RegressionReport> {
        if sessions.len() < 2 {
            return None;
        }

        let n = sessions.len();
        let xs = DVector::from_iterator(n, sessions.iter().map(|(x, _)| *x));
        let ys = DVector::from_iterator(n, sessions.iter().map(|(_, y)| *y));

        // A constant x leaves the slope undetermined; fit a flat line.
        let (slope, intercept) = if xs.variance() > 0.0 {
            let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { xs[i] } else { 1.0 });
            let coefficients = design.svd(true, true).solve(&ys, SVD_EPSILON).ok()?;
            (coefficients[0], coefficients[1])
        } else {
            (0.0, ys.mean())
        };

        self.slope = slope;
        self.intercept = intercept;
        self.trained = true;

        let residuals = &ys - xs.map(|x| slope * x + intercept);
        let ss_res = residuals.norm_squared();
        let ss_tot = ys.add_scalar(-ys.mean()).norm_squared();
        let mse = ss_res / n as f64;
        let r2_score = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Some(RegressionReport {
            mse,
            rmse: mse.sqrt(),
            r2_score,
            slope,
            intercept,
        })
    }

    /// Predicted accuracy for a future session, clamped to [0, 100].
    pub fn predict(&self, session_number: f64) -> Option<f64> {
        self.trained
            .then(|| (self.slope * session_number + self.intercept).clamp(0.0, 100.0))
    }
}
