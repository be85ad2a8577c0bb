use anyhow::{bail, Result};

use crate::prediction::dataset::Sample;
use crate::prediction::Estimator;

const ITERATIONS: usize = 500;
const LEARNING_RATE: f64 = 0.5;
/// Inverse regularization strength
const C: f64 = 1.0;

/// Multinomial logistic regression treating every distinct salary as a class.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    classes: Vec<f64>,
    means: [f64; 2],
    scales: [f64; 2],
    /// Per class: bias, then one weight per standardized feature
    weights: Vec<[f64; 3]>,
}

impl LogisticRegression {
    fn standardize(&self, features: [f64; 2]) -> [f64; 2] {
        [
            (features[0] - self.means[0]) / self.scales[0],
            (features[1] - self.means[1]) / self.scales[1],
        ]
    }

    #[cfg(test)]
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }
}

fn scores(weights: &[[f64; 3]], x: [f64; 2]) -> Vec<f64> {
    weights
        .iter()
        .map(|w| w[0] + w[1] * x[0] + w[2] * x[1])
        .collect()
}

fn softmax(mut scores: Vec<f64>) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        total += *score;
    }
    scores.iter_mut().for_each(|p| *p /= total);
    scores
}

impl Estimator for LogisticRegression {
    fn fit(samples: &[Sample]) -> Result<Self> {
        let mut classes: Vec<f64> = samples.iter().map(|s| s.salary).collect();
        classes.sort_by(f64::total_cmp);
        classes.dedup();
        if classes.len() < 2 {
            bail!("Logistic regression needs at least two distinct salaries");
        }

        let n = samples.len() as f64;
        let mut means = [0.0; 2];
        let mut scales = [0.0; 2];
        for feature in 0..2 {
            let mean = samples.iter().map(|s| s.features()[feature]).sum::<f64>() / n;
            let variance = samples
                .iter()
                .map(|s| (s.features()[feature] - mean).powi(2))
                .sum::<f64>()
                / n;
            means[feature] = mean;
            scales[feature] = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        }

        let mut model = Self {
            weights: vec![[0.0; 3]; classes.len()],
            classes,
            means,
            scales,
        };
        let rows: Vec<([f64; 2], usize)> = samples
            .iter()
            .map(|s| {
                let class = model
                    .classes
                    .binary_search_by(|c| c.total_cmp(&s.salary))
                    .unwrap_or_default();
                (model.standardize(s.features()), class)
            })
            .collect();

        // Batch gradient descent on mean cross entropy plus L2 on the feature weights
        for _ in 0..ITERATIONS {
            let mut gradient = vec![[0.0; 3]; model.classes.len()];
            for (x, class) in &rows {
                let probabilities = softmax(scores(&model.weights, *x));
                for (k, p) in probabilities.iter().enumerate() {
                    let delta = p - if k == *class { 1.0 } else { 0.0 };
                    gradient[k][0] += delta;
                    gradient[k][1] += delta * x[0];
                    gradient[k][2] += delta * x[1];
                }
            }
            for (w, g) in model.weights.iter_mut().zip(&gradient) {
                w[0] -= LEARNING_RATE * g[0] / n;
                w[1] -= LEARNING_RATE * (g[1] + w[1] / C) / n;
                w[2] -= LEARNING_RATE * (g[2] + w[2] / C) / n;
            }
        }

        Ok(model)
    }

    fn predict(&self, features: [f64; 2]) -> f64 {
        let scores = scores(&self.weights, self.standardize(features));
        let best = scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or(0, |(index, _)| index);
        self.classes[best]
    }
}
