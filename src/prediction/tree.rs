use anyhow::{bail, Result};

use crate::prediction::dataset::Sample;
use crate::prediction::Estimator;

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// CART regression tree with squared error splits, grown until leaves are pure or single samples.
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    root: Node,
}

struct BestSplit {
    feature: usize,
    index: usize,
    threshold: f64,
    error: f64,
}

fn mean_salary(samples: &[Sample]) -> f64 {
    samples.iter().map(|s| s.salary).sum::<f64>() / samples.len() as f64
}

fn sort_by_feature(samples: &mut [Sample], feature: usize) {
    samples.sort_by(|a, b| {
        let (a, b) = (a.features()[feature], b.features()[feature]);
        a.total_cmp(&b)
    });
}

fn find_split(samples: &mut [Sample]) -> Option<BestSplit> {
    let n = samples.len();
    let mut best: Option<BestSplit> = None;

    for feature in 0..2 {
        sort_by_feature(samples, feature);
        let total: f64 = samples.iter().map(|s| s.salary).sum();
        let total_sq: f64 = samples.iter().map(|s| s.salary * s.salary).sum();

        let (mut left_sum, mut left_sq) = (0.0, 0.0);
        for index in 1..n {
            let y = samples[index - 1].salary;
            left_sum += y;
            left_sq += y * y;

            let lower = samples[index - 1].features()[feature];
            let upper = samples[index].features()[feature];
            if lower >= upper {
                continue;
            }
            let (left_n, right_n) = (index as f64, (n - index) as f64);
            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let error = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().map_or(true, |b| error < b.error) {
                let mut threshold = (lower + upper) / 2.0;
                if threshold >= upper {
                    threshold = lower;
                }
                best = Some(BestSplit {
                    feature,
                    index,
                    threshold,
                    error,
                });
            }
        }
    }
    best
}

fn grow(samples: &mut [Sample]) -> Node {
    let mean = mean_salary(samples);
    let pure = samples.iter().all(|s| s.salary == samples[0].salary);
    if samples.len() < 2 || pure {
        return Node::Leaf(mean);
    }
    let Some(split) = find_split(samples) else {
        return Node::Leaf(mean);
    };

    sort_by_feature(samples, split.feature);
    let (left, right) = samples.split_at_mut(split.index);
    Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(grow(left)),
        right: Box::new(grow(right)),
    }
}

impl Estimator for DecisionTreeRegressor {
    fn fit(samples: &[Sample]) -> Result<Self> {
        if samples.is_empty() {
            bail!("Decision tree needs at least one sample");
        }
        let mut samples = samples.to_vec();
        Ok(Self {
            root: grow(&mut samples),
        })
    }

    fn predict(&self, features: [f64; 2]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}
