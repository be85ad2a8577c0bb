use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::prediction::dataset::{SalaryDataset, Sample};
use crate::prediction::linear::LinearRegression;
use crate::prediction::logistic::LogisticRegression;
use crate::prediction::tree::DecisionTreeRegressor;

pub(crate) mod dataset;
pub(crate) mod linear;
pub(crate) mod logistic;
pub(crate) mod tree;

const TEST_RATIO: f64 = 0.2;
const SPLIT_SEED: u64 = 42;

pub trait Estimator: Sized {
    fn fit(samples: &[Sample]) -> Result<Self>;
    fn predict(&self, features: [f64; 2]) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Linear,
    DecisionTree,
    Logistic,
}

impl ModelKind {
    /// Regressors can extrapolate below zero, the classifier only returns training labels
    fn clamps_at_zero(self) -> bool {
        !matches!(self, ModelKind::Logistic)
    }
}

#[derive(Deserialize, Debug)]
pub struct PredictionRequest {
    #[serde(deserialize_with = "lenient_f64")]
    pub age: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub weight: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PredictionResponse {
    pub predicted_salary: i64,
}

/// Accepts JSON numbers as well as numeric strings such as `"42.5"`.
/// `nan` and infinities are rejected.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    let number = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(number) => number,
        NumberOrText::Text(text) => text.trim().parse().map_err(serde::de::Error::custom)?,
    };
    if !number.is_finite() {
        let message = format!("expected a finite number, got {number}");
        return Err(serde::de::Error::custom(message));
    }
    Ok(number)
}

/// Turns a raw model output into the reported salary. `as` truncates toward zero.
pub fn to_salary(raw: f64, clamp_at_zero: bool) -> Result<i64> {
    if !raw.is_finite() {
        bail!("Model produced a non finite salary ({raw})");
    }
    let value = if clamp_at_zero { raw.max(0.0) } else { raw };
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if value >= i64::MAX as f64 || value < i64::MIN as f64 {
        bail!("Model produced a salary out of range ({value})");
    }
    Ok(value as i64)
}

/// The three salary models, fitted once and shared read-only afterwards
#[derive(Debug)]
pub struct SalaryModels {
    linear: LinearRegression,
    tree: DecisionTreeRegressor,
    logistic: LogisticRegression,
}

impl SalaryModels {
    pub fn fit(train: &[Sample]) -> Result<Self> {
        Ok(Self {
            linear: LinearRegression::fit(train)
                .context("Failed to fit linear regression")?,
            tree: DecisionTreeRegressor::fit(train)
                .context("Failed to fit decision tree")?,
            logistic: LogisticRegression::fit(train)
                .context("Failed to fit logistic regression")?,
        })
    }

    /// Fits on the training part of `dataset` and logs how each model scores on the held out rows.
    #[tracing::instrument(level = "info", skip_all, fields(rows = dataset.samples().len()))]
    pub fn from_dataset(dataset: &SalaryDataset) -> Result<Self> {
        let (train, test) = dataset.train_test_split(TEST_RATIO, SPLIT_SEED);
        let models = Self::fit(&train)?;
        info!(
            train = train.len(),
            test = test.len(),
            "Fitted salary models"
        );

        if !test.is_empty() {
            for kind in [ModelKind::Linear, ModelKind::DecisionTree] {
                info!(model = ?kind, r2 = models.r2_score(kind, &test), "Held out score");
            }
            info!(
                model = ?ModelKind::Logistic,
                accuracy = models.accuracy(ModelKind::Logistic, &test),
                "Held out score"
            );
        }
        Ok(models)
    }

    pub fn raw_prediction(&self, kind: ModelKind, features: [f64; 2]) -> f64 {
        match kind {
            ModelKind::Linear => self.linear.predict(features),
            ModelKind::DecisionTree => self.tree.predict(features),
            ModelKind::Logistic => self.logistic.predict(features),
        }
    }

    pub fn predict(
        &self,
        kind: ModelKind,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse> {
        let raw = self.raw_prediction(kind, [request.age, request.weight]);
        Ok(PredictionResponse {
            predicted_salary: to_salary(raw, kind.clamps_at_zero())?,
        })
    }

    fn r2_score(&self, kind: ModelKind, samples: &[Sample]) -> f64 {
        let mean = samples.iter().map(|s| s.salary).sum::<f64>() / samples.len() as f64;
        let (mut residual, mut total) = (0.0, 0.0);
        for sample in samples {
            residual += (sample.salary - self.raw_prediction(kind, sample.features())).powi(2);
            total += (sample.salary - mean).powi(2);
        }
        if total == 0.0 {
            return f64::NAN;
        }
        1.0 - residual / total
    }

    fn accuracy(&self, kind: ModelKind, samples: &[Sample]) -> f64 {
        let hits = samples
            .iter()
            .filter(|s| self.raw_prediction(kind, s.features()) == s.salary)
            .count();
        hits as f64 / samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dataset() -> SalaryDataset {
        let mut csv = String::from("Age,Weight,Salary\n");
        for i in 0..20 {
            let age = 20 + 2 * i;
            let weight = 55 + (i * 7) % 40;
            let salary = 1500 * age - 100 * weight;
            csv.push_str(&format!("{age},{weight},{salary}\n"));
        }
        SalaryDataset::from_csv(&csv).unwrap()
    }

    #[test]
    fn truncates_and_clamps() {
        assert_eq!(to_salary(41999.9, true).unwrap(), 41999);
        assert_eq!(to_salary(-0.5, true).unwrap(), 0);
        assert_eq!(to_salary(-1234.0, true).unwrap(), 0);
        assert_eq!(to_salary(-1234.7, false).unwrap(), -1234);
    }

    #[test]
    fn unrepresentable_salaries_are_errors() {
        assert!(to_salary(f64::NAN, true).is_err());
        assert!(to_salary(f64::INFINITY, true).is_err());
        assert!(to_salary(f64::NEG_INFINITY, false).is_err());
        assert!(to_salary(1e30, true).is_err());
    }

    #[test]
    fn request_coerces_numeric_strings() {
        let request: PredictionRequest =
            serde_json::from_value(json!({"age": "31", "weight": 72.5})).unwrap();
        assert_eq!(request.age, 31.0);
        assert_eq!(request.weight, 72.5);

        let parse = |body| serde_json::from_value::<PredictionRequest>(body);
        assert!(parse(json!({"age": "old", "weight": 1})).is_err());
        assert!(parse(json!({"age": 30})).is_err());
    }

    #[test]
    fn request_rejects_non_finite_numbers() {
        let parse = |body| serde_json::from_value::<PredictionRequest>(body);
        for age in ["nan", "NaN", "inf", "-inf", "infinity", "1e400"] {
            assert!(parse(json!({"age": age, "weight": 70})).is_err(), "{age}");
        }
        assert!(parse(json!({"age": "1e3", "weight": 70})).is_ok());
    }

    #[test]
    fn regression_predictions_never_go_negative() {
        let models = SalaryModels::from_dataset(&dataset()).unwrap();
        let request = PredictionRequest {
            age: 0.0,
            weight: 500.0,
        };
        assert!(models.raw_prediction(ModelKind::Linear, [0.0, 500.0]) < 0.0);
        let linear = models.predict(ModelKind::Linear, &request).unwrap();
        assert_eq!(linear.predicted_salary, 0);
        for kind in [ModelKind::Linear, ModelKind::DecisionTree, ModelKind::Logistic] {
            let response = models.predict(kind, &request).unwrap();
            assert!(response.predicted_salary >= 0);
        }
    }

    #[test]
    fn linear_model_tracks_the_training_relation() {
        let models = SalaryModels::from_dataset(&dataset()).unwrap();
        let raw = models.raw_prediction(ModelKind::Linear, [30.0, 70.0]);
        assert!((raw - (1500.0 * 30.0 - 100.0 * 70.0)).abs() < 1e-6);
    }
}
