use anyhow::{bail, Result};

use crate::prediction::dataset::Sample;
use crate::prediction::Estimator;

/// Ordinary least squares over both features, with intercept
#[derive(Debug, Clone)]
pub struct LinearRegression {
    intercept: f64,
    coefficients: [f64; 2],
}

impl Estimator for LinearRegression {
    fn fit(samples: &[Sample]) -> Result<Self> {
        if samples.len() < 3 {
            bail!("Linear regression needs at least three samples");
        }
        let n = samples.len() as f64;
        let mean = |f: fn(&Sample) -> f64| samples.iter().map(f).sum::<f64>() / n;
        let (mean_age, mean_weight, mean_salary) =
            (mean(|s| s.age), mean(|s| s.weight), mean(|s| s.salary));

        // Normal equations on centered data
        let (mut s_aa, mut s_ww, mut s_aw, mut s_ay, mut s_wy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for sample in samples {
            let a = sample.age - mean_age;
            let w = sample.weight - mean_weight;
            let y = sample.salary - mean_salary;
            s_aa += a * a;
            s_ww += w * w;
            s_aw += a * w;
            s_ay += a * y;
            s_wy += w * y;
        }
        let det = s_aa * s_ww - s_aw * s_aw;
        if det.abs() <= f64::EPSILON * (s_aa * s_ww).max(1.0) {
            bail!("Linear regression features are collinear");
        }
        let age_coef = (s_ay * s_ww - s_wy * s_aw) / det;
        let weight_coef = (s_wy * s_aa - s_ay * s_aw) / det;

        Ok(Self {
            intercept: mean_salary - age_coef * mean_age - weight_coef * mean_weight,
            coefficients: [age_coef, weight_coef],
        })
    }

    fn predict(&self, features: [f64; 2]) -> f64 {
        self.intercept + self.coefficients[0] * features[0] + self.coefficients[1] * features[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(age: f64, weight: f64) -> Sample {
        Sample {
            age,
            weight,
            salary: 1000.0 * age - 300.0 * weight + 5000.0,
        }
    }

    #[test]
    fn recovers_exact_plane() {
        let samples = [
            plane(20.0, 60.0),
            plane(30.0, 65.0),
            plane(40.0, 90.0),
            plane(50.0, 70.0),
            plane(25.0, 100.0),
        ];
        let model = LinearRegression::fit(&samples).unwrap();
        let expected = plane(33.0, 77.0).salary;
        assert!((model.predict([33.0, 77.0]) - expected).abs() < 1e-6);
    }

    #[test]
    fn extrapolates_below_zero() {
        let samples = [
            plane(20.0, 60.0),
            plane(30.0, 65.0),
            plane(40.0, 90.0),
            plane(50.0, 70.0),
        ];
        let model = LinearRegression::fit(&samples).unwrap();
        assert!(model.predict([0.0, 200.0]) < 0.0);
    }

    #[test]
    fn rejects_collinear_features() {
        let samples: Vec<Sample> = (1..6)
            .map(|i| Sample {
                age: i as f64,
                weight: 2.0 * i as f64,
                salary: 10.0 * i as f64,
            })
            .collect();
        assert!(LinearRegression::fit(&samples).is_err());
    }
}
