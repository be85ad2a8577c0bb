use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const AGE_COLUMN: &str = "Age";
const WEIGHT_COLUMN: &str = "Weight";
const SALARY_COLUMN: &str = "Salary";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub age: f64,
    pub weight: f64,
    pub salary: f64,
}

impl Sample {
    pub fn features(&self) -> [f64; 2] {
        [self.age, self.weight]
    }
}

/// Rows of the salary CSV, the only training data of the prediction models
#[derive(Debug, Clone)]
pub struct SalaryDataset {
    samples: Vec<Sample>,
}

impl SalaryDataset {
    #[tracing::instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        Self::from_csv(&text)
    }

    /// Parses a comma separated table whose header names the `Age`, `Weight` and `Salary` columns.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header: Vec<&str> = lines
            .next()
            .ok_or_else(|| anyhow!("Dataset is empty"))?
            .split(',')
            .map(str::trim)
            .collect();
        let column = |name: &str| {
            header
                .iter()
                .position(|h| *h == name)
                .ok_or_else(|| anyhow!("Dataset has no {name} column"))
        };
        let (age, weight, salary) = (
            column(AGE_COLUMN)?,
            column(WEIGHT_COLUMN)?,
            column(SALARY_COLUMN)?,
        );

        let mut samples = Vec::new();
        for (index, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let field = |column: usize| -> Result<f64> {
                let name = header[column];
                let raw = fields
                    .get(column)
                    .ok_or_else(|| anyhow!("Row {} is missing column {name}", index + 1))?;
                raw.parse()
                    .with_context(|| format!("Row {} has a non numeric {name}", index + 1))
            };
            samples.push(Sample {
                age: field(age)?,
                weight: field(weight)?,
                salary: field(salary)?,
            });
        }
        if samples.is_empty() {
            bail!("Dataset has a header but no rows");
        }

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Deterministic shuffle, then the first `ceil(len * test_ratio)` rows form the test set.
    pub fn train_test_split(&self, test_ratio: f64, seed: u64) -> (Vec<Sample>, Vec<Sample>) {
        let mut shuffled = self.samples.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
        let test_len = ((shuffled.len() as f64) * test_ratio).ceil() as usize;
        let test_len = test_len.min(shuffled.len().saturating_sub(1));
        let train = shuffled.split_off(test_len);
        (train, shuffled)
    }
}
