//! Text summaries of result tables.
//!
//! Sweep tables render as a grid with one row per sample size and one column
//! per estimator; the best estimator of each row is listed at the end.

use crate::table::{AggregateTable, SweepTable};

const NAME_WIDTH: usize = 18;
const CELL_WIDTH: usize = 12;

fn format_shrinkage(shrinkage: Option<f64>) -> String {
    shrinkage.map_or_else(|| "-".to_string(), |value| format!("{value:.4}"))
}

impl SweepTable {
    /// Render the table as ASCII text.
    pub fn to_ascii_table(&self) -> String {
        let estimators = self.estimators();
        let width = 6 + (CELL_WIDTH + 1) * estimators.len() + 16;
        let mut output = String::new();

        output.push_str(&format!("\nSweep: {}\n", self.title));
        output.push_str(&format!(
            "Dimension: {}   Trials per size: {}\n",
            self.dimension, self.trial_count
        ));
        output.push_str(&"=".repeat(width));
        output.push('\n');

        let mut header = format!("{:>6}", "n");
        for name in &estimators {
            header.push_str(&format!(" {name:>CELL_WIDTH$}"));
        }
        header.push_str(&format!(" {:>15}", "Best"));

        output.push_str("\nMean Squared Frobenius Error:\n");
        output.push_str(&"-".repeat(width));
        output.push('\n');
        output.push_str(&header);
        output.push('\n');
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for &n in &self.sample_sizes {
            let mut row = format!("{n:>6}");
            for name in &estimators {
                let cell = self
                    .get(name, n)
                    .map_or_else(|| "-".to_string(), |record| format!("{:.4}", record.mse));
                row.push_str(&format!(" {cell:>CELL_WIDTH$}"));
            }
            let best = self.best_at(n).map_or("-", |(name, _)| name);
            row.push_str(&format!(" {best:>15}"));
            output.push_str(&row);
            output.push('\n');
        }

        output.push_str("\nMean Shrinkage Intensity:\n");
        output.push_str(&"-".repeat(width));
        output.push('\n');
        let mut header = format!("{:>6}", "n");
        for name in &estimators {
            header.push_str(&format!(" {name:>CELL_WIDTH$}"));
        }
        output.push_str(&header);
        output.push('\n');
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for &n in &self.sample_sizes {
            let mut row = format!("{n:>6}");
            for name in &estimators {
                let cell = format_shrinkage(self.get(name, n).and_then(|record| record.shrinkage));
                row.push_str(&format!(" {cell:>CELL_WIDTH$}"));
            }
            output.push_str(&row);
            output.push('\n');
        }

        output
    }

    /// Render the table as Markdown.
    pub fn to_markdown(&self) -> String {
        let estimators = self.estimators();
        let mut output = String::new();

        output.push_str(&format!("# Covariance Shrinkage Sweep: {}\n\n", self.title));
        output.push_str(&format!(
            "**Dimension:** {}  \n**Trials per size:** {}\n\n",
            self.dimension, self.trial_count
        ));

        output.push_str("## Mean Squared Frobenius Error\n\n");
        output.push_str("| n |");
        for name in &estimators {
            output.push_str(&format!(" {name} |"));
        }
        output.push_str("\n|---|");
        output.push_str(&"---|".repeat(estimators.len()));
        output.push('\n');

        for &n in &self.sample_sizes {
            let best = self.best_at(n).map(|(name, _)| name);
            output.push_str(&format!("| {n} |"));
            for name in &estimators {
                match self.get(name, n) {
                    Some(record) if Some(*name) == best => {
                        output.push_str(&format!(" **{:.4}** |", record.mse));
                    }
                    Some(record) => output.push_str(&format!(" {:.4} |", record.mse)),
                    None => output.push_str(" - |"),
                }
            }
            output.push('\n');
        }

        output
    }
}

impl AggregateTable {
    /// Render the table as ASCII text.
    pub fn to_ascii_table(&self) -> String {
        let width = NAME_WIDTH + 2 * (CELL_WIDTH + 1);
        let mut output = String::new();

        output.push_str(&format!("\nSimulation: {}\n", self.title));
        output.push_str(&format!(
            "Dimension: {}   Sample size: {}   Trials: {}\n",
            self.dimension, self.n, self.trial_count
        ));
        output.push_str(&"=".repeat(width));
        output.push('\n');
        output.push_str(&format!(
            "{:<NAME_WIDTH$} {:>CELL_WIDTH$} {:>CELL_WIDTH$}\n",
            "Estimator", "MSE", "Shrinkage"
        ));
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for record in &self.records {
            output.push_str(&format!(
                "{:<NAME_WIDTH$} {:>CELL_WIDTH$.4} {:>CELL_WIDTH$}\n",
                record.estimator,
                record.mse,
                format_shrinkage(record.shrinkage)
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AggregateRecord, SweepRecord};

    fn sweep_table() -> SweepTable {
        let record = |estimator: &str, n, mse, shrinkage| SweepRecord {
            process: "AR(1)".to_string(),
            parameter: 0.5,
            dimension: 100,
            estimator: estimator.to_string(),
            n,
            mse,
            shrinkage,
        };
        SweepTable {
            title: "AR(1) rho=0.5".to_string(),
            dimension: 100,
            trial_count: 100,
            sample_sizes: vec![5, 120],
            records: vec![
                record("Sample", 5, 2400.0, None),
                record("Sample", 120, 85.0, None),
                record("LW", 5, 210.0, Some(0.93)),
                record("LW", 120, 60.0, Some(0.41)),
            ],
        }
    }

    #[test]
    fn test_sweep_ascii_table() {
        let ascii = sweep_table().to_ascii_table();
        assert!(ascii.contains("Sweep: AR(1) rho=0.5"));
        assert!(ascii.contains("Mean Squared Frobenius Error"));
        assert!(ascii.contains("2400.0000"));
        assert!(ascii.contains("0.9300"));

        let row = ascii
            .lines()
            .find(|line| line.trim_start().starts_with("120 "))
            .unwrap();
        assert!(row.trim_end().ends_with("LW"));
    }

    #[test]
    fn test_sweep_markdown_marks_best() {
        let markdown = sweep_table().to_markdown();
        assert!(markdown.contains("# Covariance Shrinkage Sweep: AR(1) rho=0.5"));
        assert!(markdown.contains("| n | Sample | LW |"));
        assert!(markdown.contains("| 5 | 2400.0000 | **210.0000** |"));
    }

    #[test]
    fn test_aggregate_ascii_table() {
        let table = AggregateTable {
            title: "FBM H=0.75".to_string(),
            dimension: 100,
            n: 20,
            trial_count: 50,
            records: vec![
                AggregateRecord {
                    estimator: "Sample".to_string(),
                    mse: 1234.5678,
                    shrinkage: None,
                },
                AggregateRecord {
                    estimator: "Oracle".to_string(),
                    mse: 99.0,
                    shrinkage: Some(0.99),
                },
            ],
        };

        let ascii = table.to_ascii_table();
        assert!(ascii.contains("Sample size: 20"));
        assert!(ascii.contains("1234.5678"));
        let oracle = ascii.lines().find(|line| line.starts_with("Oracle")).unwrap();
        assert!(oracle.ends_with("0.9900"));
        let sample = ascii.lines().find(|line| line.starts_with("Sample ")).unwrap();
        assert!(sample.ends_with('-'));
    }
}
