use crate::binomial::one_sided_fair;
use serde::{Deserialize, Serialize};
use taglab_core::model::{JudgmentRow, PreferredModel};

pub const DEFAULT_ALPHA: f64 = 0.05;

/// Preference counts and the one-sided exact binomial test
/// "fine-tuned is preferred more often than chance".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceReport {
    pub baseline_count: u64,
    pub finetuned_count: u64,
    pub total: u64,
    pub baseline_percent: f64,
    pub finetuned_percent: f64,
    pub p_value: f64,
    pub alpha: f64,
    pub significant: bool,
}

impl SignificanceReport {
    pub fn from_counts(baseline_count: u64, finetuned_count: u64, alpha: f64) -> Self {
        let total = baseline_count + finetuned_count;
        let percent = |n: u64| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            }
        };
        let p_value = one_sided_fair(finetuned_count, total);

        Self {
            baseline_count,
            finetuned_count,
            total,
            baseline_percent: percent(baseline_count),
            finetuned_percent: percent(finetuned_count),
            p_value,
            alpha,
            significant: p_value < alpha,
        }
    }

    pub fn from_judgments(rows: &[JudgmentRow], alpha: f64) -> Self {
        let finetuned = rows
            .iter()
            .filter(|r| r.preferred_model == PreferredModel::Finetuned)
            .count() as u64;
        let report = Self::from_counts(rows.len() as u64 - finetuned, finetuned, alpha);
        tracing::info!(
            event = "taglab.report.computed",
            total = report.total,
            finetuned = report.finetuned_count,
            p_value = report.p_value,
            significant = report.significant,
            "preference tally computed"
        );
        report
    }

    pub fn verdict(&self) -> &'static str {
        if self.total == 0 {
            "No judgments recorded yet."
        } else if self.significant {
            "The fine-tuned model is significantly better than the baseline model."
        } else {
            "The difference between models is not statistically significant."
        }
    }

    pub fn format_text(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!(
            "Baseline preferred:   {}/{} ({:.1}%)\n",
            self.baseline_count, self.total, self.baseline_percent
        ));
        s.push_str(&format!(
            "Fine-tuned preferred: {}/{} ({:.1}%)\n",
            self.finetuned_count, self.total, self.finetuned_percent
        ));
        s.push_str(&format!(
            "p-value (one-sided binomial, p0=0.5): {:.4}\n",
            self.p_value
        ));
        s.push_str(&format!("alpha: {}\n", self.alpha));
        s.push_str(self.verdict());
        s.push('\n');
        s
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, model: PreferredModel) -> JudgmentRow {
        JudgmentRow {
            brief_id: id,
            brief: format!("brief {}", id),
            baseline_tagline: "b".into(),
            finetuned_tagline: "f".into(),
            preferred_tagline: "f".into(),
            preferred_model: model,
        }
    }

    #[test]
    fn test_four_of_five_not_significant() {
        let rows: Vec<_> = [
            PreferredModel::Finetuned,
            PreferredModel::Finetuned,
            PreferredModel::Baseline,
            PreferredModel::Finetuned,
            PreferredModel::Finetuned,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, m)| row(i as i64, m))
        .collect();

        let r = SignificanceReport::from_judgments(&rows, DEFAULT_ALPHA);
        assert_eq!((r.baseline_count, r.finetuned_count, r.total), (1, 4, 5));
        assert!((r.p_value - 0.1875).abs() < 1e-12);
        assert!(!r.significant);
        assert!((r.finetuned_percent - 80.0).abs() < 1e-9);
        assert!(r.format_text().contains("4/5 (80.0%)"));
        assert!(r.format_text().contains("0.1875"));
    }

    #[test]
    fn test_empty_is_p_one() {
        let r = SignificanceReport::from_judgments(&[], DEFAULT_ALPHA);
        assert_eq!(r.p_value, 1.0);
        assert!(!r.significant);
        assert_eq!(r.baseline_percent, 0.0);
        assert_eq!(r.verdict(), "No judgments recorded yet.");
    }

    #[test]
    fn test_clear_win_is_significant() {
        let r = SignificanceReport::from_counts(1, 9, DEFAULT_ALPHA);
        // (C(10,9)+C(10,10)) / 1024
        assert!((r.p_value - 11.0 / 1024.0).abs() < 1e-12);
        assert!(r.significant);
    }

    #[test]
    fn test_json_field_names() {
        let r = SignificanceReport::from_counts(2, 3, DEFAULT_ALPHA);
        let v: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        for key in [
            "baseline_count",
            "finetuned_count",
            "total",
            "baseline_percent",
            "finetuned_percent",
            "p_value",
            "alpha",
            "significant",
        ] {
            assert!(v.get(key).is_some(), "missing {}", key);
        }
    }
}
