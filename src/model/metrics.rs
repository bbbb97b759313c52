//! Evaluation metrics on the held-out split
//!
//! Discrimination (AUC, Gini), separation (KS) and the top-decile lift
//! business metric, plus threshold metrics at 0.5. Mathematically undefined
//! cases (single-class test split, empty decile, zero base rate) return None
//! and are written out as NaN rather than crashing.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::PipelineError;

/// Flat metrics summary persisted as a key,value CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub auc: Option<f64>,
    pub gini: Option<f64>,
    pub ks: Option<f64>,
    pub lift10: Option<f64>,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub n_train: usize,
    pub n_test: usize,
}

impl MetricsSummary {
    /// Write the flat key,value listing; undefined metrics appear as NaN
    pub fn write_csv(&self, path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        writeln!(file, "metric,value")?;
        writeln!(file, "auc,{}", fmt_option(self.auc))?;
        writeln!(file, "gini,{}", fmt_option(self.gini))?;
        writeln!(file, "ks,{}", fmt_option(self.ks))?;
        writeln!(file, "lift10,{}", fmt_option(self.lift10))?;
        writeln!(file, "precision,{}", self.precision)?;
        writeln!(file, "recall,{}", self.recall)?;
        writeln!(file, "f1,{}", self.f1)?;
        writeln!(file, "n_train,{}", self.n_train)?;
        writeln!(file, "n_test,{}", self.n_test)?;
        Ok(())
    }
}

fn fmt_option(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "NaN".to_string(),
    }
}

/// Area under the ROC curve via tie-averaged ranks (Mann-Whitney form).
///
/// None when the labels are single-class.
pub fn roc_auc(labels: &[i64], scores: &[f64], positive_label: i64) -> Option<f64> {
    let n_pos = labels.iter().filter(|l| **l == positive_label).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    // Ascending score order; ties share the average rank
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*a].partial_cmp(&scores[*b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = ((i + 1 + j + 1) as f64) / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(l, _)| **l == positive_label)
        .map(|(_, r)| *r)
        .sum();

    let n_pos_f = n_pos as f64;
    let n_neg_f = n_neg as f64;
    Some((rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg_f))
}

/// Gini coefficient, 2*AUC - 1
pub fn gini(auc: Option<f64>) -> Option<f64> {
    auc.map(|a| 2.0 * a - 1.0)
}

/// Kolmogorov-Smirnov statistic: maximum gap between the cumulative
/// positive-rate and cumulative negative-rate curves over descending score
/// order. None when the labels are single-class.
pub fn ks_statistic(labels: &[i64], scores: &[f64], positive_label: i64) -> Option<f64> {
    let total_pos = labels.iter().filter(|l| **l == positive_label).count() as f64;
    let total_neg = labels.len() as f64 - total_pos;
    if total_pos == 0.0 || total_neg == 0.0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Descending by score; stable for ties
    order.sort_by(|a, b| scores[*b].partial_cmp(&scores[*a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut cum_pos = 0.0;
    let mut cum_neg = 0.0;
    let mut max_gap: f64 = 0.0;
    for idx in order {
        if labels[idx] == positive_label {
            cum_pos += 1.0;
        } else {
            cum_neg += 1.0;
        }
        max_gap = max_gap.max((cum_pos / total_pos - cum_neg / total_neg).abs());
    }
    Some(max_gap)
}

/// Lift at the top-k scored fraction: positive rate inside the top k divided
/// by the overall positive rate. None when the top slice is empty or the
/// base rate is zero.
pub fn lift_at_k(labels: &[i64], scores: &[f64], positive_label: i64, k: f64) -> Option<f64> {
    if labels.is_empty() {
        return None;
    }
    let top_n = (labels.len() as f64 * k).floor() as usize;
    let base_rate = labels.iter().filter(|l| **l == positive_label).count() as f64
        / labels.len() as f64;
    if top_n == 0 || base_rate == 0.0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*b].partial_cmp(&scores[*a]).unwrap_or(std::cmp::Ordering::Equal));

    let top_rate = order[..top_n]
        .iter()
        .filter(|idx| labels[**idx] == positive_label)
        .count() as f64
        / top_n as f64;
    Some(top_rate / base_rate)
}

/// Precision, recall and F1 at the already-applied threshold, with
/// zero-division mapped to 0
pub fn precision_recall_f1(labels: &[i64], predicted: &[i64], positive_label: i64) -> (f64, f64, f64) {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    for (label, pred) in labels.iter().zip(predicted) {
        let actual_pos = *label == positive_label;
        let predicted_pos = *pred == positive_label;
        match (actual_pos, predicted_pos) {
            (true, true) => tp += 1.0,
            (false, true) => fp += 1.0,
            (true, false) => fn_ += 1.0,
            (false, false) => {}
        }
    }
    let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
    let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (precision, recall, f1)
}
