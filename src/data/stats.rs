//! Correlation utilities for factor score and weight columns.

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Correlation coefficient used for factor-vs-factor matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    /// Pearson correlation of average ranks.
    Spearman,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 2] = [CorrelationMethod::Pearson, CorrelationMethod::Spearman];

    pub fn label(self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "Pearson",
            CorrelationMethod::Spearman => "Spearman",
        }
    }
}

/// Pearson correlation of two equal-length vectors.
///
/// Returns NaN when either vector has zero variance or when any value is
/// non-finite.
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    assert_eq!(x.len(), y.len());
    let n = x.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = x.sum() / n as f64;
    let mean_y = y.sum() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    // Rounding can push |r| a hair past 1.
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// 1-based ranks with ties assigned their average rank.
pub fn average_ranks(x: ArrayView1<f64>) -> Vec<f64> {
    let n = x.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && x[order[j]] == x[order[i]] {
            j += 1;
        }
        // positions i..j share rank (i+1 + j) / 2
        let rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }
    ranks
}

/// Pairwise correlation between the columns of `data` (observations × variables).
///
/// The result is symmetric with an exact unit diagonal; only the upper
/// triangle is computed and mirrored.
pub fn column_correlation(data: ArrayView2<f64>, method: CorrelationMethod) -> Array2<f64> {
    let k = data.ncols();

    let transformed: Array2<f64> = match method {
        CorrelationMethod::Pearson => data.to_owned(),
        CorrelationMethod::Spearman => {
            let mut ranked = Array2::zeros(data.raw_dim());
            for (j, col) in data.columns().into_iter().enumerate() {
                for (i, r) in average_ranks(col).into_iter().enumerate() {
                    ranked[[i, j]] = r;
                }
            }
            ranked
        }
    };

    let mut corr = Array2::from_elem((k, k), f64::NAN);
    for a in 0..k {
        corr[[a, a]] = 1.0;
        for b in (a + 1)..k {
            let r = pearson(transformed.column(a), transformed.column(b));
            corr[[a, b]] = r;
            corr[[b, a]] = r;
        }
    }
    corr
}
