use crate::error::{RecoError, Result};
use serde::{Deserialize, Serialize};

/// Distance metric for neighbor search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
    /// Euclidean distance: `sqrt(sum((q_i - r_i)^2))`
    Euclidean,
    /// Manhattan distance: `sum(|q_i - r_i|)`
    Manhattan,
    /// Minkowski distance with power parameter `p >= 1`
    Minkowski { p: f64 },
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Minkowski { p: 2.0 }
    }
}

impl Metric {
    /// Power parameter of the equivalent Minkowski metric.
    pub fn power(&self) -> f64 {
        match self {
            Metric::Euclidean => 2.0,
            Metric::Manhattan => 1.0,
            Metric::Minkowski { p } => *p,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = self.power();
        if !p.is_finite() || p < 1.0 {
            return Err(RecoError::InvalidParameter(format!(
                "Minkowski power must be a finite value >= 1, got {}",
                p
            )));
        }
        Ok(())
    }

    /// Distance between a dense query and a sparse row.
    ///
    /// `query_norm` must be [`Metric::dense_norm`] of the same query; it is
    /// passed in so a scan over many rows computes it once.
    pub fn distance_to_sparse(&self, query: &[f64], query_norm: f64, cols: &[usize], values: &[f64]) -> f64 {
        let p = self.power();
        // Start from sum(|q|^p) and swap in the true term wherever the row is non-zero.
        let mut total = query_norm;
        for (&c, &v) in cols.iter().zip(values) {
            let q = query[c];
            total -= pow_abs(q, p);
            total += pow_abs(q - v, p);
        }
        finish(total.max(0.0), p)
    }

    /// `sum(|q_i|^p)` for the query vector.
    pub fn dense_norm(&self, query: &[f64]) -> f64 {
        let p = self.power();
        query.iter().map(|&q| pow_abs(q, p)).sum()
    }

    /// Distance between two dense vectors of equal length.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let p = self.power();
        let total: f64 = a.iter().zip(b).map(|(x, y)| pow_abs(x - y, p)).sum();
        finish(total, p)
    }
}

#[inline]
fn pow_abs(x: f64, p: f64) -> f64 {
    let a = x.abs();
    if p == 1.0 {
        a
    } else if p == 2.0 {
        a * a
    } else {
        a.powf(p)
    }
}

#[inline]
fn finish(total: f64, p: f64) -> f64 {
    if p == 1.0 {
        total
    } else if p == 2.0 {
        total.sqrt()
    } else {
        total.powf(1.0 / p)
    }
}
