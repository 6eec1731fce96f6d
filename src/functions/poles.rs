use ndarray::{ArrayView1, ArrayViewMut1};

pub const DEFAULT_EPS: f64 = 0.1;

/// Mark samples that follow a slope steeper than `1/eps` as undefined.
///
/// This is a heuristic: steep but finite regions are flagged as well when
/// `eps` is large. Returns `true` when at least one sample was changed.
pub fn filter_poles(
  x: ArrayView1<f64>,
  mut y: ArrayViewMut1<f64>,
  eps: f64,
) -> bool {
  let threshold = 1.0 / eps;
  let n = x.len().min(y.len());
  let mut flagged = Vec::new();
  for i in 1..n {
    let dx = x[i] - x[i - 1];
    let dy = y[i] - y[i - 1];
    if dx == 0.0 || !dy.is_finite() {
      continue;
    }
    if (dy / dx).abs() > threshold {
      flagged.push(i);
    }
  }
  for &i in &flagged {
    y[i] = f64::NAN;
  }
  if !flagged.is_empty() {
    tracing::debug!(
      eps,
      flagged = flagged.len(),
      "pole filter flagged samples"
    );
  }
  !flagged.is_empty()
}
