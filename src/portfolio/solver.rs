//! # Simplex Solver
//!
//! $$
//! \mathbf{w}_{k+1}=\Pi_{\Delta}\!\left(\mathbf{y}_k-\tfrac{1}{L}\nabla f(\mathbf{y}_k)\right),\qquad
//! \Delta=\{\mathbf{w}\ge 0,\ \mathbf{1}^\top\mathbf{w}=1\}
//! $$
//!
//! Accelerated projected gradient (FISTA with adaptive restart) over the long-only,
//! fully-invested weight simplex, plus the small dense linear-algebra helpers the
//! optimizers share.

use nalgebra::DMatrix;
use nalgebra::SymmetricEigen;

use crate::config::SolverConfig;

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub(crate) fn mat_vec_mul(mat: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
  mat
    .iter()
    .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
    .collect()
}

/// `wᵀ Σ w`, floored at zero.
pub(crate) fn quad_form(w: &[f64], cov: &[Vec<f64>]) -> f64 {
  dot(w, &mat_vec_mul(cov, w)).max(0.0)
}

pub(crate) fn equal_weights(n: usize) -> Vec<f64> {
  if n == 0 {
    Vec::new()
  } else {
    vec![1.0 / n as f64; n]
  }
}

/// Largest eigenvalue of a symmetric matrix.
pub(crate) fn largest_eigenvalue(mat: &[Vec<f64>]) -> f64 {
  let n = mat.len();
  if n == 0 {
    return 0.0;
  }

  let data: Vec<f64> = mat.iter().flat_map(|row| row.iter().copied()).collect();
  let eigen = SymmetricEigen::new(DMatrix::from_row_slice(n, n, &data));
  eigen
    .eigenvalues
    .iter()
    .copied()
    .fold(f64::NEG_INFINITY, f64::max)
    .max(0.0)
}

/// Euclidean projection onto the probability simplex (sort-and-threshold).
pub(crate) fn project_onto_simplex(v: &[f64]) -> Vec<f64> {
  let n = v.len();
  if n == 0 {
    return Vec::new();
  }

  let mut sorted = v.to_vec();
  sorted.sort_by(|a, b| b.total_cmp(a));

  let mut cumulative = 0.0;
  let mut theta = 0.0;
  for (k, &u) in sorted.iter().enumerate() {
    cumulative += u;
    let candidate = (cumulative - 1.0) / (k + 1) as f64;
    if u - candidate > 0.0 {
      theta = candidate;
    }
  }

  v.iter().map(|&x| (x - theta).max(0.0)).collect()
}

/// Clip round-off below `1e-12` and renormalize to a unit sum.
pub(crate) fn tidy_weights(w: &[f64]) -> Vec<f64> {
  let clipped: Vec<f64> = w
    .iter()
    .map(|&x| if x.is_finite() && x > 1e-12 { x.min(1.0) } else { 0.0 })
    .collect();
  let total: f64 = clipped.iter().sum();
  if total < 1e-15 {
    equal_weights(w.len())
  } else {
    clipped.iter().map(|x| x / total).collect()
  }
}

/// Outcome of a projected-gradient run.
#[derive(Clone, Debug)]
pub(crate) struct SimplexSolution {
  pub weights: Vec<f64>,
  pub converged: bool,
  pub iterations: u64,
}

/// Minimize a smooth convex function over the simplex from `x0`.
///
/// `lipschitz` bounds the gradient's Lipschitz constant; iteration stops once a full
/// step moves no weight by more than `config.tolerance`.
pub(crate) fn minimize_on_simplex<G>(
  gradient: G,
  lipschitz: f64,
  x0: &[f64],
  config: &SolverConfig,
) -> SimplexSolution
where
  G: Fn(&[f64]) -> Vec<f64>,
{
  let mut x = project_onto_simplex(x0);
  if lipschitz <= 1e-15 || !lipschitz.is_finite() {
    return SimplexSolution {
      weights: x,
      converged: true,
      iterations: 0,
    };
  }

  let step = 1.0 / lipschitz;
  let mut y = x.clone();
  let mut t = 1.0_f64;

  for iter in 1..=config.max_iters {
    let g = gradient(&y);
    let shifted: Vec<f64> = y.iter().zip(g.iter()).map(|(yi, gi)| yi - step * gi).collect();
    let x_next = project_onto_simplex(&shifted);

    let delta: Vec<f64> = x_next.iter().zip(x.iter()).map(|(a, b)| a - b).collect();
    let moved = delta.iter().fold(0.0_f64, |m, d| m.max(d.abs()));

    // restart momentum when it points against the last step
    let momentum: Vec<f64> = y.iter().zip(x_next.iter()).map(|(a, b)| a - b).collect();
    let (t_next, beta) = if dot(&momentum, &delta) > 0.0 {
      (1.0, 0.0)
    } else {
      let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
      (t_next, (t - 1.0) / t_next)
    };

    y = x_next
      .iter()
      .zip(delta.iter())
      .map(|(xn, d)| xn + beta * d)
      .collect();
    x = x_next;
    t = t_next;

    if moved < config.tolerance {
      return SimplexSolution {
        weights: x,
        converged: true,
        iterations: iter,
      };
    }
  }

  SimplexSolution {
    weights: x,
    converged: false,
    iterations: config.max_iters,
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn projection_lands_on_simplex() {
    let p = project_onto_simplex(&[0.5, 0.5, 0.5]);
    for w in &p {
      assert_abs_diff_eq!(*w, 1.0 / 3.0, epsilon = 1e-12);
    }

    let p = project_onto_simplex(&[2.0, -1.0, 0.0]);
    assert_eq!(p, vec![1.0, 0.0, 0.0]);

    let p = project_onto_simplex(&[0.9, 0.4, -3.0]);
    assert_abs_diff_eq!(p[0], 0.75, epsilon = 1e-12);
    assert_abs_diff_eq!(p[1], 0.25, epsilon = 1e-12);
    assert_eq!(p[2], 0.0);
  }

  #[test]
  fn eigenvalue_of_diagonal() {
    let cov = vec![vec![0.04, 0.0], vec![0.0, 0.09]];
    assert_abs_diff_eq!(largest_eigenvalue(&cov), 0.09, epsilon = 1e-12);
    assert_eq!(largest_eigenvalue(&[]), 0.0);
  }

  #[test]
  fn minimizes_quadratic_on_simplex() {
    // min w1^2 + 4 w2^2  ->  w = (0.8, 0.2)
    let cov = vec![vec![1.0, 0.0], vec![0.0, 4.0]];
    let gradient = |w: &[f64]| -> Vec<f64> {
      mat_vec_mul(&cov, w).iter().map(|g| 2.0 * g).collect()
    };
    let solution = minimize_on_simplex(
      gradient,
      2.0 * largest_eigenvalue(&cov),
      &equal_weights(2),
      &SolverConfig::default(),
    );

    assert!(solution.converged);
    assert_abs_diff_eq!(solution.weights[0], 0.8, epsilon = 1e-7);
    assert_abs_diff_eq!(solution.weights[1], 0.2, epsilon = 1e-7);
  }

  #[test]
  fn tidy_weights_renormalizes() {
    let w = tidy_weights(&[0.5, 1e-15, 0.5000001]);
    assert_eq!(w[1], 0.0);
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-15);
    assert_eq!(tidy_weights(&[0.0, 0.0]), vec![0.5, 0.5]);
  }
}
