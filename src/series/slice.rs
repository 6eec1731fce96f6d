use crate::evaluator::{real_part, Bindings, Evaluator, Parameters, SymbolicRef};
use crate::functions::discretize::{discretize, meshgrid, Range, Scale};
use crate::series::{Series, SeriesData, SeriesKind};
use crate::PlotError;

use ndarray::{Array2, Ix2};
use num_complex::Complex64;
use std::collections::BTreeSet;

/// Surface on which a 3D vector field is sampled.
#[derive(Debug)]
pub enum Slice {
  /// Plane through `point` with the given normal, clipped to the ranges.
  Plane { point: [f64; 3], normal: [f64; 3] },
  /// Expression of two field variables giving the third.
  Explicit(SymbolicRef),
  /// A surface or parametric surface series; its x/y/z arrays are the
  /// sample positions.
  Surface(Box<Series>),
}

pub(crate) enum SliceState {
  Plane {
    point: [f64; 3],
    normal: [f64; 3],
    /// Axis solved from the plane equation.
    solved: usize,
  },
  Explicit {
    evaluator: Evaluator,
    defines: usize,
  },
  Surface(Box<Series>),
}

impl std::fmt::Debug for SliceState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SliceState::Plane { point, normal, .. } => f
        .debug_struct("Plane")
        .field("point", point)
        .field("normal", normal)
        .finish(),
      SliceState::Explicit { evaluator, defines } => f
        .debug_struct("Explicit")
        .field("evaluator", evaluator)
        .field("defines", defines)
        .finish(),
      SliceState::Surface(s) => f.debug_tuple("Surface").field(s).finish(),
    }
  }
}

/// The two axes other than `solved`, in increasing order.
fn free_axes(solved: usize) -> (usize, usize) {
  match solved {
    0 => (1, 2),
    1 => (0, 2),
    _ => (0, 1),
  }
}

impl SliceState {
  pub(crate) fn new(
    slice: Slice,
    ranges: &[Range],
    bound: &BTreeSet<String>,
  ) -> Result<Self, PlotError> {
    match slice {
      Slice::Plane { point, normal } => {
        if normal.iter().all(|c| *c == 0.0)
          || normal.iter().chain(&point).any(|c| !c.is_finite())
        {
          return Err(PlotError::DomainError(format!(
            "invalid slice plane through {point:?} with normal {normal:?}"
          )));
        }
        let solved = (0..3)
          .max_by(|&a, &b| normal[a].abs().total_cmp(&normal[b].abs()))
          .unwrap_or(2);
        Ok(SliceState::Plane {
          point,
          normal,
          solved,
        })
      }
      Slice::Explicit(expr) => {
        let evaluator = Evaluator::compile(expr, bound)?;
        let used: Vec<usize> = evaluator
          .signature()
          .iter()
          .map(|s| {
            ranges.iter().position(|r| &r.var == s).ok_or_else(|| {
              PlotError::DomainError(format!(
                "slice symbol {s} has neither a range nor a parameter"
              ))
            })
          })
          .collect::<Result<_, _>>()?;
        let defines = (0..3).rev().find(|i| !used.contains(i)).ok_or_else(
          || {
            PlotError::DomainError(
              "a slice expression may use at most two field variables"
                .to_string(),
            )
          },
        )?;
        Ok(SliceState::Explicit { evaluator, defines })
      }
      Slice::Surface(series) => match series.kind() {
        SeriesKind::Surface | SeriesKind::ParametricSurface => {
          Ok(SliceState::Surface(series))
        }
        other => Err(PlotError::DomainError(format!(
          "a {other:?} series cannot be used as a slice"
        ))),
      },
    }
  }

  pub(crate) fn surface_mut(&mut self) -> Option<&mut Series> {
    match self {
      SliceState::Surface(s) => Some(s),
      _ => None,
    }
  }

  pub(crate) fn surface(&self) -> Option<&Series> {
    match self {
      SliceState::Surface(s) => Some(s),
      _ => None,
    }
  }

  fn grid(
    ranges: &[Range],
    counts: &[usize; 3],
    only_integers: bool,
    (a, b): (usize, usize),
  ) -> Result<(Array2<f64>, Array2<f64>), PlotError> {
    let ca =
      discretize(&ranges[a], counts[a], Scale::Linear, only_integers)?;
    let cb =
      discretize(&ranges[b], counts[b], Scale::Linear, only_integers)?;
    Ok(meshgrid(&ca, &cb))
  }

  /// Sample positions `[x, y, z]` on the slice.
  pub(crate) fn positions(
    &self,
    ranges: &[Range],
    counts: &[usize; 3],
    only_integers: bool,
    params: &Parameters,
  ) -> Result<[Array2<f64>; 3], PlotError> {
    let (solved, a, b, ga, gb, gc) = match self {
      SliceState::Plane {
        point,
        normal,
        solved,
      } => {
        let (a, b) = free_axes(*solved);
        let (ga, gb) = Self::grid(ranges, counts, only_integers, (a, b))?;
        let c = *solved;
        let gc = ndarray::Zip::from(&ga).and(&gb).map_collect(|&va, &vb| {
          point[c]
            - (normal[a] * (va - point[a]) + normal[b] * (vb - point[b]))
              / normal[c]
        });
        (c, a, b, ga, gb, gc)
      }
      SliceState::Explicit { evaluator, defines } => {
        let (a, b) = free_axes(*defines);
        let (ga, gb) = Self::grid(ranges, counts, only_integers, (a, b))?;
        let za = ga.mapv(|v| Complex64::new(v, 0.0)).into_dyn();
        let zb = gb.mapv(|v| Complex64::new(v, 0.0)).into_dyn();
        let mut vars = Bindings::new();
        vars.insert(ranges[a].var.as_str(), za.view());
        vars.insert(ranges[b].var.as_str(), zb.view());
        let values = evaluator.evaluate_named(&vars, params, ga.shape())?;
        let gc = real_part(&values)
          .into_dimensionality::<Ix2>()
          .map_err(|e| PlotError::ShapeError(e.to_string()))?;
        (*defines, a, b, ga, gb, gc)
      }
      SliceState::Surface(series) => {
        return match series.get_data()? {
          SeriesData::Surface { x, y, z }
          | SeriesData::ParametricSurface { x, y, z, .. } => Ok([x, y, z]),
          other => Err(PlotError::ShapeError(format!(
            "slice surface produced unexpected data {:?}",
            std::mem::discriminant(&other)
          ))),
        };
      }
    };
    let mut out: [Option<Array2<f64>>; 3] = [None, None, None];
    out[a] = Some(ga);
    out[b] = Some(gb);
    out[solved] = Some(gc);
    match out {
      [Some(x), Some(y), Some(z)] => Ok([x, y, z]),
      _ => Err(PlotError::ShapeError("incomplete slice grid".to_string())),
    }
  }
}
