use crate::evaluator::SymbolicRef;
use crate::PlotError;

use ndarray::Array1;
use std::f64::consts::PI;

/// A planar entity whose coordinates and radii are expressions.
#[derive(Debug, Clone)]
pub enum Shape {
  Point([SymbolicRef; 2]),
  Segment([SymbolicRef; 2], [SymbolicRef; 2]),
  Polygon(Vec<[SymbolicRef; 2]>),
  Circle {
    center: [SymbolicRef; 2],
    radius: SymbolicRef,
  },
  Ellipse {
    center: [SymbolicRef; 2],
    hradius: SymbolicRef,
    vradius: SymbolicRef,
  },
}

/// Which entity a flat list of evaluated values describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShapeKind {
  Point,
  Segment,
  Polygon,
  Circle,
  Ellipse,
}

impl ShapeKind {
  pub(crate) fn name(self) -> &'static str {
    match self {
      ShapeKind::Point => "point",
      ShapeKind::Segment => "segment",
      ShapeKind::Polygon => "polygon",
      ShapeKind::Circle => "circle",
      ShapeKind::Ellipse => "ellipse",
    }
  }

  /// Whether the outline encloses an area that can be filled.
  pub(crate) fn is_closed(self) -> bool {
    matches!(
      self,
      ShapeKind::Polygon | ShapeKind::Circle | ShapeKind::Ellipse
    )
  }
}

impl Shape {
  /// Flatten into an entity tag and the expressions in evaluation order.
  pub(crate) fn flatten(
    self,
  ) -> Result<(ShapeKind, Vec<SymbolicRef>), PlotError> {
    Ok(match self {
      Shape::Point(p) => (ShapeKind::Point, p.to_vec()),
      Shape::Segment(a, b) => {
        (ShapeKind::Segment, a.into_iter().chain(b).collect())
      }
      Shape::Polygon(vertices) => {
        if vertices.len() < 3 {
          return Err(PlotError::DomainError(format!(
            "a polygon needs at least 3 vertices, got {}",
            vertices.len()
          )));
        }
        (ShapeKind::Polygon, vertices.into_iter().flatten().collect())
      }
      Shape::Circle { center, radius } => (
        ShapeKind::Circle,
        center.into_iter().chain(std::iter::once(radius)).collect(),
      ),
      Shape::Ellipse {
        center,
        hradius,
        vradius,
      } => (
        ShapeKind::Ellipse,
        center.into_iter().chain([hradius, vradius]).collect(),
      ),
    })
  }
}

fn ellipse(
  (cx, cy): (f64, f64),
  (hr, vr): (f64, f64),
  n: usize,
) -> (Array1<f64>, Array1<f64>) {
  let theta = Array1::linspace(0.0, 2.0 * PI, n.max(3));
  (
    theta.mapv(|t| cx + hr * t.cos()),
    theta.mapv(|t| cy + vr * t.sin()),
  )
}

/// Outline of an entity from its evaluated values. Closed outlines repeat
/// their first point at the end.
pub(crate) fn outline(
  kind: ShapeKind,
  values: &[f64],
  n: usize,
) -> (Array1<f64>, Array1<f64>) {
  let xs = || values.iter().step_by(2).copied();
  let ys = || values.iter().skip(1).step_by(2).copied();
  match kind {
    ShapeKind::Point | ShapeKind::Segment => {
      (Array1::from_iter(xs()), Array1::from_iter(ys()))
    }
    ShapeKind::Polygon => (
      Array1::from_iter(xs().chain(xs().take(1))),
      Array1::from_iter(ys().chain(ys().take(1))),
    ),
    ShapeKind::Circle => {
      ellipse((values[0], values[1]), (values[2], values[2]), n)
    }
    ShapeKind::Ellipse => {
      ellipse((values[0], values[1]), (values[2], values[3]), n)
    }
  }
}
