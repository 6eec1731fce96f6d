use ndarray::{Array1, Array2, Array3, ArrayViewD};
use serde::Serialize;

/// Numeric output of [`crate::Series::get_data`], one variant per kind.
///
/// Grids follow the `meshgrid(x, y)` layout: rows vary the second range
/// variable, columns the first. 3D fields use `(n2, n1, n3)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesData {
  Points {
    x: Array1<f64>,
    y: Array1<f64>,
  },
  Line {
    x: Array1<f64>,
    y: Array1<f64>,
    /// Whether the pole filter turned any sample undefined.
    poles_detected: bool,
  },
  AbsArgLine {
    x: Array1<f64>,
    abs: Array1<f64>,
    arg: Array1<f64>,
  },
  #[serde(rename = "parametric_2d_line")]
  Parametric2DLine {
    x: Array1<f64>,
    y: Array1<f64>,
    param: Array1<f64>,
  },
  #[serde(rename = "parametric_3d_line")]
  Parametric3DLine {
    x: Array1<f64>,
    y: Array1<f64>,
    z: Array1<f64>,
    param: Array1<f64>,
  },
  Surface {
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
  },
  Contour {
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
  },
  ParametricSurface {
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
    u: Array2<f64>,
    v: Array2<f64>,
  },
  #[serde(rename = "vector_2d")]
  Vector2D {
    x: Array2<f64>,
    y: Array2<f64>,
    u: Array2<f64>,
    v: Array2<f64>,
  },
  #[serde(rename = "vector_3d")]
  Vector3D {
    x: Array3<f64>,
    y: Array3<f64>,
    z: Array3<f64>,
    u: Array3<f64>,
    v: Array3<f64>,
    w: Array3<f64>,
  },
  #[serde(rename = "slice_vector_3d")]
  SliceVector3D {
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
    u: Array2<f64>,
    v: Array2<f64>,
    w: Array2<f64>,
  },
  ComplexSurface {
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
  },
  DomainColoring {
    x: Array2<f64>,
    y: Array2<f64>,
    abs: Array2<f64>,
    arg: Array2<f64>,
    image: Array3<u8>,
    color_scale: Option<Array2<u8>>,
  },
  Geometry {
    x: Array1<f64>,
    y: Array1<f64>,
    /// Set for closed outlines of a series with `is_filled`.
    filled: bool,
  },
}

impl SeriesData {
  /// The floating point arrays in their documented order.
  pub fn components(&self) -> Vec<ArrayViewD<'_, f64>> {
    match self {
      SeriesData::Points { x, y } | SeriesData::Geometry { x, y, .. } => {
        vec![x.view().into_dyn(), y.view().into_dyn()]
      }
      SeriesData::Line { x, y, .. } => {
        vec![x.view().into_dyn(), y.view().into_dyn()]
      }
      SeriesData::AbsArgLine { x, abs, arg } => vec![
        x.view().into_dyn(),
        abs.view().into_dyn(),
        arg.view().into_dyn(),
      ],
      SeriesData::Parametric2DLine { x, y, param } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        param.view().into_dyn(),
      ],
      SeriesData::Parametric3DLine { x, y, z, param } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        z.view().into_dyn(),
        param.view().into_dyn(),
      ],
      SeriesData::Surface { x, y, z }
      | SeriesData::Contour { x, y, z }
      | SeriesData::ComplexSurface { x, y, z } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        z.view().into_dyn(),
      ],
      SeriesData::ParametricSurface { x, y, z, u, v } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        z.view().into_dyn(),
        u.view().into_dyn(),
        v.view().into_dyn(),
      ],
      SeriesData::Vector2D { x, y, u, v } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        u.view().into_dyn(),
        v.view().into_dyn(),
      ],
      SeriesData::Vector3D { x, y, z, u, v, w } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        z.view().into_dyn(),
        u.view().into_dyn(),
        v.view().into_dyn(),
        w.view().into_dyn(),
      ],
      SeriesData::SliceVector3D { x, y, z, u, v, w } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        z.view().into_dyn(),
        u.view().into_dyn(),
        v.view().into_dyn(),
        w.view().into_dyn(),
      ],
      SeriesData::DomainColoring { x, y, abs, arg, .. } => vec![
        x.view().into_dyn(),
        y.view().into_dyn(),
        abs.view().into_dyn(),
        arg.view().into_dyn(),
      ],
    }
  }
}
