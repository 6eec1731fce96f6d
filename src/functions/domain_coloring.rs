use crate::PlotError;

use ndarray::{Array2, Array3, ArrayView2};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_PHASERES: u32 = 20;
const LEGEND_ROWS: usize = 256;

pub type ColorFn = Arc<
  dyn Fn(ArrayView2<Complex64>) -> (Array3<u8>, Option<Array2<u8>>)
    + Send
    + Sync,
>;

/// Domain-coloring scheme.
#[derive(Clone, Default)]
pub enum Coloring {
  /// Hue by argument.
  #[default]
  Hue,
  /// Hue with iso-modulus and iso-phase bands.
  HueModulusPhase,
  /// Hue with iso-modulus bands.
  HueModulus,
  /// Hue with iso-phase bands.
  HuePhase,
  /// Black and white stripes keyed to the modulus.
  StripesModulus,
  StripesPhase,
  StripesReal,
  StripesImaginary,
  CartesianChessboard,
  PolarChessboard,
  /// Any mapping from the complex grid to an image and optional legend.
  Custom(ColorFn),
}

impl Coloring {
  pub fn letter(&self) -> Option<char> {
    Some(match self {
      Coloring::Hue => 'a',
      Coloring::HueModulusPhase => 'b',
      Coloring::HueModulus => 'c',
      Coloring::HuePhase => 'd',
      Coloring::StripesModulus => 'e',
      Coloring::StripesPhase => 'f',
      Coloring::StripesReal => 'g',
      Coloring::StripesImaginary => 'h',
      Coloring::CartesianChessboard => 'i',
      Coloring::PolarChessboard => 'j',
      Coloring::Custom(_) => return None,
    })
  }

  fn has_legend(&self) -> bool {
    matches!(
      self,
      Coloring::Hue
        | Coloring::HueModulusPhase
        | Coloring::HueModulus
        | Coloring::HuePhase
    )
  }
}

impl fmt::Debug for Coloring {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.letter() {
      Some(c) => write!(f, "Coloring({c})"),
      None => write!(f, "Coloring(custom)"),
    }
  }
}

impl fmt::Display for Coloring {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.letter() {
      Some(c) => write!(f, "{c}"),
      None => write!(f, "custom"),
    }
  }
}

impl FromStr for Coloring {
  type Err = PlotError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s.trim().to_ascii_lowercase().as_str() {
      "a" => Coloring::Hue,
      "b" => Coloring::HueModulusPhase,
      "c" => Coloring::HueModulus,
      "d" => Coloring::HuePhase,
      "e" => Coloring::StripesModulus,
      "f" => Coloring::StripesPhase,
      "g" => Coloring::StripesReal,
      "h" => Coloring::StripesImaginary,
      "i" => Coloring::CartesianChessboard,
      "j" => Coloring::PolarChessboard,
      other => {
        return Err(PlotError::DomainError(format!(
          "unknown coloring {other:?}, expected a letter from a to j"
        )))
      }
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgb {
  r: f64,
  g: f64,
  b: f64,
}

impl Rgb {
  const BLACK: Rgb = Rgb {
    r: 0.0,
    g: 0.0,
    b: 0.0,
  };
  const WHITE: Rgb = Rgb {
    r: 1.0,
    g: 1.0,
    b: 1.0,
  };

  fn from_hue(h: f64, s: f64, b: f64) -> Self {
    let h = ((h % 1.0) + 1.0) % 1.0;
    let i = (h * 6.0).floor() as i32;
    let f = h * 6.0 - i as f64;
    let p = b * (1.0 - s);
    let q = b * (1.0 - f * s);
    let t = b * (1.0 - (1.0 - f) * s);
    let (r, g, bl) = match i % 6 {
      0 => (b, t, p),
      1 => (q, b, p),
      2 => (p, b, t),
      3 => (p, q, b),
      4 => (t, p, b),
      _ => (b, p, q),
    };
    Self { r, g, b: bl }
  }

  fn to_bytes(self) -> [u8; 3] {
    let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [byte(self.r), byte(self.g), byte(self.b)]
  }
}

fn frac(x: f64) -> f64 {
  x - x.floor()
}

fn hue(w: Complex64) -> f64 {
  frac(w.arg() / (2.0 * PI))
}

fn stripe(x: f64) -> Rgb {
  if frac(x) < 0.5 {
    Rgb::WHITE
  } else {
    Rgb::BLACK
  }
}

fn checker(a: f64, b: f64) -> Rgb {
  if (a.floor() + b.floor()).rem_euclid(2.0) == 0.0 {
    Rgb::WHITE
  } else {
    Rgb::BLACK
  }
}

fn pixel(w: Complex64, coloring: &Coloring, phaseres: f64) -> Rgb {
  if !(w.re.is_finite() && w.im.is_finite()) {
    return Rgb::BLACK;
  }
  let bands = phaseres / (2.0 * PI);
  let modulus = w.norm().ln() * bands;
  let phase = w.arg() * bands;
  let shade = |x: f64| 0.75 + 0.25 * frac(x);
  match coloring {
    Coloring::Hue => Rgb::from_hue(hue(w), 1.0, 1.0),
    Coloring::HueModulusPhase => {
      Rgb::from_hue(hue(w), 1.0, shade(modulus) * shade(phase))
    }
    Coloring::HueModulus => Rgb::from_hue(hue(w), 1.0, shade(modulus)),
    Coloring::HuePhase => Rgb::from_hue(hue(w), 1.0, shade(phase)),
    Coloring::StripesModulus => stripe(modulus),
    Coloring::StripesPhase => stripe(phase),
    Coloring::StripesReal => stripe(w.re),
    Coloring::StripesImaginary => stripe(w.im),
    Coloring::CartesianChessboard => checker(w.re, w.im),
    Coloring::PolarChessboard => checker(modulus, phase),
    Coloring::Custom(_) => Rgb::BLACK,
  }
}

/// Hue ramp over `arg` from -pi to pi, one RGB row per step.
fn hue_legend() -> Array2<u8> {
  Array2::from_shape_fn((LEGEND_ROWS, 3), |(i, c)| {
    let arg = -PI + 2.0 * PI * i as f64 / (LEGEND_ROWS - 1) as f64;
    Rgb::from_hue(frac(arg / (2.0 * PI)), 1.0, 1.0).to_bytes()[c]
  })
}

/// Map a complex grid of shape `(n, m)` to an `(n, m, 3)` RGB image and an
/// optional `(N, 3)` legend.
pub fn colorize(
  w: ArrayView2<Complex64>,
  coloring: &Coloring,
  phaseres: u32,
) -> Result<(Array3<u8>, Option<Array2<u8>>), PlotError> {
  let (n, m) = w.dim();
  if let Coloring::Custom(f) = coloring {
    let (image, scale) = f(w);
    if image.dim() != (n, m, 3) {
      return Err(PlotError::ShapeError(format!(
        "custom coloring returned an image of shape {:?}, expected \
         [{n}, {m}, 3]",
        image.shape()
      )));
    }
    if let Some(s) = &scale {
      if s.ncols() != 3 {
        return Err(PlotError::ShapeError(format!(
          "custom color scale must have 3 columns, got {}",
          s.ncols()
        )));
      }
    }
    return Ok((image, scale));
  }

  let res = f64::from(phaseres.max(1));
  let mut image = Array3::<u8>::zeros((n, m, 3));
  for ((i, j), z) in w.indexed_iter() {
    let rgb = pixel(*z, coloring, res).to_bytes();
    for (c, value) in rgb.into_iter().enumerate() {
      image[[i, j, c]] = value;
    }
  }
  let legend = coloring.has_legend().then(hue_legend);
  tracing::debug!(%coloring, rows = n, cols = m, "domain coloring computed");
  Ok((image, legend))
}
