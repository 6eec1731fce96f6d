use crate::PlotError;

use ndarray::{ArrayD, ArrayViewD, IxDyn};
use num_complex::Complex64;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

pub mod bytecode;

/// Numeric body of a compiled expression. `slots` holds the values of the
/// signature symbols followed by the parameter symbols; `stack` is scratch
/// space reused between calls.
pub trait Kernel: Send + Sync {
  fn eval(&self, slots: &[Complex64], stack: &mut Vec<Complex64>) -> Complex64;
}

/// Capabilities the engine needs from a symbolic expression.
pub trait Symbolic: fmt::Display + fmt::Debug + Send + Sync {
  fn free_symbols(&self) -> BTreeSet<String>;

  /// Build a numeric kernel whose inputs are the symbols in `slots`, in order.
  fn compile_numeric(
    &self,
    slots: &[String],
  ) -> Result<Box<dyn Kernel>, PlotError>;

  fn to_formatted_string(&self) -> String;
}

pub type SymbolicRef = Arc<dyn Symbolic>;

impl From<crate::syntax::Expr> for Arc<dyn Symbolic> {
  fn from(expr: crate::syntax::Expr) -> Self {
    Arc::new(expr)
  }
}

/// Named input arrays for [`Evaluator::evaluate_named`].
pub type Bindings<'a> = BTreeMap<&'a str, ArrayViewD<'a, Complex64>>;

/// Parameter Set of an interactive series.
pub type Parameters = BTreeMap<String, Complex64>;

/// A compiled expression together with its ordered free-variable signature.
pub struct Evaluator {
  expr: SymbolicRef,
  signature: Vec<String>,
  parameters: Vec<String>,
  kernel: Box<dyn Kernel>,
}

impl fmt::Debug for Evaluator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Evaluator")
      .field("expr", &self.expr.to_string())
      .field("signature", &self.signature)
      .field("parameters", &self.parameters)
      .finish()
  }
}

impl Evaluator {
  /// Compile `expr`. Free symbols listed in `bound` become parameters; the
  /// rest form the signature. Both lists are sorted lexically.
  pub fn compile(
    expr: SymbolicRef,
    bound: &BTreeSet<String>,
  ) -> Result<Self, PlotError> {
    let (parameters, signature): (Vec<String>, Vec<String>) = expr
      .free_symbols()
      .into_iter()
      .partition(|s| bound.contains(s));
    let slots: Vec<String> =
      signature.iter().chain(parameters.iter()).cloned().collect();
    let kernel = expr.compile_numeric(&slots)?;
    tracing::debug!(
      expr = %expr,
      signature = ?signature,
      parameters = ?parameters,
      "compiled evaluator"
    );
    Ok(Self {
      expr,
      signature,
      parameters,
      kernel,
    })
  }

  pub fn signature(&self) -> &[String] {
    &self.signature
  }

  pub fn parameters(&self) -> &[String] {
    &self.parameters
  }

  pub fn expr(&self) -> &SymbolicRef {
    &self.expr
  }

  /// Evaluate at a single point; non-finite results come back as NaN.
  pub fn eval_point(
    &self,
    args: &[Complex64],
    params: &[Complex64],
  ) -> Result<Complex64, PlotError> {
    self.check_arity(args.len(), params.len())?;
    let mut slots = Vec::with_capacity(args.len() + params.len());
    slots.extend_from_slice(args);
    slots.extend_from_slice(params);
    Ok(finite_or_nan(self.kernel.eval(&slots, &mut Vec::new())))
  }

  fn check_arity(&self, args: usize, params: usize) -> Result<(), PlotError> {
    if args != self.signature.len() {
      return Err(PlotError::DomainError(format!(
        "{} expects {} argument(s), got {args}",
        self.expr,
        self.signature.len()
      )));
    }
    if params != self.parameters.len() {
      return Err(PlotError::ParameterError(format!(
        "{} expects {} parameter value(s), got {params}",
        self.expr,
        self.parameters.len()
      )));
    }
    Ok(())
  }

  /// Evaluate over arrays, one per signature entry, broadcast together.
  pub fn evaluate(
    &self,
    args: &[ArrayViewD<Complex64>],
    params: &[Complex64],
  ) -> Result<ArrayD<Complex64>, PlotError> {
    let shapes: Vec<&[usize]> = args.iter().map(|a| a.shape()).collect();
    let shape = broadcast_shape(&shapes)?;
    self.evaluate_broadcast(args, params, &shape)
  }

  /// Like [`Evaluator::evaluate`] but the result always has `shape`, so
  /// constant expressions produce a full array.
  pub fn evaluate_broadcast(
    &self,
    args: &[ArrayViewD<Complex64>],
    params: &[Complex64],
    shape: &[usize],
  ) -> Result<ArrayD<Complex64>, PlotError> {
    self.check_arity(args.len(), params.len())?;
    let views = args
      .iter()
      .map(|a| {
        a.broadcast(IxDyn(shape)).ok_or_else(|| {
          PlotError::ShapeError(format!(
            "cannot broadcast {:?} to {:?}",
            a.shape(),
            shape
          ))
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let nargs = views.len();
    let mut slots = vec![Complex64::new(0.0, 0.0); nargs + params.len()];
    slots[nargs..].copy_from_slice(params);
    let mut stack = Vec::new();
    let mut undefined = 0usize;
    let out = ArrayD::from_shape_fn(IxDyn(shape), |idx: IxDyn| {
      for (slot, view) in slots.iter_mut().zip(&views) {
        *slot = view[&idx];
      }
      let value = self.kernel.eval(&slots, &mut stack);
      if is_finite(value) {
        value
      } else {
        undefined += 1;
        nan()
      }
    });
    if undefined > 0 {
      tracing::debug!(
        expr = %self.expr,
        undefined,
        total = out.len(),
        "evaluation produced undefined samples"
      );
    }
    Ok(out)
  }

  /// Evaluate with inputs and parameter values looked up by name.
  pub fn evaluate_named(
    &self,
    vars: &Bindings,
    params: &Parameters,
    shape: &[usize],
  ) -> Result<ArrayD<Complex64>, PlotError> {
    let args = self
      .signature
      .iter()
      .map(|name| {
        vars.get(name.as_str()).cloned().ok_or_else(|| {
          PlotError::DomainError(format!(
            "symbol {name} in {} has neither a range nor a parameter",
            self.expr
          ))
        })
      })
      .collect::<Result<Vec<_>, _>>()?;
    let values = self
      .parameters
      .iter()
      .map(|name| {
        params.get(name).copied().ok_or_else(|| {
          PlotError::ParameterError(format!("missing value for {name}"))
        })
      })
      .collect::<Result<Vec<_>, _>>()?;
    self.evaluate_broadcast(&args, &values, shape)
  }
}

pub(crate) fn nan() -> Complex64 {
  Complex64::new(f64::NAN, f64::NAN)
}

fn is_finite(z: Complex64) -> bool {
  z.re.is_finite() && z.im.is_finite()
}

fn finite_or_nan(z: Complex64) -> Complex64 {
  if is_finite(z) {
    z
  } else {
    nan()
  }
}

/// NumPy broadcasting of several shapes.
pub fn broadcast_shape(shapes: &[&[usize]]) -> Result<Vec<usize>, PlotError> {
  let ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
  let mut out = vec![1usize; ndim];
  for shape in shapes {
    let offset = ndim - shape.len();
    for (i, &n) in shape.iter().enumerate() {
      let target = &mut out[offset + i];
      if *target == 1 {
        *target = n;
      } else if n != 1 && n != *target {
        return Err(PlotError::ShapeError(format!(
          "shapes {shapes:?} cannot be broadcast together"
        )));
      }
    }
  }
  Ok(out)
}

/// Real part of `z`, or NaN when the imaginary part is not negligible
/// relative to the real part.
pub fn real_value(z: Complex64) -> f64 {
  if z.im.abs() <= 1e-8 * z.re.abs().max(1.0) {
    z.re
  } else {
    f64::NAN
  }
}

pub fn real_part(values: &ArrayD<Complex64>) -> ArrayD<f64> {
  values.mapv(real_value)
}
