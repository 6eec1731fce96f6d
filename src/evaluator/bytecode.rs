use std::collections::BTreeSet;

use num_complex::Complex64;

use crate::evaluator::{Kernel, Symbolic};
use crate::syntax::{
  expr_to_latex, BinaryOperator, Constant, Expr, UnaryOperator,
};
use crate::PlotError;

/// Single-argument functions understood by the stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
  Sin,
  Cos,
  Tan,
  Asin,
  Acos,
  Atan,
  Sinh,
  Cosh,
  Tanh,
  Exp,
  Ln,
  Sqrt,
  Abs,
  Re,
  Im,
  Arg,
  Conj,
  Floor,
  Ceiling,
  Frac,
  Sign,
}

impl Function {
  fn lookup(name: &str) -> Option<Self> {
    Some(match name {
      "sin" => Self::Sin,
      "cos" => Self::Cos,
      "tan" => Self::Tan,
      "asin" => Self::Asin,
      "acos" => Self::Acos,
      "atan" => Self::Atan,
      "sinh" => Self::Sinh,
      "cosh" => Self::Cosh,
      "tanh" => Self::Tanh,
      "exp" => Self::Exp,
      "log" | "ln" => Self::Ln,
      "sqrt" => Self::Sqrt,
      "abs" => Self::Abs,
      "re" => Self::Re,
      "im" => Self::Im,
      "arg" => Self::Arg,
      "conj" => Self::Conj,
      "floor" => Self::Floor,
      "ceiling" => Self::Ceiling,
      "frac" => Self::Frac,
      "sign" => Self::Sign,
      _ => return None,
    })
  }

  fn apply(self, z: Complex64) -> Complex64 {
    let real = |x: f64| Complex64::new(x, 0.0);
    match self {
      Self::Sin => z.sin(),
      Self::Cos => z.cos(),
      Self::Tan => z.tan(),
      Self::Asin => z.asin(),
      Self::Acos => z.acos(),
      Self::Atan => z.atan(),
      Self::Sinh => z.sinh(),
      Self::Cosh => z.cosh(),
      Self::Tanh => z.tanh(),
      Self::Exp => z.exp(),
      Self::Ln => {
        if z.im == 0.0 && z.re > 0.0 {
          real(z.re.ln())
        } else {
          z.ln()
        }
      }
      Self::Sqrt => {
        if z.im == 0.0 && z.re >= 0.0 {
          real(z.re.sqrt())
        } else {
          z.sqrt()
        }
      }
      Self::Abs => real(z.norm()),
      Self::Re => real(z.re),
      Self::Im => real(z.im),
      Self::Arg => real(z.arg()),
      Self::Conj => z.conj(),
      Self::Floor => Complex64::new(z.re.floor(), z.im.floor()),
      Self::Ceiling => Complex64::new(z.re.ceil(), z.im.ceil()),
      Self::Frac => Complex64::new(z.re - z.re.floor(), z.im - z.im.floor()),
      Self::Sign => {
        let n = z.norm();
        if n == 0.0 {
          real(0.0)
        } else {
          z / n
        }
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Instruction {
  LoadConst(Complex64),
  /// Push the value bound to a slot (variables first, then parameters).
  LoadSlot(usize),
  Add,
  Sub,
  Mul,
  Div,
  Neg,
  Pow,
  Call(Function),
  Atan2,
  LogBase,
  Min,
  Max,
}

fn pow(base: Complex64, exponent: Complex64) -> Complex64 {
  if exponent.im == 0.0 {
    let e = exponent.re;
    if e.fract() == 0.0 && e.abs() <= i32::MAX as f64 {
      return base.powi(e as i32);
    }
    if base.im == 0.0 && base.re >= 0.0 {
      return Complex64::new(base.re.powf(e), 0.0);
    }
  }
  if base.re == 0.0 && base.im == 0.0 {
    return if exponent.re > 0.0 {
      Complex64::new(0.0, 0.0)
    } else {
      Complex64::new(f64::NAN, f64::NAN)
    };
  }
  base.powc(exponent)
}

fn real_or_nan(z: Complex64) -> f64 {
  if z.im == 0.0 {
    z.re
  } else {
    f64::NAN
  }
}

/// Flat postfix program evaluated over complex values.
#[derive(Debug, Clone)]
pub(crate) struct Program {
  instructions: Vec<Instruction>,
  max_stack: usize,
}

impl Program {
  #[cfg(test)]
  pub(crate) fn instructions(&self) -> &[Instruction] {
    &self.instructions
  }
}

impl Kernel for Program {
  fn eval(&self, slots: &[Complex64], stack: &mut Vec<Complex64>) -> Complex64 {
    stack.clear();
    stack.reserve(self.max_stack);
    let nan = Complex64::new(f64::NAN, f64::NAN);
    for instr in &self.instructions {
      match instr {
        Instruction::LoadConst(c) => stack.push(*c),
        Instruction::LoadSlot(i) => stack.push(slots[*i]),
        Instruction::Neg => {
          if let Some(top) = stack.last_mut() {
            *top = -*top;
          }
        }
        Instruction::Call(f) => {
          if let Some(top) = stack.last_mut() {
            *top = f.apply(*top);
          }
        }
        binary => {
          let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
            return nan;
          };
          let value = match binary {
            Instruction::Add => a + b,
            Instruction::Sub => a - b,
            Instruction::Mul => a * b,
            Instruction::Div => a / b,
            Instruction::Pow => pow(a, b),
            Instruction::Atan2 => Complex64::new(
              real_or_nan(a).atan2(real_or_nan(b)),
              0.0,
            ),
            Instruction::LogBase => a.ln() / b.ln(),
            Instruction::Min => {
              Complex64::new(real_or_nan(a).min(real_or_nan(b)), 0.0)
            }
            Instruction::Max => {
              Complex64::new(real_or_nan(a).max(real_or_nan(b)), 0.0)
            }
            _ => nan,
          };
          stack.push(value);
        }
      }
    }
    stack.pop().unwrap_or(nan)
  }
}

/// Lowers an [`Expr`] to a [`Program`], resolving symbols against `slots`.
pub(crate) struct Compiler<'a> {
  slots: &'a [String],
  instructions: Vec<Instruction>,
  depth: usize,
  max_depth: usize,
}

impl<'a> Compiler<'a> {
  pub(crate) fn new(slots: &'a [String]) -> Self {
    Self {
      slots,
      instructions: Vec::new(),
      depth: 0,
      max_depth: 0,
    }
  }

  fn emit(&mut self, instr: Instruction) {
    match &instr {
      Instruction::LoadConst(_) | Instruction::LoadSlot(_) => {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
      }
      Instruction::Neg | Instruction::Call(_) => {}
      _ => self.depth -= 1,
    }
    self.instructions.push(instr);
  }

  fn arity(
    name: &str,
    args: &[Expr],
    expected: usize,
  ) -> Result<(), PlotError> {
    if args.len() != expected {
      return Err(PlotError::CompilationError(format!(
        "{name} expects {expected} argument(s), got {}",
        args.len()
      )));
    }
    Ok(())
  }

  pub(crate) fn compile_expr(&mut self, expr: &Expr) -> Result<(), PlotError> {
    match expr {
      Expr::Integer(n) => {
        self.emit(Instruction::LoadConst(Complex64::new(*n as f64, 0.0)))
      }
      Expr::Real(x) => {
        self.emit(Instruction::LoadConst(Complex64::new(*x, 0.0)))
      }
      Expr::Constant(c) => {
        let value = match c {
          Constant::Pi => Complex64::new(std::f64::consts::PI, 0.0),
          Constant::E => Complex64::new(std::f64::consts::E, 0.0),
          Constant::I => Complex64::new(0.0, 1.0),
        };
        self.emit(Instruction::LoadConst(value));
      }
      Expr::Identifier(name) => {
        let index = self.slots.iter().position(|s| s == name).ok_or_else(
          || {
            PlotError::CompilationError(format!(
              "symbol {name} has no numeric binding"
            ))
          },
        )?;
        self.emit(Instruction::LoadSlot(index));
      }
      Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand,
      } => {
        self.compile_expr(operand)?;
        self.emit(Instruction::Neg);
      }
      Expr::BinaryOp { op, left, right } => {
        self.compile_expr(left)?;
        self.compile_expr(right)?;
        self.emit(match op {
          BinaryOperator::Plus => Instruction::Add,
          BinaryOperator::Minus => Instruction::Sub,
          BinaryOperator::Times => Instruction::Mul,
          BinaryOperator::Divide => Instruction::Div,
          BinaryOperator::Power => Instruction::Pow,
        });
      }
      Expr::FunctionCall { name, args } => match name.as_str() {
        "atan2" => {
          Self::arity(name, args, 2)?;
          self.compile_expr(&args[0])?;
          self.compile_expr(&args[1])?;
          self.emit(Instruction::Atan2);
        }
        "log" if args.len() == 2 => {
          self.compile_expr(&args[0])?;
          self.compile_expr(&args[1])?;
          self.emit(Instruction::LogBase);
        }
        "min" | "max" => {
          if args.len() < 2 {
            return Err(PlotError::CompilationError(format!(
              "{name} expects at least 2 arguments"
            )));
          }
          let instr = if name == "min" {
            Instruction::Min
          } else {
            Instruction::Max
          };
          self.compile_expr(&args[0])?;
          for arg in &args[1..] {
            self.compile_expr(arg)?;
            self.emit(instr.clone());
          }
        }
        _ => {
          let f = Function::lookup(name).ok_or_else(|| {
            PlotError::CompilationError(format!("unknown function {name}"))
          })?;
          Self::arity(name, args, 1)?;
          self.compile_expr(&args[0])?;
          self.emit(Instruction::Call(f));
        }
      },
    }
    Ok(())
  }

  pub(crate) fn finish(self) -> Program {
    Program {
      instructions: self.instructions,
      max_stack: self.max_depth,
    }
  }
}

impl Symbolic for Expr {
  fn free_symbols(&self) -> BTreeSet<String> {
    Expr::free_symbols(self)
  }

  fn compile_numeric(
    &self,
    slots: &[String],
  ) -> Result<Box<dyn Kernel>, PlotError> {
    let mut compiler = Compiler::new(slots);
    compiler.compile_expr(self)?;
    Ok(Box::new(compiler.finish()))
  }

  fn to_formatted_string(&self) -> String {
    expr_to_latex(self)
  }
}
