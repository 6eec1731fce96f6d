use std::collections::BTreeSet;
use std::fmt;

use pest::iterators::Pair;

use crate::{PlotError, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
  Pi,
  E,
  I,
}

impl Constant {
  fn from_name(name: &str) -> Option<Self> {
    match name {
      "pi" | "Pi" => Some(Self::Pi),
      "E" => Some(Self::E),
      "I" => Some(Self::I),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
  Plus,
  Minus,
  Times,
  Divide,
  Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
  Minus,
}

/// Symbolic expression tree produced by [`crate::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Integer(i64),
  Real(f64),
  Constant(Constant),
  Identifier(String),
  UnaryOp {
    op: UnaryOperator,
    operand: Box<Expr>,
  },
  BinaryOp {
    op: BinaryOperator,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  FunctionCall {
    name: String,
    args: Vec<Expr>,
  },
}

impl Expr {
  pub fn symbol(name: &str) -> Self {
    Expr::Identifier(name.to_string())
  }

  pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
    Expr::BinaryOp {
      op,
      left: Box::new(left),
      right: Box::new(right),
    }
  }

  pub fn call(name: &str, args: Vec<Expr>) -> Self {
    Expr::FunctionCall {
      name: name.to_string(),
      args,
    }
  }

  /// Names of all symbols the expression depends on, sorted lexically.
  pub fn free_symbols(&self) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();
    collect_symbols(self, &mut symbols);
    symbols
  }

  fn precedence(&self) -> u8 {
    match self {
      Expr::BinaryOp { op, .. } => match op {
        BinaryOperator::Plus | BinaryOperator::Minus => 1,
        BinaryOperator::Times | BinaryOperator::Divide => 2,
        BinaryOperator::Power => 4,
      },
      Expr::UnaryOp { .. } => 3,
      Expr::Integer(n) if *n < 0 => 3,
      Expr::Real(x) if *x < 0.0 => 3,
      _ => 5,
    }
  }
}

fn collect_symbols(expr: &Expr, out: &mut BTreeSet<String>) {
  match expr {
    Expr::Identifier(name) => {
      out.insert(name.clone());
    }
    Expr::UnaryOp { operand, .. } => collect_symbols(operand, out),
    Expr::BinaryOp { left, right, .. } => {
      collect_symbols(left, out);
      collect_symbols(right, out);
    }
    Expr::FunctionCall { args, .. } => {
      for arg in args {
        collect_symbols(arg, out);
      }
    }
    Expr::Integer(_) | Expr::Real(_) | Expr::Constant(_) => {}
  }
}

fn syntax_error(message: &str) -> PlotError {
  PlotError::CompilationError(format!("malformed syntax tree: {message}"))
}

/// Convert a pest pair of the math grammar into an [`Expr`].
pub fn pair_to_expr(pair: Pair<Rule>) -> Result<Expr, PlotError> {
  match pair.as_rule() {
    Rule::Program => {
      let inner = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::Expression)
        .ok_or_else(|| syntax_error("program without expression"))?;
      pair_to_expr(inner)
    }
    Rule::Expression | Rule::Product => {
      let mut inner = pair.into_inner();
      let first = inner
        .next()
        .ok_or_else(|| syntax_error("empty operand list"))?;
      let mut acc = pair_to_expr(first)?;
      while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
          "+" => BinaryOperator::Plus,
          "-" => BinaryOperator::Minus,
          "*" => BinaryOperator::Times,
          "/" => BinaryOperator::Divide,
          other => return Err(syntax_error(&format!("operator {other}"))),
        };
        let rhs = inner
          .next()
          .ok_or_else(|| syntax_error("operator without operand"))?;
        acc = Expr::binary(op, acc, pair_to_expr(rhs)?);
      }
      Ok(acc)
    }
    Rule::Factor => {
      let mut negations = 0;
      let mut operand = None;
      for item in pair.into_inner() {
        match item.as_rule() {
          Rule::Negation => negations += 1,
          _ => operand = Some(pair_to_expr(item)?),
        }
      }
      let operand = operand.ok_or_else(|| syntax_error("factor"))?;
      if negations % 2 == 1 {
        Ok(negate(operand))
      } else {
        Ok(operand)
      }
    }
    Rule::Power => {
      let mut inner = pair.into_inner();
      let base = inner.next().ok_or_else(|| syntax_error("power base"))?;
      let base = pair_to_expr(base)?;
      match inner.next() {
        Some(exponent) => Ok(Expr::binary(
          BinaryOperator::Power,
          base,
          pair_to_expr(exponent)?,
        )),
        None => Ok(base),
      }
    }
    Rule::FunctionCall => {
      let mut inner = pair.into_inner();
      let name = inner
        .next()
        .ok_or_else(|| syntax_error("function name"))?
        .as_str()
        .to_string();
      let args = inner.map(pair_to_expr).collect::<Result<Vec<_>, _>>()?;
      Ok(Expr::FunctionCall { name, args })
    }
    Rule::Identifier => {
      let name = pair.as_str();
      Ok(match Constant::from_name(name) {
        Some(c) => Expr::Constant(c),
        None => Expr::Identifier(name.to_string()),
      })
    }
    Rule::Number => {
      let text = pair.as_str();
      if let Ok(n) = text.parse::<i64>() {
        return Ok(Expr::Integer(n));
      }
      text
        .parse::<f64>()
        .map(Expr::Real)
        .map_err(|e| syntax_error(&format!("number {text}: {e}")))
    }
    other => Err(syntax_error(&format!("unexpected rule {other:?}"))),
  }
}

fn negate(operand: Expr) -> Expr {
  match operand {
    Expr::Integer(n) => Expr::Integer(-n),
    Expr::Real(x) => Expr::Real(-x),
    other => Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand: Box::new(other),
    },
  }
}

// ── Plain text form ──────────────────────────────────────────────────────

fn format_real(x: f64) -> String {
  if x.is_finite() && x == x.trunc() && x.abs() < 1e15 {
    format!("{x:.1}")
  } else {
    format!("{x}")
  }
}

fn wrap(expr: &Expr, parens: bool) -> String {
  if parens {
    format!("({expr})")
  } else {
    expr.to_string()
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Integer(n) => write!(f, "{n}"),
      Expr::Real(x) => write!(f, "{}", format_real(*x)),
      Expr::Constant(Constant::Pi) => write!(f, "pi"),
      Expr::Constant(Constant::E) => write!(f, "E"),
      Expr::Constant(Constant::I) => write!(f, "I"),
      Expr::Identifier(name) => write!(f, "{name}"),
      Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand,
      } => write!(f, "-{}", wrap(operand, operand.precedence() < 3)),
      Expr::BinaryOp { op, left, right } => {
        let p = self.precedence();
        match op {
          BinaryOperator::Plus => write!(f, "{left} + {}", wrap(right, false)),
          BinaryOperator::Minus => {
            write!(f, "{left} - {}", wrap(right, right.precedence() <= p))
          }
          BinaryOperator::Times => write!(
            f,
            "{}*{}",
            wrap(left, left.precedence() < p),
            wrap(right, right.precedence() < p)
          ),
          BinaryOperator::Divide => write!(
            f,
            "{}/{}",
            wrap(left, left.precedence() < p),
            wrap(right, right.precedence() <= p)
          ),
          BinaryOperator::Power => write!(
            f,
            "{}**{}",
            wrap(left, left.precedence() <= p),
            wrap(right, right.precedence() < p)
          ),
        }
      }
      Expr::FunctionCall { name, args } => {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        write!(f, "{name}({})", args.join(", "))
      }
    }
  }
}

// ── LaTeX form ───────────────────────────────────────────────────────────

const GREEK: [&str; 24] = [
  "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta",
  "iota", "kappa", "lambda", "mu", "nu", "xi", "omicron", "rho", "sigma",
  "tau", "upsilon", "phi", "chi", "psi", "omega", "Gamma",
];

fn latex_symbol(name: &str) -> String {
  if GREEK.contains(&name) {
    format!("\\{name}")
  } else {
    name.to_string()
  }
}

fn latex_wrap(expr: &Expr, parens: bool) -> String {
  if parens {
    format!("\\left({}\\right)", expr_to_latex(expr))
  } else {
    expr_to_latex(expr)
  }
}

/// Render an expression as LaTeX, e.g. `\cos{\left(x \right)}`.
pub fn expr_to_latex(expr: &Expr) -> String {
  match expr {
    Expr::Integer(n) => n.to_string(),
    Expr::Real(x) => format_real(*x),
    Expr::Constant(Constant::Pi) => "\\pi".to_string(),
    Expr::Constant(Constant::E) => "e".to_string(),
    Expr::Constant(Constant::I) => "i".to_string(),
    Expr::Identifier(name) => latex_symbol(name),
    Expr::UnaryOp { operand, .. } => {
      format!("- {}", latex_wrap(operand, operand.precedence() < 3))
    }
    Expr::BinaryOp { op, left, right } => {
      let p = expr.precedence();
      match op {
        BinaryOperator::Plus => {
          format!("{} + {}", expr_to_latex(left), expr_to_latex(right))
        }
        BinaryOperator::Minus => format!(
          "{} - {}",
          expr_to_latex(left),
          latex_wrap(right, right.precedence() <= p)
        ),
        BinaryOperator::Times => format!(
          "{} {}",
          latex_wrap(left, left.precedence() < p),
          latex_wrap(right, right.precedence() < p)
        ),
        BinaryOperator::Divide => format!(
          "\\frac{{{}}}{{{}}}",
          expr_to_latex(left),
          expr_to_latex(right)
        ),
        BinaryOperator::Power => format!(
          "{}^{{{}}}",
          latex_wrap(left, left.precedence() <= p),
          expr_to_latex(right)
        ),
      }
    }
    Expr::FunctionCall { name, args } => {
      let inner: Vec<String> = args.iter().map(expr_to_latex).collect();
      let inner = inner.join(", ");
      match name.as_str() {
        "sqrt" if args.len() == 1 => format!("\\sqrt{{{inner}}}"),
        "abs" if args.len() == 1 => format!("\\left|{{{inner}}}\\right|"),
        "exp" if args.len() == 1 => format!("e^{{{inner}}}"),
        "sin" | "cos" | "tan" | "sinh" | "cosh" | "tanh" | "log" | "ln"
        | "arg" => format!("\\{name}{{\\left({inner} \\right)}}"),
        "asin" | "acos" | "atan" => {
          format!("\\operatorname{{{name}}}{{\\left({inner} \\right)}}")
        }
        "re" => format!("\\operatorname{{re}}{{\\left({inner}\\right)}}"),
        "im" => format!("\\operatorname{{im}}{{\\left({inner}\\right)}}"),
        "conj" => format!("\\overline{{{inner}}}"),
        "floor" => format!("\\left\\lfloor{{{inner}}}\\right\\rfloor"),
        "ceiling" => format!("\\left\\lceil{{{inner}}}\\right\\rceil"),
        _ => format!("\\operatorname{{{name}}}{{\\left({inner} \\right)}}"),
      }
    }
  }
}
