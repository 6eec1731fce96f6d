use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod config;
pub mod evaluator;
pub mod functions;
pub mod series;
pub mod syntax;

pub use evaluator::{Evaluator, Symbolic};
pub use functions::discretize::{Range, Scale};
pub use series::{Series, SeriesData, SeriesKind, SeriesOptions};
pub use syntax::Expr;

#[derive(Parser)]
#[grammar = "math.pest"]
pub struct MathParser;

#[derive(Error, Debug)]
pub enum PlotError {
  #[error("Parse error: {0}")]
  ParseError(#[from] Box<pest::error::Error<Rule>>),
  #[error("Empty input")]
  EmptyInput,
  /// The expression cannot be reduced to a numeric function.
  #[error("Compilation error: {0}")]
  CompilationError(String),
  /// Invalid range, arity or missing binding, raised at construction.
  #[error("Domain error: {0}")]
  DomainError(String),
  #[error("Parameter error: {0}")]
  ParameterError(String),
  #[error("Shape error: {0}")]
  ShapeError(String),
  #[error("Config error: {0}")]
  ConfigError(String),
}

impl MathParser {
  pub fn parse_math(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Program, input).map_err(Box::new)
  }
}

/// Parse a textual expression such as `u*cos(x)` into an [`Expr`].
pub fn parse(input: &str) -> Result<Expr, PlotError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(PlotError::EmptyInput);
  }

  let mut pairs = MathParser::parse_math(trimmed)?;
  let program = pairs.next().ok_or(PlotError::EmptyInput)?;
  syntax::pair_to_expr(program)
}
