use plotseries::config::Defaults;
use plotseries::functions::{SeedMode, Seeds};
use plotseries::{parse, Range, Series, SeriesData, SeriesKind, SeriesOptions};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use num_complex::Complex64;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// JSON file with engine defaults
  #[arg(long, global = true)]
  defaults: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct Common {
  /// Samples per axis
  #[arg(short, long)]
  n: Option<usize>,

  /// Parameter values as NAME=VALUE
  #[arg(short, long = "param", value_parser = parse_param)]
  params: Vec<(String, f64)>,

  /// Snap samples to the integers inside each range
  #[arg(long)]
  only_integers: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Sample y = f(x)
  Line {
    expression: String,
    /// Range as VAR:START:END
    #[arg(short, long, value_parser = parse_range)]
    range: Range,
    #[arg(long)]
    adaptive: bool,
    #[arg(long)]
    detect_poles: bool,
    #[arg(long)]
    steps: bool,
    #[command(flatten)]
    common: Common,
  },
  /// Sample a 2D or 3D parametric curve
  Parametric {
    #[arg(num_args = 2..=3, required = true)]
    expressions: Vec<String>,
    #[arg(short, long, value_parser = parse_range)]
    range: Range,
    #[arg(long)]
    adaptive: bool,
    #[command(flatten)]
    common: Common,
  },
  /// Sample z = f(x, y)
  Surface {
    expression: String,
    #[arg(short, long = "range", value_parser = parse_range, num_args = 2)]
    ranges: Vec<Range>,
    #[command(flatten)]
    common: Common,
  },
  /// Streamlines of the 2D field (u, v)
  Stream {
    u: String,
    v: String,
    #[arg(short, long = "range", value_parser = parse_range, num_args = 2)]
    ranges: Vec<Range>,
    #[arg(long)]
    density: Option<f64>,
    #[command(flatten)]
    common: Common,
  },
  /// Domain coloring of a complex function over RE_START:RE_END x
  /// IM_START:IM_END
  DomainColoring {
    expression: String,
    #[arg(long, default_value = "z")]
    var: String,
    #[arg(long, value_parser = parse_interval, allow_hyphen_values = true)]
    re: (f64, f64),
    #[arg(long, value_parser = parse_interval, allow_hyphen_values = true)]
    im: (f64, f64),
    /// Scheme letter a-j
    #[arg(long)]
    coloring: Option<String>,
    #[command(flatten)]
    common: Common,
  },
  /// Seed points of the 3D field (u, v, w)
  Seeds {
    u: String,
    v: String,
    w: String,
    #[arg(short, long = "range", value_parser = parse_range, num_args = 3)]
    ranges: Vec<Range>,
    /// Draw this many random seeds instead of inward-flow boundary points
    #[arg(long)]
    random: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[command(flatten)]
    common: Common,
  },
}

fn parse_param(s: &str) -> Result<(String, f64), String> {
  let (name, value) = s
    .split_once('=')
    .ok_or_else(|| format!("expected NAME=VALUE, got {s}"))?;
  let value = value
    .trim()
    .parse()
    .map_err(|e| format!("invalid value for {name}: {e}"))?;
  Ok((name.trim().to_string(), value))
}

fn parse_interval(s: &str) -> Result<(f64, f64), String> {
  let (a, b) = s
    .split_once(':')
    .ok_or_else(|| format!("expected START:END, got {s}"))?;
  let a = a.trim().parse().map_err(|e| format!("{a}: {e}"))?;
  let b = b.trim().parse().map_err(|e| format!("{b}: {e}"))?;
  Ok((a, b))
}

fn parse_range(s: &str) -> Result<Range, String> {
  let (var, interval) = s
    .split_once(':')
    .ok_or_else(|| format!("expected VAR:START:END, got {s}"))?;
  let (a, b) = parse_interval(interval)?;
  Ok(Range::new(var.trim(), a, b))
}

fn options(
  defaults: &Defaults,
  kind: SeriesKind,
  common: Common,
) -> Result<SeriesOptions> {
  let mut options = SeriesOptions::from_defaults(defaults, kind)?;
  if let Some(n) = common.n {
    options.n1 = Some(n);
    options.n2 = Some(n);
    options.n3 = Some(n);
  }
  options.only_integers = common.only_integers;
  options.params = common
    .params
    .into_iter()
    .map(|(k, v)| (k, Complex64::new(v, 0.0)))
    .collect();
  Ok(options)
}

fn array_json(a: &ndarray::ArrayViewD<f64>) -> Value {
  json!({
    "shape": a.shape(),
    "values": a.iter().copied().collect::<Vec<f64>>(),
  })
}

fn data_json(series: &Series, data: &SeriesData) -> Value {
  let arrays: Vec<Value> = data.components().iter().map(array_json).collect();
  let mut out = json!({
    "series": series.to_string(),
    "label": series.get_label(false),
    "arrays": arrays,
  });
  if let SeriesData::DomainColoring { image, .. } = data {
    out["image"] = json!({
      "shape": image.shape(),
      "rgb": image.iter().copied().collect::<Vec<u8>>(),
    });
  }
  if let SeriesData::Line { poles_detected, .. } = data {
    out["poles_detected"] = json!(poles_detected);
  }
  out
}

fn run(cli: Cli) -> Result<Value> {
  let defaults = match &cli.defaults {
    Some(path) => Defaults::load(path)?,
    None => Defaults::default(),
  };
  let expr = |s: &str| parse(s).with_context(|| format!("parsing {s:?}"));

  let value = match cli.command {
    Commands::Line {
      expression,
      range,
      adaptive,
      detect_poles,
      steps,
      common,
    } => {
      let mut opts = options(&defaults, SeriesKind::Line, common)?;
      opts.adaptive = adaptive;
      opts.detect_poles = detect_poles;
      opts.steps = steps;
      let series = Series::line(expr(&expression)?, range, opts)?;
      data_json(&series, &series.get_data()?)
    }
    Commands::Parametric {
      expressions,
      range,
      adaptive,
      common,
    } => {
      let exprs = expressions
        .iter()
        .map(|e| expr(e))
        .collect::<Result<Vec<_>>>()?;
      let kind = if exprs.len() == 3 {
        SeriesKind::Parametric3DLine
      } else {
        SeriesKind::Parametric2DLine
      };
      let mut opts = options(&defaults, kind, common)?;
      opts.adaptive = adaptive;
      let mut it = exprs.into_iter();
      let series = match (it.next(), it.next(), it.next()) {
        (Some(x), Some(y), Some(z)) => {
          Series::parametric_line_3d(x, y, z, range, opts)?
        }
        (Some(x), Some(y), None) => {
          Series::parametric_line_2d(x, y, range, opts)?
        }
        _ => bail!("a parametric curve needs 2 or 3 expressions"),
      };
      data_json(&series, &series.get_data()?)
    }
    Commands::Surface {
      expression,
      ranges,
      common,
    } => {
      let opts = options(&defaults, SeriesKind::Surface, common)?;
      let [rx, ry]: [Range; 2] = ranges
        .try_into()
        .map_err(|_| anyhow::anyhow!("a surface needs two ranges"))?;
      let series = Series::surface(expr(&expression)?, rx, ry, opts)?;
      data_json(&series, &series.get_data()?)
    }
    Commands::Stream {
      u,
      v,
      ranges,
      density,
      common,
    } => {
      let opts = options(&defaults, SeriesKind::Vector2D, common)?;
      let series = Series::vector(
        vec![expr(&u)?.into(), expr(&v)?.into()],
        ranges,
        opts,
      )?;
      let density = density.unwrap_or(defaults.stream_density);
      let lines = series.streamlines(density)?;
      tracing::info!(count = lines.len(), density, "integrated streamlines");
      json!({ "series": series.to_string(), "streamlines": lines })
    }
    Commands::DomainColoring {
      expression,
      var,
      re,
      im,
      coloring,
      common,
    } => {
      let mut opts = options(&defaults, SeriesKind::DomainColoring, common)?;
      if let Some(letter) = coloring {
        opts.coloring = letter.parse()?;
      }
      let range = Range::complex(
        &var,
        Complex64::new(re.0, im.0),
        Complex64::new(re.1, im.1),
      );
      let series = Series::domain_coloring(expr(&expression)?, range, opts)?;
      data_json(&series, &series.get_data()?)
    }
    Commands::Seeds {
      u,
      v,
      w,
      ranges,
      random,
      seed,
      common,
    } => {
      let opts = options(&defaults, SeriesKind::Vector3D, common)?;
      let series = Series::vector(
        vec![expr(&u)?.into(), expr(&v)?.into(), expr(&w)?.into()],
        ranges,
        opts,
      )?;
      let mode = match random {
        Some(n) => SeedMode::Random { n, seed },
        None => SeedMode::InwardFlow,
      };
      match series.seed_points(false, &mode)? {
        Seeds::PolyData(poly) => {
          json!({ "series": series.to_string(), "seeds": poly })
        }
        Seeds::Coordinates(_) => bail!("expected a point cloud"),
      }
    }
  };
  Ok(value)
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let value = run(cli)?;
  println!("{}", serde_json::to_string_pretty(&value)?);
  Ok(())
}
