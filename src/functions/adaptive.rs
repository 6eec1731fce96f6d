//! Loss-driven refinement of lines and surfaces.
//!
//! Regions live in an arena and are refined from a max-priority worklist,
//! largest loss first. A region's loss only depends on its own samples and
//! on a scale fixed from the initial samples, so a smaller goal refines a
//! superset of the regions a larger goal refines.

use crate::PlotError;

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

pub const DEFAULT_GOAL: f64 = 0.01;
pub const MAX_DEPTH: u32 = 12;
pub const MAX_LINE_POINTS: usize = 4096;
pub const MAX_AXIS_COORDS: usize = 64;
const INITIAL_INTERVALS: usize = 8;
const INITIAL_QUADS_PER_AXIS: usize = 8;

/// Samples around one region, in scaled coordinates. Each point lists the
/// parameter coordinates first (`param_dims` of them), then the outputs.
#[derive(Debug, Clone)]
pub struct Region {
  pub corners: Vec<Vec<f64>>,
  pub probe: Vec<f64>,
  pub param_dims: usize,
}

impl Region {
  fn all_points(&self) -> impl Iterator<Item = &Vec<f64>> {
    self.corners.iter().chain(std::iter::once(&self.probe))
  }

  /// Diagonal of the region in scaled parameter space.
  pub fn param_diameter(&self) -> f64 {
    let d = self.param_dims;
    let mut sq = 0.0;
    for k in 0..d {
      let (lo, hi) = self
        .corners
        .iter()
        .map(|p| p[k])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
          (lo.min(x), hi.max(x))
        });
      sq += (hi - lo) * (hi - lo);
    }
    sq.sqrt()
  }
}

pub type LossFn = Arc<dyn Fn(&Region) -> f64 + Send + Sync>;

/// Distance of the probe from the mean of the corners. Regions with both
/// undefined and defined samples report their parameter diameter, regions
/// without any defined sample report zero.
pub fn default_loss(region: &Region) -> f64 {
  let defined = |p: &Vec<f64>| p.iter().all(|v| v.is_finite());
  let total = region.corners.len() + 1;
  let good = region.all_points().filter(|p| defined(p)).count();
  if good == 0 {
    return 0.0;
  }
  if good < total {
    return region.param_diameter();
  }
  let n = region.corners.len() as f64;
  let dims = region.probe.len();
  let mut sq = 0.0;
  for k in 0..dims {
    let mean = region.corners.iter().map(|p| p[k]).sum::<f64>() / n;
    let d = region.probe[k] - mean;
    sq += d * d;
  }
  sq.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdaptiveGoal {
  /// Refine every region whose loss is at least this value.
  Loss(f64),
  /// Refine the largest-loss regions until this many samples exist.
  MinPoints(usize),
}

impl Default for AdaptiveGoal {
  fn default() -> Self {
    AdaptiveGoal::Loss(DEFAULT_GOAL)
  }
}

impl AdaptiveGoal {
  fn validate(&self) -> Result<(), PlotError> {
    match *self {
      AdaptiveGoal::Loss(g) if !(g.is_finite() && g > 0.0) => Err(
        PlotError::DomainError(format!(
          "adaptive goal must be positive, got {g}"
        )),
      ),
      _ => Ok(()),
    }
  }

  fn wants_split(&self, loss: f64, count: usize) -> bool {
    match *self {
      AdaptiveGoal::Loss(goal) => loss >= goal,
      AdaptiveGoal::MinPoints(n) => count < n,
    }
  }
}

#[derive(Debug, Clone, Copy)]
struct Work {
  loss: f64,
  index: usize,
}

impl PartialEq for Work {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Work {}

impl PartialOrd for Work {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Work {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .loss
      .total_cmp(&other.loss)
      .then_with(|| other.index.cmp(&self.index))
  }
}

/// Affine map of each output dimension onto roughly `[0, 1]`.
#[derive(Debug, Clone)]
struct OutputScale {
  offset: Vec<f64>,
  span: Vec<f64>,
}

impl OutputScale {
  fn fit<'a>(samples: impl Iterator<Item = &'a Vec<f64>>, dims: usize) -> Self {
    let mut lo = vec![f64::INFINITY; dims];
    let mut hi = vec![f64::NEG_INFINITY; dims];
    for s in samples {
      for k in 0..dims {
        if s[k].is_finite() {
          lo[k] = lo[k].min(s[k]);
          hi[k] = hi[k].max(s[k]);
        }
      }
    }
    let mut span = vec![1.0; dims];
    for k in 0..dims {
      if lo[k].is_finite() && hi[k] > lo[k] {
        span[k] = hi[k] - lo[k];
      } else if !lo[k].is_finite() {
        lo[k] = 0.0;
      }
    }
    Self { offset: lo, span }
  }

  fn apply(&self, values: &[f64], out: &mut Vec<f64>) {
    for (k, v) in values.iter().enumerate() {
      out.push((v - self.offset[k]) / self.span[k]);
    }
  }
}

/// Result of refining a line: parameter samples in increasing order and
/// the outputs evaluated at each of them.
#[derive(Debug, Clone)]
pub struct LineSamples {
  pub t: Vec<f64>,
  pub values: Vec<Vec<f64>>,
}

impl LineSamples {
  pub fn len(&self) -> usize {
    self.t.len()
  }

  pub fn is_empty(&self) -> bool {
    self.t.is_empty()
  }
}

struct Interval {
  left: usize,
  probe: usize,
  right: usize,
  depth: u32,
}

struct LineArena<F> {
  f: F,
  start: f64,
  span: f64,
  t: Vec<f64>,
  values: Vec<Vec<f64>>,
  intervals: Vec<Interval>,
}

impl<F: FnMut(f64) -> Vec<f64>> LineArena<F> {
  fn point(&mut self, t: f64) -> usize {
    let v = (self.f)(t);
    self.t.push(t);
    self.values.push(v);
    self.t.len() - 1
  }

  fn interval(&mut self, left: usize, right: usize, depth: u32) -> usize {
    let mid = 0.5 * (self.t[left] + self.t[right]);
    let probe = self.point(mid);
    self.intervals.push(Interval {
      left,
      probe,
      right,
      depth,
    });
    self.intervals.len() - 1
  }

  fn scaled(&self, i: usize, scale: &OutputScale) -> Vec<f64> {
    let mut p = Vec::with_capacity(1 + self.values[i].len());
    p.push((self.t[i] - self.start) / self.span);
    scale.apply(&self.values[i], &mut p);
    p
  }

  fn region(&self, idx: usize, scale: &OutputScale) -> Region {
    let iv = &self.intervals[idx];
    Region {
      corners: vec![self.scaled(iv.left, scale), self.scaled(iv.right, scale)],
      probe: self.scaled(iv.probe, scale),
      param_dims: 1,
    }
  }
}

/// Refine `f` over `[start, end]`. `f` returns the outputs at one parameter
/// value; undefined outputs should be NaN.
pub fn sample_line<F>(
  f: F,
  start: f64,
  end: f64,
  goal: &AdaptiveGoal,
  loss: Option<&LossFn>,
) -> Result<LineSamples, PlotError>
where
  F: FnMut(f64) -> Vec<f64>,
{
  goal.validate()?;
  if !(start.is_finite() && end.is_finite()) || start == end {
    return Err(PlotError::DomainError(format!(
      "cannot refine over ({start}, {end})"
    )));
  }
  let mut arena = LineArena {
    f,
    start,
    span: end - start,
    t: Vec::new(),
    values: Vec::new(),
    intervals: Vec::new(),
  };
  let knots: Vec<usize> = (0..=INITIAL_INTERVALS)
    .map(|i| {
      let t = start + (end - start) * i as f64 / INITIAL_INTERVALS as f64;
      arena.point(t)
    })
    .collect();
  for w in knots.windows(2) {
    arena.interval(w[0], w[1], 0);
  }
  let dims = arena.values.first().map_or(0, |v| v.len());
  let scale = OutputScale::fit(arena.values.iter(), dims);
  let loss_of = |arena: &LineArena<F>, idx: usize| {
    let region = arena.region(idx, &scale);
    match loss {
      Some(l) => l(&region),
      None => default_loss(&region),
    }
  };

  let mut heap: BinaryHeap<Work> = (0..arena.intervals.len())
    .map(|index| Work {
      loss: loss_of(&arena, index),
      index,
    })
    .collect();
  let mut splits = 0usize;
  while let Some(Work { loss: l, index }) = heap.pop() {
    // Largest loss first, so nothing left in the heap reaches the goal.
    if !goal.wants_split(l, arena.t.len()) {
      break;
    }
    let (left, probe, right, depth) = {
      let iv = &arena.intervals[index];
      (iv.left, iv.probe, iv.right, iv.depth)
    };
    if depth >= MAX_DEPTH {
      continue;
    }
    if arena.t.len() + 2 > MAX_LINE_POINTS {
      break;
    }
    for (a, b) in [(left, probe), (probe, right)] {
      let child = arena.interval(a, b, depth + 1);
      heap.push(Work {
        loss: loss_of(&arena, child),
        index: child,
      });
    }
    splits += 1;
  }

  let mut order: Vec<usize> = (0..arena.t.len()).collect();
  order.sort_by(|&a, &b| arena.t[a].total_cmp(&arena.t[b]));
  tracing::debug!(
    points = order.len(),
    splits,
    "adaptive line sampling finished"
  );
  Ok(LineSamples {
    t: order.iter().map(|&i| arena.t[i]).collect(),
    values: order.iter().map(|&i| arena.values[i].clone()).collect(),
  })
}

/// Coordinates chosen by surface refinement. The caller evaluates the
/// full rectilinear grid spanned by `u` and `v`.
#[derive(Debug, Clone)]
pub struct SurfaceSamples {
  pub u: Vec<f64>,
  pub v: Vec<f64>,
}

struct Quad {
  u: (f64, f64),
  v: (f64, f64),
  depth: u32,
}

struct SurfaceArena<F> {
  f: F,
  origin: (f64, f64),
  span: (f64, f64),
  index: HashMap<(u64, u64), usize>,
  coords: Vec<(f64, f64)>,
  values: Vec<Vec<f64>>,
  quads: Vec<Quad>,
  us: HashSet<u64>,
  vs: HashSet<u64>,
}

impl<F: FnMut(f64, f64) -> Vec<f64>> SurfaceArena<F> {
  fn point(&mut self, u: f64, v: f64) -> usize {
    let key = (u.to_bits(), v.to_bits());
    if let Some(&i) = self.index.get(&key) {
      return i;
    }
    let value = (self.f)(u, v);
    self.coords.push((u, v));
    self.values.push(value);
    let i = self.coords.len() - 1;
    self.index.insert(key, i);
    i
  }

  fn quad(&mut self, u: (f64, f64), v: (f64, f64), depth: u32) -> usize {
    for &uu in &[u.0, u.1] {
      for &vv in &[v.0, v.1] {
        self.point(uu, vv);
      }
    }
    self.point(0.5 * (u.0 + u.1), 0.5 * (v.0 + v.1));
    self.us.insert(u.0.to_bits());
    self.us.insert(u.1.to_bits());
    self.vs.insert(v.0.to_bits());
    self.vs.insert(v.1.to_bits());
    self.quads.push(Quad { u, v, depth });
    self.quads.len() - 1
  }

  fn scaled(&self, u: f64, v: f64, scale: &OutputScale) -> Vec<f64> {
    let i = self.index[&(u.to_bits(), v.to_bits())];
    let mut p = Vec::with_capacity(2 + self.values[i].len());
    p.push((u - self.origin.0) / self.span.0);
    p.push((v - self.origin.1) / self.span.1);
    scale.apply(&self.values[i], &mut p);
    p
  }

  fn region(&self, idx: usize, scale: &OutputScale) -> Region {
    let q = &self.quads[idx];
    let (u, v) = (q.u, q.v);
    Region {
      corners: vec![
        self.scaled(u.0, v.0, scale),
        self.scaled(u.1, v.0, scale),
        self.scaled(u.1, v.1, scale),
        self.scaled(u.0, v.1, scale),
      ],
      probe: self.scaled(0.5 * (u.0 + u.1), 0.5 * (v.0 + v.1), scale),
      param_dims: 2,
    }
  }

  fn grid_size(&self) -> usize {
    self.us.len() * self.vs.len()
  }
}

/// Refine `f(u, v)` over a rectangle. Refinement stops once no quad reaches
/// the goal, a quad is at maximum depth, or an axis holds
/// [`MAX_AXIS_COORDS`] coordinates.
pub fn sample_surface<F>(
  f: F,
  u_bounds: (f64, f64),
  v_bounds: (f64, f64),
  goal: &AdaptiveGoal,
  loss: Option<&LossFn>,
) -> Result<SurfaceSamples, PlotError>
where
  F: FnMut(f64, f64) -> Vec<f64>,
{
  goal.validate()?;
  for (a, b) in [u_bounds, v_bounds] {
    if !(a.is_finite() && b.is_finite()) || a == b {
      return Err(PlotError::DomainError(format!(
        "cannot refine over ({a}, {b})"
      )));
    }
  }
  let mut arena = SurfaceArena {
    f,
    origin: (u_bounds.0, v_bounds.0),
    span: (u_bounds.1 - u_bounds.0, v_bounds.1 - v_bounds.0),
    index: HashMap::new(),
    coords: Vec::new(),
    values: Vec::new(),
    quads: Vec::new(),
    us: HashSet::new(),
    vs: HashSet::new(),
  };
  let n = INITIAL_QUADS_PER_AXIS;
  let at = |(a, b): (f64, f64), i: usize| a + (b - a) * i as f64 / n as f64;
  for i in 0..n {
    for j in 0..n {
      arena.quad(
        (at(u_bounds, i), at(u_bounds, i + 1)),
        (at(v_bounds, j), at(v_bounds, j + 1)),
        0,
      );
    }
  }
  let dims = arena.values.first().map_or(0, |v| v.len());
  let scale = OutputScale::fit(arena.values.iter(), dims);
  let loss_of = |arena: &SurfaceArena<F>, idx: usize| {
    let region = arena.region(idx, &scale);
    match loss {
      Some(l) => l(&region),
      None => default_loss(&region),
    }
  };

  let mut heap: BinaryHeap<Work> = (0..arena.quads.len())
    .map(|index| Work {
      loss: loss_of(&arena, index),
      index,
    })
    .collect();
  while let Some(Work { loss: l, index }) = heap.pop() {
    if !goal.wants_split(l, arena.grid_size()) {
      break;
    }
    let (u, v, depth) = {
      let q = &arena.quads[index];
      (q.u, q.v, q.depth)
    };
    if depth >= MAX_DEPTH {
      continue;
    }
    let (um, vm) = (0.5 * (u.0 + u.1), 0.5 * (v.0 + v.1));
    let new_u = !arena.us.contains(&um.to_bits()) as usize;
    let new_v = !arena.vs.contains(&vm.to_bits()) as usize;
    if arena.us.len() + new_u > MAX_AXIS_COORDS
      || arena.vs.len() + new_v > MAX_AXIS_COORDS
    {
      continue;
    }
    for cu in [(u.0, um), (um, u.1)] {
      for cv in [(v.0, vm), (vm, v.1)] {
        let child = arena.quad(cu, cv, depth + 1);
        heap.push(Work {
          loss: loss_of(&arena, child),
          index: child,
        });
      }
    }
  }

  let sorted = |set: &HashSet<u64>| {
    let mut c: Vec<f64> = set.iter().map(|&b| f64::from_bits(b)).collect();
    c.sort_by(f64::total_cmp);
    c
  };
  let (mut u, mut v) = (sorted(&arena.us), sorted(&arena.vs));
  if u_bounds.0 > u_bounds.1 {
    u.reverse();
  }
  if v_bounds.0 > v_bounds.1 {
    v.reverse();
  }
  tracing::debug!(
    evaluations = arena.coords.len(),
    nu = u.len(),
    nv = v.len(),
    "adaptive surface sampling finished"
  );
  Ok(SurfaceSamples { u, v })
}
