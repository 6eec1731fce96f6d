use super::*;
use plotseries::functions::{SeedMode, Seeds};
use plotseries::series::Slice;
use std::collections::HashSet;

fn field_2d(u: &str, v: &str, n: usize) -> Series {
  Series::vector_2d(
    e(u),
    e(v),
    Range::new("x", -2.0, 2.0),
    Range::new("y", -2.0, 2.0),
    samples(n),
  )
  .unwrap()
}

fn box_ranges() -> [Range; 3] {
  [
    Range::new("x", -1.0, 1.0),
    Range::new("y", -1.0, 1.0),
    Range::new("z", -1.0, 1.0),
  ]
}

mod vector_2d {
  use super::*;

  #[test]
  fn shape_is_n2_by_n1() {
    let series = Series::vector_2d(
      e("-y"),
      e("x"),
      Range::new("x", -1.0, 1.0),
      Range::new("y", -2.0, 2.0),
      SeriesOptions {
        n1: Some(7),
        n2: Some(9),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(series.kind(), SeriesKind::Vector2D);
    match series.get_data().unwrap() {
      SeriesData::Vector2D { x, y, u, v } => {
        for a in [&x, &y, &u, &v] {
          assert_eq!(a.dim(), (9, 7));
        }
        assert_eq!(u[[0, 0]], 2.0);
        assert_eq!(v[[0, 0]], -1.0);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn constant_components_broadcast() {
    let series = field_2d("1", "0", 5);
    match series.get_data().unwrap() {
      SeriesData::Vector2D { u, v, .. } => {
        assert_eq!(u.dim(), (5, 5));
        assert!(u.iter().all(|c| *c == 1.0));
        assert!(v.iter().all(|c| *c == 0.0));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn wrong_arity() {
    let result = Series::vector(
      vec![e("x")],
      vec![Range::new("x", 0.0, 1.0)],
      Default::default(),
    );
    assert!(matches!(result, Err(PlotError::DomainError(_))));

    let result = Series::vector(
      vec![e("x"), e("y"), e("1"), e("1")],
      vec![Range::new("x", 0.0, 1.0), Range::new("y", 0.0, 1.0)],
      Default::default(),
    );
    assert!(matches!(result, Err(PlotError::DomainError(_))));
  }
}

mod streamlines {
  use super::*;

  #[test]
  fn rotation_field_is_well_formed() {
    let series = field_2d("-y", "x", 25);
    let lines = series.streamlines(1.0).unwrap();
    assert!(!lines.is_empty());

    let mut claimed = HashSet::new();
    for line in &lines {
      assert!(line.len() >= 2);
      assert_eq!(line.x.len(), line.y.len());
      for (x, y) in line.x.iter().zip(&line.y) {
        assert!((-2.0 - 1e-9..=2.0 + 1e-9).contains(x));
        assert!((-2.0 - 1e-9..=2.0 + 1e-9).contains(y));
      }
      for cell in &line.cells {
        assert!(claimed.insert(*cell), "cell {cell:?} claimed twice");
      }
    }
  }

  #[test]
  fn uniform_flow_gives_horizontal_lines() {
    let series = field_2d("1", "0", 11);
    let lines = series.streamlines(0.5).unwrap();
    assert!(!lines.is_empty());
    for line in &lines {
      let y0 = line.y[0];
      assert!(line.y.iter().all(|y| (y - y0).abs() < 1e-9));
    }
  }

  #[test]
  fn only_for_2d_fields() {
    let series =
      Series::line(e("x"), Range::new("x", 0.0, 1.0), Default::default())
        .unwrap();
    assert!(matches!(
      series.streamlines(1.0),
      Err(PlotError::DomainError(_))
    ));
  }

  #[test]
  fn too_small_density() {
    let series = field_2d("1", "1", 5);
    assert!(matches!(
      series.streamlines(0.01),
      Err(PlotError::DomainError(_))
    ));
  }
}

mod vector_3d {
  use super::*;

  fn converging() -> Series {
    Series::vector_3d([e("-x"), e("-y"), e("-z")], box_ranges(), samples(4))
      .unwrap()
  }

  #[test]
  fn shape_is_n2_n1_n3() {
    let series = Series::vector_3d(
      [e("x"), e("y"), e("z")],
      box_ranges(),
      SeriesOptions {
        n1: Some(3),
        n2: Some(4),
        n3: Some(5),
        ..Default::default()
      },
    )
    .unwrap();
    match series.get_data().unwrap() {
      SeriesData::Vector3D { x, y, z, u, v, w } => {
        for a in [&x, &y, &z, &u, &v, &w] {
          assert_eq!(a.dim(), (4, 3, 5));
        }
        assert_eq!(u, x);
        assert_eq!(w, z);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn inward_seeds_lie_on_the_boundary() {
    let series = converging();
    let seeds = series.seed_points(true, &SeedMode::InwardFlow).unwrap();
    let Seeds::Coordinates(points) = seeds else {
      panic!("expected coordinates");
    };
    assert!(points.nrows() > 0);
    for p in points.rows() {
      assert!(p.iter().any(|c| close(c.abs(), 1.0)), "{p:?} is interior");
    }
  }

  #[test]
  fn explicit_seeds_are_returned_unchanged() {
    let given = vec![[0.1, 0.2, 0.3], [-0.5, 0.0, 0.9], [0.0, 0.0, 0.0]];
    let seeds = converging()
      .seed_points(true, &SeedMode::Coordinates(given.clone()))
      .unwrap();
    let Seeds::Coordinates(points) = seeds else {
      panic!("expected coordinates");
    };
    let rows: Vec<[f64; 3]> =
      points.rows().into_iter().map(|r| [r[0], r[1], r[2]]).collect();
    assert_eq!(rows, given);
  }

  #[test]
  fn random_seeds_stay_inside_the_box() {
    let mode = SeedMode::Random {
      n: 25,
      seed: Some(7),
    };
    let seeds = converging().seed_points(false, &mode).unwrap();
    let Seeds::PolyData(poly) = seeds else {
      panic!("expected a point cloud");
    };
    assert_eq!(poly.points.len(), 25);
    assert_eq!(poly.verts.len(), 50);
    for p in &poly.points {
      assert!(p.iter().all(|c| c.abs() <= 1.0 + 1e-12));
    }
  }

  #[test]
  fn seeded_random_draw_is_reproducible() {
    let mode = SeedMode::Random {
      n: 5,
      seed: Some(42),
    };
    let series = converging();
    assert_eq!(
      series.seed_points(true, &mode).unwrap(),
      series.seed_points(true, &mode).unwrap()
    );
  }
}

mod sliced {
  use super::*;

  fn sliced(slice: Slice) -> Series {
    Series::slice_vector_3d(
      [e("x"), e("y"), e("z")],
      box_ranges(),
      slice,
      SeriesOptions {
        n1: Some(3),
        n2: Some(4),
        n3: Some(5),
        ..Default::default()
      },
    )
    .unwrap()
  }

  fn positions(series: &Series) -> [Array2<f64>; 3] {
    match series.get_data().unwrap() {
      SeriesData::SliceVector3D { x, y, z, u, v, w } => {
        assert_eq!(u, x);
        assert_eq!(v, y);
        assert_eq!(w, z);
        [x, y, z]
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn horizontal_plane() {
    let series = sliced(Slice::Plane {
      point: [0.0, 0.0, 0.5],
      normal: [0.0, 0.0, 1.0],
    });
    let [x, _, z] = positions(&series);
    assert_eq!(x.dim(), (4, 3));
    assert!(z.iter().all(|c| *c == 0.5));
  }

  #[test]
  fn plane_solved_along_dominant_normal() {
    let series = sliced(Slice::Plane {
      point: [0.0, 0.0, 0.0],
      normal: [2.0, 0.0, 1.0],
    });
    let [x, y, z] = positions(&series);
    // x is solved from 2x + z = 0 over a (z, y) grid.
    assert_eq!(x.dim(), (5, 4));
    for (a, c) in x.iter().zip(z.iter()) {
      assert!(close(2.0 * a + c, 0.0));
    }
    let expected = [-1.0, -1.0 / 3.0, 1.0 / 3.0, 1.0];
    for (a, b) in y.row(0).iter().zip(expected) {
      assert!(close(*a, b));
    }
  }

  #[test]
  fn explicit_expression_defines_missing_axis() {
    let series = sliced(Slice::Explicit(e("x + y")));
    let [x, y, z] = positions(&series);
    assert_eq!(z.dim(), (4, 3));
    for ((a, b), c) in x.iter().zip(y.iter()).zip(z.iter()) {
      assert!(close(*c, a + b));
    }

    let series = sliced(Slice::Explicit(e("y*z")));
    let [x, y, z] = positions(&series);
    assert_eq!(x.dim(), (5, 4));
    for ((a, b), c) in x.iter().zip(y.iter()).zip(z.iter()) {
      assert!(close(*a, b * c));
    }
  }

  #[test]
  fn surface_series_supplies_positions() {
    let surface = Series::surface(
      e("x*y"),
      Range::new("x", -1.0, 1.0),
      Range::new("y", -1.0, 1.0),
      samples(6),
    )
    .unwrap();
    let series = sliced(Slice::Surface(Box::new(surface)));
    let [x, y, z] = positions(&series);
    assert_eq!(z.dim(), (6, 6));
    for ((a, b), c) in x.iter().zip(y.iter()).zip(z.iter()) {
      assert!(close(*c, a * b));
    }
  }

  #[test]
  fn lines_cannot_be_slices() {
    let line =
      Series::line(e("x"), Range::new("x", 0.0, 1.0), Default::default())
        .unwrap();
    let result = Series::slice_vector_3d(
      [e("x"), e("y"), e("z")],
      box_ranges(),
      Slice::Surface(Box::new(line)),
      Default::default(),
    );
    assert!(matches!(result, Err(PlotError::DomainError(_))));
  }
}
