use super::*;
use std::f64::consts::PI;

mod cartesian {
  use super::*;

  #[test]
  fn mesh_layout_rows_follow_second_variable() {
    let series = Series::surface(
      e("x*y"),
      Range::new("x", -1.0, 1.0),
      Range::new("y", 0.0, 2.0),
      SeriesOptions {
        n1: Some(5),
        n2: Some(3),
        ..Default::default()
      },
    )
    .unwrap();
    let (x, y, z) = grid_xyz(&series);
    assert_eq!(x.dim(), (3, 5));
    assert_eq!(y.dim(), (3, 5));
    assert_eq!(z.dim(), (3, 5));
    assert_eq!(x.row(0).to_vec(), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    assert_eq!(y.column(0).to_vec(), vec![0.0, 1.0, 2.0]);
    for ((a, b), c) in x.iter().zip(y.iter()).zip(z.iter()) {
      assert!(close(*c, a * b));
    }
  }

  #[test]
  fn constant_surface_has_full_shape() {
    let series = Series::surface(
      e("1"),
      Range::new("x", 0.0, 1.0),
      Range::new("y", 0.0, 1.0),
      samples(4),
    )
    .unwrap();
    let (_, _, z) = grid_xyz(&series);
    assert_eq!(z.dim(), (4, 4));
    assert!(z.iter().all(|v| *v == 1.0));
  }

  #[test]
  fn contour_uses_the_same_mesh() {
    let series = Series::contour(
      e("x + y"),
      Range::new("x", 0.0, 1.0),
      Range::new("y", 0.0, 2.0),
      samples(3),
    )
    .unwrap();
    assert_eq!(series.kind(), SeriesKind::Contour);
    match series.get_data().unwrap() {
      SeriesData::Contour { z, .. } => assert_eq!(z[[2, 2]], 3.0),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn polar_surface_projects_radius_and_angle() {
    let series = Series::surface(
      e("r"),
      Range::new("r", 0.0, 1.0),
      Range::new("theta", 0.0, PI),
      SeriesOptions {
        n1: Some(3),
        n2: Some(5),
        is_polar: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (x, y, z) = grid_xyz(&series);
    for ((a, b), r) in x.iter().zip(y.iter()).zip(z.iter()) {
      assert!(close(a.hypot(*b), *r));
    }
  }

  #[test]
  fn flat_adaptive_surface_keeps_initial_grid() {
    let series = Series::surface(
      e("x + y"),
      Range::new("x", -1.0, 1.0),
      Range::new("y", -1.0, 1.0),
      SeriesOptions {
        adaptive: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (_, _, z) = grid_xyz(&series);
    assert_eq!(z.dim(), (9, 9));
  }

  #[test]
  fn unbound_symbol_is_a_domain_error() {
    let result = Series::surface(
      e("x*y*w"),
      Range::new("x", 0.0, 1.0),
      Range::new("y", 0.0, 1.0),
      Default::default(),
    );
    assert!(matches!(result, Err(PlotError::DomainError(_))));
  }

  #[test]
  fn duplicate_range_variable() {
    let result = Series::surface(
      e("x"),
      Range::new("x", 0.0, 1.0),
      Range::new("x", 0.0, 2.0),
      Default::default(),
    );
    assert!(matches!(result, Err(PlotError::DomainError(_))));
  }
}

mod parametric {
  use super::*;

  #[test]
  fn sphere_points_lie_on_unit_sphere() {
    let series = Series::parametric_surface(
      e("cos(u)*sin(v)"),
      e("sin(u)*sin(v)"),
      e("cos(v)"),
      Range::new("u", 0.0, 2.0 * PI),
      Range::new("v", 0.0, PI),
      SeriesOptions {
        n1: Some(8),
        n2: Some(6),
        ..Default::default()
      },
    )
    .unwrap();
    match series.get_data().unwrap() {
      SeriesData::ParametricSurface { x, y, z, u, v } => {
        assert_eq!(x.dim(), (6, 8));
        assert_eq!(u.dim(), (6, 8));
        assert!(close(v[[5, 0]], PI));
        for ((a, b), c) in x.iter().zip(y.iter()).zip(z.iter()) {
          assert!(close((a * a + b * b + c * c).sqrt(), 1.0));
        }
      }
      other => panic!("unexpected {other:?}"),
    }
  }
}
