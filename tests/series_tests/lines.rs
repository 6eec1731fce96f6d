use super::*;
use plotseries::Scale;
use std::f64::consts::PI;

mod cartesian {
  use super::*;

  #[test]
  fn fixed_grid_cosine() {
    let series =
      Series::line(e("cos(x)"), Range::new("x", -5.0, 5.0), samples(50))
        .unwrap();
    let (x, y) = line_xy(&series);
    assert_eq!(x.len(), 50);
    assert_eq!(x[0], -5.0);
    assert!(close(x[49], 5.0));
    for (a, b) in x.iter().zip(y.iter()) {
      assert!(close(*b, a.cos()));
    }
  }

  #[test]
  fn constant_expression_fills_the_grid() {
    let series =
      Series::line(e("3"), Range::new("x", 0.0, 1.0), samples(10)).unwrap();
    let (x, y) = line_xy(&series);
    assert_eq!(x.len(), 10);
    assert!(y.iter().all(|v| *v == 3.0));
  }

  #[test]
  fn undefined_samples_become_nan() {
    let series =
      Series::line(e("log(x)"), Range::new("x", -1.0, 1.0), samples(5))
        .unwrap();
    let (_, y) = line_xy(&series);
    assert!(y[0].is_nan());
    assert!(y[1].is_nan());
    assert!(y[2].is_nan());
    assert!(close(y[3], 0.5f64.ln()));
    assert!(close(y[4], 0.0));
  }

  #[test]
  fn log_scale() {
    let series = Series::line(
      e("x"),
      Range::new("x", 1.0, 100.0),
      SeriesOptions {
        n1: Some(3),
        scales: [Scale::Log, Scale::Linear, Scale::Linear],
        ..Default::default()
      },
    )
    .unwrap();
    let (x, _) = line_xy(&series);
    assert!(close(x[0], 1.0));
    assert!(close(x[1], 10.0));
    assert!(close(x[2], 100.0));
  }

  #[test]
  fn log_scale_rejects_zero_bound() {
    let result = Series::line(
      e("x"),
      Range::new("x", 0.0, 10.0),
      SeriesOptions {
        scales: [Scale::Log, Scale::Linear, Scale::Linear],
        ..Default::default()
      },
    );
    assert!(matches!(result, Err(PlotError::DomainError(_))));
  }

  #[test]
  fn steps_build_a_staircase() {
    let series = Series::line(
      e("x"),
      Range::new("x", 0.0, 2.0),
      SeriesOptions {
        n1: Some(3),
        steps: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (x, y) = line_xy(&series);
    assert_eq!(x.to_vec(), vec![0.0, 1.0, 1.0, 2.0, 2.0]);
    assert_eq!(y.to_vec(), vec![0.0, 0.0, 1.0, 1.0, 2.0]);
  }

  #[test]
  fn polar_line_is_projected() {
    let series = Series::line(
      e("2"),
      Range::new("theta", 0.0, 2.0 * PI),
      SeriesOptions {
        n1: Some(9),
        is_polar: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (x, y) = line_xy(&series);
    for (a, b) in x.iter().zip(y.iter()) {
      assert!(close(a.hypot(*b), 2.0));
    }
    assert!(close(x[0], 2.0));
  }
}

mod integer_snap {
  use super::*;

  #[test]
  fn spans_integers_inside_the_range() {
    let series = Series::line(
      e("x**2"),
      Range::new("x", -5.5, 4.5),
      SeriesOptions {
        only_integers: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (x, y) = line_xy(&series);
    assert_eq!(x.len(), 10);
    let expected: Vec<f64> = (-5..=4).map(f64::from).collect();
    assert_eq!(x.to_vec(), expected);
    assert_eq!(y[0], 25.0);
  }

  #[test]
  fn overrides_adaptive() {
    let series = Series::line(
      e("sin(x)"),
      Range::new("x", -5.5, 4.5),
      SeriesOptions {
        only_integers: true,
        adaptive: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (x, _) = line_xy(&series);
    assert_eq!(x.len(), 10);
    assert!(x.iter().all(|v| v.fract() == 0.0));
  }
}

mod poles {
  use super::*;

  fn tan_series(detect_poles: bool, eps: f64) -> Series {
    Series::line(
      e("tan(x)"),
      Range::new("x", -PI, PI),
      SeriesOptions {
        detect_poles,
        eps,
        ..Default::default()
      },
    )
    .unwrap()
  }

  #[test]
  fn coarse_eps_introduces_nan() {
    let series = tan_series(true, 0.01);
    match series.get_data().unwrap() {
      SeriesData::Line {
        y, poles_detected, ..
      } => {
        assert!(poles_detected);
        assert!(y.iter().any(|v| v.is_nan()));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn fine_eps_leaves_data_untouched() {
    let (x_ref, y_ref) = line_xy(&tan_series(false, 0.1));
    let (x, y) = line_xy(&tan_series(true, 1e-6));
    assert_eq!(x, x_ref);
    assert_eq!(y, y_ref);
    assert!(y.iter().all(|v| !v.is_nan()));
  }

  #[test]
  fn non_positive_eps_is_rejected() {
    let result = Series::line(
      e("tan(x)"),
      Range::new("x", -PI, PI),
      SeriesOptions {
        eps: 0.0,
        ..Default::default()
      },
    );
    assert!(matches!(result, Err(PlotError::DomainError(_))));
  }
}

mod adaptive {
  use super::*;

  #[test]
  fn samples_are_sorted_and_cover_the_range() {
    let series = Series::line(
      e("sin(x)"),
      Range::new("x", 0.0, 10.0),
      SeriesOptions {
        adaptive: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (x, y) = line_xy(&series);
    assert_eq!(x[0], 0.0);
    assert!(close(x[x.len() - 1], 10.0));
    assert!(x.windows(2).into_iter().all(|w| w[0] < w[1]));
    assert!(x.len() > 17);
    for (a, b) in x.iter().zip(y.iter()) {
      assert!(close(*b, a.sin()));
    }
  }

  #[test]
  fn straight_line_needs_only_initial_intervals() {
    let series = Series::line(
      e("2*x + 1"),
      Range::new("x", -1.0, 1.0),
      SeriesOptions {
        adaptive: true,
        ..Default::default()
      },
    )
    .unwrap();
    let (x, _) = line_xy(&series);
    assert_eq!(x.len(), 17);
  }

  fn adaptive_and_fixed(range: Range, scale: Scale) -> (Vec<f64>, Vec<f64>) {
    let options = |adaptive| SeriesOptions {
      n1: Some(20),
      adaptive,
      scales: [scale, Scale::Linear, Scale::Linear],
      ..Default::default()
    };
    let run = |adaptive| {
      let series =
        Series::line(e("sin(x)"), range.clone(), options(adaptive)).unwrap();
      line_xy(&series).0.to_vec()
    };
    (run(true), run(false))
  }

  #[test]
  fn log_scale_with_negative_bounds_keeps_grid_order() {
    let (adaptive, fixed) =
      adaptive_and_fixed(Range::new("x", -10.0, -1.0), Scale::Log);
    assert!(close(fixed[0], -10.0));
    assert!(close(adaptive[0], fixed[0]));
    assert!(close(adaptive[adaptive.len() - 1], fixed[fixed.len() - 1]));
    assert!(adaptive.windows(2).all(|w| w[0] < w[1]));
    assert!(adaptive.iter().all(|v| *v < 0.0));
  }

  #[test]
  fn log_scale_refines_in_log_space() {
    let (adaptive, _) =
      adaptive_and_fixed(Range::new("x", 1.0, 1000.0), Scale::Log);
    assert!(close(adaptive[0], 1.0));
    assert!(close(adaptive[adaptive.len() - 1], 1000.0));
    // The initial intervals are uniform in ln(x), so a decade holds
    // several samples.
    assert!(adaptive.iter().filter(|v| **v < 10.0).count() >= 5);
  }

  #[test]
  fn reversed_range_runs_from_start_to_end() {
    let (adaptive, fixed) =
      adaptive_and_fixed(Range::new("x", 1.0, -1.0), Scale::Linear);
    assert_eq!(fixed[0], 1.0);
    assert!(close(adaptive[0], 1.0));
    assert!(close(adaptive[adaptive.len() - 1], -1.0));
    assert!(adaptive.windows(2).all(|w| w[0] > w[1]));
  }

  #[test]
  fn zero_goal_is_rejected() {
    let series = Series::line(
      e("x"),
      Range::new("x", 0.0, 1.0),
      SeriesOptions {
        adaptive: true,
        adaptive_goal: plotseries::functions::AdaptiveGoal::Loss(0.0),
        ..Default::default()
      },
    )
    .unwrap();
    assert!(matches!(series.get_data(), Err(PlotError::DomainError(_))));
  }
}

mod complex_lines {
  use super::*;

  #[test]
  fn abs_arg_of_sqrt_has_no_gaps() {
    let series = Series::abs_arg_line(
      e("sqrt(x)"),
      Range::new("x", -4.0, 4.0),
      samples(9),
    )
    .unwrap();
    match series.get_data().unwrap() {
      SeriesData::AbsArgLine { x, abs, arg } => {
        assert!(abs.iter().chain(arg.iter()).all(|v| !v.is_nan()));
        for (t, a) in x.iter().zip(abs.iter()) {
          assert!(close(*a, t.abs().sqrt()));
        }
        assert!(close(arg[0], PI / 2.0));
        assert!(close(arg[8], 0.0));
      }
      other => panic!("unexpected {other:?}"),
    }
  }
}

mod parametric {
  use super::*;

  #[test]
  fn circle() {
    let series = Series::parametric_line_2d(
      e("cos(t)"),
      e("sin(t)"),
      Range::new("t", 0.0, 2.0 * PI),
      samples(20),
    )
    .unwrap();
    match series.get_data().unwrap() {
      SeriesData::Parametric2DLine { x, y, param } => {
        assert_eq!(param.len(), 20);
        assert_eq!(param[0], 0.0);
        for (a, b) in x.iter().zip(y.iter()) {
          assert!(close(a.hypot(*b), 1.0));
        }
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn helix_carries_its_parameter() {
    let series = Series::parametric_line_3d(
      e("cos(t)"),
      e("sin(t)"),
      e("t"),
      Range::new("t", 0.0, 6.0),
      samples(7),
    )
    .unwrap();
    match series.get_data().unwrap() {
      SeriesData::Parametric3DLine { z, param, .. } => {
        assert_eq!(z, param);
        assert_eq!(param.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn steps_apply_to_every_array() {
    let series = Series::parametric_line_2d(
      e("t"),
      e("2*t"),
      Range::new("t", 0.0, 1.0),
      SeriesOptions {
        n1: Some(2),
        steps: true,
        ..Default::default()
      },
    )
    .unwrap();
    match series.get_data().unwrap() {
      SeriesData::Parametric2DLine { x, y, param } => {
        assert_eq!(x.to_vec(), vec![0.0, 1.0, 1.0]);
        assert_eq!(y.to_vec(), vec![0.0, 0.0, 2.0]);
        assert_eq!(param.to_vec(), vec![0.0, 0.0, 1.0]);
      }
      other => panic!("unexpected {other:?}"),
    }
  }
}

mod transforms {
  use super::*;
  use std::sync::Arc;

  #[test]
  fn axis_transforms_apply_after_sampling() {
    let mut options = samples(5);
    options.transforms.x = Some(Arc::new(|v| v * 10.0));
    options.transforms.y = Some(Arc::new(|v| v + 1.0));
    let series =
      Series::line(e("x**2"), Range::new("x", 0.0, 4.0), options).unwrap();
    let (x, y) = line_xy(&series);
    assert_eq!(x.to_vec(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    assert_eq!(y.to_vec(), vec![1.0, 2.0, 5.0, 10.0, 17.0]);
  }
}

mod points {
  use super::*;

  #[test]
  fn raw_coordinates() {
    let series =
      Series::points(vec![1.0, 2.0], vec![3.0, 4.0], Default::default())
        .unwrap();
    assert_eq!(series.kind(), SeriesKind::Points);
    match series.get_data().unwrap() {
      SeriesData::Points { x, y } => {
        assert_eq!(x.to_vec(), vec![1.0, 2.0]);
        assert_eq!(y.to_vec(), vec![3.0, 4.0]);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn mismatched_lengths() {
    let result = Series::points(vec![1.0], vec![], Default::default());
    assert!(matches!(result, Err(PlotError::ShapeError(_))));
  }
}
