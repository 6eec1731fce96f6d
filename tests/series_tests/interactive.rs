use super::*;
use plotseries::series::Slice;
use std::sync::Arc;

fn cosine(u: f64) -> Series {
  Series::line(
    e("u*cos(x)"),
    Range::new("x", -5.0, 5.0),
    SeriesOptions {
      n1: Some(50),
      params: params(&[("u", u)]),
      ..Default::default()
    },
  )
  .unwrap()
}

mod parameters {
  use super::*;

  #[test]
  fn matches_non_interactive_series() {
    let plain =
      Series::line(e("cos(x)"), Range::new("x", -5.0, 5.0), samples(50))
        .unwrap();
    let (x0, y0) = line_xy(&plain);
    let (x1, y1) = line_xy(&cosine(1.0));
    assert_eq!(x0, x1);
    for (a, b) in y0.iter().zip(y1.iter()) {
      assert!(close(*a, *b));
    }
  }

  #[test]
  fn update_re_evaluates_without_recompiling() {
    let mut series = cosine(1.0);
    assert!(series.is_interactive());
    let before: Vec<*const ()> = series
      .evaluators()
      .iter()
      .map(|ev| Arc::as_ptr(ev.expr()) as *const ())
      .collect();
    let evaluators_before = series.evaluators().as_ptr();

    series.update_parameters(&params(&[("u", 2.0)])).unwrap();

    let after: Vec<*const ()> = series
      .evaluators()
      .iter()
      .map(|ev| Arc::as_ptr(ev.expr()) as *const ())
      .collect();
    assert_eq!(before, after);
    assert_eq!(evaluators_before, series.evaluators().as_ptr());
    let (x, y) = line_xy(&series);
    for (a, b) in x.iter().zip(y.iter()) {
      assert!(close(*b, 2.0 * a.cos()));
    }
  }

  #[test]
  fn unknown_parameter_is_rejected() {
    let mut series = cosine(1.0);
    let result = series.update_parameters(&params(&[("v", 2.0)]));
    assert!(matches!(result, Err(PlotError::ParameterError(_))));
    assert_eq!(series.parameters()["u"], Complex64::new(1.0, 0.0));
  }

  #[test]
  fn rejected_update_changes_nothing() {
    let mut series = cosine(1.0);
    let result =
      series.update_parameters(&params(&[("u", 5.0), ("nope", 1.0)]));
    assert!(result.is_err());
    assert_eq!(series.parameters()["u"], Complex64::new(1.0, 0.0));
  }

  #[test]
  fn complex_parameter_values() {
    let mut series = cosine(1.0);
    let mut values = Parameters::new();
    values.insert("u".to_string(), Complex64::new(0.0, 1.0));
    series.update_parameters(&values).unwrap();
    let (_, y) = line_xy(&series);
    // i*cos(x) is not real.
    assert!(y.iter().all(|v| v.is_nan() || *v == 0.0));
  }

  #[test]
  fn range_variable_cannot_be_a_parameter() {
    let result = Series::line(
      e("x*u"),
      Range::new("x", 0.0, 1.0),
      SeriesOptions {
        params: params(&[("x", 1.0), ("u", 1.0)]),
        ..Default::default()
      },
    );
    assert!(matches!(result, Err(PlotError::ParameterError(_))));
  }
}

mod compilation {
  use super::*;

  #[test]
  fn unknown_function() {
    let result =
      Series::line(e("foo(x)"), Range::new("x", 0.0, 1.0), Default::default());
    assert!(matches!(result, Err(PlotError::CompilationError(_))));
  }

  #[test]
  fn wrong_function_arity() {
    let result = Series::line(
      e("atan2(x)"),
      Range::new("x", 0.0, 1.0),
      Default::default(),
    );
    assert!(matches!(result, Err(PlotError::CompilationError(_))));
  }

  #[test]
  fn missing_binding_names_the_symbol() {
    let err = Series::line(
      e("x + k"),
      Range::new("x", 0.0, 1.0),
      Default::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PlotError::DomainError(_)));
    assert!(err.to_string().contains("symbol k"));
  }
}

mod sliced_surface {
  use super::*;

  #[test]
  fn slice_parameters_follow_owner_updates() {
    let surface = Series::surface(
      e("a*x"),
      Range::new("x", -1.0, 1.0),
      Range::new("y", -1.0, 1.0),
      SeriesOptions {
        n1: Some(3),
        n2: Some(3),
        params: params(&[("a", 1.0)]),
        ..Default::default()
      },
    )
    .unwrap();
    let mut series = Series::slice_vector_3d(
      [e("1"), e("0"), e("k")],
      [
        Range::new("x", -1.0, 1.0),
        Range::new("y", -1.0, 1.0),
        Range::new("z", -2.0, 2.0),
      ],
      Slice::Surface(Box::new(surface)),
      SeriesOptions {
        params: params(&[("k", 0.0)]),
        ..Default::default()
      },
    )
    .unwrap();

    series
      .update_parameters(&params(&[("a", 2.0), ("k", 3.0)]))
      .unwrap();
    match series.get_data().unwrap() {
      SeriesData::SliceVector3D { x, z, w, .. } => {
        for (a, c) in x.iter().zip(z.iter()) {
          assert!(close(*c, 2.0 * a));
        }
        assert!(w.iter().all(|v| *v == 3.0));
      }
      other => panic!("unexpected {other:?}"),
    }
  }
}
