use super::*;

mod text {
  use super::*;

  #[test]
  fn cartesian_line() {
    let series =
      Series::line(e("cos(x)"), Range::new("x", -4.0, 3.0), Default::default())
        .unwrap();
    assert_eq!(
      series.to_string(),
      "cartesian line: cos(x) for x over (-4.0, 3.0)"
    );
  }

  #[test]
  fn interactive_line() {
    let series = Series::line(
      e("cos(u*x)"),
      Range::new("x", -4.0, 3.0),
      SeriesOptions {
        params: params(&[("u", 1.0)]),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(
      series.to_string(),
      "interactive cartesian line: cos(u*x) with ranges (x, -4.0, 3.0) and \
       parameters (u,)"
    );
  }

  #[test]
  fn several_parameters() {
    let series = Series::line(
      e("a*x + b"),
      Range::new("x", 0.0, 1.0),
      SeriesOptions {
        params: params(&[("b", 0.0), ("a", 1.0)]),
        ..Default::default()
      },
    )
    .unwrap();
    assert!(series.to_string().ends_with("and parameters (a, b)"));
  }

  #[test]
  fn surface_names_both_ranges() {
    let series = Series::surface(
      e("x*y"),
      Range::new("x", -1.0, 1.0),
      Range::new("y", 0.0, 2.0),
      Default::default(),
    )
    .unwrap();
    assert_eq!(
      series.to_string(),
      "cartesian surface: x*y for x over (-1.0, 1.0) and y over (0.0, 2.0)"
    );
  }

  #[test]
  fn parametric_line_lists_components() {
    let series = Series::parametric_line_2d(
      e("cos(t)"),
      e("sin(t)"),
      Range::new("t", 0.0, 1.0),
      Default::default(),
    )
    .unwrap();
    assert_eq!(
      series.to_string(),
      "parametric cartesian line: (cos(t), sin(t)) for t over (0.0, 1.0)"
    );
  }

  #[test]
  fn domain_coloring_splits_complex_range() {
    let series = Series::domain_coloring(
      e("z**2"),
      Range::complex("z", Complex64::new(-1.0, -2.0), Complex64::new(1.0, 2.0)),
      Default::default(),
    )
    .unwrap();
    assert_eq!(
      series.to_string(),
      "domain coloring: z**2 for re(z) over (-1.0, 1.0) and im(z) over \
       (-2.0, 2.0)"
    );
  }

  #[test]
  fn polar_prefix() {
    let series = Series::line(
      e("1 + cos(t)"),
      Range::new("t", 0.0, 6.0),
      SeriesOptions {
        is_polar: true,
        ..Default::default()
      },
    )
    .unwrap();
    assert!(series.to_string().starts_with("polar line: 1 + cos(t)"));
  }
}

mod labels {
  use super::*;

  #[test]
  fn user_label_is_verbatim() {
    let series = Series::line(
      e("cos(x)"),
      Range::new("x", 0.0, 1.0),
      SeriesOptions {
        label: Some("my $f$".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(series.get_label(false), "my $f$");
    assert_eq!(series.get_label(true), "my $f$");
  }

  #[test]
  fn plain_and_formatted_expression() {
    let series =
      Series::line(e("cos(x)"), Range::new("x", 0.0, 1.0), Default::default())
        .unwrap();
    assert_eq!(series.get_label(false), "cos(x)");
    assert_eq!(series.get_label(true), "\\cos{\\left(x \\right)}");
  }

  #[test]
  fn several_expressions_form_a_tuple() {
    let series = Series::parametric_line_2d(
      e("t"),
      e("t**2"),
      Range::new("t", 0.0, 1.0),
      Default::default(),
    )
    .unwrap();
    assert_eq!(series.get_label(false), "(t, t**2)");
  }
}
