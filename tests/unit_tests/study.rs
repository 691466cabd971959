use matrixcompare::assert_scalar_eq;
use poisson2d::element::ElementKind;
use poisson2d::problem::PoissonConfig;
use poisson2d::study::{compare_orders, convergence_rates, element_name, ConvergenceStudy, ErrorSummary};

#[test]
fn convergence_rates_of_power_law() {
    let h = [0.4, 0.2, 0.1, 0.05];
    let errors: Vec<f64> = h.iter().map(|h: &f64| 3.0 * h.powi(2)).collect();
    let rates = convergence_rates(&h, &errors);
    assert_eq!(rates.len(), 3);
    for rate in rates {
        assert_scalar_eq!(rate, 2.0, comp = abs, tol = 1e-12);
    }
    assert!(convergence_rates(&[0.1], &[1.0]).is_empty());
}

#[test]
fn element_names() {
    assert_eq!(element_name(ElementKind::Triangle, 1), "Tri3");
    assert_eq!(element_name(ElementKind::Triangle, 2), "Tri6");
    assert_eq!(element_name(ElementKind::Quadrilateral, 2), "Quad8");
    assert_eq!(element_name(ElementKind::Quadrilateral, 3), "Quad13");
}

#[test]
fn study_records_every_level() {
    let study = ConvergenceStudy::new(PoissonConfig::new(ElementKind::Triangle, 1), vec![2, 4]);
    let summary = study.run().unwrap();
    assert_eq!(summary.element_name, "Tri3");
    assert_eq!(summary.cells_per_dim, vec![2, 4]);
    assert_eq!(summary.num_nodes, vec![9, 25]);
    assert_eq!(summary.l2_errors.len(), 2);
    assert!(summary.l2_errors[1] < summary.l2_errors[0]);
    assert!(summary.energy_errors[1] < summary.energy_errors[0]);
    assert_eq!(summary.l2_rates().len(), 1);

    let json = serde_json::to_string(&summary).unwrap();
    let deserialized: ErrorSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.cells_per_dim, summary.cells_per_dim);
}

#[test]
fn study_reports_invalid_configuration() {
    let study = ConvergenceStudy::new(PoissonConfig::new(ElementKind::Quadrilateral, 5), vec![2]);
    let error = study.run().unwrap_err();
    assert!(error.to_string().contains("failed to set up"));

    let empty = ConvergenceStudy::new(PoissonConfig::default(), Vec::new());
    assert!(empty.run().is_err());
}

#[test]
fn compare_orders_runs_one_study_per_order() {
    let summaries = compare_orders(&PoissonConfig::new(ElementKind::Quadrilateral, 1), &[1, 2], &[2, 4]).unwrap();
    let names: Vec<_> = summaries.iter().map(|s| s.element_name.as_str()).collect();
    assert_eq!(names, vec!["Quad4", "Quad8"]);
    // Higher order is more accurate on the same meshes
    assert!(summaries[1].l2_errors[1] < summaries[0].l2_errors[1]);
}
