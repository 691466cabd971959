use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use poisson2d::assembly::boundary::apply_homogeneous_dirichlet_on_boundary;
use poisson2d::assembly::global::{
    diagonal, is_rank_deficient, GlobalAssembler, GlobalSystem, SingularityPolicy, SingularityReport,
};
use poisson2d::assembly::local::ElementAssembler;
use poisson2d::element::{ElementKind, ShapeFunctionSet};
use poisson2d::manufactured::SinusoidalSource;
use poisson2d::mesh::{Mesh, SquareDomain};
use poisson2d::nalgebra::{DMatrix, DVector, Point2};
use poisson2d::nalgebra_sparse::CscMatrix;
use poisson2d::quadrature::QuadratureRule;
use poisson2d::solve::solve_system;
use poisson2d::FemError;
use util::asymmetry;

use super::unit_square_mesh;

fn constant_source(_: &Point2<f64>) -> f64 {
    1.0
}

fn assemble_unit_square(kind: ElementKind, order: usize, cells_per_dim: usize, parallel: bool) -> GlobalSystem {
    let (mesh, shape_functions) = unit_square_mesh(kind, order, cells_per_dim);
    let quadrature = QuadratureRule::default_for_assembly(kind, order).unwrap();
    let source = constant_source;
    let element_assembler = ElementAssembler::new(&shape_functions, &quadrature, &source).unwrap();
    GlobalAssembler::new()
        .with_parallel(parallel)
        .assemble(&mesh, &element_assembler)
        .unwrap()
}

fn constrained_system(kind: ElementKind, order: usize, cells_per_dim: usize) -> GlobalSystem {
    let (mesh, shape_functions) = unit_square_mesh(kind, order, cells_per_dim);
    let quadrature = QuadratureRule::default_for_assembly(kind, order).unwrap();
    let source = SinusoidalSource::default();
    let element_assembler = ElementAssembler::new(&shape_functions, &quadrature, &source).unwrap();
    let mut system = GlobalAssembler::new()
        .assemble(&mesh, &element_assembler)
        .unwrap();
    apply_homogeneous_dirichlet_on_boundary(&mut system, &mesh, &SquareDomain::unit()).unwrap();
    system
}

fn sparse(dense: &DMatrix<f64>) -> CscMatrix<f64> {
    CscMatrix::from(dense)
}

#[test]
fn assembled_stiffness_is_symmetric_with_constants_in_kernel() {
    for kind in [ElementKind::Triangle, ElementKind::Quadrilateral] {
        for order in 1..=2 {
            let system = assemble_unit_square(kind, order, 3, false);
            let n = system.num_dofs();
            let stiffness = DMatrix::from(system.stiffness());

            assert!(asymmetry(&stiffness) <= 1e-12);
            let row_sums = &stiffness * DVector::repeat(n, 1.0);
            assert_matrix_eq!(row_sums, DVector::<f64>::zeros(n), comp = abs, tol = 1e-11);

            // The basis is a partition of unity, so the load of f = 1 sums to the domain area
            assert_scalar_eq!(system.load().sum(), 1.0, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn p1_interior_row_is_five_point_stencil() {
    let (mesh, _) = unit_square_mesh(ElementKind::Triangle, 1, 2);
    let system = assemble_unit_square(ElementKind::Triangle, 1, 2, false);
    let stiffness = DMatrix::from(system.stiffness());

    let center = mesh
        .vertices()
        .iter()
        .position(|x| *x == Point2::new(0.5, 0.5))
        .unwrap();
    assert_scalar_eq!(stiffness[(center, center)], 4.0, comp = abs, tol = 1e-13);
    let off_diagonal: f64 = stiffness.row(center).sum() - stiffness[(center, center)];
    assert_scalar_eq!(off_diagonal, -4.0, comp = abs, tol = 1e-13);
}

#[test]
fn serial_and_parallel_assembly_agree() {
    for kind in [ElementKind::Triangle, ElementKind::Quadrilateral] {
        let serial = assemble_unit_square(kind, 2, 6, false);
        let parallel = assemble_unit_square(kind, 2, 6, true);
        assert_eq!(serial, parallel);
    }
}

#[test]
fn assemble_rejects_empty_mesh() {
    let shape_functions = ShapeFunctionSet::new(ElementKind::Triangle, 1).unwrap();
    let quadrature = QuadratureRule::new(ElementKind::Triangle, 1).unwrap();
    let source = constant_source;
    let element_assembler = ElementAssembler::new(&shape_functions, &quadrature, &source).unwrap();
    let mesh = Mesh::from_vertices_and_connectivity(vec![Point2::origin()], vec![]).unwrap();

    let result = GlobalAssembler::new().assemble(&mesh, &element_assembler);
    assert!(matches!(result, Err(FemError::InvalidInput(_))));
}

#[test]
fn assemble_rejects_mismatched_element_order() {
    let (mesh, _) = unit_square_mesh(ElementKind::Triangle, 2, 2);
    let shape_functions = ShapeFunctionSet::new(ElementKind::Triangle, 1).unwrap();
    let quadrature = QuadratureRule::new(ElementKind::Triangle, 3).unwrap();
    let source = constant_source;
    let element_assembler = ElementAssembler::new(&shape_functions, &quadrature, &source).unwrap();

    let result = GlobalAssembler::new().assemble(&mesh, &element_assembler);
    assert!(matches!(result, Err(FemError::InvalidInput(_))));
}

#[test]
fn degenerate_element_is_reported_with_its_index() {
    let vertices = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(0.0, 1.0),
        Point2::new(2.0, 0.0),
    ];
    // The second element is collinear
    let connectivity = vec![vec![0, 1, 2], vec![0, 1, 3]];
    let mesh = Mesh::from_vertices_and_connectivity(vertices, connectivity).unwrap();
    let shape_functions = ShapeFunctionSet::new(ElementKind::Triangle, 1).unwrap();
    let quadrature = QuadratureRule::new(ElementKind::Triangle, 1).unwrap();
    let source = constant_source;
    let element_assembler = ElementAssembler::new(&shape_functions, &quadrature, &source).unwrap();

    for parallel in [false, true] {
        let result = GlobalAssembler::new()
            .with_parallel(parallel)
            .assemble(&mesh, &element_assembler);
        assert!(matches!(
            result,
            Err(FemError::SingularJacobian { element: Some(1), .. })
        ));
    }
}

#[test]
fn is_rank_deficient_simple_examples() {
    assert!(!is_rank_deficient(&sparse(&DMatrix::identity(3, 3))));
    assert!(is_rank_deficient(&sparse(&DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]))));
    assert!(is_rank_deficient(&CscMatrix::zeros(2, 2)));
    assert!(is_rank_deficient(&sparse(&DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 1e-14])))));
}

#[test]
fn unconstrained_stiffness_is_rank_deficient() {
    let system = assemble_unit_square(ElementKind::Triangle, 1, 4, false);
    assert!(is_rank_deficient(system.stiffness()));
}

#[test]
fn check_singularity_leaves_constrained_system_untouched() {
    for policy in [SingularityPolicy::Lenient, SingularityPolicy::Strict] {
        let mut system = constrained_system(ElementKind::Quadrilateral, 2, 4);
        let original = system.clone();
        let report = GlobalAssembler::new()
            .with_singularity_policy(policy)
            .check_singularity(&mut system)
            .unwrap();
        assert_eq!(report, SingularityReport::default());
        assert_eq!(system, original);
    }
}

#[test]
fn strict_policy_rejects_rank_deficient_system() {
    let mut system = assemble_unit_square(ElementKind::Triangle, 1, 4, false);
    let n = system.num_dofs();
    let result = GlobalAssembler::new()
        .with_singularity_policy(SingularityPolicy::Strict)
        .check_singularity(&mut system);
    assert_eq!(result, Err(FemError::SingularSystem { size: n }));
}

#[test]
fn lenient_policy_regularizes_rank_deficient_system() {
    let mut system = assemble_unit_square(ElementKind::Triangle, 1, 4, false);
    let diagonal_before = diagonal(system.stiffness());
    let report = GlobalAssembler::new().check_singularity(&mut system).unwrap();

    assert!(report.rank_deficient);
    assert!(report.regularized);
    assert!(!report.jacobi_scaled);
    assert!(!report.unresolved);
    let shift = diagonal(system.stiffness()) - diagonal_before;
    assert_matrix_eq!(shift, DVector::repeat(shift.len(), 1e-6), comp = abs, tol = 1e-14);
}

#[test]
fn lenient_policy_falls_back_to_jacobi_scaling() {
    // Regularization alone leaves a pivot ratio of 1e-18
    let stiffness = sparse(&DMatrix::from_diagonal(&DVector::from_vec(vec![1e12, 0.0])));
    let load = DVector::from_vec(vec![1e12, 1e-6]);
    let mut system = GlobalSystem::new(stiffness, load).unwrap();

    let report = GlobalAssembler::new().check_singularity(&mut system).unwrap();
    assert!(report.rank_deficient && report.regularized && report.jacobi_scaled);
    assert!(!report.unresolved);
    assert!(system.scaling().is_some());

    // The solver undoes the scaling, giving the solution of the regularized system
    let u = solve_system(&system).unwrap();
    assert_matrix_eq!(u, DVector::from_vec(vec![1.0, 1.0]), comp = abs, tol = 1e-9);
}

#[test]
fn jacobi_scaling_gives_unit_diagonal() {
    let mut system = constrained_system(ElementKind::Triangle, 2, 3);
    let original = system.clone();
    system.apply_jacobi_scaling();

    let d = diagonal(system.stiffness());
    assert_matrix_eq!(d, DVector::repeat(d.len(), 1.0), comp = abs, tol = 1e-13);

    let u_original = solve_system(&original).unwrap();
    let u_scaled = solve_system(&system).unwrap();
    assert_matrix_eq!(u_scaled, u_original, comp = abs, tol = 1e-12);
}

#[test]
fn global_system_rejects_incompatible_dimensions() {
    let stiffness = CscMatrix::identity(3);
    let result = GlobalSystem::new(stiffness, DVector::zeros(2));
    assert!(matches!(result, Err(FemError::InvalidInput(_))));

    let rectangular = CscMatrix::zeros(2, 3);
    let result = GlobalSystem::new(rectangular, DVector::zeros(2));
    assert!(matches!(result, Err(FemError::InvalidInput(_))));
}
