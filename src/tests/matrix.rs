use nalgebra::DMatrix;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{error::Error, prelude::Matrix};

fn assert_identity(m: &Matrix, tolerance: f64) {
    let (rows, cols) = m.shape();
    assert_eq!(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!(
                (m[(i, j)] - expected).abs() < tolerance,
                "({}, {}): {}",
                i,
                j,
                m[(i, j)]
            );
        }
    }
}

/// Random symmetric positive definite matrix
fn random_spd(rng: &mut SmallRng, n: usize) -> Matrix {
    let rows = (0..n)
        .map(|_| (0..n).map(|_| rng.random_range(-1.0..1.0)).collect())
        .collect::<Vec<Vec<f64>>>();
    let a = Matrix::from_rows(&rows).unwrap();
    let spd = a.transpose().mul(&a).unwrap();
    spd.add(&Matrix::identity(n)).unwrap()
}

#[test]
fn construction() {
    let m = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    assert_eq!(m.shape(), (2, 3));
    assert_eq!(m[(1, 0)], 4.0);
    assert_eq!(m.row_major(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(m.as_dmatrix()[(0, 2)], 3.0);
    assert_eq!(m.transpose()[(2, 1)], 6.0);

    assert!(matches!(
        Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]),
        Err(Error::MatrixDimension)
    ));

    let d = Matrix::from_diagonal(&[1.0, 2.0, 3.0]);
    assert_eq!(d.diagonal(), vec![1.0, 2.0, 3.0]);
    assert_eq!(d[(0, 1)], 0.0);

    let c = Matrix::column(&[3.0, 4.0]);
    assert_eq!(c.shape(), (2, 1));
    assert_eq!(c.norm(), 5.0);
}

#[test]
fn product() {
    let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = Matrix::from_rows(&[vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
    let ab = a.mul(&b).unwrap();
    assert_eq!(ab.row_major(), vec![19.0, 22.0, 43.0, 50.0]);

    let x = Matrix::column(&[1.0, 1.0]);
    assert_eq!(a.mul(&x).unwrap().row_major(), vec![3.0, 7.0]);

    assert!(matches!(x.mul(&a), Err(Error::MatrixDimension)));
    assert!(matches!(a.add(&x), Err(Error::MatrixDimension)));
    assert_eq!(a.sub(&a).unwrap().norm(), 0.0);
}

#[test]
fn lu_inverse() {
    // requires pivoting
    let a = Matrix::from_rows(&[
        vec![0.0, 2.0, 1.0],
        vec![1.0, 0.0, 0.0],
        vec![3.0, 0.0, 1.0],
    ])
    .unwrap();

    let inv = a.inverse().unwrap();
    assert_identity(&a.mul(&inv).unwrap(), 1.0E-12);
}

#[test]
fn singular_matrices() {
    let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
    assert!(matches!(a.inverse(), Err(Error::MatrixInversion)));
    assert!(matches!(a.cholesky_inverse(), Err(Error::MatrixInversion)));

    let not_square = Matrix::zeros(2, 3);
    assert!(matches!(not_square.inverse(), Err(Error::MatrixDimension)));
    assert!(matches!(
        not_square.cholesky_inverse(),
        Err(Error::MatrixDimension)
    ));
}

#[test]
fn random_inversions() {
    let mut rng = SmallRng::seed_from_u64(42);
    for n in 1..12 {
        let spd = random_spd(&mut rng, n);

        let inv = spd.cholesky_inverse().unwrap();
        assert_identity(&spd.mul(&inv).unwrap(), 1.0E-9);

        let lu = spd.inverse().unwrap();
        assert_identity(&spd.mul(&lu).unwrap(), 1.0E-9);

        let diff = inv.sub(&lu).unwrap();
        assert!(diff.norm() < 1.0E-9, "n={} |diff|={}", n, diff.norm());
    }
}

#[test]
fn dmatrix_interop() {
    let mut rng = SmallRng::seed_from_u64(7);
    let spd = random_spd(&mut rng, 5);

    let expected = spd
        .as_dmatrix()
        .clone()
        .try_inverse()
        .expect("invertible");

    let inv = spd.cholesky_inverse().unwrap();
    assert!((inv.as_dmatrix() - &expected).norm() < 1.0E-9);

    let m = Matrix::from(DMatrix::<f64>::identity(3, 3));
    assert_identity(&m, 1.0E-15);
    assert!(m.is_finite());

    let mut nan = Matrix::zeros(2, 2);
    nan[(1, 0)] = f64::NAN;
    assert!(!nan.is_finite());
}
