//! Small dense matrices for the loop amplification bound

use std::fmt;

/// Pivots smaller than this make a matrix singular
const PIVOT_EPSILON: f64 = 1e-12;

/// Row-major square or rectangular matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let data: Vec<f64> = rows
            .into_iter()
            .flat_map(|mut r| {
                r.resize(cols, 0.0);
                r
            })
            .collect();
        Self { rows: n, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        self.data[r * self.cols + c] = v;
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(&self, other: &Matrix, f: impl Fn(f64, f64) -> f64) -> Matrix {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| f(a, b)).collect(),
        }
    }

    pub fn mul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut out = Matrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(r, k);
                if a == 0.0 {
                    continue;
                }
                for c in 0..other.cols {
                    out.data[r * other.cols + c] += a * other.get(k, c);
                }
            }
        }
        out
    }

    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.cols, v.len());
        (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.get(r, c) * v[c]).sum())
            .collect()
    }

    /// `self^k` by repeated squaring
    pub fn pow(&self, mut k: u32) -> Matrix {
        let mut result = Matrix::identity(self.rows);
        let mut base = self.clone();
        while k > 0 {
            if k & 1 == 1 {
                result = result.mul(&base);
            }
            base = base.mul(&base);
            k >>= 1;
        }
        result
    }

    /// Gauss-Jordan inverse with partial pivoting; `None` when singular
    pub fn inverse(&self) -> Option<Matrix> {
        if self.rows != self.cols {
            return None;
        }
        let n = self.rows;
        let mut a = self.clone();
        let mut inv = Matrix::identity(n);

        for col in 0..n {
            let pivot_row = (col..n).max_by(|&x, &y| a.get(x, col).abs().total_cmp(&a.get(y, col).abs()))?;
            let pivot = a.get(pivot_row, col);
            if pivot.abs() < PIVOT_EPSILON {
                return None;
            }
            a.swap_rows(col, pivot_row);
            inv.swap_rows(col, pivot_row);

            for c in 0..n {
                a.set(col, c, a.get(col, c) / pivot);
                inv.set(col, c, inv.get(col, c) / pivot);
            }
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a.get(r, col);
                if factor == 0.0 {
                    continue;
                }
                for c in 0..n {
                    a.set(r, c, a.get(r, c) - factor * a.get(col, c));
                    inv.set(r, c, inv.get(r, c) - factor * inv.get(col, c));
                }
            }
        }
        Some(inv)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row: Vec<String> = (0..self.cols).map(|c| format!("{:.6}", self.get(r, c))).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &Matrix, b: &Matrix) -> bool {
        a.data.iter().zip(&b.data).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_pow_diagonal() {
        let k = Matrix::from_rows(vec![vec![0.5, 0.0], vec![0.0, 1.0]]);
        let k3 = k.pow(3);
        assert!((k3.get(0, 0) - 0.125).abs() < 1e-15);
        assert_eq!(k3.get(1, 1), 1.0);
        assert_eq!(k.pow(0), Matrix::identity(2));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = Matrix::from_rows(vec![vec![2.0, 1.0], vec![1.0, 3.0]]);
        let inv = m.inverse().unwrap();
        assert!(approx(&m.mul(&inv), &Matrix::identity(2)));
    }

    #[test]
    fn test_inverse_needs_pivoting() {
        let m = Matrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let inv = m.inverse().unwrap();
        assert!(approx(&inv, &m));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = Matrix::from_rows(vec![vec![0.5, 0.0], vec![0.0, 0.0]]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_mul_vec() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![0.0, 1.0]]);
        assert_eq!(m.mul_vec(&[1.0, 1.0]), vec![3.0, 1.0]);
    }
}
