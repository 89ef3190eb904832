//! Q1 shape functions tabulated at 2-point Gauss quadrature.

/// Gauss abscissae on the unit interval.
fn gauss_points() -> [f64; 2] {
    let off = 0.5 / 3f64.sqrt();
    [0.5 - off, 0.5 + off]
}

fn phi(bit: usize, x: f64) -> f64 {
    if bit == 0 {
        1.0 - x
    } else {
        x
    }
}

fn dphi(bit: usize) -> f64 {
    if bit == 0 {
        -1.0
    } else {
        1.0
    }
}

/// Shape values and physical derivatives at every quadrature point of a
/// uniform axis-aligned cell.
///
/// Vertex `a` and quadrature point `q` are both encoded as bit patterns:
/// bit `d` selects the lower/upper node (or Gauss point) on axis `d`.
#[derive(Clone, Debug)]
pub(crate) struct ShapeTable {
    pub(crate) dim: usize,
    pub(crate) n_v: usize,
    pub(crate) n_q: usize,
    /// `[q][a]`
    pub(crate) values: Vec<f64>,
    /// `[q][a][k]`
    pub(crate) gradients: Vec<f64>,
    /// `[q][a][k][l]`
    pub(crate) hessians: Vec<f64>,
    pub(crate) jxw: f64,
}

impl ShapeTable {
    pub(crate) fn new(dim: usize, spacing: &[f64]) -> Self {
        let n_v = 1usize << dim;
        let n_q = n_v;
        let gp = gauss_points();
        let mut values = vec![0.0; n_q * n_v];
        let mut gradients = vec![0.0; n_q * n_v * dim];
        let mut hessians = vec![0.0; n_q * n_v * dim * dim];

        for q in 0..n_q {
            let xi: Vec<f64> = (0..dim).map(|d| gp[(q >> d) & 1]).collect();
            for a in 0..n_v {
                let bit = |d: usize| (a >> d) & 1;
                // Product of 1D factors, with axes in `skip` differentiated.
                let factor = |skip: &[usize]| -> f64 {
                    (0..dim)
                        .map(|d| {
                            if skip.contains(&d) {
                                dphi(bit(d)) / spacing[d]
                            } else {
                                phi(bit(d), xi[d])
                            }
                        })
                        .product()
                };
                values[q * n_v + a] = factor(&[]);
                for k in 0..dim {
                    gradients[(q * n_v + a) * dim + k] = factor(&[k]);
                    for l in 0..dim {
                        if k != l {
                            hessians[((q * n_v + a) * dim + k) * dim + l] = factor(&[k, l]);
                        }
                    }
                }
            }
        }

        let jxw = spacing[..dim].iter().map(|h| 0.5 * h).product();
        Self {
            dim,
            n_v,
            n_q,
            values,
            gradients,
            hessians,
            jxw,
        }
    }

    pub(crate) fn value(&self, q: usize, a: usize) -> f64 {
        self.values[q * self.n_v + a]
    }

    pub(crate) fn gradient(&self, q: usize, a: usize) -> &[f64] {
        let start = (q * self.n_v + a) * self.dim;
        &self.gradients[start..start + self.dim]
    }

    pub(crate) fn hessian(&self, q: usize, a: usize) -> &[f64] {
        let dd = self.dim * self.dim;
        let start = (q * self.n_v + a) * dd;
        &self.hessians[start..start + dd]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_of_unity_at_every_point() {
        for dim in 1..=3 {
            let t = ShapeTable::new(dim, &[0.5, 2.0, 1.0]);
            for q in 0..t.n_q {
                let sum: f64 = (0..t.n_v).map(|a| t.value(q, a)).sum();
                assert!((sum - 1.0).abs() < 1e-14, "dim {dim} q {q}: {sum}");
                for k in 0..dim {
                    let g: f64 = (0..t.n_v).map(|a| t.gradient(q, a)[k]).sum();
                    assert!(g.abs() < 1e-14);
                }
            }
        }
    }

    #[test]
    fn weights_sum_to_cell_measure() {
        let t = ShapeTable::new(2, &[0.5, 2.0]);
        assert!((t.jxw * t.n_q as f64 - 1.0).abs() < 1e-14);
    }

    #[test]
    fn diagonal_hessian_vanishes() {
        let t = ShapeTable::new(2, &[1.0, 1.0]);
        for q in 0..t.n_q {
            for a in 0..t.n_v {
                let h = t.hessian(q, a);
                assert_eq!(h[0], 0.0);
                assert_eq!(h[3], 0.0);
                assert_eq!(h[1], h[2]);
            }
        }
    }
}
