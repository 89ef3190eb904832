//! Material constants for the coupled phase-field model.

use crate::elasticity::{Stiffness, Tensor2, VoigtMatrix};
use seedbed_core::MAX_DIM;

// ── Polynomial ──────────────────────────────────────────────────

/// Polynomial in one variable, coefficients in ascending order.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// `Σ coeffs[k]·xᵏ`.
    pub fn new(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    /// Coefficients, ascending.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// `p(x)`.
    pub fn value(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &a| acc * x + a)
    }

    /// `p'(x)`.
    pub fn derivative(&self, x: f64) -> f64 {
        self.coeffs
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .fold(0.0, |acc, (k, &a)| acc * x + k as f64 * a)
    }

    /// `p''(x)`.
    pub fn second_derivative(&self, x: f64) -> f64 {
        self.coeffs
            .iter()
            .enumerate()
            .skip(2)
            .rev()
            .fold(0.0, |acc, (k, &a)| acc * x + (k * (k - 1)) as f64 * a)
    }
}

// ── Interpolation ───────────────────────────────────────────────

/// Interpolation `h(n)` between matrix (`h = 0`) and precipitate (`h = 1`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// `h = n`.
    Linear,
    /// `h = 3n² − 2n³`.
    #[default]
    Cubic,
    /// `h = 10n³ − 15n⁴ + 6n⁵`.
    Quintic,
}

impl Interpolation {
    /// `h(n)`.
    pub fn value(self, n: f64) -> f64 {
        match self {
            Self::Linear => n,
            Self::Cubic => n * n * (3.0 - 2.0 * n),
            Self::Quintic => n * n * n * (10.0 - 15.0 * n + 6.0 * n * n),
        }
    }

    /// `h'(n)`.
    pub fn derivative(self, n: f64) -> f64 {
        match self {
            Self::Linear => 1.0,
            Self::Cubic => 6.0 * n * (1.0 - n),
            Self::Quintic => 30.0 * n * n * (1.0 - n) * (1.0 - n),
        }
    }
}

/// Double-well barrier `g(n) = n²(1 − n)²`.
pub fn barrier(n: f64) -> f64 {
    let m = n * (1.0 - n);
    m * m
}

/// `g'(n) = 2n(1 − n)(1 − 2n)`.
pub fn barrier_derivative(n: f64) -> f64 {
    2.0 * n * (1.0 - n) * (1.0 - 2.0 * n)
}

// ── Order parameters ────────────────────────────────────────────

/// Stress-free transformation strain `ε⁰ = linear·c + constant`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Eigenstrain {
    /// Concentration-proportional part.
    pub linear: Tensor2,
    /// Constant part.
    pub constant: Tensor2,
}

impl Eigenstrain {
    /// Isotropic dilatation `δ_ij·(linear·c + constant)`.
    pub fn dilatational(linear: f64, constant: f64) -> Self {
        let mut e = Self::default();
        for d in 0..MAX_DIM {
            e.linear[d][d] = linear;
            e.constant[d][d] = constant;
        }
        e
    }

    /// `ε⁰(c)`.
    pub fn at(&self, c: f64) -> Tensor2 {
        let mut e = [[0.0; MAX_DIM]; MAX_DIM];
        for i in 0..MAX_DIM {
            for j in 0..MAX_DIM {
                e[i][j] = self.linear[i][j] * c + self.constant[i][j];
            }
        }
        e
    }
}

/// One structural order parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderParameter {
    /// Field name, e.g. `"n1"`.
    pub name: String,
    /// Gradient-energy coefficient tensor `κ`.
    pub gradient_coefficient: Tensor2,
    /// Transformation strain of this variant.
    pub eigenstrain: Eigenstrain,
}

impl OrderParameter {
    /// Order parameter with isotropic gradient coefficient `kappa` and no
    /// transformation strain.
    pub fn isotropic(name: impl Into<String>, kappa: f64) -> Self {
        let mut k = [[0.0; MAX_DIM]; MAX_DIM];
        for (d, row) in k.iter_mut().enumerate() {
            row[d] = kappa;
        }
        Self {
            name: name.into(),
            gradient_coefficient: k,
            eigenstrain: Eigenstrain::default(),
        }
    }

    /// Replace the transformation strain.
    pub fn with_eigenstrain(mut self, eigenstrain: Eigenstrain) -> Self {
        self.eigenstrain = eigenstrain;
        self
    }
}

// ── Elasticity ──────────────────────────────────────────────────

/// Resolved elastic constants.
#[derive(Clone, Debug, PartialEq)]
pub struct ElasticModel {
    /// Matrix-phase stiffness.
    pub matrix: VoigtMatrix,
    /// Precipitate stiffness; equal to `matrix` for homogeneous models.
    pub precipitate: VoigtMatrix,
    /// Whether stiffness varies with `H = Σ h(n_i)`.
    pub heterogeneous: bool,
}

impl ElasticModel {
    /// `C(H) = C_α(1 − H) + C_β·H`.
    pub fn stiffness(&self, h_sum: f64) -> VoigtMatrix {
        if self.heterogeneous {
            self.matrix.lerp(&self.precipitate, h_sum)
        } else {
            self.matrix.clone()
        }
    }
}

// ── MaterialModel ───────────────────────────────────────────────

/// Every constant the coupled kernel needs.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialModel {
    /// Spatial dimension.
    pub dim: usize,
    /// Matrix chemical free energy `f_α(c)`.
    pub matrix_energy: Polynomial,
    /// Precipitate chemical free energy `f_β(c)`.
    pub precipitate_energy: Polynomial,
    /// Double-well height `W`.
    pub barrier_height: f64,
    /// Interpolation `h(n)`.
    pub interpolation: Interpolation,
    /// One entry per variant.
    pub order_parameters: Vec<OrderParameter>,
    /// Elastic constants, if mechanics is coupled.
    pub elasticity: Option<ElasticModel>,
    /// Cahn-Hilliard mobility `M_c`.
    pub mobility_c: f64,
    /// Allen-Cahn mobility `M_n`.
    pub mobility_n: f64,
    /// Time step.
    pub dt: f64,
}

impl MaterialModel {
    /// Create a new builder.
    pub fn builder(dim: usize) -> MaterialModelBuilder {
        MaterialModelBuilder {
            dim,
            matrix_energy: None,
            precipitate_energy: None,
            barrier_height: 0.0,
            interpolation: Interpolation::default(),
            order_parameters: Vec::new(),
            matrix_stiffness: None,
            precipitate_stiffness: None,
            mobility_c: None,
            mobility_n: None,
            dt: None,
        }
    }

    /// Number of order parameters.
    pub fn variant_count(&self) -> usize {
        self.order_parameters.len()
    }
}

/// Builder for [`MaterialModel`].
///
/// Required: both free energies, at least one order parameter, both
/// mobilities and `dt`. Elasticity is optional; supplying only a matrix
/// stiffness gives a homogeneous model.
#[derive(Debug)]
pub struct MaterialModelBuilder {
    dim: usize,
    matrix_energy: Option<Polynomial>,
    precipitate_energy: Option<Polynomial>,
    barrier_height: f64,
    interpolation: Interpolation,
    order_parameters: Vec<OrderParameter>,
    matrix_stiffness: Option<Stiffness>,
    precipitate_stiffness: Option<Stiffness>,
    mobility_c: Option<f64>,
    mobility_n: Option<f64>,
    dt: Option<f64>,
}

impl MaterialModelBuilder {
    /// Matrix chemical free energy, ascending coefficients.
    pub fn matrix_energy(mut self, coeffs: Vec<f64>) -> Self {
        self.matrix_energy = Some(Polynomial::new(coeffs));
        self
    }

    /// Precipitate chemical free energy, ascending coefficients.
    pub fn precipitate_energy(mut self, coeffs: Vec<f64>) -> Self {
        self.precipitate_energy = Some(Polynomial::new(coeffs));
        self
    }

    /// Double-well height.
    pub fn barrier_height(mut self, w: f64) -> Self {
        self.barrier_height = w;
        self
    }

    /// Interpolation function.
    pub fn interpolation(mut self, h: Interpolation) -> Self {
        self.interpolation = h;
        self
    }

    /// Append an order parameter.
    pub fn order_parameter(mut self, op: OrderParameter) -> Self {
        self.order_parameters.push(op);
        self
    }

    /// Matrix-phase stiffness; enables mechanics.
    pub fn matrix_stiffness(mut self, s: Stiffness) -> Self {
        self.matrix_stiffness = Some(s);
        self
    }

    /// Precipitate stiffness; makes stiffness depend on `n`.
    pub fn precipitate_stiffness(mut self, s: Stiffness) -> Self {
        self.precipitate_stiffness = Some(s);
        self
    }

    /// Cahn-Hilliard and Allen-Cahn mobilities.
    pub fn mobilities(mut self, mobility_c: f64, mobility_n: f64) -> Self {
        self.mobility_c = Some(mobility_c);
        self.mobility_n = Some(mobility_n);
        self
    }

    /// Time step.
    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Build the model, validating every constant.
    pub fn build(self) -> Result<MaterialModel, String> {
        if self.dim == 0 || self.dim > MAX_DIM {
            return Err(format!("dimension must be 1..={MAX_DIM}, got {}", self.dim));
        }
        let matrix_energy = self
            .matrix_energy
            .ok_or_else(|| "matrix_energy is required".to_string())?;
        let precipitate_energy = self
            .precipitate_energy
            .ok_or_else(|| "precipitate_energy is required".to_string())?;
        for (name, p) in [("matrix_energy", &matrix_energy), ("precipitate_energy", &precipitate_energy)] {
            if p.coeffs().is_empty() {
                return Err(format!("{name} needs at least one coefficient"));
            }
            if p.coeffs().iter().any(|a| !a.is_finite()) {
                return Err(format!("{name} coefficients must be finite"));
            }
        }
        let mobility_c = self
            .mobility_c
            .ok_or_else(|| "mobilities are required".to_string())?;
        let mobility_n = self
            .mobility_n
            .ok_or_else(|| "mobilities are required".to_string())?;
        let dt = self.dt.ok_or_else(|| "dt is required".to_string())?;

        for (name, v) in [
            ("mobility_c", mobility_c),
            ("mobility_n", mobility_n),
            ("barrier_height", self.barrier_height),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{name} must be finite and >= 0, got {v}"));
            }
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(format!("dt must be finite and > 0, got {dt}"));
        }

        if self.order_parameters.is_empty() {
            return Err("at least one order parameter is required".to_string());
        }
        for (i, op) in self.order_parameters.iter().enumerate() {
            if op.name.is_empty() {
                return Err(format!("order parameter {i} has an empty name"));
            }
            if self.order_parameters[..i].iter().any(|o| o.name == op.name) {
                return Err(format!("order parameter name '{}' is duplicated", op.name));
            }
            let finite = op
                .gradient_coefficient
                .iter()
                .chain(op.eigenstrain.linear.iter())
                .chain(op.eigenstrain.constant.iter())
                .flatten()
                .all(|v| v.is_finite());
            if !finite {
                return Err(format!("order parameter '{}' has non-finite constants", op.name));
            }
        }

        let elasticity = match (self.matrix_stiffness, self.precipitate_stiffness) {
            (None, None) => None,
            (None, Some(_)) => {
                return Err("precipitate_stiffness requires matrix_stiffness".to_string());
            }
            (Some(m), p) => {
                let matrix = VoigtMatrix::from_stiffness(&m, self.dim)?;
                let (precipitate, heterogeneous) = match p {
                    Some(p) => (VoigtMatrix::from_stiffness(&p, self.dim)?, true),
                    None => (matrix.clone(), false),
                };
                Some(ElasticModel {
                    matrix,
                    precipitate,
                    heterogeneous,
                })
            }
        };

        Ok(MaterialModel {
            dim: self.dim,
            matrix_energy,
            precipitate_energy,
            barrier_height: self.barrier_height,
            interpolation: self.interpolation,
            order_parameters: self.order_parameters,
            elasticity,
            mobility_c,
            mobility_n,
            dt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MaterialModelBuilder {
        MaterialModel::builder(2)
            .matrix_energy(vec![0.0, 0.0, 2.0])
            .precipitate_energy(vec![2.0, -4.0, 2.0])
            .barrier_height(1.0)
            .order_parameter(OrderParameter::isotropic("n1", 0.5))
            .mobilities(1.0, 1.0)
            .dt(1e-3)
    }

    #[test]
    fn polynomial_horner_and_derivatives() {
        let p = Polynomial::new(vec![1.0, -2.0, 3.0, 4.0]);
        let x = 0.7;
        let v = 1.0 - 2.0 * x + 3.0 * x * x + 4.0 * x * x * x;
        let d = -2.0 + 6.0 * x + 12.0 * x * x;
        let dd = 6.0 + 24.0 * x;
        assert!((p.value(x) - v).abs() < 1e-12);
        assert!((p.derivative(x) - d).abs() < 1e-12);
        assert!((p.second_derivative(x) - dd).abs() < 1e-12);
    }

    #[test]
    fn interpolations_hit_endpoints() {
        for h in [Interpolation::Linear, Interpolation::Cubic, Interpolation::Quintic] {
            assert_eq!(h.value(0.0), 0.0);
            assert!((h.value(1.0) - 1.0).abs() < 1e-12);
        }
        assert_eq!(Interpolation::Cubic.derivative(0.0), 0.0);
        assert_eq!(Interpolation::Quintic.derivative(1.0), 0.0);
    }

    #[test]
    fn interpolation_derivative_matches_finite_difference() {
        let eps = 1e-6;
        for h in [Interpolation::Linear, Interpolation::Cubic, Interpolation::Quintic] {
            for &n in &[0.1, 0.45, 0.8] {
                let fd = (h.value(n + eps) - h.value(n - eps)) / (2.0 * eps);
                assert!((fd - h.derivative(n)).abs() < 1e-6, "{h:?} at {n}");
            }
        }
        let fd = (barrier(0.3 + eps) - barrier(0.3 - eps)) / (2.0 * eps);
        assert!((fd - barrier_derivative(0.3)).abs() < 1e-8);
    }

    #[test]
    fn build_valid_model() {
        let m = base().build().unwrap();
        assert_eq!(m.variant_count(), 1);
        assert!(m.elasticity.is_none());
    }

    #[test]
    fn missing_constants_rejected() {
        let err = MaterialModel::builder(2)
            .precipitate_energy(vec![0.0])
            .order_parameter(OrderParameter::isotropic("n1", 1.0))
            .mobilities(1.0, 1.0)
            .dt(0.1)
            .build()
            .unwrap_err();
        assert!(err.contains("matrix_energy"));

        let err = MaterialModel::builder(2)
            .matrix_energy(vec![0.0])
            .precipitate_energy(vec![0.0])
            .mobilities(1.0, 1.0)
            .dt(0.1)
            .build()
            .unwrap_err();
        assert!(err.contains("order parameter"));

        let err = base().dt(-1.0).build().unwrap_err();
        assert!(err.contains("dt"));
    }

    #[test]
    fn duplicate_order_parameter_rejected() {
        let err = base()
            .order_parameter(OrderParameter::isotropic("n1", 0.5))
            .build()
            .unwrap_err();
        assert!(err.contains("duplicated"));
    }

    #[test]
    fn elasticity_homogeneous_and_heterogeneous() {
        let iso = Stiffness::Isotropic {
            youngs: 2.5,
            poisson: 0.25,
        };
        let m = base().matrix_stiffness(iso.clone()).build().unwrap();
        let el = m.elasticity.unwrap();
        assert!(!el.heterogeneous);
        assert_eq!(el.stiffness(0.7), el.matrix);

        let hard = Stiffness::Isotropic {
            youngs: 5.0,
            poisson: 0.25,
        };
        let m = base()
            .matrix_stiffness(iso)
            .precipitate_stiffness(hard)
            .build()
            .unwrap();
        let el = m.elasticity.unwrap();
        assert!(el.heterogeneous);
        let mid = el.stiffness(0.5);
        assert!((mid.entry(2, 2) - 1.5).abs() < 1e-12);

        assert!(base()
            .precipitate_stiffness(Stiffness::Voigt(vec![1.0; 9]))
            .build()
            .is_err());
    }

    #[test]
    fn dilatational_eigenstrain() {
        let e = Eigenstrain::dilatational(0.1, 0.01);
        let t = e.at(0.5);
        assert!((t[0][0] - 0.06).abs() < 1e-12);
        assert_eq!(t[0][1], 0.0);
    }
}
