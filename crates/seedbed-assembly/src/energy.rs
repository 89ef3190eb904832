//! Free-energy accumulation.
//!
//! Each evaluation context (a worker thread, a batch of points) owns its
//! own [`EnergyAccumulator`]; contexts are combined with
//! [`merge`](EnergyAccumulator::merge) once at the end of the cell loop and
//! the partition totals are reduced across ranks once per energy
//! computation.

/// Energy density at one point, split into its additive parts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnergyDensity {
    /// Chemical (bulk) free energy.
    pub chemical: f64,
    /// Gradient (interfacial) energy.
    pub gradient: f64,
    /// Elastic strain energy.
    pub elastic: f64,
}

impl EnergyDensity {
    /// Sum of all parts.
    pub fn total(&self) -> f64 {
        self.chemical + self.gradient + self.elastic
    }
}

/// Integrated energy and its decomposition.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnergyTotals {
    /// `chemical + gradient + elastic`.
    pub total: f64,
    /// Integrated chemical energy.
    pub chemical: f64,
    /// Integrated gradient energy.
    pub gradient: f64,
    /// Integrated elastic energy.
    pub elastic: f64,
}

impl EnergyTotals {
    /// `[total, chemical, gradient, elastic]`, the reduction payload.
    pub fn to_array(&self) -> [f64; 4] {
        [self.total, self.chemical, self.gradient, self.elastic]
    }

    /// Inverse of [`to_array`](Self::to_array).
    pub fn from_array(a: [f64; 4]) -> Self {
        Self {
            total: a[0],
            chemical: a[1],
            gradient: a[2],
            elastic: a[3],
        }
    }
}

/// Process-local running energy totals.
///
/// Points whose tracked variable is at or below `threshold` contribute
/// nothing; this keeps regions outside the active phase from adding
/// spurious energy. Non-finite densities are skipped and counted.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyAccumulator {
    threshold: f64,
    totals: EnergyTotals,
    accepted: usize,
    excluded: usize,
    non_finite: usize,
}

impl EnergyAccumulator {
    /// Threshold used when none is configured.
    pub const DEFAULT_THRESHOLD: f64 = 1e-10;

    /// An empty accumulator with the given negligibility threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            totals: EnergyTotals::default(),
            accepted: 0,
            excluded: 0,
            non_finite: 0,
        }
    }

    /// Add `density * jxw` unless `tracked` is negligible.
    ///
    /// `tracked = None` means the model has no gating variable.
    pub fn add(&mut self, density: &EnergyDensity, jxw: f64, tracked: Option<f64>) {
        if let Some(t) = tracked {
            if t <= self.threshold {
                self.excluded += 1;
                return;
            }
        }
        if !density.total().is_finite() {
            self.non_finite += 1;
            return;
        }
        self.totals.chemical += density.chemical * jxw;
        self.totals.gradient += density.gradient * jxw;
        self.totals.elastic += density.elastic * jxw;
        self.totals.total += density.total() * jxw;
        self.accepted += 1;
    }

    /// Fold another context's totals into this one.
    pub fn merge(&mut self, other: &Self) {
        self.totals.total += other.totals.total;
        self.totals.chemical += other.totals.chemical;
        self.totals.gradient += other.totals.gradient;
        self.totals.elastic += other.totals.elastic;
        self.accepted += other.accepted;
        self.excluded += other.excluded;
        self.non_finite += other.non_finite;
    }

    /// Current totals.
    pub fn totals(&self) -> EnergyTotals {
        self.totals
    }

    /// Points that contributed.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Points skipped by the threshold.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Points skipped for a non-finite density.
    pub fn non_finite(&self) -> usize {
        self.non_finite
    }
}

impl Default for EnergyAccumulator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn density() -> EnergyDensity {
        EnergyDensity {
            chemical: 1.0,
            gradient: 2.0,
            elastic: 3.0,
        }
    }

    #[test]
    fn negligible_tracked_value_contributes_nothing() {
        let mut acc = EnergyAccumulator::default();
        acc.add(&density(), 1.0, Some(1e-12));
        acc.add(&density(), 1.0, Some(1e-10));
        assert_eq!(acc.totals(), EnergyTotals::default());
        assert_eq!(acc.excluded(), 2);
    }

    #[test]
    fn weighted_components_sum_to_total() {
        let mut acc = EnergyAccumulator::default();
        acc.add(&density(), 0.5, Some(0.3));
        acc.add(&density(), 0.25, None);
        let t = acc.totals();
        assert!((t.chemical - 0.75).abs() < 1e-15);
        assert!((t.elastic - 2.25).abs() < 1e-15);
        assert!((t.total - (t.chemical + t.gradient + t.elastic)).abs() < 1e-15);
    }

    #[test]
    fn non_finite_density_is_skipped() {
        let mut acc = EnergyAccumulator::default();
        let bad = EnergyDensity {
            chemical: f64::NAN,
            ..density()
        };
        acc.add(&bad, 1.0, Some(1.0));
        assert_eq!(acc.non_finite(), 1);
        assert_eq!(acc.totals().total, 0.0);
    }

    #[test]
    fn merge_equals_single_pass() {
        let mut single = EnergyAccumulator::default();
        let mut a = EnergyAccumulator::default();
        let mut b = EnergyAccumulator::default();
        for i in 0..10 {
            let w = 0.1 * i as f64;
            single.add(&density(), w, Some(1.0));
            if i % 2 == 0 {
                a.add(&density(), w, Some(1.0));
            } else {
                b.add(&density(), w, Some(1.0));
            }
        }
        a.merge(&b);
        assert_eq!(a.accepted(), single.accepted());
        assert!((a.totals().total - single.totals().total).abs() < 1e-12);
    }
}
