//! Nucleation policies and their configuration.

use seedbed_core::FieldId;

// ── ProbabilityModel ────────────────────────────────────────────

/// Per-point nucleation probability as a function of composition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProbabilityModel {
    /// `J = k1·exp(−k2 / (c − c0))` for `c ≠ c0`, 0 at `c = c0`. Below the
    /// baseline the exponent is positive and `J` can exceed `k1`.
    Exponential {
        /// Prefactor.
        k1: f64,
        /// Activation constant.
        k2: f64,
        /// Baseline composition.
        c0: f64,
    },
    /// `J = c / c_matrix · volume_ratio · rate` for `c > 0`, else 0.
    VolumeFraction {
        /// Rate constant.
        rate: f64,
        /// Matrix composition.
        c_matrix: f64,
        /// Point volume over domain volume.
        volume_ratio: f64,
    },
}

impl ProbabilityModel {
    /// Raw probability for composition `c`. May be non-finite for
    /// degenerate inputs; callers clamp.
    pub fn probability(&self, c: f64) -> f64 {
        match *self {
            Self::Exponential { k1, k2, c0 } => {
                if c == c0 {
                    0.0
                } else {
                    k1 * (-k2 / (c - c0)).exp()
                }
            }
            Self::VolumeFraction {
                rate,
                c_matrix,
                volume_ratio,
            } => {
                if c > 0.0 {
                    c / c_matrix * volume_ratio * rate
                } else {
                    0.0
                }
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Exponential { k1, k2, c0 } => {
                for (name, v) in [("k1", k1), ("k2", k2)] {
                    if !v.is_finite() || v < 0.0 {
                        return Err(format!("{name} must be finite and >= 0, got {v}"));
                    }
                }
                if !c0.is_finite() {
                    return Err(format!("c0 must be finite, got {c0}"));
                }
            }
            Self::VolumeFraction {
                rate,
                c_matrix,
                volume_ratio,
            } => {
                for (name, v) in [("rate", rate), ("volume_ratio", volume_ratio)] {
                    if !v.is_finite() || v < 0.0 {
                        return Err(format!("{name} must be finite and >= 0, got {v}"));
                    }
                }
                if !c_matrix.is_finite() || c_matrix <= 0.0 {
                    return Err(format!("c_matrix must be finite and > 0, got {c_matrix}"));
                }
            }
        }
        Ok(())
    }
}

// ── SeedTiming ──────────────────────────────────────────────────

/// How a candidate's time window is derived from its detection time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeedTiming {
    /// `seeded_time = t`, `seeding_time = window`.
    AtDetection {
        /// Window length.
        window: f64,
    },
    /// `seeded_time = 0`, `seeding_time = t + extra`.
    FromOrigin {
        /// Window extension past the detection time.
        extra: f64,
    },
}

impl SeedTiming {
    /// `(seeded_time, seeding_time)` for a candidate detected at `t`.
    pub fn window(&self, t: f64) -> (f64, f64) {
        match *self {
            Self::AtDetection { window } => (t, window),
            Self::FromOrigin { extra } => (0.0, t + extra),
        }
    }
}

// ── SeedProfile ─────────────────────────────────────────────────

/// Shape of the order parameter written around a nucleus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedProfile {
    /// Width of the tanh interface.
    pub interface_width: f64,
    /// Reach past the radius within which points are written.
    pub margin: f64,
}

impl SeedProfile {
    /// Profile value at distance `r` from a nucleus of `radius`, or `None`
    /// when `r` is beyond `radius + margin`.
    pub fn value(&self, r: f64, radius: f64) -> Option<f64> {
        (r <= radius + self.margin)
            .then(|| 0.5 * (1.0 - ((r - radius) / self.interface_width).tanh()))
    }
}

// ── LocalHistory ────────────────────────────────────────────────

/// Whether a partition's candidates outlive the step that found them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocalHistory {
    /// Candidates are discarded after each step.
    PerStep,
    /// Candidates are kept and re-reconciled every step. The list only
    /// grows, and an expired candidate still blocks its neighborhood.
    #[default]
    Retain,
    /// Candidates are kept until their seeding window has closed
    /// (`t >= seeded_time + seeding_time`), then dropped before detection.
    UntilExpired,
}

// ── NucleationConfig ────────────────────────────────────────────

/// Everything the nucleation subsystem needs, validated.
#[derive(Clone, Debug, PartialEq)]
pub struct NucleationConfig {
    /// Composition field the probability model reads.
    pub composition: FieldId,
    /// Order parameters whose presence suppresses nucleation.
    pub order_parameters: Vec<FieldId>,
    /// Order parameter the seeder writes.
    pub seeded_field: FieldId,
    /// Probability model.
    pub model: ProbabilityModel,
    /// Radius of every new nucleus.
    pub radius: f64,
    /// Minimum center-to-center distance between nuclei.
    pub min_separation: f64,
    /// Time window policy.
    pub timing: SeedTiming,
    /// Seeded profile.
    pub profile: SeedProfile,
    /// Candidate lifetime.
    pub history: LocalHistory,
    /// Last step index at which detection runs.
    pub active_until_step: u64,
    /// Time past which the probability is forced to zero.
    pub time_cutoff: Option<f64>,
    /// Order-parameter value above which a point is already transformed.
    pub suppression_threshold: f64,
    /// Base seed of the per-point draws.
    pub seed: u64,
}

impl NucleationConfig {
    /// Default suppression threshold.
    pub const DEFAULT_SUPPRESSION: f64 = 1.0e-6;

    /// Create a new builder.
    pub fn builder() -> NucleationConfigBuilder {
        NucleationConfigBuilder {
            composition: None,
            order_parameters: Vec::new(),
            seeded_field: None,
            model: None,
            radius: None,
            min_separation: None,
            timing: None,
            profile: None,
            history: LocalHistory::default(),
            active_until_step: u64::MAX,
            time_cutoff: None,
            suppression_threshold: Self::DEFAULT_SUPPRESSION,
            seed: 0,
        }
    }

    /// Every field the subsystem reads or writes.
    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        std::iter::once(self.composition)
            .chain(self.order_parameters.iter().copied())
            .chain(std::iter::once(self.seeded_field))
    }
}

/// Builder for [`NucleationConfig`].
///
/// Required: `composition`, at least one order parameter, `model`,
/// `radius` and `timing`. `min_separation` defaults to four radii, the
/// seeded field to the first order parameter and the profile to
/// [`NucleationConfigBuilder::default_profile`].
#[derive(Debug)]
pub struct NucleationConfigBuilder {
    composition: Option<FieldId>,
    order_parameters: Vec<FieldId>,
    seeded_field: Option<FieldId>,
    model: Option<ProbabilityModel>,
    radius: Option<f64>,
    min_separation: Option<f64>,
    timing: Option<SeedTiming>,
    profile: Option<SeedProfile>,
    history: LocalHistory,
    active_until_step: u64,
    time_cutoff: Option<f64>,
    suppression_threshold: f64,
    seed: u64,
}

impl NucleationConfigBuilder {
    /// Set the composition field.
    pub fn composition(mut self, field: FieldId) -> Self {
        self.composition = Some(field);
        self
    }

    /// Append a suppressing order parameter.
    pub fn order_parameter(mut self, field: FieldId) -> Self {
        self.order_parameters.push(field);
        self
    }

    /// Set the field the seeder writes.
    pub fn seeded_field(mut self, field: FieldId) -> Self {
        self.seeded_field = Some(field);
        self
    }

    /// Set the probability model.
    pub fn model(mut self, model: ProbabilityModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the nucleus radius.
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Set the minimum separation.
    pub fn min_separation(mut self, d: f64) -> Self {
        self.min_separation = Some(d);
        self
    }

    /// Set the time window policy.
    pub fn timing(mut self, timing: SeedTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Set the seeded profile.
    pub fn profile(mut self, profile: SeedProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Set the candidate lifetime.
    pub fn history(mut self, history: LocalHistory) -> Self {
        self.history = history;
        self
    }

    /// Set the last step at which detection runs.
    pub fn active_until_step(mut self, step: u64) -> Self {
        self.active_until_step = step;
        self
    }

    /// Force `J = 0` after time `t`.
    pub fn time_cutoff(mut self, t: f64) -> Self {
        self.time_cutoff = Some(t);
        self
    }

    /// Set the suppression threshold.
    pub fn suppression_threshold(mut self, v: f64) -> Self {
        self.suppression_threshold = v;
        self
    }

    /// Set the draw seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The profile used when none is set: a tanh interface of width
    /// `0.16·radius` written out to twice the radius.
    pub fn default_profile(radius: f64) -> SeedProfile {
        SeedProfile {
            interface_width: 0.16 * radius,
            margin: radius,
        }
    }

    /// Build the configuration, validating every value.
    pub fn build(self) -> Result<NucleationConfig, String> {
        let composition = self
            .composition
            .ok_or_else(|| "composition is required".to_string())?;
        let first = *self
            .order_parameters
            .first()
            .ok_or_else(|| "at least one order parameter is required".to_string())?;
        let model = self.model.ok_or_else(|| "model is required".to_string())?;
        model.validate()?;
        let radius = self.radius.ok_or_else(|| "radius is required".to_string())?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(format!("radius must be finite and > 0, got {radius}"));
        }
        let min_separation = self.min_separation.unwrap_or(4.0 * radius);
        if !min_separation.is_finite() || min_separation < 0.0 {
            return Err(format!(
                "min_separation must be finite and >= 0, got {min_separation}"
            ));
        }
        let timing = self.timing.ok_or_else(|| "timing is required".to_string())?;
        let span = match timing {
            SeedTiming::AtDetection { window } => ("window", window),
            SeedTiming::FromOrigin { extra } => ("extra", extra),
        };
        if !span.1.is_finite() || span.1 < 0.0 {
            return Err(format!("{} must be finite and >= 0, got {}", span.0, span.1));
        }
        let profile = self
            .profile
            .unwrap_or_else(|| NucleationConfigBuilder::default_profile(radius));
        if !profile.interface_width.is_finite() || profile.interface_width <= 0.0 {
            return Err(format!(
                "interface_width must be finite and > 0, got {}",
                profile.interface_width
            ));
        }
        if !profile.margin.is_finite() || profile.margin < 0.0 {
            return Err(format!(
                "margin must be finite and >= 0, got {}",
                profile.margin
            ));
        }
        if let Some(t) = self.time_cutoff {
            if t.is_nan() {
                return Err("time_cutoff must not be NaN".to_string());
            }
        }
        if !self.suppression_threshold.is_finite() || self.suppression_threshold < 0.0 {
            return Err(format!(
                "suppression_threshold must be finite and >= 0, got {}",
                self.suppression_threshold
            ));
        }

        Ok(NucleationConfig {
            composition,
            seeded_field: self.seeded_field.unwrap_or(first),
            order_parameters: self.order_parameters,
            model,
            radius,
            min_separation,
            timing,
            profile,
            history: self.history,
            active_until_step: self.active_until_step,
            time_cutoff: self.time_cutoff,
            suppression_threshold: self.suppression_threshold,
            seed: self.seed,
        })
    }
}
