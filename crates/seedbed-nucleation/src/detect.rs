//! Per-partition candidate detection.

use crate::config::NucleationConfig;
use crate::draws::UniformDraws;
use crate::error::NucleationError;
use crate::nucleus::Nucleus;
use seedbed_core::FieldReader;
use seedbed_mesh::SupportPoint;
use tracing::{debug, warn};

/// Nucleation probability at one point, after suppression and clamping.
pub fn probability_at(
    config: &NucleationConfig,
    fields: &dyn FieldReader,
    dof: usize,
    time: f64,
) -> Result<f64, NucleationError> {
    if config.time_cutoff.is_some_and(|cutoff| time > cutoff) {
        return Ok(0.0);
    }
    for &op in &config.order_parameters {
        if fields.read_dof(op, dof)? > config.suppression_threshold {
            return Ok(0.0);
        }
    }
    let c = fields.read_dof(config.composition, dof)?;
    let j = config.model.probability(c);
    if !j.is_finite() {
        warn!(dof, c, "non-finite nucleation probability clamped to zero");
        return Ok(0.0);
    }
    Ok(j)
}

/// Propose new candidates on the owned points of this partition.
///
/// Points are visited in increasing global id. A point proposes a
/// candidate when its draw does not exceed its probability; the candidate
/// is dropped if it lies within `min_separation` of `prior` or of a
/// candidate proposed earlier in this call. Returns an empty list once
/// `step` is past `active_until_step`.
pub fn detect(
    config: &NucleationConfig,
    points: &[SupportPoint],
    fields: &dyn FieldReader,
    draws: &dyn UniformDraws,
    time: f64,
    step: u64,
) -> Result<Vec<Nucleus>, NucleationError> {
    detect_against(config, points, fields, draws, time, step, &[])
}

/// [`detect`] with previously retained local nuclei blocking new ones.
pub fn detect_against(
    config: &NucleationConfig,
    points: &[SupportPoint],
    fields: &dyn FieldReader,
    draws: &dyn UniformDraws,
    time: f64,
    step: u64,
    prior: &[Nucleus],
) -> Result<Vec<Nucleus>, NucleationError> {
    let mut found: Vec<Nucleus> = Vec::new();
    if step > config.active_until_step {
        return Ok(found);
    }

    let mut owned: Vec<&SupportPoint> = points.iter().filter(|p| p.owned).collect();
    owned.sort_by_key(|p| p.dof);

    let (seeded_time, seeding_time) = config.timing.window(time);
    let mut proposed = 0usize;
    for p in owned {
        let j = probability_at(config, fields, p.dof, time)?;
        if j <= 0.0 || draws.draw(step, p.dof as u64) > j {
            continue;
        }
        proposed += 1;
        let candidate = Nucleus {
            index: prior.len() + found.len(),
            center: p.coords.clone(),
            radius: config.radius,
            seeded_time,
            seeding_time,
            origin: p.dof as u64,
        };
        if candidate.conflicts_with(prior.iter().chain(&found), config.min_separation) {
            continue;
        }
        found.push(candidate);
    }
    debug!(
        step,
        proposed,
        accepted = found.len(),
        "local nucleation candidates"
    );
    Ok(found)
}
