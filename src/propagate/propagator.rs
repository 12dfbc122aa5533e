use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::elements::OrbitalElementRecord;
use crate::propagate::PropagationError;

/// WGS-84 equatorial radius, the surface a perigee must stay above.
pub const EARTH_RADIUS_KM: f64 = 6378.137;
pub const MU_KM3_S2: f64 = 398_600.4418;

/// TEME position/velocity of one record at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropagationState {
    pub at: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl PropagationState {
    pub fn radius_km(&self) -> f64 {
        norm(self.position_km)
    }

    /// Height above the equatorial radius, not the ellipsoid.
    pub fn altitude_km(&self) -> f64 {
        self.radius_km() - EARTH_RADIUS_KM
    }

    /// Perigee radius of the osculating two-body orbit; `None` if the orbit is not elliptic.
    pub fn osculating_perigee_km(&self) -> Option<f64> {
        let r = self.position_km;
        let v = self.velocity_km_s;
        let r_mag = norm(r);
        let v_sq = dot(v, v);

        let energy = v_sq / 2.0 - MU_KM3_S2 / r_mag;
        if energy >= 0.0 {
            return None;
        }
        let semi_major_axis = -MU_KM3_S2 / (2.0 * energy);

        let h = cross(r, v);
        let v_cross_h = cross(v, h);
        let e_vec = [
            v_cross_h[0] / MU_KM3_S2 - r[0] / r_mag,
            v_cross_h[1] / MU_KM3_S2 - r[1] / r_mag,
            v_cross_h[2] / MU_KM3_S2 - r[2] / r_mag,
        ];
        Some(semi_major_axis * (1.0 - norm(e_vec)))
    }
}

/// Propagate `record` to `at` with SGP4 (near-earth) or SDP4 (deep-space).
///
/// The regime was fixed when the record was built; the model constants carry the drag,
/// zonal harmonic and (for deep-space objects) lunar/solar and resonance terms.
pub fn propagate(
    record: &OrbitalElementRecord,
    at: DateTime<Utc>,
) -> Result<PropagationState, PropagationError> {
    let minutes = record.minutes_since_epoch(at);

    let prediction = record
        .constants()
        .propagate(sgp4::MinutesSinceEpoch(minutes))
        .map_err(|e| classify(e, minutes))?;

    let state = PropagationState {
        at,
        position_km: prediction.position,
        velocity_km_s: prediction.velocity,
    };

    if state.position_km.iter().chain(&state.velocity_km_s).any(|c| !c.is_finite()) {
        return Err(PropagationError::Divergence {
            minutes,
            reason: "non-finite state vector".into(),
        });
    }

    let radius = state.radius_km();
    if radius < EARTH_RADIUS_KM {
        return Err(PropagationError::DecayedOrbit {
            minutes,
            perigee_km: radius,
        });
    }

    match state.osculating_perigee_km() {
        Some(perigee_km) if perigee_km < EARTH_RADIUS_KM => {
            Err(PropagationError::DecayedOrbit { minutes, perigee_km })
        }
        Some(_) => Ok(state),
        None => Err(PropagationError::Divergence {
            minutes,
            reason: "osculating orbit is not elliptic".into(),
        }),
    }
}

fn classify(err: sgp4::Error, minutes: f64) -> PropagationError {
    match err {
        // the semi-latus rectum collapses when drag has eaten the orbit
        sgp4::Error::NegativeSemiLatusRectum { .. } => {
            log::debug!("model reports decay at {:.1} min: {}", minutes, err);
            PropagationError::DecayedOrbit {
                minutes,
                perigee_km: 0.0,
            }
        }
        other => PropagationError::Divergence {
            minutes,
            reason: other.to_string(),
        },
    }
}

pub(crate) fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
