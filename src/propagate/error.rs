use thiserror::Error;

/// Failure of a single propagation. Does not invalidate the record for other instants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("orbit decayed {minutes:.1} min from epoch (perigee radius {perigee_km:.1} km)")]
    DecayedOrbit { minutes: f64, perigee_km: f64 },
    #[error("propagation diverged {minutes:.1} min from epoch: {reason}")]
    Divergence { minutes: f64, reason: String },
}
