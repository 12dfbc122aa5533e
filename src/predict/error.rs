use thiserror::Error;

use crate::propagate::PropagationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("propagation failed for NORAD {norad_id}: {source}")]
    Propagation {
        norad_id: u32,
        #[source]
        source: PropagationError,
    },
    #[error("search horizon of {0} hours ends beyond the supported calendar")]
    HorizonOutOfRange(u32),
    #[error("pass search cancelled")]
    Cancelled,
    #[error("pass search task failed: {0}")]
    Task(String),
}
