use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::elements::OrbitalElementRecord;
use crate::frames::StationPosition;
use crate::predict::{PassFinder, PassQuery, PassReport, PredictError};

/// Runs one pass search per record on the blocking pool and merges the results into a
/// single time-ordered list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassAggregator {
    finder: PassFinder,
}

impl PassAggregator {
    pub fn new(finder: PassFinder) -> Self {
        Self { finder }
    }

    /// Passes of every record permitted by the query's mode filter, sorted by AOS and then
    /// catalog number.
    ///
    /// A record whose propagation fails is reported in [`PassReport::failures`] without
    /// affecting the others. Cancellation discards everything and returns
    /// [`PredictError::Cancelled`].
    pub async fn compute_passes(
        &self,
        records: &[Arc<OrbitalElementRecord>],
        station: StationPosition,
        query: &PassQuery,
        cancel: &CancellationToken,
    ) -> Result<PassReport, PredictError> {
        let window_end = query.window_end()?;
        let mut tasks = JoinSet::new();
        for record in records {
            if let Some(modes) = &query.modes {
                if !modes.permits(record.norad_id()) {
                    log::debug!("Skipping NORAD {}: no allowed mode", record.norad_id());
                    continue;
                }
            }

            let record = Arc::clone(record);
            let finder = self.finder;
            let cancel = cancel.clone();
            let from = query.reference_time;
            let horizon_hours = query.horizon_hours;
            let min_elevation_deg = query.min_elevation_deg;
            tasks.spawn_blocking(move || {
                finder.find_passes_until_cancelled(
                    &record,
                    &station,
                    from,
                    horizon_hours,
                    min_elevation_deg,
                    &cancel,
                )
            });
        }

        let mut report = PassReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(passes)) => report.passes.extend(passes),
                Ok(Err(PredictError::Cancelled)) => {
                    tasks.abort_all();
                    return Err(PredictError::Cancelled);
                }
                Ok(Err(e)) => {
                    log::warn!("Pass search failed: {}", e);
                    report.failures.push(e);
                }
                Err(e) => {
                    log::error!("Pass search task failed: {}", e);
                    report.failures.push(PredictError::Task(e.to_string()));
                }
            }
        }
        if cancel.is_cancelled() {
            return Err(PredictError::Cancelled);
        }

        report.passes.retain(|pass| {
            pass.los >= query.reference_time
                && pass.aos <= window_end
                && pass.max_elevation_deg > query.min_elevation_deg
        });
        report
            .passes
            .sort_by(|a, b| a.aos.cmp(&b.aos).then(a.norad_id.cmp(&b.norad_id)));

        log::info!(
            "{} pass(es) from {} record(s), {} failure(s)",
            report.passes.len(),
            records.len(),
            report.failures.len()
        );
        Ok(report)
    }
}
