//! Publication: replace the previously published violator set.
//!
//! Delete then insert, two separate store calls. Between them a reader can
//! see an empty set. An insert failure after a successful delete leaves the
//! store empty and is reported as `PriorState::Lost`.

use crate::{
    error::{DetectorError, DetectorResult, PriorState},
    violator::{ViolatorRecord, ViolatorSink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing was computed; the sink was not touched.
    NothingToPublish,
    Published { deleted: usize, inserted: usize },
}

pub fn publish<S: ViolatorSink + ?Sized>(
    sink: &S,
    violators: &[ViolatorRecord],
) -> DetectorResult<PublishOutcome> {
    if violators.is_empty() {
        log::info!("No violators to publish; published set left untouched");
        return Ok(PublishOutcome::NothingToPublish);
    }

    let deleted = sink.delete_all_violators().map_err(|e| DetectorError::PublishFailure {
        prior_state: PriorState::Retained,
        reason: e.to_string(),
    })?;

    let inserted = sink.insert_violators(violators).map_err(|e| DetectorError::PublishFailure {
        prior_state: PriorState::Lost,
        reason: e.to_string(),
    })?;

    log::info!("Published {inserted} violators (replaced {deleted})");
    Ok(PublishOutcome::Published { deleted, inserted })
}
