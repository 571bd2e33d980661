//! One detection cycle.
//!
//! STAGE ORDER (fixed, never reordered):
//!   1. Load accounts        (account store; failure aborts the cycle)
//!   2. Extract features     (no usable rows aborts the cycle)
//!   3. Train classifier     (too few rows or divergence aborts the cycle)
//!   4. Load complaints      (failure degrades to an empty set)
//!   5. Score accounts       (failure aborts, nothing is published)
//!   6. Publish              (delete previous set, insert new one)
//!
//! RULES:
//!   - Every cycle starts from a fresh read of the stores.
//!   - The trained model lives only as long as the cycle.
//!   - Nothing is retried inside a cycle.

use crate::{
    account::AccountSource,
    complaints::{load_complaint_addresses, ComplaintAddressSet, ComplaintSource},
    config::DetectorConfig,
    error::DetectorResult,
    features::{self, FeatureSet},
    publisher::{publish, PublishOutcome},
    scorer::{self, ScoringOutput},
    training::{self, TrainedModel, TrainingReport},
    violator::{ViolatorRecord, ViolatorSink},
};

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub accounts_loaded: usize,
    pub usable_rows: usize,
    pub training: TrainingReport,
    pub complaint_addresses: usize,
    pub violators: Vec<ViolatorRecord>,
    /// Mean model confidence over all scored rows. Informational only.
    pub mean_confidence: f64,
    pub publish: PublishOutcome,
}

pub fn run_cycle<S>(session: &S, config: &DetectorConfig) -> DetectorResult<CycleReport>
where
    S: AccountSource + ComplaintSource + ViolatorSink + ?Sized,
{
    let accounts = session.load_accounts()?;
    let accounts_loaded = accounts.len();
    log::info!("Loaded {accounts_loaded} accounts");

    let feature_set = features::extract(accounts, config)?;
    log::info!("{} accounts have enough history to use", feature_set.len());

    let model = training::train(&feature_set.vectors, &feature_set.labels, config)?;

    let complaints = load_complaint_addresses(session);
    log::info!("{} complaint addresses on file", complaints.len());

    let (scored, publish) = score_and_publish(session, &model, &feature_set, &complaints, config)?;
    let mean_confidence = scored.mean_confidence();

    Ok(CycleReport {
        accounts_loaded,
        usable_rows: feature_set.len(),
        training: model.report.clone(),
        complaint_addresses: complaints.len(),
        violators: scored.violators,
        mean_confidence,
        publish,
    })
}

/// Stages 5 and 6. The sink is not touched unless scoring succeeds.
pub fn score_and_publish<S>(
    sink: &S,
    model: &TrainedModel,
    feature_set: &FeatureSet,
    complaints: &ComplaintAddressSet,
    config: &DetectorConfig,
) -> DetectorResult<(ScoringOutput, PublishOutcome)>
where
    S: ViolatorSink + ?Sized,
{
    let scored = scorer::score(model, feature_set, complaints, config)?;
    log::info!(
        "Flagged {} violators (mean model confidence {:.3})",
        scored.violators.len(),
        scored.mean_confidence()
    );
    for v in scored.violators.iter().take(10) {
        log::info!(
            "  id {} | {} | avg {:.2} kWh | {}",
            v.account_id,
            v.address,
            v.avg_consumption_6m,
            v.priority
        );
    }
    if scored.violators.len() > 10 {
        log::info!("  ... and {} more", scored.violators.len() - 10);
    }

    let publish = publish(sink, &scored.violators)?;
    Ok((scored, publish))
}
