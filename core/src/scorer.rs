//! Violator scoring.
//!
//! Decision order per account, first match wins:
//!   1. Declared commercial          → never a violator.
//!   2. Address has a complaint      → yellow.
//!   3. Review is under_review / no  → red above the red threshold, else yellow.
//!   4. Review unset                 → only above the inclusion threshold;
//!                                     red above the red threshold, else yellow.
//!   5. Any other review value       → already cleared, excluded.
//!
//! The classifier's confidence is computed for every row and reported, but
//! it does not take part in the decision.

use crate::{
    complaints::ComplaintAddressSet,
    config::DetectorConfig,
    error::{DetectorError, DetectorResult},
    features::{FeatureSet, FeatureVector},
    training::TrainedModel,
    types::{Priority, ReviewStatus},
    violator::ViolatorRecord,
};

#[derive(Debug, Clone)]
pub struct ScoringOutput {
    pub violators: Vec<ViolatorRecord>,
    /// Model confidence per input row, index-aligned with the feature set.
    pub confidences: Vec<f64>,
}

impl ScoringOutput {
    /// Informational only; 0 when nothing was scored.
    pub fn mean_confidence(&self) -> f64 {
        if self.confidences.is_empty() {
            0.0
        } else {
            self.confidences.iter().sum::<f64>() / self.confidences.len() as f64
        }
    }
}

/// Decide one account. `None` means not a violator.
pub fn decide(
    is_commercial: bool,
    review: Option<&ReviewStatus>,
    address: &str,
    features: &FeatureVector,
    complaints: &ComplaintAddressSet,
    config: &DetectorConfig,
) -> Option<(Priority, String)> {
    if is_commercial {
        return None;
    }

    let avg = features.avg_recent;
    let tier = if avg > config.red_threshold { Priority::Red } else { Priority::Yellow };

    if complaints.contains(address) {
        let status = match review {
            Some(r) if !r.is_blank() => r.as_str().to_string(),
            _ => "no".to_string(),
        };
        return Some((Priority::Yellow, status));
    }

    match review {
        Some(status @ (ReviewStatus::UnderReview | ReviewStatus::No)) => {
            Some((tier, status.as_str().to_string()))
        }
        None if avg > config.inclusion_threshold => Some((tier, "no".to_string())),
        None => None,
        Some(ReviewStatus::Cleared(_)) => None,
    }
}

pub fn score(
    model: &TrainedModel,
    features: &FeatureSet,
    complaints: &ComplaintAddressSet,
    config: &DetectorConfig,
) -> DetectorResult<ScoringOutput> {
    let n = features.vectors.len();
    if features.labels.len() != n || features.addresses.len() != n || features.records.len() != n {
        return Err(DetectorError::ScoringFailure(format!(
            "misaligned inputs: {} vectors, {} labels, {} addresses, {} records",
            n,
            features.labels.len(),
            features.addresses.len(),
            features.records.len()
        )));
    }

    let confidences = model.predict_all(&features.vectors)?;
    if let Some(i) = confidences.iter().position(|p| !p.is_finite()) {
        return Err(DetectorError::ScoringFailure(format!(
            "non-finite prediction for account {}",
            features.records[i].account_id
        )));
    }

    let mut violators = Vec::new();
    for i in 0..n {
        let record = &features.records[i];
        let vector = &features.vectors[i];
        let address = &features.addresses[i];
        let commercial = features.labels[i] == 1;

        if let Some((priority, is_checked)) =
            decide(commercial, record.is_checked.as_ref(), address, vector, complaints, config)
        {
            log::debug!(
                "Account {} flagged {priority} (avg {:.1}, model confidence {:.3})",
                record.account_id,
                vector.avg_recent,
                confidences[i]
            );
            violators.push(ViolatorRecord {
                account_id: record.account_id,
                address: address.clone(),
                priority,
                is_checked,
                avg_consumption_6m: vector.avg_recent,
            });
        }
    }

    Ok(ScoringOutput { violators, confidences })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{account::AccountRecord, error::Stage, training::train};

    fn aligned_set(n: usize) -> FeatureSet {
        let mut set = FeatureSet::default();
        for i in 0..n {
            let commercial = i % 3 == 0;
            let avg = if commercial { 9_000.0 } else { 500.0 } + i as f64;
            set.vectors.push(FeatureVector {
                avg_recent: avg,
                max_recent: avg,
                residents: if commercial { 0.0 } else { 2.0 },
                rooms: 2.0,
                area: 50.0,
            });
            set.labels.push(u8::from(commercial));
            set.addresses.push(format!("House {i}"));
            set.records.push(AccountRecord::new(i as i64));
        }
        set
    }

    fn vector(avg: f64) -> FeatureVector {
        FeatureVector { avg_recent: avg, max_recent: avg, residents: 0.0, rooms: 0.0, area: 0.0 }
    }

    fn run(review: Option<ReviewStatus>, avg: f64) -> Option<(Priority, String)> {
        decide(
            false,
            review.as_ref(),
            "Y",
            &vector(avg),
            &ComplaintAddressSet::default(),
            &DetectorConfig::default(),
        )
    }

    #[test]
    fn misaligned_inputs_are_a_scoring_failure() {
        let config = DetectorConfig::default_test();
        let complaints = ComplaintAddressSet::default();
        let mut set = aligned_set(12);
        let model = train(&set.vectors, &set.labels, &config).unwrap();

        let scored = score(&model, &set, &complaints, &config).unwrap();
        assert_eq!(scored.confidences.len(), 12);

        set.records.pop();
        let err = score(&model, &set, &complaints, &config).unwrap_err();
        assert!(matches!(err, DetectorError::ScoringFailure(_)), "{err:?}");
        assert_eq!(err.stage(), Stage::Score);
    }

    #[test]
    fn commercial_accounts_never_flagged() {
        let complaints: ComplaintAddressSet = ["X"].into_iter().collect();
        let config = DetectorConfig::default();
        assert!(decide(true, Some(&ReviewStatus::No), "X", &vector(10_000.0), &complaints, &config).is_none());
    }

    #[test]
    fn complaint_address_is_always_yellow() {
        let complaints: ComplaintAddressSet = ["X"].into_iter().collect();
        let config = DetectorConfig::default();
        for avg in [0.0, 10_000.0] {
            let cleared = ReviewStatus::Cleared("yes".into());
            let got = decide(false, Some(&cleared), "X", &vector(avg), &complaints, &config);
            assert_eq!(got, Some((Priority::Yellow, "yes".into())));
            let got = decide(false, None, "X", &vector(avg), &complaints, &config);
            assert_eq!(got, Some((Priority::Yellow, "no".into())));
        }
    }

    #[test]
    fn blank_review_marker_publishes_as_no_on_complaint() {
        let complaints: ComplaintAddressSet = ["X"].into_iter().collect();
        let config = DetectorConfig::default();
        for raw in ["", "   "] {
            let blank = ReviewStatus::parse(raw);
            let got = decide(false, Some(&blank), "X", &vector(100.0), &complaints, &config);
            assert_eq!(got, Some((Priority::Yellow, "no".into())), "raw {raw:?}");
        }
    }

    #[test]
    fn blank_review_marker_without_complaint_is_not_unset() {
        assert_eq!(run(Some(ReviewStatus::parse("")), 9_000.0), None);
    }

    #[test]
    fn red_threshold_is_strict() {
        assert_eq!(run(Some(ReviewStatus::No), 6_000.0), Some((Priority::Yellow, "no".into())));
        assert_eq!(run(Some(ReviewStatus::No), 6_000.01), Some((Priority::Red, "no".into())));
        assert_eq!(
            run(Some(ReviewStatus::UnderReview), 100.0),
            Some((Priority::Yellow, "under_review".into()))
        );
    }

    #[test]
    fn unset_review_needs_inclusion_threshold() {
        assert_eq!(run(None, 3_000.0), None);
        assert_eq!(run(None, 3_000.01), Some((Priority::Yellow, "no".into())));
        assert_eq!(run(None, 7_000.0), Some((Priority::Red, "no".into())));
    }

    #[test]
    fn cleared_accounts_are_excluded() {
        assert_eq!(run(Some(ReviewStatus::Cleared("checked".into())), 9_000.0), None);
    }
}
