//! Account feature extraction.
//!
//! Turns raw account records into fixed-width numeric vectors plus a
//! commercial / non-commercial label. Records with too short a history are
//! dropped from both training and scoring.

use crate::{
    account::AccountRecord,
    config::DetectorConfig,
    error::{DetectorError, DetectorResult, Stage},
};

pub const FEATURE_COUNT: usize = 5;

/// `[avg6, max6, residents, rooms, area]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub avg_recent: f64,
    pub max_recent: f64,
    pub residents: f64,
    pub rooms: f64,
    pub area: f64,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [self.avg_recent, self.max_recent, self.residents, self.rooms, self.area]
    }
}

/// Parallel, index-aligned outputs of extraction.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub vectors: Vec<FeatureVector>,
    pub labels: Vec<u8>,
    pub addresses: Vec<String>,
    pub records: Vec<AccountRecord>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn matrix(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.vectors.iter().map(FeatureVector::as_array).collect()
    }
}

/// Build the feature vector for one record, or None if it does not qualify.
pub fn feature_vector(record: &AccountRecord, config: &DetectorConfig) -> Option<FeatureVector> {
    let readings = match &record.consumption {
        Some(history) => match history.readings() {
            Some(r) => r,
            None => {
                log::warn!(
                    "Account {}: non-numeric consumption reading, skipped",
                    record.account_id
                );
                return None;
            }
        },
        None => return None,
    };
    if readings.len() < config.min_history {
        return None;
    }

    let recent = &readings[readings.len().saturating_sub(config.window)..];
    let avg_recent = recent.iter().sum::<f64>() / recent.len() as f64;
    let max_recent = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(FeatureVector {
        avg_recent,
        max_recent,
        residents: record.residents_count.unwrap_or(0) as f64,
        rooms: record.rooms_count.unwrap_or(0) as f64,
        area: record.total_area.unwrap_or(0.0),
    })
}

/// Extract features for every qualifying record, preserving input order.
///
/// Fails with `InsufficientData` when nothing survives filtering.
pub fn extract(records: Vec<AccountRecord>, config: &DetectorConfig) -> DetectorResult<FeatureSet> {
    let total = records.len();
    let mut set = FeatureSet::default();

    for record in records {
        let Some(vector) = feature_vector(&record, config) else {
            continue;
        };
        set.vectors.push(vector);
        set.labels.push(u8::from(record.is_commercial()));
        set.addresses.push(record.address_or_empty().to_string());
        set.records.push(record);
    }

    log::debug!("Feature extraction: {} of {} accounts usable", set.len(), total);

    if set.is_empty() {
        return Err(DetectorError::InsufficientData {
            stage: Stage::Extract,
            found: 0,
            required: 1,
        });
    }
    Ok(set)
}
