use std::fmt;
use thiserror::Error;

/// Pipeline stage an error originated in. Used for log context only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Train,
    Complaints,
    Score,
    Publish,
    Store,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Extract    => "extract",
            Self::Train      => "train",
            Self::Complaints => "complaints",
            Self::Score      => "score",
            Self::Publish    => "publish",
            Self::Store      => "store",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to the previously published violator set when a publish failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorState {
    Retained,
    Lost,
}

impl fmt::Display for PriorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retained => f.write_str("prior state retained"),
            Self::Lost     => f.write_str("prior state lost"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: &'static str, reason: String },

    #[error("Insufficient data for {stage}: {found} usable rows, need {required}")]
    InsufficientData { stage: Stage, found: usize, required: usize },

    #[error("Training failure: {0}")]
    TrainingFailure(String),

    #[error("Scoring failure: {0}")]
    ScoringFailure(String),

    #[error("Publish failed, {prior_state}: {reason}")]
    PublishFailure { prior_state: PriorState, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid fields: {0:?}")]
    InvalidFields(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DetectorError {
    /// The pipeline stage this failure is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::SourceUnavailable { source_name, .. } if *source_name == "complaint store" => {
                Stage::Complaints
            }
            Self::SourceUnavailable { .. }       => Stage::Extract,
            Self::InsufficientData { stage, .. } => *stage,
            Self::TrainingFailure(_)             => Stage::Train,
            Self::ScoringFailure(_)              => Stage::Score,
            Self::PublishFailure { .. }          => Stage::Publish,
            _                                    => Stage::Store,
        }
    }
}

pub type DetectorResult<T> = Result<T, DetectorError>;
