//! Classifier training: standardise, split, fit.
//!
//! The scaler and the network are fitted together and only ever handed out
//! together as a `TrainedModel`, so a network can never see rows scaled by
//! someone else's scaler.

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::ElementConversion,
};

use crate::{
    config::DetectorConfig,
    error::{DetectorError, DetectorResult, Stage},
    features::{FeatureVector, FEATURE_COUNT},
    network::{input_tensor, target_tensor, tensor_values, Classifier},
    rng::{StreamRng, StreamSlot},
    scaler::FeatureScaler,
};

type TrainBackend = Autodiff<NdArray>;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub validation_rows: usize,
    pub epochs: usize,
    pub final_train_loss: f64,
    pub validation_loss: f64,
    pub validation_accuracy: f64,
}

#[derive(Debug, Clone)]
pub struct TrainedModel {
    scaler: FeatureScaler,
    classifier: Classifier<NdArray>,
    device: NdArrayDevice,
    pub report: TrainingReport,
}

impl TrainedModel {
    /// Confidence in [0, 1] per row that the account is commercial.
    pub fn predict_all(&self, features: &[FeatureVector]) -> DetectorResult<Vec<f64>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<[f64; FEATURE_COUNT]> =
            features.iter().map(|f| self.scaler.transform(&f.as_array())).collect();
        let probs = self.classifier.probabilities(input_tensor(&rows, &self.device));
        tensor_values(probs).map_err(DetectorError::ScoringFailure)
    }
}

/// Seeded 80/20 style partition. Returns (train, validation) row indices.
/// Validation gets `ceil(fraction * n)` rows.
pub fn partition(n: usize, fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    StreamRng::new(seed, StreamSlot::Partition).shuffle(&mut indices);
    let n_valid = ((n as f64) * fraction).ceil() as usize;
    let n_valid = n_valid.min(n.saturating_sub(1));
    let validation = indices.split_off(n - n_valid);
    (indices, validation)
}

pub fn train(
    vectors: &[FeatureVector],
    labels: &[u8],
    config: &DetectorConfig,
) -> DetectorResult<TrainedModel> {
    config.validate()?;
    if vectors.len() != labels.len() {
        return Err(DetectorError::TrainingFailure(format!(
            "{} feature rows but {} labels",
            vectors.len(),
            labels.len()
        )));
    }
    if vectors.len() < config.min_training_rows {
        return Err(DetectorError::InsufficientData {
            stage: Stage::Train,
            found: vectors.len(),
            required: config.min_training_rows,
        });
    }

    let rows: Vec<[f64; FEATURE_COUNT]> = vectors.iter().map(FeatureVector::as_array).collect();
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(DetectorError::TrainingFailure("non-finite feature value".into()));
    }
    let scaler = FeatureScaler::fit(&rows);
    let scaled = scaler.transform_all(&rows);

    let (train_idx, valid_idx) = partition(scaled.len(), config.validation_fraction, config.seed);

    let device = NdArrayDevice::default();
    let mut init_rng = StreamRng::new(config.seed, StreamSlot::WeightInit);
    let mut order_rng = StreamRng::new(config.seed, StreamSlot::BatchOrder);
    let mut model: Classifier<TrainBackend> =
        Classifier::new(config.hidden_1, config.hidden_2, &mut init_rng, &device);
    let mut optimizer = AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-7)
        .init();
    let loss_fn = BinaryCrossEntropyLossConfig::new().with_logits(true).init(&device);

    let mut final_train_loss = f64::NAN;
    let mut order = train_idx.clone();
    for epoch in 0..config.epochs {
        order_rng.shuffle(&mut order);
        let mut epoch_loss = 0.0;
        let mut batches = 0usize;
        for chunk in order.chunks(config.batch_size) {
            let xs: Vec<[f64; FEATURE_COUNT]> = chunk.iter().map(|&i| scaled[i]).collect();
            let ys: Vec<u8> = chunk.iter().map(|&i| labels[i]).collect();

            let logits = model.forward(input_tensor(&xs, &device));
            let loss = loss_fn.forward(logits, target_tensor(&ys, &device));
            epoch_loss += loss.clone().into_scalar().elem::<f64>();
            batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }
        final_train_loss = epoch_loss / batches.max(1) as f64;
        if !final_train_loss.is_finite() {
            return Err(DetectorError::TrainingFailure(format!(
                "numerical divergence at epoch {epoch}"
            )));
        }
        log::trace!("epoch {epoch}: loss {final_train_loss:.5}");
    }

    let classifier = model.valid();
    let (validation_loss, validation_accuracy) =
        evaluate(&classifier, &scaled, labels, &valid_idx, &device)?;

    let report = TrainingReport {
        train_rows: train_idx.len(),
        validation_rows: valid_idx.len(),
        epochs: config.epochs,
        final_train_loss,
        validation_loss,
        validation_accuracy,
    };
    log::info!(
        "Trained classifier {:?} on {} rows ({} held out): loss {:.4}, validation accuracy {:.3}",
        classifier.layer_widths(),
        report.train_rows,
        report.validation_rows,
        report.final_train_loss,
        report.validation_accuracy,
    );

    Ok(TrainedModel { scaler, classifier, device, report })
}

/// Mean BCE and accuracy at a 0.5 cut over the held-out rows.
fn evaluate(
    classifier: &Classifier<NdArray>,
    scaled: &[[f64; FEATURE_COUNT]],
    labels: &[u8],
    indices: &[usize],
    device: &NdArrayDevice,
) -> DetectorResult<(f64, f64)> {
    if indices.is_empty() {
        return Ok((0.0, 0.0));
    }
    let xs: Vec<[f64; FEATURE_COUNT]> = indices.iter().map(|&i| scaled[i]).collect();
    let ys: Vec<u8> = indices.iter().map(|&i| labels[i]).collect();

    let logits = classifier.forward(input_tensor(&xs, device));
    let loss_fn = BinaryCrossEntropyLossConfig::new().with_logits(true).init(device);
    let loss = loss_fn
        .forward(logits.clone(), target_tensor(&ys, device))
        .into_scalar()
        .elem::<f64>();

    let probs = tensor_values(burn::tensor::activation::sigmoid(logits))
        .map_err(DetectorError::TrainingFailure)?;
    let correct = probs.iter().zip(&ys).filter(|(p, y)| (**p >= 0.5) == (**y == 1)).count();
    Ok((loss, correct as f64 / ys.len() as f64))
}
