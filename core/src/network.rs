//! The commercial-account classifier: a small feed-forward network built on
//! `burn`. Two ReLU hidden layers and one output unit. `forward` yields
//! logits, `probabilities` applies the sigmoid.

use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig, Relu},
    prelude::*,
    tensor::{activation::sigmoid, TensorData},
};

use crate::{features::FEATURE_COUNT, rng::StreamRng};

#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    hidden_1: Linear<B>,
    hidden_2: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> Classifier<B> {
    /// Weights are drawn from `rng`, never from the backend's global RNG.
    pub fn new(hidden_1: usize, hidden_2: usize, rng: &mut StreamRng, device: &B::Device) -> Self {
        Self {
            hidden_1: glorot_linear(FEATURE_COUNT, hidden_1, rng, device),
            hidden_2: glorot_linear(hidden_1, hidden_2, rng, device),
            output: glorot_linear(hidden_2, 1, rng, device),
            activation: Relu::new(),
        }
    }

    /// `[batch, FEATURE_COUNT]` in, `[batch, 1]` logits out.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.hidden_1.forward(input));
        let x = self.activation.forward(self.hidden_2.forward(x));
        self.output.forward(x)
    }

    /// Probability in [0, 1] per row that the account is commercial.
    pub fn probabilities(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.forward(input))
    }

    pub fn layer_widths(&self) -> [usize; 3] {
        [
            self.hidden_1.weight.dims()[1],
            self.hidden_2.weight.dims()[1],
            self.output.weight.dims()[1],
        ]
    }
}

/// Glorot-uniform weights, zero bias.
fn glorot_linear<B: Backend>(
    n_in: usize,
    n_out: usize,
    rng: &mut StreamRng,
    device: &B::Device,
) -> Linear<B> {
    let limit = (6.0 / (n_in + n_out) as f64).sqrt();
    let weights: Vec<f32> = (0..n_in * n_out).map(|_| rng.symmetric(limit) as f32).collect();
    let mut linear = LinearConfig::new(n_in, n_out)
        .with_initializer(Initializer::Zeros)
        .init(device);
    linear.weight = Param::from_tensor(Tensor::from_data(
        TensorData::new(weights, [n_in, n_out]),
        device,
    ));
    linear
}

pub fn input_tensor<B: Backend>(rows: &[[f64; FEATURE_COUNT]], device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = rows.iter().flatten().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(flat, [rows.len(), FEATURE_COUNT]), device)
}

/// 0/1 labels as a `[batch, 1]` integer tensor.
pub fn target_tensor<B: Backend>(labels: &[u8], device: &B::Device) -> Tensor<B, 2, Int> {
    let flat: Vec<i64> = labels.iter().map(|&l| i64::from(l)).collect();
    Tensor::from_data(TensorData::new(flat, [labels.len(), 1]), device)
}

/// Copy a float tensor out as a flat `Vec<f64>`.
pub fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f64>, String> {
    tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| format!("unreadable tensor data: {e:?}"))
}
