// THEORY:
// `RiskNetwork` is a small fully connected regressor from the four environmental
// factors to a 0..=100 risk score:
//
//   4 -> 16 -> 32 -> 16 -> (dropout) -> 1
//
// Hidden layers use ReLU with He-normal initialisation; the output is linear.
// Training is plain mini-batch backpropagation of mean squared error with the
// Adam optimiser. The trailing `validation_split` share of the samples is held
// out (taken before shuffling) and reported as validation loss.
//
// A network starts untrained and refuses to predict until `train` succeeds.
// Everything random (weights, shuffling, dropout masks) comes from one seeded
// generator, so two networks built from the same config train identically.

use crate::error::{DetectionError, Result};
use crate::risk::assessment::{RiskCategory, RiskFactors};
use crate::risk::reference::{TrainingSample, proximity_confidence, reference_samples, uncertainty};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const LAYER_SIZES: [usize; 5] = [4, 16, 32, 16, 1];
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of samples, from the end, held out for validation.
    pub validation_split: f64,
    /// Dropout rate applied to the last hidden layer while training.
    pub dropout: f64,
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 4,
            learning_rate: 0.01,
            validation_split: 0.2,
            dropout: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPrediction {
    pub risk_score: u32,
    pub risk_level: RiskCategory,
    pub confidence: u32,
    pub uncertainty: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Mean training loss of each epoch.
    pub epoch_losses: Vec<f64>,
    pub validation_loss: Option<f64>,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

#[derive(Debug, Clone)]
struct Dense {
    inputs: usize,
    outputs: usize,
    /// Row-major, one row per output unit.
    weights: Vec<f64>,
    biases: Vec<f64>,
    m_weights: Vec<f64>,
    v_weights: Vec<f64>,
    m_biases: Vec<f64>,
    v_biases: Vec<f64>,
}

impl Dense {
    fn new(inputs: usize, outputs: usize, weights: Vec<f64>) -> Self {
        Self {
            inputs,
            outputs,
            weights,
            biases: vec![0.0; outputs],
            m_weights: vec![0.0; inputs * outputs],
            v_weights: vec![0.0; inputs * outputs],
            m_biases: vec![0.0; outputs],
            v_biases: vec![0.0; outputs],
        }
    }

    /// Truncated normal with standard deviation sqrt(2 / fan_in).
    fn he_normal(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        let std_dev = (2.0 / inputs as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| truncated_normal(rng) * std_dev)
            .collect();
        Self::new(inputs, outputs, weights)
    }

    /// Uniform in ±sqrt(6 / (fan_in + fan_out)).
    fn glorot_uniform(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.random_range(-limit..limit))
            .collect();
        Self::new(inputs, outputs, weights)
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .chunks(self.inputs)
            .zip(&self.biases)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect()
    }

    fn adam_step(&mut self, grads: &Gradients, learning_rate: f64, step: i32) {
        let correction1 = 1.0 - BETA1.powi(step);
        let correction2 = 1.0 - BETA2.powi(step);
        let update = |param: &mut f64, m: &mut f64, v: &mut f64, g: f64| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *param -= learning_rate * m_hat / (v_hat.sqrt() + EPSILON);
        };
        for i in 0..self.weights.len() {
            update(
                &mut self.weights[i],
                &mut self.m_weights[i],
                &mut self.v_weights[i],
                grads.weights[i],
            );
        }
        for i in 0..self.biases.len() {
            update(
                &mut self.biases[i],
                &mut self.m_biases[i],
                &mut self.v_biases[i],
                grads.biases[i],
            );
        }
    }
}

struct Gradients {
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Gradients {
    fn zeros(layer: &Dense) -> Self {
        Self {
            weights: vec![0.0; layer.weights.len()],
            biases: vec![0.0; layer.outputs],
        }
    }
}

/// Activations kept from a training forward pass.
struct Trace {
    /// Input seen by each layer, after dropout where it applies.
    inputs: Vec<Vec<f64>>,
    /// Pre-activation output of each layer.
    outputs: Vec<Vec<f64>>,
    /// Scale applied to each input of the output layer: 0 or 1 / (1 - rate).
    mask: Vec<f64>,
}

pub struct RiskNetwork {
    config: NetworkConfig,
    layers: Vec<Dense>,
    rng: StdRng,
    trained: bool,
    /// Inputs the network was trained on; prediction confidence is measured against them.
    known_inputs: Vec<[f64; 4]>,
}

impl RiskNetwork {
    pub fn new(config: NetworkConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let last = LAYER_SIZES.len() - 2;
        let layers = LAYER_SIZES
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                if index == last {
                    Dense::glorot_uniform(pair[0], pair[1], &mut rng)
                } else {
                    Dense::he_normal(pair[0], pair[1], &mut rng)
                }
            })
            .collect();
        Self {
            config,
            layers,
            rng,
            trained: false,
            known_inputs: Vec::new(),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.trained
    }

    /// Trains on the built-in reference conditions.
    pub fn train(&mut self) -> Result<TrainingReport> {
        self.train_with(&reference_samples(), |_, _| {})
    }

    /// Trains on `samples`, calling `on_epoch_end(epoch, loss)` after every epoch.
    pub fn train_with(
        &mut self,
        samples: &[TrainingSample],
        mut on_epoch_end: impl FnMut(usize, f64),
    ) -> Result<TrainingReport> {
        self.check_config()?;
        let split = training_split(samples.len(), self.config.validation_split);
        if split == 0 {
            return Err(DetectionError::Training("no samples left to train on".to_string()));
        }
        let (train, validation) = samples.split_at(split);
        info!(
            "Training risk network on {} samples ({} held out)",
            train.len(),
            validation.len()
        );

        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut epoch_losses = Vec::with_capacity(self.config.epochs);
        let mut step = 0;
        for epoch in 0..self.config.epochs {
            order.shuffle(&mut self.rng);
            let mut loss_sum = 0.0;
            let mut batches = 0;
            for batch in order.chunks(self.config.batch_size) {
                step += 1;
                loss_sum += self.train_batch(train, batch, step);
                batches += 1;
            }
            let loss = loss_sum / batches as f64;
            if !loss.is_finite() {
                return Err(DetectionError::Training(format!("loss diverged at epoch {epoch}")));
            }
            if epoch % 20 == 0 {
                debug!("Epoch {epoch}: loss = {loss:.4}");
            }
            on_epoch_end(epoch, loss);
            epoch_losses.push(loss);
        }

        self.trained = true;
        self.known_inputs = samples.iter().map(|s| s.factors.to_array()).collect();
        let validation_loss = (!validation.is_empty()).then(|| self.evaluate(validation));
        info!(
            "Risk network trained: loss {:.4}, validation loss {}",
            epoch_losses.last().copied().unwrap_or_default(),
            validation_loss.map_or("n/a".to_string(), |l| format!("{l:.4}"))
        );
        Ok(TrainingReport {
            epoch_losses,
            validation_loss,
        })
    }

    /// Mean squared error over `samples`, without dropout.
    pub fn evaluate(&self, samples: &[TrainingSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let total: f64 = samples
            .iter()
            .map(|s| (self.raw_output(&s.factors) - s.risk).powi(2))
            .sum();
        total / samples.len() as f64
    }

    pub fn predict(&self, factors: &RiskFactors) -> Result<RiskPrediction> {
        if !self.trained {
            return Err(DetectionError::ModelNotReady);
        }
        let raw = self.raw_output(factors);
        let risk_score = if raw.is_finite() {
            raw.clamp(0.0, 100.0).round() as u32
        } else {
            0
        };
        let confidence = proximity_confidence(factors, &self.known_inputs);
        Ok(RiskPrediction {
            risk_score,
            risk_level: RiskCategory::from_score(risk_score),
            confidence,
            uncertainty: uncertainty(confidence),
        })
    }

    fn check_config(&self) -> Result<()> {
        let config = &self.config;
        if config.batch_size == 0 {
            return Err(DetectionError::Training("batch_size must be at least 1".to_string()));
        }
        if !(0.0..1.0).contains(&config.validation_split) {
            return Err(DetectionError::Training("validation_split must be in [0, 1)".to_string()));
        }
        if !(0.0..1.0).contains(&config.dropout) {
            return Err(DetectionError::Training("dropout must be in [0, 1)".to_string()));
        }
        if !(config.learning_rate > 0.0) {
            return Err(DetectionError::Training("learning_rate must be positive".to_string()));
        }
        Ok(())
    }

    fn raw_output(&self, factors: &RiskFactors) -> f64 {
        let mut activation = factors.to_array().to_vec();
        let last = self.layers.len() - 1;
        for (index, layer) in self.layers.iter().enumerate() {
            activation = layer.forward(&activation);
            if index != last {
                relu_in_place(&mut activation);
            }
        }
        activation.first().copied().unwrap_or_default()
    }

    fn forward_trace(&mut self, factors: &RiskFactors) -> (f64, Trace) {
        let last = self.layers.len() - 1;
        let keep = 1.0 - self.config.dropout;
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut outputs = Vec::with_capacity(self.layers.len());
        let mut mask = Vec::new();

        let mut activation = factors.to_array().to_vec();
        for index in 0..self.layers.len() {
            if index == last && self.config.dropout > 0.0 {
                mask = (0..activation.len())
                    .map(|_| {
                        if self.rng.random::<f64>() < keep {
                            1.0 / keep
                        } else {
                            0.0
                        }
                    })
                    .collect();
                activation.iter_mut().zip(&mask).for_each(|(a, m)| *a *= m);
            }
            let pre = self.layers[index].forward(&activation);
            inputs.push(activation);
            activation = pre.clone();
            if index != last {
                relu_in_place(&mut activation);
            }
            outputs.push(pre);
        }
        let output = activation.first().copied().unwrap_or_default();
        (
            output,
            Trace {
                inputs,
                outputs,
                mask,
            },
        )
    }

    /// One Adam step over `batch` (indices into `samples`). Returns the batch's mean loss.
    fn train_batch(&mut self, samples: &[TrainingSample], batch: &[usize], step: i32) -> f64 {
        let mut grads: Vec<Gradients> = self.layers.iter().map(Gradients::zeros).collect();
        let scale = 1.0 / batch.len() as f64;
        let mut loss = 0.0;

        for &i in batch {
            let sample = &samples[i];
            let (output, trace) = self.forward_trace(&sample.factors);
            let error = output - sample.risk;
            loss += error * error * scale;
            self.backward(&trace, 2.0 * error * scale, &mut grads);
        }

        for (layer, grad) in self.layers.iter_mut().zip(&grads) {
            layer.adam_step(grad, self.config.learning_rate, step);
        }
        loss
    }

    fn backward(&self, trace: &Trace, d_output: f64, grads: &mut [Gradients]) {
        let last = self.layers.len() - 1;
        let mut delta = vec![d_output];
        for index in (0..self.layers.len()).rev() {
            let layer = &self.layers[index];
            let input = &trace.inputs[index];
            let grad = &mut grads[index];
            for (o, d) in delta.iter().enumerate() {
                grad.biases[o] += d;
                let row = &mut grad.weights[o * layer.inputs..(o + 1) * layer.inputs];
                row.iter_mut().zip(input).for_each(|(g, x)| *g += d * x);
            }
            if index == 0 {
                break;
            }

            let mut d_input = vec![0.0; layer.inputs];
            for (o, d) in delta.iter().enumerate() {
                let row = &layer.weights[o * layer.inputs..(o + 1) * layer.inputs];
                d_input.iter_mut().zip(row).for_each(|(g, w)| *g += d * w);
            }
            if index == last && !trace.mask.is_empty() {
                d_input.iter_mut().zip(&trace.mask).for_each(|(g, m)| *g *= m);
            }
            // Back through the previous layer's ReLU.
            d_input
                .iter_mut()
                .zip(&trace.outputs[index - 1])
                .for_each(|(g, z)| {
                    if *z <= 0.0 {
                        *g = 0.0;
                    }
                });
            delta = d_input;
        }
    }
}

impl Default for RiskNetwork {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

/// Number of leading samples used for training; the rest are validation.
fn training_split(len: usize, validation_split: f64) -> usize {
    (len as f64 * (1.0 - validation_split)).floor() as usize
}

fn relu_in_place(values: &mut [f64]) {
    values.iter_mut().for_each(|v| *v = v.max(0.0));
}

/// Standard normal sample, redrawn until it lies within two standard deviations.
fn truncated_normal(rng: &mut StdRng) -> f64 {
    loop {
        let u1: f64 = 1.0 - rng.random::<f64>();
        let u2: f64 = rng.random::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        if z.abs() <= 2.0 {
            return z;
        }
    }
}
