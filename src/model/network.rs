//! Dense feed-forward network on candle tensors

use candle_core::{DType, Device, Module, Result, Tensor, Var};
use candle_nn::{Linear, loss, ops};
use rand::RngExt;
use rand::rngs::StdRng;

/// Stack of linear layers producing a single scalar. Hidden layers use ReLU,
/// the output layer a sigmoid.
pub struct FeedForwardNetwork {
    layers: Vec<Linear>,
    vars: Vec<Var>,
    device: Device,
}

impl FeedForwardNetwork {
    /// `sizes` lists layer widths from input to output.
    ///
    /// Weights are drawn from `rng` so a seed fixes the whole network:
    /// He-uniform for ReLU layers, Glorot-uniform for the output, zero biases.
    pub fn new(sizes: &[usize], rng: &mut StdRng) -> Result<Self> {
        if sizes.len() < 2 {
            candle_core::bail!("network needs an input and an output size");
        }
        let device = Device::Cpu;
        let last = sizes.len() - 2;
        let mut layers = Vec::with_capacity(sizes.len() - 1);
        let mut vars = Vec::with_capacity(2 * (sizes.len() - 1));

        for (i, pair) in sizes.windows(2).enumerate() {
            let (inputs, outputs) = (pair[0], pair[1]);
            let limit = if i == last {
                (6.0 / (inputs + outputs) as f64).sqrt()
            } else {
                (6.0 / inputs as f64).sqrt()
            };
            let weights: Vec<f64> = (0..inputs * outputs)
                .map(|_| rng.random_range(-limit..limit))
                .collect();
            let weight = Var::from_tensor(&Tensor::from_vec(weights, (outputs, inputs), &device)?)?;
            let bias = Var::from_tensor(&Tensor::zeros(outputs, DType::F64, &device)?)?;

            layers.push(Linear::new(
                weight.as_tensor().clone(),
                Some(bias.as_tensor().clone()),
            ));
            vars.push(weight);
            vars.push(bias);
        }

        Ok(Self {
            layers,
            vars,
            device,
        })
    }

    /// Trainable parameters, shared with the layers
    #[must_use]
    pub fn vars(&self) -> Vec<Var> {
        self.vars.clone()
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.layers
            .first()
            .and_then(|l| l.weight().dims().get(1).copied())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.vars.iter().map(|v| v.elem_count()).sum()
    }

    /// Scalar output for one input vector
    pub fn predict(&self, input: &[f64]) -> Result<f64> {
        let xs = Tensor::from_slice(input, (1, input.len()), &self.device)?;
        self.forward(&xs)?.reshape(())?.to_scalar::<f64>()
    }

    /// Mean squared error over `inputs`/`targets`
    pub fn mse(&self, inputs: &[Vec<f64>], targets: &[f64]) -> Result<f64> {
        if inputs.is_empty() {
            return Ok(0.0);
        }
        let xs = rows_tensor(inputs, &self.device)?;
        let ys = column_tensor(targets, &self.device)?;
        loss::mse(&self.forward(&xs)?, &ys)?.to_scalar::<f64>()
    }
}

impl Module for FeedForwardNetwork {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let last = self.layers.len() - 1;
        let mut xs = xs.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            xs = if i == last { ops::sigmoid(&xs)? } else { xs.relu()? };
        }
        Ok(xs)
    }
}

/// Equal-length feature vectors as an `(n, width)` tensor
pub fn rows_tensor(rows: &[Vec<f64>], device: &Device) -> Result<Tensor> {
    let width = rows.first().map_or(0, Vec::len);
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Tensor::from_vec(flat, (rows.len(), width), device)
}

/// Targets as an `(n, 1)` tensor matching the network output
pub fn column_tensor(values: &[f64], device: &Device) -> Result<Tensor> {
    Tensor::from_slice(values, (values.len(), 1), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::{AdamW, Optimizer, ParamsAdamW};
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_route_topology() {
        let network = FeedForwardNetwork::new(&[7, 32, 16, 1], &mut rng()).unwrap();
        assert_eq!(network.input_size(), 7);
        // 7*32+32 + 32*16+16 + 16*1+1
        assert_eq!(network.parameter_count(), 801);
    }

    #[test]
    fn test_rejects_single_layer_size() {
        assert!(FeedForwardNetwork::new(&[7], &mut rng()).is_err());
    }

    #[test]
    fn test_output_is_a_probability() {
        let network = FeedForwardNetwork::new(&[3, 8, 1], &mut rng()).unwrap();
        for input in [[0.0, 0.0, 0.0], [1.0, -1.0, 0.5], [100.0, 50.0, -20.0]] {
            let y = network.predict(&input).unwrap();
            assert!((0.0..=1.0).contains(&y), "got {y}");
        }
    }

    #[test]
    fn test_same_seed_same_network() {
        let a = FeedForwardNetwork::new(&[4, 5, 1], &mut rng()).unwrap();
        let b = FeedForwardNetwork::new(&[4, 5, 1], &mut rng()).unwrap();
        let input = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(a.predict(&input).unwrap(), b.predict(&input).unwrap());
    }

    #[test]
    fn test_adam_steps_reduce_loss() {
        let network = FeedForwardNetwork::new(&[1, 8, 1], &mut rng()).unwrap();
        let inputs: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 20.0]).collect();
        let targets: Vec<f64> = inputs.iter().map(|x| 0.2 + 0.6 * x[0]).collect();
        let xs = rows_tensor(&inputs, network.device()).unwrap();
        let ys = column_tensor(&targets, network.device()).unwrap();

        let before = network.mse(&inputs, &targets).unwrap();
        let params = ParamsAdamW {
            lr: 0.01,
            weight_decay: 0.0,
            ..ParamsAdamW::default()
        };
        let mut optimizer = AdamW::new(network.vars(), params).unwrap();
        for _ in 0..300 {
            let loss = loss::mse(&network.forward(&xs).unwrap(), &ys).unwrap();
            optimizer.backward_step(&loss).unwrap();
        }
        let after = network.mse(&inputs, &targets).unwrap();
        assert!(after < before / 2.0, "before {before}, after {after}");
    }
}
