//! A walk through the crate: a few tensor operations, then a small network trained for some
//! epochs on a single sample.

use std::io::Write;

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, info_span};

use crate::{
    autodiff::Tape,
    nn::{Module, MseLoss, SimpleNet},
    optim::{Optimizer, Sgd},
    tensor::Tensor,
    Error,
};

/// Settings for [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TutorialConfig {
    /// Number of training epochs.
    pub epochs: usize,
    /// Step size of the optimizer.
    pub learning_rate: f32,
    /// Seed for the random tensor and the network initialization. Drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            learning_rate: 0.01,
            seed: None,
        }
    }
}

/// What a tutorial run produced.
#[derive(Debug, Clone)]
pub struct Report {
    /// Loss of each epoch, measured before that epoch's update.
    pub losses: Vec<f32>,
    /// The network after training.
    pub net: SimpleNet,
}

/// Run the tutorial, writing its output to `out`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails, or if the optimizer rejects the learning rate.
pub fn run<W>(config: &TutorialConfig, out: &mut W) -> Result<Report, Error>
where
    W: Write + ?Sized,
{
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tensor_basics(out, &mut rng)?;

    let mut net = SimpleNet::new(&mut rng)?;
    writeln!(out, "Network Architecture: {net}")?;

    let criterion = MseLoss::default();
    let mut optimizer = Sgd::new(config.learning_rate)?;
    let input = Tensor::from([1.0, 2.0, 3.0]);
    let target = Tensor::from([1.0]);

    let _span = info_span!("train", epochs = config.epochs, lr = config.learning_rate).entered();
    info!(parameters = net.num_parameters(), "training started");

    let tape = Tape::default();
    let mut losses = Vec::with_capacity(config.epochs);
    for epoch in 1..=config.epochs {
        optimizer.zero_grad(&mut net.parameters_mut());
        tape.clear();

        let x = tape.lift(&input);
        let output = net.forward(&tape, &x)?;
        let loss = criterion.against(&tape, &output, &target)?;
        let gradients = loss.backward();
        net.accumulate_grads(&gradients)?;
        debug!(
            epoch,
            tape_len = tape.len(),
            grad_norm = grad_norm(&net),
            "backward done"
        );

        optimizer.step(&mut net.parameters_mut())?;
        writeln!(out, "Epoch {epoch}, Loss: {}", loss.value())?;
        losses.push(loss.value());
    }

    info!(final_loss = losses.last().copied(), "training finished");
    Ok(Report { losses, net })
}

fn tensor_basics<W>(out: &mut W, rng: &mut StdRng) -> Result<(), Error>
where
    W: Write + ?Sized,
{
    let tensor = Tensor::from([1.0, 2.0, 3.0]);
    writeln!(out, "Tensor: {tensor}")?;
    writeln!(out, "Addition: {}", &tensor + &tensor)?;
    writeln!(out, "Multiplication: {}", &tensor * &tensor)?;
    writeln!(out, "Random Tensor: {}", Tensor::rand(&[2, 3], rng))?;
    writeln!(out, "Zeros Tensor: {}", Tensor::zeros(&[2, 3]))?;
    writeln!(out, "Ones Tensor: {}", Tensor::ones(&[2, 3]))?;
    writeln!(out, "Reshaped Tensor: {}", tensor.view(&[3, 1])?)?;
    writeln!(out, "Mean Value: {}", tensor.mean()?)?;
    writeln!(out, "Sum Value: {}", tensor.sum())?;
    Ok(())
}

/// L2 norm over every accumulated gradient of `net`.
fn grad_norm(net: &SimpleNet) -> f32 {
    net.parameters()
        .into_iter()
        .filter_map(|p| p.grad())
        .flat_map(|g| g.iter())
        .map(|g| g * g)
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> TutorialConfig {
        TutorialConfig {
            seed: Some(seed),
            ..TutorialConfig::default()
        }
    }

    #[test]
    fn sections_in_order() {
        let mut out = Vec::new();
        let report = run(&seeded(42), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let headers = [
            "Tensor: tensor([1., 2., 3.])",
            "Addition: tensor([2., 4., 6.])",
            "Multiplication: tensor([1., 4., 9.])",
            "Random Tensor: tensor([[",
            "Zeros Tensor: tensor([[0., 0., 0.],",
            "Ones Tensor: tensor([[1., 1., 1.],",
            "Reshaped Tensor: tensor([[1.],",
            "Mean Value: tensor(2.)",
            "Sum Value: tensor(6.)",
            "Network Architecture: SimpleNet(",
            "Epoch 1, Loss: ",
            "Epoch 10, Loss: ",
        ];
        let mut from = 0;
        for header in headers {
            let at = text[from..]
                .find(header)
                .unwrap_or_else(|| panic!("missing {header:?} in {text}"));
            from += at + header.len();
        }
        assert_eq!(report.losses.len(), 10);
    }

    #[test]
    fn zero_epochs_only_prints_basics() {
        let config = TutorialConfig {
            epochs: 0,
            ..seeded(1)
        };
        let mut out = Vec::new();
        let report = run(&config, &mut out).unwrap();
        assert!(report.losses.is_empty());
        assert!(!String::from_utf8(out).unwrap().contains("Epoch"));
    }

    #[test]
    fn negative_learning_rate_is_rejected() {
        let config = TutorialConfig {
            learning_rate: -1.0,
            ..seeded(1)
        };
        assert!(matches!(
            run(&config, &mut std::io::sink()),
            Err(Error::Optim(_))
        ));
    }
}
