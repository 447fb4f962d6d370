use tinytorch::{
    tensor::Tensor,
    tutorial::{self, Report, TutorialConfig},
};

fn run_seeded(seed: u64) -> (String, Report) {
    let config = TutorialConfig {
        seed: Some(seed),
        ..TutorialConfig::default()
    };
    let mut out = Vec::new();
    let report = tutorial::run(&config, &mut out).unwrap();
    (String::from_utf8(out).unwrap(), report)
}

/// Parses `Epoch N, Loss: x` into `(N, x)`.
fn parse_epoch(line: &str) -> Option<(usize, f32)> {
    let rest = line.strip_prefix("Epoch ")?;
    let (epoch, loss) = rest.split_once(", Loss: ")?;
    Some((epoch.parse().ok()?, loss.parse().ok()?))
}

#[test]
fn prints_ten_epochs() {
    let (text, report) = run_seeded(7);
    let epochs: Vec<_> = text
        .lines()
        .filter(|line| line.starts_with("Epoch"))
        .map(|line| parse_epoch(line).unwrap_or_else(|| panic!("malformed line {line:?}")))
        .collect();

    assert_eq!(epochs.len(), 10);
    for (i, (epoch, loss)) in epochs.iter().enumerate() {
        assert_eq!(*epoch, i + 1);
        assert_eq!(*loss, report.losses[i]);
        assert!(loss.is_finite() && *loss >= 0.0);
    }
    assert!(text.ends_with(&format!("Epoch 10, Loss: {}\n", report.losses[9])));
}

#[test]
fn reshaped_tensor_keeps_elements() {
    let (text, _) = run_seeded(7);
    let lines: Vec<_> = text.lines().collect();
    let start = lines
        .iter()
        .position(|line| line.starts_with("Reshaped Tensor: "))
        .unwrap();
    let rows = &lines[start..start + 3];
    assert_eq!(rows[0], "Reshaped Tensor: tensor([[1.],");
    assert_eq!(rows[1].trim(), "[2.],");
    assert_eq!(rows[2].trim(), "[3.]])");
    assert_eq!(lines[start + 3], "Mean Value: tensor(2.)");
}

#[test]
fn network_architecture() {
    let (text, report) = run_seeded(3);
    let expected = "Network Architecture: SimpleNet(\n  \
                    (fc1): Linear(in_features=3, out_features=2, bias=True)\n  \
                    (fc2): Linear(in_features=2, out_features=1, bias=True)\n\
                    )\n";
    assert!(text.contains(expected), "{text}");
    assert!(text.contains(&report.net.to_string()));
}

#[test]
fn seeded_runs_are_deterministic() {
    let (a, report_a) = run_seeded(11);
    let (b, report_b) = run_seeded(11);
    assert_eq!(a, b);
    assert_eq!(report_a.losses, report_b.losses);

    let (c, _) = run_seeded(12);
    assert_ne!(a, c);
}

#[test]
fn loss_does_not_grow() {
    for seed in 0..8 {
        let (_, report) = run_seeded(seed);
        let first = report.losses[0];
        let last = report.losses[9];
        assert!(last <= first + 1e-6, "seed {seed}: {first} -> {last}");
    }
}

#[test]
fn training_moves_towards_target() {
    let config = TutorialConfig {
        epochs: 500,
        learning_rate: 0.01,
        seed: Some(5),
    };
    let report = tutorial::run(&config, &mut std::io::sink()).unwrap();
    let prediction = report
        .net
        .infer(&Tensor::from([1.0, 2.0, 3.0]))
        .unwrap()
        .item()
        .unwrap();
    assert!((prediction - 1.0).abs() < 1e-2, "prediction {prediction}");
}

#[test]
fn unseeded_run_trains() {
    let report = tutorial::run(&TutorialConfig::default(), &mut std::io::sink()).unwrap();
    assert_eq!(report.losses.len(), 10);
    assert!(report.losses.iter().all(|loss| loss.is_finite() && *loss >= 0.0));
}
