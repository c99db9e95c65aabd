#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub stddev: f64,
    pub count: usize,
}

/// Mean and sample (n - 1) standard deviation. Needs at least two values.
pub fn compute_baseline(values: &[f64]) -> Option<Baseline> {
    if values.len() < 2 {
        return None;
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values
        .iter()
        .map(|value| {
            let delta = *value - mean;
            delta * delta
        })
        .sum::<f64>()
        / (count - 1) as f64;

    Some(Baseline {
        mean,
        stddev: variance.sqrt(),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::compute_baseline;

    #[test]
    fn matches_hand_computed_values() {
        let baseline = compute_baseline(&[20.0, 22.0, 21.0, 19.0, 23.0]).expect("baseline");
        assert!((baseline.mean - 21.0).abs() < 1e-9);
        assert!((baseline.stddev - 1.5811).abs() < 1e-3);
        assert_eq!(baseline.count, 5);
    }

    #[test]
    fn constant_signal_has_zero_stddev() {
        let baseline = compute_baseline(&[50.0; 6]).expect("baseline");
        assert_eq!(baseline.stddev, 0.0);
    }

    #[test]
    fn single_value_has_no_baseline() {
        assert!(compute_baseline(&[1.0]).is_none());
    }
}
