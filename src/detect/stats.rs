/// Mean and population standard deviation of a historical series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub std_dev: f64,
}

impl Baseline {
    /// `None` with fewer than two points: the spread is undefined.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Zero when the baseline has no variance, so such a cell is never flagged.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std_dev == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_standard_deviation() {
        let b = Baseline::from_values(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(b.mean, 20.0);
        assert!((b.std_dev - 8.164_965_8).abs() < 1e-6);
        assert!((b.z_score(40.0) - 2.449_489_7).abs() < 1e-6);
        assert!((b.z_score(22.0) - 0.244_949).abs() < 1e-6);
    }

    #[test]
    fn flat_history_gives_zero_score() {
        let b = Baseline::from_values(&[10.0, 10.0, 10.0]).unwrap();
        assert_eq!(b.std_dev, 0.0);
        assert_eq!(b.z_score(10.0), 0.0);
        assert_eq!(b.z_score(1e9), 0.0);
    }

    #[test]
    fn needs_two_points() {
        assert!(Baseline::from_values(&[]).is_none());
        assert!(Baseline::from_values(&[5.0]).is_none());
        assert!(Baseline::from_values(&[5.0, 6.0]).is_some());
    }
}
