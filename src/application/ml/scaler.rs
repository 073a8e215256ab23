/// Per-column standardisation fitted on training rows only.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, |r| r.len());
        let n = rows.len().max(1) as f64;

        let mean: Vec<f64> = (0..width)
            .map(|col| rows.iter().map(|r| r[col]).sum::<f64>() / n)
            .collect();
        let std = (0..width)
            .map(|col| {
                let var = rows.iter().map(|r| (r[col] - mean[col]).powi(2)).sum::<f64>() / n;
                // constant columns are only centred
                if var > 0.0 { var.sqrt() } else { 1.0 }
            })
            .collect();

        Self { mean, std }
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.std))
                    .map(|(v, (m, s))| (v - m) / s)
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform(&rows);

        assert_eq!(scaled[0], vec![-1.0, 0.0]);
        assert_eq!(scaled[1], vec![1.0, 0.0]);
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let scaler = StandardScaler::fit(&[vec![0.0], vec![2.0]]);
        let scaled = scaler.transform(&[vec![f64::NAN]]);
        assert!(scaled[0][0].is_nan());
    }
}
