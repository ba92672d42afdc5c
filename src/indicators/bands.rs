use crate::indicators::moving_average::{rolling_mean, rolling_std};

/// Mean-reversion bands around a trailing moving average
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Band {
    pub moving_average: Option<f64>,
    pub std_dev: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

/// Bollinger-style bands: SMA ± `width` sample standard deviations
pub fn bollinger_bands(values: &[f64], window: usize, width: f64) -> Vec<Band> {
    rolling_mean(values, window)
        .into_iter()
        .zip(rolling_std(values, window))
        .map(|(moving_average, std_dev)| {
            let (upper, lower) = match (moving_average, std_dev) {
                (Some(ma), Some(sd)) => (Some(ma + width * sd), Some(ma - width * sd)),
                _ => (None, None),
            };
            Band {
                moving_average,
                std_dev,
                upper,
                lower,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_bands_collapse() {
        let values = vec![100.0; 50];
        let bands = bollinger_bands(&values, 20, 2.0);

        assert!(bands[..19].iter().all(|b| b.upper.is_none() && b.lower.is_none()));
        for band in &bands[19..] {
            assert_eq!(band.moving_average, Some(100.0));
            assert_eq!(band.std_dev, Some(0.0));
            assert_eq!(band.upper, Some(100.0));
            assert_eq!(band.lower, Some(100.0));
        }
    }

    #[test]
    fn test_bands_are_symmetric() {
        let values = vec![10.0, 12.0, 11.0, 13.0, 12.0];
        let bands = bollinger_bands(&values, 5, 2.0);
        let last = bands[4];

        let ma = last.moving_average.unwrap();
        let sd = last.std_dev.unwrap();
        assert!((last.upper.unwrap() - (ma + 2.0 * sd)).abs() < 1e-12);
        assert!((ma - last.lower.unwrap() - 2.0 * sd).abs() < 1e-12);
    }

    #[test]
    fn test_bands_collapse_for_inexact_prices() {
        let values = vec![101.37; 60];
        let bands = bollinger_bands(&values, 20, 2.0);

        for band in &bands[19..] {
            assert_eq!(band.upper, Some(101.37));
            assert_eq!(band.lower, Some(101.37));
        }
    }
}
