use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

/// Sample of a time series: milliseconds since the Unix epoch and a value.
///
/// Serializes as a two-element array, `[t, v]`.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Point(pub i64, pub f64);

pub type TimeSeries = Vec<Point>;

/// Compute the median of the values of a time series.
///
/// For an even number of samples this is the average of the two middle values,
/// so the result may be fractional even if all values are integral.
pub fn median(time_series: &[Point]) -> AnalysisResult<f64> {
    if time_series.is_empty() {
        return Err(AnalysisError::EmptyInput("median"));
    }
    let mut vals: Vec<f64> = time_series.iter().map(|&Point(_, val)| val).collect();
    vals.sort_by(f64::total_cmp);

    let n_vals = vals.len();
    let mid = n_vals / 2;
    if n_vals % 2 == 1 {
        Ok(vals[mid])
    } else {
        Ok((vals[mid - 1] + vals[mid]) / 2.0)
    }
}

/// Compute the minimum and maximum of a sequence of values.
pub fn compute_min_max<I>(vals: I) -> Option<(i64, i64)>
where
    I: IntoIterator<Item = i64>,
{
    vals.into_iter().fold(None, |acc, val| match acc {
        None => Some((val, val)),
        Some((min, max)) => Some((min.min(val), max.max(val))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(vals: &[f64]) -> TimeSeries {
        vals.iter()
            .enumerate()
            .map(|(i, &val)| Point(i as i64 * 1000, val))
            .collect()
    }

    #[test]
    fn median_of_odd_count() {
        assert_eq!(median(&series(&[19.0, 10.0, 15.0, 12.0, 17.0])), Ok(15.0));
    }

    #[test]
    fn median_of_even_count_averages_middle_values() {
        assert_eq!(median(&series(&[10.0, 12.0, 15.0, 17.0])), Ok(13.5));
    }

    #[test]
    fn median_of_single_value() {
        assert_eq!(median(&series(&[-3.0])), Ok(-3.0));
    }

    #[test]
    fn median_of_empty_series_fails() {
        assert_eq!(median(&[]), Err(AnalysisError::EmptyInput("median")));
    }

    #[test]
    fn min_max() {
        assert_eq!(compute_min_max([3, -1, 7, 2]), Some((-1, 7)));
        assert_eq!(compute_min_max([4]), Some((4, 4)));
        assert_eq!(compute_min_max(Vec::new()), None);
    }
}
