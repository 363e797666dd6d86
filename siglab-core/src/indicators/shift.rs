//! Series alignment helpers: lagging, the band alignment shift, rounding.
//!
//! None of these wrap around. Positions shifted in from before the start of
//! the series are undefined.

/// `result[i] = values[i - bars]`; the first `bars` positions are undefined.
pub fn lag(values: &[f64], bars: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in bars..n {
        result[i] = values[i - bars];
    }
    result
}

/// Forward-shift a band series by `shift` bars and keep the first
/// `offset + shift` positions undefined.
///
/// Channel bands are undefined for the first `offset` bars (`offset` is
/// usually `period - 1`); after shifting, bar `i` sees the band as it stood
/// at bar `i - shift`, so the current bar's own extremes never take part in
/// its breakout test.
pub fn shift_and_pad(values: &[f64], offset: usize, shift: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    let start = offset.saturating_add(shift);
    for i in start..n {
        result[i] = values[i - shift];
    }
    result
}

/// Round every value half away from zero to `decimals` places. NaN stays NaN.
pub fn round_to(values: &[f64], decimals: u32) -> Vec<f64> {
    let scale = 10f64.powi(decimals as i32);
    values.iter().map(|v| (v * scale).round() / scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn lag_by_two() {
        let result = lag(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(&result[2..], &[1.0, 2.0]);
    }

    #[test]
    fn lag_longer_than_series() {
        assert!(lag(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn shift_and_pad_does_not_wrap() {
        // band defined from index 2 (period 3 → offset 2)
        let band = [f64::NAN, f64::NAN, 10.0, 11.0, 12.0, 13.0];
        let result = shift_and_pad(&band, 2, 2);
        for v in &result[..4] {
            assert!(v.is_nan());
        }
        assert_approx(result[4], 10.0, DEFAULT_EPSILON);
        assert_approx(result[5], 11.0, DEFAULT_EPSILON);
    }

    #[test]
    fn shift_and_pad_zero_shift_keeps_defined_region() {
        let band = [f64::NAN, 5.0, 6.0];
        let result = shift_and_pad(&band, 1, 0);
        assert!(result[0].is_nan());
        assert_eq!(&result[1..], &[5.0, 6.0]);
    }

    #[test]
    fn shift_and_pad_preserves_length() {
        assert_eq!(shift_and_pad(&[1.0; 7], 95, 2).len(), 7);
    }

    #[test]
    fn round_to_one_decimal() {
        let result = round_to(&[29.96, 30.04, 29.94, f64::NAN], 1);
        assert_approx(result[0], 30.0, DEFAULT_EPSILON);
        assert_approx(result[1], 30.0, DEFAULT_EPSILON);
        assert_approx(result[2], 29.9, DEFAULT_EPSILON);
        assert!(result[3].is_nan());
    }
}
