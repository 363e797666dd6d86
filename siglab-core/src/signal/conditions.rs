//! Elementary condition builders and AND-fusion.
//!
//! Every builder returns a fresh `Vec<bool>` aligned with its inputs. A
//! comparison involving an undefined (NaN) value is `false`, never an error.
//! Builders over two series reject inputs of different lengths.

use std::collections::VecDeque;

use crate::error::SignalError;

fn check_len(expected: usize, actual: usize) -> Result<(), SignalError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SignalError::LengthMismatch { expected, actual })
    }
}

fn pairwise(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> bool) -> Result<Vec<bool>, SignalError> {
    check_len(a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect())
}

/// `values[i] > level`
pub fn above_level(values: &[f64], level: f64) -> Vec<bool> {
    values.iter().map(|&v| v > level).collect()
}

/// `values[i] < level`
pub fn below_level(values: &[f64], level: f64) -> Vec<bool> {
    values.iter().map(|&v| v < level).collect()
}

/// `a[i] > b[i]`
pub fn above(a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
    pairwise(a, b, |x, y| x > y)
}

/// `a[i] < b[i]`
pub fn below(a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
    pairwise(a, b, |x, y| x < y)
}

/// `values[i] > values[i - bars]`. False for the first `bars` positions.
pub fn rising(values: &[f64], bars: usize) -> Vec<bool> {
    compare_back(values, bars, |now, then| now > then)
}

/// `values[i] < values[i - bars]`. False for the first `bars` positions.
pub fn falling(values: &[f64], bars: usize) -> Vec<bool> {
    compare_back(values, bars, |now, then| now < then)
}

fn compare_back(values: &[f64], bars: usize, f: impl Fn(f64, f64) -> bool) -> Vec<bool> {
    (0..values.len())
        .map(|i| bars > 0 && i >= bars && f(values[i], values[i - bars]))
        .collect()
}

/// `a` moved from below `b` on the previous bar to above it on this bar.
pub fn crossed_above(a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
    check_len(a.len(), b.len())?;
    Ok((0..a.len())
        .map(|i| i > 0 && a[i - 1] < b[i - 1] && a[i] > b[i])
        .collect())
}

/// `a` moved from above `b` on the previous bar to below it on this bar.
pub fn crossed_below(a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
    check_len(a.len(), b.len())?;
    Ok((0..a.len())
        .map(|i| i > 0 && a[i - 1] > b[i - 1] && a[i] < b[i])
        .collect())
}

/// Lookback relaxation: `cond` was true at least once in the `window` bars
/// ending at `i` (inclusive). A zero window is never satisfied.
///
/// Sliding-window OR computed with a running count of true values.
pub fn held_within(cond: &[bool], window: usize) -> Vec<bool> {
    let mut result = vec![false; cond.len()];
    if window == 0 {
        return result;
    }
    let mut count = 0usize;
    for i in 0..cond.len() {
        if cond[i] {
            count += 1;
        }
        if i >= window && cond[i - window] {
            count -= 1;
        }
        result[i] = count > 0;
    }
    result
}

/// Some value in the `window` bars ending at `i` is strictly above `reference[i]`.
pub fn exceeded_within(
    values: &[f64],
    reference: &[f64],
    window: usize,
) -> Result<Vec<bool>, SignalError> {
    check_len(values.len(), reference.len())?;
    let highest = rolling_extreme(values, window, |a, b| a >= b);
    Ok(highest
        .iter()
        .zip(reference)
        .map(|(&h, &r)| h > r)
        .collect())
}

/// Some value in the `window` bars ending at `i` is strictly below `reference[i]`.
pub fn undercut_within(
    values: &[f64],
    reference: &[f64],
    window: usize,
) -> Result<Vec<bool>, SignalError> {
    check_len(values.len(), reference.len())?;
    let lowest = rolling_extreme(values, window, |a, b| a <= b);
    Ok(lowest
        .iter()
        .zip(reference)
        .map(|(&l, &r)| l < r)
        .collect())
}

/// `cond` was true at least once in the `window` bars before `i`, that is
/// `[i - window, i)`. The current bar is excluded and positions without a
/// full prior window are false.
pub fn held_before(cond: &[bool], window: usize) -> Vec<bool> {
    let held = held_within(&shift_bools(cond, 1), window);
    gate_full_window(held, window)
}

/// Some value in `[i - window, i)` is strictly above `reference[i]`.
/// False until a full prior window exists.
pub fn exceeded_before(
    values: &[f64],
    reference: &[f64],
    window: usize,
) -> Result<Vec<bool>, SignalError> {
    let exceeded = exceeded_within(&prior(values), reference, window)?;
    Ok(gate_full_window(exceeded, window))
}

/// Some value in `[i - window, i)` is strictly below `reference[i]`.
/// False until a full prior window exists.
pub fn undercut_before(
    values: &[f64],
    reference: &[f64],
    window: usize,
) -> Result<Vec<bool>, SignalError> {
    let undercut = undercut_within(&prior(values), reference, window)?;
    Ok(gate_full_window(undercut, window))
}

/// `values` moved one bar later, NaN in front.
fn prior(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.iter().copied())
        .take(values.len())
        .collect()
}

fn gate_full_window(mut cond: Vec<bool>, window: usize) -> Vec<bool> {
    for c in cond.iter_mut().take(window) {
        *c = false;
    }
    cond
}

/// Rolling max/min over partial trailing windows, ignoring undefined values.
///
/// `dominates(a, b)` is true when `a` should evict `b` from the back of the
/// monotonic queue. Positions whose window holds no defined value are NaN.
fn rolling_extreme(values: &[f64], window: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if window == 0 {
        return result;
    }
    let mut queue: VecDeque<usize> = VecDeque::new();
    for (i, &v) in values.iter().enumerate() {
        if !v.is_nan() {
            while let Some(&back) = queue.back() {
                if dominates(v, values[back]) {
                    queue.pop_back();
                } else {
                    break;
                }
            }
            queue.push_back(i);
        }
        while let Some(&front) = queue.front() {
            if front + window <= i {
                queue.pop_front();
            } else {
                break;
            }
        }
        if let Some(&front) = queue.front() {
            result[i] = values[front];
        }
    }
    result
}

/// `result[i] = cond[i - bars]`; false where that reaches before the start.
pub fn shift_bools(cond: &[bool], bars: usize) -> Vec<bool> {
    (0..cond.len())
        .map(|i| i >= bars && cond[i - bars])
        .collect()
}

/// AND-fusion of equally long condition series.
///
/// The result does not depend on the order of `conditions`.
pub fn all_of(conditions: &[&[bool]]) -> Result<Vec<bool>, SignalError> {
    let Some((first, rest)) = conditions.split_first() else {
        return Ok(Vec::new());
    };
    let mut fused = first.to_vec();
    for cond in rest {
        check_len(fused.len(), cond.len())?;
        for (acc, &c) in fused.iter_mut().zip(cond.iter()) {
            *acc = *acc && c;
        }
    }
    Ok(fused)
}

/// `values[i]` where `mask[i]`, undefined elsewhere. Used for entry markers.
pub fn mark(values: &[f64], mask: &[bool]) -> Result<Vec<f64>, SignalError> {
    check_len(values.len(), mask.len())?;
    Ok(values
        .iter()
        .zip(mask)
        .map(|(&v, &m)| if m { v } else { f64::NAN })
        .collect())
}
