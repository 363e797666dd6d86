//! Signal debouncing: minimum bar distance between accepted signals.
//!
//! Single left-to-right pass. A raw signal at bar `i` is suppressed when an
//! accepted signal lies in `[i - filter_distance, i)`; otherwise it is
//! accepted and becomes the new reference. Suppressed signals never become a
//! reference, so a long run of raw signals yields one acceptance every
//! `filter_distance + 1` bars at most.

/// Stateful acceptance scan. Feed bars in increasing order; a bar at or
/// before the last accepted one is suppressed.
#[derive(Debug, Clone, Default)]
pub struct SignalDebouncer {
    filter_distance: usize,
    last_accepted: Option<usize>,
    accepted: usize,
    suppressed: usize,
}

impl SignalDebouncer {
    pub fn new(filter_distance: usize) -> Self {
        Self {
            filter_distance,
            ..Self::default()
        }
    }

    /// Decide bar `index`. Returns whether the signal is emitted.
    pub fn accept(&mut self, index: usize, raw: bool) -> bool {
        if !raw {
            return false;
        }
        let blocked = self
            .last_accepted
            .is_some_and(|last| index.saturating_sub(last) <= self.filter_distance);
        if blocked {
            self.suppressed += 1;
            false
        } else {
            self.last_accepted = Some(index);
            self.accepted += 1;
            true
        }
    }

    pub fn last_accepted(&self) -> Option<usize> {
        self.last_accepted
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

/// Debounce a whole raw signal series.
pub fn debounce(raw: &[bool], filter_distance: usize) -> Vec<bool> {
    let mut debouncer = SignalDebouncer::new(filter_distance);
    raw.iter()
        .enumerate()
        .map(|(i, &signal)| debouncer.accept(i, signal))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(signals: &[bool]) -> Vec<usize> {
        signals
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
            .collect()
    }

    #[test]
    fn zero_distance_keeps_everything() {
        let raw = [true, true, false, true];
        assert_eq!(debounce(&raw, 0), raw.to_vec());
    }

    #[test]
    fn suppresses_within_distance() {
        let mut raw = vec![false; 30];
        for i in [2, 4, 5, 8, 9, 20] {
            raw[i] = true;
        }
        // 2 accepted; 4,5 within 3 bars of 2; 8 accepted (6 > 3); 9 blocked; 20 accepted
        assert_eq!(positions(&debounce(&raw, 3)), vec![2, 8, 20]);
    }

    #[test]
    fn distance_boundary() {
        let mut raw = vec![false; 10];
        raw[0] = true;
        raw[3] = true;
        raw[4] = true;
        // 3 - 0 = 3 is still inside the window; 4 - 0 = 4 is not
        assert_eq!(positions(&debounce(&raw, 3)), vec![0, 4]);
    }

    #[test]
    fn continuous_run_is_spaced() {
        let raw = vec![true; 12];
        assert_eq!(positions(&debounce(&raw, 4)), vec![0, 5, 10]);
    }

    #[test]
    fn suppressed_signals_do_not_extend_the_window() {
        let mut raw = vec![false; 10];
        for i in [0, 2, 4, 6] {
            raw[i] = true;
        }
        assert_eq!(positions(&debounce(&raw, 3)), vec![0, 4]);
    }

    #[test]
    fn counters_track_decisions() {
        let mut d = SignalDebouncer::new(2);
        assert!(d.accept(0, true));
        assert!(!d.accept(1, true));
        assert!(!d.accept(2, false));
        assert!(d.accept(3, true));
        assert_eq!(d.accepted(), 2);
        assert_eq!(d.suppressed(), 1);
        assert_eq!(d.last_accepted(), Some(3));
    }

    #[test]
    fn earlier_index_is_suppressed() {
        let mut d = SignalDebouncer::new(2);
        assert!(d.accept(10, true));
        assert!(!d.accept(3, true));
        assert!(!d.accept(10, true));
        assert_eq!(d.suppressed(), 2);
        assert_eq!(d.last_accepted(), Some(10));
        assert!(d.accept(13, true));
    }

    #[test]
    fn output_is_subset_of_input() {
        let raw: Vec<bool> = (0..50).map(|i| i % 3 == 0 || i % 7 == 0).collect();
        let out = debounce(&raw, 5);
        for (r, o) in raw.iter().zip(&out) {
            assert!(!o || *r);
        }
    }
}
