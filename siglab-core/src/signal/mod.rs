//! Condition fusion and signal debouncing.
//!
//! Conditions are pure functions of market data; the debouncer is the only
//! stateful step and it only looks backwards.

pub mod conditions;
pub mod debounce;

pub use conditions::{
    above, above_level, all_of, below, below_level, crossed_above, crossed_below,
    exceeded_before, exceeded_within, falling, held_before, held_within, mark, rising,
    shift_bools, undercut_before, undercut_within,
};
pub use debounce::{debounce, SignalDebouncer};
