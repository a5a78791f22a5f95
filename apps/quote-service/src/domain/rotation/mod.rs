//! Round-Robin Rotation State
//!
//! Pure bookkeeping for refreshing a bounded slice of the symbol list per
//! scheduler tick. Each completed tick advances the cursor past its slice,
//! wrapping to zero once the end of the list is reached, so every symbol is
//! refreshed once per `ceil(len / per_cycle)` ticks.

use std::ops::Range;

/// Cursor into the predefined symbol list plus a completed-cycle counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationState {
    cursor: usize,
    cycles_completed: u64,
}

impl RotationState {
    /// Start a rotation at offset zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cursor: 0,
            cycles_completed: 0,
        }
    }

    /// Offset where the next tick starts.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of ticks whose slice completed.
    #[must_use]
    pub const fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Slice of the list the next tick should refresh.
    ///
    /// The slice never crosses the end of the list; a short final slice is
    /// followed by a wrap to the start.
    #[must_use]
    pub fn next_slice(&self, len: usize, per_cycle: usize) -> Range<usize> {
        if len == 0 || per_cycle == 0 {
            return 0..0;
        }
        let start = self.cursor % len;
        let end = start.saturating_add(per_cycle).min(len);
        start..end
    }

    /// Record a completed slice and move the cursor past it.
    ///
    /// Returns the new cursor.
    pub fn complete(&mut self, slice: &Range<usize>, len: usize) -> usize {
        self.cursor = if len == 0 || slice.end >= len {
            0
        } else {
            slice.end
        };
        self.cycles_completed += 1;
        self.cursor
    }

    /// Ticks needed to visit every symbol once.
    #[must_use]
    pub const fn ticks_per_rotation(len: usize, per_cycle: usize) -> usize {
        if per_cycle == 0 {
            return 0;
        }
        len.div_ceil(per_cycle)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn first_slice_starts_at_zero() {
        let state = RotationState::new();
        assert_eq!(state.next_slice(20, 4), 0..4);
    }

    #[test]
    fn cursor_wraps_after_last_slice() {
        let mut state = RotationState::new();
        for expected_start in [0, 4, 8, 12, 16] {
            let slice = state.next_slice(20, 4);
            assert_eq!(slice.start, expected_start);
            state.complete(&slice, 20);
        }
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.cycles_completed(), 5);
    }

    #[test]
    fn short_final_slice_does_not_cross_end() {
        let mut state = RotationState::new();
        let first = state.next_slice(5, 3);
        assert_eq!(first, 0..3);
        state.complete(&first, 5);

        let second = state.next_slice(5, 3);
        assert_eq!(second, 3..5);
        assert_eq!(state.complete(&second, 5), 0);
    }

    #[test]
    fn two_symbols_one_per_cycle() {
        let mut state = RotationState::new();

        let tick1 = state.next_slice(2, 1);
        assert_eq!(tick1, 0..1);
        assert_eq!(state.complete(&tick1, 2), 1);

        let tick2 = state.next_slice(2, 1);
        assert_eq!(tick2, 1..2);
        assert_eq!(state.complete(&tick2, 2), 0);

        let tick3 = state.next_slice(2, 1);
        assert_eq!(tick3, 0..1);
    }

    #[test]
    fn empty_list_yields_empty_slice() {
        let state = RotationState::new();
        assert!(state.next_slice(0, 4).is_empty());
        assert!(state.next_slice(10, 0).is_empty());
    }

    #[test]
    fn ticks_per_rotation_rounds_up() {
        assert_eq!(RotationState::ticks_per_rotation(20, 4), 5);
        assert_eq!(RotationState::ticks_per_rotation(21, 4), 6);
        assert_eq!(RotationState::ticks_per_rotation(3, 10), 1);
        assert_eq!(RotationState::ticks_per_rotation(3, 0), 0);
    }

    proptest! {
        #[test]
        fn full_rotation_visits_every_symbol(len in 1usize..64, per_cycle in 1usize..16) {
            let mut state = RotationState::new();
            let mut visited = HashSet::new();

            for _ in 0..RotationState::ticks_per_rotation(len, per_cycle) {
                let slice = state.next_slice(len, per_cycle);
                prop_assert!(slice.len() <= per_cycle);
                visited.extend(slice.clone());
                state.complete(&slice, len);
            }

            prop_assert_eq!(visited.len(), len);
            prop_assert_eq!(state.cursor(), 0);
        }
    }
}
