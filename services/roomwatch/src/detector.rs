//! Live-state transition detector
//!
//! The per-cycle decision for one room is a pure function of the dedup flag
//! and the newly observed liveness. Keying off the flag rather than the
//! cached liveness is what makes a session fire exactly once no matter how
//! many cycles observe it live.

use std::fmt;

/// Per-cycle, per-room decision of the transition detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Offline-to-live transition: dispatch a notification
    Fire,
    /// Still live, already notified this session
    Suppress,
    /// Live-to-offline transition: clear the dedup flag
    Reset,
    /// Nothing to do
    Noop,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Fire => write!(f, "fire"),
            Decision::Suppress => write!(f, "suppress"),
            Decision::Reset => write!(f, "reset"),
            Decision::Noop => write!(f, "noop"),
        }
    }
}

/// Decide what a newly observed liveness means for a room.
///
/// `dispatched` is the room's dedup flag; a fetch that failed never reaches
/// this function (failed cycles are no-ops by construction).
pub fn evaluate(dispatched: bool, new_live: bool) -> Decision {
    match (dispatched, new_live) {
        (false, true) => Decision::Fire,
        (true, true) => Decision::Suppress,
        (true, false) => Decision::Reset,
        (false, false) => Decision::Noop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_idle_stays_idle() {
        assert_eq!(evaluate(false, false), Decision::Noop);
    }

    #[test]
    fn going_live_fires() {
        assert_eq!(evaluate(false, true), Decision::Fire);
    }

    #[test]
    fn live_after_fire_suppresses() {
        assert_eq!(evaluate(true, true), Decision::Suppress);
    }

    #[test]
    fn going_offline_after_fire_resets() {
        assert_eq!(evaluate(true, false), Decision::Reset);
    }

    #[test]
    fn session_sequence_produces_expected_decisions() {
        // live observations: [false, true, true, false, true]
        let observations = [false, true, true, false, true];
        let expected = [
            Decision::Noop,
            Decision::Fire,
            Decision::Suppress,
            Decision::Reset,
            Decision::Fire,
        ];

        let mut dispatched = false;
        for (observed, want) in observations.iter().zip(expected.iter()) {
            let decision = evaluate(dispatched, *observed);
            assert_eq!(decision, *want);
            match decision {
                Decision::Fire => dispatched = true,
                Decision::Reset => dispatched = false,
                _ => {}
            }
        }
        assert!(dispatched, "sequence ends in a notified live session");
    }

    #[test]
    fn instant_restart_counts_as_two_sessions() {
        // end of session clears the flag, so the next live observation
        // fires again even if it arrives on the very next cycle
        let mut dispatched = true;
        assert_eq!(evaluate(dispatched, false), Decision::Reset);
        dispatched = false;
        assert_eq!(evaluate(dispatched, true), Decision::Fire);
    }
}
