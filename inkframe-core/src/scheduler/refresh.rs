//! Debounced single-render state machine
//!
//! ```text
//!            content_changed            tick(now)
//!   Idle ─────────────────────► Pending ─────────► Scheduled { fire_at = now + debounce }
//!    ▲                                                 │
//!    └──────────── tick(now), now > fire_at ───────────┘  (render fires)
//! ```
//!
//! Only one request is tracked. What a change does while `Scheduled`
//! depends on the [`RefreshPolicy`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Debounce between scheduling and firing
pub const DEFAULT_DEBOUNCE_MS: u32 = 1000;

/// What a change does while a render is already scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RefreshPolicy {
    /// Ignore it; the scheduled render will pick up the latest file anyway
    #[default]
    SingleFlight,
    /// Restart the debounce from the next tick
    Rearm,
}

/// Scheduler states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshState {
    /// Nothing to do
    #[default]
    Idle,
    /// Content changed; the next tick starts the debounce
    Pending,
    /// Render fires on the first tick after `fire_at`
    Scheduled { fire_at: u64 },
}

/// Debounced refresh scheduler
///
/// Purely time-driven: the owner feeds it changes and clock ticks and
/// runs the render whenever [`RefreshScheduler::tick`] returns `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshScheduler {
    state: RefreshState,
    policy: RefreshPolicy,
    debounce_ms: u32,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS, RefreshPolicy::SingleFlight)
    }
}

impl RefreshScheduler {
    /// Create an idle scheduler
    pub const fn new(debounce_ms: u32, policy: RefreshPolicy) -> Self {
        Self {
            state: RefreshState::Idle,
            policy,
            debounce_ms,
        }
    }

    /// Current state
    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Configured policy
    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Configured debounce
    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms
    }

    /// Whether a render is requested but has not fired yet
    pub fn is_busy(&self) -> bool {
        self.state != RefreshState::Idle
    }

    /// Record that the image changed
    ///
    /// Idempotent while a request is outstanding, except that under
    /// [`RefreshPolicy::Rearm`] a scheduled request goes back to pending.
    pub fn content_changed(&mut self) {
        self.state = match (self.state, self.policy) {
            (RefreshState::Idle, _) => RefreshState::Pending,
            (RefreshState::Scheduled { .. }, RefreshPolicy::Rearm) => RefreshState::Pending,
            (state, _) => state,
        };
        trace!("refresh: change -> {:?}", self.state);
    }

    /// Advance the state machine to `now_ms`
    ///
    /// # Returns
    /// `true` exactly once per request, when the render should run. The
    /// scheduler is already back in `Idle` at that point.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.state == RefreshState::Pending {
            let fire_at = now_ms.saturating_add(self.debounce_ms as u64);
            debug!("refresh: scheduled for {} ms", fire_at);
            self.state = RefreshState::Scheduled { fire_at };
        }
        match self.state {
            RefreshState::Scheduled { fire_at } if now_ms > fire_at => {
                self.state = RefreshState::Idle;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_idle_tick_does_nothing() {
        let mut s = RefreshScheduler::default();
        assert!(!s.tick(5_000));
        assert_eq!(s.state(), RefreshState::Idle);
    }

    #[test]
    fn test_single_change_fires_once() {
        let mut s = RefreshScheduler::new(1000, RefreshPolicy::SingleFlight);
        s.content_changed();
        assert_eq!(s.state(), RefreshState::Pending);

        assert!(!s.tick(100));
        assert_eq!(s.state(), RefreshState::Scheduled { fire_at: 1100 });

        // Strictly after fire_at
        assert!(!s.tick(1100));
        assert!(s.tick(1101));
        assert_eq!(s.state(), RefreshState::Idle);
        assert!(!s.tick(5000));
    }

    #[test]
    fn test_change_while_scheduled_single_flight() {
        let mut s = RefreshScheduler::new(1000, RefreshPolicy::SingleFlight);
        s.content_changed();
        s.tick(0);
        s.content_changed();
        assert_eq!(s.state(), RefreshState::Scheduled { fire_at: 1000 });

        assert!(s.tick(1001));
        assert!(!s.tick(3000));
    }

    #[test]
    fn test_change_while_scheduled_rearm() {
        let mut s = RefreshScheduler::new(1000, RefreshPolicy::Rearm);
        s.content_changed();
        s.tick(0);
        s.content_changed();
        assert_eq!(s.state(), RefreshState::Pending);

        assert!(!s.tick(500));
        assert_eq!(s.state(), RefreshState::Scheduled { fire_at: 1500 });
        assert!(!s.tick(1001));
        assert!(s.tick(1501));
        assert!(!s.tick(4000));
    }

    #[test]
    fn test_repeated_changes_while_pending() {
        let mut s = RefreshScheduler::default();
        s.content_changed();
        s.content_changed();
        s.content_changed();
        assert_eq!(s.state(), RefreshState::Pending);
        assert!(s.is_busy());
    }

    #[derive(Debug, Clone)]
    enum Step {
        Change,
        Advance(u64),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![Just(Step::Change), (0u64..1500).prop_map(Step::Advance)]
    }

    proptest! {
        #[test]
        fn every_change_is_rendered(
            steps in proptest::collection::vec(step(), 0..40),
            rearm in any::<bool>(),
        ) {
            let policy = if rearm { RefreshPolicy::Rearm } else { RefreshPolicy::SingleFlight };
            let mut s = RefreshScheduler::new(1000, policy);
            let mut now = 0u64;
            let mut changes = 0usize;
            let mut fires = 0usize;
            let mut unrendered = false;

            for step in steps {
                match step {
                    Step::Change => {
                        s.content_changed();
                        changes += 1;
                        unrendered = true;
                    }
                    Step::Advance(ms) => {
                        now += ms;
                        if s.tick(now) {
                            fires += 1;
                            unrendered = false;
                        }
                    }
                }
            }

            // Settle: one tick to schedule, one past the debounce
            for t in [now, now + 1001] {
                if s.tick(t) {
                    fires += 1;
                    unrendered = false;
                }
            }

            prop_assert!(fires <= changes);
            prop_assert!(!unrendered || changes == 0);
            prop_assert_eq!(s.state(), RefreshState::Idle);
        }

        #[test]
        fn never_fires_before_debounce(gap in 0u64..1000, start in 0u64..10_000) {
            let mut s = RefreshScheduler::new(1000, RefreshPolicy::SingleFlight);
            s.content_changed();
            prop_assert!(!s.tick(start));
            prop_assert!(!s.tick(start + gap));
            prop_assert!(!s.tick(start + 1000));
            prop_assert!(s.tick(start + 1001));
        }
    }
}
