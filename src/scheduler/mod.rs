//! Update scheduler: decides when a pagination pass runs
//!
//! A single state slot drives the cycle
//! `Idle -> Pending -> Measuring -> Committing -> Idle`. Time is never read
//! here; callers pass `now_ms` from a [`Clock`].

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use serde::{Deserialize, Serialize};

/// Timing and tolerance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Quiet period after a change before a pass runs
    pub debounce_ms: u64,
    /// Delay of the first pass after start-up
    pub initial_delay_ms: u64,
    /// How often a pending deadline may be pushed out by further changes
    pub max_debounce_chain: u32,
    /// Frames to wait for a settled surface before estimating instead
    pub max_measure_retries: u32,
    /// Height difference below which two passes count as identical
    pub tolerance_px: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            initial_delay_ms: 150,
            max_debounce_chain: 10,
            max_measure_retries: 3,
            tolerance_px: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SchedulerState {
    Idle,
    #[serde(rename_all = "camelCase")]
    Pending { due_ms: u64 },
    /// Waiting for a layout frame of `revision`
    Measuring { revision: u64, attempts: u32 },
    Committing { revision: u64 },
}

/// What the host should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SchedulerAction {
    /// Nothing scheduled
    Sleep,
    /// Poll again at `until`
    Wait { until: u64 },
    /// Render, then hand a settled layout frame of `revision` back
    RequestLayoutFrame { revision: u64 },
    /// A frame was already requested
    AwaitingFrame,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    state: SchedulerState,
    /// A change arrived while a pass was in flight
    coalesced: bool,
    /// Deadline extensions of the current pending period
    chain: u32,
    latest_revision: u64,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            coalesced: false,
            chain: 0,
            latest_revision: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Takes effect from the next transition
    pub fn set_config(&mut self, config: SchedulerConfig) {
        self.config = config;
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SchedulerState::Idle
    }

    pub fn is_coalesced(&self) -> bool {
        self.coalesced
    }

    /// Newest document revision seen so far
    pub fn latest_revision(&self) -> u64 {
        self.latest_revision
    }

    /// Schedule the first pass for a freshly loaded document
    pub fn start(&mut self, revision: u64, now_ms: u64) {
        self.latest_revision = revision;
        self.coalesced = false;
        self.chain = 0;
        self.state = SchedulerState::Pending {
            due_ms: now_ms + self.config.initial_delay_ms,
        };
    }

    /// The document changed and now has `revision`
    pub fn notify_change(&mut self, revision: u64, now_ms: u64) {
        self.latest_revision = self.latest_revision.max(revision);
        match self.state {
            SchedulerState::Idle => {
                self.chain = 0;
                self.state = SchedulerState::Pending {
                    due_ms: now_ms + self.config.debounce_ms,
                };
            }
            SchedulerState::Pending { due_ms } => {
                if self.chain < self.config.max_debounce_chain {
                    self.chain += 1;
                    self.state = SchedulerState::Pending {
                        due_ms: due_ms.max(now_ms + self.config.debounce_ms),
                    };
                } else {
                    log::debug!("Debounce chain exhausted, keeping deadline {}", due_ms);
                }
            }
            SchedulerState::Measuring { .. } | SchedulerState::Committing { .. } => {
                self.coalesced = true;
            }
        }
    }

    /// Run a pass as soon as possible, skipping the debounce
    pub fn request_immediate(&mut self, now_ms: u64) {
        match self.state {
            SchedulerState::Idle | SchedulerState::Pending { .. } => {
                self.chain = 0;
                self.state = SchedulerState::Pending { due_ms: now_ms };
            }
            SchedulerState::Measuring { .. } | SchedulerState::Committing { .. } => {
                self.coalesced = true;
            }
        }
    }

    pub fn poll(&mut self, now_ms: u64) -> SchedulerAction {
        match self.state {
            SchedulerState::Idle => SchedulerAction::Sleep,
            SchedulerState::Pending { due_ms } if now_ms < due_ms => {
                SchedulerAction::Wait { until: due_ms }
            }
            SchedulerState::Pending { .. } => {
                let revision = self.latest_revision;
                self.coalesced = false;
                self.chain = 0;
                self.state = SchedulerState::Measuring {
                    revision,
                    attempts: 0,
                };
                SchedulerAction::RequestLayoutFrame { revision }
            }
            SchedulerState::Measuring { .. } | SchedulerState::Committing { .. } => {
                SchedulerAction::AwaitingFrame
            }
        }
    }

    /// Revision the in-flight pass targets
    pub fn measuring_revision(&self) -> Option<u64> {
        match self.state {
            SchedulerState::Measuring { revision, .. } => Some(revision),
            _ => None,
        }
    }

    /// The surface was not ready. Returns whether another frame may be
    /// awaited; `false` means the retry budget is spent.
    pub fn measurement_failed(&mut self) -> bool {
        match self.state {
            SchedulerState::Measuring { revision, attempts } => {
                let attempts = attempts + 1;
                self.state = SchedulerState::Measuring { revision, attempts };
                attempts <= self.config.max_measure_retries
            }
            _ => false,
        }
    }

    /// Measurement done, results are being committed
    pub fn begin_commit(&mut self) -> Option<u64> {
        match self.state {
            SchedulerState::Measuring { revision, .. } => {
                self.state = SchedulerState::Committing { revision };
                Some(revision)
            }
            _ => None,
        }
    }

    /// The pass is over. A change that arrived meanwhile schedules a new
    /// pass due immediately.
    pub fn finish(&mut self, now_ms: u64) {
        self.chain = 0;
        if self.coalesced {
            self.coalesced = false;
            self.state = SchedulerState::Pending { due_ms: now_ms };
        } else {
            self.state = SchedulerState::Idle;
        }
    }

    /// Drop a pass whose target revision is outdated and retry at once
    pub fn abort_stale(&mut self, now_ms: u64) {
        self.coalesced = false;
        self.chain = 0;
        self.state = SchedulerState::Pending { due_ms: now_ms };
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_and_json() {
        let config = SchedulerConfig::default();
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.initial_delay_ms, 150);

        let parsed: SchedulerConfig = serde_json::from_str(r#"{"debounceMs": 40}"#).unwrap();
        assert_eq!(parsed.debounce_ms, 40);
        assert_eq!(parsed.max_measure_retries, 3);
    }

    #[test]
    fn test_start_uses_initial_delay() {
        let mut s = Scheduler::default();
        s.start(0, 1000);
        assert_eq!(s.poll(1100), SchedulerAction::Wait { until: 1150 });
        assert_eq!(
            s.poll(1150),
            SchedulerAction::RequestLayoutFrame { revision: 0 }
        );
        assert_eq!(s.poll(1151), SchedulerAction::AwaitingFrame);
    }

    #[test]
    fn test_start_resets_revision() {
        let mut s = Scheduler::default();
        s.notify_change(9, 0);
        s.start(0, 0);
        assert_eq!(s.latest_revision(), 0);
        assert_eq!(s.poll(150), SchedulerAction::RequestLayoutFrame { revision: 0 });
    }

    #[test]
    fn test_debounce_extends_deadline() {
        let mut s = Scheduler::default();
        s.notify_change(1, 0);
        assert_eq!(s.state(), SchedulerState::Pending { due_ms: 100 });
        s.notify_change(2, 50);
        assert_eq!(s.state(), SchedulerState::Pending { due_ms: 150 });
        assert_eq!(s.poll(149), SchedulerAction::Wait { until: 150 });
        assert_eq!(
            s.poll(150),
            SchedulerAction::RequestLayoutFrame { revision: 2 }
        );
    }

    #[test]
    fn test_debounce_chain_is_bounded() {
        let config = SchedulerConfig {
            max_debounce_chain: 3,
            ..Default::default()
        };
        let mut s = Scheduler::new(config);
        s.notify_change(1, 0);
        for (i, now) in [10, 20, 30, 40, 50, 60].into_iter().enumerate() {
            s.notify_change(i as u64 + 2, now);
        }
        // Three extensions: 110, 120, 130, then fixed
        assert_eq!(s.state(), SchedulerState::Pending { due_ms: 130 });
        assert_eq!(
            s.poll(130),
            SchedulerAction::RequestLayoutFrame { revision: 7 }
        );
    }

    #[test]
    fn test_changes_during_pass_coalesce() {
        let mut s = Scheduler::default();
        s.request_immediate(0);
        assert_eq!(s.poll(0), SchedulerAction::RequestLayoutFrame { revision: 0 });

        s.notify_change(1, 5);
        s.notify_change(2, 6);
        assert!(s.is_coalesced());
        assert_eq!(s.begin_commit(), Some(0));
        s.notify_change(3, 7);

        s.finish(8);
        assert!(!s.is_coalesced());
        assert_eq!(s.state(), SchedulerState::Pending { due_ms: 8 });
        assert_eq!(s.poll(8), SchedulerAction::RequestLayoutFrame { revision: 3 });
    }

    #[test]
    fn test_finish_without_changes_goes_idle() {
        let mut s = Scheduler::default();
        s.request_immediate(0);
        s.poll(0);
        s.begin_commit();
        s.finish(1);
        assert!(s.is_idle());
        assert_eq!(s.poll(2), SchedulerAction::Sleep);
    }

    #[test]
    fn test_measurement_retries_are_bounded() {
        let mut s = Scheduler::default();
        s.request_immediate(0);
        s.poll(0);
        assert!(s.measurement_failed());
        assert!(s.measurement_failed());
        assert!(s.measurement_failed());
        assert!(!s.measurement_failed());
        assert_eq!(
            s.state(),
            SchedulerState::Measuring {
                revision: 0,
                attempts: 4
            }
        );
    }

    #[test]
    fn test_abort_stale_repends_immediately() {
        let mut s = Scheduler::default();
        s.notify_change(1, 0);
        s.poll(100);
        s.notify_change(2, 101);
        s.abort_stale(102);
        assert_eq!(s.state(), SchedulerState::Pending { due_ms: 102 });
        assert_eq!(s.poll(102), SchedulerAction::RequestLayoutFrame { revision: 2 });
    }

    #[test]
    fn test_out_of_phase_calls_are_ignored() {
        let mut s = Scheduler::default();
        assert!(!s.measurement_failed());
        assert_eq!(s.begin_commit(), None);
        assert_eq!(s.measuring_revision(), None);
    }
}
