//! Telephony state machine
//!
//! Turns the OS stream of call-state notifications into completed calls.
//! Nothing here touches the OS: feed it [`TelephonyEvent`]s and inspect the
//! returned [`Transition`].
//!
//! ```text
//! Idle ──RINGING──▶ Ringing ──OFFHOOK──▶ Active{answered} ──IDLE──▶ Idle (Ended)
//!   │                  └──────IDLE──────────────────────────────▶ Idle (Ended, missed)
//!   └──OFFHOOK──▶ Active{outgoing} ──IDLE──▶ Idle (Ended)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Phone call state as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TelephonyState {
    Idle,
    Ringing,
    #[serde(alias = "OFF_HOOK")]
    Offhook,
}

/// One OS call-state notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelephonyEvent {
    pub state: TelephonyState,
    /// Present on RINGING for incoming calls
    #[serde(default)]
    pub incoming_number: Option<String>,
    pub at: DateTime<Utc>,
}

impl TelephonyEvent {
    pub fn new(state: TelephonyState, at: DateTime<Utc>) -> Self {
        Self {
            state,
            incoming_number: None,
            at,
        }
    }

    pub fn ringing(number: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            state: TelephonyState::Ringing,
            incoming_number: Some(number.into()),
            at,
        }
    }
}

/// Where the tracked call currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    Ringing {
        number: Option<String>,
        since: DateTime<Utc>,
    },
    Active {
        number: Option<String>,
        since: DateTime<Utc>,
        /// Came through RINGING first
        answered: bool,
    },
}

/// A call that reached IDLE after RINGING or OFFHOOK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCall {
    /// Number seen on RINGING, if any
    pub number: Option<String>,
    /// Start of the call: activation time, or ringing time for unanswered calls
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Time spent off-hook; zero when the call never became active
    pub elapsed: Duration,
    /// The call went off-hook at some point
    pub went_active: bool,
    /// Answered incoming call (RINGING then OFFHOOK)
    pub answered: bool,
}

/// Result of feeding one event into the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Incoming call started ringing; nothing to record yet
    Ringing,
    /// Call became active
    Activated { answered: bool },
    /// Call finished; look up the call log and record it
    Ended(CompletedCall),
    /// Event carried no new information for the tracked call
    Ignored,
}

/// Tracks a single call at a time across telephony notifications
#[derive(Debug, Clone)]
pub struct CallStateMachine {
    phase: CallPhase,
}

impl Default for CallStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CallStateMachine {
    pub fn new() -> Self {
        Self {
            phase: CallPhase::Idle,
        }
    }

    pub fn phase(&self) -> &CallPhase {
        &self.phase
    }

    pub fn is_call_active(&self) -> bool {
        matches!(self.phase, CallPhase::Active { .. })
    }

    /// Apply one event and report what happened
    pub fn on_event(&mut self, event: &TelephonyEvent) -> Transition {
        let phase = std::mem::replace(&mut self.phase, CallPhase::Idle);

        let (next, transition) = match (phase, event.state) {
            (CallPhase::Idle, TelephonyState::Ringing) => {
                debug!(number = ?event.incoming_number, "Ringing");
                (
                    CallPhase::Ringing {
                        number: event.incoming_number.clone(),
                        since: event.at,
                    },
                    Transition::Ringing,
                )
            }
            // A repeated RINGING refreshes the number but keeps the first ring time
            (CallPhase::Ringing { number, since }, TelephonyState::Ringing) => (
                CallPhase::Ringing {
                    number: event.incoming_number.clone().or(number),
                    since,
                },
                Transition::Ignored,
            ),
            // Call waiting: keep tracking the call already in progress
            (active @ CallPhase::Active { .. }, TelephonyState::Ringing) => {
                debug!("Ringing while a call is active, ignoring");
                (active, Transition::Ignored)
            }

            (CallPhase::Idle, TelephonyState::Offhook) => {
                debug!("Outgoing call started");
                (
                    CallPhase::Active {
                        number: None,
                        since: event.at,
                        answered: false,
                    },
                    Transition::Activated { answered: false },
                )
            }
            (CallPhase::Ringing { number, .. }, TelephonyState::Offhook) => {
                debug!("Incoming call answered");
                (
                    CallPhase::Active {
                        number,
                        since: event.at,
                        answered: true,
                    },
                    Transition::Activated { answered: true },
                )
            }
            (active @ CallPhase::Active { .. }, TelephonyState::Offhook) => {
                (active, Transition::Ignored)
            }

            (CallPhase::Ringing { number, since }, TelephonyState::Idle) => {
                debug!("Ringing stopped without answer");
                (
                    CallPhase::Idle,
                    Transition::Ended(CompletedCall {
                        number,
                        started_at: since,
                        ended_at: event.at,
                        elapsed: Duration::zero(),
                        went_active: false,
                        answered: false,
                    }),
                )
            }
            (
                CallPhase::Active {
                    number,
                    since,
                    answered,
                },
                TelephonyState::Idle,
            ) => {
                let elapsed = (event.at - since).max(Duration::zero());
                debug!(elapsed_secs = elapsed.num_seconds(), "Call ended");
                (
                    CallPhase::Idle,
                    Transition::Ended(CompletedCall {
                        number,
                        started_at: since,
                        ended_at: event.at,
                        elapsed,
                        went_active: true,
                        answered,
                    }),
                )
            }
            (CallPhase::Idle, TelephonyState::Idle) => {
                warn!("Call state idle but no call was being tracked");
                (CallPhase::Idle, Transition::Ignored)
            }
        };

        self.phase = next;
        transition
    }

    /// Drop any tracked call
    pub fn reset(&mut self) {
        self.phase = CallPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_incoming_answered_flow() {
        let mut sm = CallStateMachine::new();

        assert_eq!(sm.on_event(&TelephonyEvent::ringing("+911234567890", t(0))), Transition::Ringing);
        assert_eq!(
            sm.on_event(&TelephonyEvent::new(TelephonyState::Offhook, t(5))),
            Transition::Activated { answered: true }
        );
        assert!(sm.is_call_active());

        let Transition::Ended(call) = sm.on_event(&TelephonyEvent::new(TelephonyState::Idle, t(65))) else {
            panic!("expected call to end");
        };
        // measured from answer, not from the first ring
        assert_eq!(call.elapsed, Duration::seconds(60));
        assert_eq!(call.started_at, t(5));
        assert!(call.answered);
        assert!(call.went_active);
        assert_eq!(call.number.as_deref(), Some("+911234567890"));
        assert_eq!(sm.phase(), &CallPhase::Idle);
    }

    #[test]
    fn test_outgoing_flow() {
        let mut sm = CallStateMachine::new();

        assert_eq!(
            sm.on_event(&TelephonyEvent::new(TelephonyState::Offhook, t(0))),
            Transition::Activated { answered: false }
        );
        let Transition::Ended(call) = sm.on_event(&TelephonyEvent::new(TelephonyState::Idle, t(30))) else {
            panic!("expected call to end");
        };
        assert!(!call.answered);
        assert!(call.went_active);
        assert_eq!(call.number, None);
    }

    #[test]
    fn test_ringing_then_idle_is_missed() {
        let mut sm = CallStateMachine::new();
        sm.on_event(&TelephonyEvent::ringing("555", t(0)));

        let Transition::Ended(call) = sm.on_event(&TelephonyEvent::new(TelephonyState::Idle, t(20))) else {
            panic!("expected call to end");
        };
        assert!(!call.went_active);
        assert_eq!(call.elapsed, Duration::zero());
    }

    #[test]
    fn test_stray_events_are_ignored() {
        let mut sm = CallStateMachine::new();
        assert_eq!(sm.on_event(&TelephonyEvent::new(TelephonyState::Idle, t(0))), Transition::Ignored);

        sm.on_event(&TelephonyEvent::new(TelephonyState::Offhook, t(1)));
        assert_eq!(sm.on_event(&TelephonyEvent::new(TelephonyState::Offhook, t(2))), Transition::Ignored);
        // call waiting does not drop the active call
        assert_eq!(sm.on_event(&TelephonyEvent::ringing("999", t(3))), Transition::Ignored);
        assert!(sm.is_call_active());

        sm.reset();
        assert_eq!(sm.phase(), &CallPhase::Idle);
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"{"state":"RINGING","incoming_number":"+91999","at":"2024-01-01T10:00:00Z"}"#;
        let event: TelephonyEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.state, TelephonyState::Ringing);

        let idle: TelephonyEvent = serde_json::from_str(r#"{"state":"IDLE","at":"2024-01-01T10:00:09Z"}"#).unwrap();
        assert_eq!(idle.incoming_number, None);
    }
}
