//! Call capture: telephony state machine, call-log lookup and queueing

mod call_log;
mod capturer;
mod state;

pub use call_log::{CallLogProvider, StaticCallLog};
pub use capturer::{CallCapturer, CaptureOutcome};
pub use state::{
    CallPhase, CallStateMachine, CompletedCall, TelephonyEvent, TelephonyState, Transition,
};
