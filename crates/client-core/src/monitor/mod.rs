//! Session retry orchestration
//!
//! A stream session can terminate for reasons with very different meanings:
//! a transient fault should heal silently, a capacity push-back should heal
//! after a delay, an application-level stop belongs to the caller. The
//! [`RetryPolicy`] maps each [`TerminationReason`] to one decision and the
//! [`SessionMonitor`] carries the decision out against the transport,
//! reporting only caller-visible transitions through [`MonitorHandler`].

mod orchestrator;
mod policy;

pub use orchestrator::{
    MonitorConfig, MonitorHandler, MonitorRegistry, MonitorState, RetryHandle, SessionHandle,
    SessionMonitor, SessionParams, SessionTransport, TerminationFeed, TerminationNotice,
};
pub use policy::{RetryDecision, RetryPolicy, TerminationEvent, TerminationReason};
