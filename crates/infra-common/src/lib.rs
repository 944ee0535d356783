//! Common infrastructure for the rtcast client stack.
//!
//! This crate carries the concerns every rtcast component shares:
//!
//! - **Disposables**: scoped ownership of timers, tasks and subscriptions,
//!   released in bulk and exactly once (see [`disposable`])
//! - **Logging**: `tracing` subscriber setup with env-filter support
//!   (see [`logging`])
//! - **Errors**: the small error type used by the infrastructure itself
//!
//! Components in `rtcast-client-core` register every spawned task and timer
//! in a [`disposable::DisposableList`] owned by the component, so tearing a
//! component down is a single idempotent call and no callback can fire after
//! it returns.

pub mod disposable;
pub mod error;
pub mod logging;

pub use disposable::{AbortOnDispose, Disposable, DisposableList, DisposeFn};
pub use error::{Error, Result};
pub use logging::{setup_logging, LoggingConfig};
