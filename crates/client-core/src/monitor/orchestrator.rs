//! The session monitor.
//!
//! One monitor owns one stream session. Termination events feed a single
//! consuming loop; the loop applies the retry policy, drives the transport
//! and invokes the handler. Processing is strictly one event at a time in
//! arrival order, and no event is consumed while a retry attempt or backoff
//! timer for a previous event is still pending, so callers never observe
//! interleaved retries.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use rtcast_infra_common::disposable::{AbortOnDispose, DisposableList};

use crate::error::{ClientError, ClientResult};

use super::policy::{RetryDecision, RetryPolicy, TerminationEvent, TerminationReason};

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Parameters a transport needs to establish a stream session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    /// Stream or channel uri to establish against
    pub uri: String,
    /// Capability tokens forwarded to the transport
    pub capabilities: Vec<String>,
}

impl SessionParams {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), capabilities: Vec::new() }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// An established stream session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    pub session_id: String,
    pub stream_id: String,
}

/// Establishes stream sessions on behalf of a monitor.
///
/// Called once when the monitor starts and once per retry attempt. Each
/// successful call yields a fresh [`SessionHandle`].
#[async_trait]
pub trait SessionTransport: Send + Sync {
    async fn establish(&self, params: &SessionParams) -> ClientResult<SessionHandle>;
}

/// Callbacks surfaced by a session monitor.
#[async_trait]
pub trait MonitorHandler: Send + Sync {
    /// A session is up. Fires for the initial establishment and again after
    /// every successful retry.
    async fn on_established(&self, session: &SessionHandle);

    /// A termination reached the caller. Silent retries never fire this;
    /// each caller-visible transition fires it exactly once.
    async fn on_termination(&self, notice: TerminationNotice);

    /// A retry attempt failed. The monitor has stopped; no further
    /// callbacks will follow.
    async fn on_failure(&self, error: ClientError);
}

/// A termination surfaced to the caller.
#[derive(Debug)]
pub struct TerminationNotice {
    pub reason: TerminationReason,
    pub session_id: String,
    pub stream_id: String,
    /// Present when the caller may ask for another attempt
    pub retry: Option<RetryHandle>,
}

/// Caller-driven retry for a surfaced termination.
///
/// Consuming the handle sends one retry request to the monitor; the request
/// is ignored unless the monitor is still awaiting the caller.
#[derive(Debug)]
pub struct RetryHandle {
    tx: mpsc::Sender<MonitorCommand>,
}

impl RetryHandle {
    pub async fn retry(self) -> ClientResult<()> {
        self.tx
            .send(MonitorCommand::Retry)
            .await
            .map_err(|_| ClientError::Disposed)
    }
}

/// Reports termination events into a monitor.
///
/// Cloneable so the signaling layer can hold it independently of the
/// monitor's own lifetime; reporting into a stopped monitor yields
/// [`ClientError::Disposed`].
#[derive(Debug, Clone)]
pub struct TerminationFeed {
    tx: mpsc::Sender<MonitorCommand>,
}

impl TerminationFeed {
    pub async fn report(&self, event: TerminationEvent) -> ClientResult<()> {
        self.tx
            .send(MonitorCommand::Terminated(event))
            .await
            .map_err(|_| ClientError::Disposed)
    }
}

#[derive(Debug)]
enum MonitorCommand {
    Terminated(TerminationEvent),
    Retry,
}

/// Lifecycle states of a monitored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// A session is up and being watched
    Active,
    /// A termination event is being mapped to a decision
    Deciding,
    /// A silent retry is in flight
    RetryingNow,
    /// A backoff timer is running ahead of a silent retry
    RetryingAfterDelay,
    /// The caller was notified and holds the retry decision
    AwaitingCaller,
    /// The monitor has stopped
    Terminal,
}

/// Configuration for a session monitor.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Reason-keyed retry policy
    pub policy: RetryPolicy,
    /// Registry the monitor keeps its feed registered in, when routing by
    /// stream id is wanted
    pub registry: Option<Arc<MonitorRegistry>>,
}

impl MonitorConfig {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_registry(mut self, registry: Arc<MonitorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }
}

/// Routes termination events to live monitors by stream id.
///
/// Monitors started with [`MonitorConfig::with_registry`] keep their entry
/// current across retries (each retry produces a new stream id) and remove
/// it when they stop.
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    entries: DashMap<String, TerminationFeed>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Register a feed for a stream id.
    pub fn insert(&self, stream_id: impl Into<String>, feed: TerminationFeed) {
        self.entries.insert(stream_id.into(), feed);
    }

    /// Drop the feed registered for a stream id, if any.
    pub fn remove(&self, stream_id: &str) {
        self.entries.remove(stream_id);
    }

    /// Deliver an event to the monitor watching its stream.
    ///
    /// Returns whether a monitor received it; events for unknown streams
    /// are dropped with a debug log.
    pub async fn dispatch(&self, event: TerminationEvent) -> bool {
        let feed = match self.entries.get(&event.stream_id) {
            Some(entry) => entry.value().clone(),
            None => {
                debug!(stream_id = %event.stream_id, "no monitor registered for stream");
                return false;
            }
        };
        feed.report(event).await.is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct MonitorShared {
    state: Mutex<MonitorState>,
    session: Mutex<SessionHandle>,
}

// A poisoned mirror must not take the monitor down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// Watches one stream session and orchestrates retries.
///
/// [`start`](Self::start) establishes the first session, fires
/// [`MonitorHandler::on_established`] and spawns the orchestration loop.
/// The signaling layer reports terminations through [`feed`](Self::feed)
/// (or a [`MonitorRegistry`]); the policy decides per reason whether the
/// monitor retries silently, waits out a backoff, hands the decision to the
/// caller or stops.
///
/// Dropping or disposing the monitor aborts the loop; no callback fires
/// afterwards.
pub struct SessionMonitor {
    id: Uuid,
    command_tx: mpsc::Sender<MonitorCommand>,
    shared: Arc<MonitorShared>,
    registry: Option<Arc<MonitorRegistry>>,
    disposables: Arc<DisposableList>,
}

impl SessionMonitor {
    /// Establish the first session and start monitoring it.
    ///
    /// A failed first establishment is returned directly; the handler is
    /// not invoked and nothing is spawned.
    pub async fn start(
        params: SessionParams,
        config: MonitorConfig,
        transport: Arc<dyn SessionTransport>,
        handler: Arc<dyn MonitorHandler>,
    ) -> ClientResult<SessionMonitor> {
        let session = transport.establish(&params).await?;
        info!(
            session_id = %session.session_id,
            stream_id = %session.stream_id,
            "session established"
        );
        handler.on_established(&session).await;

        let id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let shared = Arc::new(MonitorShared {
            state: Mutex::new(MonitorState::Active),
            session: Mutex::new(session.clone()),
        });
        let disposables = Arc::new(DisposableList::new());

        if let Some(registry) = &config.registry {
            registry.insert(&session.stream_id, TerminationFeed { tx: command_tx.clone() });
        }

        let monitor_loop = MonitorLoop {
            id,
            params,
            policy: config.policy.clone(),
            transport,
            handler,
            shared: shared.clone(),
            registry: config.registry.clone(),
            command_tx: command_tx.clone(),
        };
        let task = tokio::spawn(monitor_loop.run(command_rx));
        disposables.add(AbortOnDispose::new(task.abort_handle()));

        Ok(SessionMonitor { id, command_tx, shared, registry: config.registry, disposables })
    }

    /// Monitor identity, for logs and registries
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> MonitorState {
        *lock(&self.shared.state)
    }

    /// The session currently being watched
    pub fn session(&self) -> SessionHandle {
        lock(&self.shared.session).clone()
    }

    /// A feed for reporting termination events into this monitor
    pub fn feed(&self) -> TerminationFeed {
        TerminationFeed { tx: self.command_tx.clone() }
    }

    /// Stop monitoring. Idempotent; no callback fires after this returns.
    pub fn dispose(&self) {
        if self.disposables.is_disposed() {
            return;
        }
        debug!(monitor_id = %self.id, "disposing session monitor");
        if let Some(registry) = &self.registry {
            registry.remove(&self.session().stream_id);
        }
        self.disposables.dispose();
        *lock(&self.shared.state) = MonitorState::Terminal;
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct MonitorLoop {
    id: Uuid,
    params: SessionParams,
    policy: RetryPolicy,
    transport: Arc<dyn SessionTransport>,
    handler: Arc<dyn MonitorHandler>,
    shared: Arc<MonitorShared>,
    registry: Option<Arc<MonitorRegistry>>,
    command_tx: mpsc::Sender<MonitorCommand>,
}

impl MonitorLoop {
    async fn run(self, mut rx: mpsc::Receiver<MonitorCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                MonitorCommand::Terminated(event) => {
                    if !self.handle_termination(event).await {
                        break;
                    }
                }
                MonitorCommand::Retry => {
                    if self.state() != MonitorState::AwaitingCaller {
                        debug!(
                            monitor_id = %self.id,
                            state = ?self.state(),
                            "ignoring retry in current state"
                        );
                        continue;
                    }
                    self.set_state(MonitorState::RetryingNow);
                    if !self.reestablish().await {
                        break;
                    }
                }
            }
        }

        self.set_state(MonitorState::Terminal);
        if let Some(registry) = &self.registry {
            registry.remove(&self.current_session().stream_id);
        }
        debug!(monitor_id = %self.id, "monitor loop ended");
    }

    /// Returns false when the loop must stop.
    async fn handle_termination(&self, event: TerminationEvent) -> bool {
        let current = self.current_session();
        if event.stream_id != current.stream_id {
            debug!(
                monitor_id = %self.id,
                stream_id = %event.stream_id,
                "ignoring termination for a stream this monitor no longer watches"
            );
            return true;
        }

        self.set_state(MonitorState::Deciding);
        let decision = self.policy.decide(event.reason);
        debug!(
            monitor_id = %self.id,
            reason = ?event.reason,
            decision = ?decision,
            "termination decision"
        );

        match decision {
            RetryDecision::RetryImmediately => {
                self.set_state(MonitorState::RetryingNow);
                self.reestablish().await
            }
            RetryDecision::RetryAfterDelay(delay) => {
                self.set_state(MonitorState::RetryingAfterDelay);
                debug!(
                    monitor_id = %self.id,
                    delay_ms = delay.as_millis() as u64,
                    "delaying retry"
                );
                sleep(delay).await;
                self.reestablish().await
            }
            RetryDecision::SurfaceToCaller => {
                self.set_state(MonitorState::AwaitingCaller);
                let notice = TerminationNotice {
                    reason: event.reason,
                    session_id: event.session_id,
                    stream_id: event.stream_id,
                    retry: Some(RetryHandle { tx: self.command_tx.clone() }),
                };
                self.handler.on_termination(notice).await;
                true
            }
            RetryDecision::Terminal => {
                self.set_state(MonitorState::Terminal);
                let notice = TerminationNotice {
                    reason: event.reason,
                    session_id: event.session_id,
                    stream_id: event.stream_id,
                    retry: None,
                };
                self.handler.on_termination(notice).await;
                false
            }
        }
    }

    /// Returns false when establishment failed and the loop must stop.
    async fn reestablish(&self) -> bool {
        match self.transport.establish(&self.params).await {
            Ok(session) => {
                info!(
                    monitor_id = %self.id,
                    session_id = %session.session_id,
                    stream_id = %session.stream_id,
                    "session re-established"
                );
                if let Some(registry) = &self.registry {
                    registry.remove(&self.current_session().stream_id);
                    registry.insert(&session.stream_id, TerminationFeed {
                        tx: self.command_tx.clone(),
                    });
                }
                *lock(&self.shared.session) = session.clone();
                self.handler.on_established(&session).await;
                self.set_state(MonitorState::Active);
                true
            }
            Err(e) => {
                let error = match e {
                    ClientError::SessionEstablishmentFailed { .. } => e,
                    other => ClientError::SessionEstablishmentFailed { reason: other.to_string() },
                };
                warn!(monitor_id = %self.id, error = %error, "retry failed, stopping monitor");
                self.set_state(MonitorState::Terminal);
                self.handler.on_failure(error).await;
                false
            }
        }
    }

    fn state(&self) -> MonitorState {
        *lock(&self.shared.state)
    }

    fn set_state(&self, state: MonitorState) {
        *lock(&self.shared.state) = state;
    }

    fn current_session(&self) -> SessionHandle {
        lock(&self.shared.session).clone()
    }
}
