//! Stream selection and failover
//!
//! Joining a channel means picking one remote stream out of the candidates
//! the room snapshot offers. The strategy fixes the attempt order up front;
//! the join attempt then walks that order, moving a candidate to the
//! exhausted set on every failure. A candidate is never attempted twice
//! within one attempt, so a flapping stream cannot capture the join loop.
//! When the order is exhausted the attempt fails as a whole; retrying is
//! the caller's decision.

use std::collections::VecDeque;
use std::str::FromStr;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::room::{Member, Stream};

const ENDED_CHANNEL_CAPACITY: usize = 16;

/// Order in which stream candidates are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Most recently updated member first
    MostRecent,
    /// Members marked `primary` first, then `alternate`, then the rest;
    /// most recently updated within each group
    HighAvailability,
}

impl FromStr for SelectionStrategy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most-recent" => Ok(SelectionStrategy::MostRecent),
            "high-availability" => Ok(SelectionStrategy::HighAvailability),
            other => Err(ClientError::invalid_configuration(
                "strategy",
                format!("unknown selection strategy: {}", other),
            )),
        }
    }
}

/// One (member, stream) pair in strategy order.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamCandidate {
    pub member: Member,
    pub stream: Stream,
}

/// Notice that a remote stream ended, delivered into an in-flight attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEnded {
    pub uri: String,
}

/// Reports stream-ended notices into a join attempt.
#[derive(Debug, Clone)]
pub struct StreamEndedFeed {
    tx: mpsc::Sender<StreamEnded>,
}

impl StreamEndedFeed {
    pub async fn report(&self, event: StreamEnded) -> ClientResult<()> {
        self.tx.send(event).await.map_err(|_| ClientError::Disposed)
    }
}

/// Handle to an established subscription, produced by the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub subscription_id: String,
}

/// Subscribes to one remote stream.
///
/// Called once per candidate; a returned error exhausts that candidate and
/// the attempt moves on.
#[async_trait]
pub trait StreamSubscriber: Send + Sync {
    async fn subscribe(&self, member: &Member, stream: &Stream) -> ClientResult<SubscriptionHandle>;
}

/// A successful selection.
#[derive(Debug)]
pub struct Selection {
    pub member_session_id: String,
    pub stream_uri: String,
    pub handle: SubscriptionHandle,
}

enum AttemptOutcome {
    Finished(ClientResult<SubscriptionHandle>),
    Abandoned,
}

/// One attempt to join a channel.
///
/// All selection state is per-attempt, so concurrent attempts over the same
/// snapshot proceed independently.
///
/// # Examples
///
/// ```rust,no_run
/// # use rtcast_client_core::room::Member;
/// # use rtcast_client_core::selection::{JoinAttempt, SelectionStrategy, StreamSubscriber};
/// # async fn example(members: Vec<Member>, subscriber: &dyn StreamSubscriber) {
/// let mut attempt = JoinAttempt::new(&members, SelectionStrategy::MostRecent);
/// match attempt.run(subscriber).await {
///     Ok(selection) => println!("joined {}", selection.stream_uri),
///     Err(e) => eprintln!("join failed: {}", e),
/// }
/// # }
/// ```
pub struct JoinAttempt {
    candidates: VecDeque<StreamCandidate>,
    exhausted: usize,
    event_tx: mpsc::Sender<StreamEnded>,
    event_rx: mpsc::Receiver<StreamEnded>,
}

impl JoinAttempt {
    /// Build the strategy-ordered candidate list from a room snapshot.
    pub fn new(members: &[Member], strategy: SelectionStrategy) -> Self {
        let candidates: VecDeque<StreamCandidate> =
            rank_candidates(members, strategy).into_iter().collect();
        let (event_tx, event_rx) = mpsc::channel(ENDED_CHANNEL_CAPACITY);
        Self { candidates, exhausted: 0, event_tx, event_rx }
    }

    /// Feed for stream-ended notices observed while this attempt runs.
    pub fn feed(&self) -> StreamEndedFeed {
        StreamEndedFeed { tx: self.event_tx.clone() }
    }

    /// Candidates not yet attempted.
    pub fn remaining(&self) -> usize {
        self.candidates.len()
    }

    /// Attempt candidates in order until one subscribes.
    ///
    /// A stream-ended notice for the candidate currently being attempted
    /// abandons that attempt and advances; notices for any other stream are
    /// ignored and do not disturb the in-flight attempt.
    pub async fn run(&mut self, subscriber: &dyn StreamSubscriber) -> ClientResult<Selection> {
        while let Some(candidate) = self.candidates.pop_front() {
            let uri = candidate.stream.uri.clone();
            debug!(
                member = %candidate.member.screen_name,
                stream = %uri,
                "attempting stream candidate"
            );

            let subscribe = subscriber.subscribe(&candidate.member, &candidate.stream);
            tokio::pin!(subscribe);

            let outcome = loop {
                tokio::select! {
                    result = &mut subscribe => break AttemptOutcome::Finished(result),
                    Some(event) = self.event_rx.recv() => {
                        if event.uri == uri {
                            break AttemptOutcome::Abandoned;
                        }
                        debug!(stream = %event.uri, "ignoring ended notice for another stream");
                    }
                }
            };

            match outcome {
                AttemptOutcome::Finished(Ok(handle)) => {
                    debug!(stream = %uri, "stream candidate selected");
                    return Ok(Selection {
                        member_session_id: candidate.member.session_id.clone(),
                        stream_uri: uri,
                        handle,
                    });
                }
                AttemptOutcome::Finished(Err(e)) => {
                    warn!(stream = %uri, error = %e, "stream candidate failed, trying next");
                    self.exhausted += 1;
                }
                AttemptOutcome::Abandoned => {
                    debug!(stream = %uri, "stream ended during attempt, trying next");
                    self.exhausted += 1;
                }
            }
        }

        Err(ClientError::CandidatesExhausted { attempted: self.exhausted })
    }
}

/// Join with a strategy given by its wire name.
///
/// Unknown names fail with
/// [`ClientError::InvalidConfiguration`] before any candidate is attempted.
pub async fn join_with_strategy(
    members: &[Member],
    strategy: &str,
    subscriber: &dyn StreamSubscriber,
) -> ClientResult<Selection> {
    let strategy = SelectionStrategy::from_str(strategy)?;
    let mut attempt = JoinAttempt::new(members, strategy);
    attempt.run(subscriber).await
}

fn rank_candidates(members: &[Member], strategy: SelectionStrategy) -> Vec<StreamCandidate> {
    let mut candidates: Vec<StreamCandidate> = members
        .iter()
        .flat_map(|member| {
            member.streams.iter().map(move |stream| StreamCandidate {
                member: member.clone(),
                stream: stream.clone(),
            })
        })
        .collect();

    // Sorts are stable, so candidates that compare equal keep the order the
    // snapshot listed them in.
    match strategy {
        SelectionStrategy::MostRecent => {
            candidates.sort_by(|a, b| b.member.last_update.cmp(&a.member.last_update));
        }
        SelectionStrategy::HighAvailability => {
            candidates.sort_by(|a, b| {
                availability_rank(&a.member)
                    .cmp(&availability_rank(&b.member))
                    .then_with(|| b.member.last_update.cmp(&a.member.last_update))
            });
        }
    }

    candidates
}

fn availability_rank(member: &Member) -> u8 {
    let name = member.screen_name.to_lowercase();
    if name.contains("primary") {
        0
    } else if name.contains("alternate") {
        1
    } else {
        2
    }
}
