//! Room snapshot model
//!
//! Stream selection works over a read-only snapshot of the room: the member
//! list as the signaling layer last reported it. Field and variant names
//! mirror the wire protocol (camelCase fields, capitalized enum values,
//! `lastUpdate` in epoch milliseconds), so snapshots deserialize directly
//! from signaling payloads. Selection never mutates a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a room member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    Presenter,
    Moderator,
    Participant,
    Audience,
}

/// Presence state of a room member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberState {
    Active,
    Passive,
    HandRaised,
    Inactive,
    Offline,
}

/// Kind of published stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamType {
    User,
    Presentation,
    Audio,
}

/// State of one media track on a published stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    TrackEnabled,
    TrackDisabled,
    TrackEnded,
}

/// One stream published by a member. Identity is the uri.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub uri: String,
    #[serde(rename = "type")]
    pub stream_type: StreamType,
    pub audio_state: TrackState,
    pub video_state: TrackState,
}

/// A member in a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub session_id: String,
    pub screen_name: String,
    pub role: MemberRole,
    pub state: MemberState,
    pub streams: Vec<Stream>,
    /// When the signaling layer last updated this member
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_update: DateTime<Utc>,
}
