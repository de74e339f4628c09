//! Media track availability.
//!
//! The engine reports a [`TrackState`] per participant and media kind. This
//! module classifies those states into a [`TrackStatus`] and renders the short
//! message shown on a participant's tile. Everything here is pure and runs on
//! every render.

use std::fmt;

/// Media kind of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Microphone audio.
    Audio,
    /// Camera video.
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Opaque handle to a playable media track owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaTrack {
    id: String,
}

impl MediaTrack {
    /// Wrap an engine track id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Engine track id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Why a track is blocked. Both flags may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockedReason {
    /// The user or browser denied device permission.
    pub by_permissions: bool,
    /// No capture device is present.
    pub by_device_missing: bool,
}

/// Why a track is off. Both flags may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OffReason {
    /// The participant muted the track.
    pub by_user: bool,
    /// The engine paused the track to save bandwidth.
    pub by_bandwidth: bool,
}

/// Engine-reported state of one track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackState {
    /// Track cannot be produced.
    Blocked(BlockedReason),
    /// Track is turned off.
    Off(OffReason),
    /// Track exists upstream but this client is not subscribed to it.
    Sendable,
    /// Track is being set up.
    Loading,
    /// Track was playing and dropped out.
    Interrupted,
    /// Track is live.
    Playable(MediaTrack),
}

impl TrackState {
    /// The live track, if playable.
    pub fn playable_track(&self) -> Option<&MediaTrack> {
        match self {
            Self::Playable(track) => Some(track),
            _ => None,
        }
    }
}

/// Why a track cannot be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    /// Device permission denied.
    PermissionDenied,
    /// No capture device.
    DeviceMissing,
    /// Blocked for an unreported reason.
    Blocked,
    /// Muted by the participant.
    Muted,
    /// Paused by the engine to save bandwidth.
    MutedForBandwidth,
    /// Off for an unreported reason.
    Off,
    /// Available upstream but not subscribed.
    NotSubscribed,
    /// Still loading.
    Loading,
    /// Dropped out.
    Interrupted,
}

impl TrackStatus {
    /// Tile message for a track of `kind` in this status.
    pub fn message(self, kind: MediaKind) -> String {
        let suffix = match self {
            Self::PermissionDenied => "permission denied",
            Self::DeviceMissing => "device missing",
            Self::Blocked => "blocked",
            Self::Muted => "muted",
            Self::MutedForBandwidth => "muted to save bandwidth",
            Self::Off => "off",
            Self::NotSubscribed => "not subscribed",
            Self::Loading => "loading...",
            Self::Interrupted => "interrupted",
        };
        format!("{kind} {suffix}")
    }
}

/// Classify a track state. `None` when there is nothing to report.
///
/// Permission denial wins over a missing device, and a user mute wins over a
/// bandwidth mute.
pub fn classify(state: Option<&TrackState>) -> Option<TrackStatus> {
    let status = match state? {
        TrackState::Blocked(reason) if reason.by_permissions => TrackStatus::PermissionDenied,
        TrackState::Blocked(reason) if reason.by_device_missing => TrackStatus::DeviceMissing,
        TrackState::Blocked(_) => TrackStatus::Blocked,
        TrackState::Off(reason) if reason.by_user => TrackStatus::Muted,
        TrackState::Off(reason) if reason.by_bandwidth => TrackStatus::MutedForBandwidth,
        TrackState::Off(_) => TrackStatus::Off,
        TrackState::Sendable => TrackStatus::NotSubscribed,
        TrackState::Loading => TrackStatus::Loading,
        TrackState::Interrupted => TrackStatus::Interrupted,
        TrackState::Playable(_) => return None,
    };
    Some(status)
}

/// Unavailability message for a track, or `None` if it is absent or playable.
pub fn resolve(kind: MediaKind, state: Option<&TrackState>) -> Option<String> {
    classify(state).map(|status| status.message(kind))
}
