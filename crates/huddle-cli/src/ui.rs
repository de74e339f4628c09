//! Text rendering of the call screen.
//!
//! Draws the published [`SessionView`] and one line per participant tile.
//! The tile decisions themselves come from [`TileView::derive`]; this module
//! only lays them out.

use huddle_app::SessionView;
use huddle_core::{TileProps, TileView, TrackState};

/// A participant as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Display name.
    pub name: String,
    /// Video track state.
    pub video: Option<TrackState>,
    /// Audio track state.
    pub audio: Option<TrackState>,
    /// The local participant.
    pub is_local: bool,
}

/// Derive tiles for `participants`.
///
/// Remote participants are featured large. The local participant is a small
/// thumbnail, unless alone in the call.
pub fn tiles(participants: &[Participant]) -> Vec<(&str, TileView)> {
    let alone = participants.iter().all(|p| p.is_local);
    participants
        .iter()
        .map(|participant| {
            let props = TileProps {
                video: participant.video.as_ref(),
                audio: participant.audio.as_ref(),
                is_local: participant.is_local,
                is_large: !participant.is_local || alone,
                disable_corner_message: false,
            };
            (participant.name.as_str(), TileView::derive(&props))
        })
        .collect()
}

/// One tile as a single line.
pub fn tile_line(name: &str, tile: &TileView) -> String {
    let mut line = format!("[{}] {name}", tile.class_names());
    if let Some(video) = &tile.video {
        line.push_str(&format!(" video={}", video.id()));
    }
    if let Some(audio) = &tile.audio {
        line.push_str(&format!(" audio={}", audio.id()));
    }
    if tile.has_overlay() {
        line.push_str(&format!(" | {}", tile.overlay.join(" / ")));
    }
    if let Some(corner) = &tile.corner {
        line.push_str(&format!(" ({corner})"));
    }
    line
}

/// Render the whole screen.
pub fn render(view: &SessionView, path: &str, participants: &[Participant]) -> Vec<String> {
    let mut lines = vec![format!("{path} ({})", view.state)];

    if !view.shows_call() {
        let start = if view.can_start() { "[ start call ]" } else { "[ start call (disabled) ]" };
        lines.push(start.to_string());
        return lines;
    }

    if let Some(message) = view.call_message() {
        lines.push(format!("<{}> {}: {}", message.class_names(), message.header, message.detail));
    }
    lines.extend(tiles(participants).iter().map(|(name, tile)| tile_line(name, tile)));

    let leave = if view.can_leave() { "[ leave ]" } else { "[ leave (disabled) ]" };
    lines.push(leave.to_string());
    lines
}
