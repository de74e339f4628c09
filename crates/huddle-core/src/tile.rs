//! Participant tile presentation.
//!
//! A tile is derived from the participant's audio and video track states plus
//! a few caller-supplied flags. [`TileView::derive`] holds all of the
//! rendering decisions so the UI layer only has to draw what it is given.

use crate::track::{self, MediaKind, MediaTrack, TrackState};

/// Inputs for one participant tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileProps<'a> {
    /// Engine state of the participant's video track.
    pub video: Option<&'a TrackState>,
    /// Engine state of the participant's audio track.
    pub audio: Option<&'a TrackState>,
    /// Tile belongs to the local participant.
    pub is_local: bool,
    /// Tile is rendered large.
    pub is_large: bool,
    /// Never show the corner message.
    pub disable_corner_message: bool,
}

/// Tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSize {
    /// Featured tile.
    Large,
    /// Thumbnail tile.
    Small,
}

/// Everything the UI needs to draw one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileView {
    /// Video track to attach to a video element.
    pub video: Option<MediaTrack>,
    /// Audio track to attach to an audio element. Never set for the local
    /// participant.
    pub audio: Option<MediaTrack>,
    /// Centered overlay text, one entry per line. Empty when video plays.
    pub overlay: Vec<String>,
    /// Corner text about audio while video plays.
    pub corner: Option<String>,
    /// Tile size.
    pub size: TileSize,
    /// Tile belongs to the local participant.
    pub is_local: bool,
}

impl TileView {
    /// Derive the tile from its props.
    pub fn derive(props: &TileProps<'_>) -> Self {
        let video = props.video.and_then(TrackState::playable_track).cloned();
        let audio = if props.is_local {
            None
        } else {
            props.audio.and_then(TrackState::playable_track).cloned()
        };

        let video_message = track::resolve(MediaKind::Video, props.video);
        let audio_message = track::resolve(MediaKind::Audio, props.audio);

        let (overlay, corner) = match video_message {
            Some(video_message) => {
                (std::iter::once(video_message).chain(audio_message).collect::<Vec<_>>(), None)
            },
            None if props.disable_corner_message => (Vec::new(), None),
            None => (Vec::new(), audio_message),
        };

        Self {
            video,
            audio,
            overlay,
            corner,
            size: if props.is_large { TileSize::Large } else { TileSize::Small },
            is_local: props.is_local,
        }
    }

    /// Whether the overlay is shown.
    pub fn has_overlay(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// CSS class list for the tile container.
    pub fn class_names(&self) -> String {
        let mut names = String::from("tile");
        names.push_str(match self.size {
            TileSize::Large => " large",
            TileSize::Small => " small",
        });
        if self.is_local {
            names.push_str(" local");
        }
        names
    }
}
