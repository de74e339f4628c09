//! Core
//!
//! Pure domain types for huddle call sessions: the session lifecycle, room
//! addresses, media track availability and tile presentation.
//!
//! Nothing in this crate performs I/O. The session controller and runtime in
//! `huddle-app` build on these types, and the UI layer consumes the derived
//! views directly.
//!
//! # Components
//!
//! - [`session`]: [`SessionState`] machine edges and engine meeting events
//! - [`address`]: [`RoomHandle`] and the page-path [`RoomAddressCodec`]
//! - [`track`]: [`TrackState`] classification into tile messages
//! - [`tile`]: per-participant [`TileView`] derivation
//! - [`error`]: typed errors for each layer

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod address;
pub mod error;
pub mod session;
pub mod tile;
pub mod track;

pub use address::{ROOT_PATH, RoomAddressCodec, RoomHandle};
pub use error::{AddressError, ProvisionError, SessionError};
pub use session::{
    EngineSessionId, MeetingEvent, MeetingEventKind, MeetingStatus, ProvisionRequestId,
    SessionState,
};
pub use tile::{TileProps, TileSize, TileView};
pub use track::{BlockedReason, MediaKind, MediaTrack, OffReason, TrackState, TrackStatus};
