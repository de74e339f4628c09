//! Room addresses and their page-path encoding.
//!
//! A room is reachable at a [`RoomHandle`] address. The page the client runs
//! on mirrors the active room in its path (`/<room-id>`) so the address can be
//! shared and reopened as a deep link. [`RoomAddressCodec`] owns both
//! directions of that mapping.

use std::fmt;

use crate::error::AddressError;

/// Path of the page when no room is active.
pub const ROOT_PATH: &str = "/";

/// Address of a call room.
///
/// Immutable once parsed. The room identifier is the last `/`-separated
/// segment of the address, so both a bare identifier (`"abc"`) and a full room
/// URL (`"https://team.example.com/abc"`) are valid handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomHandle {
    url: String,
}

impl RoomHandle {
    /// Parse a room address.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// - [`AddressError::Empty`] if nothing is left after trimming
    /// - [`AddressError::Whitespace`] if the address contains inner whitespace
    /// - [`AddressError::NotASegment`] if no identifier segment remains
    pub fn parse(url: &str) -> Result<Self, AddressError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AddressError::Empty);
        }
        if url.chars().any(char::is_whitespace) {
            return Err(AddressError::Whitespace(url.to_string()));
        }
        let handle = Self { url: url.to_string() };
        if handle.identifier().is_empty() {
            return Err(AddressError::NotASegment(handle.url));
        }
        Ok(handle)
    }

    /// Full room address.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Room identifier: the last non-empty path segment of the address.
    pub fn identifier(&self) -> &str {
        let trimmed = self.url.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

impl fmt::Display for RoomHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Maps room handles to page paths and back.
///
/// Without a base URL the identifier itself is the room address. With a base
/// URL, a path identifier `abc` resolves to `<base>/abc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomAddressCodec {
    base: Option<String>,
}

impl RoomAddressCodec {
    /// Codec that treats identifiers as complete room addresses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that resolves identifiers against a room base URL.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] if the base is not a valid address.
    pub fn with_base(base: &str) -> Result<Self, AddressError> {
        let base = RoomHandle::parse(base)?;
        Ok(Self { base: Some(base.url().trim_end_matches('/').to_string()) })
    }

    /// Room base URL, if configured.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Room encoded in a page path, if any.
    ///
    /// The path must consist of exactly one non-empty segment once leading
    /// and trailing slashes are removed.
    pub fn room_from_path(&self, path: &str) -> Option<RoomHandle> {
        let id = path.trim().trim_matches('/');
        if id.is_empty() || id.contains('/') {
            return None;
        }
        match &self.base {
            Some(base) => RoomHandle::parse(&format!("{base}/{id}")).ok(),
            None => RoomHandle::parse(id).ok(),
        }
    }

    /// Page path that encodes `room`. [`ROOT_PATH`] when there is no room.
    pub fn path_for(&self, room: Option<&RoomHandle>) -> String {
        match room {
            Some(room) => format!("/{}", room.identifier()),
            None => ROOT_PATH.to_string(),
        }
    }
}
