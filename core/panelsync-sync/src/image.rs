//! Video frame helpers.

use crate::error::{SyncError, SyncResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::borrow::Cow;

/// Header prepended to bare base64 JPEG frames.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Turns a frame into an image source.
///
/// Frames that already carry a `data:` header pass through unchanged. Bare
/// base64 is checked and prefixed with the JPEG header. Empty frames yield
/// `None`.
pub fn data_uri(frame: &str) -> SyncResult<Option<Cow<'_, str>>> {
    let frame = frame.trim();
    if frame.is_empty() {
        return Ok(None);
    }
    if frame.starts_with("data:") {
        return Ok(Some(Cow::Borrowed(frame)));
    }
    STANDARD
        .decode(frame)
        .map_err(|e| SyncError::Protocol(format!("invalid base64 frame: {e}")))?;
    Ok(Some(Cow::Owned(format!("{JPEG_DATA_URI_PREFIX}{frame}"))))
}
