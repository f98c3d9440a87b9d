//! Capture protocol for the rendering engine's one-way export side channel.
//!
//! The engine's only export mechanism is to synthesize a browser-level
//! "download this file" action, with no return value. To turn that side
//! effect into bytes, this crate models the two browser primitives the
//! export path touches (the download delivery and the filename prompt)
//! as a [`DownloadBridge`], and installs a temporary observer on it for the
//! duration of exactly one capture:
//!
//! 1. install the observer *before* triggering the export (no race with an
//!    engine that fires synchronously);
//! 2. trigger the engine's export;
//! 3. await the delivery with a hard deadline, dereferencing short-lived
//!    object references before they are revoked;
//! 4. tear the observer down on every exit path (success, failure, abort,
//!    or timeout) so the bridge returns to its pass-through state.
//!
//! While an observer is installed, captured deliveries are suppressed (the
//! user asked to submit, not to download) and the filename prompt is
//! auto-answered with the precomputed export name. A second matching
//! delivery is ignored; a second concurrent capture on the same bridge is
//! rejected with [`CaptureError::Busy`]; callers queue, the protocol does
//! not.

pub mod artifact;
pub mod bridge;
pub mod delivery;
pub mod error;
pub mod object_store;
pub mod protocol;

pub use artifact::{ARTIFACT_MIME, CapturedArtifact, export_file_name};
pub use bridge::{DeliveryOutcome, DownloadBridge};
pub use delivery::{Delivery, encode_data_url};
pub use error::{CaptureError, Result};
pub use object_store::{ObjectId, ObjectStore};
pub use protocol::{AbortHandle, capture_export, capture_export_with_abort};

/// Default deadline for one capture, measured from the export trigger.
pub const DEFAULT_CAPTURE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
