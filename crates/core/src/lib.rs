//! molpack: the embedded-state visualization session codec.
//!
//! A session file is a raster image with a ZIP archive appended after the
//! image data; the archive bundles molecular structure data, a rendered
//! preview, and a replayable view script. This crate is the public facade
//! over the two halves of the codec:
//!
//! * **decode** ([`decode_session`]): byte buffer → [`SessionPlan`], run
//!   through scan → read → classify → parse → plan;
//! * **encode** ([`capture_session`]): trigger the engine's one-way export
//!   and capture the freshly generated bytes off the download side channel.
//!
//! [`replay`] feeds a decoded plan back into any [`RenderingEngine`].
//!
//! # Example
//!
//! ```no_run
//! # use molpack::{decode_session, replay};
//! # fn demo(engine: &dyn molpack::RenderingEngine, bytes: &[u8]) -> anyhow::Result<()> {
//! let plan = decode_session(bytes, Some("4HHB"))?;
//! replay(engine, &plan)?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub use molpack_capture::{
    AbortHandle, ARTIFACT_MIME, CaptureError, CapturedArtifact, DEFAULT_CAPTURE_TIMEOUT,
    DownloadBridge, capture_export_with_abort, export_file_name,
};
pub use molpack_codec::{
    DecodeError, ParsedScript, ReferenceKind, SessionPlan, StructureSource, decode_session,
};
pub use molpack_engine::{EngineError, RenderingEngine, SESSION_EXPORT_FORMAT};

/// Replays a decoded session plan against a rendering engine: load the
/// structure source, then apply the view commands in source order.
pub fn replay(engine: &dyn RenderingEngine, plan: &SessionPlan) -> Result<(), EngineError> {
    engine.load(&plan.structure_source)?;
    if !plan.view_commands.is_empty() {
        engine.script(&plan.command_text())?;
    }
    Ok(())
}

/// Captures a fresh session container out of the engine.
///
/// Computes the upload file name for `model_name`, installs the capture
/// observer, triggers a `PNGJ` export under that name, and returns the
/// captured bytes as an upload-ready artifact. The engine's filename prompt
/// is auto-answered with the same precomputed name for the duration of the
/// capture.
///
/// # Errors
///
/// Propagates [`CaptureError`]; interception state is torn down before any
/// error reaches the caller, so a failed capture can be retried immediately
/// by the user.
pub async fn capture_session(
    engine: &dyn RenderingEngine,
    bridge: &DownloadBridge,
    model_name: &str,
    timeout: Duration,
) -> Result<CapturedArtifact, CaptureError> {
    let file_name = export_file_name(model_name, "png");
    tracing::debug!(model_name, %file_name, "capturing session export");

    capture_export_with_abort(
        bridge,
        &file_name,
        || engine.request_export(SESSION_EXPORT_FORMAT, &file_name),
        timeout,
        &AbortHandle::new(),
    )
    .await
}

/// [`capture_session`] with a caller-held abort handle.
pub async fn capture_session_with_abort(
    engine: &dyn RenderingEngine,
    bridge: &DownloadBridge,
    model_name: &str,
    timeout: Duration,
    abort: &AbortHandle,
) -> Result<CapturedArtifact, CaptureError> {
    let file_name = export_file_name(model_name, "png");
    capture_export_with_abort(
        bridge,
        &file_name,
        || engine.request_export(SESSION_EXPORT_FORMAT, &file_name),
        timeout,
        abort,
    )
    .await
}
