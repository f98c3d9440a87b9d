//! Rendering-engine capability boundary.
//!
//! The rendering engine is external: a black box that can load a structure,
//! execute script commands, and trigger a file export through the browser's
//! download mechanism. It is modelled as an injected capability rather than
//! an ambient singleton so the codec and capture logic are testable without
//! a real engine; [`fake::FakeEngine`] implements the same contract in
//! memory.

pub mod fake;

use molpack_codec::StructureSource;
use thiserror::Error;

/// Export format token for the image-with-embedded-archive container.
pub const SESSION_EXPORT_FORMAT: &str = "PNGJ";

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by a rendering engine during replay.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine failed to load the structure source.
    #[error("engine failed to load structure: {0}")]
    Load(String),

    /// The engine rejected a script command stream.
    #[error("engine rejected script: {0}")]
    Script(String),
}

/// The narrow interface the codec consumes.
///
/// `request_export` is fire-and-forget: the engine produces its output
/// through the browser download side channel, never through a return value.
/// Capturing that output is the capture protocol's job.
pub trait RenderingEngine: Send + Sync {
    /// Loads a structure, replacing whatever is currently displayed.
    fn load(&self, source: &StructureSource) -> Result<()>;

    /// Executes a command stream against the current structure.
    fn script(&self, commands: &str) -> Result<()>;

    /// Triggers a one-way export of the current session.
    fn request_export(&self, format: &str, filename: &str);
}
