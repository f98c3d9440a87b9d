//! In-memory fake engine for testing the codec and capture protocol
//! without a real rendering engine.
//!
//! The fake honors the real engine's contract end to end: `request_export`
//! composes a genuine session container (image prefix plus embedded archive
//! holding a replay-from-scratch state script) and pushes it through the
//! download bridge, answering the filename prompt the way a browser-hosted
//! engine would. Delivery behavior is scripted per test: inline payloads,
//! object references (optionally revoked early), duplicate deliveries,
//! delayed deliveries, or silence for timeout tests.

use std::io::{Cursor, Write};
use std::time::Duration;

use molpack_capture::bridge::{DeliveryOutcome, DownloadBridge};
use molpack_capture::delivery::{Delivery, encode_data_url};
use molpack_codec::{ReferenceKind, StructureSource};
use parking_lot::Mutex;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::{EngineError, RenderingEngine, Result};

// Image-shaped prefix for composed containers. Content is irrelevant to the
// codec as long as it contains no archive signature.
const IMAGE_STUB: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR-fake-preview-raster\x00";

/// How the fake delivers a composed export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportBehavior {
    /// Self-contained base64 data URL.
    Inline,
    /// Short-lived object reference, resolvable when dereferenced promptly.
    ObjectRef,
    /// Object reference revoked before delivery; conversion must fail.
    RevokedObjectRef,
    /// Two matching deliveries for one export; the second must be ignored.
    DoubleDelivery,
    /// No delivery at all; the capture must time out.
    Silent,
}

#[derive(Default)]
struct EngineState {
    loaded: Option<StructureSource>,
    scripts: Vec<String>,
    /// File names of deliveries that passed through to a real download.
    downloads: Vec<String>,
    export_count: u32,
    fail_scripts: Option<String>,
}

/// Fake [`RenderingEngine`] wired to a [`DownloadBridge`].
pub struct FakeEngine {
    bridge: DownloadBridge,
    behavior: ExportBehavior,
    delivery_delay: Option<Duration>,
    state: Mutex<EngineState>,
}

impl FakeEngine {
    /// Creates a fake with inline delivery and no delay.
    pub fn new(bridge: DownloadBridge) -> Self {
        Self {
            bridge,
            behavior: ExportBehavior::Inline,
            delivery_delay: None,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Sets the delivery behavior for subsequent exports.
    pub fn with_behavior(mut self, behavior: ExportBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Delays deliveries, simulating an engine that renders before export.
    /// Requires a running tokio runtime at export time.
    pub fn with_delivery_delay(mut self, delay: Duration) -> Self {
        self.delivery_delay = Some(delay);
        self
    }

    /// Makes every `script` call fail with the given message.
    pub fn with_script_failure(self, message: &str) -> Self {
        self.state.lock().fail_scripts = Some(message.to_string());
        self
    }

    /// The currently loaded structure, if any.
    pub fn loaded(&self) -> Option<StructureSource> {
        self.state.lock().loaded.clone()
    }

    /// Every command stream passed to `script`, in call order.
    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    /// File names of exports that fell through to a real download.
    pub fn downloads(&self) -> Vec<String> {
        self.state.lock().downloads.clone()
    }

    /// Number of `request_export` calls observed.
    pub fn export_count(&self) -> u32 {
        self.state.lock().export_count
    }

    /// Composes the session container the engine would export right now.
    fn compose_container(&self) -> Vec<u8> {
        let state = self.state.lock();
        let script = state_script(state.loaded.as_ref(), &state.scripts);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("state.spt", SimpleFileOptions::default())
            .expect("in-memory archive write");
        writer
            .write_all(script.as_bytes())
            .expect("in-memory archive write");
        let archive = writer.finish().expect("in-memory archive write").into_inner();

        let mut container = IMAGE_STUB.to_vec();
        container.extend_from_slice(&archive);
        container
    }

    fn deliver(&self, delivery: Delivery, filename: &str) {
        if self.bridge.deliver(delivery) == DeliveryOutcome::PassedThrough {
            self.state.lock().downloads.push(filename.to_string());
        }
    }

    fn make_delivery(&self, container: Vec<u8>) -> Delivery {
        match self.behavior {
            ExportBehavior::Inline => {
                Delivery::InlineEncoded(encode_data_url("image/png", &container))
            }
            ExportBehavior::ObjectRef | ExportBehavior::DoubleDelivery => {
                Delivery::ObjectRef(self.bridge.object_store().publish(container))
            }
            ExportBehavior::RevokedObjectRef => {
                let id = self.bridge.object_store().publish(container);
                self.bridge.object_store().revoke(id);
                Delivery::ObjectRef(id)
            }
            ExportBehavior::Silent => unreachable!("silent exports deliver nothing"),
        }
    }
}

impl RenderingEngine for FakeEngine {
    fn load(&self, source: &StructureSource) -> Result<()> {
        self.state.lock().loaded = Some(source.clone());
        Ok(())
    }

    fn script(&self, commands: &str) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(message) = &state.fail_scripts {
            return Err(EngineError::Script(message.clone()));
        }
        state.scripts.push(commands.to_string());
        Ok(())
    }

    fn request_export(&self, format: &str, filename: &str) {
        tracing::debug!(format, filename, "fake engine export requested");
        self.state.lock().export_count += 1;

        // The browser-hosted engine prompts for a file name; under capture
        // the prompt is auto-answered with the precomputed export name.
        let answered = self
            .bridge
            .prompt_export_name()
            .unwrap_or_else(|| filename.to_string());

        if self.behavior == ExportBehavior::Silent {
            return;
        }

        let container = self.compose_container();
        let delivery = self.make_delivery(container);
        let duplicate = (self.behavior == ExportBehavior::DoubleDelivery).then(|| delivery.clone());

        match self.delivery_delay {
            Some(delay) => {
                let engine_bridge = self.bridge.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = engine_bridge.deliver(delivery);
                    if let Some(extra) = duplicate {
                        let _ = engine_bridge.deliver(extra);
                    }
                });
            }
            None => {
                self.deliver(delivery, &answered);
                if let Some(extra) = duplicate {
                    self.deliver(extra, &answered);
                }
            }
        }
    }
}

/// Writes the replay-from-scratch state script the real engine emits:
/// session-lifecycle preamble, the loaded structure (inline data block or
/// load reference), then the recorded view commands.
fn state_script(loaded: Option<&StructureSource>, scripts: &[String]) -> String {
    let mut out = String::new();
    out.push_str("initialize;\n");
    out.push_str("set defaultDirectory \"\";\n");
    out.push_str("zap;\n");

    match loaded {
        Some(StructureSource::Inline(data)) => {
            out.push_str("load data \"model\"\n");
            out.push_str(data);
            if !data.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("end \"model\";\n");
        }
        Some(StructureSource::Reference { id, kind }) => {
            match kind {
                ReferenceKind::FetchById => out.push_str(&format!("load ={id};\n")),
                ReferenceKind::FileReference => {
                    out.push_str(&format!("load \"$SCRIPT_PATH${id}.pdb\";\n"));
                }
            };
        }
        None => {}
    }

    for script in scripts {
        out.push_str(script);
        out.push('\n');
    }

    out
}
