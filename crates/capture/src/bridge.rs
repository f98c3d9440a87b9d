//! The download bridge: the host's model of the two browser primitives the
//! export path touches, and the interception point the capture protocol
//! installs its observer on.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::delivery::Delivery;
use crate::error::{CaptureError, Result};
use crate::object_store::ObjectStore;

/// What the bridge did with an observed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// An observer consumed (or suppressed) the delivery; the host must not
    /// perform the real download.
    Captured,
    /// No observer was installed; the host performs its default handling.
    PassedThrough,
}

struct InterceptSlot {
    /// One-shot delivery channel; `None` once the first delivery landed.
    delivery_tx: Option<oneshot::Sender<Delivery>>,
    /// Precomputed answer for the filename prompt.
    export_name: String,
}

#[derive(Default)]
struct BridgeInner {
    store: ObjectStore,
    intercept: Mutex<Option<InterceptSlot>>,
}

/// Shared handle to the host's download/prompt primitives.
///
/// Cheap to clone; all clones observe the same interception state. The
/// interception slot is the module's only cross-call state and returns to
/// empty after every capture; the [`InterceptGuard`] clears it on drop, on
/// every exit path.
#[derive(Clone, Default)]
pub struct DownloadBridge {
    inner: Arc<BridgeInner>,
}

impl DownloadBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bridge instance the application wires its engine
    /// bindings to. Tests use local instances instead.
    pub fn global() -> &'static DownloadBridge {
        static GLOBAL: OnceLock<DownloadBridge> = OnceLock::new();
        GLOBAL.get_or_init(DownloadBridge::new)
    }

    /// The object store backing short-lived delivery references.
    pub fn object_store(&self) -> &ObjectStore {
        &self.inner.store
    }

    /// Host-side entry point: the engine's export path observed a download.
    ///
    /// With an observer installed the delivery is routed to it and the real
    /// download side effect must be suppressed; a second delivery during the
    /// same capture is ignored (still suppressed). Without an observer the
    /// delivery passes through untouched.
    pub fn deliver(&self, delivery: Delivery) -> DeliveryOutcome {
        let mut slot = self.inner.intercept.lock();
        match slot.as_mut() {
            Some(intercept) => {
                match intercept.delivery_tx.take() {
                    Some(tx) => {
                        // Receiver dropped means the capture already ended;
                        // the suppression still stands until uninstall.
                        let _ = tx.send(delivery);
                    }
                    None => {
                        tracing::debug!("duplicate delivery during capture ignored");
                    }
                }
                DeliveryOutcome::Captured
            }
            None => DeliveryOutcome::PassedThrough,
        }
    }

    /// Host-side entry point: the engine's export path asked for a file
    /// name. Returns the precomputed answer while a capture is in flight,
    /// `None` when the host should prompt the user normally.
    pub fn prompt_export_name(&self) -> Option<String> {
        self.inner
            .intercept
            .lock()
            .as_ref()
            .map(|intercept| intercept.export_name.clone())
    }

    /// Returns `true` when no observer is installed.
    pub fn is_idle(&self) -> bool {
        self.inner.intercept.lock().is_none()
    }

    /// Installs the capture observer. Fails with [`CaptureError::Busy`]
    /// when another capture is already in flight on this bridge.
    pub(crate) fn install(
        &self,
        delivery_tx: oneshot::Sender<Delivery>,
        export_name: &str,
    ) -> Result<InterceptGuard> {
        let mut slot = self.inner.intercept.lock();
        if slot.is_some() {
            return Err(CaptureError::Busy);
        }

        *slot = Some(InterceptSlot {
            delivery_tx: Some(delivery_tx),
            export_name: export_name.to_string(),
        });
        tracing::debug!(export_name, "capture observer installed");

        Ok(InterceptGuard {
            bridge: self.clone(),
        })
    }
}

impl std::fmt::Debug for DownloadBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadBridge")
            .field("idle", &self.is_idle())
            .finish()
    }
}

/// Scoped interception: uninstalls the observer when dropped, restoring the
/// bridge to pass-through on success, failure, abort, and timeout alike.
#[derive(Debug)]
pub(crate) struct InterceptGuard {
    bridge: DownloadBridge,
}

impl Drop for InterceptGuard {
    fn drop(&mut self) {
        *self.bridge.inner.intercept.lock() = None;
        tracing::debug!("capture observer uninstalled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninstalled_bridge_passes_through() {
        let bridge = DownloadBridge::new();
        let outcome = bridge.deliver(Delivery::InlineEncoded("data:;base64,".to_string()));
        assert_eq!(outcome, DeliveryOutcome::PassedThrough);
        assert_eq!(bridge.prompt_export_name(), None);
    }

    #[test]
    fn installed_bridge_captures_and_answers_prompt() {
        let bridge = DownloadBridge::new();
        let (tx, mut rx) = oneshot::channel();
        let guard = bridge.install(tx, "model_1.png").unwrap();

        assert_eq!(bridge.prompt_export_name().as_deref(), Some("model_1.png"));

        let outcome = bridge.deliver(Delivery::ObjectRef(7));
        assert_eq!(outcome, DeliveryOutcome::Captured);
        assert_eq!(rx.try_recv().unwrap(), Delivery::ObjectRef(7));

        drop(guard);
        assert!(bridge.is_idle());
    }

    #[test]
    fn second_delivery_is_ignored_but_still_suppressed() {
        let bridge = DownloadBridge::new();
        let (tx, mut rx) = oneshot::channel();
        let _guard = bridge.install(tx, "x.png").unwrap();

        assert_eq!(bridge.deliver(Delivery::ObjectRef(1)), DeliveryOutcome::Captured);
        assert_eq!(bridge.deliver(Delivery::ObjectRef(2)), DeliveryOutcome::Captured);

        // Only the first delivery reached the observer.
        assert_eq!(rx.try_recv().unwrap(), Delivery::ObjectRef(1));
    }

    #[test]
    fn concurrent_install_is_rejected() {
        let bridge = DownloadBridge::new();
        let (first_tx, _first_rx) = oneshot::channel();
        let _guard = bridge.install(first_tx, "a.png").unwrap();

        let (second_tx, _second_rx) = oneshot::channel();
        let err = bridge.install(second_tx, "b.png").unwrap_err();
        assert!(matches!(err, CaptureError::Busy));
    }

    #[test]
    fn guard_drop_restores_pass_through() {
        let bridge = DownloadBridge::new();
        let (tx, _rx) = oneshot::channel();
        drop(bridge.install(tx, "a.png").unwrap());

        assert!(bridge.is_idle());
        assert_eq!(
            bridge.deliver(Delivery::ObjectRef(1)),
            DeliveryOutcome::PassedThrough
        );
        assert_eq!(bridge.prompt_export_name(), None);
    }
}
