//! The capture protocol: one observed export per invocation, hard deadline,
//! cooperative abort, guaranteed teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, oneshot};

use crate::artifact::{ARTIFACT_MIME, CapturedArtifact};
use crate::bridge::DownloadBridge;
use crate::error::{CaptureError, Result};

/// Cooperative abort for an in-flight capture.
///
/// Cloneable; calling [`abort`](AbortHandle::abort) from any clone tears
/// the capture down before the deadline. Aborting before the capture starts
/// is remembered (the notification is permit-based, not edge-triggered).
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    notify: Arc<Notify>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests early teardown of the associated capture.
    pub fn abort(&self) {
        self.notify.notify_one();
    }
}

/// Captures one export delivery triggered by `trigger`.
///
/// Installs the observer on `bridge` *before* invoking the trigger, then
/// awaits the delivery for at most `timeout`. The observer is uninstalled
/// on every exit path; the bridge is back to pass-through by the time this
/// returns. The trigger is never retried; retry policy belongs to the
/// caller.
///
/// # Errors
///
/// * [`CaptureError::Busy`]: another capture is in flight on this bridge.
/// * [`CaptureError::Timeout`]: no delivery within the deadline.
/// * [`CaptureError::Failed`]: the delivery could not be converted to
///   bytes (malformed inline payload, revoked object reference).
pub async fn capture_export<F>(
    bridge: &DownloadBridge,
    export_name: &str,
    trigger: F,
    timeout: Duration,
) -> Result<CapturedArtifact>
where
    F: FnOnce(),
{
    capture_export_with_abort(bridge, export_name, trigger, timeout, &AbortHandle::new()).await
}

/// [`capture_export`] with a caller-held [`AbortHandle`] for early teardown.
pub async fn capture_export_with_abort<F>(
    bridge: &DownloadBridge,
    export_name: &str,
    trigger: F,
    timeout: Duration,
    abort: &AbortHandle,
) -> Result<CapturedArtifact>
where
    F: FnOnce(),
{
    let (delivery_tx, delivery_rx) = oneshot::channel();

    // Observer first, trigger second: an engine that fires synchronously
    // must still be observed.
    let _guard = bridge.install(delivery_tx, export_name)?;
    trigger();

    let delivery = tokio::select! {
        received = delivery_rx => received.map_err(|_| {
            CaptureError::Failed("delivery channel closed without a payload".to_string())
        })?,
        _ = tokio::time::sleep(timeout) => {
            tracing::warn!(export_name, ?timeout, "capture deadline expired");
            return Err(CaptureError::Timeout(timeout));
        }
        _ = abort.notify.notified() => {
            tracing::debug!(export_name, "capture aborted by caller");
            return Err(CaptureError::Aborted);
        }
    };

    // Dereference object refs immediately, before the engine revokes them.
    let bytes = delivery.into_bytes(bridge.object_store())?;
    tracing::debug!(export_name, size = bytes.len(), "export captured");

    Ok(CapturedArtifact {
        bytes,
        suggested_file_name: export_name.to_string(),
        mime_type: ARTIFACT_MIME.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{Delivery, encode_data_url};

    fn short() -> Duration {
        Duration::from_millis(50)
    }

    #[tokio::test]
    async fn captures_synchronous_inline_delivery() {
        let bridge = DownloadBridge::new();
        let trigger_bridge = bridge.clone();

        let artifact = capture_export(
            &bridge,
            "model_1.png",
            || {
                trigger_bridge.deliver(Delivery::InlineEncoded(encode_data_url(
                    "image/png",
                    b"bytes",
                )));
            },
            short(),
        )
        .await
        .unwrap();

        assert_eq!(artifact.bytes, b"bytes");
        assert_eq!(artifact.suggested_file_name, "model_1.png");
        assert_eq!(artifact.mime_type, "image/png");
        assert!(bridge.is_idle());
    }

    #[tokio::test]
    async fn captures_delayed_object_ref_delivery() {
        let bridge = DownloadBridge::new();
        let trigger_bridge = bridge.clone();

        let artifact = capture_export(
            &bridge,
            "m.png",
            || {
                let bridge = trigger_bridge.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    let id = bridge.object_store().publish(b"deferred".to_vec());
                    bridge.deliver(Delivery::ObjectRef(id));
                });
            },
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(artifact.bytes, b"deferred");
    }

    #[tokio::test]
    async fn times_out_and_restores_the_bridge() {
        let bridge = DownloadBridge::new();

        let err = capture_export(&bridge, "m.png", || {}, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(bridge.is_idle());

        // A second, independent capture is not short-circuited by leftover
        // interception state.
        let trigger_bridge = bridge.clone();
        let artifact = capture_export(
            &bridge,
            "again.png",
            || {
                trigger_bridge
                    .deliver(Delivery::InlineEncoded(encode_data_url("image/png", b"ok")));
            },
            short(),
        )
        .await
        .unwrap();
        assert_eq!(artifact.bytes, b"ok");
    }

    #[tokio::test]
    async fn conversion_failure_restores_the_bridge() {
        let bridge = DownloadBridge::new();
        let trigger_bridge = bridge.clone();

        let err = capture_export(
            &bridge,
            "m.png",
            || {
                // Reference revoked before the protocol can dereference it.
                let id = trigger_bridge.object_store().publish(b"x".to_vec());
                trigger_bridge.object_store().revoke(id);
                trigger_bridge.deliver(Delivery::ObjectRef(id));
            },
            short(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CaptureError::Failed(_)));
        assert!(bridge.is_idle());
    }

    #[tokio::test]
    async fn concurrent_capture_is_rejected_not_queued() {
        let bridge = DownloadBridge::new();
        let (hold_tx, hold_rx) = oneshot::channel::<()>();

        let first_bridge = bridge.clone();
        let first = tokio::spawn(async move {
            capture_export(
                &first_bridge,
                "first.png",
                move || {
                    // Keep the capture in flight until told otherwise.
                    tokio::spawn(async move {
                        let _ = hold_rx.await;
                    });
                },
                Duration::from_secs(5),
            )
            .await
        });

        // Let the first capture install its observer.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = capture_export(&bridge, "second.png", || {}, short())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Busy));

        // Unblock and finish the first capture via a real delivery.
        bridge.deliver(Delivery::InlineEncoded(encode_data_url("image/png", b"p")));
        let _ = hold_tx.send(());
        let artifact = first.await.unwrap().unwrap();
        assert_eq!(artifact.bytes, b"p");
    }

    #[tokio::test]
    async fn abort_tears_down_before_deadline() {
        let bridge = DownloadBridge::new();
        let abort = AbortHandle::new();
        let aborter = abort.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            aborter.abort();
        });

        let err =
            capture_export_with_abort(&bridge, "m.png", || {}, Duration::from_secs(30), &abort)
                .await
                .unwrap_err();
        assert!(matches!(err, CaptureError::Aborted));
        assert!(bridge.is_idle());
    }

    #[tokio::test]
    async fn abort_before_start_is_remembered() {
        let bridge = DownloadBridge::new();
        let abort = AbortHandle::new();
        abort.abort();

        let err =
            capture_export_with_abort(&bridge, "m.png", || {}, Duration::from_secs(30), &abort)
                .await
                .unwrap_err();
        assert!(matches!(err, CaptureError::Aborted));
        assert!(bridge.is_idle());
    }
}
