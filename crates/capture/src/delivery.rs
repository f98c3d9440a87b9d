//! Delivery payload encodings produced by the download side channel.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{CaptureError, Result};
use crate::object_store::{ObjectId, ObjectStore};

/// One observed download delivery.
///
/// The engine's export path produces one of two encodings: a self-contained
/// inline payload (a data URL), or a short-lived object reference that must
/// be dereferenced before its creator revokes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// `data:<mime>;base64,<payload>`, self-contained.
    InlineEncoded(String),
    /// Reference into the host's object store; revocable at any time.
    ObjectRef(ObjectId),
}

impl Delivery {
    /// Converts the delivery into raw bytes, dereferencing object
    /// references against `store`.
    pub fn into_bytes(self, store: &ObjectStore) -> Result<Vec<u8>> {
        match self {
            Delivery::InlineEncoded(url) => decode_data_url(&url),
            Delivery::ObjectRef(id) => store
                .resolve(id)
                .map(|bytes| bytes.to_vec())
                .ok_or_else(|| {
                    CaptureError::Failed(format!("object reference {id} was already revoked"))
                }),
        }
    }
}

/// Encodes raw bytes as a base64 data URL, the inline delivery form.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| CaptureError::Failed(format!("not a data URL: {url:.32}")))?;

    let (head, payload) = rest
        .split_once(',')
        .ok_or_else(|| CaptureError::Failed("data URL has no payload separator".to_string()))?;

    if !head.ends_with(";base64") {
        return Err(CaptureError::Failed(format!(
            "unsupported data URL encoding: {head}"
        )));
    }

    STANDARD
        .decode(payload)
        .map_err(|err| CaptureError::Failed(format!("invalid base64 payload: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_round_trip() {
        let store = ObjectStore::new();
        let url = encode_data_url("image/png", b"\x89PNG bytes");
        let delivery = Delivery::InlineEncoded(url);
        assert_eq!(delivery.into_bytes(&store).unwrap(), b"\x89PNG bytes");
    }

    #[test]
    fn object_ref_dereferences_through_store() {
        let store = ObjectStore::new();
        let id = store.publish(b"session".to_vec());
        assert_eq!(Delivery::ObjectRef(id).into_bytes(&store).unwrap(), b"session");
    }

    #[test]
    fn revoked_object_ref_fails() {
        let store = ObjectStore::new();
        let id = store.publish(b"gone".to_vec());
        store.revoke(id);
        let err = Delivery::ObjectRef(id).into_bytes(&store).unwrap_err();
        assert!(matches!(err, CaptureError::Failed(_)));
    }

    #[test]
    fn non_data_url_fails() {
        let store = ObjectStore::new();
        let err = Delivery::InlineEncoded("https://example.com/x.png".to_string())
            .into_bytes(&store)
            .unwrap_err();
        assert!(matches!(err, CaptureError::Failed(_)));
    }

    #[test]
    fn non_base64_data_url_fails() {
        let store = ObjectStore::new();
        let err = Delivery::InlineEncoded("data:text/plain,hello".to_string())
            .into_bytes(&store)
            .unwrap_err();
        assert!(matches!(err, CaptureError::Failed(_)));
    }
}
