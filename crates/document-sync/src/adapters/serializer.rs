//! JSON Payload Codec
//!
//! Default `DocumentCodec`: the wire record as a JSON object.

use crate::domain::{DocumentSyncError, WireRecord};
use crate::ports::outbound::DocumentCodec;

/// Default payload codec using JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, record: &WireRecord) -> Result<Vec<u8>, DocumentSyncError> {
        serde_json::to_vec(record).map_err(|e| DocumentSyncError::Codec(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<WireRecord, DocumentSyncError> {
        serde_json::from_slice(payload).map_err(|e| DocumentSyncError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentTags;

    #[test]
    fn test_json_codec_preserves_content_verbatim() {
        let record = WireRecord {
            name: "doc".to_string(),
            content: "{\"nested\": [1, 2, 3]}\n\ttrailing".to_string(),
            version: 9,
            tags: DocumentTags::new(),
        };
        let bytes = JsonCodec.encode(&record).unwrap();
        assert_eq!(JsonCodec.decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_json_codec_missing_tags_default() {
        let record = JsonCodec
            .decode(br#"{"name":"doc","content":"x","version":1}"#)
            .unwrap();
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        assert!(matches!(
            JsonCodec.decode(b"\x00\x01 not json"),
            Err(DocumentSyncError::Codec(_))
        ));
    }
}
