//! # Tag Codec
//!
//! Maps documents to ledger tags and back.
//!
//! ```text
//! Document-Name     = <name>
//! Document-Version  = <decimal version>
//! Content-Type      = <codec content type>
//! Document-Tag-<k>  = <v>          (one per user tag)
//! ```

use crate::domain::{
    Document, DocumentSyncError, DocumentTags, Tag, CONTENT_TYPE_TAG, DOCUMENT_NAME_TAG,
    DOCUMENT_VERSION_TAG, USER_TAG_PREFIX,
};

/// System tags parsed from a document transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemTags {
    /// Document name.
    pub name: String,
    /// Document version.
    pub version: u64,
}

/// Wire name of a user tag.
pub fn user_tag_name(key: &str) -> String {
    format!("{USER_TAG_PREFIX}{key}")
}

/// Tags to submit alongside a document payload.
pub fn encode_tags(doc: &Document, content_type: &str) -> Vec<Tag> {
    let mut tags = Vec::with_capacity(doc.tags.len() + 3);
    tags.push(Tag::new(CONTENT_TYPE_TAG, content_type));
    tags.push(Tag::new(DOCUMENT_NAME_TAG, doc.name.as_str()));
    tags.push(Tag::new(DOCUMENT_VERSION_TAG, doc.version.to_string()));
    tags.extend(
        doc.tags
            .iter()
            .map(|(key, value)| Tag::new(user_tag_name(key), value.as_str())),
    );
    tags
}

fn tag_value<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.name == name)
        .map(|t| t.value.as_str())
}

/// Parse the name and version tags; anything without both is not a document.
pub fn parse_system_tags(
    transaction_id: &str,
    tags: &[Tag],
) -> Result<SystemTags, DocumentSyncError> {
    let not_a_document = |reason: String| DocumentSyncError::NotADocument {
        transaction_id: transaction_id.to_string(),
        reason,
    };

    let name = tag_value(tags, DOCUMENT_NAME_TAG)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| not_a_document(format!("missing {DOCUMENT_NAME_TAG} tag")))?;
    let raw_version = tag_value(tags, DOCUMENT_VERSION_TAG)
        .ok_or_else(|| not_a_document(format!("missing {DOCUMENT_VERSION_TAG} tag")))?;
    let version = raw_version
        .parse::<u64>()
        .map_err(|_| not_a_document(format!("unparseable version '{raw_version}'")))?;

    Ok(SystemTags {
        name: name.to_string(),
        version,
    })
}

/// Version used for ordering: missing or unparseable tags count as 0.
pub fn version_of(tags: &[Tag]) -> u64 {
    tag_value(tags, DOCUMENT_VERSION_TAG)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

/// User tags with the namespace prefix stripped.
pub fn decode_user_tags(tags: &[Tag]) -> DocumentTags {
    tags.iter()
        .filter_map(|t| {
            t.name
                .strip_prefix(USER_TAG_PREFIX)
                .map(|key| (key.to_string(), t.value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        let mut tags = DocumentTags::new();
        tags.insert("author".to_string(), "ada".to_string());
        tags.insert("Document-Name".to_string(), "spoof".to_string());
        Document::with_version("notes", "body", tags, 4)
    }

    #[test]
    fn test_encode_tags_namespaces_user_tags() {
        let tags = encode_tags(&doc(), "application/json");
        assert!(tags.contains(&Tag::new("Document-Name", "notes")));
        assert!(tags.contains(&Tag::new("Document-Version", "4")));
        assert!(tags.contains(&Tag::new("Content-Type", "application/json")));
        assert!(tags.contains(&Tag::new("Document-Tag-author", "ada")));
        // a user key shaped like a system tag cannot shadow it
        assert!(tags.contains(&Tag::new("Document-Tag-Document-Name", "spoof")));
        assert_eq!(parse_system_tags("tx", &tags).unwrap().name, "notes");
    }

    #[test]
    fn test_parse_system_tags_roundtrip() {
        let tags = encode_tags(&doc(), "application/json");
        let system = parse_system_tags("tx", &tags).unwrap();
        assert_eq!(
            system,
            SystemTags {
                name: "notes".to_string(),
                version: 4
            }
        );
        assert_eq!(decode_user_tags(&tags), doc().tags);
    }

    #[test]
    fn test_parse_system_tags_missing_name() {
        let tags = vec![Tag::new("Document-Version", "1")];
        assert!(matches!(
            parse_system_tags("tx", &tags),
            Err(DocumentSyncError::NotADocument { .. })
        ));
    }

    #[test]
    fn test_parse_system_tags_bad_version() {
        let tags = vec![Tag::new("Document-Name", "a"), Tag::new("Document-Version", "x")];
        let err = parse_system_tags("tx", &tags).unwrap_err();
        assert!(err.to_string().contains("unparseable"));
    }

    #[test]
    fn test_version_of_defaults_to_zero() {
        assert_eq!(version_of(&[Tag::new("Document-Version", "7")]), 7);
        assert_eq!(version_of(&[Tag::new("Document-Version", "seven")]), 0);
        assert_eq!(version_of(&[]), 0);
    }
}
