use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

/// Object-key extensions accepted into the gallery (matched case-insensitively)
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// A single image resolved from a bucket listing
///
/// Records are created in bulk by [`resolve`] and replaced wholesale on the
/// next submission; they are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Absolute http/https URL of the object
    pub url: String,
    /// `LastModified` from the listing, or Unix epoch 0 when absent/unparseable
    pub last_modified: DateTime<Utc>,
}

/// Failure to turn listing text into image records
#[derive(Debug, Clone, Error)]
pub enum ListingError {
    /// The fetched body is not well-formed XML
    #[error("listing is not well-formed XML: {0}")]
    Xml(String),
    /// The URL the listing was fetched from cannot be parsed
    #[error("invalid listing URL: {0}")]
    SourceUrl(String),
}

/// Resolve a bucket-listing document into image records.
///
/// Walks every `Contents` element, keeps the keys with an image extension,
/// joins each against the base of `source_url`, and returns the records
/// sorted most-recent-first (stable for equal timestamps). Zero matching
/// keys is an empty `Ok`, not an error. Pure function of its two inputs.
pub fn resolve(document_text: &str, source_url: &str) -> Result<Vec<ImageRecord>, ListingError> {
    let doc = roxmltree::Document::parse(document_text)
        .map_err(|e| ListingError::Xml(e.to_string()))?;
    let base = base_url(source_url)?;

    let mut records = Vec::new();
    for contents in doc
        .descendants()
        // Compare local names only: S3 listings carry a default xmlns
        .filter(|n| n.is_element() && n.tag_name().name() == "Contents")
    {
        let Some(key) = child_text(contents, "Key") else {
            continue;
        };
        if !has_image_extension(key) {
            // Non-image objects are silently dropped, not an error
            continue;
        }

        let last_modified = child_text(contents, "LastModified")
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::UNIX_EPOCH);

        records.push(ImageRecord {
            url: join_url(&base, key),
            last_modified,
        });
    }

    // Stable sort keeps listing order for equal timestamps
    records.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    Ok(records)
}

/// Base URL of the listing: scheme + authority + path with the query string,
/// fragment, final path segment (the listing document itself), and any
/// trailing slash removed.
fn base_url(source_url: &str) -> Result<String, ListingError> {
    let mut url = Url::parse(source_url).map_err(|e| ListingError::SourceUrl(e.to_string()))?;
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop();
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Join base and key with exactly one slash, regardless of the key's own
/// leading slashes. Keys are used verbatim otherwise — no re-encoding of
/// reserved characters.
fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base, key.trim_start_matches('/'))
}

fn has_image_extension(key: &str) -> bool {
    key.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn child_text<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
        .and_then(|c| c.text())
}
