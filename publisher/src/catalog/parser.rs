//! Catalog deserialization for the upstream release endpoint.
//!
//! Parses the JSON array served by the release endpoint into a [`Catalog`].
//! Only the shape of the body is checked here. Versions and digests are
//! checked per entry when the entry is processed.

use super::error::CatalogParseError;
use super::release::{Catalog, ReleaseDescriptor};

/// Parse a JSON string into a [`Catalog`].
///
/// # Errors
///
/// Returns an error if the JSON is malformed or a required field is missing.
///
/// # Examples
///
/// ```
/// use release_image_publisher::catalog::parser::parse_catalog;
///
/// let json = concat!(
///     r#"[{"version":"6.3.1","uri":"https://example.test/6.3.1.zip","#,
///     r#""sha1":"da39a3ee5e6b4b0d3255bfef95601890afd80709"}]"#,
/// );
/// let catalog = parse_catalog(json).expect("valid catalog");
/// assert_eq!(catalog.latest().map(|r| r.version()), Some("6.3.1"));
/// ```
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogParseError> {
    let releases: Vec<ReleaseDescriptor> = serde_json::from_str(json)?;
    Ok(Catalog::new(releases))
}
