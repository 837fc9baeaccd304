//! Registry check deciding whether a version has already been published.
//!
//! The gate asks the registry's tag endpoint about a version. Any success
//! status means the tag exists. Anything else, including a transport failure,
//! is treated as "not published", so an outage makes the publisher rebuild
//! rather than skip.

use crate::http::HttpTransport;
use crate::image::ImageName;
use log::{debug, warn};

/// Default tag lookup endpoint (Docker Hub v2 API).
pub const DEFAULT_TAG_URL_TEMPLATE: &str =
    "https://hub.docker.com/v2/repositories/{namespace}/{repository}/tags/{version}";

/// Answers whether an image tag already exists in the registry.
#[cfg_attr(test, mockall::automock)]
pub trait PublishCheck {
    /// Whether `version` is already published. Never fails.
    fn exists(&self, version: &str) -> bool;
}

/// [`PublishCheck`] backed by an HTTP tag endpoint.
///
/// The URL template may contain `{namespace}`, `{repository}` and
/// `{version}` placeholders.
///
/// # Examples
///
/// ```
/// use release_image_publisher::gate::{PublishGate, DEFAULT_TAG_URL_TEMPLATE};
/// use release_image_publisher::http::{UreqTransport, DEFAULT_HTTP_TIMEOUT};
/// use release_image_publisher::image::ImageName;
///
/// let transport = UreqTransport::new(DEFAULT_HTTP_TIMEOUT);
/// let image = ImageName::new("acme", "shop");
/// let gate = PublishGate::new(&transport, DEFAULT_TAG_URL_TEMPLATE, &image);
/// assert_eq!(
///     gate.tag_url("6.3.1"),
///     "https://hub.docker.com/v2/repositories/acme/shop/tags/6.3.1"
/// );
/// ```
pub struct PublishGate<'a> {
    transport: &'a dyn HttpTransport,
    url_template: String,
}

impl<'a> PublishGate<'a> {
    /// Create a gate for `image`, resolving the image placeholders of
    /// `url_template` up front.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport, url_template: &str, image: &ImageName) -> Self {
        let url_template = url_template
            .replace("{namespace}", image.namespace())
            .replace("{repository}", image.repository());
        Self {
            transport,
            url_template,
        }
    }

    /// The lookup URL for `version`.
    #[must_use]
    pub fn tag_url(&self, version: &str) -> String {
        self.url_template.replace("{version}", version)
    }
}

impl PublishCheck for PublishGate<'_> {
    fn exists(&self, version: &str) -> bool {
        let url = self.tag_url(version);
        match self.transport.get_status(&url) {
            Ok(status) if (200..300).contains(&status) => {
                debug!("Version {version} is already published (HTTP {status})");
                true
            }
            Ok(status) => {
                debug!("Version {version} is not published (HTTP {status})");
                false
            }
            Err(e) => {
                warn!("Could not check whether version {version} is published: {e}");
                false
            }
        }
    }
}
