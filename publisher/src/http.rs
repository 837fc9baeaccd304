//! HTTP transport shared by the catalog fetcher, publish gate and downloader.
//!
//! Provides a trait-based abstraction over the few HTTP operations the
//! publisher needs, enabling dependency injection for testing. The
//! production implementation uses one `ureq` agent with an explicit timeout
//! so a stalled response cannot block a run indefinitely.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;
use ureq::Body;
use ureq::http::Response;

/// Default timeout applied to every request, including body transfer.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(900);

/// Size of the chunks streamed from the response body to disk.
const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Trait for the HTTP operations used by the publisher.
///
/// Abstractions allow tests to fake HTTP behaviour without network access.
///
/// # Examples
///
/// ```no_run
/// use release_image_publisher::http::{HttpTransport, UreqTransport, DEFAULT_HTTP_TIMEOUT};
///
/// let transport = UreqTransport::new(DEFAULT_HTTP_TIMEOUT);
/// let status = transport.get_status("https://example.test/health")?;
/// assert_eq!(status, 200);
/// # Ok::<(), release_image_publisher::http::HttpError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport {
    /// GET `url` and return the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    fn get_text(&self, url: &str) -> Result<String, HttpError>;

    /// GET `url` and return the response status code without treating
    /// non-success codes as errors.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received.
    fn get_status(&self, url: &str) -> Result<u16, HttpError>;

    /// GET `url` and stream the body into `dest`, returning the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// failure to write `dest`.
    fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, HttpError>;
}

/// Errors arising from HTTP operations.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// No usable response was received (connection, TLS, timeout, or a
    /// failure while reading the body).
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The status code received.
        status: u16,
    },

    /// Writing the downloaded body to disk failed.
    #[error("I/O error writing download: {0}")]
    Io(#[from] io::Error),
}

/// HTTP transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn get(&self, url: &str) -> Result<Response<Body>, HttpError> {
        self.agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))
    }

    fn get_success(&self, url: &str) -> Result<Response<Body>, HttpError> {
        let response = self.get(url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl HttpTransport for UreqTransport {
    fn get_text(&self, url: &str) -> Result<String, HttpError> {
        self.get_success(url)?
            .into_body()
            .read_to_string()
            .map_err(|e| map_ureq_error(url, &e))
    }

    fn get_status(&self, url: &str) -> Result<u16, HttpError> {
        Ok(self.get(url)?.status().as_u16())
    }

    fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, HttpError> {
        let mut body = self.get_success(url)?.into_body();
        let mut file = File::create(dest)?;
        copy_in_chunks(url, &mut body.as_reader(), &mut file)
    }
}

/// Stream `reader` into `writer` in fixed-size chunks.
///
/// Read failures are transport failures; write failures are local I/O
/// failures.
fn copy_in_chunks(
    url: &str,
    reader: &mut dyn Read,
    writer: &mut dyn Write,
) -> Result<u64, HttpError> {
    let mut buffer = vec![0u8; DOWNLOAD_CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(HttpError::Transport {
                    url: url.to_owned(),
                    reason: e.to_string(),
                });
            }
        };
        let Some(chunk) = buffer.get(..bytes_read) else {
            break;
        };
        writer.write_all(chunk)?;
        written = written.saturating_add(chunk.len() as u64);
    }
    writer.flush()?;
    Ok(written)
}

/// Map a ureq error to an [`HttpError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> HttpError {
    match err {
        ureq::Error::StatusCode(status) => HttpError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => HttpError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that yields its data and then fails.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn copy_in_chunks_streams_everything() {
        let content = vec![3u8; DOWNLOAD_CHUNK_SIZE * 3 + 5];
        let mut reader = Cursor::new(content.clone());
        let mut sink = Vec::new();

        let written = copy_in_chunks("https://example.test/a.zip", &mut reader, &mut sink)
            .expect("copy succeeds");
        assert_eq!(written, content.len() as u64);
        assert_eq!(sink, content);
    }

    #[test]
    fn copy_in_chunks_maps_read_failure_to_transport_error() {
        let mut reader = FailingReader {
            data: Cursor::new(b"partial".to_vec()),
        };
        let mut sink = Vec::new();

        let result = copy_in_chunks("https://example.test/a.zip", &mut reader, &mut sink);
        assert!(matches!(result, Err(HttpError::Transport { .. })));
        assert_eq!(sink, b"partial");
    }

    #[test]
    fn map_ureq_error_keeps_status_code() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/tags/6.3.1", &err);
        assert!(matches!(mapped, HttpError::Status { status: 404, .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_errors_to_transport() {
        let err = ureq::Error::Io(io::Error::other("connection refused"));
        let mapped = map_ureq_error("https://example.test/tags/6.3.1", &err);
        assert!(matches!(mapped, HttpError::Transport { .. }));
    }
}
