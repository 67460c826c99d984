//! libcurl-backed transport: single GET, redirects followed, body streamed
//! straight into the sink.

use std::io::{self, Write};
use std::str;

use super::{Transport, TransportOptions};
use crate::retry::TransportError;

const DEFAULT_USER_AGENT: &str = concat!("podarc/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: u32 = 10;
const LOW_SPEED_LIMIT: u32 = 1024;

#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: TransportOptions,
}

impl CurlTransport {
    pub fn new(opts: TransportOptions) -> Self {
        Self { opts }
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTS)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.low_speed_limit(LOW_SPEED_LIMIT)?;
        easy.low_speed_time(self.opts.low_speed_time)?;
        easy.useragent(self.opts.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))?;
        Ok(easy)
    }
}

/// `Content-Length` of one header line, if it is that header.
fn content_length(line: &str) -> Option<u64> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse().ok()
}

fn map_curl_error(e: curl::Error) -> TransportError {
    let msg = e.to_string();
    if e.is_operation_timedout() {
        TransportError::Timeout(msg)
    } else if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_ssl_connect_error()
    {
        TransportError::Connection(msg)
    } else {
        TransportError::Other(msg)
    }
}

impl Transport for CurlTransport {
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        let mut easy = self.easy(url).map_err(map_curl_error)?;
        let mut expected: Option<u64> = None;
        let mut received: u64 = 0;
        let mut sink_err: Option<io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(line) = str::from_utf8(data) {
                        // Every redirect hop starts a fresh header block.
                        if line.starts_with("HTTP/") {
                            expected = None;
                        } else if let Some(len) = content_length(line) {
                            expected = Some(len);
                        }
                    }
                    true
                })
                .map_err(map_curl_error)?;
            transfer
                .write_function(|data| match sink.write_all(data) {
                    Ok(()) => {
                        received += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        sink_err = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(map_curl_error)?;
            transfer.perform()
        };

        if let Some(e) = sink_err {
            return Err(TransportError::Sink(e));
        }
        if let Err(e) = performed {
            if e.is_partial_file() {
                return Err(TransportError::PartialTransfer {
                    expected: expected.unwrap_or(0),
                    received,
                });
            }
            return Err(map_curl_error(e));
        }

        let code = easy.response_code().map_err(map_curl_error)?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }
        if let Some(exp) = expected {
            if exp != received {
                return Err(TransportError::PartialTransfer {
                    expected: exp,
                    received,
                });
            }
        }
        sink.flush().map_err(TransportError::Sink)?;
        tracing::debug!(url, bytes = received, "fetched");
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_length_header() {
        assert_eq!(content_length("Content-Length: 1234\r\n"), Some(1234));
        assert_eq!(content_length("content-length:99"), Some(99));
        assert_eq!(content_length("Content-Type: audio/mpeg"), None);
        assert_eq!(content_length("Content-Length: nope"), None);
    }

    #[test]
    fn invalid_url_is_not_a_timeout() {
        let t = CurlTransport::default();
        let err = t.fetch("http://[::1").unwrap_err();
        assert!(!matches!(err, TransportError::Timeout(_)));
    }
}
