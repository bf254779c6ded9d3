//! SCGI request framing.
//!
//! A request is a netstring holding the header block (`<len>:<headers>,`)
//! followed by exactly `CONTENT_LENGTH` bytes of body. Parsing is a linear
//! state machine; any deviation is a [`FramingError`] and the caller drops
//! the connection.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::request::ScgiRequest;
use crate::error::FramingError;

/// Longest accepted netstring length prefix, in digits.
const MAX_LENGTH_DIGITS: usize = 10;

/// Size limits applied while reading a request.
#[derive(Debug, Clone, Copy)]
pub struct FrameLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: 8 * 1024,
            max_body_bytes: 16 * 1024,
        }
    }
}

enum FrameState {
    AwaitHeaderLength,
    AwaitHeaderBlock { len: usize },
    AwaitBody { headers: Vec<(String, String)>, len: usize },
}

/// Read exactly one SCGI request from `reader`.
///
/// Does not read past the end of the body.
pub async fn read_request<R>(reader: &mut R, limits: FrameLimits) -> Result<ScgiRequest, FramingError>
where
    R: AsyncRead + Unpin,
{
    let mut state = FrameState::AwaitHeaderLength;
    loop {
        state = match state {
            FrameState::AwaitHeaderLength => {
                let len = read_length_prefix(reader).await?;
                if len > limits.max_header_bytes {
                    return Err(FramingError::HeadersTooLarge(len));
                }
                FrameState::AwaitHeaderBlock { len }
            }
            FrameState::AwaitHeaderBlock { len } => {
                let mut block = vec![0u8; len];
                reader.read_exact(&mut block).await.map_err(truncated)?;
                if reader.read_u8().await.map_err(truncated)? != b',' {
                    return Err(FramingError::MissingComma);
                }

                let headers = parse_headers(&block)?;
                let len = content_length(&headers)?;
                if len > limits.max_body_bytes {
                    return Err(FramingError::BodyTooLarge(len));
                }
                FrameState::AwaitBody { headers, len }
            }
            FrameState::AwaitBody { headers, len } => {
                let mut body = vec![0u8; len];
                reader.read_exact(&mut body).await.map_err(truncated)?;
                return Ok(ScgiRequest::new(headers, body));
            }
        };
    }
}

/// Read ASCII digits up to `:`.
async fn read_length_prefix<R>(reader: &mut R) -> Result<usize, FramingError>
where
    R: AsyncRead + Unpin,
{
    let mut digits = String::new();
    loop {
        match reader.read_u8().await.map_err(truncated)? {
            b':' if !digits.is_empty() => break,
            b @ b'0'..=b'9' if digits.len() < MAX_LENGTH_DIGITS => digits.push(b as char),
            _ => return Err(FramingError::BadLength),
        }
    }
    digits.parse().map_err(|_| FramingError::BadLength)
}

/// Split a header block into name/value pairs. Every string, including the
/// last value, is NUL-terminated.
pub fn parse_headers(block: &[u8]) -> Result<Vec<(String, String)>, FramingError> {
    if block.is_empty() {
        return Ok(Vec::new());
    }
    let Some(inner) = block.strip_suffix(&[0u8]) else {
        return Err(FramingError::MalformedHeaders);
    };

    let fields: Vec<&[u8]> = inner.split(|b| *b == 0).collect();
    if fields.len() % 2 != 0 {
        return Err(FramingError::MalformedHeaders);
    }

    fields
        .chunks_exact(2)
        .map(|pair| {
            if pair[0].is_empty() {
                return Err(FramingError::MalformedHeaders);
            }
            Ok((
                String::from_utf8_lossy(pair[0]).into_owned(),
                String::from_utf8_lossy(pair[1]).into_owned(),
            ))
        })
        .collect()
}

fn content_length(headers: &[(String, String)]) -> Result<usize, FramingError> {
    let raw = headers
        .iter()
        .find(|(name, _)| name == "CONTENT_LENGTH")
        .map(|(_, value)| value.as_str())
        .ok_or(FramingError::MissingContentLength)?;

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FramingError::InvalidContentLength(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| FramingError::InvalidContentLength(raw.to_string()))
}

fn truncated(err: io::Error) -> FramingError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FramingError::Truncated
    } else {
        FramingError::Io(err)
    }
}

/// Encode a request in SCGI wire format. Used by tests and tooling that
/// talk to the service directly.
pub fn encode_request(headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut block = Vec::new();
    for (name, value) in headers {
        block.extend_from_slice(name.as_bytes());
        block.push(0);
        block.extend_from_slice(value.as_bytes());
        block.push(0);
    }

    let mut out = format!("{}:", block.len()).into_bytes();
    out.extend_from_slice(&block);
    out.push(b',');
    out.extend_from_slice(body);
    out
}
