//! A parsed SCGI request and the visitor input it carries.

use percent_encoding::percent_decode;

/// One SCGI request: headers in wire order plus the raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScgiRequest {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ScgiRequest {
    pub fn new(headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// First value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`header`](Self::header), treating an empty value as absent.
    pub fn non_empty_header(&self, name: &str) -> Option<&str> {
        self.header(name).filter(|v| !v.is_empty())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The visitor's message text, decoded.
    ///
    /// Taken from `input_header` when it is present and non-empty, otherwise
    /// from the body when `body_fallback` is set. Returns `None` when there is
    /// nothing but whitespace to store.
    pub fn visitor_text(&self, input_header: &str, body_fallback: bool) -> Option<String> {
        let raw: &[u8] = match self.non_empty_header(input_header) {
            Some(value) => value.as_bytes(),
            None if body_fallback => &self.body,
            None => return None,
        };

        let text = decode_form_component(raw);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Decode `+` as space and `%XX` escapes. Bytes that are already literal pass
/// through unchanged; invalid UTF-8 is replaced.
pub fn decode_form_component(raw: &[u8]) -> String {
    let spaced: Vec<u8> = raw
        .iter()
        .map(|b| if *b == b'+' { b' ' } else { *b })
        .collect();
    let decoded: Vec<u8> = percent_decode(&spaced).collect();
    String::from_utf8_lossy(&decoded).into_owned()
}
