//! Gemini response status codes and response encoding.

/// Human-readable name of a Gemini status code.
pub fn status_description(code: u16) -> &'static str {
    match code {
        10 => "INPUT",
        11 => "SENSITIVE INPUT",
        20 => "SUCCESS",
        30 => "REDIRECT - TEMPORARY",
        31 => "REDIRECT - PERMANENT",
        40 => "TEMPORARY FAILURE",
        41 => "SERVER UNAVAILABLE",
        42 => "CGI ERROR",
        43 => "PROXY ERROR",
        44 => "SLOW DOWN",
        50 => "PERMANENT FAILURE",
        51 => "NOT FOUND",
        52 => "GONE",
        53 => "PROXY REQUEST REFUSED",
        59 => "BAD REQUEST",
        60 => "CLIENT CERTIFICATE REQUIRED",
        61 => "CERTIFICATE NOT AUTHORISED",
        62 => "CERTIFICATE NOT VALID",
        _ => "UNKNOWN",
    }
}

/// A response the contact service sends back through the capsule server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `10`: ask the visitor to enter text.
    Input { prompt: String },
    /// `20`: success with a body of the given MIME type.
    Success { mime: String, body: String },
    /// `40`: the request could not be completed right now.
    TemporaryFailure { message: String },
}

impl Response {
    pub fn input(prompt: impl Into<String>) -> Self {
        Self::Input {
            prompt: prompt.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::Success {
            mime: "text/plain".into(),
            body: body.into(),
        }
    }

    pub fn temporary_failure(message: impl Into<String>) -> Self {
        Self::TemporaryFailure {
            message: message.into(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Input { .. } => 10,
            Self::Success { .. } => 20,
            Self::TemporaryFailure { .. } => 40,
        }
    }

    /// Wire form: `<code> <meta>\r\n`, followed by the body and a trailing
    /// newline for successes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let code = self.status();
        let text = match self {
            Self::Input { prompt } => format!("{code} {prompt}\r\n"),
            Self::Success { mime, body } => format!("{code} {mime}\r\n{body}\n"),
            Self::TemporaryFailure { message } => format!("{code} {message}\r\n"),
        };
        text.into_bytes()
    }
}
