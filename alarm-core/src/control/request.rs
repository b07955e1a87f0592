//! Request-line decoding for the control endpoint.
//!
//! Only the first line of a request is examined and it is capped at
//! [`MAX_REQUEST_LINE`] bytes, so a client cannot make the firmware scan an
//! arbitrarily large buffer. The line is parsed with `winnow` into method,
//! path, and optional version before being mapped onto a
//! [`ControlRequest`].

use core::fmt;

use winnow::ascii::space1;
use winnow::combinator::{opt, preceded};
use winnow::token::{take_till, take_while};
use winnow::{ModalResult, Parser};

use crate::alarm::RemoteCommand;

/// Longest request line accepted.
pub const MAX_REQUEST_LINE: usize = 256;

const ARM_PATHS: [&str; 2] = ["/alarm/on", "/alarme/on"];
const DISARM_PATHS: [&str; 2] = ["/alarm/off", "/alarme/off"];

/// What the client asked for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlRequest {
    /// `SET_ALARM(on)`.
    Arm,
    /// `SET_ALARM(off)`.
    Disarm,
    /// Any other path: render status only.
    Status,
}

impl ControlRequest {
    /// Command forwarded to the control loop, if any.
    #[must_use]
    pub const fn command(self) -> Option<RemoteCommand> {
        match self {
            ControlRequest::Arm => Some(RemoteCommand::Arm),
            ControlRequest::Disarm => Some(RemoteCommand::Disarm),
            ControlRequest::Status => None,
        }
    }
}

/// Reasons a request cannot be decoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RequestError {
    /// Nothing was received.
    Empty,
    /// First line exceeds [`MAX_REQUEST_LINE`].
    TooLong,
    /// First line is not valid UTF-8.
    NotUtf8,
    /// Only `GET` is served.
    UnsupportedMethod,
    /// Line does not look like `METHOD /path [HTTP/x.y]`.
    Malformed,
}

impl RequestError {
    /// HTTP status code and reason phrase to answer with.
    #[must_use]
    pub const fn status(self) -> (u16, &'static str) {
        match self {
            RequestError::UnsupportedMethod => (405, "Method Not Allowed"),
            RequestError::TooLong => (414, "URI Too Long"),
            RequestError::Empty | RequestError::NotUtf8 | RequestError::Malformed => {
                (400, "Bad Request")
            }
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Empty => f.write_str("empty request"),
            RequestError::TooLong => write!(f, "request line exceeds {MAX_REQUEST_LINE} bytes"),
            RequestError::NotUtf8 => f.write_str("request line is not UTF-8"),
            RequestError::UnsupportedMethod => f.write_str("unsupported method"),
            RequestError::Malformed => f.write_str("malformed request line"),
        }
    }
}

/// Parsed components of a request line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub version: Option<&'a str>,
}

/// Extracts and decodes the first line of a raw request buffer.
pub fn decode_request(buffer: &[u8]) -> Result<ControlRequest, RequestError> {
    let line = first_line(buffer)?;
    let parsed = parse_request_line(line)?;

    if parsed.method != "GET" {
        return Err(RequestError::UnsupportedMethod);
    }

    Ok(classify_path(parsed.path))
}

/// Parses `METHOD /path[?query] [HTTP/x.y]`.
pub fn parse_request_line(line: &str) -> Result<RequestLine<'_>, RequestError> {
    request_line.parse(line).map_err(|_| RequestError::Malformed)
}

fn first_line(buffer: &[u8]) -> Result<&str, RequestError> {
    let end = buffer
        .iter()
        .position(|byte| *byte == b'\n')
        .unwrap_or(buffer.len());

    if end > MAX_REQUEST_LINE {
        return Err(RequestError::TooLong);
    }

    let line = core::str::from_utf8(&buffer[..end]).map_err(|_| RequestError::NotUtf8)?;
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Err(RequestError::Empty);
    }

    Ok(line)
}

fn classify_path(path: &str) -> ControlRequest {
    if ARM_PATHS.contains(&path) {
        ControlRequest::Arm
    } else if DISARM_PATHS.contains(&path) {
        ControlRequest::Disarm
    } else {
        ControlRequest::Status
    }
}

fn request_line<'s>(input: &mut &'s str) -> ModalResult<RequestLine<'s>> {
    let method = take_while(1.., |c: char| c.is_ascii_uppercase()).parse_next(input)?;
    space1.parse_next(input)?;
    let path = preceded('/', take_till(0.., |c: char| c == ' ' || c == '?'))
        .take()
        .parse_next(input)?;
    let _query: Option<&str> =
        opt(preceded('?', take_till(0.., |c: char| c == ' '))).parse_next(input)?;
    let version = opt(preceded(space1, http_version)).parse_next(input)?;

    Ok(RequestLine {
        method,
        path,
        version,
    })
}

fn http_version<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    preceded(
        "HTTP/",
        take_while(1.., |c: char| c.is_ascii_digit() || c == '.'),
    )
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_request_line() {
        let line = parse_request_line("GET /alarm/on HTTP/1.1").expect("valid line");
        assert_eq!(
            line,
            RequestLine {
                method: "GET",
                path: "/alarm/on",
                version: Some("1.1"),
            }
        );
    }

    #[test]
    fn version_and_query_are_optional() {
        let line = parse_request_line("GET /status?refresh=1").expect("valid line");
        assert_eq!(line.path, "/status");
        assert_eq!(line.version, None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_request_line("hello world"),
            Err(RequestError::Malformed)
        );
        assert_eq!(
            parse_request_line("GET alarm/on HTTP/1.1"),
            Err(RequestError::Malformed)
        );
        assert_eq!(
            parse_request_line("GET /alarm/on HTTP/1.1 extra"),
            Err(RequestError::Malformed)
        );
    }

    #[test]
    fn decodes_commands_from_raw_buffer() {
        let arm = b"GET /alarm/on HTTP/1.1\r\nHost: 192.168.0.10\r\n\r\n";
        assert_eq!(decode_request(arm), Ok(ControlRequest::Arm));

        let disarm = b"GET /alarm/off HTTP/1.1\r\n\r\n";
        assert_eq!(decode_request(disarm), Ok(ControlRequest::Disarm));

        let status = b"GET / HTTP/1.1\r\n\r\n";
        assert_eq!(decode_request(status), Ok(ControlRequest::Status));
        assert_eq!(ControlRequest::Status.command(), None);
    }

    #[test]
    fn accepts_legacy_paths() {
        assert_eq!(
            decode_request(b"GET /alarme/on HTTP/1.1\r\n"),
            Ok(ControlRequest::Arm)
        );
        assert_eq!(
            decode_request(b"GET /alarme/off HTTP/1.1\r\n"),
            Ok(ControlRequest::Disarm)
        );
    }

    #[test]
    fn only_get_is_served() {
        assert_eq!(
            decode_request(b"POST /alarm/on HTTP/1.1\r\n"),
            Err(RequestError::UnsupportedMethod)
        );
        assert_eq!(RequestError::UnsupportedMethod.status().0, 405);
    }

    #[test]
    fn bounds_the_first_line() {
        let mut long = [b'a'; MAX_REQUEST_LINE + 8];
        long[..5].copy_from_slice(b"GET /");
        assert_eq!(decode_request(&long), Err(RequestError::TooLong));

        assert_eq!(decode_request(b""), Err(RequestError::Empty));
        assert_eq!(decode_request(b"\r\n"), Err(RequestError::Empty));
        assert_eq!(
            decode_request(b"GET /\xff HTTP/1.1\r\n"),
            Err(RequestError::NotUtf8)
        );
    }
}
