//! RESP wire framing
//!
//! Requests and replies are framed as RESP values: a single type byte,
//! CRLF-terminated headers, and length-prefixed payloads.
//!
//! # Wire Format
//!
//! ```text
//! +OK\r\n                    simple string
//! -message\r\n               error
//! :-42\r\n                   integer (64-bit signed decimal)
//! $5\r\nhello\r\n            bulk string ($-1\r\n is the nil bulk string)
//! *2\r\n<frame><frame>       array of frames
//! ```
//!
//! [`Frame::decode`] consumes exactly one frame and reports how many bytes it
//! used, so callers can drive it repeatedly over a buffer. Malformed input is
//! always surfaced as [`Error::Protocol`], never a panic.

use bytes::{BufMut, BytesMut};

use crate::{Error, Result};

/// A single RESP value, either decoded from the wire or about to be framed
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `+...` line
    Simple(String),
    /// `-...` line, an in-band error reply
    Error(String),
    /// `:...` signed 64-bit integer
    Integer(i64),
    /// `$<len>` length-prefixed string
    Bulk(String),
    /// `$-1`, the nil bulk string
    Null,
    /// `*<count>` sequence of frames
    Array(Vec<Frame>),
}

impl Frame {
    /// Decodes one frame from the front of `data`
    ///
    /// Returns the frame and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] on an empty buffer, an unknown type byte,
    /// a missing CRLF, a non-numeric length, a truncated payload, or
    /// non-UTF-8 text.
    pub fn decode(data: &[u8]) -> Result<(Frame, usize)> {
        match data.first().copied() {
            None => Err(Error::Protocol("empty frame".to_string())),
            Some(b'+') => {
                let (line, pos) = read_line(data, 1)?;
                Ok((Frame::Simple(line), pos))
            }
            Some(b'-') => {
                let (line, pos) = read_line(data, 1)?;
                Ok((Frame::Error(line), pos))
            }
            Some(b':') => {
                let (value, pos) = read_integer(data, 1)?;
                Ok((Frame::Integer(value), pos))
            }
            Some(b'$') => decode_bulk(data),
            Some(b'*') => decode_array(data),
            Some(byte) => Err(Error::Protocol(format!("invalid type byte {byte:#04x}"))),
        }
    }

    /// Encodes the frame into RESP bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.write(&mut buf);
        buf.to_vec()
    }

    fn write(&self, buf: &mut BytesMut) {
        match self {
            Frame::Simple(text) => {
                buf.put_u8(b'+');
                buf.put_slice(text.as_bytes());
                buf.put_slice(b"\r\n");
            }
            Frame::Error(message) => {
                buf.put_u8(b'-');
                buf.put_slice(message.as_bytes());
                buf.put_slice(b"\r\n");
            }
            Frame::Integer(value) => {
                buf.put_slice(format!(":{value}\r\n").as_bytes());
            }
            Frame::Bulk(text) => {
                buf.put_slice(format!("${}\r\n", text.len()).as_bytes());
                buf.put_slice(text.as_bytes());
                buf.put_slice(b"\r\n");
            }
            Frame::Null => buf.put_slice(b"$-1\r\n"),
            Frame::Array(items) => {
                buf.put_slice(format!("*{}\r\n", items.len()).as_bytes());
                for item in items {
                    item.write(buf);
                }
            }
        }
    }
}

/// Reads a CRLF-terminated line starting at `start`, returning the text and
/// the position just past the terminator
fn read_line(data: &[u8], start: usize) -> Result<(String, usize)> {
    let mut pos = start;
    while pos + 1 < data.len() {
        if data[pos] == b'\r' && data[pos + 1] == b'\n' {
            let text = String::from_utf8(data[start..pos].to_vec())
                .map_err(|_| Error::Protocol("invalid UTF-8 in frame".to_string()))?;
            return Ok((text, pos + 2));
        }
        pos += 1;
    }
    Err(Error::Protocol("missing CRLF".to_string()))
}

fn read_integer(data: &[u8], start: usize) -> Result<(i64, usize)> {
    let (line, pos) = read_line(data, start)?;
    let value = line
        .parse::<i64>()
        .map_err(|_| Error::Protocol(format!("invalid integer {line:?}")))?;
    Ok((value, pos))
}

fn decode_bulk(data: &[u8]) -> Result<(Frame, usize)> {
    let (len, pos) = read_integer(data, 1)?;
    if len == -1 {
        return Ok((Frame::Null, pos));
    }
    if len < 0 {
        return Err(Error::Protocol(format!("invalid bulk length {len}")));
    }

    let len = len as usize;
    if len > data.len() {
        return Err(Error::Protocol("bulk payload truncated".to_string()));
    }
    let end = pos + len;
    if data.len() < end + 2 {
        return Err(Error::Protocol("bulk payload truncated".to_string()));
    }
    if &data[end..end + 2] != b"\r\n" {
        return Err(Error::Protocol("bulk payload missing CRLF".to_string()));
    }

    let text = String::from_utf8(data[pos..end].to_vec())
        .map_err(|_| Error::Protocol("invalid UTF-8 in frame".to_string()))?;
    Ok((Frame::Bulk(text), end + 2))
}

fn decode_array(data: &[u8]) -> Result<(Frame, usize)> {
    let (count, mut pos) = read_integer(data, 1)?;
    if count < 0 || count as u64 > data.len() as u64 {
        return Err(Error::Protocol(format!("invalid array length {count}")));
    }

    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (item, used) = Frame::decode(&data[pos..])?;
        items.push(item);
        pos += used;
    }
    Ok((Frame::Array(items), pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8]) -> Frame {
        let (frame, used) = Frame::decode(data).unwrap();
        assert_eq!(used, data.len());
        frame
    }

    #[test]
    fn decodes_simple_string() {
        assert_eq!(decode_all(b"+OK\r\n"), Frame::Simple("OK".to_string()));
    }

    #[test]
    fn decodes_error() {
        assert_eq!(
            decode_all(b"-command not found\r\n"),
            Frame::Error("command not found".to_string())
        );
    }

    #[test]
    fn decodes_integers_with_signs() {
        assert_eq!(decode_all(b":123\r\n"), Frame::Integer(123));
        assert_eq!(decode_all(b":-2\r\n"), Frame::Integer(-2));
        assert_eq!(decode_all(b":+7\r\n"), Frame::Integer(7));
    }

    #[test]
    fn decodes_bulk_and_nil() {
        assert_eq!(decode_all(b"$5\r\nhello\r\n"), Frame::Bulk("hello".to_string()));
        assert_eq!(decode_all(b"$0\r\n\r\n"), Frame::Bulk(String::new()));
        assert_eq!(decode_all(b"$-1\r\n"), Frame::Null);
    }

    #[test]
    fn decodes_nested_array() {
        let frame = decode_all(b"*2\r\n*2\r\n:1\r\n:-2\r\n$5\r\nhello\r\n");
        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Array(vec![Frame::Integer(1), Frame::Integer(-2)]),
                Frame::Bulk("hello".to_string()),
            ])
        );
    }

    #[test]
    fn decode_reports_bytes_consumed_per_frame() {
        let data = b"+OK\r\n:1\r\n";
        let (first, used) = Frame::decode(data).unwrap();
        assert_eq!(first, Frame::Simple("OK".to_string()));
        let (second, rest) = Frame::decode(&data[used..]).unwrap();
        assert_eq!(second, Frame::Integer(1));
        assert_eq!(used + rest, data.len());
    }

    #[test]
    fn encodes_expected_wire_bytes() {
        assert_eq!(Frame::Simple("OK".to_string()).encode(), b"+OK\r\n");
        assert_eq!(Frame::Integer(-2).encode(), b":-2\r\n");
        assert_eq!(Frame::Bulk("bar".to_string()).encode(), b"$3\r\nbar\r\n");
        assert_eq!(Frame::Null.encode(), b"$-1\r\n");
        assert_eq!(
            Frame::Error("command not found".to_string()).encode(),
            b"-command not found\r\n"
        );
        assert_eq!(
            Frame::Array(vec![
                Frame::Bulk("hello".to_string()),
                Frame::Bulk("engineer".to_string()),
            ])
            .encode(),
            b"*2\r\n$5\r\nhello\r\n$8\r\nengineer\r\n"
        );
    }

    #[test]
    fn round_trips_supported_values() {
        let cases = vec![
            Frame::Null,
            Frame::Integer(0),
            Frame::Integer(i64::MIN),
            Frame::Bulk(String::new()),
            Frame::Bulk("hello".to_string()),
            Frame::Array(vec![]),
            Frame::Array(vec![
                Frame::Integer(42),
                Frame::Null,
                Frame::Array(vec![Frame::Bulk("nested".to_string())]),
            ]),
        ];
        for frame in cases {
            let bytes = frame.encode();
            let (decoded, used) = Frame::decode(&bytes).unwrap();
            assert_eq!(used, bytes.len());
            assert_eq!(decoded, frame);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        let cases: &[&[u8]] = &[
            b"",
            b"?\r\n",
            b"+OK",
            b":12a\r\n",
            b"$5\r\nhel\r\n",
            b"$x\r\nhello\r\n",
            b"$-2\r\n",
            b"*1\r\n",
            b"*-3\r\n",
            b"$5\r\nhelloXY",
        ];
        for data in cases {
            assert!(
                Frame::decode(data).is_err(),
                "expected protocol error for {data:?}"
            );
        }
    }
}
