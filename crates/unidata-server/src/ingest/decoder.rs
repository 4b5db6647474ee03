//! Incremental decoding of a top-level JSON array
//!
//! [`JsonArrayDecoder`] is a [`Decoder`] that yields one array element per
//! call as soon as its last byte has arrived. Wrapped in a [`FramedRead`], it
//! turns a chunked byte stream into a pull-based stream of elements: nothing
//! more is read from the source until the consumer asks for the next element,
//! so memory stays bounded by one element plus the read buffer.
//!
//! Malformed input ends the stream with [`UnidataError::Parse`]. Elements
//! yielded before the failure remain valid.

use bytes::{Buf, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::io;
use tokio_util::{
    codec::{Decoder, FramedRead},
    io::StreamReader,
};
use unidata_common::{Result, UnidataError};

/// Chunked response body
pub type ByteChunkStream = BoxStream<'static, io::Result<bytes::Bytes>>;

/// Decoded array elements
pub type ElementStream = BoxStream<'static, Result<Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Expecting the opening `[`
    Open,
    /// After `[`: an element or `]`
    FirstElement,
    /// After `,`: an element is required
    NextElement,
    /// Inside an element
    InElement,
    /// After an element: `,` or `]`
    Separator,
    /// After the closing `]`: only whitespace may follow
    Done,
}

/// Resumable scan position within the current element
#[derive(Debug, Default, Clone, Copy)]
struct ElementScan {
    pos: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
    scalar: bool,
}

impl ElementScan {
    fn start(first: u8) -> Self {
        match first {
            b'{' | b'[' => Self {
                pos: 1,
                depth: 1,
                ..Self::default()
            },
            b'"' => Self {
                pos: 1,
                in_string: true,
                ..Self::default()
            },
            _ => Self {
                scalar: true,
                ..Self::default()
            },
        }
    }

    /// Advance over `buf`; returns the element's length once it is complete
    fn advance(&mut self, buf: &[u8]) -> Option<usize> {
        while self.pos < buf.len() {
            let b = buf[self.pos];
            self.pos += 1;

            if self.scalar {
                if is_whitespace(b) || b == b',' || b == b']' {
                    return Some(self.pos - 1);
                }
                continue;
            }

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return Some(self.pos);
                    }
                }
                continue;
            }

            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(self.pos);
                    }
                },
                _ => {},
            }
        }
        None
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn skip_whitespace(src: &mut BytesMut) {
    let n = src.iter().take_while(|b| is_whitespace(**b)).count();
    src.advance(n);
}

/// Streaming decoder for the elements of one top-level JSON array
#[derive(Debug)]
pub struct JsonArrayDecoder {
    state: State,
    scan: ElementScan,
    max_element_len: Option<usize>,
    yielded: u64,
}

impl JsonArrayDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Open,
            scan: ElementScan::default(),
            max_element_len: None,
            yielded: 0,
        }
    }

    /// Fail when a single element grows beyond `max` bytes
    pub fn with_max_element_len(mut self, max: usize) -> Self {
        self.max_element_len = Some(max);
        self
    }

    fn check_len(&self, len: usize) -> Result<()> {
        match self.max_element_len {
            Some(max) if len > max => {
                Err(self.error(format!("element exceeds the {} byte limit", max)))
            },
            _ => Ok(()),
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> UnidataError {
        UnidataError::parse(format!("{} (after {} elements)", message, self.yielded))
    }
}

impl Default for JsonArrayDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JsonArrayDecoder {
    type Item = Value;
    type Error = UnidataError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        loop {
            match self.state {
                State::Open => {
                    skip_whitespace(src);
                    let Some(&first) = src.first() else {
                        return Ok(None);
                    };
                    if first != b'[' {
                        return Err(self.error(format!(
                            "expected a JSON array, found '{}'",
                            char::from(first)
                        )));
                    }
                    src.advance(1);
                    self.state = State::FirstElement;
                },
                State::FirstElement | State::NextElement => {
                    skip_whitespace(src);
                    let Some(&first) = src.first() else {
                        return Ok(None);
                    };
                    match first {
                        b']' if self.state == State::FirstElement => {
                            src.advance(1);
                            self.state = State::Done;
                        },
                        b']' => return Err(self.error("trailing comma before ']'")),
                        b',' => return Err(self.error("unexpected ','")),
                        _ => {
                            self.scan = ElementScan::start(first);
                            self.state = State::InElement;
                        },
                    }
                },
                State::InElement => match self.scan.advance(src) {
                    Some(len) => {
                        self.check_len(len)?;
                        let element = src.split_to(len);
                        self.state = State::Separator;
                        let value = serde_json::from_slice(&element)
                            .map_err(|e| self.error(format!("invalid element: {}", e)))?;
                        self.yielded += 1;
                        return Ok(Some(value));
                    },
                    None => {
                        self.check_len(src.len())?;
                        return Ok(None);
                    },
                },
                State::Separator => {
                    skip_whitespace(src);
                    let Some(&next) = src.first() else {
                        return Ok(None);
                    };
                    match next {
                        b',' => self.state = State::NextElement,
                        b']' => self.state = State::Done,
                        other => {
                            return Err(self.error(format!(
                                "expected ',' or ']', found '{}'",
                                char::from(other)
                            )))
                        },
                    }
                    src.advance(1);
                },
                State::Done => {
                    skip_whitespace(src);
                    if !src.is_empty() {
                        return Err(self.error("unexpected data after the closing ']'"));
                    }
                    return Ok(None);
                },
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        if self.state == State::InElement && self.scan.scalar && !src.is_empty() {
            // A scalar is only terminated by what follows it
            return Err(self.error("unexpected end of input inside the array"));
        }
        if let Some(value) = self.decode(src)? {
            return Ok(Some(value));
        }
        match self.state {
            State::Done => Ok(None),
            State::Open => Err(self.error("expected a JSON array, found end of input")),
            _ => Err(self.error("unexpected end of input inside the array")),
        }
    }
}

/// Decode the elements of a JSON array as the bytes arrive
pub fn decode_array_stream(body: ByteChunkStream, max_element_len: Option<usize>) -> ElementStream {
    let mut decoder = JsonArrayDecoder::new();
    if let Some(max) = max_element_len {
        decoder = decoder.with_max_element_len(max);
    }
    FramedRead::new(StreamReader::new(body), decoder).boxed()
}

/// Decode a complete JSON document that must be an array
pub fn decode_array_bytes(body: &[u8]) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_slice(body)
        .map_err(|e| UnidataError::parse(format!("invalid JSON document: {}", e)))?;

    match document {
        Value::Array(items) => Ok(items),
        other => Err(UnidataError::parse(format!(
            "expected a JSON array at the top level, found {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
