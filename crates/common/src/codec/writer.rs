//! Push-down JSON writer
//!
//! Every `write_*` call first asks the innermost open container for the
//! separator it owes, then emits its own bytes. Containers push a context on
//! begin and pop it on end, so separators and key quoting stay correct at any
//! nesting depth. All calls return the number of bytes they emitted.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::error::CodecError;

const OBJECT_START: u8 = b'{';
const OBJECT_END: u8 = b'}';
const ARRAY_START: u8 = b'[';
const ARRAY_END: u8 = b']';
const PAIR_SEPARATOR: u8 = b':';
const ELEM_SEPARATOR: u8 = b',';
const BACKSLASH: u8 = b'\\';
const STRING_DELIMITER: u8 = b'"';
const ESCAPE_PREFIX: &[u8] = b"\\u00";

/// Version number written as the first element of a message envelope
pub const PROTOCOL_VERSION: i32 = 1;

pub const NAN: &str = "NaN";
pub const INFINITY: &str = "Infinity";
pub const NEGATIVE_INFINITY: &str = "-Infinity";

// Handling for the first 0x30 byte values:
//  0 : escape using "\u00xx" notation
//  1 : write the byte as is
//  other : escape using "\<other>" notation
#[rustfmt::skip]
const CHAR_TABLE: [u8; 0x30] = [
    // 0   1   2   3   4   5   6   7     8     9     A   B     C     D   E   F
       0,  0,  0,  0,  0,  0,  0,  0, b'b', b't', b'n', 0, b'f', b'r', 0,  0, // 0
       0,  0,  0,  0,  0,  0,  0,  0,    0,    0,    0, 0,    0,    0, 0,  0, // 1
       1,  1, b'"', 1, 1,  1,  1,  1,    1,    1,    1, 1,    1,    1, 1,  1, // 2
];

/// Kind tag written into a message envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

/// Where the writer currently is inside the open containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterContext {
    /// Top level, no separators
    Root,
    /// Inside an object; alternates between key and value slots
    Pair { first: bool, colon: bool },
    /// Inside an array
    List { first: bool },
}

impl WriterContext {
    fn pair() -> Self {
        WriterContext::Pair {
            first: true,
            colon: true,
        }
    }

    fn list() -> Self {
        WriterContext::List { first: true }
    }

    /// Separator owed before the next slot, advancing the slot state
    fn separator(&mut self) -> Option<u8> {
        match self {
            WriterContext::Root => None,
            WriterContext::Pair { first, colon } => {
                if *first {
                    *first = false;
                    *colon = true;
                    None
                } else {
                    let sep = if *colon { PAIR_SEPARATOR } else { ELEM_SEPARATOR };
                    *colon = !*colon;
                    Some(sep)
                }
            }
            WriterContext::List { first } => {
                if *first {
                    *first = false;
                    None
                } else {
                    Some(ELEM_SEPARATOR)
                }
            }
        }
    }

    /// Whether the slot being written is an object key
    fn escape_num(&self) -> bool {
        matches!(self, WriterContext::Pair { colon: true, .. })
    }
}

fn hex_char(val: u8) -> u8 {
    let val = val & 0x0F;
    if val < 10 {
        val + b'0'
    } else {
        val - 10 + b'a'
    }
}

/// Serializes the value model to JSON over any byte sink
#[derive(Debug)]
pub struct JsonWriter<W> {
    out: W,
    contexts: Vec<WriterContext>,
}

impl JsonWriter<Vec<u8>> {
    /// Writer over an in-memory buffer
    pub fn buffer() -> Self {
        Self::new(Vec::new())
    }
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            contexts: vec![WriterContext::Root],
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Number of containers currently open
    pub fn depth(&self) -> usize {
        self.contexts.len() - 1
    }

    fn push_context(&mut self, context: WriterContext) {
        self.contexts.push(context);
    }

    fn pop_context(&mut self) -> Result<(), CodecError> {
        if self.contexts.len() <= 1 {
            return Err(CodecError::protocol(
                "container end without matching begin",
                "writer at root",
            ));
        }
        self.contexts.pop();
        Ok(())
    }

    fn write_context(&mut self) -> Result<usize, CodecError> {
        match self.contexts.last_mut().and_then(WriterContext::separator) {
            Some(sep) => {
                self.out.write_all(&[sep])?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn escape_num(&self) -> bool {
        self.contexts
            .last()
            .map(WriterContext::escape_num)
            .unwrap_or(false)
    }

    fn write_json_escape_char(&mut self, ch: u8) -> Result<usize, CodecError> {
        self.out.write_all(ESCAPE_PREFIX)?;
        self.out.write_all(&[hex_char(ch >> 4), hex_char(ch)])?;
        Ok(6)
    }

    fn write_json_char(&mut self, ch: u8) -> Result<usize, CodecError> {
        if ch >= 0x30 {
            // backslash is the only byte >= 0x30 that needs escaping
            if ch == BACKSLASH {
                self.out.write_all(&[BACKSLASH, BACKSLASH])?;
                return Ok(2);
            }
            self.out.write_all(&[ch])?;
            return Ok(1);
        }

        match CHAR_TABLE[ch as usize] {
            1 => {
                self.out.write_all(&[ch])?;
                Ok(1)
            }
            0 => self.write_json_escape_char(ch),
            escaped => {
                self.out.write_all(&[BACKSLASH, escaped])?;
                Ok(2)
            }
        }
    }

    fn write_json_string(&mut self, value: &str) -> Result<usize, CodecError> {
        let mut result = self.write_context()?;
        self.out.write_all(&[STRING_DELIMITER])?;
        for ch in value.bytes() {
            result += self.write_json_char(ch)?;
        }
        self.out.write_all(&[STRING_DELIMITER])?;
        Ok(result + 2)
    }

    fn write_json_base64(&mut self, bytes: &[u8]) -> Result<usize, CodecError> {
        if bytes.len() > u32::MAX as usize {
            return Err(CodecError::SizeLimit(format!(
                "binary payload of {} bytes",
                bytes.len()
            )));
        }
        let mut result = self.write_context()?;
        let encoded = STANDARD.encode(bytes);
        self.out.write_all(&[STRING_DELIMITER])?;
        self.out.write_all(encoded.as_bytes())?;
        self.out.write_all(&[STRING_DELIMITER])?;
        result += encoded.len() + 2;
        Ok(result)
    }

    /// Write a pre-rendered scalar, quoting it when required
    fn write_json_scalar(&mut self, text: &str, quote: bool) -> Result<usize, CodecError> {
        let mut result = 0;
        if quote {
            self.out.write_all(&[STRING_DELIMITER])?;
            result += 1;
        }
        self.out.write_all(text.as_bytes())?;
        result += text.len();
        if quote {
            self.out.write_all(&[STRING_DELIMITER])?;
            result += 1;
        }
        Ok(result)
    }

    fn write_json_integer(&mut self, num: i64) -> Result<usize, CodecError> {
        let result = self.write_context()?;
        let quote = self.escape_num();
        Ok(result + self.write_json_scalar(&num.to_string(), quote)?)
    }

    fn write_json_double(&mut self, num: f64) -> Result<usize, CodecError> {
        let result = self.write_context()?;
        let rendered = match serde_json::Number::from_f64(num) {
            Some(number) => number.to_string(),
            None => num.to_string(),
        };

        // normalize the platform spelling of NaN and the infinities
        let bytes = rendered.as_bytes();
        let special = match bytes.first() {
            Some(b'N') | Some(b'n') => Some(NAN),
            Some(b'I') | Some(b'i') => Some(INFINITY),
            Some(b'-') if matches!(bytes.get(1), Some(b'I') | Some(b'i')) => {
                Some(NEGATIVE_INFINITY)
            }
            _ => None,
        };

        let quote = special.is_some() || self.escape_num();
        let text = special.unwrap_or(&rendered);
        Ok(result + self.write_json_scalar(text, quote)?)
    }

    fn write_json_object_start(&mut self) -> Result<usize, CodecError> {
        let result = self.write_context()?;
        self.out.write_all(&[OBJECT_START])?;
        self.push_context(WriterContext::pair());
        Ok(result + 1)
    }

    fn write_json_object_end(&mut self) -> Result<usize, CodecError> {
        self.pop_context()?;
        self.out.write_all(&[OBJECT_END])?;
        Ok(1)
    }

    fn write_json_array_start(&mut self) -> Result<usize, CodecError> {
        let result = self.write_context()?;
        self.out.write_all(&[ARRAY_START])?;
        self.push_context(WriterContext::list());
        Ok(result + 1)
    }

    fn write_json_array_end(&mut self) -> Result<usize, CodecError> {
        self.pop_context()?;
        self.out.write_all(&[ARRAY_END])?;
        Ok(1)
    }

    /// Open a message envelope: `[version,"name",kind,seqid`
    pub fn write_message_begin(
        &mut self,
        name: &str,
        kind: MessageType,
        seqid: i32,
    ) -> Result<usize, CodecError> {
        let mut result = self.write_json_array_start()?;
        result += self.write_json_integer(PROTOCOL_VERSION.into())?;
        result += self.write_json_string(name)?;
        result += self.write_json_integer(kind as i64)?;
        result += self.write_json_integer(seqid.into())?;
        Ok(result)
    }

    pub fn write_message_end(&mut self) -> Result<usize, CodecError> {
        self.write_json_array_end()
    }

    pub fn write_struct_begin(&mut self, name: &str) -> Result<usize, CodecError> {
        tracing::trace!(name, "write struct");
        self.write_json_object_start()
    }

    pub fn write_struct_end(&mut self) -> Result<usize, CodecError> {
        self.write_json_object_end()
    }

    /// Write a field's wire name as the key of the next pair
    pub fn write_field_begin(&mut self, name: &str) -> Result<usize, CodecError> {
        self.write_json_string(name)
    }

    pub fn write_field_end(&mut self) -> Result<usize, CodecError> {
        Ok(0)
    }

    pub fn write_field_stop(&mut self) -> Result<usize, CodecError> {
        Ok(0)
    }

    pub fn write_map_begin(&mut self, _size: usize) -> Result<usize, CodecError> {
        self.write_json_object_start()
    }

    pub fn write_map_end(&mut self) -> Result<usize, CodecError> {
        self.write_json_object_end()
    }

    pub fn write_list_begin(&mut self, _size: usize) -> Result<usize, CodecError> {
        self.write_json_array_start()
    }

    pub fn write_list_end(&mut self) -> Result<usize, CodecError> {
        self.write_json_array_end()
    }

    pub fn write_set_begin(&mut self, _size: usize) -> Result<usize, CodecError> {
        self.write_json_array_start()
    }

    pub fn write_set_end(&mut self) -> Result<usize, CodecError> {
        self.write_json_array_end()
    }

    pub fn write_bool(&mut self, value: bool) -> Result<usize, CodecError> {
        let result = self.write_context()?;
        let quote = self.escape_num();
        let text = if value { "true" } else { "false" };
        Ok(result + self.write_json_scalar(text, quote)?)
    }

    pub fn write_byte(&mut self, value: i8) -> Result<usize, CodecError> {
        self.write_json_integer(value.into())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<usize, CodecError> {
        self.write_json_integer(value.into())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<usize, CodecError> {
        self.write_json_integer(value.into())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<usize, CodecError> {
        self.write_json_integer(value)
    }

    pub fn write_double(&mut self, value: f64) -> Result<usize, CodecError> {
        self.write_json_double(value)
    }

    pub fn write_string(&mut self, value: &str) -> Result<usize, CodecError> {
        self.write_json_string(value)
    }

    pub fn write_binary(&mut self, value: &[u8]) -> Result<usize, CodecError> {
        self.write_json_base64(value)
    }
}
