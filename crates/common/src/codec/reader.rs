//! Pull-based JSON reader
//!
//! The whole input is parsed into a `serde_json` tree on the first
//! `read_struct_begin`. After that every typed `read_*` call pulls the next
//! value out of the innermost frame, so callers must ask for fields in the
//! same shape the writer produced them. The reader carries no schema of its
//! own.

use serde_json::{Map, Value as Json};

use super::error::CodecError;
use super::writer::{INFINITY, NAN, NEGATIVE_INFINITY};

/// Largest magnitude an f64 can carry without losing integer precision
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

const STACK_EMPTY: &str = "Illegal parser state; stack empty";

/// Cursor over a parsed JSON object, positioned on its current entry
#[derive(Debug)]
struct ObjectCursor {
    entries: serde_json::map::IntoIter,
    current: Option<(String, Json)>,
}

impl ObjectCursor {
    fn new(map: Map<String, Json>) -> Self {
        let mut entries = map.into_iter();
        let current = entries.next();
        Self { entries, current }
    }

    fn advance(&mut self) {
        self.current = self.entries.next();
    }

    fn key(&self) -> Option<&str> {
        self.current.as_ref().map(|(key, _)| key.as_str())
    }
}

/// One level of nesting on the read side
#[derive(Debug)]
enum ParserFrame {
    /// Yields the current field's value; `read_field_end` advances
    Struct(ObjectCursor),
    List(std::vec::IntoIter<Json>),
    Set(std::vec::IntoIter<Json>),
    /// Next pull yields the current key as a string
    MapKey(ObjectCursor),
    /// Next pull yields the current value and advances
    MapValue(ObjectCursor),
}

impl ParserFrame {
    fn describe(&self) -> String {
        match self {
            ParserFrame::Struct(cursor)
            | ParserFrame::MapKey(cursor)
            | ParserFrame::MapValue(cursor) => match cursor.key() {
                Some(key) => format!("field \"{}\"", key),
                None => "end of object".to_string(),
            },
            ParserFrame::List(_) | ParserFrame::Set(_) => "list field".to_string(),
        }
    }
}

/// A value pulled out of the current frame
struct Pulled {
    value: Json,
    /// The value is a synthetic map key and may need coercion
    from_key: bool,
}

fn kind_of(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Drop commas that are directly followed (modulo whitespace) by `}` or `]`
fn strip_trailing_commas(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in input.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == b'"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }

        match ch {
            b'"' => in_string = true,
            b',' => {
                let next = input[i + 1..]
                    .iter()
                    .find(|c| !c.is_ascii_whitespace())
                    .copied();
                let prev = out.iter().rev().find(|c| !c.is_ascii_whitespace()).copied();
                let follows_element = !matches!(prev, None | Some(b'[') | Some(b'{') | Some(b','));
                if follows_element && matches!(next, Some(b'}') | Some(b']')) {
                    continue;
                }
            }
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// Typed reader over one JSON document
#[derive(Debug)]
pub struct JsonReader {
    input: Vec<u8>,
    frames: Vec<ParserFrame>,
}

impl JsonReader {
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            frames: Vec::new(),
        }
    }

    /// Number of frames currently open
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Description of every open frame, outermost first
    pub fn stack_trace(&self) -> String {
        if self.frames.is_empty() {
            return STACK_EMPTY.to_string();
        }
        self.frames
            .iter()
            .map(ParserFrame::describe)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn error(&self, message: impl Into<String>) -> CodecError {
        CodecError::protocol(message, self.stack_trace())
    }

    fn parse_document(&self) -> Result<Json, CodecError> {
        let cleaned = strip_trailing_commas(&self.input);
        serde_json::from_slice(&cleaned)
            .map_err(|e| CodecError::protocol(format!("invalid JSON document: {}", e), STACK_EMPTY))
    }

    /// Pull the next value out of the innermost frame
    fn next_value(&mut self) -> Result<Pulled, CodecError> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| CodecError::protocol(STACK_EMPTY, ""))?;

        let (frame, pulled) = match frame {
            ParserFrame::Struct(mut cursor) => {
                let value = cursor.current.as_mut().map(|(_, value)| value.take());
                (ParserFrame::Struct(cursor), value.map(|value| Pulled { value, from_key: false }))
            }
            ParserFrame::List(mut elements) => {
                let value = elements.next();
                (ParserFrame::List(elements), value.map(|value| Pulled { value, from_key: false }))
            }
            ParserFrame::Set(mut elements) => {
                let value = elements.next();
                (ParserFrame::Set(elements), value.map(|value| Pulled { value, from_key: false }))
            }
            ParserFrame::MapKey(cursor) => {
                let key = cursor.key().map(|key| Json::String(key.to_string()));
                (ParserFrame::MapValue(cursor), key.map(|value| Pulled { value, from_key: true }))
            }
            ParserFrame::MapValue(mut cursor) => {
                let value = cursor.current.take().map(|(_, value)| value);
                cursor.advance();
                (ParserFrame::MapKey(cursor), value.map(|value| Pulled { value, from_key: false }))
            }
        };

        self.frames.push(frame);
        pulled.ok_or_else(|| self.error("read past the end of the current container"))
    }

    fn pop_frame(&mut self) -> Result<ParserFrame, CodecError> {
        self.frames
            .pop()
            .ok_or_else(|| CodecError::protocol(STACK_EMPTY, ""))
    }

    pub fn read_message_begin(&mut self) -> Result<(), CodecError> {
        Err(CodecError::NotImplemented("read_message_begin"))
    }

    pub fn read_message_end(&mut self) -> Result<(), CodecError> {
        Err(CodecError::NotImplemented("read_message_end"))
    }

    pub fn read_struct_begin(&mut self) -> Result<(), CodecError> {
        let value = if self.frames.is_empty() {
            self.parse_document()?
        } else {
            self.next_value()?.value
        };

        match value {
            Json::Object(map) => {
                tracing::trace!(fields = map.len(), "read struct");
                self.frames.push(ParserFrame::Struct(ObjectCursor::new(map)));
                Ok(())
            }
            other => Err(self.error(format!("expected object, found {}", kind_of(&other)))),
        }
    }

    pub fn read_struct_end(&mut self) -> Result<(), CodecError> {
        match self.pop_frame()? {
            ParserFrame::Struct(_) => Ok(()),
            frame => {
                self.frames.push(frame);
                Err(self.error("struct end outside of a struct"))
            }
        }
    }

    /// Name of the next field, or `None` once the struct is exhausted
    ///
    /// A field whose value is `null` comes back with an empty name; callers
    /// treat that as absent and skip it.
    pub fn read_field_begin(&mut self) -> Result<Option<String>, CodecError> {
        match self.frames.last() {
            Some(ParserFrame::Struct(cursor)) => Ok(match &cursor.current {
                None => None,
                Some((_, Json::Null)) => Some(String::new()),
                Some((name, _)) => Some(name.clone()),
            }),
            Some(_) => Err(self.error("field read outside of a struct")),
            None => Err(CodecError::protocol(STACK_EMPTY, "")),
        }
    }

    pub fn read_field_end(&mut self) -> Result<(), CodecError> {
        match self.frames.last_mut() {
            Some(ParserFrame::Struct(cursor)) => {
                cursor.advance();
                Ok(())
            }
            Some(_) => Err(self.error("field end outside of a struct")),
            None => Err(CodecError::protocol(STACK_EMPTY, "")),
        }
    }

    /// Open a map, returning its entry count
    pub fn read_map_begin(&mut self) -> Result<usize, CodecError> {
        match self.next_value()?.value {
            Json::Object(map) => {
                let size = map.len();
                self.frames.push(ParserFrame::MapKey(ObjectCursor::new(map)));
                Ok(size)
            }
            other => Err(self.error(format!("expected map object, found {}", kind_of(&other)))),
        }
    }

    pub fn read_map_end(&mut self) -> Result<(), CodecError> {
        match self.pop_frame()? {
            ParserFrame::MapKey(_) => Ok(()),
            frame => {
                self.frames.push(frame);
                Err(self.error("map end outside of a map key position"))
            }
        }
    }

    fn read_array(&mut self) -> Result<Vec<Json>, CodecError> {
        match self.next_value()?.value {
            Json::Array(elements) => Ok(elements),
            other => Err(self.error(format!("expected array, found {}", kind_of(&other)))),
        }
    }

    /// Open a list, returning its element count
    pub fn read_list_begin(&mut self) -> Result<usize, CodecError> {
        let elements = self.read_array()?;
        let size = elements.len();
        self.frames.push(ParserFrame::List(elements.into_iter()));
        Ok(size)
    }

    pub fn read_list_end(&mut self) -> Result<(), CodecError> {
        match self.pop_frame()? {
            ParserFrame::List(_) => Ok(()),
            frame => {
                self.frames.push(frame);
                Err(self.error("list end outside of a list"))
            }
        }
    }

    /// Open a set, returning its element count
    pub fn read_set_begin(&mut self) -> Result<usize, CodecError> {
        let elements = self.read_array()?;
        let size = elements.len();
        self.frames.push(ParserFrame::Set(elements.into_iter()));
        Ok(size)
    }

    pub fn read_set_end(&mut self) -> Result<(), CodecError> {
        match self.pop_frame()? {
            ParserFrame::Set(_) => Ok(()),
            frame => {
                self.frames.push(frame);
                Err(self.error("set end outside of a set"))
            }
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        let pulled = self.next_value()?;
        match pulled.value {
            Json::Bool(value) => Ok(value),
            Json::String(text) if pulled.from_key => match text.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(self.error(format!("map key {:?} is not a boolean", text))),
            },
            other => Err(self.error(format!("expected boolean, found {}", kind_of(&other)))),
        }
    }

    fn read_integer(&mut self) -> Result<i64, CodecError> {
        let pulled = self.next_value()?;
        match pulled.value {
            Json::Number(number) => {
                if let Some(value) = number.as_i64() {
                    return Ok(value);
                }
                if number.is_u64() {
                    return Err(CodecError::SizeLimit(format!("{} does not fit in i64", number)));
                }
                let value = number
                    .as_f64()
                    .ok_or_else(|| self.error(format!("unreadable number {}", number)))?;
                if value.fract() != 0.0 {
                    return Err(self.error(format!("expected integer, found {}", value)));
                }
                if value.abs() > MAX_EXACT_INTEGER {
                    return Err(CodecError::SizeLimit(format!(
                        "{} cannot be represented exactly",
                        value
                    )));
                }
                Ok(value as i64)
            }
            Json::String(text) if pulled.from_key => text
                .parse::<i64>()
                .map_err(|_| self.error(format!("map key {:?} is not an integer", text))),
            other => Err(self.error(format!("expected integer, found {}", kind_of(&other)))),
        }
    }

    fn read_narrow<T: TryFrom<i64>>(&mut self, width: &str) -> Result<T, CodecError> {
        let value = self.read_integer()?;
        T::try_from(value)
            .map_err(|_| CodecError::SizeLimit(format!("{} does not fit in {}", value, width)))
    }

    pub fn read_byte(&mut self) -> Result<i8, CodecError> {
        self.read_narrow("i8")
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        self.read_narrow("i16")
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        self.read_narrow("i32")
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        self.read_integer()
    }

    pub fn read_double(&mut self) -> Result<f64, CodecError> {
        let pulled = self.next_value()?;
        match pulled.value {
            Json::Number(number) => number
                .as_f64()
                .ok_or_else(|| self.error(format!("unreadable number {}", number))),
            Json::String(text) => match text.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEGATIVE_INFINITY => Ok(f64::NEG_INFINITY),
                _ if pulled.from_key => text
                    .parse::<f64>()
                    .map_err(|_| self.error(format!("map key {:?} is not a number", text))),
                _ => Err(self.error(format!("expected number, found string {:?}", text))),
            },
            other => Err(self.error(format!("expected number, found {}", kind_of(&other)))),
        }
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        match self.next_value()?.value {
            Json::String(text) => Ok(text),
            other => Err(self.error(format!("expected string, found {}", kind_of(&other)))),
        }
    }

    pub fn read_binary(&mut self) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::NotImplemented("read_binary"))
    }
}
