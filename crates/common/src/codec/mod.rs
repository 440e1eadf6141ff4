//! JSON wire codec
//!
//! The server speaks a schema-typed JSON dialect: structs and maps are
//! objects, lists and sets are arrays, binary travels as base64, map keys
//! are always strings, and the non-finite doubles are spelled `"NaN"`,
//! `"Infinity"` and `"-Infinity"`.
//!
//! [`JsonWriter`] emits that dialect through a stack of writer contexts.
//! [`JsonReader`] walks a parsed document through a stack of parser frames.
//! Neither is self-describing: a read sequence must mirror the write
//! sequence that produced the document. [`Value`] and the [`wire_struct!`]
//! records are the two ways of driving them.

mod error;
mod reader;
mod value;
mod wire;
mod writer;

pub use error::CodecError;
pub use reader::JsonReader;
pub use value::{Value, ValueType};
pub use wire::{from_slice, to_string, to_vec, WireField, WireStruct};
pub use writer::{JsonWriter, MessageType, INFINITY, NAN, NEGATIVE_INFINITY, PROTOCOL_VERSION};
