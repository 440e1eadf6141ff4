//! Schema-typed value model
//!
//! [`Value`] is the generic form of anything the codec can carry. Since the
//! reader is not self-describing, reading a `Value` back takes a
//! [`ValueType`] describing the shape to expect.

use std::io::Write;

use super::error::CodecError;
use super::reader::JsonReader;
use super::writer::JsonWriter;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    /// Fields in declaration order
    Struct(Vec<(String, Value)>),
    List(Vec<Value>),
    Set(Vec<Value>),
    /// Entries in emission order, keys unique
    Map(Vec<(Value, Value)>),
}

/// Shape of a [`Value`], used to drive the reader
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    /// Known fields by wire name; anything else in the document is skipped
    Struct(Vec<(String, ValueType)>),
    List(Box<ValueType>),
    Set(Box<ValueType>),
    Map(Box<ValueType>, Box<ValueType>),
}

impl ValueType {
    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn set(element: ValueType) -> Self {
        ValueType::Set(Box::new(element))
    }

    pub fn map(key: ValueType, value: ValueType) -> Self {
        ValueType::Map(Box::new(key), Box::new(value))
    }
}

impl Value {
    /// Write this value, returning the number of bytes emitted
    pub fn write<W: Write>(&self, w: &mut JsonWriter<W>) -> Result<usize, CodecError> {
        let mut n = 0;
        match self {
            Value::Bool(v) => n += w.write_bool(*v)?,
            Value::I8(v) => n += w.write_byte(*v)?,
            Value::I16(v) => n += w.write_i16(*v)?,
            Value::I32(v) => n += w.write_i32(*v)?,
            Value::I64(v) => n += w.write_i64(*v)?,
            Value::Double(v) => n += w.write_double(*v)?,
            Value::String(v) => n += w.write_string(v)?,
            Value::Binary(v) => n += w.write_binary(v)?,
            Value::Struct(fields) => {
                n += w.write_struct_begin("")?;
                for (name, value) in fields {
                    n += w.write_field_begin(name)?;
                    n += value.write(w)?;
                    n += w.write_field_end()?;
                }
                n += w.write_field_stop()?;
                n += w.write_struct_end()?;
            }
            Value::List(elements) => {
                n += w.write_list_begin(elements.len())?;
                for element in elements {
                    n += element.write(w)?;
                }
                n += w.write_list_end()?;
            }
            Value::Set(elements) => {
                n += w.write_set_begin(elements.len())?;
                for element in elements {
                    n += element.write(w)?;
                }
                n += w.write_set_end()?;
            }
            Value::Map(entries) => {
                n += w.write_map_begin(entries.len())?;
                for (key, value) in entries {
                    n += key.write(w)?;
                    n += value.write(w)?;
                }
                n += w.write_map_end()?;
            }
        }
        Ok(n)
    }

    /// Read a value of the given shape
    ///
    /// Struct fields come back in document order. Fields that are `null` or
    /// not named in the descriptor are dropped.
    pub fn read(r: &mut JsonReader, ty: &ValueType) -> Result<Value, CodecError> {
        Ok(match ty {
            ValueType::Bool => Value::Bool(r.read_bool()?),
            ValueType::I8 => Value::I8(r.read_byte()?),
            ValueType::I16 => Value::I16(r.read_i16()?),
            ValueType::I32 => Value::I32(r.read_i32()?),
            ValueType::I64 => Value::I64(r.read_i64()?),
            ValueType::Double => Value::Double(r.read_double()?),
            ValueType::String => Value::String(r.read_string()?),
            ValueType::Binary => Value::Binary(r.read_binary()?),
            ValueType::Struct(descriptors) => {
                r.read_struct_begin()?;
                let mut fields = Vec::new();
                while let Some(name) = r.read_field_begin()? {
                    let known = descriptors.iter().find(|(field, _)| *field == name);
                    if let Some((_, field_type)) = known {
                        fields.push((name, Value::read(r, field_type)?));
                    } else if !name.is_empty() {
                        tracing::trace!(field = %name, "skipping unknown field");
                    }
                    r.read_field_end()?;
                }
                r.read_struct_end()?;
                Value::Struct(fields)
            }
            ValueType::List(element) => {
                let size = r.read_list_begin()?;
                let mut elements = Vec::with_capacity(size);
                for _ in 0..size {
                    elements.push(Value::read(r, element)?);
                }
                r.read_list_end()?;
                Value::List(elements)
            }
            ValueType::Set(element) => {
                let size = r.read_set_begin()?;
                let mut elements = Vec::with_capacity(size);
                for _ in 0..size {
                    elements.push(Value::read(r, element)?);
                }
                r.read_set_end()?;
                Value::Set(elements)
            }
            ValueType::Map(key, value) => {
                let size = r.read_map_begin()?;
                let mut entries = Vec::with_capacity(size);
                for _ in 0..size {
                    let k = Value::read(r, key)?;
                    let v = Value::read(r, value)?;
                    entries.push((k, v));
                }
                r.read_map_end()?;
                Value::Map(entries)
            }
        })
    }
}
