//! Typed records on top of the writer and reader
//!
//! Request and response records are declared with [`wire_struct!`], which
//! generates a plain struct of optional fields together with its
//! [`WireStruct`] implementation. Absent fields are omitted on write; unknown
//! and `null` fields are skipped on read.

use std::collections::BTreeMap;
use std::io::Write;

use super::error::CodecError;
use super::reader::JsonReader;
use super::writer::JsonWriter;

/// A record that serializes as a JSON object
pub trait WireStruct: Sized {
    /// Record name, used for tracing
    const NAME: &'static str;

    fn write<W: Write>(&self, w: &mut JsonWriter<W>) -> Result<usize, CodecError>;

    fn read(r: &mut JsonReader) -> Result<Self, CodecError>;
}

/// Anything that can sit in a record field
pub trait WireField: Sized {
    fn write_field<W: Write>(&self, w: &mut JsonWriter<W>) -> Result<usize, CodecError>;

    fn read_field(r: &mut JsonReader) -> Result<Self, CodecError>;
}

macro_rules! scalar_field {
    ($ty:ty, $write:ident, $read:ident) => {
        impl WireField for $ty {
            fn write_field<W: Write>(&self, w: &mut JsonWriter<W>) -> Result<usize, CodecError> {
                w.$write(*self)
            }

            fn read_field(r: &mut JsonReader) -> Result<Self, CodecError> {
                r.$read()
            }
        }
    };
}

scalar_field!(bool, write_bool, read_bool);
scalar_field!(i8, write_byte, read_byte);
scalar_field!(i16, write_i16, read_i16);
scalar_field!(i32, write_i32, read_i32);
scalar_field!(i64, write_i64, read_i64);
scalar_field!(f64, write_double, read_double);

impl WireField for String {
    fn write_field<W: Write>(&self, w: &mut JsonWriter<W>) -> Result<usize, CodecError> {
        w.write_string(self)
    }

    fn read_field(r: &mut JsonReader) -> Result<Self, CodecError> {
        r.read_string()
    }
}

impl<T: WireField> WireField for Vec<T> {
    fn write_field<W: Write>(&self, w: &mut JsonWriter<W>) -> Result<usize, CodecError> {
        let mut n = w.write_list_begin(self.len())?;
        for element in self {
            n += element.write_field(w)?;
        }
        n += w.write_list_end()?;
        Ok(n)
    }

    fn read_field(r: &mut JsonReader) -> Result<Self, CodecError> {
        let size = r.read_list_begin()?;
        let mut out = Vec::with_capacity(size);
        for _ in 0..size {
            out.push(T::read_field(r)?);
        }
        r.read_list_end()?;
        Ok(out)
    }
}

impl<K: WireField + Ord, V: WireField> WireField for BTreeMap<K, V> {
    fn write_field<W: Write>(&self, w: &mut JsonWriter<W>) -> Result<usize, CodecError> {
        let mut n = w.write_map_begin(self.len())?;
        for (key, value) in self {
            n += key.write_field(w)?;
            n += value.write_field(w)?;
        }
        n += w.write_map_end()?;
        Ok(n)
    }

    fn read_field(r: &mut JsonReader) -> Result<Self, CodecError> {
        let size = r.read_map_begin()?;
        let mut out = BTreeMap::new();
        for _ in 0..size {
            let key = K::read_field(r)?;
            let value = V::read_field(r)?;
            out.insert(key, value);
        }
        r.read_map_end()?;
        Ok(out)
    }
}

/// Serialize a record into a fresh buffer
pub fn to_vec<T: WireStruct>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut w = JsonWriter::buffer();
    value.write(&mut w)?;
    Ok(w.into_inner())
}

/// Serialize a record into a string
pub fn to_string<T: WireStruct>(value: &T) -> Result<String, CodecError> {
    let bytes = to_vec(value)?;
    // the writer only ever emits UTF-8
    String::from_utf8(bytes).map_err(|e| CodecError::protocol(e.to_string(), T::NAME))
}

/// Parse a record from a complete JSON document
pub fn from_slice<T: WireStruct>(input: &[u8]) -> Result<T, CodecError> {
    let mut r = JsonReader::new(input);
    T::read(&mut r)
}

/// Declare a record of optional fields with its wire mapping
///
/// ```ignore
/// wire_struct! {
///     pub struct GroupInfo {
///         pub group_id: i32 => "groupId",
///         pub name: String => "name",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty => $wire:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: Option<$ty>,
            )*
        }

        impl $crate::codec::WireStruct for $name {
            const NAME: &'static str = stringify!($name);

            fn write<W: std::io::Write>(
                &self,
                w: &mut $crate::codec::JsonWriter<W>,
            ) -> Result<usize, $crate::codec::CodecError> {
                let mut n = w.write_struct_begin(Self::NAME)?;
                $(
                    if let Some(value) = &self.$field {
                        n += w.write_field_begin($wire)?;
                        n += $crate::codec::WireField::write_field(value, w)?;
                        n += w.write_field_end()?;
                    }
                )*
                n += w.write_field_stop()?;
                n += w.write_struct_end()?;
                Ok(n)
            }

            fn read(
                r: &mut $crate::codec::JsonReader,
            ) -> Result<Self, $crate::codec::CodecError> {
                let mut out = Self::default();
                r.read_struct_begin()?;
                while let Some(name) = r.read_field_begin()? {
                    match name.as_str() {
                        $(
                            $wire => {
                                out.$field =
                                    Some(<$ty as $crate::codec::WireField>::read_field(r)?);
                            }
                        )*
                        _ => {}
                    }
                    r.read_field_end()?;
                }
                r.read_struct_end()?;
                Ok(out)
            }
        }

        impl $crate::codec::WireField for $name {
            fn write_field<W: std::io::Write>(
                &self,
                w: &mut $crate::codec::JsonWriter<W>,
            ) -> Result<usize, $crate::codec::CodecError> {
                $crate::codec::WireStruct::write(self, w)
            }

            fn read_field(
                r: &mut $crate::codec::JsonReader,
            ) -> Result<Self, $crate::codec::CodecError> {
                <Self as $crate::codec::WireStruct>::read(r)
            }
        }
    };
}
