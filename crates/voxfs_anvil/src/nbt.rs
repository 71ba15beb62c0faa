//! # NBT Tag Tree
//!
//! A minimal reader/writer for the named binary tag format the region
//! payloads carry. Big-endian throughout, type ids 0-12, one named compound
//! at the root.
//!
//! Only what the region codec needs is implemented; unknown tags in a chunk
//! are preserved verbatim through a decode/encode cycle because the whole
//! tree is parsed and re-serialized.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::error::{AnvilError, AnvilResult};

/// End-of-compound marker id.
const TAG_END: u8 = 0;

/// One NBT tag.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    /// Signed 8-bit integer (id 1).
    Byte(i8),
    /// Signed 16-bit integer (id 2).
    Short(i16),
    /// Signed 32-bit integer (id 3).
    Int(i32),
    /// Signed 64-bit integer (id 4).
    Long(i64),
    /// 32-bit float (id 5).
    Float(f32),
    /// 64-bit float (id 6).
    Double(f64),
    /// Length-prefixed byte array (id 7).
    ByteArray(Vec<i8>),
    /// Length-prefixed UTF-8 string (id 8).
    String(String),
    /// Homogeneous list (id 9).
    List(Vec<Tag>),
    /// Named children (id 10).
    Compound(BTreeMap<String, Tag>),
    /// Length-prefixed i32 array (id 11).
    IntArray(Vec<i32>),
    /// Length-prefixed i64 array (id 12).
    LongArray(Vec<i64>),
}

impl Tag {
    /// Wire type id of this tag.
    #[must_use]
    pub const fn type_id(&self) -> u8 {
        match self {
            Self::Byte(_) => 1,
            Self::Short(_) => 2,
            Self::Int(_) => 3,
            Self::Long(_) => 4,
            Self::Float(_) => 5,
            Self::Double(_) => 6,
            Self::ByteArray(_) => 7,
            Self::String(_) => 8,
            Self::List(_) => 9,
            Self::Compound(_) => 10,
            Self::IntArray(_) => 11,
            Self::LongArray(_) => 12,
        }
    }

    /// Reads the named root compound from uncompressed payload bytes.
    ///
    /// # Errors
    ///
    /// [`AnvilError::Nbt`] if the stream is truncated or the root is not a
    /// compound.
    pub fn read_root(bytes: &[u8]) -> AnvilResult<Self> {
        let mut reader = bytes;
        let id = read_u8(&mut reader)?;
        if id != 10 {
            return Err(AnvilError::Nbt(format!("root tag id {id}, expected 10")));
        }
        let _name = read_string(&mut reader)?;
        Self::read_payload(&mut reader, id)
    }

    /// Serializes this tag as an unnamed-root payload (empty root name).
    ///
    /// # Errors
    ///
    /// Propagates writer failures; writing to a `Vec` never fails.
    pub fn write_root(&self, out: &mut Vec<u8>) -> AnvilResult<()> {
        out.push(self.type_id());
        write_string(out, "")?;
        self.write_payload(out)
    }

    fn read_payload(reader: &mut &[u8], id: u8) -> AnvilResult<Self> {
        match id {
            1 => Ok(Self::Byte(read_u8(reader)? as i8)),
            2 => Ok(Self::Short(i16::from_be_bytes(read_array(reader)?))),
            3 => Ok(Self::Int(i32::from_be_bytes(read_array(reader)?))),
            4 => Ok(Self::Long(i64::from_be_bytes(read_array(reader)?))),
            5 => Ok(Self::Float(f32::from_be_bytes(read_array(reader)?))),
            6 => Ok(Self::Double(f64::from_be_bytes(read_array(reader)?))),
            7 => {
                let len = read_len(reader)?;
                let mut values = vec![0u8; len];
                read_exact(reader, &mut values)?;
                Ok(Self::ByteArray(values.into_iter().map(|b| b as i8).collect()))
            }
            8 => Ok(Self::String(read_string(reader)?)),
            9 => {
                let element_id = read_u8(reader)?;
                let len = read_len(reader)?;
                if element_id == TAG_END && len > 0 {
                    return Err(AnvilError::Nbt("non-empty list of end tags".into()));
                }
                let mut elements = Vec::with_capacity(len);
                for _ in 0..len {
                    elements.push(Self::read_payload(reader, element_id)?);
                }
                Ok(Self::List(elements))
            }
            10 => {
                let mut children = BTreeMap::new();
                loop {
                    let child_id = read_u8(reader)?;
                    if child_id == TAG_END {
                        break;
                    }
                    let name = read_string(reader)?;
                    let child = Self::read_payload(reader, child_id)?;
                    children.insert(name, child);
                }
                Ok(Self::Compound(children))
            }
            11 => {
                let len = read_len(reader)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(i32::from_be_bytes(read_array(reader)?));
                }
                Ok(Self::IntArray(values))
            }
            12 => {
                let len = read_len(reader)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(i64::from_be_bytes(read_array(reader)?));
                }
                Ok(Self::LongArray(values))
            }
            other => Err(AnvilError::Nbt(format!("unknown tag id {other}"))),
        }
    }

    fn write_payload(&self, out: &mut Vec<u8>) -> AnvilResult<()> {
        match self {
            Self::Byte(v) => out.push(*v as u8),
            Self::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::ByteArray(values) => {
                write_len(out, values.len())?;
                out.extend(values.iter().map(|b| *b as u8));
            }
            Self::String(v) => write_string(out, v)?,
            Self::List(elements) => {
                let element_id = elements.first().map_or(TAG_END, Tag::type_id);
                out.push(element_id);
                write_len(out, elements.len())?;
                for element in elements {
                    element.write_payload(out)?;
                }
            }
            Self::Compound(children) => {
                for (name, child) in children {
                    out.push(child.type_id());
                    write_string(out, name)?;
                    child.write_payload(out)?;
                }
                out.push(TAG_END);
            }
            Self::IntArray(values) => {
                write_len(out, values.len())?;
                for value in values {
                    out.extend_from_slice(&value.to_be_bytes());
                }
            }
            Self::LongArray(values) => {
                write_len(out, values.len())?;
                for value in values {
                    out.extend_from_slice(&value.to_be_bytes());
                }
            }
        }
        Ok(())
    }

    /// Borrows the compound's children, if this is a compound.
    #[must_use]
    pub fn as_compound(&self) -> Option<&BTreeMap<String, Tag>> {
        match self {
            Self::Compound(children) => Some(children),
            _ => None,
        }
    }

    /// Mutably borrows the compound's children.
    #[must_use]
    pub fn as_compound_mut(&mut self) -> Option<&mut BTreeMap<String, Tag>> {
        match self {
            Self::Compound(children) => Some(children),
            _ => None,
        }
    }

    /// Borrows the list elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Self::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// Mutably borrows the list elements.
    #[must_use]
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Tag>> {
        match self {
            Self::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// Integer value of a Byte, Short, Int, or Long tag.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// String value, if this is a string tag.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Long-array contents, if this is a long array.
    #[must_use]
    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Self::LongArray(values) => Some(values),
            _ => None,
        }
    }
}

fn read_exact(reader: &mut &[u8], buf: &mut [u8]) -> AnvilResult<()> {
    reader
        .read_exact(buf)
        .map_err(|_| AnvilError::Nbt("unexpected end of tag data".into()))
}

fn read_u8(reader: &mut &[u8]) -> AnvilResult<u8> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf)?;
    Ok(buf[0])
}

fn read_array<const N: usize>(reader: &mut &[u8]) -> AnvilResult<[u8; N]> {
    let mut buf = [0u8; N];
    read_exact(reader, &mut buf)?;
    Ok(buf)
}

fn read_len(reader: &mut &[u8]) -> AnvilResult<usize> {
    let len = i32::from_be_bytes(read_array(reader)?);
    usize::try_from(len).map_err(|_| AnvilError::Nbt(format!("negative length {len}")))
}

fn read_string(reader: &mut &[u8]) -> AnvilResult<String> {
    let len = u16::from_be_bytes(read_array(reader)?) as usize;
    let mut buf = vec![0u8; len];
    read_exact(reader, &mut buf)?;
    String::from_utf8(buf).map_err(|error| AnvilError::Nbt(format!("bad utf-8: {error}")))
}

fn write_string(out: &mut impl Write, value: &str) -> AnvilResult<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| AnvilError::Nbt(format!("string too long: {} bytes", value.len())))?;
    out.write_all(&len.to_be_bytes())?;
    out.write_all(value.as_bytes())?;
    Ok(())
}

fn write_len(out: &mut Vec<u8>, len: usize) -> AnvilResult<()> {
    let len = i32::try_from(len).map_err(|_| AnvilError::Nbt(format!("length overflow: {len}")))?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(tag: Tag) -> Tag {
        let mut bytes = Vec::new();
        tag.write_root(&mut bytes).unwrap();
        Tag::read_root(&bytes).unwrap()
    }

    #[test]
    fn test_scalar_roundtrip() {
        let mut children = BTreeMap::new();
        children.insert("a_byte".into(), Tag::Byte(-3));
        children.insert("a_short".into(), Tag::Short(-300));
        children.insert("an_int".into(), Tag::Int(70_000));
        children.insert("a_long".into(), Tag::Long(-(1 << 40)));
        children.insert("a_float".into(), Tag::Float(1.5));
        children.insert("a_double".into(), Tag::Double(-2.25));
        children.insert("a_string".into(), Tag::String("hello".into()));
        let tag = Tag::Compound(children);
        assert_eq!(roundtrip(tag.clone()), tag);
    }

    #[test]
    fn test_nested_roundtrip() {
        let mut section = BTreeMap::new();
        section.insert("Y".into(), Tag::Byte(2));
        section.insert("data".into(), Tag::LongArray(vec![0x0123_4567, -1]));
        let mut root = BTreeMap::new();
        root.insert(
            "sections".into(),
            Tag::List(vec![Tag::Compound(section.clone()), Tag::Compound(section)]),
        );
        root.insert("ints".into(), Tag::IntArray(vec![1, -2, 3]));
        root.insert("bytes".into(), Tag::ByteArray(vec![-1, 0, 1]));
        let tag = Tag::Compound(root);
        assert_eq!(roundtrip(tag.clone()), tag);
    }

    #[test]
    fn test_empty_list_roundtrip() {
        let mut root = BTreeMap::new();
        root.insert("sections".into(), Tag::List(Vec::new()));
        let tag = Tag::Compound(root);
        assert_eq!(roundtrip(tag.clone()), tag);
    }

    #[test]
    fn test_truncated_stream_is_an_error() {
        let mut bytes = Vec::new();
        Tag::Compound(BTreeMap::new()).write_root(&mut bytes).unwrap();
        bytes.pop();
        assert!(matches!(Tag::read_root(&bytes), Err(AnvilError::Nbt(_))));
    }

    #[test]
    fn test_non_compound_root_is_an_error() {
        let bytes = [3u8, 0, 0, 0, 0, 0, 42];
        assert!(matches!(Tag::read_root(&bytes), Err(AnvilError::Nbt(_))));
    }
}
