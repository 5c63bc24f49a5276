//! The binary codec behind every `.dat` store.
//!
//! The format is deliberately plain:
//! - sum types carry a one-byte discriminant
//! - collections and strings are length-prefixed (`u32`, little-endian)
//! - integers are fixed-width little-endian
//!
//! Encoding is deterministic: the same logical value always produces the
//! same bytes (maps and sets encode in their `BTree` order), and
//! `decode(encode(x)) == x`. Corruption surfaces as a [`CodecError`]; the
//! stores built on top treat that as "rebuild from source", never as a
//! crash.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Decode failure, with the byte position where trouble was found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The stream ended before a value was complete.
    #[error("truncated stream: needed {needed} more bytes at offset {at}")]
    Truncated {
        /// Bytes still required.
        needed: usize,
        /// Offset where the read started.
        at: usize,
    },

    /// A discriminant byte matched no variant.
    #[error("unknown tag {tag} for {what} at offset {at}")]
    UnknownTag {
        /// The byte found.
        tag: u8,
        /// Which sum type was being decoded.
        what: &'static str,
        /// Offset of the tag byte.
        at: usize,
    },

    /// A string's bytes are not UTF-8.
    #[error("invalid UTF-8 in string at offset {at}")]
    BadUtf8 {
        /// Offset of the string's length prefix.
        at: usize,
    },

    /// A value parsed but violated its own invariant (e.g. a malformed name).
    #[error("invalid {what} at offset {at}: {message}")]
    BadValue {
        /// Which type was being decoded.
        what: &'static str,
        /// Offset where the value started.
        at: usize,
        /// What was wrong.
        message: String,
    },

    /// The stream decoded fully but bytes remain.
    #[error("{remaining} trailing bytes after a complete value")]
    Trailing {
        /// Bytes left over.
        remaining: usize,
    },
}

/// Byte sink for [`Encode`].
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Fresh empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the writer, yielding the encoded bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Append a single byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append a little-endian `u16`.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `u64`.
    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a `u32` length prefix.
    pub fn put_len(&mut self, len: usize) {
        self.put_u32(len as u32);
    }

    /// Append raw bytes with no prefix.
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// Byte cursor for [`Decode`].
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Read from the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset, for error reporting.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < count {
            return Err(CodecError::Truncated {
                needed: count - self.remaining(),
                at: self.pos,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian `u16`.
    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    /// Read a little-endian `u32`.
    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Read a little-endian `u64`.
    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Read a `u32` length prefix.
    pub fn get_len(&mut self) -> Result<usize, CodecError> {
        Ok(self.get_u32()? as usize)
    }

    /// Read `count` raw bytes.
    pub fn get_raw(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        self.take(count)
    }
}

/// Types that serialize to the deterministic binary form.
pub trait Encode {
    /// Append this value's bytes to `writer`.
    fn encode(&self, writer: &mut Writer);
}

/// Types that deserialize from the binary form.
pub trait Decode: Sized {
    /// Read one value from `reader`.
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError>;
}

/// Encode a value to a fresh byte vector.
#[must_use]
pub fn to_bytes<T: Encode>(value: &T) -> Vec<u8> {
    let mut writer = Writer::new();
    value.encode(&mut writer);
    writer.finish()
}

/// Decode a complete value; trailing bytes are corruption.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut reader = Reader::new(bytes);
    let value = T::decode(&mut reader)?;
    if reader.remaining() > 0 {
        return Err(CodecError::Trailing {
            remaining: reader.remaining(),
        });
    }
    Ok(value)
}

impl Encode for u8 {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u8(*self);
    }
}

impl Decode for u8 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.get_u8()
    }
}

impl Encode for u16 {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u16(*self);
    }
}

impl Decode for u16 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.get_u16()
    }
}

impl Encode for u32 {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u32(*self);
    }
}

impl Decode for u32 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.get_u32()
    }
}

impl Encode for u64 {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u64(*self);
    }
}

impl Decode for u64 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.get_u64()
    }
}

impl Encode for bool {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u8(u8::from(*self));
    }
}

impl Decode for bool {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        match reader.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(CodecError::UnknownTag {
                tag,
                what: "bool",
                at,
            }),
        }
    }
}

impl Encode for String {
    fn encode(&self, writer: &mut Writer) {
        writer.put_len(self.len());
        writer.put_raw(self.as_bytes());
    }
}

impl Decode for String {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        let len = reader.get_len()?;
        let bytes = reader.get_raw(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::BadUtf8 { at })
    }
}

impl Encode for std::path::PathBuf {
    fn encode(&self, writer: &mut Writer) {
        self.to_string_lossy().into_owned().encode(writer);
    }
}

impl Decode for std::path::PathBuf {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self::from(String::decode(reader)?))
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, writer: &mut Writer) {
        writer.put_len(self.len());
        for item in self {
            item.encode(writer);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let len = reader.get_len()?;
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, writer: &mut Writer) {
        match self {
            None => writer.put_u8(0),
            Some(value) => {
                writer.put_u8(1);
                value.encode(writer);
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        match reader.get_u8()? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(reader)?)),
            tag => Err(CodecError::UnknownTag {
                tag,
                what: "Option",
                at,
            }),
        }
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, writer: &mut Writer) {
        writer.put_len(self.len());
        for (key, value) in self {
            key.encode(writer);
            value.encode(writer);
        }
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let len = reader.get_len()?;
        let mut map = Self::new();
        for _ in 0..len {
            let key = K::decode(reader)?;
            let value = V::decode(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self, writer: &mut Writer) {
        writer.put_len(self.len());
        for item in self {
            item.encode(writer);
        }
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let len = reader.get_len()?;
        let mut set = Self::new();
        for _ in 0..len {
            set.insert(T::decode(reader)?);
        }
        Ok(set)
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode(&self, writer: &mut Writer) {
        self.0.encode(writer);
        self.1.encode(writer);
    }
}

impl<A: Decode, B: Decode> Decode for (A, B) {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok((A::decode(reader)?, B::decode(reader)?))
    }
}

mod core_impls {
    //! Codec instances for the identifier types in `gren-core`.

    use super::{CodecError, Decode, Encode, Reader, Writer};
    use gren_core::{CanonicalModule, Constraint, PackageName, Platform, Raw, Version};

    impl Encode for Version {
        fn encode(&self, writer: &mut Writer) {
            writer.put_u16(self.major);
            writer.put_u16(self.minor);
            writer.put_u16(self.patch);
        }
    }

    impl Decode for Version {
        fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
            Ok(Self::new(
                reader.get_u16()?,
                reader.get_u16()?,
                reader.get_u16()?,
            ))
        }
    }

    impl Encode for Constraint {
        fn encode(&self, writer: &mut Writer) {
            self.lower_bound().encode(writer);
            self.upper_bound().encode(writer);
        }
    }

    impl Decode for Constraint {
        fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
            let at = reader.position();
            let lo = Version::decode(reader)?;
            let hi = Version::decode(reader)?;
            Self::new(lo, hi).map_err(|err| CodecError::BadValue {
                what: "Constraint",
                at,
                message: err.to_string(),
            })
        }
    }

    impl Encode for PackageName {
        fn encode(&self, writer: &mut Writer) {
            self.to_string().encode(writer);
        }
    }

    impl Decode for PackageName {
        fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
            let at = reader.position();
            let raw = String::decode(reader)?;
            raw.parse().map_err(|err: gren_core::PackageNameError| {
                CodecError::BadValue {
                    what: "PackageName",
                    at,
                    message: err.to_string(),
                }
            })
        }
    }

    impl Encode for Raw {
        fn encode(&self, writer: &mut Writer) {
            self.as_str().to_string().encode(writer);
        }
    }

    impl Decode for Raw {
        fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
            let at = reader.position();
            let raw = String::decode(reader)?;
            raw.parse()
                .map_err(|err: gren_core::ModuleNameError| CodecError::BadValue {
                    what: "ModuleName",
                    at,
                    message: err.to_string(),
                })
        }
    }

    impl Encode for CanonicalModule {
        fn encode(&self, writer: &mut Writer) {
            self.package.encode(writer);
            self.module.encode(writer);
        }
    }

    impl Decode for CanonicalModule {
        fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
            Ok(Self {
                package: PackageName::decode(reader)?,
                module: Raw::decode(reader)?,
            })
        }
    }

    impl Encode for Platform {
        fn encode(&self, writer: &mut Writer) {
            writer.put_u8(match self {
                Platform::Common => 0,
                Platform::Browser => 1,
                Platform::Node => 2,
            });
        }
    }

    impl Decode for Platform {
        fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
            let at = reader.position();
            match reader.get_u8()? {
                0 => Ok(Platform::Common),
                1 => Ok(Platform::Browser),
                2 => Ok(Platform::Node),
                tag => Err(CodecError::UnknownTag {
                    tag,
                    what: "Platform",
                    at,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gren_core::{PackageName, Platform, Version};
    use proptest::prelude::*;

    #[test]
    fn primitives_roundtrip() {
        assert_eq!(from_bytes::<u64>(&to_bytes(&42u64)).unwrap(), 42);
        assert_eq!(from_bytes::<bool>(&to_bytes(&true)).unwrap(), true);
        assert_eq!(
            from_bytes::<String>(&to_bytes(&"héllo".to_string())).unwrap(),
            "héllo"
        );
    }

    #[test]
    fn collections_roundtrip() {
        let map = BTreeMap::from([("b".to_string(), 2u32), ("a".to_string(), 1u32)]);
        assert_eq!(from_bytes::<BTreeMap<String, u32>>(&to_bytes(&map)).unwrap(), map);

        let set = BTreeSet::from([3u16, 1, 2]);
        assert_eq!(from_bytes::<BTreeSet<u16>>(&to_bytes(&set)).unwrap(), set);
    }

    #[test]
    fn map_encoding_is_order_independent() {
        let forward: BTreeMap<_, _> = [(1u8, 10u8), (2, 20)].into_iter().collect();
        let backward: BTreeMap<_, _> = [(2u8, 20u8), (1, 10)].into_iter().collect();
        assert_eq!(to_bytes(&forward), to_bytes(&backward));
    }

    #[test]
    fn core_types_roundtrip() {
        let name: PackageName = "gren/core".parse().unwrap();
        assert_eq!(from_bytes::<PackageName>(&to_bytes(&name)).unwrap(), name);

        let version = Version::new(2, 0, 4);
        assert_eq!(from_bytes::<Version>(&to_bytes(&version)).unwrap(), version);

        for platform in [Platform::Common, Platform::Browser, Platform::Node] {
            assert_eq!(
                from_bytes::<Platform>(&to_bytes(&platform)).unwrap(),
                platform
            );
        }
    }

    #[test]
    fn truncation_is_reported() {
        let bytes = to_bytes(&"a longer string".to_string());
        let err = from_bytes::<String>(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn unknown_tag_is_reported_with_position() {
        let mut bytes = to_bytes(&Platform::Node);
        bytes[0] = 9;
        let err = from_bytes::<Platform>(&bytes).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownTag {
                tag: 9,
                what: "Platform",
                at: 0
            }
        );
    }

    #[test]
    fn trailing_bytes_are_corruption() {
        let mut bytes = to_bytes(&7u8);
        bytes.push(0);
        assert_eq!(
            from_bytes::<u8>(&bytes).unwrap_err(),
            CodecError::Trailing { remaining: 1 }
        );
    }

    proptest! {
        #[test]
        fn strings_roundtrip(text in ".*") {
            let value = text.to_string();
            prop_assert_eq!(from_bytes::<String>(&to_bytes(&value)).unwrap(), value);
        }

        #[test]
        fn nested_collections_roundtrip(
            entries in proptest::collection::btree_map(
                "[a-z]{1,8}",
                proptest::collection::vec(0u32..1000, 0..8),
                0..8,
            )
        ) {
            let bytes = to_bytes(&entries);
            prop_assert_eq!(from_bytes::<BTreeMap<String, Vec<u32>>>(&bytes).unwrap(), entries);
        }

        #[test]
        fn encoding_is_deterministic(
            entries in proptest::collection::btree_map("[a-z]{1,8}", 0u64..100, 0..8)
        ) {
            prop_assert_eq!(to_bytes(&entries), to_bytes(&entries.clone()));
        }
    }
}
