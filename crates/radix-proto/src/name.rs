//! Domain names: storage, comparison, and wire-format parsing.
//!
//! Names are kept in uncompressed wire format (length-prefixed labels,
//! terminated by the root label). Comparison and hashing are
//! case-insensitive per RFC 1035; parsing follows compression pointers
//! per RFC 1035 section 4.1.4.

use crate::error::{Error, Result};
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Maximum number of compression pointer jumps before a name is rejected.
const MAX_COMPRESSION_JUMPS: usize = 128;

/// A DNS domain name.
///
/// The wire representation always ends with the zero-length root label,
/// so the root name itself is the single byte `0x00`.
///
/// ```rust
/// use radix_proto::Name;
/// use std::str::FromStr;
///
/// let name = Name::from_str("www.example.com.").unwrap();
/// assert_eq!(name.label_count(), 4); // www, example, com, root
/// assert_eq!(Name::from_str("WWW.Example.COM").unwrap(), name);
/// ```
#[derive(Clone)]
pub struct Name {
    wire: SmallVec<[u8; 64]>,
}

impl Name {
    /// Returns the root domain name.
    pub fn root() -> Self {
        Self {
            wire: SmallVec::from_slice(&[0]),
        }
    }

    /// Creates a name from uncompressed wire-format bytes.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        validate_wire(bytes)?;
        Ok(Self {
            wire: SmallVec::from_slice(bytes),
        })
    }

    /// Returns the wire-format bytes, including the terminating root label.
    #[inline]
    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the wire-format length.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// Returns the number of labels, counting the root label.
    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    /// Returns true if this is the root name.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    /// Returns an iterator over the labels, leftmost first, ending with
    /// the empty root label.
    #[inline]
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter {
            wire: &self.wire,
            pos: 0,
            done: false,
        }
    }

    /// Returns the name with its leftmost label removed, or `None` for
    /// the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let skip = 1 + self.wire[0] as usize;
        Some(Self {
            wire: SmallVec::from_slice(&self.wire[skip..]),
        })
    }

    /// Returns a new name with `label` prepended.
    pub fn prepend_label(&self, label: &[u8]) -> Result<Self> {
        if label.len() > MAX_LABEL_LENGTH {
            return Err(Error::LabelTooLong {
                length: label.len(),
            });
        }
        let new_len = 1 + label.len() + self.wire.len();
        if new_len > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: new_len });
        }
        let mut wire = SmallVec::with_capacity(new_len);
        wire.push(label.len() as u8);
        wire.extend_from_slice(label);
        wire.extend_from_slice(&self.wire);
        Ok(Self { wire })
    }

    /// Returns true if this name equals `other` or sits below it in the
    /// tree. Label-wise and case-insensitive, so `a.example.com` is a
    /// subdomain of `example.com` but `aexample.com` is not.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        let mine: Vec<Label<'_>> = self.labels().collect();
        let theirs: Vec<Label<'_>> = other.labels().collect();
        if mine.len() < theirs.len() {
            return false;
        }
        mine.iter()
            .rev()
            .zip(theirs.iter().rev())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Replaces the `old` suffix of this name with `new`, as used for
    /// DNAME substitution. Returns `None` when `old` is not a suffix of
    /// this name or the name is not strictly below `old`.
    pub fn replace_suffix(&self, old: &Name, new: &Name) -> Option<Self> {
        if !self.is_subdomain_of(old) || self.label_count() <= old.label_count() {
            return None;
        }
        let keep = self.label_count() - old.label_count();
        let mut out = new.clone();
        let prefix: Vec<Label<'_>> = self.labels().take(keep).collect();
        for label in prefix.iter().rev() {
            out = out.prepend_label(label.as_bytes()).ok()?;
        }
        Some(out)
    }

    /// Lowercases the name in place.
    pub fn make_lowercase(&mut self) {
        for byte in self.wire.iter_mut() {
            *byte = byte.to_ascii_lowercase();
        }
    }

    /// Returns a lowercased copy.
    #[must_use]
    pub fn lowercased(&self) -> Self {
        let mut copy = self.clone();
        copy.make_lowercase();
        copy
    }

    /// Appends the wire form to `buf`.
    pub fn write_wire(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.wire);
    }
}

fn validate_wire(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::UnexpectedEof { offset: 0 });
    }
    if bytes.len() > MAX_NAME_LENGTH {
        return Err(Error::NameTooLong {
            length: bytes.len(),
        });
    }
    let mut pos = 0;
    loop {
        if pos >= bytes.len() {
            return Err(Error::UnexpectedEof { offset: pos });
        }
        let len = bytes[pos] as usize;
        if len == 0 {
            if pos + 1 != bytes.len() {
                return Err(Error::invalid_data(pos, "data after root label"));
            }
            return Ok(());
        }
        if len > MAX_LABEL_LENGTH {
            return Err(Error::LabelTooLong { length: len });
        }
        pos += 1 + len;
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a name in presentation format. A missing trailing dot is
    /// treated as if present; the empty string and `.` are the root.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }
        let s = s.strip_suffix('.').unwrap_or(s);

        let mut wire = SmallVec::<[u8; 64]>::new();
        for part in s.split('.') {
            if part.len() > MAX_LABEL_LENGTH {
                return Err(Error::LabelTooLong { length: part.len() });
            }
            for (i, c) in part.chars().enumerate() {
                if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '*' {
                    return Err(Error::InvalidLabelChar {
                        character: c,
                        position: i,
                    });
                }
            }
            wire.push(part.len() as u8);
            wire.extend_from_slice(part.as_bytes());
        }
        wire.push(0);

        if wire.len() > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: wire.len() });
        }
        Ok(Self { wire })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, ".");
        }
        for label in self.labels() {
            if !label.is_root() {
                write!(f, "{label}.")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{self}\")")
    }
}

impl PartialEq for Name {
    /// Case-insensitive per DNS semantics.
    fn eq(&self, other: &Self) -> bool {
        self.wire.len() == other.wire.len()
            && self
                .wire
                .iter()
                .zip(other.wire.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.wire.iter() {
            byte.to_ascii_lowercase().hash(state);
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::root()
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// One component of a domain name, without its length prefix.
#[derive(Clone)]
pub struct Label<'a> {
    bytes: &'a [u8],
}

impl<'a> Label<'a> {
    /// Returns the raw label bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the label length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if this is the empty root label.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if the label is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Case-insensitive comparison.
    pub fn eq_ignore_ascii_case(&self, other: &Label<'_>) -> bool {
        self.bytes.eq_ignore_ascii_case(other.bytes)
    }
}

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.bytes {
            if byte == b'.' || byte == b'\\' {
                write!(f, "\\{}", byte as char)?;
            } else if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\{byte:03}")?;
            }
        }
        Ok(())
    }
}

/// Iterator over the labels of a name, ending with the root label.
pub struct LabelIter<'a> {
    wire: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = Label<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let len = self.wire.get(self.pos).copied().unwrap_or(0) as usize;
        if len == 0 {
            self.done = true;
            return Some(Label { bytes: &[] });
        }
        let start = self.pos + 1;
        let end = start + len;
        if end > self.wire.len() {
            self.done = true;
            return None;
        }
        self.pos = end;
        Some(Label {
            bytes: &self.wire[start..end],
        })
    }
}

impl std::iter::FusedIterator for LabelIter<'_> {}

/// Parses names out of a full DNS message, resolving compression
/// pointers against the message start.
#[derive(Debug, Clone, Copy)]
pub struct NameParser<'a> {
    message: &'a [u8],
}

impl<'a> NameParser<'a> {
    /// Creates a parser over the complete message buffer.
    #[inline]
    pub const fn new(message: &'a [u8]) -> Self {
        Self { message }
    }

    /// Parses a name starting at `offset`.
    ///
    /// Returns the name and the number of bytes consumed at the starting
    /// position (compression targets are not counted).
    pub fn parse_name(&self, offset: usize) -> Result<(Name, usize)> {
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut consumed = 0;
        let mut pos = offset;
        let mut jumps = 0;
        let mut followed_pointer = false;

        loop {
            let len_byte = *self
                .message
                .get(pos)
                .ok_or(Error::UnexpectedEof { offset: pos })?;

            if len_byte >= 0xC0 {
                let second = *self
                    .message
                    .get(pos + 1)
                    .ok_or(Error::UnexpectedEof { offset: pos + 1 })?;
                let target = (u16::from_be_bytes([len_byte & 0x3F, second])) as usize;

                // Pointers may only point backwards; forward or
                // self-referential targets would loop.
                if target >= pos {
                    return Err(Error::InvalidCompressionPointer {
                        offset: pos,
                        target,
                    });
                }
                if !followed_pointer {
                    consumed = pos - offset + 2;
                    followed_pointer = true;
                }
                jumps += 1;
                if jumps > MAX_COMPRESSION_JUMPS {
                    return Err(Error::TooManyCompressionJumps {
                        max_jumps: MAX_COMPRESSION_JUMPS,
                    });
                }
                pos = target;
                continue;
            }

            if len_byte >= 0x40 {
                return Err(Error::invalid_data(
                    pos,
                    format!("invalid label type 0x{len_byte:02X}"),
                ));
            }

            let len = len_byte as usize;
            if len == 0 {
                wire.push(0);
                if !followed_pointer {
                    consumed = pos - offset + 1;
                }
                break;
            }

            if pos + 1 + len > self.message.len() {
                return Err(Error::UnexpectedEof {
                    offset: pos + 1 + len,
                });
            }
            if wire.len() + 1 + len + 1 > MAX_NAME_LENGTH {
                return Err(Error::NameTooLong {
                    length: wire.len() + 1 + len + 1,
                });
            }
            wire.push(len as u8);
            wire.extend_from_slice(&self.message[pos + 1..pos + 1 + len]);
            pos += 1 + len;
        }

        Ok((Name { wire }, consumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_name() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.label_count(), 1);
        assert_eq!(root.to_string(), ".");
        assert_eq!(root.wire_len(), 1);
    }

    #[test]
    fn parse_and_display() {
        let name = Name::from_str("www.example.com.").unwrap();
        assert_eq!(name.label_count(), 4);
        assert_eq!(name.to_string(), "www.example.com.");
        assert_eq!(name, Name::from_str("www.example.com").unwrap());
    }

    #[test]
    fn case_insensitive_eq_and_hash() {
        use std::collections::hash_map::DefaultHasher;

        let lower = Name::from_str("www.example.com").unwrap();
        let upper = Name::from_str("WWW.EXAMPLE.COM").unwrap();
        assert_eq!(lower, upper);

        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        lower.hash(&mut h1);
        upper.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn parent_chain() {
        let name = Name::from_str("www.example.com").unwrap();
        let parent = name.parent().unwrap();
        assert_eq!(parent.to_string(), "example.com.");
        let tld = parent.parent().unwrap();
        assert_eq!(tld.to_string(), "com.");
        assert!(tld.parent().unwrap().is_root());
        assert!(Name::root().parent().is_none());
    }

    #[test]
    fn subdomain_checks() {
        let name = Name::from_str("www.example.com").unwrap();
        let zone = Name::from_str("example.com").unwrap();
        let near_miss = Name::from_str("wwwexample.com").unwrap();

        assert!(name.is_subdomain_of(&zone));
        assert!(name.is_subdomain_of(&name));
        assert!(name.is_subdomain_of(&Name::root()));
        assert!(!zone.is_subdomain_of(&name));
        assert!(!near_miss.is_subdomain_of(&zone));
    }

    #[test]
    fn dname_suffix_replacement() {
        let qname = Name::from_str("host.a.example.com").unwrap();
        let owner = Name::from_str("a.example.com").unwrap();
        let target = Name::from_str("b.example.net").unwrap();

        let rewritten = qname.replace_suffix(&owner, &target).unwrap();
        assert_eq!(rewritten.to_string(), "host.b.example.net.");

        // Owner itself is not rewritten.
        assert!(owner.replace_suffix(&owner, &target).is_none());
        // Unrelated names are not rewritten.
        let other = Name::from_str("host.other.com").unwrap();
        assert!(other.replace_suffix(&owner, &target).is_none());
    }

    #[test]
    fn parse_compressed() {
        // example.com. at offset 0, www.<ptr 0> at offset 13
        let wire = [
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, 3, b'w', b'w',
            b'w', 0xC0, 0x00,
        ];
        let parser = NameParser::new(&wire);
        let (first, consumed) = parser.parse_name(0).unwrap();
        assert_eq!(first.to_string(), "example.com.");
        assert_eq!(consumed, 13);

        let (second, consumed) = parser.parse_name(13).unwrap();
        assert_eq!(second.to_string(), "www.example.com.");
        assert_eq!(consumed, 6);
    }

    #[test]
    fn reject_pointer_loops() {
        let wire = [0xC0, 0x00];
        let parser = NameParser::new(&wire);
        assert!(matches!(
            parser.parse_name(0),
            Err(Error::InvalidCompressionPointer { .. })
        ));
    }

    #[test]
    fn label_limits() {
        let long = "a".repeat(64);
        assert!(matches!(
            Name::from_str(&long),
            Err(Error::LabelTooLong { .. })
        ));
    }
}
