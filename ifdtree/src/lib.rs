//! # `ifdtree`
//!
//! A codec for tagged-directory metadata trees - the binary,
//! offset-addressed directory tables (and their vendor-proprietary
//! sub-trees) nested inside TIFF-style containers.
//!
//! The codec works on byte buffers a collaborator already holds in
//! memory: give [`Metadata::decode`] a buffer and get back an addressable
//! tree of directories and typed entries; mutate it; hand it to
//! [`Metadata::encode`] for a fresh, offset-correct buffer. Everything
//! the codec doesn't understand - unknown tags, unparseable vendor
//! blocks - survives the trip untouched.
//!
//! Decoding follows every indirect offset only after bounds-checking it,
//! and bounds recursion, so hostile buffers fail with a specific
//! [`error::Error`] instead of reading out of range.
//!
//! ## Concurrency
//!
//! Decode and encode are synchronous, in-memory operations. The tag
//! registries are compile-time data, safe for concurrent reads. A decoded
//! tree is owned by one caller at a time; share it across threads only
//! with your own synchronization. The [`diag`] sink is process-wide
//! configuration - concurrent reconfiguration is the host's job to
//! serialize.

#![forbid(unsafe_code)]

pub use ifdtree_types::{
    group::Group,
    makernotes,
    primitives::{ByteOrder, Rational, SRational, TypeId},
    tags,
    value::Value,
};

pub use crate::{
    decode::RootDirectory,
    directory::Directory,
    encode::WriteMethod,
    entry::Metadatum,
    error::{Error, Result},
};

pub mod diag;
pub mod directory;
pub mod entry;
pub mod error;

mod decode;
mod encode;
mod makernote;

/// A decoded metadata tree: one byte order, one root directory (plus its
/// chained successors).
///
/// This is what collaborators hold between [`Metadata::decode`] and
/// [`Metadata::encode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub(crate) byte_order: ByteOrder,
    pub(crate) root: Directory,
}

impl Metadata {
    /// Creates an empty tree for building metadata from scratch.
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            root: Directory::new(Group::Ifd0),
        }
    }

    /// Decodes a full container: byte-order marker, magic number, then
    /// the primary directory and everything it points at.
    ///
    /// The buffer is never mutated.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        decode::decode(buf)
    }

    /// Decodes from a collaborator-supplied byte order and root
    /// descriptor, for containers that embed the directory tree at a
    /// known place without its own header.
    pub fn decode_at(buf: &[u8], byte_order: ByteOrder, root: RootDirectory) -> Result<Self> {
        decode::decode_at(buf, byte_order, root)
    }

    /// Encodes the tree into a fresh buffer with recomputed offsets.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode::encode_with(self, WriteMethod::Rewrite, None)
    }

    /// Encodes with an explicit layout policy.
    ///
    /// [`WriteMethod::InPlace`] needs the original buffer and patches
    /// values into a copy of it; when the tree no longer fits that
    /// layout, it silently degrades to a full rewrite.
    pub fn encode_with(&self, method: WriteMethod, original: Option<&[u8]>) -> Result<Vec<u8>> {
        encode::encode_with(self, method, original)
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// The primary directory.
    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Directory {
        &mut self.root
    }

    /// Finds the first directory with a group, anywhere in the tree.
    pub fn directory(&self, group: Group) -> Option<&Directory> {
        find_group(&self.root, group)
    }

    pub fn directory_mut(&mut self, group: Group) -> Option<&mut Directory> {
        // locate the owning subtree immutably, then reborrow just it
        fn search(dir: &mut Directory, group: Group) -> Option<&mut Directory> {
            if dir.group() == group {
                return Some(dir);
            }
            let hit = dir
                .children()
                .iter()
                .position(|c| find_group(c, group).is_some());
            match hit {
                Some(i) => search(&mut dir.children_mut()[i], group),
                None => dir.next_mut().and_then(|n| search(n, group)),
            }
        }

        search(&mut self.root, group)
    }

    /// Finds the first entry with a `(group, tag)`, anywhere in the tree.
    pub fn find(&self, group: Group, tag: u16) -> Option<&Metadatum> {
        self.directory(group).and_then(|d| d.find(tag))
    }

    /// Renders an entry through its print function, with the whole tree
    /// as cross-referencing context.
    pub fn print(&self, group: Group, tag: u16) -> Option<String> {
        self.find(group, tag)
            .map(|entry| entry.print(Some(&self.root)))
    }

    /// Whether anything in the tree was mutated since decoding.
    pub fn dirty(&self) -> bool {
        self.root.dirty()
    }
}

/// Builds a typed [`Value`] from raw element bytes in a byte order.
///
/// Fails with [`Error::ArithmeticOverflow`] when `count` times the element
/// width leaves the 32-bit size domain, and with [`Error::InvalidMalloc`]
/// when `data` is too short to hold that many elements.
pub fn value_from_bytes(
    ty: TypeId,
    byte_order: ByteOrder,
    data: &[u8],
    count: u32,
) -> Result<Value> {
    let total = u64::from(count) * u64::from(ty.size_bytes());
    if total > u64::from(u32::MAX) {
        return Err(Error::ArithmeticOverflow);
    }

    decode::parse_elements(ty, count, data, &decode::winnow_order(byte_order))
}

/// Depth-first search over a subtree: children, then the chain.
fn find_group(dir: &Directory, group: Group) -> Option<&Directory> {
    if dir.group() == group {
        return Some(dir);
    }
    for child in dir.children() {
        if let Some(found) = find_group(child, group) {
            return Some(found);
        }
    }
    dir.next().and_then(|n| find_group(n, group))
}

/// Internal utility methods.
pub(crate) mod test_util {
    /// Helper function to initialize the logger for testing.
    #[cfg(test)]
    pub fn logger() {
        _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::max())
            .format_file(true)
            .format_line_number(true)
            .try_init();
    }
}
