//! One decoded directory entry.

use ifdtree_types::{
    group::Group,
    primitives::TypeId,
    tags::{FieldSource, KnownTag, print_plain},
    value::Value,
};

use crate::error::Result;

/// Where an entry's bytes sat in the buffer it was decoded from.
///
/// Kept so an unmodified entry can be written back in place, and so the
/// encoder can tell whether a value still fits its old slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    /// Offset of the entry's 12-byte header.
    pub entry_offset: u32,

    /// Offset of the value bytes. For inline values this points into the
    /// header's value field.
    pub value_offset: u32,

    /// Encoded value size in bytes.
    pub size: u32,

    /// Whether the value sat inline rather than in a data area.
    pub inline: bool,
}

/// One decoded tag: a group, a tag id, and a typed value.
///
/// The value is either freshly constructed or still carries the span it
/// was decoded from. A replacement value keeps the span only while it has
/// the same type and encoded size - otherwise the bytes on disk no longer
/// describe the entry, and the span is dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Metadatum {
    group: Group,
    tag: u16,
    value: Value,
    source: Option<SourceSpan>,
}

impl Metadatum {
    /// Creates a fresh entry, not tied to any decoded bytes.
    pub fn new(group: Group, tag: u16, value: Value) -> Self {
        Self {
            group,
            tag,
            value,
            source: None,
        }
    }

    /// Creates an entry that remembers where it was decoded from.
    pub(crate) fn decoded(group: Group, tag: u16, value: Value, source: SourceSpan) -> Self {
        Self {
            group,
            tag,
            value,
            source: Some(source),
        }
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replaces the value.
    ///
    /// The entry stays tied to its decoded bytes only while the new value
    /// matches the old one's type and encoded size; anything else changes
    /// the layout, so the span is dropped.
    pub fn set_value(&mut self, value: Value) {
        if value.type_id() != self.value.type_id() || value.size() != self.value.size() {
            self.source = None;
        }
        self.value = value;
    }

    pub(crate) fn source(&self) -> Option<SourceSpan> {
        self.source
    }

    /// The registry's view of this tag, if it has one.
    pub fn known(&self) -> Option<KnownTag> {
        KnownTag::try_from((self.group, self.tag)).ok()
    }

    /// The tag's registered name, if the registry knows it.
    pub fn name(&self) -> Option<&'static str> {
        self.known().map(|k| k.tag_name())
    }

    pub fn type_id(&self) -> TypeId {
        self.value.type_id()
    }

    pub fn count(&self) -> u32 {
        self.value.count()
    }

    /// Encoded value size in bytes.
    pub fn size(&self) -> u64 {
        self.value.size()
    }

    /// Converts one value element to `u32`.
    pub fn to_u32(&self, index: u32) -> Result<u32> {
        Ok(self.value.to_u32(index)?)
    }

    /// Converts one value element to `i64`.
    pub fn to_i64(&self, index: u32) -> Result<i64> {
        Ok(self.value.to_i64(index)?)
    }

    /// Renders the value through the tag's print function.
    ///
    /// Unknown tags get the generic rendering. `source` provides
    /// cross-referencing context for the few printers that need it.
    pub fn print(&self, source: Option<&dyn FieldSource>) -> String {
        match self.known() {
            Some(known) => known.printer()(&self.value, source),
            None => print_plain(&self.value, source),
        }
    }
}
