//! The in-memory directory tree.

use ifdtree_types::{group::Group, tags::FieldSource, value::Value};

use crate::entry::Metadatum;

/// One decoded directory: an ordered run of entries, any nested
/// sub-directories, and (for chained "subfile" directories) a successor.
///
/// Entry order is insertion order, and insertion order is write-back
/// order - the encoder doesn't re-sort. Duplicate tag ids are kept.
///
/// A tree is owned by exactly one caller at a time; cloning copies every
/// entry and nested directory, so two clones never alias storage.
#[derive(Clone, Debug)]
pub struct Directory {
    group: Group,
    entries: Vec<Metadatum>,
    children: Vec<Directory>,
    next: Option<Box<Directory>>,
    dirty: bool,

    /// How many entries the directory held on disk, for directories that
    /// came out of the decoder. A mismatch with `entries.len()` means the
    /// decoded entry table no longer describes this directory.
    decoded_len: Option<u16>,
}

/// Equality is over metadata content - group, entries, nesting, chain.
/// The dirty flag and decode bookkeeping don't participate.
impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group
            && self.entries == other.entries
            && self.children == other.children
            && self.next == other.next
    }
}

impl Eq for Directory {}

impl Directory {
    /// Creates an empty directory for a group.
    pub fn new(group: Group) -> Self {
        Self {
            group,
            entries: Vec::new(),
            children: Vec::new(),
            next: None,
            dirty: false,
            decoded_len: None,
        }
    }

    pub fn group(&self) -> Group {
        self.group
    }

    /// The directory's entries, in write-back order.
    pub fn entries(&self) -> &[Metadatum] {
        &self.entries
    }

    /// Nested sub-directories (sub-IFDs and decoded maker notes).
    pub fn children(&self) -> &[Directory] {
        &self.children
    }

    /// Finds the nested directory with a group, if present.
    pub fn child(&self, group: Group) -> Option<&Directory> {
        self.children.iter().find(|c| c.group() == group)
    }

    pub fn child_mut(&mut self, group: Group) -> Option<&mut Directory> {
        self.children.iter_mut().find(|c| c.group() == group)
    }

    /// The chained successor directory, if any.
    pub fn next(&self) -> Option<&Directory> {
        self.next.as_deref()
    }

    pub fn next_mut(&mut self) -> Option<&mut Directory> {
        self.next.as_deref_mut()
    }

    /// First entry with a tag id. Duplicates are kept in order; this
    /// returns the earliest.
    pub fn find(&self, tag: u16) -> Option<&Metadatum> {
        self.entries.iter().find(|e| e.tag() == tag)
    }

    /// All entries with a tag id, in order.
    pub fn find_all(&self, tag: u16) -> impl Iterator<Item = &Metadatum> {
        self.entries.iter().filter(move |e| e.tag() == tag)
    }

    /// Replaces the first entry with this tag, or appends a new one.
    ///
    /// Marks the tree dirty.
    pub fn set(&mut self, tag: u16, value: Value) {
        self.dirty = true;
        match self.entries.iter().position(|e| e.tag() == tag) {
            Some(i) => self.entries[i].set_value(value),
            None => {
                let group = self.group;
                self.entries.push(Metadatum::new(group, tag, value));
            }
        }
    }

    /// Appends an entry, even if the tag already exists.
    ///
    /// Marks the tree dirty.
    pub fn add(&mut self, tag: u16, value: Value) {
        self.dirty = true;
        let group = self.group;
        self.entries.push(Metadatum::new(group, tag, value));
    }

    /// Removes every entry with this tag. Returns how many went away.
    ///
    /// Marks the tree dirty if anything was removed.
    pub fn remove(&mut self, tag: u16) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.tag() != tag);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Whether this directory - or anything below it - has been mutated
    /// since decoding.
    pub fn dirty(&self) -> bool {
        self.dirty
            || self.children.iter().any(Directory::dirty)
            || self.next.as_deref().is_some_and(Directory::dirty)
    }

    /// Nests a sub-directory under this one.
    ///
    /// The child still needs an anchoring pointer entry (or maker-note
    /// anchor) to be reachable on write-back.
    ///
    /// Marks the tree dirty.
    pub fn add_child(&mut self, child: Directory) {
        self.dirty = true;
        self.children.push(child);
    }

    pub(crate) fn push_entry(&mut self, entry: Metadatum) {
        self.entries.push(entry);
    }

    pub(crate) fn push_child(&mut self, child: Directory) {
        self.children.push(child);
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Directory] {
        &mut self.children
    }

    pub(crate) fn set_next(&mut self, next: Directory) {
        self.next = Some(Box::new(next));
    }

    pub(crate) fn mark_decoded(&mut self, len: u16) {
        self.decoded_len = Some(len);
    }

    /// Whether the entry table this directory was decoded from still
    /// describes it: same entry count, no additions or removals.
    pub(crate) fn matches_decoded_table(&self) -> bool {
        self.decoded_len
            .is_some_and(|len| usize::from(len) == self.entries.len())
    }
}

/// Directories provide the cross-referencing context for print functions:
/// a lookup over the whole subtree, children and chain included.
impl FieldSource for Directory {
    fn value_of(&self, group: Group, tag: u16) -> Option<&Value> {
        if self.group == group
            && let Some(entry) = self.find(tag)
        {
            return Some(entry.value());
        }

        for child in &self.children {
            if let Some(value) = child.value_of(group, tag) {
                return Some(value);
            }
        }

        self.next.as_deref().and_then(|n| n.value_of(group, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::Directory;
    use ifdtree_types::{group::Group, tags::FieldSource, value::Value};

    #[test]
    fn set_replaces_but_add_duplicates() {
        let mut dir = Directory::new(Group::Ifd0);

        dir.set(256, Value::Short(vec![1920]));
        dir.set(256, Value::Short(vec![1080]));
        assert_eq!(dir.entries().len(), 1);
        assert_eq!(dir.find(256).unwrap().to_u32(0), Ok(1080));

        dir.add(256, Value::Short(vec![640]));
        assert_eq!(dir.find_all(256).count(), 2, "duplicates are kept");
    }

    #[test]
    fn remove_takes_every_duplicate() {
        let mut dir = Directory::new(Group::Ifd0);
        dir.add(305, Value::ascii("one"));
        dir.add(305, Value::ascii("two"));
        dir.add(306, Value::ascii("keep"));

        assert_eq!(dir.remove(305), 2);
        assert!(dir.find(305).is_none());
        assert!(dir.find(306).is_some());
    }

    #[test]
    fn dirt_bubbles_up_from_children() {
        let mut dir = Directory::new(Group::Ifd0);
        dir.push_child(Directory::new(Group::Exif));
        assert!(!dir.dirty());

        dir.child_mut(Group::Exif)
            .unwrap()
            .set(33434, Value::Short(vec![1]));
        assert!(dir.dirty());
    }

    /// Adding or removing entries desyncs a directory from its decoded
    /// entry table; replacing a value doesn't.
    #[test]
    fn table_tracking_notices_shape_changes() {
        let mut dir = Directory::new(Group::Ifd0);
        assert!(!dir.matches_decoded_table(), "never decoded");

        dir.push_entry(super::Metadatum::new(
            Group::Ifd0,
            274,
            Value::Short(vec![1]),
        ));
        dir.mark_decoded(1);
        assert!(dir.matches_decoded_table());

        dir.set(274, Value::Short(vec![6]));
        assert!(dir.matches_decoded_table(), "a value edit isn't a shape change");

        dir.add(305, Value::ascii("editor"));
        assert!(!dir.matches_decoded_table());
    }

    #[test]
    fn field_source_searches_the_subtree() {
        let mut exif = Directory::new(Group::Exif);
        exif.set(33434, Value::Long(vec![8]));

        let mut root = Directory::new(Group::Ifd0);
        root.set(256, Value::Short(vec![1920]));
        root.push_child(exif);

        assert!(root.value_of(Group::Ifd0, 256).is_some());
        assert!(root.value_of(Group::Exif, 33434).is_some());
        assert!(root.value_of(Group::Gps, 2).is_none());
    }
}
