//! The tree encoder.
//!
//! Writing is the mirrored fix-up problem: a parent can't finalize a
//! pointer to a child until the child's size is known. So encoding runs in
//! three passes - measure every directory depth-first, assign absolute
//! offsets (data areas grow monotonically in entry order, children follow
//! their parent's data, the chain follows the subtree), then write with
//! every pointer already resolved.
//!
//! Entries are written back in insertion order, and an entry whose value
//! wasn't touched re-encodes to exactly its decoded bytes - registry-
//! unknown tags included - so an unmutated tree reproduces its canonical
//! source buffer byte for byte.
//!
//! All offset and size arithmetic is checked; nothing wraps.

use ifdtree_types::{
    group::Group,
    makernotes::{NoteBase, strategy_for_group},
    primitives::ByteOrder,
    tags::{MAKER_NOTE_TAG, pointer_target},
};

use crate::{
    Metadata,
    decode::MAX_ENTRIES,
    diag::{diag_debug, diag_warn},
    directory::Directory,
    error::{Error, Result},
};

/// How the encoder lays out its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteMethod {
    /// Patch value bytes into a copy of the original buffer, leaving the
    /// layout untouched. Falls back to a full rewrite when any entry
    /// changed shape (size or type), was added or removed, or has no
    /// decoded position.
    InPlace,

    /// Rebuild the whole buffer with freshly assigned offsets.
    Rewrite,
}

const HEADER_LEN: u32 = 8;
const ENTRY_LEN: u32 = 12;

/// Encoded values at most this large sit inside the entry's value field.
const INLINE_MAX: u64 = 4;

pub(crate) fn encode_with(
    meta: &Metadata,
    method: WriteMethod,
    original: Option<&[u8]>,
) -> Result<Vec<u8>> {
    if method == WriteMethod::InPlace {
        match original {
            Some(original) => {
                if let Some(patched) = patch_in_place(meta, original)? {
                    return Ok(patched);
                }
                diag_debug!("In-place write impossible (layout changed); rewriting fully.");
            }
            None => {
                diag_debug!("In-place write requested without the original buffer; rewriting.");
            }
        }
    }

    rewrite(meta)
}

/*
 *
 *
 *  full rewrite
 *
 *
 */

/// One directory's computed layout.
#[derive(Debug)]
struct Plan {
    table_len: u32,
    data_len: u64,

    /// Encoded value size per entry, in entry order.
    sizes: Vec<u64>,

    children: Vec<ChildPlan>,
    next: Option<Box<Plan>>,

    // assigned during placement
    offset: u32,
    data_offsets: Vec<u32>,
}

#[derive(Debug)]
struct ChildPlan {
    /// The entry anchoring this child in the parent.
    entry_index: usize,

    /// The child's position in the parent's `children()`.
    dir_index: usize,

    kind: ChildKind,
    plan: Plan,
}

#[derive(Debug)]
enum ChildKind {
    /// A pointer entry; its value becomes the child's offset.
    SubIfd,

    /// A maker note embedded in the parent's data area, led by its
    /// vendor signature.
    MakerNote { prefix: Vec<u8>, base: NoteBase },
}

fn rewrite(meta: &Metadata) -> Result<Vec<u8>> {
    let order = meta.byte_order();

    let mut plan = measure(meta.root(), order)?;
    let total = u64::from(HEADER_LEN)
        .checked_add(chain_len(&plan)?)
        .ok_or(Error::ArithmeticOverflow)?;
    if total > u64::from(u32::MAX) {
        log::error!("Encoded tree needs `{total}` bytes; offsets can't address that.");
        return Err(Error::MallocFailed { size: total });
    }

    place(&mut plan, HEADER_LEN)?;

    let mut buf = vec![0_u8; total as usize];
    put(
        &mut buf,
        0,
        match order {
            ByteOrder::Little => b"II",
            ByteOrder::Big => b"MM",
        },
    );
    put(&mut buf, 2, &order.u16_bytes(42));
    put(&mut buf, 4, &order.u32_bytes(HEADER_LEN));

    write_dir(&mut buf, meta.root(), &plan, order, 0);
    Ok(buf)
}

/// Pass one: compute every directory's table and data-area sizes,
/// children first.
fn measure(dir: &Directory, order: ByteOrder) -> Result<Plan> {
    let n = dir.entries().len();
    if n == 0 {
        log::error!("A `{}` directory with zero entries can't be encoded.", dir.group());
        return Err(Error::CorruptedMetadata);
    }
    if n > usize::from(MAX_ENTRIES) {
        return Err(Error::TooManyDirectoryEntries {
            count: n as u32,
            limit: u32::from(MAX_ENTRIES),
        });
    }

    let table_len = 2 + ENTRY_LEN * n as u32 + 4;

    let mut sizes: Vec<u64> = Vec::with_capacity(n);
    let mut children: Vec<ChildPlan> = Vec::new();
    let mut data_len: u64 = 0;
    let mut seen_array_tags: Vec<u16> = Vec::new();

    for (i, entry) in dir.entries().iter().enumerate() {
        // mutation can break logical arrays the decoder never saw broken;
        // refuse to write an uninterpretable directory
        if let Some(required) = ifdtree_types::tags::array_element_type(dir.group(), entry.tag()) {
            if seen_array_tags.contains(&entry.tag()) {
                return Err(Error::MultipleTiffArrayElementTagsInDirectory {
                    group: dir.group(),
                    tag: entry.tag(),
                });
            }
            seen_array_tags.push(entry.tag());

            if entry.type_id() != required {
                return Err(Error::WrongTiffArrayElementTagType {
                    group: dir.group(),
                    tag: entry.tag(),
                    expected: required,
                    got: entry.type_id(),
                });
            }
        }

        let mut size: u64 = entry.size();

        if let Some(target) = pointer_target(dir.group(), entry.tag()) {
            match dir.children().iter().position(|c| c.group() == target) {
                Some(dir_index) => {
                    let plan = measure(&dir.children()[dir_index], order)?;
                    children.push(ChildPlan {
                        entry_index: i,
                        dir_index,
                        kind: ChildKind::SubIfd,
                        plan,
                    });
                    size = 4;
                }
                None => {
                    diag_warn!(
                        "`{target}` pointer has no decoded sub-directory; \
                        keeping its value as-is."
                    );
                }
            }
        } else if dir.group() == Group::Exif
            && entry.tag() == MAKER_NOTE_TAG
            && let Some(dir_index) = dir.children().iter().position(|c| c.group().is_maker_note())
        {
            let child = &dir.children()[dir_index];
            let plan = measure(child, order)?;
            let (prefix, base) = note_prefix(child.group(), order);

            size = (prefix.len() as u64)
                .checked_add(u64::from(plan.table_len))
                .and_then(|s| s.checked_add(plan.data_len))
                .ok_or(Error::ArithmeticOverflow)?;
            children.push(ChildPlan {
                entry_index: i,
                dir_index,
                kind: ChildKind::MakerNote { prefix, base },
                plan,
            });
        }

        // the count field is 32 bits; a value that can't state its own
        // size doesn't fit a data area either
        if size > u64::from(u32::MAX) {
            return Err(Error::DataAreaValueTooLarge {
                size,
                max: u64::from(u32::MAX),
            });
        }

        if size > INLINE_MAX {
            data_len = data_len
                .checked_add(size)
                .ok_or(Error::ArithmeticOverflow)?;
        }
        sizes.push(size);
    }

    // every nested directory should be claimed by an anchoring entry,
    // or its bytes silently vanish from the output
    for (dir_index, child) in dir.children().iter().enumerate() {
        if !children.iter().any(|c| c.dir_index == dir_index) {
            diag_warn!(
                "`{}` sub-directory has no anchoring entry in its `{}` parent; \
                it won't be written.",
                child.group(),
                dir.group()
            );
        }
    }

    let next = match dir.next() {
        Some(next) => Some(Box::new(measure(next, order)?)),
        None => None,
    };

    Ok(Plan {
        table_len,
        data_len,
        sizes,
        children,
        next,
        offset: 0,
        data_offsets: Vec::new(),
    })
}

/// The bytes a vendor expects before its embedded directory: the
/// signature, padded to the directory start with the byte-order marker.
fn note_prefix(group: Group, order: ByteOrder) -> (Vec<u8>, NoteBase) {
    match strategy_for_group(group) {
        Some(strategy) => {
            let marker: &[u8; 2] = match order {
                ByteOrder::Little => b"II",
                ByteOrder::Big => b"MM",
            };

            let mut prefix = strategy.signature.to_vec();
            let pad = strategy.ifd_start.saturating_sub(prefix.len());
            prefix.extend_from_slice(&marker[..pad.min(2)]);
            prefix.resize(strategy.ifd_start, 0);

            (prefix, strategy.base)
        }

        // generically decoded notes are a bare directory
        None => (Vec::new(), NoteBase::TiffHeader),
    }
}

/// Total bytes of a directory plus its sub-IFD subtrees.
///
/// Maker notes aren't added here - their bytes already count as their
/// anchor entry's data-area slot.
fn subtree_len(plan: &Plan) -> Result<u64> {
    let mut total = u64::from(plan.table_len)
        .checked_add(plan.data_len)
        .ok_or(Error::ArithmeticOverflow)?;
    for child in &plan.children {
        if matches!(child.kind, ChildKind::SubIfd) {
            total = total
                .checked_add(subtree_len(&child.plan)?)
                .ok_or(Error::ArithmeticOverflow)?;
        }
    }
    Ok(total)
}

fn chain_len(plan: &Plan) -> Result<u64> {
    let mut total = subtree_len(plan)?;
    if let Some(next) = &plan.next {
        total = total
            .checked_add(chain_len(next)?)
            .ok_or(Error::ArithmeticOverflow)?;
    }
    Ok(total)
}

/// Pass two: assign absolute offsets. The data area follows the table and
/// grows monotonically in entry order; sub-directories follow the data
/// area; the chained successor follows the whole subtree.
fn place(plan: &mut Plan, at: u32) -> Result<()> {
    plan.offset = at;

    let mut cursor = at
        .checked_add(plan.table_len)
        .ok_or(Error::ArithmeticOverflow)?;
    plan.data_offsets = vec![0; plan.sizes.len()];
    for (i, size) in plan.sizes.iter().enumerate() {
        if *size > INLINE_MAX {
            plan.data_offsets[i] = cursor;
            cursor = cursor
                .checked_add(*size as u32)
                .ok_or(Error::ArithmeticOverflow)?;
        }
    }

    let slots = plan.data_offsets.clone();
    for child in &mut plan.children {
        match &child.kind {
            ChildKind::MakerNote { prefix, .. } => {
                // the note sits in its data-area slot, directory after
                // the signature
                let at = slots[child.entry_index]
                    .checked_add(prefix.len() as u32)
                    .ok_or(Error::ArithmeticOverflow)?;
                place(&mut child.plan, at)?;
            }
            ChildKind::SubIfd => {
                place(&mut child.plan, cursor)?;
                let len = u32::try_from(subtree_len(&child.plan)?)
                    .map_err(|_| Error::ArithmeticOverflow)?;
                cursor = cursor.checked_add(len).ok_or(Error::ArithmeticOverflow)?;
            }
        }
    }

    if let Some(next) = &mut plan.next {
        place(next, cursor)?;
    }

    Ok(())
}

/// Pass three: write one directory, its data area, and everything below.
///
/// `base` is subtracted from every written offset, so vendors whose notes
/// are self-relative get self-relative bytes.
fn write_dir(buf: &mut [u8], dir: &Directory, plan: &Plan, order: ByteOrder, base: u32) {
    let mut pos = plan.offset as usize;
    put(buf, pos, &order.u16_bytes(dir.entries().len() as u16));
    pos += 2;

    for (i, entry) in dir.entries().iter().enumerate() {
        let child = plan.children.iter().find(|c| c.entry_index == i);
        let size = plan.sizes[i];

        put(buf, pos, &order.u16_bytes(entry.tag()));
        put(buf, pos + 2, &order.u16_bytes(entry.type_id() as u16));

        let count: u32 = match child.map(|c| &c.kind) {
            Some(ChildKind::SubIfd) => 1,
            Some(ChildKind::MakerNote { .. }) => size as u32,
            None => entry.count(),
        };
        put(buf, pos + 4, &order.u32_bytes(count));

        match child.map(|c| (c, &c.kind)) {
            Some((c, ChildKind::SubIfd)) => {
                put(buf, pos + 8, &order.u32_bytes(c.plan.offset - base));
            }
            Some((_, ChildKind::MakerNote { .. })) => {
                put(buf, pos + 8, &order.u32_bytes(plan.data_offsets[i] - base));
            }
            None if size <= INLINE_MAX => {
                let mut inline = Vec::with_capacity(4);
                entry.value().write_to(order, &mut inline);
                inline.resize(4, 0);
                put(buf, pos + 8, &inline);
            }
            None => {
                let slot = plan.data_offsets[i];
                put(buf, pos + 8, &order.u32_bytes(slot - base));

                let mut bytes = Vec::with_capacity(size as usize);
                entry.value().write_to(order, &mut bytes);
                put(buf, slot as usize, &bytes);
            }
        }

        pos += 12;
    }

    let next_offset = plan.next.as_ref().map(|p| p.offset - base).unwrap_or(0);
    put(buf, pos, &order.u32_bytes(next_offset));

    for child in &plan.children {
        let child_dir = &dir.children()[child.dir_index];
        let child_base = match &child.kind {
            ChildKind::SubIfd => base,
            ChildKind::MakerNote { prefix, base: note_base } => {
                let slot = plan.data_offsets[child.entry_index];
                put(buf, slot as usize, prefix);
                match note_base {
                    NoteBase::TiffHeader => base,
                    NoteBase::NoteStart => slot,
                }
            }
        };
        write_dir(buf, child_dir, &child.plan, order, child_base);
    }

    if let (Some(next_dir), Some(next_plan)) = (dir.next(), plan.next.as_deref()) {
        write_dir(buf, next_dir, next_plan, order, base);
    }
}

fn put(buf: &mut [u8], pos: usize, bytes: &[u8]) {
    buf[pos..pos + bytes.len()].copy_from_slice(bytes);
}

/*
 *
 *
 *  in-place patching
 *
 *
 */

/// Patches mutated values into a copy of the original buffer.
///
/// Possible only while every entry still has its decoded position and
/// size; returns `None` as soon as that stops holding, and the caller
/// falls back to a rewrite.
fn patch_in_place(meta: &Metadata, original: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut out = original.to_vec();
    if patch_dir(meta.root(), &mut out, meta.byte_order())? {
        Ok(Some(out))
    } else {
        Ok(None)
    }
}

fn patch_dir(dir: &Directory, out: &mut [u8], order: ByteOrder) -> Result<bool> {
    // an added or removed entry changes the table itself, not just a value
    if !dir.matches_decoded_table() {
        return Ok(false);
    }

    for entry in dir.entries() {
        let Some(span) = entry.source() else {
            return Ok(false);
        };
        if u64::from(span.size) != entry.size() {
            return Ok(false);
        }

        let end = u64::from(span.value_offset) + u64::from(span.size);
        if end > out.len() as u64 {
            log::error!("Recorded entry span no longer fits the original buffer.");
            return Err(Error::OffsetOutOfRange {
                offset: u64::from(span.value_offset),
                size: u64::from(span.size),
                len: out.len() as u64,
            });
        }

        let mut bytes = Vec::with_capacity(span.size as usize);
        entry.value().write_to(order, &mut bytes);
        out[span.value_offset as usize..end as usize].copy_from_slice(&bytes);
    }

    for child in dir.children() {
        if !patch_dir(child, out, order)? {
            return Ok(false);
        }
    }
    if let Some(next) = dir.next()
        && !patch_dir(next, out, order)?
    {
        return Ok(false);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::WriteMethod;
    use crate::{Metadata, directory::Directory, error::Error};
    use ifdtree_types::{group::Group, primitives::ByteOrder, value::Value};

    fn minimal_tree() -> Metadata {
        let mut meta = Metadata::new(ByteOrder::Little);
        meta.root_mut().set(274, Value::Short(vec![1]));
        meta
    }

    #[test]
    fn a_single_inline_entry_lays_out_canonically() {
        crate::test_util::logger();

        let bytes = minimal_tree().encode().unwrap();

        // header + count + one entry + next pointer
        assert_eq!(bytes.len(), 8 + 2 + 12 + 4);
        assert_eq!(&bytes[0..4], b"II\x2a\x00");
        assert_eq!(bytes[8..10], 1_u16.to_le_bytes(), "one entry");
        assert_eq!(bytes[10..12], 274_u16.to_le_bytes(), "tag");
        assert_eq!(bytes[12..14], 3_u16.to_le_bytes(), "short type");
        assert_eq!(bytes[14..18], 1_u32.to_le_bytes(), "count");
        assert_eq!(bytes[18..22], [1, 0, 0, 0], "inline value, zero padded");
        assert_eq!(bytes[22..26], [0; 4], "no successor");
    }

    #[test]
    fn oversized_values_move_to_the_data_area() {
        crate::test_util::logger();

        let mut meta = Metadata::new(ByteOrder::Big);
        meta.root_mut().set(270, Value::ascii("hello"));
        let bytes = meta.encode().unwrap();

        // six value bytes can't sit inline; they follow the table
        let data_offset = 8 + 2 + 12 + 4;
        assert_eq!(bytes.len(), data_offset + 6);
        assert_eq!(
            bytes[18..22],
            (data_offset as u32).to_be_bytes(),
            "the field holds the data-area offset"
        );
        assert_eq!(&bytes[data_offset..], b"hello\0");
    }

    #[test]
    fn empty_directories_are_not_encodable() {
        crate::test_util::logger();

        let meta = Metadata::new(ByteOrder::Little);
        assert_eq!(meta.encode(), Err(Error::CorruptedMetadata));
    }

    #[test]
    fn in_place_needs_the_original_and_unchanged_sizes() {
        crate::test_util::logger();

        let original = minimal_tree().encode().unwrap();
        let mut meta = Metadata::decode(&original).unwrap();

        // same-size edit: the patch really is in place
        meta.root_mut().set(274, Value::Short(vec![6]));
        let patched = meta
            .encode_with(WriteMethod::InPlace, Some(&original))
            .unwrap();
        assert_eq!(patched.len(), original.len());
        assert_eq!(patched[18], 6);

        // growing edit: silently falls back to a rewrite
        meta.root_mut()
            .set(274, Value::Short(vec![6, 6, 6, 6, 6, 6]));
        let rewritten = meta
            .encode_with(WriteMethod::InPlace, Some(&original))
            .unwrap();
        assert!(rewritten.len() > original.len());

        // added entries force a rewrite too
        let mut meta = Metadata::decode(&original).unwrap();
        meta.root_mut().add(305, Value::Short(vec![1]));
        let rewritten = meta
            .encode_with(WriteMethod::InPlace, Some(&original))
            .unwrap();
        assert!(rewritten.len() > original.len());
    }

    /// Builds a tree whose Canon maker note holds the given directory.
    fn with_canon_note(note: Directory) -> Metadata {
        let mut exif = Directory::new(Group::Exif);
        exif.set(37500, Value::Undefined(Vec::new()));
        exif.add_child(note);

        let mut meta = Metadata::new(ByteOrder::Little);
        meta.root_mut().set(271, Value::ascii("Canon"));
        meta.root_mut().set(34665, Value::Long(vec![0]));
        meta.root_mut().add_child(exif);
        meta
    }

    #[test]
    fn duplicate_array_tags_refuse_to_encode() {
        crate::test_util::logger();

        let mut note = Directory::new(Group::CanonMn);
        note.add(0x0001, Value::Short(vec![1, 2, 3]));
        note.add(0x0001, Value::Short(vec![4]));

        assert_eq!(
            with_canon_note(note).encode(),
            Err(Error::MultipleTiffArrayElementTagsInDirectory {
                group: Group::CanonMn,
                tag: 0x0001,
            })
        );
    }

    #[test]
    fn mistyped_array_tags_refuse_to_encode() {
        crate::test_util::logger();

        let mut note = Directory::new(Group::CanonMn);
        note.set(0x0004, Value::Long(vec![9]));

        assert!(matches!(
            with_canon_note(note).encode(),
            Err(Error::WrongTiffArrayElementTagType {
                group: Group::CanonMn,
                tag: 0x0004,
                ..
            })
        ));
    }
}
