//! The tree decoder.
//!
//! A directory on disk is a 2-byte entry count, `count` 12-byte entries
//! (tag, type, count, value-or-offset), and a 4-byte pointer to the next
//! chained directory. Values wider than the 4-byte field live out-of-line,
//! addressed by an offset relative to the directory's base.
//!
//! Everything indirected is bounds-checked against the buffer before it's
//! dereferenced, and recursion into sub-directories is depth-bounded, so
//! hostile offset chains fail with a specific error instead of reading out
//! of range or spinning. Decoding never mutates the source buffer.

use ifdtree_types::{
    group::Group,
    primitives::{ByteOrder, TypeId},
    tags::{self, Ifd0Tag, KnownTag, MAKER_NOTE_TAG, pointer_target},
    value::Value,
};
use winnow::{
    Parser as _, Stateful,
    binary::{Endianness as WinnowEndianness, i16, i32, u16, u32},
    error::EmptyError,
    token::take,
};

use crate::{
    Metadata,
    diag::diag_warn,
    directory::Directory,
    entry::{Metadatum, SourceSpan},
    error::{Error, Result},
    makernote,
};

/// Entry-count sanity bound for one directory.
pub(crate) const MAX_ENTRIES: u16 = 500;

/// Nesting bound, counting maker-note recursion.
pub(crate) const MAX_DEPTH: u8 = 8;

/// Chained-directory bound. Rejects cyclic next-pointer chains.
const MAX_CHAIN: u32 = 32;

/// A root directory descriptor: where the tree starts, and what group its
/// first directory belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RootDirectory {
    /// Absolute offset of the root directory's entry count.
    pub offset: u32,

    /// The group the root directory decodes as.
    pub group: Group,
}

/// Decodes a full container: byte-order marker, magic number, root offset,
/// then the primary directory and its chain.
pub(crate) fn decode(buf: &[u8]) -> Result<Metadata> {
    let input = &mut &buf[..];

    let byte_order = parse_byte_order(input)?;
    let endianness = winnow_order(byte_order);

    parse_magic_number(input, &endianness)?;
    let offset = parse_root_offset(input, &endianness)?;

    decode_at(
        buf,
        byte_order,
        RootDirectory {
            offset,
            group: Group::Ifd0,
        },
    )
}

/// Decodes from a collaborator-supplied root descriptor.
///
/// The buffer is expected to start at the container's base: all absolute
/// offsets inside it count from index zero.
pub(crate) fn decode_at(buf: &[u8], byte_order: ByteOrder, root: RootDirectory) -> Result<Metadata> {
    if root.group.is_maker_note() {
        log::error!("Maker-note groups can't act as decode roots. got: `{}`", root.group);
        return Err(Error::InvalidIfdId { group: root.group });
    }

    // the 4-byte offset fields can't address past this anyway
    if buf.len() as u64 > u64::from(u32::MAX) {
        log::error!("Buffer exceeds the 32-bit offset domain. len: `{}`", buf.len());
        return Err(Error::ArithmeticOverflow);
    }

    let endianness = winnow_order(byte_order);
    let (mut first, mut next_offset) =
        parse_directory(buf, &endianness, root.group, 0, root.offset, 0, None)?;

    // chained "subfile" directories reuse the primary tag set
    let chain_group = match root.group {
        Group::Ifd0 => Group::Ifd1,
        other => other,
    };

    let mut chain: Vec<Directory> = Vec::new();
    let mut hops: u32 = 0;
    while let Some(offset) = next_offset {
        hops += 1;
        if hops > MAX_CHAIN {
            log::error!("Too many chained directories; assuming a cycle.");
            return Err(Error::TooManyDirectoryEntries {
                count: hops,
                limit: MAX_CHAIN,
            });
        }

        log::trace!("Another directory was chained on! offset: `{offset}`");
        let (dir, next) = parse_directory(buf, &endianness, chain_group, 0, offset, 0, None)?;
        chain.push(dir);
        next_offset = next;
    }

    // link the chain back-to-front so each directory owns its successor
    let mut successor: Option<Directory> = None;
    for mut dir in chain.into_iter().rev() {
        if let Some(next) = successor.take() {
            dir.set_next(next);
        }
        successor = Some(dir);
    }
    if let Some(next) = successor {
        first.set_next(next);
    }

    Ok(Metadata {
        byte_order,
        root: first,
    })
}

pub(crate) fn winnow_order(order: ByteOrder) -> WinnowEndianness {
    match order {
        ByteOrder::Little => WinnowEndianness::Little,
        ByteOrder::Big => WinnowEndianness::Big,
    }
}

/*
*
*
*
  NOTE:

  everything past the container header depends on the byte order, the
  whole blob (for absolute offsets), and where in the tree we are. so,
  that's all stored in a custom state struct + a stream wrapper.

  this lets the entry parsers share their surroundings without globals
*
*
*
*
*/

#[derive(Debug)]
struct State<'a> {
    /// The whole buffer, for resolving absolute offsets.
    blob: &'a [u8],

    endianness: &'a WinnowEndianness,

    /// The group of the directory being parsed.
    group: Group,

    /// Base added to this directory's indirect offsets.
    base: u32,
}

/// A stream over one directory's table, wrapped with our state.
type Stream<'s> = Stateful<&'s [u8], State<'s>>;

/// Finds the endianness of the blob.
fn parse_byte_order(input: &mut &[u8]) -> Result<ByteOrder> {
    let bom: [u8; 2] = take(2_usize)
        .parse_next(input)
        .map_err(|_: EmptyError| {
            log::error!("Couldn't find a byte order marker!");
            Error::CorruptedMetadata
        })?
        .try_into()
        .unwrap_or_else(|e| unreachable!("winnow verified the size. but err: {e}"));

    match bom {
        [b'I', b'I'] => Ok(ByteOrder::Little),
        [b'M', b'M'] => Ok(ByteOrder::Big),

        // found a weird bom!
        found => {
            log::error!("Byte order marker wasn't `II` or `MM`. got: `{found:?}`");
            Err(Error::CorruptedMetadata)
        }
    }
}

/// Ensures we're working with the correct kind of blob.
fn parse_magic_number(input: &mut &[u8], endianness: &WinnowEndianness) -> Result<()> {
    let magic_number: u16 = u16(*endianness).parse_next(input).map_err(|_: EmptyError| {
        log::error!("Couldn't find the magic number!");
        Error::CorruptedMetadata
    })?;

    if magic_number != 42 {
        log::error!("Magic number wasn't the tagged-container one. got: `{magic_number}`");
        return Err(Error::CorruptedMetadata);
    }

    Ok(())
}

/// Grabs the root directory offset from the header.
///
/// It's absolute, so anything pointing before the header's end is nonsense.
fn parse_root_offset(input: &mut &[u8], endianness: &WinnowEndianness) -> Result<u32> {
    let offset: u32 = u32(*endianness).parse_next(input).map_err(|_: EmptyError| {
        log::error!("Didn't find a root directory offset!");
        Error::CorruptedMetadata
    })?;

    if offset < 8 {
        log::error!("Root directory offset `{offset}` points into the header.");
        return Err(Error::CorruptedMetadata);
    }

    Ok(offset)
}

/// Parses out an entire directory at `base + offset`.
///
/// Returns the directory and the absolute offset of its chained successor,
/// if it declares one. `make` is the manufacturer string inherited from the
/// primary directory, for maker-note dispatch further down.
pub(crate) fn parse_directory(
    blob: &[u8],
    endianness: &WinnowEndianness,
    group: Group,
    base: u32,
    offset: u32,
    depth: u8,
    make: Option<&str>,
) -> Result<(Directory, Option<u32>)> {
    if depth > MAX_DEPTH {
        log::error!("Directory tree nests deeper than `{MAX_DEPTH}`; rejecting it.");
        return Err(Error::TooManyDirectoryEntries {
            count: u32::from(depth),
            limit: u32::from(MAX_DEPTH),
        });
    }

    let len = blob.len() as u64;
    let dir_pos = u64::from(base) + u64::from(offset);
    if dir_pos + 2 > len {
        log::error!("Directory offset `{dir_pos}` has no room for an entry count.");
        return Err(Error::OffsetOutOfRange {
            offset: dir_pos,
            size: 2,
            len,
        });
    }

    let table = &mut Stream {
        input: &blob[dir_pos as usize..],
        state: State {
            blob,
            endianness,
            group,
            base,
        },
    };
    let entry_count: u16 = u16(*endianness).parse_next(table).map_err(|_: EmptyError| {
        log::error!("Couldn't read the directory's entry count!");
        Error::CorruptedMetadata
    })?;

    if entry_count == 0 {
        log::error!("Directory reported itself as having zero entries! This is fatal to parsing.");
        return Err(Error::CorruptedMetadata);
    }

    // the declared table (count + entries + next pointer) must fit the
    // buffer before we believe the count at all
    let need = 2 + 12 * u64::from(entry_count) + 4;
    let avail = len - dir_pos;
    if need > avail {
        log::error!("Directory claims `{entry_count}` entries but the buffer ends first.");
        return Err(Error::TiffDirectoryTooLarge { need, avail });
    }

    if entry_count > MAX_ENTRIES {
        log::error!("Directory claims `{entry_count}` entries; treating that as hostile.");
        return Err(Error::TooManyDirectoryEntries {
            count: u32::from(entry_count),
            limit: u32::from(MAX_ENTRIES),
        });
    }

    log::trace!("Parsing `{entry_count}` entries for `{group}`...");
    let mut dir = Directory::new(group);
    let mut seen_array_tags: Vec<u16> = Vec::new();

    for i in 0..entry_count {
        let entry_offset = (dir_pos + 2 + 12 * u64::from(i)) as u32;
        let entry = parse_entry(table, entry_offset, &mut seen_array_tags)?;
        dir.push_entry(entry);
    }
    dir.mark_decoded(entry_count);
    log::trace!("Completed entry parsing!");

    let next_offset = {
        let raw: u32 = u32(*endianness).parse_next(table).map_err(|_: EmptyError| {
            log::error!("Directory didn't contain a pointer to the next one!");
            Error::CorruptedMetadata
        })?;

        if raw == 0 { None } else { Some(raw) }
    };

    // with the table fully read, resolve anything the entries point at.
    //
    // the manufacturer string lives in the primary directory, so it's
    // captured here and inherited by everything below.
    let make_owned: Option<String> = match group {
        Group::Ifd0 => dir
            .find(Ifd0Tag::Make.tag_id())
            .and_then(|e| e.value().as_ascii_str())
            .map(str::to_owned)
            .or_else(|| make.map(str::to_owned)),
        _ => make.map(str::to_owned),
    };

    let mut children: Vec<Directory> = Vec::new();
    for entry in dir.entries() {
        if let Some(target) = pointer_target(group, entry.tag()) {
            let child_offset = entry.to_u32(0).map_err(|e| {
                log::error!("`{target}` pointer holds no usable offset. err: {e}");
                Error::InvalidTag {
                    group,
                    tag: entry.tag(),
                }
            })?;

            let (child, child_next) = parse_directory(
                blob,
                endianness,
                target,
                base,
                child_offset,
                depth + 1,
                make_owned.as_deref(),
            )?;
            if child_next.is_some() {
                diag_warn!("A `{target}` sub-directory claims a successor; ignoring it.");
            }
            children.push(child);
        } else if group == Group::Exif && entry.tag() == MAKER_NOTE_TAG {
            if let Some(note) =
                makernote::decode_note(blob, endianness, make_owned.as_deref(), entry, depth + 1)
            {
                children.push(note);
            }
        }
    }
    for child in children {
        dir.push_child(child);
    }

    Ok((dir, next_offset))
}

/// Parses one 12-byte entry and resolves its value.
fn parse_entry(
    table: &mut Stream<'_>,
    entry_offset: u32,
    seen_array_tags: &mut Vec<u16>,
) -> Result<Metadatum> {
    let blob = table.state.blob;
    let endianness = *table.state.endianness;
    let group = table.state.group;
    let base = table.state.base;

    let outta_data = |_: EmptyError| {
        log::error!("Ran out of data mid-entry; the table length lied.");
        Error::CorruptedMetadata
    };

    let tag: u16 = u16(endianness).parse_next(table).map_err(outta_data)?;
    let raw_ty: u16 = u16(endianness).parse_next(table).map_err(outta_data)?;
    let count: u32 = u32(endianness).parse_next(table).map_err(outta_data)?;
    let value_field: [u8; 4] = take(4_usize)
        .parse_next(table)
        .map_err(outta_data)?
        .try_into()
        .unwrap_or_else(|e| unreachable!("winnow verified the size. but err: {e}"));

    let ty = TypeId::try_from(raw_ty).map_err(|()| {
        log::error!("Entry `{tag}` uses the undefined type id `{raw_ty}`.");
        Error::InvalidTypeValue { got: raw_ty }
    })?;

    log::trace!(
        "(entry info...
    tag: {tag},
    ty: {ty:?},
    count: {count},
    value field: {value_field:x?}
)"
    );

    // count times width must stay inside the 32-bit size domain - no
    // silent wrapping
    let total = u64::from(count) * u64::from(ty.size_bytes());
    if total > u64::from(u32::MAX) {
        log::error!("Entry `{tag}` declares `{count}` x `{}`-byte elements.", ty.size_bytes());
        return Err(Error::ArithmeticOverflow);
    }

    let len = blob.len() as u64;
    let (data, span): (&[u8], SourceSpan) = if total > 4 {
        // the field holds an offset; bounds-check before dereferencing
        let value_or_offset = match endianness {
            WinnowEndianness::Big => u32::from_be_bytes(value_field),
            WinnowEndianness::Little => u32::from_le_bytes(value_field),
            WinnowEndianness::Native => unreachable!("we never use this variant"),
        };

        let start = u64::from(base) + u64::from(value_or_offset);
        if start + total > len {
            log::error!(
                "Entry `{tag}` said its data is stored outside the blob! \
                That's not possible. offset: `{start}`, size: `{total}`, len: `{len}`"
            );
            return Err(Error::OffsetOutOfRange {
                offset: start,
                size: total,
                len,
            });
        }

        (
            &blob[start as usize..(start + total) as usize],
            SourceSpan {
                entry_offset,
                value_offset: start as u32,
                size: total as u32,
                inline: false,
            },
        )
    } else {
        (
            &value_field[..total as usize],
            SourceSpan {
                entry_offset,
                value_offset: entry_offset + 8,
                size: total as u32,
                inline: true,
            },
        )
    };

    let value = parse_elements(ty, count, data, &endianness)?;

    // registry cross-checks are tolerated, never coerced - the entry
    // keeps exactly the type and count it declared
    match KnownTag::try_from((group, tag)) {
        Ok(known) => {
            if !known.types().contains(&ty) {
                diag_warn!(
                    "`{group}` tag `{tag}` ({}) has a type mismatch: got `{ty:?}`, \
                    expected one of {:?}. Keeping it anyway.",
                    known.tag_name(),
                    known.types()
                );
            }
            if !known.count().accepts(count) {
                diag_warn!(
                    "`{group}` tag `{tag}` ({}) has a surprising count: `{count}`.",
                    known.tag_name()
                );
            }
        }
        Err(()) => {
            diag_warn!("Unknown `{group}` tag `{tag}`. Keeping it with a generic rendering.");
        }
    }

    // logical-array consistency is NOT tolerable: a broken array can't be
    // interpreted or round-tripped meaningfully
    if let Some(required) = tags::array_element_type(group, tag) {
        if seen_array_tags.contains(&tag) {
            log::error!("`{group}` names array tag `{tag}` more than once.");
            return Err(Error::MultipleTiffArrayElementTagsInDirectory { group, tag });
        }
        seen_array_tags.push(tag);

        if ty != required {
            log::error!("`{group}` array tag `{tag}` stores `{ty:?}` elements.");
            return Err(Error::WrongTiffArrayElementTagType {
                group,
                tag,
                expected: required,
                got: ty,
            });
        }
    }

    Ok(Metadatum::decoded(group, tag, value, span))
}

/// Builds a typed [`Value`] from an entry's raw bytes.
pub(crate) fn parse_elements(
    ty: TypeId,
    count: u32,
    data: &[u8],
    endianness: &WinnowEndianness,
) -> Result<Value> {
    let total = u64::from(count) * u64::from(ty.size_bytes());
    if (data.len() as u64) < total {
        // the caller's bounds check should make this impossible; refuse
        // rather than allocate against a lie
        log::error!("Asked to build `{total}` bytes of elements from `{}`.", data.len());
        return Err(Error::InvalidMalloc { size: total });
    }

    let n = count as usize;
    let input = &mut &data[..total as usize];
    let outta_data = |_: EmptyError| {
        log::error!("Ran out of data mid-element; this is a bug - please report it!");
        Error::CorruptedMetadata
    };

    Ok(match ty {
        TypeId::Byte => Value::Byte(input[..n].to_vec()),
        TypeId::Ascii => Value::Ascii(input[..n].to_vec()),
        TypeId::Undefined => Value::Undefined(input[..n].to_vec()),
        TypeId::SByte => Value::SByte(input[..n].iter().map(|b| *b as i8).collect()),

        TypeId::Short => {
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(u16(*endianness).parse_next(input).map_err(outta_data)?);
            }
            Value::Short(v)
        }
        TypeId::SShort => {
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(i16(*endianness).parse_next(input).map_err(outta_data)?);
            }
            Value::SShort(v)
        }
        TypeId::Long => {
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(u32(*endianness).parse_next(input).map_err(outta_data)?);
            }
            Value::Long(v)
        }
        TypeId::SLong => {
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(i32(*endianness).parse_next(input).map_err(outta_data)?);
            }
            Value::SLong(v)
        }
        TypeId::Rational => {
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(ifdtree_types::primitives::Rational {
                    numerator: u32(*endianness).parse_next(input).map_err(outta_data)?,
                    denominator: u32(*endianness).parse_next(input).map_err(outta_data)?,
                });
            }
            Value::Rational(v)
        }
        TypeId::SRational => {
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(ifdtree_types::primitives::SRational {
                    numerator: i32(*endianness).parse_next(input).map_err(outta_data)?,
                    denominator: i32(*endianness).parse_next(input).map_err(outta_data)?,
                });
            }
            Value::SRational(v)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_byte_order, parse_elements, parse_magic_number, parse_root_offset};
    use crate::error::Error;
    use ifdtree_types::group::Group;
    use ifdtree_types::primitives::{ByteOrder, TypeId};
    use ifdtree_types::value::Value;
    use winnow::binary::Endianness as WinnowEndianness;

    /// Checks that we're able to parse the byte order properly.
    #[test]
    fn byte_order_marker() {
        crate::test_util::logger();

        assert_eq!(
            parse_byte_order(&mut b"II".as_slice()),
            Ok(ByteOrder::Little)
        );
        assert_eq!(parse_byte_order(&mut b"MM".as_slice()), Ok(ByteOrder::Big));
        assert_eq!(
            parse_byte_order(&mut b"other".as_slice()),
            Err(Error::CorruptedMetadata),
            "other strings aren't indicative of endianness"
        );
        assert_eq!(
            parse_byte_order(&mut b"I".as_slice()),
            Err(Error::CorruptedMetadata),
            "too short for a marker"
        );
    }

    #[test]
    fn magic_number_is_checked() {
        crate::test_util::logger();

        assert_eq!(
            parse_magic_number(&mut 42_u16.to_le_bytes().as_slice(), &WinnowEndianness::Little),
            Ok(())
        );
        assert_eq!(
            parse_magic_number(&mut 43_u16.to_be_bytes().as_slice(), &WinnowEndianness::Big),
            Err(Error::CorruptedMetadata)
        );
    }

    #[test]
    fn root_offsets_inside_the_header_are_rejected() {
        crate::test_util::logger();

        assert_eq!(
            parse_root_offset(&mut 8_u32.to_le_bytes().as_slice(), &WinnowEndianness::Little),
            Ok(8)
        );
        assert_eq!(
            parse_root_offset(&mut 7_u32.to_le_bytes().as_slice(), &WinnowEndianness::Little),
            Err(Error::CorruptedMetadata)
        );
    }

    #[test]
    fn elements_parse_under_both_byte_orders() {
        crate::test_util::logger();

        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(
            parse_elements(TypeId::Short, 2, &data, &WinnowEndianness::Little).unwrap(),
            Value::Short(vec![0x0201, 0x0403])
        );
        assert_eq!(
            parse_elements(TypeId::Short, 2, &data, &WinnowEndianness::Big).unwrap(),
            Value::Short(vec![0x0102, 0x0304])
        );
        assert_eq!(
            parse_elements(TypeId::SLong, 1, &data, &WinnowEndianness::Big).unwrap(),
            Value::SLong(vec![0x01020304])
        );
    }

    /// Shorter-than-declared data can't be used to build elements.
    #[test]
    fn element_building_refuses_short_data() {
        crate::test_util::logger();

        let data = [0x01, 0x02];
        assert_eq!(
            parse_elements(TypeId::Long, 2, &data, &WinnowEndianness::Little),
            Err(Error::InvalidMalloc { size: 8 })
        );
    }

    /// helper: one little-endian 12-byte entry with an inline value
    fn push_entry(bytes: &mut Vec<u8>, tag: u16, ty: u16, count: u32, value: [u8; 4]) {
        bytes.extend_from_slice(tag.to_le_bytes().as_slice());
        bytes.extend_from_slice(ty.to_le_bytes().as_slice());
        bytes.extend_from_slice(count.to_le_bytes().as_slice());
        bytes.extend_from_slice(value.as_slice());
    }

    #[test]
    fn duplicate_array_tags_fail_the_directory() {
        crate::test_util::logger();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(2_u16.to_le_bytes().as_slice());
        push_entry(&mut bytes, 0x0001, 3, 1, [1, 0, 0, 0]);
        push_entry(&mut bytes, 0x0001, 3, 1, [2, 0, 0, 0]);
        bytes.extend_from_slice(0_u32.to_le_bytes().as_slice());

        assert_eq!(
            super::parse_directory(
                &bytes,
                &WinnowEndianness::Little,
                Group::CanonMn,
                0,
                0,
                0,
                None
            )
            .map(|_| ()),
            Err(Error::MultipleTiffArrayElementTagsInDirectory {
                group: Group::CanonMn,
                tag: 0x0001,
            })
        );
    }

    #[test]
    fn mistyped_array_tags_fail_the_directory() {
        crate::test_util::logger();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(1_u16.to_le_bytes().as_slice());
        push_entry(&mut bytes, 0x0004, 4, 1, [9, 0, 0, 0]);
        bytes.extend_from_slice(0_u32.to_le_bytes().as_slice());

        assert_eq!(
            super::parse_directory(
                &bytes,
                &WinnowEndianness::Little,
                Group::CanonMn,
                0,
                0,
                0,
                None
            )
            .map(|_| ()),
            Err(Error::WrongTiffArrayElementTagType {
                group: Group::CanonMn,
                tag: 0x0004,
                expected: TypeId::Short,
                got: TypeId::Long,
            })
        );
    }

    /// Ordinary duplicate tags are kept, not merged and not an error.
    #[test]
    fn ordinary_duplicates_are_kept() {
        crate::test_util::logger();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(2_u16.to_le_bytes().as_slice());
        push_entry(&mut bytes, 274, 3, 1, [1, 0, 0, 0]);
        push_entry(&mut bytes, 274, 3, 1, [6, 0, 0, 0]);
        bytes.extend_from_slice(0_u32.to_le_bytes().as_slice());

        let (dir, next) = super::parse_directory(
            &bytes,
            &WinnowEndianness::Little,
            Group::Ifd0,
            0,
            0,
            0,
            None,
        )
        .unwrap();

        assert_eq!(next, None);
        assert_eq!(dir.find_all(274).count(), 2);
    }
}
