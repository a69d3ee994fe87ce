//! Hand-off of vendor maker-note blocks.
//!
//! The camera-metadata directory anchors an opaque byte range whose layout
//! only the manufacturer defines. Dispatch picks a strategy by the
//! manufacturer string from the primary directory; matched vendors decode
//! with their own group, signature, and offset base, unmatched ones get a
//! best-effort generic decode.
//!
//! Failure here is never fatal: a note we can't make sense of stays on its
//! anchor entry as opaque bytes, preserved verbatim on write-back.

use ifdtree_types::{
    group::Group,
    makernotes::{NoteBase, strategy_for},
};
use winnow::binary::Endianness as WinnowEndianness;

use crate::{decode, diag::diag_warn, directory::Directory, entry::Metadatum};

/// Tries to decode an anchored maker-note block into a directory.
///
/// Returns `None` when the block should stay opaque - the caller keeps the
/// anchor entry's raw bytes in that case.
pub(crate) fn decode_note(
    blob: &[u8],
    endianness: &WinnowEndianness,
    make: Option<&str>,
    anchor: &Metadatum,
    depth: u8,
) -> Option<Directory> {
    // a fresh, never-decoded anchor has no byte range to interpret
    let span = anchor.source()?;
    if span.inline {
        diag_warn!("Maker note is too small to hold a directory; keeping it opaque.");
        return None;
    }

    let note_offset = span.value_offset;
    let note = &blob[note_offset as usize..(note_offset + span.size) as usize];

    let (group, ifd_start, base) = match make.and_then(strategy_for) {
        Some(strategy) => {
            if note.starts_with(strategy.signature) {
                (strategy.group, strategy.ifd_start, strategy.base)
            } else {
                diag_warn!(
                    "`{}` maker note is missing its signature; decoding generically.",
                    strategy.make
                );
                (Group::UnknownMn, 0, NoteBase::TiffHeader)
            }
        }
        None => {
            if let Some(make) = make {
                diag_warn!("No maker note strategy for `{make}`; decoding generically.");
            } else {
                diag_warn!("Maker note present without a manufacturer; decoding generically.");
            }
            (Group::UnknownMn, 0, NoteBase::TiffHeader)
        }
    };

    let base_offset: u32 = match base {
        NoteBase::TiffHeader => 0,
        NoteBase::NoteStart => note_offset,
    };
    let Some(ifd_offset) = note_offset
        .checked_add(ifd_start as u32)
        .map(|v| v - base_offset)
    else {
        diag_warn!("Maker note directory sits past the offset domain; keeping it opaque.");
        return None;
    };

    match decode::parse_directory(blob, endianness, group, base_offset, ifd_offset, depth, make) {
        Ok((dir, next)) => {
            if next.is_some() {
                diag_warn!("Maker note claims a successor directory; ignoring it.");
            }
            log::trace!("Decoded a `{group}` maker note with {} entries.", dir.entries().len());
            Some(dir)
        }
        Err(e) => {
            diag_warn!("Couldn't decode the `{group}` maker note ({e}); keeping it opaque.");
            None
        }
    }
}
