//! Vendor maker-note strategies.
//!
//! Maker notes are proprietary sub-directories embedded in the camera
//! metadata. Their format is defined per manufacturer, so each supported
//! vendor gets a strategy: where its embedded directory starts, what base
//! its offsets are relative to, and its own tag table and print functions.
//!
//! Dispatch is a static table lookup on the manufacturer string - no
//! runtime reflection, no dynamic registration.

use rustc_hash::FxHashMap;

use crate::{
    group::Group,
    tags::{FieldSource, print_plain},
    value::Value,
};

pub mod canon;
pub mod pentax;

/// What a vendor's in-note offsets are relative to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteBase {
    /// Offsets count from the start of the host container (the usual TIFF
    /// base), as if the note's entries were ordinary ones.
    TiffHeader,

    /// Offsets count from the first byte of the maker-note block itself.
    NoteStart,
}

/// One vendor's decoding strategy.
///
/// Strategies are plain values in a static table, selected by
/// [`strategy_for`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MakerNoteStrategy {
    /// Manufacturer prefix this strategy claims, uppercase.
    pub make: &'static str,

    /// The group assigned to the decoded sub-directory.
    pub group: Group,

    /// Bytes expected at the start of the note block. Empty for vendors
    /// whose notes begin directly with a directory.
    pub signature: &'static [u8],

    /// Where the embedded directory starts, relative to the note block.
    pub ifd_start: usize,

    /// The base used to resolve the note's internal offsets.
    pub base: NoteBase,
}

/// The built-in strategy table.
///
/// Ricoh bodies built on Pentax internals write Pentax-format notes, so
/// both makes map to the same strategy.
pub static STRATEGIES: &[MakerNoteStrategy] = &[
    MakerNoteStrategy {
        make: "PENTAX",
        group: Group::PentaxMn,
        signature: b"AOC\0",
        ifd_start: 6,
        base: NoteBase::TiffHeader,
    },
    MakerNoteStrategy {
        make: "RICOH",
        group: Group::PentaxMn,
        signature: b"AOC\0",
        ifd_start: 6,
        base: NoteBase::TiffHeader,
    },
    MakerNoteStrategy {
        make: "CANON",
        group: Group::CanonMn,
        signature: b"",
        ifd_start: 0,
        base: NoteBase::TiffHeader,
    },
];

/// Selects the strategy for a manufacturer string.
///
/// Matching is a case-insensitive prefix test, since `Make` values carry
/// model suffixes ("PENTAX Corporation", "Canon EOS ...").
pub fn strategy_for(make: &str) -> Option<&'static MakerNoteStrategy> {
    let make = make.trim().to_ascii_uppercase();
    STRATEGIES.iter().find(|s| make.starts_with(s.make))
}

/// Finds the strategy that owns a maker-note group.
///
/// Used on write-back to regenerate a note's signature and offset base.
/// Aliased makes (Ricoh) share one group, so the first table hit wins.
pub fn strategy_for_group(group: Group) -> Option<&'static MakerNoteStrategy> {
    STRATEGIES.iter().find(|s| s.group == group)
}

/// A `{code -> label}` translation table.
pub type CodeLabels = FxHashMap<u32, &'static str>;

/// Builds a [`CodeLabels`] table from static pairs.
pub fn code_labels(pairs: &[(u32, &'static str)]) -> CodeLabels {
    pairs.iter().copied().collect()
}

/// Translates a vendor "combi-value" to a description by looking up a
/// reference table.
///
/// The code is built by concatenating `components` byte-sized elements,
/// most significant component first. Vendors sometimes append extra
/// elements we ignore: a value count of `components`, or anywhere in
/// `components + extra.0 ..= components + extra.1`, is accepted.
///
/// Anything that doesn't fit - too many components, out-of-range element,
/// unexpected count - falls back to the generic rendering instead of
/// failing.
pub fn print_combi_tag(
    table: &CodeLabels,
    components: u32,
    extra: (u32, u32),
    value: &Value,
    source: Option<&dyn FieldSource>,
) -> String {
    let count = value.count();
    let accepted = count == components
        || ((components + extra.0)..=(components + extra.1)).contains(&count);
    if !accepted || components > 4 {
        return print_plain(value, source);
    }

    let mut code: u32 = 0;
    for c in 0..components {
        let Ok(element) = value.to_i64(c) else {
            return print_plain(value, source);
        };
        if !(0..=255).contains(&element) {
            return print_plain(value, source);
        }
        code += (element as u32) << ((components - c - 1) * 8);
    }

    match table.get(&code) {
        Some(label) => (*label).to_owned(),
        None => format!(
            "Unknown (0x{code:0width$x})",
            width = 2 * components as usize
        ),
    }
}
