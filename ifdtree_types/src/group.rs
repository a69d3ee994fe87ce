//! Contains stuff related to directory groups.
//!
//! For more info, see the [`Group`] enumeration.

/// A group names one directory's place in the tagged tree.
///
/// Groups are NOT an abstraction - the directories are _literally_ present
/// in the file. A container can embed a number of them.
///
/// Directories aren't self-describing in their type, nor do format
/// standards provide any information about their order. Instead, the
/// primary directory (optionally) contains pointer tags indicating where
/// its sub-directories live within the metadata slice.
///
/// That means the primary directory is always required when any tagged
/// metadata is present, as other groups have no way to self-describe.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum Group {
    /// The primary directory ("IFD 0").
    ///
    /// This one stems from TIFF, as it's the only group there. Additional
    /// chained directories all refer to this same tag set.
    #[doc(alias = "IFD0")]
    Ifd0,

    /// A chained "subfile" directory, usually the embedded thumbnail.
    #[doc(alias = "IFD1")]
    Ifd1,

    /// The camera-metadata sub-directory (exposure info and friends).
    Exif,

    /// The location-metadata sub-directory.
    Gps,

    /// The interoperability sub-directory: info about what software wrote
    /// the metadata.
    #[doc(alias = "InteropIFD")]
    Interop,

    /// Pentax's proprietary maker-note sub-directory.
    ///
    /// Also used by Ricoh bodies built on Pentax internals.
    PentaxMn,

    /// Canon's proprietary maker-note sub-directory.
    CanonMn,

    /// A maker note whose vendor we don't recognize, decoded generically.
    UnknownMn,
}

impl Group {
    /// Checks whether this group is optional.
    ///
    /// As of writing, the primary directory is the only required group.
    pub fn optional(&self) -> bool {
        !matches!(self, Self::Ifd0)
    }

    /// Whether this group holds a vendor's proprietary sub-tree.
    pub fn is_maker_note(&self) -> bool {
        matches!(self, Self::PentaxMn | Self::CanonMn | Self::UnknownMn)
    }

    /// The group's display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Group::Ifd0 => "Image",
            Group::Ifd1 => "Thumbnail",
            Group::Exif => "Photo",
            Group::Gps => "GPSInfo",
            Group::Interop => "Iop",
            Group::PentaxMn => "Pentax",
            Group::CanonMn => "Canon",
            Group::UnknownMn => "MakerNote",
        }
    }
}

impl core::fmt::Display for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
