//! Definitions for the tags a directory may contain.
//!
//! # `tags`
//!
//! This module is the static registry: for each directory group, a table
//! mapping a numeric tag id to its name, expected type(s), expected count,
//! and print function.
//!
//! Lookup happens by `(Group, u16)` through [`KnownTag::try_from`]. A miss
//! means "unknown tag" - the codec keeps unknown tags, it just can't say
//! anything smart about them.
//!
//! ## For contributors
//!
//! Expansion with new groups is simple - for each newly supported group:
//!
//! 1. add the group's name to [`crate::group::Group`]
//! 2. create a new call to the `make_tag_list_for_group!` macro
//! 3. add all the available tags (keys, value types, counts)
//! 4. add a new variant on [`KnownTag`] and forward its methods
//! 5. if any tag deserves interpreted output, extend the group's
//!    `printer` table

use crate::{
    group::Group,
    primitives::TypeId,
    value::Value,
};

/// Creates a "tag list" for a directory group.
///
/// These may include duplicate tag ids from other groups.
macro_rules! make_tag_list_for_group {
    (enum $enum_name:ident => $group:expr,
        $( $tag_ident:ident = $tag_id:expr => {
            name: $tag_name:expr,
            types: $types:expr,
            count: $count:expr,
        },
    )+) => {
        #[doc = "A list of all tags present in the matching `Group` variant."]
        #[repr(u16)]
        #[non_exhaustive]
        #[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
        pub enum $enum_name {
            $(
              $tag_ident = $tag_id,
            )+
        }

        impl $enum_name {
            /// Returns the number of elements this tag's value may store.
            pub const fn count(&self) -> TagCount {
                match self {
                    $( Self::$tag_ident => $count, )+
                }
            }

            /// Returns the `Group` that this enum represents.
            pub const fn group() -> Group {
                $group
            }

            /// Returns this tag's id.
            pub const fn tag_id(&self) -> u16 {
                *self as u16
            }

            /// Grabs a tag's name as defined in the standard.
            pub const fn tag_name(&self) -> &'static str {
                match self {
                    $( Self::$tag_ident => $tag_name, )+
                }
            }

            /// Returns the type(s) this tag's value may have.
            ///
            /// A slice with more than one entry is an explicit tolerance
            /// list: every listed type is accepted without a warning.
            pub const fn types(&self) -> &'static [TypeId] {
                match self {
                    $( Self::$tag_ident => $types, )+
                }
            }
        }

        impl core::convert::TryFrom<u16> for $enum_name {
            type Error = ();

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $( $tag_id => Ok($enum_name::$tag_ident), )+
                    _ => Err(()),
                }
            }
        }
    }
}

pub(crate) use make_tag_list_for_group;

use {TagCount as Tc, TypeId as Ty};

/// The number of elements a tag's value should have.
///
/// These are used to sanity-check parsed values.
#[repr(C)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum TagCount {
    /// There are `n` elements.
    Known(u32),

    /// The number of elements is within this range, inclusive.
    KnownRange { lower: u32, upper: u32 },

    /// Any number of elements.
    Any,
}

impl TagCount {
    /// Whether `count` satisfies this expectation.
    pub fn accepts(&self, count: u32) -> bool {
        match self {
            TagCount::Known(n) => count == *n,
            TagCount::KnownRange { lower, upper } => (*lower..=*upper).contains(&count),
            TagCount::Any => true,
        }
    }
}

/// Cross-referencing context handed to print functions.
///
/// Some interpreted renderings need other values from the surrounding
/// tree (e.g. a vendor field encrypted against sibling date/time tags).
/// The codec's directory tree implements this; printers that don't need
/// context just ignore it.
pub trait FieldSource {
    /// Looks up a decoded value elsewhere in the tree.
    fn value_of(&self, group: Group, tag: u16) -> Option<&Value>;
}

/// An interpreted rendering of one value.
pub type PrintFn = fn(&Value, Option<&dyn FieldSource>) -> String;

/// A set of all known tags and their groups.
#[derive(Copy, Clone, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum KnownTag {
    Ifd0(Ifd0Tag),
    Exif(ExifTag),
    Gps(GpsTag),
    Interop(InteropTag),
    Pentax(crate::makernotes::pentax::PentaxTag),
    Canon(crate::makernotes::canon::CanonTag),
}

impl KnownTag {
    /// Returns this tag's id.
    pub const fn tag_id(&self) -> u16 {
        match self {
            KnownTag::Ifd0(k) => *k as u16,
            KnownTag::Exif(k) => *k as u16,
            KnownTag::Gps(k) => *k as u16,
            KnownTag::Interop(k) => *k as u16,
            KnownTag::Pentax(k) => *k as u16,
            KnownTag::Canon(k) => *k as u16,
        }
    }

    /// Grabs the tag's name as defined by its standard (or its vendor).
    pub const fn tag_name(&self) -> &'static str {
        match self {
            KnownTag::Ifd0(k) => k.tag_name(),
            KnownTag::Exif(k) => k.tag_name(),
            KnownTag::Gps(k) => k.tag_name(),
            KnownTag::Interop(k) => k.tag_name(),
            KnownTag::Pentax(k) => k.tag_name(),
            KnownTag::Canon(k) => k.tag_name(),
        }
    }

    /// Returns the type(s) this tag's value may have.
    pub const fn types(&self) -> &'static [TypeId] {
        match self {
            KnownTag::Ifd0(k) => k.types(),
            KnownTag::Exif(k) => k.types(),
            KnownTag::Gps(k) => k.types(),
            KnownTag::Interop(k) => k.types(),
            KnownTag::Pentax(k) => k.types(),
            KnownTag::Canon(k) => k.types(),
        }
    }

    /// Returns the number of elements this tag's value may store.
    pub const fn count(&self) -> TagCount {
        match self {
            KnownTag::Ifd0(k) => k.count(),
            KnownTag::Exif(k) => k.count(),
            KnownTag::Gps(k) => k.count(),
            KnownTag::Interop(k) => k.count(),
            KnownTag::Pentax(k) => k.count(),
            KnownTag::Canon(k) => k.count(),
        }
    }

    /// Returns the print function used to render this tag's value.
    ///
    /// Tags without an interpreted rendering fall back to [`print_plain`].
    pub fn printer(&self) -> PrintFn {
        match self {
            KnownTag::Ifd0(k) => k.printer(),
            KnownTag::Exif(k) => k.printer(),
            KnownTag::Pentax(k) => k.printer(),
            KnownTag::Gps(_) | KnownTag::Interop(_) | KnownTag::Canon(_) => print_plain,
        }
    }
}

impl TryFrom<(Group, u16)> for KnownTag {
    type Error = ();

    fn try_from(value: (Group, u16)) -> Result<Self, Self::Error> {
        let (group, tag_id): (Group, u16) = value;

        match group {
            // chained subfile directories reuse the primary tag set
            Group::Ifd0 | Group::Ifd1 => Ifd0Tag::try_from(tag_id).map(KnownTag::Ifd0),
            Group::Exif => ExifTag::try_from(tag_id).map(KnownTag::Exif),
            Group::Gps => GpsTag::try_from(tag_id).map(KnownTag::Gps),
            Group::Interop => InteropTag::try_from(tag_id).map(KnownTag::Interop),
            Group::PentaxMn => {
                crate::makernotes::pentax::PentaxTag::try_from(tag_id).map(KnownTag::Pentax)
            }
            Group::CanonMn => {
                crate::makernotes::canon::CanonTag::try_from(tag_id).map(KnownTag::Canon)
            }
            Group::UnknownMn => Err(()),
        }
    }
}

/// Resolves a sub-directory pointer tag to the group it points at.
///
/// Pointer tags hold an absolute offset to a nested directory rather than
/// ordinary data. The maker-note anchor is NOT listed here - its byte
/// range goes through vendor dispatch instead of generic recursion.
pub fn pointer_target(group: Group, tag_id: u16) -> Option<Group> {
    match (group, tag_id) {
        (Group::Ifd0, id) if id == Ifd0Tag::ExifIfdPointer.tag_id() => Some(Group::Exif),
        (Group::Ifd0, id) if id == Ifd0Tag::GpsInfoIfdPointer.tag_id() => Some(Group::Gps),
        (Group::Exif, id) if id == ExifTag::InteroperabilityIfdPointer.tag_id() => {
            Some(Group::Interop)
        }
        _ => None,
    }
}

/// The maker-note anchor: the camera-metadata tag whose value is a
/// vendor-proprietary sub-tree.
pub const MAKER_NOTE_TAG: u16 = ExifTag::MakerNote as u16;

/// Tags whose entries inside one directory form a single logical array.
///
/// At most one entry per directory may carry such a tag, and its elements
/// must use the declared type.
pub fn array_element_type(group: Group, tag_id: u16) -> Option<TypeId> {
    match group {
        Group::CanonMn => crate::makernotes::canon::array_element_type(tag_id),
        _ => None,
    }
}

/*
 *
 *
 *
 *
 *
 *
 *
 *  TIFF Rev. 6.0 Attribute List
 *
 *
 *
 *
 *
 *
 *
 *
 */
make_tag_list_for_group!(enum Ifd0Tag => Group::Ifd0,
    //
    // image data structure
    ImageWidth = 256 => {
        name: "Image width",
        types: &[Ty::Short, Ty::Long],
        count: Tc::Known(1),
    },
    ImageLength = 257 => {
        name: "Image height",
        types: &[Ty::Short, Ty::Long],
        count: Tc::Known(1),
    },
    BitsPerSample = 258 => {
        name: "Number of bits per component",
        types: &[Ty::Short],
        count: Tc::Known(3),
    },
    Compression = 259 => {
        name: "Compression scheme",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    PhotometricInterpretation = 262 => {
        name: "Pixel composition",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    Orientation = 274 => {
        name: "Orientation of image",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    SamplesPerPixel = 277 => {
        name: "Number of components",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    XResolution = 282 => {
        name: "Image resolution in width direction",
        types: &[Ty::Rational],
        count: Tc::Known(1),
    },
    YResolution = 283 => {
        name: "Image resolution in height direction",
        types: &[Ty::Rational],
        count: Tc::Known(1),
    },
    ResolutionUnit = 296 => {
        name: "Unit of X and Y resolution",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    YCbCrPositioning = 531 => {
        name: "Y and C positioning",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },

    //
    // recording offset
    StripOffsets = 273 => {
        name: "Offset to strip",
        types: &[Ty::Short, Ty::Long],
        count: Tc::Any,
    },
    RowsPerStrip = 278 => {
        name: "Number of rows per strip",
        types: &[Ty::Short, Ty::Long],
        count: Tc::Known(1),
    },
    StripByteCounts = 279 => {
        name: "Bytes per compressed strip",
        types: &[Ty::Short, Ty::Long],
        count: Tc::Any,
    },
    JPEGInterchangeFormat = 513 => {
        name: "Offset to JPEG SOI",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
    JPEGInterchangeFormatLength = 514 => {
        name: "Bytes of JPEG data",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },

    //
    // other tags
    ImageDescription = 270 => {
        name: "Description of image",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    Make = 271 => {
        name: "Image input equipment manufacturer",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    Model = 272 => {
        name: "Image input equipment model",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    Software = 305 => {
        name: "Software used",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    DateTime = 306 => {
        name: "File change date and time",
        types: &[Ty::Ascii],
        count: Tc::Known(20),
    },
    Artist = 315 => {
        name: "Person who created the image",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    Copyright = 33432 => {
        name: "Copyright holder",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },

    //
    // pointers to sub-directories
    ExifIfdPointer = 34665 => {
        name: "Exif IFD pointer",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
    GpsInfoIfdPointer = 34853 => {
        name: "GPS Info IFD pointer",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
);

impl Ifd0Tag {
    /// Returns this tag's print function.
    pub fn printer(&self) -> PrintFn {
        match self {
            Ifd0Tag::Orientation => print_orientation,
            Ifd0Tag::ResolutionUnit => print_resolution_unit,
            _ => print_plain,
        }
    }
}

make_tag_list_for_group!(enum ExifTag => Group::Exif,
    ExposureTime = 33434 => {
        name: "Exposure time",
        types: &[Ty::Rational],
        count: Tc::Known(1),
    },
    FNumber = 33437 => {
        name: "F number",
        types: &[Ty::Rational],
        count: Tc::Known(1),
    },
    ExposureProgram = 34850 => {
        name: "Exposure program",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    ISOSpeedRatings = 34855 => {
        name: "ISO speed ratings",
        types: &[Ty::Short],
        count: Tc::Any,
    },
    ExifVersion = 36864 => {
        name: "Exif version",
        types: &[Ty::Undefined],
        count: Tc::Known(4),
    },
    DateTimeOriginal = 36867 => {
        name: "Date and time of original data generation",
        types: &[Ty::Ascii],
        count: Tc::Known(20),
    },
    DateTimeDigitized = 36868 => {
        name: "Date and time of digital data generation",
        types: &[Ty::Ascii],
        count: Tc::Known(20),
    },
    ShutterSpeedValue = 37377 => {
        name: "Shutter speed",
        types: &[Ty::SRational],
        count: Tc::Known(1),
    },
    ApertureValue = 37378 => {
        name: "Aperture",
        types: &[Ty::Rational],
        count: Tc::Known(1),
    },
    ExposureBiasValue = 37380 => {
        name: "Exposure bias",
        types: &[Ty::SRational],
        count: Tc::Known(1),
    },
    MeteringMode = 37383 => {
        name: "Metering mode",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    Flash = 37385 => {
        name: "Flash",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    FocalLength = 37386 => {
        name: "Lens focal length",
        types: &[Ty::Rational],
        count: Tc::Known(1),
    },
    MakerNote = 37500 => {
        name: "Manufacturer notes",
        types: &[Ty::Undefined],
        count: Tc::Any,
    },
    UserComment = 37510 => {
        name: "User comments",
        types: &[Ty::Undefined],
        count: Tc::Any,
    },
    ColorSpace = 40961 => {
        name: "Color space information",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    PixelXDimension = 40962 => {
        name: "Valid image width",
        types: &[Ty::Short, Ty::Long],
        count: Tc::Known(1),
    },
    PixelYDimension = 40963 => {
        name: "Valid image height",
        types: &[Ty::Short, Ty::Long],
        count: Tc::Known(1),
    },
    InteroperabilityIfdPointer = 40965 => {
        name: "Interoperability IFD pointer",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
);

impl ExifTag {
    /// Returns this tag's print function.
    pub fn printer(&self) -> PrintFn {
        match self {
            ExifTag::ExposureProgram => print_exposure_program,
            ExifTag::MeteringMode => print_metering_mode,
            ExifTag::Flash => print_flash,
            _ => print_plain,
        }
    }
}

make_tag_list_for_group!(enum GpsTag => Group::Gps,
    GpsVersionId = 0 => {
        name: "GPS tag version",
        types: &[Ty::Byte],
        count: Tc::Known(4),
    },
    GpsLatitudeRef = 1 => {
        name: "North or south latitude",
        types: &[Ty::Ascii],
        count: Tc::Known(2),
    },
    GpsLatitude = 2 => {
        name: "Latitude",
        types: &[Ty::Rational],
        count: Tc::Known(3),
    },
    GpsLongitudeRef = 3 => {
        name: "East or west longitude",
        types: &[Ty::Ascii],
        count: Tc::Known(2),
    },
    GpsLongitude = 4 => {
        name: "Longitude",
        types: &[Ty::Rational],
        count: Tc::Known(3),
    },
    GpsAltitudeRef = 5 => {
        name: "Altitude reference",
        types: &[Ty::Byte],
        count: Tc::Known(1),
    },
    GpsAltitude = 6 => {
        name: "Altitude",
        types: &[Ty::Rational],
        count: Tc::Known(1),
    },
    GpsTimeStamp = 7 => {
        name: "GPS time (atomic clock)",
        types: &[Ty::Rational],
        count: Tc::Known(3),
    },
    GpsMapDatum = 18 => {
        name: "Geodetic survey data used",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    GpsDateStamp = 29 => {
        name: "GPS date",
        types: &[Ty::Ascii],
        count: Tc::Known(11),
    },
);

make_tag_list_for_group!(enum InteropTag => Group::Interop,
    InteroperabilityIndex = 1 => {
        name: "Interoperability identification",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    InteroperabilityVersion = 2 => {
        name: "Interoperability version",
        types: &[Ty::Undefined],
        count: Tc::Known(4),
    },
);

/*
 *
 *
 *  print functions
 *
 *
 */

/// The generic rendering: ASCII values as a trimmed string, everything
/// else element-by-element, space-separated.
pub fn print_plain(value: &Value, _source: Option<&dyn FieldSource>) -> String {
    if let Some(s) = value.as_ascii_str() {
        return s.to_owned();
    }

    let mut out = String::new();
    for i in 0..value.count() {
        if i > 0 {
            out.push(' ');
        }
        match value.to_string_at(i) {
            Ok(s) => out.push_str(&s),
            Err(_) => break,
        }
    }
    out
}

/// Table-driven rendering of a coded integer.
///
/// Unmapped or non-integer inputs fall back to the generic rendering
/// rather than failing.
pub fn print_lookup(
    table: &[(u32, &'static str)],
    value: &Value,
    source: Option<&dyn FieldSource>,
) -> String {
    let Ok(code) = value.to_u32(0) else {
        return print_plain(value, source);
    };

    match table.iter().find(|(c, _)| *c == code) {
        Some((_, label)) => (*label).to_owned(),
        None => print_plain(value, source),
    }
}

const ORIENTATION_LABELS: &[(u32, &str)] = &[
    (1, "top, left"),
    (2, "top, right"),
    (3, "bottom, right"),
    (4, "bottom, left"),
    (5, "left, top"),
    (6, "right, top"),
    (7, "right, bottom"),
    (8, "left, bottom"),
];

fn print_orientation(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(ORIENTATION_LABELS, value, source)
}

const RESOLUTION_UNIT_LABELS: &[(u32, &str)] =
    &[(1, "none"), (2, "inch"), (3, "cm")];

fn print_resolution_unit(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(RESOLUTION_UNIT_LABELS, value, source)
}

const EXPOSURE_PROGRAM_LABELS: &[(u32, &str)] = &[
    (0, "Not defined"),
    (1, "Manual"),
    (2, "Auto"),
    (3, "Aperture priority"),
    (4, "Shutter priority"),
    (5, "Creative program"),
    (6, "Action program"),
    (7, "Portrait mode"),
    (8, "Landscape mode"),
];

fn print_exposure_program(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(EXPOSURE_PROGRAM_LABELS, value, source)
}

const METERING_MODE_LABELS: &[(u32, &str)] = &[
    (0, "Unknown"),
    (1, "Average"),
    (2, "Center weighted average"),
    (3, "Spot"),
    (4, "Multi-spot"),
    (5, "Multi-segment"),
    (6, "Partial"),
    (255, "Other"),
];

fn print_metering_mode(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(METERING_MODE_LABELS, value, source)
}

const FLASH_LABELS: &[(u32, &str)] = &[
    (0x00, "No flash"),
    (0x01, "Fired"),
    (0x05, "Fired, return light not detected"),
    (0x07, "Fired, return light detected"),
    (0x09, "Yes, compulsory"),
    (0x10, "No, compulsory"),
    (0x18, "No, auto"),
    (0x19, "Yes, auto"),
    (0x20, "No flash function"),
];

fn print_flash(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(FLASH_LABELS, value, source)
}

#[cfg(test)]
mod tests {
    use super::{ExifTag, Ifd0Tag, KnownTag, TagCount, pointer_target, print_plain};
    use crate::{group::Group, primitives::TypeId, value::Value};

    /// Checks that lookup by `(group, id)` resolves across groups.
    #[test]
    fn lookup_by_group_and_id() {
        assert_eq!(
            KnownTag::try_from((Group::Ifd0, 256_u16)),
            Ok(KnownTag::Ifd0(Ifd0Tag::ImageWidth))
        );
        assert_eq!(
            KnownTag::try_from((Group::Exif, 33434_u16)),
            Ok(KnownTag::Exif(ExifTag::ExposureTime))
        );

        // same id, wrong group: not a hit
        assert_eq!(KnownTag::try_from((Group::Gps, 256_u16)), Err(()));
    }

    #[test]
    fn unknown_tags_are_not_an_error_kind() {
        // absence is just a lookup miss; nothing panics and nothing logs
        assert_eq!(KnownTag::try_from((Group::Ifd0, 0xdead_u16)), Err(()));
    }

    /// The thumbnail directory shares the primary directory's tag set.
    #[test]
    fn chained_directory_reuses_primary_tags() {
        assert_eq!(
            KnownTag::try_from((Group::Ifd1, 259_u16)),
            Ok(KnownTag::Ifd0(Ifd0Tag::Compression))
        );
    }

    #[test]
    fn pointer_tags_resolve_to_their_groups() {
        assert_eq!(pointer_target(Group::Ifd0, 34665), Some(Group::Exif));
        assert_eq!(pointer_target(Group::Ifd0, 34853), Some(Group::Gps));
        assert_eq!(pointer_target(Group::Exif, 40965), Some(Group::Interop));

        // the maker-note anchor goes through vendor dispatch instead
        assert_eq!(pointer_target(Group::Exif, super::MAKER_NOTE_TAG), None);
        assert_eq!(pointer_target(Group::Gps, 34665), None);
    }

    /// Multi-type slices are the tolerance list for pixel dimensions.
    #[test]
    fn pixel_dimensions_accept_short_or_long() {
        for tag in [ExifTag::PixelXDimension, ExifTag::PixelYDimension] {
            assert_eq!(tag.types(), &[TypeId::Short, TypeId::Long]);
        }
        assert_eq!(
            Ifd0Tag::ImageWidth.types(),
            &[TypeId::Short, TypeId::Long]
        );
    }

    #[test]
    fn count_expectations() {
        assert!(Ifd0Tag::Orientation.count().accepts(1));
        assert!(!Ifd0Tag::Orientation.count().accepts(2));
        assert!(ExifTag::MakerNote.count().accepts(12345));
        assert!(TagCount::KnownRange { lower: 2, upper: 4 }.accepts(3));
        assert!(!TagCount::KnownRange { lower: 2, upper: 4 }.accepts(5));
    }

    #[test]
    fn interpreted_printers_translate_codes() {
        let orientation = Value::Short(vec![6]);
        let printed = KnownTag::Ifd0(Ifd0Tag::Orientation).printer()(&orientation, None);
        assert_eq!(printed, "right, top");

        // unmapped codes fall back to the numeric rendering
        let odd = Value::Short(vec![42]);
        let printed = KnownTag::Ifd0(Ifd0Tag::Orientation).printer()(&odd, None);
        assert_eq!(printed, "42");
    }

    #[test]
    fn plain_printer_handles_arrays_and_ascii() {
        assert_eq!(print_plain(&Value::Short(vec![1, 2, 3]), None), "1 2 3");
        assert_eq!(print_plain(&Value::ascii("hello"), None), "hello");
    }
}
