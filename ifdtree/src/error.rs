use ifdtree_types::{group::Group, primitives::TypeId, value::ValueError};

/// This type describes a codec operation's result.
///
/// Decode and encode fail fast: a bounds or arithmetic violation aborts
/// the subtree being processed and surfaces here with a specific kind.
/// Tolerable anomalies (unknown tags, vendor type mismatches, unparsed
/// maker notes) never show up as an `Err` - they're logged through the
/// diagnostics sink and processing continues.
pub type Result<T> = core::result::Result<T, Error>;

/// The closed set of codec failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// A computed offset or length would read or write past the buffer.
    OffsetOutOfRange { offset: u64, size: u64, len: u64 },

    /// A data-area value is too large for its target field width.
    DataAreaValueTooLarge { size: u64, max: u64 },

    /// The directory's declared extent exceeds the buffer holding it.
    TiffDirectoryTooLarge { need: u64, avail: u64 },

    /// The directory's entry count, or the tree's nesting, exceeds the
    /// sanity bound. Rejects pathological and cyclic offset chains.
    TooManyDirectoryEntries { count: u32, limit: u32 },

    /// Two entries in one directory name the same logical-array tag.
    MultipleTiffArrayElementTagsInDirectory { group: Group, tag: u16 },

    /// A logical-array entry uses the wrong element type.
    WrongTiffArrayElementTagType {
        group: Group,
        tag: u16,
        expected: TypeId,
        got: TypeId,
    },

    /// The entry's type id isn't one of the defined primitive kinds.
    InvalidTypeValue { got: u16 },

    /// A tag that must carry specific content (e.g. a sub-directory
    /// pointer) carried something unusable.
    InvalidTag { group: Group, tag: u16 },

    /// The group can't act as a decode root.
    InvalidIfdId { group: Group },

    /// An offset or size computation left the representable range.
    ArithmeticOverflow,

    /// Access to a value element at or past its count.
    ValueNotSet { index: u32, count: u32 },

    /// Structural inconsistency not classifiable above.
    CorruptedMetadata,

    /// A requested allocation size is invalid for the data backing it.
    InvalidMalloc { size: u64 },

    /// A requested allocation size can't be satisfied.
    MallocFailed { size: u64 },
}

impl From<ValueError> for Error {
    fn from(value: ValueError) -> Self {
        match value {
            ValueError::NotSet { index, count } => Error::ValueNotSet { index, count },
            ValueError::Overflow => Error::ArithmeticOverflow,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::OffsetOutOfRange { offset, size, len } => write!(
                f,
                "Offset out of range: `{size}` bytes at `{offset}` in a `{len}`-byte buffer."
            ),
            Error::DataAreaValueTooLarge { size, max } => write!(
                f,
                "Data area value too large: `{size}` bytes exceed the `{max}`-byte field."
            ),
            Error::TiffDirectoryTooLarge { need, avail } => write!(
                f,
                "Directory too large: needs `{need}` bytes, but only `{avail}` remain."
            ),
            Error::TooManyDirectoryEntries { count, limit } => write!(
                f,
                "Too many directory entries or nesting levels: `{count}` (limit `{limit}`)."
            ),
            Error::MultipleTiffArrayElementTagsInDirectory { group, tag } => write!(
                f,
                "Multiple array element tags `{tag}` in one `{group}` directory."
            ),
            Error::WrongTiffArrayElementTagType {
                group,
                tag,
                expected,
                got,
            } => write!(
                f,
                "Wrong array element type on `{group}` tag `{tag}`: \
                expected `{expected:?}`, got `{got:?}`."
            ),
            Error::InvalidTypeValue { got } => {
                write!(f, "Invalid type id: `{got}` names no primitive kind.")
            }
            Error::InvalidTag { group, tag } => {
                write!(f, "Invalid content on `{group}` tag `{tag}`.")
            }
            Error::InvalidIfdId { group } => {
                write!(f, "Group `{group}` can't be used as a decode root.")
            }
            Error::ArithmeticOverflow => {
                f.write_str("An offset or size computation would overflow.")
            }
            Error::ValueNotSet { index, count } => write!(
                f,
                "No value element is set at index `{index}` - the value only has `{count}`."
            ),
            Error::CorruptedMetadata => f.write_str("The metadata is structurally corrupted."),
            Error::InvalidMalloc { size } => {
                write!(f, "Invalid allocation request of `{size}` bytes.")
            }
            Error::MallocFailed { size } => {
                write!(f, "Allocation of `{size}` bytes can't be satisfied.")
            }
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::Error;
    use ifdtree_types::value::ValueError;

    #[test]
    fn value_errors_map_onto_the_taxonomy() {
        assert_eq!(
            Error::from(ValueError::NotSet { index: 3, count: 1 }),
            Error::ValueNotSet { index: 3, count: 1 }
        );
        assert_eq!(Error::from(ValueError::Overflow), Error::ArithmeticOverflow);
    }

    #[test]
    fn displays_carry_their_numbers() {
        let e = Error::OffsetOutOfRange {
            offset: 100,
            size: 8,
            len: 50,
        };
        let rendered = e.to_string();
        assert!(rendered.contains("100") && rendered.contains("50"));
    }
}
