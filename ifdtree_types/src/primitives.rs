/// An enumeration of the primitive kinds a directory entry may store.
///
/// The discriminants are the on-disk type ids from TIFF rev. 6.0. A type
/// id of `0` does not exist, so every variant has a nonzero width.
#[repr(u16)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum TypeId {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
}

impl TypeId {
    /// Grabs the primitive type's element width in bytes.
    ///
    /// ```
    /// use ifdtree_types::primitives::TypeId;
    ///
    /// let slong: TypeId = TypeId::SLong;
    /// assert_eq!(slong.size_bytes(), 4_u8);
    /// ```
    pub const fn size_bytes(&self) -> u8 {
        match self {
            TypeId::Byte | TypeId::Ascii | TypeId::SByte | TypeId::Undefined => 1_u8,
            TypeId::Short | TypeId::SShort => 2_u8,
            TypeId::Long | TypeId::SLong => 4_u8,
            TypeId::Rational | TypeId::SRational => 8_u8,
        }
    }
}

impl TryFrom<u16> for TypeId {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Ascii),
            3 => Ok(Self::Short),
            4 => Ok(Self::Long),
            5 => Ok(Self::Rational),
            6 => Ok(Self::SByte),
            7 => Ok(Self::Undefined),
            8 => Ok(Self::SShort),
            9 => Ok(Self::SLong),
            10 => Ok(Self::SRational),

            _ => Err(()),
        }
    }
}

/// Each tagged-directory blob starts with a byte order marker - its
/// endianness.
///
/// It's either `II` (Intel, for little-endian) or `MM` (Motorola, for
/// big-endian).
///
/// Keeping this info around is vital for correct parsing and maintaining the
/// many proprietary blocks.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum ByteOrder {
    /// `II` for Intel, little-endian.
    Little,

    /// `MM` for Motorola. Big-endian.
    Big,
}

impl ByteOrder {
    /// Encodes a `u16` in this byte order.
    pub const fn u16_bytes(self, v: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }

    /// Encodes a `u32` in this byte order.
    pub const fn u32_bytes(self, v: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }

    /// Encodes an `i16` in this byte order.
    pub const fn i16_bytes(self, v: i16) -> [u8; 2] {
        self.u16_bytes(v as u16)
    }

    /// Encodes an `i32` in this byte order.
    pub const fn i32_bytes(self, v: i32) -> [u8; 4] {
        self.u32_bytes(v as u32)
    }
}

/// A fraction that can't be negative.
///
/// Both the numerator (top number) and denominator (bottom number) are always
/// positive numbers.
#[repr(C)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

/// A signed fraction.
///
/// Both the numerator (top number) and denominator (bottom number) can be
/// negative.
#[repr(C)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct SRational {
    pub numerator: i32,
    pub denominator: i32,
}

#[cfg(test)]
mod tests {
    use super::{ByteOrder, TypeId};

    /// Every known type id should survive the `u16` round trip.
    #[test]
    fn type_ids_round_trip() {
        for raw in 1_u16..=10_u16 {
            let ty = TypeId::try_from(raw).expect("ids 1..=10 are all defined");
            assert_eq!(ty as u16, raw);
        }
    }

    /// Zero and out-of-range ids aren't types.
    #[test]
    fn unknown_type_ids_are_rejected() {
        assert_eq!(TypeId::try_from(0_u16), Err(()));
        assert_eq!(TypeId::try_from(11_u16), Err(()));
        assert_eq!(TypeId::try_from(u16::MAX), Err(()));
    }

    #[test]
    fn widths_are_nonzero() {
        for raw in 1_u16..=10_u16 {
            let ty = TypeId::try_from(raw).unwrap();
            assert!(ty.size_bytes() > 0, "{ty:?} must have a nonzero width");
        }
    }

    #[test]
    fn byte_order_encodes_both_ways() {
        assert_eq!(ByteOrder::Little.u16_bytes(0x0102), [0x02, 0x01]);
        assert_eq!(ByteOrder::Big.u16_bytes(0x0102), [0x01, 0x02]);
        assert_eq!(ByteOrder::Little.u32_bytes(0x01020304), [4, 3, 2, 1]);
        assert_eq!(ByteOrder::Big.u32_bytes(0x01020304), [1, 2, 3, 4]);
    }
}
