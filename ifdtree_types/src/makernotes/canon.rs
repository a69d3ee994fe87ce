//! The Canon maker-note strategy: tag table.
//!
//! Canon notes carry no signature - the block starts directly with an
//! ordinary directory whose offsets count from the host container's base.
//!
//! The interesting wrinkle is the array tags: `CameraSettings` and
//! `ShotInfo` are single logical arrays of shorts. A directory may name
//! each at most once, and their elements must really be shorts; the codec
//! enforces both.

use crate::{
    group::Group,
    primitives::TypeId,
    tags::{TagCount, make_tag_list_for_group},
};

use {TagCount as Tc, TypeId as Ty};

make_tag_list_for_group!(enum CanonTag => Group::CanonMn,
    CameraSettings = 0x0001 => {
        name: "Various camera settings",
        types: &[Ty::Short],
        count: Tc::Any,
    },
    FocalLength = 0x0002 => {
        name: "Focal length",
        types: &[Ty::Short],
        count: Tc::Known(4),
    },
    ShotInfo = 0x0004 => {
        name: "Shot information",
        types: &[Ty::Short],
        count: Tc::Any,
    },
    ImageType = 0x0006 => {
        name: "Image type",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    FirmwareVersion = 0x0007 => {
        name: "Firmware version",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    FileNumber = 0x0008 => {
        name: "File number",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
    OwnerName = 0x0009 => {
        name: "Owner name",
        types: &[Ty::Ascii],
        count: Tc::Any,
    },
    ModelId = 0x0010 => {
        name: "Model identification",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
);

/// The element type required for Canon's logical-array tags.
pub fn array_element_type(tag_id: u16) -> Option<TypeId> {
    match CanonTag::try_from(tag_id) {
        Ok(CanonTag::CameraSettings) | Ok(CanonTag::ShotInfo) => Some(TypeId::Short),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{CanonTag, array_element_type};
    use crate::primitives::TypeId;

    #[test]
    fn array_tags_demand_shorts() {
        assert_eq!(array_element_type(0x0001), Some(TypeId::Short));
        assert_eq!(array_element_type(0x0004), Some(TypeId::Short));

        // ordinary tags aren't arrays
        assert_eq!(array_element_type(0x0006), None);
        assert_eq!(array_element_type(0xbeef), None);
    }

    #[test]
    fn table_resolves_ids() {
        assert_eq!(CanonTag::try_from(0x0008), Ok(CanonTag::FileNumber));
        assert_eq!(CanonTag::FileNumber.tag_name(), "File number");
    }
}
