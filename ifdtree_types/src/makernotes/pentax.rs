//! The Pentax maker-note strategy: tag table and print functions.
//!
//! Pentax notes open with an `AOC\0` signature and store their offsets
//! relative to the host container's base, so the strategy in
//! [`super::STRATEGIES`] skips six bytes and keeps the TIFF base.
//!
//! Most of the interesting tags here are coded integers, translated
//! through reference tables. `LensType` is a "combi" tag - two byte
//! components concatenated into one lookup code, with up to two trailing
//! elements ignored.

use std::sync::LazyLock;

use super::{CodeLabels, code_labels, print_combi_tag};
use crate::{
    group::Group,
    primitives::TypeId,
    tags::{FieldSource, PrintFn, TagCount, make_tag_list_for_group, print_lookup, print_plain},
    value::Value,
};

use {TagCount as Tc, TypeId as Ty};

make_tag_list_for_group!(enum PentaxTag => Group::PentaxMn,
    Version = 0x0000 => {
        name: "Pentax Makernote version",
        types: &[Ty::Byte],
        count: Tc::Known(4),
    },
    Mode = 0x0001 => {
        name: "Capture mode",
        types: &[Ty::Short],
        count: Tc::KnownRange { lower: 1, upper: 2 },
    },
    PreviewResolution = 0x0002 => {
        name: "Resolution of a preview image",
        types: &[Ty::Short],
        count: Tc::Known(2),
    },
    ModelId = 0x0005 => {
        name: "Pentax model identification",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
    Date = 0x0006 => {
        name: "Date",
        types: &[Ty::Undefined],
        count: Tc::Known(4),
    },
    Time = 0x0007 => {
        name: "Time",
        types: &[Ty::Undefined],
        count: Tc::Known(3),
    },
    Quality = 0x0008 => {
        name: "Image quality",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    FlashMode = 0x000c => {
        name: "Flash mode",
        types: &[Ty::Short],
        count: Tc::KnownRange { lower: 1, upper: 2 },
    },
    FocusMode = 0x000d => {
        name: "Focus mode",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    ExposureTime = 0x0012 => {
        name: "Exposure time",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
    FNumber = 0x0013 => {
        name: "F-Number",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
    Iso = 0x0014 => {
        name: "ISO sensitivity",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    WhiteBalance = 0x0019 => {
        name: "White balance",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    FocalLength = 0x001d => {
        name: "Focal length",
        types: &[Ty::Long],
        count: Tc::Known(1),
    },
    LensType = 0x003f => {
        name: "Lens type",
        types: &[Ty::Byte],
        count: Tc::KnownRange { lower: 2, upper: 4 },
    },
    Temperature = 0x0047 => {
        name: "Camera temperature",
        types: &[Ty::SByte],
        count: Tc::Known(1),
    },
    ShakeReduction = 0x005c => {
        name: "Shake reduction information",
        types: &[Ty::Short],
        count: Tc::Known(1),
    },
    ShutterCount = 0x005d => {
        name: "Shutter count",
        types: &[Ty::Undefined],
        count: Tc::Known(4),
    },
);

impl PentaxTag {
    /// Returns this tag's print function.
    pub fn printer(&self) -> PrintFn {
        match self {
            PentaxTag::Version => print_version,
            PentaxTag::PreviewResolution => print_resolution,
            PentaxTag::ModelId => print_model_id,
            PentaxTag::Date => print_date,
            PentaxTag::Time => print_time,
            PentaxTag::Quality => print_quality,
            PentaxTag::FlashMode => print_flash_mode,
            PentaxTag::FocusMode => print_focus_mode,
            PentaxTag::ExposureTime => print_exposure,
            PentaxTag::FNumber => print_f_value,
            PentaxTag::Iso => print_iso,
            PentaxTag::WhiteBalance => print_white_balance,
            PentaxTag::FocalLength => print_focal_length,
            PentaxTag::LensType => print_lens_type,
            PentaxTag::Temperature => print_temperature,
            PentaxTag::ShakeReduction => print_shake_reduction,
            PentaxTag::ShutterCount => print_shutter_count,
            PentaxTag::Mode => print_plain,
        }
    }
}

/*
 *
 *
 *  reference tables
 *
 *
 */

const MODEL_LABELS: &[(u32, &str)] = &[
    (0x12aa2, "*ist D"),
    (0x12b1a, "*ist DS"),
    (0x12b60, "*ist DS2"),
    (0x12b9c, "K100D"),
    (0x12b9d, "K110D"),
    (0x12db8, "K10D"),
    (0x12e6c, "K20D"),
    (0x12f52, "K2000"),
    (0x12fc0, "K-7"),
    (0x1301a, "K-x"),
    (0x13092, "K-r"),
    (0x130f4, "K-5"),
    (0x13222, "K-01"),
    (0x1322c, "K-30"),
    (0x13240, "K-5 II"),
    (0x13254, "K-3"),
    (0x13290, "K-S1"),
    (0x132b6, "K-1"),
    (0x132d6, "KP"),
    (0x13320, "K-3 Mark III"),
];

const QUALITY_LABELS: &[(u32, &str)] = &[
    (0, "Good"),
    (1, "Better"),
    (2, "Best"),
    (3, "TIFF"),
    (4, "RAW"),
    (5, "Premium"),
    (7, "RAW+JPEG"),
];

const FLASH_MODE_LABELS: &[(u32, &str)] = &[
    (0x000, "Auto, Did not fire"),
    (0x001, "Off, Did not fire"),
    (0x003, "Auto, Did not fire, Red-eye reduction"),
    (0x100, "Auto, Fired"),
    (0x102, "On, Fired"),
    (0x103, "Auto, Fired, Red-eye reduction"),
    (0x106, "On, Wireless"),
];

const FOCUS_MODE_LABELS: &[(u32, &str)] = &[
    (0, "Normal"),
    (1, "Macro"),
    (2, "Infinity"),
    (3, "Manual"),
    (4, "Super Macro"),
    (5, "Pan focus"),
    (16, "AF-S"),
    (17, "AF-C"),
    (18, "AF-A"),
];

const ISO_LABELS: &[(u32, &str)] = &[
    (3, "50"),
    (4, "64"),
    (5, "80"),
    (6, "100"),
    (7, "125"),
    (8, "160"),
    (9, "200"),
    (10, "250"),
    (11, "320"),
    (12, "400"),
    (13, "500"),
    (14, "640"),
    (15, "800"),
    (16, "1000"),
    (17, "1250"),
    (18, "1600"),
    (19, "2000"),
    (20, "2500"),
    (21, "3200"),
    (50, "6400"),
    (51, "12800"),
    (52, "25600"),
];

const WHITE_BALANCE_LABELS: &[(u32, &str)] = &[
    (0, "Auto"),
    (1, "Daylight"),
    (2, "Shade"),
    (3, "Fluorescent"),
    (4, "Tungsten"),
    (5, "Manual"),
    (6, "Daylight fluorescent"),
    (7, "Day white fluorescent"),
    (8, "White fluorescent"),
    (9, "Flash"),
    (10, "Cloudy"),
];

const SHAKE_REDUCTION_LABELS: &[(u32, &str)] = &[
    (0, "Off"),
    (1, "On"),
    (4, "Off (AA simulation off)"),
    (5, "On but disabled"),
    (6, "On (video)"),
    (7, "On (AA simulation off)"),
];

/// Lens codes: first component is the mount generation, second the lens id.
///
/// This is the large table, so it lives in a hash map rather than a linear
/// slice.
static LENS_TYPE_LABELS: LazyLock<CodeLabels> = LazyLock::new(|| {
    code_labels(&[
        (0x0000, "M-42 or No Lens"),
        (0x0100, "K or M Lens"),
        (0x0200, "A Series Lens"),
        (0x0311, "smc PENTAX-FA SOFT 85mm F2.8"),
        (0x0317, "smc PENTAX-FA 28-105mm F4-5.6"),
        (0x0401, "smc PENTAX-FA SOFT 28mm F2.8"),
        (0x040c, "smc PENTAX-FA 50mm F1.4"),
        (0x0414, "smc PENTAX-FA 28-70mm F4 AL"),
        (0x0431, "smc PENTAX-FA 43mm F1.9 Limited"),
        (0x0453, "smc PENTAX-FA 77mm F1.8 Limited"),
        (0x04fa, "smc PENTAX-DA 50-200mm F4-5.6 ED"),
        (0x04fc, "smc PENTAX-DA 18-55mm F3.5-5.6 AL"),
        (0x0614, "smc PENTAX-FA* 28-70mm F2.8 AL"),
        (0x070c, "smc PENTAX-DA 70mm F2.4 Limited"),
        (0x070d, "smc PENTAX-DA 21mm F3.2 AL Limited"),
        (0x07e5, "smc PENTAX-DA 14mm F2.8 ED[IF]"),
        (0x07f7, "smc PENTAX-DA 16-45mm F4 ED AL"),
        (0x0800, "Sigma Lens"),
        (0x08d2, "smc PENTAX-DA* 55mm F1.4 SDM"),
        (0x08e2, "smc PENTAX-DA* 16-50mm F2.8 ED AL[IF] SDM"),
        (0x08ff, "HD PENTAX-DA 20-40mm F2.8-4 ED Limited DC WR"),
    ])
});

/*
 *
 *
 *  print functions
 *
 *
 */

/// Packs the first `n` byte-sized elements into one integer, MSB first.
fn pack_bytes(value: &Value, n: u32) -> Option<u32> {
    if value.count() < n {
        return None;
    }

    let mut packed: u32 = 0;
    for i in 0..n {
        let element = value.to_i64(i).ok()?;
        if !(0..=255).contains(&element) {
            return None;
        }
        packed = (packed << 8) | element as u32;
    }
    Some(packed)
}

/// "3 1 0 0" on disk means firmware 3.10.
fn print_version(value: &Value, source: Option<&dyn FieldSource>) -> String {
    let mut parts = Vec::with_capacity(value.count() as usize);
    for i in 0..value.count() {
        match value.to_i64(i) {
            Ok(n) => parts.push(n.to_string()),
            Err(_) => return print_plain(value, source),
        }
    }
    parts.join(".")
}

fn print_resolution(value: &Value, source: Option<&dyn FieldSource>) -> String {
    match (value.to_i64(0), value.to_i64(1)) {
        (Ok(w), Ok(h)) => format!("{w}x{h}"),
        _ => print_plain(value, source),
    }
}

fn print_model_id(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(MODEL_LABELS, value, source)
}

/// The date tag stores a big-endian year followed by month and day bytes.
fn print_date(value: &Value, source: Option<&dyn FieldSource>) -> String {
    let (Some(packed), Ok(month), Ok(day)) =
        (pack_bytes(value, 2), value.to_i64(2), value.to_i64(3))
    else {
        return print_plain(value, source);
    };
    format!("{packed:04}:{month:02}:{day:02}")
}

fn print_time(value: &Value, source: Option<&dyn FieldSource>) -> String {
    match (value.to_i64(0), value.to_i64(1), value.to_i64(2)) {
        (Ok(h), Ok(m), Ok(s)) => format!("{h:02}:{m:02}:{s:02}"),
        _ => print_plain(value, source),
    }
}

fn print_quality(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(QUALITY_LABELS, value, source)
}

fn print_flash_mode(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(FLASH_MODE_LABELS, value, source)
}

fn print_focus_mode(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(FOCUS_MODE_LABELS, value, source)
}

/// Stored in units of 1/100000 s.
fn print_exposure(value: &Value, source: Option<&dyn FieldSource>) -> String {
    match value.to_i64(0) {
        Ok(n) => format!("{} s", n as f64 / 100_000.0),
        Err(_) => print_plain(value, source),
    }
}

/// Stored in tenths.
fn print_f_value(value: &Value, source: Option<&dyn FieldSource>) -> String {
    match value.to_i64(0) {
        Ok(n) => format!("F{}", n as f64 / 10.0),
        Err(_) => print_plain(value, source),
    }
}

fn print_iso(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(ISO_LABELS, value, source)
}

fn print_white_balance(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(WHITE_BALANCE_LABELS, value, source)
}

/// Stored in units of 1/100 mm.
fn print_focal_length(value: &Value, source: Option<&dyn FieldSource>) -> String {
    match value.to_i64(0) {
        Ok(n) => format!("{} mm", n as f64 / 100.0),
        Err(_) => print_plain(value, source),
    }
}

fn print_lens_type(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_combi_tag(&LENS_TYPE_LABELS, 2, (1, 2), value, source)
}

fn print_temperature(value: &Value, source: Option<&dyn FieldSource>) -> String {
    match value.to_i64(0) {
        Ok(n) => format!("{n} C"),
        Err(_) => print_plain(value, source),
    }
}

fn print_shake_reduction(value: &Value, source: Option<&dyn FieldSource>) -> String {
    print_lookup(SHAKE_REDUCTION_LABELS, value, source)
}

/// The shutter count is stored obfuscated against the sibling date and
/// time tags. Without those we can only show the raw bytes.
fn print_shutter_count(value: &Value, source: Option<&dyn FieldSource>) -> String {
    let Some(encrypted) = pack_bytes(value, 4) else {
        return print_plain(value, source);
    };

    let decrypted = source.and_then(|src| {
        let date = pack_bytes(src.value_of(Group::PentaxMn, PentaxTag::Date.tag_id())?, 4)?;
        let time = pack_bytes(src.value_of(Group::PentaxMn, PentaxTag::Time.tag_id())?, 3)?;
        Some(encrypted ^ date ^ !time)
    });

    match decrypted {
        Some(count) => count.to_string(),
        None => print_plain(value, source),
    }
}

#[cfg(test)]
mod tests {
    use super::PentaxTag;
    use crate::{
        group::Group,
        tags::FieldSource,
        value::Value,
    };

    #[test]
    fn version_joins_components() {
        let printed = PentaxTag::Version.printer()(&Value::Byte(vec![3, 1, 0, 0]), None);
        assert_eq!(printed, "3.1.0.0");
    }

    #[test]
    fn date_and_time_render_like_timestamps() {
        // 2021 = 0x07e5, stored year-hi year-lo month day
        let date = Value::Undefined(vec![0x07, 0xe5, 8, 5]);
        assert_eq!(PentaxTag::Date.printer()(&date, None), "2021:08:05");

        let time = Value::Undefined(vec![13, 7, 42]);
        assert_eq!(PentaxTag::Time.printer()(&time, None), "13:07:42");
    }

    #[test]
    fn lens_type_is_a_combi_lookup() {
        let lens = Value::Byte(vec![0x04, 0x0c]);
        assert_eq!(
            PentaxTag::LensType.printer()(&lens, None),
            "smc PENTAX-FA 50mm F1.4"
        );

        let unknown = Value::Byte(vec![0xaa, 0xbb]);
        assert_eq!(
            PentaxTag::LensType.printer()(&unknown, None),
            "Unknown (0xaabb)"
        );
    }

    #[test]
    fn exposure_scales_to_seconds() {
        let v = Value::Long(vec![400]);
        assert_eq!(PentaxTag::ExposureTime.printer()(&v, None), "0.004 s");
    }

    /// Cross-referencing context: the date/time tags de-obfuscate the
    /// shutter count.
    #[test]
    fn shutter_count_uses_sibling_tags() {
        struct Ctx {
            date: Value,
            time: Value,
        }

        impl FieldSource for Ctx {
            fn value_of(&self, group: Group, tag: u16) -> Option<&Value> {
                match (group, tag) {
                    (Group::PentaxMn, 0x0006) => Some(&self.date),
                    (Group::PentaxMn, 0x0007) => Some(&self.time),
                    _ => None,
                }
            }
        }

        let ctx = Ctx {
            date: Value::Undefined(vec![0x07, 0xe5, 8, 5]),
            time: Value::Undefined(vec![13, 7, 42]),
        };

        let count: u32 = 12345;
        let date: u32 = 0x07e5_0805;
        let time: u32 = 0x000d_072a;
        let encrypted = count ^ date ^ !time;

        let stored = Value::Undefined(encrypted.to_be_bytes().to_vec());
        assert_eq!(
            PentaxTag::ShutterCount.printer()(&stored, Some(&ctx)),
            "12345"
        );

        // without context, the raw bytes show through
        let raw = PentaxTag::ShutterCount.printer()(&stored, None);
        assert_ne!(raw, "12345");
    }
}
