//! # Styli
//!
//! Also called *tools* or *pens*, these are the devices the user holds to
//! interact with a tablet. A single physical pen with a tip and an eraser
//! is *two* styli, one per end; the two ends reference each other through
//! [`Stylus::paired_ids`].
//!
//! Styli are identified by a [`StylusId`]: the vendor id plus the tool id
//! the hardware reports. Vendor 0 is reserved for generic tools that any
//! vendor may report.

use std::str::FromStr;

use crate::Database;

bitflags::bitflags! {
    /// Bitflags describing all axes a stylus can sense.
    ///
    /// X and Y are implicit and always available.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
    pub struct AxisFlags: u8 {
        const TILT = 1;
        const ROTATION_Z = 2;
        const DISTANCE = 4;
        const PRESSURE = 8;
        const SLIDER = 16;
    }
}

/// What kind of tool a stylus is.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::AsRefStr,
    strum::EnumString,
)]
pub enum StylusType {
    #[default]
    Unknown,
    General,
    Inking,
    Airbrush,
    Classic,
    Marker,
    Stroke,
    /// A mouse-like puck resting on the pad.
    Puck,
    #[strum(serialize = "3D")]
    ThreeD,
    Mobile,
}

/// How an eraser end is triggered. A stylus with any eraser type *is* an
/// eraser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
pub enum EraserType {
    /// Invert the tool to erase (the classic reverse end).
    Invert,
    /// A button toggles erasing.
    Button,
    Unknown,
}

/// Composite key of a stylus: `(vendor id, tool id)`.
///
/// Vendor 0 means generic/any vendor. Tool ids are wider than 16 bits;
/// the reserved generic pen/eraser live at the top of the range.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StylusId {
    pub vendor_id: u16,
    pub tool_id: u32,
}

impl StylusId {
    /// Fallback pen assumed for tablets that don't list their styli.
    pub const GENERIC_PEN: StylusId = StylusId::new(0, 0xfffff);
    /// Fallback eraser assumed for tablets that don't list their styli.
    pub const GENERIC_ERASER: StylusId = StylusId::new(0, 0xffffe);

    #[must_use]
    pub const fn new(vendor_id: u16, tool_id: u32) -> Self {
        Self { vendor_id, tool_id }
    }
}

impl std::fmt::Display for StylusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}:{:#x}", self.vendor_id, self.tool_id)
    }
}

/// Failed to parse a [`StylusId`] from its descriptor-file spelling.
#[derive(thiserror::Error, Debug)]
#[error("invalid stylus id `{0}`")]
pub struct ParseIdError(String);

fn parse_hex<T>(s: &str) -> Option<T>
where
    T: TryFrom<u32>,
{
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let value = u32::from_str_radix(digits, 16).ok()?;
    T::try_from(value).ok()
}

impl FromStr for StylusId {
    type Err = ParseIdError;

    /// Parses `vendor:tool` hex pairs (`0x56a:0x822`) as well as bare tool
    /// ids (`0x822`), which default to vendor 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError(s.into());
        match s.split_once(':') {
            Some((vendor, tool)) => Ok(StylusId {
                vendor_id: parse_hex(vendor).ok_or_else(err)?,
                tool_id: parse_hex(tool).ok_or_else(err)?,
            }),
            None => Ok(StylusId {
                vendor_id: 0,
                tool_id: parse_hex(s).ok_or_else(err)?,
            }),
        }
    }
}

/// Description of one stylus model.
#[derive(Clone, Debug, Default)]
pub struct Stylus {
    pub id: StylusId,
    pub name: String,
    /// Group tag, resolved against tablets' `@group` references.
    pub group: Option<String>,
    /// Keys of complementary tools, typically the other end of the pen.
    pub paired_ids: Vec<StylusId>,
    pub num_buttons: u32,
    pub axes: AxisFlags,
    pub stylus_type: StylusType,
    /// Present iff this stylus is an eraser.
    pub eraser_type: Option<EraserType>,
    /// The tool has a lens with crosshairs (pucks).
    pub has_lens: bool,
    /// The tool has a scroll wheel.
    pub has_wheel: bool,
}

impl Stylus {
    #[must_use]
    pub fn is_eraser(&self) -> bool {
        self.eraser_type.is_some()
    }

    /// Resolve [`paired_ids`](Self::paired_ids) against the whole database.
    ///
    /// Ids with no entry in the store are silently omitted; pairing is a
    /// hint, not an integrity constraint.
    #[must_use]
    pub fn paired_styli<'db>(&self, db: &'db Database) -> Vec<&'db Stylus> {
        self.paired_ids
            .iter()
            .filter_map(|&id| db.stylus(id))
            .collect()
    }

    /// Whether any tool paired with this one is an eraser, i.e. the
    /// physical pen has an eraser end.
    #[must_use]
    pub fn has_eraser(&self, db: &Database) -> bool {
        self.paired_styli(db).iter().any(|s| s.is_eraser())
    }
}
