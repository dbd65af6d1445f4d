//! # Tablets
//!
//! A [`Tablet`] describes one physical tablet model as recorded in the
//! database: how to recognize it on a bus, its physical dimensions, and
//! which pad controls and [styli](crate::stylus) it carries.
//!
//! Descriptors are plain data. They are built once when a
//! [`Database`](crate::Database) is opened and never mutated afterwards;
//! everything derived from them (button flags, LED groups, stylus sets)
//! is computed on demand from the stored fields.

use smallvec::SmallVec;

use crate::matching::{BusType, MatchRule};
use crate::pad::{ButtonFlags, StatusLed};
use crate::stylus::StylusId;

bitflags::bitflags! {
    /// Where the tablet is physically integrated, if anywhere.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
    pub struct IntegrationFlags: u8 {
        /// Built into a display (e.g. a pen display or convertible screen).
        const DISPLAY = 1;
        /// Built into the system chassis (e.g. a tablet computer).
        const SYSTEM = 2;
    }
}

/// Rough product family of a tablet. Mostly of historical interest; new
/// capabilities are modeled as explicit features, not classes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
pub enum Class {
    Intuos3,
    Intuos4,
    Intuos5,
    Cintiq,
    Bamboo,
    Graphire,
    Intuos,
    Intuos2,
    #[strum(serialize = "ISDV4")]
    Isdv4,
    PenDisplay,
    Remote,
    /// The reserved fallback descriptor's class.
    Generic,
    #[default]
    Unknown,
}

/// One entry of a tablet's supported-styli list: either a concrete stylus
/// or a named group of styli (`@group` in descriptor files).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StylusRef {
    Id(StylusId),
    Group(String),
}

/// See [module level docs](crate::tablet) for details.
#[derive(Clone, Debug, Default)]
pub struct Tablet {
    /// Display name of the model.
    pub name: String,
    /// Vendor's model number, when distinct from the name.
    pub model_name: Option<String>,
    /// SVG file depicting the button layout, as named by the descriptor.
    pub layout: Option<std::path::PathBuf>,
    /// Every identity this model is reachable through. Empty only for the
    /// reserved generic descriptor.
    pub matches: SmallVec<[MatchRule; 2]>,
    /// The identity of the companion device (e.g. the touch sensor paired
    /// with a pad), if the model declares one.
    pub paired: Option<MatchRule>,
    /// Physical width/height of the active area, in inches.
    pub width: u32,
    pub height: u32,
    pub class: Class,
    pub integration: IntegrationFlags,
    /// Can be used upside down (buttons left or right of the active area).
    pub reversible: bool,
    pub has_stylus: bool,
    pub has_touch: bool,
    /// Hardware switch to disable touch.
    pub has_touchswitch: bool,
    /// Per-button capability flags, indexed by button letter (`'A'` is 0).
    /// The length is the button count.
    pub buttons: Vec<ButtonFlags>,
    pub num_keys: u32,
    pub num_rings: u32,
    pub num_strips: u32,
    pub num_dials: u32,
    /// Modes each mode-switchable feature cycles through.
    pub ring_num_modes: u32,
    pub ring2_num_modes: u32,
    pub strips_num_modes: u32,
    pub dials_num_modes: u32,
    /// Status-LED groups, in declaration order, deduplicated.
    pub status_leds: SmallVec<[StatusLed; 2]>,
    /// Supported styli, as declared: literal ids and group references.
    pub styli: Vec<StylusRef>,
}

impl Tablet {
    /// Number of pad buttons on this model.
    #[must_use]
    pub fn num_buttons(&self) -> usize {
        self.buttons.len()
    }

    /// Whether this is the reserved generic fallback descriptor.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.matches.first().is_some_and(MatchRule::is_generic)
    }
}

/// A [`Tablet`] as selected for a concrete query: the descriptor plus the
/// specific [`MatchRule`] that satisfied the lookup.
///
/// The distinction matters for models reachable through several
/// identities - bus, ids, and the paired device are all reported relative
/// to the rule that actually won.
#[derive(Clone, Debug)]
pub struct ResolvedTablet {
    pub(crate) tablet: Tablet,
    pub(crate) matched: MatchRule,
}

impl ResolvedTablet {
    /// The rule the query was satisfied by.
    #[must_use]
    pub fn matched(&self) -> &MatchRule {
        &self.matched
    }

    #[must_use]
    pub fn bustype(&self) -> BusType {
        self.matched.bus
    }

    #[must_use]
    pub fn vendor_id(&self) -> u16 {
        self.matched.vendor_id
    }

    #[must_use]
    pub fn product_id(&self) -> u16 {
        self.matched.product_id
    }

    /// Consume self, keeping only the descriptor.
    #[must_use]
    pub fn into_tablet(self) -> Tablet {
        self.tablet
    }

    /// Shorthand for [`Database::styli_for`](crate::Database::styli_for).
    #[must_use]
    pub fn styli<'db>(&self, db: &'db crate::Database) -> Vec<&'db crate::stylus::Stylus> {
        db.styli_for(self)
    }
}

impl std::ops::Deref for ResolvedTablet {
    type Target = Tablet;
    fn deref(&self) -> &Tablet {
        &self.tablet
    }
}
