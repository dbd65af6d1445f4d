//! # Device matching
//!
//! A tablet model is reachable through one or more [`MatchRule`]s - one per
//! bus/id combination the hardware reports. A rule may additionally pin the
//! kernel device name and/or the `uniq` string (a free-form per-unit
//! identifier, used by vendors that ship many models under one usb id).
//!
//! Resolution ranks every eligible rule by how many of those extra fields it
//! matched, so a unit-specific rule always beats a bare id rule.

use crate::builder::Query;
use crate::tablet::Tablet;

/// The bus a tablet is connected over.
///
/// `Unknown` is never stored in a rule (except the reserved generic one);
/// in a [`Query`](crate::builder::Query) it acts as a wildcard over all
/// concrete buses.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    PartialEq,
    Eq,
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BusType {
    Usb,
    Bluetooth,
    I2c,
    Serial,
    #[default]
    Unknown,
}

impl BusType {
    /// The concrete buses a wildcard query tries, in order.
    pub(crate) const CONCRETE: [BusType; 4] = [
        BusType::Usb,
        BusType::Bluetooth,
        BusType::I2c,
        BusType::Serial,
    ];
}

/// One alternative identity for a tablet model.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct MatchRule {
    pub bus: BusType,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Kernel device name this rule is constrained to, if any.
    pub name: Option<String>,
    /// Per-unit `uniq` string this rule is constrained to, if any.
    pub uniq: Option<String>,
}

impl MatchRule {
    #[must_use]
    pub fn new(bus: BusType, vendor_id: u16, product_id: u16) -> Self {
        Self {
            bus,
            vendor_id,
            product_id,
            name: None,
            uniq: None,
        }
    }

    /// The reserved rule of the generic fallback tablet. Since `(0,0)` ids
    /// never match a query, this rule is unreachable by normal resolution.
    #[must_use]
    pub fn generic() -> Self {
        Self::new(BusType::Unknown, 0, 0)
    }

    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.bus == BusType::Unknown && self.vendor_id == 0 && self.product_id == 0
    }

    /// Canonical string form, `bus|vvvv|pppp[|name[|uniq]]`, or `generic`.
    /// Used as the record identity for merge/shadowing.
    #[must_use]
    pub fn match_string(&self) -> String {
        if self.is_generic() {
            return "generic".into();
        }
        let mut s = format!(
            "{}|{:04x}|{:04x}",
            self.bus.as_ref(),
            self.vendor_id,
            self.product_id
        );
        if self.name.is_some() || self.uniq.is_some() {
            s.push('|');
            s.push_str(self.name.as_deref().unwrap_or(""));
        }
        if let Some(uniq) = &self.uniq {
            s.push('|');
            s.push_str(uniq);
        }
        s
    }

    /// Eligibility of this rule for `query` on the given bus, ranked by
    /// specificity. `None` means ineligible. Higher ranks win:
    /// name+uniq (3) > uniq (2) > name (1) > bare id (0).
    ///
    /// A rule constraining both fields is all-or-nothing: a query matching
    /// only one of them is rejected outright, it gets no partial credit.
    pub(crate) fn rank(&self, query: &Query, bus: BusType) -> Option<u8> {
        // (0,0) is reserved-invalid and never matches.
        if self.vendor_id == 0 && self.product_id == 0 {
            return None;
        }
        if self.bus != bus
            || self.vendor_id != query.vendor_id()
            || self.product_id != query.product_id()
        {
            return None;
        }
        match (self.name.as_deref(), self.uniq.as_deref()) {
            (Some(name), Some(uniq)) => {
                (query.match_name() == Some(name) && query.uniq() == Some(uniq)).then_some(3)
            }
            (None, Some(uniq)) => (query.uniq() == Some(uniq)).then_some(2),
            (Some(name), None) => (query.match_name() == Some(name)).then_some(1),
            (None, None) => Some(0),
        }
    }
}

impl std::fmt::Display for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.match_string())
    }
}

/// Scan all tablets for the best-ranked eligible rule.
///
/// Returns indices `(tablet, rule)`. A wildcard-bus query tries each
/// concrete bus in [`BusType::CONCRETE`] order; the first bus with any
/// eligible rule wins. Ties at equal rank go to the first tablet in load
/// order.
pub(crate) fn resolve(tablets: &[Tablet], query: &Query) -> Option<(usize, usize)> {
    let concrete = [query.bus()];
    let buses: &[BusType] = if query.bus() == BusType::Unknown {
        &BusType::CONCRETE
    } else {
        &concrete
    };

    for &bus in buses {
        let mut best: Option<(u8, usize, usize)> = None;
        for (tablet_idx, tablet) in tablets.iter().enumerate() {
            for (rule_idx, rule) in tablet.matches.iter().enumerate() {
                let Some(rank) = rule.rank(query, bus) else {
                    continue;
                };
                // Strictly greater, so the first tablet in load order keeps
                // an equal-rank tie.
                if best.map_or(true, |(b, _, _)| rank > b) {
                    best = Some((rank, tablet_idx, rule_idx));
                }
            }
        }
        if let Some((_, tablet_idx, rule_idx)) = best {
            return Some((tablet_idx, rule_idx));
        }
    }
    None
}
