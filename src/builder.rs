//! Builder-style construction of database queries.
//!
//! For a plain usb device, `Builder::new().usbid(vid, pid).build()` is all
//! you need. Partially-built queries are valid - a query with no usbid set
//! simply matches nothing but the generic fallback.

use crate::matching::BusType;

/// What to do when a query matches no descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fallback {
    /// Resolution yields no device. A miss is a normal negative result,
    /// not an error.
    #[default]
    None,
    /// Resolution yields the reserved generic descriptor, with zeroed
    /// identity and the query's device name, if any.
    Generic,
}

/// The raw identifying signals of a device, assembled incrementally via
/// [`Builder`] and handed to [`Database::resolve`](crate::Database::resolve).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    bus: BusType,
    vendor_id: u16,
    product_id: u16,
    uniq: Option<String>,
    match_name: Option<String>,
    device_name: Option<String>,
    fallback: Fallback,
}

impl Query {
    #[must_use]
    pub fn builder() -> Builder {
        Builder::new()
    }

    #[must_use]
    pub fn bus(&self) -> BusType {
        self.bus
    }

    #[must_use]
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    #[must_use]
    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// The `uniq` string reported by the device, if any.
    #[must_use]
    pub fn uniq(&self) -> Option<&str> {
        self.uniq.as_deref()
    }

    /// The kernel device name to match rules against, if any.
    #[must_use]
    pub fn match_name(&self) -> Option<&str> {
        self.match_name.as_deref()
    }

    /// The display-name override applied to a generic fallback result.
    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    #[must_use]
    pub fn fallback(&self) -> Fallback {
        self.fallback
    }
}

/// Incremental [`Query`] construction.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    query: Query,
}

/// # Configuration
impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain the query to one bus. Leaving this unset (or setting
    /// [`BusType::Unknown`]) searches every concrete bus.
    #[must_use]
    pub fn bus(mut self, bus: BusType) -> Self {
        self.query.bus = bus;
        self
    }

    /// The vendor/product id pair. `(0, 0)` is reserved and never matches.
    #[must_use]
    pub fn usbid(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.query.vendor_id = vendor_id;
        self.query.product_id = product_id;
        self
    }

    /// The per-unit `uniq` string, for rules that pin one.
    #[must_use]
    pub fn uniq(mut self, uniq: impl Into<String>) -> Self {
        self.query.uniq = Some(uniq.into());
        self
    }

    /// The kernel device name, for rules that pin one.
    #[must_use]
    pub fn match_name(mut self, name: impl Into<String>) -> Self {
        self.query.match_name = Some(name.into());
        self
    }

    /// Override the display name of a generic fallback result. Has no
    /// effect on real matches.
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.query.device_name = Some(name.into());
        self
    }

    /// What to yield when nothing matches.
    #[must_use]
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.query.fallback = fallback;
        self
    }
}

/// # Finishing
impl Builder {
    #[must_use]
    pub fn build(self) -> Query {
        self.query
    }
}
