//! # Tablet identity [`Database`] and capability lookup
//!
//! Graphics tablets mostly look alike to the kernel: an input node with a
//! bus, a vendor/product id, and maybe a name and a `uniq` string. This
//! crate resolves those raw signals against a database of descriptor
//! records to a canonical [tablet](tablet) model, and derives the
//! secondary capabilities the records encode: pad [button and LED
//! roles](pad), mode-switch groupings, and the set of supported
//! [styli](stylus) with their pen/eraser pairings.
//!
//! To get started, open a [`Database`] over one or more descriptor
//! directories (or assemble one in memory with [`Database::from_parts`]),
//! then build a [query](builder) and [resolve](Database::resolve) it:
//!
//! ```no_run
//! use tabletdb::{Database, Query};
//!
//! # fn main() -> Result<(), tabletdb::OpenError> {
//! let db = Database::new_for_path("/usr/share/libwacom")?;
//! let query = Query::builder().usbid(0x056a, 0x00bc).build();
//! if let Some(tablet) = db.resolve(&query) {
//!     println!("{} ({}x{}in)", tablet.name, tablet.width, tablet.height);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A database is immutable once opened: lookups are pure functions over
//! it, so it can be shared freely between threads. Several databases can
//! coexist; there is no process-wide registry of any kind.
//!
//! **Note:** misses are not errors. An unknown device resolves to `None`
//! (or to the generic fallback descriptor when the query opts in), and
//! capability queries on features a tablet doesn't declare return empty
//! results.

#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod loader;
pub mod matching;
pub mod pad;
pub mod stylus;
pub mod tablet;

pub use builder::{Builder, Fallback, Query};
pub use loader::LoadError;
pub use matching::{BusType, MatchRule};
pub use pad::{ButtonFlags, StatusLed};
pub use stylus::{Stylus, StylusId};
pub use tablet::{ResolvedTablet, Tablet};

use std::path::Path;

use tracing::debug;

/// Opening a [`Database`] failed outright.
///
/// Individual rejected files are *not* errors; see
/// [`Database::rejected`].
#[derive(thiserror::Error, Debug)]
pub enum OpenError {
    /// Nothing loaded at all. Carries the per-path reports explaining
    /// why.
    #[error("no tablet descriptors could be loaded")]
    Empty(Vec<LoadError>),
}

/// An immutable set of tablet and stylus descriptors, loaded once and
/// queried many times. This is the main entry point of the crate.
#[derive(Debug)]
pub struct Database {
    tablets: Vec<Tablet>,
    styli: Vec<Stylus>,
    rejected: Vec<LoadError>,
}

impl Database {
    /// Open a database over a single descriptor directory.
    ///
    /// # Errors
    /// Fails only when no tablet descriptor loads successfully.
    pub fn new_for_path(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        Self::new_for_paths([path])
    }

    /// Open a database over several descriptor directories, lowest
    /// precedence first. Later directories may add records or shadow
    /// earlier ones with the same identity - pass the system directory
    /// first and user override directories after it.
    ///
    /// # Errors
    /// Fails only when no tablet descriptor loads successfully.
    pub fn new_for_paths<P>(paths: impl IntoIterator<Item = P>) -> Result<Self, OpenError>
    where
        P: AsRef<Path>,
    {
        let mut loader = loader::Loader::new();
        for path in paths {
            loader.load_dir(path.as_ref());
        }
        let (tablets, styli, rejected) = loader.finish();
        if tablets.is_empty() {
            return Err(OpenError::Empty(rejected));
        }
        debug!(
            "database loaded: {} tablets, {} styli, {} rejected paths",
            tablets.len(),
            styli.len(),
            rejected.len()
        );
        Ok(Self {
            tablets,
            styli,
            rejected,
        })
    }

    /// Assemble a database from already-parsed records, bypassing the
    /// file loader entirely.
    #[must_use]
    pub fn from_parts(tablets: Vec<Tablet>, styli: Vec<Stylus>) -> Self {
        Self {
            tablets,
            styli,
            rejected: Vec::new(),
        }
    }

    /// Paths that were rejected while loading, with the reason each one
    /// was. Rejections are collected, not fatal.
    #[must_use]
    pub fn rejected(&self) -> &[LoadError] {
        &self.rejected
    }

    /// All tablet descriptors, in load order.
    #[must_use]
    pub fn tablets(&self) -> &[Tablet] {
        &self.tablets
    }

    /// All stylus descriptors, ordered by id.
    #[must_use]
    pub fn styli(&self) -> &[Stylus] {
        &self.styli
    }

    /// Look up one stylus by its composite id.
    #[must_use]
    pub fn stylus(&self, id: StylusId) -> Option<&Stylus> {
        self.styli.iter().find(|s| s.id == id)
    }

    /// Look up a tablet by its display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Tablet> {
        self.tablets.iter().find(|t| t.name == name)
    }

    /// Resolve a [`Query`] to the single best-matching tablet.
    ///
    /// Rules are ranked by specificity (name+uniq > uniq > name > bare
    /// id); a tie at equal rank goes to the first tablet in load order.
    /// On a miss, the query's [`Fallback`] policy decides between `None`
    /// and the generic descriptor with the query's device name.
    #[must_use]
    pub fn resolve(&self, query: &Query) -> Option<ResolvedTablet> {
        if let Some((tablet_idx, rule_idx)) = matching::resolve(&self.tablets, query) {
            let tablet = self.tablets[tablet_idx].clone();
            let matched = tablet.matches[rule_idx].clone();
            return Some(ResolvedTablet { tablet, matched });
        }
        match query.fallback() {
            Fallback::None => None,
            Fallback::Generic => self.synthesize_generic(query),
        }
    }

    /// The generic fallback: zeroed identity always, name overridden by
    /// the query when it carries one. `None` when the database has no
    /// generic record.
    fn synthesize_generic(&self, query: &Query) -> Option<ResolvedTablet> {
        let generic = self.tablets.iter().find(|t| t.is_generic())?;
        let mut tablet = generic.clone();
        if let Some(name) = query.device_name() {
            tablet.name = name.to_owned();
        }
        Some(ResolvedTablet {
            tablet,
            matched: MatchRule::generic(),
        })
    }

    /// The concrete styli a tablet supports: literal references pull the
    /// exact stylus, `@group` references pull every stylus tagged with
    /// that group. Duplicates from overlapping references are dropped;
    /// order is deterministic (store order of first occurrence).
    ///
    /// References that resolve to nothing are omitted, not errors.
    #[must_use]
    pub fn styli_for(&self, tablet: &Tablet) -> Vec<&Stylus> {
        // Tiny lists; linear de-dup beats hashing here.
        let mut found: Vec<&Stylus> = Vec::new();
        for reference in &tablet.styli {
            match reference {
                tablet::StylusRef::Id(id) => {
                    if let Some(stylus) = self.stylus(*id) {
                        if !found.iter().any(|s| s.id == stylus.id) {
                            found.push(stylus);
                        }
                    }
                }
                tablet::StylusRef::Group(group) => {
                    for stylus in &self.styli {
                        if stylus.group.as_deref() == Some(group.as_str())
                            && !found.iter().any(|s| s.id == stylus.id)
                        {
                            found.push(stylus);
                        }
                    }
                }
            }
        }
        found
    }
}
