//! # Descriptor file loading
//!
//! Tablets are described by `.tablet` files and styli by `.stylus` files,
//! both INI-style key files. Directories are loaded in the order given;
//! a later directory may add records or shadow earlier ones with the same
//! identity (the canonical match string for tablets, the [`StylusId`] for
//! styli), which is how user overrides layer on top of the system set.
//!
//! A malformed file is rejected and reported without aborting the load;
//! invalid values inside an otherwise usable record are skipped with a
//! warning. Within a directory, files load in name order so the result is
//! independent of filesystem enumeration order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use configparser::ini::Ini;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::matching::{BusType, MatchRule};
use crate::pad::{ButtonFlags, StatusLed};
use crate::stylus::{AxisFlags, EraserType, Stylus, StylusId, StylusType};
use crate::tablet::{Class, IntegrationFlags, StylusRef, Tablet};

const TABLET_SUFFIX: &str = "tablet";
const STYLUS_SUFFIX: &str = "stylus";

/// Why one path was rejected during load. Collected, never fatal on its
/// own: the database only fails to open when nothing loads at all.
#[derive(thiserror::Error, Debug)]
#[error("{}: {kind}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub kind: LoadErrorKind,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadErrorKind {
    #[error("unreadable: {0}")]
    Io(#[from] std::io::Error),
    /// The file isn't a key-value file at all.
    #[error("not a valid key-value file: {0}")]
    Parse(String),
    #[error("missing required `{0}` entry")]
    MissingField(&'static str),
    /// Every `DeviceMatch` entry was unusable.
    #[error("no usable DeviceMatch entry")]
    NoValidMatch,
}

/// Accumulates records across directories, applying shadowing.
#[derive(Default)]
pub(crate) struct Loader {
    tablets: Vec<Tablet>,
    tablet_keys: HashMap<String, usize>,
    styli: Vec<Stylus>,
    stylus_keys: HashMap<StylusId, usize>,
    rejected: Vec<LoadError>,
}

impl Loader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn load_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("skipping descriptor directory {:?}: {}", dir, err);
                self.rejected.push(LoadError {
                    path: dir.to_owned(),
                    kind: err.into(),
                });
                return;
            }
        };

        let mut tablet_files = Vec::new();
        let mut stylus_files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some(TABLET_SUFFIX) => tablet_files.push(path),
                Some(STYLUS_SUFFIX) => stylus_files.push(path),
                _ => (),
            }
        }
        tablet_files.sort();
        stylus_files.sort();

        // Styli first, mirroring the record order warnings reference.
        for path in stylus_files {
            match parse_stylus_file(&path) {
                Ok(styli) => {
                    for stylus in styli {
                        self.insert_stylus(stylus);
                    }
                }
                Err(kind) => {
                    warn!("rejecting {:?}: {}", path, kind);
                    self.rejected.push(LoadError { path, kind });
                }
            }
        }
        for path in tablet_files {
            match parse_tablet_file(&path) {
                Ok(tablet) => self.insert_tablet(tablet),
                Err(kind) => {
                    warn!("rejecting {:?}: {}", path, kind);
                    self.rejected.push(LoadError { path, kind });
                }
            }
        }
    }

    fn insert_tablet(&mut self, tablet: Tablet) {
        let key = tablet
            .matches
            .first()
            .map(MatchRule::match_string)
            .unwrap_or_default();
        if let Some(&index) = self.tablet_keys.get(&key) {
            debug!("tablet `{}` shadows an earlier record for {}", tablet.name, key);
            self.tablets[index] = tablet;
        } else {
            self.tablet_keys.insert(key, self.tablets.len());
            self.tablets.push(tablet);
        }
    }

    fn insert_stylus(&mut self, stylus: Stylus) {
        if let Some(&index) = self.stylus_keys.get(&stylus.id) {
            debug!("stylus {} shadows an earlier record", stylus.id);
            self.styli[index] = stylus;
        } else {
            self.stylus_keys.insert(stylus.id, self.styli.len());
            self.styli.push(stylus);
        }
    }

    pub(crate) fn finish(self) -> (Vec<Tablet>, Vec<Stylus>, Vec<LoadError>) {
        let mut styli = self.styli;
        // Group references expand in store order; sort by id so that order
        // doesn't depend on which file declared a stylus first.
        styli.sort_by_key(|s| s.id);
        (self.tablets, styli, self.rejected)
    }
}

fn load_ini(path: &Path) -> Result<Ini, LoadErrorKind> {
    let mut ini = Ini::new();
    // The format uses `;` as a list separator, not a comment marker.
    ini.set_comment_symbols(&['#']);
    ini.load(path).map_err(LoadErrorKind::Parse)?;
    Ok(ini)
}

/// Split a semicolon-separated list, dropping empty entries (lists in
/// descriptor files conventionally end with a trailing `;`).
fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn get_bool(ini: &Ini, section: &str, key: &str) -> bool {
    match ini.getbool(section, key) {
        Ok(value) => value.unwrap_or(false),
        Err(err) => {
            warn!("ignoring non-boolean `{}`: {}", key, err);
            false
        }
    }
}

fn get_uint(ini: &Ini, section: &str, key: &str) -> Option<u32> {
    match ini.getuint(section, key) {
        Ok(value) => value.and_then(|v| u32::try_from(v).ok()),
        Err(err) => {
            warn!("ignoring non-numeric `{}`: {}", key, err);
            None
        }
    }
}

/// Parse one `DeviceMatch`/`PairedID` entry:
/// `bus|vvvv|pppp[|name[|uniq]]`, or the literal `generic`.
pub(crate) fn parse_match(entry: &str) -> Option<MatchRule> {
    if entry == "generic" {
        return Some(MatchRule::generic());
    }
    let fields: SmallVec<[&str; 5]> = entry.split('|').collect();
    if !(3..=5).contains(&fields.len()) {
        return None;
    }
    let bus = BusType::from_str(fields[0]).ok()?;
    if bus == BusType::Unknown {
        return None;
    }
    let vendor_id = u16::from_str_radix(fields[1], 16).ok()?;
    let product_id = u16::from_str_radix(fields[2], 16).ok()?;
    let name = fields.get(3).copied().filter(|s| !s.is_empty());
    let uniq = fields.get(4).copied().filter(|s| !s.is_empty());
    Some(MatchRule {
        bus,
        vendor_id,
        product_id,
        name: name.map(Into::into),
        uniq: uniq.map(Into::into),
    })
}

fn parse_styli_refs(value: &str) -> Vec<StylusRef> {
    let mut refs = Vec::new();
    for entry in split_list(value) {
        if let Some(group) = entry.strip_prefix('@') {
            refs.push(StylusRef::Group(group.into()));
        } else {
            match entry.parse::<StylusId>() {
                Ok(id) => refs.push(StylusRef::Id(id)),
                Err(err) => warn!("ignoring styli entry: {}", err),
            }
        }
    }
    refs
}

/// `[Buttons]` keys and the flag each one assigns. Strips accept the
/// older `Touchstrip` spelling.
const BUTTON_KEYS: [(&str, ButtonFlags); 13] = [
    ("left", ButtonFlags::LEFT),
    ("right", ButtonFlags::RIGHT),
    ("top", ButtonFlags::TOP),
    ("bottom", ButtonFlags::BOTTOM),
    ("ring", ButtonFlags::RING_MODESWITCH),
    ("ring2", ButtonFlags::RING2_MODESWITCH),
    ("strip", ButtonFlags::STRIP_MODESWITCH),
    ("touchstrip", ButtonFlags::STRIP_MODESWITCH),
    ("strip2", ButtonFlags::STRIP2_MODESWITCH),
    ("touchstrip2", ButtonFlags::STRIP2_MODESWITCH),
    ("dial", ButtonFlags::DIAL_MODESWITCH),
    ("dial2", ButtonFlags::DIAL2_MODESWITCH),
    ("oleds", ButtonFlags::OLED),
];

fn parse_buttons(ini: &Ini, name: &str, num_buttons: usize) -> Vec<ButtonFlags> {
    let mut buttons = vec![ButtonFlags::empty(); num_buttons];
    for (key, flag) in BUTTON_KEYS {
        let Some(value) = ini.get("buttons", key) else {
            continue;
        };
        for entry in split_list(&value) {
            let mut chars = entry.chars();
            let letter = chars.next();
            let index = match (letter, chars.next()) {
                (Some(c @ 'A'..='Z'), None) => (c as usize) - ('A' as usize),
                _ => {
                    warn!("{}: ignoring value `{}` in `{}`", name, entry, key);
                    continue;
                }
            };
            let Some(flags) = buttons.get_mut(index) else {
                warn!("{}: button `{}` is beyond the declared count", name, entry);
                continue;
            };
            // One position group per button.
            if flag.intersects(ButtonFlags::POSITION)
                && flags.intersects(ButtonFlags::POSITION)
            {
                warn!("{}: button `{}` is in more than one position group", name, entry);
                continue;
            }
            *flags |= flag;
        }
    }
    buttons
}

/// Mode count for one feature: the explicit key if present, else the
/// number of buttons carrying the feature's mode-switch flag.
fn parse_num_modes(ini: &Ini, key: &str, buttons: &[ButtonFlags], flag: ButtonFlags) -> u32 {
    if let Some(num) = get_uint(ini, "buttons", key).filter(|&n| n > 0) {
        return num;
    }
    buttons.iter().filter(|b| b.intersects(flag)).count() as u32
}

fn parse_status_leds(value: &str, name: &str) -> SmallVec<[StatusLed; 2]> {
    let mut leds = SmallVec::new();
    for entry in split_list(value) {
        match StatusLed::from_str(entry) {
            Ok(led) => {
                if !leds.contains(&led) {
                    leds.push(led);
                }
            }
            Err(_) => warn!("{}: unrecognized status LED `{}`", name, entry),
        }
    }
    leds
}

fn parse_tablet_file(path: &Path) -> Result<Tablet, LoadErrorKind> {
    let ini = load_ini(path)?;

    let name = ini
        .get("device", "name")
        .ok_or(LoadErrorKind::MissingField("Name"))?;
    let match_value = ini
        .get("device", "devicematch")
        .ok_or(LoadErrorKind::MissingField("DeviceMatch"))?;

    let mut matches: SmallVec<[MatchRule; 2]> = SmallVec::new();
    for entry in split_list(&match_value) {
        match parse_match(entry) {
            Some(rule) => {
                if !matches.contains(&rule) {
                    matches.push(rule);
                }
            }
            None => warn!("{}: skipping unparseable match `{}`", name, entry),
        }
    }
    if matches.is_empty() {
        return Err(LoadErrorKind::NoValidMatch);
    }

    let model_name = ini.get("device", "modelname").filter(|s| !s.is_empty());
    let layout = ini
        .get("device", "layout")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let paired = ini.get("device", "pairedid").and_then(|value| {
        let rule = parse_match(value.trim().trim_end_matches(';'));
        if rule.is_none() {
            warn!("{}: ignoring unparseable PairedID `{}`", name, value);
        }
        rule
    });

    let class = match ini.get("device", "class") {
        Some(value) => Class::from_str(&value).unwrap_or_else(|_| {
            warn!("{}: unrecognized class `{}`", name, value);
            Class::Unknown
        }),
        None => Class::Unknown,
    };

    let mut integration = IntegrationFlags::empty();
    if let Some(value) = ini.get("device", "integratedin") {
        for entry in split_list(&value) {
            match entry {
                "Display" => integration |= IntegrationFlags::DISPLAY,
                "System" => integration |= IntegrationFlags::SYSTEM,
                other => warn!("{}: unrecognized integration flag `{}`", name, other),
            }
        }
    }

    // Tablets that don't list styli are assumed to take the generic pen
    // and eraser.
    let styli = match ini.get("device", "styli") {
        Some(value) => parse_styli_refs(&value),
        None => vec![
            StylusRef::Id(StylusId::GENERIC_ERASER),
            StylusRef::Id(StylusId::GENERIC_PEN),
        ],
    };

    let has_stylus = get_bool(&ini, "features", "stylus");
    let has_touch = get_bool(&ini, "features", "touch");
    let has_touchswitch = get_bool(&ini, "features", "touchswitch");
    let reversible = get_bool(&ini, "features", "reversible");

    if reversible && integration.contains(IntegrationFlags::DISPLAY) {
        warn!("{}: tablet is both reversible and display-integrated", name);
    }
    if has_touchswitch && !has_touch {
        warn!("{}: tablet has a touch switch but no touch", name);
    }

    // Ring/Ring2 booleans are the older spelling of NumRings.
    let num_rings = get_uint(&ini, "features", "numrings").unwrap_or_else(|| {
        u32::from(get_bool(&ini, "features", "ring")) + u32::from(get_bool(&ini, "features", "ring2"))
    });
    if get_bool(&ini, "features", "ring2") && !get_bool(&ini, "features", "ring") {
        warn!("{}: tablet has Ring2 but no Ring", name);
    }
    let num_strips = get_uint(&ini, "features", "numstrips").unwrap_or(0);
    let num_dials = get_uint(&ini, "features", "numdials").unwrap_or(0);
    let num_keys = get_uint(&ini, "features", "numkeys").unwrap_or(0);

    let num_buttons = get_uint(&ini, "features", "buttons").unwrap_or(0) as usize;
    let buttons = parse_buttons(&ini, &name, num_buttons);

    let ring_num_modes =
        parse_num_modes(&ini, "ringnummodes", &buttons, ButtonFlags::RING_MODESWITCH);
    let ring2_num_modes =
        parse_num_modes(&ini, "ring2nummodes", &buttons, ButtonFlags::RING2_MODESWITCH);
    let strips_num_modes = parse_num_modes(
        &ini,
        "stripsnummodes",
        &buttons,
        ButtonFlags::STRIP_MODESWITCH | ButtonFlags::STRIP2_MODESWITCH,
    );
    let dials_num_modes = parse_num_modes(
        &ini,
        "dialsnummodes",
        &buttons,
        ButtonFlags::DIAL_MODESWITCH | ButtonFlags::DIAL2_MODESWITCH,
    );

    let status_leds = ini
        .get("features", "statusleds")
        .map(|value| parse_status_leds(&value, &name))
        .unwrap_or_default();

    Ok(Tablet {
        name,
        model_name,
        layout,
        matches,
        paired,
        width: get_uint(&ini, "device", "width").unwrap_or(0),
        height: get_uint(&ini, "device", "height").unwrap_or(0),
        class,
        integration,
        reversible,
        has_stylus,
        has_touch,
        has_touchswitch,
        buttons,
        num_keys,
        num_rings,
        num_strips,
        num_dials,
        ring_num_modes,
        ring2_num_modes,
        strips_num_modes,
        dials_num_modes,
        status_leds,
        styli,
    })
}

fn parse_axes(value: &str, id: StylusId) -> AxisFlags {
    let mut axes = AxisFlags::empty();
    for entry in split_list(value) {
        let flag = match entry {
            "Tilt" => AxisFlags::TILT,
            "RotationZ" => AxisFlags::ROTATION_Z,
            "Distance" => AxisFlags::DISTANCE,
            "Pressure" => AxisFlags::PRESSURE,
            "Slider" => AxisFlags::SLIDER,
            other => {
                warn!("invalid axis `{}` for stylus {}", other, id);
                continue;
            }
        };
        if axes.contains(flag) {
            warn!("duplicate axis `{}` for stylus {}", entry, id);
        }
        axes |= flag;
    }
    axes
}

fn parse_stylus_file(path: &Path) -> Result<Vec<Stylus>, LoadErrorKind> {
    let ini = load_ini(path)?;
    let mut styli = Vec::new();

    for section in ini.sections() {
        let id = match section.parse::<StylusId>() {
            Ok(id) => id,
            Err(err) => {
                warn!("{:?}: skipping section: {}", path, err);
                continue;
            }
        };

        let name = match ini.get(&section, "name") {
            Some(name) => name,
            None => {
                warn!("stylus {} has no name", id);
                String::new()
            }
        };

        let mut paired_ids = Vec::new();
        if let Some(value) = ini.get(&section, "pairedstylusids") {
            for entry in split_list(&value) {
                match entry.parse::<StylusId>() {
                    Ok(paired) => paired_ids.push(paired),
                    Err(err) => warn!("stylus {} ({}): {}", name, id, err),
                }
            }
        }

        let num_buttons = get_uint(&ini, &section, "buttons").unwrap_or_else(|| {
            warn!("stylus {} has no button count, assuming 2", id);
            2
        });

        let axes = ini
            .get(&section, "axes")
            .map(|value| parse_axes(&value, id))
            .unwrap_or_default();

        let stylus_type = match ini.get(&section, "type") {
            Some(value) => StylusType::from_str(&value).unwrap_or_else(|_| {
                warn!("stylus {} has unrecognized type `{}`", id, value);
                StylusType::Unknown
            }),
            None => {
                warn!("stylus {} has no type, assuming General", id);
                StylusType::General
            }
        };

        let eraser_type = ini
            .get(&section, "erasertype")
            .filter(|value| value != "None")
            .map(|value| {
                EraserType::from_str(&value).unwrap_or_else(|_| {
                    warn!("stylus {} has unrecognized eraser type `{}`", id, value);
                    EraserType::Unknown
                })
            });

        styli.push(Stylus {
            id,
            name,
            group: ini.get(&section, "group").filter(|s| !s.is_empty()),
            paired_ids,
            num_buttons,
            axes,
            stylus_type,
            eraser_type,
            has_lens: get_bool(&ini, &section, "haslens"),
            has_wheel: get_bool(&ini, &section, "haswheel"),
        });
    }

    Ok(styli)
}
