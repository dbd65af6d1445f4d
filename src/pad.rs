//! # Pad capabilities
//!
//! Pads carry buttons, rings, strips, and dials. The database records,
//! per button letter, which side of the pad the button sits on and
//! whether pressing it cycles a feature through its modes; features with
//! an indicator light additionally declare a status-LED group.
//!
//! Everything here is a pure derivation over a [`Tablet`]'s stored
//! fields: unknown letters and undeclared features yield empty results,
//! never errors.

use crate::tablet::Tablet;

bitflags::bitflags! {
    /// Capability flags of a single pad button.
    ///
    /// A button sits in at most one position group, and may simultaneously
    /// be the mode-switch designator of one or more features.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
    pub struct ButtonFlags: u16 {
        const LEFT = 1;
        const RIGHT = 2;
        const TOP = 4;
        const BOTTOM = 8;
        const RING_MODESWITCH = 16;
        const RING2_MODESWITCH = 32;
        const STRIP_MODESWITCH = 64;
        const STRIP2_MODESWITCH = 128;
        const DIAL_MODESWITCH = 256;
        const DIAL2_MODESWITCH = 512;
        /// The button has an OLED display next to it.
        const OLED = 1024;

        /// Any position bit.
        const POSITION = Self::LEFT.bits()
            | Self::RIGHT.bits()
            | Self::TOP.bits()
            | Self::BOTTOM.bits();
        /// Any mode-switch bit.
        const MODESWITCH = Self::RING_MODESWITCH.bits()
            | Self::RING2_MODESWITCH.bits()
            | Self::STRIP_MODESWITCH.bits()
            | Self::STRIP2_MODESWITCH.bits()
            | Self::DIAL_MODESWITCH.bits()
            | Self::DIAL2_MODESWITCH.bits();
    }
}

/// A physical feature instance with an associated indicator light whose
/// active segment the hardware reports.
///
/// `Touchstrip`/`Touchstrip2` are accepted as spellings of the strip
/// variants for compatibility with older descriptor files.
#[derive(
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum StatusLed {
    Ring,
    Ring2,
    #[strum(to_string = "Strip", serialize = "Touchstrip")]
    Strip,
    #[strum(to_string = "Strip2", serialize = "Touchstrip2")]
    Strip2,
    Dial,
    Dial2,
}

impl StatusLed {
    /// The mode-switch flag of the feature this LED reports on.
    #[must_use]
    pub fn modeswitch_flag(self) -> ButtonFlags {
        match self {
            StatusLed::Ring => ButtonFlags::RING_MODESWITCH,
            StatusLed::Ring2 => ButtonFlags::RING2_MODESWITCH,
            StatusLed::Strip => ButtonFlags::STRIP_MODESWITCH,
            StatusLed::Strip2 => ButtonFlags::STRIP2_MODESWITCH,
            StatusLed::Dial => ButtonFlags::DIAL_MODESWITCH,
            StatusLed::Dial2 => ButtonFlags::DIAL2_MODESWITCH,
        }
    }
}

fn button_index(tablet: &Tablet, button: char) -> Option<usize> {
    if !button.is_ascii_uppercase() {
        return None;
    }
    let index = (button as usize) - ('A' as usize);
    (index < tablet.buttons.len()).then_some(index)
}

/// # Pad capability queries
impl Tablet {
    /// Flags of the given button letter (`'A'` is the first button).
    /// Letters outside the declared button range yield the empty set.
    #[must_use]
    pub fn button_flags(&self, button: char) -> ButtonFlags {
        button_index(self, button).map_or(ButtonFlags::empty(), |index| self.buttons[index])
    }

    /// The declared status-LED groups, in declaration order.
    #[must_use]
    pub fn status_leds(&self) -> &[StatusLed] {
        &self.status_leds
    }

    /// The 0-based position, within [`status_leds`](Self::status_leds), of
    /// the LED group controlled by the given mode-switch button.
    ///
    /// `None` when the letter is not a mode-switch designator of any
    /// declared LED-backed feature ("unavailable" rather than an error).
    #[must_use]
    pub fn button_led_group(&self, button: char) -> Option<usize> {
        let flags = self.button_flags(button);
        if !flags.intersects(ButtonFlags::MODESWITCH) {
            return None;
        }
        self.status_leds
            .iter()
            .position(|led| flags.contains(led.modeswitch_flag()))
    }
}
