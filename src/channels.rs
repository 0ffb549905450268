//! Channel layout of the physical buffer.
//!
//! Every light occupies `channels_per_light` bytes. A layout tells effects
//! and drivers where each channel role lives inside that stride; absent
//! roles are `None`.

use crate::color::Rgb;

const PRESET_NAME_RGB: &str = "RGB";
const PRESET_NAME_RBG: &str = "RBG";
const PRESET_NAME_GRB: &str = "GRB";
const PRESET_NAME_GBR: &str = "GBR";
const PRESET_NAME_BRG: &str = "BRG";
const PRESET_NAME_BGR: &str = "BGR";
const PRESET_NAME_RGBW: &str = "RGBW";
const PRESET_NAME_GRBW: &str = "GRBW";
const PRESET_NAME_GRB6: &str = "GRB6";
const PRESET_NAME_RGBWYP: &str = "RGBWYP";
const PRESET_NAME_MH_BE_TOPPER_32: &str = "MHBeTopper19x15W-32";
const PRESET_NAME_MH_BEE_EYES_15: &str = "MHBeeEyes150W-15";
const PRESET_NAME_MH_19X15W_24: &str = "MH19x15W-24";

/// Byte offsets of channel roles within one light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Stride of one light in the physical buffer
    pub channels_per_light: u8,
    /// Wire order of the color channels, used by LED drivers
    pub red: Option<u8>,
    pub green: Option<u8>,
    pub blue: Option<u8>,
    pub white: Option<u8>,
    /// Start of the RGB triple written by effects
    pub rgb: Option<u8>,
    pub rgb1: Option<u8>,
    pub rgb2: Option<u8>,
    pub rgb3: Option<u8>,
    pub pan: Option<u8>,
    pub tilt: Option<u8>,
    pub zoom: Option<u8>,
    pub rotate: Option<u8>,
    pub gobo: Option<u8>,
    pub brightness: Option<u8>,
    pub brightness2: Option<u8>,
}

/// A single-purpose channel of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Rgb,
    Rgb1,
    Rgb2,
    Rgb3,
    White,
    Pan,
    Tilt,
    Zoom,
    Rotate,
    Gobo,
    Brightness,
    Brightness2,
}

impl ChannelLayout {
    /// Plain 3-channel LEDs with the given wire order
    const fn leds(red: u8, green: u8, blue: u8) -> Self {
        Self {
            channels_per_light: 3,
            red: Some(red),
            green: Some(green),
            blue: Some(blue),
            white: None,
            rgb: Some(0),
            rgb1: None,
            rgb2: None,
            rgb3: None,
            pan: None,
            tilt: None,
            zoom: None,
            rotate: None,
            gobo: None,
            brightness: None,
            brightness2: None,
        }
    }

    /// Offset of a role, `None` if the fixture has no such channel
    pub const fn offset(&self, role: ChannelRole) -> Option<u8> {
        match role {
            ChannelRole::Rgb => self.rgb,
            ChannelRole::Rgb1 => self.rgb1,
            ChannelRole::Rgb2 => self.rgb2,
            ChannelRole::Rgb3 => self.rgb3,
            ChannelRole::White => self.white,
            ChannelRole::Pan => self.pan,
            ChannelRole::Tilt => self.tilt,
            ChannelRole::Zoom => self.zoom,
            ChannelRole::Rotate => self.rotate,
            ChannelRole::Gobo => self.gobo,
            ChannelRole::Brightness => self.brightness,
            ChannelRole::Brightness2 => self.brightness2,
        }
    }

    /// Returns true if white directly follows the RGB triple, so RGB
    /// writes should carry the extracted white channel along
    pub const fn white_follows_rgb(&self) -> bool {
        match (self.rgb, self.white) {
            (Some(rgb), Some(white)) => white as u16 == rgb as u16 + 3,
            _ => false,
        }
    }

    pub const fn stride(&self) -> usize {
        self.channels_per_light as usize
    }
}

impl Default for ChannelLayout {
    fn default() -> Self {
        LightPreset::default().layout()
    }
}

/// Known fixture channel layouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum LightPreset {
    Rgb = 0,
    Rbg = 1,
    /// WS2812 order
    #[default]
    Grb = 2,
    Gbr = 3,
    Brg = 4,
    Bgr = 5,
    /// 4 channel par lights
    Rgbw = 6,
    /// SK6812 style RGBW LEDs
    Grbw = 7,
    /// LED curtains with 6 channels per light
    Grb6 = 8,
    /// 6 channel par lights with UV
    Rgbwyp = 9,
    /// 32 channel moving head
    MhBeTopper32 = 10,
    /// 15 channel moving head
    MhBeeEyes15 = 11,
    /// 24 channel moving head
    Mh19x15W24 = 12,
}

impl LightPreset {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Rgb,
            1 => Self::Rbg,
            2 => Self::Grb,
            3 => Self::Gbr,
            4 => Self::Brg,
            5 => Self::Bgr,
            6 => Self::Rgbw,
            7 => Self::Grbw,
            8 => Self::Grb6,
            9 => Self::Rgbwyp,
            10 => Self::MhBeTopper32,
            11 => Self::MhBeeEyes15,
            12 => Self::Mh19x15W24,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => PRESET_NAME_RGB,
            Self::Rbg => PRESET_NAME_RBG,
            Self::Grb => PRESET_NAME_GRB,
            Self::Gbr => PRESET_NAME_GBR,
            Self::Brg => PRESET_NAME_BRG,
            Self::Bgr => PRESET_NAME_BGR,
            Self::Rgbw => PRESET_NAME_RGBW,
            Self::Grbw => PRESET_NAME_GRBW,
            Self::Grb6 => PRESET_NAME_GRB6,
            Self::Rgbwyp => PRESET_NAME_RGBWYP,
            Self::MhBeTopper32 => PRESET_NAME_MH_BE_TOPPER_32,
            Self::MhBeeEyes15 => PRESET_NAME_MH_BEE_EYES_15,
            Self::Mh19x15W24 => PRESET_NAME_MH_19X15W_24,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            PRESET_NAME_RGB => Some(Self::Rgb),
            PRESET_NAME_RBG => Some(Self::Rbg),
            PRESET_NAME_GRB => Some(Self::Grb),
            PRESET_NAME_GBR => Some(Self::Gbr),
            PRESET_NAME_BRG => Some(Self::Brg),
            PRESET_NAME_BGR => Some(Self::Bgr),
            PRESET_NAME_RGBW => Some(Self::Rgbw),
            PRESET_NAME_GRBW => Some(Self::Grbw),
            PRESET_NAME_GRB6 => Some(Self::Grb6),
            PRESET_NAME_RGBWYP => Some(Self::Rgbwyp),
            PRESET_NAME_MH_BE_TOPPER_32 => Some(Self::MhBeTopper32),
            PRESET_NAME_MH_BEE_EYES_15 => Some(Self::MhBeeEyes15),
            PRESET_NAME_MH_19X15W_24 => Some(Self::Mh19x15W24),
            _ => None,
        }
    }

    /// Resolve the preset into channel offsets
    pub const fn layout(self) -> ChannelLayout {
        match self {
            Self::Rgb => ChannelLayout::leds(0, 1, 2),
            Self::Rbg => ChannelLayout::leds(0, 2, 1),
            Self::Grb => ChannelLayout::leds(1, 0, 2),
            Self::Gbr => ChannelLayout::leds(2, 0, 1),
            Self::Brg => ChannelLayout::leds(1, 2, 0),
            Self::Bgr => ChannelLayout::leds(2, 1, 0),
            Self::Rgbw => ChannelLayout {
                channels_per_light: 4,
                white: Some(3),
                ..ChannelLayout::leds(0, 1, 2)
            },
            Self::Grbw => ChannelLayout {
                channels_per_light: 4,
                white: Some(3),
                ..ChannelLayout::leds(1, 0, 2)
            },
            Self::Grb6 => ChannelLayout {
                channels_per_light: 6,
                ..ChannelLayout::leds(1, 0, 2)
            },
            Self::Rgbwyp => ChannelLayout {
                channels_per_light: 6,
                white: Some(3),
                ..ChannelLayout::leds(0, 1, 2)
            },
            Self::MhBeTopper32 => ChannelLayout {
                channels_per_light: 32,
                rgb: Some(9),
                rgb1: Some(13),
                rgb2: Some(17),
                rgb3: Some(24),
                pan: Some(0),
                tilt: Some(2),
                zoom: Some(5),
                brightness: Some(6),
                ..ChannelLayout::leds(0, 1, 2)
            },
            Self::MhBeeEyes15 => ChannelLayout {
                channels_per_light: 15,
                rgb: Some(10),
                pan: Some(0),
                tilt: Some(1),
                zoom: Some(7),
                brightness: Some(8),
                gobo: Some(5),
                brightness2: Some(3),
                ..ChannelLayout::leds(0, 1, 2)
            },
            Self::Mh19x15W24 => ChannelLayout {
                channels_per_light: 24,
                pan: Some(0),
                tilt: Some(1),
                brightness: Some(3),
                rgb: Some(4),
                rgb1: Some(8),
                rgb2: Some(12),
                zoom: Some(17),
                ..ChannelLayout::leds(0, 1, 2)
            },
        }
    }
}

/// A value that can be read from consecutive channels of one light
pub trait ChannelValue: Sized {
    /// Number of channels the value occupies
    const WIDTH: usize;

    /// Build the value from at least `WIDTH` bytes
    fn from_channels(channels: &[u8]) -> Self;

    /// Value returned when nothing can be read
    fn zero() -> Self;
}

impl ChannelValue for u8 {
    const WIDTH: usize = 1;

    fn from_channels(channels: &[u8]) -> Self {
        channels[0]
    }

    fn zero() -> Self {
        0
    }
}

impl ChannelValue for Rgb {
    const WIDTH: usize = 3;

    fn from_channels(channels: &[u8]) -> Self {
        Rgb::new(channels[0], channels[1], channels[2])
    }

    fn zero() -> Self {
        Rgb::default()
    }
}

impl<const N: usize> ChannelValue for [u8; N] {
    const WIDTH: usize = N;

    fn from_channels(channels: &[u8]) -> Self {
        let mut value = [0; N];
        value.copy_from_slice(&channels[..N]);
        value
    }

    fn zero() -> Self {
        [0; N]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_round_trip_through_raw_ids() {
        for raw in 0..13 {
            let preset = LightPreset::from_raw(raw).unwrap();
            assert_eq!(preset as u8, raw);
            assert_eq!(LightPreset::parse_from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(LightPreset::from_raw(13), None);
    }

    #[test]
    fn rgbw_carries_white_after_rgb() {
        assert!(LightPreset::Rgbw.layout().white_follows_rgb());
        assert!(LightPreset::Grbw.layout().white_follows_rgb());
        assert!(!LightPreset::Grb.layout().white_follows_rgb());
        assert!(!LightPreset::MhBeeEyes15.layout().white_follows_rgb());
    }

    #[test]
    fn moving_head_offsets_fit_the_stride() {
        for preset in [
            LightPreset::MhBeTopper32,
            LightPreset::MhBeeEyes15,
            LightPreset::Mh19x15W24,
        ] {
            let layout = preset.layout();
            let rgb = layout.offset(ChannelRole::Rgb).unwrap();
            assert!(usize::from(rgb) + 3 <= layout.stride());
            assert!(layout.offset(ChannelRole::Pan).is_some());
        }
    }
}
