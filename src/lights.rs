//! The working buffer that layers render into.
//!
//! Output drivers never read it directly; the physical layer copies it to
//! the [`FrontBuffer`](crate::FrontBuffer) on publish.

use alloc::vec::Vec;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::channels::ChannelLayout;
use crate::coord::Coord3D;

/// Physical buffer with its channel layout and geometry
#[derive(Debug)]
pub struct Lights {
    channels: Vec<u8>,
    layout: ChannelLayout,
    nr_of_lights: usize,
    size: Coord3D,
    brightness: u8,
}

impl Lights {
    /// Allocate the buffer, halving the request until the heap can hold it
    pub fn allocate(max_channels: usize, layout: ChannelLayout) -> Self {
        let mut size = max_channels;
        let channels = loop {
            let mut channels = Vec::new();
            if channels.try_reserve_exact(size).is_ok() {
                channels.resize(size, 0);
                break channels;
            }
            if size == 0 {
                break channels;
            }
            size /= 2;
        };

        #[cfg(feature = "esp32-log")]
        if channels.len() < max_channels {
            println!(
                "[moonmap] physical buffer reduced to {} of {} bytes",
                channels.len(),
                max_channels
            );
        }

        Self {
            channels,
            layout,
            nr_of_lights: 0,
            size: Coord3D::ZERO,
            brightness: u8::MAX,
        }
    }

    /// Written by effects, and by the layout engine during discovery
    pub fn channels(&self) -> &[u8] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [u8] {
        &mut self.channels
    }

    /// Capacity of the buffer in bytes
    pub fn max_channels(&self) -> usize {
        self.channels.len()
    }

    pub const fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub(crate) fn set_layout(&mut self, layout: ChannelLayout) {
        self.layout = layout;
    }

    pub const fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Lights found by the last physical pass
    pub const fn nr_of_lights(&self) -> usize {
        self.nr_of_lights
    }

    /// Bytes in use: lights times stride
    pub const fn nr_of_channels(&self) -> usize {
        self.nr_of_lights * self.stride()
    }

    /// Bounding box size of the last physical pass
    pub const fn size(&self) -> Coord3D {
        self.size
    }

    pub(crate) fn set_geometry(&mut self, nr_of_lights: usize, size: Coord3D) {
        self.nr_of_lights = nr_of_lights;
        self.size = size;
    }

    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Bytes `offset..offset + len` of one light, `None` past the buffer
    pub fn light_channels(&self, index: usize, offset: usize, len: usize) -> Option<&[u8]> {
        let range = self.range(index, offset, len)?;
        self.channels.get(range)
    }

    pub fn light_channels_mut(
        &mut self,
        index: usize,
        offset: usize,
        len: usize,
    ) -> Option<&mut [u8]> {
        let range = self.range(index, offset, len)?;
        self.channels.get_mut(range)
    }

    /// Blank every channel of one light
    pub fn zero_light(&mut self, index: usize) {
        let stride = self.stride();
        if let Some(light) = self.light_channels_mut(index, 0, stride) {
            light.fill(0);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.channels.fill(0);
    }

    fn range(&self, index: usize, offset: usize, len: usize) -> Option<core::ops::Range<usize>> {
        let start = index.checked_mul(self.stride())?.checked_add(offset)?;
        let end = start.checked_add(len)?;
        (end <= self.channels.len()).then_some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::LightPreset;

    #[test]
    fn light_access_is_bounds_checked() {
        let mut lights = Lights::allocate(12, LightPreset::Rgb.layout());
        assert_eq!(lights.max_channels(), 12);
        lights.light_channels_mut(3, 0, 3).unwrap().copy_from_slice(&[1, 2, 3]);
        assert_eq!(lights.light_channels(3, 1, 2), Some(&[2, 3][..]));
        assert!(lights.light_channels(4, 0, 1).is_none());
        assert!(lights.light_channels(3, 2, 2).is_none());

        lights.zero_light(3);
        assert!(lights.channels().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn stride_follows_the_layout() {
        let mut lights = Lights::allocate(16, LightPreset::Rgbw.layout());
        lights.set_geometry(4, Coord3D::new(4, 1, 1));
        assert_eq!(lights.stride(), 4);
        assert_eq!(lights.nr_of_channels(), 16);
        assert_eq!(lights.light_channels(3, 3, 1), Some(&[0][..]));

        lights.set_layout(LightPreset::Rgb.layout());
        assert_eq!(lights.nr_of_channels(), 12);
    }
}
