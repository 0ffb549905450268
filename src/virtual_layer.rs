//! Virtual layer: one effect's coordinate space and its indirection table.
//!
//! Effects address a virtual layer by position. During the virtual pass
//! the layer runs its modifiers on every physical light and records in
//! its [`IndirectionTable`] which physical lights back each virtual index.
//! At render time reads and writes go through that table into the
//! physical buffer.

use embassy_time::Instant;
use heapless::Vec;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::channels::{ChannelRole, ChannelValue};
use crate::color::{Rgb, scale_rgb, split_white};
use crate::coord::Coord3D;
use crate::error::{CapacityKind, LayoutError, LayoutReport};
use crate::lights::Lights;
use crate::math8::scale8;
use crate::modifier::{LayerGeometry, Modifier, ModifierSlot, RippleYZModifier};
use crate::physmap::{PhysMapEntry, Rgb14};
use crate::table::{IndirectionTable, ManyPhysicalPool, MappingStats};

/// Maximum number of modifiers attached to one layer
pub const MAX_MODIFIERS: usize = 8;

/// Coordinate space of one effect
#[derive(Debug, Default)]
pub struct VirtualLayer {
    geometry: LayerGeometry,
    nr_of_lights: usize,
    modifiers: Vec<ModifierSlot, MAX_MODIFIERS>,
    table: IndirectionTable,
    pool: ManyPhysicalPool,
    prev_size: Coord3D,
    size_change: Option<Coord3D>,
    suppressed: usize,
    unmapped: usize,
    stats: MappingStats,
}

impl VirtualLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn geometry(&self) -> &LayerGeometry {
        &self.geometry
    }

    /// Logical size after the modifiers' size transforms
    pub const fn size(&self) -> Coord3D {
        self.geometry.size
    }

    /// Number of virtual lights (volume of the logical size)
    pub const fn nr_of_lights(&self) -> usize {
        self.nr_of_lights
    }

    pub const fn table(&self) -> &IndirectionTable {
        &self.table
    }

    pub const fn pool(&self) -> &ManyPhysicalPool {
        &self.pool
    }

    /// Mapping summary of the last virtual pass
    pub const fn stats(&self) -> MappingStats {
        self.stats
    }

    pub fn modifiers(&self) -> &[ModifierSlot] {
        &self.modifiers
    }

    pub fn modifier_mut(&mut self, index: usize) -> Option<&mut ModifierSlot> {
        self.modifiers.get_mut(index)
    }

    /// Attach a modifier after the existing ones.
    ///
    /// Hands the modifier back if the layer is full.
    pub fn add_modifier(&mut self, modifier: ModifierSlot) -> Result<(), ModifierSlot> {
        self.modifiers.push(modifier)
    }

    pub fn remove_modifier(&mut self, index: usize) -> Option<ModifierSlot> {
        (index < self.modifiers.len()).then(|| self.modifiers.remove(index))
    }

    /// Returns true if any attached modifier transforms pixels at render time
    pub fn affects_rendering(&self) -> bool {
        self.modifiers.iter().any(|modifier| modifier.affects_rendering())
    }

    /// Previous size, once, after a virtual pass changed the size
    pub fn take_size_change(&mut self) -> Option<Coord3D> {
        self.size_change.take()
    }

    /// Advance time driven modifiers
    pub fn tick(&mut self, now: Instant) {
        for modifier in &mut self.modifiers {
            modifier.tick(now);
        }
    }

    /// Row-major flatten without running any modifier
    pub fn linear_index(&self, position: Coord3D) -> usize {
        let size = self.geometry.size;
        let index = i64::from(position.x)
            + i64::from(position.y) * i64::from(size.x)
            + i64::from(position.z) * i64::from(size.x) * i64::from(size.y);
        usize::try_from(index).unwrap_or(usize::MAX)
    }

    /// Index after the render-time transforms of every modifier.
    ///
    /// Returns `None` if a modifier suppressed the position or it lies
    /// outside the layer.
    pub fn resolved_index(&self, position: Coord3D) -> Option<usize> {
        let mut position = position;
        for modifier in &self.modifiers {
            if !modifier.affects_rendering() {
                continue;
            }
            modifier.transform_frame(&mut position, &self.geometry);
            if position.is_suppressed() {
                return None;
            }
        }

        if position.is_out_of_bounds(self.geometry.size) {
            return None;
        }
        Some(self.linear_index(position))
    }

    /// Start a virtual pass over a physical bounding box of `size`
    pub fn on_layout_begin(&mut self, size: Coord3D) {
        self.geometry = LayerGeometry::from_size(size);
        self.table.reset();
        self.pool.reset();
        self.suppressed = 0;
        self.unmapped = 0;

        for modifier in &mut self.modifiers {
            if modifier.affects_layout() {
                modifier.transform_size(&mut self.geometry);
            }
        }

        self.geometry.dimension = self.geometry.size.dimension();
        self.nr_of_lights = self.geometry.size.volume();
    }

    /// Map the physical light `physical` found at `position`.
    ///
    /// Lights that a modifier suppresses, or that land outside the layer,
    /// are blanked in `lights` instead. So are lights the table cannot
    /// hold; those are counted as unmapped and reported.
    pub fn add_light(
        &mut self,
        position: Coord3D,
        physical: usize,
        lights: &mut Lights,
        report: &mut LayoutReport,
    ) {
        let mut position = position;
        for modifier in &mut self.modifiers {
            if !modifier.affects_layout() {
                continue;
            }
            modifier.transform_placement(&mut position, &self.geometry);
            if position.is_suppressed() {
                break;
            }
        }

        if position.is_suppressed() || position.is_out_of_bounds(self.geometry.size) {
            self.suppressed += 1;
            lights.zero_light(physical);
            return;
        }

        if let Err(error) = self.map_light(position, physical) {
            #[cfg(feature = "esp32-log")]
            println!("[moonmap] light {} not mapped: {}", physical, error);
            self.unmapped += 1;
            lights.zero_light(physical);
            report.warn(error);
        }
    }

    fn map_light(&mut self, position: Coord3D, physical: usize) -> Result<(), LayoutError> {
        let packed = u16::try_from(physical).map_err(|_| LayoutError::CapacityExceeded {
            kind: CapacityKind::PackedRange,
            index: physical,
        })?;
        let index = self.linear_index(position);
        self.table.ensure_len(index.saturating_add(1))?;
        self.table.insert(index, packed, &mut self.pool)
    }

    /// Finish a virtual pass
    pub fn on_layout_end(&mut self, report: &mut LayoutReport) {
        // every index inside the box resolves through the table
        if let Err(error) = self.table.ensure_len(self.nr_of_lights) {
            report.warn(error);
        }

        self.stats = self.table.stats(&self.pool);
        self.stats.suppressed = self.suppressed;
        self.stats.unmapped = self.unmapped;

        if self.geometry.size != self.prev_size {
            self.size_change = Some(self.prev_size);
            self.prev_size = self.geometry.size;
        }

        #[cfg(feature = "esp32-log")]
        println!(
            "[moonmap] layer {}x{}x{} ({}D): {} empty, {} one, {} many ({} lights), {} suppressed, {} dropped",
            self.geometry.size.x,
            self.geometry.size.y,
            self.geometry.size.z,
            self.geometry.dimension,
            self.stats.zero,
            self.stats.one,
            self.stats.many_slots,
            self.stats.many_lights,
            self.stats.suppressed,
            self.stats.unmapped
        );
    }

    /// Returns true if at least one physical light backs `index`
    pub fn is_mapped(&self, index: usize) -> bool {
        self.table.get(index).is_some_and(PhysMapEntry::is_mapped)
    }

    /// Read a value from the channels at `offset` of a virtual light.
    ///
    /// Virtual-only slots answer from their color cache, which only holds
    /// the RGB triple. Indices past the layer address the physical buffer
    /// directly; layer indices the table could not hold read as zero.
    pub fn read_pixel<T: ChannelValue>(&self, lights: &Lights, index: usize, offset: u8) -> T {
        let offset = usize::from(offset);
        let physical = match self.table.get(index) {
            Some(PhysMapEntry::NoPhysical(cache)) => {
                return read_cache(cache, offset, lights);
            }
            Some(PhysMapEntry::OnePhysical(physical)) => usize::from(physical),
            Some(PhysMapEntry::ManyPhysical(group)) => {
                let Some(&first) = self.pool.members(group).first() else {
                    return T::zero();
                };
                usize::from(first)
            }
            None if index < self.nr_of_lights => return T::zero(),
            None => index,
        };

        lights
            .light_channels(physical, offset, T::WIDTH)
            .map_or_else(T::zero, T::from_channels)
    }

    /// Write `bytes` to the channels at `offset` of a virtual light.
    ///
    /// Slots with several physical lights receive the same bytes on every
    /// light. Writes that do not fit the buffer are dropped.
    pub fn write_pixel(&mut self, lights: &mut Lights, index: usize, offset: u8, bytes: &[u8]) {
        let offset = usize::from(offset);
        match self.table.get(index) {
            Some(PhysMapEntry::NoPhysical(_)) => {
                if let Some(cache) = cache_from_bytes(offset, bytes, lights) {
                    self.table.store_cache(index, cache);
                }
            }
            Some(PhysMapEntry::OnePhysical(physical)) => {
                write_light(lights, usize::from(physical), offset, bytes);
            }
            Some(PhysMapEntry::ManyPhysical(group)) => {
                for &physical in self.pool.members(group) {
                    write_light(lights, usize::from(physical), offset, bytes);
                }
            }
            None if index < self.nr_of_lights => {}
            None => write_light(lights, index, offset, bytes),
        }
    }

    /// Write a single channel role, a no-op if the fixture lacks it
    pub fn write_role(&mut self, lights: &mut Lights, index: usize, role: ChannelRole, value: u8) {
        if let Some(offset) = lights.layout().offset(role) {
            self.write_pixel(lights, index, offset, &[value]);
        }
    }

    pub fn read_role(&self, lights: &Lights, index: usize, role: ChannelRole) -> u8 {
        lights
            .layout()
            .offset(role)
            .map_or(0, |offset| self.read_pixel(lights, index, offset))
    }

    /// Write a color to the main RGB triple.
    ///
    /// Fixtures with a white channel right after RGB get the common part
    /// of the color on white.
    pub fn write_rgb(&mut self, lights: &mut Lights, index: usize, color: Rgb) {
        let layout = *lights.layout();
        let Some(offset) = layout.rgb else {
            return;
        };
        if layout.white_follows_rgb() {
            self.write_pixel(lights, index, offset, &split_white(color));
        } else {
            self.write_pixel(lights, index, offset, &[color.r, color.g, color.b]);
        }
    }

    /// Read the main RGB triple, adding back a split off white channel
    pub fn read_rgb(&self, lights: &Lights, index: usize) -> Rgb {
        let layout = lights.layout();
        let Some(offset) = layout.rgb else {
            return Rgb::default();
        };
        if layout.white_follows_rgb() {
            let [r, g, b, white]: [u8; 4] = self.read_pixel(lights, index, offset);
            Rgb::new(
                r.saturating_add(white),
                g.saturating_add(white),
                b.saturating_add(white),
            )
        } else {
            self.read_pixel(lights, index, offset)
        }
    }

    /// Write a color to a secondary RGB triple (`Rgb1` to `Rgb3`)
    pub fn write_rgb_role(&mut self, lights: &mut Lights, index: usize, role: ChannelRole, color: Rgb) {
        if let Some(offset) = lights.layout().offset(role) {
            self.write_pixel(lights, index, offset, &[color.r, color.g, color.b]);
        }
    }
}

fn write_light(lights: &mut Lights, physical: usize, offset: usize, bytes: &[u8]) {
    if let Some(channels) = lights.light_channels_mut(physical, offset, bytes.len()) {
        channels.copy_from_slice(bytes);
    }
}

/// Cache a color write aimed at the main RGB triple.
///
/// Four byte writes are RGBW and fold white back into the color.
fn cache_from_bytes(offset: usize, bytes: &[u8], lights: &Lights) -> Option<Rgb14> {
    if lights.layout().rgb.map(usize::from) != Some(offset) {
        return None;
    }
    let color = match *bytes {
        [r, g, b] => Rgb::new(r, g, b),
        [r, g, b, white] => Rgb::new(
            r.saturating_add(white),
            g.saturating_add(white),
            b.saturating_add(white),
        ),
        _ => return None,
    };
    Some(Rgb14::from_rgb(color))
}

fn read_cache<T: ChannelValue>(cache: Rgb14, offset: usize, lights: &Lights) -> T {
    if T::WIDTH > 4 || lights.layout().rgb.map(usize::from) != Some(offset) {
        return T::zero();
    }
    let color = cache.to_rgb();
    let channels = [color.r, color.g, color.b, 0];
    T::from_channels(&channels[..T::WIDTH])
}

/// A virtual layer paired with the physical buffer it renders into.
///
/// Positions go through the render-time modifiers; positions that are
/// suppressed or outside the layer are ignored.
pub struct LayerCanvas<'a> {
    layer: &'a mut VirtualLayer,
    lights: &'a mut Lights,
}

impl<'a> LayerCanvas<'a> {
    pub fn new(layer: &'a mut VirtualLayer, lights: &'a mut Lights) -> Self {
        Self { layer, lights }
    }

    pub fn layer(&self) -> &VirtualLayer {
        &*self.layer
    }

    pub fn lights(&self) -> &Lights {
        &*self.lights
    }

    pub fn size(&self) -> Coord3D {
        self.layer.size()
    }

    pub fn set_rgb(&mut self, position: Coord3D, color: Rgb) {
        if let Some(index) = self.layer.resolved_index(position) {
            self.layer.write_rgb(self.lights, index, color);
        }
    }

    pub fn get_rgb(&self, position: Coord3D) -> Rgb {
        self.layer
            .resolved_index(position)
            .map_or_else(Rgb::default, |index| self.layer.read_rgb(&*self.lights, index))
    }

    pub fn set_rgb1(&mut self, position: Coord3D, color: Rgb) {
        self.set_rgb_role(position, ChannelRole::Rgb1, color);
    }

    pub fn set_rgb2(&mut self, position: Coord3D, color: Rgb) {
        self.set_rgb_role(position, ChannelRole::Rgb2, color);
    }

    pub fn set_rgb3(&mut self, position: Coord3D, color: Rgb) {
        self.set_rgb_role(position, ChannelRole::Rgb3, color);
    }

    pub fn set_white(&mut self, position: Coord3D, value: u8) {
        self.set_role(position, ChannelRole::White, value);
    }

    pub fn get_white(&self, position: Coord3D) -> u8 {
        self.get_role(position, ChannelRole::White)
    }

    pub fn set_pan(&mut self, position: Coord3D, value: u8) {
        self.set_role(position, ChannelRole::Pan, value);
    }

    pub fn set_tilt(&mut self, position: Coord3D, value: u8) {
        self.set_role(position, ChannelRole::Tilt, value);
    }

    pub fn set_zoom(&mut self, position: Coord3D, value: u8) {
        self.set_role(position, ChannelRole::Zoom, value);
    }

    pub fn set_rotate(&mut self, position: Coord3D, value: u8) {
        self.set_role(position, ChannelRole::Rotate, value);
    }

    pub fn set_gobo(&mut self, position: Coord3D, value: u8) {
        self.set_role(position, ChannelRole::Gobo, value);
    }

    /// Set the dimmer channel, scaled by the global brightness
    pub fn set_brightness(&mut self, position: Coord3D, value: u8) {
        let scaled = scale8(value, self.lights.brightness());
        self.set_role(position, ChannelRole::Brightness, scaled);
    }

    /// Paint every virtual light, bypassing render-time transforms
    pub fn fill_rgb(&mut self, color: Rgb) {
        for index in 0..self.layer.nr_of_lights() {
            self.layer.write_rgb(self.lights, index, color);
        }
    }

    /// Dim every virtual light by `amount` (255 = black)
    pub fn fade_to_black_by(&mut self, amount: u8) {
        for index in 0..self.layer.nr_of_lights() {
            let color = self.layer.read_rgb(self.lights, index);
            let faded = scale_rgb(color, u8::MAX - amount);
            self.layer.write_rgb(self.lights, index, faded);
        }
    }

    /// Run every ripple modifier of the layer for an effect that draws
    /// `effect_dimension` axes
    pub fn ripple(&mut self, effect_dimension: u8) {
        let ripples: Vec<RippleYZModifier, MAX_MODIFIERS> = self
            .layer
            .modifiers()
            .iter()
            .filter_map(|modifier| match modifier {
                ModifierSlot::RippleYZ(ripple) => Some(*ripple),
                _ => None,
            })
            .collect();
        for ripple in &ripples {
            ripple.ripple(self, effect_dimension);
        }
    }

    pub fn set_role(&mut self, position: Coord3D, role: ChannelRole, value: u8) {
        if let Some(index) = self.layer.resolved_index(position) {
            self.layer.write_role(self.lights, index, role, value);
        }
    }

    pub fn get_role(&self, position: Coord3D, role: ChannelRole) -> u8 {
        self.layer
            .resolved_index(position)
            .map_or(0, |index| self.layer.read_role(&*self.lights, index, role))
    }

    fn set_rgb_role(&mut self, position: Coord3D, role: ChannelRole, color: Rgb) {
        if let Some(index) = self.layer.resolved_index(position) {
            self.layer.write_rgb_role(self.lights, index, role, color);
        }
    }
}
