//! Physical layer - the layout orchestrator
//!
//! Owns the physical buffer, the light sources, and the virtual layers.
//! A relayout runs in two passes:
//! 1. physical discovery: every light source reports its lights, which
//!    fixes the light count, the bounding box and the pin groups
//! 2. virtual projection: every virtual layer rebuilds its indirection
//!    table from the same walk, sized by the bounding box of pass 1
//!
//! Requests only set flags. The work happens in
//! [`PhysicalLayer::run_pending_layout`], once per control-loop tick.
//!
//! The output side only ever sees the [`FrontBuffer`]: the position
//! triples of a finished discovery, then the colors of every
//! [`PhysicalLayer::publish`].

use alloc::vec::Vec;
use embassy_time::Instant;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::channels::LightPreset;
use crate::config::PhysicalLayerConfig;
use crate::coord::Coord3D;
use crate::error::{CapacityKind, LayoutError, LayoutReport};
use crate::front::FrontBuffer;
use crate::gate::{Acquisition, BufferReadiness, ReadinessGate};
use crate::layout::{LayoutSink, LayoutSlot, LightSource};
use crate::lights::Lights;
use crate::modifier::{Modifier, ModifierSlot};
use crate::pins::{PinGroup, PinTable};
use crate::request::{LayoutKind, LayoutRequests, PendingLayout};
use crate::virtual_layer::{LayerCanvas, VirtualLayer};

/// Maximum number of virtual layers
pub const MAX_LAYERS: usize = 4;

/// Largest coordinate stored in the position triple
const MAX_ENCODED_POSITION: i32 = u8::MAX as i32;

/// Bytes per light during discovery, whatever the stride
pub const POSITION_BYTES: usize = 3;

/// Pass currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LayoutPass {
    /// Physical discovery
    Physical = 1,
    /// Virtual projection
    Virtual = 2,
}

pub struct PhysicalLayer<'a> {
    config: PhysicalLayerConfig,
    lights: Lights,
    sources: Vec<LayoutSlot>,
    layers: heapless::Vec<VirtualLayer, MAX_LAYERS>,
    pins: PinTable,
    front: &'a FrontBuffer,
    requests: &'a LayoutRequests,
    pending: PendingLayout,
    report: LayoutReport,

    // state of the running pass
    pass: Option<LayoutPass>,
    index: usize,
    ceiling: usize,
    clamped: bool,
    bbox: Coord3D,

    prev_size: Coord3D,
    size_change: Option<Coord3D>,
}

impl<'a> PhysicalLayer<'a> {
    /// Create the physical layer and allocate its buffers.
    ///
    /// Other tasks request relayouts through `requests` and read frames
    /// from `front`.
    pub fn new(
        config: &PhysicalLayerConfig,
        requests: &'a LayoutRequests,
        front: &'a FrontBuffer,
    ) -> Self {
        let mut lights = Lights::allocate(config.max_channels, config.light_preset.layout());
        lights.set_brightness(config.brightness);
        if !front.allocate(lights.max_channels()) {
            // frames are cut to what the front buffer holds
            #[cfg(feature = "esp32-log")]
            println!("[moonmap] front buffer smaller than {} bytes", lights.max_channels());
        }

        Self {
            config: config.clone(),
            lights,
            sources: Vec::new(),
            layers: heapless::Vec::new(),
            pins: PinTable::new(),
            front,
            requests,
            pending: PendingLayout::default(),
            report: LayoutReport::default(),
            pass: None,
            index: 0,
            ceiling: 0,
            clamped: false,
            bbox: Coord3D::ZERO,
            prev_size: Coord3D::ZERO,
            size_change: None,
        }
    }

    pub const fn config(&self) -> &PhysicalLayerConfig {
        &self.config
    }

    pub const fn lights(&self) -> &Lights {
        &self.lights
    }

    /// Mutable buffer access for drivers and tests
    pub fn lights_mut(&mut self) -> &mut Lights {
        &mut self.lights
    }

    pub const fn nr_of_lights(&self) -> usize {
        self.lights.nr_of_lights()
    }

    /// Bounding box size of the last physical pass
    pub const fn size(&self) -> Coord3D {
        self.lights.size()
    }

    pub fn pins(&self) -> &[PinGroup] {
        self.pins.groups()
    }

    pub const fn front(&self) -> &FrontBuffer {
        self.front
    }

    pub const fn gate(&self) -> &ReadinessGate {
        self.front.gate()
    }

    pub fn readiness(&self) -> BufferReadiness {
        self.front.readiness()
    }

    pub const fn pass(&self) -> Option<LayoutPass> {
        self.pass
    }

    /// Passes requested on this layer and not yet run
    pub fn pending(&self) -> PendingLayout {
        self.pending.merge(self.requests.peek())
    }

    /// Previous size, once, after a physical pass changed the bounding box
    pub fn take_size_change(&mut self) -> Option<Coord3D> {
        self.size_change.take()
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.config.brightness = brightness;
        self.lights.set_brightness(brightness);
    }

    pub const fn light_preset(&self) -> LightPreset {
        self.config.light_preset
    }

    /// Switch the channel layout. The stride changes the meaning of the
    /// whole buffer, so the lights are rediscovered.
    pub fn set_light_preset(&mut self, preset: LightPreset) {
        if preset == self.config.light_preset {
            return;
        }
        self.config.light_preset = preset;
        self.lights.set_layout(preset.layout());
        self.request_layout(LayoutKind::Physical);
    }

    /// Ask for a relayout at the next [`Self::run_pending_layout`]
    pub fn request_layout(&mut self, kind: LayoutKind) {
        #[cfg(feature = "esp32-log")]
        println!("[moonmap] {:?} layout requested", kind);
        self.pending.request(kind);
    }

    pub fn sources(&self) -> &[LayoutSlot] {
        &self.sources
    }

    /// Register a light source after the existing ones
    pub fn add_source(&mut self, source: LayoutSlot) -> Result<(), LayoutError> {
        self.sources
            .try_reserve(1)
            .map_err(|_| LayoutError::Allocation {
                requested: self.sources.len() + 1,
            })?;
        self.sources.push(source);
        self.request_layout(LayoutKind::Physical);
        Ok(())
    }

    pub fn remove_source(&mut self, index: usize) -> Option<LayoutSlot> {
        if index >= self.sources.len() {
            return None;
        }
        self.request_layout(LayoutKind::Physical);
        Some(self.sources.remove(index))
    }

    /// Change a light source in place and rediscover the lights
    pub fn update_source<R>(&mut self, index: usize, f: impl FnOnce(&mut LayoutSlot) -> R) -> Option<R> {
        let result = f(self.sources.get_mut(index)?);
        self.request_layout(LayoutKind::Physical);
        Some(result)
    }

    pub fn layers(&self) -> &[VirtualLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&VirtualLayer> {
        self.layers.get(index)
    }

    /// Direct access to a layer.
    ///
    /// Modifier changes made through it need an explicit
    /// [`Self::request_layout`].
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut VirtualLayer> {
        self.layers.get_mut(index)
    }

    /// Add a virtual layer, returning its index.
    ///
    /// Hands the layer back if all slots are taken.
    pub fn add_layer(&mut self, layer: VirtualLayer) -> Result<usize, VirtualLayer> {
        self.layers.push(layer)?;
        self.request_layout(LayoutKind::Virtual);
        Ok(self.layers.len() - 1)
    }

    pub fn remove_layer(&mut self, index: usize) -> Option<VirtualLayer> {
        if index >= self.layers.len() {
            return None;
        }
        Some(self.layers.remove(index))
    }

    /// Attach a modifier to a layer and request the passes it needs.
    ///
    /// Hands the modifier back if the layer does not exist or is full.
    pub fn attach_modifier(&mut self, layer: usize, modifier: ModifierSlot) -> Result<(), ModifierSlot> {
        let Some(target) = self.layers.get_mut(layer) else {
            return Err(modifier);
        };
        let kind = modifier_layout_kind(&modifier);
        target.add_modifier(modifier)?;
        self.request_layout(kind);
        Ok(())
    }

    pub fn detach_modifier(&mut self, layer: usize, index: usize) -> Option<ModifierSlot> {
        let modifier = self.layers.get_mut(layer)?.remove_modifier(index)?;
        self.request_layout(modifier_layout_kind(&modifier));
        Some(modifier)
    }

    /// Change a modifier's settings and request the passes it needs
    pub fn update_modifier<R>(
        &mut self,
        layer: usize,
        index: usize,
        f: impl FnOnce(&mut ModifierSlot) -> R,
    ) -> Option<R> {
        let modifier = self.layers.get_mut(layer)?.modifier_mut(index)?;
        let result = f(&mut *modifier);
        let kind = modifier_layout_kind(modifier);
        self.request_layout(kind);
        Some(result)
    }

    /// Render access to one layer.
    ///
    /// `None` while a pass runs or while discovered positions wait for
    /// the output side.
    pub fn canvas(&mut self, layer: usize) -> Option<LayerCanvas<'_>> {
        if !self.readiness().accepts_effects() {
            return None;
        }
        let layer = self.layers.get_mut(layer)?;
        Some(LayerCanvas::new(layer, &mut self.lights))
    }

    /// Hand the rendered colors to the output side.
    ///
    /// Returns false while positions are not yet acknowledged.
    pub fn publish(&mut self) -> bool {
        let (acquisition, published) = self.front.publish(&self.lights, &self.pins);
        self.note_acquisition(acquisition);
        published
    }

    /// Advance time driven modifiers of every layer
    pub fn tick(&mut self, now: Instant) {
        for layer in &mut self.layers {
            layer.tick(now);
        }
    }

    /// Run the requested passes.
    ///
    /// The physical pass always completes, including its readiness
    /// transition, before the virtual pass starts.
    pub fn run_pending_layout(&mut self) -> LayoutReport {
        let pending = self.pending.merge(self.requests.take());
        self.pending = PendingLayout::default();

        if pending.physical {
            self.run_physical_pass();
        }
        if pending.virtual_pass {
            self.run_virtual_pass();
        }

        let mut report = core::mem::take(&mut self.report);
        report.physical = pending.physical;
        report.virtual_pass = pending.virtual_pass;
        report.lights = self.lights.nr_of_lights();
        report
    }

    /// Register one light. Only valid during the physical pass.
    pub fn add_physical_light(&mut self, position: Coord3D) {
        if self.pass != Some(LayoutPass::Physical) {
            self.report.warn(LayoutError::InvalidPass);
            return;
        }

        if self.index >= self.ceiling {
            if !self.clamped {
                self.clamped = true;
                #[cfg(feature = "esp32-log")]
                println!("[moonmap] light ceiling {} reached, ignoring the rest", self.ceiling);
                self.report.warn(LayoutError::CapacityExceeded {
                    kind: CapacityKind::LightCeiling,
                    index: self.index,
                });
            }
            return;
        }

        self.bbox = self.bbox.maximum(position);
        // packed back to back, independent of the stride
        let start = self.index * POSITION_BYTES;
        if let Some(triple) = self
            .lights
            .channels_mut()
            .get_mut(start..start + POSITION_BYTES)
        {
            triple.copy_from_slice(&encode_position(position));
        }
        self.index += 1;
    }

    /// Close the current pin group. Only valid during the physical pass.
    pub fn advance_pin(&mut self, pin: Option<u8>) {
        if self.pass != Some(LayoutPass::Physical) {
            self.report.warn(LayoutError::InvalidPass);
            return;
        }
        if let Err(error) = self.pins.advance(pin, self.index) {
            self.report.warn(error);
        }
    }

    fn run_physical_pass(&mut self) {
        #[cfg(feature = "esp32-log")]
        println!("[moonmap] physical pass");

        self.pass = Some(LayoutPass::Physical);
        let acquisition = self.front.gate().transition(BufferReadiness::InProgress);
        self.note_acquisition(acquisition);

        self.lights.clear();
        self.pins.reset();
        self.index = 0;
        self.clamped = false;
        self.bbox = Coord3D::ZERO;
        self.ceiling = self
            .config
            .effective_ceiling(self.lights.max_channels(), self.lights.stride());

        self.walk_sources();

        if let Err(error) = self.pins.finish(self.index) {
            self.report.warn(error);
        }

        let nr_of_lights = self.index;
        let size = if nr_of_lights > 0 {
            self.bbox + Coord3D::ONE
        } else {
            Coord3D::ZERO
        };
        self.lights.set_geometry(nr_of_lights, size);

        if size != self.prev_size {
            self.size_change = Some(self.prev_size);
            self.prev_size = size;
        }

        let readiness = if nr_of_lights > 0 {
            BufferReadiness::PositionsReady
        } else {
            BufferReadiness::PositionsEmpty
        };
        let positions = self
            .lights
            .channels()
            .get(..nr_of_lights * POSITION_BYTES)
            .unwrap_or_default();
        let acquisition = self
            .front
            .publish_positions(positions, &self.lights, &self.pins, readiness);
        self.note_acquisition(acquisition);
        // effects start from black
        self.lights.clear();
        self.pass = None;

        #[cfg(feature = "esp32-log")]
        println!(
            "[moonmap] {} lights, box {}x{}x{}, {} channels, {} pins",
            nr_of_lights,
            size.x,
            size.y,
            size.z,
            self.lights.nr_of_channels(),
            self.pins.groups().len()
        );
    }

    fn run_virtual_pass(&mut self) {
        #[cfg(feature = "esp32-log")]
        println!("[moonmap] virtual pass, {} layers", self.layers.len());

        self.pass = Some(LayoutPass::Virtual);
        let size = self.lights.size();
        for layer in &mut self.layers {
            layer.on_layout_begin(size);
        }

        self.index = 0;
        self.walk_sources();

        for layer in &mut self.layers {
            layer.on_layout_end(&mut self.report);
        }
        self.pass = None;
    }

    fn project_light(&mut self, position: Coord3D) {
        let physical = self.index;
        self.index += 1;
        // lights ignored by the physical pass
        if physical >= self.lights.nr_of_lights() {
            return;
        }
        for layer in &mut self.layers {
            layer.add_light(position, physical, &mut self.lights, &mut self.report);
        }
    }

    fn walk_sources(&mut self) {
        let mut sources = core::mem::take(&mut self.sources);
        for source in &mut sources {
            source.on_layout(self);
        }
        self.sources = sources;
    }

    fn note_acquisition(&mut self, acquisition: Acquisition) {
        if acquisition.is_contended() {
            self.report.warn(LayoutError::LockContention);
        }
    }
}

impl LayoutSink for PhysicalLayer<'_> {
    fn add_light(&mut self, position: Coord3D) {
        match self.pass {
            Some(LayoutPass::Physical) => self.add_physical_light(position),
            Some(LayoutPass::Virtual) => self.project_light(position),
            None => self.report.warn(LayoutError::InvalidPass),
        }
    }

    fn next_pin(&mut self, pin: Option<u8>) {
        // pin groups are already known during the virtual pass
        if self.pass == Some(LayoutPass::Physical) {
            self.advance_pin(pin);
        }
    }
}

/// Modifiers that move pixels at render time change what every consumer
/// sees, so they trigger a full relayout
fn modifier_layout_kind(modifier: &ModifierSlot) -> LayoutKind {
    if modifier.affects_rendering() {
        LayoutKind::Physical
    } else {
        LayoutKind::Virtual
    }
}

/// Position triple written to the buffer during discovery
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_position(position: Coord3D) -> [u8; 3] {
    let clamp = |value: i32| value.clamp(0, MAX_ENCODED_POSITION) as u8;
    [clamp(position.x), clamp(position.y), clamp(position.z)]
}
