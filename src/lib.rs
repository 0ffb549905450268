#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod channels;
pub mod color;
pub mod config;
pub mod coord;
pub mod error;
pub mod front;
pub mod gate;
pub mod layout;
pub mod lights;
pub mod math8;
pub mod modifier;
pub mod output;
pub mod physical_layer;
pub mod physmap;
pub mod pins;
pub mod request;
pub mod table;
pub mod virtual_layer;

pub use channels::{ChannelLayout, ChannelRole, ChannelValue, LightPreset};
pub use config::PhysicalLayerConfig;
pub use coord::Coord3D;
pub use error::{CapacityKind, LayoutError, LayoutReport};
pub use front::{FrameSnapshot, FrontBuffer};
pub use gate::{BufferReadiness, ReadinessGate};
pub use layout::{
    CubeLayout, LayoutSink, LayoutSlot, LightSource, PanelLayout, PanelsLayout, RingsLayout,
    StripLayout, WheelLayout,
};
pub use lights::Lights;
pub use modifier::{LayerGeometry, Modifier, ModifierId, ModifierSlot};
pub use output::{OutputDriver, OutputFrame, OutputScheduler};
pub use physical_layer::{LayoutPass, PhysicalLayer};
pub use physmap::{PackedPhysMap, PhysMapEntry};
pub use pins::{PinAssignment, PinGroup};
pub use request::{LayoutKind, LayoutRequester, LayoutRequests};
pub use table::{IndirectionTable, ManyPhysicalPool, MappingStats};
pub use virtual_layer::{LayerCanvas, VirtualLayer};

pub use color::Rgb;
pub use embassy_time::{Duration, Instant};
