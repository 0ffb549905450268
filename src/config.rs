use crate::channels::LightPreset;
use crate::physmap::MAX_PAYLOAD;

/// Number of lights a packed index can address
pub const MAX_PHYSICAL_LIGHTS: usize = MAX_PAYLOAD as usize + 1;

/// Light ceiling used when `safe_mode` is set
pub const SAFE_MODE_CEILING: usize = 1024;

/// Default physical buffer size: 4096 RGB lights
pub const DEFAULT_MAX_CHANNELS: usize = 4096 * 3;

/// Configuration for the physical layer
#[derive(Debug, Clone)]
pub struct PhysicalLayerConfig {
    /// Size of the physical buffer in bytes
    pub max_channels: usize,
    /// Lights past this count are ignored during discovery
    pub light_ceiling: usize,
    /// Cap the ceiling at [`SAFE_MODE_CEILING`], for boards recovering from a crash
    pub safe_mode: bool,
    pub light_preset: LightPreset,
    /// Global brightness applied to brightness channels
    pub brightness: u8,
}

impl Default for PhysicalLayerConfig {
    fn default() -> Self {
        Self {
            max_channels: DEFAULT_MAX_CHANNELS,
            light_ceiling: MAX_PHYSICAL_LIGHTS,
            safe_mode: false,
            light_preset: LightPreset::default(),
            brightness: u8::MAX,
        }
    }
}

impl PhysicalLayerConfig {
    /// Number of lights discovery may register with the given stride.
    ///
    /// Strides below 3 still reserve room for the 3-byte position triple.
    pub fn effective_ceiling(&self, max_channels: usize, channels_per_light: usize) -> usize {
        let mut ceiling = self.light_ceiling.min(MAX_PHYSICAL_LIGHTS);
        if self.safe_mode {
            ceiling = ceiling.min(SAFE_MODE_CEILING);
        }
        ceiling.min(max_channels / channels_per_light.max(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_takes_the_smallest_limit() {
        let config = PhysicalLayerConfig::default();
        assert_eq!(config.effective_ceiling(DEFAULT_MAX_CHANNELS, 3), 4096);
        assert_eq!(config.effective_ceiling(usize::MAX, 3), MAX_PHYSICAL_LIGHTS);
        assert_eq!(config.effective_ceiling(96, 32), 3);
        assert_eq!(config.effective_ceiling(30, 1), 10);

        let safe = PhysicalLayerConfig {
            safe_mode: true,
            ..PhysicalLayerConfig::default()
        };
        assert_eq!(safe.effective_ceiling(usize::MAX, 3), SAFE_MODE_CEILING);
    }
}
