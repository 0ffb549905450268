use embassy_time::Instant;

/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0)
///
/// Uses integer math for efficiency on embedded systems.
#[inline]
#[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// Sawtooth that wraps `bpm` times per minute, returned as 0-65535
#[allow(clippy::cast_possible_truncation)]
pub fn beat16(bpm: u8, now: Instant) -> u16 {
    // a whole minute is always a whole number of beats
    let millis = now.as_millis() % 60_000;
    ((millis * u64::from(bpm) * 65_536 / 60_000) & 0xFFFF) as u16
}

/// Map a 16-bit phase to whole degrees (0-359)
#[allow(clippy::cast_possible_truncation)]
pub const fn phase_to_degrees(phase: u16) -> u16 {
    ((phase as u32 * 360) >> 16) as u16
}

/// Base and slope of each quarter-wave section, interleaved
const SIN8_SECTIONS: [u8; 8] = [0, 49, 49, 41, 90, 27, 117, 10];

/// 8-bit sine: a full turn is 0-255, the result is centered on 128
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn sin8(theta: u8) -> u8 {
    let mut offset = theta;
    if theta & 0x40 != 0 {
        offset = 255 - offset;
    }
    offset &= 0x3F;

    let mut step = offset & 0x0F;
    if theta & 0x40 != 0 {
        step += 1;
    }

    let section = (offset >> 4) as usize * 2;
    let base = SIN8_SECTIONS[section] as i16;
    let slope = SIN8_SECTIONS[section + 1] as i16;

    let mut y = ((slope * step as i16) >> 4) + base;
    if theta & 0x80 != 0 {
        y = -y;
    }
    (y + 128) as u8
}

/// 8-bit cosine, see [`sin8`]
pub const fn cos8(theta: u8) -> u8 {
    sin8(theta.wrapping_add(64))
}
