//! Normalized color conversions for 32- and 16-bit pixels.
//!
//! These mirror the WGSL helpers in `shader/shaders/common.wgsl` operation for
//! operation; the software backend and the tests rely on them agreeing.

/// Quantizes a normalized alpha to 8 bits for the alpha test (truncating, clamped).
///
/// Truncation matches the hardware's integer combine: 0x80 modulated by 0x80 stays
/// 0x80 even though the float product lands slightly above 128/255.
#[inline]
pub fn quantize_alpha(alpha: f32) -> u32 {
    (alpha.clamp(0.0, 1.0) * 255.0) as u32
}

#[inline]
fn encode_channel(c: f32, max: f32) -> u32 {
    (c.clamp(0.0, 1.0) * max + 0.5) as u32
}

/// Decodes a 32-bit ABGR pixel (R in the low byte) into normalized RGBA.
#[inline]
pub fn psm32_to_color(pixel: u32) -> [f32; 4] {
    [
        (pixel & 0xFF) as f32 / 255.0,
        ((pixel >> 8) & 0xFF) as f32 / 255.0,
        ((pixel >> 16) & 0xFF) as f32 / 255.0,
        (pixel >> 24) as f32 / 255.0,
    ]
}

/// Encodes normalized RGBA into a 32-bit pixel.
#[inline]
pub fn color_to_psm32(color: [f32; 4]) -> u32 {
    let [r, g, b, a] = color.map(|c| encode_channel(c, 255.0));
    r | (g << 8) | (b << 16) | (a << 24)
}

/// Decodes a 16-bit A1B5G5R5 pixel; alpha is 0.0 or 1.0.
#[inline]
pub fn psm16_to_color(pixel: u32) -> [f32; 4] {
    [
        (pixel & 0x1F) as f32 / 31.0,
        ((pixel >> 5) & 0x1F) as f32 / 31.0,
        ((pixel >> 10) & 0x1F) as f32 / 31.0,
        ((pixel >> 15) & 1) as f32,
    ]
}

/// Encodes normalized RGBA into a 16-bit pixel.
///
/// The alpha bit is the top bit of the 8-bit encoded alpha.
#[inline]
pub fn color_to_psm16(color: [f32; 4]) -> u32 {
    let [r, g, b, _] = color.map(|c| encode_channel(c, 31.0));
    let a = encode_channel(color[3], 255.0) >> 7;
    r | (g << 5) | (b << 10) | (a << 15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn psm16_round_trips_every_value() {
        for raw in 0..=0xFFFFu32 {
            assert_eq!(color_to_psm16(psm16_to_color(raw)), raw, "0x{raw:04X}");
        }
    }

    #[test]
    fn psm32_round_trips_every_channel_value() {
        for v in 0..=0xFFu32 {
            for shift in [0, 8, 16, 24] {
                let raw = v << shift;
                assert_eq!(color_to_psm32(psm32_to_color(raw)), raw);
            }
            let mixed = v | ((255 - v) << 8) | ((v ^ 0x5A) << 16) | ((v / 3) << 24);
            assert_eq!(color_to_psm32(psm32_to_color(mixed)), mixed);
        }
    }

    #[test]
    fn psm24_keeps_low_bits_and_drops_alpha() {
        let raw = 0x00AB_CDEF;
        let color = psm32_to_color(raw);
        assert_eq!(color[3], 0.0);
        assert_eq!(color_to_psm32(color) & 0x00FF_FFFF, raw);
    }

    #[test]
    fn out_of_range_channels_saturate() {
        assert_eq!(color_to_psm32([2.0, -1.0, 0.5, 1.0]), 0xFF80_00FF);
        assert_eq!(color_to_psm16([1.5, 0.0, 0.0, 0.49]), 0x001F);
    }

    #[test]
    fn alpha_quantization_truncates() {
        // Modulating 0x80 by 0x80 in float lands just above 128/255.
        let product = (128.0 / 255.0) * (128.0 / 255.0) * 2.0;
        assert!(product * 255.0 > 128.0);
        assert_eq!(quantize_alpha(product), 0x80);
        assert_eq!(quantize_alpha(0.999), 254);
        assert_eq!(quantize_alpha(2.0), 255);
        assert_eq!(quantize_alpha(-1.0), 0);
    }

    #[test]
    fn alpha_quantization_recovers_bytes() {
        for a in 0..=255u32 {
            assert_eq!(quantize_alpha(a as f32 / 255.0), a);
        }
    }
}
