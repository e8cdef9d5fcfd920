//! Tray icon generation.
//!
//! Draws the speaker glyph into an RGBA buffer at runtime instead of
//! shipping image assets. Two variants exist because the icon sits on the
//! taskbar: a dark taskbar gets a white glyph, a light taskbar a black one.

/// Icon size in pixels.
pub const ICON_SIZE: u32 = 32;

/// Generate the speaker tray icon as RGBA data. `light` selects the white
/// glyph used on dark taskbars.
pub fn speaker_icon_rgba(light: bool) -> Vec<u8> {
    let size = ICON_SIZE as usize;
    let mut rgba = vec![0u8; size * size * 4];

    let shade: u8 = if light { 255 } else { 0 };

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            if in_speaker_body(x as f32, y as f32) || in_sound_wave(x as f32, y as f32) {
                rgba[idx] = shade;
                rgba[idx + 1] = shade;
                rgba[idx + 2] = shade;
                rgba[idx + 3] = 255;
            }
        }
    }

    rgba
}

/// Speaker silhouette: a small box driver with a cone widening to the left.
fn in_speaker_body(x: f32, y: f32) -> bool {
    // Driver box
    if (11.0..=15.0).contains(&x) && (11.0..=21.0).contains(&y) {
        return true;
    }
    // Cone, widening from the box toward the left edge
    if (5.0..11.0).contains(&x) {
        let spread = 11.0 - x;
        return (11.0 - spread..=21.0 + spread).contains(&y);
    }
    false
}

/// Two arcs radiating from the driver, drawn as ring segments.
fn in_sound_wave(x: f32, y: f32) -> bool {
    let dx = x - 15.0;
    let dy = y - 16.0;
    if dx < 2.5 {
        return false;
    }
    let dist = (dx * dx + dy * dy).sqrt();
    let on_inner = (dist - 6.5).abs() < 1.2;
    let on_outer = (dist - 10.5).abs() < 1.2;
    // Limit the arcs to a wedge so they read as sound waves
    (on_inner || on_outer) && dy.abs() < dist * 0.72
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_has_expected_dimensions() {
        let rgba = speaker_icon_rgba(true);
        assert_eq!(rgba.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
    }

    #[test]
    fn glyph_is_not_empty() {
        let rgba = speaker_icon_rgba(true);
        let opaque = rgba.chunks(4).filter(|px| px[3] == 255).count();
        assert!(opaque > 50, "expected a visible glyph, got {opaque} pixels");
    }

    #[test]
    fn variants_share_shape_but_differ_in_shade() {
        let light = speaker_icon_rgba(true);
        let dark = speaker_icon_rgba(false);

        let light_mask: Vec<u8> = light.chunks(4).map(|px| px[3]).collect();
        let dark_mask: Vec<u8> = dark.chunks(4).map(|px| px[3]).collect();
        assert_eq!(light_mask, dark_mask);

        let lit = light.chunks(4).find(|px| px[3] == 255).unwrap();
        let unlit = dark.chunks(4).find(|px| px[3] == 255).unwrap();
        assert_eq!(lit[0], 255);
        assert_eq!(unlit[0], 0);
    }
}
