//! Procedural hatching volume.
//!
//! A stack of tileable single-channel slices ordered from darkest to
//! lightest. The line shader samples it with the lit intensity as the third
//! coordinate, so darker surfaces get denser strokes.

/// Edge length of each slice in texels.
pub const HATCHING_SIZE: u32 = 64;
/// Number of tone slices.
pub const HATCHING_LEVELS: u32 = 8;

/// Stroke period in texels. Must divide the slice size for seamless tiling.
const STROKE_PERIOD: u32 = 8;

/// Build a `size × size × levels` R8 volume, slice after slice.
pub fn hatching_volume(size: u32, levels: u32) -> Vec<u8> {
    let mut data = vec![u8::MAX; (size * size * levels) as usize];
    for level in 0..levels {
        let darkness = 1.0 - (level as f32 + 0.5) / levels as f32;
        let width = 1 + (darkness * 2.0) as u32;
        let slice = &mut data[(level * size * size) as usize..((level + 1) * size * size) as usize];
        for y in 0..size {
            for x in 0..size {
                let diagonal = darkness > 0.15 && (x + y) % STROKE_PERIOD < width;
                let cross = darkness > 0.45 && (x + size - y) % STROKE_PERIOD < width;
                let horizontal = darkness > 0.75 && y % (STROKE_PERIOD / 2) == 0;
                if diagonal || cross || horizontal {
                    slice[(y * size + x) as usize] = 0;
                }
            }
        }
    }
    data
}
