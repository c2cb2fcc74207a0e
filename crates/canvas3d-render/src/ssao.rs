//! Sample sets for screen-space ambient occlusion.

use crate::rng::SimpleRng;
use glam::Vec3;

/// Edge length of the tiled rotation-noise texture.
pub const NOISE_SIZE: u32 = 4;

/// Hemisphere offsets around +Z, packed as `vec4` with `w = 0`.
///
/// Samples are denser near the origin: sample `i` of `n` is scaled by
/// `lerp(0.1, 1.0, (i / n)^2)`.
pub fn kernel(size: usize, rng: &mut SimpleRng) -> Vec<[f32; 4]> {
    (0..size)
        .map(|i| {
            let direction = Vec3::new(rng.next_signed(), rng.next_signed(), rng.next_unit())
                .try_normalize()
                .unwrap_or(Vec3::Z);
            let t = i as f32 / size as f32;
            let scale = 0.1 + 0.9 * t * t;
            let v = direction * rng.next_unit() * scale;
            [v.x, v.y, v.z, 0.0]
        })
        .collect()
}

/// Random rotations about +Z for a `NOISE_SIZE`² tile, row-major RGBA.
pub fn noise(rng: &mut SimpleRng) -> Vec<[f32; 4]> {
    (0..NOISE_SIZE * NOISE_SIZE)
        .map(|_| [rng.next_signed(), rng.next_signed(), 0.0, 0.0])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_in_hemisphere() {
        let mut rng = SimpleRng::new(42);
        let kernel = kernel(32, &mut rng);
        assert_eq!(kernel.len(), 32);
        for s in &kernel {
            let v = Vec3::new(s[0], s[1], s[2]);
            assert!(v.z >= 0.0);
            assert!(v.length() <= 1.0 + 1e-6);
            assert_eq!(s[3], 0.0);
        }
    }

    #[test]
    fn test_kernel_grows_outward() {
        let mut rng = SimpleRng::new(3);
        let kernel = kernel(64, &mut rng);
        let head = Vec3::from_slice(&kernel[0][..3]).length();
        assert!(head <= 0.1 + 1e-6);
    }

    #[test]
    fn test_noise_lies_in_plane() {
        let mut rng = SimpleRng::new(9);
        let noise = noise(&mut rng);
        assert_eq!(noise.len(), (NOISE_SIZE * NOISE_SIZE) as usize);
        assert!(noise.iter().all(|n| n[2] == 0.0));
    }
}
