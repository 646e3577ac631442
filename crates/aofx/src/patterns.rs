use glam::IVec4;

pub(crate) const NUM_ROTATIONS: usize = 64;
pub(crate) const NUM_PATTERNS: usize = 32;

/// Maps the flat pattern index onto a spiral-ish cell order so that
/// neighbouring taps land in distant cells.
const ADDRESS_MAP: [usize; NUM_PATTERNS] = [
    24, 16, 25, 26, //
    8, 9, 17, 27, //
    0, 1, 10, 18, //
    2, 3, 11, 19, //
    4, 5, 12, 20, //
    6, 7, 13, 21, //
    14, 15, 22, 28, //
    29, 23, 30, 31, //
];

/// Tap offsets for the random tap types, generated once at initialization.
/// `uniform_taps` feeds a uniform buffer (16 byte aligned entries);
/// `buffer_taps` feeds a storage buffer of packed `i8` pairs.
pub(crate) struct SamplePatterns {
    pub uniform_taps: Vec<IVec4>,
    pub buffer_taps: Vec<[i8; 2]>,
}

/// The MSVC LCG; matches the sequence the precomputed kernels were tuned
/// against.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(214013).wrapping_add(2531011);
        (self.0 >> 16) & 0x7fff
    }

    fn next_f32(&mut self) -> f32 {
        (self.next() & 0xffff) as f32 / 0xffff as f32
    }
}

/// Integer-hash noise in [-1, 1], used only to chain per-rotation seeds.
fn noise(seed: u32) -> f32 {
    let n = (seed << 13) ^ seed;
    let n = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789_221))
        .wrapping_add(1_376_312_589)
        & 0x7fff_ffff;
    1.0 - n as f32 / 1_073_741_824.0
}

impl SamplePatterns {
    pub fn generate() -> Self {
        let mut uniform_taps = vec![IVec4::splat(-1); NUM_ROTATIONS * NUM_PATTERNS];
        let mut buffer_taps = vec![[-1i8; 2]; NUM_ROTATIONS * NUM_PATTERNS];

        let mut fnoise = noise(0xdead_beaf);
        for rotation in 0..NUM_ROTATIONS {
            let seed = noise(fnoise.to_bits());
            let mut lcg = Lcg(seed.to_bits());
            fnoise = seed;

            // Jitter one tap inside each cell of an 8x8 grid centered on the
            // pixel, in units of 4 texels.
            for i in 0..NUM_PATTERNS {
                let base_x = (i % 4) as f32;
                let base_y = (i / 4) as f32 - 4.0;

                let x = lcg.next_f32() * 4.0;
                let y = lcg.next_f32() * 4.0;

                let tap_x = (base_x * 4.0 + x) as i32;
                let tap_y = (base_y * 4.0 + y) as i32;

                let at = rotation * NUM_PATTERNS + ADDRESS_MAP[i];
                uniform_taps[at].x = tap_x;
                uniform_taps[at].y = tap_y;
                buffer_taps[at] = [tap_x as i8, tap_y as i8];
            }
        }

        Self {
            uniform_taps,
            buffer_taps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = SamplePatterns::generate();
        let b = SamplePatterns::generate();
        assert_eq!(a.uniform_taps, b.uniform_taps);
        assert_eq!(a.buffer_taps, b.buffer_taps);
    }

    #[test]
    fn every_pattern_slot_is_written() {
        let patterns = SamplePatterns::generate();
        assert_eq!(patterns.uniform_taps.len(), NUM_ROTATIONS * NUM_PATTERNS);
        for (i4, i8) in patterns.uniform_taps.iter().zip(&patterns.buffer_taps) {
            assert_eq!(i4.x, i8[0] as i32);
            assert_eq!(i4.y, i8[1] as i32);
            // Taps stay inside the 8x8 cell grid (16 texels per half axis).
            assert!((-16..16).contains(&i4.x));
            assert!((-16..16).contains(&i4.y));
        }
    }
}
