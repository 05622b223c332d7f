//! CRC-32 (IEEE, reflected) as used by SC3D chunk trailers.

use std::sync::OnceLock;

pub const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;
pub const CRC32_SEED: u32 = 0xFFFF_FFFF;

static CRC_TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn crc_table() -> &'static [u32; 256] {
    CRC_TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut c = i as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 { CRC32_POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            }
            *entry = c;
        }
        table
    })
}

/// Runs the CRC over `data` starting from `seed` and returns the complemented result.
///
/// A zero seed selects [`CRC32_SEED`].
pub fn compute(data: &[u8], seed: u32) -> u32 {
    let table = crc_table();
    let mut c = if seed == 0 { CRC32_SEED } else { seed };
    for &b in data {
        c = table[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    !c
}

#[inline]
pub fn crc32(data: &[u8]) -> u32 { compute(data, CRC32_SEED) }
