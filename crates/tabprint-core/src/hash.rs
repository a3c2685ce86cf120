//! MurmurHash3 x64 128-bit and the visitor identifier derivation.
//!
//! The identifier is an identification primitive, not a security digest: it
//! needs speed and distribution over the population of realistic component
//! sets, not resistance against adversarial collision construction. The
//! rendered form is 32 lowercase hex characters and is stable for the life
//! of a major version — changing the hash function is a breaking change.

use crate::canonical::canonicalize;
use crate::component::Components;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// Derive the visitor identifier for a components record.
///
/// Canonicalizes the record (sorted keys, escaped delimiters) and hashes the
/// resulting string. Deterministic: the same record always produces the same
/// identifier, on any platform, in any iteration order.
pub fn hash_components(components: &Components) -> String {
    murmur3_x64_128_hex(canonicalize(components).as_bytes())
}

/// Hash `data` and render the 128-bit result as 32 lowercase hex characters.
pub fn murmur3_x64_128_hex(data: &[u8]) -> String {
    let (h1, h2) = murmur3_x64_128(data, 0);
    format!("{h1:016x}{h2:016x}")
}

/// MurmurHash3, x64 variant, 128-bit output.
pub fn murmur3_x64_128(data: &[u8], seed: u64) -> (u64, u64) {
    let mut h1 = seed;
    let mut h2 = seed;
    let nblocks = data.len() / 16;

    for block in data.chunks_exact(16) {
        let (lo, hi) = block.split_at(8);
        let k1 = u64::from_le_bytes(lo.try_into().expect("block half is 8 bytes"));
        let k2 = u64::from_le_bytes(hi.try_into().expect("block half is 8 bytes"));

        h1 ^= mix_k1(k1);
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dc_e729);

        h2 ^= mix_k2(k2);
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x3849_5ab5);
    }

    let tail = &data[nblocks * 16..];
    if tail.len() > 8 {
        let mut k2 = 0u64;
        for &byte in tail[8..].iter().rev() {
            k2 = (k2 << 8) | u64::from(byte);
        }
        h2 ^= mix_k2(k2);
    }
    if !tail.is_empty() {
        let mut k1 = 0u64;
        for &byte in tail[..tail.len().min(8)].iter().rev() {
            k1 = (k1 << 8) | u64::from(byte);
        }
        h1 ^= mix_k1(k1);
    }

    h1 ^= data.len() as u64;
    h2 ^= data.len() as u64;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    (h1, h2)
}

fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}
