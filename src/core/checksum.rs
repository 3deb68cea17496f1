//! # Checksum Unit
//!
//! Single-byte frame checksum.
//!
//! The algorithm must match the peripheral firmware bit for bit: the XOR of
//! every byte after the sync marker up to (not including) the checksum
//! byte. It is not configurable.

/// XOR of all covered bytes.
#[inline]
pub fn compute(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Whether `claimed` equals the checksum of `bytes`.
#[inline]
pub fn verify(bytes: &[u8], claimed: u8) -> bool {
    compute(bytes) == claimed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_known_value() {
        // length=2, device=3, type=1, payload=[1, 2]
        assert_eq!(compute(&[0x02, 0x03, 0x01, 0x01, 0x02]), 0x03);
        assert_eq!(compute(&[]), 0);
        assert_eq!(compute(&[0xFF, 0xFF]), 0);
    }

    #[test]
    fn test_verify() {
        let data = [0x10, 0x20, 0x30];
        let ck = compute(&data);
        assert!(verify(&data, ck));
        assert!(!verify(&data, ck ^ 0x01));
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let data = [0x05, 0x07, 0x11, 0xAB, 0xCD];
        let ck = compute(&data);
        for i in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[i] ^= 1 << bit;
                assert!(!verify(&flipped, ck), "missed flip {i}:{bit}");
            }
        }
    }
}
