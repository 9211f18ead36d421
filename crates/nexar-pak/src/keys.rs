//! Key and offset derivation for PAK containers.
//!
//! Nothing in a PAK file is addressed by fixed offsets. The header and
//! entry-table positions are sums over the archive file name's UTF-16 code
//! units, and the three 128-byte SNOW keys mix byte positions with the name
//! (or entry path) and the embedded constant. All arithmetic wraps and
//! truncates to a byte, matching the original derivations.

/// Constant appended to the archive file name before key derivation.
pub const EMBEDDED_KEY: &str = "CqeLFV@*0IfewH";

/// Length of every derived cipher key.
pub const KEY_SIZE: usize = 128;

fn name_material(file_name: &str) -> Vec<u8> {
    let mut material = file_name.as_bytes().to_vec();
    material.extend_from_slice(EMBEDDED_KEY.as_bytes());
    material
}

/// Key for the 12-byte container header.
pub fn header_key(file_name: &str) -> [u8; KEY_SIZE] {
    let k = name_material(file_name);
    std::array::from_fn(|i| (i as u32).wrapping_add(u32::from(k[i % k.len()])) as u8)
}

/// Key for the entry table.
///
/// Walks the key material backward and scales each byte by a factor cycling
/// through 2, 3, 4.
pub fn entries_key(file_name: &str) -> [u8; KEY_SIZE] {
    let k = name_material(file_name);
    std::array::from_fn(|i| {
        let factor = (i % 3) as u32 + 2;
        let material = u32::from(k[k.len() - 1 - (i % k.len())]);
        (i as u32).wrapping_add(factor.wrapping_mul(material)) as u8
    })
}

/// Key for one entry's payload, mixing the entry path's UTF-16 code units
/// with the entry's 128-bit base key (taken as 16 little-endian bytes).
pub fn data_key(path: &str, base_key: &[u32; 4]) -> [u8; KEY_SIZE] {
    let units: Vec<u16> = path.encode_utf16().collect();
    let mut base = [0u8; 16];
    for (chunk, word) in base.chunks_exact_mut(4).zip(base_key) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }

    std::array::from_fn(|i| {
        let unit = if units.is_empty() {
            0
        } else {
            u32::from(units[i % units.len()])
        };
        let inner = (i as u32)
            .wrapping_add(u32::from(base[i % 16]))
            .wrapping_sub(5 * (i as u32 / 5))
            .wrapping_add(2);
        (i as u32).wrapping_add(unit.wrapping_mul(inner)) as u8
    })
}

/// Offset of the 12-byte header: `(sum of name code units) % 312 + 30`.
pub fn header_offset(file_name: &str) -> usize {
    let sum: u32 = file_name.encode_utf16().map(u32::from).sum();
    (sum % 312) as usize + 30
}

/// Offset of the entry table: 42 bytes past the header plus
/// `(sum of tripled name code units) % 212`.
pub fn entries_offset(file_name: &str) -> usize {
    let sum: u32 = file_name.encode_utf16().map(|c| 3 * u32::from(c)).sum();
    header_offset(file_name) + 42 + (sum % 212) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_for_fixed_name() {
        // "test.pak": code units sum to 810.
        assert_eq!(header_offset("test.pak"), 810 % 312 + 30);
        assert_eq!(header_offset("test.pak"), 216);
        assert_eq!(entries_offset("test.pak"), 216 + 42 + (3 * 810) % 212);
        assert_eq!(entries_offset("test.pak"), 356);
    }

    #[test]
    fn test_offsets_use_code_units_not_bytes() {
        // A non-ASCII name: one char, two UTF-8 bytes, one UTF-16 unit
        // of value 0x043A.
        let name = "\u{43A}";
        assert_eq!(header_offset(name), (0x043A % 312) + 30);
    }

    #[test]
    fn test_header_key_formula() {
        let key = header_key("a.pak");
        let material = b"a.pakCqeLFV@*0IfewH";
        for (i, &byte) in key.iter().enumerate() {
            let expected = (i as u32 + u32::from(material[i % material.len()])) as u8;
            assert_eq!(byte, expected);
        }
    }

    #[test]
    fn test_entries_key_walks_material_backward() {
        let key = entries_key("a.pak");
        let material = b"a.pakCqeLFV@*0IfewH";
        for (i, &byte) in key.iter().enumerate() {
            let factor = (i % 3) as u32 + 2;
            let m = u32::from(material[material.len() - 1 - (i % material.len())]);
            assert_eq!(byte, (i as u32).wrapping_add(factor * m) as u8);
        }
    }

    #[test]
    fn test_data_key_depends_on_path_and_base_key() {
        let base_a = [1, 2, 3, 4];
        let base_b = [1, 2, 3, 5];
        assert_ne!(data_key("x/y.mdl", &base_a), data_key("x/y.mdl", &base_b));
        assert_ne!(data_key("x/y.mdl", &base_a), data_key("x/z.mdl", &base_a));
        assert_eq!(data_key("x/y.mdl", &base_a), data_key("x/y.mdl", &base_a));
    }

    #[test]
    fn test_keys_differ_per_purpose() {
        assert_ne!(header_key("a.pak"), entries_key("a.pak"));
    }
}
