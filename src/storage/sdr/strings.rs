//! Decoders for the four SDR ID-string encodings (IPMI v2.0 §43.15, "Type/Length Byte").

/// Decode a sequence of 32-bit little-endian code points to UTF-8.
///
/// Code points greater than `0x10FFFF` are replaced with U+FFFD, matching
/// the behavior of a lossy Unicode scalar value conversion.
pub fn decode_unicode32(data: &[u8]) -> String {
    data.chunks_exact(4)
        .map(|chunk| {
            let code_point = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(code_point).unwrap_or('\u{FFFD}')
        })
        .collect()
}

const BCD_PLUS_TABLE: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ' ', '-', '.', ':', ',', '-',
];

/// Decode packed BCD+ nibbles (IPMI's 4-bit alphanumeric subset).
pub fn decode_bcd_plus(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push(BCD_PLUS_TABLE[((byte >> 4) & 0xF) as usize]);
        out.push(BCD_PLUS_TABLE[(byte & 0xF) as usize]);
    }
    out
}

/// Decode packed 6-bit ASCII: groups of 3 input bytes become 4 output
/// characters, each offset by `0x20`. A trailing partial group of 1 or 2
/// bytes still yields 1 or 2 characters respectively.
pub fn decode_ascii_6bit_packed(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 4) / 3 + 1);

    for group in data.chunks(3) {
        let b0 = group[0];
        let b1 = group.get(1).copied().unwrap_or(0);
        let b2 = group.get(2).copied().unwrap_or(0);

        let chars = [
            b0 & 0x3F,
            ((b0 >> 6) | (b1 << 2)) & 0x3F,
            ((b1 >> 4) | (b2 << 4)) & 0x3F,
            (b2 >> 2) & 0x3F,
        ];

        let n = match group.len() {
            1 => 1,
            2 => 2,
            _ => 4,
        };

        for c in &chars[..n] {
            out.push((c + 0x20) as char);
        }
    }

    out
}

/// Widen 8-bit Latin-1 bytes to UTF-8.
pub fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_plus_table_matches_spec() {
        let data: Vec<u8> = (0u8..16).collect();
        let nibbles: String = data
            .iter()
            .map(|&n| BCD_PLUS_TABLE[(n & 0xF) as usize])
            .collect();
        assert_eq!(nibbles, "0123456789 -.:,-");
    }

    #[test]
    fn ascii6bit_all_zero_is_four_spaces() {
        assert_eq!(decode_ascii_6bit_packed(&[0, 0, 0]), "    ");
    }

    #[test]
    fn latin1_widens_high_bytes() {
        let decoded = decode_latin1(&[0x41, 0xE9]);
        assert_eq!(decoded, "A\u{00E9}");
    }

    #[test]
    fn unicode32_out_of_range_is_replacement_char() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x41u32.to_le_bytes());
        data.extend_from_slice(&0x110000u32.to_le_bytes());
        assert_eq!(decode_unicode32(&data), "A\u{FFFD}");
    }

    #[test]
    fn ascii_passthrough_roundtrip() {
        let input: Vec<u8> = (0x20u8..=0x7E).collect();
        let decoded = decode_latin1(&input);
        assert_eq!(decoded.as_bytes(), input.as_slice());
    }
}
