//! Incremental UTF-8 fast path for the input stream.
//!
//! Multi-byte sequences split across appended chunks are held in a small
//! carry buffer; malformed sequences yield U+FFFD and decoding continues.

/// Decode a byte chunk into `out`, resolving any carried prefix first.
/// Returns the number of U+FFFD replacements made.
pub(super) fn decode_chunk(out: &mut String, carry: &mut Vec<u8>, bytes: &[u8]) -> u32 {
    if bytes.is_empty() {
        return 0;
    }

    let mut replaced = 0;

    if carry.is_empty() {
        return decode_run(out, carry, bytes);
    }

    // The carry is an incomplete UTF-8 suffix (at most 3 bytes). Borrow just
    // enough prefix bytes from this chunk to finish it, then decode the rest
    // of the chunk in place.
    let mut remaining = bytes;
    while !carry.is_empty() && !remaining.is_empty() {
        let expected = seq_len(carry[0]);
        if expected == 0 {
            out.push('\u{FFFD}');
            replaced += 1;
            carry.clear();
            break;
        }

        let needed = expected.saturating_sub(carry.len());
        if needed == 0 {
            let held = std::mem::take(carry);
            replaced += decode_run(out, carry, &held);
            continue;
        }
        if remaining.len() < needed {
            carry.extend_from_slice(remaining);
            return replaced;
        }

        let mut scratch = [0u8; 8];
        let head = carry.len();
        scratch[..head].copy_from_slice(carry);
        scratch[head..head + needed].copy_from_slice(&remaining[..needed]);
        carry.clear();
        replaced += decode_run(out, carry, &scratch[..head + needed]);
        remaining = &remaining[needed..];
    }

    if !remaining.is_empty() {
        replaced += decode_run(out, carry, remaining);
    }
    replaced
}

/// Flush a trailing incomplete sequence at end of input.
pub(super) fn flush(out: &mut String, carry: &mut Vec<u8>) -> u32 {
    if carry.is_empty() {
        return 0;
    }
    carry.clear();
    out.push('\u{FFFD}');
    1
}

fn seq_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_run(out: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) -> u32 {
    let mut replaced = 0;
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                out.push_str(s);
                break;
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                if valid_up_to > 0 {
                    out.push_str(
                        std::str::from_utf8(&bytes[..valid_up_to]).expect("valid UTF-8 prefix"),
                    );
                }
                match e.error_len() {
                    Some(len) => {
                        out.push('\u{FFFD}');
                        replaced += 1;
                        bytes = &bytes[valid_up_to + len..];
                    }
                    None => {
                        carry.extend_from_slice(&bytes[valid_up_to..]);
                        break;
                    }
                }
            }
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_multibyte_across_chunks() {
        let mut out = String::new();
        let mut carry = Vec::new();

        assert_eq!(decode_chunk(&mut out, &mut carry, &[0xC3]), 0);
        assert_eq!(out, "");
        assert_eq!(carry, vec![0xC3]);

        assert_eq!(decode_chunk(&mut out, &mut carry, &[0x97]), 0);
        assert_eq!(out, "×");
        assert!(carry.is_empty());
    }

    #[test]
    fn resolves_carry_then_decodes_rest_of_chunk() {
        let mut out = String::new();
        let mut carry = Vec::new();

        // First two bytes of 😀 (F0 9F 98 80).
        decode_chunk(&mut out, &mut carry, &[0xF0, 0x9F]);
        assert_eq!(carry, vec![0xF0, 0x9F]);

        decode_chunk(&mut out, &mut carry, &[0x98, 0x80, b'!']);
        assert_eq!(out, "😀!");
        assert!(carry.is_empty());
    }

    #[test]
    fn invalid_bytes_make_progress() {
        let mut out = String::new();
        let mut carry = Vec::new();
        assert_eq!(decode_chunk(&mut out, &mut carry, &[0xFF, b'f']), 1);
        assert_eq!(out, "\u{FFFD}f");
        assert!(carry.is_empty());
    }

    #[test]
    fn incomplete_suffix_is_flushed_at_eof() {
        let mut out = String::new();
        let mut carry = Vec::new();
        decode_chunk(&mut out, &mut carry, &[0xE2, 0x82]);
        assert_eq!(out, "");
        assert_eq!(flush(&mut out, &mut carry), 1);
        assert_eq!(out, "\u{FFFD}");
        assert!(carry.is_empty());
    }
}
