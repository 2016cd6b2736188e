//! Standalone LEB128 codec, independent of `wasm_encoder`.
//!
//! `wasm_encoder` encodes its own section lengths and operand indices
//! internally (see [`super::emitter`]); this module exists only so spec.md
//! §8's `decode(encode(n)) == n` property is directly testable without
//! reaching into the encoder crate's private format. Grounded on
//! `examples/original_source/src/codegen.c`'s `buffer_write_leb128_u32`/`_i32`.

/// Appends `value` to `out` as unsigned LEB128.
pub fn write_unsigned(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

/// Appends `value` to `out` as signed LEB128.
pub fn write_signed(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let sign_bit_set = byte & 0x40 != 0;
        if (value == 0 && !sign_bit_set) || (value == -1 && sign_bit_set) {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

/// Decodes an unsigned LEB128 value from the front of `bytes`, returning the
/// value and the number of bytes consumed.
pub fn read_unsigned(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
        shift += 7;
        if shift >= 64 {
            return None;
        }
    }
    None
}

/// Decodes a signed LEB128 value from the front of `bytes`, returning the
/// value and the number of bytes consumed.
pub fn read_signed(bytes: &[u8]) -> Option<(i64, usize)> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        result |= ((byte & 0x7f) as i64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1i64 << shift;
            }
            return Some((result, i + 1));
        }
        if shift >= 64 {
            return None;
        }
    }
    None
}
