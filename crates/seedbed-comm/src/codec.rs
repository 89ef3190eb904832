//! Little-endian payload encoding.
//!
//! Payloads are flat byte vectors. Counts are `u32`, reals are `f64`,
//! identifiers are `u64`; there is no padding and no schema.

use crate::error::CommError;

// ── Primitive writers ───────────────────────────────────────────

/// Append a little-endian u32.
pub fn write_u32_le(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian u64.
pub fn write_u64_le(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian f64.
pub fn write_f64_le(buf: &mut Vec<u8>, v: f64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

// ── Primitive readers ───────────────────────────────────────────

fn take<const N: usize>(r: &mut &[u8], what: &str) -> Result<[u8; N], CommError> {
    if r.len() < N {
        return Err(CommError::Truncated {
            reason: format!("{what}: need {N} bytes, {} left", r.len()),
        });
    }
    let (head, tail) = r.split_at(N);
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    *r = tail;
    Ok(out)
}

/// Read a little-endian u32, advancing the cursor.
pub fn read_u32_le(r: &mut &[u8]) -> Result<u32, CommError> {
    take::<4>(r, "u32").map(u32::from_le_bytes)
}

/// Read a little-endian u64, advancing the cursor.
pub fn read_u64_le(r: &mut &[u8]) -> Result<u64, CommError> {
    take::<8>(r, "u64").map(u64::from_le_bytes)
}

/// Read a little-endian f64, advancing the cursor.
pub fn read_f64_le(r: &mut &[u8]) -> Result<f64, CommError> {
    take::<8>(r, "f64").map(f64::from_le_bytes)
}

// ── Slices ──────────────────────────────────────────────────────

/// Encode a length-prefixed f64 slice.
pub fn encode_f64s(values: &[f64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + values.len() * 8);
    write_u32_le(&mut buf, values.len() as u32);
    for v in values {
        write_f64_le(&mut buf, *v);
    }
    buf
}

/// Decode a length-prefixed f64 slice; trailing bytes are an error.
pub fn decode_f64s(bytes: &[u8]) -> Result<Vec<f64>, CommError> {
    let mut r = bytes;
    let n = read_u32_le(&mut r)? as usize;
    if r.len() != n * 8 {
        return Err(CommError::Truncated {
            reason: format!("f64 slice announces {n} values, carries {} bytes", r.len()),
        });
    }
    (0..n).map(|_| read_f64_le(&mut r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_buffer_is_truncated() {
        let mut r: &[u8] = &[1, 2, 3];
        assert!(matches!(read_u32_le(&mut r), Err(CommError::Truncated { .. })));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode_f64s(&[1.0, 2.0]);
        bytes.push(0);
        assert!(decode_f64s(&bytes).is_err());
    }

    #[test]
    fn cursor_advances_across_mixed_reads() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 3);
        write_u64_le(&mut buf, u64::MAX);
        write_f64_le(&mut buf, -0.5);
        let mut r = buf.as_slice();
        assert_eq!(read_u32_le(&mut r).unwrap(), 3);
        assert_eq!(read_u64_le(&mut r).unwrap(), u64::MAX);
        assert_eq!(read_f64_le(&mut r).unwrap(), -0.5);
        assert!(r.is_empty());
    }

    proptest! {
        #[test]
        fn f64_slices_survive_encoding(values in prop::collection::vec(any::<f64>(), 0..32)) {
            let back = decode_f64s(&encode_f64s(&values)).unwrap();
            prop_assert_eq!(back.len(), values.len());
            for (a, b) in back.iter().zip(&values) {
                prop_assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }
}
