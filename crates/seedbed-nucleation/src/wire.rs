//! Byte layout of nucleus lists exchanged between partitions.
//!
//! ```text
//! u32 count | u32 dim | count × (f64 radius, f64 seeded, f64 seeding,
//!                                u64 origin, dim × f64 center)
//! ```
//!
//! All little-endian. Indices are not transmitted; receivers renumber.

use crate::nucleus::Nucleus;
use seedbed_comm::codec::{
    read_f64_le, read_u32_le, read_u64_le, write_f64_le, write_u32_le, write_u64_le,
};
use seedbed_comm::{CommError, Tag};
use seedbed_core::Point;

/// Candidate count announced to the coordinator.
pub const COUNT_TAG: Tag = Tag(0x4E55_0001);
/// Candidate records sent to the coordinator.
pub const RECORDS_TAG: Tag = Tag(0x4E55_0002);

/// Bytes per record for dimension `dim`.
pub fn record_len(dim: usize) -> usize {
    4 * 8 + dim * 8
}

/// Encode `nuclei`, each with a `dim`-dimensional center.
pub fn encode_nuclei(nuclei: &[Nucleus], dim: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + nuclei.len() * record_len(dim));
    write_u32_le(&mut buf, nuclei.len() as u32);
    write_u32_le(&mut buf, dim as u32);
    for n in nuclei {
        write_f64_le(&mut buf, n.radius);
        write_f64_le(&mut buf, n.seeded_time);
        write_f64_le(&mut buf, n.seeding_time);
        write_u64_le(&mut buf, n.origin);
        for d in 0..dim {
            write_f64_le(&mut buf, n.center.get(d).copied().unwrap_or(0.0));
        }
    }
    buf
}

/// Decode a list sent by `peer`, which must carry `dim`-dimensional
/// centers and nothing after the last record.
pub fn decode_nuclei(bytes: &[u8], dim: usize, peer: usize) -> Result<Vec<Nucleus>, CommError> {
    let mut r = bytes;
    let count = read_u32_le(&mut r)? as usize;
    let sent_dim = read_u32_le(&mut r)? as usize;
    if sent_dim != dim {
        return Err(CommError::PayloadMismatch {
            peer,
            expected: dim,
            actual: sent_dim,
        });
    }
    if r.len() != count * record_len(dim) {
        return Err(CommError::Truncated {
            reason: format!(
                "{count} nucleus records of dimension {dim} need {} bytes, got {}",
                count * record_len(dim),
                r.len()
            ),
        });
    }
    let mut out = Vec::with_capacity(count);
    for index in 0..count {
        let radius = read_f64_le(&mut r)?;
        let seeded_time = read_f64_le(&mut r)?;
        let seeding_time = read_f64_le(&mut r)?;
        let origin = read_u64_le(&mut r)?;
        let mut center = Point::new();
        for _ in 0..dim {
            center.push(read_f64_le(&mut r)?);
        }
        out.push(Nucleus {
            index,
            center,
            radius,
            seeded_time,
            seeding_time,
            origin,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn records_survive_the_wire() {
        let nuclei = vec![
            Nucleus {
                index: 3,
                center: smallvec![1.0, -2.5],
                radius: 2.5,
                seeded_time: 0.25,
                seeding_time: 10.0,
                origin: 77,
            },
            Nucleus {
                index: 9,
                center: smallvec![0.0, 4.0],
                radius: 1.0,
                seeded_time: 0.0,
                seeding_time: 1.0,
                origin: u64::MAX,
            },
        ];
        let bytes = encode_nuclei(&nuclei, 2);
        assert_eq!(bytes.len(), 8 + 2 * record_len(2));
        let back = decode_nuclei(&bytes, 2, 1).unwrap();
        assert_eq!(back[0].index, 0);
        assert_eq!(back[1].index, 1);
        for (a, b) in nuclei.iter().zip(&back) {
            assert_eq!(a.center, b.center);
            assert_eq!(a.origin, b.origin);
            assert_eq!(a.seeded_time, b.seeded_time);
        }
    }

    #[test]
    fn empty_list_is_eight_bytes() {
        let bytes = encode_nuclei(&[], 3);
        assert_eq!(bytes.len(), 8);
        assert!(decode_nuclei(&bytes, 3, 0).unwrap().is_empty());
    }

    #[test]
    fn dimension_and_length_are_checked() {
        let bytes = encode_nuclei(&[], 2);
        assert!(matches!(
            decode_nuclei(&bytes, 3, 4),
            Err(CommError::PayloadMismatch {
                peer: 4,
                expected: 3,
                actual: 2
            })
        ));
        let mut bytes = encode_nuclei(&[], 2);
        bytes[0] = 1;
        assert!(matches!(
            decode_nuclei(&bytes, 2, 0),
            Err(CommError::Truncated { .. })
        ));
    }
}
