//! Stored vectors are raw `f32` sequences in native byte order, `D * 4` bytes.

use recipedb_core::{Error, Result};

const F32_BYTES: usize = std::mem::size_of::<f32>();

pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(std::mem::size_of_val(vector));
    for &value in vector {
        bytes.extend_from_slice(&value.to_ne_bytes());
    }
    bytes
}

/// Reinterpret a blob as floats. The dimension is checked later, against the
/// query vector, by the ranker. NaN or infinite components are corrupt.
pub fn decode_vector(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % F32_BYTES != 0 {
        return Err(Error::CorruptVector(format!(
            "blob length {} is not a multiple of {F32_BYTES}",
            blob.len()
        )));
    }
    let mut out = Vec::with_capacity(blob.len() / F32_BYTES);
    for (i, c) in blob.chunks_exact(F32_BYTES).enumerate() {
        let value = f32::from_ne_bytes([c[0], c[1], c[2], c[3]]);
        if !value.is_finite() {
            return Err(Error::CorruptVector(format!("component {i} is {value}")));
        }
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_exact() {
        let v = vec![0.0f32, -1.5, 3.25e-7, f32::MAX, f32::MIN_POSITIVE, 1.0 / 3.0];
        let bytes = encode_vector(&v);
        assert_eq!(bytes.len(), v.len() * 4);
        assert_eq!(decode_vector(&bytes).unwrap(), v);
    }

    #[test]
    fn ragged_blob_is_corrupt() {
        assert!(matches!(decode_vector(&[0u8; 7]), Err(Error::CorruptVector(_))));
    }

    #[test]
    fn non_finite_components_are_corrupt() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let bytes = encode_vector(&[0.5, bad, 0.25]);
            match decode_vector(&bytes) {
                Err(Error::CorruptVector(msg)) => assert!(msg.contains("component 1"), "{msg}"),
                other => panic!("expected CorruptVector, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_blob_decodes_to_empty_vector() {
        assert!(decode_vector(&[]).unwrap().is_empty());
    }
}
