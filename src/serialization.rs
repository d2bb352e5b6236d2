/// Serialization format options for generated point sets and configurations.
///
/// Each format has both compressed (Lz4) and uncompressed variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializationFormat {
    /// JSON format - human readable, larger size, widest compatibility
    Json,
    /// JSON format with LZ4 compression
    JsonLz4,
    /// Bincode format - compact binary
    Bincode,
    /// Bincode format with LZ4 compression (default, best balance of size and speed)
    #[default]
    BincodeLz4,
}

impl SerializationFormat {
    /// Returns true if this format uses LZ4 compression
    pub fn is_compressed(&self) -> bool {
        matches!(self, SerializationFormat::JsonLz4 | SerializationFormat::BincodeLz4)
    }
}

use crate::errors::SGError;
use serde::{de::DeserializeOwned, Serialize};

/// Serialize data to bytes using the specified format, without compression.
fn serialize_serde<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, SGError> {
    match format {
        SerializationFormat::Json | SerializationFormat::JsonLz4 => {
            serde_json::to_vec(data).map_err(|_| SGError::SerializationFailed)
        }
        SerializationFormat::Bincode | SerializationFormat::BincodeLz4 => {
            bincode::serde::encode_to_vec(data, bincode::config::standard()).map_err(|_| SGError::SerializationFailed)
        }
    }
}

/// Deserialize data from uncompressed bytes using the specified format.
fn deserialize_serde<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, SGError> {
    match format {
        SerializationFormat::Json | SerializationFormat::JsonLz4 => {
            serde_json::from_slice(data).map_err(|_| SGError::DeserializationFailed)
        }
        SerializationFormat::Bincode | SerializationFormat::BincodeLz4 => {
            bincode::serde::decode_from_slice(data, bincode::config::standard())
                .map(|(value, _)| value)
                .map_err(|_| SGError::DeserializationFailed)
        }
    }
}

/// Serialize data to bytes using the specified format.
/// Applies LZ4 compression if the format variant ends with Lz4.
pub fn serialize<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, SGError> {
    let bytes = serialize_serde(data, format)?;
    if format.is_compressed() {
        Ok(lz4_flex::compress_prepend_size(&bytes))
    } else {
        Ok(bytes)
    }
}

/// Deserialize data from bytes using the specified format.
/// Applies LZ4 decompression if the format variant ends with Lz4.
pub fn deserialize<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, SGError> {
    if format.is_compressed() {
        let decompressed = lz4_flex::decompress_size_prepended(data)
            .map_err(|_| SGError::LZ4DecompressionFailed)?;
        deserialize_serde(&decompressed, format)
    } else {
        deserialize_serde(data, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generators::regular_with_boundaries, storage::SparseGridData};

    fn boundary_grid() -> SparseGridData {
        let mut storage = SparseGridData::new(3);
        regular_with_boundaries(&mut storage, 3, Some(1)).unwrap();
        storage
    }

    fn assert_same_grid(a: &SparseGridData, b: &SparseGridData) {
        assert_eq!(a.len(), b.len());
        assert_eq!(a.num_inputs(), b.num_inputs());
        assert_eq!(a.has_boundary(), b.has_boundary());
        assert!(b.map_initialized());
        for (seq, point) in a.nodes().enumerate() {
            assert_eq!(b.index_of(&point), Some(seq));
            assert_eq!(b.is_leaf(seq), point.is_leaf());
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let storage = boundary_grid();
        let mut buffer = Vec::new();
        storage.write(&mut buffer, SerializationFormat::Json).unwrap();
        let result = SparseGridData::read_buffer(&buffer, SerializationFormat::Json).unwrap();
        assert_same_grid(&storage, &result);
    }

    #[test]
    fn test_bincode_lz4_roundtrip() {
        let storage = boundary_grid();
        let mut buffer = Vec::new();
        storage.write(&mut buffer, SerializationFormat::default()).unwrap();
        let result = SparseGridData::read(buffer.as_slice(), SerializationFormat::BincodeLz4).unwrap();
        assert_same_grid(&storage, &result);
    }

    #[test]
    fn test_save_and_read_file() {
        let storage = boundary_grid();
        let path = std::env::temp_dir().join(format!("sggen_save_{}.bin", std::process::id()));
        let path = path.to_str().unwrap();
        storage.save(path).unwrap();
        let file = std::fs::File::open(path).unwrap();
        let result = SparseGridData::read(std::io::BufReader::new(file), SerializationFormat::default()).unwrap();
        std::fs::remove_file(path).unwrap();
        assert_same_grid(&storage, &result);
        assert_eq!(storage.save("/nonexistent-directory/grid.bin"), Err(SGError::FileIOError));
    }

    #[test]
    fn test_compressed_buffer_rejected_as_plain() {
        let storage = boundary_grid();
        let bytes = serialize(&storage, SerializationFormat::JsonLz4).unwrap();
        assert!(SparseGridData::read_buffer(&bytes, SerializationFormat::Json).is_err());
        assert_eq!(
            SparseGridData::read_buffer(&[1, 2, 3], SerializationFormat::BincodeLz4).err(),
            Some(SGError::LZ4DecompressionFailed)
        );
    }
}
