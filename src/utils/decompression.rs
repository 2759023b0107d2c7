use crate::errors::{SourceError, SourceResult};

/// Supported compression formats detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Uncompressed,
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Magic byte detection and decompression of downloaded guides
pub struct DecompressionService;

impl DecompressionService {
    /// Detect compression format using magic bytes
    pub fn detect_compression_format(data: &[u8]) -> CompressionFormat {
        if data.starts_with(&GZIP_MAGIC) {
            CompressionFormat::Gzip
        } else {
            CompressionFormat::Uncompressed
        }
    }

    /// Decompress data based on detected format
    pub fn decompress(data: Vec<u8>) -> SourceResult<Vec<u8>> {
        match Self::detect_compression_format(&data) {
            CompressionFormat::Gzip => Self::decompress_gzip(&data),
            CompressionFormat::Uncompressed => Ok(data),
        }
    }

    #[cfg(feature = "compression-gzip")]
    fn decompress_gzip(data: &[u8]) -> SourceResult<Vec<u8>> {
        use std::io::Read;

        let mut decoder = flate2::read::GzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| SourceError::Decompression {
                message: format!("Failed to decompress gzip data: {e}"),
            })?;
        Ok(decompressed)
    }

    #[cfg(not(feature = "compression-gzip"))]
    fn decompress_gzip(_data: &[u8]) -> SourceResult<Vec<u8>> {
        Err(SourceError::Decompression {
            message: "gzip support not compiled in (enable the 'compression-gzip' feature)"
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_xml_passes_through() {
        let data = b"<tv></tv>".to_vec();
        assert_eq!(
            DecompressionService::detect_compression_format(&data),
            CompressionFormat::Uncompressed
        );
        assert_eq!(DecompressionService::decompress(data.clone()).unwrap(), data);
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn test_gzip_round_trip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<tv><channel id=\"A\"/></tv>").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(
            DecompressionService::detect_compression_format(&compressed),
            CompressionFormat::Gzip
        );
        assert_eq!(
            DecompressionService::decompress(compressed).unwrap(),
            b"<tv><channel id=\"A\"/></tv>".to_vec()
        );
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn test_truncated_gzip_is_an_error() {
        let result = DecompressionService::decompress(vec![0x1f, 0x8b, 0x08]);
        assert!(matches!(result, Err(SourceError::Decompression { .. })));
    }
}
