// src/certificate/compression.rs
//! Decompression of downloaded productid metadata
//!
//! Repositories publish product certificates either plain or compressed with
//! gzip, xz or zstd. The format is detected from magic bytes, so the name of
//! the cached metadata file does not matter.

use std::fs;
use std::io::Read;
use std::path::Path;

use super::CertificateError;

/// Compression applied to a productid metadata file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Xz,
    Zstd,
}

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

impl CompressionFormat {
    /// Identify the compression of `data`, `None` for plain content
    pub fn detect(data: &[u8]) -> Option<Self> {
        [
            (GZIP_MAGIC, Self::Gzip),
            (XZ_MAGIC, Self::Xz),
            (ZSTD_MAGIC, Self::Zstd),
        ]
        .into_iter()
        .find_map(|(magic, format)| data.starts_with(magic).then_some(format))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }

    fn decode(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut output = Vec::new();
        match self {
            Self::Gzip => flate2::read::GzDecoder::new(data).read_to_end(&mut output)?,
            Self::Xz => xz2::read::XzDecoder::new(data).read_to_end(&mut output)?,
            Self::Zstd => zstd::Decoder::new(data)?.read_to_end(&mut output)?,
        };
        Ok(output)
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Return the raw content of a metadata blob; plain data passes through
pub fn decompress_auto(data: &[u8]) -> Result<Vec<u8>, CertificateError> {
    let Some(format) = CompressionFormat::detect(data) else {
        return Ok(data.to_vec());
    };
    format
        .decode(data)
        .map_err(|e| CertificateError::Decompression {
            format: format.name(),
            source: e,
        })
}

/// Read a (possibly compressed) metadata file and return its raw content
pub fn decompress_file(path: &Path) -> Result<Vec<u8>, CertificateError> {
    let data = fs::read(path).map_err(|e| CertificateError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    decompress_auto(&data)
}
