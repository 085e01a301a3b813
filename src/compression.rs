// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Logic for the compression codecs object container file blocks may use.

use crate::AvroResult;
use crate::error::{Details, Error};
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// Settings for the `Deflate` compression.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct DeflateSettings {
    compression_level: miniz_oxide::deflate::CompressionLevel,
}

impl DeflateSettings {
    pub fn new(compression_level: miniz_oxide::deflate::CompressionLevel) -> Self {
        DeflateSettings { compression_level }
    }

    fn compression_level(&self) -> u8 {
        self.compression_level as u8
    }
}

impl Default for DeflateSettings {
    /// Default compression level is
    /// `miniz_oxide::deflate::CompressionLevel::DefaultCompression`.
    fn default() -> Self {
        Self::new(miniz_oxide::deflate::CompressionLevel::DefaultCompression)
    }
}

/// The compression applied to the blocks of an object container file, named
/// by the `avro.codec` header entry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab_case")]
pub enum Compression {
    /// The `Null` compression simply passes through data uncompressed.
    #[default]
    Null,
    /// The `Deflate` compression writes the data block using the deflate
    /// algorithm as specified in RFC 1951. Note that this format (unlike the
    /// "zlib format" in RFC 1950) does not have a checksum.
    Deflate(DeflateSettings),
    #[cfg(feature = "snappy")]
    /// The `Snappy` compression uses Google's
    /// [Snappy](http://google.github.io/snappy/) compression library. Each
    /// compressed block is followed by the 4-byte, big-endian CRC32 checksum
    /// of the uncompressed data in the block.
    Snappy,
}

impl Compression {
    /// Compress a stream of bytes in-place.
    pub fn compress(self, stream: &mut Vec<u8>) -> AvroResult<()> {
        match self {
            Compression::Null => (),
            Compression::Deflate(settings) => {
                let compressed =
                    miniz_oxide::deflate::compress_to_vec(stream, settings.compression_level());
                *stream = compressed;
            }
            #[cfg(feature = "snappy")]
            Compression::Snappy => {
                let mut encoded: Vec<u8> = vec![0; snap::raw::max_compress_len(stream.len())];
                let compressed_size = snap::raw::Encoder::new()
                    .compress(&stream[..], &mut encoded[..])
                    .map_err(Details::SnappyCompress)?;

                let mut hasher = crc32fast::Hasher::new();
                hasher.update(&stream[..]);
                let checksum = hasher.finalize();
                let checksum_as_bytes = checksum.to_be_bytes();
                let checksum_len = checksum_as_bytes.len();
                encoded.truncate(compressed_size + checksum_len);
                encoded[compressed_size..].copy_from_slice(&checksum_as_bytes);

                *stream = encoded;
            }
        };

        Ok(())
    }

    /// Decompress a stream of bytes in-place.
    pub fn decompress(self, stream: &mut Vec<u8>) -> AvroResult<()> {
        *stream = match self {
            Compression::Null => return Ok(()),
            Compression::Deflate(_settings) => {
                miniz_oxide::inflate::decompress_to_vec(stream).map_err(|e| {
                    let err = {
                        use miniz_oxide::inflate::TINFLStatus::*;
                        use std::io::{Error, ErrorKind};
                        match e.status {
                            FailedCannotMakeProgress | NeedsMoreInput => {
                                Error::from(ErrorKind::UnexpectedEof)
                            }
                            Adler32Mismatch | Failed => Error::from(ErrorKind::InvalidData),
                            status => Error::other(format!(
                                "Unexpected miniz_oxide status for decompress_to_vec: {status:?}"
                            )),
                        }
                    };
                    Error::new(Details::DeflateDecompress(err))
                })?
            }
            #[cfg(feature = "snappy")]
            Compression::Snappy => {
                let compressed = stream
                    .len()
                    .checked_sub(4)
                    .ok_or(Details::SnappyCrcMissing)
                    .map_err(Error::new)?;
                let decompressed_size = snap::raw::decompress_len(&stream[..compressed])
                    .map_err(Details::GetSnappyDecompressLen)?;
                let mut decoded = vec![0; decompressed_size];
                snap::raw::Decoder::new()
                    .decompress(&stream[..compressed], &mut decoded[..])
                    .map_err(Details::SnappyDecompress)?;

                let mut last_four: [u8; 4] = [0; 4];
                last_four.copy_from_slice(&stream[compressed..]);
                let expected: u32 = u32::from_be_bytes(last_four);

                let mut hasher = crc32fast::Hasher::new();
                hasher.update(&decoded);
                let actual = hasher.finalize();

                if expected != actual {
                    return Err(Details::SnappyCrc32 { expected, actual }.into());
                }
                decoded
            }
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use miniz_oxide::deflate::CompressionLevel;
    use pretty_assertions::{assert_eq, assert_ne};
    use std::str::FromStr;

    const INPUT: &[u8] = b"theanswertolifetheuniverseandeverythingis42theanswertolifetheuniverseandeverythingis4theanswertolifetheuniverseandeverythingis2";

    #[test]
    fn null_compress_and_decompress() -> TestResult {
        let compression = Compression::Null;
        let mut stream = INPUT.to_vec();
        compression.compress(&mut stream)?;
        assert_eq!(INPUT, stream.as_slice());
        compression.decompress(&mut stream)?;
        assert_eq!(INPUT, stream.as_slice());
        Ok(())
    }

    #[test]
    fn deflate_compress_and_decompress() -> TestResult {
        compress_and_decompress(Compression::Deflate(DeflateSettings::new(
            CompressionLevel::BestCompression,
        )))
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn snappy_compress_and_decompress() -> TestResult {
        compress_and_decompress(Compression::Snappy)
    }

    fn compress_and_decompress(compression: Compression) -> TestResult {
        let mut stream = INPUT.to_vec();
        compression.compress(&mut stream)?;
        assert_ne!(INPUT, stream.as_slice());
        assert!(INPUT.len() > stream.len());
        compression.decompress(&mut stream)?;
        assert_eq!(INPUT, stream.as_slice());
        Ok(())
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn snappy_crc32_mismatch_is_detected() -> TestResult {
        let compression = Compression::Snappy;
        let mut stream = INPUT.to_vec();
        compression.compress(&mut stream)?;

        // corrupt the stored checksum
        let last = stream.len() - 1;
        stream[last] ^= 0xff;

        assert!(matches!(
            compression
                .decompress(&mut stream)
                .map_err(Error::into_details),
            Err(Details::SnappyCrc32 { .. })
        ));
        Ok(())
    }

    #[test]
    fn compression_to_str() {
        assert_eq!(<&str>::from(Compression::Null), "null");
        assert_eq!(
            <&str>::from(Compression::Deflate(DeflateSettings::default())),
            "deflate"
        );

        #[cfg(feature = "snappy")]
        assert_eq!(<&str>::from(Compression::Snappy), "snappy");
    }

    #[test]
    fn compression_from_str() {
        assert_eq!(Compression::from_str("null").unwrap(), Compression::Null);
        assert_eq!(
            Compression::from_str("deflate").unwrap(),
            Compression::Deflate(DeflateSettings::default())
        );

        #[cfg(feature = "snappy")]
        assert_eq!(Compression::from_str("snappy").unwrap(), Compression::Snappy);

        assert!(Compression::from_str("not a codec").is_err());
    }
}
