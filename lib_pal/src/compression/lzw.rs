use std::collections::HashMap;

use log::{debug, error};

use super::{CompressionError, Compressor, DecompressionError, Decompressor};

/// Codes are 16-bit little-endian, so the dictionary tops out at 65536 entries.
const MAX_ENTRIES: usize = u16::MAX as usize + 1;
const CODE_SIZE: usize = 2;

/// LZW over bytes with a dictionary seeded by the 256 single-byte strings.
///
/// Once the dictionary is full both sides stop adding entries and keep
/// emitting existing codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LzwCodec;

#[derive(Debug)]
struct Entry {
    prefix: Option<u16>,
    suffix: u8,
}

impl Compressor for LzwCodec {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let (&first, rest) = data.split_first().ok_or(CompressionError::EmptyInput)?;

        // (prefix code, next byte) -> code
        let mut dictionary: HashMap<(u16, u8), u16> = HashMap::new();
        let mut next_code = 256usize;
        let mut out = Vec::with_capacity(data.len());
        let mut current = first as u16;

        for &byte in rest {
            if let Some(&code) = dictionary.get(&(current, byte)) {
                current = code;
                continue;
            }
            out.extend_from_slice(&current.to_le_bytes());
            if next_code < MAX_ENTRIES {
                dictionary.insert((current, byte), next_code as u16);
                next_code += 1;
            }
            current = byte as u16;
        }
        out.extend_from_slice(&current.to_le_bytes());

        debug!(
            "LZW compressed {} bytes into {} ({} dictionary entries)",
            data.len(),
            out.len(),
            next_code
        );
        Ok(out)
    }
}

impl Decompressor for LzwCodec {
    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, DecompressionError> {
        let out = expand(data, expected_len)?;
        if out.len() != expected_len {
            error!(
                "LZW stream expanded to {} bytes, expected {}",
                out.len(),
                expected_len
            );
            return Err(DecompressionError::LengthMismatch {
                expected: expected_len,
                actual: out.len(),
            });
        }
        debug!("LZW expanded {} bytes into {}", data.len(), out.len());
        Ok(out)
    }
}

/// Expands `data`, giving up as soon as the output would pass `limit` bytes.
fn expand(data: &[u8], limit: usize) -> Result<Vec<u8>, DecompressionError> {
    if data.len() % CODE_SIZE != 0 {
        return Err(DecompressionError::IncompleteCode {
            position: data.len() - data.len() % CODE_SIZE,
        });
    }

    let mut dictionary: Vec<Entry> = (0..=u8::MAX)
        .map(|suffix| Entry {
            prefix: None,
            suffix,
        })
        .collect();
    let mut out = Vec::with_capacity(limit.min(data.len() * 2));
    let mut previous: Option<(u16, Vec<u8>)> = None;

    for chunk in data.chunks_exact(CODE_SIZE) {
        let code = u16::from_le_bytes([chunk[0], chunk[1]]);
        let index = code as usize;

        let current = match &previous {
            _ if index < dictionary.len() => spell(&dictionary, code),
            // The code being defined by this very step: previous + its first byte.
            Some((_, prev)) if index == dictionary.len() => {
                let mut s = prev.clone();
                s.push(prev[0]);
                s
            }
            _ => {
                error!("LZW code {} is not in the dictionary", code);
                return Err(DecompressionError::InvalidCode {
                    code: index,
                    dict_size: dictionary.len(),
                });
            }
        };

        if let Some((prev_code, _)) = previous {
            if dictionary.len() < MAX_ENTRIES {
                dictionary.push(Entry {
                    prefix: Some(prev_code),
                    suffix: current[0],
                });
            }
        }

        if out.len() + current.len() > limit {
            error!(
                "LZW stream runs past the declared {} bytes at code {}",
                limit, code
            );
            return Err(DecompressionError::LengthMismatch {
                expected: limit,
                actual: out.len() + current.len(),
            });
        }
        out.extend_from_slice(&current);
        previous = Some((code, current));
    }

    Ok(out)
}

fn spell(dictionary: &[Entry], code: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut next = Some(code);
    while let Some(code) = next {
        let entry = &dictionary[code as usize];
        bytes.push(entry.suffix);
        next = entry.prefix;
    }
    bytes.reverse();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) {
        let codec = LzwCodec;
        let packed = codec.compress(data).unwrap();
        assert_eq!(codec.decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_lzw_empty_input() {
        assert!(matches!(
            LzwCodec.compress(&[]),
            Err(CompressionError::EmptyInput)
        ));
    }

    #[test]
    fn test_lzw_incomplete_code() {
        assert!(matches!(
            LzwCodec.decompress(&[0, 0, 7], 2),
            Err(DecompressionError::IncompleteCode { position: 2 })
        ));
    }

    #[test]
    fn test_lzw_invalid_code() {
        assert!(matches!(
            LzwCodec.decompress(&[0xFF, 0xFF], 1),
            Err(DecompressionError::InvalidCode { code: 65535, .. })
        ));
    }

    #[test]
    fn test_lzw_length_mismatch() {
        let packed = LzwCodec.compress(b"Hello, World!").unwrap();
        assert!(matches!(
            LzwCodec.decompress(&packed, 12),
            Err(DecompressionError::LengthMismatch {
                expected: 12,
                actual: 13
            })
        ));
    }

    fn chain(last: u16) -> Vec<u8> {
        // 0 then 256, 257, ...: every code is the one being defined
        std::iter::once(0u16)
            .chain(256..=last)
            .flat_map(u16::to_le_bytes)
            .collect()
    }

    #[test]
    fn test_lzw_stops_at_declared_len() {
        // Outputs grow 1, 2, 3, 4, 5, 6 bytes; the sixth code crosses 16
        assert!(matches!(
            LzwCodec.decompress(&chain(4255), 16),
            Err(DecompressionError::LengthMismatch {
                expected: 16,
                actual: 21
            })
        ));
    }

    #[test]
    fn test_lzw_chain_exact_len() {
        assert_eq!(LzwCodec.decompress(&chain(259), 15).unwrap(), vec![0; 15]);
    }

    #[test]
    fn test_lzw_string() {
        roundtrip(b"Hello, World!");
    }

    #[test]
    fn test_lzw_repeated_pattern() {
        // Exercises the code-defined-this-step case
        roundtrip(&[1, 1, 1, 1, 1, 1, 1]);
        roundtrip(&[1, 2, 1, 2, 1, 2, 1, 2, 3]);
    }

    #[test]
    fn test_lzw_compresses_runs() {
        let data = vec![7u8; 4096];
        let packed = LzwCodec.compress(&data).unwrap();
        assert!(packed.len() < data.len() / 8);
    }

    #[test]
    fn test_lzw_full_dictionary() {
        // Enough distinct pairs to fill all 65536 entries
        let data: Vec<u8> = (0..300_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
            .collect();
        roundtrip(&data);
    }
}
