//! Day payload encodings.
//!
//! Two interchangeable encodings of an ordered record list:
//!
//! - JSON: an array of objects with integer enum fields.
//! - Binary: fixed 52-byte little-endian records:
//!
//! ```text
//! offset size field
//!      0   32 symbol name, UTF-8, NUL padded
//!     32    8 open timestamp (i64)
//!     40    4 duration seconds (u32)
//!     44    4 win-rate hint (f32)
//!     48    1 direction (i8)
//!     49    1 result (i8)
//!     50    1 group (u8)
//!     51    1 symbol index (u8)
//! ```

use binopt_core::record::MAX_NAME_LEN;
use binopt_core::{Direction, PayloadEncoding, Result, WagerError, WagerRecord, WagerResult};

/// Size of one binary record.
pub const BINARY_RECORD_SIZE: usize = 52;

/// Converts between record lists and day payloads.
pub trait RecordCodec: Send + Sync {
    /// Encoding implemented by this codec.
    fn encoding(&self) -> PayloadEncoding;

    /// Encodes records in the given order.
    ///
    /// # Errors
    /// `Parser` if a record cannot be represented.
    fn encode(&self, records: &[WagerRecord]) -> Result<Vec<u8>>;

    /// Decodes a payload.
    ///
    /// # Errors
    /// `Parser` if the payload is malformed.
    fn decode(&self, payload: &[u8]) -> Result<Vec<WagerRecord>>;
}

/// Returns the codec for `encoding`.
#[must_use]
pub fn codec_for(encoding: PayloadEncoding) -> Box<dyn RecordCodec> {
    match encoding {
        PayloadEncoding::Json => Box::new(JsonCodec),
        PayloadEncoding::Binary => Box::new(BinaryCodec),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn encoding(&self) -> PayloadEncoding {
        PayloadEncoding::Json
    }

    fn encode(&self, records: &[WagerRecord]) -> Result<Vec<u8>> {
        serde_json::to_vec(records).map_err(|e| WagerError::Parser(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<WagerRecord>> {
        serde_json::from_slice(payload).map_err(|e| WagerError::Parser(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    fn encode_one(record: &WagerRecord, out: &mut Vec<u8>) {
        let mut name = [0_u8; MAX_NAME_LEN];
        let bytes = record.name().as_bytes();
        name[..bytes.len()].copy_from_slice(bytes);
        out.extend_from_slice(&name);
        out.extend_from_slice(&record.timestamp().to_le_bytes());
        out.extend_from_slice(&record.duration().to_le_bytes());
        out.extend_from_slice(&record.win_rate_hint().to_le_bytes());
        out.extend_from_slice(&record.direction().as_i8().to_le_bytes());
        out.extend_from_slice(&record.result().as_i8().to_le_bytes());
        out.push(record.group());
        out.push(record.symbol());
    }

    fn decode_one(chunk: &[u8; BINARY_RECORD_SIZE]) -> Result<WagerRecord> {
        let (name_bytes, rest) = chunk.split_at(MAX_NAME_LEN);
        let end = name_bytes.iter().position(|b| *b == 0).unwrap_or(MAX_NAME_LEN);
        if name_bytes[end..].iter().any(|b| *b != 0) {
            return Err(WagerError::Parser("non-zero bytes in name padding".to_string()));
        }
        let name = std::str::from_utf8(&name_bytes[..end])
            .map_err(|e| WagerError::Parser(format!("symbol name: {e}")))?;

        let timestamp = i64::from_le_bytes(field(rest, 0)?);
        let duration = u32::from_le_bytes(field(rest, 8)?);
        let hint = f32::from_le_bytes(field(rest, 12)?);
        if !hint.is_finite() {
            return Err(WagerError::Parser(format!("non-finite win-rate hint {hint}")));
        }
        let direction = Direction::try_from(i8::from_le_bytes([rest[16]]))?;
        let result = WagerResult::try_from(i8::from_le_bytes([rest[17]]))?;

        Ok(
            WagerRecord::new(name, rest[19], direction, result, duration, timestamp)
                .with_group(rest[18])
                .with_win_rate_hint(hint),
        )
    }
}

fn field<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N]> {
    bytes
        .get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| WagerError::Parser(format!("truncated field at offset {offset}")))
}

impl RecordCodec for BinaryCodec {
    fn encoding(&self) -> PayloadEncoding {
        PayloadEncoding::Binary
    }

    fn encode(&self, records: &[WagerRecord]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(records.len() * BINARY_RECORD_SIZE);
        for record in records {
            Self::encode_one(record, &mut out);
        }
        Ok(out)
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<WagerRecord>> {
        if payload.len() % BINARY_RECORD_SIZE != 0 {
            return Err(WagerError::Parser(format!(
                "payload of {} bytes is not a multiple of {BINARY_RECORD_SIZE}",
                payload.len()
            )));
        }
        payload
            .chunks_exact(BINARY_RECORD_SIZE)
            .map(|chunk| {
                let chunk: &[u8; BINARY_RECORD_SIZE] = chunk
                    .try_into()
                    .map_err(|_| WagerError::Parser("short record".to_string()))?;
                Self::decode_one(chunk)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn sample_records() -> Vec<WagerRecord> {
        vec![
            WagerRecord::new("EURUSD", 1, Direction::Buy, WagerResult::Win, 180, 1_546_300_800)
                .with_group(2)
                .with_win_rate_hint(0.61),
            WagerRecord::new("GBPJPY", 7, Direction::Sell, WagerResult::Loss, 300, 1_546_300_860),
            WagerRecord::new(
                "A_NAME_THAT_IS_EXACTLY_32_BYTES!",
                255,
                Direction::NoBet,
                WagerResult::Neutral,
                u32::MAX,
                -5,
            ),
        ]
    }

    fn random_record(rng: &mut ChaCha8Rng) -> WagerRecord {
        let len = rng.gen_range(0..=MAX_NAME_LEN);
        let name: String = (0..len)
            .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
            .collect();
        let direction = Direction::try_from(rng.gen_range(-1_i8..=1)).unwrap();
        let result = WagerResult::try_from(rng.gen_range(-1_i8..=1)).unwrap();
        WagerRecord::new(
            &name,
            rng.gen(),
            direction,
            result,
            rng.gen(),
            rng.gen_range(0..4_000_000_000_i64),
        )
        .with_group(rng.gen())
        .with_win_rate_hint(rng.gen())
    }

    #[test]
    fn test_binary_layout() {
        let bytes = BinaryCodec.encode(&sample_records()[..1]).unwrap();
        assert_eq!(bytes.len(), BINARY_RECORD_SIZE);
        assert_eq!(&bytes[..6], b"EURUSD");
        assert!(bytes[6..32].iter().all(|b| *b == 0));
        assert_eq!(&bytes[32..40], &1_546_300_800_i64.to_le_bytes());
        assert_eq!(&bytes[40..44], &180_u32.to_le_bytes());
        assert_eq!(&bytes[44..48], &0.61_f32.to_le_bytes());
        assert_eq!(bytes[48], 1);
        assert_eq!(bytes[49], 1);
        assert_eq!(bytes[50], 2);
        assert_eq!(bytes[51], 1);
    }

    #[test]
    fn test_binary_decode_reencode_is_byte_identical() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let records: Vec<WagerRecord> = (0..200).map(|_| random_record(&mut rng)).collect();
        let bytes = BinaryCodec.encode(&records).unwrap();
        let decoded = BinaryCodec.decode(&bytes).unwrap();
        assert_eq!(BinaryCodec.encode(&decoded).unwrap(), bytes);
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_binary_rejects_bad_length() {
        let err = BinaryCodec.decode(&[0_u8; 53]).unwrap_err();
        assert!(matches!(err, WagerError::Parser(_)));
    }

    #[test]
    fn test_binary_rejects_bad_enum() {
        let mut bytes = BinaryCodec.encode(&sample_records()[..1]).unwrap();
        bytes[48] = 9;
        assert!(matches!(BinaryCodec.decode(&bytes), Err(WagerError::Parser(_))));
    }

    #[test]
    fn test_binary_rejects_dirty_padding() {
        let mut bytes = BinaryCodec.encode(&sample_records()[..1]).unwrap();
        bytes[20] = b'X';
        assert!(matches!(BinaryCodec.decode(&bytes), Err(WagerError::Parser(_))));
    }

    #[test]
    fn test_binary_rejects_non_finite_hint() {
        let mut bytes = BinaryCodec.encode(&sample_records()[..1]).unwrap();
        bytes[44..48].copy_from_slice(&f32::NAN.to_le_bytes());
        assert!(matches!(BinaryCodec.decode(&bytes), Err(WagerError::Parser(_))));
    }

    #[test]
    fn test_nul_name_and_non_finite_hint_round_trip() {
        let records = vec![
            WagerRecord::new("EUR\0USD", 1, Direction::Buy, WagerResult::Win, 60, 0)
                .with_win_rate_hint(f32::NAN),
            WagerRecord::new("GBP", 2, Direction::Sell, WagerResult::Loss, 60, 60)
                .with_win_rate_hint(f32::INFINITY),
        ];
        for encoding in [PayloadEncoding::Json, PayloadEncoding::Binary] {
            let codec = codec_for(encoding);
            let bytes = codec.encode(&records).unwrap();
            let decoded = codec.decode(&bytes).unwrap();
            assert_eq!(decoded, records);
            assert_eq!(codec.encode(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_json_and_binary_agree() {
        let records = sample_records();
        for encoding in [PayloadEncoding::Json, PayloadEncoding::Binary] {
            let codec = codec_for(encoding);
            assert_eq!(codec.encoding(), encoding);
            let decoded = codec.decode(&codec.encode(&records).unwrap()).unwrap();
            assert_eq!(decoded, records);
        }
    }

    #[test]
    fn test_json_field_names() {
        let text = String::from_utf8(JsonCodec.encode(&sample_records()[..1]).unwrap()).unwrap();
        for key in ["\"name\"", "\"symbol\"", "\"group\"", "\"direction\"", "\"result\"", "\"duration\"", "\"timestamp\"", "\"winrate\""] {
            assert!(text.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_json_decode_error_is_parser() {
        assert!(matches!(JsonCodec.decode(b"{not json"), Err(WagerError::Parser(_))));
        assert!(matches!(
            JsonCodec.decode(br#"[{"name":"X","symbol":0,"group":0,"direction":3,"result":0,"duration":1,"timestamp":0}]"#),
            Err(WagerError::Parser(_))
        ));
    }
}
