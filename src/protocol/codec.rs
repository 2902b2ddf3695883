use bytes::{BufMut, Bytes, BytesMut};

use crate::core::{Error, Result};
use super::TELEGRAM_START;

/// Telegram framing: `[0x41, len, payload.., checksum]`
#[derive(Clone, Copy, Debug, Default)]
pub struct TelegramCodec;

impl TelegramCodec {
    /// Creates a new telegram codec
    pub fn new() -> Self {
        TelegramCodec
    }

    /// Checksum over the length byte and payload
    pub fn checksum(length: u8, payload: &[u8]) -> u8 {
        payload
            .iter()
            .fold(length, |acc, b| acc.wrapping_add(*b))
    }

    /// Frames a payload of at most 255 bytes
    pub fn encode(&self, payload: &[u8]) -> Result<Bytes> {
        let length = u8::try_from(payload.len()).map_err(|_| {
            Error::invalid_argument(format!("telegram payload of {} bytes exceeds 255", payload.len()))
        })?;

        let mut dst = BytesMut::with_capacity(payload.len() + 3);
        dst.put_u8(TELEGRAM_START);
        dst.put_u8(length);
        dst.extend_from_slice(payload);
        dst.put_u8(Self::checksum(length, payload));
        Ok(dst.freeze())
    }

    /// Verifies `body` (payload plus trailing checksum) and returns the payload
    pub fn decode(&self, length: u8, body: &[u8]) -> Result<Bytes> {
        if body.len() != length as usize + 1 {
            return Err(Error::invalid_argument(format!(
                "telegram body must be {} bytes, got {}",
                length as usize + 1,
                body.len()
            )));
        }

        let (payload, trailer) = body.split_at(length as usize);
        let expected = Self::checksum(length, payload);
        let actual = trailer[0];
        if expected != actual {
            return Err(Error::Checksum { expected, actual });
        }

        Ok(Bytes::copy_from_slice(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_frame(codec: &TelegramCodec, frame: &[u8]) -> Result<Bytes> {
        codec.decode(frame[1], &frame[2..])
    }

    #[test]
    fn test_encode_read_request() {
        let codec = TelegramCodec::new();
        let frame = codec.encode(&[0x00, 0x01, 0x08, 0x02, 0x02]).unwrap();
        // 0x05 + 0x00 + 0x01 + 0x08 + 0x02 + 0x02 = 0x12
        assert_eq!(&frame[..], &[0x41, 0x05, 0x00, 0x01, 0x08, 0x02, 0x02, 0x12]);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(TelegramCodec::checksum(0x02, &[0xff, 0xff]), 0x00);
    }

    #[test]
    fn test_round_trip_lengths() {
        let codec = TelegramCodec::new();
        for len in [0usize, 1, 5, 16, 255] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            let frame = codec.encode(&payload).unwrap();
            assert_eq!(frame.len(), len + 3);
            assert_eq!(&decode_frame(&codec, &frame).unwrap()[..], &payload[..]);
        }
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let codec = TelegramCodec::new();
        let payload = vec![0u8; 256];
        assert!(matches!(codec.encode(&payload), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_single_byte_corruption_detected() {
        let codec = TelegramCodec::new();
        let frame = codec.encode(&[0x01, 0x01, 0x08, 0x02, 0x02, 0x09, 0x01]).unwrap();

        // every payload byte and the checksum itself
        for index in 2..frame.len() {
            let mut corrupted = frame.to_vec();
            corrupted[index] = corrupted[index].wrapping_add(0x5a);
            assert!(
                matches!(decode_frame(&codec, &corrupted), Err(Error::Checksum { .. })),
                "corruption at {} went unnoticed",
                index
            );
        }
    }

    #[test]
    fn test_short_body_rejected() {
        let codec = TelegramCodec::new();
        assert!(matches!(codec.decode(3, &[0x01, 0x02]), Err(Error::InvalidArgument(_))));
    }

    proptest! {
        #[test]
        fn prop_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..=255)) {
            let codec = TelegramCodec::new();
            let frame = codec.encode(&payload).unwrap();
            prop_assert_eq!(frame.len(), payload.len() + 3);
            prop_assert_eq!(&decode_frame(&codec, &frame).unwrap()[..], &payload[..]);
        }

        #[test]
        fn prop_single_byte_corruption_detected(
            payload in proptest::collection::vec(any::<u8>(), 0..=255),
            position in any::<prop::sample::Index>(),
            delta in 1u8..=255,
        ) {
            let codec = TelegramCodec::new();
            let frame = codec.encode(&payload).unwrap();

            // payload bytes and the checksum, the length byte is taken as given
            let index = 2 + position.index(frame.len() - 2);
            let mut corrupted = frame.to_vec();
            corrupted[index] = corrupted[index].wrapping_add(delta);
            let checksum_err = matches!(
                decode_frame(&codec, &corrupted),
                Err(Error::Checksum { .. })
            );
            prop_assert!(checksum_err);
        }
    }
}
