//! Property-based tests using proptest
//!
//! These tests validate codec and event-group invariants across randomly
//! generated inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use eventwire::core::codec::{Deserializer, Serializer};
use eventwire::core::kind::KindWidth;
use eventwire::core::wire::{Decode, Encode};
use eventwire::protocol::event_group::GroupCodec;
use proptest::prelude::*;

eventwire::event_group! {
    pub enum Telemetry {
        Sample { id: u32, reading: f64, tags: Vec<String> },
        Batch { ids: Vec<u16>, offsets: Vec<Vec<i64>> },
        Note { text: String, urgent: bool },
    }
}

fn encode_to_vec<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut buffer = vec![0u8; value.encoded_len()];
    let mut se = Serializer::new(&mut buffer);
    value.encode(&mut se).expect("Encoding into an exact-size buffer should not fail");
    assert_eq!(se.finish(), buffer.len());
    buffer
}

fn telemetry() -> impl Strategy<Value = Telemetry> {
    prop_oneof![
        (any::<u32>(), -1e9f64..1e9, prop::collection::vec(".{0,12}", 0..4)).prop_map(
            |(id, reading, tags)| Telemetry::from(Sample { id, reading, tags })
        ),
        (
            prop::collection::vec(any::<u16>(), 0..16),
            prop::collection::vec(prop::collection::vec(any::<i64>(), 0..4), 0..4)
        )
            .prop_map(|(ids, offsets)| Telemetry::from(Batch { ids, offsets })),
        (".{0,40}", any::<bool>())
            .prop_map(|(text, urgent)| Telemetry::from(Note { text, urgent })),
    ]
}

// Property: encoded_len is exact for strings of any content
proptest! {
    #[test]
    fn prop_string_encoded_len_exact(text in ".{0,200}") {
        let bytes = encode_to_vec(text.as_str());
        prop_assert_eq!(bytes.len(), 4 + text.len());
        prop_assert_eq!(&bytes[..4], &(text.len() as i32).to_le_bytes()[..]);

        let mut de = Deserializer::new(&bytes);
        prop_assert_eq!(de.deserialize_str().expect("Decoding should not fail"), text.as_str());
    }
}

// Property: integers are little-endian on the wire
proptest! {
    #[test]
    fn prop_integers_little_endian(a in any::<i64>(), b in any::<u16>()) {
        let mut buffer = [0u8; 10];
        let mut se = Serializer::new(&mut buffer);
        se.serialize_i64(a).unwrap();
        se.serialize_u16(b).unwrap();
        prop_assert_eq!(&buffer[..8], &a.to_le_bytes()[..]);
        prop_assert_eq!(&buffer[8..], &b.to_le_bytes()[..]);
    }
}

// Property: group messages decode to the value that was encoded
proptest! {
    #[test]
    fn prop_group_roundtrip(value in telemetry()) {
        let codec = GroupCodec::<Telemetry>::new().unwrap();
        let bytes = codec.to_vec(&value).expect("Serialization should not fail");
        prop_assert_eq!(bytes.len(), codec.encoded_len(&value));
        prop_assert_eq!(codec.from_bytes(&bytes).expect("Deserialization should not fail"), value);
    }
}

// Property: every strict prefix of a message fails to decode without panicking
proptest! {
    #[test]
    fn prop_truncation_is_an_error(value in telemetry(), cut in any::<prop::sample::Index>()) {
        let codec = GroupCodec::<Telemetry>::new().unwrap();
        let bytes = codec.to_vec(&value).unwrap();
        let end = cut.index(bytes.len());
        prop_assert!(codec.from_bytes(&bytes[..end]).is_err());
    }
}

// Property: arbitrary bytes never panic the decoder
proptest! {
    #[test]
    fn prop_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let codec = GroupCodec::<Telemetry>::new().unwrap();
        let _ = codec.from_bytes(&bytes);

        let mut de = Deserializer::new(&bytes);
        let _ = Vec::<Vec<String>>::decode(&mut de);
    }
}

// Property: the kind width is the smallest that holds the variant count
proptest! {
    #[test]
    fn prop_kind_width_minimal(count in 0usize..200_000) {
        let width = KindWidth::for_variant_count(count);
        prop_assert!(count as u64 <= width.max_kind());
        let narrower = match width {
            KindWidth::U8 => None,
            KindWidth::U16 => Some(KindWidth::U8),
            KindWidth::U32 => Some(KindWidth::U16),
            KindWidth::U64 => Some(KindWidth::U32),
        };
        if let Some(narrower) = narrower {
            prop_assert!(count as u64 > narrower.max_kind());
        }
    }
}
