#![no_main]

use eventwire::core::codec::{DecodeLimits, Deserializer};
use eventwire::core::wire::Decode;
use eventwire::protocol::event_group::GroupCodec;
use libfuzzer_sys::fuzz_target;

eventwire::wire_enum! {
    pub enum Mode: u16 { Idle = 0, Active = 7, Broken = 65535 }
}

eventwire::event_group! {
    pub enum Sample {
        Text { body: String, tags: Vec<String> },
        Grid { cells: Vec<Vec<i32>>, mode: Mode },
        Flags { a: bool, b: bool, c: f64 },
    }
}

fuzz_target!(|data: &[u8]| {
    // Raw values must fail cleanly on malformed input
    let mut de = Deserializer::new(data);
    let _ = Vec::<Vec<String>>::decode(&mut de);

    let Ok(codec) = GroupCodec::<Sample>::new() else {
        return;
    };

    let limits = DecodeLimits {
        max_string_len: 1024,
        max_array_len: 256,
    };
    if let Ok(value) = codec.from_bytes_with_limits(data, limits) {
        // Re-encoding is never longer than the bytes that were consumed
        if let Ok(bytes) = codec.to_vec(&value) {
            assert!(bytes.len() <= data.len());
        }
    }
});
