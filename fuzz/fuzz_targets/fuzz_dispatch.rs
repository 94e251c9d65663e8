#![no_main]

use eventwire::protocol::dispatcher::DispatchTableBuilder;
use libfuzzer_sys::fuzz_target;

eventwire::event_group! {
    pub enum Lobby {
        Join { name: String },
        Leave { name: String, reason: u8 },
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut builder = DispatchTableBuilder::new();
    if builder.register::<Lobby>(0).is_err() {
        return;
    }
    let table = builder.build();
    let _ = table.subscribe::<Join, _>(|join| {
        assert!(join.name.len() <= 1 << 20);
        Ok(())
    });

    // First byte picks the group identifier; unknown ones must be dropped
    let _ = table.dispatch_incoming(u32::from(data[0] % 2), &data[1..]);
});
