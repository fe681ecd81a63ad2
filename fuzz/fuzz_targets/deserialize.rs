#![no_main]

use libfuzzer_sys::fuzz_target;
use tsproof_core::Timestamp;

// First byte picks the root message length, the rest is the proof.
fuzz_target!(|data: &[u8]| {
    let Some((&n, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(n).min(rest.len());
    let (msg, proof) = rest.split_at(split);

    if let Ok(ts) = Timestamp::from_bytes(proof, msg.to_vec()) {
        let bytes = ts.to_bytes().expect("parsed proof serializes");
        let again = Timestamp::from_bytes(&bytes, msg.to_vec()).expect("canonical proof parses");
        assert_eq!(again, ts);
    }
});
