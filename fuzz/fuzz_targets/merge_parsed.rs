#![no_main]

use libfuzzer_sys::fuzz_target;
use tsproof_core::Timestamp;

const MSG: &[u8] = b"fuzz";

fuzz_target!(|data: &[u8]| {
    let mid = data.len() / 2;
    let (left, right) = data.split_at(mid);
    let (Ok(a), Ok(b)) = (
        Timestamp::from_bytes(left, MSG.to_vec()),
        Timestamp::from_bytes(right, MSG.to_vec()),
    ) else {
        return;
    };

    let mut ab = a.clone();
    ab.merge(&b).expect("same root merges");
    let mut ba = b;
    ba.merge(&a).expect("same root merges");
    assert_eq!(ab, ba);
});
