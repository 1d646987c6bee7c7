#![no_main]

use libfuzzer_sys::fuzz_target;
use ssss_shamir::{combine, SecretEncoding};

fuzz_target!(|data: &[u8]| {
    // First byte picks the threshold, the rest is one share per line.
    let Some((&threshold, rest)) = data.split_first() else {
        return;
    };
    if let Ok(s) = std::str::from_utf8(rest) {
        let shares: Vec<&str> = s.lines().collect();
        let threshold = usize::from(threshold % 8);
        let _ = combine(&shares, threshold, SecretEncoding::Text);
        let _ = combine(&shares, threshold, SecretEncoding::Hex);
    }
});
