#![no_main]

use libfuzzer_sys::fuzz_target;
use ssss_shamir::parse_share;

fuzz_target!(|data: &[u8]| {
    // parse_share must return Ok or Err for any UTF-8 input, and whatever
    // parses must print back to something that parses the same way.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(share) = parse_share(s) {
            let printed = share.to_string();
            assert_eq!(parse_share(&printed).ok(), Some(share));
        }
    }
});
