#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = imsize::sniff_bytes(data);
    if let Ok(info) = imsize::inspect_bytes(data) {
        assert!(info.width > 0 && info.height > 0);
        assert!(info.channels > 0 && info.bit_depth > 0);
    }
});
