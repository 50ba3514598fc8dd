#![no_main]

use imsize::ByteCursor;
use imsize::formats::jpeg;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut input = vec![0xFF, 0xD8];
    input.extend_from_slice(data);
    let _ = jpeg::parse(&mut ByteCursor::new(&input));
});
