#![no_main]

use imsize::ByteCursor;
use imsize::formats::tiff;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = tiff::parse(&mut ByteCursor::new(data), 16);
});
