mod common;

use common::{jpeg_segment, make_jpeg, sof_payload};
use imsize::formats::jpeg::{is_sof_marker, parse};
use imsize::{ByteCursor, FormatTag, Orientation, ParseError};

fn exif_app1(orientation: u16) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(b"MM\0*");
    payload.extend_from_slice(&8u32.to_be_bytes());
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.extend_from_slice(&0x0112u16.to_be_bytes());
    payload.extend_from_slice(&3u16.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&orientation.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&0u32.to_be_bytes());
    jpeg_segment(0xE1, &payload)
}

/// MPF APP2 with two entries, little-endian.
fn mpf_app2(sizes: [u32; 2], second_offset: u32) -> Vec<u8> {
    let mut tiff = b"II*\0".to_vec();
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    // MPFVersion
    tiff.extend_from_slice(&0xB000u16.to_le_bytes());
    tiff.extend_from_slice(&7u16.to_le_bytes());
    tiff.extend_from_slice(&4u32.to_le_bytes());
    tiff.extend_from_slice(b"0100");
    // NumberOfImages
    tiff.extend_from_slice(&0xB001u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&2u32.to_le_bytes());
    // MPEntry
    let entries_offset: u32 = 8 + 2 + 3 * 12 + 4;
    tiff.extend_from_slice(&0xB002u16.to_le_bytes());
    tiff.extend_from_slice(&7u16.to_le_bytes());
    tiff.extend_from_slice(&32u32.to_le_bytes());
    tiff.extend_from_slice(&entries_offset.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    for (size, offset) in [(sizes[0], 0u32), (sizes[1], second_offset)] {
        tiff.extend_from_slice(&0x0003_0000u32.to_le_bytes());
        tiff.extend_from_slice(&size.to_le_bytes());
        tiff.extend_from_slice(&offset.to_le_bytes());
        tiff.extend_from_slice(&[0, 0, 0, 0]);
    }

    let mut payload = b"MPF\0".to_vec();
    payload.extend(tiff);
    jpeg_segment(0xE2, &payload)
}

#[test]
fn test_jpeg_baseline_dimensions() {
    let jpeg = make_jpeg(640, 480, 3);
    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    assert_eq!(info.format, FormatTag::Jpeg);
    assert_eq!(info.width, 640);
    assert_eq!(info.height, 480);
    assert_eq!(info.channels, 3);
    assert_eq!(info.bit_depth, 8);
    assert_eq!(info.orientation, None);
    assert_eq!(info.num_images(), 1);
}

#[test]
fn test_jpeg_progressive_12bit_greyscale() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xC2, &sof_payload(12, 33, 17, 1)));
    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    assert_eq!((info.width, info.height, info.channels), (33, 17, 1));
    assert_eq!(info.bit_depth, 12);
}

#[test]
fn test_jpeg_sof_marker_set() {
    assert!(is_sof_marker(0xC0));
    assert!(is_sof_marker(0xC1));
    assert!(is_sof_marker(0xC2));
    assert!(is_sof_marker(0xCF));
    assert!(!is_sof_marker(0xC4));
    assert!(!is_sof_marker(0xC8));
    assert!(!is_sof_marker(0xCC));
    assert!(!is_sof_marker(0xDB));
}

#[test]
fn test_jpeg_dht_is_not_a_frame() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xC4, &[0u8; 17]));
    jpeg.extend(jpeg_segment(0xC0, &sof_payload(8, 10, 20, 3)));
    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    assert_eq!((info.width, info.height), (10, 20));
}

#[test]
fn test_jpeg_fill_bytes_and_standalone_markers() {
    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xFF, 0xFF];
    jpeg.extend_from_slice(&[0xFF, 0x01]);
    jpeg.extend(jpeg_segment(0xFE, b"comment"));
    jpeg.extend_from_slice(&[0xFF, 0xD0]);
    jpeg.extend(jpeg_segment(0xC0, &sof_payload(8, 5, 6, 3)));
    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    assert_eq!((info.width, info.height), (5, 6));
}

#[test]
fn test_jpeg_only_non_sof_markers_then_eof() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xE0, b"JFIF\0"));
    jpeg.extend(jpeg_segment(0xDB, &[0u8; 65]));
    let err = parse(&mut ByteCursor::new(&jpeg)).unwrap_err();
    assert_eq!(err, ParseError::NoFrameMarker);
}

#[test]
fn test_jpeg_sos_before_sof() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xDA, &[1, 1, 0, 0, 0x3F, 0]));
    let err = parse(&mut ByteCursor::new(&jpeg)).unwrap_err();
    assert_eq!(err, ParseError::NoFrameMarker);
}

#[test]
fn test_jpeg_eoi_before_sof() {
    let jpeg = [0xFF, 0xD8, 0xFF, 0xD9];
    let err = parse(&mut ByteCursor::new(&jpeg)).unwrap_err();
    assert_eq!(err, ParseError::NoFrameMarker);
}

#[test]
fn test_jpeg_soi_only_is_truncated() {
    let err = parse(&mut ByteCursor::new(&[0xFF, 0xD8])).unwrap_err();
    assert!(matches!(err, ParseError::Truncated { .. }));
}

#[test]
fn test_jpeg_segment_overruns_input() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xE0, &[0u8; 40]));
    jpeg.truncate(20);
    let err = parse(&mut ByteCursor::new(&jpeg)).unwrap_err();
    assert!(matches!(err, ParseError::Truncated { .. }));
}

#[test]
fn test_jpeg_segment_length_below_two() {
    let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x01, 0x00, 0x00];
    let err = parse(&mut ByteCursor::new(&jpeg)).unwrap_err();
    assert!(matches!(err, ParseError::MalformedHeader(_)));
}

#[test]
fn test_jpeg_garbage_between_segments() {
    let jpeg = [0xFF, 0xD8, 0x12, 0x34, 0x56];
    let err = parse(&mut ByteCursor::new(&jpeg)).unwrap_err();
    assert!(matches!(err, ParseError::MalformedHeader(_)));
}

#[test]
fn test_jpeg_exif_orientation() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(exif_app1(6));
    jpeg.extend(jpeg_segment(0xC0, &sof_payload(8, 400, 300, 3)));
    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    assert_eq!(info.orientation, Some(Orientation::RightTop));
    assert_eq!(info.rot90_ccw_steps(), 3);
    assert_eq!(info.display_dimensions(), (300, 400));
}

#[test]
fn test_jpeg_broken_exif_is_ignored() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xE1, b"Exif\0\0XX\0\0garbage"));
    jpeg.extend(jpeg_segment(0xC0, &sof_payload(8, 40, 30, 3)));
    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    assert_eq!(info.orientation, None);
    assert_eq!((info.width, info.height), (40, 30));
}

#[test]
fn test_jpeg_xmp_app1_is_skipped() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xE1, b"http://ns.adobe.com/xap/1.0/\0<x:xmpmeta/>"));
    jpeg.extend(exif_app1(3));
    jpeg.extend(jpeg_segment(0xC0, &sof_payload(8, 40, 30, 3)));
    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    assert_eq!(info.orientation, Some(Orientation::BottomRight));
}

#[test]
fn test_jpeg_multi_picture_index() {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(jpeg_segment(0xE1, b"Exif\0\0"));
    let app2_start = jpeg.len();
    jpeg.extend(mpf_app2([5000, 1200], 4000));
    jpeg.extend(jpeg_segment(0xC0, &sof_payload(8, 64, 48, 3)));

    let info = parse(&mut ByteCursor::new(&jpeg)).unwrap();
    let mp = info.multi_picture.as_ref().unwrap();
    assert_eq!(info.num_images(), 2);
    assert_eq!(mp.entries[0].offset, 0);
    assert_eq!(mp.entries[0].size, 5000);
    // marker (2) + length (2) + "MPF\0" (4) precede the MPF TIFF header
    assert_eq!(mp.entries[1].offset, (app2_start + 8) as u64 + 4000);
    assert_eq!(mp.entries[1].size, 1200);
}

#[test]
fn test_jpeg_bad_signature() {
    let err = parse(&mut ByteCursor::new(&[0x89, 0x50, 0x4E, 0x47])).unwrap_err();
    assert_eq!(err, ParseError::FormatMismatch { expected: "JPEG" });
}
