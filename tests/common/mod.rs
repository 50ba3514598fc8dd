#![allow(dead_code)]

pub const PNG_SIG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub fn make_png_chunk(chunk_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut chunk = Vec::new();
    chunk.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    chunk.extend_from_slice(chunk_type);
    chunk.extend_from_slice(payload);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(payload);
    chunk.extend_from_slice(&hasher.finalize().to_be_bytes());
    chunk
}

pub fn ihdr_payload(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&width.to_be_bytes());
    payload.extend_from_slice(&height.to_be_bytes());
    payload.push(bit_depth);
    payload.push(color_type);
    payload.extend_from_slice(&[0, 0, 0]);
    payload
}

/// Signature + IHDR, nothing else.
pub fn make_png(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
    let mut data = PNG_SIG.to_vec();
    data.extend(make_png_chunk(
        b"IHDR",
        &ihdr_payload(width, height, bit_depth, color_type),
    ));
    data
}

pub fn jpeg_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut seg = vec![0xFF, marker];
    seg.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    seg.extend_from_slice(payload);
    seg
}

pub fn sof_payload(precision: u8, width: u16, height: u16, components: u8) -> Vec<u8> {
    let mut payload = vec![precision];
    payload.extend_from_slice(&height.to_be_bytes());
    payload.extend_from_slice(&width.to_be_bytes());
    payload.push(components);
    for id in 0..components {
        payload.extend_from_slice(&[id + 1, 0x11, 0]);
    }
    payload
}

/// SOI, APP0, SOF0, SOS, EOI.
pub fn make_jpeg(width: u16, height: u16, components: u8) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    data.extend(jpeg_segment(0xE0, b"JFIF\0\x01\x02\0\0\x01\0\x01\0\0"));
    data.extend(jpeg_segment(0xC0, &sof_payload(8, width, height, components)));
    data.extend(jpeg_segment(0xDA, &[1, 1, 0, 0, 0x3F, 0]));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// Little-endian classic TIFF IFD entry value.
pub enum TiffValue {
    Short(u16),
    Long(u32),
    Longs(Vec<u32>),
    Shorts(Vec<u16>),
    Bytes(Vec<u8>),
}

/// Little-endian classic TIFF builder. `ifds[0]` is IFD0; entries of type
/// `SubIfds` reference later IFDs by index.
pub struct TiffBuilder {
    ifds: Vec<Vec<(u16, TiffValue)>>,
    sub_ifd_links: Vec<usize>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            ifds: vec![Vec::new()],
            sub_ifd_links: Vec::new(),
        }
    }

    pub fn entry(mut self, tag: u16, value: TiffValue) -> Self {
        self.ifds[0].push((tag, value));
        self
    }

    /// Adds a SubIFD of IFD0.
    pub fn sub_ifd(mut self, entries: Vec<(u16, TiffValue)>) -> Self {
        self.ifds.push(entries);
        self.sub_ifd_links.push(self.ifds.len() - 1);
        self
    }

    fn ifd_len(entries: &[(u16, TiffValue)]) -> usize {
        2 + entries.len() * 12 + 4
    }

    fn value_bytes(value: &TiffValue) -> (u16, u32, Vec<u8>) {
        match value {
            TiffValue::Short(v) => (3, 1, v.to_le_bytes().to_vec()),
            TiffValue::Long(v) => (4, 1, v.to_le_bytes().to_vec()),
            TiffValue::Shorts(vs) => (
                3,
                vs.len() as u32,
                vs.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ),
            TiffValue::Longs(vs) => (
                4,
                vs.len() as u32,
                vs.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ),
            TiffValue::Bytes(bs) => (1, bs.len() as u32, bs.clone()),
        }
    }

    pub fn build(mut self) -> Vec<u8> {
        const TAG_SUB_IFDS: u16 = 0x014A;

        // IFD offsets: header, then each IFD followed by its out-of-line data.
        let mut offsets = Vec::new();
        let mut pos = 8usize;
        let has_subs = !self.sub_ifd_links.is_empty();
        if has_subs {
            // placeholder so IFD0's size includes the SubIFDs entry
            self.ifds[0].push((TAG_SUB_IFDS, TiffValue::Longs(vec![0; self.sub_ifd_links.len()])));
        }
        for entries in &self.ifds {
            offsets.push(pos);
            let extra: usize = entries
                .iter()
                .map(|(_, v)| {
                    let (_, _, bytes) = Self::value_bytes(v);
                    if bytes.len() > 4 { bytes.len() } else { 0 }
                })
                .sum();
            pos += Self::ifd_len(entries) + extra;
        }
        if has_subs {
            let links: Vec<u32> = self
                .sub_ifd_links
                .iter()
                .map(|&i| offsets[i] as u32)
                .collect();
            if let Some(last) = self.ifds[0].last_mut() {
                last.1 = TiffValue::Longs(links);
            }
        }

        let mut out = b"II*\0".to_vec();
        out.extend_from_slice(&8u32.to_le_bytes());
        for (i, entries) in self.ifds.iter_mut().enumerate() {
            entries.sort_by_key(|(tag, _)| *tag);
            let base = offsets[i];
            let mut data_pos = base + Self::ifd_len(entries);
            let mut table = Vec::new();
            let mut data = Vec::new();
            table.extend_from_slice(&(entries.len() as u16).to_le_bytes());
            for (tag, value) in entries.iter() {
                let (ty, count, bytes) = Self::value_bytes(value);
                table.extend_from_slice(&tag.to_le_bytes());
                table.extend_from_slice(&ty.to_le_bytes());
                table.extend_from_slice(&count.to_le_bytes());
                if bytes.len() <= 4 {
                    let mut inline = bytes.clone();
                    inline.resize(4, 0);
                    table.extend_from_slice(&inline);
                } else {
                    table.extend_from_slice(&(data_pos as u32).to_le_bytes());
                    data_pos += bytes.len();
                    data.extend_from_slice(&bytes);
                }
            }
            table.extend_from_slice(&0u32.to_le_bytes());
            out.extend(table);
            out.extend(data);
        }
        out
    }
}

pub fn make_tiff(width: u32, height: u32, bits: u16, samples: u16) -> Vec<u8> {
    TiffBuilder::new()
        .entry(0x0100, TiffValue::Long(width))
        .entry(0x0101, TiffValue::Long(height))
        .entry(0x0102, TiffValue::Short(bits))
        .entry(0x0115, TiffValue::Short(samples))
        .build()
}

pub fn make_bmp(width: i32, height: i32, bits_per_pixel: u16) -> Vec<u8> {
    let mut data = b"BM".to_vec();
    data.extend_from_slice(&0u32.to_le_bytes()); // file size
    data.extend_from_slice(&0u32.to_le_bytes()); // reserved
    data.extend_from_slice(&54u32.to_le_bytes()); // pixel offset
    data.extend_from_slice(&40u32.to_le_bytes());
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&bits_per_pixel.to_le_bytes());
    data.extend_from_slice(&[0u8; 24]);
    data
}

pub fn exr_attribute(name: &str, kind: &str, payload: &[u8]) -> Vec<u8> {
    let mut attr = Vec::new();
    attr.extend_from_slice(name.as_bytes());
    attr.push(0);
    attr.extend_from_slice(kind.as_bytes());
    attr.push(0);
    attr.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    attr.extend_from_slice(payload);
    attr
}

/// `channels`: (name, pixel type) pairs.
pub fn exr_chlist(channels: &[(&str, i32)]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (name, pixel_type) in channels {
        payload.extend_from_slice(name.as_bytes());
        payload.push(0);
        payload.extend_from_slice(&pixel_type.to_le_bytes());
        payload.extend_from_slice(&[0, 0, 0, 0]);
        payload.extend_from_slice(&1i32.to_le_bytes());
        payload.extend_from_slice(&1i32.to_le_bytes());
    }
    payload.push(0);
    payload
}

pub fn exr_box2i(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Vec<u8> {
    [xmin, ymin, xmax, ymax]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

pub fn make_exr(width: i32, height: i32, channels: &[(&str, i32)]) -> Vec<u8> {
    let mut data = vec![0x76, 0x2F, 0x31, 0x01];
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend(exr_attribute("channels", "chlist", &exr_chlist(channels)));
    data.extend(exr_attribute("compression", "compression", &[0]));
    data.extend(exr_attribute(
        "dataWindow",
        "box2i",
        &exr_box2i(0, 0, width - 1, height - 1),
    ));
    data.push(0);
    data
}

pub fn make_hdr(resolution: &str) -> Vec<u8> {
    format!("#?RADIANCE\nFORMAT=32-bit_rle_rgbe\nEXPOSURE=1.0\n\n{resolution}\n")
        .into_bytes()
}

/// Version 1.0 `.npy` header, padded the way NumPy pads it.
pub fn make_npy(descr: &str, shape: &str) -> Vec<u8> {
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut data = b"\x93NUMPY\x01\x00".to_vec();
    data.extend_from_slice(&(header.len() as u16).to_le_bytes());
    data.extend_from_slice(header.as_bytes());
    data
}
