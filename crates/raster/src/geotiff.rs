//! Minimal GeoTIFF reader/writer.
//!
//! Covers exactly what the pipeline produces: little-endian, single
//! strip, uncompressed, either one 32-bit float band (no-data NaN) or
//! three interleaved 8-bit bands (no-data black). Georeferencing is
//! carried in the ModelPixelScale/ModelTiepoint tags plus a GeoKey
//! directory naming the EPSG code, and the no-data value is recorded in
//! the GDAL_NODATA tag so external GIS tools read the artifacts
//! correctly.

use crate::error::RasterError;
use crate::surface::{RgbRaster, ScalarRaster};
use bytes::{BufMut, BytesMut};
use gw_common::{CrsCode, GeoTransform};
use std::path::Path;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_DOUBLE: u16 = 12;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_PLANAR_CONFIG: u16 = 284;
const TAG_SAMPLE_FORMAT: u16 = 339;
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

/// A raster decoded from a GeoTIFF, either band layout.
#[derive(Debug, Clone)]
pub enum DecodedRaster {
    Scalar(ScalarRaster),
    Rgb(RgbRaster),
}

impl DecodedRaster {
    pub fn crs(&self) -> CrsCode {
        match self {
            DecodedRaster::Scalar(r) => r.crs,
            DecodedRaster::Rgb(r) => r.crs,
        }
    }
}

/// Encode a single-band float raster.
pub fn encode_scalar(raster: &ScalarRaster) -> Result<Vec<u8>, RasterError> {
    let mut strip = BytesMut::with_capacity(raster.data.len() * 4);
    for v in &raster.data {
        strip.put_f32_le(*v);
    }

    let mut entries = base_entries(raster.width, raster.height, strip.len());
    entries.push(Entry::shorts(TAG_BITS_PER_SAMPLE, vec![32]));
    entries.push(Entry::shorts(TAG_PHOTOMETRIC, vec![1]));
    entries.push(Entry::shorts(TAG_SAMPLES_PER_PIXEL, vec![1]));
    entries.push(Entry::shorts(TAG_SAMPLE_FORMAT, vec![3]));
    entries.push(Entry::ascii(TAG_GDAL_NODATA, "nan"));
    entries.extend(geo_entries(&raster.transform, raster.crs));

    assemble(entries, &strip)
}

/// Encode a three-band RGB raster.
pub fn encode_rgb(raster: &RgbRaster) -> Result<Vec<u8>, RasterError> {
    let strip = BytesMut::from(&raster.data[..]);

    let mut entries = base_entries(raster.width, raster.height, strip.len());
    entries.push(Entry::shorts(TAG_BITS_PER_SAMPLE, vec![8, 8, 8]));
    entries.push(Entry::shorts(TAG_PHOTOMETRIC, vec![2]));
    entries.push(Entry::shorts(TAG_SAMPLES_PER_PIXEL, vec![3]));
    entries.push(Entry::shorts(TAG_SAMPLE_FORMAT, vec![1, 1, 1]));
    entries.push(Entry::ascii(TAG_GDAL_NODATA, "0"));
    entries.extend(geo_entries(&raster.transform, raster.crs));

    assemble(entries, &strip)
}

pub fn write_scalar_file(path: &Path, raster: &ScalarRaster) -> Result<(), RasterError> {
    std::fs::write(path, encode_scalar(raster)?)?;
    Ok(())
}

pub fn write_rgb_file(path: &Path, raster: &RgbRaster) -> Result<(), RasterError> {
    std::fs::write(path, encode_rgb(raster)?)?;
    Ok(())
}

pub fn read_file(path: &Path) -> Result<DecodedRaster, RasterError> {
    decode(&std::fs::read(path)?)
}

struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    /// Raw little-endian value bytes, inline or relocated to the
    /// external area at assembly time.
    value: Vec<u8>,
}

impl Entry {
    fn shorts(tag: u16, values: Vec<u16>) -> Self {
        let mut value = Vec::with_capacity(values.len() * 2);
        for v in &values {
            value.extend_from_slice(&v.to_le_bytes());
        }
        Entry {
            tag,
            field_type: TYPE_SHORT,
            count: values.len() as u32,
            value,
        }
    }

    fn longs(tag: u16, values: Vec<u32>) -> Self {
        let mut value = Vec::with_capacity(values.len() * 4);
        for v in &values {
            value.extend_from_slice(&v.to_le_bytes());
        }
        Entry {
            tag,
            field_type: TYPE_LONG,
            count: values.len() as u32,
            value,
        }
    }

    fn doubles(tag: u16, values: Vec<f64>) -> Self {
        let mut value = Vec::with_capacity(values.len() * 8);
        for v in &values {
            value.extend_from_slice(&v.to_le_bytes());
        }
        Entry {
            tag,
            field_type: TYPE_DOUBLE,
            count: values.len() as u32,
            value,
        }
    }

    fn ascii(tag: u16, s: &str) -> Self {
        let mut value = s.as_bytes().to_vec();
        value.push(0);
        Entry {
            tag,
            field_type: TYPE_ASCII,
            count: value.len() as u32,
            value,
        }
    }
}

fn base_entries(width: usize, height: usize, strip_len: usize) -> Vec<Entry> {
    vec![
        Entry::longs(TAG_IMAGE_WIDTH, vec![width as u32]),
        Entry::longs(TAG_IMAGE_LENGTH, vec![height as u32]),
        Entry::shorts(TAG_COMPRESSION, vec![1]),
        Entry::longs(TAG_STRIP_OFFSETS, vec![8]),
        Entry::longs(TAG_ROWS_PER_STRIP, vec![height as u32]),
        Entry::longs(TAG_STRIP_BYTE_COUNTS, vec![strip_len as u32]),
        Entry::shorts(TAG_PLANAR_CONFIG, vec![1]),
    ]
}

fn geo_entries(transform: &GeoTransform, crs: CrsCode) -> Vec<Entry> {
    // GeoKey directory: version 1.1, revision 0, three keys
    let (model_type, epsg_key) = if crs.is_geographic() {
        (2u16, 2048u16)
    } else {
        (1u16, 3072u16)
    };
    let keys = vec![
        1, 1, 0, 3, // header
        1024, 0, 1, model_type, // GTModelType
        1025, 0, 1, 1, // GTRasterType = PixelIsArea
        epsg_key, 0, 1, crs.epsg() as u16,
    ];

    vec![
        Entry::doubles(
            TAG_MODEL_PIXEL_SCALE,
            vec![transform.pixel_width, transform.pixel_height.abs(), 0.0],
        ),
        Entry::doubles(
            TAG_MODEL_TIEPOINT,
            vec![0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0],
        ),
        Entry::shorts(TAG_GEO_KEY_DIRECTORY, keys),
    ]
}

/// Lay out header, strip, external value area, and IFD.
fn assemble(mut entries: Vec<Entry>, strip: &[u8]) -> Result<Vec<u8>, RasterError> {
    entries.sort_by_key(|e| e.tag);

    let strip_padded = strip.len() + strip.len() % 2;
    let external_base = 8 + strip_padded;

    // Sizes of out-of-line values, each padded to a word boundary
    let mut external_len = 0usize;
    for e in &entries {
        if e.value.len() > 4 {
            external_len += e.value.len() + e.value.len() % 2;
        }
    }
    let ifd_offset = external_base + external_len;
    if ifd_offset > u32::MAX as usize {
        return Err(RasterError::Encode("raster too large for TIFF".to_string()));
    }

    let mut out = BytesMut::with_capacity(ifd_offset + 6 + entries.len() * 12);
    out.put_slice(b"II");
    out.put_u16_le(42);
    out.put_u32_le(ifd_offset as u32);
    out.put_slice(strip);
    if strip.len() % 2 == 1 {
        out.put_u8(0);
    }

    // External value area, remembering where each landed
    let mut offsets = Vec::with_capacity(entries.len());
    let mut cursor = external_base;
    for e in &entries {
        if e.value.len() > 4 {
            offsets.push(cursor as u32);
            out.put_slice(&e.value);
            if e.value.len() % 2 == 1 {
                out.put_u8(0);
            }
            cursor += e.value.len() + e.value.len() % 2;
        } else {
            offsets.push(0);
        }
    }

    out.put_u16_le(entries.len() as u16);
    for (e, offset) in entries.iter().zip(&offsets) {
        out.put_u16_le(e.tag);
        out.put_u16_le(e.field_type);
        out.put_u32_le(e.count);
        if e.value.len() > 4 {
            out.put_u32_le(*offset);
        } else {
            let mut inline = [0u8; 4];
            inline[..e.value.len()].copy_from_slice(&e.value);
            out.put_slice(&inline);
        }
    }
    out.put_u32_le(0); // no next IFD

    Ok(out.to_vec())
}

/// Decode a GeoTIFF previously produced by this module (or any file
/// using the same conservative layout).
pub fn decode(bytes: &[u8]) -> Result<DecodedRaster, RasterError> {
    let r = Reader { bytes };
    if bytes.len() < 8 || &bytes[0..2] != b"II" || r.u16(2)? != 42 {
        return Err(RasterError::Decode(
            "not a little-endian TIFF".to_string(),
        ));
    }
    let ifd_offset = r.u32(4)? as usize;
    let entry_count = r.u16(ifd_offset)? as usize;

    let mut tags: Vec<(u16, u16, u32, usize)> = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let base = ifd_offset + 2 + i * 12;
        tags.push((r.u16(base)?, r.u16(base + 2)?, r.u32(base + 4)?, base + 8));
    }

    let ints = |tag: u16| -> Result<Vec<u64>, RasterError> { r.int_values(&tags, tag) };
    let width = *ints(TAG_IMAGE_WIDTH)?.first().ok_or_else(|| missing("width"))? as usize;
    let height = *ints(TAG_IMAGE_LENGTH)?.first().ok_or_else(|| missing("height"))? as usize;
    let spp = ints(TAG_SAMPLES_PER_PIXEL)
        .ok()
        .and_then(|v| v.first().copied())
        .unwrap_or(1);
    let bits = ints(TAG_BITS_PER_SAMPLE)?;
    let format = ints(TAG_SAMPLE_FORMAT)
        .ok()
        .and_then(|v| v.first().copied())
        .unwrap_or(1);
    if ints(TAG_COMPRESSION)?.first().copied().unwrap_or(1) != 1 {
        return Err(RasterError::Decode("compressed TIFF unsupported".to_string()));
    }

    let offsets = ints(TAG_STRIP_OFFSETS)?;
    let counts = ints(TAG_STRIP_BYTE_COUNTS)?;
    if offsets.len() != counts.len() {
        return Err(RasterError::Decode("strip table mismatch".to_string()));
    }
    let mut strip = Vec::new();
    for (&off, &len) in offsets.iter().zip(&counts) {
        let (off, len) = (off as usize, len as usize);
        let end = off.checked_add(len).filter(|&e| e <= bytes.len());
        let end = end.ok_or_else(|| RasterError::Decode("strip out of bounds".to_string()))?;
        strip.extend_from_slice(&bytes[off..end]);
    }

    let scale = r.double_values(&tags, TAG_MODEL_PIXEL_SCALE)?;
    let tiepoint = r.double_values(&tags, TAG_MODEL_TIEPOINT)?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(missing("georeferencing tags"));
    }
    let transform = GeoTransform::new(tiepoint[3], tiepoint[4], scale[0], -scale[1]);

    let keys = r.int_values(&tags, TAG_GEO_KEY_DIRECTORY)?;
    let mut epsg = None;
    for chunk in keys.get(4..).unwrap_or(&[]).chunks_exact(4) {
        if chunk[0] == 2048 || chunk[0] == 3072 {
            epsg = Some(chunk[3] as u32);
        }
    }
    let crs = epsg
        .and_then(CrsCode::from_epsg)
        .ok_or_else(|| missing("EPSG geokey"))?;

    match (spp, format, bits.first().copied()) {
        (1, 3, Some(32)) => {
            if strip.len() != width * height * 4 {
                return Err(RasterError::Decode("strip size mismatch".to_string()));
            }
            let data = strip
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Ok(DecodedRaster::Scalar(ScalarRaster::new(
                width, height, transform, crs, data,
            )))
        }
        (3, 1, Some(8)) => {
            if strip.len() != width * height * 3 {
                return Err(RasterError::Decode("strip size mismatch".to_string()));
            }
            Ok(DecodedRaster::Rgb(RgbRaster::new(
                width, height, transform, crs, strip,
            )))
        }
        (spp, format, bits) => Err(RasterError::Decode(format!(
            "unsupported layout: {spp} samples, format {format}, {bits:?} bits"
        ))),
    }
}

fn missing(what: &str) -> RasterError {
    RasterError::Decode(format!("missing {what}"))
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn u16(&self, at: usize) -> Result<u16, RasterError> {
        self.bytes
            .get(at..at + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or_else(|| RasterError::Decode("truncated file".to_string()))
    }

    fn u32(&self, at: usize) -> Result<u32, RasterError> {
        self.bytes
            .get(at..at + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| RasterError::Decode("truncated file".to_string()))
    }

    fn f64(&self, at: usize) -> Result<f64, RasterError> {
        self.bytes
            .get(at..at + 8)
            .map(|b| {
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            })
            .ok_or_else(|| RasterError::Decode("truncated file".to_string()))
    }

    fn find<'t>(
        &self,
        tags: &'t [(u16, u16, u32, usize)],
        tag: u16,
    ) -> Result<&'t (u16, u16, u32, usize), RasterError> {
        tags.iter()
            .find(|t| t.0 == tag)
            .ok_or_else(|| missing(&format!("tag {tag}")))
    }

    /// SHORT or LONG values of a tag, inline or external.
    fn int_values(
        &self,
        tags: &[(u16, u16, u32, usize)],
        tag: u16,
    ) -> Result<Vec<u64>, RasterError> {
        let &(_, field_type, count, value_at) = self.find(tags, tag)?;
        let size = match field_type {
            TYPE_SHORT => 2,
            TYPE_LONG => 4,
            other => {
                return Err(RasterError::Decode(format!(
                    "tag {tag}: expected integer type, got {other}"
                )))
            }
        };
        let total = size * count as usize;
        let base = if total <= 4 {
            value_at
        } else {
            self.u32(value_at)? as usize
        };
        (0..count as usize)
            .map(|i| match field_type {
                TYPE_SHORT => self.u16(base + i * 2).map(u64::from),
                _ => self.u32(base + i * 4).map(u64::from),
            })
            .collect()
    }

    fn double_values(
        &self,
        tags: &[(u16, u16, u32, usize)],
        tag: u16,
    ) -> Result<Vec<f64>, RasterError> {
        let &(_, field_type, count, value_at) = self.find(tags, tag)?;
        if field_type != TYPE_DOUBLE {
            return Err(RasterError::Decode(format!(
                "tag {tag}: expected DOUBLE, got {field_type}"
            )));
        }
        let base = self.u32(value_at)? as usize;
        (0..count as usize).map(|i| self.f64(base + i * 8)).collect()
    }
}
