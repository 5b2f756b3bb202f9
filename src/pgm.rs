//! Greyscale PGM test images
//!
//! The demo transmits a greyscale image and compares it bit-for-bit after the
//! round trip. Both binary (`P5`) and plain (`P2`) NetPBM variants are read;
//! output is always binary. Only 8-bit images (maxval <= 255) are supported.

use std::fs;
use std::path::Path;

use snafu::{ensure, OptionExt, ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum PgmError {
    #[snafu(display("failed to read '{path}': {source}"))]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("failed to write '{path}': {source}"))]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("'{path}' is not a P5/P2 PGM file"))]
    BadMagic { path: String },

    #[snafu(display("'{path}' has a truncated or malformed header"))]
    BadHeader { path: String },

    #[snafu(display("'{path}' uses maxval {maxval}, only 8-bit images are supported"))]
    UnsupportedDepth { path: String, maxval: usize },

    #[snafu(display("'{path}' holds {actual} pixels, header promises {expected}"))]
    TruncatedData {
        path: String,
        expected: usize,
        actual: usize,
    },
}

/// An 8-bit greyscale image, pixels in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreyImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl GreyImage {
    /// Total pixel (and payload byte) count.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Load a P5 or P2 PGM file.
    pub fn load(path: &Path) -> Result<Self, PgmError> {
        let display = path.display().to_string();
        let raw = fs::read(path).context(ReadFileSnafu {
            path: display.clone(),
        })?;
        parse_pgm(&raw, &display)
    }

    /// Save as binary P5 PGM.
    pub fn save(&self, path: &Path) -> Result<(), PgmError> {
        let display = path.display().to_string();
        let mut out = Vec::with_capacity(self.pixels.len() + 32);
        out.extend_from_slice(format!("P5\n{} {}\n255\n", self.width, self.height).as_bytes());
        out.extend_from_slice(&self.pixels);
        fs::write(path, out).context(WriteFileSnafu { path: display })
    }
}

fn parse_pgm(raw: &[u8], path: &str) -> Result<GreyImage, PgmError> {
    ensure!(raw.len() >= 2, BadMagicSnafu { path });
    let binary = match &raw[0..2] {
        b"P5" => true,
        b"P2" => false,
        _ => return BadMagicSnafu { path }.fail(),
    };

    let mut cursor = 2;
    let width = next_header_value(raw, &mut cursor).context(BadHeaderSnafu { path })?;
    let height = next_header_value(raw, &mut cursor).context(BadHeaderSnafu { path })?;
    let maxval = next_header_value(raw, &mut cursor).context(BadHeaderSnafu { path })?;
    ensure!(maxval <= 255, UnsupportedDepthSnafu { path, maxval });

    let expected = width * height;
    let pixels = if binary {
        // A single whitespace byte separates the header from raw data; the
        // file may end right after the header.
        let data = raw.get(cursor + 1..).unwrap_or_default();
        ensure!(
            data.len() >= expected,
            TruncatedDataSnafu {
                path,
                expected,
                actual: data.len()
            }
        );
        data[..expected].to_vec()
    } else {
        let mut pixels = Vec::with_capacity(expected);
        while pixels.len() < expected {
            let value = next_header_value(raw, &mut cursor).context(TruncatedDataSnafu {
                path,
                expected,
                actual: pixels.len(),
            })?;
            pixels.push(value.min(255) as u8);
        }
        pixels
    };

    Ok(GreyImage {
        width,
        height,
        pixels,
    })
}

/// Read the next decimal token, skipping whitespace and `#` comments.
fn next_header_value(raw: &[u8], cursor: &mut usize) -> Option<usize> {
    loop {
        while *cursor < raw.len() && raw[*cursor].is_ascii_whitespace() {
            *cursor += 1;
        }
        if *cursor < raw.len() && raw[*cursor] == b'#' {
            while *cursor < raw.len() && raw[*cursor] != b'\n' {
                *cursor += 1;
            }
            continue;
        }
        break;
    }

    let start = *cursor;
    while *cursor < raw.len() && raw[*cursor].is_ascii_digit() {
        *cursor += 1;
    }
    if start == *cursor {
        return None;
    }
    std::str::from_utf8(&raw[start..*cursor]).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rustyofdm_{}", name))
    }

    fn gradient(width: usize, height: usize) -> GreyImage {
        let pixels = (0..width * height).map(|i| (i % 251) as u8).collect();
        GreyImage {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let path = temp_path("gradient.pgm");
        let image = gradient(31, 17);
        image.save(&path).unwrap();
        let loaded = GreyImage::load(&path).unwrap();
        assert_eq!(loaded, image);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_parse_plain_p2() {
        let raw = b"P2\n# a comment\n3 2\n255\n0 10 20\n30 40 50\n";
        let image = parse_pgm(raw, "inline").unwrap();
        assert_eq!(image.width, 3);
        assert_eq!(image.height, 2);
        assert_eq!(image.pixels, vec![0, 10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_parse_binary_p5() {
        let mut raw = b"P5\n2 2\n255\n".to_vec();
        raw.extend_from_slice(&[1, 2, 3, 4]);
        let image = parse_pgm(&raw, "inline").unwrap();
        assert_eq!(image.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_comment_between_header_fields() {
        let mut raw = b"P5\n2\n# width above, height below\n1\n255\n".to_vec();
        raw.extend_from_slice(&[7, 9]);
        let image = parse_pgm(&raw, "inline").unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels, vec![7, 9]);
    }

    #[test]
    fn test_bad_magic_rejected() {
        assert!(matches!(
            parse_pgm(b"P6\n1 1\n255\nx", "inline"),
            Err(PgmError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_header_without_pixel_data_rejected() {
        // File ends exactly after the maxval digits, no separator byte.
        assert!(matches!(
            parse_pgm(b"P5\n2 2\n255", "inline"),
            Err(PgmError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_truncated_data_rejected() {
        let raw = b"P5\n4 4\n255\n\x01\x02";
        assert!(matches!(
            parse_pgm(raw, "inline"),
            Err(PgmError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_sixteen_bit_rejected() {
        let raw = b"P5\n1 1\n65535\n\x00\x00";
        assert!(matches!(
            parse_pgm(raw, "inline"),
            Err(PgmError::UnsupportedDepth { .. })
        ));
    }
}
