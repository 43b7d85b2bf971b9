//! FlateDecode inflation and predictor reversal for image samples
//!
//! lopdf refuses to decompress image streams, so image XObjects are inflated
//! here. Samples are always 8 bits per component by the time they get here.

use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object};

use crate::resources::{dict_integer, resolve};

/// `/DecodeParms` entries that matter for 8-bit samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub predictor: i64,
    pub colors: usize,
    pub columns: usize,
}

impl DecodeParams {
    /// Parameters from the stream's `/DecodeParms`, which may be a dictionary
    /// or a one-element array matching a single filter
    pub fn from_stream(doc: &Document, dict: &Dictionary, width: usize, colors: usize) -> Self {
        let mut params = Self {
            predictor: 1,
            colors,
            columns: width,
        };

        let parms = dict
            .get(b"DecodeParms")
            .ok()
            .and_then(|p| resolve(doc, p).ok())
            .and_then(|p| match p {
                Object::Dictionary(d) => Some(d),
                Object::Array(items) => items
                    .first()
                    .and_then(|first| resolve(doc, first).ok())
                    .and_then(|first| first.as_dict().ok()),
                _ => None,
            });

        if let Some(parms) = parms {
            if let Some(predictor) = dict_integer(doc, parms, b"Predictor") {
                params.predictor = predictor;
            }
            if let Some(colors) = dict_integer(doc, parms, b"Colors").filter(|c| *c > 0) {
                params.colors = colors as usize;
            }
            if let Some(columns) = dict_integer(doc, parms, b"Columns").filter(|c| *c > 0) {
                params.columns = columns as usize;
            }
        }
        params
    }

    fn row_bytes(&self) -> usize {
        self.columns * self.colors
    }

    /// Upper bound on the inflated size of `rows` rows
    pub fn encoded_len(&self, rows: usize) -> usize {
        if self.predictor >= 10 {
            (self.row_bytes() + 1) * rows
        } else {
            self.row_bytes() * rows
        }
    }
}

/// Inflate a zlib stream, reading at most `limit` bytes of output
pub fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(limit as u64)
        .read_to_end(&mut out)
        .map_err(|e| format!("FlateDecode failed: {}", e))?;
    Ok(out)
}

/// Undo a TIFF (2) or PNG (10..=15) predictor
pub fn unpredict(data: Vec<u8>, params: &DecodeParams) -> Result<Vec<u8>, String> {
    match params.predictor {
        1 => Ok(data),
        2 => Ok(unpredict_tiff(data, params)),
        10..=15 => unpredict_png(&data, params),
        other => Err(format!("unsupported Predictor {}", other)),
    }
}

fn unpredict_tiff(mut data: Vec<u8>, params: &DecodeParams) -> Vec<u8> {
    let row = params.row_bytes();
    if row == 0 {
        return data;
    }
    for line in data.chunks_mut(row) {
        for i in params.colors..line.len() {
            line[i] = line[i].wrapping_add(line[i - params.colors]);
        }
    }
    data
}

/// Every row starts with its own PNG filter tag, whatever `/Predictor` says
fn unpredict_png(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>, String> {
    let row = params.row_bytes();
    let bpp = params.colors;
    let mut out: Vec<u8> = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row];

    for (index, encoded) in data.chunks(row + 1).enumerate() {
        if encoded.len() < row + 1 {
            break;
        }
        let tag = encoded[0];
        let mut line = encoded[1..].to_vec();

        for i in 0..row {
            let left = if i >= bpp { line[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => return Err(format!("invalid PNG filter {} on row {}", other, index)),
            };
            line[i] = line[i].wrapping_add(predicted);
        }

        out.extend_from_slice(&line);
        prev = line;
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::deflate;
    use super::*;
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    fn params(predictor: i64, colors: usize, columns: usize) -> DecodeParams {
        DecodeParams {
            predictor,
            colors,
            columns,
        }
    }

    #[test]
    fn test_inflate_round_trip_and_limit() {
        let data = deflate(&[7u8; 100]);
        assert_eq!(inflate(&data, 1000).unwrap(), vec![7u8; 100]);
        assert_eq!(inflate(&data, 10).unwrap().len(), 10);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        assert!(inflate(b"not zlib at all", 100).is_err());
    }

    #[test]
    fn test_png_sub_and_up_rows() {
        // 2 gray pixels per row: row 1 Sub, row 2 Up
        let encoded = vec![1, 10, 5, 2, 1, 1];
        let decoded = unpredict(encoded, &params(12, 1, 2)).unwrap();
        assert_eq!(decoded, vec![10, 15, 11, 16]);
    }

    #[test]
    fn test_png_average_and_paeth() {
        let encoded = vec![0, 100, 50, 3, 0, 0, 4, 0, 0];
        let decoded = unpredict(encoded, &params(15, 1, 2)).unwrap();
        // Average: 0 + (0+100)/2 = 50, then (50+50)/2 = 50
        assert_eq!(&decoded[2..4], &[50, 50]);
        // Paeth picks the pixel above when nothing is to the left
        assert_eq!(decoded[4], 50);
    }

    #[test]
    fn test_tiff_predictor() {
        let decoded = unpredict(vec![10, 1, 1, 20, 2, 2], &params(2, 1, 3)).unwrap();
        assert_eq!(decoded, vec![10, 11, 12, 20, 22, 24]);
    }

    #[test]
    fn test_invalid_filter_tag() {
        assert!(unpredict(vec![9, 0, 0], &params(10, 1, 2)).is_err());
        assert!(unpredict(vec![0, 0], &params(7, 1, 2)).is_err());
    }

    #[test]
    fn test_params_from_array_form() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "DecodeParms" => vec![Object::Dictionary(dictionary! {
                "Predictor" => 15,
                "Colors" => 3,
                "Columns" => 4,
            })],
        };
        assert_eq!(DecodeParams::from_stream(&doc, &dict, 9, 1), params(15, 3, 4));
        assert_eq!(
            DecodeParams::from_stream(&doc, &Dictionary::new(), 9, 1),
            params(1, 1, 9)
        );
    }
}
