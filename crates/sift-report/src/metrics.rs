//! Helvetica glyph widths and WinAnsi encoding for the built-in PDF font

/// Advance widths (1/1000 em) for ASCII 32..=126, from the Helvetica AFM
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Latin-1 supplement glyphs are mostly letter-sized
const DEFAULT_WIDTH: u16 = 556;

/// Map text to WinAnsi bytes. Tabs become spaces; anything without a
/// Latin-1 glyph becomes `?`.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Width of one encoded byte in points
pub fn byte_width(byte: u8, font_size: f32) -> f32 {
    let units = match byte {
        32..=126 => HELVETICA_ASCII[(byte - 32) as usize],
        _ => DEFAULT_WIDTH,
    };
    units as f32 * font_size / 1000.0
}

pub fn text_width(bytes: &[u8], font_size: f32) -> f32 {
    bytes.iter().map(|&b| byte_width(b, font_size)).sum()
}

/// Greedy line breaking: break after the last space that fits, or mid-word
/// when a single word is wider than the line. Always returns at least one
/// segment.
pub fn wrap(bytes: &[u8], max_width: f32, font_size: f32) -> Vec<Vec<u8>> {
    let mut segments = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut width = 0.0;
    let mut last_space: Option<usize> = None;

    for &byte in bytes {
        let w = byte_width(byte, font_size);

        if width + w > max_width && !current.is_empty() {
            if byte == b' ' {
                segments.push(std::mem::take(&mut current));
                width = 0.0;
                last_space = None;
                continue;
            }
            match last_space {
                Some(idx) => {
                    let rest = current.split_off(idx + 1);
                    current.truncate(idx);
                    segments.push(std::mem::replace(&mut current, rest));
                    width = text_width(&current, font_size);
                    if width + w > max_width && !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                        width = 0.0;
                    }
                }
                None => {
                    segments.push(std::mem::take(&mut current));
                    width = 0.0;
                }
            }
            last_space = None;
        }

        if byte == b' ' {
            last_space = Some(current.len());
        }
        current.push(byte);
        width += w;
    }

    segments.push(current);
    segments
}
