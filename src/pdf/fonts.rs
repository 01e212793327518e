//! Standard-14 Helvetica metrics and WinAnsi text encoding.
//!
//! Only the base-14 fonts are used, so nothing is embedded; widths are
//! needed for wrapping long lines inside a fixed column.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
}

/// Advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // {..~
];

const FALLBACK_WIDTH: u16 = 556;

impl Font {
    /// Name of the font in each page's resource dictionary.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    fn char_width(&self, c: char) -> u16 {
        let table = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Rendered width of `text` in points at `size`.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = transliterate(text)
            .chars()
            .map(|c| self.char_width(c) as u32)
            .sum();
        units as f32 * size / 1000.0
    }
}

/// Replace characters WinAnsi cannot show with printable stand-ins.
pub fn transliterate(text: &str) -> Cow<'_, str> {
    if text.contains('₹') {
        Cow::Owned(text.replace('₹', "Rs."))
    } else {
        Cow::Borrowed(text)
    }
}

/// Encode text for a `Tj` operand under WinAnsiEncoding.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    transliterate(text)
        .chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap to `max_width` points. Words wider than the column are
/// kept whole on their own line.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", current, word);
            if font.text_width(&candidate, size) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        // "Total" = T 611 + o 556 + t 278 + a 556 + l 222
        let width = Font::Regular.text_width("Total", 10.0);
        assert!((width - 22.23).abs() < 0.001, "width was {width}");
        assert!(Font::Bold.text_width("Total", 10.0) > width);
    }

    #[test]
    fn test_rupee_is_transliterated() {
        assert_eq!(transliterate("₹14,40,000"), "Rs.14,40,000");
        assert_eq!(encode_win_ansi("₹5"), b"Rs.5".to_vec());
    }

    #[test]
    fn test_encode_latin_and_punctuation() {
        assert_eq!(encode_win_ansi("é"), vec![0xe9]);
        assert_eq!(encode_win_ansi("customer’s"), b"customer\x92s".to_vec());
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_wrap_text() {
        let text = "Legal Standards: Operations uphold India's legal standards, and disputes \
                    will be addressed exclusively within India's jurisdiction.";
        let lines = wrap_text(text, Font::Regular, 10.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Regular.text_width(line, 10.0) <= 200.0, "{line} too wide");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_keeps_short_text_on_one_line() {
        assert_eq!(
            wrap_text("Basic Cost", Font::Regular, 9.0, 240.0),
            vec!["Basic Cost".to_string()]
        );
        assert_eq!(wrap_text("", Font::Regular, 9.0, 240.0), vec![String::new()]);
    }
}
