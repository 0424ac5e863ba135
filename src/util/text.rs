use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within `max_width` terminal columns.
///
/// When the text is cut, "..." is appended and counted against the width.
/// Column widths are Unicode-aware (CJK and emoji take two columns). Widths
/// of three or less have no room for an ellipsis and return as many
/// characters as fit.
///
/// Returns `Cow::Borrowed` when the string already fits.
///
/// # Examples
///
/// ```
/// use feedcheck::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut width = 0;
    let mut cut = None;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if cut.is_none() && width + w > budget {
            cut = Some(idx);
        }
        if width + w > max_width {
            let end = cut.unwrap_or(idx);
            return if max_width <= ELLIPSIS_WIDTH {
                Cow::Owned(s[..end].to_string())
            } else {
                Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
            };
        }
        width += w;
    }

    Cow::Borrowed(s)
}

/// Bytes that are never echoed to the terminal: C0 controls other than
/// tab/newline/CR, DEL and ESC.
fn is_unsafe_byte(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
}

/// Strips terminal control characters and ANSI escape sequences.
///
/// Feed titles and descriptions come from the server under test and are
/// printed verbatim in the report, so CSI (`ESC [ ... final`), OSC
/// (`ESC ] ... BEL|ESC \`), bare ESC and C0/DEL bytes are removed. Tab,
/// newline and carriage return are kept.
///
/// Returns `Cow::Borrowed` when nothing needs stripping.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().copied().any(is_unsafe_byte) {
        return Cow::Borrowed(s);
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        if b == 0x1b {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    // CSI: parameters and intermediates up to a final byte in 0x40..=0x7e
                    i += 2;
                    while i < len {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                Some(b']') => {
                    // OSC: terminated by BEL or ST
                    i += 2;
                    while i < len {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_unsafe_byte(b) {
            i += 1;
        } else {
            let start = i;
            while i < len && !is_unsafe_byte(bytes[i]) {
                i += 1;
            }
            // Only ASCII bytes end a run, so the slice sits on char boundaries.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_preview_width() {
        let description = "A fairly long description of a blog post that keeps going past fifty columns";
        let preview = truncate_to_width(description, 53);
        assert_eq!(preview.len(), 53);
        assert!(preview.starts_with("A fairly long description"));
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_fits_is_borrowed() {
        let result = truncate_to_width("Short title", 53);
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_exact_fit() {
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn test_wide_characters() {
        // Each CJK character is two columns
        assert_eq!(truncate_to_width("日本語の記事", 7), "日本...");
        assert_eq!(truncate_to_width("日本語", 6), "日本語");
    }

    #[test]
    fn test_narrow_widths_skip_ellipsis() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
        assert_eq!(truncate_to_width("日本", 1), "");
        assert_eq!(truncate_to_width("Hi", 3), "Hi");
    }

    #[test]
    fn test_min_width_with_ellipsis() {
        assert_eq!(truncate_to_width("Testing", 4), "T...");
        assert_eq!(truncate_to_width("Test", 4), "Test");
    }

    #[test]
    fn test_strip_clean_text_is_borrowed() {
        let input = "Fish & Chips\n\tdaily";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_c0_and_del() {
        assert_eq!(strip_control_chars("ti\x00tle\x07\x7f"), "title");
    }

    #[test]
    fn test_strip_csi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m title"), "Red title");
        assert_eq!(strip_control_chars("up\x1b[2Adown"), "updown");
    }

    #[test]
    fn test_strip_osc_sequences() {
        assert_eq!(strip_control_chars("\x1b]0;pwned\x07feed"), "feed");
        assert_eq!(strip_control_chars("\x1b]0;pwned\x1b\\feed"), "feed");
    }

    #[test]
    fn test_strip_bare_and_trailing_esc() {
        assert_eq!(strip_control_chars("a\x1bb"), "ab");
        assert_eq!(strip_control_chars("end\x1b"), "end");
    }

    #[test]
    fn test_strip_keeps_unicode() {
        assert_eq!(strip_control_chars("日本語 \x1b[1m記事\x1b[0m"), "日本語 記事");
    }
}
