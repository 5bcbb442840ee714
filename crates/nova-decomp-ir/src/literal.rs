//! Literal spelling of floating-point constants and character data.

use std::collections::{HashMap, HashSet};
use std::f64::consts::{E, PI};

use once_cell::sync::Lazy;

struct UninlinedValues {
    doubles: HashMap<u64, String>,
    floats: HashMap<u32, String>,
    no_paren_doubles: HashSet<u64>,
    no_paren_floats: HashSet<u32>,
}

static UNINLINED: Lazy<UninlinedValues> = Lazy::new(UninlinedValues::build);

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl UninlinedValues {
    fn build() -> Self {
        // Insertion order matters: later entries replace earlier ones with the same key.
        let mut doubles: Vec<(f64, String)> = Vec::new();
        let mut floats: Vec<(f32, String)> = Vec::new();

        doubles.push((E, "Math.E".into()));
        doubles.push((-E, "-Math.E".into()));
        doubles.push((PI, "Math.PI".into()));
        doubles.push((-PI, "-Math.PI".into()));

        for i in 2..=20u32 {
            let n = f64::from(i);
            doubles.push((PI / n, format!("Math.PI / {i}")));
            doubles.push((-PI / n, format!("-Math.PI / {i}")));
            doubles.push((PI * n, format!("Math.PI * {i}")));
            doubles.push((-PI * n, format!("-Math.PI * {i}")));
        }

        for num in 2..13u32 {
            for den in 2..13u32 {
                if gcd(num, den) != 1 {
                    continue;
                }
                let value = PI * (f64::from(num) / f64::from(den));
                doubles.push((value, format!("Math.PI * {num}.0 / {den}.0")));
                doubles.push((-value, format!("-Math.PI * {num}.0 / {den}.0")));

                let single = (PI as f32) * (num as f32 / den as f32);
                if (PI as f32) * (num as f32) / (den as f32) != value as f32 {
                    floats.push((single, format!("(float) Math.PI * {num}.0F / {den}.0F")));
                    floats.push((-single, format!("(float) -Math.PI * {num}.0F / {den}.0F")));
                }
            }
        }

        doubles.push((180.0 / PI, "180.0 / Math.PI".into()));
        doubles.push((-180.0 / PI, "-180.0 / Math.PI".into()));
        floats.push(((180.0 / PI) as f32, "180.0F / Math.PI".into()));
        floats.push((-((180.0 / PI) as f32), "-180.0F / Math.PI".into()));
        floats.push((180.0f32 / PI as f32, "180.0F / (float)Math.PI".into()));
        floats.push((-(180.0f32 / PI as f32), "-180.0F / (float)Math.PI".into()));

        doubles.push((PI / 180.0, "Math.PI / 180.0".into()));
        doubles.push((-PI / 180.0, "-Math.PI / 180.0".into()));
        floats.push(((PI / 180.0) as f32, "(float) Math.PI / 180.0".into()));
        floats.push((-((PI / 180.0) as f32), "(float) -Math.PI / 180.0".into()));

        for (value, text) in &doubles {
            let text = if text.contains(' ') {
                format!("(float) ({text})")
            } else {
                format!("(float) {text}")
            };
            floats.push((*value as f32, text));
        }

        for (value, name) in [
            (f64::INFINITY, "POSITIVE_INFINITY"),
            (f64::NEG_INFINITY, "NEGATIVE_INFINITY"),
            (f64::MAX, "MAX_VALUE"),
            (f64::MIN_POSITIVE, "MIN_NORMAL"),
            (f64::from_bits(1), "MIN_VALUE"),
        ] {
            doubles.push((value, format!("Double.{name}")));
        }
        for (value, name) in [
            (f64::MAX, "MAX_VALUE"),
            (f64::MIN_POSITIVE, "MIN_NORMAL"),
            (f64::from_bits(1), "MIN_VALUE"),
        ] {
            doubles.push((-value, format!("-Double.{name}")));
        }
        for (value, name) in [
            (f32::INFINITY, "POSITIVE_INFINITY"),
            (f32::NEG_INFINITY, "NEGATIVE_INFINITY"),
            (f32::MAX, "MAX_VALUE"),
            (f32::MIN_POSITIVE, "MIN_NORMAL"),
            (f32::from_bits(1), "MIN_VALUE"),
        ] {
            floats.push((value, format!("Float.{name}")));
        }
        for (value, name) in [
            (f32::MAX, "MAX_VALUE"),
            (f32::MIN_POSITIVE, "MIN_NORMAL"),
            (f32::from_bits(1), "MIN_VALUE"),
        ] {
            floats.push((-value, format!("-Float.{name}")));
        }

        let no_paren = [E, -E, PI, -PI];
        Self {
            doubles: doubles.into_iter().map(|(v, t)| (v.to_bits(), t)).collect(),
            floats: floats.into_iter().map(|(v, t)| (v.to_bits(), t)).collect(),
            no_paren_doubles: no_paren.iter().map(|v| v.to_bits()).collect(),
            no_paren_floats: no_paren.iter().map(|v| (*v as f32).to_bits()).collect(),
        }
    }
}

pub(crate) fn uninlined_double(value: f64) -> Option<&'static str> {
    UNINLINED.doubles.get(&value.to_bits()).map(String::as_str)
}

pub(crate) fn uninlined_float(value: f32) -> Option<&'static str> {
    UNINLINED.floats.get(&value.to_bits()).map(String::as_str)
}

pub(crate) fn is_no_paren_double(value: f64) -> bool {
    UNINLINED.no_paren_doubles.contains(&value.to_bits())
}

pub(crate) fn is_no_paren_float(value: f32) -> bool {
    UNINLINED.no_paren_floats.contains(&value.to_bits())
}

/// Shortest decimal text that parses back to `value`, spelled the way `Double.toString`
/// spells it: plain notation for magnitudes in `[1e-3, 1e7)`, `d.dddE<exp>` otherwise, and
/// always at least one fractional digit.
pub fn double_text(value: f64) -> String {
    java_notation(&format!("{value:e}"))
}

/// [`double_text`] for `float` values; the caller appends the `F` suffix.
pub fn float_text(value: f32) -> String {
    java_notation(&format!("{value:e}"))
}

fn java_notation(scientific: &str) -> String {
    let (mantissa, exp) = scientific.split_once('e').unwrap_or((scientific, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (negative, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let mut out = String::new();
    if negative {
        out.push('-');
    }

    if (-3..7).contains(&exp) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                out.push_str(&digits);
                out.extend(std::iter::repeat('0').take(int_len - digits.len()));
                out.push_str(".0");
            } else {
                out.push_str(&digits[..int_len]);
                out.push('.');
                out.push_str(&digits[int_len..]);
            }
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat('0').take((-exp - 1) as usize));
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        out.push('.');
        if digits.len() > 1 {
            out.push_str(&digits[1..]);
        } else {
            out.push('0');
        }
        out.push('E');
        out.push_str(&exp.to_string());
    }
    out
}

fn is_printable(ch: char, ascii_only: bool) -> bool {
    if (' '..='~').contains(&ch) {
        return true;
    }
    if ascii_only || !ch.is_ascii() && ch.is_control() {
        return false;
    }
    !ch.is_ascii()
        && !ch.is_whitespace()
        && !matches!(ch as u32, 0xFFF0..=0xFFFF | 0x2028 | 0x2029 | 0xE000..=0xF8FF)
}

fn push_unicode_escapes(out: &mut String, ch: char) {
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        out.push_str(&format!("\\u{unit:04x}"));
    }
}

/// A `char` literal with its quotes. `code` is the UTF-16 code unit.
pub(crate) fn char_literal(code: u32, ascii_only: bool) -> String {
    let mut out = String::from("'");
    match code {
        0x08 => out.push_str("\\b"),
        0x09 => out.push_str("\\t"),
        0x0A => out.push_str("\\n"),
        0x0C => out.push_str("\\f"),
        0x0D => out.push_str("\\r"),
        0x27 => out.push_str("\\'"),
        0x5C => out.push_str("\\\\"),
        _ => match char::from_u32(code) {
            Some(ch) if is_printable(ch, ascii_only) => out.push(ch),
            _ => out.push_str(&format!("\\u{code:04x}")),
        },
    }
    out.push('\'');
    out
}

/// A string literal with its quotes.
pub(crate) fn string_literal(value: &str, ascii_only: bool) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            ch if is_printable(ch, ascii_only) => out.push(ch),
            ch => push_unicode_escapes(&mut out, ch),
        }
    }
    out.push('"');
    out
}

/// Whether a char literal for `code` needs no `\u` escape.
pub(crate) fn is_char_literal_friendly(code: u32) -> bool {
    (0x20..0x7F).contains(&code) || matches!(code, 0x08 | 0x09 | 0x0A | 0x0C | 0x0D)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn doubles_use_java_notation() {
        assert_eq!(double_text(0.0), "0.0");
        assert_eq!(double_text(-0.0), "-0.0");
        assert_eq!(double_text(1.0), "1.0");
        assert_eq!(double_text(100.5), "100.5");
        assert_eq!(double_text(0.001), "0.001");
        assert_eq!(double_text(0.0001), "1.0E-4");
        assert_eq!(double_text(1.0e7), "1.0E7");
        assert_eq!(double_text(1234567.0), "1234567.0");
        assert_eq!(double_text(0.1), "0.1");
        assert_eq!(float_text(0.1), "0.1");
        assert_eq!(float_text(3.4028235e38), "3.4028235E38");
    }

    #[test]
    fn symbolic_tables() {
        assert_eq!(uninlined_double(PI / 2.0), Some("Math.PI / 2"));
        assert_eq!(uninlined_double(-E), Some("-Math.E"));
        assert_eq!(uninlined_double(f64::MAX), Some("Double.MAX_VALUE"));
        assert_eq!(uninlined_float(PI as f32), Some("(float) Math.PI"));
        assert_eq!(uninlined_float(f32::NEG_INFINITY), Some("Float.NEGATIVE_INFINITY"));
        assert!(is_no_paren_double(PI));
        assert!(uninlined_double(1.5).is_none());
    }

    #[test]
    fn character_escapes() {
        assert_eq!(char_literal('\n' as u32, false), "'\\n'");
        assert_eq!(char_literal('\'' as u32, false), "'\\''");
        assert_eq!(char_literal(0x7F, false), "'\\u007f'");
        assert_eq!(char_literal('é' as u32, false), "'é'");
        assert_eq!(char_literal('é' as u32, true), "'\\u00e9'");
        assert_eq!(string_literal("a\"b\\c\u{1}", false), "\"a\\\"b\\\\c\\u0001\"");
    }
}
