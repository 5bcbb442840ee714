use nova_decomp_ir::{double_text, float_text, to_source_text, ConstExprent, DecompileContext, Exprent};
use nova_decomp_types::ClassStore;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Significant digits of a decimal spelling, without sign, point, exponent or padding zeros.
fn significant_digits(text: &str) -> String {
    let mantissa = text.split(['E', 'e']).next().unwrap_or(text);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_start_matches('0').trim_end_matches('0');
    if digits.is_empty() {
        "0".to_string()
    } else {
        digits.to_string()
    }
}

#[test]
fn spelling_follows_java_notation() {
    assert_eq!(double_text(1.0), "1.0");
    assert_eq!(double_text(0.001), "0.001");
    assert_eq!(double_text(1.0e7), "1.0E7");
    assert_eq!(double_text(1.5e-4), "1.5E-4");
    assert_eq!(float_text(0.1), "0.1");
}

#[test]
fn shortest_spellings_of_known_values() {
    let doubles = [
        (0.1, "0.1"),
        (1.0 / 3.0, "0.3333333333333333"),
        (0.1 + 0.2, "0.30000000000000004"),
        (100.0, "100.0"),
        (9_999_999.0, "9999999.0"),
        (1.0e-5, "1.0E-5"),
        (123_456_789.0, "1.23456789E8"),
        (f64::MAX, "1.7976931348623157E308"),
        (-0.0, "-0.0"),
    ];
    for (value, expected) in doubles {
        assert_eq!(double_text(value), expected);
    }
    let floats = [
        (1.0f32 / 3.0, "0.33333334"),
        (16_777_216.0f32, "1.6777216E7"),
        (f32::MAX, "3.4028235E38"),
    ];
    for (value, expected) in floats {
        assert_eq!(float_text(value), expected);
    }
}

fn render_double(value: f64) -> String {
    let store = ClassStore::new();
    let ctx = DecompileContext::new(&store, "app/Main");
    to_source_text(&Exprent::new(ConstExprent::double(value)), &ctx, 0)
        .expect("renders")
        .into_string()
}

fn is_symbolic(text: &str) -> bool {
    text.contains("Math") || text.contains("Float") || text.contains("Double") || text.contains('/')
}

proptest! {
    #[test]
    fn doubles_round_trip(bits in any::<u64>()) {
        let value = f64::from_bits(bits);
        prop_assume!(value.is_finite());
        let text = double_text(value);
        let parsed: f64 = text.parse().expect("rendered double parses");
        prop_assert_eq!(parsed.to_bits(), value.to_bits(), "{}", text);
    }

    #[test]
    fn floats_round_trip(bits in any::<u32>()) {
        let value = f32::from_bits(bits);
        prop_assume!(value.is_finite());
        let text = float_text(value);
        let parsed: f32 = text.parse().expect("rendered float parses");
        prop_assert_eq!(parsed.to_bits(), value.to_bits(), "{}", text);
    }

    #[test]
    fn no_spelling_with_fewer_digits_round_trips(bits in any::<u64>()) {
        let value = f64::from_bits(bits);
        prop_assume!(value.is_finite() && value != 0.0);
        let digits = significant_digits(&double_text(value)).len();
        prop_assume!(digits > 1);
        let shorter = format!("{:.*e}", digits - 2, value);
        let parsed: f64 = shorter.parse().expect("scientific text parses");
        prop_assert_ne!(parsed.to_bits(), value.to_bits(), "{} also round-trips", shorter);
    }

    #[test]
    fn float_spelling_is_used_only_when_exact_and_shorter(single in any::<f32>()) {
        prop_assume!(single.is_finite());
        let value = f64::from(single);
        let text = render_double(value);
        prop_assume!(!is_symbolic(&text));
        match text.strip_suffix('F') {
            Some(short) => {
                let parsed: f32 = short.parse().expect("float spelling parses");
                prop_assert_eq!(f64::from(parsed).to_bits(), value.to_bits());
                prop_assert!(short.len() < double_text(value).len(), "{}", text);
            }
            None => {
                prop_assert_eq!(text, double_text(value));
            }
        }
    }

    #[test]
    fn doubles_without_a_float_twin_keep_double_spelling(bits in any::<u64>()) {
        let value = f64::from_bits(bits);
        prop_assume!(value.is_finite() && f64::from(value as f32) != value);
        let text = render_double(value);
        prop_assume!(!is_symbolic(&text));
        prop_assert_eq!(text, double_text(value));
    }
}
