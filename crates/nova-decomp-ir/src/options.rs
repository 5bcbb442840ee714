use nova_decomp_text::TextConfig;
use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Rendering switches for one decompilation run.
///
/// Loaded from the `[decompiler]`-style TOML table the embedding tool keeps; every field has a
/// default so partial tables are fine, but unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecompilerOptions {
    /// Render NaN and infinities as divisions and skip the symbolic constant tables.
    pub literals_as_is: bool,
    /// Escape every non-ASCII character in char and string literals.
    pub ascii_strings: bool,
    /// Treat int constants `0` and `1` in boolean-permitted positions as booleans.
    pub boolean_true_one: bool,
    pub indent_string: String,
    pub new_line_separator: String,
    pub preferred_line_length: usize,
    /// Render `Type.<A>method()` whenever the method's type arguments are fully inferred.
    pub explicit_generic_arguments: bool,
    /// Render `/* $VF: ... */` marker comments.
    pub decompiler_comments: bool,
}

impl Default for DecompilerOptions {
    fn default() -> Self {
        Self {
            literals_as_is: false,
            ascii_strings: false,
            boolean_true_one: true,
            indent_string: "    ".to_string(),
            new_line_separator: "\n".to_string(),
            preferred_line_length: 160,
            explicit_generic_arguments: false,
            decompiler_comments: true,
        }
    }
}

impl DecompilerOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn text_config(&self) -> TextConfig {
        TextConfig {
            indent: self.indent_string.clone(),
            line_separator: self.new_line_separator.clone(),
            preferred_line_length: self.preferred_line_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_tables_keep_defaults() {
        let options = DecompilerOptions::from_toml_str(
            r#"
            literals_as_is = true
            indent_string = "\t"
            "#,
        )
        .unwrap();
        assert!(options.literals_as_is);
        assert_eq!(options.indent_string, "\t");
        assert!(options.boolean_true_one);
        assert_eq!(options.preferred_line_length, 160);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = DecompilerOptions::from_toml_str("lambda_to_anonymous_class = true").unwrap_err();
        assert!(err.to_string().contains("lambda_to_anonymous_class"), "{err}");
    }
}
