//! Purpose: Decode operand text and manifest documents.
//! Exports: `from_str`, `operand_from_text`.
//! Role: Parser boundary; error mapping is done by callsites so domain context stays explicit.
//! Invariants: Operand text that is not JSON decodes to a string, never to a number.
//! Invariants: A number literal beyond the finite f64 range is an error, not a string.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

/// Shell arguments like `x` or `hello world` are not JSON; they are kept as strings
/// so the combinator can reject them by type instead of by parse failure.
pub fn operand_from_text(input: &str) -> Result<Value, Error> {
    match from_str::<Value>(input.trim()) {
        Ok(value) => Ok(value),
        Err(err) if is_out_of_range(&err) => Err(Error::new(ErrorKind::InvalidArgument)
            .with_message(format!("number {} is outside the finite range", input.trim()))
            .with_hint("Operands must fit in a 64-bit float (about ±1.8e308).")
            .with_source(err)),
        Err(_) => Ok(Value::String(input.to_string())),
    }
}

// serde_json exposes no error code; its range error is a syntax error with a fixed message.
fn is_out_of_range(err: &serde_json::Error) -> bool {
    err.is_syntax() && err.to_string().starts_with("number out of range")
}

#[cfg(test)]
mod tests {
    use super::operand_from_text;
    use crate::core::error::ErrorKind;
    use serde_json::{Value, json};

    #[test]
    fn json_numbers_decode_as_numbers() {
        assert_eq!(operand_from_text("1").unwrap(), json!(1));
        assert_eq!(operand_from_text(" -2.5 ").unwrap(), json!(-2.5));
        assert_eq!(operand_from_text("1e3").unwrap(), json!(1000.0));
    }

    #[test]
    fn bare_words_stay_strings() {
        assert_eq!(operand_from_text("x").unwrap(), Value::String("x".to_string()));
        assert_eq!(operand_from_text("0x10").unwrap(), Value::String("0x10".to_string()));
        assert_eq!(operand_from_text("NaN").unwrap(), Value::String("NaN".to_string()));
    }

    #[test]
    fn quoted_numbers_stay_strings() {
        assert_eq!(operand_from_text("\"2\"").unwrap(), json!("2"));
    }

    #[test]
    fn out_of_range_literal_is_rejected() {
        for text in ["1e400", "-1e400"] {
            let err = operand_from_text(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert!(
                err.message().unwrap().contains("outside the finite range"),
                "{text}"
            );
        }
    }
}
