//! Base64 tag.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use tessera_application::{ExtensionError, TagDefinition, TagRun};
use tessera_domain::ArgDefinition;

use crate::filters::string_arg;

/// `{% base64 "encode", "standard", value %}`
#[must_use]
pub fn base64_tag() -> TagDefinition {
    TagDefinition::new(
        "base64",
        TagRun::sync(|helper, raw| {
            let args = helper.resolve_arguments(raw)?;
            let action = string_arg(&args, 0).unwrap_or_else(|| "encode".to_string());
            let variant = string_arg(&args, 1).unwrap_or_else(|| "standard".to_string());
            let value = string_arg(&args, 2).unwrap_or_default();
            transform(&action, &variant, &value)
        }),
    )
    .with_display_name("Base64")
    .with_description("Encode or decode Base64 text")
    .with_arg(ArgDefinition::enumeration(
        "Action",
        &[("Encode", "encode"), ("Decode", "decode")],
    ))
    .with_arg(ArgDefinition::enumeration(
        "Variant",
        &[("Standard", "standard"), ("URL safe", "url")],
    ))
    .with_arg(ArgDefinition::string("Value").with_placeholder("My text"))
}

fn transform(action: &str, variant: &str, value: &str) -> Result<String, ExtensionError> {
    let engine = match variant {
        "standard" => &STANDARD,
        "url" => &URL_SAFE_NO_PAD,
        other => return Err(ExtensionError::new(format!("unsupported Base64 variant: {other}"))),
    };
    match action {
        "encode" => Ok(engine.encode(value.as_bytes())),
        "decode" => {
            let bytes = engine
                .decode(value.trim())
                .map_err(|e| ExtensionError::new(format!("invalid Base64 input: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|_| ExtensionError::new("decoded Base64 is not valid UTF-8"))
        }
        other => Err(ExtensionError::new(format!("unsupported Base64 action: {other}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_and_url_variants() {
        assert_eq!(transform("encode", "standard", "hi?>").unwrap(), "aGk/Pg==");
        assert_eq!(transform("encode", "url", "hi?>").unwrap(), "aGk_Pg");
        assert_eq!(transform("decode", "standard", "aGk/Pg==").unwrap(), "hi?>");
    }

    #[test]
    fn test_decode_errors() {
        assert!(transform("decode", "standard", "***").is_err());
        assert!(transform("decode", "standard", "/w==").is_err());
        assert!(transform("shout", "standard", "x").is_err());
        assert!(transform("encode", "base32", "x").is_err());
    }
}
