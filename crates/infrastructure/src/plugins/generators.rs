//! Tags that generate fresh values on every render.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::Value;
use tessera_application::{ExtensionError, TagDefinition, TagRun};
use tessera_domain::ArgDefinition;
use uuid::Uuid;

use crate::filters::string_arg;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// `{% uuid "v4" %}`
#[must_use]
pub fn uuid_tag() -> TagDefinition {
    TagDefinition::new(
        "uuid",
        TagRun::sync(|helper, raw| {
            let args = helper.resolve_arguments(raw)?;
            match string_arg(&args, 0).as_deref().unwrap_or("v4") {
                "v4" | "4" => Ok(Uuid::new_v4().to_string()),
                "v7" | "7" => Ok(Uuid::now_v7().to_string()),
                other => Err(ExtensionError::new(format!("unsupported UUID version: {other}"))),
            }
        }),
    )
    .with_display_name("UUID")
    .with_description("Generate a UUID")
    .with_arg(ArgDefinition::enumeration(
        "Version",
        &[("Version 4 (random)", "v4"), ("Version 7 (time ordered)", "v7")],
    ))
    .with_action("Regenerate", Some("refresh"))
}

/// `{% now "iso-8601" %}`
#[must_use]
pub fn now_tag() -> TagDefinition {
    TagDefinition::new(
        "now",
        TagRun::sync(|helper, raw| {
            let args = helper.resolve_arguments(raw)?;
            let kind = string_arg(&args, 0).unwrap_or_else(|| "iso-8601".to_string());
            format_time(Utc::now(), &kind, string_arg(&args, 1).as_deref())
        }),
    )
    .with_display_name("Timestamp")
    .with_description("The current date and time")
    .with_arg(ArgDefinition::enumeration(
        "Format",
        &[
            ("ISO-8601", "iso-8601"),
            ("Milliseconds", "millis"),
            ("Unix", "unix"),
            ("Custom format", "custom"),
        ],
    ))
    .with_arg(
        ArgDefinition::string("Custom format")
            .with_placeholder("%Y-%m-%d %H:%M:%S")
            .with_hide(|values| values.first().and_then(Value::as_str) != Some("custom")),
    )
}

fn format_time(now: DateTime<Utc>, kind: &str, custom: Option<&str>) -> Result<String, ExtensionError> {
    match kind {
        "iso-8601" => Ok(now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        "millis" | "ms" => Ok(now.timestamp_millis().to_string()),
        "unix" | "seconds" | "s" => Ok(now.timestamp().to_string()),
        "custom" => {
            let pattern = custom.unwrap_or_default();
            let mut out = String::new();
            write!(out, "{}", now.format(pattern))
                .map_err(|_| ExtensionError::new(format!("invalid date format: {pattern}")))?;
            Ok(out)
        }
        other => Err(ExtensionError::new(format!("unsupported time format: {other}"))),
    }
}

/// `{% random "int", 1, 6 %}`
#[must_use]
pub fn random_tag() -> TagDefinition {
    TagDefinition::new(
        "random",
        TagRun::sync(|helper, raw| {
            let args = helper.resolve_arguments(raw)?;
            match string_arg(&args, 0).as_deref().unwrap_or("int") {
                "int" => {
                    let min = int_arg(&args, 1, 0)?;
                    let max = int_arg(&args, 2, 1000)?;
                    if min > max {
                        return Err(ExtensionError::new(format!(
                            "empty range: {min} is greater than {max}"
                        )));
                    }
                    Ok(rand::rng().random_range(min..=max).to_string())
                }
                "string" => {
                    let length = usize::try_from(int_arg(&args, 1, 16)?)
                        .map_err(|_| ExtensionError::new("length must not be negative"))?;
                    Ok(random_alphanumeric(length))
                }
                "bool" | "boolean" => Ok(rand::rng().random_bool(0.5).to_string()),
                other => Err(ExtensionError::new(format!("unsupported random kind: {other}"))),
            }
        }),
    )
    .with_display_name("Random")
    .with_description("A random integer, string or boolean")
    .with_arg(ArgDefinition::enumeration(
        "Kind",
        &[("Integer", "int"), ("Alphanumeric string", "string"), ("Boolean", "bool")],
    ))
    .with_arg(ArgDefinition::number("Minimum or length"))
    .with_arg(
        ArgDefinition::number("Maximum")
            .with_default(1000)
            .with_hide(|values| values.first().and_then(Value::as_str) != Some("int")),
    )
    .with_action("Regenerate", Some("refresh"))
}

fn int_arg(args: &[Value], index: usize, default: i64) -> Result<i64, ExtensionError> {
    let Some(value) = args.get(index).filter(|v| !v.is_null()) else {
        return Ok(default);
    };
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ExtensionError::new(format!("expected an integer, got {value}")))
}

fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(CHARSET[rng.random_range(0..CHARSET.len())]))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tessera_application::HelperContext;

    fn run(tag: &TagDefinition, raw: &str) -> Result<String, ExtensionError> {
        let TagRun::Sync(f) = &tag.run else {
            panic!("expected a sync tag");
        };
        f(&HelperContext::detached(), raw)
    }

    #[test]
    fn test_uuid_versions() {
        let v4 = Uuid::parse_str(&run(&uuid_tag(), "").unwrap()).unwrap();
        assert_eq!(v4.get_version_num(), 4);
        let v7 = Uuid::parse_str(&run(&uuid_tag(), "'v7'").unwrap()).unwrap();
        assert_eq!(v7.get_version_num(), 7);
        assert!(run(&uuid_tag(), "'v9'").is_err());
    }

    #[test]
    fn test_time_formats() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_time(at, "iso-8601", None).unwrap(), "2024-03-01T12:30:00.000Z");
        assert_eq!(format_time(at, "unix", None).unwrap(), "1709296200");
        assert_eq!(format_time(at, "millis", None).unwrap(), "1709296200000");
        assert_eq!(format_time(at, "custom", Some("%d/%m/%Y")).unwrap(), "01/03/2024");
        assert!(format_time(at, "custom", Some("%Q")).is_err());
        assert!(format_time(at, "fortnight", None).is_err());
    }

    #[test]
    fn test_random_int_stays_in_range() {
        for _ in 0..50 {
            let n: i64 = run(&random_tag(), "'int', 3, 5").unwrap().parse().unwrap();
            assert!((3..=5).contains(&n));
        }
        assert!(run(&random_tag(), "'int', 5, 3").is_err());
    }

    #[test]
    fn test_random_string_and_bool() {
        let s = run(&random_tag(), "'string', 12").unwrap();
        assert_eq!(s.len(), 12);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(["true", "false"].contains(&run(&random_tag(), "'bool'").unwrap().as_str()));
    }

    #[test]
    fn test_int_arg_accepts_numeric_text() {
        assert_eq!(int_arg(&[json!("7")], 0, 1).unwrap(), 7);
        assert_eq!(int_arg(&[], 0, 1).unwrap(), 1);
        assert!(int_arg(&[json!("x")], 0, 1).is_err());
    }
}
