use std::time::Duration;

use spark_config::converter::{BoolConverter, Converter, from_fn};
use spark_config::{ConversionError, ResolveError, SparkConfig};

use super::support::source;

fn config() -> SparkConfig {
    SparkConfig::builder()
        .with_source(source(
            "app",
            &[
                ("port", "8080"),
                ("enabled", "YES"),
                ("timeout", "250ms"),
                ("blank", ""),
                ("garbage", "abc"),
            ],
        ))
        .build()
}

#[test]
fn required_missing_is_not_found() {
    let error = config().value::<u32>("missing").unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(error.property_name(), Some("missing"));
    assert_eq!(error.to_string(), "property `missing` not found");
}

#[test]
fn optional_missing_is_none() {
    assert_eq!(config().optional_value::<u32>("missing").unwrap(), None);
}

#[test]
fn conversion_errors_surface_for_required_and_optional() {
    let config = config();
    for error in [
        config.value::<u32>("garbage").unwrap_err(),
        config.optional_value::<u32>("garbage").unwrap_err(),
    ] {
        match error {
            ResolveError::Conversion { name, raw, source } => {
                assert_eq!(name, "garbage");
                assert_eq!(raw, "abc");
                assert_eq!(source.input(), "abc");
            }
            other => panic!("期望转换错误，实际为 {other:?}"),
        }
    }
}

#[test]
fn builtin_types_convert() {
    let config = config();
    assert_eq!(config.value::<u16>("port").unwrap(), 8080);
    assert!(config.value::<bool>("enabled").unwrap());
    assert_eq!(
        config.value::<Duration>("timeout").unwrap(),
        Duration::from_millis(250)
    );
}

#[test]
fn empty_value_counts_as_missing() {
    let config = config();
    assert!(config.value::<String>("blank").unwrap_err().is_not_found());
    assert_eq!(config.optional_value::<u16>("blank").unwrap(), None);
}

#[test]
fn missing_uses_converter_default_for_empty_string() {
    let config = config();
    let defaulted = from_fn("defaulted-port", |raw: &str| {
        if raw.is_empty() {
            Ok(Some(80_u16))
        } else {
            raw.parse()
                .map(Some)
                .map_err(|error| ConversionError::caused_by("defaulted-port", raw, error))
        }
    });
    assert_eq!(config.value_with("missing", &defaulted).unwrap(), 80);
    assert_eq!(config.value_with("port", &defaulted).unwrap(), 8080);
}

#[test]
fn empty_string_error_never_masks_missing() {
    let strict = from_fn("strict", |raw: &str| -> Result<Option<u8>, ConversionError> {
        Err(ConversionError::new("strict", raw, "always fails"))
    });
    let error = config().value_with("missing", &strict).unwrap_err();
    assert!(error.is_not_found(), "空串转换失败时仍应报告未找到");
}

#[test]
fn unknown_type_reports_missing_converter() {
    struct Opaque;
    match config().value::<Opaque>("port") {
        Err(ResolveError::NoConverter { type_name }) => assert!(type_name.ends_with("Opaque")),
        Err(other) => panic!("期望缺少转换器，实际为 {other:?}"),
        Ok(_) => panic!("不应得到值"),
    }
}

#[test]
fn one_shot_conversion_round_trips_numbers_and_bools() {
    let config = config();
    for number in [i64::MIN, -1, 0, 42, i64::MAX] {
        let text = number.to_string();
        assert_eq!(config.convert::<i64>(Some(&text)).unwrap(), Some(number));
    }
    for flag in [true, false] {
        let text = flag.to_string();
        assert_eq!(config.convert::<bool>(Some(&text)).unwrap(), Some(flag));
        assert_eq!(BoolConverter.convert(&text).unwrap(), Some(flag));
    }
    assert_eq!(config.convert::<f64>(Some("2.5")).unwrap(), Some(2.5));
    assert_eq!(config.convert::<u8>(None).unwrap(), None);

    match config.convert::<u8>(Some("300")) {
        Err(ResolveError::Conversion { name, raw, .. }) => {
            assert!(name.is_empty(), "一次性转换没有属性名");
            assert_eq!(raw, "300");
        }
        other => panic!("期望转换错误，实际为 {other:?}"),
    }
}

#[test]
fn raw_value_equals_compares_raw_text() {
    let config = config();
    assert!(config.raw_value_equals("enabled", Some("YES")));
    assert!(!config.raw_value_equals("enabled", Some("yes")));
    assert!(config.raw_value_equals("missing", None));
}
