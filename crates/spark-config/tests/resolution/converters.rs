use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use spark_config::converter::{
    Converter, Idiom, Implicit, ImplicitDescriptor, ImplicitIdioms, from_fn,
};
use spark_config::{ConversionError, ResolveError, RestoreError, SparkConfig};
use tracing_test::traced_test;

use super::support::source;

/// 同时具备 `of` 与 `parse` 两种习惯的类型，用于验证探测顺序。
#[derive(Debug, PartialEq)]
struct Region(String);

#[derive(Debug)]
struct EmptyRegion;

impl fmt::Display for EmptyRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("region must not be blank")
    }
}

impl std::error::Error for EmptyRegion {}

impl FromStr for Region {
    type Err = EmptyRegion;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Region(format!("parsed:{raw}")))
    }
}

impl Implicit for Region {
    fn idioms() -> ImplicitIdioms<Self> {
        ImplicitIdioms::via_from_str().with_of(|raw: &str| {
            if raw == "-" {
                Err(EmptyRegion)
            } else {
                Ok(Region(format!("of:{raw}")))
            }
        })
    }
}

/// 只能由 `String` 构造的类型。
#[derive(Debug, PartialEq)]
struct Tenant(String);

impl From<String> for Tenant {
    fn from(raw: String) -> Self {
        Tenant(raw)
    }
}

fn config() -> SparkConfig {
    SparkConfig::builder()
        .with_source(source(
            "app",
            &[("region", " eu-west "), ("bad-region", "-"), ("tenant", "acme")],
        ))
        .with_implicit::<Region>()
        .with_idioms(ImplicitIdioms::<Tenant>::via_from_string())
        .build()
}

#[test]
fn implicit_probe_prefers_of_over_parse() {
    let config = config();
    assert_eq!(
        config.value::<Region>("region").unwrap(),
        Region("of:eu-west".to_owned()),
        "输入应先裁剪空白，并优先使用 of 习惯"
    );
    let converter = config.converters().implicit::<Region>().unwrap();
    assert_eq!(converter.idiom(), Idiom::Of);
}

#[test]
fn implicit_errors_keep_their_cause() {
    match config().value::<Region>("bad-region") {
        Err(ResolveError::Conversion { source, .. }) => {
            assert_eq!(source.detail(), "region must not be blank");
            assert!(std::error::Error::source(&source).is_some());
        }
        other => panic!("期望转换错误，实际为 {other:?}"),
    }
}

#[test]
fn implicit_converter_is_memoized() {
    let config = config();
    let first = config.converters().implicit::<Region>().unwrap();
    let second = config.converters().implicit::<Region>().unwrap();
    assert!(Arc::ptr_eq(&first, &second), "同一类型应得到同一实例");
    assert_eq!(config.value::<Tenant>("tenant").unwrap(), Tenant("acme".to_owned()));
}

#[test]
fn concurrent_discovery_converges_on_one_instance() {
    let config = Arc::new(config());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let config = Arc::clone(&config);
            std::thread::spawn(move || config.converters().implicit::<Tenant>().unwrap())
        })
        .collect();
    let converters: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("线程不应恐慌"))
        .collect();
    for converter in &converters[1..] {
        assert!(Arc::ptr_eq(&converters[0], converter));
    }
}

#[test]
fn descriptor_restores_equivalent_converter() {
    let config = config();
    let discovered = config.converters().implicit::<Region>().unwrap();
    let json = serde_json::to_string(&discovered.descriptor()).unwrap();
    assert!(json.contains("\"idiom\":\"of\""), "实际序列化结果：{json}");

    let descriptor: ImplicitDescriptor = serde_json::from_str(&json).unwrap();
    let restored = config.converters().restore::<Region>(&descriptor).unwrap();
    for input in ["eu", "  ap  "] {
        assert_eq!(
            restored.convert(input).unwrap(),
            discovered.convert(input).unwrap()
        );
    }
}

#[test]
fn restore_rejects_mismatched_descriptors() {
    let config = config();
    let descriptor = config.converters().implicit::<Region>().unwrap().descriptor();
    assert!(matches!(
        config.converters().restore::<Tenant>(&descriptor),
        Err(RestoreError::TypeMismatch { .. })
    ));

    let missing = ImplicitDescriptor {
        idiom: Idiom::ValueOfStr,
        ..descriptor
    };
    assert!(matches!(
        config.converters().restore::<Region>(&missing),
        Err(RestoreError::MissingIdiom { .. })
    ));
}

#[test]
fn explicit_registration_outranks_implicit_and_builtin() {
    let config = SparkConfig::builder()
        .with_source(source("app", &[("region", "eu"), ("port", "80")]))
        .with_implicit::<Region>()
        .with_converter(from_fn("explicit-region", |raw: &str| {
            Ok(Some(Region(format!("explicit:{raw}"))))
        }))
        .with_converter(from_fn("doubled-port", |raw: &str| {
            raw.parse::<u16>()
                .map(|port| Some(port * 2))
                .map_err(|error| ConversionError::caused_by("doubled-port", raw, error))
        }))
        .build();
    assert_eq!(
        config.value::<Region>("region").unwrap(),
        Region("explicit:eu".to_owned())
    );
    assert_eq!(config.value::<u16>("port").unwrap(), 160);
}

#[test]
fn prioritized_composite_falls_through_none() {
    let config = SparkConfig::builder()
        .with_source(source("app", &[("level", "verbose"), ("other", "3")]))
        .with_converter_priority(
            from_fn("named-levels", |raw: &str| {
                Ok(match raw {
                    "verbose" => Some(5_u8),
                    _ => None,
                })
            }),
            200,
        )
        .build();
    assert_eq!(config.value::<u8>("level").unwrap(), 5);
    assert_eq!(
        config.value::<u8>("other").unwrap(),
        3,
        "高优先级返回 None 时回落到内置转换器"
    );
    assert!(config.converters().has_explicit::<u8>());
}

#[test]
#[traced_test]
fn implicit_discovery_is_logged() {
    let config = config();
    config.value::<Tenant>("tenant").unwrap();
    assert!(logs_contain("implicit converter discovered"));
    assert!(logs_contain("constructor"));
}
