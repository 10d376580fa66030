use std::sync::{Arc, Mutex};

use spark_config::interceptor::{self, InterceptResult, without_expansion};
use spark_config::{InterceptorContext, MapSource, ResolveError, SparkConfig, secrets};

use super::support::{config_with_defaults, source};

#[test]
fn active_profile_overrides_plain_name() {
    let config = SparkConfig::builder()
        .with_source(source("app", &[("port", "80"), ("%dev.port", "8080")]))
        .with_profile("dev")
        .build();
    assert_eq!(config.value::<u16>("port").unwrap(), 8080);

    let found = config.config_value("port").unwrap().unwrap();
    assert_eq!(found.name(), "%dev.port", "诊断信息应指向实际命中的属性名");
    assert_eq!(config.raw_value("%dev.port").as_deref(), Some("8080"));
}

#[test]
fn last_profile_wins_and_falls_back_to_plain() {
    let config = config_with_defaults(&[
        ("spark.profile", "common,dev"),
        ("%common.host", "common-host"),
        ("%dev.host", "dev-host"),
        ("%common.user", "common-user"),
        ("timeout", "5s"),
    ]);
    assert_eq!(config.profiles(), ["common", "dev"]);
    assert_eq!(config.raw_value("host").as_deref(), Some("dev-host"));
    assert_eq!(config.raw_value("user").as_deref(), Some("common-user"));
    assert_eq!(config.raw_value("timeout").as_deref(), Some("5s"));
}

#[test]
fn expressions_expand_through_the_chain() {
    let config = config_with_defaults(&[
        ("spark.profile", "prod"),
        ("host", "localhost"),
        ("%prod.host", "example.org"),
        ("url", "https://${host}:${port:443}/"),
    ]);
    assert_eq!(
        config.value::<String>("url").unwrap(),
        "https://example.org:443/",
        "引用同样享受 Profile 覆盖"
    );
}

#[test]
fn unresolved_reference_is_not_found_with_reference() {
    let config = config_with_defaults(&[("a", "${missing}")]);
    match config.value::<String>("a") {
        Err(ResolveError::NotFound { name, unresolved }) => {
            assert_eq!(name, "a");
            assert_eq!(unresolved.as_deref(), Some("missing"));
        }
        other => panic!("期望未找到错误，实际为 {other:?}"),
    }
    assert_eq!(config.optional_value::<String>("a").unwrap(), None);
    assert_eq!(config.raw_value("a"), None);
    assert_eq!(
        without_expansion(|| config.raw_value("a")).as_deref(),
        Some("${missing}")
    );
}

#[test]
fn secrets_are_hidden_until_unlocked() {
    let config = SparkConfig::builder()
        .with_source(source(
            "app",
            &[("db.password", "s3cr3t"), ("db.user", "admin"), ("dsn", "${db.user}:${db.password}")],
        ))
        .with_secret_keys(["db.password"])
        .add_default_interceptors()
        .build();

    assert_eq!(config.raw_value("db.user").as_deref(), Some("admin"));
    assert!(config.value::<String>("db.password").unwrap_err().is_not_found());
    assert_eq!(
        secrets::unlocked(|| config.value::<String>("db.password")).unwrap(),
        "s3cr3t"
    );
    assert!(secrets::is_locked());
    assert_eq!(
        secrets::unlocked(|| config.raw_value("dsn")).as_deref(),
        Some("admin:s3cr3t")
    );
}

#[test]
fn secret_references_stay_masked_while_locked() {
    let config = SparkConfig::builder()
        .with_source(source(
            "app",
            &[
                ("db.password", "s3cr3t"),
                ("%dev.db.password", "dev-s3cr3t"),
                ("leak", "${db.password}"),
            ],
        ))
        .with_secret_keys(["db.password"])
        .with_profile("dev")
        .add_default_interceptors()
        .build();

    assert!(secrets::is_locked());
    assert_eq!(config.raw_value("leak"), None);
    assert_eq!(config.raw_value("%dev.db.password"), None);
    match config.value::<String>("leak") {
        Err(ResolveError::NotFound { name, unresolved }) => {
            assert_eq!(name, "leak");
            assert_eq!(unresolved.as_deref(), Some("db.password"));
        }
        other => panic!("期望未找到错误，实际为 {other:?}"),
    }
    assert_eq!(config.optional_value::<String>("leak").unwrap(), None);
    assert_eq!(
        secrets::unlocked(|| config.raw_value("leak")).as_deref(),
        Some("dev-s3cr3t")
    );
}

#[test]
fn user_interceptors_see_pre_expansion_values() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let seen = Arc::clone(&seen);
        interceptor::from_fn(
            "recorder",
            interceptor::DEFAULT_PRIORITY,
            move |ctx: &InterceptorContext<'_>, name: &str| -> InterceptResult {
                let found = ctx.proceed(name)?;
                if let Some(value) = &found {
                    seen.lock().unwrap().push(value.value().to_owned());
                }
                Ok(found)
            },
        )
    };
    let config = SparkConfig::builder()
        .with_source(MapSource::new("app", [("greeting", "hi ${who}"), ("who", "there")]))
        .with_interceptor(recorder)
        .add_default_interceptors()
        .build();

    assert_eq!(config.raw_value("greeting").as_deref(), Some("hi there"));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.first().map(String::as_str), Some("hi ${who}"));
}

#[test]
fn discovered_interceptors_join_the_chain_in_priority_order() {
    let upper: Arc<dyn spark_config::Interceptor> = Arc::new(interceptor::from_fn(
        "upper",
        50,
        |ctx: &InterceptorContext<'_>, name: &str| {
            Ok(ctx
                .proceed(name)?
                .map(|value| {
                    let upper = value.value().to_uppercase();
                    value.with_value(upper)
                }))
        },
    ));
    let config = SparkConfig::builder()
        .with_source(source("app", &[("k", "v")]))
        .with_discovered_interceptors([upper])
        .add_discovered_interceptors()
        .build();
    assert_eq!(config.raw_value("k").as_deref(), Some("V"));

    let names: Vec<String> = config
        .interceptors()
        .stages()
        .into_iter()
        .map(|(name, _)| name.into_owned())
        .collect();
    assert_eq!(names, ["upper"]);
}
