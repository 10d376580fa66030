use std::sync::Arc;

use spark_config::{PropertySource, SparkConfig};

use super::support::{ranked, source};

#[test]
fn higher_ordinal_wins() {
    let config = SparkConfig::builder()
        .with_shared_source(ranked("defaults", 100, &[("x", "1")]))
        .with_shared_source(ranked("overrides", 200, &[("x", "2")]))
        .build();
    assert_eq!(config.raw_value("x").as_deref(), Some("2"));

    let found = config.config_value("x").unwrap().unwrap();
    assert_eq!(found.source_name(), "overrides");
    assert_eq!(found.source_ordinal(), 200);
}

#[test]
fn equal_ordinals_prefer_later_sorting_name() {
    let config = SparkConfig::builder()
        .with_shared_source(ranked("alpha", 100, &[("x", "alpha")]))
        .with_shared_source(ranked("beta", 100, &[("x", "beta")]))
        .build();
    assert_eq!(config.raw_value("x").as_deref(), Some("beta"));

    let names: Vec<String> = config
        .sources()
        .iter()
        .map(|source| source.name().to_owned())
        .collect();
    assert_eq!(names, ["beta", "alpha"]);
}

#[test]
fn lower_sources_fill_gaps() {
    let config = SparkConfig::builder()
        .with_shared_source(ranked("defaults", 100, &[("x", "1"), ("y", "fallback")]))
        .with_shared_source(ranked("overrides", 200, &[("x", "2")]))
        .build();
    assert_eq!(config.raw_value("y").as_deref(), Some("fallback"));
    assert_eq!(config.property_names(), ["x", "y"]);
}

#[test]
fn added_source_is_visible_and_resorted() {
    let config = SparkConfig::builder()
        .with_shared_source(ranked("defaults", 100, &[("x", "1")]))
        .build();
    let late = ranked("late", 300, &[("x", "3")]);
    assert!(config.add_source(Arc::clone(&late)));
    assert_eq!(config.raw_value("x").as_deref(), Some("3"));
    assert!(!config.add_source(late), "同一实例重复追加应被忽略");
    assert_eq!(config.sources().len(), 2);
}

#[test]
fn wrappers_apply_to_build_time_sources_only() {
    struct Upper(Arc<dyn PropertySource>);

    impl PropertySource for Upper {
        fn name(&self) -> &str {
            self.0.name()
        }

        fn ordinal(&self) -> i32 {
            self.0.ordinal()
        }

        fn value(&self, name: &str) -> Option<String> {
            self.0.value(name).map(|value| value.to_uppercase())
        }

        fn property_names(&self) -> Vec<String> {
            self.0.property_names()
        }
    }

    let config = SparkConfig::builder()
        .with_source(source("built", &[("a", "wrapped")]))
        .with_wrapper(|inner| Arc::new(Upper(inner)) as Arc<dyn PropertySource>)
        .build();
    assert_eq!(config.raw_value("a").as_deref(), Some("WRAPPED"));

    config.add_source(ranked("late", 500, &[("b", "plain")]));
    assert_eq!(
        config.raw_value("b").as_deref(),
        Some("plain"),
        "追加来源不经过包装器"
    );
}
