use std::sync::Arc;

use spark_config::{MapSource, PropertySource, SparkConfig};

/// 以默认序数构造内存来源。
pub fn source(name: &str, entries: &[(&str, &str)]) -> MapSource {
    MapSource::new(name, entries.iter().copied())
}

/// 以指定序数构造共享来源。
pub fn ranked(name: &str, ordinal: i32, entries: &[(&str, &str)]) -> Arc<dyn PropertySource> {
    source(name, entries).with_ordinal(ordinal).into_shared()
}

/// 单来源、启用默认拦截器的配置。
pub fn config_with_defaults(entries: &[(&str, &str)]) -> SparkConfig {
    SparkConfig::builder()
        .with_source(source("app", entries))
        .add_default_interceptors()
        .build()
}
