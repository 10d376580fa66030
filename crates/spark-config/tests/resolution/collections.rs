use std::collections::BTreeSet;
use std::sync::Arc;

use spark_config::converter::{CollectionConverter, Converter, ElementPolicy, StringConverter};
use spark_config::{ResolveError, SparkConfig};

use super::support::source;

fn config() -> SparkConfig {
    SparkConfig::builder()
        .with_source(source(
            "app",
            &[
                ("ids", "1,2,3"),
                ("commas", ","),
                ("escaped", r"a\,b,c"),
                ("gappy", "1,,3"),
                ("dupes", "b, a, b"),
                ("broken", "1,x,3"),
            ],
        ))
        .build()
}

#[test]
fn splits_and_converts_elements() {
    let ids: Vec<i32> = config().values("ids").unwrap();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn all_empty_elements_mean_missing() {
    let config = config();
    assert!(config.values::<i32, Vec<i32>>("commas").unwrap_err().is_not_found());
    assert_eq!(
        config.optional_values::<i32, Vec<i32>>("commas").unwrap(),
        None
    );
    assert_eq!(
        config.optional_values::<i32, Vec<i32>>("missing").unwrap(),
        None
    );
}

#[test]
fn escaped_commas_stay_in_element() {
    let parts: Vec<String> = config().values("escaped").unwrap();
    assert_eq!(parts, ["a,b", "c"]);
}

#[test]
fn collects_into_any_container() {
    let set: BTreeSet<String> = config().values("dupes").unwrap();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn null_element_policies() {
    let config = config();
    let element: Arc<dyn Converter<i32>> = config.converters().converter::<i32>().unwrap();

    let skipped: Vec<i32> = config.values("gappy").unwrap();
    assert_eq!(skipped, [1, 3]);

    let filled = CollectionConverter::<i32, Vec<i32>>::with_policy(
        Arc::clone(&element),
        ElementPolicy::ZeroFill,
    );
    assert_eq!(config.value_with("gappy", &filled).unwrap(), [1, 0, 3]);

    let rejecting = CollectionConverter::<i32, Vec<i32>>::new(element).rejecting_nulls();
    match config.value_with("gappy", &rejecting) {
        Err(ResolveError::Conversion { source, .. }) => {
            assert!(
                source.detail().starts_with("element 1 converted to null"),
                "实际信息：{}",
                source.detail()
            );
        }
        other => panic!("期望转换错误，实际为 {other:?}"),
    }
}

#[test]
fn element_errors_carry_index_and_raw_value() {
    let config = config();
    for error in [
        config.values::<i32, Vec<i32>>("broken").unwrap_err(),
        config
            .optional_values::<i32, Vec<i32>>("broken")
            .unwrap_err(),
    ] {
        match error {
            ResolveError::Conversion { name, raw, source } => {
                assert_eq!(name, "broken");
                assert_eq!(raw, "1,x,3");
                assert!(source.detail().starts_with("element 1:"));
            }
            other => panic!("期望转换错误，实际为 {other:?}"),
        }
    }
}

#[test]
fn explicit_element_converter() {
    let words: Vec<String> = config().values_with("dupes", &StringConverter).unwrap();
    assert_eq!(words, ["b", "a", "b"]);
}
