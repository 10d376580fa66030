use std::time::Duration;

use spark_config::{ProblemCollector, ResolveError};

use super::support::config_with_defaults;

#[test]
fn collector_reports_every_problem() {
    let config = config_with_defaults(&[
        ("port", "http"),
        ("timeout", "10s"),
        ("url", "${scheme}://localhost"),
    ]);
    let mut problems = ProblemCollector::new();
    let port = problems.check(config.value::<u16>("port"));
    let timeout = problems.check(config.value::<Duration>("timeout"));
    let url = problems.check(config.value::<String>("url"));
    let name = problems.check(config.value::<String>("name"));

    assert_eq!(port, None);
    assert_eq!(timeout, Some(Duration::from_secs(10)));
    assert_eq!(url, None);
    assert_eq!(name, None);

    let error = problems.finish().unwrap_err();
    assert_eq!(error.problems().len(), 3);
    assert!(matches!(
        error.problems()[0],
        ResolveError::Conversion { .. }
    ));

    let rendered = error.to_string();
    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("Configuration validation failed:"));
    assert!(lines.all(|line| line.starts_with('\t')), "每个问题独占一行并以制表符缩进");
    assert!(rendered.contains("unresolved expression reference `scheme`"));
    assert!(rendered.contains("property `name` not found"));
}
