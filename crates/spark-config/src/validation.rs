//! 批量校验：一次启动检查报告全部配置问题，而不是遇到第一个就中止。

use std::fmt;

use thiserror::Error;

use crate::error::ResolveError;

/// 汇总多个解析失败的错误。
///
/// `Display` 首行为固定标题，随后每个问题独占一行并以制表符缩进。
#[derive(Debug, Error)]
pub struct ConfigValidationError {
    problems: Vec<ResolveError>,
}

impl ConfigValidationError {
    /// 收集到的问题，按发生顺序。
    pub fn problems(&self) -> &[ResolveError] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<ResolveError> {
        self.problems
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Configuration validation failed:")?;
        for problem in &self.problems {
            write!(f, "\n\t{problem}")?;
        }
        Ok(())
    }
}

/// 问题收集器。
///
/// ```
/// use spark_config::{MapSource, ProblemCollector, SparkConfig};
///
/// let config = SparkConfig::builder()
///     .with_source(MapSource::new("app", [("port", "http")]))
///     .build();
/// let mut problems = ProblemCollector::new();
/// let port = problems.check(config.value::<u16>("port"));
/// let host = problems.check(config.value::<String>("host"));
/// assert!(port.is_none() && host.is_none());
///
/// let error = problems.finish().unwrap_err();
/// assert_eq!(error.problems().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ProblemCollector {
    problems: Vec<ResolveError>,
}

impl ProblemCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录失败并返回成功值；失败时返回 `None`，调用方可继续检查其余属性。
    pub fn check<T>(&mut self, result: Result<T, ResolveError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(problem) => {
                self.problems.push(problem);
                None
            }
        }
    }

    pub fn push(&mut self, problem: ResolveError) {
        self.problems.push(problem);
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// 无问题时返回 `Ok(())`，否则返回汇总错误。
    pub fn finish(self) -> Result<(), ConfigValidationError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError {
                problems: self.problems,
            })
        }
    }
}

const _: fn() = || {
    fn assert_error_traits<T: std::error::Error + Send + Sync + 'static>() {}

    assert_error_traits::<ConfigValidationError>();
};
