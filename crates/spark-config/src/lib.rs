#![doc = r#"
# spark-config

## 设计动机（Why）
- **单一入口**：调用方给出属性名与目标类型，拿到强类型值或类型化的失败，
  不需要关心有多少属性源、激活了哪个 Profile、字符串如何变成 `Duration` 或整数列表；
- **横切行为可插拔**：Profile 覆盖、`${..}` 表达式展开、密钥屏蔽都以拦截器的形式插入查找链；
- **类型转换可扩展**：显式注册、内置转换器与类型自带的构造能力共同回答“字符串如何变成 `T`”。

## 核心契约（What）
- [`SparkConfig`]：解析门面，提供必需/可选、单值/集合、原始值与一次性转换等入口；
- [`PropertySource`]：属性源契约，[`MapSource`] 为内存实现；
- [`Interceptor`]：查找链阶段，[`interceptor`] 模块提供库内置阶段；
- [`Converter`]：字符串到 `T` 的转换器，[`ConverterRegistry`] 按类型管理；
- [`KeyMap`]：支持 `*`、`[n]`、`[*]` 通配的属性路径字典树。

## 实现策略（How）
- 来源列表保存在 `ArcSwap` 中，追加来源通过比较交换重试发布完整快照，读者从不阻塞；
- 拦截器链与转换器注册表在 [`SparkConfigBuilder::build`] 时固定，之后只读；
- 隐式转换器按 `TypeId` 记忆化在 `DashMap` 中。

## 风险与考量（Trade-offs）
- 核心同步执行、不做 I/O，文件/环境变量/远程配置中心等来源由上层以 [`PropertySource`] 接入；
- 失败从不在核心内记录日志或重试，全部返回给直接调用方。

```
use std::time::Duration;

use spark_config::{MapSource, SparkConfig};

let config = SparkConfig::builder()
    .with_source(MapSource::new("defaults", [("timeout", "30s"), ("host", "localhost")]))
    .with_source(MapSource::new("override", [("host", "${region}.example.org"), ("region", "eu")]).with_ordinal(200))
    .add_default_interceptors()
    .build();

assert_eq!(config.value::<Duration>("timeout").unwrap(), Duration::from_secs(30));
assert_eq!(config.value::<String>("host").unwrap(), "eu.example.org");
assert_eq!(config.optional_value::<u16>("port").unwrap(), None);
```
"#]

mod builder;
mod config;
pub mod converter;
mod error;
pub mod interceptor;
pub mod key_map;
mod source;
mod validation;
mod value;

pub use builder::SparkConfigBuilder;
pub use config::SparkConfig;
pub use converter::{Converter, ConverterRegistry};
pub use error::{BoxError, ConversionError, ExpansionError, ResolveError, RestoreError};
pub use interceptor::secret as secrets;
pub use interceptor::{Interceptor, InterceptorChain, InterceptorContext};
pub use key_map::KeyMap;
pub use source::{DEFAULT_ORDINAL, MapSource, PropertySource, SourceSet, SourceSnapshot};
pub use validation::{ConfigValidationError, ProblemCollector};
pub use value::ConfigValue;
