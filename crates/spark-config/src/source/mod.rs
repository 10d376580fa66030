//! 属性源契约与内存实现。
//!
//! # 设计背景（Why）
//! - 解析核心只依赖四个操作：名称、序数、按名取值、枚举已知属性名；
//!   文件、环境变量、远程配置中心等具体来源如何装载数据与核心无关；
//! - 属性源以 `Arc<dyn PropertySource>` 只读共享，核心从不修改它们。
//!
//! # 排序约定（What）
//! - 序数高者优先；序数相同时按名称逆序排列，即名称字典序更靠后的来源胜出；
//! - 该顺序在构建与每次追加来源后保持不变，保证同一输入得到确定的结果。

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

mod set;

pub use set::{SourceSet, SourceSnapshot};

/// 未显式指定时的属性源序数。
pub const DEFAULT_ORDINAL: i32 = 100;

/// 属性源契约。
///
/// # 契约说明（What）
/// - `name`：来源的稳定标识，用于诊断与同序数时的排序，不要求全局唯一；
/// - `ordinal`：有符号优先级，数值越大越优先，默认 [`DEFAULT_ORDINAL`]；
/// - `value`：按属性名取原始值，不存在时返回 `None`；
/// - `property_names`：该来源已知的属性名集合，允许不完整（例如按需计算的来源）。
///
/// # 线程安全
/// - 要求 `Send + Sync`，解析门面会在任意线程上并发调用 `value`。
pub trait PropertySource: Send + Sync {
    /// 来源名称。
    fn name(&self) -> &str;

    /// 来源序数。
    fn ordinal(&self) -> i32 {
        DEFAULT_ORDINAL
    }

    /// 按属性名取值。
    fn value(&self, name: &str) -> Option<String>;

    /// 已知属性名。
    fn property_names(&self) -> Vec<String>;
}

/// 属性源全序：序数降序，同序数时名称降序。
pub(crate) fn compare_sources(a: &dyn PropertySource, b: &dyn PropertySource) -> Ordering {
    b.ordinal()
        .cmp(&a.ordinal())
        .then_with(|| b.name().cmp(a.name()))
}

/// 按 [`compare_sources`] 原地排序。
pub(crate) fn sort_sources(sources: &mut [Arc<dyn PropertySource>]) {
    sources.sort_by(|a, b| compare_sources(a.as_ref(), b.as_ref()));
}

/// 按指针去重，保留首次出现的位置。
pub(crate) fn dedupe_sources(sources: &mut Vec<Arc<dyn PropertySource>>) {
    let mut unique: Vec<Arc<dyn PropertySource>> = Vec::with_capacity(sources.len());
    for source in sources.drain(..) {
        if !unique.iter().any(|existing| same_source(existing, &source)) {
            unique.push(source);
        }
    }
    *sources = unique;
}

/// 两个句柄是否指向同一个属性源实例。
#[inline]
pub(crate) fn same_source(a: &Arc<dyn PropertySource>, b: &Arc<dyn PropertySource>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// 基于有序映射的内存属性源。
///
/// # 教案式说明
/// - **意图（Why）**：测试、默认值层、程序化覆盖等场景需要一个零依赖的来源实现；
/// - **契约（What）**：构造后内容不可变；`property_names` 按字典序返回；
/// - **实现（How）**：内部使用 `BTreeMap`，枚举顺序稳定，便于断言。
#[derive(Clone)]
pub struct MapSource {
    name: String,
    ordinal: i32,
    properties: BTreeMap<String, String>,
}

impl MapSource {
    /// 以默认序数构造。
    pub fn new<N, I, K, V>(name: N, properties: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            ordinal: DEFAULT_ORDINAL,
            properties: properties
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// 只含一个属性的来源，名称为 `single:<key>`。
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let name = format!("single:{key}");
        Self::new(name, [(key, value.into())])
    }

    /// 覆盖序数。
    pub fn with_ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// 转为可注册的共享句柄。
    pub fn into_shared(self) -> Arc<dyn PropertySource> {
        Arc::new(self)
    }
}

impl PropertySource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn value(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }
}

impl fmt::Debug for MapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSource")
            .field("name", &self.name)
            .field("ordinal", &self.ordinal)
            .field("properties", &self.properties.len())
            .finish()
    }
}
