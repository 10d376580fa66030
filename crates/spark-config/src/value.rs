//! 解析结果的诊断载体。

use std::fmt;

/// 一次原始查找的结果：值本身以及它来自哪个属性源。
///
/// # 设计背景（Why）
/// - 拦截器在链上传递的不是裸字符串，而是带来源信息的值，便于排查“这个值到底是谁给的”；
/// - Profile 重定向后 `name` 记录实际命中的限定名（如 `%dev.port`），与调用方请求的名字可能不同。
///
/// # 契约说明（What）
/// - `value` 永远是未转换的原始文本；
/// - 由拦截器合成的值可自行填写 `source_name`，约定使用拦截器名称。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigValue {
    name: String,
    value: String,
    source_name: String,
    source_ordinal: i32,
}

impl ConfigValue {
    /// 构造一次查找结果。
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        source_name: impl Into<String>,
        source_ordinal: i32,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            source_name: source_name.into(),
            source_ordinal,
        }
    }

    /// 命中的属性名。
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 原始值。
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    #[inline]
    pub fn source_ordinal(&self) -> i32 {
        self.source_ordinal
    }

    /// 保留来源信息，替换属性名。
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 保留来源信息，替换原始值；表达式展开后使用。
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// 取出原始值。
    pub fn into_value(self) -> String {
        self.value
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} (source `{}`, ordinal {})",
            self.name, self.value, self.source_name, self.source_ordinal
        )
    }
}
