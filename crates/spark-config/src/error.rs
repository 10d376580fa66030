//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义属性解析链路上的全部失败语义：未找到、转换失败、缺少转换器、表达式展开失败、
//!   隐式转换器恢复失败；
//! - 所有错误均同步返回给直接调用方，核心自身不记录日志、不重试。
//!
//! ## 设计要求（What）
//! - 错误类型实现 `std::error::Error + Send + Sync + 'static`，可跨线程传播并被 `?` 透传；
//! - [`ResolveError`] 标注 `#[non_exhaustive]`，为后续扩展预留空间；
//! - 转换失败总是携带属性名与原始值，不会被降级为“未找到”（空串默认值场景除外，见
//!   [`SparkConfig::value_with`](crate::SparkConfig::value_with)）。

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use thiserror::Error;

/// 装箱的底层错误，供转换器携带任意原因。
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// 单次属性解析的失败分类。
///
/// # 教案式说明
/// - **意图 (Why)**：让调用方能够精确区分“值缺失”“数据错误”与“类型用法错误”，
///   分别对应“使用默认值/阻断部署”“修正配置”“修正代码”三种处置路径；
/// - **契约 (What)**：
///   - `NotFound`：没有任何来源给出可用值，且转换器也未为缺失提供默认值；
///     `unresolved` 非空时表示表达式展开阶段有引用无法解析；
///   - `Conversion`：原始值存在但转换器报错，保留属性名、原始值与底层原因；
///   - `NoConverter`：目标类型既无显式注册也无隐式转换能力；
/// - **设计权衡 (Trade-offs)**：属性名与原始值使用 `String` 保存，牺牲少量分配换取可读的诊断信息。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// 必需属性未找到。
    #[error("property `{name}` not found{}", unresolved_suffix(.unresolved))]
    NotFound {
        /// 被查询的属性名。
        name: String,
        /// 展开失败的表达式引用。
        unresolved: Option<String>,
    },

    /// 原始值存在但无法转换。
    #[error("failed to convert property `{name}` (raw value `{raw}`): {source}")]
    Conversion {
        name: String,
        raw: String,
        source: ConversionError,
    },

    /// 目标类型没有可用的转换器。
    #[error("no converter registered for type `{type_name}`")]
    NoConverter { type_name: &'static str },
}

fn unresolved_suffix(unresolved: &Option<String>) -> String {
    match unresolved {
        Some(reference) => format!(" (unresolved expression reference `{reference}`)"),
        None => String::new(),
    }
}

impl ResolveError {
    /// 构造普通的未找到错误。
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            unresolved: None,
        }
    }

    /// 是否属于未找到类错误。
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// 关联的属性名；`NoConverter` 不绑定具体属性。
    pub fn property_name(&self) -> Option<&str> {
        match self {
            Self::NotFound { name, .. } | Self::Conversion { name, .. } => Some(name),
            Self::NoConverter { .. } => None,
        }
    }
}

/// 转换器拒绝输入时返回的错误。
///
/// # 契约（What）
/// - `converter`：转换器的描述名，来自 [`Converter::describe`](crate::converter::Converter::describe)；
/// - `input`：被拒绝的输入文本（集合转换时为单个元素）；
/// - `detail`：面向人类的失败说明；
/// - `source`：可选的底层错误，例如 `ParseIntError`。
#[derive(Debug, Error)]
#[error("converter `{converter}` rejected `{input}`: {detail}")]
pub struct ConversionError {
    converter: Cow<'static, str>,
    input: String,
    detail: String,
    source: Option<BoxError>,
}

impl ConversionError {
    /// 构造不带底层原因的转换错误。
    pub fn new(
        converter: impl Into<Cow<'static, str>>,
        input: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            converter: converter.into(),
            input: input.into(),
            detail: detail.into(),
            source: None,
        }
    }

    /// 以底层错误作为原因构造，`detail` 取其 `Display` 文本。
    pub fn caused_by<E>(
        converter: impl Into<Cow<'static, str>>,
        input: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: Into<BoxError>,
    {
        let cause = cause.into();
        Self {
            converter: converter.into(),
            input: input.into(),
            detail: cause.to_string(),
            source: Some(cause),
        }
    }

    /// 附加底层原因，保留已有的 `detail`。
    pub fn with_source<E>(mut self, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.source = Some(cause.into());
        self
    }

    /// 转换器描述名。
    pub fn converter(&self) -> &str {
        &self.converter
    }

    /// 被拒绝的输入。
    pub fn input(&self) -> &str {
        &self.input
    }

    /// 失败说明。
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// 属性表达式展开失败。
///
/// - `reference`：无法解析的引用名（或超过深度时正在展开的引用）；
/// - `depth_exceeded`：为 `true` 表示嵌套或循环引用超过深度上限。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpansionError {
    pub reference: String,
    pub depth_exceeded: bool,
}

impl ExpansionError {
    pub(crate) fn unresolved(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            depth_exceeded: false,
        }
    }

    pub(crate) fn too_deep(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            depth_exceeded: true,
        }
    }
}

impl fmt::Display for ExpansionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth_exceeded {
            write!(
                f,
                "expression expansion depth exceeded while resolving `{}`",
                self.reference
            )
        } else {
            write!(f, "unresolved expression reference `{}`", self.reference)
        }
    }
}

impl Error for ExpansionError {}

/// 从 [`ImplicitDescriptor`](crate::converter::ImplicitDescriptor) 恢复转换器失败。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RestoreError {
    /// 描述符记录的类型与请求的目标类型不一致。
    #[error("descriptor was recorded for `{recorded}` but `{requested}` was requested")]
    TypeMismatch {
        recorded: String,
        requested: &'static str,
    },

    /// 目标类型的能力表中已不存在描述符记录的构造习惯。
    #[error("type `{type_name}` no longer provides the `{idiom}` construction idiom")]
    MissingIdiom {
        type_name: &'static str,
        idiom: String,
    },
}

const _: fn() = || {
    fn assert_error_traits<T: Error + Send + Sync + 'static>() {}

    assert_error_traits::<ResolveError>();
    assert_error_traits::<ConversionError>();
    assert_error_traits::<ExpansionError>();
    assert_error_traits::<RestoreError>();
};
