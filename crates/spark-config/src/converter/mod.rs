//! 类型转换子系统。
//!
//! # 设计背景（Why）
//! - 属性源只提供字符串，调用方需要的是 `u16`、`Duration`、`Vec<i64>` 乃至自定义类型；
//! - 转换能力来自三处：显式注册的转换器、内置转换器、以及由类型自身“构造习惯”推导的隐式转换器。
//!
//! # 契约说明（What）
//! - 转换器返回 `Ok(None)` 表示“该输入意味着缺失”，内置转换器约定空串即缺失；
//! - 返回 `Err` 表示输入不合法，解析门面会携带属性名与原始值向上传播；
//! - 转换器必须可重复使用、可跨线程共享，不得在调用之间保留可变状态。

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::ConversionError;

mod builtin;
mod collection;
mod implicit;
#[cfg(feature = "json")]
mod json;
mod registry;

pub use builtin::{BoolConverter, DurationConverter, FromStrConverter, StringConverter};
pub use collection::{CollectionConverter, ElementPolicy, split_escaped};
pub use implicit::{Idiom, Implicit, ImplicitConverter, ImplicitDescriptor, ImplicitIdioms};
#[cfg(feature = "json")]
pub use json::JsonArrayConverter;
pub use registry::{BUILTIN_PRIORITY, ConverterRegistry, DEFAULT_PRIORITY};

/// 字符串到 `T` 的转换器。
///
/// # 教案式说明
/// - **意图（Why）**：把“字符串如何变成目标类型”从解析流程中剥离，允许按类型替换或叠加；
/// - **契约（What）**：
///   - `Ok(Some(v))`：转换成功；
///   - `Ok(None)`：输入表示缺失，内置实现仅对空串返回；
///   - `Err(e)`：输入不合法；
/// - **线程安全**：实现必须 `Send + Sync`，注册表以 `Arc<dyn Converter<T>>` 共享同一实例。
pub trait Converter<T>: Send + Sync {
    /// 转换原始字符串。
    fn convert(&self, value: &str) -> Result<Option<T>, ConversionError>;

    /// 诊断用名称，出现在 [`ConversionError`] 中。
    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl<T, C> Converter<T> for Arc<C>
where
    C: Converter<T> + ?Sized,
{
    fn convert(&self, value: &str) -> Result<Option<T>, ConversionError> {
        (**self).convert(value)
    }

    fn describe(&self) -> Cow<'static, str> {
        (**self).describe()
    }
}

impl<T, C> Converter<T> for &C
where
    C: Converter<T> + ?Sized,
{
    fn convert(&self, value: &str) -> Result<Option<T>, ConversionError> {
        (**self).convert(value)
    }

    fn describe(&self) -> Cow<'static, str> {
        (**self).describe()
    }
}

/// 由闭包实现的转换器，参见 [`from_fn`]。
pub struct FnConverter<T, F> {
    name: Cow<'static, str>,
    convert: F,
    _marker: PhantomData<fn() -> T>,
}

/// 以闭包构造转换器。
///
/// ```
/// use spark_config::converter::{Converter, from_fn};
///
/// let upper = from_fn("upper", |raw: &str| Ok(Some(raw.to_uppercase())));
/// assert_eq!(upper.convert("abc").unwrap().as_deref(), Some("ABC"));
/// ```
pub fn from_fn<T, F>(name: impl Into<Cow<'static, str>>, convert: F) -> FnConverter<T, F>
where
    F: Fn(&str) -> Result<Option<T>, ConversionError> + Send + Sync,
{
    FnConverter {
        name: name.into(),
        convert,
        _marker: PhantomData,
    }
}

impl<T, F> Converter<T> for FnConverter<T, F>
where
    F: Fn(&str) -> Result<Option<T>, ConversionError> + Send + Sync,
{
    fn convert(&self, value: &str) -> Result<Option<T>, ConversionError> {
        (self.convert)(value)
    }

    fn describe(&self) -> Cow<'static, str> {
        self.name.clone()
    }
}

impl<T, F> fmt::Debug for FnConverter<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// 把 `Converter<T>` 包装为 `Converter<Option<T>>`。
///
/// # 契约（What）
/// - 永远不以 `Ok(None)` 报告缺失，缺失统一表达为 `Ok(Some(None))`，
///   因而必需语义的解析流程不会把它判定为“未找到”；
/// - 空串输入若令内层报错，视为缺失返回 `Ok(Some(None))`；非空输入的错误原样传播。
#[derive(Clone, Debug)]
pub struct OptionalConverter<C> {
    inner: C,
}

impl<C> OptionalConverter<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<T, C> Converter<Option<T>> for OptionalConverter<C>
where
    C: Converter<T>,
{
    fn convert(&self, value: &str) -> Result<Option<Option<T>>, ConversionError> {
        match self.inner.convert(value) {
            Ok(converted) => Ok(Some(converted)),
            Err(_) if value.is_empty() => Ok(Some(None)),
            Err(error) => Err(error),
        }
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("optional<{}>", self.inner.describe()))
    }
}
