//! 隐式转换器：从类型自身的“字符串构造习惯”推导转换能力。
//!
//! # 设计背景（Why）
//! - 很多类型天然就能由字符串构造（工厂方法、`FromStr`、`From<String>`），
//!   逐一手写转换器既重复又容易遗漏；
//! - Rust 没有运行期反射，因此类型的“静态能力描述”以 [`ImplicitIdioms`] 表的形式显式提供，
//!   来源可以是 [`Implicit`] trait 实现，也可以是构建期直接注册的表。
//!
//! # 逻辑解析（How）
//! - 能力表按 [`Idiom`] 分槽保存构造函数；
//! - 探测按 [`Idiom::PROBE_ORDER`] 依次检查，第一个存在的槽位胜出；
//! - 探测结果携带 [`ImplicitDescriptor`]，只记录“类型名 + 构造习惯”，
//!   反序列化后通过注册表重新从能力表取回函数，从不序列化函数指针本身。

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Converter;
use crate::error::{BoxError, ConversionError};

/// 字符串构造习惯。
///
/// 探测顺序即声明顺序：前四项是主要习惯，后三项是补充回退。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Idiom {
    /// 工厂方法 `of(&str)`。
    Of,
    /// 工厂方法 `value_of(&str)`。
    ValueOf,
    /// 以拥有所有权的 `String` 构造。
    Constructor,
    /// 通用字符序列解析，对应 [`FromStr`]。
    Parse,
    /// 以借用的 `&str` 构造，对应 `From<&str>`。
    ConstructorStr,
    /// 字符序列版本的 `value_of`。
    ValueOfStr,
    /// 接受 `String` 的 `parse` 重载。
    ParseString,
}

impl Idiom {
    /// 隐式探测顺序。
    pub const PROBE_ORDER: [Idiom; 7] = [
        Idiom::Of,
        Idiom::ValueOf,
        Idiom::Constructor,
        Idiom::Parse,
        Idiom::ConstructorStr,
        Idiom::ValueOfStr,
        Idiom::ParseString,
    ];

    /// 稳定的字符串名称，与序列化形式一致。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Of => "of",
            Self::ValueOf => "value_of",
            Self::Constructor => "constructor",
            Self::Parse => "parse",
            Self::ConstructorStr => "constructor_str",
            Self::ValueOfStr => "value_of_str",
            Self::ParseString => "parse_string",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Idiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type IdiomFn<T> = Arc<dyn Fn(&str) -> Result<T, BoxError> + Send + Sync>;

/// 某个类型的字符串构造能力表。
///
/// # 契约说明（What）
/// - 每个 [`Idiom`] 至多一个函数，重复设置以最后一次为准；
/// - 函数的返回类型即 `T` 本身，由类型系统保证“构造结果恰为目标类型”。
///
/// ```
/// use spark_config::converter::{Idiom, ImplicitIdioms};
///
/// #[derive(Debug, PartialEq)]
/// struct Port(u16);
///
/// let idioms = ImplicitIdioms::new()
///     .with_value_of(|raw: &str| raw.parse::<u16>().map(Port));
/// assert!(idioms.has(Idiom::ValueOf));
/// assert!(!idioms.has(Idiom::Parse));
/// ```
pub struct ImplicitIdioms<T> {
    slots: [Option<IdiomFn<T>>; 7],
}

impl<T: 'static> ImplicitIdioms<T> {
    /// 空能力表。
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    /// 为指定习惯设置构造函数。
    pub fn with<F, E>(mut self, idiom: Idiom, construct: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let erased: IdiomFn<T> = Arc::new(move |raw: &str| -> Result<T, BoxError> {
            construct(raw).map_err(Into::into)
        });
        self.slots[idiom.slot()] = Some(erased);
        self
    }

    pub fn with_of<F, E>(self, construct: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with(Idiom::Of, construct)
    }

    pub fn with_value_of<F, E>(self, construct: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with(Idiom::ValueOf, construct)
    }

    /// 以 `String` 为参数的构造函数。
    pub fn with_constructor<F, E>(self, construct: F) -> Self
    where
        F: Fn(String) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with(Idiom::Constructor, move |raw: &str| construct(raw.to_owned()))
    }

    pub fn with_parse<F, E>(self, construct: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with(Idiom::Parse, construct)
    }

    pub fn with_constructor_str<F, E>(self, construct: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with(Idiom::ConstructorStr, construct)
    }

    pub fn with_value_of_str<F, E>(self, construct: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with(Idiom::ValueOfStr, construct)
    }

    pub fn with_parse_string<F, E>(self, construct: F) -> Self
    where
        F: Fn(String) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with(Idiom::ParseString, move |raw: &str| construct(raw.to_owned()))
    }

    /// 是否提供某个习惯。
    #[inline]
    pub fn has(&self, idiom: Idiom) -> bool {
        self.slots[idiom.slot()].is_some()
    }

    pub(crate) fn get(&self, idiom: Idiom) -> Option<IdiomFn<T>> {
        self.slots[idiom.slot()].clone()
    }

    /// 按探测顺序返回第一个存在的习惯。
    pub(crate) fn probe(&self) -> Option<(Idiom, IdiomFn<T>)> {
        Idiom::PROBE_ORDER
            .into_iter()
            .find_map(|idiom| self.get(idiom).map(|construct| (idiom, construct)))
    }
}

impl<T> ImplicitIdioms<T>
where
    T: FromStr + 'static,
    T::Err: Into<BoxError>,
{
    /// 以 [`FromStr`] 填充 `parse` 槽位。
    pub fn via_from_str() -> Self {
        Self::new().with_parse(|raw: &str| raw.parse::<T>())
    }
}

impl<T> ImplicitIdioms<T>
where
    T: From<String> + 'static,
{
    /// 以 `From<String>` 填充 `constructor` 槽位。
    pub fn via_from_string() -> Self {
        Self::new().with_constructor(|raw: String| Ok::<T, BoxError>(T::from(raw)))
    }
}

impl<T: 'static> Default for ImplicitIdioms<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ImplicitIdioms<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<T> fmt::Debug for ImplicitIdioms<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<&str> = Idiom::PROBE_ORDER
            .into_iter()
            .filter(|idiom| self.slots[idiom.slot()].is_some())
            .map(Idiom::as_str)
            .collect();
        f.debug_struct("ImplicitIdioms")
            .field("type", &type_name::<T>())
            .field("idioms", &present)
            .finish()
    }
}

/// 类型自带的字符串构造能力。
///
/// ```
/// use spark_config::converter::{Implicit, ImplicitIdioms};
///
/// struct Tenant(String);
///
/// impl Implicit for Tenant {
///     fn idioms() -> ImplicitIdioms<Self> {
///         ImplicitIdioms::new()
///             .with_of(|raw: &str| Ok::<_, std::convert::Infallible>(Tenant(raw.to_owned())))
///     }
/// }
/// ```
pub trait Implicit: Sized + Send + Sync + 'static {
    /// 返回该类型的能力表。
    fn idioms() -> ImplicitIdioms<Self>;
}

/// 可序列化的隐式转换器描述：只含类型名与构造习惯。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplicitDescriptor {
    pub type_name: String,
    pub idiom: Idiom,
}

/// 由能力表探测得到的转换器。
///
/// - 输入先裁剪首尾空白，空串返回 `Ok(None)`；
/// - 构造函数报错时转为 [`ConversionError`]，保留原因链。
pub struct ImplicitConverter<T> {
    idiom: Idiom,
    construct: IdiomFn<T>,
}

impl<T: 'static> ImplicitConverter<T> {
    pub(crate) fn new(idiom: Idiom, construct: IdiomFn<T>) -> Self {
        Self { idiom, construct }
    }

    /// 使用的构造习惯。
    #[inline]
    pub fn idiom(&self) -> Idiom {
        self.idiom
    }

    /// 序列化描述。
    pub fn descriptor(&self) -> ImplicitDescriptor {
        ImplicitDescriptor {
            type_name: type_name::<T>().to_owned(),
            idiom: self.idiom,
        }
    }
}

impl<T: 'static> Converter<T> for ImplicitConverter<T> {
    fn convert(&self, value: &str) -> Result<Option<T>, ConversionError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        (self.construct)(trimmed)
            .map(Some)
            .map_err(|error| ConversionError::caused_by(self.describe(), trimmed, error))
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{}::{}", type_name::<T>(), self.idiom))
    }
}

impl<T: 'static> fmt::Debug for ImplicitConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplicitConverter")
            .field("type", &type_name::<T>())
            .field("idiom", &self.idiom)
            .finish()
    }
}
