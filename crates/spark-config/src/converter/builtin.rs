//! 内置转换器。
//!
//! 统一约定：输入先去除首尾空白，空串返回 `Ok(None)`（`String` 例外，不做裁剪）。

use std::any::type_name;
use std::borrow::Cow;
use std::error::Error;
use std::marker::PhantomData;
use std::str::FromStr;
use std::time::Duration;

use super::Converter;
use crate::error::ConversionError;

/// `String` 转换器：原样返回，仅空串视为缺失。
#[derive(Clone, Copy, Debug, Default)]
pub struct StringConverter;

impl Converter<String> for StringConverter {
    fn convert(&self, value: &str) -> Result<Option<String>, ConversionError> {
        if value.is_empty() {
            return Ok(None);
        }
        Ok(Some(value.to_owned()))
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed("String")
    }
}

/// `bool` 转换器。
///
/// `true`、`1`、`yes`、`y`、`on`（不区分大小写）为真，其余非空输入一律为假。
#[derive(Clone, Copy, Debug, Default)]
pub struct BoolConverter;

impl Converter<bool> for BoolConverter {
    fn convert(&self, value: &str) -> Result<Option<bool>, ConversionError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let truthy = ["true", "1", "yes", "y", "on"]
            .iter()
            .any(|candidate| trimmed.eq_ignore_ascii_case(candidate));
        Ok(Some(truthy))
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed("bool")
    }
}

/// 基于 [`FromStr`] 的通用转换器，覆盖整数、浮点、`char`、`PathBuf`、`IpAddr`、`SocketAddr` 等。
pub struct FromStrConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FromStrConverter<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter<T> for FromStrConverter<T>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    fn convert(&self, value: &str) -> Result<Option<T>, ConversionError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<T>()
            .map(Some)
            .map_err(|error| ConversionError::caused_by(type_name::<T>(), trimmed, error))
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed(type_name::<T>())
    }
}

/// `Duration` 转换器。
///
/// 接受 `<n>`（秒）或 `<n><unit>`，`unit` 为 `ms`、`s`、`m`、`h`、`d` 之一。
#[derive(Clone, Copy, Debug, Default)]
pub struct DurationConverter;

impl DurationConverter {
    const NAME: &'static str = "Duration";
}

impl Converter<Duration> for DurationConverter {
    fn convert(&self, value: &str) -> Result<Option<Duration>, ConversionError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);
        if digits.is_empty() {
            return Err(ConversionError::new(
                Self::NAME,
                trimmed,
                "expected a non-negative integer amount",
            ));
        }
        let amount: u64 = digits
            .parse()
            .map_err(|error| ConversionError::caused_by(Self::NAME, trimmed, error))?;
        let seconds_per_unit = match unit {
            "ms" => return Ok(Some(Duration::from_millis(amount))),
            "" | "s" => 1,
            "m" => 60,
            "h" => 60 * 60,
            "d" => 24 * 60 * 60,
            other => {
                return Err(ConversionError::new(
                    Self::NAME,
                    trimmed,
                    format!("unknown duration unit `{other}`"),
                ));
            }
        };
        amount
            .checked_mul(seconds_per_unit)
            .map(|seconds| Some(Duration::from_secs(seconds)))
            .ok_or_else(|| ConversionError::new(Self::NAME, trimmed, "duration overflow"))
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed(Self::NAME)
    }
}
