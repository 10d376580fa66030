use std::borrow::Cow;

use serde_json::Value;

use super::Converter;
use crate::error::ConversionError;

/// 把 JSON 数组文本转换为 `Vec<serde_json::Value>`。
///
/// - 空白输入视为缺失；
/// - 非数组或非法 JSON 返回 [`ConversionError`]，原因保留 `serde_json::Error`。
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonArrayConverter;

impl Converter<Vec<Value>> for JsonArrayConverter {
    fn convert(&self, value: &str) -> Result<Option<Vec<Value>>, ConversionError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Vec<Value>>(trimmed)
            .map(Some)
            .map_err(|error| ConversionError::caused_by("json-array", trimmed, error))
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed("json-array")
    }
}
