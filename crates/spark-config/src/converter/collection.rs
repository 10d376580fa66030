use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::Converter;
use crate::error::ConversionError;

/// 按未转义的逗号切分原始值。
///
/// - `\,` 还原为字面逗号，`\\` 还原为单个反斜杠，其余反斜杠序列原样保留；
/// - 每个元素去除首尾空白；空输入得到单个空元素。
///
/// ```
/// use spark_config::converter::split_escaped;
///
/// assert_eq!(split_escaped(r"a\,b, c"), ["a,b", "c"]);
/// assert_eq!(split_escaped(","), ["", ""]);
/// ```
pub fn split_escaped(input: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(',') => current.push(','),
                Some('\\') => current.push('\\'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            ',' => elements.push(std::mem::take(&mut current).trim().to_owned()),
            other => current.push(other),
        }
    }
    elements.push(current.trim().to_owned());
    elements
}

/// 元素转换为“缺失”时的处理策略。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ElementPolicy {
    /// 丢弃缺失元素。
    #[default]
    Skip,
    /// 以 `T::default()` 占位。
    ZeroFill,
    /// 视为转换错误。
    Reject,
}

enum NullHandling<T> {
    Skip,
    Fill(fn() -> T),
    Reject,
}

/// 以元素转换器构造的集合转换器。
///
/// # 教案式说明
/// - **意图（Why）**：`a,b,c` 形式的列表属性在配置中极其常见，集合转换应复用元素类型已有的转换能力；
/// - **逻辑（How）**：[`split_escaped`] 切分后逐个调用元素转换器，再按 [`ElementPolicy`] 处理缺失元素，
///   最终收集到任意 `C: FromIterator<T>`；
/// - **契约（What）**：
///   - 全部元素都缺失时整个集合视为缺失（`Ok(None)`），因而 `""` 与 `","` 都表示缺失；
///   - 元素转换报错时返回的错误携带元素下标与原始元素；
///   - `Reject` 策略下出现缺失元素返回 `element {i} converted to null by converter X`；
///   - [`CollectionConverter::new`] 使用 `Skip`，零值占位需要 `T: Default`，经由
///     [`CollectionConverter::with_policy`] 显式选择 `ZeroFill`。
pub struct CollectionConverter<T, C, E = Arc<dyn Converter<T>>> {
    element: E,
    nulls: NullHandling<T>,
    _marker: PhantomData<fn() -> C>,
}

impl<T, C, E> CollectionConverter<T, C, E>
where
    C: FromIterator<T>,
    E: Converter<T>,
{
    /// 以默认的 `Skip` 策略构造。
    pub fn new(element: E) -> Self {
        Self {
            element,
            nulls: NullHandling::Skip,
            _marker: PhantomData,
        }
    }

    /// 缺失元素视为错误。
    pub fn rejecting_nulls(mut self) -> Self {
        self.nulls = NullHandling::Reject;
        self
    }
}

impl<T, C, E> CollectionConverter<T, C, E> {
    /// 当前策略。
    pub fn policy(&self) -> ElementPolicy {
        match self.nulls {
            NullHandling::Skip => ElementPolicy::Skip,
            NullHandling::Fill(_) => ElementPolicy::ZeroFill,
            NullHandling::Reject => ElementPolicy::Reject,
        }
    }
}

impl<T, C, E> CollectionConverter<T, C, E>
where
    T: Default,
    C: FromIterator<T>,
    E: Converter<T>,
{
    /// 缺失元素以 `T::default()` 占位。
    pub fn zero_filling(mut self) -> Self {
        self.nulls = NullHandling::Fill(T::default);
        self
    }

    /// 按策略构造；`ZeroFill` 需要 `T: Default`，因此只在此处提供。
    pub fn with_policy(element: E, policy: ElementPolicy) -> Self {
        let converter = Self::new(element);
        match policy {
            ElementPolicy::Skip => converter,
            ElementPolicy::ZeroFill => converter.zero_filling(),
            ElementPolicy::Reject => converter.rejecting_nulls(),
        }
    }
}

impl<T, C, E> Converter<C> for CollectionConverter<T, C, E>
where
    C: FromIterator<T>,
    E: Converter<T>,
{
    fn convert(&self, value: &str) -> Result<Option<C>, ConversionError> {
        let elements = split_escaped(value);
        let mut converted = Vec::with_capacity(elements.len());
        let mut any_present = false;
        for (index, element) in elements.iter().enumerate() {
            let item = self.element.convert(element).map_err(|error| {
                ConversionError::new(
                    self.describe(),
                    element.as_str(),
                    format!("element {index}: {}", error.detail()),
                )
                .with_source(error)
            })?;
            any_present |= item.is_some();
            converted.push(item);
        }
        if !any_present {
            return Ok(None);
        }

        let mut items = Vec::with_capacity(converted.len());
        for (index, item) in converted.into_iter().enumerate() {
            match (item, &self.nulls) {
                (Some(item), _) => items.push(item),
                (None, NullHandling::Skip) => {}
                (None, NullHandling::Fill(fill)) => items.push(fill()),
                (None, NullHandling::Reject) => {
                    return Err(ConversionError::new(
                        self.describe(),
                        value,
                        format!(
                            "element {index} converted to null by converter {}",
                            self.element.describe()
                        ),
                    ));
                }
            }
        }
        Ok(Some(items.into_iter().collect()))
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("collection<{}>", self.element.describe()))
    }
}

impl<T, C, E> fmt::Debug for CollectionConverter<T, C, E>
where
    E: Converter<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConverter")
            .field("element", &self.element.describe())
            .field("policy", &self.policy())
            .finish()
    }
}
