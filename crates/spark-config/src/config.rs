//! 解析门面：拦截器链查找 → 原始字符串 → 转换器 → 类型化结果。

use std::fmt;
use std::sync::Arc;

use crate::builder::SparkConfigBuilder;
use crate::converter::{CollectionConverter, Converter, ConverterRegistry, OptionalConverter};
use crate::error::ResolveError;
use crate::interceptor::InterceptorChain;
use crate::source::{PropertySource, SourceSet, SourceSnapshot};
use crate::value::ConfigValue;

/// 属性解析引擎。
///
/// # 设计背景（Why）
/// - 调用方只需要一个入口：给出属性名与目标类型，拿到强类型值或类型化的失败；
///   它不需要知道有多少属性源、激活了哪个 Profile、字符串如何变成 `Duration`。
///
/// # 逻辑解析（How）
/// - 查找：交给构建期固定的 [`InterceptorChain`]，末端阶段扫描 [`SourceSet`]；
/// - 转换：从 [`ConverterRegistry`] 取得目标类型的转换器，按必需/可选语义处理缺失与空值；
/// - 追加来源：[`add_source`](Self::add_source) 以比较交换重试的方式发布新的来源快照。
///
/// # 契约说明（What）
/// - `SparkConfig: Send + Sync`，所有查找方法都可在任意线程上并发调用；
/// - 拦截器链与转换器注册表构建后只读，唯一的运行期可变状态是来源列表；
/// - 核心不记录失败日志、不重试，所有失败同步返回给直接调用方。
pub struct SparkConfig {
    sources: Arc<SourceSet>,
    chain: InterceptorChain,
    converters: ConverterRegistry,
    profiles: Vec<String>,
}

impl SparkConfig {
    /// 创建构建器。
    pub fn builder() -> SparkConfigBuilder {
        SparkConfigBuilder::new()
    }

    pub(crate) fn assemble(
        sources: Arc<SourceSet>,
        chain: InterceptorChain,
        converters: ConverterRegistry,
        profiles: Vec<String>,
    ) -> Self {
        Self {
            sources,
            chain,
            converters,
            profiles,
        }
    }

    /// 原始值透传，不做任何转换。
    ///
    /// 表达式展开失败同样表现为 `None`；需要区分时使用 [`config_value`](Self::config_value)。
    pub fn raw_value(&self, name: &str) -> Option<String> {
        self.chain
            .lookup(name)
            .ok()
            .flatten()
            .map(ConfigValue::into_value)
    }

    /// 带来源信息的查找结果。
    ///
    /// # 契约（What）
    /// - `Ok(None)`：没有任何来源给出值；
    /// - `Err(NotFound { unresolved: Some(..) })`：值存在但其中的表达式引用无法解析。
    pub fn config_value(&self, name: &str) -> Result<Option<ConfigValue>, ResolveError> {
        self.chain
            .lookup(name)
            .map_err(|error| ResolveError::NotFound {
                name: name.to_owned(),
                unresolved: Some(error.reference),
            })
    }

    /// 以指定转换器执行必需语义的解析。
    ///
    /// # 契约（What）
    /// - 原始值存在：
    ///   - 转换得到值 → 返回；
    ///   - 转换得到 `None` → [`ResolveError::NotFound`]；
    ///   - 转换报错 → [`ResolveError::Conversion`]，携带属性名与原始值，不会降级为未找到；
    /// - 原始值缺失：转换空串，得到值则作为默认值返回；得到 `None` 或报错一律报告未找到，
    ///   空串的转换错误绝不掩盖“缺失”这一真实原因。
    pub fn value_with<T, C>(&self, name: &str, converter: &C) -> Result<T, ResolveError>
    where
        C: Converter<T> + ?Sized,
    {
        match self.config_value(name)? {
            Some(found) => match converter.convert(found.value()) {
                Ok(Some(value)) => Ok(value),
                Ok(None) => Err(ResolveError::not_found(name)),
                Err(source) => Err(ResolveError::Conversion {
                    name: name.to_owned(),
                    raw: found.into_value(),
                    source,
                }),
            },
            None => match converter.convert("") {
                Ok(Some(value)) => Ok(value),
                Ok(None) | Err(_) => Err(ResolveError::not_found(name)),
            },
        }
    }

    /// 以注册表中 `T` 的转换器执行必需语义的解析。
    pub fn value<T: 'static>(&self, name: &str) -> Result<T, ResolveError> {
        let converter = self.converters.converter::<T>()?;
        self.value_with(name, converter.as_ref())
    }

    /// 可选语义：缺失或被视为缺失时返回 `Ok(None)`，转换错误仍然返回 `Err`。
    ///
    /// 表达式引用无法解析时同样视为缺失。
    pub fn optional_value_with<T, C>(
        &self,
        name: &str,
        converter: &C,
    ) -> Result<Option<T>, ResolveError>
    where
        C: Converter<T> + ?Sized,
    {
        match self.value_with(name, &OptionalConverter::new(converter)) {
            Err(ResolveError::NotFound { .. }) => Ok(None),
            other => other,
        }
    }

    /// 以注册表中 `T` 的转换器执行可选语义的解析。
    pub fn optional_value<T: 'static>(&self, name: &str) -> Result<Option<T>, ResolveError> {
        let converter = self.converters.converter::<T>()?;
        self.optional_value_with(name, converter.as_ref())
    }

    /// 以元素转换器解析逗号分隔的集合，必需语义。
    pub fn values_with<T, C, E>(&self, name: &str, element: &E) -> Result<C, ResolveError>
    where
        C: FromIterator<T>,
        E: Converter<T> + ?Sized,
    {
        self.value_with(name, &CollectionConverter::<T, C, &E>::new(element))
    }

    /// 以注册表中 `T` 的转换器解析集合，必需语义。
    ///
    /// ```
    /// use spark_config::{MapSource, SparkConfig};
    ///
    /// let config = SparkConfig::builder()
    ///     .with_source(MapSource::new("app", [("ports", "80, 443")]))
    ///     .build();
    /// let ports: Vec<u16> = config.values("ports").unwrap();
    /// assert_eq!(ports, [80, 443]);
    /// ```
    pub fn values<T, C>(&self, name: &str) -> Result<C, ResolveError>
    where
        T: 'static,
        C: FromIterator<T>,
    {
        let element = self.converters.converter::<T>()?;
        self.values_with(name, element.as_ref())
    }

    /// 以元素转换器解析集合，可选语义。
    pub fn optional_values_with<T, C, E>(
        &self,
        name: &str,
        element: &E,
    ) -> Result<Option<C>, ResolveError>
    where
        C: FromIterator<T>,
        E: Converter<T> + ?Sized,
    {
        self.optional_value_with(name, &CollectionConverter::<T, C, &E>::new(element))
    }

    /// 以注册表中 `T` 的转换器解析集合，可选语义。
    pub fn optional_values<T, C>(&self, name: &str) -> Result<Option<C>, ResolveError>
    where
        T: 'static,
        C: FromIterator<T>,
    {
        let element = self.converters.converter::<T>()?;
        self.optional_values_with(name, element.as_ref())
    }

    /// 无状态的一次性转换；`None` 输入直接得到 `Ok(None)`。
    ///
    /// 转换失败时 [`ResolveError::Conversion`] 的属性名为空串。
    pub fn convert<T: 'static>(&self, value: Option<&str>) -> Result<Option<T>, ResolveError> {
        let Some(raw) = value else {
            return Ok(None);
        };
        let converter = self.converters.converter::<T>()?;
        converter
            .convert(raw)
            .map_err(|source| ResolveError::Conversion {
                name: String::new(),
                raw: raw.to_owned(),
                source,
            })
    }

    /// 追加属性源。
    ///
    /// # 契约（What）
    /// - 插入后整张列表重新排序，随后的查找立即可见；
    /// - 并发追加不会丢失任何一次插入，读者只会看到完整的已提交快照；
    /// - 同一实例重复追加返回 `false`。
    /// - 构建期的来源包装器不作用于此处追加的来源。
    pub fn add_source(&self, source: Arc<dyn PropertySource>) -> bool {
        self.sources.add(source)
    }

    /// 原始值是否等于 `expected`；`None` 表示期望属性缺失。
    pub fn raw_value_equals(&self, name: &str, expected: Option<&str>) -> bool {
        self.raw_value(name).as_deref() == expected
    }

    /// 所有来源已知属性名的有序并集。
    pub fn property_names(&self) -> Vec<String> {
        self.sources.property_names()
    }

    /// 当前来源列表快照，按解析顺序排列。
    pub fn sources(&self) -> SourceSnapshot {
        self.sources.snapshot()
    }

    /// 转换器注册表。
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// 拦截器链。
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.chain
    }

    /// 激活的 Profile，按声明顺序。
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }
}

impl fmt::Debug for SparkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparkConfig")
            .field("sources", &self.sources)
            .field("chain", &self.chain)
            .field("converters", &self.converters)
            .field("profiles", &self.profiles)
            .finish()
    }
}

const _: fn() = || {
    fn assert_send_sync<T: Send + Sync + 'static>() {}

    assert_send_sync::<SparkConfig>();
};
