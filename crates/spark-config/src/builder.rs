use std::fmt;
use std::sync::Arc;

use crate::config::SparkConfig;
use crate::converter::{Converter, ConverterRegistry, DEFAULT_PRIORITY, Implicit, ImplicitIdioms};
use crate::interceptor::{
    ExpressionInterceptor, Interceptor, InterceptorChain, PROFILE_PROPERTY, ProfileInterceptor,
    SecretKeysInterceptor,
};
use crate::source::{PropertySource, SourceSet};

type SourceWrapper = Box<dyn Fn(Arc<dyn PropertySource>) -> Arc<dyn PropertySource> + Send + Sync>;

/// [`SparkConfig`] 的一次性装配器。
///
/// # 设计背景（Why）
/// - 来源、拦截器、转换器在构建时一次性确定，之后解析核心只读；
/// - “发现”到的组件（插件注册表、服务清单等外部机制给出的列表）与显式声明的组件分开登记，
///   只有调用 `add_discovered_*` 后才参与装配，调用方可以决定是否信任外部发现的结果。
///
/// # 逻辑解析（How）
/// 1. 汇总声明来源与（启用时）发现来源，依次套用来源包装器，构造 [`SourceSet`]；
/// 2. 确定激活的 Profile：构建器显式指定优先，否则读取来源中的 `spark.profile`；
/// 3. 组装默认拦截器（Profile、表达式、密钥屏蔽）与用户拦截器，按优先级排序成链；
/// 4. 以预置内置转换器的注册表为基础，依次套用用户注册。
///
/// # 契约说明（What）
/// - 默认拦截器仅在 [`add_default_interceptors`](Self::add_default_interceptors) 后加入；
///   显式指定 Profile 或密钥名称时，对应的拦截器无论如何都会加入；
/// - 来源包装器只作用于构建期来源，[`SparkConfig::add_source`] 追加的来源不经包装。
pub struct SparkConfigBuilder {
    sources: Vec<Arc<dyn PropertySource>>,
    discovered_sources: Vec<Arc<dyn PropertySource>>,
    add_discovered_sources: bool,
    interceptors: Vec<Arc<dyn Interceptor>>,
    discovered_interceptors: Vec<Arc<dyn Interceptor>>,
    add_discovered_interceptors: bool,
    add_default_interceptors: bool,
    wrappers: Vec<SourceWrapper>,
    profiles: Option<Vec<String>>,
    secret_keys: Vec<String>,
    converters: ConverterRegistry,
}

impl SparkConfigBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            discovered_sources: Vec::new(),
            add_discovered_sources: false,
            interceptors: Vec::new(),
            discovered_interceptors: Vec::new(),
            add_discovered_interceptors: false,
            add_default_interceptors: false,
            wrappers: Vec::new(),
            profiles: None,
            secret_keys: Vec::new(),
            converters: ConverterRegistry::new(),
        }
    }

    /// 声明一个属性源。
    pub fn with_source(self, source: impl PropertySource + 'static) -> Self {
        self.with_shared_source(Arc::new(source))
    }

    /// 声明一个已共享的属性源。
    pub fn with_shared_source(mut self, source: Arc<dyn PropertySource>) -> Self {
        self.sources.push(source);
        self
    }

    /// 批量声明属性源。
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Arc<dyn PropertySource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// 登记外部发现的属性源，需配合 [`add_discovered_sources`](Self::add_discovered_sources) 生效。
    pub fn with_discovered_sources(
        mut self,
        sources: impl IntoIterator<Item = Arc<dyn PropertySource>>,
    ) -> Self {
        self.discovered_sources.extend(sources);
        self
    }

    /// 让发现的属性源参与装配。
    pub fn add_discovered_sources(mut self) -> Self {
        self.add_discovered_sources = true;
        self
    }

    /// 声明一个拦截器。
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// 批量声明拦截器。
    pub fn with_interceptors(
        mut self,
        interceptors: impl IntoIterator<Item = Arc<dyn Interceptor>>,
    ) -> Self {
        self.interceptors.extend(interceptors);
        self
    }

    /// 登记外部发现的拦截器，需配合 [`add_discovered_interceptors`](Self::add_discovered_interceptors) 生效。
    pub fn with_discovered_interceptors(
        mut self,
        interceptors: impl IntoIterator<Item = Arc<dyn Interceptor>>,
    ) -> Self {
        self.discovered_interceptors.extend(interceptors);
        self
    }

    /// 让发现的拦截器参与装配。
    pub fn add_discovered_interceptors(mut self) -> Self {
        self.add_discovered_interceptors = true;
        self
    }

    /// 启用库内置的 Profile、表达式与密钥屏蔽拦截器。
    pub fn add_default_interceptors(mut self) -> Self {
        self.add_default_interceptors = true;
        self
    }

    /// 以默认优先级注册转换器。
    pub fn with_converter<T, C>(self, converter: C) -> Self
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        self.with_converter_priority(converter, DEFAULT_PRIORITY)
    }

    /// 以指定优先级注册转换器。
    pub fn with_converter_priority<T, C>(mut self, converter: C, priority: i32) -> Self
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        self.converters.register_with_priority(converter, priority);
        self
    }

    /// 登记实现了 [`Implicit`] 的类型。
    pub fn with_implicit<T: Implicit>(self) -> Self {
        self.with_idioms(T::idioms())
    }

    /// 直接登记某个类型的构造能力表。
    pub fn with_idioms<T: 'static>(mut self, idioms: ImplicitIdioms<T>) -> Self {
        self.converters.register_idioms(idioms);
        self
    }

    /// 为构建期属性源套用包装器，按登记顺序由内向外。
    pub fn with_wrapper<F>(mut self, wrapper: F) -> Self
    where
        F: Fn(Arc<dyn PropertySource>) -> Arc<dyn PropertySource> + Send + Sync + 'static,
    {
        self.wrappers.push(Box::new(wrapper));
        self
    }

    /// 激活单个 Profile，可多次调用，后者优先。
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profiles.get_or_insert_with(Vec::new).push(profile.into());
        self
    }

    /// 批量激活 Profile。
    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles
            .get_or_insert_with(Vec::new)
            .extend(profiles.into_iter().map(Into::into));
        self
    }

    /// 登记密钥名称模式，支持 `*` 与 `[*]` 通配。
    pub fn with_secret_keys<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secret_keys
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// 完成装配。
    pub fn build(self) -> SparkConfig {
        let Self {
            sources,
            discovered_sources,
            add_discovered_sources,
            mut interceptors,
            discovered_interceptors,
            add_discovered_interceptors,
            add_default_interceptors,
            wrappers,
            profiles,
            secret_keys,
            converters,
        } = self;

        let mut candidates = sources;
        if add_discovered_sources {
            candidates.extend(discovered_sources);
        }
        let wrapped: Vec<Arc<dyn PropertySource>> = candidates
            .into_iter()
            .map(|source| wrappers.iter().fold(source, |inner, wrap| wrap(inner)))
            .collect();
        let sources = Arc::new(SourceSet::new(wrapped));

        let explicit_profiles = profiles.is_some();
        let profiles = match profiles {
            Some(profiles) => profiles,
            None => configured_profiles(&sources),
        };

        if add_default_interceptors || explicit_profiles {
            interceptors.push(Arc::new(ProfileInterceptor::new(profiles.iter().cloned())));
        }
        if add_default_interceptors {
            interceptors.push(Arc::new(ExpressionInterceptor::new()));
        }
        if !secret_keys.is_empty() {
            interceptors.push(Arc::new(SecretKeysInterceptor::new(&secret_keys)));
        }
        let discovered = if add_discovered_interceptors {
            discovered_interceptors
        } else {
            Vec::new()
        };
        let chain = InterceptorChain::build(interceptors, discovered, Arc::clone(&sources));

        tracing::debug!(
            target: "spark_config::builder",
            sources = sources.len(),
            profiles = ?profiles,
            secret_keys = secret_keys.len(),
            "configuration built"
        );
        SparkConfig::assemble(sources, chain, converters, profiles)
    }
}

/// 从来源中读取 `spark.profile`，逗号分隔，忽略空项。
fn configured_profiles(sources: &SourceSet) -> Vec<String> {
    sources
        .value(PROFILE_PROPERTY)
        .map(|value| {
            value
                .value()
                .split(',')
                .map(str::trim)
                .filter(|profile| !profile.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

impl Default for SparkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SparkConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparkConfigBuilder")
            .field("sources", &self.sources.len())
            .field("discovered_sources", &self.discovered_sources.len())
            .field("interceptors", &self.interceptors.len())
            .field("discovered_interceptors", &self.discovered_interceptors.len())
            .field("add_default_interceptors", &self.add_default_interceptors)
            .field("wrappers", &self.wrappers.len())
            .field("profiles", &self.profiles)
            .field("secret_keys", &self.secret_keys)
            .finish_non_exhaustive()
    }
}
