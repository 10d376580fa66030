//! 拦截器链：位于调用方与属性源之间的责任链。
//!
//! # 设计背景（Why）
//! - Profile 覆盖、表达式展开、密钥屏蔽等横切行为都需要在“按名取值”前后介入，
//!   且彼此之间存在先后依赖（例如展开后的值不应绕过屏蔽）；
//! - 以优先级排序的固定管线表达这些阶段，用户拦截器可以选择看到展开前还是展开后的值。
//!
//! # 逻辑解析（How）
//! - 构建：声明列表与发现列表拼接后按优先级稳定降序排序，此后不可变；
//! - 调用：[`InterceptorChain::lookup`] 从下标 0 的阶段开始，每个阶段通过
//!   [`InterceptorContext::proceed`] 调用其后的所有阶段，末端阶段按来源顺序扫描 [`SourceSet`]；
//! - 每次调用的状态只存在于调用栈上（上下文仅持有链引用与下一阶段下标）。
//!
//! # 契约说明（What）
//! - 阶段可以透传、改名重定向、直接合成值、或屏蔽下游结果；
//! - 链本身不产生错误，唯一的错误是表达式阶段的 [`ExpansionError`]。

use std::any::type_name;
use std::borrow::Cow;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use crate::error::ExpansionError;
use crate::source::SourceSet;
use crate::value::ConfigValue;

mod expression;
mod profile;
pub mod secret;

pub use expression::{
    ExpressionInterceptor, MAX_EXPANSION_DEPTH, MAX_EXPANSION_STEPS, without_expansion,
};
pub use profile::{PROFILE_PROPERTY, ProfileInterceptor};
pub use secret::SecretKeysInterceptor;

/// 未显式指定时的拦截器优先级。
pub const DEFAULT_PRIORITY: i32 = 100;

/// 库内置拦截器的优先级基准，高于所有默认优先级的用户拦截器。
pub const LIBRARY_PRIORITY: i32 = 3000;

/// 拦截阶段的返回类型。
pub type InterceptResult = Result<Option<ConfigValue>, ExpansionError>;

/// 拦截器契约。
///
/// # 契约说明（What）
/// - `intercept`：处理一次按名查找；调用 `ctx.proceed(..)` 将请求交给更靠近属性源的阶段；
/// - `priority`：数值越大越靠外，越先看到请求、越后看到结果；
/// - 实现必须 `Send + Sync` 且不保存单次调用的可变状态。
pub trait Interceptor: Send + Sync {
    /// 处理一次查找。
    fn intercept(&self, ctx: &InterceptorContext<'_>, name: &str) -> InterceptResult;

    /// 优先级。
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// 诊断名称。
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(type_name::<Self>())
    }
}

/// 单次调用中某个阶段看到的“剩余链”。
#[derive(Clone, Copy)]
pub struct InterceptorContext<'a> {
    chain: &'a InterceptorChain,
    next: usize,
}

impl InterceptorContext<'_> {
    /// 把查找交给下一个阶段；末端阶段查询属性源。
    #[inline]
    pub fn proceed(&self, name: &str) -> InterceptResult {
        self.chain.invoke(self.next, name)
    }
}

impl fmt::Debug for InterceptorContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorContext")
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

/// 构建完成、不可变的拦截器链。
pub struct InterceptorChain {
    stages: Vec<Arc<dyn Interceptor>>,
    sources: Arc<SourceSet>,
}

impl InterceptorChain {
    /// 拼接声明与发现的拦截器，按优先级稳定降序排列。
    pub fn build(
        declared: Vec<Arc<dyn Interceptor>>,
        discovered: Vec<Arc<dyn Interceptor>>,
        sources: Arc<SourceSet>,
    ) -> Self {
        let mut stages = declared;
        stages.extend(discovered);
        stages.sort_by_key(|stage| Reverse(stage.priority()));
        tracing::debug!(
            target: "spark_config::interceptor",
            order = ?stages
                .iter()
                .map(|stage| format!("{}@{}", stage.name(), stage.priority()))
                .collect::<Vec<_>>(),
            "interceptor chain built"
        );
        Self { stages, sources }
    }

    /// 从最外层阶段开始查找。
    pub fn lookup(&self, name: &str) -> InterceptResult {
        self.invoke(0, name)
    }

    fn invoke(&self, index: usize, name: &str) -> InterceptResult {
        match self.stages.get(index) {
            Some(stage) => {
                let ctx = InterceptorContext {
                    chain: self,
                    next: index + 1,
                };
                stage.intercept(&ctx, name)
            }
            None => Ok(self.sources.value(name)),
        }
    }

    /// 阶段名称与优先级，按执行顺序。
    pub fn stages(&self) -> Vec<(Cow<'static, str>, i32)> {
        self.stages
            .iter()
            .map(|stage| (stage.name(), stage.priority()))
            .collect()
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("stages", &self.stages())
            .finish_non_exhaustive()
    }
}

/// 覆盖内层拦截器优先级的包装，参见 [`with_priority`]。
pub struct WithPriority<I> {
    inner: I,
    priority: i32,
}

/// 以指定优先级注册已有拦截器。
pub fn with_priority<I: Interceptor>(inner: I, priority: i32) -> WithPriority<I> {
    WithPriority { inner, priority }
}

impl<I: Interceptor> Interceptor for WithPriority<I> {
    fn intercept(&self, ctx: &InterceptorContext<'_>, name: &str) -> InterceptResult {
        self.inner.intercept(ctx, name)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> Cow<'static, str> {
        self.inner.name()
    }
}

/// 由闭包实现的拦截器，参见 [`from_fn`]。
pub struct FnInterceptor<F> {
    name: Cow<'static, str>,
    priority: i32,
    intercept: F,
}

/// 以闭包构造拦截器。
pub fn from_fn<F>(name: impl Into<Cow<'static, str>>, priority: i32, intercept: F) -> FnInterceptor<F>
where
    F: Fn(&InterceptorContext<'_>, &str) -> InterceptResult + Send + Sync,
{
    FnInterceptor {
        name: name.into(),
        priority,
        intercept,
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&InterceptorContext<'_>, &str) -> InterceptResult + Send + Sync,
{
    fn intercept(&self, ctx: &InterceptorContext<'_>, name: &str) -> InterceptResult {
        (self.intercept)(ctx, name)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }
}
