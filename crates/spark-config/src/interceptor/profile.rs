use std::borrow::Cow;

use super::{InterceptResult, Interceptor, InterceptorContext, LIBRARY_PRIORITY};

/// 未在构建器上指定 Profile 时读取的属性名。
pub const PROFILE_PROPERTY: &str = "spark.profile";

/// Profile 覆盖阶段。
///
/// # 设计背景（Why）
/// - 同一份配置需要在 `dev`、`test`、`prod` 等环境下给出不同取值，
///   约定以 `%<profile>.<name>` 书写环境限定的变体；
///
/// # 逻辑解析（How）
/// - 对每个请求先按激活顺序的逆序查询 `%<profile>.<name>`，命中即返回；
/// - 全部未命中时查询原始名称；
/// - 已经以 `%` 开头的名称视为显式限定名，直接透传。
///
/// # 契约说明（What）
/// - 激活列表中靠后的 Profile 优先级更高（“最后者胜”）；
/// - 返回值的 `name` 为实际命中的属性名，便于诊断。
#[derive(Clone, Debug)]
pub struct ProfileInterceptor {
    /// 查找顺序，已按“最后者胜”反转。
    lookup_order: Vec<String>,
}

impl ProfileInterceptor {
    /// 以激活顺序构造。
    pub fn new<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lookup_order: Vec<String> = profiles
            .into_iter()
            .map(Into::into)
            .filter(|profile| !profile.is_empty())
            .collect();
        lookup_order.reverse();
        Self { lookup_order }
    }

    /// 解析逗号分隔的 Profile 列表，例如 `common,dev`。
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim))
    }

    /// 按查找优先级排列的 Profile。
    pub fn lookup_order(&self) -> &[String] {
        &self.lookup_order
    }
}

impl Interceptor for ProfileInterceptor {
    fn intercept(&self, ctx: &InterceptorContext<'_>, name: &str) -> InterceptResult {
        if !name.starts_with('%') {
            for profile in &self.lookup_order {
                if let Some(value) = ctx.proceed(&format!("%{profile}.{name}"))? {
                    return Ok(Some(value));
                }
            }
        }
        ctx.proceed(name)
    }

    fn priority(&self) -> i32 {
        LIBRARY_PRIORITY + 600
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("profile")
    }
}
