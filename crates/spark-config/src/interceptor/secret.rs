//! 密钥屏蔽阶段与当前线程的解锁作用域。

use std::borrow::Cow;
use std::cell::Cell;

use super::{InterceptResult, Interceptor, InterceptorContext, LIBRARY_PRIORITY};
use crate::key_map::KeyMap;

thread_local! {
    static UNLOCKED_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct UnlockGuard;

impl UnlockGuard {
    fn enter() -> Self {
        UNLOCKED_DEPTH.with(|depth| depth.set(depth.get() + 1));
        UnlockGuard
    }
}

impl Drop for UnlockGuard {
    fn drop(&mut self) {
        UNLOCKED_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// 在当前线程上解锁密钥并执行 `f`。
///
/// - 只影响调用线程，其它线程上的查找仍然被屏蔽；
/// - 可嵌套；`f` 恐慌时解锁状态同样被撤销。
///
/// ```
/// use spark_config::{MapSource, SparkConfig, secrets};
///
/// let config = SparkConfig::builder()
///     .with_source(MapSource::new("app", [("db.password", "s3cr3t")]))
///     .with_secret_keys(["db.password"])
///     .build();
/// assert_eq!(config.raw_value("db.password"), None);
/// assert_eq!(
///     secrets::unlocked(|| config.raw_value("db.password")).as_deref(),
///     Some("s3cr3t")
/// );
/// ```
pub fn unlocked<R>(f: impl FnOnce() -> R) -> R {
    let _guard = UnlockGuard::enter();
    f()
}

/// 当前线程上密钥是否处于锁定状态。
pub fn is_locked() -> bool {
    UNLOCKED_DEPTH.with(|depth| depth.get() == 0)
}

/// 密钥屏蔽阶段。
///
/// # 设计背景（Why）
/// - 口令、令牌等属性不应在诊断输出、属性枚举或误用的查找中泄露；
/// - 真正需要读取的代码路径显式进入 [`unlocked`] 作用域。
///
/// # 契约说明（What）
/// - 密钥名称模式存放在 [`KeyMap`] 中，支持 `*` 与 `[*]` 通配；
/// - 锁定状态下，匹配的名称一律返回缺失，且不会调用下游阶段；
/// - 位于表达式阶段之内、Profile 阶段之外：`${..}` 引用同样经过屏蔽，锁定时表现为无法解析的引用；
///   `%profile.name` 形式的名称按去掉 Profile 前缀后的名称匹配。
#[derive(Debug)]
pub struct SecretKeysInterceptor {
    secrets: KeyMap<()>,
}

impl SecretKeysInterceptor {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut secrets = KeyMap::new();
        for pattern in patterns {
            secrets.find_or_add(pattern.as_ref()).put_root_value(());
        }
        Self { secrets }
    }

    /// `name` 是否被登记为密钥。
    pub fn is_secret(&self, name: &str) -> bool {
        let unqualified = name
            .strip_prefix('%')
            .and_then(|rest| rest.split_once('.'))
            .map_or(name, |(_, rest)| rest);
        self.secrets.find_root_value(unqualified).is_some()
    }
}

impl Interceptor for SecretKeysInterceptor {
    fn intercept(&self, ctx: &InterceptorContext<'_>, name: &str) -> InterceptResult {
        if is_locked() && self.is_secret(name) {
            return Ok(None);
        }
        ctx.proceed(name)
    }

    fn priority(&self) -> i32 {
        LIBRARY_PRIORITY + 700
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("secret-keys")
    }
}
