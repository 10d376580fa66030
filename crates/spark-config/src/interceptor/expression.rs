use std::borrow::Cow;
use std::cell::Cell;

use super::{InterceptResult, Interceptor, InterceptorContext, LIBRARY_PRIORITY};
use crate::error::ExpansionError;

/// 嵌套或循环引用允许的最大展开深度。
pub const MAX_EXPANSION_DEPTH: usize = 32;

/// 单次展开允许解析的引用总数，限制 `${a}${a}` 式扇出带来的指数级查找。
pub const MAX_EXPANSION_STEPS: usize = 1024;

thread_local! {
    static EXPANSION_SUSPENDED: Cell<usize> = const { Cell::new(0) };
}

struct SuspendGuard;

impl SuspendGuard {
    fn enter() -> Self {
        EXPANSION_SUSPENDED.with(|depth| depth.set(depth.get() + 1));
        SuspendGuard
    }
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        EXPANSION_SUSPENDED.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// 在当前线程上暂停表达式展开并执行 `f`。
///
/// 用于需要读取 `${..}` 原文的场景（例如诊断或重新导出配置）；可嵌套，`f` 恐慌时同样恢复。
pub fn without_expansion<R>(f: impl FnOnce() -> R) -> R {
    let _guard = SuspendGuard::enter();
    f()
}

fn expansion_suspended() -> bool {
    EXPANSION_SUSPENDED.with(|depth| depth.get() > 0)
}

/// 属性表达式展开阶段。
///
/// # 设计背景（Why）
/// - 配置值经常引用其它属性，例如 `url=http://${host}:${port:8080}`；
/// - 引用通过链的剩余部分解析，因此同样享受 Profile 覆盖与用户拦截器。
///
/// # 逻辑解析（How）
/// - `${key}` 替换为 `key` 的值，`${key:default}` 在 `key` 缺失时使用 `default`；
/// - 引用名、默认值以及取到的值都会继续递归展开，支持 `${${prefix}.port}` 之类的嵌套；
/// - `$${` 与 `\${` 输出字面量 `${`；没有闭合括号的 `${` 原样保留。
///
/// # 契约说明（What）
/// - 引用无法解析且无默认值时返回 [`ExpansionError`]，解析门面会将其报告为被查询属性的“未找到”；
/// - 递归深度超过上限（通常意味着循环引用）时返回 `depth_exceeded` 为真的 [`ExpansionError`]；
/// - 一次展开解析的引用总数超过 [`MAX_EXPANSION_STEPS`] 时同样返回 `depth_exceeded` 为真的错误。
#[derive(Clone, Debug)]
pub struct ExpressionInterceptor {
    max_depth: usize,
    max_steps: usize,
}

impl ExpressionInterceptor {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_EXPANSION_DEPTH,
            max_steps: MAX_EXPANSION_STEPS,
        }
    }

    /// 调整深度上限。
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 调整单次展开的引用总数上限。
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn expand(
        &self,
        ctx: &InterceptorContext<'_>,
        input: &str,
        depth: usize,
        remaining: &mut usize,
    ) -> Result<String, ExpansionError> {
        let bytes = input.as_bytes();
        let mut output = String::with_capacity(input.len());
        let mut literal_start = 0;
        let mut index = 0;
        while index < bytes.len() {
            let rest = &bytes[index..];
            if rest.starts_with(b"$${") || rest.starts_with(b"\\${") {
                output.push_str(&input[literal_start..index]);
                output.push_str("${");
                index += 3;
                literal_start = index;
                continue;
            }
            if rest.starts_with(b"${") {
                let Some(close) = matching_brace(bytes, index + 2) else {
                    break;
                };
                output.push_str(&input[literal_start..index]);
                output.push_str(&self.resolve(ctx, &input[index + 2..close], depth, remaining)?);
                index = close + 1;
                literal_start = index;
                continue;
            }
            index += 1;
        }
        output.push_str(&input[literal_start..]);
        Ok(output)
    }

    fn resolve(
        &self,
        ctx: &InterceptorContext<'_>,
        expression: &str,
        depth: usize,
        remaining: &mut usize,
    ) -> Result<String, ExpansionError> {
        if depth >= self.max_depth || *remaining == 0 {
            return Err(ExpansionError::too_deep(expression));
        }
        *remaining -= 1;
        let (key_expression, default) = split_default(expression);
        let key = self.expand(ctx, key_expression, depth + 1, remaining)?;
        match ctx.proceed(&key)? {
            Some(value) => self.expand(ctx, value.value(), depth + 1, remaining),
            None => match default {
                Some(default) => self.expand(ctx, default, depth + 1, remaining),
                None => Err(ExpansionError::unresolved(key)),
            },
        }
    }
}

impl Default for ExpressionInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interceptor for ExpressionInterceptor {
    fn intercept(&self, ctx: &InterceptorContext<'_>, name: &str) -> InterceptResult {
        let Some(value) = ctx.proceed(name)? else {
            return Ok(None);
        };
        if expansion_suspended() || !value.value().contains("${") {
            return Ok(Some(value));
        }
        let mut remaining = self.max_steps;
        let expanded = self.expand(ctx, value.value(), 0, &mut remaining)?;
        Ok(Some(value.with_value(expanded)))
    }

    fn priority(&self) -> i32 {
        LIBRARY_PRIORITY + 800
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("expression")
    }
}

/// 从 `start`（`${` 之后）开始寻找与之配对的 `}`，考虑嵌套。
fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 1_usize;
    let mut index = start;
    while index < bytes.len() {
        if bytes[index..].starts_with(b"${") {
            depth += 1;
            index += 2;
            continue;
        }
        if bytes[index] == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
        index += 1;
    }
    None
}

/// 在顶层（不在嵌套 `${..}` 内）的第一个 `:` 处拆分引用名与默认值。
fn split_default(expression: &str) -> (&str, Option<&str>) {
    let bytes = expression.as_bytes();
    let mut nesting = 0_usize;
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index..].starts_with(b"${") {
            nesting += 1;
            index += 2;
            continue;
        }
        match bytes[index] {
            b'}' => nesting = nesting.saturating_sub(1),
            b':' if nesting == 0 => {
                return (&expression[..index], Some(&expression[index + 1..]));
            }
            _ => {}
        }
        index += 1;
    }
    (expression, None)
}
