use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{PropertySource, dedupe_sources, same_source, sort_sources};
use crate::value::ConfigValue;

/// 共享的有序属性源快照。
pub type SourceSnapshot = Arc<Vec<Arc<dyn PropertySource>>>;

/// 有序、去重的属性源聚合器。
///
/// # 设计动机（Why）
/// - 解析门面在任意线程上读取来源列表，而 `add_source` 可能在运行期并发追加新来源；
/// - 读路径必须无锁且永远看到完整、已排序的列表，不能出现“插入了一半”的中间态。
///
/// # 实现逻辑（How）
/// - 内部保存 `ArcSwap<Vec<Arc<dyn PropertySource>>>`，整张列表作为不可变快照发布；
/// - 追加时通过 `ArcSwap::rcu` 执行“读取当前快照 → 计算新排序快照 → 比较交换，冲突即重试”，
///   写者之间不会丢失插入，读者只会看到某个已提交的快照。
///
/// # 契约说明（What）
/// - 列表始终满足序数降序、同序数名称降序；
/// - 同一 `Arc` 实例只会出现一次；
/// - 每次成功追加后来源数量单调不减。
///
/// # 风险提示（Trade-offs）
/// - 每次追加复制整张列表，写成本为 O(n log n)；来源数量通常很小且写入极少，可以接受；
/// - 写者之间理论上可能饥饿，但写入频率低，实际不构成问题。
pub struct SourceSet {
    sources: ArcSwap<Vec<Arc<dyn PropertySource>>>,
}

impl SourceSet {
    /// 以构建期来源创建聚合器，完成去重与排序。
    pub fn new(mut sources: Vec<Arc<dyn PropertySource>>) -> Self {
        dedupe_sources(&mut sources);
        sort_sources(&mut sources);
        tracing::debug!(
            target: "spark_config::source",
            count = sources.len(),
            order = ?sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "property sources sorted"
        );
        Self {
            sources: ArcSwap::from_pointee(sources),
        }
    }

    /// 获取当前来源列表快照。
    #[inline]
    pub fn snapshot(&self) -> SourceSnapshot {
        self.sources.load_full()
    }

    /// 当前来源数量。
    pub fn len(&self) -> usize {
        self.sources.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.load().is_empty()
    }

    /// 追加一个来源并重新排序。
    ///
    /// # 契约（What）
    /// - **返回值**：来源被插入时返回 `true`；同一实例已存在时返回 `false`，列表保持不变；
    /// - **线程安全**：可与任意读者、写者并发调用，所有写入都会线性化生效。
    pub fn add(&self, source: Arc<dyn PropertySource>) -> bool {
        let mut inserted = false;
        self.sources.rcu(|current| {
            if current.iter().any(|existing| same_source(existing, &source)) {
                inserted = false;
                return Arc::clone(current);
            }
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&source));
            sort_sources(&mut next);
            inserted = true;
            Arc::new(next)
        });
        tracing::trace!(
            target: "spark_config::source",
            source = source.name(),
            ordinal = source.ordinal(),
            inserted,
            "property source added"
        );
        inserted
    }

    /// 按来源顺序返回第一个非空原始值。
    pub fn value(&self, name: &str) -> Option<ConfigValue> {
        let sources = self.sources.load();
        sources.iter().find_map(|source| {
            source
                .value(name)
                .map(|raw| ConfigValue::new(name, raw, source.name(), source.ordinal()))
        })
    }

    /// 所有来源已知属性名的有序并集。
    pub fn property_names(&self) -> Vec<String> {
        let sources = self.sources.load();
        let names: BTreeSet<String> = sources
            .iter()
            .flat_map(|source| source.property_names())
            .collect();
        names.into_iter().collect()
    }
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self.sources.load();
        f.debug_list()
            .entries(
                sources
                    .iter()
                    .map(|source| format!("{}@{}", source.name(), source.ordinal())),
            )
            .finish()
    }
}
