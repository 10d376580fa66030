//! 属性名路径前缀树（KeyMap）。
//!
//! # 设计背景（Why）
//! - 配置映射、密钥掩码等场景需要为“属性名模式”挂载元数据，例如 `server.*.port`、`pool[*].name`；
//! - 查找时输入的是具体属性名（`server.http.port`、`pool[3].name`），需要在字面量与通配符之间做最具体匹配。
//!
//! # 逻辑解析（How）
//! - 属性名以 `.` 切分为段；段尾可携带 `[n]` 或 `[*]` 索引后缀，解析为独立的索引段；
//! - 每个节点持有字面量子节点表、一个可选的 `*` 子节点、一个可选的 `[*]` 子节点以及可选的根值；
//! - 查找逐段推进：优先走字面量分支，若该分支最终未能给出值，再回退到通配分支。
//!
//! # 契约说明（What）
//! - 空段（连续的 `..` 或开头的 `.`）是合法且独立的空字符串段；空路径指向根节点本身；
//! - 本层不做属性名语法校验，仅负责结构化存取。
//!
//! # 设计取舍（Trade-offs）
//! - 子节点使用 `BTreeMap`，牺牲少量写入性能换取 `Display` 输出稳定，便于断言与排障。

use std::collections::BTreeMap;
use std::fmt;

/// 解析后的单个路径段。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment<'a> {
    /// 普通字面量段，可为空字符串。
    Literal(&'a str),
    /// 单层通配符 `*`。
    Any,
    /// 具体索引 `[n]`，保存不含方括号的数字部分。
    Index(&'a str),
    /// 索引通配 `[*]`。
    AnyIndex,
}

/// 将完整属性名拆分为段序列。
fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    if path.is_empty() {
        return segments;
    }
    for raw in path.split('.') {
        parse_segment(raw, &mut segments);
    }
    segments
}

/// 解析单个以 `.` 分隔出的片段，展开其中的索引后缀。
///
/// - `foo[1][*]` 依次产出 `Literal("foo")`、`Index("1")`、`AnyIndex`；
/// - 方括号内既不是数字也不是 `*` 时，整段按字面量处理。
fn parse_segment<'a>(raw: &'a str, out: &mut Vec<Segment<'a>>) {
    if raw == "*" {
        out.push(Segment::Any);
        return;
    }

    let mut base = raw;
    let mut suffixes = Vec::new();
    while base.ends_with(']') {
        let Some(open) = base.rfind('[') else {
            break;
        };
        let inner = &base[open + 1..base.len() - 1];
        let suffix = if inner == "*" {
            Segment::AnyIndex
        } else if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
            Segment::Index(inner)
        } else {
            break;
        };
        suffixes.push(suffix);
        base = &base[..open];
    }

    if suffixes.is_empty() {
        out.push(Segment::Literal(raw));
        return;
    }
    match base {
        "" => {}
        "*" => out.push(Segment::Any),
        literal => out.push(Segment::Literal(literal)),
    }
    out.extend(suffixes.into_iter().rev());
}

/// 以属性名段为键的前缀树。
///
/// # 教案式说明
/// - **意图（Why）**：为带通配符、索引的属性名模式提供“最具体优先”的元数据查找；
/// - **逻辑（How）**：`find_or_add` 沿路径创建节点，`put_root_value` 在终点写值，
///   `find_root_value` 以“字面量优先、通配回退”的规则在每一层递归匹配；
/// - **契约（What）**：
///   - 空树只有一个无值根节点；
///   - 具体段在每一层都优先于通配段，更深的具体路径覆盖更浅的通配默认值；
///   - `[n]` 未命中时回退到 `[*]`。
pub struct KeyMap<V> {
    children: BTreeMap<String, KeyMap<V>>,
    any: Option<Box<KeyMap<V>>>,
    any_index: Option<Box<KeyMap<V>>>,
    root_value: Option<V>,
}

impl<V> KeyMap<V> {
    /// 创建空的前缀树。
    pub fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            any: None,
            any_index: None,
            root_value: None,
        }
    }

    /// 查找或创建 `path` 对应的节点，返回终点节点的可变引用。
    ///
    /// - 重复调用是幂等的：相同路径总是落到同一节点；
    /// - `path` 中可以包含 `*`、`[*]` 与 `[n]`，分别落入对应的通配或索引子节点。
    pub fn find_or_add(&mut self, path: &str) -> &mut KeyMap<V> {
        let segments = parse_path(path);
        self.find_or_add_parsed(&segments)
    }

    /// 以逐段形式查找或创建节点。
    ///
    /// 每个元素被视为一个完整段（不再按 `.` 切分），但仍会解析其中的索引后缀，
    /// 因而 `["root", "foo[*]"]` 与 `"root.foo[*]"` 等价，`["", "foo"]` 与 `".foo"` 等价。
    pub fn find_or_add_segments<I, S>(&mut self, segments: I) -> &mut KeyMap<V>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let owned: Vec<S> = segments.into_iter().collect();
        let mut parsed = Vec::with_capacity(owned.len());
        for segment in &owned {
            parse_segment(segment.as_ref(), &mut parsed);
        }
        self.find_or_add_parsed(&parsed)
    }

    fn find_or_add_parsed(&mut self, segments: &[Segment<'_>]) -> &mut KeyMap<V> {
        let mut node = self;
        for segment in segments {
            node = node.child_or_insert(*segment);
        }
        node
    }

    fn child_or_insert(&mut self, segment: Segment<'_>) -> &mut KeyMap<V> {
        match segment {
            Segment::Literal(name) => self
                .children
                .entry(name.to_owned())
                .or_insert_with(KeyMap::new),
            Segment::Index(index) => self
                .children
                .entry(format!("[{index}]"))
                .or_insert_with(KeyMap::new),
            Segment::Any => self.any.get_or_insert_with(|| Box::new(KeyMap::new())),
            Segment::AnyIndex => self
                .any_index
                .get_or_insert_with(|| Box::new(KeyMap::new())),
        }
    }

    /// 在当前节点写入值，返回被覆盖的旧值。
    pub fn put_root_value(&mut self, value: V) -> Option<V> {
        self.root_value.replace(value)
    }

    /// 当前节点自身存储的值。
    #[inline]
    pub fn root_value(&self) -> Option<&V> {
        self.root_value.as_ref()
    }

    /// 当前节点是否存有值。
    #[inline]
    pub fn has_root_value(&self) -> bool {
        self.root_value.is_some()
    }

    /// 节点既无值也无子节点时返回 `true`。
    pub fn is_empty(&self) -> bool {
        self.root_value.is_none()
            && self.children.is_empty()
            && self.any.is_none()
            && self.any_index.is_none()
    }

    /// 按具体属性名查找最匹配的值。
    ///
    /// # 契约（What）
    /// - **输入**：具体属性名，通常只含字面量与 `[n]` 段；出现的 `*`/`[*]` 只会精确命中同名通配节点；
    /// - **输出**：沿“字面量优先、通配回退”规则能到达的终点值；
    /// - 中间节点没有值不算失败，只有在路径终点仍无可达值时才返回 `None`。
    pub fn find_root_value(&self, path: &str) -> Option<&V> {
        let segments = parse_path(path);
        self.find_parsed(&segments)
    }

    /// 精确定位 `path` 对应的节点，不做通配回退。
    pub fn find(&self, path: &str) -> Option<&KeyMap<V>> {
        let mut node = self;
        for segment in parse_path(path) {
            node = match segment {
                Segment::Literal(name) => node.children.get(name)?,
                Segment::Index(index) => node.children.get(format!("[{index}]").as_str())?,
                Segment::Any => node.any.as_deref()?,
                Segment::AnyIndex => node.any_index.as_deref()?,
            };
        }
        Some(node)
    }

    fn find_parsed(&self, segments: &[Segment<'_>]) -> Option<&V> {
        let Some((head, rest)) = segments.split_first() else {
            return self.root_value.as_ref();
        };
        match *head {
            Segment::Literal(name) => self
                .children
                .get(name)
                .and_then(|child| child.find_parsed(rest))
                .or_else(|| self.any.as_deref().and_then(|any| any.find_parsed(rest))),
            Segment::Index(index) => self
                .children
                .get(format!("[{index}]").as_str())
                .and_then(|child| child.find_parsed(rest))
                .or_else(|| {
                    self.any_index
                        .as_deref()
                        .and_then(|any| any.find_parsed(rest))
                }),
            Segment::Any => self.any.as_deref().and_then(|any| any.find_parsed(rest)),
            Segment::AnyIndex => self
                .any_index
                .as_deref()
                .and_then(|any| any.find_parsed(rest)),
        }
    }
}

impl<V> Default for KeyMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for KeyMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMap")
            .field("root_value", &self.root_value)
            .field("children", &self.children)
            .field("any", &self.any)
            .field("any_index", &self.any_index)
            .finish()
    }
}

/// 诊断用的结构化输出：`KeyMap(value=v) {seg=>KeyMap(..) {..}, (any)=>..}`。
impl<V: fmt::Display> fmt::Display for KeyMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root_value {
            Some(value) => write!(f, "KeyMap(value={value}) {{")?,
            None => f.write_str("KeyMap(no value) {")?,
        }
        let mut first = true;
        let mut separator = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if first {
                first = false;
                Ok(())
            } else {
                f.write_str(", ")
            }
        };
        for (segment, child) in &self.children {
            separator(f)?;
            write!(f, "{segment}=>{child}")?;
        }
        if let Some(any) = &self.any {
            separator(f)?;
            write!(f, "(any)=>{any}")?;
        }
        if let Some(any_index) = &self.any_index {
            separator(f)?;
            write!(f, "[*]=>{any_index}")?;
        }
        f.write_str("}")
    }
}
