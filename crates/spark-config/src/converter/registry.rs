use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

use super::builtin::{BoolConverter, DurationConverter, FromStrConverter, StringConverter};
use super::implicit::{ImplicitConverter, ImplicitDescriptor, ImplicitIdioms};
use super::Converter;
use crate::error::{ConversionError, ResolveError, RestoreError};

/// 显式注册未指定优先级时使用的值。
pub const DEFAULT_PRIORITY: i32 = 100;

/// 内置转换器的优先级，任何默认优先级的注册都会覆盖它们。
pub const BUILTIN_PRIORITY: i32 = 1;

type Erased = Box<dyn Any + Send + Sync>;

/// 同一类型的多个显式注册，按优先级降序依次尝试。
///
/// - 第一个返回 `Some` 的转换器胜出；返回 `None` 时继续尝试下一个；
/// - 第一个错误立即向上传播，不再尝试后续转换器。
struct Prioritized<T> {
    entries: Vec<(i32, Arc<dyn Converter<T>>)>,
}

impl<T> Prioritized<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 插入后保持优先级降序；同优先级时后注册者排在前面。
    fn insert(&mut self, priority: i32, converter: Arc<dyn Converter<T>>) {
        let position = self
            .entries
            .iter()
            .position(|(existing, _)| *existing <= priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, (priority, converter));
    }
}

impl<T> Clone for Prioritized<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Converter<T> for Prioritized<T> {
    fn convert(&self, value: &str) -> Result<Option<T>, ConversionError> {
        for (_, converter) in &self.entries {
            if let Some(converted) = converter.convert(value)? {
                return Ok(Some(converted));
            }
        }
        Ok(None)
    }

    fn describe(&self) -> Cow<'static, str> {
        let names: Vec<Cow<'static, str>> = self
            .entries
            .iter()
            .map(|(_, converter)| converter.describe())
            .collect();
        Cow::Owned(format!("prioritized[{}]", names.join(", ")))
    }
}

struct ExplicitSlot {
    type_name: &'static str,
    /// `Arc<Prioritized<T>>`
    converters: Erased,
}

/// 类型到转换器的注册表。
///
/// # 设计背景（Why）
/// - 解析门面只知道目标类型 `T`，需要一个按 `TypeId` 索引的中心来回答“用什么把字符串变成 `T`”；
/// - 注册表在构建期可变，交给 [`SparkConfig`](crate::SparkConfig) 后即只读，唯一的运行期写入是隐式转换器的记忆化缓存。
///
/// # 逻辑解析（How）
/// 1. 显式注册：同一类型的全部注册组成按优先级排列的组合转换器；
/// 2. 隐式推导：没有显式注册时，从该类型的 [`ImplicitIdioms`] 按探测顺序选出第一个可用习惯，
///    结果按 `TypeId` 缓存在 `DashMap` 中，并发探测只会留下一份；
/// 3. 以上皆无：返回 [`ResolveError::NoConverter`]。
///
/// # 契约说明（What）
/// - 显式注册永远优先于隐式推导；
/// - 同一类型重复调用 [`converter`](Self::converter) 得到行为一致的转换器，隐式转换器为同一实例；
/// - 内置转换器以 [`BUILTIN_PRIORITY`] 注册，可被任何更高优先级的注册覆盖。
pub struct ConverterRegistry {
    explicit: HashMap<TypeId, ExplicitSlot>,
    /// `ImplicitIdioms<T>`
    idioms: HashMap<TypeId, Erased>,
    /// `Arc<ImplicitConverter<T>>`
    implicit: DashMap<TypeId, Erased>,
}

macro_rules! register_from_str {
    ($registry:expr, $($ty:ty),+ $(,)?) => {
        $(
            $registry.register_with_priority::<$ty, _>(FromStrConverter::<$ty>::new(), BUILTIN_PRIORITY);
        )+
    };
}

impl ConverterRegistry {
    /// 预置内置转换器的注册表。
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_with_priority(StringConverter, BUILTIN_PRIORITY);
        registry.register_with_priority(BoolConverter, BUILTIN_PRIORITY);
        registry.register_with_priority(DurationConverter, BUILTIN_PRIORITY);
        register_from_str!(
            registry, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
            char, PathBuf, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr,
        );
        registry
    }

    /// 不含任何转换器的注册表。
    pub fn empty() -> Self {
        Self {
            explicit: HashMap::new(),
            idioms: HashMap::new(),
            implicit: DashMap::new(),
        }
    }

    /// 以 [`DEFAULT_PRIORITY`] 注册转换器。
    pub fn register<T, C>(&mut self, converter: C) -> &mut Self
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        self.register_with_priority(converter, DEFAULT_PRIORITY)
    }

    /// 以指定优先级注册转换器。
    pub fn register_with_priority<T, C>(&mut self, converter: C, priority: i32) -> &mut Self
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        self.register_shared(Arc::new(converter), priority)
    }

    /// 注册已共享的转换器实例。
    pub fn register_shared<T: 'static>(
        &mut self,
        converter: Arc<dyn Converter<T>>,
        priority: i32,
    ) -> &mut Self {
        let slot = self
            .explicit
            .entry(TypeId::of::<T>())
            .or_insert_with(|| ExplicitSlot {
                type_name: type_name::<T>(),
                converters: Box::new(Arc::new(Prioritized::<T>::new())),
            });
        if let Some(prioritized) = slot.converters.downcast_mut::<Arc<Prioritized<T>>>() {
            Arc::make_mut(prioritized).insert(priority, converter);
        }
        self
    }

    /// 登记类型的字符串构造能力表，供隐式推导使用。
    pub fn register_idioms<T: 'static>(&mut self, idioms: ImplicitIdioms<T>) -> &mut Self {
        let id = TypeId::of::<T>();
        self.idioms.insert(id, Box::new(idioms));
        self.implicit.remove(&id);
        self
    }

    /// 是否存在 `T` 的显式注册。
    pub fn has_explicit<T: 'static>(&self) -> bool {
        self.explicit.contains_key(&TypeId::of::<T>())
    }

    /// 已显式注册的类型名，按字典序排列。
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.explicit.values().map(|slot| slot.type_name).collect();
        names.sort_unstable();
        names
    }

    /// 获取 `T` 的转换器。
    ///
    /// # 契约（What）
    /// - 显式注册存在时返回其组合（单个注册时直接返回该转换器）；
    /// - 否则返回记忆化的隐式转换器；
    /// - 两者皆无时返回 [`ResolveError::NoConverter`]。
    pub fn converter<T: 'static>(&self) -> Result<Arc<dyn Converter<T>>, ResolveError> {
        if let Some(explicit) = self.explicit_converter::<T>() {
            return Ok(explicit);
        }
        if let Some(implicit) = self.implicit::<T>() {
            return Ok(implicit);
        }
        Err(ResolveError::NoConverter {
            type_name: type_name::<T>(),
        })
    }

    fn explicit_converter<T: 'static>(&self) -> Option<Arc<dyn Converter<T>>> {
        let slot = self.explicit.get(&TypeId::of::<T>())?;
        let prioritized = slot.converters.downcast_ref::<Arc<Prioritized<T>>>()?;
        match prioritized.entries.as_slice() {
            [(_, single)] => Some(Arc::clone(single)),
            _ => Some(Arc::clone(prioritized) as Arc<dyn Converter<T>>),
        }
    }

    /// 获取（必要时推导并缓存）`T` 的隐式转换器。
    ///
    /// - 未登记能力表或能力表为空时返回 `None`；
    /// - 并发首次推导时只有一份结果进入缓存，所有调用方最终拿到同一实例。
    pub fn implicit<T: 'static>(&self) -> Option<Arc<ImplicitConverter<T>>> {
        let id = TypeId::of::<T>();
        if let Some(cached) = self.cached_implicit::<T>(&id) {
            return Some(cached);
        }

        let idioms = self.idioms.get(&id)?.downcast_ref::<ImplicitIdioms<T>>()?;
        let (idiom, construct) = idioms.probe()?;
        let discovered = Arc::new(ImplicitConverter::new(idiom, construct));
        let entry = self
            .implicit
            .entry(id)
            .or_insert_with(|| Box::new(Arc::clone(&discovered)));
        let canonical = entry.downcast_ref::<Arc<ImplicitConverter<T>>>().cloned();
        drop(entry);
        tracing::debug!(
            target: "spark_config::converter",
            target_type = type_name::<T>(),
            idiom = idiom.as_str(),
            "implicit converter discovered"
        );
        canonical
    }

    fn cached_implicit<T: 'static>(&self, id: &TypeId) -> Option<Arc<ImplicitConverter<T>>> {
        let cached = self.implicit.get(id)?;
        cached.downcast_ref::<Arc<ImplicitConverter<T>>>().cloned()
    }

    /// 依据描述符重新推导隐式转换器。
    ///
    /// # 契约（What）
    /// - 描述符的类型名必须与 `T` 一致，否则返回 [`RestoreError::TypeMismatch`]；
    /// - `T` 的能力表必须仍然提供描述符记录的习惯，否则返回 [`RestoreError::MissingIdiom`]；
    /// - 恢复出的转换器与原转换器调用同一构造函数，行为一致。
    pub fn restore<T: 'static>(
        &self,
        descriptor: &ImplicitDescriptor,
    ) -> Result<Arc<ImplicitConverter<T>>, RestoreError> {
        let requested = type_name::<T>();
        if descriptor.type_name != requested {
            return Err(RestoreError::TypeMismatch {
                recorded: descriptor.type_name.clone(),
                requested,
            });
        }
        let missing = || RestoreError::MissingIdiom {
            type_name: requested,
            idiom: descriptor.idiom.as_str().to_owned(),
        };
        let idioms = self
            .idioms
            .get(&TypeId::of::<T>())
            .and_then(|erased| erased.downcast_ref::<ImplicitIdioms<T>>())
            .ok_or_else(missing)?;
        let construct = idioms.get(descriptor.idiom).ok_or_else(missing)?;
        Ok(Arc::new(ImplicitConverter::new(descriptor.idiom, construct)))
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("explicit", &self.registered_types())
            .field("idioms", &self.idioms.len())
            .field("implicit_cached", &self.implicit.len())
            .finish()
    }
}
