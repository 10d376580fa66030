use std::fmt::Display;
use std::sync::LazyLock;

use proptest::prelude::*;
use spark_config::SparkConfig;

static CONFIG: LazyLock<SparkConfig> = LazyLock::new(|| SparkConfig::builder().build());

/// 以 `Display` 输出再经内置转换器读回。
fn round_trip<T>(value: T) -> Option<T>
where
    T: Display + 'static,
{
    let text = value.to_string();
    CONFIG.convert::<T>(Some(&text)).expect("内置类型应能解析自身的文本形式")
}

macro_rules! round_trip_tests {
    ($($test:ident: $ty:ty => $strategy:expr;)*) => {
        proptest! {
            $(
                #[test]
                fn $test(value in $strategy) {
                    prop_assert_eq!(round_trip::<$ty>(value), Some(value));
                }
            )*
        }
    };
}

round_trip_tests! {
    prop_i8_round_trips: i8 => any::<i8>();
    prop_i16_round_trips: i16 => any::<i16>();
    prop_i32_round_trips: i32 => any::<i32>();
    prop_i64_round_trips: i64 => any::<i64>();
    prop_i128_round_trips: i128 => any::<i128>();
    prop_isize_round_trips: isize => any::<isize>();
    prop_u8_round_trips: u8 => any::<u8>();
    prop_u16_round_trips: u16 => any::<u16>();
    prop_u32_round_trips: u32 => any::<u32>();
    prop_u64_round_trips: u64 => any::<u64>();
    prop_u128_round_trips: u128 => any::<u128>();
    prop_usize_round_trips: usize => any::<usize>();
    prop_f32_round_trips: f32 => prop::num::f32::NORMAL | prop::num::f32::SUBNORMAL | prop::num::f32::ZERO;
    prop_f64_round_trips: f64 => prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO;
    prop_bool_round_trips: bool => any::<bool>();
}

#[test]
fn float_extremes_round_trip() {
    for value in [f64::MIN, f64::MAX, f64::MIN_POSITIVE, f64::EPSILON, -0.0] {
        assert_eq!(round_trip(value), Some(value));
    }
    for value in [f32::MIN, f32::MAX, f32::MIN_POSITIVE, f32::EPSILON] {
        assert_eq!(round_trip(value), Some(value));
    }
}
