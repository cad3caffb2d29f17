//! Helpers that are not tied to any one model

/// Strings accepted as true, compared case-insensitively
pub const TRUTHY_STRINGS: &[&str] = &["true", "t", "yes", "y", "o", "on", "1"];

/// Values that can be judged truthy
pub trait Truthy {
    /// Whether this value indicates truth
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        let lowered = self.to_lowercase();
        TRUTHY_STRINGS.contains(&lowered.as_str())
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        self.as_str().is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(|value| value.is_truthy())
    }
}

macro_rules! impl_truthy_for_numbers {
    ($($t:ty),*) => {
        $(
            impl Truthy for $t {
                fn is_truthy(&self) -> bool {
                    *self != (0 as $t)
                }
            }
        )*
    };
}

impl_truthy_for_numbers!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Truthy for serde_json::Value {
    fn is_truthy(&self) -> bool {
        use serde_json::Value;
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => s.is_truthy(),
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }
}

/// Determine whether a value indicates truth
///
/// Strings are true when they are one of `true`, `t`, `yes`, `y`, `o`,
/// `on` or `1` in any case. `None` is false, numbers are true when
/// non-zero.
pub fn is_true<T: Truthy + ?Sized>(value: &T) -> bool {
    value.is_truthy()
}
