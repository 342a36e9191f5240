//! Truthiness of iteratee verdicts.
//!
//! An iteratee may report any value as its verdict; the engine
//! only asks whether it counts as a match. Zero, empty, `false`
//! and absent values are falsy, everything else is truthy.

/// Interpret a value as a boolean match signal.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    #[inline]
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for () {
    #[inline]
    fn is_truthy(&self) -> bool {
        false
    }
}

macro_rules! int_truthy {
    ($($t:ty)*) => {
        $(
            impl Truthy for $t {
                #[inline]
                fn is_truthy(&self) -> bool { *self != 0 }
            }
        )*
    }
}

int_truthy! { i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize }

macro_rules! float_truthy {
    ($($t:ty)*) => {
        $(
            impl Truthy for $t {
                // NaN compares unequal to everything, so test it first.
                #[inline]
                fn is_truthy(&self) -> bool { !self.is_nan() && *self != 0.0 }
            }
        )*
    }
}

float_truthy! { f32 f64 }

impl Truthy for char {
    #[inline]
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Truthy for str {
    #[inline]
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    #[inline]
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for [T] {
    #[inline]
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    #[inline]
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    #[inline]
    fn is_truthy(&self) -> bool {
        self.as_ref().map_or(false, Truthy::is_truthy)
    }
}

impl<T: Truthy, E> Truthy for Result<T, E> {
    #[inline]
    fn is_truthy(&self) -> bool {
        self.as_ref().map_or(false, Truthy::is_truthy)
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    #[inline]
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Box<T> {
    #[inline]
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}
