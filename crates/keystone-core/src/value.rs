//! Typed access to a field's storage.
//!
//! A [`Slot`] is a mutable borrow of one field, tagged with the kind of value
//! it holds. The setter registry turns a slot into a string converter without
//! knowing anything else about the record the field lives on.

use std::time::Duration;

/// Storage-free description of a [`Slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `String`.
    Text,
    /// `bool`.
    Bool,
    /// `f32`.
    F32,
    /// `f64`.
    F64,
    /// `i8`.
    I8,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `isize`.
    Isize,
    /// `u8`.
    U8,
    /// `u16`.
    U16,
    /// `u32`.
    U32,
    /// `u64`.
    U64,
    /// `usize`.
    Usize,
    /// `std::time::Duration`.
    Duration,
    /// A growable sequence of values.
    Sequence,
    /// A type with no converter.
    Unsupported(&'static str),
}

impl Kind {
    /// Human readable name of the kind, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Bool => "bool",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::Duration => "Duration",
            Self::Sequence => "Vec",
            Self::Unsupported(name) => name,
        }
    }

    /// Returns `true` for kinds that convert from a single literal.
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Sequence | Self::Unsupported(_))
    }
}

/// A mutable borrow of one field's storage.
pub enum Slot<'a> {
    /// `String` storage.
    Text(&'a mut String),
    /// `bool` storage.
    Bool(&'a mut bool),
    /// `f32` storage.
    F32(&'a mut f32),
    /// `f64` storage.
    F64(&'a mut f64),
    /// `i8` storage.
    I8(&'a mut i8),
    /// `i16` storage.
    I16(&'a mut i16),
    /// `i32` storage.
    I32(&'a mut i32),
    /// `i64` storage.
    I64(&'a mut i64),
    /// `isize` storage.
    Isize(&'a mut isize),
    /// `u8` storage.
    U8(&'a mut u8),
    /// `u16` storage.
    U16(&'a mut u16),
    /// `u32` storage.
    U32(&'a mut u32),
    /// `u64` storage.
    U64(&'a mut u64),
    /// `usize` storage.
    Usize(&'a mut usize),
    /// `Duration` storage.
    Duration(&'a mut Duration),
    /// Sequence storage.
    Sequence(&'a mut dyn Sequence),
    /// A field whose type has no converter.
    Unsupported(&'static str),
}

impl Slot<'_> {
    /// Returns the kind of value this slot holds.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Text(_) => Kind::Text,
            Self::Bool(_) => Kind::Bool,
            Self::F32(_) => Kind::F32,
            Self::F64(_) => Kind::F64,
            Self::I8(_) => Kind::I8,
            Self::I16(_) => Kind::I16,
            Self::I32(_) => Kind::I32,
            Self::I64(_) => Kind::I64,
            Self::Isize(_) => Kind::Isize,
            Self::U8(_) => Kind::U8,
            Self::U16(_) => Kind::U16,
            Self::U32(_) => Kind::U32,
            Self::U64(_) => Kind::U64,
            Self::Usize(_) => Kind::Usize,
            Self::Duration(_) => Kind::Duration,
            Self::Sequence(_) => Kind::Sequence,
            Self::Unsupported(name) => Kind::Unsupported(*name),
        }
    }

    /// Name of the type behind the slot.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Sequence(seq) => seq.type_name(),
            other => other.kind().name(),
        }
    }
}

impl std::fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Slot").field(&self.type_name()).finish()
    }
}

/// A type whose storage can be exposed as a [`Slot`].
pub trait ConfigValue {
    /// Borrow the value's storage.
    fn slot(&mut self) -> Slot<'_>;
}

macro_rules! impl_config_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::$variant(self)
                }
            }
        )*
    };
}

impl_config_value! {
    String => Text,
    bool => Bool,
    f32 => F32,
    f64 => F64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    Duration => Duration,
}

impl<T: ConfigValue + Default> ConfigValue for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Sequence(self)
    }
}

/// Callback used by [`Sequence::fill`] to populate one element.
pub type FillElement<'f> =
    dyn FnMut(usize, Slot<'_>) -> Result<(), crate::ParseError> + 'f;

/// Type-erased access to a sequence field.
pub trait Sequence {
    /// Kind of the sequence's elements.
    fn element_kind(&self) -> Kind;

    /// Name of the sequence type.
    fn type_name(&self) -> &'static str;

    /// Replace the contents with `len` fresh elements, each populated by
    /// `fill`. The existing contents are kept if any element fails.
    fn fill(&mut self, len: usize, fill: &mut FillElement<'_>) -> Result<(), crate::ParseError>;
}

impl<T: ConfigValue + Default> Sequence for Vec<T> {
    fn element_kind(&self) -> Kind {
        T::default().slot().kind()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn fill(&mut self, len: usize, fill: &mut FillElement<'_>) -> Result<(), crate::ParseError> {
        let mut items = Vec::with_capacity(len);
        for index in 0..len {
            let mut item = T::default();
            fill(index, item.slot())?;
            items.push(item);
        }
        *self = items;
        Ok(())
    }
}
