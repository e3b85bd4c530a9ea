//! Record traversal.
//!
//! A record describes itself by walking its fields and handing each one to a
//! [`Visitor`] together with a static [`FieldDescriptor`]. The
//! `#[derive(Configurable)]` macro writes this walk; it can also be written by
//! hand:
//!
//! ```
//! use keystone_core::{ConfigField, Configurable, FieldDescriptor, Visitor};
//!
//! struct Server {
//!     port: u16,
//! }
//!
//! impl Configurable for Server {
//!     fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
//!         static PORT: FieldDescriptor =
//!             FieldDescriptor::new("port", &[("env", "PORT"), ("default", "8080")]);
//!         self.port.accept(&PORT, visitor);
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::value::{ConfigValue, Slot};

/// Annotation key holding a field's fallback literal.
pub const DEFAULT_KEY: &str = "default";

/// Annotation key marking a field as required.
pub const REQUIRED_KEY: &str = "required";

/// Annotation key excluding a field from resolution.
pub const IGNORE_KEY: &str = "ignore";

/// Static description of one record field.
///
/// `annotations` is the field's annotation table in declaration order: source
/// tag keys mapped to lookup keys, plus the reserved `default`, `required`
/// and `ignore` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as declared.
    pub name: &'static str,
    /// `(key, value)` annotation pairs.
    pub annotations: &'static [(&'static str, &'static str)],
}

impl FieldDescriptor {
    /// Create a descriptor.
    pub const fn new(
        name: &'static str,
        annotations: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { name, annotations }
    }

    /// Value of the first annotation with the given key.
    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.annotations
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Fallback literal, if one is configured. An empty literal counts as none.
    pub fn default_value(&self) -> Option<&'static str> {
        self.lookup(DEFAULT_KEY).filter(|v| !v.is_empty())
    }

    /// Whether the field is marked required. Invalid literals mean `false`.
    pub fn is_required(&self) -> bool {
        self.flag(REQUIRED_KEY)
    }

    /// Whether the field is excluded from resolution. Invalid literals mean `false`.
    pub fn is_ignored(&self) -> bool {
        self.flag(IGNORE_KEY)
    }

    fn flag(&self, key: &str) -> bool {
        self.lookup(key)
            .and_then(|v| crate::setter::parse_bool(v).ok())
            .unwrap_or(false)
    }
}

/// Receives the fields of a record during traversal.
///
/// `'a` is the lifetime of the borrow of the record being walked; slots and
/// nested records handed to the visitor live that long.
pub trait Visitor<'a> {
    /// A field backed by a value slot.
    fn value(&mut self, field: &'static FieldDescriptor, slot: Slot<'a>);

    /// A field holding another record.
    fn nested(&mut self, field: &'static FieldDescriptor, record: &'a mut dyn Configurable);
}

/// A structured record whose fields can be populated from sources.
pub trait Configurable {
    /// Hand every field to `visitor`, in declaration order.
    fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>);
}

/// A type that can appear as a field of a [`Configurable`] record.
pub trait ConfigField {
    /// Describe this field to `visitor`.
    fn accept<'a>(&'a mut self, field: &'static FieldDescriptor, visitor: &mut dyn Visitor<'a>);
}

macro_rules! impl_value_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigField for $ty {
                fn accept<'a>(
                    &'a mut self,
                    field: &'static FieldDescriptor,
                    visitor: &mut dyn Visitor<'a>,
                ) {
                    visitor.value(field, self.slot());
                }
            }
        )*
    };
}

impl_value_field!(
    String, bool, f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, Duration,
);

impl<T: ConfigValue + Default> ConfigField for Vec<T> {
    fn accept<'a>(&'a mut self, field: &'static FieldDescriptor, visitor: &mut dyn Visitor<'a>) {
        visitor.value(field, self.slot());
    }
}

impl ConfigField for Box<dyn Configurable> {
    fn accept<'a>(&'a mut self, field: &'static FieldDescriptor, visitor: &mut dyn Visitor<'a>) {
        visitor.nested(field, &mut **self);
    }
}

/// An empty polymorphic field has nothing to traverse and reaches the setter
/// registry as an unsupported value, like any other unconvertible type.
impl ConfigField for Option<Box<dyn Configurable>> {
    fn accept<'a>(&'a mut self, field: &'static FieldDescriptor, visitor: &mut dyn Visitor<'a>) {
        match self {
            Some(record) => visitor.nested(field, &mut **record),
            None => visitor.value(field, Slot::Unsupported("Option<Box<dyn Configurable>>")),
        }
    }
}

impl<K, V, S> ConfigField for HashMap<K, V, S> {
    fn accept<'a>(&'a mut self, field: &'static FieldDescriptor, visitor: &mut dyn Visitor<'a>) {
        visitor.value(field, Slot::Unsupported(std::any::type_name::<Self>()));
    }
}

impl<K, V> ConfigField for BTreeMap<K, V> {
    fn accept<'a>(&'a mut self, field: &'static FieldDescriptor, visitor: &mut dyn Visitor<'a>) {
        visitor.value(field, Slot::Unsupported(std::any::type_name::<Self>()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;

    static PORT: FieldDescriptor = FieldDescriptor::new(
        "port",
        &[
            ("env", "PORT"),
            ("ssm", "port"),
            ("default", "8080"),
            ("required", "true"),
        ],
    );

    #[derive(Default)]
    struct Recorder {
        values: Vec<(&'static str, Kind)>,
        nested: Vec<&'static str>,
    }

    impl<'a> Visitor<'a> for Recorder {
        fn value(&mut self, field: &'static FieldDescriptor, slot: Slot<'a>) {
            self.values.push((field.name, slot.kind()));
        }

        fn nested(&mut self, field: &'static FieldDescriptor, record: &'a mut dyn Configurable) {
            self.nested.push(field.name);
            record.visit(self);
        }
    }

    struct Inner {
        enabled: bool,
    }

    impl Configurable for Inner {
        fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
            static ENABLED: FieldDescriptor = FieldDescriptor::new("enabled", &[]);
            self.enabled.accept(&ENABLED, visitor);
        }
    }

    #[test]
    fn test_descriptor_lookup() {
        assert_eq!(PORT.lookup("env"), Some("PORT"));
        assert_eq!(PORT.lookup("ssm"), Some("port"));
        assert_eq!(PORT.lookup("vault"), None);
        assert_eq!(PORT.default_value(), Some("8080"));
        assert!(PORT.is_required());
        assert!(!PORT.is_ignored());
    }

    #[test]
    fn test_descriptor_flags_tolerate_bad_literals() {
        static FIELD: FieldDescriptor = FieldDescriptor::new(
            "f",
            &[("required", "yes please"), ("ignore", "T"), ("default", "")],
        );
        assert!(!FIELD.is_required());
        assert!(FIELD.is_ignored());
        assert_eq!(FIELD.default_value(), None);
    }

    #[test]
    fn test_polymorphic_fields() {
        static ANY: FieldDescriptor = FieldDescriptor::new("any", &[]);
        let mut recorder = Recorder::default();

        let mut boxed: Box<dyn Configurable> = Box::new(Inner { enabled: false });
        boxed.accept(&ANY, &mut recorder);

        let mut empty: Option<Box<dyn Configurable>> = None;
        empty.accept(&ANY, &mut recorder);

        assert_eq!(recorder.nested, vec!["any"]);
        assert_eq!(recorder.values.len(), 2);
        assert_eq!(recorder.values[0], ("enabled", Kind::Bool));
        assert!(matches!(recorder.values[1].1, Kind::Unsupported(_)));
    }

    #[test]
    fn test_maps_are_unsupported() {
        static MAP: FieldDescriptor = FieldDescriptor::new("map", &[]);
        let mut recorder = Recorder::default();
        let mut map: HashMap<String, String> = HashMap::new();
        map.accept(&MAP, &mut recorder);

        match recorder.values[0].1 {
            Kind::Unsupported(name) => assert!(name.contains("HashMap")),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
