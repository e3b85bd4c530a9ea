//! The process orchestrator.
//!
//! [`process`] walks a record, builds one [`FieldParameter`] per resolvable
//! field, groups them by source and lookup key, and then hands each group to
//! its source. Failures are collected across the whole call; fields that
//! resolved keep their new values even when siblings fail.

use indexmap::IndexMap;

use crate::error::{ConfigError, ConfigErrors};
use crate::parameter::{FieldParameter, Parameters};
use crate::record::{Configurable, FieldDescriptor, Visitor};
use crate::setter::setter;
use crate::source::{Source, SourceSet};
use crate::value::Slot;

/// Populate `record` from `sources`.
///
/// An environment source with default settings is added when none of
/// `sources` uses the `env` tag key.
///
/// # Errors
///
/// Returns every failure collected during the call. Duplicate tag keys are
/// reported before the record is touched.
///
/// # Example
///
/// ```
/// use keystone_core::{process, ConfigField, Configurable, FieldDescriptor, Visitor};
///
/// #[derive(Default)]
/// struct Server {
///     port: u16,
/// }
///
/// impl Configurable for Server {
///     fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
///         static PORT: FieldDescriptor = FieldDescriptor::new(
///             "port",
///             &[("env", "KEYSTONE_DOC_UNSET_PORT"), ("default", "8080")],
///         );
///         self.port.accept(&PORT, visitor);
///     }
/// }
///
/// let mut server = Server::default();
/// process(&mut server, &[]).unwrap();
/// assert_eq!(server.port, 8080);
/// ```
pub fn process<C>(record: &mut C, sources: &[&dyn Source]) -> Result<(), ConfigErrors>
where
    C: Configurable + ?Sized,
{
    let sources = SourceSet::from_refs(sources)?;
    process_with(record, &sources)
}

/// Populate `record` from an assembled [`SourceSet`].
///
/// # Errors
///
/// Returns every failure collected during traversal and resolution.
pub fn process_with<C>(record: &mut C, sources: &SourceSet<'_>) -> Result<(), ConfigErrors>
where
    C: Configurable + ?Sized,
{
    let mut resolver = Resolver::new(sources.tag_keys().collect());
    record.visit(&mut resolver);

    let Resolver {
        mut groups,
        mut errors,
        ..
    } = resolver;

    for source in sources.iter() {
        let tag = source.tag_key();
        let parameters = match groups.swap_remove(tag) {
            Some(parameters) if !parameters.is_empty() => parameters,
            _ => continue,
        };
        tracing::debug!(source = %tag, keys = parameters.len(), "resolving source");
        errors.absorb(source.resolve(parameters));
    }

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "configuration processed with errors");
    }
    errors.into_result()
}

/// Traversal state for one call.
struct Resolver<'a, 't> {
    tag_keys: Vec<&'t str>,
    path: Vec<&'static str>,
    groups: IndexMap<&'t str, Parameters<'a>>,
    errors: ConfigErrors,
}

impl<'t> Resolver<'_, 't> {
    fn new(tag_keys: Vec<&'t str>) -> Self {
        Self {
            tag_keys,
            path: Vec::new(),
            groups: IndexMap::new(),
            errors: ConfigErrors::new(),
        }
    }

    fn path_of(&self, field: &FieldDescriptor) -> String {
        let mut path = String::new();
        for segment in &self.path {
            path.push_str(segment);
            path.push('.');
        }
        path.push_str(field.name);
        path
    }
}

impl<'a> Visitor<'a> for Resolver<'a, '_> {
    fn value(&mut self, field: &'static FieldDescriptor, slot: Slot<'a>) {
        let path = self.path_of(field);
        if field.is_ignored() {
            tracing::trace!(field = %path, "field ignored");
            return;
        }

        let set = match setter(slot) {
            Ok(set) => set,
            Err(e) => {
                self.errors
                    .push(ConfigError::unsupported_type(path, e.type_name));
                return;
            }
        };

        let mut tagged = self
            .tag_keys
            .iter()
            .filter_map(|&tag| field.lookup(tag).map(|key| (tag, key)));

        let Some((tag, key)) = tagged.next() else {
            if field.is_required() {
                self.errors.push(ConfigError::required_untagged(
                    path,
                    self.tag_keys.iter().copied(),
                ));
            }
            return;
        };

        let ignored: Vec<&str> = tagged.map(|(tag, _)| tag).collect();
        if !ignored.is_empty() {
            tracing::warn!(
                field = %path,
                source = %tag,
                ignored = ?ignored,
                "field is tagged for several sources, only the first configured one is used"
            );
        }

        let parameter = FieldParameter::new(path, tag, key, set)
            .with_required(field.is_required())
            .with_default(field.default_value());
        self.groups
            .entry(tag)
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .push(Box::new(parameter));
    }

    fn nested(&mut self, field: &'static FieldDescriptor, record: &'a mut dyn Configurable) {
        self.path.push(field.name);
        record.visit(self);
        self.path.pop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap};
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorKind;
    use crate::parameter::set_all;
    use crate::record::ConfigField;

    /// Serves values from a map and records the keys it was asked for.
    struct MapSource {
        tag: &'static str,
        values: HashMap<&'static str, &'static str>,
        requested: RefCell<Vec<String>>,
        fail: bool,
    }

    impl MapSource {
        fn new(tag: &'static str, values: &[(&'static str, &'static str)]) -> Self {
            Self {
                tag,
                values: values.iter().copied().collect(),
                requested: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        fn failing(tag: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(tag, &[])
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.borrow().clone()
        }
    }

    impl Source for MapSource {
        fn tag_key(&self) -> &str {
            self.tag
        }

        fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
            if self.fail {
                return Err(ConfigError::source_failure(self.tag, "backend unavailable").into());
            }
            let mut errors = ConfigErrors::new();
            for (key, mut params) in parameters {
                self.requested.borrow_mut().push(key.clone());
                let value = self.values.get(key.as_str()).copied().unwrap_or_default();
                set_all(&mut params, value, &mut errors);
            }
            errors.into_result()
        }
    }

    #[derive(Default)]
    struct Database {
        url: String,
        pool: u32,
    }

    impl Configurable for Database {
        fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
            static URL: FieldDescriptor =
                FieldDescriptor::new("url", &[("mock", "db_url"), ("required", "true")]);
            static POOL: FieldDescriptor =
                FieldDescriptor::new("pool", &[("mock", "db_pool"), ("default", "4")]);
            self.url.accept(&URL, visitor);
            self.pool.accept(&POOL, visitor);
        }
    }

    impl ConfigField for Database {
        fn accept<'a>(
            &'a mut self,
            field: &'static FieldDescriptor,
            visitor: &mut dyn Visitor<'a>,
        ) {
            visitor.nested(field, self);
        }
    }

    #[derive(Default)]
    struct App {
        name: String,
        port: u16,
        timeout: Duration,
        hosts: Vec<String>,
        database: Database,
    }

    impl Configurable for App {
        fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
            static NAME: FieldDescriptor = FieldDescriptor::new("name", &[("mock", "name")]);
            static PORT: FieldDescriptor =
                FieldDescriptor::new("port", &[("mock", "port"), ("default", "8080")]);
            static TIMEOUT: FieldDescriptor =
                FieldDescriptor::new("timeout", &[("mock", "timeout")]);
            static HOSTS: FieldDescriptor = FieldDescriptor::new("hosts", &[("mock", "hosts")]);
            static DATABASE: FieldDescriptor = FieldDescriptor::new("database", &[]);
            self.name.accept(&NAME, visitor);
            self.port.accept(&PORT, visitor);
            self.timeout.accept(&TIMEOUT, visitor);
            self.hosts.accept(&HOSTS, visitor);
            self.database.accept(&DATABASE, visitor);
        }
    }

    #[test]
    fn test_flat_and_nested_fields() {
        let mock = MapSource::new(
            "mock",
            &[
                ("name", "billing"),
                ("timeout", "1m30s"),
                ("hosts", "a,b,c"),
                ("db_url", "postgres://db"),
            ],
        );
        let mut app = App::default();
        process(&mut app, &[&mock]).unwrap();

        assert_eq!(app.name, "billing");
        assert_eq!(app.port, 8080);
        assert_eq!(app.timeout, Duration::from_secs(90));
        assert_eq!(app.hosts, vec!["a", "b", "c"]);
        assert_eq!(app.database.url, "postgres://db");
        assert_eq!(app.database.pool, 4);
        assert_eq!(
            mock.requested(),
            vec!["name", "port", "timeout", "hosts", "db_url", "db_pool"]
        );
    }

    #[test]
    fn test_nested_errors_use_dotted_path() {
        let mock = MapSource::new("mock", &[]);
        let mut app = App::default();
        let errors = process(&mut app, &[&mock]).unwrap_err();

        assert_eq!(errors.len(), 1);
        match errors.iter().next() {
            Some(ConfigError::RequiredMissing { field, key, tag }) => {
                assert_eq!(field, "database.url");
                assert_eq!(key, "db_url");
                assert_eq!(tag, "mock");
            }
            other => panic!("unexpected error {other:?}"),
        }
        // Siblings still resolve.
        assert_eq!(app.port, 8080);
        assert_eq!(app.database.pool, 4);
    }

    #[test]
    fn test_partial_application() {
        let mock = MapSource::new(
            "mock",
            &[("name", "billing"), ("port", "http"), ("db_url", "x")],
        );
        let mut app = App::default();
        let errors = process(&mut app, &[&mock]).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors.contains_kind(ErrorKind::ConversionFailure));
        assert_eq!(app.name, "billing");
        assert_eq!(app.port, 0);
    }

    #[test]
    fn test_duplicate_tags_fail_before_mutation() {
        let first = MapSource::new("mock", &[("name", "billing")]);
        let second = MapSource::new("mock", &[]);
        let mut app = App::default();
        let errors = process(&mut app, &[&first, &second]).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors.contains_kind(ErrorKind::DuplicateSourceTagKey));
        assert_eq!(app.name, "");
        assert!(first.requested().is_empty());
    }

    struct Polymorphic {
        inner: Box<dyn Configurable>,
        maybe: Option<Box<dyn Configurable>>,
    }

    impl Configurable for Polymorphic {
        fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
            static INNER: FieldDescriptor = FieldDescriptor::new("inner", &[]);
            static MAYBE: FieldDescriptor = FieldDescriptor::new("maybe", &[]);
            self.inner.accept(&INNER, visitor);
            self.maybe.accept(&MAYBE, visitor);
        }
    }

    #[test]
    fn test_polymorphic_fields_recurse() {
        let mock = MapSource::new("mock", &[("db_url", "postgres://db"), ("db_pool", "16")]);
        let mut record = Polymorphic {
            inner: Box::new(Database::default()),
            maybe: Some(Box::new(Database::default())),
        };
        process(&mut record, &[&mock]).unwrap();
        assert_eq!(mock.requested(), vec!["db_url", "db_pool"]);
    }

    #[test]
    fn test_empty_polymorphic_field_is_unsupported() {
        let mock = MapSource::new("mock", &[("db_url", "postgres://db")]);
        let mut record = Polymorphic {
            inner: Box::new(Database::default()),
            maybe: None,
        };
        let errors = process(&mut record, &[&mock]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_kind(ErrorKind::UnsupportedType));
    }

    #[derive(Default)]
    struct Mixed {
        skipped: u8,
        lookup: HashMap<String, String>,
        ordered: BTreeMap<String, u8>,
        token: String,
        level: u8,
    }

    impl Configurable for Mixed {
        fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
            static SKIPPED: FieldDescriptor =
                FieldDescriptor::new("skipped", &[("mock", "skipped"), ("ignore", "true")]);
            static LOOKUP: FieldDescriptor = FieldDescriptor::new("lookup", &[("mock", "lookup")]);
            static ORDERED: FieldDescriptor =
                FieldDescriptor::new("ordered", &[("ignore", "true")]);
            static TOKEN: FieldDescriptor = FieldDescriptor::new("token", &[("required", "true")]);
            static LEVEL: FieldDescriptor = FieldDescriptor::new("level", &[("mock", "level")]);
            self.skipped.accept(&SKIPPED, visitor);
            self.lookup.accept(&LOOKUP, visitor);
            self.ordered.accept(&ORDERED, visitor);
            self.token.accept(&TOKEN, visitor);
            self.level.accept(&LEVEL, visitor);
        }
    }

    #[test]
    fn test_traversal_errors_are_collected() {
        let mock = MapSource::new("mock", &[("skipped", "9"), ("level", "3")]);
        let mut record = Mixed::default();
        let errors = process(&mut record, &[&mock]).unwrap_err();

        let errors = errors.into_vec();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors[0],
            ConfigError::UnsupportedType { field, .. } if field == "lookup"
        ));
        match &errors[1] {
            ConfigError::RequiredUntagged { field, tag_keys } => {
                assert_eq!(field, "token");
                assert_eq!(tag_keys, &["mock", "env"]);
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert_eq!(record.skipped, 0);
        assert_eq!(record.level, 3);
        assert_eq!(mock.requested(), vec!["level"]);
    }

    struct MultiTagged {
        value: String,
    }

    impl Configurable for MultiTagged {
        fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
            static VALUE: FieldDescriptor =
                FieldDescriptor::new("value", &[("second", "b"), ("first", "a")]);
            self.value.accept(&VALUE, visitor);
        }
    }

    #[test]
    fn test_first_configured_source_wins() {
        let first = MapSource::new("first", &[("a", "from-first")]);
        let second = MapSource::new("second", &[("b", "from-second")]);
        let mut record = MultiTagged {
            value: String::new(),
        };

        process(&mut record, &[&first, &second]).unwrap();
        assert_eq!(record.value, "from-first");
        assert!(second.requested().is_empty());

        process(&mut record, &[&second, &first]).unwrap();
        assert_eq!(record.value, "from-second");
    }

    #[test]
    fn test_source_failure_does_not_stop_other_sources() {
        let broken = MapSource::failing("first");
        let working = MapSource::new("second", &[("b", "ok")]);

        struct TwoFields {
            a: String,
            b: String,
        }

        impl Configurable for TwoFields {
            fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
                static A: FieldDescriptor = FieldDescriptor::new("a", &[("first", "a")]);
                static B: FieldDescriptor = FieldDescriptor::new("b", &[("second", "b")]);
                self.a.accept(&A, visitor);
                self.b.accept(&B, visitor);
            }
        }

        let mut record = TwoFields {
            a: String::new(),
            b: String::new(),
        };
        let errors = process(&mut record, &[&broken, &working]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_kind(ErrorKind::SourceResolutionFailure));
        assert_eq!(record.a, "");
        assert_eq!(record.b, "ok");
    }

    #[test]
    fn test_sources_without_parameters_are_not_called() {
        let idle = MapSource::failing("idle");
        let mock = MapSource::new("mock", &[("name", "x"), ("db_url", "y")]);
        let mut app = App::default();
        process(&mut app, &[&idle, &mock]).unwrap();
        assert_eq!(app.name, "x");
    }

    #[test]
    fn test_process_with_reuses_source_set() {
        let mock = MapSource::new("mock", &[("name", "svc"), ("db_url", "db")]);
        let sources = SourceSet::from_refs(&[&mock]).unwrap();

        let mut first = App::default();
        let mut second = App::default();
        process_with(&mut first, &sources).unwrap();
        process_with(&mut second, &sources).unwrap();
        assert_eq!(first.name, "svc");
        assert_eq!(second.name, "svc");
        assert_eq!(mock.requested().len(), 12);
    }

    #[test]
    fn test_dyn_record() {
        let mock = MapSource::new("mock", &[("db_url", "db")]);
        let mut database = Database::default();
        let record: &mut dyn Configurable = &mut database;
        process(record, &[&mock]).unwrap();
        assert_eq!(database.url, "db");
    }
}
