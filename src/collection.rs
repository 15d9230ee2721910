//! Identity-keyed object collections and multi-source reading.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{
    MultiSourceError, NagiosError, NagiosResult, SourceFailure, ValidationError,
};
use crate::identity::ObjectId;
use crate::object::ConfigObject;
use crate::parse::{pump, ObjectReader, ObjectStream, Pump, ReaderConfig};

/// Objects keyed by identity.
///
/// Every object in the map carries an identity equal to its key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, ConfigObject>")]
pub struct ObjectMap(HashMap<ObjectId, ConfigObject>);

impl ObjectMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Inserts an object under its identity.
    pub fn insert(&mut self, obj: ConfigObject) -> Result<(), ValidationError> {
        let id = identity_of(&obj)?;
        if self.0.contains_key(&id) {
            return Err(ValidationError::DuplicateIdentity { id });
        }
        self.0.insert(id, obj);
        Ok(())
    }

    /// Inserts an object, returning the one it replaced.
    pub fn replace(&mut self, obj: ConfigObject) -> Result<Option<ConfigObject>, ValidationError> {
        let id = identity_of(&obj)?;
        Ok(self.0.insert(id, obj))
    }

    /// Looks up an object by identity.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&ConfigObject> {
        self.0.get(id)
    }

    /// Looks up an object by the hyphenated form of its identity.
    pub fn get_str(&self, id: &str) -> Result<Option<&ConfigObject>, ValidationError> {
        Ok(self.0.get(&ObjectId::parse_str(id)?))
    }

    /// Mutable lookup by identity.
    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut ConfigObject> {
        self.0.get_mut(id)
    }

    /// Removes an object by identity.
    pub fn remove(&mut self, id: &ObjectId) -> Option<ConfigObject> {
        self.0.remove(id)
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over identity/object pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ConfigObject)> {
        self.0.iter()
    }

    /// Iterates over objects in arbitrary order.
    pub fn values(&self) -> impl Iterator<Item = &ConfigObject> {
        self.0.values()
    }

    /// Moves every object of `other` into this map.
    ///
    /// Stops at the first identity already present here; objects moved
    /// before that stay moved.
    pub fn extend_from(&mut self, other: Self) -> Result<(), ValidationError> {
        for obj in other.0.into_values() {
            self.insert(obj)?;
        }
        Ok(())
    }

    /// Groups objects by partition key.
    ///
    /// Each group is ordered by kind, then name, then identity, so the same
    /// map always renders the same way.
    #[must_use]
    pub fn split_by_partition(&self) -> BTreeMap<&str, Vec<&ConfigObject>> {
        let mut groups: BTreeMap<&str, Vec<&ConfigObject>> = BTreeMap::new();
        for obj in self.0.values() {
            groups.entry(obj.partition_key.as_str()).or_default().push(obj);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| {
                a.kind()
                    .cmp(&b.kind())
                    .then_with(|| a.name().cmp(&b.name()))
                    .then_with(|| a.id().cmp(&b.id()))
            });
        }
        groups
    }

    /// Objects where every key in `keys` is set and matches `rx`.
    #[must_use]
    pub fn filter_matching<S: AsRef<str>>(&self, rx: &Regex, keys: &[S]) -> Vec<&ConfigObject> {
        self.0.values().filter(|o| o.matches_keys(rx, keys)).collect()
    }

    /// Objects with at least one value matching `rx`.
    #[must_use]
    pub fn filter_any(&self, rx: &Regex) -> Vec<&ConfigObject> {
        self.0.values().filter(|o| o.matches_any(rx)).collect()
    }
}

fn identity_of(obj: &ConfigObject) -> Result<ObjectId, ValidationError> {
    obj.id()
        .ok_or(ValidationError::MissingIdentity { kind: obj.kind() })
}

impl Serialize for ObjectMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl TryFrom<HashMap<String, ConfigObject>> for ObjectMap {
    type Error = ValidationError;

    fn try_from(raw: HashMap<String, ConfigObject>) -> Result<Self, Self::Error> {
        let mut map = Self::new();
        for (key, mut obj) in raw {
            let id = ObjectId::parse_str(&key)?;
            let carried = obj.ensure_id(|| id);
            if carried != id {
                return Err(ValidationError::InvalidIdentity {
                    value: key,
                    reason: format!("object carries identity {carried}"),
                });
            }
            map.insert(obj)?;
        }
        Ok(map)
    }
}

impl IntoIterator for ObjectMap {
    type Item = (ObjectId, ConfigObject);
    type IntoIter = std::collections::hash_map::IntoIter<ObjectId, ConfigObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

enum Source {
    Reader {
        label: String,
        reader: Box<dyn Read + Send>,
    },
    Path(PathBuf),
}

impl Source {
    fn label(&self) -> String {
        match self {
            Self::Reader { label, .. } => label.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }

    fn open(self, config: &ReaderConfig) -> NagiosResult<ObjectReader<Box<dyn BufRead + Send>>> {
        let config = config.clone().validate()?;
        let label = self.label();
        let input: Box<dyn BufRead + Send> = match self {
            Self::Reader { reader, .. } => Box::new(BufReader::new(reader)),
            Self::Path(path) => {
                let file = File::open(&path).map_err(|e| NagiosError::io(label.clone(), e))?;
                Box::new(BufReader::new(file))
            }
        };
        Ok(ObjectReader::with_config(input, config).with_partition_key(label))
    }
}

/// Reads several sources in order into one collection or one stream.
///
/// Each object's partition key is the label of the source it came from. A
/// failing source does not stop the others.
///
/// # Examples
///
/// ```
/// use nagioscfg::MultiReader;
///
/// let mut multi = MultiReader::new();
/// multi.push_reader("hosts.cfg", &b"define host {\n host_name a\n}\n"[..]);
/// multi.push_reader("commands.cfg", &b"define command {\n command_name c\n}\n"[..]);
/// let map = multi.read_all_map().unwrap();
/// assert_eq!(map.split_by_partition().len(), 2);
/// ```
#[derive(Default)]
pub struct MultiReader {
    sources: Vec<Source>,
    config: ReaderConfig,
}

impl MultiReader {
    /// Creates a reader with no sources and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty reader whose sources share `config`.
    ///
    /// The configuration is validated as each source is opened; an invalid
    /// one fails every source with [`NagiosError::Config`].
    #[must_use]
    pub fn with_config(config: ReaderConfig) -> Self {
        Self {
            sources: Vec::new(),
            config,
        }
    }

    /// Creates a reader over files, labelled by path.
    pub fn from_paths<I, P>(paths: I, config: ReaderConfig) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut multi = Self::with_config(config);
        for path in paths {
            multi.push_path(path);
        }
        multi
    }

    /// Appends an in-memory or already open source.
    pub fn push_reader(&mut self, label: impl Into<String>, reader: impl Read + Send + 'static) {
        self.sources.push(Source::Reader {
            label: label.into(),
            reader: Box::new(reader),
        });
    }

    /// Appends a file. It is opened when reading starts.
    pub fn push_path(&mut self, path: impl AsRef<Path>) {
        self.sources.push(Source::Path(path.as_ref().to_path_buf()));
    }

    /// Number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no source was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Reads every source into one map.
    ///
    /// Objects from a source that fails part way are kept. If any source
    /// failed, everything collected is returned inside the error alongside
    /// one [`SourceFailure`] per failed source.
    pub fn read_all_map(self) -> Result<ObjectMap, MultiSourceError> {
        let total = self.sources.len();
        let mut collected = ObjectMap::new();
        let mut failures = Vec::new();

        for source in self.sources {
            let label = source.label();
            let result = source
                .open(&self.config)
                .and_then(|mut reader| reader.read_into(&mut collected));
            match result {
                Ok(count) => debug!(source = %label, count, "read source"),
                Err(error) => {
                    warn!(source = %label, %error, "source failed");
                    failures.push(SourceFailure { label, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(collected)
        } else {
            Err(MultiSourceError {
                collected,
                failures,
                total,
            })
        }
    }

    /// Reads every source, in order, on one background thread into a single
    /// bounded channel.
    ///
    /// A source that cannot be opened or fails to parse is logged and
    /// skipped.
    pub fn into_channel(self, capacity: usize) -> NagiosResult<ObjectStream> {
        let Self { sources, config } = self;
        ObjectStream::spawn(capacity, move |tx| {
            for source in sources {
                let label = source.label();
                let mut reader = match source.open(&config) {
                    Ok(reader) => reader,
                    Err(error) => {
                        warn!(source = %label, %error, "skipping source");
                        continue;
                    }
                };
                if pump(&mut reader, &tx) == Pump::Disconnected {
                    return;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SequentialIdentity;
    use crate::kind::ObjectKind;
    use crate::IdentityGenerator;

    fn object(kind: ObjectKind, id: u128, partition: &str, name: &str) -> ConfigObject {
        let mut obj = ConfigObject::with_id(kind, ObjectId::from_u128(id));
        obj.partition_key = partition.to_string();
        obj.set(format!("{kind}_name"), name).unwrap();
        obj
    }

    #[test]
    fn test_insert_requires_identity() {
        let mut map = ObjectMap::new();
        let err = map.insert(ConfigObject::new(ObjectKind::Host)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingIdentity { kind: ObjectKind::Host }
        ));
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut map = ObjectMap::new();
        map.insert(object(ObjectKind::Host, 1, "a", "web01")).unwrap();
        let err = map.insert(object(ObjectKind::Host, 1, "a", "web02")).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateIdentity { .. }));
        assert_eq!(map.len(), 1);

        let old = map.replace(object(ObjectKind::Host, 1, "a", "web02")).unwrap();
        assert_eq!(old.unwrap().name(), Some("web01"));
        assert_eq!(map.get(&ObjectId::from_u128(1)).unwrap().name(), Some("web02"));
    }

    #[test]
    fn test_get_str() {
        let mut map = ObjectMap::new();
        map.insert(object(ObjectKind::Host, 7, "a", "web01")).unwrap();
        let key = ObjectId::from_u128(7).to_string();
        assert!(map.get_str(&key).unwrap().is_some());
        assert!(map.get_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_split_by_partition_is_ordered() {
        let mut map = ObjectMap::new();
        map.insert(object(ObjectKind::Service, 1, "b.cfg", "z")).unwrap();
        map.insert(object(ObjectKind::Host, 2, "b.cfg", "y")).unwrap();
        map.insert(object(ObjectKind::Host, 3, "b.cfg", "x")).unwrap();
        map.insert(object(ObjectKind::Command, 4, "a.cfg", "c")).unwrap();

        let groups = map.split_by_partition();
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["a.cfg", "b.cfg"]);
        let names: Vec<_> = groups["b.cfg"].iter().map(|o| o.name().unwrap()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_filters() {
        let mut map = ObjectMap::new();
        map.insert(object(ObjectKind::Host, 1, "a", "web01")).unwrap();
        map.insert(object(ObjectKind::Host, 2, "a", "db01")).unwrap();
        let rx = Regex::new("^web").unwrap();
        assert_eq!(map.filter_matching(&rx, &["host_name"]).len(), 1);
        assert_eq!(map.filter_matching(&rx, &["alias"]).len(), 0);
        assert_eq!(map.filter_any(&Regex::new("01$").unwrap()).len(), 2);
    }

    #[test]
    fn test_extend_from() {
        let mut a = ObjectMap::new();
        a.insert(object(ObjectKind::Host, 1, "a", "x")).unwrap();
        let mut b = ObjectMap::new();
        b.insert(object(ObjectKind::Host, 2, "b", "y")).unwrap();
        a.extend_from(b).unwrap();
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_json_keyed_by_identity() {
        let mut map = ObjectMap::new();
        map.insert(object(ObjectKind::Host, 1, "hosts.cfg", "web01")).unwrap();
        let json = serde_json::to_value(&map).unwrap();
        let key = ObjectId::from_u128(1).to_string();
        assert_eq!(json[&key]["fileid"], "hosts.cfg");

        let back: ObjectMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_json_object_takes_key_identity() {
        let key = ObjectId::from_u128(9).to_string();
        let json = format!(r#"{{"{key}": {{"type": "host", "fileid": "h.cfg", "props": {{"host_name": "a"}}}}}}"#);
        let map: ObjectMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map.get(&ObjectId::from_u128(9)).unwrap().host_name(), Some("a"));
    }

    #[test]
    fn test_json_identity_mismatch() {
        let key = ObjectId::from_u128(9).to_string();
        let other = ObjectId::from_u128(10).to_string();
        let json = format!(r#"{{"{key}": {{"uuid": "{other}", "type": 3, "props": {{}}}}}}"#);
        assert!(serde_json::from_str::<ObjectMap>(&json).is_err());
    }

    #[test]
    fn test_multi_reader_labels_partitions() {
        let mut multi = MultiReader::new();
        multi.push_reader("one.cfg", &b"define host {\n host_name a\n}\n"[..]);
        multi.push_reader("two.cfg", &b"define host {\n host_name b\n}\n"[..]);
        let map = multi.read_all_map().unwrap();
        let mut keys: Vec<_> = map.values().map(|o| o.partition_key.clone()).collect();
        keys.sort();
        assert_eq!(keys, vec!["one.cfg", "two.cfg"]);
        assert!(map.values().all(|o| o.id().is_some()));
    }

    #[test]
    fn test_multi_reader_keeps_objects_before_failure() {
        let mut multi = MultiReader::new();
        multi.push_reader("good.cfg", &b"define host {\n host_name a\n}\n"[..]);
        multi.push_reader(
            "bad.cfg",
            &b"define host {\n host_name b\n}\ndefine nope {\n}\n"[..],
        );
        multi.push_path("/nonexistent/nagioscfg/missing.cfg");

        let err = multi.read_all_map().unwrap_err();
        assert_eq!(err.total, 3);
        assert_eq!(err.failed(), 2);
        assert_eq!(err.collected.len(), 2);
        assert_eq!(err.failures[0].label, "bad.cfg");
        assert!(err.failures[0].error.is_parse());
        assert!(err.failures[1].error.is_io());
    }

    #[test]
    fn test_multi_reader_validates_config() {
        let config = ReaderConfig {
            comment: Some('}'),
            ..ReaderConfig::default()
        };
        let mut multi = MultiReader::with_config(config);
        multi.push_reader("one.cfg", &b"define host {\n host_name a\n}\n"[..]);
        let err = multi.read_all_map().unwrap_err();
        assert_eq!(err.failed(), 1);
        assert!(matches!(err.failures[0].error, NagiosError::Config { .. }));
        assert!(err.collected.is_empty());
    }

    #[test]
    fn test_multi_reader_channel_preserves_source_order() {
        let mut multi = MultiReader::new();
        multi.push_reader("one.cfg", &b"define host {\n host_name a\n}\n"[..]);
        multi.push_path("/nonexistent/nagioscfg/missing.cfg");
        multi.push_reader("two.cfg", &b"define host {\n host_name b\n}\n"[..]);
        let objs: Vec<_> = multi.into_channel(1).unwrap().collect();
        let names: Vec<_> = objs.iter().map(|o| o.host_name().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(objs[1].partition_key, "two.cfg");
    }

    #[test]
    fn test_reader_identities_fill_map() {
        let mut ids = SequentialIdentity::starting_at(5);
        let mut obj = ConfigObject::new(ObjectKind::Host);
        let id = obj.ensure_id(|| ids.generate());
        let mut map = ObjectMap::new();
        map.insert(obj).unwrap();
        assert_eq!(id, ObjectId::from_u128(5));
        assert!(map.get(&id).is_some());
    }
}
