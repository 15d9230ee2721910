//! The configuration object model.
//!
//! A [`ConfigObject`] is one `define <kind> { ... }` block: a kind, a set of
//! key/value properties, the partition key it is written back to, and an
//! optional identity used when it lives in an [`ObjectMap`].
//!
//! [`ObjectMap`]: crate::collection::ObjectMap

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::ObjectId;
use crate::keys::COMMAND_SEPARATOR;
use crate::kind::ObjectKind;

/// Default indentation of property lines.
pub const DEFAULT_INDENT: usize = 4;

/// Default width of the key column.
pub const DEFAULT_ALIGN: usize = 32;

/// Placeholder substituted with the object's name in comment templates.
pub const NAME_PLACEHOLDER: &str = "%s";

/// Rendering metadata for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Spaces before each property line.
    pub indent: usize,
    /// Minimum width of the key column.
    pub align: usize,
    /// Comment line template; `%s` is replaced with the object's name.
    pub comment: String,
}

impl Layout {
    /// Default layout for a kind.
    #[must_use]
    pub fn for_kind(kind: ObjectKind) -> Self {
        Self {
            indent: DEFAULT_INDENT,
            align: DEFAULT_ALIGN,
            comment: format!("# {kind} '{NAME_PLACEHOLDER}'"),
        }
    }
}

/// One configuration block.
///
/// # Examples
///
/// ```
/// use nagioscfg::{ConfigObject, ObjectKind};
///
/// let mut cmd = ConfigObject::new(ObjectKind::Command);
/// cmd.set("command_name", "check_ping").unwrap();
/// assert_eq!(cmd.name(), Some("check_ping"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigObject {
    #[serde(rename = "type")]
    kind: ObjectKind,

    #[serde(rename = "uuid", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,

    /// Where the object came from and where it is written back to.
    #[serde(rename = "fileid", default)]
    pub partition_key: String,

    #[serde(rename = "props", default)]
    properties: BTreeMap<String, String>,

    #[serde(skip)]
    layout: Option<Layout>,
}

impl ConfigObject {
    /// Creates an object without identity.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            id: None,
            partition_key: String::new(),
            properties: BTreeMap::new(),
            layout: None,
        }
    }

    /// Creates an object with the given identity.
    #[must_use]
    pub fn with_id(kind: ObjectKind, id: ObjectId) -> Self {
        let mut obj = Self::new(kind);
        obj.id = Some(id);
        obj
    }

    /// The object's kind.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The object's identity, if one was assigned.
    #[must_use]
    pub const fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Assigns an identity if the object has none yet.
    ///
    /// Returns the identity the object ends up with.
    pub fn ensure_id(&mut self, id: impl FnOnce() -> ObjectId) -> ObjectId {
        *self.id.get_or_insert_with(id)
    }

    /// Rendering metadata.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
            .clone()
            .unwrap_or_else(|| Layout::for_kind(self.kind))
    }

    /// Replaces the rendering metadata.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = Some(layout);
    }

    /// Sets `key` to `value`, overwriting any previous value.
    ///
    /// Returns `true` if a value was overwritten.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<bool, ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::EmptyKey);
        }
        Ok(self.properties.insert(key, value.into()).is_some())
    }

    /// Sets `key` to `value` only if `key` is not present yet.
    ///
    /// Returns `true` if the value was added.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<bool, ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::EmptyKey);
        }
        if self.properties.contains_key(&key) {
            return Ok(false);
        }
        self.properties.insert(key, value.into());
        Ok(true)
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if the object has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterates over properties in key order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Splits the value of `key` on `sep`.
    #[must_use]
    pub fn get_list(&self, key: &str, sep: &str) -> Option<Vec<&str>> {
        self.get(key).map(|v| v.split(sep).collect())
    }

    /// Joins `items` with `sep` and sets the result as the value of `key`.
    ///
    /// Returns `true` if a value was overwritten.
    pub fn set_list<I, S>(&mut self, key: &str, sep: &str, items: I) -> Result<bool, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set(key, join(items, sep))
    }

    /// Like [`set_list`](Self::set_list), but only if `key` is not present.
    ///
    /// Returns `true` if the value was added.
    pub fn add_list<I, S>(&mut self, key: &str, sep: &str, items: I) -> Result<bool, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.contains_key(key) {
            return Ok(false);
        }
        self.add(key, join(items, sep))
    }

    /// Length of the longest key, in runes.
    #[must_use]
    pub fn longest_key(&self) -> usize {
        self.properties
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Sets the key column width to the longest key plus two.
    pub fn auto_align(&mut self) -> usize {
        let align = self.longest_key() + 2;
        let mut layout = self.layout();
        layout.align = align;
        self.layout = Some(layout);
        align
    }

    /// The object's name: `<kind>_name`, falling back to `name`.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get(&format!("{}_name", self.kind))
            .or_else(|| self.get("name"))
    }

    /// The object's description: `<kind>_description`.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.get(&format!("{}_description", self.kind))
    }

    /// `host_name` of a host or service.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        match self.kind {
            ObjectKind::Host | ObjectKind::Service => self.get("host_name"),
            _ => None,
        }
    }

    /// `host_name;service_description`, the unique name of a service check.
    #[must_use]
    pub fn unique_check_name(&self) -> Option<String> {
        if self.kind != ObjectKind::Service {
            return None;
        }
        let host = self.host_name()?;
        let desc = self.description()?;
        Some(format!("{host};{desc}"))
    }

    /// `check_command` of a service, split into command and arguments.
    #[must_use]
    pub fn check_command(&self) -> Option<Vec<&str>> {
        if self.kind != ObjectKind::Service {
            return None;
        }
        self.get_list("check_command", COMMAND_SEPARATOR)
    }

    /// The command part of `check_command`.
    #[must_use]
    pub fn check_command_name(&self) -> Option<&str> {
        self.check_command()
            .and_then(|parts| parts.first().copied())
    }

    /// The argument part of `check_command`.
    #[must_use]
    pub fn check_command_args(&self) -> Vec<&str> {
        self.check_command()
            .map(|parts| parts.into_iter().skip(1).collect())
            .unwrap_or_default()
    }

    /// Returns true if every key in `keys` is set and its value matches `rx`.
    #[must_use]
    pub fn matches_keys<S: AsRef<str>>(&self, rx: &Regex, keys: &[S]) -> bool {
        keys.iter()
            .all(|key| self.get(key.as_ref()).is_some_and(|v| rx.is_match(v)))
    }

    /// Returns true if any property value matches `rx`.
    #[must_use]
    pub fn matches_any(&self, rx: &Regex) -> bool {
        self.properties.values().any(|v| rx.is_match(v))
    }
}

fn join<I, S>(items: I, sep: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (idx, item) in items.into_iter().enumerate() {
        if idx > 0 {
            out.push_str(sep);
        }
        out.push_str(item.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::LIST_SEPARATOR;

    fn service() -> ConfigObject {
        let mut obj = ConfigObject::new(ObjectKind::Service);
        obj.set("host_name", "localhost").unwrap();
        obj.set("service_description", "PING").unwrap();
        obj.set("check_command", "check_ping!100,20%!500,60%").unwrap();
        obj
    }

    #[test]
    fn test_new_has_no_identity() {
        let obj = ConfigObject::new(ObjectKind::Host);
        assert!(obj.id().is_none());
        assert!(obj.is_empty());
        assert_eq!(obj.partition_key, "");
    }

    #[test]
    fn test_ensure_id_assigns_once() {
        let mut obj = ConfigObject::new(ObjectKind::Host);
        let first = obj.ensure_id(|| ObjectId::from_u128(1));
        let second = obj.ensure_id(|| ObjectId::from_u128(2));
        assert_eq!(first, second);
        assert_eq!(obj.id(), Some(ObjectId::from_u128(1)));
    }

    #[test]
    fn test_set_reports_overwrite() {
        let mut obj = ConfigObject::new(ObjectKind::Host);
        assert!(!obj.set("alias", "a").unwrap());
        assert!(obj.set("alias", "b").unwrap());
        assert_eq!(obj.get("alias"), Some("b"));
    }

    #[test]
    fn test_add_keeps_first_value() {
        let mut obj = ConfigObject::new(ObjectKind::Host);
        assert!(obj.add("alias", "a").unwrap());
        assert!(!obj.add("alias", "b").unwrap());
        assert_eq!(obj.get("alias"), Some("a"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut obj = ConfigObject::new(ObjectKind::Host);
        assert!(matches!(obj.set("", "x"), Err(ValidationError::EmptyKey)));
        assert!(matches!(obj.add("", "x"), Err(ValidationError::EmptyKey)));
        assert!(obj.is_empty());
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut obj = ConfigObject::new(ObjectKind::Host);
        obj.set("Alias", "upper").unwrap();
        obj.set("alias", "lower").unwrap();
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut obj = service();
        assert_eq!(obj.remove("host_name").as_deref(), Some("localhost"));
        assert_eq!(obj.remove("host_name"), None);
    }

    #[test]
    fn test_lists() {
        let mut obj = ConfigObject::new(ObjectKind::Host);
        obj.set_list("hostgroups", LIST_SEPARATOR, ["web", "db"]).unwrap();
        assert_eq!(obj.get("hostgroups"), Some("web,db"));
        assert!(!obj.add_list("hostgroups", LIST_SEPARATOR, ["x"]).unwrap());
        assert!(obj.add_list("parents", LIST_SEPARATOR, ["gw"]).unwrap());
        assert_eq!(obj.get_list("hostgroups", LIST_SEPARATOR), Some(vec!["web", "db"]));
        assert_eq!(obj.get_list("contacts", LIST_SEPARATOR), None);
    }

    #[test]
    fn test_longest_key_and_auto_align() {
        let mut obj = service();
        assert_eq!(obj.longest_key(), "service_description".len());
        assert_eq!(obj.auto_align(), 21);
        assert_eq!(obj.layout().align, 21);
        assert_eq!(obj.layout().indent, DEFAULT_INDENT);
    }

    #[test]
    fn test_default_layout() {
        let obj = ConfigObject::new(ObjectKind::Contact);
        let layout = obj.layout();
        assert_eq!(layout.align, DEFAULT_ALIGN);
        assert_eq!(layout.comment, "# contact '%s'");
    }

    #[test]
    fn test_name_falls_back_to_template_name() {
        let mut obj = ConfigObject::new(ObjectKind::Host);
        obj.set("name", "generic-host").unwrap();
        assert_eq!(obj.name(), Some("generic-host"));
        obj.set("host_name", "web01").unwrap();
        assert_eq!(obj.name(), Some("web01"));
    }

    #[test]
    fn test_service_lookups() {
        let obj = service();
        assert_eq!(obj.description(), Some("PING"));
        assert_eq!(obj.host_name(), Some("localhost"));
        assert_eq!(obj.unique_check_name().as_deref(), Some("localhost;PING"));
        assert_eq!(obj.check_command_name(), Some("check_ping"));
        assert_eq!(obj.check_command_args(), vec!["100,20%", "500,60%"]);
    }

    #[test]
    fn test_service_lookups_on_other_kinds() {
        let mut obj = ConfigObject::new(ObjectKind::Command);
        obj.set("host_name", "x").unwrap();
        obj.set("check_command", "y").unwrap();
        assert_eq!(obj.host_name(), None);
        assert_eq!(obj.check_command(), None);
        assert!(obj.check_command_args().is_empty());
        assert_eq!(obj.unique_check_name(), None);
    }

    #[test]
    fn test_matching() {
        let obj = service();
        let rx = Regex::new("^local").unwrap();
        assert!(obj.matches_keys(&rx, &["host_name"]));
        assert!(!obj.matches_keys(&rx, &["host_name", "service_description"]));
        assert!(!obj.matches_keys(&rx, &["contacts"]));
        assert!(obj.matches_any(&rx));
        assert!(!obj.matches_any(&Regex::new("nowhere").unwrap()));
    }

    #[test]
    fn test_json_shape() {
        let mut obj = ConfigObject::with_id(ObjectKind::Service, ObjectId::from_u128(5));
        obj.partition_key = "/opt/monitor/etc/services.cfg".to_string();
        obj.set("host_name", "localhost").unwrap();

        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["type"], 8);
        assert_eq!(value["uuid"], "00000000-0000-0000-0000-000000000005");
        assert_eq!(value["fileid"], "/opt/monitor/etc/services.cfg");
        assert_eq!(value["props"]["host_name"], "localhost");

        let back: ConfigObject = serde_json::from_value(value).unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn test_json_without_uuid() {
        let obj: ConfigObject =
            serde_json::from_str(r#"{"type":"command","props":{"command_name":"gris"}}"#).unwrap();
        assert_eq!(obj.kind(), ObjectKind::Command);
        assert!(obj.id().is_none());
        assert!(!serde_json::to_string(&obj).unwrap().contains("uuid"));
    }
}
