use std::fmt;
use std::io::{self, Write};

use crate::collection::ObjectMap;
use crate::keys;
use crate::kind::ObjectKind;
use crate::object::{ConfigObject, NAME_PLACEHOLDER};

impl ConfigObject {
    /// The comment line written above the block.
    ///
    /// The layout's template gets the object's name substituted for `%s`.
    /// Services use their description, and a service with only a `name` is
    /// labelled as a template.
    #[must_use]
    pub fn comment(&self) -> String {
        let template = self.layout().comment;
        if !template.contains(NAME_PLACEHOLDER) {
            return template;
        }
        let kind = self.kind();
        if kind == ObjectKind::Service {
            if let Some(desc) = self.description() {
                return template.replacen(NAME_PLACEHOLDER, desc, 1);
            }
            if let Some(name) = self.get("name") {
                return format!("# {kind} template '{name}'");
            }
        } else if let Some(name) = self.name() {
            return template.replacen(NAME_PLACEHOLDER, name, 1);
        }
        format!("# {kind}")
    }

    /// Writes the object with properties in key order.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{self}")
    }

    /// Writes the object with properties in the kind's canonical order.
    ///
    /// Keys that have no place in the kind's table are left out.
    pub fn write_sorted_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{}", self.sorted())
    }

    /// Display adapter rendering the object in canonical key order.
    #[must_use]
    pub const fn sorted(&self) -> Sorted<'_> {
        Sorted(self)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, sorted: bool) -> fmt::Result {
        let kind = self.kind();
        let props: Vec<(&str, &str)> = if sorted {
            let mut ranked: Vec<_> = self
                .properties()
                .filter_map(|(k, v)| keys::priority(kind, k).map(|p| (p, k, v)))
                .collect();
            ranked.sort_unstable_by_key(|(p, _, _)| *p);
            ranked.into_iter().map(|(_, k, v)| (k, v)).collect()
        } else {
            self.properties().collect()
        };

        let layout = self.layout();
        let longest = props.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        let width = layout.align.max(longest + 2);
        let indent = layout.indent;

        writeln!(f, "{}", self.comment())?;
        writeln!(f, "define {kind} {{")?;
        for (key, value) in props {
            writeln!(f, "{:indent$}{key:<width$}{value}", "")?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for ConfigObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, false)
    }
}

/// Renders an object with properties in canonical order.
///
/// Returned by [`ConfigObject::sorted`].
#[derive(Debug, Clone, Copy)]
pub struct Sorted<'a>(&'a ConfigObject);

impl fmt::Display for Sorted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render(f, true)
    }
}

/// Writes objects one after another, each followed by a blank line.
pub(crate) fn write_objects<W: Write + ?Sized>(
    w: &mut W,
    objects: &[&ConfigObject],
    sorted: bool,
) -> io::Result<()> {
    for obj in objects {
        if sorted {
            obj.write_sorted_to(w)?;
        } else {
            obj.write_to(w)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

impl ObjectMap {
    /// Writes every object, grouped by partition key and ordered within
    /// each group, regardless of partition.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, sorted: bool) -> io::Result<()> {
        for objects in self.split_by_partition().values() {
            write_objects(w, objects, sorted)?;
        }
        Ok(())
    }
}
