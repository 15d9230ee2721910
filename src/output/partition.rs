//! Concurrent write-back of a collection, one task per partition.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::thread;

use crossbeam_channel::bounded;
use tracing::{debug, error, info};

use crate::collection::ObjectMap;
use crate::error::{NagiosError, NagiosResult};
use crate::object::ConfigObject;

use super::render::write_objects;

/// Opens the sink a partition is written to.
///
/// `open` is called once per partition, each time from that partition's own
/// writer thread.
pub trait Destination: Send + Sync {
    /// Sink type returned by [`open`](Self::open).
    type Sink: Write;

    /// Opens (and truncates) the sink for `partition`.
    fn open(&self, partition: &str) -> io::Result<Self::Sink>;
}

/// Writes each partition to the file named by its partition key.
#[derive(Debug, Clone, Default)]
pub struct FileDestination {
    root: Option<PathBuf>,
}

impl FileDestination {
    /// Uses partition keys as paths as-is.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves partition keys under `root`. Absolute keys are re-rooted;
    /// keys that climb out with `..` are rejected.
    #[must_use]
    pub fn under(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// The file a partition is written to.
    pub fn path_for(&self, partition: &str) -> io::Result<PathBuf> {
        let key = Path::new(partition);
        let Some(root) = &self.root else {
            return Ok(key.to_path_buf());
        };
        let mut path = root.clone();
        for component in key.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::ParentDir => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("partition key '{partition}' escapes {}", root.display()),
                    ));
                }
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            }
        }
        Ok(path)
    }
}

impl Destination for FileDestination {
    type Sink = BufWriter<File>;

    fn open(&self, partition: &str) -> io::Result<Self::Sink> {
        let path = self.path_for(partition)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(BufWriter::new(file))
    }
}

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Render properties in canonical key order instead of key order.
    pub sorted: bool,
    /// Prefix of writer thread names; the partition index is appended.
    pub thread_name_prefix: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            sorted: false,
            thread_name_prefix: "nagioscfg-writer".to_string(),
        }
    }
}

impl WriterConfig {
    /// Checks the configuration.
    pub fn validate(self) -> Result<Self, NagiosError> {
        if self.thread_name_prefix.is_empty() {
            return Err(NagiosError::config("thread_name_prefix must not be empty"));
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(NagiosError::config("thread_name_prefix must not contain NUL"));
        }
        Ok(self)
    }
}

/// Outcome of a fully successful [`PartitionedWriter::write_partitions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Partitions written.
    pub partitions: usize,
    /// Objects written across all partitions.
    pub objects: usize,
}

/// Writes each partition of a collection on its own thread.
///
/// # Examples
///
/// ```no_run
/// use nagioscfg::{FileDestination, MultiReader, PartitionedWriter};
///
/// let map = MultiReader::from_paths(["hosts.cfg", "services.cfg"], Default::default())
///     .read_all_map()
///     .unwrap();
/// let report = PartitionedWriter::new(FileDestination::under("/tmp/out"))
///     .write_partitions(&map)
///     .unwrap();
/// assert_eq!(report.partitions, 2);
/// ```
#[derive(Debug)]
pub struct PartitionedWriter<D> {
    destination: D,
    config: WriterConfig,
}

struct GroupOutcome {
    partition: String,
    objects: usize,
    result: io::Result<()>,
}

impl<D: Destination> PartitionedWriter<D> {
    /// Creates a writer with the default configuration.
    pub fn new(destination: D) -> Self {
        Self::with_config(destination, WriterConfig::default())
    }

    /// Creates a writer with the given configuration.
    pub const fn with_config(destination: D, config: WriterConfig) -> Self {
        Self {
            destination,
            config,
        }
    }

    /// The destination partitions are written to.
    pub const fn destination(&self) -> &D {
        &self.destination
    }

    /// The writer configuration.
    pub const fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Writes every partition of `map` concurrently and waits for all of
    /// them.
    ///
    /// A failing partition does not stop the others. If any failed, the
    /// result is [`NagiosError::PartialGroupWrite`].
    pub fn write_partitions(&self, map: &ObjectMap) -> NagiosResult<WriteReport> {
        let groups = map.split_by_partition();
        let total = groups.len();
        if total == 0 {
            return Ok(WriteReport::default());
        }

        let (tx, rx) = bounded::<GroupOutcome>(total);
        thread::scope(|scope| {
            for (idx, (partition, objects)) in groups.iter().enumerate() {
                let task_tx = tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("{}-{idx}", self.config.thread_name_prefix))
                    .spawn_scoped(scope, move || {
                        let result = self.write_group(partition, objects);
                        let _ = task_tx.send(GroupOutcome {
                            partition: partition.to_string(),
                            objects: objects.len(),
                            result,
                        });
                    });
                if let Err(err) = spawned {
                    let _ = tx.send(GroupOutcome {
                        partition: partition.to_string(),
                        objects: objects.len(),
                        result: Err(err),
                    });
                }
            }
        });
        drop(tx);

        let mut report = WriteReport::default();
        let mut failed = 0;
        for outcome in rx.try_iter() {
            match outcome.result {
                Ok(()) => {
                    report.partitions += 1;
                    report.objects += outcome.objects;
                }
                Err(err) => {
                    error!(partition = %outcome.partition, %err, "partition write failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(NagiosError::PartialGroupWrite { failed, total });
        }
        info!(partitions = report.partitions, objects = report.objects, "wrote partitions");
        Ok(report)
    }

    fn write_group(&self, partition: &str, objects: &[&ConfigObject]) -> io::Result<()> {
        debug!(partition, objects = objects.len(), "writing partition");
        let mut sink = self.destination.open(partition)?;
        write_objects(&mut sink, objects, self.config.sorted)?;
        sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ObjectId;
    use crate::kind::ObjectKind;
    use tempfile::tempdir;

    fn map_with(partitions: &[&str]) -> ObjectMap {
        let mut map = ObjectMap::new();
        for (idx, partition) in partitions.iter().enumerate() {
            let mut obj = ConfigObject::with_id(ObjectKind::Host, ObjectId::from_u128(idx as u128));
            obj.partition_key = (*partition).to_string();
            obj.set("host_name", format!("host{idx}")).unwrap();
            map.insert(obj).unwrap();
        }
        map
    }

    struct RejectingDestination {
        inner: FileDestination,
        reject: &'static str,
    }

    impl Destination for RejectingDestination {
        type Sink = BufWriter<File>;

        fn open(&self, partition: &str) -> io::Result<Self::Sink> {
            if partition == self.reject {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "rejected"));
            }
            self.inner.open(partition)
        }
    }

    #[test]
    fn test_writes_one_file_per_partition() {
        let dir = tempdir().unwrap();
        let map = map_with(&["a.cfg", "b.cfg", "a.cfg"]);
        let writer = PartitionedWriter::new(FileDestination::under(dir.path()));
        let report = writer.write_partitions(&map).unwrap();
        assert_eq!(report, WriteReport { partitions: 2, objects: 3 });

        let a = std::fs::read_to_string(dir.path().join("a.cfg")).unwrap();
        assert_eq!(a.matches("define host {").count(), 2);
        let b = std::fs::read_to_string(dir.path().join("b.cfg")).unwrap();
        assert!(b.contains("host1"));
    }

    #[test]
    fn test_failing_partition_is_counted() {
        let dir = tempdir().unwrap();
        let map = map_with(&["a.cfg", "b.cfg", "c.cfg"]);
        let writer = PartitionedWriter::new(RejectingDestination {
            inner: FileDestination::under(dir.path()),
            reject: "b.cfg",
        });
        let err = writer.write_partitions(&map).unwrap_err();
        assert!(matches!(err, NagiosError::PartialGroupWrite { failed: 1, total: 3 }));
        assert!(dir.path().join("a.cfg").exists());
        assert!(dir.path().join("c.cfg").exists());
    }

    #[test]
    fn test_empty_map_writes_nothing() {
        let dir = tempdir().unwrap();
        let writer = PartitionedWriter::new(FileDestination::under(dir.path()));
        assert_eq!(writer.write_partitions(&ObjectMap::new()).unwrap(), WriteReport::default());
    }

    #[test]
    fn test_absolute_keys_are_rerooted() {
        let dest = FileDestination::under("/tmp/out");
        assert_eq!(
            dest.path_for("/opt/monitor/etc/hosts.cfg").unwrap(),
            PathBuf::from("/tmp/out/opt/monitor/etc/hosts.cfg")
        );
        assert_eq!(
            dest.path_for("./conf.d/x.cfg").unwrap(),
            PathBuf::from("/tmp/out/conf.d/x.cfg")
        );
        assert_eq!(FileDestination::new().path_for("x.cfg").unwrap(), PathBuf::from("x.cfg"));
    }

    #[test]
    fn test_parent_dir_keys_rejected_under_root() {
        let dest = FileDestination::under("/tmp/out");
        let err = dest.path_for("../../etc/x.cfg").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(dest.path_for("conf.d/../x.cfg").is_err());
    }

    #[test]
    fn test_absolute_source_paths_written_under_new_root() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let hosts = src.path().join("etc").join("hosts.cfg");
        fs::create_dir_all(hosts.parent().unwrap()).unwrap();
        fs::write(&hosts, "define host {\n host_name web01\n}\n").unwrap();

        let map = crate::MultiReader::from_paths([&hosts], crate::ReaderConfig::default())
            .read_all_map()
            .unwrap();
        assert!(Path::new(&map.values().next().unwrap().partition_key).is_absolute());

        let dest = FileDestination::under(out.path());
        let report = PartitionedWriter::new(dest.clone()).write_partitions(&map).unwrap();
        assert_eq!(report, WriteReport { partitions: 1, objects: 1 });

        let written = dest.path_for(&hosts.display().to_string()).unwrap();
        assert!(written.starts_with(out.path()));
        let text = fs::read_to_string(written).unwrap();
        assert!(text.contains("web01"));
    }

    #[test]
    fn test_writer_config_validation() {
        assert!(WriterConfig::default().validate().is_ok());
        let empty = WriterConfig {
            thread_name_prefix: String::new(),
            ..WriterConfig::default()
        };
        assert!(empty.validate().is_err());
    }
}
