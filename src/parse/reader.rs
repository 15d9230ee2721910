//! The `define` block state machine.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace};

use crate::collection::ObjectMap;
use crate::error::{BuildError, NagiosError, NagiosResult, ParseError};
use crate::identity::{IdentityGenerator, RandomIdentity};
use crate::kind::ObjectKind;
use crate::object::ConfigObject;

use super::scanner::{Line, LineEnd, Scanner};
use super::Position;

/// Keyword that opens an object definition.
const DEFINE: &str = "define";

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Comment marker recognized at the start of a line; `None` disables
    /// comments.
    pub comment: Option<char>,
    /// Assign an identity to every object as it is parsed.
    pub assign_identity: bool,
    /// Treat a key without a value inside a block as an error instead of
    /// skipping the line.
    pub strict_values: bool,
    /// Buffer size of the channel used by [`ObjectReader::into_channel`].
    pub channel_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            comment: Some('#'),
            assign_identity: false,
            strict_values: false,
            channel_capacity: 2,
        }
    }
}

impl ReaderConfig {
    /// Checks the configuration for values the scanner cannot work with.
    pub fn validate(self) -> Result<Self, NagiosError> {
        if self.channel_capacity == 0 {
            return Err(NagiosError::config("channel_capacity must be at least 1"));
        }
        if let Some(marker) = self.comment {
            if marker.is_whitespace() || marker == '{' || marker == '}' {
                return Err(NagiosError::config(format!(
                    "comment marker {marker:?} collides with a delimiter"
                )));
            }
        }
        Ok(self)
    }
}

enum State {
    Outside,
    Begin(ObjectKind),
    InBlock(ConfigObject),
}

/// Reads [`ConfigObject`]s from a text source.
///
/// Objects are tagged with the reader's partition key. Use
/// [`read_object`](Self::read_object) or the `Iterator` impl to pull objects,
/// or [`into_channel`](Self::into_channel) to have a background thread push
/// them into a bounded channel.
///
/// # Examples
///
/// ```
/// use nagioscfg::{ObjectKind, ObjectReader};
///
/// let text = "define command {\n\tcommand_name gris\n\tcommand_line $USER1$/x\n}\n";
/// let mut reader = ObjectReader::new(text.as_bytes());
/// let cmd = reader.read_object().unwrap();
/// assert_eq!(cmd.kind(), ObjectKind::Command);
/// assert_eq!(cmd.get("command_line"), Some("$USER1$/x"));
/// assert!(reader.read_object().unwrap_err().is_end_of_input());
/// ```
pub struct ObjectReader<R> {
    scanner: Scanner<R>,
    config: ReaderConfig,
    partition_key: String,
    identities: Box<dyn IdentityGenerator>,
    done: bool,
}

impl<R: BufRead> ObjectReader<R> {
    /// Creates a reader with the default configuration.
    pub fn new(source: R) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    /// Creates a reader with the given configuration.
    ///
    /// The configuration is used as given. Run [`ReaderConfig::validate`]
    /// first on values that come from outside the program; a brace used as
    /// comment marker turns block lines into comments.
    pub fn with_config(source: R, config: ReaderConfig) -> Self {
        Self {
            scanner: Scanner::with_comment(source, config.comment),
            config,
            partition_key: String::new(),
            identities: Box::new(RandomIdentity),
            done: false,
        }
    }

    /// Sets the partition key given to every object read.
    #[must_use]
    pub fn with_partition_key(mut self, key: impl Into<String>) -> Self {
        self.partition_key = key.into();
        self
    }

    /// Replaces the identity generator.
    #[must_use]
    pub fn with_identity_generator(mut self, generator: impl IdentityGenerator + 'static) -> Self {
        self.identities = Box::new(generator);
        self
    }

    /// The reader's configuration.
    #[must_use]
    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The partition key given to objects.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Position of the last rune consumed.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.scanner.position()
    }

    /// Reads the next object.
    ///
    /// Returns [`ParseError::EndOfInput`] once the source is exhausted
    /// outside of any block.
    pub fn read_object(&mut self) -> Result<ConfigObject, ParseError> {
        let mut state = State::Outside;
        loop {
            let Line { fields, end } = self.scanner.next_line()?;
            let position = self.scanner.position();

            state = match state {
                State::Outside => match end {
                    LineEnd::BlockBegin => State::InBlock(self.open_block(&fields, position)?),
                    LineEnd::BlockEnd => return Err(ParseError::UnexpectedBlockEnd { position }),
                    LineEnd::Newline | LineEnd::EndOfStream => {
                        let pending = if is_header(&fields) {
                            Some(header_kind(&fields, position)?)
                        } else {
                            if !fields.is_empty() {
                                debug!(%position, ?fields, "ignoring line outside of a block");
                            }
                            None
                        };
                        match (pending, end) {
                            (Some(kind), LineEnd::EndOfStream) => {
                                return Err(ParseError::UnterminatedBlock { position, kind });
                            }
                            (Some(kind), _) => State::Begin(kind),
                            (None, LineEnd::EndOfStream) => return Err(ParseError::EndOfInput),
                            (None, _) => State::Outside,
                        }
                    }
                },

                State::Begin(kind) => match end {
                    LineEnd::Newline if fields.is_empty() => State::Begin(kind),
                    LineEnd::BlockBegin if fields.is_empty() => State::InBlock(self.new_object(kind)),
                    LineEnd::EndOfStream => {
                        return Err(ParseError::UnterminatedBlock { position, kind });
                    }
                    _ => {
                        return Err(ParseError::InvalidHeader {
                            position,
                            reason: format!("expected '{{' after '{DEFINE} {kind}'"),
                        });
                    }
                },

                State::InBlock(mut obj) => {
                    if end == LineEnd::BlockBegin {
                        return Err(ParseError::InvalidHeader {
                            position,
                            reason: format!("'{{' inside '{}' block", obj.kind()),
                        });
                    }
                    self.fold_property(&mut obj, fields, position)?;
                    match end {
                        LineEnd::BlockEnd => {
                            trace!(kind = %obj.kind(), properties = obj.len(), "parsed object");
                            return Ok(obj);
                        }
                        LineEnd::EndOfStream => {
                            return Err(ParseError::UnterminatedBlock {
                                position,
                                kind: obj.kind(),
                            });
                        }
                        LineEnd::Newline | LineEnd::BlockBegin => State::InBlock(obj),
                    }
                }
            };
        }
    }

    /// Reads every remaining object into an [`ObjectMap`].
    ///
    /// Objects are given identities if they do not have one. On a parse
    /// error the objects read so far are returned inside the error.
    pub fn read_all_map(&mut self) -> Result<ObjectMap, BuildError> {
        let mut map = ObjectMap::new();
        match self.read_into(&mut map) {
            Ok(_) => Ok(map),
            Err(error) => Err(BuildError { partial: map, error }),
        }
    }

    /// Reads every remaining object into `map`, stopping at the first error.
    ///
    /// Objects inserted before the error stay in `map`.
    pub(crate) fn read_into(&mut self, map: &mut ObjectMap) -> NagiosResult<usize> {
        let mut count = 0;
        loop {
            let mut obj = match self.read_object() {
                Ok(obj) => obj,
                Err(ParseError::EndOfInput) => return Ok(count),
                Err(err) => return Err(err.into()),
            };
            let identities = &mut self.identities;
            obj.ensure_id(|| identities.generate());
            map.insert(obj)?;
            count += 1;
        }
    }

    fn open_block(&mut self, fields: &[String], position: Position) -> Result<ConfigObject, ParseError> {
        let kind = header_kind(fields, position)?;
        Ok(self.new_object(kind))
    }

    fn new_object(&mut self, kind: ObjectKind) -> ConfigObject {
        let mut obj = if self.config.assign_identity {
            ConfigObject::with_id(kind, self.identities.generate())
        } else {
            ConfigObject::new(kind)
        };
        obj.partition_key.clone_from(&self.partition_key);
        obj
    }

    fn fold_property(
        &self,
        obj: &mut ConfigObject,
        fields: Vec<String>,
        position: Position,
    ) -> Result<(), ParseError> {
        let mut fields = fields.into_iter();
        let Some(key) = fields.next() else {
            return Ok(());
        };
        let value = fields.collect::<Vec<_>>().join(" ");
        if value.is_empty() {
            if self.config.strict_values {
                return Err(ParseError::MissingValue { position, key });
            }
            debug!(%position, %key, "skipping key without value");
            return Ok(());
        }
        match obj.add(key, value) {
            Ok(true) => {}
            Ok(false) => debug!(%position, "duplicate key, keeping first value"),
            Err(err) => debug!(%position, %err, "skipping property"),
        }
        Ok(())
    }
}

impl ObjectReader<BufReader<File>> {
    /// Opens a file with the default configuration. The partition key is
    /// the path.
    pub fn open(path: impl AsRef<Path>) -> NagiosResult<Self> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Opens a file with the given configuration. The partition key is the
    /// path.
    ///
    /// The configuration is validated before the file is opened.
    pub fn open_with_config(path: impl AsRef<Path>, config: ReaderConfig) -> NagiosResult<Self> {
        let config = config.validate()?;
        let path = path.as_ref();
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| NagiosError::io(label.clone(), e))?;
        Ok(Self::with_config(BufReader::new(file), config).with_partition_key(label))
    }
}

impl<R: BufRead> Iterator for ObjectReader<R> {
    type Item = Result<ConfigObject, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_object() {
            Ok(obj) => Some(Ok(obj)),
            Err(ParseError::EndOfInput) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn is_header(fields: &[String]) -> bool {
    fields.first().is_some_and(|f| f == DEFINE)
}

fn header_kind(fields: &[String], position: Position) -> Result<ObjectKind, ParseError> {
    match fields {
        [keyword, name] if keyword == DEFINE => {
            ObjectKind::from_name(name).ok_or_else(|| ParseError::UnknownKind {
                position,
                name: name.clone(),
            })
        }
        _ => Err(ParseError::InvalidHeader {
            position,
            reason: format!("expected '{DEFINE} <kind>', found '{}'", fields.join(" ")),
        }),
    }
}
