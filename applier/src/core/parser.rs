//! Change-set payload parser.
//!
//! The payload is XML: a `<changes>` root wrapping `<change>` blocks, each with
//! `<file>`, an optional `<description>`, and `<content>`. Content is usually
//! wrapped in CDATA so it can carry markup verbatim.
//!
//! Structural problems with the document as a whole are fatal
//! ([`FormatError`]). Problems inside a single block only mark that block as
//! skipped so the rest of the batch still applies.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{Change, ChangeBlock, ChangeSet};

const ROOT_TAG: &[u8] = b"changes";
const CHANGE_TAG: &[u8] = b"change";

/// Whole-payload parse failure. Nothing has been written when this occurs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("payload is empty")]
    Empty,
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("missing <changes> root element")]
    MissingRoot,
    #[error("unexpected root element <{0}>, expected <changes>")]
    UnexpectedRoot(String),
    #[error("unexpected content after the <changes> root element")]
    TrailingContent,
    #[error("payload ended inside an unclosed element")]
    Unclosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    File,
    Description,
    Content,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"file" => Some(Field::File),
            b"description" => Some(Field::Description),
            b"content" => Some(Field::Content),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Field::File => "file",
            Field::Description => "description",
            Field::Content => "content",
        }
    }
}

/// Open element on the parse stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Root,
    Change,
    Field(Field),
    Ignored,
}

/// Accumulates the fields of one `<change>` block.
#[derive(Debug, Default)]
struct BlockBuilder {
    file: Option<String>,
    description: Option<String>,
    content: Option<String>,
    nested: Option<String>,
}

impl BlockBuilder {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::File => &mut self.file,
            Field::Description => &mut self.description,
            Field::Content => &mut self.content,
        }
    }

    /// Start collecting `field`. Returns false if the field was already seen;
    /// the first occurrence wins.
    fn open(&mut self, field: Field) -> bool {
        let slot = self.slot(field);
        if slot.is_some() {
            return false;
        }
        *slot = Some(String::new());
        true
    }

    fn push_text(&mut self, field: Field, text: &str) {
        if let Some(buf) = self.slot(field) {
            buf.push_str(text);
        }
    }

    fn nested_element(&mut self, field: Field, name: &str) {
        self.nested
            .get_or_insert_with(|| format!("unexpected element <{name}> inside <{}>", field.tag()));
    }

    fn finish(self) -> ChangeBlock {
        let path = self
            .file
            .map(|raw| raw.trim().to_string())
            .filter(|path| !path.is_empty());

        if let Some(reason) = self.nested {
            return ChangeBlock::Skipped { path, reason };
        }

        let Some(path) = path else {
            return ChangeBlock::Skipped {
                path: None,
                reason: "missing <file> path".to_string(),
            };
        };

        let description = self
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        ChangeBlock::Ready(Change {
            path,
            description,
            content: self.content.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default)]
struct ParseState {
    stack: Vec<Frame>,
    root_seen: bool,
    root_closed: bool,
    current: Option<BlockBuilder>,
    blocks: Vec<ChangeBlock>,
}

impl ParseState {
    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), FormatError> {
        let name = start.name();
        let name = name.as_ref();
        let frame = match self.stack.last().copied() {
            None => {
                if self.root_closed {
                    return Err(FormatError::TrailingContent);
                }
                if name != ROOT_TAG {
                    return Err(FormatError::UnexpectedRoot(lossy(name)));
                }
                self.root_seen = true;
                Frame::Root
            }
            Some(Frame::Root) if name == CHANGE_TAG => {
                self.current = Some(BlockBuilder::default());
                Frame::Change
            }
            Some(Frame::Root) => {
                debug!(element = %lossy(name), "ignoring non-change element");
                Frame::Ignored
            }
            Some(Frame::Change) => {
                let opened = match (Field::from_tag(name), self.current.as_mut()) {
                    (Some(field), Some(builder)) => builder.open(field).then_some(field),
                    _ => None,
                };
                opened.map_or(Frame::Ignored, Frame::Field)
            }
            Some(Frame::Field(field)) => {
                if let Some(builder) = self.current.as_mut() {
                    builder.nested_element(field, &lossy(name));
                }
                Frame::Ignored
            }
            Some(Frame::Ignored) => Frame::Ignored,
        };
        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Result<(), FormatError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| FormatError::Malformed("closing tag without a matching start".into()))?;
        match frame {
            Frame::Root => self.root_closed = true,
            Frame::Change => {
                if let Some(builder) = self.current.take() {
                    let block = builder.finish();
                    if let ChangeBlock::Skipped { reason, .. } = &block {
                        warn!(index = self.blocks.len(), %reason, "skipping change block");
                    }
                    self.blocks.push(block);
                }
            }
            Frame::Field(_) | Frame::Ignored => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), FormatError> {
        match self.stack.last().copied() {
            Some(Frame::Field(field)) => {
                if let Some(builder) = self.current.as_mut() {
                    builder.push_text(field, text);
                }
                Ok(())
            }
            None if !text.trim().is_empty() => {
                if self.root_closed {
                    Err(FormatError::TrailingContent)
                } else {
                    Err(FormatError::MissingRoot)
                }
            }
            _ => Ok(()),
        }
    }

    fn finish(self) -> Result<ChangeSet, FormatError> {
        if !self.stack.is_empty() {
            return Err(FormatError::Unclosed);
        }
        if !self.root_seen {
            return Err(FormatError::MissingRoot);
        }
        Ok(ChangeSet {
            blocks: self.blocks,
        })
    }
}

/// Parse a raw payload into an ordered [`ChangeSet`].
pub fn parse_change_set(payload: &str) -> Result<ChangeSet, FormatError> {
    let payload = payload.strip_prefix('\u{feff}').unwrap_or(payload);
    if payload.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    let mut reader = Reader::from_str(payload);
    let mut state = ParseState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => state.open(&start)?,
            Ok(Event::Empty(start)) => {
                state.open(&start)?;
                state.close()?;
            }
            Ok(Event::End(_)) => state.close()?,
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|err| FormatError::Malformed(err.to_string()))?;
                state.text(&text)?;
            }
            Ok(Event::CData(cdata)) => {
                let text = std::str::from_utf8(&cdata)
                    .map_err(|err| FormatError::Malformed(format!("CDATA is not UTF-8: {err}")))?;
                state.text(text)?;
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions and doctypes.
            Ok(_) => {}
            Err(err) => return Err(FormatError::Malformed(err.to_string())),
        }
    }

    let change_set = state.finish()?;
    debug!(blocks = change_set.len(), "parsed change set");
    Ok(change_set)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
