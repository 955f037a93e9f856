// ============================================
// entity.rs - Message Entities (formatting spans)
// ============================================
// Offsets and lengths are UTF-16 code units, the convention
// Telegram uses for message entities on the wire.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The length of a string, according to Telegram.
///
/// Entity offsets are `i32`, so lengths past `i32::MAX` saturate.
pub fn utf16_len(text: &str) -> i32 {
    i32::try_from(text.encode_utf16().count()).unwrap_or(i32::MAX)
}

/// Move a UTF-16 offset past `c`, saturating at `i32::MAX`.
pub(crate) fn advance(offset: i32, c: char) -> i32 {
    offset.saturating_add(c.len_utf16() as i32)
}

/// Fieldless discriminant of [`EntityKind`], used to look up open spans by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Bold,
    Italic,
    Underline,
    Strike,
    Spoiler,
    Code,
    Pre,
    TextUrl,
    MentionName,
}

/// What a span does, plus the data only some kinds carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Spoiler,
    Code,
    Pre {
        #[serde(default)]
        language: String,
    },
    TextUrl {
        url: String,
    },
    MentionName {
        user_id: i64,
        access_hash: i64,
    },
}

impl EntityKind {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityKind::Bold => EntityType::Bold,
            EntityKind::Italic => EntityType::Italic,
            EntityKind::Underline => EntityType::Underline,
            EntityKind::Strike => EntityType::Strike,
            EntityKind::Spoiler => EntityType::Spoiler,
            EntityKind::Code => EntityType::Code,
            EntityKind::Pre { .. } => EntityType::Pre,
            EntityKind::TextUrl { .. } => EntityType::TextUrl,
            EntityKind::MentionName { .. } => EntityType::MentionName,
        }
    }
}

/// A closed formatting span over the plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    pub offset: i32,
    pub length: i32,
    #[serde(flatten)]
    pub kind: EntityKind,
}

impl MessageEntity {
    pub fn new(kind: EntityKind, offset: i32, length: i32) -> Self {
        Self {
            offset,
            length,
            kind,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    /// Exclusive end offset (UTF-16 units).
    pub fn end(&self) -> i32 {
        self.offset + self.length
    }

    /// Slice of `text` covered by this entity, or `None` if the offsets do not
    /// land on character boundaries inside `text`.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        let start = byte_index(text, self.offset)?;
        let end = byte_index(text, self.end())?;
        text.get(start..end)
    }
}

/// Convert a UTF-16 offset into a byte index of `text`.
fn byte_index(text: &str, utf16_offset: i32) -> Option<usize> {
    let mut units = 0;
    for (index, c) in text.char_indices() {
        if units == utf16_offset {
            return Some(index);
        }
        if units > utf16_offset {
            return None;
        }
        units = advance(units, c);
    }
    (units == utf16_offset).then_some(text.len())
}

/// A span whose length is known only once its closing marker is seen.
#[derive(Debug)]
struct PendingEntity {
    kind: EntityKind,
    offset: i32,
    length: Option<i32>,
}

/// Creation-ordered list of spans doubling as a per-type stack of open spans.
///
/// Both parsers push here when an opening marker is recognized and close the
/// most recently opened span of the matching type. Nothing checks nesting across
/// different types, so e.g. bold and italic may overlap freely.
#[derive(Debug, Default)]
pub(crate) struct EntityStack {
    entries: Vec<PendingEntity>,
}

impl EntityStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open(&mut self, kind: EntityKind, offset: i32) {
        self.entries.push(PendingEntity {
            kind,
            offset,
            length: None,
        });
    }

    /// Index of the most recently opened span still open, whatever its type.
    pub(crate) fn last_open(&self) -> Option<usize> {
        self.entries.iter().rposition(|e| e.length.is_none())
    }

    /// Index of the most recently opened span of `ty` still open.
    pub(crate) fn last_open_of(&self, ty: EntityType) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|e| e.length.is_none() && e.kind.entity_type() == ty)
    }

    pub(crate) fn type_at(&self, index: usize) -> EntityType {
        self.entries[index].kind.entity_type()
    }

    pub(crate) fn kind_mut(&mut self, index: usize) -> &mut EntityKind {
        &mut self.entries[index].kind
    }

    pub(crate) fn close(&mut self, index: usize, offset: i32) {
        let entry = &mut self.entries[index];
        entry.length = Some(offset - entry.offset);
    }

    /// Close the latest open span of the same type, or open a new one.
    pub(crate) fn toggle(&mut self, kind: EntityKind, offset: i32) {
        match self.last_open_of(kind.entity_type()) {
            Some(index) => self.close(index, offset),
            None => self.open(kind, offset),
        }
    }

    /// Closed spans in creation order; spans never closed are dropped.
    pub(crate) fn finish(self) -> Option<Vec<MessageEntity>> {
        let total = self.entries.len();
        let entities: Vec<MessageEntity> = self
            .entries
            .into_iter()
            .filter_map(|e| e.length.map(|length| MessageEntity::new(e.kind, e.offset, length)))
            .collect();

        if entities.len() < total {
            debug!("Dropped {} unterminated entities", total - entities.len());
        }

        if entities.is_empty() {
            None
        } else {
            Some(entities)
        }
    }
}
