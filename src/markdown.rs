// ============================================
// markdown.rs - Markdown-to-entities parser
// Converts Telegram-style Markdown into plain text
// plus the message entities describing its formatting.
// ============================================

use tracing::trace;

use crate::entity::{advance, EntityKind, EntityStack, EntityType, MessageEntity};
use crate::resolver::{link_kind, AccessHashResolver};

/// Convert Markdown text into plain text and its formatting entities.
///
/// Supported markers:
/// - `*bold*`, `_italic_`, `__underline__`, `~strike~`, `||spoiler||`
/// - `` `code` `` and fenced ```` ```lang ```` blocks
/// - `[text](url)`, where `tg://user?id=N` becomes a mention when `resolver`
///   knows the access hash of user N
/// - `\` makes the next character literal
///
/// Markers of the same kind toggle: the next occurrence closes the latest open
/// span of that kind. Spans still open at the end of the text are dropped.
/// Returns `None` instead of an empty list when there is no formatting.
pub fn markdown_to_entities<R>(text: &str, resolver: &R) -> (String, Option<Vec<MessageEntity>>)
where
    R: AccessHashResolver + ?Sized,
{
    let mut scanner = Scanner::new(text);
    scanner.run(resolver);
    (scanner.out, scanner.entities.finish())
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    out: String,
    /// Length of `out` in UTF-16 units.
    offset: i32,
    entities: EntityStack,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            out: String::with_capacity(text.len()),
            offset: 0,
            entities: EntityStack::new(),
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn emit(&mut self, c: char) {
        self.out.push(c);
        self.offset = advance(self.offset, c);
    }

    /// Emit the current character as text and move past it.
    fn literal(&mut self) {
        let c = self.chars[self.pos];
        self.emit(c);
        self.pos += 1;
    }

    /// Consume `width` marker characters and toggle a span of `kind`.
    fn toggle(&mut self, kind: EntityKind, width: usize) {
        self.entities.toggle(kind, self.offset);
        self.pos += width;
    }

    fn run<R>(&mut self, resolver: &R)
    where
        R: AccessHashResolver + ?Sized,
    {
        while let Some(c) = self.peek(0) {
            match c {
                '\\' => {
                    self.pos += 1;
                    if self.peek(0).is_some() {
                        self.literal();
                    }
                }
                '*' => self.toggle(EntityKind::Bold, 1),
                '~' => self.toggle(EntityKind::Strike, 1),
                '_' if self.peek(1) == Some('_') => self.toggle(EntityKind::Underline, 2),
                '_' => self.toggle(EntityKind::Italic, 1),
                '|' if self.peek(1) == Some('|') => self.toggle(EntityKind::Spoiler, 2),
                '`' if self.peek(1) == Some('`') && self.peek(2) == Some('`') => self.fence(),
                '`' => self.toggle(EntityKind::Code, 1),
                '[' => {
                    self.entities.open(
                        EntityKind::TextUrl { url: String::new() },
                        self.offset,
                    );
                    self.pos += 1;
                }
                ']' if self.peek(1) == Some('(') => {
                    if !self.link_target(resolver) {
                        self.literal();
                    }
                }
                _ => self.literal(),
            }
        }
    }

    /// Handle ```` ``` ````: close the open code block, or open one with the
    /// language written right after the backticks.
    fn fence(&mut self) {
        self.pos += 3;

        if let Some(index) = self.entities.last_open_of(EntityType::Pre) {
            self.entities.close(index, self.offset);
            return;
        }

        let start = self.pos;
        while self.peek(0).is_some_and(|c| !c.is_whitespace()) {
            self.pos += 1;
        }
        let language: String = self.chars[start..self.pos].iter().collect();
        if self.peek(0) == Some('\n') {
            self.pos += 1;
        }

        trace!("Opening code block at {} (language {:?})", self.offset, language);
        self.entities.open(EntityKind::Pre { language }, self.offset);
    }

    /// Handle `](url)` closing a `[text` link. Returns false when the `]`
    /// should be kept as text.
    fn link_target<R>(&mut self, resolver: &R) -> bool
    where
        R: AccessHashResolver + ?Sized,
    {
        let Some(index) = self.entities.last_open() else {
            return false;
        };
        if self.entities.type_at(index) != EntityType::TextUrl {
            return false;
        }

        // Read up to the first unescaped ')'.
        let mut url = String::new();
        let mut end = self.pos + 2;
        loop {
            match self.chars.get(end) {
                None => return false,
                Some(')') => break,
                Some('\\') => {
                    if let Some(&next) = self.chars.get(end + 1) {
                        url.push(next);
                    }
                    end += 2;
                }
                Some(&c) => {
                    url.push(c);
                    end += 1;
                }
            }
        }

        self.entities.close(index, self.offset);
        *self.entities.kind_mut(index) = link_kind(url, resolver);
        self.pos = end + 1;
        true
    }
}
