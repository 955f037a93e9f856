// ============================================
// html.rs - HTML-to-entities parser
// Converts the Telegram HTML subset into plain text
// plus the message entities describing its formatting.
// ============================================

use memchr::{memchr, memchr2};
use tracing::{debug, trace};

use crate::entity::{utf16_len, EntityKind, EntityStack, EntityType, MessageEntity};
use crate::resolver::{link_kind, AccessHashResolver};

/// What a tag does to the open spans.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TagAction {
    /// Push a new open span, even if one of the same type is already open.
    Open(EntityKind),
    /// Close the latest open span of this type, if any.
    Close(EntityType),
    /// Close the latest open span only if it has one of these types.
    CloseTopOf(&'static [EntityType]),
    /// Set the language of the latest open code block.
    SetPreLanguage(String),
    Ignore,
}

const LINK_TYPES: &[EntityType] = &[EntityType::TextUrl, EntityType::MentionName];

/// Map the text between `<`/`</` and `>` to its effect.
fn tag_action<R>(tag: &str, closing: bool, resolver: &R) -> TagAction
where
    R: AccessHashResolver + ?Sized,
{
    let toggle = |kind: EntityKind| {
        if closing {
            TagAction::Close(kind.entity_type())
        } else {
            TagAction::Open(kind)
        }
    };

    match tag {
        "b" | "strong" => toggle(EntityKind::Bold),
        "i" | "em" => toggle(EntityKind::Italic),
        "u" | "ins" => toggle(EntityKind::Underline),
        "s" | "strike" | "del" => toggle(EntityKind::Strike),
        "code" => toggle(EntityKind::Code),
        "pre" => toggle(EntityKind::Pre {
            language: String::new(),
        }),
        // Any </span> ends a spoiler, whatever the opening tag looked like.
        "tg-spoiler" | r#"span class="tg-spoiler""# => toggle(EntityKind::Spoiler),
        "span" if closing => TagAction::Close(EntityType::Spoiler),
        "a" if closing => TagAction::CloseTopOf(LINK_TYPES),
        _ if closing => TagAction::Ignore,
        _ => {
            if let Some(url) = quoted_value(tag, r#"a href=""#) {
                TagAction::Open(link_kind(url.to_string(), resolver))
            } else if let Some(language) = quoted_value(tag, r#"code class="language-"#) {
                TagAction::SetPreLanguage(language.to_string())
            } else {
                TagAction::Ignore
            }
        }
    }
}

/// `tag` minus `prefix` and the closing quote.
fn quoted_value<'a>(tag: &'a str, prefix: &str) -> Option<&'a str> {
    tag.strip_prefix(prefix)?.strip_suffix('"')
}

/// Convert HTML text into plain text and its formatting entities.
///
/// Recognized tags: `b`/`strong`, `i`/`em`, `u`/`ins`, `s`/`strike`/`del`,
/// `code`, `pre`, `tg-spoiler`/`span class="tg-spoiler"`, `a href="..."` and
/// `code class="language-..."` inside a `pre`. Unknown tags are removed.
/// Character references (`&amp;`, `&#228;`...) decoding to a single UTF-16
/// code unit are replaced, others (`&#x1F980;` included) are kept as text.
///
/// A `&` without a later `;`, or a `<` without a later `>`, ends the scan:
/// the rest of the input is copied unchanged.
pub fn html_to_entities<R>(text: &str, resolver: &R) -> (String, Option<Vec<MessageEntity>>)
where
    R: AccessHashResolver + ?Sized,
{
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut offset = 0i32;
    let mut entities = EntityStack::new();
    let mut pos = 0;

    let mut push_str = |out: &mut String, s: &str| {
        out.push_str(s);
        offset = offset.saturating_add(utf16_len(s));
        offset
    };

    while pos < bytes.len() {
        let Some(next) = memchr2(b'&', b'<', &bytes[pos..]) else {
            push_str(&mut out, &text[pos..]);
            break;
        };
        let start = pos + next;
        let current = push_str(&mut out, &text[pos..start]);

        if bytes[start] == b'&' {
            let Some(semi) = memchr(b';', &bytes[start + 1..]) else {
                debug!("Unterminated character reference at byte {}", start);
                push_str(&mut out, &text[start..]);
                break;
            };
            let end = start + 1 + semi;
            let reference = &text[start..=end];
            match decode_reference(reference) {
                Some(c) => {
                    let mut buf = [0u8; 4];
                    push_str(&mut out, c.encode_utf8(&mut buf));
                }
                None => {
                    push_str(&mut out, reference);
                }
            }
            pos = end + 1;
        } else {
            let Some(close) = memchr(b'>', &bytes[start + 1..]) else {
                debug!("Unterminated tag at byte {}", start);
                push_str(&mut out, &text[start..]);
                break;
            };
            let end = start + 1 + close;
            let inner = &text[start + 1..end];
            let (tag, closing) = match inner.strip_prefix('/') {
                Some(tag) => (tag, true),
                None => (inner, false),
            };

            let action = tag_action(tag, closing, resolver);
            trace!("Tag {:?} at {} -> {:?}", inner, current, action);
            apply(&mut entities, action, current);
            pos = end + 1;
        }
    }

    (out, entities.finish())
}

fn apply(entities: &mut EntityStack, action: TagAction, offset: i32) {
    match action {
        TagAction::Open(kind) => entities.open(kind, offset),
        TagAction::Close(ty) => {
            if let Some(index) = entities.last_open_of(ty) {
                entities.close(index, offset);
            }
        }
        TagAction::CloseTopOf(types) => {
            if let Some(index) = entities.last_open() {
                if types.contains(&entities.type_at(index)) {
                    entities.close(index, offset);
                }
            }
        }
        TagAction::SetPreLanguage(language) => {
            if let Some(index) = entities.last_open_of(EntityType::Pre) {
                if let EntityKind::Pre { language: current } = entities.kind_mut(index) {
                    *current = language;
                }
            }
        }
        TagAction::Ignore => {}
    }
}

/// Decode a full `&...;` reference to the single UTF-16 code unit it stands for.
fn decode_reference(reference: &str) -> Option<char> {
    let body = reference.strip_prefix('&')?.strip_suffix(';')?;

    if let Some(number) = body.strip_prefix('#') {
        let (digits, radix) = match number.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16),
            None => (number, 10),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        let value = u32::from_str_radix(digits, radix).ok()?;
        return match value {
            0 => None,
            _ => char::from_u32(value).filter(|c| c.len_utf16() == 1),
        };
    }

    named_reference(body)
}

/// HTML 4 named character references.
fn named_reference(name: &str) -> Option<char> {
    let c = match name {
        "quot" => '\u{0022}',
        "amp" => '\u{0026}',
        "apos" => '\u{0027}',
        "lt" => '\u{003C}',
        "gt" => '\u{003E}',
        "nbsp" => '\u{00A0}',
        "iexcl" => '\u{00A1}',
        "cent" => '\u{00A2}',
        "pound" => '\u{00A3}',
        "curren" => '\u{00A4}',
        "yen" => '\u{00A5}',
        "brvbar" => '\u{00A6}',
        "sect" => '\u{00A7}',
        "uml" => '\u{00A8}',
        "copy" => '\u{00A9}',
        "ordf" => '\u{00AA}',
        "laquo" => '\u{00AB}',
        "not" => '\u{00AC}',
        "shy" => '\u{00AD}',
        "reg" => '\u{00AE}',
        "macr" => '\u{00AF}',
        "deg" => '\u{00B0}',
        "plusmn" => '\u{00B1}',
        "sup2" => '\u{00B2}',
        "sup3" => '\u{00B3}',
        "acute" => '\u{00B4}',
        "micro" => '\u{00B5}',
        "para" => '\u{00B6}',
        "middot" => '\u{00B7}',
        "cedil" => '\u{00B8}',
        "sup1" => '\u{00B9}',
        "ordm" => '\u{00BA}',
        "raquo" => '\u{00BB}',
        "frac14" => '\u{00BC}',
        "frac12" => '\u{00BD}',
        "frac34" => '\u{00BE}',
        "iquest" => '\u{00BF}',
        "Agrave" => '\u{00C0}',
        "Aacute" => '\u{00C1}',
        "Acirc" => '\u{00C2}',
        "Atilde" => '\u{00C3}',
        "Auml" => '\u{00C4}',
        "Aring" => '\u{00C5}',
        "AElig" => '\u{00C6}',
        "Ccedil" => '\u{00C7}',
        "Egrave" => '\u{00C8}',
        "Eacute" => '\u{00C9}',
        "Ecirc" => '\u{00CA}',
        "Euml" => '\u{00CB}',
        "Igrave" => '\u{00CC}',
        "Iacute" => '\u{00CD}',
        "Icirc" => '\u{00CE}',
        "Iuml" => '\u{00CF}',
        "ETH" => '\u{00D0}',
        "Ntilde" => '\u{00D1}',
        "Ograve" => '\u{00D2}',
        "Oacute" => '\u{00D3}',
        "Ocirc" => '\u{00D4}',
        "Otilde" => '\u{00D5}',
        "Ouml" => '\u{00D6}',
        "times" => '\u{00D7}',
        "Oslash" => '\u{00D8}',
        "Ugrave" => '\u{00D9}',
        "Uacute" => '\u{00DA}',
        "Ucirc" => '\u{00DB}',
        "Uuml" => '\u{00DC}',
        "Yacute" => '\u{00DD}',
        "THORN" => '\u{00DE}',
        "szlig" => '\u{00DF}',
        "agrave" => '\u{00E0}',
        "aacute" => '\u{00E1}',
        "acirc" => '\u{00E2}',
        "atilde" => '\u{00E3}',
        "auml" => '\u{00E4}',
        "aring" => '\u{00E5}',
        "aelig" => '\u{00E6}',
        "ccedil" => '\u{00E7}',
        "egrave" => '\u{00E8}',
        "eacute" => '\u{00E9}',
        "ecirc" => '\u{00EA}',
        "euml" => '\u{00EB}',
        "igrave" => '\u{00EC}',
        "iacute" => '\u{00ED}',
        "icirc" => '\u{00EE}',
        "iuml" => '\u{00EF}',
        "eth" => '\u{00F0}',
        "ntilde" => '\u{00F1}',
        "ograve" => '\u{00F2}',
        "oacute" => '\u{00F3}',
        "ocirc" => '\u{00F4}',
        "otilde" => '\u{00F5}',
        "ouml" => '\u{00F6}',
        "divide" => '\u{00F7}',
        "oslash" => '\u{00F8}',
        "ugrave" => '\u{00F9}',
        "uacute" => '\u{00FA}',
        "ucirc" => '\u{00FB}',
        "uuml" => '\u{00FC}',
        "yacute" => '\u{00FD}',
        "thorn" => '\u{00FE}',
        "yuml" => '\u{00FF}',
        "OElig" => '\u{0152}',
        "oelig" => '\u{0153}',
        "Scaron" => '\u{0160}',
        "scaron" => '\u{0161}',
        "Yuml" => '\u{0178}',
        "fnof" => '\u{0192}',
        "circ" => '\u{02C6}',
        "tilde" => '\u{02DC}',
        "Alpha" => '\u{0391}',
        "Beta" => '\u{0392}',
        "Gamma" => '\u{0393}',
        "Delta" => '\u{0394}',
        "Epsilon" => '\u{0395}',
        "Zeta" => '\u{0396}',
        "Eta" => '\u{0397}',
        "Theta" => '\u{0398}',
        "Iota" => '\u{0399}',
        "Kappa" => '\u{039A}',
        "Lambda" => '\u{039B}',
        "Mu" => '\u{039C}',
        "Nu" => '\u{039D}',
        "Xi" => '\u{039E}',
        "Omicron" => '\u{039F}',
        "Pi" => '\u{03A0}',
        "Rho" => '\u{03A1}',
        "Sigma" => '\u{03A3}',
        "Tau" => '\u{03A4}',
        "Upsilon" => '\u{03A5}',
        "Phi" => '\u{03A6}',
        "Chi" => '\u{03A7}',
        "Psi" => '\u{03A8}',
        "Omega" => '\u{03A9}',
        "alpha" => '\u{03B1}',
        "beta" => '\u{03B2}',
        "gamma" => '\u{03B3}',
        "delta" => '\u{03B4}',
        "epsilon" => '\u{03B5}',
        "zeta" => '\u{03B6}',
        "eta" => '\u{03B7}',
        "theta" => '\u{03B8}',
        "iota" => '\u{03B9}',
        "kappa" => '\u{03BA}',
        "lambda" => '\u{03BB}',
        "mu" => '\u{03BC}',
        "nu" => '\u{03BD}',
        "xi" => '\u{03BE}',
        "omicron" => '\u{03BF}',
        "pi" => '\u{03C0}',
        "rho" => '\u{03C1}',
        "sigmaf" => '\u{03C2}',
        "sigma" => '\u{03C3}',
        "tau" => '\u{03C4}',
        "upsilon" => '\u{03C5}',
        "phi" => '\u{03C6}',
        "chi" => '\u{03C7}',
        "psi" => '\u{03C8}',
        "omega" => '\u{03C9}',
        "thetasym" => '\u{03D1}',
        "upsih" => '\u{03D2}',
        "piv" => '\u{03D6}',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "zwnj" => '\u{200C}',
        "zwj" => '\u{200D}',
        "lrm" => '\u{200E}',
        "rlm" => '\u{200F}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201A}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "bdquo" => '\u{201E}',
        "dagger" => '\u{2020}',
        "Dagger" => '\u{2021}',
        "bull" => '\u{2022}',
        "hellip" => '\u{2026}',
        "permil" => '\u{2030}',
        "prime" => '\u{2032}',
        "Prime" => '\u{2033}',
        "lsaquo" => '\u{2039}',
        "rsaquo" => '\u{203A}',
        "oline" => '\u{203E}',
        "frasl" => '\u{2044}',
        "euro" => '\u{20AC}',
        "image" => '\u{2111}',
        "weierp" => '\u{2118}',
        "real" => '\u{211C}',
        "trade" => '\u{2122}',
        "alefsym" => '\u{2135}',
        "larr" => '\u{2190}',
        "uarr" => '\u{2191}',
        "rarr" => '\u{2192}',
        "darr" => '\u{2193}',
        "harr" => '\u{2194}',
        "crarr" => '\u{21B5}',
        "lArr" => '\u{21D0}',
        "uArr" => '\u{21D1}',
        "rArr" => '\u{21D2}',
        "dArr" => '\u{21D3}',
        "hArr" => '\u{21D4}',
        "forall" => '\u{2200}',
        "part" => '\u{2202}',
        "exist" => '\u{2203}',
        "empty" => '\u{2205}',
        "nabla" => '\u{2207}',
        "isin" => '\u{2208}',
        "notin" => '\u{2209}',
        "ni" => '\u{220B}',
        "prod" => '\u{220F}',
        "sum" => '\u{2211}',
        "minus" => '\u{2212}',
        "lowast" => '\u{2217}',
        "radic" => '\u{221A}',
        "prop" => '\u{221D}',
        "infin" => '\u{221E}',
        "ang" => '\u{2220}',
        "and" => '\u{2227}',
        "or" => '\u{2228}',
        "cap" => '\u{2229}',
        "cup" => '\u{222A}',
        "int" => '\u{222B}',
        "there4" => '\u{2234}',
        "sim" => '\u{223C}',
        "cong" => '\u{2245}',
        "asymp" => '\u{2248}',
        "ne" => '\u{2260}',
        "equiv" => '\u{2261}',
        "le" => '\u{2264}',
        "ge" => '\u{2265}',
        "sub" => '\u{2282}',
        "sup" => '\u{2283}',
        "nsub" => '\u{2284}',
        "sube" => '\u{2286}',
        "supe" => '\u{2287}',
        "oplus" => '\u{2295}',
        "otimes" => '\u{2297}',
        "perp" => '\u{22A5}',
        "sdot" => '\u{22C5}',
        "lceil" => '\u{2308}',
        "rceil" => '\u{2309}',
        "lfloor" => '\u{230A}',
        "rfloor" => '\u{230B}',
        "lang" => '\u{2329}',
        "rang" => '\u{232A}',
        "loz" => '\u{25CA}',
        "spades" => '\u{2660}',
        "clubs" => '\u{2663}',
        "hearts" => '\u{2665}',
        "diams" => '\u{2666}',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::escape_html;
    use crate::resolver::{MockAccessHashResolver, NoAccessHashes};
    use mockall::predicate::eq;

    fn parse(text: &str) -> (String, Option<Vec<MessageEntity>>) {
        html_to_entities(text, &NoAccessHashes)
    }

    fn entity(kind: EntityKind, offset: i32, length: i32) -> MessageEntity {
        MessageEntity::new(kind, offset, length)
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("hello world"), ("hello world".to_string(), None));
    }

    #[test]
    fn test_basic_tags() {
        let (text, entities) = parse("<b>b</b> <i>i</i> <u>u</u> <s>s</s> <code>c</code>");
        assert_eq!(text, "b i u s c");
        assert_eq!(
            entities,
            Some(vec![
                entity(EntityKind::Bold, 0, 1),
                entity(EntityKind::Italic, 2, 1),
                entity(EntityKind::Underline, 4, 1),
                entity(EntityKind::Strike, 6, 1),
                entity(EntityKind::Code, 8, 1),
            ])
        );
    }

    #[test]
    fn test_tag_aliases() {
        let (text, entities) = parse("<strong>a</strong><em>b</em><ins>c</ins><del>d</del><strike>e</strike>");
        assert_eq!(text, "abcde");
        let types: Vec<EntityType> = entities
            .unwrap()
            .iter()
            .map(MessageEntity::entity_type)
            .collect();
        assert_eq!(
            types,
            vec![
                EntityType::Bold,
                EntityType::Italic,
                EntityType::Underline,
                EntityType::Strike,
                EntityType::Strike,
            ]
        );
    }

    #[test]
    fn test_nested_same_kind() {
        let (text, entities) = parse("<b>a<b>b</b>c</b>");
        assert_eq!(text, "abc");
        assert_eq!(
            entities,
            Some(vec![
                entity(EntityKind::Bold, 0, 3),
                entity(EntityKind::Bold, 1, 1),
            ])
        );
    }

    #[test]
    fn test_stray_closing_tag_ignored() {
        let (text, entities) = parse("a</b>b");
        assert_eq!(text, "ab");
        assert!(entities.is_none());
    }

    #[test]
    fn test_spoiler_closed_by_any_span() {
        let (text, entities) = parse("<tg-spoiler>x</span>");
        assert_eq!(text, "x");
        assert_eq!(entities, Some(vec![entity(EntityKind::Spoiler, 0, 1)]));

        let (text, entities) = parse(r#"<span class="tg-spoiler">y</span>"#);
        assert_eq!(text, "y");
        assert_eq!(entities, Some(vec![entity(EntityKind::Spoiler, 0, 1)]));
    }

    #[test]
    fn test_plain_span_does_not_open() {
        let (text, entities) = parse("<span>z</span>");
        assert_eq!(text, "z");
        assert!(entities.is_none());
    }

    #[test]
    fn test_link() {
        let (text, entities) = parse(r#"see <a href="https://example.com">site</a>!"#);
        assert_eq!(text, "see site!");
        assert_eq!(
            entities,
            Some(vec![entity(
                EntityKind::TextUrl {
                    url: "https://example.com".to_string()
                },
                4,
                4
            )])
        );
    }

    #[test]
    fn test_link_close_requires_link_on_top() {
        let (text, entities) = parse(r#"<a href="u">x<b>y</a>z</b>"#);
        assert_eq!(text, "xyz");
        assert_eq!(entities, Some(vec![entity(EntityKind::Bold, 1, 2)]));
    }

    #[test]
    fn test_mention() {
        let mut resolver = MockAccessHashResolver::new();
        resolver
            .expect_access_hash()
            .with(eq(42))
            .times(1)
            .returning(|_| Some(99));

        let (text, entities) = html_to_entities(r#"<a href="tg://user?id=42">Bob</a>"#, &resolver);
        assert_eq!(text, "Bob");
        assert_eq!(
            entities,
            Some(vec![entity(
                EntityKind::MentionName {
                    user_id: 42,
                    access_hash: 99
                },
                0,
                3
            )])
        );

        let (_, entities) = parse(r#"<a href="tg://user?id=42">Bob</a>"#);
        assert_eq!(
            entities,
            Some(vec![entity(
                EntityKind::TextUrl {
                    url: "tg://user?id=42".to_string()
                },
                0,
                3
            )])
        );
    }

    #[test]
    fn test_pre_with_language() {
        let (text, entities) =
            parse(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#);
        assert_eq!(text, "fn main() {}");
        assert_eq!(
            entities,
            Some(vec![entity(
                EntityKind::Pre {
                    language: "rust".to_string()
                },
                0,
                12
            )])
        );
    }

    #[test]
    fn test_language_without_pre_ignored() {
        let (text, entities) = parse(r#"<code class="language-rust">x</code>"#);
        assert_eq!(text, "x");
        assert!(entities.is_none());
    }

    #[test]
    fn test_unknown_tags_removed() {
        let (text, entities) = parse("a<br>b<blockquote>c</blockquote><b class=\"x\">d</b>");
        assert_eq!(text, "abcd");
        assert!(entities.is_none());
    }

    #[test]
    fn test_character_references() {
        let (text, entities) = parse("a &lt;b&gt; &amp; &quot;c&quot; &#228; &#x20AC; &eacute;");
        assert_eq!(text, "a <b> & \"c\" ä € é");
        assert!(entities.is_none());
    }

    #[test]
    fn test_astral_reference_kept() {
        let (text, entities) = parse("a&#x1F980;b &#129408; <b>&#x1f980;</b>");
        assert_eq!(text, "a&#x1F980;b &#129408; &#x1f980;");
        assert_eq!(entities, Some(vec![entity(EntityKind::Bold, 22, 9)]));
        assert_eq!(decode_reference("&#xFFFF;"), Some('\u{FFFF}'));
        assert_eq!(decode_reference("&#x10000;"), None);
    }

    #[test]
    fn test_decoded_reference_not_reinterpreted() {
        let (text, entities) = parse("&amp;lt;b&amp;gt;");
        assert_eq!(text, "&lt;b&gt;");
        assert!(entities.is_none());
    }

    #[test]
    fn test_unknown_reference_kept() {
        let (text, _) = parse("fish &chips; &#0; &#xZZ; ok");
        assert_eq!(text, "fish &chips; &#0; &#xZZ; ok");
    }

    #[test]
    fn test_unterminated_tag_stops_scan() {
        let (text, entities) = parse("<b>bold</b> and <i>more &amp; <oops");
        assert_eq!(text, "bold and more & <oops");
        assert_eq!(entities, Some(vec![entity(EntityKind::Bold, 0, 4)]));
    }

    #[test]
    fn test_unterminated_reference_stops_scan() {
        let (text, entities) = parse("a & b <b>c</b>");
        assert_eq!(text, "a & b <b>c</b>");
        assert!(entities.is_none());
    }

    #[test]
    fn test_unclosed_tag_dropped() {
        let (text, entities) = parse("abc<b>def");
        assert_eq!(text, "abcdef");
        assert!(entities.is_none());
    }

    #[test]
    fn test_utf16_offsets() {
        let (text, entities) = parse("🦀 <b>crab</b>");
        assert_eq!(text, "🦀 crab");
        let entities = entities.unwrap();
        assert_eq!(entities, vec![entity(EntityKind::Bold, 3, 4)]);
        assert_eq!(entities[0].slice(&text), Some("crab"));
    }

    #[test]
    fn test_tag_action_table() {
        assert_eq!(
            tag_action("b", false, &NoAccessHashes),
            TagAction::Open(EntityKind::Bold)
        );
        assert_eq!(
            tag_action("b", true, &NoAccessHashes),
            TagAction::Close(EntityType::Bold)
        );
        assert_eq!(
            tag_action("span", true, &NoAccessHashes),
            TagAction::Close(EntityType::Spoiler)
        );
        assert_eq!(tag_action("span", false, &NoAccessHashes), TagAction::Ignore);
        assert_eq!(
            tag_action("a", true, &NoAccessHashes),
            TagAction::CloseTopOf(LINK_TYPES)
        );
        assert_eq!(
            tag_action(r#"code class="language-go""#, false, &NoAccessHashes),
            TagAction::SetPreLanguage("go".to_string())
        );
        assert_eq!(tag_action(r#"a href=""#, false, &NoAccessHashes), TagAction::Ignore);
    }

    #[test]
    fn test_escape_round_trip() {
        let samples = [
            "plain",
            "<b>not bold</b>",
            "a & b; c",
            "&amp; &lt;tag&gt; &#65;",
            "x < y > z",
            "emoji 🦀 & ünïcode",
        ];
        for sample in samples {
            let (text, entities) = parse(&escape_html(sample));
            assert_eq!(text, sample);
            assert!(entities.is_none(), "unexpected entities for {:?}", sample);
        }
    }
}
