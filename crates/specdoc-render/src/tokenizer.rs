//! Lenient HTML tokenizer.
//!
//! Splits source text into tags, text, comments and doctypes. Text and
//! attribute values are kept verbatim (entities are not decoded) so that
//! serializing the tokens reproduces the source markup. Only structural
//! problems are reported: unterminated tags, comments and attribute values.

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["pre", "script", "style", "textarea", "xmp"];

/// Whether the content of this start tag is read as raw text.
///
/// `<pre class="metadata">` is the one `<pre>` whose content is parsed.
fn is_raw_text(name: &str, attrs: &[Attribute]) -> bool {
    if !RAW_TEXT_ELEMENTS.contains(&name) {
        return false;
    }
    name != "pre"
        || !attrs.iter().any(|a| {
            a.name == "class"
                && a.value
                    .as_deref()
                    .is_some_and(|v| v.split_whitespace().any(|c| c == "metadata"))
        })
}

/// A single attribute as written in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Attribute {
    pub name: String,
    /// `None` for boolean attributes (`<input disabled>`).
    pub value: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
        offset: usize,
    },
    EndTag {
        name: String,
        offset: usize,
    },
    Comment(String),
    Doctype(String),
}

/// Structural error found while tokenizing.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TokenError {
    pub offset: usize,
    pub message: String,
}

impl TokenError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Maps byte offsets to 1-based line and column numbers.
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(src: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    pub(crate) fn locate(&self, src: &str, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.starts[line];
        let column = src
            .get(start..offset)
            .map_or(offset - start, |s| s.chars().count())
            + 1;
        (line + 1, column)
    }
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, TokenError> {
    Tokenizer {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        text: String::new(),
    }
    .run()
}

struct Tokenizer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    text: String,
}

impl Tokenizer<'_> {
    fn run(mut self) -> Result<Vec<Token>, TokenError> {
        while self.pos < self.bytes.len() {
            let Some(lt) = self.find_from(self.pos, "<") else {
                self.text.push_str(&self.src[self.pos..]);
                break;
            };
            self.text.push_str(&self.src[self.pos..lt]);
            self.pos = lt;

            match self.bytes.get(lt + 1) {
                Some(b'!') => self.markup_declaration()?,
                Some(b'?') => self.bogus_comment(lt + 2)?,
                Some(b'/') if self.bytes.get(lt + 2).is_some_and(u8::is_ascii_alphabetic) => {
                    self.end_tag()?;
                }
                Some(c) if c.is_ascii_alphabetic() => self.start_tag()?,
                _ => {
                    // A lone `<` is literal text.
                    self.text.push('<');
                    self.pos += 1;
                }
            }
        }
        self.flush_text();
        Ok(self.tokens)
    }

    fn find_from(&self, from: usize, needle: &str) -> Option<usize> {
        self.src[from..].find(needle).map(|i| from + i)
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.tokens.push(Token::Text(std::mem::take(&mut self.text)));
        }
    }

    fn push(&mut self, token: Token) {
        self.flush_text();
        self.tokens.push(token);
    }

    fn markup_declaration(&mut self) -> Result<(), TokenError> {
        let start = self.pos;
        if self.src[start..].starts_with("<!--") {
            let end = self
                .find_from(start + 4, "-->")
                .ok_or_else(|| TokenError::new(start, "unterminated comment"))?;
            let body = self.src[start + 4..end].to_owned();
            self.push(Token::Comment(body));
            self.pos = end + 3;
            return Ok(());
        }

        let is_doctype = self
            .src
            .get(start + 2..start + 9)
            .is_some_and(|s| s.eq_ignore_ascii_case("doctype"));
        if is_doctype {
            let end = self
                .find_from(start, ">")
                .ok_or_else(|| TokenError::new(start, "unterminated doctype"))?;
            let body = self.src[start + 2..end].to_owned();
            self.push(Token::Doctype(body));
            self.pos = end + 1;
            return Ok(());
        }

        self.bogus_comment(start + 2)
    }

    fn bogus_comment(&mut self, body_start: usize) -> Result<(), TokenError> {
        let start = self.pos;
        let end = self
            .find_from(body_start, ">")
            .ok_or_else(|| TokenError::new(start, "unterminated markup declaration"))?;
        let body = self.src[body_start..end].to_owned();
        self.push(Token::Comment(body));
        self.pos = end + 1;
        Ok(())
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&c| c.is_ascii_alphanumeric() || c == b'-' || c == b':' || c == b'_')
        {
            self.pos += 1;
        }
        self.src[start..self.pos].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn end_tag(&mut self) -> Result<(), TokenError> {
        let offset = self.pos;
        self.pos += 2;
        let name = self.read_name();
        let close = self
            .find_from(self.pos, ">")
            .ok_or_else(|| TokenError::new(offset, format!("unterminated end tag </{name}")))?;
        self.pos = close + 1;
        self.push(Token::EndTag { name, offset });
        Ok(())
    }

    fn start_tag(&mut self) -> Result<(), TokenError> {
        let offset = self.pos;
        self.pos += 1;
        let name = self.read_name();
        let unterminated = || TokenError::new(offset, format!("unterminated tag <{name}"));

        let mut attrs = Vec::new();
        let self_closing = loop {
            self.skip_whitespace();
            match self.bytes.get(self.pos) {
                None => return Err(unterminated()),
                Some(b'>') => {
                    self.pos += 1;
                    break false;
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    break true;
                }
                Some(b'/') => self.pos += 1,
                Some(b'"' | b'\'' | b'<' | b'=') => {
                    return Err(TokenError::new(
                        self.pos,
                        format!("unexpected character in tag <{name}"),
                    ));
                }
                Some(_) => attrs.push(self.attribute(offset)?),
            }
        };

        let raw = !self_closing && is_raw_text(&name, &attrs);
        self.push(Token::StartTag {
            name: name.clone(),
            attrs,
            self_closing,
            offset,
        });

        if raw {
            let closing = format!("</{name}");
            let end = self.src[self.pos..]
                .to_ascii_lowercase()
                .find(&closing)
                .map(|i| self.pos + i)
                .ok_or_else(|| TokenError::new(offset, format!("unclosed <{name}>")))?;
            self.text.push_str(&self.src[self.pos..end]);
            self.pos = end;
        }
        Ok(())
    }

    fn attribute(&mut self, tag_offset: usize) -> Result<Attribute, TokenError> {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&c| !c.is_ascii_whitespace() && !matches!(c, b'=' | b'>' | b'/'))
        {
            self.pos += 1;
        }
        let name = self.src[start..self.pos].to_ascii_lowercase();

        self.skip_whitespace();
        if self.bytes.get(self.pos) != Some(&b'=') {
            return Ok(Attribute { name, value: None });
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match self.bytes.get(self.pos) {
            None => return Err(TokenError::new(tag_offset, "unterminated tag")),
            Some(&quote @ (b'"' | b'\'')) => {
                let quote = char::from(quote).to_string();
                let value_start = self.pos + 1;
                let end = self.find_from(value_start, &quote).ok_or_else(|| {
                    TokenError::new(self.pos, format!("unterminated value for attribute {name}"))
                })?;
                self.pos = end + 1;
                self.src[value_start..end].to_owned()
            }
            Some(_) => {
                let value_start = self.pos;
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|&c| !c.is_ascii_whitespace() && c != b'>')
                {
                    self.pos += 1;
                }
                self.src[value_start..self.pos].to_owned()
            }
        };

        Ok(Attribute {
            name,
            value: Some(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attr(name: &str, value: Option<&str>) -> Attribute {
        Attribute {
            name: name.to_owned(),
            value: value.map(str::to_owned),
        }
    }

    #[test]
    fn test_text_and_tags() {
        let tokens = tokenize("<p class=intro>Hi <b>there</b></p>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "p".to_owned(),
                    attrs: vec![attr("class", Some("intro"))],
                    self_closing: false,
                    offset: 0,
                },
                Token::Text("Hi ".to_owned()),
                Token::StartTag {
                    name: "b".to_owned(),
                    attrs: vec![],
                    self_closing: false,
                    offset: 18,
                },
                Token::Text("there".to_owned()),
                Token::EndTag {
                    name: "b".to_owned(),
                    offset: 26,
                },
                Token::EndTag {
                    name: "p".to_owned(),
                    offset: 30,
                },
            ]
        );
    }

    #[test]
    fn test_attribute_forms() {
        let tokens = tokenize(r#"<emu-clause id="sec-a" data-x='1' hidden normative=yes />"#).unwrap();
        let Token::StartTag {
            attrs,
            self_closing,
            ..
        } = &tokens[0]
        else {
            panic!("expected start tag");
        };
        assert!(*self_closing);
        assert_eq!(
            attrs,
            &vec![
                attr("id", Some("sec-a")),
                attr("data-x", Some("1")),
                attr("hidden", None),
                attr("normative", Some("yes")),
            ]
        );
    }

    #[test]
    fn test_doctype_and_comment() {
        let tokens = tokenize("<!doctype html><!-- note -->x").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Doctype("doctype html".to_owned()),
                Token::Comment(" note ".to_owned()),
                Token::Text("x".to_owned()),
            ]
        );
    }

    #[test]
    fn test_lone_less_than_is_text() {
        let tokens = tokenize("a < b and c <= d").unwrap();
        assert_eq!(tokens, vec![Token::Text("a < b and c <= d".to_owned())]);
    }

    #[test]
    fn test_script_is_raw_text() {
        let tokens = tokenize("<script>if (a<b) {}</script>").unwrap();
        assert_eq!(tokens[1], Token::Text("if (a<b) {}".to_owned()));
        assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "script"));
    }

    #[test]
    fn test_pre_is_raw_text() {
        let tokens = tokenize("<pre><code>if (a<b) { x(); }</code></pre>").unwrap();
        assert_eq!(
            tokens[1],
            Token::Text("<code>if (a<b) { x(); }</code>".to_owned())
        );
        assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "pre"));
    }

    #[test]
    fn test_metadata_pre_is_markup() {
        let tokens = tokenize("<pre class=\"metadata\">title: <b>X</b></pre>").unwrap();
        assert!(matches!(&tokens[2], Token::StartTag { name, .. } if name == "b"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("ok <!-- never closed").unwrap_err();
        assert_eq!(err.offset, 3);
        assert_eq!(err.message, "unterminated comment");
    }

    #[test]
    fn test_unterminated_tag() {
        let err = tokenize("<emu-clause id=\"a\"").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_unterminated_attribute_value() {
        let err = tokenize("<a href=\"#x>text</a>").unwrap_err();
        assert!(err.message.contains("attribute href"));
    }

    #[test]
    fn test_line_index() {
        let src = "ab\ncd\n\u{e9}f";
        let index = LineIndex::new(src);
        assert_eq!(index.locate(src, 0), (1, 1));
        assert_eq!(index.locate(src, 4), (2, 2));
        assert_eq!(index.locate(src, 8), (3, 2));
    }
}
