/*
 * tokenizer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin source tokenizer.
//!
//! Splits skin source into literal text and macro tags:
//!
//! ```text
//! <% name positional "quoted" 3 [a, b] {k: v} <% nested %> key=value | filter arg %>
//! ```
//!
//! `<%-- ... --%>` is a comment and produces no token. The tokenizer does not
//! know about `extends`, `subskin` or the builtins; it only builds [`Node`]s.

use indexmap::IndexMap;

use crate::error::{SkinError, SkinResult};
use crate::node::{Node, Param};

const OPEN: &str = "<%";
const CLOSE: &str = "%>";
const COMMENT_OPEN: &str = "<%--";
const COMMENT_CLOSE: &str = "--%>";

/// A tokenizer event.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text between tags.
    Text(String),
    /// A macro tag.
    Macro(Node),
}

/// Tokenize skin source. `origin` is only used in error messages.
pub fn tokenize(source: &str, origin: &str) -> SkinResult<Vec<Token>> {
    Tokenizer {
        src: source,
        pos: 0,
        origin,
    }
    .run()
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    origin: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn run(mut self) -> SkinResult<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut text = String::new();

        while self.pos < self.src.len() {
            let rest = self.rest();
            let Some(offset) = rest.find(OPEN) else {
                text.push_str(rest);
                self.pos = self.src.len();
                break;
            };
            text.push_str(&rest[..offset]);
            self.pos += offset;

            if self.rest().starts_with(COMMENT_OPEN) {
                self.skip_comment()?;
                continue;
            }

            if !text.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut text)));
            }
            let node = self.tag()?;
            tokens.push(Token::Macro(node));
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> SkinError {
        let line = self.src[..self.pos].matches('\n').count() + 1;
        SkinError::ParseError {
            origin: self.origin.to_string(),
            message: format!("line {}: {}", line, message.into()),
        }
    }

    fn skip_comment(&mut self) -> SkinResult<()> {
        match self.rest().find(COMMENT_CLOSE) {
            Some(offset) => {
                self.pos += offset + COMMENT_CLOSE.len();
                Ok(())
            }
            None => Err(self.error("unterminated comment")),
        }
    }

    /// Parse a whole `<% ... %>` tag, positioned at its opening delimiter.
    fn tag(&mut self) -> SkinResult<Node> {
        self.pos += OPEN.len();
        self.skip_ws();
        let name = self.word();
        if name.is_empty() {
            return Err(self.error("expected macro name after '<%'"));
        }
        let node = self.macro_body(name)?;
        if !self.at(CLOSE) {
            return Err(self.error("unterminated macro tag, expected '%>'"));
        }
        self.pos += CLOSE.len();
        Ok(node)
    }

    /// Parameters and filters of a macro or filter, up to (not including) `%>`.
    fn macro_body(&mut self, name: String) -> SkinResult<Node> {
        let mut node = Node::new(name);
        loop {
            self.skip_ws();
            if self.pos >= self.src.len() || self.at(CLOSE) {
                return Ok(node);
            }
            if self.at("|") {
                self.bump();
                self.skip_ws();
                let filter_name = self.word();
                if filter_name.is_empty() {
                    return Err(self.error("expected filter name after '|'"));
                }
                node.filter = Some(Box::new(self.macro_body(filter_name)?));
                return Ok(node);
            }
            match self.named_key() {
                Some(key) => {
                    let value = self.value(false)?;
                    node.named.insert(key, value);
                }
                None => node.parameters.push(self.value(false)?),
            }
        }
    }

    /// Consume `key=` if present.
    fn named_key(&mut self) -> Option<String> {
        let start = self.pos;
        let key = self.word();
        if !key.is_empty() && self.at("=") {
            self.bump();
            return Some(key);
        }
        self.pos = start;
        None
    }

    /// An identifier: macro, filter, map key or named-parameter name.
    fn word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '$'))
        {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn value(&mut self, in_collection: bool) -> SkinResult<Param> {
        if self.at(OPEN) {
            return Ok(Param::Node(self.tag()?));
        }
        match self.peek() {
            Some(quote @ ('"' | '\'')) => Ok(Param::Text(self.quoted(quote)?)),
            Some('[') => self.list(),
            Some('{') => self.map(),
            Some(_) => {
                let bare = self.bare(in_collection);
                if bare.is_empty() {
                    return Err(self.error(format!("unexpected '{}'", self.peek().unwrap_or(' '))));
                }
                Ok(classify(bare))
            }
            None => Err(self.error("unexpected end of source")),
        }
    }

    fn bare(&mut self, in_collection: bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace()
                || c == '|'
                || self.at(CLOSE)
                || self.at(OPEN)
                || (in_collection && matches!(c, ',' | ']' | '}'))
            {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn quoted(&mut self, quote: char) -> SkinResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(self.error("unterminated string literal"))
    }

    fn list(&mut self) -> SkinResult<Param> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Param::List(items));
                }
                Some(_) if !self.at(CLOSE) => items.push(self.value(true)?),
                _ => return Err(self.error("unterminated list, expected ']'")),
            }
        }
    }

    fn map(&mut self) -> SkinResult<Param> {
        self.bump();
        let mut entries: IndexMap<String, Param> = IndexMap::new();
        loop {
            self.skip_separators();
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Param::Map(entries.into_iter().collect()));
                }
                Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
                Some(_) if !self.at(CLOSE) => self.word(),
                _ => return Err(self.error("unterminated map, expected '}'")),
            };
            if key.is_empty() {
                return Err(self.error("expected map key"));
            }
            self.skip_ws();
            if !matches!(self.peek(), Some(':' | '=')) {
                return Err(self.error(format!("expected ':' after map key '{}'", key)));
            }
            self.bump();
            self.skip_ws();
            let value = self.value(true)?;
            entries.insert(key, value);
        }
    }

    fn skip_separators(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace() || c == ',') {
            self.bump();
        }
    }
}

/// Classify a bare word as a keyword literal, number or text.
fn classify(bare: &str) -> Param {
    match bare {
        "true" => return Param::Bool(true),
        "false" => return Param::Bool(false),
        "null" => return Param::Null,
        _ => {}
    }
    let numeric = bare
        .trim_start_matches(['-', '+'])
        .starts_with(|c: char| c.is_ascii_digit());
    if numeric {
        if let Ok(n) = bare.parse::<i64>() {
            return Param::Int(n);
        }
        if let Ok(f) = bare.parse::<f64>() {
            return Param::Float(f);
        }
    }
    Param::Text(bare.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn macros(source: &str) -> Vec<Node> {
        tokenize(source, "<test>")
            .unwrap()
            .into_iter()
            .filter_map(|t| match t {
                Token::Macro(node) => Some(node),
                Token::Text(_) => None,
            })
            .collect()
    }

    fn single(source: &str) -> Node {
        let mut nodes = macros(source);
        assert_eq!(nodes.len(), 1, "expected exactly one macro in {source:?}");
        nodes.remove(0)
    }

    #[test]
    fn test_text_and_macro() {
        let tokens = tokenize("before <% value %> after", "<test>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("before ".to_string()),
                Token::Macro(Node::new("value")),
                Token::Text(" after".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_text() {
        let tokens = tokenize("no tags % > here", "<test>").unwrap();
        assert_eq!(tokens, vec![Token::Text("no tags % > here".to_string())]);
        assert!(tokenize("", "<test>").unwrap().is_empty());
    }

    #[test]
    fn test_parameters() {
        let node = single(r#"<% echo word "two words" 'single' 42 -1.5 true null %>"#);
        assert_eq!(node.name, "echo");
        assert_eq!(
            node.parameters,
            vec![
                Param::from("word"),
                Param::from("two words"),
                Param::from("single"),
                Param::Int(42),
                Param::Float(-1.5),
                Param::Bool(true),
                Param::Null,
            ]
        );
    }

    #[test]
    fn test_named_parameters() {
        let node = single(r#"<% echo a separator=", " wrap=["<b>", "</b>"] %>"#);
        assert_eq!(node.parameters, vec![Param::from("a")]);
        assert_eq!(node.named_parameter("separator"), Some(&Param::from(", ")));
        assert_eq!(
            node.named_parameter("wrap"),
            Some(&Param::List(vec![Param::from("<b>"), Param::from("</b>")]))
        );
    }

    #[test]
    fn test_nested_macro() {
        let node = single("<% for x in <% xs %> render item %>");
        assert_eq!(node.parameters.len(), 5);
        assert_eq!(node.parameters[2], Param::Node(Node::new("xs")));
        assert_eq!(node.parameters[4], Param::from("item"));
    }

    #[test]
    fn test_nested_macro_without_spaces() {
        let node = single("<% if <%x%> render tt%>");
        assert_eq!(node.parameters[0], Param::Node(Node::new("x")));
        assert_eq!(node.parameters[2], Param::from("tt"));
    }

    #[test]
    fn test_map_parameter() {
        let node = single(r#"<% set {title: "Home", count: 3, user: <% user.name %>} render item %>"#);
        assert_eq!(
            node.parameters[0],
            Param::Map(vec![
                ("title".to_string(), Param::from("Home")),
                ("count".to_string(), Param::Int(3)),
                ("user".to_string(), Param::Node(Node::new("user.name"))),
            ])
        );
        assert_eq!(node.parameters[1], Param::from("render"));
    }

    #[test]
    fn test_filter_chain() {
        let node = single("<% v | f1 | f2 20 %>");
        let filters: Vec<&Node> = node.filters().collect();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].name, "f1");
        assert_eq!(filters[1].name, "f2");
        assert_eq!(filters[1].parameters, vec![Param::Int(20)]);
    }

    #[test]
    fn test_filter_on_nested_macro_stays_nested() {
        let node = single("<% echo <% a | upper %> b %>");
        assert!(node.filter.is_none());
        match &node.parameters[0] {
            Param::Node(inner) => assert_eq!(inner.filters().count(), 1),
            other => panic!("Expected nested node, got {other:?}"),
        }
    }

    #[test]
    fn test_dotted_and_dashed_names() {
        let node = single("<% site.page-title x-wrap=[a, b] %>");
        assert_eq!(node.name, "site.page-title");
        assert!(node.named_parameter("x-wrap").is_some());
    }

    #[test]
    fn test_comment() {
        let tokens = tokenize("a<%-- ignored <% x %> --%>b", "<test>").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Text("ab".to_string())]
        );
    }

    #[test]
    fn test_escapes_in_strings() {
        let node = single(r#"<% echo "say \"hi\"\n" %>"#);
        assert_eq!(node.parameters[0], Param::from("say \"hi\"\n"));
    }

    #[test]
    fn test_unterminated_tag() {
        let err = tokenize("line one\n<% value", "page.skin").unwrap_err();
        match err {
            SkinError::ParseError { origin, message } => {
                assert_eq!(origin, "page.skin");
                assert!(message.starts_with("line 2"), "{message}");
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string_and_list() {
        assert!(tokenize(r#"<% echo "open %>"#, "<test>").is_err());
        assert!(tokenize("<% echo [a, b %>", "<test>").is_err());
        assert!(tokenize("<% set {a: 1 %>", "<test>").is_err());
    }

    #[test]
    fn test_missing_name() {
        assert!(tokenize("<% %>", "<test>").is_err());
        assert!(tokenize("<% x | %>", "<test>").is_err());
    }
}
