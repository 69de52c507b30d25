// ABOUTME: Inline markup tokenizer for `**bold**` spans
// ABOUTME: Builds an arena-backed token tree and regenerates Markdown from it

use once_cell::sync::Lazy;
use regex::Regex;

/// Leftmost, non-greedy bold span. Shared with the paragraph parser.
pub(crate) static BOLD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

pub const ROOT_ID: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Root,
    Bold,
    Text,
    /// A collapsed subtree, carrying the plain text of everything under it.
    Merged,
}

/// One node of a line's token tree. `id` is the token's index in the arena
/// and grows in discovery order; `parent` is an index as well, so the tree
/// has no reference cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: usize,
    pub parent: Option<usize>,
    pub kind: TokenKind,
    pub content: String,
    children: Vec<usize>,
}

impl Token {
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTree {
    tokens: Vec<Token>,
}

impl TokenTree {
    /// Tokenize a single line. Text before a match becomes a `Text` token,
    /// the match a `Bold` token whose inner text is tokenized recursively
    /// under it, and anything after the last match a trailing `Text`.
    pub fn tokenize(line: &str) -> Self {
        let mut tree = TokenTree {
            tokens: vec![Token {
                id: ROOT_ID,
                parent: None,
                kind: TokenKind::Root,
                content: String::new(),
                children: Vec::new(),
            }],
        };
        tree.tokenize_into(ROOT_ID, line);
        tree
    }

    fn tokenize_into(&mut self, parent: usize, text: &str) {
        let mut cursor = 0;
        for caps in BOLD_REGEX.captures_iter(text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > cursor {
                self.push(parent, TokenKind::Text, &text[cursor..whole.start()]);
            }
            let bold = self.push(parent, TokenKind::Bold, "");
            self.tokenize_into(bold, inner.as_str());
            let content = self.plain_text(bold);
            self.tokens[bold].content = content;
            cursor = whole.end();
        }
        if cursor < text.len() {
            self.push(parent, TokenKind::Text, &text[cursor..]);
        }
    }

    fn push(&mut self, parent: usize, kind: TokenKind, content: &str) -> usize {
        let id = self.tokens.len();
        self.tokens.push(Token {
            id,
            parent: Some(parent),
            kind,
            content: content.to_string(),
            children: Vec::new(),
        });
        self.tokens[parent].children.push(id);
        id
    }

    pub fn get(&self, id: usize) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn children(&self, id: usize) -> impl Iterator<Item = &Token> + '_ {
        self.tokens
            .get(id)
            .map(|t| t.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&child| &self.tokens[child])
    }

    /// Reachable tokens in discovery order (each parent before its children).
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::with_capacity(self.tokens.len());
        let mut stack = vec![ROOT_ID];
        while let Some(id) = stack.pop() {
            let token = &self.tokens[id];
            out.push(token);
            stack.extend(token.children.iter().rev());
        }
        out
    }

    /// Text under `id` with all markers stripped.
    pub fn plain_text(&self, id: usize) -> String {
        let mut out = String::new();
        self.write_plain(id, &mut out);
        out
    }

    fn write_plain(&self, id: usize, out: &mut String) {
        let token = &self.tokens[id];
        match token.kind {
            TokenKind::Text | TokenKind::Merged => out.push_str(&token.content),
            TokenKind::Root | TokenKind::Bold => {
                for &child in &token.children {
                    self.write_plain(child, out);
                }
            }
        }
    }

    /// Regenerate the Markdown line this tree was built from.
    pub fn generate(&self) -> String {
        let mut out = String::new();
        self.write_markdown(ROOT_ID, &mut out);
        out
    }

    fn write_markdown(&self, id: usize, out: &mut String) {
        let token = &self.tokens[id];
        match token.kind {
            TokenKind::Text | TokenKind::Merged => out.push_str(&token.content),
            TokenKind::Root => {
                for &child in &token.children {
                    self.write_markdown(child, out);
                }
            }
            TokenKind::Bold => {
                out.push_str("**");
                for &child in &token.children {
                    self.write_markdown(child, out);
                }
                out.push_str("**");
            }
        }
    }

    /// Collapse the subtree at `id` into a single `Merged` token holding its
    /// plain text. The root cannot be merged.
    pub fn merge(&mut self, id: usize) -> bool {
        if id == ROOT_ID || id >= self.tokens.len() {
            return false;
        }
        let content = self.plain_text(id);
        let token = &mut self.tokens[id];
        token.kind = TokenKind::Merged;
        token.content = content;
        token.children.clear();
        true
    }

    /// Merge every bold nested inside another bold. Style spans are flat,
    /// so an inner span has nowhere to go. The non-greedy bold pattern never
    /// nests on its own; this only changes trees assembled by hand.
    pub fn flatten_nested(&mut self) {
        let nested: Vec<usize> = self
            .tokens()
            .into_iter()
            .filter(|t| t.kind == TokenKind::Bold && self.has_bold_ancestor(t.id))
            .map(|t| t.id)
            .collect();
        for id in nested {
            self.merge(id);
        }
    }

    fn has_bold_ancestor(&self, id: usize) -> bool {
        let mut current = self.tokens[id].parent;
        while let Some(parent) = current {
            if self.tokens[parent].kind == TokenKind::Bold {
                return true;
            }
            current = self.tokens[parent].parent;
        }
        false
    }
}

pub fn tokenize_lines(markdown: &str) -> Vec<TokenTree> {
    markdown.split('\n').map(TokenTree::tokenize).collect()
}

pub fn generate_lines(lines: &[TokenTree]) -> String {
    lines
        .iter()
        .map(TokenTree::generate)
        .collect::<Vec<_>>()
        .join("\n")
}
