// ABOUTME: Parses local Markdown entries back into FANBOX posts
// ABOUTME: Classifies each line by priority and extracts bold spans

use crate::inline::{TokenKind, TokenTree, ROOT_ID};
use crate::model::{Block, Entry, Post, PostBody, StyleSpan};
use crate::util::char_len;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^## (.+)").unwrap());
static IMAGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!\[(.+)\]\((.+)\)").unwrap());
static URL_EMBED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(.+)\]\((.+)\)").unwrap());

/// Build a post from a local entry. The fee is checked before anything
/// else so a bad front matter never yields a partial post.
pub fn to_post(entry: &Entry) -> Result<Post> {
    let fee_required = parse_fee(&entry.fee)?;

    let blocks = entry.body.split('\n').map(parse_line).collect();

    Ok(Post {
        id: entry.id.clone(),
        title: entry.title.clone(),
        status: entry.status.clone(),
        fee_required,
        updated_at: entry.updated_at.clone(),
        published_at: entry.published_at.clone(),
        body: PostBody {
            blocks,
            ..Default::default()
        },
    })
}

pub fn parse_fee(fee: &str) -> Result<u32> {
    fee.parse::<u32>()
        .map_err(|_| Error::InvalidFee(fee.to_string()))
}

fn first_capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Header, then image, then link; anything else is a paragraph. Link
/// targets are dropped: only the ids travel back to the platform.
pub fn parse_line(line: &str) -> Block {
    if let Some(text) = first_capture(&HEADER_REGEX, line) {
        return Block::Header { text };
    }
    if let Some(image_id) = first_capture(&IMAGE_REGEX, line) {
        return Block::Image { image_id };
    }
    if let Some(url_embed_id) = first_capture(&URL_EMBED_REGEX, line) {
        return Block::UrlEmbed { url_embed_id };
    }
    parse_paragraph(line)
}

/// Strip `**` markers and record each bold span at its code-point offset in
/// the stripped text.
pub fn parse_paragraph(line: &str) -> Block {
    let mut tree = TokenTree::tokenize(line);
    tree.flatten_nested();

    let mut text = String::with_capacity(line.len());
    let mut styles = Vec::new();
    let mut offset = 0;

    for token in tree.children(ROOT_ID) {
        let plain = tree.plain_text(token.id);
        let length = char_len(&plain);
        if token.kind == TokenKind::Bold {
            styles.push(StyleSpan::bold(offset, length));
        }
        offset += length;
        text.push_str(&plain);
    }

    if styles.is_empty() {
        return Block::paragraph(line);
    }
    Block::Paragraph { text, styles }
}
