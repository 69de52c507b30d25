// ABOUTME: Converts FANBOX posts to flat Markdown entries
// ABOUTME: Re-inserts bold markers by code point and resolves embeds

use crate::iframely::EmbedResolver;
use crate::model::{Block, Entry, Post, PostBody, StyleKind, StyleSpan, UrlEmbed};
use crate::util::{char_len, char_slice};
use crate::{Error, Result};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Render a post body as Markdown, one line per block.
pub fn to_markdown(post: &Post, resolver: &dyn EmbedResolver) -> Result<String> {
    let mut lines = Vec::with_capacity(post.body.blocks.len());

    for block in &post.body.blocks {
        match block {
            Block::Paragraph { text, styles } => lines.push(render_paragraph(text, styles)?),
            Block::Header { text } => lines.push(format!("## {}", text)),
            Block::Image { image_id } => {
                let image = post.body.image_map.get(image_id).ok_or_else(|| {
                    Error::MissingReference {
                        kind: "image",
                        id: image_id.clone(),
                    }
                })?;
                lines.push(format!("![{}]({})", image_id, image.original_url));
            }
            Block::UrlEmbed { url_embed_id } => {
                let url = resolve_embed(&post.body, url_embed_id, resolver)?;
                lines.push(format!("[{}]({})", url_embed_id, url));
            }
            Block::Unsupported => {
                tracing::warn!(post_id = %post.id, "Skipping unsupported block");
            }
        }
    }

    Ok(lines.join("\n"))
}

/// Snapshot a fetched post as a local entry.
pub fn to_entry(post: &Post, resolver: &dyn EmbedResolver) -> Result<Entry> {
    Ok(Entry {
        id: post.id.clone(),
        title: post.title.clone(),
        status: post.status.clone(),
        fee: post.fee_required.to_string(),
        body: to_markdown(post, resolver)?,
        updated_at: post.updated_at.clone(),
        published_at: post.published_at.clone(),
    })
}

fn render_paragraph(text: &str, styles: &[StyleSpan]) -> Result<String> {
    let mut sorted: Vec<&StyleSpan> = styles.iter().collect();
    // stable: equal offsets keep their input order
    sorted.sort_by_key(|span| span.offset);

    let text_len = char_len(text);
    let mut out = String::with_capacity(text.len() + styles.len() * 4);
    let mut cursor = 0;

    for span in sorted {
        if let StyleKind::Other(kind) = &span.kind {
            return Err(Error::UnsupportedStyleKind(kind.clone()));
        }

        let invalid = || Error::InvalidSpan {
            offset: span.offset,
            length: span.length,
            text_len,
        };
        if span.length == 0 || span.offset < cursor {
            return Err(invalid());
        }
        let end = span.offset.checked_add(span.length).ok_or_else(invalid)?;
        let prefix = char_slice(text, cursor, span.offset).ok_or_else(invalid)?;
        let styled = char_slice(text, span.offset, end).ok_or_else(invalid)?;

        out.push_str(prefix);
        out.push_str("**");
        out.push_str(styled);
        out.push_str("**");
        cursor = end;
    }

    out.push_str(char_slice(text, cursor, text_len).unwrap_or_default());
    Ok(out)
}

fn resolve_embed(body: &PostBody, id: &str, resolver: &dyn EmbedResolver) -> Result<String> {
    let embed = body
        .url_embed_map
        .get(id)
        .ok_or_else(|| Error::MissingReference {
            kind: "url embed",
            id: id.to_string(),
        })?;

    match embed.kind.as_str() {
        "html.card" | "html-card" => {
            let href = embed_href(embed)?;
            resolver.resolve(&href)
        }
        "html" => embed_href(embed),
        "fanbox.post" | "fanbox-post" => {
            let info = embed
                .post_info
                .as_ref()
                .ok_or_else(|| Error::MissingReference {
                    kind: "post info",
                    id: embed.id.clone(),
                })?;
            Ok(format!(
                "https://{}.fanbox.cc/posts/{}",
                info.creator_id, info.id
            ))
        }
        "default" => embed.url.clone().ok_or_else(|| Error::MissingReference {
            kind: "embed url",
            id: embed.id.clone(),
        }),
        other => Err(Error::UnknownEmbedKind(other.to_string())),
    }
}

fn embed_href(embed: &UrlEmbed) -> Result<String> {
    embed
        .html
        .as_deref()
        .and_then(first_anchor_href)
        .ok_or_else(|| Error::MissingReference {
            kind: "embed anchor",
            id: embed.id.clone(),
        })
}

/// `href` of the first `<a>` in document order.
fn first_anchor_href(html: &str) -> Option<String> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    find_href(&dom.document)
}

fn find_href(handle: &Handle) -> Option<String> {
    if let NodeData::Element { name, attrs, .. } = &handle.data {
        if &*name.local == "a" {
            let href = attrs
                .borrow()
                .iter()
                .find(|attr| &*attr.name.local == "href")
                .map(|attr| attr.value.to_string());
            if href.is_some() {
                return href;
            }
        }
    }

    handle.children.borrow().iter().find_map(find_href)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;

    /// Resolver that maps every link to a fixed URL and records calls.
    pub struct FakeResolver {
        pub target: String,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeResolver {
        pub fn new(target: &str) -> Self {
            FakeResolver {
                target: target.into(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl EmbedResolver for FakeResolver {
        fn resolve(&self, intermediate_url: &str) -> Result<String> {
            self.calls.borrow_mut().push(intermediate_url.to_string());
            Ok(self.target.clone())
        }
    }

    pub struct FailingResolver;

    impl EmbedResolver for FailingResolver {
        fn resolve(&self, intermediate_url: &str) -> Result<String> {
            Err(Error::Resolve(format!("offline: {}", intermediate_url)))
        }
    }
}
