// ABOUTME: Serde data models for FANBOX posts and local entries
// ABOUTME: Open string-backed enums pass unknown platform values through

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Publication state of a post.
///
/// The platform adds sub-states from time to time, so anything unrecognized
/// is kept verbatim in `Other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Other(String),
}

impl PostStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Other(s) => s,
        }
    }
}

impl From<String> for PostStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft" => PostStatus::Draft,
            "published" => PostStatus::Published,
            _ => PostStatus::Other(s),
        }
    }
}

impl From<&str> for PostStatus {
    fn from(s: &str) -> Self {
        PostStatus::from(s.to_string())
    }
}

impl From<PostStatus> for String {
    fn from(status: PostStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline style applied to a span of paragraph text. Only bold is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StyleKind {
    Bold,
    Other(String),
}

impl From<String> for StyleKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bold" => StyleKind::Bold,
            _ => StyleKind::Other(s),
        }
    }
}

impl From<StyleKind> for String {
    fn from(kind: StyleKind) -> Self {
        match kind {
            StyleKind::Bold => "bold".into(),
            StyleKind::Other(s) => s,
        }
    }
}

/// Style range over a paragraph, counted in Unicode code points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSpan {
    #[serde(rename = "type")]
    pub kind: StyleKind,
    pub offset: usize,
    pub length: usize,
}

impl StyleSpan {
    pub fn bold(offset: usize, length: usize) -> Self {
        StyleSpan {
            kind: StyleKind::Bold,
            offset,
            length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "p")]
    Paragraph {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        styles: Vec<StyleSpan>,
    },
    #[serde(rename = "header")]
    Header {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "image", rename_all = "camelCase")]
    Image { image_id: String },
    #[serde(rename = "url_embed", rename_all = "camelCase")]
    UrlEmbed { url_embed_id: String },
    /// Block types this tool does not sync (files, videos, ...).
    #[serde(other)]
    Unsupported,
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            text: text.into(),
            styles: Vec::new(),
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Block::Header { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub id: String,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Entry of the body's `urlEmbedMap`. `kind` is kept raw so an unknown
/// embed type is reported when it is rendered, not when the post is fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlEmbed {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub post_info: Option<PostInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocks: Vec<Block>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_map: HashMap<String, Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url_embed_map: HashMap<String, UrlEmbed>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub fee_required: u32,
    #[serde(default, rename = "updatedDatetime")]
    pub updated_at: String,
    #[serde(default, rename = "publishedDatetime")]
    pub published_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: PostBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub fee_required: u32,
    #[serde(default, rename = "updatedDatetime")]
    pub updated_at: String,
    #[serde(default, rename = "publishedDatetime")]
    pub published_at: String,
}

/// A post as it lives on disk: identity from the front matter plus the
/// Markdown body. `fee` stays a decimal string until it is pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub status: PostStatus,
    pub fee: String,
    pub body: String,
    pub updated_at: String,
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeValue {
    Amount(i64),
    Text(String),
}

impl FeeValue {
    pub fn as_decimal(&self) -> String {
        match self {
            FeeValue::Amount(n) => n.to_string(),
            FeeValue::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: PostStatus,
    pub fee: FeeValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Frontmatter {
    pub fn from_entry(entry: &Entry) -> Self {
        let fee = match entry.fee.parse::<i64>() {
            Ok(n) => FeeValue::Amount(n),
            Err(_) => FeeValue::Text(entry.fee.clone()),
        };
        Frontmatter {
            id: entry.id.clone(),
            title: entry.title.clone(),
            status: entry.status.clone(),
            fee,
            updated_at: Some(entry.updated_at.clone()).filter(|s| !s.is_empty()),
            published_at: Some(entry.published_at.clone()).filter(|s| !s.is_empty()),
        }
    }

    pub fn into_entry(self, body: String) -> Entry {
        Entry {
            id: self.id,
            title: self.title,
            status: self.status,
            fee: self.fee.as_decimal(),
            body,
            updated_at: self.updated_at.unwrap_or_default(),
            published_at: self.published_at.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_deserialize_full() {
        let json = r#"{
            "id": "1000000",
            "title": "テスト投稿",
            "status": "draft",
            "feeRequired": 500,
            "updatedDatetime": "2024-05-01T10:00:00+09:00",
            "publishedDatetime": "",
            "type": "article",
            "body": {
                "blocks": [
                    {"type": "p", "text": "これは太字です", "styles": [{"type": "bold", "offset": 3, "length": 2}]},
                    {"type": "header", "text": "タイトル"},
                    {"type": "image", "imageId": "img1"},
                    {"type": "url_embed", "urlEmbedId": "emb1"}
                ],
                "imageMap": {"img1": {"id": "img1", "originalUrl": "https://example.com/a.png", "width": 10}},
                "urlEmbedMap": {"emb1": {"id": "emb1", "type": "default", "url": "https://example.com/"}}
            }
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, "1000000");
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.fee_required, 500);
        assert_eq!(post.body.blocks.len(), 4);
        assert_eq!(
            post.body.blocks[0],
            Block::Paragraph {
                text: "これは太字です".into(),
                styles: vec![StyleSpan::bold(3, 2)],
            }
        );
        assert_eq!(
            post.body.blocks[2],
            Block::Image {
                image_id: "img1".into()
            }
        );
        assert_eq!(
            post.body.image_map["img1"].original_url,
            "https://example.com/a.png"
        );
        assert_eq!(post.body.url_embed_map["emb1"].kind, "default");
    }

    #[test]
    fn test_post_deserialize_null_body() {
        let json = r#"{"id": "1000001", "title": "", "status": "draft", "feeRequired": 0, "body": null}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert!(post.body.blocks.is_empty());
        assert!(post.body.image_map.is_empty());
    }

    #[test]
    fn test_unknown_status_passes_through() {
        let status: PostStatus = serde_json::from_str(r#""reserved""#).unwrap();
        assert_eq!(status, PostStatus::Other("reserved".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""reserved""#);
    }

    #[test]
    fn test_unknown_block_type_is_unsupported() {
        let block: Block = serde_json::from_str(r#"{"type": "file", "fileId": "f1"}"#).unwrap();
        assert_eq!(block, Block::Unsupported);
    }

    #[test]
    fn test_paragraph_without_styles_omits_field() {
        let json = serde_json::to_string(&Block::paragraph("テキスト")).unwrap();
        assert_eq!(json, r#"{"type":"p","text":"テキスト"}"#);
    }

    #[test]
    fn test_style_span_unknown_kind() {
        let span: StyleSpan =
            serde_json::from_str(r#"{"type": "italic", "offset": 0, "length": 1}"#).unwrap();
        assert_eq!(span.kind, StyleKind::Other("italic".into()));
    }
}

#[cfg(test)]
mod frontmatter_tests {
    use super::*;

    #[test]
    fn test_frontmatter_roundtrip() {
        let entry = Entry {
            id: "1000000".into(),
            title: "テスト投稿".into(),
            status: PostStatus::Published,
            fee: "500".into(),
            body: String::new(),
            updated_at: "2024-05-01T10:00:00+09:00".into(),
            published_at: String::new(),
        };

        let yaml = serde_yaml::to_string(&Frontmatter::from_entry(&entry)).unwrap();
        let parsed: Frontmatter = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.fee, FeeValue::Amount(500));
        assert!(parsed.published_at.is_none());
        assert_eq!(parsed.into_entry(String::new()), entry);
    }

    #[test]
    fn test_frontmatter_fee_as_string() {
        let yaml = "id: \"1\"\ntitle: t\nstatus: draft\nfee: \"abc\"\n";
        let fm: Frontmatter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fm.fee.as_decimal(), "abc");
    }
}
