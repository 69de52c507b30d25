// ABOUTME: Local post files with YAML front matter and atomic writes
// ABOUTME: Handles paths, permissions, mtimes and front matter parsing

use crate::model::{Entry, Frontmatter};
use crate::util::post_filename;
use crate::{Error, Result};
use chrono::DateTime;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Paths {
    pub posts_dir: PathBuf,
    pub tmp_dir: PathBuf,
}

impl Paths {
    pub fn new(posts_dir_override: Option<PathBuf>) -> Result<Self> {
        let posts_dir = match posts_dir_override {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        Ok(Paths {
            tmp_dir: posts_dir.join(".fanboxsync").join("tmp"),
            posts_dir,
        })
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.posts_dir)?;
        fs::create_dir_all(&self.tmp_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(&self.tmp_dir, perms)?;
        }
        Ok(())
    }

    pub fn entry_path(&self, entry: &Entry) -> PathBuf {
        self.posts_dir
            .join(post_filename(&entry.id, &entry.updated_at))
    }

    /// Existing file for a post id, whatever date prefix it carries.
    pub fn find_entry_path(&self, post_id: &str) -> Result<Option<PathBuf>> {
        if !self.posts_dir.exists() {
            return Ok(None);
        }

        let suffix = format!("-{}.md", post_id);
        for dir_entry in fs::read_dir(&self.posts_dir)? {
            let path = dir_entry?.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.len() == 10 + suffix.len() && name.ends_with(&suffix))
                .unwrap_or(false);
            if matches {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

pub fn write_atomic(path: &Path, content: &[u8], tmp_dir: &Path) -> Result<()> {
    use rand::Rng;

    // Create temp file
    let random: u32 = rand::thread_rng().gen();
    let tmp_path = tmp_dir.join(format!("{:x}.part", random));

    fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&tmp_path, perms)?;
    }

    // Atomic rename
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&tmp_path, path)?;

    Ok(())
}

pub fn render_entry(entry: &Entry) -> Result<String> {
    let yaml = serde_yaml::to_string(&Frontmatter::from_entry(entry))
        .map_err(|e| Error::Frontmatter(format!("Failed to serialize front matter: {}", e)))?;

    Ok(format!("---\n{}---\n\n{}\n", yaml, entry.body))
}

/// Split a post file into its front matter and Markdown body. CRLF line
/// endings are read as LF.
pub fn parse_entry(content: &str) -> Result<Entry> {
    let content = content.replace("\r\n", "\n");
    let (yaml, body) = split_frontmatter(&content)
        .ok_or_else(|| Error::Frontmatter("missing front matter".into()))?;

    let fm: Frontmatter = serde_yaml::from_str(yaml)
        .map_err(|e| Error::Frontmatter(format!("Failed to parse front matter: {}", e)))?;

    let body = body.strip_prefix('\n').unwrap_or(body);
    let body = body.strip_suffix('\n').unwrap_or(body);
    Ok(fm.into_entry(body.to_string()))
}

fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---\n")?;
    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }
    let end_pos = rest.find("\n---\n").or_else(|| {
        rest.strip_suffix("\n---")
            .map(|yaml| yaml.len())
    })?;
    let body = rest.get(end_pos + 5..).unwrap_or("");
    Some((&rest[..end_pos], body))
}

pub fn read_entry(path: &Path) -> Result<Entry> {
    let content = fs::read_to_string(path)?;
    parse_entry(&content)
}

pub fn read_frontmatter(md_path: &Path) -> Result<Option<Frontmatter>> {
    if !md_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(md_path)?.replace("\r\n", "\n");
    match split_frontmatter(&content) {
        Some((yaml, _)) => {
            let fm = serde_yaml::from_str(yaml).map_err(|e| {
                Error::Frontmatter(format!("Failed to parse front matter: {}", e))
            })?;
            Ok(Some(fm))
        }
        None => Ok(None),
    }
}

/// Write an entry to its dated file and stamp the file with the remote
/// update time.
pub fn write_entry(paths: &Paths, entry: &Entry) -> Result<PathBuf> {
    let path = paths.entry_path(entry);
    let content = render_entry(entry)?;
    write_atomic(&path, content.as_bytes(), &paths.tmp_dir)?;

    if let Ok(updated) = DateTime::parse_from_rfc3339(&entry.updated_at) {
        let mtime = FileTime::from_unix_time(updated.timestamp(), 0);
        filetime::set_file_mtime(&path, mtime)?;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_new_with_override() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::new(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(paths.posts_dir, temp.path());
        assert_eq!(paths.tmp_dir, temp.path().join(".fanboxsync/tmp"));
    }

    #[test]
    #[cfg(unix)]
    fn test_ensure_dirs_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let paths = Paths::new(Some(temp.path().join("posts"))).unwrap();
        paths.ensure_dirs().unwrap();

        assert!(paths.posts_dir.exists());
        let perms = fs::metadata(&paths.tmp_dir).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o700);
    }

    #[test]
    fn test_find_entry_path_ignores_other_ids() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::new(Some(temp.path().to_path_buf())).unwrap();
        fs::write(temp.path().join("2024-05-01-11000000.md"), "").unwrap();
        fs::write(temp.path().join("2024-05-02-1000000.md"), "").unwrap();

        let found = paths.find_entry_path("1000000").unwrap().unwrap();
        assert_eq!(found, temp.path().join("2024-05-02-1000000.md"));
        assert!(paths.find_entry_path("42").unwrap().is_none());
    }
}

#[cfg(test)]
mod write_tests {
    use super::*;
    use crate::model::PostStatus;
    use tempfile::TempDir;

    fn sample_entry() -> Entry {
        Entry {
            id: "1000000".into(),
            title: "テスト投稿".into(),
            status: PostStatus::Draft,
            fee: "500".into(),
            body: "## タイトル\nこれは**太字**です".into(),
            updated_at: "2024-05-01T10:00:00+09:00".into(),
            published_at: String::new(),
        }
    }

    #[test]
    fn test_write_atomic_creates_file() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::new(Some(temp.path().to_path_buf())).unwrap();
        paths.ensure_dirs().unwrap();

        let target = temp.path().join("test.txt");
        write_atomic(&target, b"hello", &paths.tmp_dir).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    #[cfg(unix)]
    fn test_write_atomic_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let paths = Paths::new(Some(temp.path().to_path_buf())).unwrap();
        paths.ensure_dirs().unwrap();

        let target = temp.path().join("test.txt");
        write_atomic(&target, b"hello", &paths.tmp_dir).unwrap();

        let perms = fs::metadata(&target).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn test_write_entry_roundtrip() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::new(Some(temp.path().to_path_buf())).unwrap();
        paths.ensure_dirs().unwrap();

        let entry = sample_entry();
        let path = write_entry(&paths, &entry).unwrap();
        assert_eq!(path, temp.path().join("2024-05-01-1000000.md"));
        assert_eq!(read_entry(&path).unwrap(), entry);

        let mtime = FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
        assert_eq!(mtime.unix_seconds(), 1714525200);
    }

    #[test]
    fn test_render_entry_layout() {
        let rendered = render_entry(&sample_entry()).unwrap();
        assert!(rendered.starts_with("---\nid: "));
        assert!(rendered.contains("\nfee: 500\n"));
        assert!(!rendered.contains("published_at"));
        assert!(rendered.ends_with("\n---\n\n## タイトル\nこれは**太字**です\n"));
    }

    #[test]
    fn test_empty_body_roundtrip() {
        let entry = Entry {
            body: String::new(),
            ..sample_entry()
        };
        let parsed = parse_entry(&render_entry(&entry).unwrap()).unwrap();
        assert_eq!(parsed.body, "");
    }
}

#[cfg(test)]
mod frontmatter_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entry_hand_written() {
        let content = "---\nid: \"1000000\"\ntitle: 手書き\nstatus: published\nfee: \"0\"\n---\n\nテキスト\n";
        let entry = parse_entry(content).unwrap();
        assert_eq!(entry.id, "1000000");
        assert_eq!(entry.fee, "0");
        assert_eq!(entry.body, "テキスト");
    }

    #[test]
    fn test_parse_entry_crlf_file() {
        let content = "---\r\nid: \"1000000\"\r\ntitle: t\r\nfee: 0\r\n---\r\n\r\n## 見出し\r\nテキスト\r\n";
        let entry = parse_entry(content).unwrap();
        assert_eq!(entry.id, "1000000");
        assert_eq!(entry.body, "## 見出し\nテキスト");
    }

    #[test]
    fn test_parse_entry_without_frontmatter() {
        assert!(matches!(
            parse_entry("# Just content"),
            Err(Error::Frontmatter(_))
        ));
    }

    #[test]
    fn test_read_frontmatter_missing_file() {
        let temp = TempDir::new().unwrap();
        let fm = read_frontmatter(&temp.path().join("missing.md")).unwrap();
        assert!(fm.is_none());
    }

    #[test]
    fn test_read_frontmatter_no_yaml() {
        let temp = TempDir::new().unwrap();
        let md_path = temp.path().join("test.md");
        fs::write(&md_path, "# Just content").unwrap();

        assert!(read_frontmatter(&md_path).unwrap().is_none());
    }
}
