// ABOUTME: Pull, push, create and delete flows between FANBOX and disk
// ABOUTME: Per-post failures are logged and counted, not fatal to a batch

use crate::{
    api::ApiClient,
    convert::to_entry,
    iframely::EmbedResolver,
    model::{Entry, PostStatus, PostSummary},
    parse::to_post,
    storage::{read_entry, read_frontmatter, write_entry, Paths},
    Error, Result,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub skipped: usize,
    pub failed: usize,
}

fn progress_bar(len: usize, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!("[{{bar:40}}] {{pos}}/{{len}} {}", unit);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}

pub fn pull_all(
    client: &ApiClient,
    resolver: &dyn EmbedResolver,
    paths: &Paths,
    force: bool,
) -> Result<SyncReport> {
    paths.ensure_dirs()?;

    tracing::info!("Fetching post list...");
    let posts = client.list_posts()?;

    let pb = progress_bar(posts.len(), "posts");
    let mut report = SyncReport::default();

    for summary in &posts {
        match pull_one(client, resolver, paths, summary, force) {
            Ok(true) => report.synced += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::warn!(post_id = %summary.id, error = %e, "Failed to pull post");
                report.failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "pulled {} posts ({} new/updated, {} skipped, {} failed)",
        posts.len(),
        report.synced,
        report.skipped,
        report.failed
    ));

    Ok(report)
}

/// Returns `false` when the local copy already matches the remote update time.
fn pull_one(
    client: &ApiClient,
    resolver: &dyn EmbedResolver,
    paths: &Paths,
    summary: &PostSummary,
    force: bool,
) -> Result<bool> {
    let existing = paths.find_entry_path(&summary.id)?;

    if !force {
        if let Some(path) = &existing {
            if let Some(fm) = read_frontmatter(path)? {
                if fm.updated_at.as_deref() == Some(summary.updated_at.as_str()) {
                    tracing::debug!(post_id = %summary.id, "Up to date");
                    return Ok(false);
                }
            }
        }
    }

    let post = client.get_post(&summary.id)?;
    let entry = to_entry(&post, resolver)?;
    let path = write_entry(paths, &entry)?;
    remove_stale(existing.as_deref(), &path)?;

    tracing::debug!(post_id = %summary.id, path = %path.display(), "Pulled post");
    Ok(true)
}

/// Remove `old` unless it names the same file as `current`, however either
/// path is spelled.
fn remove_stale(old: Option<&Path>, current: &Path) -> Result<()> {
    let Some(old) = old else {
        return Ok(());
    };
    if !old.exists() {
        return Ok(());
    }
    if fs::canonicalize(old)? != fs::canonicalize(current)? {
        fs::remove_file(old)?;
    }
    Ok(())
}

/// Push one edited file and refresh its front matter from the response.
pub fn push_file(client: &ApiClient, paths: &Paths, path: &Path) -> Result<PathBuf> {
    let entry = read_entry(path)?;
    if entry.id.is_empty() {
        return Err(Error::Frontmatter(format!(
            "{} has no post id; create the post first",
            path.display()
        )));
    }

    let post = to_post(&entry)?;
    let updated = client.update_post(&post)?;

    let refreshed = Entry {
        updated_at: non_empty_or(updated.updated_at, entry.updated_at.clone()),
        published_at: non_empty_or(updated.published_at, entry.published_at.clone()),
        ..entry
    };

    paths.ensure_dirs()?;
    let new_path = write_entry(paths, &refreshed)?;
    remove_stale(Some(path), &new_path)?;

    tracing::info!(post_id = %refreshed.id, path = %new_path.display(), "Pushed post");
    Ok(new_path)
}

fn non_empty_or(value: String, fallback: String) -> String {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

pub fn push_files(client: &ApiClient, paths: &Paths, files: &[PathBuf]) -> Result<SyncReport> {
    let pb = progress_bar(files.len(), "files");
    let mut report = SyncReport::default();

    for file in files {
        match push_file(client, paths, file) {
            Ok(_) => report.synced += 1,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "Failed to push post");
                report.failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "pushed {} files ({} failed)",
        report.synced, report.failed
    ));

    Ok(report)
}

/// Create a draft with the given title and write its (empty) local file.
pub fn create_post(client: &ApiClient, paths: &Paths, title: &str) -> Result<PathBuf> {
    if title.trim().is_empty() {
        return Err(Error::Config("title is empty".into()));
    }

    let post_id = client.create_post()?;
    tracing::info!(post_id = %post_id, "Created post");

    let entry = Entry {
        id: post_id,
        title: title.to_string(),
        status: PostStatus::Draft,
        fee: "0".into(),
        body: String::new(),
        updated_at: chrono::Local::now().to_rfc3339(),
        published_at: String::new(),
    };
    let updated = client.update_post(&to_post(&entry)?)?;

    let entry = Entry {
        updated_at: non_empty_or(updated.updated_at, entry.updated_at.clone()),
        ..entry
    };

    paths.ensure_dirs()?;
    write_entry(paths, &entry)
}

/// Delete the remote post behind a local file, then the file itself.
pub fn delete_post(client: &ApiClient, path: &Path) -> Result<()> {
    let entry = read_entry(path)?;
    if entry.id.is_empty() {
        return Err(Error::Frontmatter(format!(
            "{} has no post id",
            path.display()
        )));
    }

    client.delete_post(&entry.id)?;
    fs::remove_file(path)?;

    tracing::info!(post_id = %entry.id, "Deleted post");
    Ok(())
}
