// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands and global flags

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fanboxsync")]
#[command(about = "Sync PIXIV FANBOX posts with local Markdown files", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: ~/.config/fanboxsync/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile to read from the config file
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// FANBOXSESSID cookie value (overrides env/config)
    #[arg(long, global = true)]
    pub session_id: Option<String>,

    /// CSRF token, required for create/push/delete (overrides env/config)
    #[arg(long, global = true)]
    pub csrf_token: Option<String>,

    /// Creator id used for the Origin header
    #[arg(long, global = true)]
    pub creator_id: Option<String>,

    /// API base URL
    #[arg(long, global = true, default_value = "https://api.fanbox.cc")]
    pub api_base: String,

    /// Directory holding post files (default: current directory)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Disable throttling (not recommended)
    #[arg(long, global = true)]
    pub no_throttle: bool,

    /// Throttle range in ms (min:max)
    #[arg(long, global = true, value_parser = parse_throttle_range)]
    pub throttle_ms: Option<(u64, u64)>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

fn parse_throttle_range(s: &str) -> Result<(u64, u64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected format: min:max".into());
    }

    let min = parts[0].parse().map_err(|_| "Invalid min value")?;
    let max = parts[1].parse().map_err(|_| "Invalid max value")?;

    if min > max {
        return Err("min must be <= max".into());
    }

    Ok((min, max))
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Pull all posts into Markdown files (default)
    Pull {
        /// Re-write files even when the remote has not changed
        #[arg(long)]
        force: bool,
    },

    /// Push edited Markdown files back to FANBOX
    Push {
        /// Post files to push
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Create a new draft post and its local file
    Create {
        /// Title of the new post
        title: String,
    },

    /// Delete a post remotely and remove its local file
    Delete {
        /// Post file to delete
        file: PathBuf,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Pull { force: false })
    }
}
