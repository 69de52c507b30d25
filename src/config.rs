// ABOUTME: Credential discovery with precedence chain
// ABOUTME: CLI flag → environment variable → YAML config profile

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_ID_ENV: &str = "FANBOX_SESSION_ID";
pub const CSRF_TOKEN_ENV: &str = "FANBOX_CSRF_TOKEN";
pub const CREATOR_ID_ENV: &str = "FANBOX_CREATOR_ID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// `~/.config/fanboxsync/config.yaml`
///
/// ```yaml
/// default:
///   creator_id: someone
///   session_id: "12345_abcdef"
///   csrf_token: "0123abcd"
/// profiles:
///   other:
///     session_id: "67890_fedcba"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub default: Profile,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl ConfigFile {
    pub fn profile(&self, name: Option<&str>) -> Result<Profile> {
        match name {
            None | Some("default") => Ok(self.default.clone()),
            Some(name) => self
                .profiles
                .get(name)
                .cloned()
                .ok_or_else(|| Error::Config(format!("Unknown profile: {}", name))),
        }
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub creator_id: Option<String>,
    pub session_id: Option<String>,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub creator_id: Option<String>,
    pub session_id: String,
    pub csrf_token: Option<String>,
    pub user_agent: String,
}

pub fn default_config_path() -> PathBuf {
    let config_home = env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = env::var("HOME").unwrap_or_default();
        format!("{}/.config", home)
    });

    PathBuf::from(config_home).join("fanboxsync/config.yaml")
}

pub fn load_config(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn resolve_credentials(overrides: Overrides, profile: Profile) -> Result<Credentials> {
    resolve_with(overrides, |key| env::var(key).ok(), profile)
}

fn resolve_with<F>(overrides: Overrides, env_lookup: F, profile: Profile) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |cli: Option<String>, key: &str, file: Option<String>| {
        cli.or_else(|| env_lookup(key))
            .or(file)
            .filter(|v| !v.is_empty())
    };

    let session_id = pick(overrides.session_id, SESSION_ID_ENV, profile.session_id)
        .ok_or_else(|| {
            Error::Auth(format!(
                "No session id found. Provide via --session-id, {}, or the config file",
                SESSION_ID_ENV
            ))
        })?;

    Ok(Credentials {
        creator_id: pick(overrides.creator_id, CREATOR_ID_ENV, profile.creator_id),
        session_id,
        csrf_token: pick(overrides.csrf_token, CSRF_TOKEN_ENV, profile.csrf_token),
        user_agent: profile
            .user_agent
            .unwrap_or_else(|| format!("fanboxsync/{} (Rust)", env!("CARGO_PKG_VERSION"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_cli_precedence() {
        let overrides = Overrides {
            session_id: Some("cli_session".into()),
            ..Default::default()
        };
        let profile = Profile {
            session_id: Some("file_session".into()),
            ..Default::default()
        };
        let creds = resolve_with(overrides, |_| Some("env_session".into()), profile).unwrap();
        assert_eq!(creds.session_id, "cli_session");
    }

    #[test]
    fn test_resolve_env_over_file() {
        let profile = Profile {
            session_id: Some("file_session".into()),
            csrf_token: Some("file_csrf".into()),
            ..Default::default()
        };
        let env = |key: &str| (key == SESSION_ID_ENV).then(|| "env_session".to_string());
        let creds = resolve_with(Overrides::default(), env, profile).unwrap();
        assert_eq!(creds.session_id, "env_session");
        assert_eq!(creds.csrf_token.as_deref(), Some("file_csrf"));
    }

    #[test]
    fn test_resolve_missing_session() {
        let err = resolve_with(Overrides::default(), no_env, Profile::default()).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_resolve_default_user_agent() {
        let profile = Profile {
            session_id: Some("s".into()),
            ..Default::default()
        };
        let creds = resolve_with(Overrides::default(), no_env, profile).unwrap();
        assert!(creds.user_agent.starts_with("fanboxsync/"));
    }

    #[test]
    fn test_load_config_profiles() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            "default:\n  creator_id: someone\n  session_id: \"123_abc\"\nprofiles:\n  other:\n    session_id: \"456_def\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(
            config.profile(None).unwrap().creator_id.as_deref(),
            Some("someone")
        );
        assert_eq!(
            config.profile(Some("other")).unwrap().session_id.as_deref(),
            Some("456_def")
        );
        assert!(matches!(config.profile(Some("nope")), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_config_missing() {
        let temp = TempDir::new().unwrap();
        assert!(load_config(&temp.path().join("missing.yaml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "default: [unclosed").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config(_))));
    }
}
