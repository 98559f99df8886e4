use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use indexmap::IndexMap;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Registry credentials resolved for a single host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Anonymous,
    Basic { username: String, password: String },
    IdentityToken(String),
}

/// Source of registry credentials.
pub trait Keychain: Send + Sync {
    fn resolve(&self, registry: &str) -> Credentials;
}

/// Keychain that never returns credentials.
pub struct AnonymousKeychain;

impl Keychain for AnonymousKeychain {
    fn resolve(&self, _registry: &str) -> Credentials {
        Credentials::Anonymous
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthFile {
    #[serde(default)]
    auths: IndexMap<String, AuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
    identitytoken: Option<String>,
}

/// Keychain backed by docker/podman style `auths` files.
///
/// Files are consulted in order and the first matching entry wins. Credential
/// helpers (`credsStore`, `credHelpers`) are not consulted.
pub struct DockerConfigKeychain {
    paths: Vec<PathBuf>,
}

impl DockerConfigKeychain {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Standard search path, with an optional explicit file first.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = explicit.into_iter().collect();
        if let Ok(dir) = env::var("DOCKER_CONFIG") {
            paths.push(Path::new(&dir).join("config.json"));
        } else if let Some(home) = dirs_next::home_dir() {
            paths.push(home.join(".docker").join("config.json"));
        }
        if let Ok(file) = env::var("REGISTRY_AUTH_FILE") {
            paths.push(PathBuf::from(file));
        }
        if let Ok(runtime) = env::var("XDG_RUNTIME_DIR") {
            paths.push(Path::new(&runtime).join("containers").join("auth.json"));
        }
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn load(path: &Path) -> Option<AuthFile> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable auth file: {}", err);
                None
            }
        }
    }
}

impl Keychain for DockerConfigKeychain {
    fn resolve(&self, registry: &str) -> Credentials {
        for path in &self.paths {
            let Some(file) = Self::load(path) else {
                continue;
            };
            if let Some(credentials) = file.lookup(registry) {
                tracing::debug!(registry, path = %path.display(), "using stored credentials");
                return credentials;
            }
        }
        Credentials::Anonymous
    }
}

impl AuthFile {
    /// An entry keyed by the bare host wins over scheme or path qualified keys;
    /// otherwise the first matching key in file order is used.
    fn lookup(&self, registry: &str) -> Option<Credentials> {
        let exact = self
            .auths
            .get(registry)
            .and_then(AuthEntry::credentials);
        exact.or_else(|| {
            self.auths
                .iter()
                .filter(|(key, _)| registry_matches(key, registry))
                .find_map(|(_, entry)| entry.credentials())
        })
    }
}

impl AuthEntry {
    fn credentials(&self) -> Option<Credentials> {
        if let Some(token) = self.identitytoken.as_deref().filter(|t| !t.is_empty()) {
            return Some(Credentials::IdentityToken(token.to_string()));
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Some(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            });
        }
        let decoded = BASE64.decode(self.auth.as_deref()?.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

fn registry_matches(key: &str, registry: &str) -> bool {
    let host = key
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or(key);
    if host == registry {
        return true;
    }
    let docker_hub = ["index.docker.io", "docker.io", "registry-1.docker.io"];
    docker_hub.contains(&host) && docker_hub.contains(&registry)
}
