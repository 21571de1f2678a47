use actix_web::cookie::Key;
use anyhow::{bail, Context};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// Raw session key material, at least 64 bytes.
    pub secret_key: Option<Vec<u8>>,
    /// Directory uploaded images are written to and served from.
    pub media_root: PathBuf,
    /// Lifetime of the index page fragment.
    pub index_cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://yatube.sqlite?mode=rwc".to_owned(),
            bind_address: "127.0.0.1:8080".to_owned(),
            secret_key: None,
            media_root: PathBuf::from("./media"),
            index_cache_ttl: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            config.bind_address = addr;
        }
        if let Ok(root) = std::env::var("MEDIA_ROOT") {
            config.media_root = PathBuf::from(root);
        }
        if let Ok(secs) = std::env::var("INDEX_CACHE_SECONDS") {
            let secs = secs
                .parse::<u64>()
                .context("INDEX_CACHE_SECONDS cannot be parsed as an unsigned integer")?;
            config.index_cache_ttl = Duration::from_secs(secs);
        }
        if let Ok(key) = std::env::var("SECRET_KEY") {
            if key.len() < 64 {
                bail!("SECRET_KEY must be at least 64 bytes long");
            }
            config.secret_key = Some(key.into_bytes());
        }

        Ok(config)
    }

    /// Returns the cookie signing key, generating a throwaway one if unset.
    pub fn session_key(&self) -> Key {
        match &self.secret_key {
            Some(bytes) => Key::from(bytes.as_slice()),
            None => {
                log::warn!("SECRET_KEY is not set; sessions will not survive a restart.");
                Key::generate()
            }
        }
    }
}
