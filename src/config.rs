//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and held for the process lifetime.

use hkdf::Hkdf;
use sha2::Sha256;
use std::env;

/// Which credential the server hands out after a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Signed, self-contained token in the `jwt` cookie.
    Token,
    /// Opaque handle into the server-side session store.
    Session,
}

/// Which store backs the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryBackend {
    Firestore { project_id: String },
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Externally visible base URL, used to build the OAuth callback
    pub public_url: String,
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Absolute URL Google redirects back to
    pub google_callback_url: String,
    pub credential_mode: CredentialMode,
    pub directory: DirectoryBackend,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for credential tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Session cookie secret, only used in session mode
    pub session_secret: Option<Vec<u8>>,
}

impl Config {
    /// Config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            google_client_id: "test_client_id".to_string(),
            google_callback_url: "http://localhost:8080/login/google/return".to_string(),
            credential_mode: CredentialMode::Token,
            directory: DirectoryBackend::Memory,
            google_client_secret: "test_secret".to_string(),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            session_secret: Some(b"test_session_key_32_bytes_min!!".to_vec()),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let public_url = env::var("PUBLIC_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let google_callback_url = env::var("GOOGLE_CALLBACK_URL")
            .unwrap_or_else(|_| format!("{}/login/google/return", public_url));

        let credential_mode = match env::var("CREDENTIAL_MODE").as_deref() {
            Ok("token") | Err(_) => CredentialMode::Token,
            Ok("session") => CredentialMode::Session,
            Ok(other) => {
                return Err(ConfigError::Invalid("CREDENTIAL_MODE", other.to_string()));
            }
        };

        let directory = match env::var("DIRECTORY_BACKEND").as_deref() {
            Ok("firestore") | Err(_) => DirectoryBackend::Firestore {
                project_id: env::var("GCP_PROJECT_ID")
                    .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            },
            Ok("memory") => DirectoryBackend::Memory,
            Ok(other) => {
                return Err(ConfigError::Invalid(
                    "DIRECTORY_BACKEND",
                    other.to_string(),
                ));
            }
        };

        let port = parse_port(env::var("PORT").ok())?;

        let session_secret = match credential_mode {
            CredentialMode::Session => Some(
                env::var("SESSION_SECRET")
                    .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?
                    .into_bytes(),
            ),
            CredentialMode::Token => None,
        };

        Ok(Self {
            port,
            public_url,
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_callback_url,
            credential_mode,
            directory,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            session_secret,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// Key used to sign the OAuth `state` parameter.
    pub fn oauth_state_key(&self) -> [u8; 32] {
        derive_key(&self.jwt_secret, b"gift-wishlist oauth state")
    }

    /// Key used to sign session reference cookies.
    pub fn session_cookie_key(&self) -> Option<[u8; 32]> {
        self.session_secret
            .as_deref()
            .map(|secret| derive_key(secret, b"gift-wishlist session cookie"))
    }
}

/// HKDF-SHA256 with a per-purpose info string, so one secret never signs two
/// kinds of payload.
/// Listening port; unset means 8080, anything unparseable is an error.
fn parse_port(raw: Option<String>) -> Result<u16, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT", raw)),
        None => Ok(8080),
    }
}

fn derive_key(secret: &[u8], info: &[u8]) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut okm = [0u8; 32];
    // 32 bytes is always a valid HKDF-SHA256 output length.
    if hk.expand(info, &mut okm).is_err() {
        unreachable!("HKDF output length is fixed at 32 bytes");
    }
    okm
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("GOOGLE_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_CLIENT_SECRET", " test_secret ");
        env::set_var("JWT_SECRET", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("DIRECTORY_BACKEND", "memory");
        env::set_var("PUBLIC_URL", "https://wishlist.example.com/");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google_client_id, "test_id");
        assert_eq!(config.google_client_secret, "test_secret");
        assert_eq!(config.port, 8080);
        assert_eq!(config.credential_mode, CredentialMode::Token);
        assert_eq!(config.directory, DirectoryBackend::Memory);
        assert_eq!(
            config.google_callback_url,
            "https://wishlist.example.com/login/google/return"
        );
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_derived_keys_differ_by_purpose() {
        let mut config = Config::test_default();
        config.session_secret = Some(config.jwt_secret.clone());

        let state_key = config.oauth_state_key();
        let session_key = config.session_cookie_key().unwrap();
        assert_ne!(state_key, session_key);
        assert_eq!(state_key, Config::test_default().oauth_state_key());
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(None).unwrap(), 8080);
        assert_eq!(parse_port(Some("3000".to_string())).unwrap(), 3000);
        assert!(matches!(
            parse_port(Some("80a".to_string())),
            Err(ConfigError::Invalid("PORT", ref v)) if v == "80a"
        ));
        assert!(parse_port(Some("70000".to_string())).is_err());
    }
}
