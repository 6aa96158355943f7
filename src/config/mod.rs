//! Configuration system (layered: defaults < TOML file < environment).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FarmGuideError;
use crate::language::Language;
use crate::models::GroqModel;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "FARMGUIDE_CONFIG";

/// Default session key when the caller supplies none.
pub const DEFAULT_SESSION_KEY: &str = "farmguide-session";

/// Non-secret runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Answer language when a request does not name one.
    pub default_language: Language,
    /// Groq chat model id.
    pub model: String,
    /// Whisper model id used for transcription.
    pub whisper_model: String,
    /// File name prefix for generated speech.
    pub tts_prefix: String,
    /// Root directory for generated files.
    pub output_dir: PathBuf,
    /// HTTP listen address.
    pub bind: String,
    /// Prefix for `audio_url` values, e.g. `https://farmguide.example`.
    pub public_base_url: Option<String>,
    /// Tool calls allowed per answer.
    pub search_budget: usize,
    /// Idle time after which a session's memory is dropped.
    pub session_idle_secs: u64,
    /// Turns of history kept per session.
    pub session_max_turns: usize,
    pub default_session: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_language: Language::default(),
            model: GroqModel::default().to_string(),
            whisper_model: "whisper-large-v3".to_string(),
            tts_prefix: "response".to_string(),
            output_dir: PathBuf::from("outputs"),
            bind: "0.0.0.0:8000".to_string(),
            public_base_url: None,
            search_budget: 1,
            session_idle_secs: 3600,
            session_max_turns: crate::agent::session::DEFAULT_MAX_TURNS,
            default_session: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl Settings {
    pub fn groq_model(&self) -> GroqModel {
        self.model.parse().unwrap_or_default()
    }
}

/// On-disk layout: settings at the top level plus `[api_keys]` and
/// `[base_urls]` tables keyed by collaborator name.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    settings: Settings,
    #[serde(default)]
    api_keys: HashMap<String, String>,
    #[serde(default)]
    base_urls: HashMap<String, String>,
}

/// Layered configuration for FarmGuide.
///
/// Credentials and base URLs are keyed by collaborator name: `groq`,
/// `tavily`, `translate`, `tts`.
#[derive(Clone)]
pub struct FarmGuideConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
    settings: Settings,
}

impl fmt::Debug for FarmGuideConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<String> = self
            .api_keys
            .read()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("FarmGuideConfig")
            .field("api_keys", &providers)
            .field("base_urls", &self.base_urls)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Default for FarmGuideConfig {
    fn default() -> Self {
        Self::new()
    }
}

const KEY_MAPPINGS: [(&str, &str); 2] = [("GROQ_API_KEY", "groq"), ("TAVILY_API_KEY", "tavily")];

const URL_MAPPINGS: [(&str, &str); 4] = [
    ("GROQ_BASE_URL", "groq"),
    ("TAVILY_BASE_URL", "tavily"),
    ("TRANSLATE_BASE_URL", "translate"),
    ("TTS_BASE_URL", "tts"),
];

impl FarmGuideConfig {
    /// Create empty config with default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            api_keys: Arc::new(RwLock::new(HashMap::new())),
            base_urls: Arc::new(RwLock::new(HashMap::new())),
            settings,
        }
    }

    /// Load from environment variables (and `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::new();
        config.apply_env();
        config
    }

    /// Load `path` (or `$FARMGUIDE_CONFIG` when `path` is `None`), then
    /// overlay the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, FarmGuideError> {
        let _ = dotenvy::dotenv();
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    FarmGuideError::Configuration(format!("{}: {e}", path.display()))
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::new(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self, FarmGuideError> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| FarmGuideError::Configuration(format!("invalid config file: {e}")))?;
        let config = Self::with_settings(file.settings);
        for (provider, key) in file.api_keys {
            config.set_api_key(&provider, key);
        }
        for (provider, url) in file.base_urls {
            config.set_base_url(&provider, url);
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        for (env_var, provider) in &KEY_MAPPINGS {
            if let Some(key) = env_value(env_var) {
                self.set_api_key(provider, key);
            }
        }
        for (env_var, provider) in &URL_MAPPINGS {
            if let Some(url) = env_value(env_var) {
                self.set_base_url(provider, url);
            }
        }

        let s = &mut self.settings;
        if let Some(lang) = parsed_env::<Language>("DEFAULT_LANGUAGE") {
            s.default_language = lang;
        }
        if let Some(model) = env_value("FARMGUIDE_MODEL") {
            s.model = model;
        }
        if let Some(model) = env_value("WHISPER_MODEL") {
            s.whisper_model = model;
        }
        if let Some(prefix) = env_value("TTS_PREFIX") {
            s.tts_prefix = prefix;
        }
        if let Some(dir) = env_value("FARMGUIDE_OUTPUT_DIR") {
            s.output_dir = PathBuf::from(dir);
        }
        if let Some(bind) = env_value("FARMGUIDE_BIND") {
            s.bind = bind;
        }
        if let Some(url) = env_value("FARMGUIDE_PUBLIC_URL") {
            s.public_base_url = Some(url);
        }
        if let Some(budget) = parsed_env("FARMGUIDE_SEARCH_BUDGET") {
            s.search_budget = budget;
        }
        if let Some(secs) = parsed_env("FARMGUIDE_SESSION_IDLE_SECS") {
            s.session_idle_secs = secs;
        }
        if let Some(turns) = parsed_env("FARMGUIDE_SESSION_MAX_TURNS") {
            s.session_max_turns = turns;
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        self.api_keys
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.read().ok()?.get(provider).cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        self.base_urls
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.read().ok()?.get(provider).cloned()
    }

    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }

    /// Directory that receives synthesized speech files.
    pub fn voice_output_dir(&self) -> PathBuf {
        self.settings.output_dir.join("voice_outputs")
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_value(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring invalid environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_service_behavior() {
        let s = Settings::default();
        assert_eq!(s.default_language, Language::En);
        assert_eq!(s.model, "llama-3.3-70b-versatile");
        assert_eq!(s.search_budget, 1);
        assert_eq!(s.session_idle_secs, 3600);
        assert_eq!(s.session_max_turns, 10);
        assert_eq!(s.default_session, "farmguide-session");
        assert_eq!(s.groq_model(), GroqModel::Llama3370bVersatile);
    }

    #[test]
    fn toml_sets_settings_keys_and_urls() {
        let config = FarmGuideConfig::from_toml_str(
            r#"
            default_language = "ur"
            output_dir = "/tmp/farm"
            search_budget = 2

            [api_keys]
            groq = "gsk-file"

            [base_urls]
            tavily = "http://localhost:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.settings().default_language, Language::Ur);
        assert_eq!(config.settings().search_budget, 2);
        assert_eq!(config.settings().tts_prefix, "response");
        assert_eq!(config.get_api_key("groq").as_deref(), Some("gsk-file"));
        assert_eq!(
            config.get_base_url("tavily").as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(
            config.voice_output_dir(),
            PathBuf::from("/tmp/farm/voice_outputs")
        );
    }

    #[test]
    fn unknown_language_in_file_is_rejected() {
        let err = FarmGuideConfig::from_toml_str(r#"default_language = "fr""#).unwrap_err();
        assert!(matches!(err, FarmGuideError::Configuration(_)));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = FarmGuideConfig::new();
        config.set_api_key("groq", "gsk-secret".into());
        let rendered = format!("{config:?}");
        assert!(rendered.contains("groq"));
        assert!(!rendered.contains("gsk-secret"));
    }

    #[test]
    fn missing_credentials_are_reported() {
        let config = FarmGuideConfig::new();
        assert!(!config.has_credentials("tavily"));
        config.set_api_key("tavily", "tvly-1".into());
        assert!(config.has_credentials("tavily"));
    }
}
