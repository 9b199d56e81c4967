use tracing::warn;

const DEFAULT_PROMPT: &str = "> ";
const DEFAULT_HISTORY_SIZE: usize = 1000;
const DEFAULT_LOG_FILTER: &str = "warn";

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `PIPESH_PROMPT`
    pub prompt: String,
    /// `PIPESH_HISTORY_SIZE`: in-memory history entries kept by the editor.
    pub history_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(prompt) = lookup("PIPESH_PROMPT") {
            config.prompt = prompt;
        }

        if let Some(raw) = lookup("PIPESH_HISTORY_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(size) => config.history_size = size,
                Err(_) => warn!(value = %raw, "ignoring invalid PIPESH_HISTORY_SIZE"),
            }
        }

        config
    }

    /// Log filter directive: `PIPESH_LOG`, then `RUST_LOG`, then `warn`.
    ///
    /// Read separately from [`Config::from_env`] because logging has to be
    /// up before the rest of the config can report problems.
    pub fn log_filter(lookup: impl Fn(&str) -> Option<String>) -> String {
        lookup("PIPESH_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}
