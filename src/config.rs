//! Per-call option bag.
//!
//! A [`Config`] is built fresh for every call, either through the fluent `with_*`
//! methods or by folding an ordered list of [`Setting`]s onto [`Config::default`].
//! The last setting applied for a given option wins.

use std::{fmt, sync::Arc};

use log::debug;

/// Rewrites a key for insensitive matching. Must be total and should be idempotent.
pub type KeyNormalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Receives messages about lossy best-effort fallbacks.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
pub enum Setting {
    Yaml(bool),
    KeyNormalization(bool),
    Strict(bool),
    NumberConversion(bool),
    Logger(LogSink),
    KeyNormalizer(KeyNormalizer),
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Yaml(v) => f.debug_tuple("Yaml").field(v).finish(),
            Setting::KeyNormalization(v) => f.debug_tuple("KeyNormalization").field(v).finish(),
            Setting::Strict(v) => f.debug_tuple("Strict").field(v).finish(),
            Setting::NumberConversion(v) => f.debug_tuple("NumberConversion").field(v).finish(),
            Setting::Logger(_) => f.write_str("Logger(..)"),
            Setting::KeyNormalizer(_) => f.write_str("KeyNormalizer(..)"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub yaml: bool,
    pub normalize_keys: bool,
    pub strict: bool,
    pub number_conversion: bool,
    logger: LogSink,
    normalizer: KeyNormalizer,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            yaml: false,
            normalize_keys: true,
            strict: false,
            number_conversion: true,
            logger: default_logger(),
            normalizer: Arc::new(|key: &str| default_normalizer(key)),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("yaml", &self.yaml)
            .field("normalize_keys", &self.normalize_keys)
            .field("strict", &self.strict)
            .field("number_conversion", &self.number_conversion)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings<I>(settings: I) -> Self
    where
        I: IntoIterator<Item = Setting>,
    {
        let mut config = Self::default();
        for setting in settings {
            config.apply(setting);
        }
        config
    }

    pub fn apply(&mut self, setting: Setting) {
        match setting {
            Setting::Yaml(enabled) => self.yaml = enabled,
            Setting::KeyNormalization(enabled) => self.normalize_keys = enabled,
            Setting::Strict(enabled) => self.strict = enabled,
            Setting::NumberConversion(enabled) => self.number_conversion = enabled,
            Setting::Logger(sink) => self.logger = sink,
            Setting::KeyNormalizer(normalizer) => self.normalizer = normalizer,
        }
    }

    pub fn with_yaml(mut self, enabled: bool) -> Self {
        self.apply(Setting::Yaml(enabled));
        self
    }

    pub fn with_key_normalization(mut self, enabled: bool) -> Self {
        self.apply(Setting::KeyNormalization(enabled));
        self
    }

    pub fn with_strict(mut self, enabled: bool) -> Self {
        self.apply(Setting::Strict(enabled));
        self
    }

    pub fn with_number_conversion(mut self, enabled: bool) -> Self {
        self.apply(Setting::NumberConversion(enabled));
        self
    }

    pub fn with_logger<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.apply(Setting::Logger(Arc::new(sink)));
        self
    }

    pub fn with_key_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.apply(Setting::KeyNormalizer(Arc::new(normalizer)));
        self
    }

    pub fn normalizer(&self) -> &KeyNormalizer {
        &self.normalizer
    }

    /// The key used for field lookups: normalized when normalization is on,
    /// verbatim otherwise.
    pub fn match_key(&self, key: &str) -> String {
        if self.normalize_keys {
            (self.normalizer)(key)
        } else {
            key.to_string()
        }
    }

    pub fn log(&self, message: &str) {
        (self.logger)(message);
    }
}

fn default_logger() -> LogSink {
    Arc::new(|message: &str| debug!("{message}"))
}

/// Lowercases, then drops every character that is not an ASCII letter or digit.
pub fn default_normalizer(key: &str) -> String {
    key.chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
