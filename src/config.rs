use std::collections::HashMap;
use std::path::Path;
use crate::error::{ParticlesError, Result};

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_PARTICLE_COUNT: u32 = 175_000;

const KEY_RESOLUTION_X: &str = "resolution_x";
const KEY_RESOLUTION_Y: &str = "resolution_y";
const KEY_VSYNC: &str = "vertical_retrace";
const KEY_FULLSCREEN: &str = "fullscreen";
const KEY_PARTICLE_COUNT: &str = "particle_count";

const KNOWN_KEYS: [&str; 5] = [
    KEY_RESOLUTION_X,
    KEY_RESOLUTION_Y,
    KEY_VSYNC,
    KEY_FULLSCREEN,
    KEY_PARTICLE_COUNT,
];

/// Startup settings. Loaded once, before any GPU resource exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fullscreen: bool,
    pub particle_count: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
            fullscreen: false,
            particle_count: DEFAULT_PARTICLE_COUNT,
        }
    }
}

impl Config {
    /// Reads and parses the configuration file. A missing file is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ParticlesError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&text).map_err(|reason| ParticlesError::ConfigLoad {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parses whitespace separated `key value` pairs.
    ///
    /// Every key is optional and falls back to its default. When a key repeats,
    /// the last value wins. Unknown keys are ignored.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let entries = Self::collect_pairs(text);
        let defaults = Self::default();

        let config = Self {
            width: Self::lookup(&entries, KEY_RESOLUTION_X, defaults.width)?,
            height: Self::lookup(&entries, KEY_RESOLUTION_Y, defaults.height)?,
            vsync: Self::lookup_flag(&entries, KEY_VSYNC, defaults.vsync)?,
            fullscreen: Self::lookup_flag(&entries, KEY_FULLSCREEN, defaults.fullscreen)?,
            particle_count: Self::lookup(&entries, KEY_PARTICLE_COUNT, defaults.particle_count)?,
        };

        if config.width == 0 || config.height == 0 {
            return Err(format!("resolution must be non-zero, got {}x{}", config.width, config.height));
        }
        if config.particle_count == 0 {
            return Err(format!("{KEY_PARTICLE_COUNT} must be a positive integer"));
        }

        Ok(config)
    }

    /// Scans one token at a time. A recognized key takes the next token as its
    /// value; any other token is skipped on its own, so stray words never shift
    /// the pairs that follow them.
    fn collect_pairs(text: &str) -> HashMap<&str, &str> {
        let mut tokens = text.split_whitespace();
        let mut entries = HashMap::new();

        while let Some(token) = tokens.next() {
            if !KNOWN_KEYS.contains(&token) {
                log::debug!("Skipping config token '{}'", token);
                continue;
            }
            match tokens.next() {
                Some(value) => {
                    entries.insert(token, value);
                }
                None => log::warn!("Config key '{}' has no value, ignoring it", token),
            }
        }

        entries
    }

    fn lookup(entries: &HashMap<&str, &str>, key: &str, default: u32) -> std::result::Result<u32, String> {
        match entries.get(key) {
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| format!("{key} expects a non-negative integer, got '{value}'")),
            None => Ok(default),
        }
    }

    fn lookup_flag(entries: &HashMap<&str, &str>, key: &str, default: bool) -> std::result::Result<bool, String> {
        match entries.get(key) {
            Some(&"0") => Ok(false),
            Some(&"1") => Ok(true),
            Some(value) => Err(format!("{key} expects 0 or 1, got '{value}'")),
            None => Ok(default),
        }
    }
}
