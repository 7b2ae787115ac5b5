use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use cross_xdg::BaseDirs;

use crate::machine::DEFAULT_TAPE_LENGTH;
use crate::snapshot::DEFAULT_DUMP_FILE;

/// Session-level settings. Command-line flags are applied on top of this by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub tape_length: usize,
    pub debug: bool,
    pub dump_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tape_length: DEFAULT_TAPE_LENGTH,
            debug: false,
            dump_file: PathBuf::from(DEFAULT_DUMP_FILE),
        }
    }
}

impl Config {
    /// Defaults, then `sbfi.toml` in the user config dir, then `SBFI_*` environment variables.
    pub fn load() -> Self {
        let mut cfg = Self::default();
        if let Some(content) = read_config_file() {
            cfg.apply_toml(&content);
        }
        cfg.apply_env(|key| env::var(key).ok());
        cfg
    }

    /// Apply the `[machine]` section of a small TOML document.
    pub fn apply_toml(&mut self, content: &str) {
        // Very small hand-rolled parser: look for [machine] section and key = value pairs
        let mut in_machine = false;
        let mut map: HashMap<String, String> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }
            if line.starts_with('[') && line.ends_with(']') {
                in_machine = &line[1..line.len()-1] == "machine";
                continue;
            }
            if !in_machine { continue; }
            if let Some(eq) = line.find('=') {
                let key = line[..eq].trim().to_string();
                let val_raw = line[eq+1..].trim();
                // Accept quoted or unquoted
                let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                    val_raw[1..val_raw.len()-1].to_string()
                } else { val_raw.to_string() };
                map.insert(key, val);
            }
        }

        if let Some(n) = map.get("tape_length").and_then(|s| parse_tape_length(s)) {
            self.tape_length = n;
        }
        if let Some(b) = map.get("debug").and_then(|s| parse_bool(s)) {
            self.debug = b;
        }
        if let Some(p) = map.get("dump_file").filter(|s| !s.is_empty()) {
            self.dump_file = PathBuf::from(p);
        }
    }

    /// Apply `SBFI_TAPE_LENGTH` and `SBFI_DEBUG` as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = lookup("SBFI_TAPE_LENGTH").and_then(|s| parse_tape_length(&s)) {
            self.tape_length = n;
        }
        if let Some(b) = lookup("SBFI_DEBUG").and_then(|s| parse_bool(&s)) {
            self.debug = b;
        }
    }
}

fn read_config_file() -> Option<String> {
    let base_dirs = BaseDirs::new().ok()?;

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("sbfi.toml");

    fs::read_to_string(path).ok()
}

fn parse_tape_length(value: &str) -> Option<usize> {
    value.trim().replace('_', "").parse::<usize>().ok().filter(|&n| n > 0)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
