// Configuration Storage Service
// Handles config file read/write and version backup

use crate::services::analysis::EngineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub version: String,
    pub detection: DetectionConfig,
    /// Optional dimension weight overrides (wire ids -> weight). Applied
    /// through the engine's weight update; invalid tables are ignored
    /// with a warning rather than failing startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    #[serde(default = "default_true")]
    pub parallel_enabled: bool,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,
    #[serde(default = "default_join_timeout")]
    pub join_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub caching_enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_max_paragraphs")]
    pub max_paragraphs: usize,
    #[serde(default = "default_max_sentences")]
    pub max_sentences_per_paragraph: usize,
    #[serde(default = "default_max_word_impact")]
    pub max_word_impact: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            parallel_enabled: true,
            max_workers: default_max_workers(),
            task_timeout_secs: default_task_timeout(),
            join_timeout_secs: default_join_timeout(),
            caching_enabled: true,
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            max_paragraphs: default_max_paragraphs(),
            max_sentences_per_paragraph: default_max_sentences(),
            max_word_impact: default_max_word_impact(),
        }
    }
}

impl DetectionConfig {
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            parallel_enabled: self.parallel_enabled,
            max_workers: self.max_workers,
            task_timeout: Duration::from_secs(self.task_timeout_secs),
            join_timeout: Duration::from_secs(self.join_timeout_secs),
            caching_enabled: self.caching_enabled,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_capacity: self.cache_capacity,
            max_paragraphs: self.max_paragraphs,
            max_sentences_per_paragraph: self.max_sentences_per_paragraph,
            max_word_impact: self.max_word_impact,
            ..EngineConfig::default()
        }
    }
}

fn default_true() -> bool { true }
fn default_max_workers() -> usize { 4 }
fn default_task_timeout() -> u64 { 30 }
fn default_join_timeout() -> u64 { 60 }
fn default_cache_ttl() -> u64 { 300 }
fn default_cache_capacity() -> usize { 100 }
fn default_max_paragraphs() -> usize { 10 }
fn default_max_sentences() -> usize { 8 }
fn default_max_word_impact() -> usize { 20 }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("origo"))
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        // Create backup if file exists
        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Create a backup of current config
    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)?;

        Ok(())
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &PathBuf, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Sort by modification time (oldest first)
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        // Remove oldest entries
        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}
