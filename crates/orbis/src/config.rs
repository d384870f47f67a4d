use crate::geometry::Viewport;
use crate::layout::{ItemId, ItemSpec, Payload, SolverKind};
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Geometry and solver constants. Fixed at startup, replaced only on reload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub reference_radius: f64,
    pub item_size: f64,
    pub item_margin: f64,
    pub anchor_diameter: f64,
    pub screen_padding: f64,
    pub iterations: usize,
    pub damping: f64,
    pub attraction: f64,
    pub hover_scale: f64,
    pub max_radius_factor: f64,
    pub radius_step: f64,
    pub angular_resolution: usize,
    /// Base angle of the first item, radians clockwise from +x.
    pub start_angle: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            reference_radius: 120.0,
            item_size: 56.0,
            item_margin: 8.0,
            anchor_diameter: 56.0,
            screen_padding: 20.0,
            iterations: 10,
            damping: 0.5,
            attraction: 0.3,
            hover_scale: 1.2,
            max_radius_factor: 2.0,
            radius_step: 10.0,
            angular_resolution: 360,
            start_angle: 0.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return invalid("layout.damping must be in (0, 1]");
        }
        if !(self.hover_scale >= 1.0) {
            return invalid("layout.hover_scale must be at least 1");
        }
        if !(self.radius_step > 0.0) {
            return invalid("layout.radius_step must be positive");
        }
        if !(self.max_radius_factor >= 1.0) {
            return invalid("layout.max_radius_factor must be at least 1");
        }
        if self.angular_resolution == 0 {
            return invalid("layout.angular_resolution must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel in px beyond which a press-release is a drag, not a click.
    pub drag_threshold: f64,
    pub hover_enter_delay_ms: u64,
    pub hover_leave_delay_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            hover_enter_delay_ms: 80,
            hover_leave_delay_ms: 40,
        }
    }
}

impl InteractionConfig {
    pub fn hover_enter_delay(&self) -> Duration {
        Duration::from_millis(self.hover_enter_delay_ms)
    }

    pub fn hover_leave_delay(&self) -> Duration {
        Duration::from_millis(self.hover_leave_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemConfig {
    pub id: ItemId,
    pub size: Option<f64>,
    #[serde(flatten)]
    pub payload: Payload,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub solver: SolverKind,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

impl Config {
    pub fn item_specs(&self) -> Vec<ItemSpec> {
        self.items
            .iter()
            .map(|cfg| ItemSpec {
                id: cfg.id.clone(),
                base_size: cfg.size.unwrap_or(self.layout.item_size),
                payload: cfg.payload.clone(),
            })
            .collect()
    }

    /// Substitutes the built-in item set when none is configured.
    pub fn or_fallback_items(self) -> Self {
        if self.items.is_empty() {
            Self {
                items: Self::fallback().items,
                ..self
            }
        } else {
            self
        }
    }

    fn fallback() -> Self {
        let items = ["launch", "search", "notes", "settings"]
            .into_iter()
            .map(|id| ItemConfig {
                id: ItemId::new(id),
                size: None,
                payload: Payload {
                    label: Some(id.to_string()),
                    ..Payload::default()
                },
            })
            .collect();
        Self {
            items,
            ..Self::default()
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub fn get_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "orbis", "orbis").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(config::Environment::with_prefix("ORBIS").separator("__"))
        .build()?;

    finish(s.try_deserialize()?)
}

/// Parses a TOML document with the same defaults and validation as the config file.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(s.try_deserialize()?)
}

fn finish(config: Config) -> Result<Config, ConfigError> {
    config.layout.validate()?;
    Ok(config)
}

pub fn load_or_default() -> Config {
    match load_config() {
        Ok(c) => c.or_fallback_items(),
        Err(e) => {
            log::warn!("Using built-in layout config: {}", e);
            Config::fallback()
        }
    }
}

pub fn write_default_config() -> std::io::Result<std::path::PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", ConfigError::from(e));
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}
