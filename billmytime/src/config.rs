use crate::display::Slot;
use anyhow::{Context, Result};
use billmytime_proto::{SubmitLayout, SOCKET_PATH};
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "billmytime.toml";

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "billmytime", "BillMyTime")
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub icons: Icons,
    pub protocol: Protocol,
    pub display: DisplayConfig,
    pub transport: Transport,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub selection: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub accent: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub muted: Color,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Icons {
    pub running: String,
    pub stopped: String,
    pub select: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Protocol {
    /// Page sent with every list request.
    pub page: i64,
    pub submit_layout: SubmitLayout,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    /// Slot that shows a picked project.
    pub project_selection_slot: Slot,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Transport {
    pub socket_path: PathBuf,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 14, 19),
            foreground: Color::Rgb(197, 201, 199),
            selection: Color::Rgb(230, 195, 132),
            accent: Color::Rgb(127, 180, 202),
            muted: Color::Rgb(164, 167, 164),
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            running: "▶".to_string(),
            stopped: "■".to_string(),
            select: "▸".to_string(),
        }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            page: 1,
            submit_layout: SubmitLayout::Legacy,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            project_selection_slot: Slot::Task,
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(SOCKET_PATH),
        }
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    if !s.starts_with('#') || s.len() != 7 {
        return Err(serde::de::Error::custom("invalid hex color format"));
    }
    let r = u8::from_str_radix(&s[1..3], 16).map_err(serde::de::Error::custom)?;
    let g = u8::from_str_radix(&s[3..5], 16).map_err(serde::de::Error::custom)?;
    let b = u8::from_str_radix(&s[5..7], 16).map_err(serde::de::Error::custom)?;
    Ok(Color::Rgb(r, g, b))
}

pub fn load_config() -> Result<Config> {
    match project_dirs() {
        Some(proj_dirs) => load_from(&proj_dirs.config_dir().join(CONFIG_FILE)),
        None => Ok(Config::default()),
    }
}

pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file at {:?}", path))
}
