use anyhow::{anyhow, Context};
use eframe::egui::Color32;
use serde::Deserialize;
use std::{env, fs, path::PathBuf};

use crate::palette::PaletteSeed;

/// Application configuration, loaded from the first `config.toml` found
/// next to the working directory or the executable. Missing files and
/// missing keys fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub presenter: PresenterConfig,
    /// Directory of cover files for the demo app.
    pub art_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("config.toml"));
            candidates.push(current_dir.join("config").join("albumart.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("config.toml"));
                candidates.push(dir.join("config").join("albumart.toml"));
            }
        }

        for path in candidates {
            if path.exists() {
                let data = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let doc: ConfigDocument = toml::from_str(&data)
                    .with_context(|| format!("Failed to parse config: {}", path.display()))?;
                return doc.try_into();
            }
        }

        Ok(Config::default())
    }
}

#[derive(Debug, Clone)]
pub struct PresenterConfig {
    pub default_background: Color32,
    pub default_accent: Color32,
    pub art_size: u32,
    pub turn_secs: f32,
    pub transition_millis: u64,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            default_background: Color32::from_rgb(0x40, 0x40, 0x40),
            default_accent: Color32::from_rgb(0x40, 0x40, 0x40),
            art_size: 512,
            turn_secs: 45.0,
            transition_millis: 350,
        }
    }
}

impl PresenterConfig {
    pub fn seed(&self) -> PaletteSeed {
        PaletteSeed {
            background: self.default_background,
            accent: self.default_accent,
        }
    }

    pub fn art_size(&self) -> u32 {
        self.art_size.clamp(64, 2048)
    }

    pub fn turn_secs(&self) -> f32 {
        self.turn_secs.clamp(1.0, 600.0)
    }

    pub fn transition_millis(&self) -> u64 {
        self.transition_millis.clamp(0, 5_000)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    presenter: PresenterSection,
    art_dir: Option<PathBuf>,
}

impl TryFrom<ConfigDocument> for Config {
    type Error = anyhow::Error;

    fn try_from(value: ConfigDocument) -> anyhow::Result<Self> {
        let defaults = PresenterConfig::default();
        let section = value.presenter;

        let default_background = match section.default_background {
            Some(hex) => parse_color(&hex)?,
            None => defaults.default_background,
        };
        let default_accent = match section.default_accent {
            Some(hex) => parse_color(&hex)?,
            None => defaults.default_accent,
        };

        let presenter = PresenterConfig {
            default_background,
            default_accent,
            art_size: section.art_size.unwrap_or(defaults.art_size),
            turn_secs: section.turn_secs.unwrap_or(defaults.turn_secs),
            transition_millis: section
                .transition_millis
                .unwrap_or(defaults.transition_millis),
        };

        Ok(Config {
            presenter,
            art_dir: value.art_dir,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct PresenterSection {
    default_background: Option<String>,
    default_accent: Option<String>,
    art_size: Option<u32>,
    turn_secs: Option<f32>,
    transition_millis: Option<u64>,
}

/// Parses `#RRGGBB` or `#RRGGBBAA` colour strings.
pub fn parse_color(value: &str) -> anyhow::Result<Color32> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return Err(anyhow!("colour must be #RRGGBB or #RRGGBBAA, got {value}"));
    }
    let channel = |offset: usize| -> anyhow::Result<u8> {
        u8::from_str_radix(&hex[offset..offset + 2], 16)
            .map_err(|_| anyhow!("invalid colour component in {value}"))
    };

    match hex.len() {
        6 => Ok(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Ok(Color32::from_rgba_unmultiplied(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            channel(6)?,
        )),
        _ => Err(anyhow!("colour must be #RRGGBB or #RRGGBBAA, got {value}")),
    }
}
