use once_cell::sync::Lazy;
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::ThemeMode;

#[derive(Debug, Clone, Deserialize)]
struct PaletteConfig {
    text: String,
    muted: String,
    accent: String,
    border: String,
    highlight: String,
    success: String,
    error: String,
    pending: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PaletteConfigOpt {
    text: Option<String>,
    muted: Option<String>,
    accent: Option<String>,
    border: Option<String>,
    highlight: Option<String>,
    success: Option<String>,
    error: Option<String>,
    pending: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ThemeFile {
    dark: PaletteConfig,
    light: PaletteConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ThemeFileOpt {
    #[serde(default)]
    dark: PaletteConfigOpt,
    #[serde(default)]
    light: PaletteConfigOpt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub highlight: Color,
    pub success: Color,
    pub error: Color,
    pub pending: Color,
}

static EMBEDDED: Lazy<ThemeFile> = Lazy::new(|| {
    let raw = include_str!("theme.toml");
    toml::from_str(raw).unwrap_or_else(|err| {
        tracing::warn!("embedded theme unreadable, using fallback: {}", err);
        ThemeFile {
            dark: fallback_palette(),
            light: fallback_palette(),
        }
    })
});

impl Theme {
    /// Embedded palette for `mode`, with any colours from `override_path`
    /// (or `~/.mcpdeck/theme.toml` when none is given) laid on top.
    pub fn load(mode: ThemeMode, override_path: Option<&Path>) -> Self {
        let path = override_path.map(Path::to_path_buf).or_else(home_override_path);
        let overrides = path.as_deref().and_then(read_override);
        Self::resolve(mode, overrides.unwrap_or_default())
    }

    fn resolve(mode: ThemeMode, overrides: ThemeFileOpt) -> Self {
        let (mut palette, patch) = match mode {
            ThemeMode::Dark => (EMBEDDED.dark.clone(), overrides.dark),
            ThemeMode::Light => (EMBEDDED.light.clone(), overrides.light),
        };
        apply_override(&mut palette, patch);
        let map = color_map();
        Theme {
            text: resolve_color(&palette.text, &map),
            muted: resolve_color(&palette.muted, &map),
            accent: resolve_color(&palette.accent, &map),
            border: resolve_color(&palette.border, &map),
            highlight: resolve_color(&palette.highlight, &map),
            success: resolve_color(&palette.success, &map),
            error: resolve_color(&palette.error, &map),
            pending: resolve_color(&palette.pending, &map),
        }
    }
}

fn fallback_palette() -> PaletteConfig {
    PaletteConfig {
        text: "white".to_string(),
        muted: "dark_grey".to_string(),
        accent: "magenta".to_string(),
        border: "grey".to_string(),
        highlight: "blue".to_string(),
        success: "green".to_string(),
        error: "red".to_string(),
        pending: "yellow".to_string(),
    }
}

fn home_override_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".mcpdeck").join("theme.toml"))
}

fn read_override(path: &Path) -> Option<ThemeFileOpt> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!("ignoring theme {}: {}", path.display(), err);
            None
        }
    }
}

fn apply_override(palette: &mut PaletteConfig, patch: PaletteConfigOpt) {
    let slots = [
        (&mut palette.text, patch.text),
        (&mut palette.muted, patch.muted),
        (&mut palette.accent, patch.accent),
        (&mut palette.border, patch.border),
        (&mut palette.highlight, patch.highlight),
        (&mut palette.success, patch.success),
        (&mut palette.error, patch.error),
        (&mut palette.pending, patch.pending),
    ];
    for (slot, value) in slots {
        if let Some(value) = value {
            *slot = value;
        }
    }
}

fn color_map() -> HashMap<&'static str, Color> {
    HashMap::from([
        ("black", Color::Black),
        ("dark_grey", Color::DarkGray),
        ("dark_gray", Color::DarkGray),
        ("gray", Color::Gray),
        ("grey", Color::Gray),
        ("red", Color::LightRed),
        ("dark_red", Color::Red),
        ("green", Color::LightGreen),
        ("dark_green", Color::Green),
        ("yellow", Color::LightYellow),
        ("dark_yellow", Color::Yellow),
        ("blue", Color::LightBlue),
        ("dark_blue", Color::Blue),
        ("magenta", Color::LightMagenta),
        ("dark_magenta", Color::Magenta),
        ("cyan", Color::LightCyan),
        ("dark_cyan", Color::Cyan),
        ("white", Color::White),
    ])
}

fn resolve_color(name: &str, map: &HashMap<&'static str, Color>) -> Color {
    let key = name.trim().to_ascii_lowercase();
    if let Some(hex) = key.strip_prefix('#') {
        if let (6, Ok(rgb)) = (hex.len(), u32::from_str_radix(hex, 16)) {
            return Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8);
        }
    }
    map.get(key.as_str()).copied().unwrap_or(Color::White)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn hex_and_named_colours_resolve() {
        let map = color_map();
        assert_eq!(resolve_color("#9333ea", &map), Color::Rgb(0x93, 0x33, 0xea));
        assert_eq!(resolve_color(" Dark_Grey ", &map), Color::DarkGray);
        assert_eq!(resolve_color("#12", &map), Color::White);
        assert_eq!(resolve_color("chartreuse", &map), Color::White);
    }

    #[test]
    fn palettes_differ_by_mode() {
        let dark = Theme::resolve(ThemeMode::Dark, ThemeFileOpt::default());
        let light = Theme::resolve(ThemeMode::Light, ThemeFileOpt::default());
        assert_eq!(dark.text, Color::White);
        assert_eq!(light.text, Color::Black);
    }

    #[test]
    fn override_file_patches_only_named_colours() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("theme.toml");
        fs::write(&path, "[dark]\naccent = \"cyan\"\n").unwrap();

        let theme = Theme::load(ThemeMode::Dark, Some(&path));
        assert_eq!(theme.accent, Color::LightCyan);
        assert_eq!(theme.text, Color::White);
    }

    #[test]
    fn unreadable_override_falls_back_to_embedded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("theme.toml");
        fs::write(&path, "[dark\n").unwrap();

        let theme = Theme::load(ThemeMode::Light, Some(&path));
        assert_eq!(theme, Theme::resolve(ThemeMode::Light, ThemeFileOpt::default()));
    }
}
