use std::path::PathBuf;

use crate::components::fill::WallThreshold;
use crate::components::history::DEFAULT_HISTORY_LIMIT;
use crate::components::tools::{DEFAULT_SIZE, MAX_SIZE, MIN_SIZE};

// ============================================================================
// PRESET ARTWORKS
// ============================================================================

/// Line-art illustrations bundled into the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Artwork {
    #[default]
    BranchingCoral,
    BrainCoral,
    FanCoral,
}

impl Artwork {
    pub fn all() -> &'static [Artwork] {
        &[Artwork::BranchingCoral, Artwork::BrainCoral, Artwork::FanCoral]
    }

    /// Identifier used by the `img` navigation parameter.
    pub fn id(&self) -> &'static str {
        match self {
            Artwork::BranchingCoral => "1",
            Artwork::BrainCoral => "2",
            Artwork::FanCoral => "3",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Artwork::BranchingCoral => "Branching coral",
            Artwork::BrainCoral => "Brain coral",
            Artwork::FanCoral => "Sea fan and starfish",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Artwork::all().iter().copied().find(|a| a.id() == id.trim())
    }

    /// Resolve a navigation parameter; absent or unknown values fall back to
    /// the default artwork.
    pub fn from_query(param: Option<&str>) -> Self {
        param.and_then(Self::from_id).unwrap_or_default()
    }

    /// Encoded source image.
    pub fn bytes(&self) -> &'static [u8] {
        match self {
            Artwork::BranchingCoral => include_bytes!("../assets/artworks/coral1.png"),
            Artwork::BrainCoral => include_bytes!("../assets/artworks/coral2.png"),
            Artwork::FanCoral => include_bytes!("../assets/artworks/coral3.png"),
        }
    }
}

pub const APP_ICON_PNG: &[u8] = include_bytes!("../assets/icons/app_icon.png");

// ============================================================================
// APP SETTINGS
// ============================================================================

pub const DEFAULT_EXPORT_NAME: &str = "colorir.png";

/// Settings that persist across sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Artwork opened when no `img` parameter is given.
    pub default_artwork: Artwork,
    /// Maximum number of undo snapshots.
    pub max_undo_steps: usize,
    /// Initial stroke width.
    pub default_size: u32,
    /// Line-art detection thresholds for the bucket.
    pub walls: WallThreshold,
    /// File name offered when saving the finished drawing.
    pub export_file_name: String,
    /// Fixed spray seed; `None` draws from the OS.
    pub spray_seed: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_artwork: Artwork::default(),
            max_undo_steps: DEFAULT_HISTORY_LIMIT,
            default_size: DEFAULT_SIZE,
            walls: WallThreshold::default(),
            export_file_name: DEFAULT_EXPORT_NAME.to_string(),
            spray_seed: None,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/reefpaint/reefpaint_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\ReefPaint\reefpaint_settings.cfg
    /// On macOS:   ~/Library/Application Support/ReefPaint/reefpaint_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("ReefPaint").join("reefpaint_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("ReefPaint")
                    .join("reefpaint_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("reefpaint").join("reefpaint_settings.cfg"))
        }
    }

    pub fn to_config_string(&self) -> String {
        let mut content = format!(
            "default_artwork={}\n\
             max_undo_steps={}\n\
             default_size={}\n\
             wall_alpha_min={}\n\
             wall_channel_max={}\n\
             export_file_name={}\n",
            self.default_artwork.id(),
            self.max_undo_steps,
            self.default_size,
            self.walls.alpha_min,
            self.walls.channel_max,
            self.export_file_name,
        );
        if let Some(seed) = self.spray_seed {
            content.push_str(&format!("spray_seed={}\n", seed));
        }
        content
    }

    /// Parse `key=value` lines. Unknown keys and bad values keep their defaults.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "default_artwork" => {
                    s.default_artwork = Artwork::from_query(Some(val));
                }
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse::<usize>().unwrap_or(DEFAULT_HISTORY_LIMIT).max(2);
                }
                "default_size" => {
                    s.default_size = val.parse::<u32>().unwrap_or(DEFAULT_SIZE).clamp(MIN_SIZE, MAX_SIZE);
                }
                "wall_alpha_min" => {
                    if let Ok(v) = val.parse() {
                        s.walls.alpha_min = v;
                    }
                }
                "wall_channel_max" => {
                    if let Ok(v) = val.parse() {
                        s.walls.channel_max = v;
                    }
                }
                "export_file_name" => {
                    if !val.is_empty() {
                        s.export_file_name = val.to_string();
                    }
                }
                "spray_seed" => {
                    s.spray_seed = val.parse().ok();
                }
                _ => {}
            }
        }
        s
    }

    /// Save settings to disk. Failures are logged, never fatal.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = std::fs::write(&path, self.to_config_string()) {
            crate::log_warn!("could not save settings to {}: {}", path.display(), e);
        }
    }

    /// Load settings from disk (defaults if the file is missing or unreadable).
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_config_str(&content),
            Err(_) => Self::default(),
        }
    }
}
