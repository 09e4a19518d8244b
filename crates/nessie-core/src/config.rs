use std::path::{Path, PathBuf};

/// Emulator-wide settings that are not part of the console state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NesConfig {
    /// Directory, relative to the ROM's directory, that holds battery saves.
    pub save_dir_name: String,
    /// File extension used for battery saves.
    pub battery_extension: String,
    /// Load an existing battery save when a cartridge is inserted.
    pub autoload_battery: bool,
}

impl Default for NesConfig {
    fn default() -> Self {
        Self {
            save_dir_name: "saves".to_string(),
            battery_extension: "battery".to_string(),
            autoload_battery: true,
        }
    }
}

impl NesConfig {
    /// `<rom_dir>/<save_dir_name>/<rom_stem>.<battery_extension>`.
    ///
    /// Returns `None` when the ROM path has no file stem.
    pub fn battery_path_for(&self, rom_path: &Path) -> Option<PathBuf> {
        let stem = rom_path.file_stem()?;
        let dir = rom_path.parent().unwrap_or_else(|| Path::new(""));
        let file = format!("{}.{}", stem.to_string_lossy(), self.battery_extension);
        Some(dir.join(&self.save_dir_name).join(file))
    }
}
