//! Raw battery save files: a byte-for-byte dump of the `$6000-$7FFF` RAM.

use std::{fs, io, path::Path};

/// Fills `ram` from `path`.
///
/// Returns `Ok(false)` when no save exists yet. A file shorter than `ram`
/// fills the prefix and zeroes the rest; extra bytes are ignored.
pub fn load(path: &Path, ram: &mut [u8]) -> io::Result<bool> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    let len = bytes.len().min(ram.len());
    ram[..len].copy_from_slice(&bytes[..len]);
    ram[len..].fill(0);
    Ok(true)
}

/// Writes `ram` to `path`, creating the parent directory if needed.
pub fn save(path: &Path, ram: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, ram)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("nessie-battery-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = scratch_dir("missing");
        let mut ram = [0xAAu8; 8];
        assert!(!load(&dir.join("none.battery"), &mut ram).expect("missing is ok"));
        assert_eq!(ram, [0xAA; 8]);
    }

    #[test]
    fn save_then_load_restores_ram() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("saves").join("game.battery");
        let ram: Vec<u8> = (0..=255).collect();
        save(&path, &ram).expect("save succeeds");

        let mut restored = vec![0u8; 256];
        assert!(load(&path, &mut restored).expect("load succeeds"));
        assert_eq!(restored, ram);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn short_file_zero_fills_tail() {
        let dir = scratch_dir("short");
        let path = dir.join("short.battery");
        save(&path, &[1, 2]).expect("save succeeds");

        let mut ram = [9u8; 4];
        assert!(load(&path, &mut ram).expect("load succeeds"));
        assert_eq!(ram, [1, 2, 0, 0]);
        let _ = fs::remove_dir_all(&dir);
    }
}
