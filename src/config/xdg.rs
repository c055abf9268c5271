//! XDG Base Directory support.

use std::path::{Path, PathBuf};

/// XDG directory paths for modelsync.
#[derive(Debug, Clone)]
pub struct XdgDirs {
    /// Config directory (~/.config/modelsync or XDG_CONFIG_HOME/modelsync)
    pub config: PathBuf,
}

impl XdgDirs {
    /// Get XDG directories, respecting environment variables.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            config: std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join(".config"))
                .join("modelsync"),
        }
    }

    /// Directories rooted at `root` instead of the user's home.
    pub fn under(root: &Path) -> Self {
        Self {
            config: root.join("modelsync"),
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_respects_xdg_config_home() {
        let previous = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/xdg-test");

        let dirs = XdgDirs::new();
        assert_eq!(dirs.config, PathBuf::from("/tmp/xdg-test/modelsync"));

        match previous {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    fn test_ensure_dirs_under_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dirs = XdgDirs::under(tmp.path());
        dirs.ensure_dirs().unwrap();
        assert!(dirs.config.is_dir());
    }
}
