use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("primo"),
            )
        } else {
            ProjectDirs::from("", "", "primo").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// Session store: records, in-flight mode state and the round log
    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sessions.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("primo.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "primo").map(|pd| pd.config_dir().join("config.json"))
    }
}
