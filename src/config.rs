use std::env;

use crate::module::DEFAULT_MODULE_PATH;

/// MIME type attached to converted workbooks.
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Environment variable overriding the default module location.
pub const MODULE_PATH_ENV: &str = "SPREADSHEET_EXPORT_MODULE";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Used when a request carries no `wasmPath` of its own
    pub module_path: String,
    pub mime_type: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            module_path: DEFAULT_MODULE_PATH.to_string(),
            mime_type: XLSX_MIME_TYPE.to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var(MODULE_PATH_ENV) {
            if !path.trim().is_empty() {
                config.module_path = path;
            }
        }
        config
    }

    pub fn with_module_path(mut self, path: impl Into<String>) -> Self {
        self.module_path = path.into();
        self
    }
}
