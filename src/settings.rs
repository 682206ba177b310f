use crate::Strategy;
use crate::compiler::compiler_errors::CompileError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SPROUT_FILE_EXTENSION: &str = "spr";
pub const CONFIG_FILE_NAME: &str = "sprout.toml";

// This is a guess about how much should be initially allocated for the token vec.
// Just a heuristic from small test programs to avoid some early reallocations.
pub const SRC_TO_TOKEN_RATIO: usize = 5;

// Host interface of the generated modules
pub const HOST_MODULE: &str = "stdlib";
pub const PRINT_IMPORT_NAME: &str = "print";
pub const READ_IMPORT_NAME: &str = "read";
pub const MAIN_EXPORT_NAME: &str = "main";
pub const SET_READ_VALUE_EXPORT_NAME: &str = "set_read_value";

/// Returned by the resumable entry point once the program has finished.
/// The host must not call main again after seeing it.
pub const FINISHED_LABEL: i32 = -1;

/// Optional per-project config, read from a `sprout.toml` next to the
/// source file. CLI flags override anything set here.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    pub strategy: Option<ConfigStrategy>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStrategy {
    Structured,
    Resumable,
}

impl From<ConfigStrategy> for Strategy {
    fn from(choice: ConfigStrategy) -> Self {
        match choice {
            ConfigStrategy::Structured => Strategy::Structured,
            ConfigStrategy::Resumable => Strategy::Resumable,
        }
    }
}

impl ProjectConfig {
    /// Loads the config next to the given source file.
    /// A missing config file is fine (defaults apply);
    /// a malformed one is a Config error.
    pub fn load_for_source(source_path: &Path) -> Result<Self, CompileError> {
        let config_path = source_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            CompileError::file_error(format!(
                "Could not read {}: {e}",
                config_path.display()
            ))
        })?;

        toml::from_str(&contents).map_err(|e| {
            CompileError::config_error(format!("{} is malformed: {e}", config_path.display()))
        })
    }
}
