pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::super_update::{SuperUpdateOptions, TextFormatting, DEFAULT_MAX_FILE_NAME_LENGTH};

/// Initial values of the batch update panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuperUpdateDefaults {
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub match_all_occurrences: bool,
    pub enumerate_items: bool,
    pub edit_metadata: bool,
    pub text_formatting: TextFormatting,
}

impl Default for SuperUpdateDefaults {
    fn default() -> Self {
        Self {
            use_regex: true,
            case_sensitive: false,
            match_all_occurrences: false,
            enumerate_items: true,
            edit_metadata: false,
            text_formatting: TextFormatting::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExplorerConfig {
    /// Delay before collapsed directories drop their expanded descendants.
    pub collapse_debounce_ms: u64,
    /// Longest file name a batch rename may produce, extension included.
    pub max_file_name_length: usize,
    pub super_update: SuperUpdateDefaults,
}

impl ExplorerConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// A fresh set of batch options seeded from the configured defaults.
    pub fn super_update_options(&self) -> SuperUpdateOptions {
        let defaults = &self.super_update;
        SuperUpdateOptions {
            use_regex: defaults.use_regex,
            case_sensitive: defaults.case_sensitive,
            match_all_occurrences: defaults.match_all_occurrences,
            enumerate_items: defaults.enumerate_items,
            edit_metadata: defaults.edit_metadata,
            text_formatting: defaults.text_formatting,
            max_file_name_length: self.max_file_name_length,
            ..SuperUpdateOptions::default()
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            collapse_debounce_ms: 100,
            max_file_name_length: DEFAULT_MAX_FILE_NAME_LENGTH,
            super_update: SuperUpdateDefaults::default(),
        }
    }
}
