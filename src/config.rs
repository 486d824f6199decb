use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    Result, VolumeErr,
    checkpoint::{DEFAULT_URL_TEMPLATE, LoadPolicy, validate_template},
    storage::Device,
};

/// What to do when a body that already carries an extension is attached again.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReattachPolicy {
    /// Build a fresh extension and drop the previous one.
    #[default]
    Replace,
    /// Fail with an attachment conflict.
    Reject,
}

/// Controls how a volumetric extension is attached to a body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttachConfig {
    /// Whether to hydrate the extension from the published checkpoint.
    pub pretrained: bool,
    /// Where to move the augmented body once it's built.
    pub device: Option<Device>,
    pub load_policy: LoadPolicy,
    /// Checkpoint url with `{model_type}` and `{gender}` placeholders.
    pub url_template: String,
    /// Directory where downloaded checkpoints are kept across processes.
    pub cache_dir: Option<PathBuf>,
    pub reattach: ReattachPolicy,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            pretrained: true,
            device: None,
            load_policy: LoadPolicy::Strict,
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            cache_dir: None,
            reattach: ReattachPolicy::Replace,
        }
    }
}

impl AttachConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretrained(mut self, pretrained: bool) -> Self {
        self.pretrained = pretrained;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_load_policy(mut self, load_policy: LoadPolicy) -> Self {
        self.load_policy = load_policy;
        self
    }

    pub fn with_url_template(mut self, url_template: impl Into<String>) -> Self {
        self.url_template = url_template.into();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn with_reattach(mut self, reattach: ReattachPolicy) -> Self {
        self.reattach = reattach;
        self
    }

    /// Checks the configuration can be used to attach a volume.
    ///
    /// # Returns
    /// An error if the url template lacks a placeholder. The template is only
    /// checked when `pretrained` is set, it's never used otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.pretrained {
            validate_template(&self.url_template)?;
        }

        Ok(())
    }

    /// Parses a configuration from JSON, missing fields take their default value.
    ///
    /// # Errors
    /// Returns an `InvalidConfig` if the JSON is malformed, has unknown fields or doesn't validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VolumeErr::InvalidConfig(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VolumeErr::InvalidConfig(format!("cannot read '{}': {e}", path.display()))
        })?;

        Self::from_json_str(&content)
    }
}
