use crate::{Result, VolumeErr, body::Gender};

/// Where the pretrained volumetric checkpoints are published.
pub const DEFAULT_URL_TEMPLATE: &str = "https://github.com/markomih/VolumetricSMPL/blob/dev/models/VolumetricSMPL_{model_type}_{gender}.safetensors?raw=true";

const MODEL_TYPE_PLACEHOLDER: &str = "{model_type}";
const GENDER_PLACEHOLDER: &str = "{gender}";

/// Identifies a pretrained checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey {
    pub model_type: String,
    pub gender: Gender,
}

impl CheckpointKey {
    pub fn new(model_type: impl Into<String>, gender: Gender) -> Self {
        Self {
            model_type: model_type.into(),
            gender,
        }
    }

    /// Derives the checkpoint's url by substituting this key in `template`.
    ///
    /// # Returns
    /// An error if the template lacks any of the placeholders.
    pub fn url(&self, template: &str) -> Result<String> {
        validate_template(template)?;

        Ok(template
            .replace(MODEL_TYPE_PLACEHOLDER, &self.model_type)
            .replace(GENDER_PLACEHOLDER, self.gender.as_str()))
    }
}

/// Checks that `template` names both the model type and the gender.
pub fn validate_template(template: &str) -> Result<()> {
    for placeholder in [MODEL_TYPE_PLACEHOLDER, GENDER_PLACEHOLDER] {
        if !template.contains(placeholder) {
            return Err(VolumeErr::InvalidConfig(format!(
                "url template {template} is missing {placeholder}"
            )));
        }
    }

    Ok(())
}
