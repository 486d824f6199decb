use super::AugmentedBody;
use crate::{
    Result, VolumeErr,
    body::{Gender, ParametricBody},
    checkpoint::{
        CachedSource, Checkpoint, CheckpointKey, CheckpointSource, LoadReport, global_source,
    },
    config::{AttachConfig, ReattachPolicy},
    storage::Device,
    volume::VolumetricExtension,
};

/// Augments `body` with a volumetric extension.
///
/// The extension is built from the body, hydrated from the checkpoint matching
/// its model type and the body's gender when `config.pretrained` is set, and
/// the whole augmented body is moved to `config.device` when there is one.
///
/// # Arguments
/// * `body` - The body to augment.
/// * `config` - How to attach the extension.
/// * `source` - Where checkpoints are fetched from, only used when pretrained.
///
/// # Returns
/// The augmented body, or the first error found. A failed attach consumes the body.
pub fn attach_volume<V, B, S>(
    body: B,
    config: &AttachConfig,
    source: &S,
) -> Result<AugmentedBody<B, V>>
where
    B: ParametricBody,
    V: VolumetricExtension,
    S: CheckpointSource + ?Sized,
{
    config.validate()?;

    let gender = body.gender();
    log::info!(
        "attaching volume to {} body: gender={gender} pretrained={}",
        body.model_type(),
        config.pretrained
    );

    let volume = V::from_body(&body)?;
    let mut augmented = AugmentedBody::new(body, volume);

    if config.pretrained {
        hydrate(&mut augmented.volume, gender, config, source)?;
    }

    if let Some(device) = config.device {
        augmented.to_device(device);
    }

    log::info!(
        "attached {} volume, device={}",
        augmented.volume.model_type(),
        config.device.unwrap_or_default()
    );

    Ok(augmented)
}

/// Same as `attach_volume` fetching checkpoints over http through the process-wide cache.
///
/// When `config.cache_dir` is set, downloaded checkpoints are also kept on disk.
pub fn attach_volume_with<V, B>(body: B, config: &AttachConfig) -> Result<AugmentedBody<B, V>>
where
    B: ParametricBody,
    V: VolumetricExtension,
{
    let source = global_source()?;

    match &config.cache_dir {
        Some(dir) => attach_volume(body, config, &CachedSource::with_dir(source, dir.clone())),
        None => attach_volume(body, config, source),
    }
}

/// Augments `body` with the default configuration.
///
/// # Arguments
/// * `body` - The body to augment.
/// * `pretrained` - Whether to download the published weights.
/// * `device` - Where to move the augmented body, if anywhere.
pub fn attach_volume_default<V, B>(
    body: B,
    pretrained: bool,
    device: Option<Device>,
) -> Result<AugmentedBody<B, V>>
where
    B: ParametricBody,
    V: VolumetricExtension,
{
    let config = AttachConfig {
        device,
        ..AttachConfig::default().pretrained(pretrained)
    };

    attach_volume_with(body, &config)
}

impl<B: ParametricBody, V: VolumetricExtension> AugmentedBody<B, V> {
    /// Attaches a fresh extension to an already augmented body.
    ///
    /// With `ReattachPolicy::Replace` the new extension replaces the current
    /// one once it's fully built, the body's parameters are left untouched.
    /// Without a `config.device` the new extension takes the place of the
    /// current one on its device. On error the current extension is kept.
    ///
    /// # Returns
    /// An `AttachmentConflict` under `ReattachPolicy::Reject`, or any attach error.
    pub fn reattach<S>(&mut self, config: &AttachConfig, source: &S) -> Result<()>
    where
        S: CheckpointSource + ?Sized,
    {
        if config.reattach == ReattachPolicy::Reject {
            return Err(VolumeErr::AttachmentConflict {
                model_type: self.volume.model_type().to_string(),
            });
        }

        config.validate()?;
        log::warn!("replacing the attached {} volume", self.volume.model_type());

        let mut volume = V::from_body(&self.body)?;
        if config.pretrained {
            hydrate(&mut volume, self.body.gender(), config, source)?;
        }

        match config.device {
            Some(device) => {
                self.volume = volume;
                self.to_device(device);
            }
            None => {
                if let Some(device) = self.volume.parameters().device() {
                    volume.to_device(device);
                }
                self.volume = volume;
            }
        }

        Ok(())
    }
}

/// Restores `volume` from the checkpoint published for its model type and `gender`.
fn hydrate<V, S>(
    volume: &mut V,
    gender: Gender,
    config: &AttachConfig,
    source: &S,
) -> Result<LoadReport>
where
    V: VolumetricExtension,
    S: CheckpointSource + ?Sized,
{
    let key = CheckpointKey::new(volume.model_type(), gender);
    let url = key.url(&config.url_template)?;
    log::debug!("fetching checkpoint {url}");

    let bytes = source.fetch(&url)?;
    let checkpoint = Checkpoint::from_bytes(&bytes)?;
    let report = volume.load_state_dict(&checkpoint.state_dict, config.load_policy)?;

    log::debug!(
        loaded = report.loaded.len(),
        missing = report.missing.len(),
        unexpected = report.unexpected.len();
        "restored volume from {url}"
    );

    Ok(report)
}
