use serde::Deserialize;

use super::StateDict;
use crate::{
    Result, VolumeErr,
    storage::{ParameterSet, no_grad},
};

/// How to treat names that only exist on one side when restoring a state dict.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Every parameter must be restored and every stored tensor must be used.
    #[default]
    Strict,
    /// Missing parameters keep their values and unexpected tensors are skipped.
    Relaxed,
}

/// Outcome of restoring a state dict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Restores `params` from `state`.
///
/// Every check happens before the first write, so on error no parameter is modified.
/// Shapes must match exactly under both policies.
///
/// # Arguments
/// * `params` - The parameters to restore.
/// * `state` - The stored tensors, by parameter name.
/// * `policy` - How to treat missing and unexpected names.
///
/// # Returns
/// Which names were loaded, missing or unexpected.
pub fn load_state_dict(
    params: &mut ParameterSet,
    state: &StateDict,
    policy: LoadPolicy,
) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for (name, param) in params.iter() {
        let Some(tensor) = state.get(name) else {
            report.missing.push(name.to_string());
            continue;
        };

        if tensor.shape() != param.shape() {
            return Err(VolumeErr::CheckpointShapeMismatch {
                name: name.to_string(),
                expected: param.shape().to_vec(),
                got: tensor.shape().to_vec(),
            });
        }

        report.loaded.push(name.to_string());
    }

    report.unexpected = state
        .keys()
        .filter(|name| !params.contains(name))
        .cloned()
        .collect();

    if policy == LoadPolicy::Strict && !report.is_complete() {
        return Err(VolumeErr::CheckpointKeyMismatch {
            missing: report.missing,
            unexpected: report.unexpected,
        });
    }

    no_grad(|| {
        report
            .loaded
            .iter()
            .try_for_each(|name| params.assign(name, &state[name]))
    })?;

    if !report.is_complete() {
        log::warn!(
            "partial state dict load: missing={:?} unexpected={:?}",
            report.missing,
            report.unexpected
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn, arr1};

    use super::*;
    use crate::storage::Parameter;

    fn create_test_params() -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("a", Parameter::zeros(&[2]));
        params.insert("b", Parameter::zeros(&[3]));
        params
    }

    fn state(entries: &[(&str, Vec<f32>)]) -> StateDict {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), arr1(values).into_dyn()))
            .collect()
    }

    #[test]
    fn strict_exact() {
        let mut params = create_test_params();
        let state = state(&[("a", vec![1., 2.]), ("b", vec![3., 4., 5.])]);

        let report = load_state_dict(&mut params, &state, LoadPolicy::Strict).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.loaded, ["a", "b"]);
        assert_eq!(params.get("b").unwrap().data(), &state["b"]);
    }

    #[test]
    fn strict_missing() {
        let mut params = create_test_params();
        let before = params.clone();
        let state = state(&[("a", vec![1., 2.])]);

        let err = load_state_dict(&mut params, &state, LoadPolicy::Strict).unwrap_err();

        assert!(matches!(
            err,
            VolumeErr::CheckpointKeyMismatch { ref missing, .. } if missing == &["b"]
        ));
        assert_eq!(params, before);
    }

    #[test]
    fn strict_unexpected() {
        let mut params = create_test_params();
        let state = state(&[("a", vec![1., 2.]), ("b", vec![3., 4., 5.]), ("c", vec![0.])]);

        let err = load_state_dict(&mut params, &state, LoadPolicy::Strict).unwrap_err();

        assert!(matches!(
            err,
            VolumeErr::CheckpointKeyMismatch { ref unexpected, .. } if unexpected == &["c"]
        ));
    }

    #[test]
    fn relaxed_partial() {
        let mut params = create_test_params();
        let state = state(&[("a", vec![1., 2.]), ("c", vec![0.])]);

        let report = load_state_dict(&mut params, &state, LoadPolicy::Relaxed).unwrap();

        assert_eq!(report.loaded, ["a"]);
        assert_eq!(report.missing, ["b"]);
        assert_eq!(report.unexpected, ["c"]);
        assert_eq!(params.get("a").unwrap().data(), &state["a"]);
        assert_eq!(params.get("b").unwrap().data(), &ArrayD::<f32>::zeros(IxDyn(&[3])));
    }

    #[test]
    fn shape_mismatch_under_any_policy() {
        for policy in [LoadPolicy::Strict, LoadPolicy::Relaxed] {
            let mut params = create_test_params();
            let before = params.clone();
            let state = state(&[("a", vec![1., 2.]), ("b", vec![3., 4.])]);

            let err = load_state_dict(&mut params, &state, policy).unwrap_err();

            assert!(matches!(err, VolumeErr::CheckpointShapeMismatch { .. }));
            assert_eq!(params, before);
        }
    }

    #[test]
    fn broadcastable_is_not_enough() {
        let mut params = create_test_params();
        let mut state = state(&[("b", vec![3., 4., 5.])]);
        state.insert("a".into(), arr1(&[1.]).into_dyn());

        let err = load_state_dict(&mut params, &state, LoadPolicy::Strict).unwrap_err();

        assert!(matches!(err, VolumeErr::CheckpointShapeMismatch { .. }));
    }
}
