//! Typed projection of raw document values

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::ordering::Ordering;

/// A configuration object with a serde schema and a canonical field order.
pub trait Model: Serialize + DeserializeOwned {
    /// Name used in error messages
    const NAME: &'static str;

    fn ordering() -> &'static Ordering;
}

/// Validate a raw value against model `M`.
///
/// Polymorphic fields are untagged enums and resolve to the first variant
/// that fits, in declaration order. Keys the model does not know are
/// ignored here; [`crate::fancy_dump`] carries them over on write.
pub fn validate<M: Model>(value: &Value) -> Result<M> {
    M::deserialize(value).map_err(|e| Error::Structure {
        model: M::NAME,
        message: e.to_string(),
    })
}

/// Convert a model back to a raw value. Unset optional fields are omitted.
pub fn to_raw<M: Model>(model: &M) -> Result<Value> {
    Ok(serde_json::to_value(model)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pipelines::{PipelinesConfiguration, RunsOn, StepItem};
    use crate::models::precommit::PreCommitConfig;
    use serde_json::json;

    #[test]
    fn test_validate_reports_model_name() {
        let err = validate::<PreCommitConfig>(&json!({"repos": "nope"})).unwrap_err();
        match err {
            Error::Structure { model, message } => {
                assert_eq!(model, "pre-commit configuration");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_untagged_variants_follow_declaration_order() {
        let config = validate::<PipelinesConfiguration>(&json!({
            "pipelines": {"default": [
                {"step": {"name": "A", "script": ["echo a"], "runs-on": "self.hosted"}},
                {"parallel": [{"step": {"script": ["echo b"]}}]},
            ]}
        }))
        .unwrap();
        let default = config.pipelines.default.unwrap();
        let StepItem::Step(wrapper) = &default[0] else {
            panic!("first item should be a step");
        };
        assert_eq!(wrapper.step.runs_on, Some(RunsOn::Single("self.hosted".to_string())));
        assert!(matches!(default[1], StepItem::Parallel(_)));
    }

    #[test]
    fn test_to_raw_omits_unset_fields() {
        let config = validate::<PreCommitConfig>(&json!({
            "repos": [{"repo": "local", "hooks": [{"id": "x", "name": "x", "entry": "x", "language": "system"}]}]
        }))
        .unwrap();
        let raw = to_raw(&config).unwrap();
        assert_eq!(
            raw,
            json!({"repos": [{"repo": "local", "hooks": [{"id": "x", "name": "x", "entry": "x", "language": "system"}]}]})
        );
    }
}
