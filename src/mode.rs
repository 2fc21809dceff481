use std::{collections::BTreeMap, str::FromStr};

use crate::{
    consts,
    err::{AsyncIngressError, AsyncIngressResult},
};

/// How requests matching an ingress are split between the original
/// backends and the async producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AsyncMode {
    /// Annotation absent or empty. Behaves like `Conditional`.
    #[default]
    Default,
    /// Async unless the request sends `Prefer: respond-sync`.
    Always,
    /// Sync unless the request sends `Prefer: respond-async`.
    Conditional,
}

impl FromStr for AsyncMode {
    type Err = AsyncIngressError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" => Ok(AsyncMode::Default),
            consts::ASYNC_ALWAYS_MODE => Ok(AsyncMode::Always),
            consts::ASYNC_CONDITIONAL_MODE => Ok(AsyncMode::Conditional),
            other => Err(AsyncIngressError::InvalidMode {
                key: consts::ASYNC_MODE_ANNOTATION.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Reads the mode annotation, rejecting unknown values.
pub fn validate_async_mode(annotations: &BTreeMap<String, String>) -> AsyncIngressResult<AsyncMode> {
    annotations
        .get(consts::ASYNC_MODE_ANNOTATION)
        .map(|value| value.parse())
        .unwrap_or(Ok(AsyncMode::Default))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use super::{AsyncMode, validate_async_mode};
    use crate::{consts, err::AsyncIngressError};

    #[rstest]
    #[case(None, AsyncMode::Default)]
    #[case(Some(""), AsyncMode::Default)]
    #[case(Some("always.async.knative.dev"), AsyncMode::Always)]
    #[case(Some("conditional.async.knative.dev"), AsyncMode::Conditional)]
    fn accepts_known_modes(#[case] value: Option<&str>, #[case] expected: AsyncMode) {
        let annotations = value
            .map(|v| BTreeMap::from([(consts::ASYNC_MODE_ANNOTATION.to_string(), v.to_string())]))
            .unwrap_or_default();
        assert_eq!(validate_async_mode(&annotations).unwrap(), expected);
    }

    #[rstest]
    #[case("always")]
    #[case("Always.async.knative.dev")]
    #[case("sometimes.async.knative.dev")]
    fn rejects_unknown_modes(#[case] value: &str) {
        let annotations =
            BTreeMap::from([(consts::ASYNC_MODE_ANNOTATION.to_string(), value.to_string())]);
        let err = validate_async_mode(&annotations).unwrap_err();
        assert!(
            matches!(err, AsyncIngressError::InvalidMode { value: ref v, .. } if v == value),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn ignores_unrelated_annotations() {
        let annotations = BTreeMap::from([("some.other/key".to_string(), "always".to_string())]);
        assert_eq!(validate_async_mode(&annotations).unwrap(), AsyncMode::Default);
    }
}
