//! # Regeneration Policy
//!
//! Decides which keys of a Secret receive a freshly generated value in a pass.
//!
//! Two variants exist:
//!
//! - **Resource-driven** ([`resource_regeneration`]): used for Secrets produced
//!   from a `StringSecret`. Missing or empty fields are generated; `forceRecreate`
//!   regenerates all of them.
//! - **Annotation-driven** ([`annotation_regeneration`]): used for existing
//!   Secrets opted in through the autogenerate annotation. Honours the secure
//!   marker, the deployment-wide insecure policy and the one-shot regenerate
//!   directive.

use crate::constants::{
    ANNOTATION_AUTOGENERATE, ANNOTATION_ENCODING, ANNOTATION_LENGTH, ANNOTATION_REGENERATE,
    ANNOTATION_SECURE, REGENERATE_ALL,
};
use k8s_openapi::ByteString;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// A key appeared twice in a list that must be pairwise distinct
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("duplicate key '{key}'")]
pub struct DuplicateKeyError {
    pub key: String,
}

/// Fail on the first key that occurs more than once
///
/// # Errors
///
/// Returns [`DuplicateKeyError`] naming the first repeated key.
pub fn ensure_unique<S: AsRef<str>>(keys: &[S]) -> Result<(), DuplicateKeyError> {
    let mut seen = HashSet::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref();
        if !seen.insert(key) {
            return Err(DuplicateKeyError {
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

/// Split a comma-separated key list, trimming whitespace and dropping empty entries
pub fn split_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered set of keys that need a new value this pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationDecision {
    keys: Vec<String>,
}

impl RegenerationDecision {
    fn from_keys<'a>(keys: impl IntoIterator<Item = &'a String>) -> Self {
        let mut decision = Self::default();
        for key in keys {
            if !decision.contains(key) {
                decision.keys.push(key.clone());
            }
        }
        decision
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

fn is_missing(data: &BTreeMap<String, ByteString>, key: &str) -> bool {
    data.get(key).is_none_or(|v| v.0.is_empty())
}

/// Resource-driven variant
///
/// Pass `None` for `existing_data` when the Secret does not exist yet.
///
/// # Errors
///
/// Returns [`DuplicateKeyError`] if `field_names` repeats a key. Nothing is
/// selected in that case.
pub fn resource_regeneration(
    field_names: &[String],
    existing_data: Option<&BTreeMap<String, ByteString>>,
    force_recreate: bool,
) -> Result<RegenerationDecision, DuplicateKeyError> {
    ensure_unique(field_names)?;

    let decision = match existing_data {
        None => RegenerationDecision::from_keys(field_names),
        Some(_) if force_recreate => RegenerationDecision::from_keys(field_names),
        Some(data) => {
            RegenerationDecision::from_keys(field_names.iter().filter(|k| is_missing(data, k)))
        }
    };
    Ok(decision)
}

/// Parsed value of the regenerate annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateDirective {
    /// `yes`: every auto-generated key
    All,
    /// Explicit subset of keys
    Keys(Vec<String>),
}

impl RegenerateDirective {
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == REGENERATE_ALL {
            RegenerateDirective::All
        } else {
            RegenerateDirective::Keys(split_key_list(raw))
        }
    }
}

/// Control annotations of an annotated Secret, parsed once per pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAnnotations {
    pub auto_generate: Vec<String>,
    /// Secure marker present (any value)
    pub secure: bool,
    pub regenerate: Option<RegenerateDirective>,
    pub length: Option<String>,
    pub encoding: Option<String>,
}

impl GenerationAnnotations {
    /// Parse the control annotations
    ///
    /// Returns `Ok(None)` when the autogenerate annotation is absent or lists no keys.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateKeyError`] if the autogenerate list repeats a key.
    pub fn parse(
        annotations: &BTreeMap<String, String>,
    ) -> Result<Option<Self>, DuplicateKeyError> {
        let Some(raw) = annotations.get(ANNOTATION_AUTOGENERATE) else {
            return Ok(None);
        };
        let auto_generate = split_key_list(raw);
        if auto_generate.is_empty() {
            return Ok(None);
        }
        ensure_unique(&auto_generate)?;

        Ok(Some(Self {
            auto_generate,
            secure: annotations.contains_key(ANNOTATION_SECURE),
            regenerate: annotations
                .get(ANNOTATION_REGENERATE)
                .map(|v| RegenerateDirective::parse(v)),
            length: annotations.get(ANNOTATION_LENGTH).cloned(),
            encoding: annotations.get(ANNOTATION_ENCODING).cloned(),
        }))
    }
}

/// Which rule selected the keys of an [`AnnotationPlan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationReason {
    /// Marker missing and the deployment regenerates insecure values
    Insecure,
    /// One-shot regenerate directive
    Directive,
    /// Only missing or empty values
    MissingValues,
}

/// Outcome of the annotation-driven variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPlan {
    pub decision: RegenerationDecision,
    /// Remove the regenerate annotation in the same write as the data
    /// Set whenever a directive is present, also when the insecure rule selected every key
    pub consume_directive: bool,
    pub reason: RegenerationReason,
    auto_generate_len: usize,
}

impl AnnotationPlan {
    /// Every auto-generated key gets a new value this pass
    pub fn marks_secure(&self) -> bool {
        self.auto_generate_len > 0 && self.decision.len() == self.auto_generate_len
    }
}

/// Annotation-driven variant
///
/// Rules in priority order: insecure policy, regenerate directive, missing values.
/// Missing or empty keys are filled under every rule. A directive is consumed
/// whenever one is present, including when the insecure rule wins. Directive
/// keys outside the autogenerate list are ignored.
pub fn annotation_regeneration(
    annotations: &GenerationAnnotations,
    data: &BTreeMap<String, ByteString>,
    regenerate_insecure: bool,
) -> AnnotationPlan {
    let auto = &annotations.auto_generate;
    let consume_directive = annotations.regenerate.is_some();

    let (decision, reason) = if !annotations.secure && regenerate_insecure {
        (
            RegenerationDecision::from_keys(auto),
            RegenerationReason::Insecure,
        )
    } else if let Some(directive) = &annotations.regenerate {
        let decision = match directive {
            RegenerateDirective::All => RegenerationDecision::from_keys(auto),
            RegenerateDirective::Keys(keys) => RegenerationDecision::from_keys(
                auto.iter()
                    .filter(|k| keys.contains(k) || is_missing(data, k)),
            ),
        };
        (decision, RegenerationReason::Directive)
    } else {
        (
            RegenerationDecision::from_keys(auto.iter().filter(|k| is_missing(data, k))),
            RegenerationReason::MissingValues,
        )
    };

    AnnotationPlan {
        decision,
        consume_directive,
        reason,
        auto_generate_len: auto.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(entries: &[(&str, &str)]) -> BTreeMap<String, ByteString> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
            .collect()
    }

    fn names(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    fn annotations(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_split_key_list() {
        assert_eq!(split_key_list(" a, b ,,c,"), names(&["a", "b", "c"]));
        assert!(split_key_list("").is_empty());
        assert!(split_key_list(" , ").is_empty());
    }

    #[test]
    fn test_ensure_unique_reports_first_duplicate() {
        assert!(ensure_unique(&names(&["a", "b"])).is_ok());
        let err = ensure_unique(&names(&["a", "b", "a", "b"])).unwrap_err();
        assert_eq!(err.key, "a");
    }

    #[test]
    fn test_resource_new_secret_generates_everything() {
        let decision = resource_regeneration(&names(&["user", "pass"]), None, false).unwrap();
        assert_eq!(decision.keys(), names(&["user", "pass"]).as_slice());
    }

    #[test]
    fn test_resource_existing_only_missing_or_empty() {
        let existing = data(&[("user", "alice"), ("pass", "")]);
        let decision =
            resource_regeneration(&names(&["user", "pass", "token"]), Some(&existing), false)
                .unwrap();
        assert_eq!(decision.keys(), names(&["pass", "token"]).as_slice());
    }

    #[test]
    fn test_resource_force_recreate_regenerates_all() {
        let existing = data(&[("user", "alice"), ("pass", "secret")]);
        let decision =
            resource_regeneration(&names(&["user", "pass"]), Some(&existing), true).unwrap();
        assert_eq!(decision.len(), 2);
    }

    #[test]
    fn test_resource_duplicate_rejected() {
        let err = resource_regeneration(&names(&["a", "a"]), None, false).unwrap_err();
        assert_eq!(err.key, "a");
    }

    #[test]
    fn test_annotations_absent_or_empty_list() {
        assert_eq!(GenerationAnnotations::parse(&BTreeMap::new()).unwrap(), None);
        let ann = annotations(&[(ANNOTATION_AUTOGENERATE, " , ")]);
        assert_eq!(GenerationAnnotations::parse(&ann).unwrap(), None);
    }

    #[test]
    fn test_annotations_parse_all_fields() {
        let ann = annotations(&[
            (ANNOTATION_AUTOGENERATE, "a,b"),
            (ANNOTATION_SECURE, "yes"),
            (ANNOTATION_REGENERATE, "b"),
            (ANNOTATION_LENGTH, "16b"),
            (ANNOTATION_ENCODING, "hex"),
        ]);
        let parsed = GenerationAnnotations::parse(&ann).unwrap().unwrap();
        assert_eq!(parsed.auto_generate, names(&["a", "b"]));
        assert!(parsed.secure);
        assert_eq!(
            parsed.regenerate,
            Some(RegenerateDirective::Keys(names(&["b"])))
        );
        assert_eq!(parsed.length.as_deref(), Some("16b"));
        assert_eq!(parsed.encoding.as_deref(), Some("hex"));
    }

    #[test]
    fn test_annotations_duplicate_rejected() {
        let ann = annotations(&[(ANNOTATION_AUTOGENERATE, "a,b,a")]);
        assert_eq!(
            GenerationAnnotations::parse(&ann).unwrap_err(),
            DuplicateKeyError {
                key: "a".to_string()
            }
        );
    }

    #[test]
    fn test_directive_parse() {
        assert_eq!(RegenerateDirective::parse("yes"), RegenerateDirective::All);
        assert_eq!(
            RegenerateDirective::parse("a, c"),
            RegenerateDirective::Keys(names(&["a", "c"]))
        );
    }

    fn parsed(entries: &[(&str, &str)]) -> GenerationAnnotations {
        GenerationAnnotations::parse(&annotations(entries))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_insecure_policy_wins_and_consumes_directive() {
        let ann = parsed(&[(ANNOTATION_AUTOGENERATE, "a,b"), (ANNOTATION_REGENERATE, "a")]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "x"), ("b", "y")]), true);
        assert_eq!(plan.reason, RegenerationReason::Insecure);
        assert_eq!(plan.decision.keys(), names(&["a", "b"]).as_slice());
        assert!(plan.consume_directive);
        assert!(plan.marks_secure());
    }

    #[test]
    fn test_insecure_policy_ignored_when_marked_secure() {
        let ann = parsed(&[(ANNOTATION_AUTOGENERATE, "a,b"), (ANNOTATION_SECURE, "yes")]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "x"), ("b", "y")]), true);
        assert_eq!(plan.reason, RegenerationReason::MissingValues);
        assert!(plan.decision.is_empty());
        assert!(!plan.consume_directive);
    }

    #[test]
    fn test_directive_subset_does_not_mark_secure() {
        let ann = parsed(&[
            (ANNOTATION_AUTOGENERATE, "a,b,c"),
            (ANNOTATION_REGENERATE, "a"),
        ]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "1"), ("b", "2"), ("c", "3")]), false);
        assert_eq!(plan.reason, RegenerationReason::Directive);
        assert_eq!(plan.decision.keys(), names(&["a"]).as_slice());
        assert!(plan.consume_directive);
        assert!(!plan.marks_secure());
    }

    #[test]
    fn test_directive_all_marks_secure() {
        let ann = parsed(&[
            (ANNOTATION_AUTOGENERATE, "a,b"),
            (ANNOTATION_REGENERATE, "yes"),
        ]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "1"), ("b", "2")]), false);
        assert_eq!(plan.decision.len(), 2);
        assert!(plan.marks_secure());
    }

    #[test]
    fn test_directive_ignores_unknown_keys() {
        let ann = parsed(&[
            (ANNOTATION_AUTOGENERATE, "a,b"),
            (ANNOTATION_REGENERATE, "z,b"),
        ]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "1"), ("b", "2")]), false);
        assert_eq!(plan.decision.keys(), names(&["b"]).as_slice());
    }

    #[test]
    fn test_directive_subset_also_fills_empty_keys() {
        let ann = parsed(&[
            (ANNOTATION_AUTOGENERATE, "a,b,c"),
            (ANNOTATION_REGENERATE, "a"),
        ]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "1"), ("b", ""), ("c", "3")]), false);
        assert_eq!(plan.reason, RegenerationReason::Directive);
        assert_eq!(plan.decision.keys(), names(&["a", "b"]).as_slice());
        assert!(!plan.marks_secure());

        let ann = parsed(&[(ANNOTATION_AUTOGENERATE, "a,b"), (ANNOTATION_REGENERATE, "a")]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "1"), ("b", "")]), false);
        assert_eq!(plan.decision.keys(), names(&["a", "b"]).as_slice());
        assert!(plan.marks_secure());
    }

    #[test]
    fn test_missing_values_only() {
        let ann = parsed(&[(ANNOTATION_AUTOGENERATE, "a,b,c")]);
        let plan = annotation_regeneration(&ann, &data(&[("a", "1"), ("b", "")]), false);
        assert_eq!(plan.reason, RegenerationReason::MissingValues);
        assert_eq!(plan.decision.keys(), names(&["b", "c"]).as_slice());
        assert!(!plan.marks_secure());
    }
}
