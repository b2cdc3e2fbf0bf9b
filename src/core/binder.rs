//! Property binding.
//!
//! Walks a dotted property path through a unit's descriptor table, coerces
//! the raw command-line value to the declared kind, and writes it into the
//! unit's settings tree. Only documented fields are reachable; an
//! undocumented nested field hides everything below it.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::unit::{CapabilityUnit, FieldKind, FieldSpec};

#[derive(Debug, Clone)]
enum Step {
    Key(String),
    Index(usize),
}

/// Bind one property assignment onto a unit instance, in place.
pub fn bind(unit: &mut dyn CapabilityUnit, path: &str, raw: Option<&str>) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut steps = Vec::new();
    let value = walk_fields(unit.spec().fields, &segments, path, raw, &mut steps)?;

    let mut settings = unit.settings()?;
    if !settings.is_object() {
        return Err(Error::internal_unexpected(
            "unit settings did not serialize to an object",
        ));
    }
    set_at(&mut settings, &steps, value, path, raw)?;

    unit.apply_settings(settings).map_err(|e| {
        Error::type_mismatch(
            path,
            raw.map(|s| s.to_string()),
            format!("a value the unit settings accept ({})", e),
        )
    })
}

fn walk_fields(
    fields: &'static [FieldSpec],
    segments: &[&str],
    path: &str,
    raw: Option<&str>,
    steps: &mut Vec<Step>,
) -> Result<Value> {
    let segment = match segments.first() {
        Some(s) if !s.is_empty() => *s,
        _ => return Err(Error::unknown_property(path)),
    };
    let field = fields
        .iter()
        .find(|f| f.name == segment)
        .filter(|f| f.documented)
        .ok_or_else(|| Error::unknown_property(path))?;

    steps.push(Step::Key(segment.to_string()));
    walk_kind(&field.kind, &segments[1..], path, raw, steps)
}

fn walk_kind(
    kind: &'static FieldKind,
    rest: &[&str],
    path: &str,
    raw: Option<&str>,
    steps: &mut Vec<Step>,
) -> Result<Value> {
    match kind {
        FieldKind::Nested(children) => {
            if rest.is_empty() {
                return Err(Error::type_mismatch(
                    path,
                    raw.map(|s| s.to_string()),
                    "a property inside the nested block",
                ));
            }
            walk_fields(children, rest, path, raw, steps)
        }
        FieldKind::Multi(element) => {
            let key = rest.first().ok_or_else(|| {
                Error::type_mismatch(
                    path,
                    raw.map(|s| s.to_string()),
                    "an indexed or keyed element suffix",
                )
            })?;
            match key.parse::<usize>() {
                Ok(index) => steps.push(Step::Index(index)),
                Err(_) => steps.push(Step::Key(key.to_string())),
            }
            walk_kind(element, &rest[1..], path, raw, steps)
        }
        scalar => {
            if !rest.is_empty() {
                return Err(Error::unknown_property(path));
            }
            coerce(scalar, path, raw)
        }
    }
}

fn coerce(kind: &FieldKind, path: &str, raw: Option<&str>) -> Result<Value> {
    let mismatch = |expected: String| {
        Error::type_mismatch(path, raw.map(|s| s.to_string()), expected)
    };

    match kind {
        FieldKind::Bool => match raw {
            None => Ok(Value::Bool(true)),
            Some(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Some(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            Some(_) => Err(mismatch("boolean".to_string())),
        },
        FieldKind::Number => {
            let s = raw.ok_or_else(|| mismatch("integer".to_string()))?;
            s.parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| mismatch("integer".to_string()))
        }
        FieldKind::Enum(variants) => {
            let s = raw.ok_or_else(|| mismatch(kind.label()))?;
            variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(s))
                .map(|v| Value::String(v.to_string()))
                .ok_or_else(|| mismatch(kind.label()))
        }
        FieldKind::Text => Ok(Value::String(raw.unwrap_or("").to_string())),
        FieldKind::Multi(_) | FieldKind::Nested(_) => Err(Error::internal_unexpected(format!(
            "composite kind reached coercion for '{}'",
            path
        ))),
    }
}

fn set_at(
    root: &mut Value,
    steps: &[Step],
    value: Value,
    path: &str,
    raw: Option<&str>,
) -> Result<()> {
    let (last, parents) = steps
        .split_last()
        .ok_or_else(|| Error::unknown_property(path))?;

    let mut cursor = root;
    for step in parents {
        cursor = match step {
            Step::Key(key) => {
                if !cursor.is_object() {
                    *cursor = Value::Object(Map::new());
                }
                cursor
                    .as_object_mut()
                    .expect("cursor forced to object")
                    .entry(key.clone())
                    .or_insert(Value::Null)
            }
            Step::Index(index) => {
                if !cursor.is_array() {
                    *cursor = Value::Array(Vec::new());
                }
                let list = cursor.as_array_mut().expect("cursor forced to array");
                check_index(*index, list.len(), path, raw)?;
                if *index == list.len() {
                    list.push(Value::Null);
                }
                &mut list[*index]
            }
        };
    }

    match last {
        Step::Key(key) => {
            if !cursor.is_object() {
                *cursor = Value::Object(Map::new());
            }
            cursor
                .as_object_mut()
                .expect("cursor forced to object")
                .insert(key.clone(), value);
        }
        Step::Index(index) => {
            if !cursor.is_array() {
                *cursor = Value::Array(Vec::new());
            }
            let list = cursor.as_array_mut().expect("cursor forced to array");
            check_index(*index, list.len(), path, raw)?;
            if *index == list.len() {
                list.push(value);
            } else {
                list[*index] = value;
            }
        }
    }
    Ok(())
}

// A numeric suffix may overwrite an existing element or extend the list by
// exactly one; anything past that is a coercion failure, not a silent gap.
fn check_index(index: usize, len: usize, path: &str, raw: Option<&str>) -> Result<()> {
    if index > len {
        return Err(Error::type_mismatch(
            path,
            raw.map(|s| s.to_string()),
            format!("list index no greater than {}", len),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::unit::{
        settings_from_value, settings_value, ActionSpec, CapabilityUnit, RunContext, UnitSpec,
    };
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct ImageSettings {
        dockerfile: String,
        publish: bool,
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct SampleSettings {
        version: String,
        warn: bool,
        threads: i64,
        level: Option<String>,
        tags: Vec<String>,
        env: BTreeMap<String, String>,
        image: ImageSettings,
        scratch: ImageSettings,
    }

    static IMAGE_FIELDS: &[FieldSpec] = &[
        FieldSpec {
            name: "dockerfile",
            doc: "Path to the dockerfile",
            documented: true,
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "publish",
            doc: "Push after building",
            documented: true,
            kind: FieldKind::Bool,
        },
    ];

    static SAMPLE_SPEC: UnitSpec = UnitSpec {
        fields: &[
            FieldSpec {
                name: "version",
                doc: "Artifact version",
                documented: true,
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "warn",
                doc: "Emit warnings",
                documented: true,
                kind: FieldKind::Bool,
            },
            FieldSpec {
                name: "threads",
                doc: "Worker count",
                documented: true,
                kind: FieldKind::Number,
            },
            FieldSpec {
                name: "level",
                doc: "Log level",
                documented: true,
                kind: FieldKind::Enum(&["debug", "info", "warn"]),
            },
            FieldSpec {
                name: "tags",
                doc: "Artifact tags",
                documented: true,
                kind: FieldKind::Multi(&FieldKind::Text),
            },
            FieldSpec {
                name: "env",
                doc: "Extra environment",
                documented: true,
                kind: FieldKind::Multi(&FieldKind::Text),
            },
            FieldSpec {
                name: "image",
                doc: "Container image settings",
                documented: true,
                kind: FieldKind::Nested(IMAGE_FIELDS),
            },
            // Exists as a plain field but opted out of binder visibility.
            FieldSpec {
                name: "scratch",
                doc: "",
                documented: false,
                kind: FieldKind::Nested(IMAGE_FIELDS),
            },
        ],
        actions: &[ActionSpec {
            name: "noop",
            doc: "",
        }],
        requires: &[],
    };

    #[derive(Default)]
    struct SampleUnit {
        cfg: SampleSettings,
    }

    impl CapabilityUnit for SampleUnit {
        fn spec(&self) -> &'static UnitSpec {
            &SAMPLE_SPEC
        }

        fn settings(&self) -> Result<Value> {
            settings_value(&self.cfg)
        }

        fn apply_settings(&mut self, settings: Value) -> Result<()> {
            self.cfg = settings_from_value(settings)?;
            Ok(())
        }

        fn invoke(&mut self, _action: &str, _ctx: &RunContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn binds_text_and_number_scalars() {
        let mut unit = SampleUnit::default();
        bind(&mut unit, "version", Some("1.0")).unwrap();
        bind(&mut unit, "threads", Some("4")).unwrap();
        assert_eq!(unit.cfg.version, "1.0");
        assert_eq!(unit.cfg.threads, 4);
    }

    #[test]
    fn bool_defaults_to_true_without_value() {
        let mut unit = SampleUnit::default();
        bind(&mut unit, "warn", None).unwrap();
        assert!(unit.cfg.warn);
        bind(&mut unit, "warn", Some("FALSE")).unwrap();
        assert!(!unit.cfg.warn);
    }

    #[test]
    fn enum_matches_case_insensitively_and_stores_canonical_name() {
        let mut unit = SampleUnit::default();
        bind(&mut unit, "level", Some("INFO")).unwrap();
        assert_eq!(unit.cfg.level.as_deref(), Some("info"));

        let err = bind(&mut unit, "level", Some("loud")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyTypeMismatch);
    }

    #[test]
    fn number_overflow_is_a_type_mismatch() {
        let mut unit = SampleUnit::default();
        let err = bind(&mut unit, "threads", Some("99999999999999999999")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyTypeMismatch);
        let err = bind(&mut unit, "threads", Some("four")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyTypeMismatch);
    }

    #[test]
    fn multi_field_binds_by_index_and_key() {
        let mut unit = SampleUnit::default();
        bind(&mut unit, "tags.0", Some("release")).unwrap();
        bind(&mut unit, "tags.1", Some("signed")).unwrap();
        bind(&mut unit, "tags.0", Some("nightly")).unwrap();
        assert_eq!(unit.cfg.tags, vec!["nightly", "signed"]);

        bind(&mut unit, "env.JAVA_HOME", Some("/opt/jdk")).unwrap();
        assert_eq!(unit.cfg.env["JAVA_HOME"], "/opt/jdk");
    }

    #[test]
    fn multi_index_gap_is_rejected() {
        let mut unit = SampleUnit::default();
        let err = bind(&mut unit, "tags.5", Some("x")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyTypeMismatch);
    }

    #[test]
    fn multi_without_suffix_is_rejected() {
        let mut unit = SampleUnit::default();
        let err = bind(&mut unit, "tags", Some("x")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyTypeMismatch);
    }

    #[test]
    fn documented_nested_path_binds() {
        let mut unit = SampleUnit::default();
        bind(&mut unit, "image.dockerfile", Some("Dockerfile")).unwrap();
        bind(&mut unit, "image.publish", None).unwrap();
        assert_eq!(unit.cfg.image.dockerfile, "Dockerfile");
        assert!(unit.cfg.image.publish);
    }

    #[test]
    fn undocumented_nested_field_is_unreachable() {
        // scratch.dockerfile exists on the struct, but scratch is not
        // documented, so the whole subtree is invisible.
        let mut unit = SampleUnit::default();
        let err = bind(&mut unit, "scratch.dockerfile", Some("x")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyUnknown);
    }

    #[test]
    fn unknown_and_overlong_paths_are_unknown_properties() {
        let mut unit = SampleUnit::default();
        assert_eq!(
            bind(&mut unit, "missing", Some("x")).unwrap_err().code,
            ErrorCode::PropertyUnknown
        );
        assert_eq!(
            bind(&mut unit, "version.minor", Some("x")).unwrap_err().code,
            ErrorCode::PropertyUnknown
        );
        assert_eq!(
            bind(&mut unit, "", Some("x")).unwrap_err().code,
            ErrorCode::PropertyUnknown
        );
    }

    #[test]
    fn assigning_a_nested_block_directly_is_a_mismatch() {
        let mut unit = SampleUnit::default();
        let err = bind(&mut unit, "image", Some("x")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyTypeMismatch);
    }
}
