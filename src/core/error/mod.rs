use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SegmentMalformedMarker,

    UnitUnknown,

    PropertyUnknown,
    PropertyTypeMismatch,

    TaskDuplicateName,
    TaskPlacementConflict,

    RequirementCycle,

    ActionFailed,

    ConfigInvalidValue,
    ValidationInvalidArgument,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SegmentMalformedMarker => "segment.malformed_marker",

            ErrorCode::UnitUnknown => "unit.unknown",

            ErrorCode::PropertyUnknown => "property.unknown",
            ErrorCode::PropertyTypeMismatch => "property.type_mismatch",

            ErrorCode::TaskDuplicateName => "task.duplicate_name",
            ErrorCode::TaskPlacementConflict => "task.placement_conflict",

            ErrorCode::RequirementCycle => "requirement.cycle",

            ErrorCode::ActionFailed => "action.failed",

            ErrorCode::ConfigInvalidValue => "config.invalid_value",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MalformedMarkerDetails {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownUnitDetails {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub known: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownPropertyDetails {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMismatchDetails {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    pub expected: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateNameDetails {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementConflictDetails {
    pub first: String,
    pub second: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementCycleDetails {
    pub cycle: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFailedDetails {
    pub unit: String,
    pub member: String,
    pub cause: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// Record the capability unit an error surfaced from.
    ///
    /// Idempotent: the first attribution wins, so an error bubbling through
    /// several layers keeps its originating unit.
    pub fn annotate_unit(mut self, unit_id: &str) -> Self {
        if let Value::Object(ref mut map) = self.details {
            map.entry("unit".to_string())
                .or_insert_with(|| Value::String(unit_id.to_string()));
        }
        self
    }

    pub fn segment_malformed_marker(token: impl Into<String>) -> Self {
        let token = token.into();
        let details = serde_json::to_value(MalformedMarkerDetails {
            token: token.clone(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::SegmentMalformedMarker,
            format!("Malformed segment marker '{}'", token),
            details,
        )
    }

    pub fn unknown_unit(id: impl Into<String>, known: Vec<String>) -> Self {
        let id = id.into();
        let details = serde_json::to_value(UnknownUnitDetails {
            id: id.clone(),
            known,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::UnitUnknown,
            format!("Unknown capability unit '{}'", id),
            details,
        )
    }

    pub fn unknown_property(path: impl Into<String>) -> Self {
        let path = path.into();
        let details = serde_json::to_value(UnknownPropertyDetails { path: path.clone() })
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::PropertyUnknown,
            format!("Unknown property '{}'", path),
            details,
        )
    }

    pub fn type_mismatch(
        path: impl Into<String>,
        raw_value: Option<String>,
        expected: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let expected = expected.into();
        let details = serde_json::to_value(TypeMismatchDetails {
            path: path.clone(),
            raw_value: raw_value.clone(),
            expected: expected.clone(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::PropertyTypeMismatch,
            format!(
                "Cannot coerce '{}' for property '{}' (expected {})",
                raw_value.unwrap_or_default(),
                path,
                expected
            ),
            details,
        )
    }

    pub fn duplicate_task_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let details = serde_json::to_value(DuplicateNameDetails { name: name.clone() })
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::TaskDuplicateName,
            format!("Task list already contains an entry named '{}'", name),
            details,
        )
    }

    pub fn placement_conflict(first: impl Into<String>, second: impl Into<String>) -> Self {
        let first = first.into();
        let second = second.into();
        let details = serde_json::to_value(PlacementConflictDetails {
            first: first.clone(),
            second: second.clone(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::TaskPlacementConflict,
            format!(
                "Tasks '{}' and '{}' declare conflicting relative placements",
                first, second
            ),
            details,
        )
    }

    pub fn requirement_cycle(cycle: Vec<String>) -> Self {
        let rendered = cycle.join(" -> ");
        let details = serde_json::to_value(RequirementCycleDetails { cycle })
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::RequirementCycle,
            format!("Requirement cycle: {}", rendered),
            details,
        )
    }

    pub fn action_failed(
        unit: impl Into<String>,
        member: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        let unit = unit.into();
        let member = member.into();
        let cause = cause.into();
        let details = serde_json::to_value(ActionFailedDetails {
            unit: unit.clone(),
            member: member.clone(),
            cause: cause.clone(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::ActionFailed,
            format!("Action '{}#{}' failed: {}", unit, member, cause),
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = serde_json::to_value(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(ErrorCode::ConfigInvalidValue, "Invalid config value", details)
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = serde_json::to_value(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            tried,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::to_value(InternalIoErrorDetails {
            error: error.into(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(ErrorCode::InternalIoError, "I/O error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": error.into(),
            "context": context,
        });
        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        let details = serde_json::json!({ "error": message });
        Self::new(ErrorCode::InternalUnexpected, message, details)
    }
}
