use super::ErrorCode;

pub fn all_codes() -> &'static [ErrorCode] {
    &[
        ErrorCode::SegmentMalformedMarker,
        ErrorCode::UnitUnknown,
        ErrorCode::PropertyUnknown,
        ErrorCode::PropertyTypeMismatch,
        ErrorCode::TaskDuplicateName,
        ErrorCode::TaskPlacementConflict,
        ErrorCode::RequirementCycle,
        ErrorCode::ActionFailed,
        ErrorCode::ConfigInvalidValue,
        ErrorCode::ValidationInvalidArgument,
        ErrorCode::InternalIoError,
        ErrorCode::InternalJsonError,
        ErrorCode::InternalUnexpected,
    ]
}

pub fn parse_code(code: &str) -> Option<ErrorCode> {
    all_codes()
        .iter()
        .copied()
        .find(|candidate| candidate.as_str() == code)
}
