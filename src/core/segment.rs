//! Command-line segmentation.
//!
//! A raw token list splits into per-unit segments on context markers of the
//! exact shape `<identifier>:`. Tokens before the first marker address the
//! default unit. Inside a segment, `<dotted.path>=<value>` is a property
//! assignment and a bare token is a method invocation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionToken {
    /// `<path>=<value>`; `raw` is `None` for a bare `<path>=`, which lets
    /// boolean properties default to true.
    Assign { path: String, raw: Option<String> },
    Invoke { name: String },
}

/// The portion of a command line addressed to one capability unit.
/// `unit: None` means the run's default unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSegment {
    pub unit: Option<String>,
    pub tokens: Vec<ActionToken>,
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("identifier regex"))
}

/// True when the token has the shape of a context marker (ends with `:` and
/// carries no `=`). Validity of the identifier is checked separately.
fn is_marker_shape(token: &str) -> bool {
    token.ends_with(':') && !token.contains('=')
}

fn marker_identifier(token: &str) -> Result<String> {
    let ident = &token[..token.len() - 1];
    if identifier_re().is_match(ident) {
        Ok(ident.to_string())
    } else {
        Err(Error::segment_malformed_marker(token))
    }
}

/// Split tokens into raw groups, one per segment. Marker tokens stay at the
/// head of the group they open, so concatenating the groups reproduces the
/// input. The default group is always first and may be empty when the very
/// first token is already a marker.
pub fn group_segments(tokens: &[String]) -> Result<Vec<Vec<String>>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut groups: Vec<Vec<String>> = vec![Vec::new()];
    for token in tokens {
        if is_marker_shape(token) {
            marker_identifier(token)?;
            groups.push(vec![token.clone()]);
        } else {
            groups
                .last_mut()
                .expect("groups is never empty")
                .push(token.clone());
        }
    }
    Ok(groups)
}

/// Parse a filtered token list into command segments. An empty default
/// group (command line opening with a marker) carries no work and is
/// dropped; addressed empty segments stay, since their marker still names
/// a unit to resolve.
pub fn parse_segments(tokens: &[String]) -> Result<Vec<CommandSegment>> {
    let mut segments = Vec::new();
    for group in group_segments(tokens)? {
        if group.is_empty() {
            continue;
        }
        let mut rest = group.as_slice();
        let unit = match rest.first() {
            Some(first) if is_marker_shape(first) => {
                rest = &rest[1..];
                Some(marker_identifier(first)?)
            }
            _ => None,
        };

        let mut actions = Vec::new();
        for token in rest {
            actions.push(parse_action(token));
        }
        segments.push(CommandSegment {
            unit,
            tokens: actions,
        });
    }
    Ok(segments)
}

fn parse_action(token: &str) -> ActionToken {
    match token.split_once('=') {
        Some((path, value)) => ActionToken::Assign {
            path: path.to_string(),
            raw: if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            },
        },
        None => ActionToken::Invoke {
            name: token.to_string(),
        },
    }
}
