use std::path::PathBuf;

use clap::Args;
use jig::engine::Engine;
use jig::unit::{FieldKind, FieldSpec, UnitSpec};
use serde::Serialize;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct DocArgs {
    /// Unit identifier to document (defaults to the run's default unit)
    pub unit: Option<String>,

    /// Base directory of the project (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocOutput {
    pub unit: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub summary: &'static str,
    pub properties: Vec<PropertyDoc>,
    pub actions: Vec<ActionDoc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDoc {
    pub path: String,
    pub kind: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub doc: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDoc {
    pub name: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub doc: &'static str,
}

pub fn run(args: DocArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<DocOutput> {
    let base_dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let mut engine = Engine::new(&base_dir);
    engine.boot()?;

    let registry = engine.registry()?;
    let unit_id = args.unit.unwrap_or_else(|| registry.default_unit_id());
    let def = registry.def(&unit_id)?;

    Ok((
        DocOutput {
            unit: unit_id,
            summary: def.summary,
            properties: collect_properties(def.spec),
            actions: def
                .spec
                .actions
                .iter()
                .map(|action| ActionDoc {
                    name: action.name,
                    doc: action.doc,
                })
                .collect(),
            requires: def.spec.requires.to_vec(),
        },
        0,
    ))
}

/// Flatten the documented field tree into dotted property paths. Undocumented
/// fields and their subtrees are omitted, matching what the binder accepts.
fn collect_properties(spec: &'static UnitSpec) -> Vec<PropertyDoc> {
    let mut out = Vec::new();
    walk_fields(spec.fields, "", &mut out);
    out
}

fn walk_fields(fields: &'static [FieldSpec], prefix: &str, out: &mut Vec<PropertyDoc>) {
    for field in fields.iter().filter(|f| f.documented) {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Nested(children) => walk_fields(children, &path, out),
            kind => out.push(PropertyDoc {
                path,
                kind: kind.label(),
                doc: field.doc,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static LEAF_KIND: FieldKind = FieldKind::Text;

    static NESTED: [FieldSpec; 2] = [
        FieldSpec {
            name: "tag",
            doc: "image tag",
            documented: true,
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "scratch",
            doc: "",
            documented: false,
            kind: FieldKind::Bool,
        },
    ];

    static FIELDS: [FieldSpec; 3] = [
        FieldSpec {
            name: "verbose",
            doc: "log more",
            documented: true,
            kind: FieldKind::Bool,
        },
        FieldSpec {
            name: "image",
            doc: "",
            documented: true,
            kind: FieldKind::Nested(&NESTED),
        },
        FieldSpec {
            name: "tags",
            doc: "",
            documented: true,
            kind: FieldKind::Multi(&LEAF_KIND),
        },
    ];

    static SPEC: UnitSpec = UnitSpec {
        fields: &FIELDS,
        actions: &[],
        requires: &[],
    };

    #[test]
    fn documented_fields_flatten_to_dotted_paths() {
        let props = collect_properties(&SPEC);
        let paths: Vec<&str> = props.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["verbose", "image.tag", "tags"]);
    }

    #[test]
    fn undocumented_fields_stay_hidden() {
        let props = collect_properties(&SPEC);
        assert!(props.iter().all(|p| !p.path.contains("scratch")));
        assert_eq!(props[2].kind, "multi<text>");
    }
}
