//! Serializing outlines back to `gren.json`.

use crate::types::{AppOutline, Exposed, Outline, PkgOutline};
use serde_json::{json, Map, Value};

/// Render an outline in the canonical `gren.json` layout.
///
/// The output is stable: members appear in a fixed order and dependency maps
/// are sorted, so rewriting an untouched outline is byte-for-byte identical.
#[must_use]
pub fn encode(outline: &Outline) -> String {
    let value = match outline {
        Outline::App(app) => app_value(app),
        Outline::Pkg(pkg) => pkg_value(pkg),
    };
    let mut text = serde_json::to_string_pretty(&value).unwrap_or_default();
    text.push('\n');
    text
}

fn app_value(app: &AppOutline) -> Value {
    let mut members = Map::new();
    members.insert("type".into(), json!("application"));
    members.insert("platform".into(), json!(app.platform.as_str()));
    members.insert(
        "source-directories".into(),
        Value::Array(
            app.source_dirs
                .iter()
                .map(|dir| json!(dir.to_string_lossy()))
                .collect(),
        ),
    );
    members.insert("gren-version".into(), json!(app.gren_version.to_string()));

    let mut deps = Map::new();
    deps.insert("direct".into(), dep_map(app.deps_direct.iter()));
    deps.insert("indirect".into(), dep_map(app.deps_indirect.iter()));
    members.insert("dependencies".into(), Value::Object(deps));
    Value::Object(members)
}

fn pkg_value(pkg: &PkgOutline) -> Value {
    let mut members = Map::new();
    members.insert("type".into(), json!("package"));
    members.insert("name".into(), json!(pkg.name.to_string()));
    members.insert("summary".into(), json!(pkg.summary));
    members.insert("license".into(), json!(pkg.license));
    members.insert("version".into(), json!(pkg.version.to_string()));
    members.insert("platform".into(), json!(pkg.platform.as_str()));
    members.insert("exposed-modules".into(), exposed_value(&pkg.exposed));
    members.insert("gren-version".into(), json!(pkg.gren_version.to_string()));
    members.insert("dependencies".into(), dep_map(pkg.deps.iter()));
    Value::Object(members)
}

fn exposed_value(exposed: &Exposed) -> Value {
    match exposed {
        Exposed::Flat(modules) => Value::Array(
            modules
                .iter()
                .map(|module| json!(module.as_str()))
                .collect(),
        ),
        Exposed::Headered(groups) => {
            let mut members = Map::new();
            for (header, modules) in groups {
                members.insert(
                    header.clone(),
                    Value::Array(
                        modules
                            .iter()
                            .map(|module| json!(module.as_str()))
                            .collect(),
                    ),
                );
            }
            Value::Object(members)
        }
    }
}

fn dep_map<'a, V: ToString + 'a>(
    entries: impl Iterator<Item = (&'a gren_core::PackageName, &'a V)>,
) -> Value {
    let mut members = Map::new();
    for (name, value) in entries {
        members.insert(name.to_string(), json!(value.to_string()));
    }
    Value::Object(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::decode;

    const PKG: &str = r#"
    {
        "type": "package",
        "name": "gren/extras",
        "summary": "Assorted helpers",
        "license": "BSD-3-Clause",
        "version": "2.1.0",
        "platform": "common",
        "exposed-modules": [ "Extras", "Extras.List" ],
        "gren-version": "0.5.0 <= v < 0.6.0",
        "dependencies": { "gren/core": "1.0.0 <= v < 2.0.0" }
    }
    "#;

    #[test]
    fn encode_decode_roundtrips() {
        let outline = decode(PKG).unwrap();
        let encoded = encode(&outline);
        assert_eq!(decode(&encoded).unwrap(), outline);
    }

    #[test]
    fn encoding_is_stable() {
        let outline = decode(PKG).unwrap();
        let first = encode(&outline);
        let second = encode(&decode(&first).unwrap());
        assert_eq!(first, second);
    }
}
