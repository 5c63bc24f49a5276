//! Two-phase manifest decoding.

use crate::error::{OutlineError, Region, Result};
use crate::license::is_known_license;
use crate::types::{AppOutline, Exposed, Outline, PkgOutline};
use crate::OUTLINE_FILE;
use gren_core::{Constraint, PackageName, Platform, Raw, Version, COMPILER_VERSION};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Read and validate `<root>/gren.json`.
pub fn load(root: &Path) -> Result<Outline> {
    let path = root.join(OUTLINE_FILE);
    let src = std::fs::read_to_string(&path).map_err(|source| OutlineError::Read {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), bytes = src.len(), "reading outline");
    decode(&src)
}

/// Validate raw manifest bytes.
pub fn decode(src: &str) -> Result<Outline> {
    let value: Value = serde_json::from_str(src).map_err(|err| OutlineError::Syntax {
        region: Region {
            row: err.line() as u32,
            col: err.column() as u32,
        },
        message: err.to_string(),
    })?;

    let Value::Object(members) = value else {
        return Err(OutlineError::BadFieldValue {
            field: String::new(),
            message: "the manifest must be a JSON object".to_string(),
            region: Some(Region { row: 1, col: 1 }),
        });
    };

    match get_str(src, &members, "type")? {
        "application" => decode_app(src, &members).map(Outline::App),
        "package" => decode_pkg(src, &members).map(Outline::Pkg),
        other => Err(OutlineError::BadType {
            found: other.to_string(),
            region: Region::of_member(src, "type"),
        }),
    }
}

fn decode_app(src: &str, members: &Map<String, Value>) -> Result<AppOutline> {
    let gren_version: Version = parse_str(src, members, "gren-version")?;
    if gren_version != COMPILER_VERSION {
        return Err(OutlineError::CompilerVersionMismatch {
            found: gren_version,
        });
    }

    let platform = decode_platform(src, members)?;
    let source_dirs = decode_source_dirs(src, members)?;

    let deps = get_object(src, members, "dependencies")?;
    let deps_direct = decode_exact_deps(src, deps, "direct")?;
    let deps_indirect = decode_exact_deps(src, deps, "indirect")?;
    if let Some(name) = deps_direct.keys().find(|name| deps_indirect.contains_key(*name)) {
        return Err(OutlineError::DependencyListedTwice(name.clone()));
    }

    Ok(AppOutline {
        gren_version,
        platform,
        source_dirs,
        deps_direct,
        deps_indirect,
    })
}

fn decode_pkg(src: &str, members: &Map<String, Value>) -> Result<PkgOutline> {
    let name: PackageName = parse_str(src, members, "name")?;

    let summary = get_str(src, members, "summary")?.to_string();
    if summary.len() >= 80 {
        return Err(OutlineError::SummaryTooLong(summary.len()));
    }

    let license = get_str(src, members, "license")?.to_string();
    if !is_known_license(&license) {
        return Err(OutlineError::BadLicense(license));
    }

    let version: Version = parse_str(src, members, "version")?;
    let platform = decode_platform(src, members)?;
    let exposed = decode_exposed(src, members)?;

    let gren_version: Constraint = parse_str(src, members, "gren-version")?;
    if !gren_version.accepts_compiler() {
        return Err(OutlineError::CompilerVersionRejected {
            constraint: gren_version,
        });
    }

    let deps = decode_range_deps(src, get_object(src, members, "dependencies")?)?;

    Ok(PkgOutline {
        name,
        summary,
        license,
        version,
        platform,
        exposed,
        gren_version,
        deps,
    })
}

fn decode_platform(src: &str, members: &Map<String, Value>) -> Result<Platform> {
    parse_str(src, members, "platform")
}

fn decode_source_dirs(src: &str, members: &Map<String, Value>) -> Result<Vec<PathBuf>> {
    let field = "source-directories";
    let Value::Array(entries) = get_member(members, field)? else {
        return Err(bad_value(src, field, "expected an array of directories"));
    };
    if entries.is_empty() {
        return Err(OutlineError::NoSourceDirectories);
    }

    let mut seen = BTreeSet::new();
    let mut dirs = Vec::with_capacity(entries.len());
    for entry in entries {
        let Value::String(dir) = entry else {
            return Err(bad_value(src, field, "each entry must be a string"));
        };
        if !seen.insert(dir.clone()) {
            return Err(OutlineError::DuplicateSourceDirectory(dir.clone()));
        }
        dirs.push(PathBuf::from(dir));
    }
    Ok(dirs)
}

fn decode_exposed(src: &str, members: &Map<String, Value>) -> Result<Exposed> {
    let field = "exposed-modules";
    let exposed = match get_member(members, field)? {
        Value::Array(entries) => Exposed::Flat(decode_module_list(src, field, entries)?),
        Value::Object(groups) => {
            let mut headered = Vec::with_capacity(groups.len());
            for (header, entries) in groups {
                if header.is_empty() || header.len() > 20 {
                    return Err(OutlineError::BadExposedHeader(header.clone()));
                }
                let Value::Array(entries) = entries else {
                    return Err(bad_value(src, field, "each header must hold an array"));
                };
                headered.push((header.clone(), decode_module_list(src, field, entries)?));
            }
            Exposed::Headered(headered)
        }
        _ => {
            return Err(bad_value(
                src,
                field,
                "expected an array of modules or an object of headers",
            ));
        }
    };

    if exposed.is_empty() {
        return Err(OutlineError::NoExposedModules);
    }
    let mut seen = BTreeSet::new();
    for module in exposed.iter() {
        if !seen.insert(module.clone()) {
            return Err(OutlineError::DuplicateExposedModule(module.to_string()));
        }
    }
    Ok(exposed)
}

fn decode_module_list(src: &str, field: &str, entries: &[Value]) -> Result<Vec<Raw>> {
    entries
        .iter()
        .map(|entry| {
            let Value::String(name) = entry else {
                return Err(bad_value(src, field, "each module must be a string"));
            };
            name.parse::<Raw>()
                .map_err(|err| bad_value(src, field, &err.to_string()))
        })
        .collect()
}

fn decode_exact_deps(
    src: &str,
    deps: &Map<String, Value>,
    field: &'static str,
) -> Result<BTreeMap<PackageName, Version>> {
    let Value::Object(entries) = get_member(deps, field)? else {
        return Err(bad_value(src, field, "expected an object of packages"));
    };
    decode_dep_map(src, field, entries)
}

fn decode_range_deps(
    src: &str,
    entries: &Map<String, Value>,
) -> Result<BTreeMap<PackageName, Constraint>> {
    decode_dep_map(src, "dependencies", entries)
}

fn decode_dep_map<T: FromStr>(
    src: &str,
    field: &str,
    entries: &Map<String, Value>,
) -> Result<BTreeMap<PackageName, T>>
where
    T::Err: std::fmt::Display,
{
    let mut out = BTreeMap::new();
    for (name, value) in entries {
        let name: PackageName = name
            .parse()
            .map_err(|err: gren_core::PackageNameError| bad_value(src, field, &err.to_string()))?;
        let Value::String(text) = value else {
            return Err(bad_value(src, field, "each dependency must map to a string"));
        };
        let parsed = text
            .parse()
            .map_err(|err: T::Err| bad_value(src, field, &err.to_string()))?;
        out.insert(name, parsed);
    }
    Ok(out)
}

fn get_member<'a>(members: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value> {
    members
        .get(field)
        .ok_or(OutlineError::MissingField { field })
}

fn get_object<'a>(
    src: &str,
    members: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Map<String, Value>> {
    match get_member(members, field)? {
        Value::Object(object) => Ok(object),
        _ => Err(bad_value(src, field, "expected an object")),
    }
}

fn get_str<'a>(src: &str, members: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    match get_member(members, field)? {
        Value::String(text) => Ok(text),
        _ => Err(bad_value(src, field, "expected a string")),
    }
}

fn parse_str<T: FromStr>(src: &str, members: &Map<String, Value>, field: &'static str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    get_str(src, members, field)?
        .parse()
        .map_err(|err: T::Err| bad_value(src, field, &err.to_string()))
}

fn bad_value(src: &str, field: &str, message: &str) -> OutlineError {
    OutlineError::BadFieldValue {
        field: field.to_string(),
        message: message.to_string(),
        region: Region::of_member(src, field),
    }
}
