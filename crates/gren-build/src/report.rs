//! Rendering problems at the command boundary.
//!
//! Every failure renders either as human-readable text or, under
//! `--report=json`, as a machine-readable value. Compile diagnostics keep
//! their per-module structure in JSON so editors can attribute them.

use crate::error::{BuildError, Problem};
use serde_json::{json, Value};

/// Which rendering the host asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Report {
    /// Human-readable text.
    #[default]
    Human,
    /// The `--report=json` schema.
    Json,
}

/// A short headline for each problem kind.
fn title(problem: &Problem) -> &'static str {
    match problem {
        Problem::Outline(_) => "INVALID GREN.JSON",
        Problem::Cache(_) => "CACHE PROBLEM",
        Problem::Details(err) => match err {
            crate::error::DetailsError::NoSolution => "UNSOLVABLE DEPENDENCIES",
            crate::error::DetailsError::NoOfflineSolution => "NO OFFLINE SOLUTION",
            crate::error::DetailsError::HandEditedDependencies { .. } => "HAND-EDITED DEPENDENCIES",
            crate::error::DetailsError::PackageBuildFailed { .. } => "DEPENDENCY BUILD FAILED",
            _ => "DEPENDENCY PROBLEM",
        },
        Problem::Build(err) => match err {
            BuildError::ImportCycle { .. } => "IMPORT CYCLE",
            BuildError::AmbiguousLocal { .. } => "AMBIGUOUS MODULE",
            BuildError::AmbiguousImport { .. } => "AMBIGUOUS IMPORT",
            BuildError::ModuleProblems { .. } => "COMPILE ERRORS",
            BuildError::MissingExposed(_) => "MISSING EXPOSED MODULE",
            _ => "BUILD PROBLEM",
        },
        Problem::Generate(err) => match err {
            crate::error::GenerateError::CannotOptimizeAndDebug => "CLASHING FLAGS",
            crate::error::GenerateError::CannotOptimizeDebugValues { .. } => "DEBUG REMNANTS",
            crate::error::GenerateError::CorruptCache { .. } => "CORRUPT CACHE",
            _ => "GENERATION PROBLEM",
        },
    }
}

/// Render a problem as text.
#[must_use]
pub fn render_human(problem: &Problem) -> String {
    let mut text = format!("-- {} --\n\n", title(problem));
    match problem {
        Problem::Build(BuildError::ModuleProblems { diagnostics }) => {
            for (module, problems) in diagnostics {
                text.push_str(&format!("{module}:\n"));
                for line in problems {
                    text.push_str(&format!("    {line}\n"));
                }
            }
        }
        other => {
            text.push_str(&other.to_string());
            text.push('\n');
        }
    }
    text
}

/// Render a problem in the `--report=json` schema.
#[must_use]
pub fn render_json(problem: &Problem) -> Value {
    match problem {
        Problem::Build(BuildError::ModuleProblems { diagnostics }) => json!({
            "type": "compile-errors",
            "errors": diagnostics
                .iter()
                .map(|(module, problems)| json!({
                    "name": module.to_string(),
                    "problems": problems,
                }))
                .collect::<Vec<_>>(),
        }),
        other => json!({
            "type": "error",
            "title": title(other),
            "message": other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn cycle() -> Problem {
        Problem::Build(BuildError::ImportCycle {
            cycle: vec!["A".parse().unwrap(), "B".parse().unwrap()],
        })
    }

    #[test]
    fn human_rendering_has_a_headline() {
        let text = render_human(&cycle());
        assert!(text.starts_with("-- IMPORT CYCLE --"));
        assert!(text.contains("A -> B"));
    }

    #[test]
    fn json_error_schema() {
        let value = render_json(&cycle());
        assert_eq!(value["type"], "error");
        assert_eq!(value["title"], "IMPORT CYCLE");
    }

    #[test]
    fn json_compile_errors_keep_module_structure() {
        let problem = Problem::Build(BuildError::ModuleProblems {
            diagnostics: BTreeMap::from([(
                "Main".parse().unwrap(),
                vec!["type mismatch".to_string()],
            )]),
        });
        let value = render_json(&problem);
        assert_eq!(value["type"], "compile-errors");
        assert_eq!(value["errors"][0]["name"], "Main");
        assert_eq!(value["errors"][0]["problems"][0], "type mismatch");
    }
}
