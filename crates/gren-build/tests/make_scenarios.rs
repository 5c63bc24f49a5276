//! End-to-end `make` scenarios: cold and warm builds, staleness, cycles,
//! flag clashes, and cache corruption recovery.

use gren_artifacts::from_bytes;
use gren_build::ops::{self, Flags};
use gren_build::{
    BuildError, Details, DetailsError, GenerateError, Output, OutputTarget, Problem,
};
use gren_core::{PackageName, Version};
use gren_test_utils::{app_outline, pkg_outline, TempProject, TestWorld};
use std::path::PathBuf;

const MAIN: &str =
    "module Main exposing (main)\n\nimport Html\n\nmain =\n    Html.text \"hi\"\n";

fn core() -> PackageName {
    "gren/core".parse().unwrap()
}

fn html_flags(project: &TempProject) -> Flags {
    Flags {
        output: Some(OutputTarget::Html(project.root().join("index.html"))),
        ..Flags::default()
    }
}

fn simple_app(world: &TestWorld) -> TempProject {
    let _ = world;
    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline("browser", &[("gren/core", "1.0.0")], &[]),
    );
    project.write("src/Main.gren", MAIN);
    project
}

async fn make(
    world: &TestWorld,
    project: &TempProject,
    entries: &[&str],
    flags: &Flags,
) -> Result<Output, Problem> {
    let entry_paths: Vec<PathBuf> = entries
        .iter()
        .map(|entry| project.root().join(entry))
        .collect();
    ops::make(&world.env(), &project.paths(), &entry_paths, flags).await
}

fn read_details(project: &TempProject) -> Details {
    let bytes = std::fs::read(project.root().join(".gren/details.dat")).unwrap();
    from_bytes(&bytes).unwrap()
}

#[tokio::test]
async fn cold_build_emits_html_and_stores() {
    let world = TestWorld::with_std();
    let project = simple_app(&world);

    let output = make(&world, &project, &["src/Main.gren"], &html_flags(&project))
        .await
        .unwrap();

    assert_eq!(output, Output::File(project.root().join("index.html")));
    for store in [".gren/details.dat", ".gren/interfaces.dat", ".gren/objects.dat"] {
        assert!(project.exists(store), "missing {store}");
    }
    assert!(world
        .cache()
        .artifacts_path(&core(), Version::ONE)
        .is_file());

    let html = project.read("index.html");
    assert!(html.contains("Gren[\"Main\"]"));
    assert!(html.contains("kernels=1"), "kernel module should be linked");
}

#[tokio::test]
async fn warm_rebuild_recompiles_nothing_and_bumps_build_id() {
    let world = TestWorld::with_std();
    let project = simple_app(&world);
    let flags = html_flags(&project);

    make(&world, &project, &["src/Main.gren"], &flags)
        .await
        .unwrap();
    let cold_details = read_details(&project);
    let cold_compiles = world.frontend.compiles();

    std::fs::remove_file(project.root().join("index.html")).unwrap();
    make(&world, &project, &["src/Main.gren"], &flags)
        .await
        .unwrap();

    assert_eq!(world.frontend.compiles(), cold_compiles, "nothing to recompile");
    assert!(project.exists("index.html"), "output is re-emitted");
    assert_eq!(read_details(&project).build_id, cold_details.build_id + 1);
}

#[tokio::test]
async fn touching_a_file_recompiles_it_but_not_its_dependents() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline("browser", &[("gren/core", "1.0.0")], &[]),
    );
    project.write(
        "src/Util.gren",
        "module Util exposing (..)\n\ngreeting : String\ngreeting =\n    0\n",
    );
    project.write(
        "src/Main.gren",
        "module Main exposing (main)\n\nimport Util\n\nmain =\n    Util.greeting\n",
    );
    let flags = html_flags(&project);

    make(&world, &project, &["src/Main.gren"], &flags)
        .await
        .unwrap();
    let baseline = world.frontend.compiles();

    // mtime changes, content does not: Util recompiles, Main does not.
    project.touch("src/Util.gren");
    make(&world, &project, &["src/Main.gren"], &flags)
        .await
        .unwrap();
    assert_eq!(world.frontend.compiles(), baseline + 1);

    // The exported signature changes: Util and Main recompile, once each.
    project.write(
        "src/Util.gren",
        "module Util exposing (..)\n\ngreeting : Int\ngreeting =\n    0\n",
    );
    make(&world, &project, &["src/Main.gren"], &flags)
        .await
        .unwrap();
    assert_eq!(world.frontend.compiles(), baseline + 3);
}

#[tokio::test]
async fn other_entry_points_catch_up_on_interface_changes() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline("browser", &[("gren/core", "1.0.0")], &[]),
    );
    project.write(
        "src/Shared.gren",
        "module Shared exposing (..)\n\nvalue : String\nvalue =\n    0\n",
    );
    project.write(
        "src/Main1.gren",
        "module Main1 exposing (main)\n\nimport Shared\n\nmain =\n    Shared.value\n",
    );
    project.write(
        "src/Main2.gren",
        "module Main2 exposing (main)\n\nimport Shared\n\nmain =\n    Shared.value\n",
    );
    let flags = |entry: &str| Flags {
        output: Some(OutputTarget::Js(project.root().join(format!("{entry}.js")))),
        ..Flags::default()
    };

    make(&world, &project, &["src/Main1.gren"], &flags("main1"))
        .await
        .unwrap();
    make(&world, &project, &["src/Main2.gren"], &flags("main2"))
        .await
        .unwrap();
    let baseline = world.frontend.compiles();

    // Shared's exported signature changes while building only Main1.
    project.write(
        "src/Shared.gren",
        "module Shared exposing (..)\n\nvalue : Int\nvalue =\n    0\n",
    );
    make(&world, &project, &["src/Main1.gren"], &flags("main1"))
        .await
        .unwrap();
    assert_eq!(world.frontend.compiles(), baseline + 2);

    // Main2 was compiled against the old interface; its own build catches
    // up through the recorded change horizon, recompiling Main2 alone.
    make(&world, &project, &["src/Main2.gren"], &flags("main2"))
        .await
        .unwrap();
    assert_eq!(world.frontend.compiles(), baseline + 3);
}

#[tokio::test]
async fn import_cycle_is_reported_in_order() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline("browser", &[("gren/core", "1.0.0")], &[]),
    );
    project.write(
        "src/A.gren",
        "module A exposing (main)\n\nimport B\n\nmain =\n    B.x\n",
    );
    project.write("src/B.gren", "module B exposing (..)\n\nimport A\n\nx =\n    0\n");

    let err = make(&world, &project, &["src/A.gren"], &html_flags(&project))
        .await
        .unwrap_err();
    let Problem::Build(BuildError::ImportCycle { cycle }) = err else {
        panic!("expected an import cycle, got {err}");
    };
    let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
    assert_eq!(names, ["A", "B"]);
    assert!(!project.exists("index.html"));
}

#[tokio::test]
async fn constraint_conflict_writes_nothing() {
    let world = TestWorld::new();
    world.registry.publish(
        &core(),
        Version::ONE,
        &pkg_outline("gren/core", "1.0.0", "common", &["Basics"], &[]),
        &[("src/Basics.gren", "module Basics exposing (..)\n\nidentity =\n    0\n")],
    );
    world.registry.publish(
        &"alpha/one".parse().unwrap(),
        Version::ONE,
        &pkg_outline(
            "alpha/one",
            "1.0.0",
            "common",
            &["One"],
            &[("gren/core", "2.0.0 <= v < 3.0.0")],
        ),
        &[("src/One.gren", "module One exposing (..)\n\none =\n    1\n")],
    );

    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline(
            "browser",
            &[("alpha/one", "1.0.0")],
            &[("gren/core", "1.0.0")],
        ),
    );
    project.write("src/Main.gren", MAIN);

    let err = make(&world, &project, &["src/Main.gren"], &html_flags(&project))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Problem::Details(DetailsError::NoSolution)
    ));
    assert!(!project.exists(".gren"), "nothing may be persisted");
    assert!(!project.exists("index.html"));
}

#[tokio::test]
async fn optimize_and_debug_clash_before_compiling() {
    let world = TestWorld::with_std();
    let project = simple_app(&world);
    let flags = Flags {
        debug: true,
        optimize: true,
        ..html_flags(&project)
    };

    let err = make(&world, &project, &["src/Main.gren"], &flags)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Problem::Generate(GenerateError::CannotOptimizeAndDebug)
    ));
    assert_eq!(world.frontend.compiles(), 0, "the compiler is never invoked");
}

#[tokio::test]
async fn optimize_refuses_debug_usage_and_writes_no_js() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline("browser", &[("gren/core", "1.0.0")], &[]),
    );
    project.write(
        "src/Main.gren",
        "module Main exposing (main)\n\nimport Html\n\nmain =\n    Debug.log (Html.text \"hi\")\n",
    );
    let flags = Flags {
        optimize: true,
        ..html_flags(&project)
    };

    let err = make(&world, &project, &["src/Main.gren"], &flags)
        .await
        .unwrap_err();
    let Problem::Generate(GenerateError::CannotOptimizeDebugValues { modules }) = err else {
        panic!("expected CannotOptimizeDebugValues, got {err}");
    };
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].to_string(), "Main");
    assert!(!project.exists("index.html"));
}

#[tokio::test]
async fn two_entry_files_cannot_share_an_html_page() {
    let world = TestWorld::with_std();
    let project = simple_app(&world);
    project.write(
        "src/Other.gren",
        "module Other exposing (main)\n\nimport Html\n\nmain =\n    Html.text \"yo\"\n",
    );

    let err = make(
        &world,
        &project,
        &["src/Main.gren", "src/Other.gren"],
        &html_flags(&project),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Problem::Generate(GenerateError::MultipleFilesIntoHtml(2))
    ));
}

#[tokio::test]
async fn corrupt_artifacts_are_rebuilt_identically() {
    let world = TestWorld::with_std();
    let first = simple_app(&world);
    make(&world, &first, &["src/Main.gren"], &html_flags(&first))
        .await
        .unwrap();

    let artifacts_path = world.cache().artifacts_path(&core(), Version::ONE);
    let clean = std::fs::read(&artifacts_path).unwrap();
    let mut corrupted = clean.clone();
    corrupted[0] ^= 0xFF;
    std::fs::write(&artifacts_path, &corrupted).unwrap();

    // A fresh project forces dependency verification to look at the store.
    let second = simple_app(&world);
    make(&world, &second, &["src/Main.gren"], &html_flags(&second))
        .await
        .unwrap();

    let rebuilt = std::fs::read(&artifacts_path).unwrap();
    assert_eq!(rebuilt, clean, "rebuild reproduces the pre-corruption bytes");
}

#[tokio::test]
async fn missing_import_names_the_importer() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline("browser", &[("gren/core", "1.0.0")], &[]),
    );
    project.write(
        "src/Main.gren",
        "module Main exposing (main)\n\nimport Nope\n\nmain =\n    Nope.x\n",
    );

    let err = make(&world, &project, &["src/Main.gren"], &html_flags(&project))
        .await
        .unwrap_err();
    let Problem::Build(BuildError::ImportNotFound { importer, name }) = err else {
        panic!("expected ImportNotFound, got {err}");
    };
    assert_eq!(importer.to_string(), "Main");
    assert_eq!(name.to_string(), "Nope");
}

#[tokio::test]
async fn module_in_two_source_directories_is_ambiguous() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &format!(
            r#"{{
    "type": "application",
    "platform": "browser",
    "source-directories": [ "src", "lib" ],
    "gren-version": "{}",
    "dependencies": {{
        "direct": {{ "gren/core": "1.0.0" }},
        "indirect": {{}}
    }}
}}"#,
            gren_core::COMPILER_VERSION
        ),
    );
    project.write(
        "src/Main.gren",
        "module Main exposing (main)\n\nimport Util\n\nmain =\n    Util.x\n",
    );
    project.write("src/Util.gren", "module Util exposing (..)\n\nx =\n    0\n");
    project.write("lib/Util.gren", "module Util exposing (..)\n\nx =\n    1\n");

    let err = make(&world, &project, &["src/Main.gren"], &html_flags(&project))
        .await
        .unwrap_err();
    let Problem::Build(BuildError::AmbiguousLocal { module, paths }) = err else {
        panic!("expected AmbiguousLocal, got {err}");
    };
    assert_eq!(module.to_string(), "Util");
    assert_eq!(paths.len(), 2);
}

#[tokio::test]
async fn compile_errors_from_sibling_modules_are_all_reported() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &app_outline("browser", &[("gren/core", "1.0.0")], &[]),
    );
    project.write(
        "src/Main.gren",
        "module Main exposing (main)\n\nimport A\nimport B\n\nmain =\n    A.x\n",
    );
    project.write("src/A.gren", "module A exposing (..)\n\nx =\n    !type_error\n");
    project.write("src/B.gren", "module B exposing (..)\n\ny =\n    !type_error\n");

    let err = make(&world, &project, &["src/Main.gren"], &html_flags(&project))
        .await
        .unwrap_err();
    let Problem::Build(BuildError::ModuleProblems { diagnostics }) = err else {
        panic!("expected ModuleProblems, got {err}");
    };
    // Both failing siblings surface; the dependent Main aborts quietly.
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.contains_key(&"A".parse().unwrap()));
    assert!(diagnostics.contains_key(&"B".parse().unwrap()));
}

#[tokio::test]
async fn package_projects_type_check_all_exposed_modules() {
    let world = TestWorld::with_std();
    let project = TempProject::new();
    project.write(
        "gren.json",
        &pkg_outline(
            "author/extras",
            "1.0.0",
            "common",
            &["Extras"],
            &[("gren/core", "1.0.0 <= v < 2.0.0")],
        ),
    );
    project.write(
        "src/Extras.gren",
        "module Extras exposing (..)\n\ndouble : Int\ndouble =\n    0\n",
    );

    let output = make(&world, &project, &[], &Flags::default()).await.unwrap();
    assert_eq!(output, Output::None, "package builds skip code generation");
    assert!(project.exists(".gren/details.dat"));
}

#[tokio::test]
async fn install_rewrites_the_outline_after_verifying() {
    let world = TestWorld::with_std();
    world.registry.publish(
        &"gren/url".parse().unwrap(),
        "2.0.1".parse().unwrap(),
        &pkg_outline(
            "gren/url",
            "2.0.1",
            "common",
            &["Url"],
            &[("gren/core", "1.0.0 <= v < 2.0.0")],
        ),
        &[("src/Url.gren", "module Url exposing (..)\n\nparse =\n    0\n")],
    );
    let project = simple_app(&world);

    ops::install(
        &world.env(),
        &project.paths(),
        Some("gren/url".parse().unwrap()),
    )
    .await
    .unwrap();

    let outline = project.read("gren.json");
    assert!(outline.contains("\"gren/url\": \"2.0.1\""));
    // Installing again is a no-op.
    ops::install(
        &world.env(),
        &project.paths(),
        Some("gren/url".parse().unwrap()),
    )
    .await
    .unwrap();
}
