//! Solving against a (fake) registry: online search, offline fallback, and
//! the failure modes in between.

use gren_core::{Constraint, PackageName, Platform, Version};
use gren_solver::{verify_app, verify_pkg, Outcome, Registry, RegistryError, SolverError};
use gren_test_utils::{pkg_outline, TestWorld};
use std::collections::BTreeMap;

fn name(text: &str) -> PackageName {
    text.parse().unwrap()
}

fn v(text: &str) -> Version {
    text.parse().unwrap()
}

fn constraints(entries: &[(&str, Constraint)]) -> BTreeMap<PackageName, Constraint> {
    entries
        .iter()
        .map(|(pkg, constraint)| (name(pkg), *constraint))
        .collect()
}

#[test]
fn online_search_downloads_and_picks_newest() {
    let world = TestWorld::new();
    for version in ["1.0.0", "1.1.0", "2.0.0"] {
        world.registry.publish(
            &name("gren/core"),
            v(version),
            &pkg_outline("gren/core", version, "common", &["Basics"], &[]),
            &[],
        );
    }

    let outcome = verify_pkg(
        &world.cache(),
        Some(world.registry.as_ref()),
        Platform::Browser,
        &constraints(&[("gren/core", Constraint::until_next_major(Version::ONE))]),
    )
    .unwrap();

    let Outcome::Ok(solution) = outcome else {
        panic!("expected a solution, got {outcome:?}");
    };
    assert_eq!(solution[&name("gren/core")].version, v("1.1.0"));
    assert!(world.registry.downloads() >= 1);
    assert!(world.cache().is_cached(&name("gren/core"), v("1.1.0")));
}

#[test]
fn disjoint_transitive_requirements_have_no_solution() {
    let world = TestWorld::new();
    let registry = &world.registry;
    for version in ["1.0.0", "2.0.0"] {
        registry.publish(
            &name("gren/core"),
            v(version),
            &pkg_outline("gren/core", version, "common", &["Basics"], &[]),
            &[],
        );
    }
    registry.publish(
        &name("alpha/one"),
        Version::ONE,
        &pkg_outline(
            "alpha/one",
            "1.0.0",
            "common",
            &["One"],
            &[("gren/core", "1.0.0 <= v < 2.0.0")],
        ),
        &[],
    );
    registry.publish(
        &name("beta/two"),
        Version::ONE,
        &pkg_outline(
            "beta/two",
            "1.0.0",
            "common",
            &["Two"],
            &[("gren/core", "2.0.0 <= v < 3.0.0")],
        ),
        &[],
    );

    let outcome = verify_pkg(
        &world.cache(),
        Some(world.registry.as_ref()),
        Platform::Common,
        &constraints(&[
            ("alpha/one", Constraint::until_next_major(Version::ONE)),
            ("beta/two", Constraint::until_next_major(Version::ONE)),
        ]),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::NoSolution);
}

#[test]
fn unreachable_registry_falls_back_to_the_cache() {
    let world = TestWorld::new();
    world.registry.publish(
        &name("gren/core"),
        Version::ONE,
        &pkg_outline("gren/core", "1.0.0", "common", &["Basics"], &[]),
        &[],
    );
    world
        .registry
        .populate(&world.cache(), &name("gren/core"), Version::ONE)
        .unwrap();

    world.registry.set_unreachable(true);
    let outcome = verify_pkg(
        &world.cache(),
        Some(world.registry.as_ref()),
        Platform::Node,
        &constraints(&[("gren/core", Constraint::until_next_major(Version::ONE))]),
    )
    .unwrap();

    let Outcome::Ok(solution) = outcome else {
        panic!("expected an offline solution, got {outcome:?}");
    };
    assert_eq!(solution[&name("gren/core")].version, Version::ONE);
}

#[test]
fn unreachable_registry_with_an_empty_cache_is_distinct() {
    let world = TestWorld::new();
    world.registry.publish(
        &name("gren/core"),
        Version::ONE,
        &pkg_outline("gren/core", "1.0.0", "common", &["Basics"], &[]),
        &[],
    );
    world.registry.set_unreachable(true);

    let outcome = verify_pkg(
        &world.cache(),
        Some(world.registry.as_ref()),
        Platform::Node,
        &constraints(&[("gren/core", Constraint::until_next_major(Version::ONE))]),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::NoOfflineSolution);
}

#[test]
fn unknown_package_aborts_instead_of_solving_around_it() {
    let world = TestWorld::new();
    let err = verify_pkg(
        &world.cache(),
        Some(world.registry.as_ref()),
        Platform::Common,
        &constraints(&[("gren/ghost", Constraint::anything())]),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SolverError::Registry(RegistryError::UnknownPackage(pkg)) if pkg == name("gren/ghost")
    ));
}

#[test]
fn offline_solutions_are_a_subset_of_online_ones() {
    let world = TestWorld::new();
    for version in ["1.0.0", "1.1.0"] {
        world.registry.publish(
            &name("gren/core"),
            v(version),
            &pkg_outline("gren/core", version, "common", &["Basics"], &[]),
            &[],
        );
    }
    // Only 1.0.0 is cached locally.
    world
        .registry
        .populate(&world.cache(), &name("gren/core"), Version::ONE)
        .unwrap();

    let wanted = constraints(&[("gren/core", Constraint::until_next_major(Version::ONE))]);

    let Outcome::Ok(online) = verify_pkg(
        &world.cache(),
        Some(world.registry.as_ref()),
        Platform::Common,
        &wanted,
    )
    .unwrap() else {
        panic!("expected an online solution");
    };
    let Outcome::Ok(offline) =
        verify_pkg(&world.cache(), None, Platform::Common, &wanted).unwrap()
    else {
        panic!("expected an offline solution");
    };

    assert_eq!(online[&name("gren/core")].version, v("1.1.0"));
    assert_eq!(offline[&name("gren/core")].version, v("1.0.0"));
    // Both picks are admissible online; offline never invents a version.
    let constraint = wanted[&name("gren/core")];
    assert!(constraint.satisfies(online[&name("gren/core")].version));
    assert!(constraint.satisfies(offline[&name("gren/core")].version));
}

#[test]
fn applications_resolve_their_pinned_set() {
    let world = TestWorld::new();
    world.registry.publish(
        &name("gren/core"),
        Version::ONE,
        &pkg_outline("gren/core", "1.0.0", "common", &["Basics"], &[]),
        &[],
    );

    let exact = BTreeMap::from([(name("gren/core"), Version::ONE)]);
    let outcome = verify_app(
        &world.cache(),
        Some(world.registry.as_ref()),
        Platform::Browser,
        &exact,
    )
    .unwrap();
    assert!(matches!(outcome, Outcome::Ok(_)));
}
