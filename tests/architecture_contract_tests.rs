//! Architecture contract tests.

mod support;

use support::architecture::{find_lines_containing, path_exists};

#[test]
fn cli_has_no_direct_infrastructure_imports() {
    let hits = find_lines_containing(
        "src/adapter/inbound/cli",
        &["use crate::infrastructure", "crate::infrastructure::"],
    );

    assert!(
        hits.is_empty(),
        "found direct infrastructure imports in inbound CLI adapters: {hits:#?}"
    );
}

#[test]
fn domain_has_no_framework_or_outer_layer_imports() {
    let hits = find_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "crate::port",
            "tokio::",
            "diesel::",
        ],
    );

    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn ports_depend_only_on_domain() {
    let hits = find_lines_containing(
        "src/port",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "diesel::",
        ],
    );

    assert!(hits.is_empty(), "ports should depend only on domain: {hits:#?}");
}

#[test]
fn application_layer_has_no_direct_adapter_imports() {
    let hits = find_lines_containing(
        "src/application",
        &["crate::adapter::", "crate::infrastructure::", "diesel::"],
    );
    assert!(
        hits.is_empty(),
        "application layer should not import adapters directly: {hits:#?}"
    );
}

#[test]
fn sqlite_is_confined_to_its_adapter() {
    let hits: Vec<_> = find_lines_containing("src", &["diesel::"])
        .into_iter()
        .filter(|(path, _, _)| {
            !path.starts_with("src/adapter/outbound/sqlite/") && path != "src/error.rs"
        })
        .collect();
    assert!(hits.is_empty(), "diesel used outside the sqlite adapter: {hits:#?}");
}

#[test]
fn outbound_contracts_live_under_port() {
    for file in [
        "src/port/outbound/performance.rs",
        "src/port/outbound/executor.rs",
        "src/port/outbound/store.rs",
        "src/port/outbound/notifier.rs",
        "src/port/outbound/clock.rs",
        "src/port/inbound/control.rs",
    ] {
        assert!(path_exists(file), "expected port contract `{file}`");
    }
}
