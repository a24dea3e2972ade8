//! The shipped scenario files parse and resolve against the built-in locators

use std::path::PathBuf;

use taskboard_common::UiSettings;
use taskboard_e2e::page::settings_vars;
use taskboard_e2e::{LocatorTable, Scenario, UiStep};

fn specs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("specs")
}

fn settings() -> UiSettings {
    UiSettings {
        login_url: "https://trello.com/login".to_string(),
        email: "qa@example.com".to_string(),
        password: "secret".to_string(),
        workspace: "QA".to_string(),
    }
}

#[test]
fn shipped_scenarios_load_in_name_order() {
    let scenarios = Scenario::load_all(&specs_dir()).unwrap();
    let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["board-create-delete", "card-description"]);
}

#[test]
fn shipped_scenarios_resolve_with_settings_vars() {
    let table = LocatorTable::board_app();
    let vars = settings_vars(&settings());

    for mut scenario in Scenario::load_all(&specs_dir()).unwrap() {
        scenario.inherit_vars(&vars);
        let steps = scenario
            .resolve(&table)
            .unwrap_or_else(|e| panic!("{}: {}", scenario.name, e));

        for step in &steps {
            if let Some(target) = step.target() {
                assert!(target.starts_with("xpath="), "{}: {}", scenario.name, target);
                assert!(!target.contains('{'), "{}: unfilled {}", scenario.name, target);
            }
        }
        assert_eq!(
            steps.first(),
            Some(&UiStep::Goto {
                url: "https://trello.com/login".to_string()
            })
        );
    }
}

#[test]
fn scenario_without_settings_vars_keeps_references() {
    let scenario = Scenario::from_file(&specs_dir().join("board_create_delete.yaml")).unwrap();
    // into_workspace needs {workspace}, which only the settings provide
    assert!(scenario.resolve(&LocatorTable::board_app()).is_err());
}
