//! Named element locators for the board web app
//!
//! Scenarios and page flows refer to elements by name. Names map to XPath
//! templates whose `{board}`, `{list}`, `{card}` and `{workspace}`
//! placeholders are filled from scenario variables at resolve time.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// How long a wait condition is polled before giving up
pub const DEFAULT_WAIT: Duration = Duration::from_secs(10);

/// Scenario variables substituted into locator templates
pub type LocatorVars = BTreeMap<String, String>;

/// What must hold before an element is handed to an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// Attached to the DOM
    Present,
    /// Attached and rendered
    #[default]
    Visible,
    /// Visible, enabled and not covered
    Clickable,
    /// At least one match attached; the action sees every match
    AllPresent,
}

impl WaitCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitCondition::Present => "present",
            WaitCondition::Visible => "visible",
            WaitCondition::Clickable => "clickable",
            WaitCondition::AllPresent => "all_present",
        }
    }
}

const BOARD_APP_LOCATORS: &[(&str, &str)] = &[
    // Login
    ("input_email", r#"//*[@id="username"]"#),
    ("input_password", r#"//*[@id="password"]"#),
    ("login_submit", r#"//*[@id="login-submit"]/span"#),
    // Workspace
    ("workspace_switcher", r#"//*[contains(@data-testid,"workspace-switcher")]"#),
    (
        "into_workspace",
        r#"//*[contains(@data-testid,"workspace-switcher-popover-tile")]//*[contains(normalize-space(),"{workspace}")]"#,
    ),
    ("boards", r#"//*[contains(@class,"cZx7p8hAQGLEz5 l7ix_KdG4LuugK")]"#),
    (
        "workspace_into_board",
        r#"//*[contains(@title,"{board}") and contains(@class,"hPB1MFHtrhA_in")]"#,
    ),
    // Board lifecycle
    (
        "board_overflow_menu",
        r#"//*[contains(@title,"{board}")]/following-sibling::*//*[contains(@data-testid,"OverflowMenuHorizontalIcon")]"#,
    ),
    ("close_board", r#"//*[contains(@data-testid,"ForwardIcon")]"#),
    (
        "confirm_close_board",
        r#"//button[contains(@data-testid,"popover-close-board-confirm")]"#,
    ),
    ("check_closed_board", r#"//footer[contains(@class,"vccO4XHqldnulB")]//button"#),
    (
        "delete_board",
        r#"//*[contains(@class,"KIigWC5xzGtpZ7") and contains(normalize-space(),"{board}")]//button[contains(@data-testid,"close-board-delete-board-button")]"#,
    ),
    (
        "delete_board_confirm",
        r#"//button[contains(@data-testid,"close-board-delete-board-confirm-button")]"#,
    ),
    ("leave_closed_board", r#"//button//*[contains(@data-testid,"CloseIcon")]"#),
    ("create_board_button", r#"//button[contains(@data-testid,"create-board-tile")]"#),
    (
        "input_board_title",
        r#"//input[contains(@data-testid,"create-board-title-input")]"#,
    ),
    (
        "create_board_submit",
        r#"//button[contains(@data-testid,"create-board-submit-button")]"#,
    ),
    // Lists
    ("create_list_button", r#"//button[contains(@data-testid,"list-composer")]"#),
    ("new_listname_input", r#"//textarea[contains(@class,"oe8RymzptORQ7h")]"#),
    ("create_list_submit", r#"//button[contains(@data-testid,"list-composer-add")]"#),
    (
        "list_overflow_menu",
        r#"//*[contains(normalize-space(),"{list}")]/following-sibling::*//*[contains(@data-testid,"list-edit-menu-button")]"#,
    ),
    ("archive_list_button", r#"//button[contains(@data-testid,"list-actions-archive")]"#),
    (
        "overflow_menu_inboard",
        r#"//button[contains(@class,"GDunJzzgFqQY_3 frrHNIWnTojsww bxgKMAm3lq5BpA HAVwIqCeMHpVKh SEj5vUdI3VvxDc")]"#,
    ),
    ("check_archived", r#"//button//*[contains(@data-testid,"ArchiveIcon")]"#),
    ("archived_switcher", r#"//*[contains(@class,"archive-controls-switch")]"#),
    (
        "delete_list",
        r#"//*[contains(normalize-space(),"{list}")]/following-sibling::*//*[contains(@class,"button-link js-delete")]"#,
    ),
    ("delete_confirm", r#"//*[contains(@data-testid,"popover-confirm")]"#),
    // Cards
    (
        "create_card_button",
        r#"//*[contains(normalize-space(),"{list}")]/following-sibling::*//button[contains(@data-testid,"list-add")]"#,
    ),
    ("new_cardname_input", r#"//textarea[contains(@data-testid,"list-card")]"#),
    ("create_card_submit", r#"//button[contains(@data-testid,"list-card-composer-add")]"#),
    (
        "card_editor",
        r#"//*[contains(@data-testid,"trello-card") and contains(normalize-space(),"{card}")]//*[contains(@data-testid,"quick-card-editor-button")]"#,
    ),
    (
        "card_button",
        r#"//*[contains(@data-testid,"trello-card") and contains(normalize-space(),"{card}")]"#,
    ),
    ("card_archive_button", r#"//button[contains(@data-testid,"archive")]"#),
    ("card_delete_button", r#"//button[contains(@data-testid,"delete")]"#),
    ("add_description_button", r#"//button[contains(@class,"krMmYdD0ayf5Qo")]"#),
    ("card_description_textarea", r#"//*[contains(@id,"ak")]"#),
    ("description_save_button", r#"//*[contains(@data-testid,"description-save")]"#),
    ("card_description", r#"//*[contains(@class,"ak-renderer-doc")]"#),
    // Checklists
    ("create_checklist_button", r#"//button[contains(@data-testid,"checklist")]"#),
    (
        "create_checklist_submit",
        r#"//button[contains(@class,"HwRbvTPVxzo9OE bxgKMAm3lq5BpA SEj5vUdI3VvxDc")]"#,
    ),
];

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// Values land inside `"..."` XPath string literals
fn check_quoted(locator: &str, placeholder: &str, value: &str) -> E2eResult<()> {
    if value.contains('"') {
        return Err(E2eError::InvalidPlaceholderValue {
            locator: locator.to_string(),
            placeholder: placeholder.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Element name to XPath template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorTable {
    entries: BTreeMap<String, String>,
}

impl LocatorTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table for the board web app
    pub fn board_app() -> Self {
        Self {
            entries: BOARD_APP_LOCATORS
                .iter()
                .map(|(name, xpath)| (name.to_string(), xpath.to_string()))
                .collect(),
        }
    }

    /// Parse a flat `name: xpath` YAML mapping
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let entries: BTreeMap<String, String> = serde_yaml::from_str(yaml)?;
        Ok(Self { entries })
    }

    /// Overlay entries from a YAML file onto this table
    pub fn load_overrides(&mut self, path: &Path) -> E2eResult<()> {
        let content = std::fs::read_to_string(path)?;
        let overrides = Self::from_yaml(&content)?;
        debug!(
            "Loaded {} locator override(s) from {}",
            overrides.len(),
            path.display()
        );
        self.merge(overrides);
        Ok(())
    }

    /// Entries in `other` replace ours with the same name
    pub fn merge(&mut self, other: LocatorTable) {
        self.entries.extend(other.entries);
    }

    pub fn insert(&mut self, name: impl Into<String>, xpath: impl Into<String>) {
        self.entries.insert(name.into(), xpath.into());
    }

    /// Raw template for `name`
    pub fn get(&self, name: &str) -> E2eResult<&str> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| E2eError::UnknownLocator(name.to_string()))
    }

    /// XPath for `name` with every placeholder filled from `vars`
    pub fn resolve(&self, name: &str, vars: &LocatorVars) -> E2eResult<String> {
        let template = self.get(name)?;
        let mut failure = None;

        let xpath = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
            let placeholder = &caps[1];
            match vars.get(placeholder) {
                Some(value) => {
                    if let Err(e) = check_quoted(name, placeholder, value) {
                        failure.get_or_insert(e);
                    }
                    value.clone()
                }
                None => {
                    failure.get_or_insert_with(|| E2eError::UnresolvedPlaceholder {
                        locator: name.to_string(),
                        placeholder: placeholder.to_string(),
                    });
                    caps[0].to_string()
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(xpath.into_owned()),
        }
    }

    /// Playwright selector for a step target
    ///
    /// Targets starting with `xpath=`, `css=` or `//` are used as given;
    /// anything else is a locator name.
    pub fn selector(&self, target: &str, vars: &LocatorVars) -> E2eResult<String> {
        if target.starts_with("xpath=") || target.starts_with("css=") {
            return Ok(target.to_string());
        }
        if target.starts_with("//") {
            return Ok(format!("xpath={}", target));
        }
        Ok(format!("xpath={}", self.resolve(target, vars)?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn vars(pairs: &[(&str, &str)]) -> LocatorVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_board_app_table_has_flow_locators() {
        let table = LocatorTable::board_app();
        for name in [
            "input_email",
            "login_submit",
            "create_board_submit",
            "list_overflow_menu",
            "card_button",
            "create_checklist_submit",
        ] {
            assert!(table.get(name).is_ok(), "missing {}", name);
        }
    }

    #[test]
    fn test_resolve_fills_placeholders() {
        let table = LocatorTable::board_app();
        let xpath = table
            .resolve("workspace_into_board", &vars(&[("board", "Sprint 12")]))
            .unwrap();
        assert_eq!(
            xpath,
            r#"//*[contains(@title,"Sprint 12") and contains(@class,"hPB1MFHtrhA_in")]"#
        );
    }

    #[test]
    fn test_resolve_reports_missing_placeholder() {
        let table = LocatorTable::board_app();
        match table.resolve("card_button", &LocatorVars::new()) {
            Err(E2eError::UnresolvedPlaceholder { locator, placeholder }) => {
                assert_eq!(locator, "card_button");
                assert_eq!(placeholder, "card");
            }
            other => panic!("expected UnresolvedPlaceholder, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_double_quote_in_value() {
        let table = LocatorTable::board_app();
        match table.resolve("workspace_into_board", &vars(&[("board", r#"The "big" one"#)])) {
            Err(E2eError::InvalidPlaceholderValue {
                locator,
                placeholder,
                value,
            }) => {
                assert_eq!(locator, "workspace_into_board");
                assert_eq!(placeholder, "board");
                assert_eq!(value, r#"The "big" one"#);
            }
            other => panic!("expected InvalidPlaceholderValue, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_allows_single_quote_in_value() {
        let table = LocatorTable::board_app();
        let xpath = table
            .resolve("workspace_into_board", &vars(&[("board", "Alex's board")]))
            .unwrap();
        assert!(xpath.contains(r#"contains(@title,"Alex's board")"#));
    }

    #[test]
    fn test_unknown_locator() {
        let table = LocatorTable::board_app();
        assert!(matches!(
            table.get("no_such_button"),
            Err(E2eError::UnknownLocator(name)) if name == "no_such_button"
        ));
    }

    #[test_case("login_submit", r#"xpath=//*[@id="login-submit"]/span"# ; "named")]
    #[test_case("//div[@id='x']", "xpath=//div[@id='x']" ; "raw xpath")]
    #[test_case("css=.card", "css=.card" ; "css passthrough")]
    fn test_selector(target: &str, expected: &str) {
        let table = LocatorTable::board_app();
        assert_eq!(table.selector(target, &LocatorVars::new()).unwrap(), expected);
    }

    #[test]
    fn test_yaml_overrides_replace_and_add() {
        let mut table = LocatorTable::board_app();
        let before = table.len();
        let overrides = LocatorTable::from_yaml(
            r#"
login_submit: '//button[@id="login"]'
archive_card: '//button[contains(@data-testid,"card-back-archive")]'
"#,
        )
        .unwrap();

        table.merge(overrides);

        assert_eq!(table.len(), before + 1);
        assert_eq!(table.get("login_submit").unwrap(), r#"//button[@id="login"]"#);
        assert!(table.get("archive_card").is_ok());
    }
}
