//! Board app page flows
//!
//! [`BoardPage`] records the steps a person would take in the web app, using
//! locator names from [`LocatorTable::board_app`](crate::locator::LocatorTable::board_app).
//! Nothing runs until the steps are handed to a [`PlaywrightHandle`](crate::playwright::PlaywrightHandle).

use taskboard_common::UiSettings;

use crate::locator::LocatorVars;
use crate::spec::{Scenario, UiStep, Viewport};

/// Step recorder for the board web app
#[derive(Debug, Clone, Default)]
pub struct BoardPage {
    timeout_ms: Option<u64>,
    steps: Vec<UiStep>,
}

impl BoardPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait used by every recorded step instead of the driver default
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn steps(&self) -> &[UiStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<UiStep> {
        self.steps
    }

    // Operators

    /// Wait until `name` is clickable, then click it
    pub fn click_button(&mut self, name: &str) -> &mut Self {
        self.steps.push(UiStep::Click {
            target: name.to_string(),
            timeout_ms: self.timeout_ms,
        });
        self
    }

    /// Wait until `name` is visible, then type `text` into it
    pub fn send_keys_to_element(&mut self, name: &str, text: &str) -> &mut Self {
        self.steps.push(UiStep::Type {
            target: name.to_string(),
            text: text.to_string(),
            timeout_ms: self.timeout_ms,
        });
        self
    }

    /// Wait until `name` is present, then move the mouse over it
    pub fn move_mouse_to_element(&mut self, name: &str) -> &mut Self {
        self.steps.push(UiStep::Hover {
            target: name.to_string(),
            timeout_ms: self.timeout_ms,
        });
        self
    }

    pub fn goto(&mut self, url: &str) -> &mut Self {
        self.steps.push(UiStep::Goto {
            url: url.to_string(),
        });
        self
    }

    /// Check that `name` shows exactly `text`
    pub fn expect_text(&mut self, name: &str, text: &str) -> &mut Self {
        self.steps.push(UiStep::AssertText {
            target: name.to_string(),
            text: Some(text.to_string()),
            contains: None,
            timeout_ms: self.timeout_ms,
        });
        self
    }

    pub fn screenshot(&mut self, name: &str) -> &mut Self {
        self.steps.push(UiStep::Screenshot {
            name: name.to_string(),
            full_page: false,
        });
        self
    }

    // Flows

    pub fn login(&mut self, url: &str, email: &str, password: &str) -> &mut Self {
        self.goto(url)
            .send_keys_to_element("input_email", email)
            .click_button("login_submit")
            .send_keys_to_element("input_password", password)
            .click_button("login_submit")
    }

    /// Open the workspace named by the `workspace` variable
    pub fn into_workspace(&mut self) -> &mut Self {
        self.click_button("workspace_switcher")
            .click_button("into_workspace")
    }

    pub fn create_board(&mut self, title: &str) -> &mut Self {
        self.click_button("create_board_button")
            .send_keys_to_element("input_board_title", title)
            .click_button("create_board_submit")
    }

    /// Close and permanently delete the board named by the `board` variable
    pub fn delete_board(&mut self) -> &mut Self {
        self.move_mouse_to_element("board_overflow_menu")
            .click_button("board_overflow_menu")
            .click_button("close_board")
            .click_button("confirm_close_board")
            .click_button("check_closed_board")
            .click_button("delete_board")
            .click_button("delete_board_confirm")
            .click_button("leave_closed_board")
    }

    pub fn create_list(&mut self, name: &str) -> &mut Self {
        self.click_button("create_list_button")
            .send_keys_to_element("new_listname_input", name)
            .click_button("create_list_submit")
    }

    /// Archive the list named by the `list` variable
    pub fn archive_list(&mut self) -> &mut Self {
        self.click_button("list_overflow_menu")
            .click_button("archive_list_button")
    }

    /// Add a card to the list named by the `list` variable
    pub fn create_card(&mut self, name: &str) -> &mut Self {
        self.click_button("create_card_button")
            .send_keys_to_element("new_cardname_input", name)
            .click_button("create_card_submit")
    }

    /// Open the card named by the `card` variable and set its description
    pub fn add_card_description(&mut self, text: &str) -> &mut Self {
        self.click_button("card_button")
            .click_button("add_description_button")
            .send_keys_to_element("card_description_textarea", text)
            .click_button("description_save_button")
            .expect_text("card_description", text)
    }

    /// Add a checklist to the open card
    pub fn create_checklist(&mut self) -> &mut Self {
        self.click_button("create_checklist_button")
            .click_button("create_checklist_submit")
    }
}

/// Names the board lifecycle scenario creates and cleans up
#[derive(Debug, Clone)]
pub struct BoardNames {
    pub board: String,
    pub list: String,
    pub card: String,
    pub description: String,
}

impl Default for BoardNames {
    fn default() -> Self {
        Self {
            board: taskboard_common::config::DEFAULT_BOARD_NAME.to_string(),
            list: "Test list".to_string(),
            card: "Test card".to_string(),
            description: "Created by the e2e suite".to_string(),
        }
    }
}

/// Scenario variables taken from the `[ui]` settings
pub fn settings_vars(settings: &UiSettings) -> LocatorVars {
    [
        ("login_url", settings.login_url.as_str()),
        ("email", settings.email.as_str()),
        ("password", settings.password.as_str()),
        ("workspace", settings.workspace.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Log in, build a board with a list, card and checklist, then delete it
pub fn board_lifecycle(settings: &UiSettings, names: &BoardNames) -> Scenario {
    let mut page = BoardPage::new();
    page.login(&settings.login_url, &settings.email, &settings.password)
        .into_workspace()
        .create_board(&names.board)
        .create_list(&names.list)
        .create_card(&names.card)
        .add_card_description(&names.description)
        .create_checklist()
        .screenshot("board-lifecycle")
        .goto(&settings.login_url)
        .into_workspace()
        .delete_board();

    let mut vars = settings_vars(settings);
    vars.insert("board".to_string(), names.board.clone());
    vars.insert("list".to_string(), names.list.clone());
    vars.insert("card".to_string(), names.card.clone());

    Scenario {
        name: "board-lifecycle".to_string(),
        description: "Create a board with a list, card and checklist, then delete it".to_string(),
        tags: vec!["board".to_string(), "ui".to_string()],
        vars,
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        steps: page.into_steps(),
    }
}
