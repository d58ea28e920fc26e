//! Transient UI state: modals, the column context menu, and the error banner.

use serde::Serialize;

use crate::types::TaskDraft;

/// Single-slot error banner. The latest failure overwrites the previous
/// one. Dismissal is either immediate or two-phase: the banner is marked
/// closing while its exit transition plays and cleared when the transition
/// reports completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBanner {
    message: Option<String>,
    closing: bool,
    generation: u64,
}

/// Identifies the banner a dismissal transition was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissToken(u64);

impl ErrorBanner {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub(crate) fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.closing = false;
        self.generation += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.message = None;
        self.closing = false;
    }

    pub(crate) fn begin_dismiss(&mut self) -> Option<DismissToken> {
        self.message.as_ref()?;
        self.closing = true;
        Some(DismissToken(self.generation))
    }

    /// Clear the banner the token belongs to. A message that replaced it
    /// while the transition was running stays visible.
    pub(crate) fn finish_dismiss(&mut self, token: DismissToken) -> bool {
        if self.closing && token.0 == self.generation {
            self.clear();
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenu {
    pub column_id: String,
    pub x: f64,
    pub y: f64,
}

/// Edit-column form, seeded from the context menu selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnEdit {
    pub column_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub(crate) error: ErrorBanner,
    /// Open add-task modal with its draft.
    pub(crate) add_task: Option<TaskDraft>,
    /// Open add-column modal with its title field.
    pub(crate) add_column: Option<String>,
    /// The context menu also owns the outside-click registration: it exists
    /// exactly as long as the menu is open.
    pub(crate) context_menu: Option<ContextMenu>,
    pub(crate) edit_column: Option<ColumnEdit>,
}

impl UiState {
    pub fn error(&self) -> &ErrorBanner {
        &self.error
    }

    pub fn add_task_draft(&self) -> Option<&TaskDraft> {
        self.add_task.as_ref()
    }

    pub fn add_column_title(&self) -> Option<&str> {
        self.add_column.as_deref()
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    pub fn column_edit(&self) -> Option<&ColumnEdit> {
        self.edit_column.as_ref()
    }

    /// Whether an outside click should be routed to the menu.
    pub fn outside_click_armed(&self) -> bool {
        self.context_menu.is_some()
    }

    pub(crate) fn open_context_menu(&mut self, column_id: &str, x: f64, y: f64) {
        self.context_menu = Some(ContextMenu {
            column_id: column_id.to_string(),
            x,
            y,
        });
    }

    /// Close the menu and release its outside-click registration.
    pub(crate) fn close_context_menu(&mut self) -> Option<ContextMenu> {
        self.context_menu.take()
    }

    pub(crate) fn selected_column(&self) -> Option<&str> {
        self.context_menu.as_ref().map(|m| m.column_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_error_wins() {
        let mut banner = ErrorBanner::default();
        banner.show("first");
        banner.show("second");
        assert_eq!(banner.message(), Some("second"));
    }

    #[test]
    fn test_animated_dismissal() {
        let mut banner = ErrorBanner::default();
        banner.show("boom");
        let token = banner.begin_dismiss().unwrap();
        assert!(banner.is_closing());
        assert_eq!(banner.message(), Some("boom"));
        assert!(banner.finish_dismiss(token));
        assert_eq!(banner.message(), None);
    }

    #[test]
    fn test_dismissal_keeps_newer_message() {
        let mut banner = ErrorBanner::default();
        banner.show("old");
        let token = banner.begin_dismiss().unwrap();
        banner.show("new");
        assert!(!banner.finish_dismiss(token));
        assert_eq!(banner.message(), Some("new"));
        assert!(!banner.is_closing());
    }

    #[test]
    fn test_dismiss_without_message() {
        let mut banner = ErrorBanner::default();
        assert!(banner.begin_dismiss().is_none());
    }

    #[test]
    fn test_context_menu_arms_outside_click() {
        let mut ui = UiState::default();
        assert!(!ui.outside_click_armed());
        ui.open_context_menu("done", 10.0, 20.0);
        assert!(ui.outside_click_armed());
        assert_eq!(ui.selected_column(), Some("done"));
        ui.close_context_menu();
        assert!(!ui.outside_click_armed());
    }
}
