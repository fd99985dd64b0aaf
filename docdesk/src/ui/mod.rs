//! UI rendering for docdesk.
//!
//! `render()` is the single entry point called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic and the tab/status chrome live
//! in `layout.rs`; each view has its own module.

mod layout;
pub mod analysis_view;
pub mod chat_view;
pub mod flow_view;
pub mod help;
pub mod keybindings;

use ratatui::Frame;

use docdesk_core::{View, Workspace};

use crate::app::{AppState, Mode};
use layout::{compute_layout, inner_rect, render_status_bar, render_tabs};

/// Renders one complete frame: tabs, the active view, status bar, overlays.
///
/// Tab cells and the viewport height are written back into `state` so that the
/// next mouse click and half-page scroll use this frame's geometry.
pub fn render(frame: &mut Frame, state: &mut AppState, workspace: &Workspace) {
    let theme = state.theme.theme().clone();
    let [tabs, main, status_bar] = compute_layout(frame);

    state.tab_rects = render_tabs(frame, tabs, workspace, &theme);
    state.viewport_height = inner_rect(main).height;

    match workspace.view() {
        View::Analysis => analysis_view::render(frame, main, state, workspace, &theme),
        View::Chat => chat_view::render(frame, main, state, workspace, &theme),
        View::Flow => flow_view::render(frame, main, state, workspace, &theme),
    }

    render_status_bar(frame, status_bar, state, workspace, &theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, &theme, state.help_scroll),
        Mode::ConfirmClear => help::render_confirm_clear(frame, &theme, workspace.history().len()),
        _ => {}
    }
}
