//! Platform abstraction traits for the control's collaborators.
//!
//! These traits define the interface between the control state machines and
//! the platform they run on (browser DOM, the rich text engine, modal dialogs,
//! network). The browser crate implements them over `web-sys`; tests use
//! in-memory fakes.
//!
//! Collaborators must never call the control's public commands from inside
//! one of these methods. Anything they need to report goes through the
//! control's notification entry points (`notify_*`, the engine event sink),
//! which queue work when the control is busy.

use serde::Serialize;
use smol_str::SmolStr;

use crate::types::{ControlId, Size};

/// Editor DOM sub-elements the control depends on once the editor is ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DomPart {
    /// Outermost editor container.
    Outer,
    Inner,
    /// Toolbar container when the toolbar is placed at the top.
    Top,
    /// Bottom bar: toolbar placed at the bottom, or the resize handle.
    Bottom,
    /// Content area wrapping the editable element.
    Content,
    Editable,
}

/// Handle for a registered DOM observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// What a DOM observer waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// Root element becomes part of a live document.
    Attached,
    /// Root element changes in a way that may affect its visibility or size.
    Mutation,
}

/// Where document focus currently is, relative to one control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomFocus {
    /// The native input or textarea.
    Input,
    /// The control's root element itself.
    Container,
    /// Some element inside the root (editor surface, toolbar button).
    Within,
    /// `<body>`, i.e. nothing in particular.
    Body,
    /// Anything else.
    Outside,
}

impl DomFocus {
    pub fn within_root(&self) -> bool {
        matches!(self, DomFocus::Input | DomFocus::Container | DomFocus::Within)
    }
}

/// Inline style properties the control manipulates on editor parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Height,
    MinHeight,
    MaxHeight,
    Display,
    Visibility,
}

/// The control's root element and its native input.
pub trait ControlDom {
    fn is_attached(&self) -> bool;

    /// Attached, displayed and measurable.
    fn is_visible(&self) -> bool;

    /// Register an observer. Returns `None` when the platform has no such
    /// primitive, in which case the caller falls back to polling.
    fn observe(&self, what: Observation, callback: Box<dyn Fn()>) -> Option<ObserverId>;

    fn unobserve(&self, id: ObserverId);

    fn focus(&self) -> DomFocus;

    fn focus_input(&self);

    /// Focus the root element (focusable with tab index -1 in design mode).
    fn focus_container(&self);

    /// Blur the focused element if it is within the root.
    fn blur(&self);

    fn input_value(&self) -> String;

    fn set_input_value(&self, value: &str);

    /// Swap between `<input>` and `<textarea>`, carrying value, placeholder,
    /// spellcheck and disabled state across.
    fn set_multi_line(&self, multi_line: bool);

    fn set_input_enabled(&self, enabled: bool);

    /// Show or hide the root element.
    fn set_visible(&self, visible: bool);

    fn set_placeholder(&self, placeholder: &str);

    fn set_spellcheck(&self, spellcheck: bool);

    /// Set or remove a `data-*` attribute on the root element.
    fn set_data(&self, name: &str, value: Option<&str>);

    fn set_tab_index(&self, index: Option<i32>);

    fn set_width(&self, width: Size);

    fn set_height(&self, height: Size);

    /// Drop inline width/height left behind by native textarea resizing.
    fn reset_input_size(&self);

    /// Rendered height of the root element in pixels, 0 when hidden.
    fn offset_height(&self) -> f64;

    /// Mount the root element outside the visible viewport. The engine
    /// requires a mounted element to finish initialization.
    fn park_offscreen(&self);

    /// Remove the root element from the document.
    fn remove(&self);
}

/// A live editor instance created by the engine.
pub trait EditorInstance {
    fn destroy(&self);

    fn set_data(&self, html: &str);

    fn data(&self) -> String;

    fn resize(&self, width: Size, height: Size);

    fn set_read_only(&self, read_only: bool);

    fn focus(&self);

    /// Whether a DOM sub-element exists.
    fn has_part(&self, part: DomPart) -> bool;

    fn set_style(&self, part: DomPart, property: StyleProperty, value: Option<&str>);

    fn offset_height(&self, part: DomPart) -> f64;

    fn set_part_data(&self, part: DomPart, name: &str, value: Option<&str>);

    /// Make the editable element reachable by keyboard, or not.
    fn set_tabbable(&self, tabbable: bool);

    /// Toolbar commands with their enabled state.
    fn commands(&self) -> Vec<(SmolStr, bool)>;

    fn set_command_enabled(&self, command: &str, enabled: bool);

    fn execute(&self, command: &str);

    /// Insert the informational panel next to the content area.
    fn show_info_panel(&self, html: &str, alignment: &str, above_content: bool);
}

/// A modal sub-dialog opened by the engine (link, image, table).
pub trait DialogHandle {
    fn hide(&self);

    fn contains_focus(&self) -> bool;
}

/// A toolbar drop-down panel (emoji picker) shared by all editors.
pub trait ToolbarPanel {
    fn is_open(&self) -> bool;

    /// Record which editor opened the panel.
    fn claim(&self, owner: &ControlId);

    fn owner(&self) -> Option<ControlId>;

    fn contains_focus(&self) -> bool;
}

/// Releases blob URLs created for embedded images.
pub trait BlobRevoker {
    fn revoke(&self, url: &str);
}

/// Asks the user to confirm a destructive action.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str, done: Box<dyn FnOnce(bool)>);
}
