//! Focusability rules
//!
//! Mirrors the selector used for focus traps:
//! `button, [href], input, select, textarea, [tabindex]:not([tabindex="-1"])`.

use crate::ElementData;

/// Selector matched by [`is_tabbable`], kept for diagnostics
pub const TABBABLE_SELECTOR: &str =
    "button, [href], input, select, textarea, [tabindex]:not([tabindex=\"-1\"])";

const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea"];

fn parse_tabindex(el: &ElementData) -> Option<i32> {
    el.get_attr("tabindex").and_then(|v| v.trim().parse().ok())
}

/// Element participates in Tab order (matches the trap selector and is enabled)
pub fn is_tabbable(el: &ElementData) -> bool {
    if el.has_attr("disabled") {
        return false;
    }
    FORM_CONTROLS.contains(&el.tag.as_str())
        || el.has_attr("href")
        || parse_tabindex(el).is_some_and(|t| t >= 0)
}

/// Element can receive focus programmatically (Tab order or `tabindex="-1"`)
pub fn is_focusable(el: &ElementData) -> bool {
    if el.has_attr("disabled") {
        return false;
    }
    is_tabbable(el) || parse_tabindex(el).is_some()
}
