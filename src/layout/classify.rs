//! Class-name based node classification.

use super::hierarchy::ViewNode;
use serde::Serialize;
use std::fmt;

/// Containers that report `clickable="true"` but are never a tap target.
const SCROLL_CONTAINER_CLASSES: &[&str] = &["android.widget.ListView", "android.widget.GridView"];

const EDIT_TEXT: &str = "android.widget.EditText";
const SWITCH: &str = "android.widget.Switch";
const CHECKBOX: &str = "android.widget.CheckBox";
const IMAGE_VIEW: &str = "android.widget.ImageView";
pub(crate) const TEXT_VIEW: &str = "android.widget.TextView";

bitflags::bitflags! {
    /// Interaction-relevant traits of a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeTraits: u8 {
        const CLICKABLE        = 1 << 0;
        const EDITABLE         = 1 << 1;
        const SWITCH           = 1 << 2;
        const CHECKBOX         = 1 << 3;
        const IMAGE            = 1 << 4;
        const LAYOUT           = 1 << 5;
        const SCROLL_CONTAINER = 1 << 6;
    }
}

impl NodeTraits {
    pub fn of(node: &ViewNode) -> Self {
        let mut traits = NodeTraits::empty();
        if is_clickable(node) {
            traits |= NodeTraits::CLICKABLE;
        }
        if is_editable(node) {
            traits |= NodeTraits::EDITABLE;
        }
        if is_switch(node) {
            traits |= NodeTraits::SWITCH;
        }
        if is_checkbox(node) {
            traits |= NodeTraits::CHECKBOX;
        }
        if is_image(node) {
            traits |= NodeTraits::IMAGE;
        }
        if is_layout(node) {
            traits |= NodeTraits::LAYOUT;
        }
        if is_scroll_container(node) {
            traits |= NodeTraits::SCROLL_CONTAINER;
        }
        traits
    }

    /// Clickable or editable: a node whose label must not leak into its container.
    pub fn is_interactive(self) -> bool {
        self.intersects(NodeTraits::CLICKABLE | NodeTraits::EDITABLE)
    }
}

/// What a user can do with a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Button,
    Input,
    Switch,
    Checkbox,
    Image,
    Other,
}

impl WidgetKind {
    pub fn of(node: &ViewNode) -> Self {
        let traits = NodeTraits::of(node);
        if traits.contains(NodeTraits::EDITABLE) {
            WidgetKind::Input
        } else if traits.contains(NodeTraits::SWITCH) {
            WidgetKind::Switch
        } else if traits.contains(NodeTraits::CHECKBOX) {
            WidgetKind::Checkbox
        } else if traits.contains(NodeTraits::IMAGE) {
            WidgetKind::Image
        } else if traits.contains(NodeTraits::CLICKABLE) {
            WidgetKind::Button
        } else {
            WidgetKind::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::Button => "button",
            WidgetKind::Input => "input",
            WidgetKind::Switch => "switch",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Image => "image",
            WidgetKind::Other => "other",
        }
    }

    /// Phrase used in one-line widget descriptions.
    pub fn describe(self) -> &'static str {
        match self {
            WidgetKind::Button => "button",
            WidgetKind::Input => "input box",
            WidgetKind::Switch => "switch button",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Image => "image",
            WidgetKind::Other => "other",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clickable flag set, not a scrolling container, not an input field.
pub fn is_clickable(node: &ViewNode) -> bool {
    node.flag("clickable") && !is_scroll_container(node) && !is_editable(node)
}

pub fn is_editable(node: &ViewNode) -> bool {
    node.class() == EDIT_TEXT
}

pub fn is_switch(node: &ViewNode) -> bool {
    node.class() == SWITCH
}

pub fn is_checkbox(node: &ViewNode) -> bool {
    node.class() == CHECKBOX
}

pub fn is_image(node: &ViewNode) -> bool {
    node.class() == IMAGE_VIEW
}

pub fn is_layout(node: &ViewNode) -> bool {
    node.class().ends_with("Layout")
}

pub fn is_scroll_container(node: &ViewNode) -> bool {
    SCROLL_CONTAINER_CLASSES.contains(&node.class())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(class: &str, clickable: bool) -> ViewNode {
        let mut attrs = std::collections::BTreeMap::new();
        attrs.insert("class".to_string(), class.to_string());
        attrs.insert("clickable".to_string(), clickable.to_string());
        ViewNode { attrs, parent: None, children: Vec::new() }
    }

    #[test]
    fn clickable_excludes_lists_and_inputs() {
        assert!(is_clickable(&node("android.widget.Button", true)));
        assert!(!is_clickable(&node("android.widget.Button", false)));
        assert!(!is_clickable(&node("android.widget.ListView", true)));
        assert!(!is_clickable(&node("android.widget.GridView", true)));
        assert!(!is_clickable(&node(EDIT_TEXT, true)));
    }

    #[test]
    fn widget_kind_precedence() {
        assert_eq!(WidgetKind::of(&node(EDIT_TEXT, true)), WidgetKind::Input);
        assert_eq!(WidgetKind::of(&node(SWITCH, true)), WidgetKind::Switch);
        assert_eq!(WidgetKind::of(&node(CHECKBOX, true)), WidgetKind::Checkbox);
        assert_eq!(WidgetKind::of(&node(IMAGE_VIEW, true)), WidgetKind::Image);
        assert_eq!(WidgetKind::of(&node("android.widget.Button", true)), WidgetKind::Button);
        assert_eq!(WidgetKind::of(&node("android.widget.TextView", false)), WidgetKind::Other);
    }

    #[test]
    fn traits_combine() {
        let traits = NodeTraits::of(&node("android.widget.LinearLayout", true));
        assert_eq!(traits, NodeTraits::CLICKABLE | NodeTraits::LAYOUT);
        assert!(traits.is_interactive());
        assert!(!NodeTraits::of(&node(TEXT_VIEW, false)).is_interactive());
    }
}
