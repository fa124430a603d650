//! Text extraction for views.
//!
//! A view's visible label is often not on the view itself: icon buttons carry
//! their caption on an adjacent `TextView`, input fields are labelled by nearby
//! static text, and containers wrap the text views that describe them. This
//! module gathers those texts so similarity predicates can compare a widget to
//! the words used in a bug report.
//!
//! ```text
//! own text ─┬─ input field?  ── non-interactive sibling texts
//!           ├─ otherwise     ── sole TextView sibling as label (icon buttons)
//!           └─ descendants   ── stop at nested clickable/editable views
//! ```

use super::classify::{NodeTraits, TEXT_VIEW, WidgetKind, is_editable};
use super::hierarchy::{Hierarchy, NodeId};
use std::collections::BTreeSet;

/// Texts of non-interactive siblings of an input field, plus its own text.
pub fn sibling_texts(hierarchy: &Hierarchy, id: NodeId) -> BTreeSet<String> {
    let mut texts = BTreeSet::new();
    for sibling in hierarchy.siblings(id) {
        let node = hierarchy.node(sibling);
        if node.text().is_empty() || NodeTraits::of(node).is_interactive() {
            continue;
        }
        texts.insert(node.text().trim().to_string());
    }
    insert_trimmed(&mut texts, hierarchy.node(id).text());
    texts
}

/// Caption of an unlabelled view whose only sibling is a static text label.
pub fn label_sibling_text(hierarchy: &Hierarchy, id: NodeId) -> Option<String> {
    let node = hierarchy.node(id);
    if !node.text().is_empty() || !node.content_desc().is_empty() {
        return None;
    }
    let siblings = hierarchy.siblings(id);
    let [sibling] = siblings.as_slice() else {
        return None;
    };
    let label = hierarchy.node(*sibling);
    let is_label = label.class() == TEXT_VIEW && label.attr("clickable") == "false" && !label.text().is_empty();
    is_label.then(|| label.text().to_string())
}

/// Own text plus descendant texts, skipping subtrees rooted at another
/// clickable or editable view.
pub fn descendant_texts(hierarchy: &Hierarchy, id: NodeId) -> BTreeSet<String> {
    let mut texts = BTreeSet::new();
    collect_descendants(hierarchy, id, &mut texts);
    texts
}

fn collect_descendants(hierarchy: &Hierarchy, id: NodeId, texts: &mut BTreeSet<String>) {
    let node = hierarchy.node(id);
    insert_trimmed(texts, node.text());
    for &child in &node.children {
        if NodeTraits::of(hierarchy.node(child)).is_interactive() {
            continue;
        }
        collect_descendants(hierarchy, child, texts);
    }
}

/// All texts related to a view: its own, its label sibling(s) and its descendants.
pub fn view_texts(hierarchy: &Hierarchy, id: NodeId) -> BTreeSet<String> {
    let node = hierarchy.node(id);
    let mut texts = BTreeSet::new();
    insert_trimmed(&mut texts, node.text());
    if is_editable(node) {
        texts.extend(sibling_texts(hierarchy, id));
    } else if let Some(label) = label_sibling_text(hierarchy, id) {
        insert_trimmed(&mut texts, &label);
    }
    texts.extend(descendant_texts(hierarchy, id));
    texts
}

/// Full textual representation: view texts, content description and the
/// normalized resource id, deduplicated and sorted, without empty entries.
pub fn textual_representation(hierarchy: &Hierarchy, id: NodeId) -> Vec<String> {
    let node = hierarchy.node(id);
    let mut texts = view_texts(hierarchy, id);
    insert_trimmed(&mut texts, node.content_desc());
    insert_trimmed(&mut texts, &normalize_resource_id(node.resource_id()));
    texts.into_iter().collect()
}

/// `com.app:id/add_to_cart` → `add to cart`, `com.app:id/addToCart` → `add To Cart`.
pub fn normalize_resource_id(resource_id: &str) -> String {
    let name = resource_id.rsplit('/').next().unwrap_or("");
    if name.contains('_') {
        return name.split('_').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
    }
    if name.contains(' ') || !name.chars().any(|c| c.is_uppercase()) {
        return name.to_string();
    }
    let mut words = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            words.push(' ');
        }
        words.push(c);
    }
    words
}

/// One-line summary: `TYPE: button. LABEL: OK. DESC: btn ok; confirm`.
pub fn describe(hierarchy: &Hierarchy, id: NodeId) -> String {
    let node = hierarchy.node(id);
    let kind = WidgetKind::of(node);
    let label: String = view_texts(hierarchy, id).into_iter().collect::<Vec<_>>().join("").replace('\n', "");
    let resource = normalize_resource_id(node.resource_id());
    let desc = [resource.as_str(), node.content_desc()].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>();
    format!("TYPE: {}. LABEL: {}. DESC: {}", kind.describe(), label, desc.join("; "))
}

fn insert_trimmed(texts: &mut BTreeSet<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        texts.insert(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DUMP: &str = r#"<hierarchy rotation="0">
  <node class="android.widget.FrameLayout" text="" clickable="false" package="com.example" bounds="[0,0][1080,1920]">
    <node class="android.widget.LinearLayout" text="" clickable="false" package="com.example" bounds="[0,100][1080,300]">
      <node class="android.widget.TextView" text=" Email " clickable="false" package="com.example" bounds="[0,100][300,200]" />
      <node class="android.widget.EditText" text="me@example.com" resource-id="com.example:id/email_input" clickable="true" package="com.example" bounds="[300,100][1080,200]" />
      <node class="android.widget.Button" text="Clear" clickable="true" package="com.example" bounds="[300,200][1080,300]" />
    </node>
    <node class="android.widget.FrameLayout" text="" clickable="false" package="com.example" bounds="[0,300][1080,500]">
      <node class="android.widget.ImageButton" text="" content-desc="" resource-id="com.example:id/fab" clickable="true" package="com.example" bounds="[900,300][1000,400]" />
      <node class="android.widget.TextView" text="New note" clickable="false" package="com.example" bounds="[600,300][890,400]" />
    </node>
    <node class="android.widget.LinearLayout" text="" resource-id="com.example:id/settingsRow" clickable="true" package="com.example" bounds="[0,500][1080,700]">
      <node class="android.widget.TextView" text="Dark mode" clickable="false" package="com.example" bounds="[0,500][800,700]" />
      <node class="android.widget.Switch" text="ON" clickable="true" package="com.example" bounds="[800,500][1080,700]" />
    </node>
  </node>
</hierarchy>"#;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn input_fields_pick_up_static_sibling_labels() {
        let h = Hierarchy::from_xml(DUMP).unwrap();
        // The sibling button is interactive, so its "Clear" label is excluded.
        assert_eq!(sibling_texts(&h, 3), set(&["Email", "me@example.com"]));
        assert_eq!(view_texts(&h, 3), set(&["Email", "me@example.com"]));
    }

    #[test]
    fn icon_button_borrows_caption_from_sole_sibling() {
        let h = Hierarchy::from_xml(DUMP).unwrap();
        assert_eq!(label_sibling_text(&h, 6), Some("New note".to_string()));
        assert_eq!(textual_representation(&h, 6), vec!["New note".to_string(), "fab".to_string()]);
        // A labelled view does not borrow.
        assert_eq!(label_sibling_text(&h, 4), None);
    }

    #[test]
    fn descendants_stop_at_nested_interactive_views() {
        let h = Hierarchy::from_xml(DUMP).unwrap();
        assert_eq!(descendant_texts(&h, 8), set(&["Dark mode"]));
        assert_eq!(textual_representation(&h, 8), vec!["Dark mode".to_string(), "settings Row".to_string()]);
    }

    #[test]
    fn resource_ids_become_words() {
        assert_eq!(normalize_resource_id("com.app:id/add_to_cart"), "add to cart");
        assert_eq!(normalize_resource_id("com.app:id/addToFavorites"), "add To Favorites");
        assert_eq!(normalize_resource_id("AnHamburger"), "An Hamburger");
        assert_eq!(normalize_resource_id("com.app:id/toolbar"), "toolbar");
        assert_eq!(normalize_resource_id(""), "");
    }

    #[test]
    fn describe_summarises_kind_label_and_ids() {
        let h = Hierarchy::from_xml(DUMP).unwrap();
        assert_eq!(describe(&h, 3), "TYPE: input box. LABEL: Emailme@example.com. DESC: email input");
        assert_eq!(describe(&h, 6), "TYPE: button. LABEL: New note. DESC: fab");
    }
}
