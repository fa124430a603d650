//! Owned UI-hierarchy tree.
//!
//! uiautomator dumps are XML documents of nested `<node>` elements under a
//! `<hierarchy>` root. The document is read once with `roxmltree` and copied
//! into an index-based arena so that screens own their data and nodes can be
//! addressed by a plain [`NodeId`] (parent, children and siblings are all
//! index lookups).
//!
//! ```text
//! <hierarchy>                 roots: [0]
//!   <node class=Frame>        0  parent=None  children=[1, 2]
//!     <node class=Text/>      1  parent=0
//!     <node class=Button/>    2  parent=0
//! ```

use super::geometry::Bounds;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Index of a node inside its [`Hierarchy`].
pub type NodeId = usize;

/// One `<node>` element and its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewNode {
    pub attrs: BTreeMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl ViewNode {
    /// Attribute value, or `""` when absent (uiautomator always emits the
    /// common attributes, so absence and emptiness are treated alike).
    pub fn attr(&self, name: &str) -> &str {
        self.attrs.get(name).map(String::as_str).unwrap_or("")
    }

    /// `true` iff the attribute is the literal string `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.attr(name) == "true"
    }

    pub fn text(&self) -> &str {
        self.attr("text")
    }

    pub fn class(&self) -> &str {
        self.attr("class")
    }

    pub fn resource_id(&self) -> &str {
        self.attr("resource-id")
    }

    pub fn content_desc(&self) -> &str {
        self.attr("content-desc")
    }

    pub fn package(&self) -> &str {
        self.attr("package")
    }

    pub fn bounds(&self) -> Result<Bounds> {
        self.attr("bounds").parse()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of [`ViewNode`]s in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    nodes: Vec<ViewNode>,
    roots: Vec<NodeId>,
}

impl Hierarchy {
    /// Parse a uiautomator XML dump.
    ///
    /// Fails on XML syntax errors, on an unexpected root element and on a
    /// document without any `<node>`.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| Error::snapshot(format!("malformed hierarchy: {e}")))?;
        let root = doc.root_element();
        let root_name = root.tag_name().name();
        if root_name != "hierarchy" && root_name != "node" {
            return Err(Error::snapshot(format!("unexpected root element <{root_name}>")));
        }

        let mut hierarchy = Hierarchy { nodes: Vec::new(), roots: Vec::new() };
        hierarchy.collect(root, None);
        if hierarchy.nodes.is_empty() {
            return Err(Error::snapshot("hierarchy contains no nodes"));
        }
        Ok(hierarchy)
    }

    fn collect(&mut self, element: roxmltree::Node<'_, '_>, parent: Option<NodeId>) {
        let mut owner = parent;
        if element.tag_name().name() == "node" {
            let id = self.nodes.len();
            let attrs = element.attributes().map(|a| (a.name().to_string(), a.value().to_string())).collect();
            self.nodes.push(ViewNode { attrs, parent, children: Vec::new() });
            match parent {
                Some(p) => self.nodes[p].children.push(id),
                None => self.roots.push(id),
            }
            owner = Some(id);
        }
        for child in element.children().filter(|c| c.is_element()) {
            self.collect(child, owner);
        }
    }

    pub fn node(&self, id: NodeId) -> &ViewNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All nodes with their ids, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ViewNode)> {
        self.nodes.iter().enumerate()
    }

    /// Nodes without children.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &ViewNode)> {
        self.iter().filter(|(_, n)| n.is_leaf())
    }

    /// Other children of the same parent (other roots for a root node).
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        let peers = match self.nodes[id].parent {
            Some(p) => &self.nodes[p].children,
            None => &self.roots,
        };
        peers.iter().copied().filter(|&s| s != id).collect()
    }

    /// Area covered by the top-level nodes.
    pub fn screen_bounds(&self) -> Result<Bounds> {
        let mut covered: Option<Bounds> = None;
        for &root in &self.roots {
            let b = self.nodes[root].bounds()?;
            covered = Some(covered.map_or(b, |c| c.union(&b)));
        }
        covered.ok_or_else(|| Error::snapshot("hierarchy has no top-level node"))
    }

    /// Whether a node with exactly the same attributes is part of this tree.
    pub fn contains_node(&self, node: &ViewNode) -> bool {
        self.nodes.iter().any(|n| n.attrs == node.attrs)
    }

    /// Whether any node carries one of the given resource ids.
    pub fn has_resource_id(&self, ids: &[String]) -> bool {
        self.nodes.iter().any(|n| ids.iter().any(|id| n.resource_id() == id))
    }

    /// XPath-like location, e.g. `/hierarchy/node[1]/node[3]` (1-based).
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let parent = self.nodes[cur].parent;
            let peers = match parent {
                Some(p) => &self.nodes[p].children,
                None => &self.roots,
            };
            let position = peers.iter().position(|&p| p == cur).unwrap_or(0) + 1;
            segments.push(format!("node[{position}]"));
            current = parent;
        }
        segments.reverse();
        format!("/hierarchy/{}", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node index="0" text="" class="android.widget.FrameLayout" package="com.example" bounds="[0,0][1080,1920]">
    <node index="0" text="Title" class="android.widget.TextView" package="com.example" bounds="[10,10][500,100]" />
    <node index="1" text="OK" resource-id="com.example:id/btn_ok" class="android.widget.Button" package="com.example" clickable="true" bounds="[600,10][900,100]" />
  </node>
</hierarchy>"#;

    #[test]
    fn builds_arena_in_document_order() {
        let h = Hierarchy::from_xml(DUMP).unwrap();
        assert_eq!(h.len(), 3);
        assert_eq!(h.roots(), &[0]);
        assert_eq!(h.node(0).children, vec![1, 2]);
        assert_eq!(h.node(2).parent, Some(0));
        assert_eq!(h.node(2).resource_id(), "com.example:id/btn_ok");
        assert!(h.node(2).flag("clickable"));
        assert!(!h.node(1).flag("clickable"));
        assert_eq!(h.node(1).attr("missing"), "");
    }

    #[test]
    fn navigation_helpers() {
        let h = Hierarchy::from_xml(DUMP).unwrap();
        assert_eq!(h.siblings(1), vec![2]);
        assert_eq!(h.siblings(0), Vec::<NodeId>::new());
        assert_eq!(h.leaves().map(|(id, _)| id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(h.screen_bounds().unwrap(), Bounds::new(0, 0, 1080, 1920));
        assert_eq!(h.path(2), "/hierarchy/node[1]/node[2]");
        assert!(h.has_resource_id(&["com.example:id/btn_ok".to_string()]));
    }

    #[test]
    fn structural_errors_are_reported() {
        assert!(Hierarchy::from_xml("<hierarchy><node></hierarchy>").is_err());
        assert!(Hierarchy::from_xml("<hierarchy rotation=\"0\"></hierarchy>").is_err());
        assert!(Hierarchy::from_xml("<html><node bounds=\"[0,0][1,1]\"/></html>").is_err());
    }
}
