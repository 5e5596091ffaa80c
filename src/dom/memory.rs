//! In-memory implementation of [`Document`] for tests and headless drivers

use super::markup::{self, ParsedElement};
use super::{Document, DocumentError, ElementId, Layout, Rect};
use indexmap::IndexMap;
use std::collections::HashMap;

const DEFAULT_BOX: (f64, f64) = (160.0, 32.0);

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: IndexMap<String, String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    value: Option<String>,
    checked: bool,
}

impl Node {
    fn new(tag: &str, parent: Option<ElementId>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text: String::new(),
            parent,
            children: Vec::new(),
            value: None,
            checked: false,
        }
    }

    fn style(&self) -> HashMap<String, String> {
        self.attributes
            .get("style")
            .map(|s| parse_style(s))
            .unwrap_or_default()
    }
}

fn parse_style(style: &str) -> HashMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            Some((k.trim().to_ascii_lowercase(), v.trim().to_ascii_lowercase()))
        })
        .collect()
}

fn parse_px(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches("!important")
        .trim()
        .trim_end_matches("px")
        .trim()
        .parse()
        .ok()
}

/// Arena-backed element tree
///
/// Layout is derived from inline styles: `display:none`, a `hidden`
/// attribute or `type="hidden"` take an element (and its subtree) out of
/// layout; `width`/`height`/`left`/`top` in px place its box.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: HashMap<ElementId, Node>,
    root: ElementId,
    next_id: u64,
    focused: Option<ElementId>,
    viewport: Rect,
}

impl MemoryDocument {
    /// Create an empty document with a bare `<body>`
    pub fn new() -> Self {
        let root = ElementId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new("body", None));
        Self {
            nodes,
            root,
            next_id: 1,
            focused: None,
            viewport: Rect::new(0.0, 0.0, 1280.0, 800.0),
        }
    }

    /// Create a document whose body holds `markup`
    pub fn from_markup(markup: &str) -> Result<Self, DocumentError> {
        let mut doc = Self::new();
        let root = doc.root;
        doc.insert_markup(root, markup)?;
        Ok(doc)
    }

    pub fn with_viewport(mut self, viewport: Rect) -> Self {
        self.viewport = viewport;
        self
    }

    /// Number of attached elements, body included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn node(&self, el: ElementId) -> Result<&Node, DocumentError> {
        self.nodes.get(&el).ok_or(DocumentError::UnknownElement(el))
    }

    fn node_mut(&mut self, el: ElementId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(&el)
            .ok_or(DocumentError::UnknownElement(el))
    }

    fn allocate(&mut self, tag: &str, parent: ElementId) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(tag, Some(parent)));
        id
    }

    fn link_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
        before: Option<ElementId>,
    ) -> Result<(), DocumentError> {
        let siblings = &mut self.node_mut(parent)?.children;
        let index = before
            .and_then(|b| siblings.iter().position(|c| *c == b))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        Ok(())
    }

    fn unlink(&mut self, el: ElementId) -> Result<(), DocumentError> {
        let parent = self.node(el)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|c| *c != el);
        }
        Ok(())
    }

    fn build(&mut self, parent: ElementId, parsed: &ParsedElement) -> Result<ElementId, DocumentError> {
        let id = self.allocate(&parsed.tag, parent);
        self.link_child(parent, id, None)?;
        {
            let node = self.node_mut(id)?;
            for (name, value) in &parsed.attributes {
                node.attributes.insert(name.clone(), value.clone());
            }
            node.text = parsed.text.clone();
        }
        for child in &parsed.children {
            self.build(id, child)?;
        }
        self.initialise_control(id)?;
        Ok(id)
    }

    /// Seed live control state from markup, as a browser does on parse
    fn initialise_control(&mut self, el: ElementId) -> Result<(), DocumentError> {
        let tag = self.node(el)?.tag.clone();
        match tag.as_str() {
            "input" => {
                let node = self.node_mut(el)?;
                let input_type = node
                    .attributes
                    .get("type")
                    .map(|t| t.to_ascii_lowercase())
                    .unwrap_or_default();
                let default = if matches!(input_type.as_str(), "checkbox" | "radio") {
                    "on"
                } else {
                    ""
                };
                node.value = Some(
                    node.attributes
                        .get("value")
                        .cloned()
                        .unwrap_or_else(|| default.to_string()),
                );
                node.checked = node.attributes.contains_key("checked");
            }
            "textarea" => {
                let node = self.node_mut(el)?;
                node.value = Some(node.text.clone());
            }
            "select" => {
                let options = self.option_values(el);
                let chosen = options
                    .iter()
                    .find(|(_, selected)| *selected)
                    .or_else(|| options.first())
                    .map(|(value, _)| value.clone())
                    .unwrap_or_default();
                self.node_mut(el)?.value = Some(chosen);
            }
            _ => {}
        }
        Ok(())
    }

    fn option_values(&self, select: ElementId) -> Vec<(String, bool)> {
        let mut out = Vec::new();
        let mut stack = vec![select];
        while let Some(el) = stack.pop() {
            let Some(node) = self.nodes.get(&el) else {
                continue;
            };
            if node.tag == "option" {
                let value = node
                    .attributes
                    .get("value")
                    .cloned()
                    .unwrap_or_else(|| node.text.trim().to_string());
                out.push((value, node.attributes.contains_key("selected")));
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn drop_subtree(&mut self, el: ElementId) {
        let mut stack = vec![el];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
            if self.focused == Some(current) {
                self.focused = None;
            }
        }
    }

    fn self_displayed(node: &Node) -> bool {
        if node.attributes.contains_key("hidden") {
            return false;
        }
        if node.tag == "input"
            && node
                .attributes
                .get("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        {
            return false;
        }
        !node.style().get("display").is_some_and(|d| d == "none")
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> ElementId {
        self.root
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        let mut stack = vec![self.root];
        while let Some(el) = stack.pop() {
            let node = self.nodes.get(&el)?;
            if node.attributes.get("id").is_some_and(|v| v == id) {
                return Some(el);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    fn contains(&self, el: ElementId) -> bool {
        let mut current = Some(el);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.nodes.get(&node).and_then(|n| n.parent);
        }
        false
    }

    fn tag_name(&self, el: ElementId) -> Option<&str> {
        self.nodes.get(&el).map(|n| n.tag.as_str())
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<&str> {
        self.nodes
            .get(&el)?
            .attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn set_attribute(
        &mut self,
        el: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        self.node_mut(el)?
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) -> Result<(), DocumentError> {
        self.node_mut(el)?
            .attributes
            .shift_remove(&name.to_ascii_lowercase());
        Ok(())
    }

    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.nodes.get(&el)?.parent
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(&el)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn value(&self, el: ElementId) -> Option<&str> {
        let node = self.nodes.get(&el)?;
        match node.tag.as_str() {
            "option" => node
                .attributes
                .get("value")
                .map(String::as_str)
                .or(Some(node.text.trim())),
            _ => node.value.as_deref(),
        }
    }

    fn set_value(&mut self, el: ElementId, value: &str) -> Result<(), DocumentError> {
        self.node_mut(el)?.value = Some(value.to_string());
        Ok(())
    }

    fn is_checked(&self, el: ElementId) -> bool {
        self.nodes.get(&el).is_some_and(|n| n.checked)
    }

    fn set_checked(&mut self, el: ElementId, checked: bool) -> Result<(), DocumentError> {
        let (is_radio, name, parent_form) = {
            let node = self.node(el)?;
            (
                node.attributes
                    .get("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("radio")),
                node.attributes.get("name").cloned(),
                node.parent,
            )
        };
        if checked && is_radio {
            // Checking a radio unchecks its named siblings in the same scope
            if let (Some(name), Some(scope)) = (name, parent_form) {
                let scope = self.scope_root(scope);
                let mut stack = vec![scope];
                while let Some(current) = stack.pop() {
                    if let Some(node) = self.nodes.get_mut(&current) {
                        if node.tag == "input" && node.attributes.get("name") == Some(&name) {
                            node.checked = false;
                        }
                        stack.extend(node.children.clone());
                    }
                }
            }
        }
        self.node_mut(el)?.checked = checked;
        Ok(())
    }

    fn text(&self, el: ElementId) -> String {
        let Some(node) = self.nodes.get(&el) else {
            return String::new();
        };
        let mut out = node.text.clone();
        for child in &node.children {
            out.push_str(&self.text(*child));
        }
        out
    }

    fn set_text(&mut self, el: ElementId, text: &str) -> Result<(), DocumentError> {
        for child in self.children(el) {
            self.unlink(child)?;
            self.drop_subtree(child);
        }
        self.node_mut(el)?.text = text.to_string();
        Ok(())
    }

    fn layout(&self, el: ElementId) -> Layout {
        if !self.contains(el) {
            return Layout::default();
        }
        let mut current = Some(el);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(&id) else {
                return Layout::default();
            };
            if !Self::self_displayed(node) {
                return Layout::default();
            }
            current = node.parent;
        }

        let style = self.nodes.get(&el).map(Node::style).unwrap_or_default();
        let px = |key: &str, fallback: f64| style.get(key).and_then(|v| parse_px(v)).unwrap_or(fallback);
        Layout {
            rect: Rect::new(
                px("left", 0.0),
                px("top", 0.0),
                px("width", DEFAULT_BOX.0),
                px("height", DEFAULT_BOX.1),
            ),
            displayed: true,
        }
    }

    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn focus(&mut self, el: ElementId) -> Result<(), DocumentError> {
        if !self.contains(el) {
            return Err(DocumentError::Detached(el));
        }
        self.focused = Some(el);
        Ok(())
    }

    fn focused(&self) -> Option<ElementId> {
        self.focused.filter(|el| self.contains(*el))
    }

    fn insert_markup(
        &mut self,
        parent: ElementId,
        markup: &str,
    ) -> Result<Vec<ElementId>, DocumentError> {
        self.node(parent)?;
        let parsed = markup::parse_fragment(markup)?;
        parsed.iter().map(|p| self.build(parent, p)).collect()
    }

    fn create_element(
        &mut self,
        tag: &str,
        parent: ElementId,
        before: Option<ElementId>,
    ) -> Result<ElementId, DocumentError> {
        self.node(parent)?;
        let id = self.allocate(tag, parent);
        self.link_child(parent, id, before)?;
        Ok(id)
    }

    fn move_element(
        &mut self,
        el: ElementId,
        parent: ElementId,
        before: Option<ElementId>,
    ) -> Result<(), DocumentError> {
        self.node(el)?;
        self.node(parent)?;
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == el {
                return Err(DocumentError::Cycle { element: el });
            }
            cursor = self.nodes.get(&node).and_then(|n| n.parent);
        }
        self.unlink(el)?;
        self.node_mut(el)?.parent = Some(parent);
        self.link_child(parent, el, before)
    }

    fn remove_element(&mut self, el: ElementId) -> Result<(), DocumentError> {
        if el == self.root {
            return Err(DocumentError::Detached(el));
        }
        self.node(el)?;
        self.unlink(el)?;
        self.drop_subtree(el);
        Ok(())
    }
}

impl MemoryDocument {
    /// Radio groups are scoped to the enclosing form, or the body
    fn scope_root(&self, from: ElementId) -> ElementId {
        let mut current = Some(from);
        while let Some(el) = current {
            if self.nodes.get(&el).is_some_and(|n| n.tag == "form") {
                return el;
            }
            current = self.nodes.get(&el).and_then(|n| n.parent);
        }
        self.root
    }
}
