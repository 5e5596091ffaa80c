//! Query helpers shared by every [`Document`] implementation

use super::{Document, DocumentError, ElementId};

/// Convenience queries layered over the [`Document`] primitives
pub trait DocumentExt: Document {
    /// All descendants of `root` in document order (excluding `root`)
    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(self.children(el).into_iter().rev());
        }
        out
    }

    /// First descendant of `root` (document order) matching `pred`
    fn find_first<F>(&self, root: ElementId, pred: F) -> Option<ElementId>
    where
        F: Fn(&Self, ElementId) -> bool,
    {
        self.descendants(root).into_iter().find(|el| pred(self, *el))
    }

    /// Every descendant of `root` matching `pred`
    fn find_all<F>(&self, root: ElementId, pred: F) -> Vec<ElementId>
    where
        F: Fn(&Self, ElementId) -> bool,
    {
        self.descendants(root)
            .into_iter()
            .filter(|el| pred(self, *el))
            .collect()
    }

    /// Nearest inclusive ancestor of `el` matching `pred`
    fn closest<F>(&self, el: ElementId, pred: F) -> Option<ElementId>
    where
        F: Fn(&Self, ElementId) -> bool,
    {
        let mut current = Some(el);
        while let Some(node) = current {
            if pred(self, node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Whether `ancestor` is `el` or one of its ancestors
    fn is_within(&self, el: ElementId, ancestor: ElementId) -> bool {
        self.closest(el, |_, node| node == ancestor).is_some()
    }

    fn is_tag(&self, el: ElementId, tag: &str) -> bool {
        self.tag_name(el).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    fn has_attribute(&self, el: ElementId, name: &str) -> bool {
        self.attribute(el, name).is_some()
    }

    /// Attribute compared case-insensitively after trimming
    fn attribute_is(&self, el: ElementId, name: &str, expected: &str) -> bool {
        self.attribute(el, name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
    }

    fn classes(&self, el: ElementId) -> Vec<String> {
        self.attribute(el, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.attribute(el, "class")
            .is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }

    /// Add a class; no-op when already present
    fn add_class(&mut self, el: ElementId, class: &str) -> Result<(), DocumentError> {
        if self.has_class(el, class) {
            return Ok(());
        }
        let mut classes = self.classes(el);
        classes.push(class.to_string());
        self.set_attribute(el, "class", &classes.join(" "))
    }

    /// Remove a class; no-op when absent
    fn remove_class(&mut self, el: ElementId, class: &str) -> Result<(), DocumentError> {
        if !self.has_class(el, class) {
            return Ok(());
        }
        let classes: Vec<String> = self
            .classes(el)
            .into_iter()
            .filter(|c| c != class)
            .collect();
        self.set_attribute(el, "class", &classes.join(" "))
    }

    /// Set an attribute only when it differs, so repeated passes are no-ops
    fn stamp_attribute(
        &mut self,
        el: ElementId,
        name: &str,
        value: &str,
    ) -> Result<bool, DocumentError> {
        if self.attribute(el, name) == Some(value) {
            return Ok(false);
        }
        self.set_attribute(el, name, value)?;
        Ok(true)
    }

    /// Input `type`, lower-cased, defaulting to `text` for inputs
    fn input_type(&self, el: ElementId) -> Option<String> {
        match self.tag_name(el)? {
            "input" => Some(
                self.attribute(el, "type")
                    .map(|t| t.trim().to_ascii_lowercase())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "text".to_string()),
            ),
            "select" => Some("select".to_string()),
            "textarea" => Some("textarea".to_string()),
            _ => None,
        }
    }

    /// Whether the element is a form control (`input`, `select`, `textarea`)
    fn is_control(&self, el: ElementId) -> bool {
        matches!(self.tag_name(el), Some("input" | "select" | "textarea"))
    }

    /// The element is disabled itself or sits inside a disabled fieldset
    fn is_disabled(&self, el: ElementId) -> bool {
        self.closest(el, |doc, node| {
            doc.has_attribute(node, "disabled")
                && (node == el || doc.is_tag(node, "fieldset"))
        })
        .is_some()
    }

    /// The element participates in layout (the "visible" notion for fields)
    fn is_displayed(&self, el: ElementId) -> bool {
        self.layout(el).displayed
    }

    /// Show or hide an element through its inline `display`
    fn set_displayed(&mut self, el: ElementId, shown: bool) -> Result<(), DocumentError> {
        let style = self.attribute(el, "style").unwrap_or_default();
        let kept: Vec<&str> = style
            .split(';')
            .map(str::trim)
            .filter(|d| !d.is_empty() && !d.to_ascii_lowercase().starts_with("display"))
            .collect();
        let mut rebuilt = kept.join(";");
        if !rebuilt.is_empty() {
            rebuilt.push(';');
        }
        rebuilt.push_str(if shown { "display:block" } else { "display:none" });
        self.stamp_attribute(el, "style", &rebuilt)?;
        if shown {
            self.remove_attribute(el, "hidden")?;
        }
        Ok(())
    }
}

impl<T: Document + ?Sized> DocumentExt for T {}
