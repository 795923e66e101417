//! Headless document model.
//!
//! An arena of element and text nodes with parent/child links. Elements carry
//! their attributes plus the live control state a browser keeps outside the
//! attribute map (`value`, `checked`, `disabled`). The document also tracks
//! focus and the last scroll-into-view request so UI behaviour can be asserted
//! without a browser.
//!
//! Nodes are never freed: removing a node detaches it, and detached subtrees
//! stay addressable by their [`NodeId`].

use crate::error::DomError;
use indexmap::IndexMap;
use std::fmt::Write as _;

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of the node
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// How a listed form control takes part in payloads and submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Value-bearing control: text-like inputs, `textarea`, `select`
    Text,
    /// `input type=radio`
    Radio,
    /// `input type=checkbox`
    Checkbox,
    /// `input type=submit`, or a `button` whose type is `submit` or missing
    Submit,
    /// `fieldset`
    Fieldset,
    /// Any other listed control (`output`, `button type=button`, ...)
    Other,
}

/// An element node: tag, attributes and control state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    attrs: IndexMap<String, String>,
    value: String,
    checked: bool,
    disabled: bool,
}

impl Element {
    fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            value: String::new(),
            checked: false,
            disabled: false,
        }
    }

    /// Lowercase tag name
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Attribute value, if present
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `true` if the attribute is present (any value)
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(&name.to_ascii_lowercase())
    }

    /// Attributes in insertion order
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute. `value`, `checked` and `disabled` also seed the
    /// matching control state.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match name.as_str() {
            "value" => self.value.clone_from(&value),
            "checked" => self.checked = true,
            "disabled" => self.disabled = true,
            _ => {},
        }
        self.attrs.insert(name, value);
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "value" => self.value.clear(),
            "checked" => self.checked = false,
            "disabled" => self.disabled = false,
            _ => {},
        }
        self.attrs.shift_remove(&name);
    }

    /// The `name` attribute, empty when absent
    #[must_use]
    pub fn name(&self) -> &str {
        self.attr("name").unwrap_or("")
    }

    /// Lowercase `type` of an `input` or `button`, with the HTML defaults
    /// (`text` and `submit`). Other elements report their tag name.
    #[must_use]
    pub fn control_type(&self) -> String {
        match self.tag_name.as_str() {
            "input" => self
                .attr("type")
                .filter(|t| !t.is_empty())
                .map_or_else(|| "text".to_string(), str::to_ascii_lowercase),
            "button" => self
                .attr("type")
                .filter(|t| !t.is_empty())
                .map_or_else(|| "submit".to_string(), str::to_ascii_lowercase),
            tag => tag.to_string(),
        }
    }

    /// Current value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the current value (does not touch the `value` attribute)
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Checkedness of a radio or checkbox
    #[must_use]
    pub const fn checked(&self) -> bool {
        self.checked
    }

    /// Set checkedness (does not touch the `checked` attribute)
    pub const fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    /// Whether the control is disabled
    #[must_use]
    pub const fn disabled(&self) -> bool {
        self.disabled
    }

    /// Enable or disable the control, reflected to the `disabled` attribute
    pub fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.set_attr("disabled", "");
        } else {
            self.remove_attr("disabled");
        }
    }

    /// Whether the `required` attribute is present
    #[must_use]
    pub fn required(&self) -> bool {
        self.has_attr("required")
    }

    /// Listed controls are what `form.elements` yields.
    #[must_use]
    pub fn is_listed_control(&self) -> bool {
        match self.tag_name.as_str() {
            "input" => self.control_type() != "image",
            "button" | "select" | "textarea" | "fieldset" | "output" => true,
            _ => false,
        }
    }

    /// Classify a listed control; `None` for everything else.
    #[must_use]
    pub fn control_kind(&self) -> Option<ControlKind> {
        if !self.is_listed_control() {
            return None;
        }
        let kind = match (self.tag_name.as_str(), self.control_type().as_str()) {
            ("input", "radio") => ControlKind::Radio,
            ("input", "checkbox") => ControlKind::Checkbox,
            ("input" | "button", "submit") => ControlKind::Submit,
            ("input" | "select" | "textarea", _) => ControlKind::Text,
            ("fieldset", _) => ControlKind::Fieldset,
            _ => ControlKind::Other,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BuilderChild {
    Element(ElementBuilder),
    Text(String),
}

/// Owned, detached element tree.
///
/// Field factories produce these without touching the document; the form
/// builder materializes them with [`Document::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBuilder {
    tag_name: String,
    attrs: IndexMap<String, String>,
    children: Vec<BuilderChild>,
}

impl ElementBuilder {
    /// Start an element with the given tag
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set an attribute when a value is present
    #[must_use]
    pub fn attr_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Set a boolean attribute when `on`
    #[must_use]
    pub fn flag_if(self, name: &str, on: bool) -> Self {
        if on { self.attr(name, "") } else { self }
    }

    /// Append a child element
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(BuilderChild::Element(child));
        self
    }

    /// Append a child element when present
    #[must_use]
    pub fn child_opt(self, child: Option<Self>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }

    /// Append a text node
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(BuilderChild::Text(text.into()));
        self
    }

    /// Lowercase tag name
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Attribute value, if set
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Smoothness of a scroll-into-view request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    /// Jump
    #[default]
    Auto,
    /// Animate
    Smooth,
}

/// A recorded scroll-into-view request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    /// Node scrolled into view
    pub node: NodeId,
    /// Requested behaviour
    pub behavior: ScrollBehavior,
}

/// An HTML-like document rooted at a `body` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    active_element: Option<NodeId>,
    last_scroll: Option<ScrollRequest>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta", "source"];

impl Document {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element(Element::new("body")),
            }],
            body: NodeId(0),
            active_element: None,
            last_scroll: None,
        }
    }

    /// The root `body` element
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    /// Create a detached, empty element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag_name)), None)
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()), None)
    }

    /// Materialize a detached subtree and return its root.
    ///
    /// Initial control state follows HTML: radios and checkboxes without a
    /// `value` attribute have the value `on`, a `textarea` takes its text
    /// content, a `select` takes the value of its selected (or first) option.
    pub fn insert(&mut self, builder: ElementBuilder) -> NodeId {
        self.materialize(builder, None)
    }

    fn materialize(&mut self, builder: ElementBuilder, parent: Option<NodeId>) -> NodeId {
        let ElementBuilder {
            tag_name,
            attrs,
            children,
        } = builder;

        let mut element = Element::new(&tag_name);
        for (name, value) in attrs {
            element.set_attr(&name, value);
        }
        if element.tag_name == "input"
            && !element.has_attr("value")
            && matches!(element.control_type().as_str(), "checkbox" | "radio")
        {
            element.value = "on".to_string();
        }

        let id = self.push(NodeKind::Element(element), parent);
        for child in children {
            match child {
                BuilderChild::Element(child) => {
                    self.materialize(child, Some(id));
                },
                BuilderChild::Text(text) => {
                    self.push(NodeKind::Text(text), Some(id));
                },
            }
        }

        let initial = match tag_name.as_str() {
            "textarea" => Some(self.text_content(id)),
            "select" => self.selected_option_value(id),
            _ => None,
        };
        if let (Some(value), Some(element)) = (initial, self.element_mut(id)) {
            if !element.has_attr("value") {
                element.value = value;
            }
        }
        id
    }

    fn selected_option_value(&self, select: NodeId) -> Option<String> {
        let options = self.query_all(select, |e| e.tag_name() == "option");
        let chosen = options
            .iter()
            .copied()
            .find(|&o| self.element(o).is_some_and(|e| e.has_attr("selected")))
            .or_else(|| options.first().copied())?;
        let value = self
            .element(chosen)?
            .attr("value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(chosen));
        Some(value)
    }

    /// Element data for `id`, `None` for text or unknown nodes
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    /// Mutable element data for `id`
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    /// Parent of `id`, `None` for detached nodes and the body
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// Children of `id` in order
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    /// `true` if `node` is `ancestor` or lies inside it
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// `true` if `node` is reachable from the body
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.body, node)
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|&c| c != child);
        }
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(child)?;
        if self.element(parent).is_none() {
            self.node(parent)?;
            return Err(DomError::NotAnElement(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// # Errors
    ///
    /// - [`DomError::UnknownNode`] if either id is foreign
    /// - [`DomError::NotAnElement`] if `parent` is a text node
    /// - [`DomError::HierarchyRequest`] if `child` is `parent` or one of its ancestors
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Detach `node` from its parent.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::UnknownNode`] if the id is foreign.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        self.detach(node);
        Ok(())
    }

    /// Replace all children of `parent` with `nodes`, in order.
    ///
    /// Nothing changes when any of the nodes is invalid.
    ///
    /// # Errors
    ///
    /// Same conditions as [`append_child`](Self::append_child).
    pub fn replace_children(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<(), DomError> {
        if self.element(parent).is_none() {
            self.node(parent)?;
            return Err(DomError::NotAnElement(parent));
        }
        for &node in nodes {
            self.check_insertion(parent, node)?;
        }
        for old in std::mem::take(&mut self.nodes[parent.0].children) {
            self.nodes[old.0].parent = None;
        }
        for &node in nodes {
            self.append_child(parent, node)?;
        }
        Ok(())
    }

    /// Nodes below `root` in document (pre-)order, `root` excluded
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Elements below `root` matching `predicate`, in document order
    pub fn query_all(&self, root: NodeId, predicate: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(&predicate))
            .collect()
    }

    /// First element below `root` matching `predicate`
    pub fn query(&self, root: NodeId, predicate: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.element(id).is_some_and(&predicate))
    }

    /// Listed controls of a form in document order (`form.elements`)
    #[must_use]
    pub fn form_controls(&self, form: NodeId) -> Vec<NodeId> {
        self.query_all(form, Element::is_listed_control)
    }

    /// Give `node` focus. Ignored for text and unknown nodes.
    pub fn focus(&mut self, node: NodeId) {
        if self.element(node).is_some() {
            self.active_element = Some(node);
        }
    }

    /// Currently focused element
    #[must_use]
    pub const fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// Record a request to scroll `node` into view
    pub fn scroll_into_view(&mut self, node: NodeId, behavior: ScrollBehavior) {
        if self.element(node).is_some() {
            self.last_scroll = Some(ScrollRequest { node, behavior });
        }
    }

    /// Most recent scroll-into-view request
    #[must_use]
    pub const fn last_scroll(&self) -> Option<ScrollRequest> {
        self.last_scroll
    }

    /// Concatenated text of `node` and its descendants
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        if let Some(NodeKind::Text(own)) = self.nodes.get(node.0).map(|n| &n.kind) {
            text.push_str(own);
        }
        for id in self.descendants(node) {
            if let NodeKind::Text(t) = &self.nodes[id.0].kind {
                text.push_str(t);
            }
        }
        text
    }

    /// Serialize `node` including its own tag
    #[must_use]
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialize the children of `node`
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(current) = self.nodes.get(node.0) else {
            return;
        };
        match &current.kind {
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Element(element) => {
                let _ = write!(out, "<{}", element.tag_name);
                for (name, value) in &element.attrs {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag_name.as_str()) {
                    return;
                }
                for &child in &current.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{}>", element.tag_name);
            },
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
