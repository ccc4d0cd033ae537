//! In-memory rendered tree.
//!
//! `ForestView` is an arena of nodes addressed by index, with an id index
//! on the side. Parents own their children by index; nothing points back
//! up except the `parent` slot used to compute effective visibility.
//!
//! A node is *displayed* when its own `visible` flag is set and every
//! ancestor branch is both visible and expanded, the same rule an
//! accordion applies to nested collapse containers.

use std::collections::HashMap;

use phonebook_protocol::{Abonent, NodeId};

use crate::view::{ContainerRef, TreeView};

#[derive(Debug, Clone)]
enum ViewKind {
    Branch {
        title: String,
        expanded: bool,
        children: Vec<usize>,
    },
    Leaf(Abonent),
}

#[derive(Debug, Clone)]
struct ViewNode {
    id: NodeId,
    parent: Option<usize>,
    visible: bool,
    kind: ViewKind,
}

/// What a displayed row holds.
#[derive(Debug, Clone, Copy)]
pub enum RowKind<'a> {
    Branch { title: &'a str, expanded: bool },
    Leaf(&'a Abonent),
}

/// One displayed line of the tree, in document order.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub id: &'a NodeId,
    pub depth: usize,
    pub kind: RowKind<'a>,
}

impl Row<'_> {
    pub fn is_branch(&self) -> bool {
        matches!(self.kind, RowKind::Branch { .. })
    }
}

/// Arena-backed implementation of [`TreeView`].
#[derive(Debug, Default)]
pub struct ForestView {
    nodes: Vec<ViewNode>,
    index: HashMap<NodeId, usize>,
    roots: Vec<usize>,
}

impl ForestView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rendered nodes, displayed or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every rendered node, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_branch(&self, id: &NodeId) -> bool {
        self.node(id)
            .is_some_and(|n| matches!(n.kind, ViewKind::Branch { .. }))
    }

    /// The node's own visibility flag.
    pub fn is_visible(&self, id: &NodeId) -> bool {
        self.node(id).is_some_and(|n| n.visible)
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.node(id).is_some_and(|n| {
            matches!(n.kind, ViewKind::Branch { expanded: true, .. })
        })
    }

    /// Whether the node actually appears: visible itself, and every
    /// ancestor visible and expanded.
    pub fn is_displayed(&self, id: &NodeId) -> bool {
        let Some(&idx) = self.index.get(id) else {
            return false;
        };
        if !self.nodes[idx].visible {
            return false;
        }
        let mut parent = self.nodes[idx].parent;
        while let Some(p) = parent {
            let node = &self.nodes[p];
            let open = matches!(node.kind, ViewKind::Branch { expanded: true, .. });
            if !node.visible || !open {
                return false;
            }
            parent = node.parent;
        }
        true
    }

    /// Ids of the items in a container, in insertion order.
    pub fn children(&self, container: &ContainerRef) -> Vec<&NodeId> {
        self.child_indices(container)
            .map(|children| children.iter().map(|&i| &self.nodes[i].id).collect())
            .unwrap_or_default()
    }

    /// Title of a branch.
    pub fn title(&self, id: &NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            ViewKind::Branch { title, .. } => Some(title),
            ViewKind::Leaf(_) => None,
        }
    }

    /// Fields of a leaf.
    pub fn abonent(&self, id: &NodeId) -> Option<&Abonent> {
        match &self.node(id)?.kind {
            ViewKind::Leaf(abonent) => Some(abonent),
            ViewKind::Branch { .. } => None,
        }
    }

    /// Displayed rows in depth-first document order.
    pub fn rows(&self) -> Vec<Row<'_>> {
        let mut rows = Vec::new();
        for &idx in &self.roots {
            self.collect_rows(idx, 0, &mut rows);
        }
        rows
    }

    /// Plain-text rendering of the displayed rows, one line per row.
    pub fn outline(&self) -> Vec<String> {
        self.rows()
            .iter()
            .map(|row| {
                let indent = "  ".repeat(row.depth);
                match row.kind {
                    RowKind::Branch { title, expanded } => {
                        let marker = if expanded { "-" } else { "+" };
                        format!("{}{} {}", indent, marker, title)
                    }
                    RowKind::Leaf(abonent) => {
                        let mut line = format!("{}* {}", indent, abonent.full_name());
                        if !abonent.post.is_empty() {
                            line.push_str(&format!(", {}", abonent.post));
                        }
                        let phones: Vec<&str> = abonent
                            .extension
                            .iter()
                            .chain(abonent.landline.iter())
                            .map(|p| p.as_str())
                            .collect();
                        if !phones.is_empty() {
                            line.push_str(&format!(" [{}]", phones.join(", ")));
                        }
                        line
                    }
                }
            })
            .collect()
    }

    fn collect_rows<'a>(&'a self, idx: usize, depth: usize, rows: &mut Vec<Row<'a>>) {
        let node = &self.nodes[idx];
        if !node.visible {
            return;
        }
        match &node.kind {
            ViewKind::Leaf(abonent) => rows.push(Row {
                id: &node.id,
                depth,
                kind: RowKind::Leaf(abonent),
            }),
            ViewKind::Branch {
                title,
                expanded,
                children,
            } => {
                rows.push(Row {
                    id: &node.id,
                    depth,
                    kind: RowKind::Branch {
                        title,
                        expanded: *expanded,
                    },
                });
                if *expanded {
                    for &child in children {
                        self.collect_rows(child, depth + 1, rows);
                    }
                }
            }
        }
    }

    fn node(&self, id: &NodeId) -> Option<&ViewNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut ViewNode> {
        let idx = *self.index.get(id)?;
        Some(&mut self.nodes[idx])
    }

    fn child_indices(&self, container: &ContainerRef) -> Option<&Vec<usize>> {
        match container.owner() {
            None if container.is_root() => Some(&self.roots),
            None => None,
            Some(owner) => match &self.node(&owner)?.kind {
                ViewKind::Branch { children, .. } => Some(children),
                ViewKind::Leaf(_) => None,
            },
        }
    }

    /// Resolve a container to its owner slot: `Ok(None)` is the root list,
    /// `Ok(Some(idx))` a branch, `Err(())` an unknown container.
    fn resolve(&self, container: &ContainerRef) -> Result<Option<usize>, ()> {
        match container.owner() {
            None if container.is_root() => Ok(None),
            None => Err(()),
            Some(owner) => match self.index.get(&owner) {
                Some(&idx) if matches!(self.nodes[idx].kind, ViewKind::Branch { .. }) => {
                    Ok(Some(idx))
                }
                _ => Err(()),
            },
        }
    }

    fn attach(&mut self, parent: &ContainerRef, id: &NodeId, kind: ViewKind) -> bool {
        if self.index.contains_key(id) {
            tracing::debug!(node = %id, "Node already rendered, skipping");
            return false;
        }
        let Ok(parent_idx) = self.resolve(parent) else {
            tracing::debug!(container = %parent, node = %id, "Unknown container, skipping");
            return false;
        };
        let idx = self.nodes.len();
        self.nodes.push(ViewNode {
            id: id.clone(),
            parent: parent_idx,
            visible: true,
            kind,
        });
        self.index.insert(id.clone(), idx);
        match parent_idx {
            None => self.roots.push(idx),
            Some(p) => {
                if let ViewKind::Branch { children, .. } = &mut self.nodes[p].kind {
                    children.push(idx);
                }
            }
        }
        true
    }

    fn set_expanded(&mut self, id: &NodeId, value: bool) {
        if let Some(node) = self.node_mut(id) {
            if let ViewKind::Branch { expanded, .. } = &mut node.kind {
                *expanded = value;
            }
        }
    }

    fn set_visible(&mut self, id: &NodeId, value: bool) {
        if let Some(node) = self.node_mut(id) {
            node.visible = value;
        }
    }
}

impl TreeView for ForestView {
    fn create_branch(&mut self, parent: &ContainerRef, id: &NodeId, title: &str) -> ContainerRef {
        self.attach(
            parent,
            id,
            ViewKind::Branch {
                title: title.to_string(),
                expanded: false,
                children: Vec::new(),
            },
        );
        ContainerRef::of(id)
    }

    fn create_leaf(&mut self, parent: &ContainerRef, abonent: &Abonent) {
        if let Some(id) = &abonent.id {
            self.attach(parent, id, ViewKind::Leaf(abonent.clone()));
        }
    }

    fn expand(&mut self, id: &NodeId) {
        self.set_expanded(id, true);
    }

    fn collapse(&mut self, id: &NodeId) {
        self.set_expanded(id, false);
    }

    fn show(&mut self, id: &NodeId) {
        self.set_visible(id, true);
    }

    fn hide(&mut self, id: &NodeId) {
        self.set_visible(id, false);
    }

    fn hide_all(&mut self) {
        for node in &mut self.nodes {
            node.visible = false;
        }
    }

    fn hide_descendants(&mut self, id: &NodeId) {
        let Some(&start) = self.index.get(id) else {
            return;
        };
        let mut stack = match &self.nodes[start].kind {
            ViewKind::Branch { children, .. } => children.clone(),
            ViewKind::Leaf(_) => return,
        };
        while let Some(idx) = stack.pop() {
            self.nodes[idx].visible = false;
            if let ViewKind::Branch { children, .. } = &self.nodes[idx].kind {
                stack.extend(children.iter().copied());
            }
        }
    }

    fn restore_all(&mut self) {
        for node in &mut self.nodes {
            node.visible = true;
            if let ViewKind::Branch { expanded, .. } = &mut node.kind {
                *expanded = false;
            }
        }
    }
}
