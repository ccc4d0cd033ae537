//! Turns a server payload into rendered child nodes.
//!
//! Leaves are appended first, then branches, each in input order. Branches
//! are created collapsed with an empty children container; their own
//! children arrive later through expansion or search reconciliation.

use phonebook_protocol::Subtree;

use crate::view::{ContainerRef, TreeView};

/// Counts of what a build appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub leaves: usize,
    pub branches: usize,
    /// Entries dropped for missing required attributes.
    pub skipped: usize,
}

impl BuildReport {
    pub fn is_empty(&self) -> bool {
        self.leaves == 0 && self.branches == 0
    }
}

/// Builds child views from a payload.
pub struct TreeBuilder;

impl TreeBuilder {
    /// Append the direct children described by `payload` under `parent`.
    ///
    /// A payload with neither abonents nor departments builds nothing; a
    /// branch may legitimately be empty. Entries without an id (or
    /// departments without a title) are skipped.
    pub fn build<V: TreeView>(view: &mut V, parent: &ContainerRef, payload: &Subtree) -> BuildReport {
        let mut report = BuildReport::default();

        for abonent in &payload.abonents {
            if abonent.id.is_none() {
                report.skipped += 1;
                continue;
            }
            view.create_leaf(parent, abonent);
            report.leaves += 1;
        }

        for department in &payload.departments {
            match (&department.id, &department.title) {
                (Some(id), Some(title)) => {
                    view.create_branch(parent, id, title);
                    report.branches += 1;
                }
                _ => report.skipped += 1,
            }
        }

        if report.skipped > 0 {
            tracing::warn!(
                container = %parent,
                skipped = report.skipped,
                "Skipped malformed directory entries"
            );
        }
        tracing::debug!(
            container = %parent,
            leaves = report.leaves,
            branches = report.branches,
            "Built children"
        );
        report
    }
}
