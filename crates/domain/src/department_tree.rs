// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Department hierarchy for one organization.
//!
//! Departments form a forest through nullable parent pointers. The tree
//! is rebuilt from storage for every operation and is never cached.
//! Stored data is not trusted to be acyclic: every walk carries a
//! visited set keyed by department id and stops a branch on revisit.

use std::collections::{HashMap, HashSet};

use crate::error::DomainError;
use crate::types::Department;

/// Separator placed between ancestor names in a full path.
pub const PATH_SEPARATOR: &str = " - ";

/// A department annotated with its derived full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentPath {
    /// The department.
    pub department: Department,
    /// Root-to-self name chain.
    pub full_path: String,
}

/// Arena of an organization's departments indexed by id.
#[derive(Debug, Clone, Default)]
pub struct DepartmentTree {
    nodes: Vec<Department>,
    index: HashMap<i64, usize>,
    children: HashMap<i64, Vec<i64>>,
}

impl DepartmentTree {
    /// Builds a tree from a flat department list.
    #[must_use]
    pub fn new(departments: Vec<Department>) -> Self {
        let mut index: HashMap<i64, usize> = HashMap::with_capacity(departments.len());
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();

        for (position, department) in departments.iter().enumerate() {
            index.insert(department.department_id, position);
            if let Some(parent_id) = department.parent_id {
                children
                    .entry(parent_id)
                    .or_default()
                    .push(department.department_id);
            }
        }

        Self {
            nodes: departments,
            index,
            children,
        }
    }

    /// Returns the department with the given id.
    #[must_use]
    pub fn get(&self, department_id: i64) -> Option<&Department> {
        self.index
            .get(&department_id)
            .and_then(|position| self.nodes.get(*position))
    }

    /// Returns whether the tree holds the given department.
    #[must_use]
    pub fn contains(&self, department_id: i64) -> bool {
        self.index.contains_key(&department_id)
    }

    /// Returns the number of departments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the direct children of a department.
    #[must_use]
    pub fn children_of(&self, department_id: i64) -> &[i64] {
        self.children
            .get(&department_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Computes the full path of a department.
    ///
    /// The path joins ancestor names from the root down to the department
    /// with [`PATH_SEPARATOR`]. A parent that is missing ends the walk.
    /// A revisited id ends the walk as well, so a cycle contributes nothing
    /// beyond the names collected before it.
    ///
    /// Returns an empty string for an unknown id.
    #[must_use]
    pub fn full_path(&self, department_id: i64) -> String {
        let mut names: Vec<&str> = Vec::new();
        let mut visited: HashSet<i64> = HashSet::new();
        let mut current: Option<i64> = Some(department_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            let Some(department) = self.get(id) else {
                break;
            };
            names.push(department.name.as_str());
            current = department.parent_id;
        }

        names.reverse();
        names.join(PATH_SEPARATOR)
    }

    /// Returns every department with its full path, sorted by path.
    ///
    /// Sorting by the concatenated path is a display convenience: a
    /// sibling whose name sorts between a parent's path and its children's
    /// paths can interleave with that subtree.
    #[must_use]
    pub fn with_full_paths(&self) -> Vec<DepartmentPath> {
        let mut paths: Vec<DepartmentPath> = self
            .nodes
            .iter()
            .map(|department| DepartmentPath {
                department: department.clone(),
                full_path: self.full_path(department.department_id),
            })
            .collect();

        paths.sort_by(|a, b| {
            a.full_path
                .cmp(&b.full_path)
                .then(a.department.department_id.cmp(&b.department.department_id))
        });
        paths
    }

    /// Returns all transitive descendants of a department, deepest first.
    ///
    /// The order is a post-order walk: every department appears after all
    /// of its own descendants. The department itself is not included.
    #[must_use]
    pub fn descendants_leaf_first(&self, department_id: i64) -> Vec<i64> {
        let mut visited: HashSet<i64> = HashSet::new();
        visited.insert(department_id);
        let mut out: Vec<i64> = Vec::new();
        self.collect_descendants(department_id, &mut visited, &mut out);
        out
    }

    fn collect_descendants(
        &self,
        department_id: i64,
        visited: &mut HashSet<i64>,
        out: &mut Vec<i64>,
    ) {
        for child_id in self.children_of(department_id) {
            if !visited.insert(*child_id) {
                continue;
            }
            self.collect_descendants(*child_id, visited, out);
            out.push(*child_id);
        }
    }

    /// Returns the ids to delete when removing a department: every
    /// descendant deepest first, then the department itself.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DepartmentNotFound` if the department is not in
    /// the tree.
    pub fn deletion_order(&self, department_id: i64) -> Result<Vec<i64>, DomainError> {
        if !self.contains(department_id) {
            return Err(DomainError::DepartmentNotFound(department_id));
        }
        let mut order: Vec<i64> = self.descendants_leaf_first(department_id);
        order.push(department_id);
        Ok(order)
    }

    /// Returns whether placing `department_id` under `new_parent_id` would
    /// make the department its own ancestor.
    #[must_use]
    pub fn would_create_cycle(&self, department_id: i64, new_parent_id: i64) -> bool {
        let mut visited: HashSet<i64> = HashSet::new();
        let mut current: Option<i64> = Some(new_parent_id);

        while let Some(id) = current {
            if id == department_id {
                return true;
            }
            if !visited.insert(id) {
                // Pre-existing cycle that does not pass through the department.
                return false;
            }
            current = self.get(id).and_then(|d| d.parent_id);
        }
        false
    }
}
