//! Payload-category hierarchy and the distance metric over it.
//!
//! Categories form a small DAG registered at build time: every category may
//! declare one supertype edge and any number of capability edges (to
//! interface-style categories, which may themselves extend one another).
//! Distance between two categories is the number of edges on the shortest
//! upward path from the requested category to the candidate, or no value at
//! all when the candidate is not reachable.

use std::collections::{HashMap, VecDeque};

/// Handle to a registered payload category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(u32);

/// Builder for a [`CategoryHierarchy`].
#[derive(Debug, Default)]
pub struct CategoryHierarchyBuilder {
    names: Vec<String>,
    edges: Vec<Vec<CategoryId>>,
    by_name: HashMap<String, CategoryId>,
}

impl CategoryHierarchyBuilder {
    fn add(&mut self, name: &str, edges: Vec<CategoryId>) -> CategoryId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = CategoryId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.edges.push(edges);
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Register an interface-style category, optionally extending another.
    pub fn interface(&mut self, name: &str, extends: Option<CategoryId>) -> CategoryId {
        self.add(name, extends.into_iter().collect())
    }

    /// Register a concrete category with an optional supertype and any
    /// number of implemented interface categories.
    pub fn concrete(
        &mut self,
        name: &str,
        supertype: Option<CategoryId>,
        implements: &[CategoryId],
    ) -> CategoryId {
        let mut edges: Vec<CategoryId> = supertype.into_iter().collect();
        edges.extend_from_slice(implements);
        self.add(name, edges)
    }

    pub fn build(self) -> CategoryHierarchy {
        CategoryHierarchy {
            names: self.names,
            edges: self.edges,
            by_name: self.by_name,
        }
    }
}

/// Immutable category DAG with precomputed upward edge lists.
#[derive(Debug)]
pub struct CategoryHierarchy {
    names: Vec<String>,
    edges: Vec<Vec<CategoryId>>,
    by_name: HashMap<String, CategoryId>,
}

impl CategoryHierarchy {
    pub fn builder() -> CategoryHierarchyBuilder {
        CategoryHierarchyBuilder::default()
    }

    /// Look up a category by its registered name.
    pub fn category(&self, name: &str) -> Option<CategoryId> {
        self.by_name.get(name).copied()
    }

    /// The registered name of a category.
    pub fn name(&self, id: CategoryId) -> &str {
        &self.names[id.0 as usize]
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Hierarchy distance from `requested` up to `candidate`.
    ///
    /// Returns `Some(0)` when the categories are identical, `Some(n)` when
    /// `candidate` is reachable from `requested` in `n` upward edges
    /// (supertype and capability edges count alike), and `None` when it is
    /// not reachable at all.
    pub fn distance(&self, candidate: CategoryId, requested: CategoryId) -> Option<u32> {
        if candidate == requested {
            return Some(0);
        }

        // BFS upward from the requested category.
        let mut visited = vec![false; self.names.len()];
        let mut queue = VecDeque::new();
        visited[requested.0 as usize] = true;
        queue.push_back((requested, 0u32));

        while let Some((node, depth)) = queue.pop_front() {
            for &next in &self.edges[node.0 as usize] {
                if next == candidate {
                    return Some(depth + 1);
                }
                if !visited[next.0 as usize] {
                    visited[next.0 as usize] = true;
                    queue.push_back((next, depth + 1));
                }
            }
        }

        None
    }
}
