use petgraph::visit::{Dfs, VisitMap};
use tracing::{debug, instrument};

use crate::domain::{PersonId, RelationshipGraph};

/// One connected component: its member ids in ascending order.
pub type Component = Vec<PersonId>;

/// Partitions a relationship graph into connected components.
///
/// Spouse and parent/child links are followed regardless of direction. Every
/// vertex lands in exactly one component; individuals with no links form
/// singletons.
#[derive(Debug, Clone, Copy)]
pub struct ComponentFinder<'g> {
    graph: &'g RelationshipGraph,
}

impl<'g> ComponentFinder<'g> {
    /// Creates a finder over `graph`.
    #[must_use]
    pub const fn new(graph: &'g RelationshipGraph) -> Self {
        Self { graph }
    }

    /// All connected components, largest first.
    ///
    /// Members of each component are sorted. Components of equal size are
    /// ordered by their smallest member.
    #[instrument(skip(self))]
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        let adjacency = self.graph.adjacency();

        // A single traversal whose visited set carries across restarts.
        let mut dfs = Dfs::empty(adjacency);
        let mut components = Vec::new();

        for start in adjacency.node_indices() {
            if dfs.discovered.is_visited(&start) {
                continue;
            }

            dfs.move_to(start);
            let mut component: Component = Vec::new();
            while let Some(index) = dfs.next(adjacency) {
                component.push(adjacency[index].clone());
            }
            component.sort_unstable();
            components.push(component);
        }

        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));

        debug!(count = components.len(), "connected components found");
        components
    }

    /// The largest component, or an empty one when there are no individuals.
    #[must_use]
    pub fn largest_component(&self) -> Component {
        self.components().into_iter().next().unwrap_or_default()
    }
}
