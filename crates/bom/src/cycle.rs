//! Cycle detection across assemblies' current revisions.

use std::collections::HashSet;

use bomledger_core::ItemId;

/// Look for a path `parent -> component -> ... -> parent` through current BOMs.
///
/// `components_of` returns the component ids of an assembly's current revision
/// (`None` for components or assemblies without a revision). Returns the cycle
/// path when one exists.
pub fn find_cycle<E>(
    parent: ItemId,
    direct_components: impl IntoIterator<Item = ItemId>,
    mut components_of: impl FnMut(ItemId) -> Result<Option<Vec<ItemId>>, E>,
) -> Result<Option<Vec<ItemId>>, E> {
    let mut visited: HashSet<ItemId> = HashSet::new();
    // Explicit DFS stack of (node, path-to-node).
    let mut stack: Vec<(ItemId, Vec<ItemId>)> = direct_components
        .into_iter()
        .map(|c| (c, vec![parent, c]))
        .collect();

    while let Some((node, path)) = stack.pop() {
        if node == parent {
            return Ok(Some(path));
        }
        if !visited.insert(node) {
            continue;
        }
        if let Some(children) = components_of(node)? {
            for child in children {
                let mut next = path.clone();
                next.push(child);
                stack.push((child, next));
            }
        }
    }

    Ok(None)
}
