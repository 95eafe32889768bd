//! Export forest construction
//!
//! Candidates are re-parented onto their nearest ancestor that is itself a
//! candidate, so excluded objects drop out without breaking the hierarchy.

use std::collections::{HashMap, HashSet};

use crate::scene::{ObjectHandle, SceneSource};

/// An exported object and its exported descendants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    /// The object
    pub object: ObjectHandle,
    /// Children in candidate order
    pub children: Vec<HierarchyNode>,
}

/// Nearest ancestor of `object` contained in `candidates`
fn exported_parent<S: SceneSource + ?Sized>(
    scene: &S,
    object: ObjectHandle,
    candidates: &HashSet<ObjectHandle>,
) -> Option<ObjectHandle> {
    let mut visited = HashSet::new();
    let mut parent = scene.object(object)?.parent;
    while let Some(current) = parent {
        if candidates.contains(&current) {
            return Some(current);
        }
        if !visited.insert(current) {
            log::warn!("Parent cycle above {object:?}, treating it as a root");
            return None;
        }
        parent = scene.object(current).and_then(|o| o.parent);
    }
    None
}

/// Build the forest of `candidates`; roots and siblings keep candidate order
pub fn build_hierarchy<S: SceneSource + ?Sized>(scene: &S, candidates: &[ObjectHandle]) -> Vec<HierarchyNode> {
    let candidate_set: HashSet<ObjectHandle> = candidates.iter().copied().collect();

    let mut children: HashMap<Option<ObjectHandle>, Vec<ObjectHandle>> = HashMap::new();
    for &object in candidates {
        let parent = exported_parent(scene, object, &candidate_set);
        children.entry(parent).or_default().push(object);
    }

    fn attach(
        parent: Option<ObjectHandle>,
        children: &HashMap<Option<ObjectHandle>, Vec<ObjectHandle>>,
    ) -> Vec<HierarchyNode> {
        children
            .get(&parent)
            .map(|objects| {
                objects
                    .iter()
                    .map(|&object| HierarchyNode {
                        object,
                        children: attach(Some(object), children),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    attach(None, &children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectKind, Scene, SceneObject};

    #[test]
    fn test_excluded_ancestors_are_skipped() {
        let mut scene = Scene::new();
        let root = scene.add_object(SceneObject::new("Root", ObjectKind::Empty));
        let hidden = scene.add_object(SceneObject::new("Hidden", ObjectKind::Empty).with_parent(root));
        let leaf_a = scene.add_object(SceneObject::new("A", ObjectKind::Empty).with_parent(hidden));
        let leaf_b = scene.add_object(SceneObject::new("B", ObjectKind::Empty).with_parent(root));
        let loose = scene.add_object(SceneObject::new("Loose", ObjectKind::Empty));

        let forest = build_hierarchy(&scene, &[loose, leaf_a, root, leaf_b]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].object, loose);
        assert!(forest[0].children.is_empty());
        assert_eq!(forest[1].object, root);
        let children: Vec<_> = forest[1].children.iter().map(|n| n.object).collect();
        assert_eq!(children, vec![leaf_a, leaf_b]);
    }

    #[test]
    fn test_orphaned_candidates_become_roots() {
        let mut scene = Scene::new();
        let root = scene.add_object(SceneObject::new("Root", ObjectKind::Empty));
        let child = scene.add_object(SceneObject::new("Child", ObjectKind::Empty).with_parent(root));
        let grandchild =
            scene.add_object(SceneObject::new("Grandchild", ObjectKind::Empty).with_parent(child));

        let forest = build_hierarchy(&scene, &[grandchild, child]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].object, child);
        assert_eq!(forest[0].children[0].object, grandchild);
        assert!(build_hierarchy(&scene, &[]).is_empty());
    }
}
