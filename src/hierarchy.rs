use crate::error::SkeletalLoadError;
use crate::source::SourceNode;
use glam::Mat4;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct NodeSnapshot {
    pub name: Arc<str>,
    pub bind_local: Mat4,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Copies the imported node tree, preserving child order. Trees nested deeper than `max_depth`
    /// are rejected so later traversals cannot overflow the stack.
    pub fn copy_from(source: &SourceNode, max_depth: usize) -> Result<Self, SkeletalLoadError> {
        Self::copy_at_depth(source, 0, max_depth)
    }

    fn copy_at_depth(source: &SourceNode, depth: usize, max_depth: usize) -> Result<Self, SkeletalLoadError> {
        if depth >= max_depth {
            return Err(SkeletalLoadError::HierarchyTooDeep { node: source.name.clone(), limit: max_depth });
        }
        let children = source
            .children
            .iter()
            .map(|child| Self::copy_at_depth(child, depth + 1, max_depth))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name: Arc::from(source.name.as_str()), bind_local: source.transform, children })
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeSnapshot::node_count).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(NodeSnapshot::depth).max().unwrap_or(0)
    }

    /// Pre-order, depth-first visit.
    pub fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a NodeSnapshot)) {
        visitor(self);
        for child in &self.children {
            child.visit(visitor);
        }
    }

    pub fn find(&self, name: &str) -> Option<&NodeSnapshot> {
        if self.name.as_ref() == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}
