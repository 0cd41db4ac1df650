//! Locations of nodes inside a condition tree

use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathSegment {
    And(usize),
    Or(usize),
    Attribute(usize),
}

/// Path from the root to a node, rendered as `$.and[0].or[2]`
///
/// Real trees rarely nest more than a few levels, so segments stay inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(SmallVec<[PathSegment; 8]>);

impl NodePath {
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.0.push(segment);
        path
    }

    /// Number of combinators between the root and this node
    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::And(i) => write!(f, ".and[{}]", i)?,
                PathSegment::Or(i) => write!(f, ".or[{}]", i)?,
                PathSegment::Attribute(i) => write!(f, ".additional_target_attributes[{}]", i)?,
            }
        }
        Ok(())
    }
}
