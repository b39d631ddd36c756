//! Contig extremities: the nodes of the linkage graph
//!
//! Every contig (or scaffold) contributes two nodes, one per end. A path through
//! the linkage graph enters a contig at one extremity and leaves it through the
//! sibling extremity before jumping to the next contig.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque contig/scaffold identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContigId(pub u64);

impl From<u64> for ContigId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ContigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which end of a contig an extremity sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// One end of a contig. Equality and hashing are by `(contig, side)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Extremity {
    pub contig: ContigId,
    pub side: Side,
}

impl Extremity {
    pub fn new(contig: impl Into<ContigId>, side: Side) -> Self {
        Self {
            contig: contig.into(),
            side,
        }
    }

    pub fn left(contig: impl Into<ContigId>) -> Self {
        Self::new(contig, Side::Left)
    }

    pub fn right(contig: impl Into<ContigId>) -> Self {
        Self::new(contig, Side::Right)
    }

    /// The other end of the same contig
    pub fn sibling(self) -> Self {
        Self {
            contig: self.contig,
            side: self.side.opposite(),
        }
    }

    pub fn same_contig(self, other: Extremity) -> bool {
        self.contig == other.contig
    }

    pub fn is_sibling_of(self, other: Extremity) -> bool {
        self.same_contig(other) && self.side != other.side
    }
}

impl fmt::Display for Extremity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::Left => 'L',
            Side::Right => 'R',
        };
        write!(f, "({},{})", self.contig, side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    #[test]
    fn test_sibling_is_involution() {
        let node = Extremity::right(7);
        assert_eq!(node.sibling(), Extremity::left(7));
        assert_eq!(node.sibling().sibling(), node);
        assert!(node.is_sibling_of(node.sibling()));
        assert!(!node.is_sibling_of(node));
    }

    #[test]
    fn test_identity_by_contig_and_side() {
        let mut set = AHashSet::new();
        set.insert(Extremity::left(1));
        set.insert(Extremity::new(ContigId(1), Side::Left));
        set.insert(Extremity::right(1));
        assert_eq!(set.len(), 2);
        assert!(Extremity::left(1).same_contig(Extremity::right(1)));
        assert!(!Extremity::left(1).same_contig(Extremity::left(2)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Extremity::right(12).to_string(), "(12,R)");
        assert_eq!(Extremity::left(3).to_string(), "(3,L)");
    }
}
