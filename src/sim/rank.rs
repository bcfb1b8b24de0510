//! Piece ranks and their fixed attributes

use serde::{Deserialize, Serialize};

use crate::consts::MAX_RANK;

/// Fixed attributes of a rank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSpec {
    /// Box extents in simulation units
    pub width: f32,
    pub height: f32,
    /// Awarded when two pieces of this rank merge into the next one
    pub merge_score: u64,
}

const RANK_TABLE: [RankSpec; MAX_RANK as usize] = [
    RankSpec { width: 20.0, height: 24.0, merge_score: 1 },
    RankSpec { width: 26.0, height: 31.0, merge_score: 3 },
    RankSpec { width: 34.0, height: 41.0, merge_score: 6 },
    RankSpec { width: 44.0, height: 53.0, merge_score: 10 },
    RankSpec { width: 57.0, height: 68.0, merge_score: 15 },
    RankSpec { width: 74.0, height: 89.0, merge_score: 21 },
    RankSpec { width: 96.0, height: 115.0, merge_score: 28 },
    RankSpec { width: 125.0, height: 150.0, merge_score: 36 },
    RankSpec { width: 162.0, height: 194.0, merge_score: 45 },
    RankSpec { width: 211.0, height: 253.0, merge_score: 55 },
    RankSpec { width: 274.0, height: 329.0, merge_score: 66 },
];

/// Tier of a piece, always within 1..=MAX_RANK
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rank(u8);

impl Rank {
    pub const MIN: Rank = Rank(1);
    pub const MAX: Rank = Rank(MAX_RANK);

    /// Returns `None` outside 1..=MAX_RANK
    pub fn new(value: u8) -> Option<Self> {
        (1..=MAX_RANK).contains(&value).then_some(Self(value))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Rank produced by merging two pieces of this rank
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    pub fn is_max(self) -> bool {
        self == Self::MAX
    }

    /// Whether two pieces of this rank may fuse
    pub fn can_merge(self) -> bool {
        self < Self::MAX
    }

    pub fn spec(self) -> &'static RankSpec {
        &RANK_TABLE[(self.0 - 1) as usize]
    }
}

impl TryFrom<u8> for Rank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::new(value).ok_or_else(|| format!("rank {value} outside 1..={MAX_RANK}"))
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank.0
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_bounds() {
        assert!(Rank::new(0).is_none());
        assert!(Rank::new(12).is_none());
        assert_eq!(Rank::new(11), Some(Rank::MAX));
        assert!(Rank::MAX.next().is_none());
        assert!(!Rank::MAX.can_merge());
        assert!(Rank::new(10).unwrap().can_merge());
    }

    #[test]
    fn test_score_table() {
        let expected = [1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 66];
        for (i, score) in expected.iter().enumerate() {
            let rank = Rank::new(i as u8 + 1).unwrap();
            assert_eq!(rank.spec().merge_score, *score);
        }
    }

    #[test]
    fn test_sizes_grow_with_rank() {
        let mut prev = Rank::MIN.spec();
        for value in 2..=MAX_RANK {
            let spec = Rank::new(value).unwrap().spec();
            assert!(spec.width > prev.width);
            assert!(spec.height > prev.height);
            prev = spec;
        }
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rank>("3").is_ok());
        assert!(serde_json::from_str::<Rank>("0").is_err());
        assert!(serde_json::from_str::<Rank>("12").is_err());
    }
}
