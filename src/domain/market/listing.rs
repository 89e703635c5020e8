use crate::domain::player::Player;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A player currently offered for sale
///
/// # Invariants
/// - At most one listing exists per player
/// - Exists iff the player is for sale and not yet sold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketListing {
    id: Uuid,
    player_id: Uuid,
    created_at: DateTime<Utc>,
}

impl MarketListing {
    pub fn new(player_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn player_id(&self) -> Uuid {
        self.player_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstructs a MarketListing from persistence layer data
    pub fn from_persistence(id: Uuid, player_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            player_id,
            created_at,
        }
    }
}

/// A listing joined with the data needed to browse and filter it
#[derive(Debug, Clone, PartialEq)]
pub struct MarketEntry {
    pub listing: MarketListing,
    pub player: Player,
    pub team_name: String,
}

/// One page of a filtered query plus the total number of matches
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub count: usize,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Slices an already filtered and ordered collection
    pub fn from_matches(matches: Vec<T>, offset: usize, limit: usize) -> Self {
        let count = matches.len();
        let results = matches.into_iter().skip(offset).take(limit).collect();
        Self { count, results }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.results.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
