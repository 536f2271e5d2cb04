//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! A match always has exactly two seats, `PlayerId(0)` and `PlayerId(1)`.
//!
//! ## PlayerPair
//!
//! Fixed two-slot storage indexed by `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Seat index of a player (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Number of seats in a match.
    pub const COUNT: usize = 2;

    /// Create a new player ID.
    ///
    /// Only 0 and 1 are meaningful; other values are folded onto the two seats.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id % 2)
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Both seats, in seat order.
    ///
    /// ```
    /// use lane_duel::core::PlayerId;
    ///
    /// let [a, b] = PlayerId::both();
    /// assert_eq!(a.opponent(), b);
    /// ```
    #[must_use]
    pub const fn both() -> [PlayerId; 2] {
        [PlayerId(0), PlayerId(1)]
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// One value per seat, indexable by `PlayerId`.
///
/// ```
/// use lane_duel::core::{PlayerId, PlayerPair};
///
/// let mut life = PlayerPair::with_value(8000);
/// life[PlayerId::new(1)] -= 500;
/// assert_eq!(life[PlayerId::new(0)], 8000);
/// assert_eq!(life[PlayerId::new(1)], 7500);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerPair<T> {
    data: [T; 2],
}

impl<T> PlayerPair<T> {
    /// Build both entries from a factory.
    pub fn new(mut factory: impl FnMut(PlayerId) -> T) -> Self {
        Self {
            data: [factory(PlayerId(0)), factory(PlayerId(1))],
        }
    }

    /// Both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over (PlayerId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }
}

impl<T> Index<PlayerId> for PlayerPair<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerPair<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
