use crate::connections::ConnectionId;
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::Stop;

/// One way of being at a stop, stored at the index of its transfer
/// count in the stop's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEntry {
    /// no way with exactly this transfer count
    Empty,
    /// waiting at the stop since `time`, seeded from the source point
    Departure { time: SecondsSinceDayStart },
    /// arrived at `arrival` aboard the vehicle of `connection`, which
    /// was entered at `boarded_from`
    Vehicle {
        arrival: SecondsSinceDayStart,
        connection: ConnectionId,
        boarded_from: Stop,
    },
    /// arrived at `arrival` by walking from `from_stop`
    Footpath {
        arrival: SecondsSinceDayStart,
        from_stop: Stop,
        walk: PositiveDuration,
    },
}

impl ProfileEntry {
    pub fn seconds(&self) -> Option<SecondsSinceDayStart> {
        match self {
            ProfileEntry::Empty => None,
            ProfileEntry::Departure { time } => Some(*time),
            ProfileEntry::Vehicle { arrival, .. } => Some(*arrival),
            ProfileEntry::Footpath { arrival, .. } => Some(*arrival),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ProfileEntry::Empty)
    }

    pub fn is_footpath(&self) -> bool {
        matches!(self, ProfileEntry::Footpath { .. })
    }
}

/// The Pareto front of (arrival time, transfer count) at one stop.
///
/// Transfer counts are the list indices, so dominance reduces to one
/// invariant: over non-empty entries, seconds strictly decrease as the
/// index grows.
#[derive(Debug, Clone)]
pub struct StopProfile {
    entries: Vec<ProfileEntry>,
}

impl StopProfile {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn nb_of_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, transfers: usize) -> ProfileEntry {
        self.entries
            .get(transfers)
            .copied()
            .unwrap_or(ProfileEntry::Empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileEntry> {
        self.entries.iter()
    }

    /// The entry with the fewest transfers among those reaching the
    /// stop at `time` or earlier: the one a vehicle departing at `time`
    /// can be boarded from.
    pub fn earliest_at_or_before(
        &self,
        time: SecondsSinceDayStart,
    ) -> Option<(usize, ProfileEntry)> {
        self.entries.iter().enumerate().find_map(|(transfers, entry)| {
            let seconds = entry.seconds()?;
            if seconds <= time {
                Some((transfers, *entry))
            } else {
                None
            }
        })
    }

    /// The entry with the smallest arrival time, i.e. the last
    /// non-empty one.
    pub fn best(&self) -> Option<(usize, ProfileEntry)> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| !entry.is_empty())
            .map(|(transfers, entry)| (transfers, *entry))
    }

    /// The smallest-arrival entry that ends a vehicle leg.
    pub fn best_vehicle(&self) -> Option<(usize, ProfileEntry)> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| matches!(entry, ProfileEntry::Vehicle { .. }))
            .map(|(transfers, entry)| (transfers, *entry))
    }

    /// Proposes `entry` at index `transfers`. Accepted iff it strictly
    /// improves over every entry with at most `transfers` transfers;
    /// entries with more transfers that the newcomer dominates are
    /// blanked out.
    pub fn try_insert(&mut self, transfers: usize, entry: ProfileEntry) -> bool {
        let candidate = match entry.seconds() {
            Some(seconds) => seconds,
            None => {
                return false;
            }
        };

        for existing in self.entries.iter().take(transfers + 1) {
            if let Some(seconds) = existing.seconds() {
                if seconds <= candidate {
                    return false;
                }
            }
        }

        if self.entries.len() <= transfers {
            self.entries.resize(transfers + 1, ProfileEntry::Empty);
        }
        self.entries[transfers] = entry;

        for existing in self.entries.iter_mut().skip(transfers + 1) {
            if let Some(seconds) = existing.seconds() {
                if seconds >= candidate {
                    *existing = ProfileEntry::Empty;
                }
            }
        }
        while self
            .entries
            .last()
            .map_or(false, |entry| entry.is_empty())
        {
            self.entries.pop();
        }

        debug_assert!(self.is_strictly_decreasing());
        true
    }

    fn is_strictly_decreasing(&self) -> bool {
        let mut previous: Option<SecondsSinceDayStart> = None;
        for entry in &self.entries {
            if let Some(seconds) = entry.seconds() {
                if let Some(previous_seconds) = previous {
                    if seconds >= previous_seconds {
                        return false;
                    }
                }
                previous = Some(seconds);
            }
        }
        true
    }
}

impl Default for StopProfile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(arrival: u32) -> ProfileEntry {
        ProfileEntry::Vehicle {
            arrival: SecondsSinceDayStart::from_seconds(arrival),
            connection: ConnectionId { idx: 0 },
            boarded_from: Stop { idx: 0 },
        }
    }

    #[test]
    fn insertion_keeps_seconds_strictly_decreasing() {
        let mut profile = StopProfile::new();
        assert!(profile.try_insert(2, vehicle(1000)));
        assert!(profile.try_insert(4, vehicle(900)));

        // same seconds with more transfers: dominated
        assert!(!profile.try_insert(6, vehicle(900)));
        // more seconds with more transfers: dominated
        assert!(!profile.try_insert(6, vehicle(950)));
        // fewer seconds with fewer transfers: dominates, blanks index 4
        assert!(profile.try_insert(2, vehicle(800)));

        assert_eq!(profile.entry(4), ProfileEntry::Empty);
        assert_eq!(profile.best(), Some((2, vehicle(800))));
    }

    #[test]
    fn earliest_at_or_before_picks_fewest_transfers() {
        let mut profile = StopProfile::new();
        profile.try_insert(2, vehicle(1000));
        profile.try_insert(4, vehicle(600));

        let time = SecondsSinceDayStart::from_seconds(1000);
        assert_eq!(profile.earliest_at_or_before(time), Some((2, vehicle(1000))));

        let earlier = SecondsSinceDayStart::from_seconds(700);
        assert_eq!(profile.earliest_at_or_before(earlier), Some((4, vehicle(600))));

        let too_early = SecondsSinceDayStart::from_seconds(599);
        assert_eq!(profile.earliest_at_or_before(too_early), None);
    }

    #[test]
    fn empty_proposal_is_refused() {
        let mut profile = StopProfile::new();
        assert!(!profile.try_insert(0, ProfileEntry::Empty));
        assert!(profile.is_empty());
    }
}
