use chrono::NaiveDate;

use crate::engine::profile_search::ProfileSearch;
use crate::engine::stop_profile::ProfileEntry;
use crate::response::{BadJourney, Journey, Section, TransferSection, VehicleSection};
use crate::transit_data::Trip;

#[derive(Debug)]
pub enum ReconstructionError {
    /// the scan reached no target stop
    NoJourney,
    /// a back-pointer chain does not lead back to a source seed
    BrokenProfileChain,
    Journey(BadJourney),
}

impl std::fmt::Display for ReconstructionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconstructionError::NoJourney => {
                write!(f, "No journey to reconstruct: the scan found no route.")
            }
            ReconstructionError::BrokenProfileChain => write!(
                f,
                "Cannot walk the profile chain back to a source stop."
            ),
            ReconstructionError::Journey(err) => {
                write!(f, "The reconstructed journey is invalid: {}", err)
            }
        }
    }
}

impl std::error::Error for ReconstructionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconstructionError::Journey(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BadJourney> for ReconstructionError {
    fn from(err: BadJourney) -> Self {
        ReconstructionError::Journey(err)
    }
}

/// Walks the back-pointers of the best target profile down to a source
/// seed, then assembles the sections in travel order, merging the
/// connections ridden on one trip into a single vehicle section.
pub fn build_journey<Filter>(
    search: &ProfileSearch<'_, Filter>,
) -> Result<Journey, ReconstructionError>
where
    Filter: Fn(Trip, &NaiveDate) -> bool,
{
    let (target_stop, transfers, _) = search.best_target().ok_or(ReconstructionError::NoJourney)?;
    let data = search.transit_data();

    // collected backwards, from the target to the source
    let mut backwards: Vec<Section> = Vec::new();
    let mut entry = search.stop_profile(target_stop).entry(transfers);
    let mut current_stop = target_stop;
    let departure_time = loop {
        match entry {
            ProfileEntry::Vehicle {
                connection: connection_id,
                ..
            } => {
                let connection = data.connections().connection(connection_id);
                backwards.push(Section::Vehicle(VehicleSection {
                    trip: connection.trip,
                    from_stop: connection.departure_stop,
                    to_stop: connection.arrival_stop,
                    from_time: connection.departure_time,
                    to_time: connection.arrival_time,
                }));
                let (_, previous) = search
                    .stop_profile(connection.departure_stop)
                    .earliest_at_or_before(connection.departure_time)
                    .ok_or(ReconstructionError::BrokenProfileChain)?;
                current_stop = connection.departure_stop;
                entry = previous;
            }
            ProfileEntry::Footpath {
                arrival,
                from_stop,
                walk,
            } => {
                let start = arrival - walk;
                backwards.push(Section::Transfer(TransferSection {
                    from_stop,
                    to_stop: current_stop,
                    from_time: start,
                    to_time: arrival,
                }));
                let (_, previous) = search
                    .stop_profile(from_stop)
                    .earliest_at_or_before(start)
                    .ok_or(ReconstructionError::BrokenProfileChain)?;
                current_stop = from_stop;
                entry = previous;
            }
            ProfileEntry::Departure { time } => {
                break time;
            }
            ProfileEntry::Empty => {
                return Err(ReconstructionError::BrokenProfileChain);
            }
        }
    };

    backwards.reverse();
    let sections = merge_same_trip(backwards);
    let arrival_time = sections
        .last()
        .map(Section::to_time)
        .unwrap_or(departure_time);
    let journey = Journey::new(departure_time, sections, arrival_time)?;
    Ok(journey)
}

// connections of one trip appear as consecutive vehicle sections;
// riding through a stop is not a transfer
fn merge_same_trip(sections: Vec<Section>) -> Vec<Section> {
    let mut merged: Vec<Section> = Vec::new();
    for section in sections {
        match section {
            Section::Vehicle(current) => {
                if let Some(Section::Vehicle(previous)) = merged.last_mut() {
                    if previous.trip == current.trip && previous.to_stop == current.from_stop {
                        previous.to_stop = current.to_stop;
                        previous.to_time = current.to_time;
                        continue;
                    }
                }
                merged.push(Section::Vehicle(current));
            }
            transfer => {
                merged.push(transfer);
            }
        }
    }
    merged
}
