use chrono::NaiveDate;
use log::{debug, trace};

use crate::cancellation::CancelToken;
use crate::connections::{Connection, EnumerationError, ScanOrder};
use crate::engine::stop_profile::{ProfileEntry, StopProfile};
use crate::engine::trip_status::{TripStatus, TripStatuses};
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Stop, TransitData, Trip};

/// How a profile scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTermination {
    /// at least one target stop was reached by a vehicle
    Succeeded,
    /// the scan completed without reaching any target stop
    NoRoute,
    /// the cancellation token fired; partial results are not observable
    Cancelled,
}

/// Forward profile scan over the connections of one day.
///
/// Connections are swept in ascending departure-time order. For each
/// one, boarding is possible either from the departure stop's profile
/// (on foot from the source, or alighted from an earlier vehicle) or by
/// staying aboard an already-reached trip. Accepted arrivals update the
/// arrival stop's Pareto front and propagate over footpath transfers to
/// neighbor stops.
///
/// Transfer counts are profile indices: the source seed sits at index
/// 0, boarding a vehicle fresh from index k records k + 1 on the trip,
/// every arrival of that trip lands at the trip's count + 1, and a
/// footpath hop adds one more.
pub struct ProfileSearch<'data, Filter> {
    data: &'data TransitData,
    date: NaiveDate,
    trip_filter: Filter,
    max_nb_of_transfers: usize,

    profiles: Vec<StopProfile>, // map a stop to its pareto front
    trip_statuses: TripStatuses,
    trip_possible: Vec<Option<bool>>, // memoized schedule gate, per trip

    target_walks: Vec<Option<PositiveDuration>>, // final-leg walk, per stop
    target_stops: Vec<Stop>,
    max_arrival_time: Option<SecondsSinceDayStart>,
    best_target_arrival: Option<SecondsSinceDayStart>, // includes the final walk

    best_target: Option<(Stop, usize, SecondsSinceDayStart)>,
}

impl<'data, Filter> ProfileSearch<'data, Filter>
where
    Filter: Fn(Trip, &NaiveDate) -> bool,
{
    pub fn new(
        data: &'data TransitData,
        date: NaiveDate,
        trip_filter: Filter,
        max_nb_of_transfers: usize,
    ) -> Self {
        let nb_of_stops = data.nb_of_stops();
        let nb_of_trips = data.nb_of_trips();
        Self {
            data,
            date,
            trip_filter,
            max_nb_of_transfers,
            profiles: vec![StopProfile::new(); nb_of_stops],
            trip_statuses: TripStatuses::new(nb_of_trips),
            trip_possible: vec![None; nb_of_trips],
            target_walks: vec![None; nb_of_stops],
            target_stops: Vec::new(),
            max_arrival_time: None,
            best_target_arrival: None,
            best_target: None,
        }
    }

    /// Seeds the scan: the traveler can be at `stop`, ready to board,
    /// from `time` on.
    pub fn set_source_stop(&mut self, stop: Stop, time: SecondsSinceDayStart) {
        self.profiles[stop.idx].try_insert(0, ProfileEntry::Departure { time });
    }

    /// Registers `stop` as a way out of the transit network, `walk`
    /// away from the target point.
    pub fn set_target_stop(&mut self, stop: Stop, walk: PositiveDuration) {
        match self.target_walks[stop.idx] {
            Some(current) if current <= walk => {}
            Some(_) => {
                self.target_walks[stop.idx] = Some(walk);
            }
            None => {
                self.target_walks[stop.idx] = Some(walk);
                self.target_stops.push(stop);
            }
        }
    }

    /// Caps the scan: connections departing at or after this time are
    /// never useful.
    pub fn set_max_arrival_time(&mut self, time: SecondsSinceDayStart) {
        self.max_arrival_time = Some(time);
    }

    pub fn run(&mut self, cancel: &CancelToken) -> Result<SearchTermination, EnumerationError> {
        let enumerator = self.data.connections().enumerator(ScanOrder::ByDepartureTime)?;
        debug!(
            "Starting profile scan on {} with {} source profile(s) and {} target stop(s).",
            self.date,
            self.profiles.iter().filter(|p| !p.is_empty()).count(),
            self.target_stops.len()
        );

        let mut nb_of_scanned = 0u64;
        for connection in enumerator {
            if cancel.is_cancelled() {
                debug!("Profile scan cancelled after {} connections.", nb_of_scanned);
                return Ok(SearchTermination::Cancelled);
            }
            if let Some(bound) = self.arrival_bound() {
                if connection.departure_time >= bound {
                    trace!(
                        "Stopping the scan: departures from {} on cannot beat the best arrival {}.",
                        connection.departure_time,
                        bound
                    );
                    break;
                }
            }
            nb_of_scanned += 1;
            self.scan_connection(&connection);
        }

        self.best_target = self.select_best_target();
        let termination = if self.best_target.is_some() {
            SearchTermination::Succeeded
        } else {
            SearchTermination::NoRoute
        };
        debug!(
            "Profile scan done after {} connections: {:?}.",
            nb_of_scanned, termination
        );
        Ok(termination)
    }

    /// The target stop, transfer count and arrival time (final walk
    /// included) of the best journey found, once `run` succeeded.
    pub fn best_target(&self) -> Option<(Stop, usize, SecondsSinceDayStart)> {
        self.best_target
    }

    pub fn stop_profile(&self, stop: Stop) -> &StopProfile {
        &self.profiles[stop.idx]
    }

    pub fn final_walk(&self, stop: Stop) -> Option<PositiveDuration> {
        self.target_walks[stop.idx]
    }

    pub(crate) fn transit_data(&self) -> &'data TransitData {
        self.data
    }

    fn arrival_bound(&self) -> Option<SecondsSinceDayStart> {
        match (self.max_arrival_time, self.best_target_arrival) {
            (Some(max), Some(best)) => Some(max.min(best)),
            (Some(max), None) => Some(max),
            (None, best) => best,
        }
    }

    // scan one connection:
    // - reads the departure stop profile and the trip status
    // - updates the trip status, the arrival stop profile, the
    //   neighbor profiles and the best target arrival
    fn scan_connection(&mut self, connection: &Connection) {
        if !self.trip_is_possible(connection.trip) {
            return;
        }

        let by_foot = self.profiles[connection.departure_stop.idx]
            .earliest_at_or_before(connection.departure_time)
            .map(|(transfers, _)| transfers + 1);
        let aboard = self
            .trip_statuses
            .status(connection.trip)
            .map(|status| status.transfers_when_boarded);
        let boarded_transfers = match (by_foot, aboard) {
            (None, None) => {
                return;
            }
            (Some(fresh), None) => fresh,
            (None, Some(continuing)) => continuing,
            (Some(fresh), Some(continuing)) => fresh.min(continuing),
        };

        self.trip_statuses.board(
            connection.trip,
            TripStatus {
                board_stop: connection.departure_stop,
                board_time: connection.departure_time,
                transfers_when_boarded: boarded_transfers,
            },
        );

        let arrival_transfers = boarded_transfers + 1;
        if arrival_transfers > self.max_nb_of_transfers {
            return;
        }
        let accepted = self.profiles[connection.arrival_stop.idx].try_insert(
            arrival_transfers,
            ProfileEntry::Vehicle {
                arrival: connection.arrival_time,
                connection: connection.id,
                boarded_from: connection.departure_stop,
            },
        );
        if !accepted {
            return;
        }

        if let Some(walk) = self.target_walks[connection.arrival_stop.idx] {
            let with_walk = connection.arrival_time + walk;
            if self
                .best_target_arrival
                .map_or(true, |best| with_walk < best)
            {
                self.best_target_arrival = Some(with_walk);
            }
        }

        let footpath_transfers = arrival_transfers + 1;
        if footpath_transfers > self.max_nb_of_transfers {
            return;
        }
        let data = self.data;
        for &(neighbor, walk) in data.transfers().neighbors(connection.arrival_stop) {
            self.profiles[neighbor.idx].try_insert(
                footpath_transfers,
                ProfileEntry::Footpath {
                    arrival: connection.arrival_time + walk,
                    from_stop: connection.arrival_stop,
                    walk,
                },
            );
        }
    }

    fn trip_is_possible(&mut self, trip: Trip) -> bool {
        if let Some(possible) = self.trip_possible[trip.idx] {
            return possible;
        }
        let possible = (self.trip_filter)(trip, &self.date);
        self.trip_possible[trip.idx] = Some(possible);
        possible
    }

    fn select_best_target(&self) -> Option<(Stop, usize, SecondsSinceDayStart)> {
        let mut best: Option<(Stop, usize, SecondsSinceDayStart)> = None;
        for &stop in &self.target_stops {
            let (transfers, entry) = match self.profiles[stop.idx].best_vehicle() {
                Some(found) => found,
                None => continue,
            };
            let arrival = match entry {
                ProfileEntry::Vehicle { arrival, .. } => arrival,
                _ => continue,
            };
            let walk = match self.target_walks[stop.idx] {
                Some(walk) => walk,
                None => continue,
            };
            let with_walk = arrival + walk;
            let is_better = match best {
                None => true,
                Some((_, best_transfers, best_arrival)) => {
                    with_walk < best_arrival
                        || (with_walk == best_arrival && transfers < best_transfers)
                }
            };
            if is_better {
                best = Some((stop, transfers, with_walk));
            }
        }
        best
    }
}
