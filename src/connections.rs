// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

use crate::time::SecondsSinceDayStart;
use crate::transit_data::{Stop, Trip};

pub mod serialize;

/// number of u32 words per stored connection
const CONNECTION_SIZE: usize = 4;

const DEPARTURE_TIME_BITS: u32 = 17;
const DEPARTURE_TIME_MASK: u32 = (1 << DEPARTURE_TIME_BITS) - 1;

/// latest storable departure time, a bit more than 36h after day start
pub const MAX_DEPARTURE_TIME_SECONDS: u32 = (1 << 17) - 1;
/// longest storable connection, 9h06m07s
pub const MAX_DURATION_SECONDS: u32 = (1 << 15) - 1;

/// Position of a connection in the departure-time ordering of its
/// database. Assigned by `ConnectionsDb::sort`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct ConnectionId {
    pub(crate) idx: usize,
}

/// One atomic vehicle movement between two consecutive stops of a trip.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Connection {
    pub departure_stop: Stop,
    pub arrival_stop: Stop,
    pub trip: Trip,
    pub departure_time: SecondsSinceDayStart,
    pub arrival_time: SecondsSinceDayStart,
    pub id: ConnectionId,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Sorting {
    NotSorted,
    ByDepartureTime,
    ByArrivalTime,
}

/// The ordering a scan wants to traverse connections in.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ScanOrder {
    ByDepartureTime,
    ByArrivalTime,
}

/// Columnar storage of all timetabled connections.
///
/// `connections` holds four u32 words per record:
///   word 0: departure stop
///   word 1: arrival stop
///   word 2: trip
///   word 3: departure time in the low 17 bits, duration in the next 15
///
/// After `sort(primary)` the record array itself is in primary-key order
/// and `order` holds the permutation realizing the other ordering: the
/// i-th record of the alternate ordering is `connections[order[i]]`.
pub struct ConnectionsDb {
    connections: Vec<u32>,
    order: Vec<u32>,
    sorting: Sorting,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InsertionError {
    /// arrival_time <= departure_time
    ArrivalBeforeDeparture {
        departure_time: SecondsSinceDayStart,
        arrival_time: SecondsSinceDayStart,
    },
    /// duration does not fit in 15 bits
    DurationOutOfBound {
        duration_seconds: u32,
    },
    /// departure time does not fit in 17 bits
    DepartureTimeOutOfBound {
        departure_time: SecondsSinceDayStart,
    },
}

impl std::fmt::Display for InsertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertionError::ArrivalBeforeDeparture {
                departure_time,
                arrival_time,
            } => write!(
                f,
                "Bad connection: the arrival time {} is not after the departure time {}.",
                arrival_time, departure_time
            ),
            InsertionError::DurationOutOfBound { duration_seconds } => write!(
                f,
                "Bad connection: the duration {}s exceeds the maximum storable {}s.",
                duration_seconds, MAX_DURATION_SECONDS
            ),
            InsertionError::DepartureTimeOutOfBound { departure_time } => write!(
                f,
                "Bad connection: the departure time {} exceeds the maximum storable {}s.",
                departure_time, MAX_DEPARTURE_TIME_SECONDS
            ),
        }
    }
}

impl std::error::Error for InsertionError {}

#[derive(Debug, PartialEq, Eq)]
pub enum EnumerationError {
    /// the database has not been sorted yet
    NotSorted,
}

impl std::fmt::Display for EnumerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumerationError::NotSorted => {
                write!(f, "The connections database has not been sorted.")
            }
        }
    }
}

impl std::error::Error for EnumerationError {}

impl Default for ConnectionsDb {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionsDb {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
            order: Vec::new(),
            sorting: Sorting::NotSorted,
        }
    }

    pub fn nb_of_connections(&self) -> usize {
        self.connections.len() / CONNECTION_SIZE
    }

    pub fn sorting(&self) -> Sorting {
        self.sorting
    }

    /// Appends a connection. Ids increase with each call; they are
    /// re-assigned by `sort`, which puts the database back in the
    /// `NotSorted` state's opposite.
    pub fn add(
        &mut self,
        departure_stop: Stop,
        arrival_stop: Stop,
        trip: Trip,
        departure_time: SecondsSinceDayStart,
        arrival_time: SecondsSinceDayStart,
    ) -> Result<ConnectionId, InsertionError> {
        if arrival_time <= departure_time {
            return Err(InsertionError::ArrivalBeforeDeparture {
                departure_time,
                arrival_time,
            });
        }
        let duration_seconds = arrival_time.total_seconds() - departure_time.total_seconds();
        if duration_seconds > MAX_DURATION_SECONDS {
            return Err(InsertionError::DurationOutOfBound { duration_seconds });
        }
        if departure_time.total_seconds() > MAX_DEPARTURE_TIME_SECONDS {
            return Err(InsertionError::DepartureTimeOutOfBound { departure_time });
        }

        let idx = self.nb_of_connections();
        self.connections.push(stop_to_word(departure_stop));
        self.connections.push(stop_to_word(arrival_stop));
        self.connections.push(trip_to_word(trip));
        self.connections
            .push(departure_time.total_seconds() | (duration_seconds << DEPARTURE_TIME_BITS));
        self.sorting = Sorting::NotSorted;
        self.order.clear();
        Ok(ConnectionId { idx })
    }

    /// Sorts the record array by `primary` (ties broken by trip id) and
    /// rebuilds the `order` permutation for the other key by sorting a
    /// plain index array against the already-permuted records.
    pub fn sort(&mut self, primary: ScanOrder) {
        let nb = self.nb_of_connections();

        let mut permutation: Vec<u32> = (0..nb as u32).collect();
        match primary {
            ScanOrder::ByDepartureTime => {
                permutation.sort_by_key(|&idx| self.departure_key(idx as usize));
            }
            ScanOrder::ByArrivalTime => {
                permutation.sort_by_key(|&idx| self.arrival_key(idx as usize));
            }
        }

        let mut sorted = Vec::with_capacity(self.connections.len());
        for &idx in &permutation {
            let offset = idx as usize * CONNECTION_SIZE;
            sorted.extend_from_slice(&self.connections[offset..offset + CONNECTION_SIZE]);
        }
        self.connections = sorted;

        let mut order: Vec<u32> = (0..nb as u32).collect();
        match primary {
            ScanOrder::ByDepartureTime => {
                order.sort_by_key(|&idx| self.arrival_key(idx as usize));
                self.sorting = Sorting::ByDepartureTime;
            }
            ScanOrder::ByArrivalTime => {
                order.sort_by_key(|&idx| self.departure_key(idx as usize));
                self.sorting = Sorting::ByArrivalTime;
            }
        }
        self.order = order;
    }

    /// Reads the connection stored at position `id` of the primary
    /// ordering.
    pub fn connection(&self, id: ConnectionId) -> Connection {
        self.decode(id.idx)
    }

    /// An enumerator traversing connections in the requested order.
    /// Fails when the database has not been sorted: neither ordering is
    /// realized before `sort` ran.
    pub fn enumerator(&self, order: ScanOrder) -> Result<ConnectionsEnumerator<'_>, EnumerationError> {
        let through_order = match (self.sorting, order) {
            (Sorting::NotSorted, _) => {
                return Err(EnumerationError::NotSorted);
            }
            (Sorting::ByDepartureTime, ScanOrder::ByDepartureTime)
            | (Sorting::ByArrivalTime, ScanOrder::ByArrivalTime) => false,
            (Sorting::ByDepartureTime, ScanOrder::ByArrivalTime)
            | (Sorting::ByArrivalTime, ScanOrder::ByDepartureTime) => true,
        };
        Ok(ConnectionsEnumerator {
            db: self,
            through_order,
            position: None,
        })
    }

    fn departure_key(&self, idx: usize) -> (u32, u32) {
        let offset = idx * CONNECTION_SIZE;
        let packed = self.connections[offset + 3];
        (packed & DEPARTURE_TIME_MASK, self.connections[offset + 2])
    }

    fn arrival_key(&self, idx: usize) -> (u32, u32) {
        let offset = idx * CONNECTION_SIZE;
        let packed = self.connections[offset + 3];
        let departure = packed & DEPARTURE_TIME_MASK;
        let duration = packed >> DEPARTURE_TIME_BITS;
        (departure + duration, self.connections[offset + 2])
    }

    fn decode(&self, idx: usize) -> Connection {
        let offset = idx * CONNECTION_SIZE;
        let packed = self.connections[offset + 3];
        let departure = packed & DEPARTURE_TIME_MASK;
        let duration = packed >> DEPARTURE_TIME_BITS;
        Connection {
            departure_stop: Stop {
                idx: self.connections[offset] as usize,
            },
            arrival_stop: Stop {
                idx: self.connections[offset + 1] as usize,
            },
            trip: Trip {
                idx: self.connections[offset + 2] as usize,
            },
            departure_time: SecondsSinceDayStart::from_seconds(departure),
            arrival_time: SecondsSinceDayStart::from_seconds(departure + duration),
            id: ConnectionId { idx },
        }
    }

    pub(crate) fn raw_parts(&self) -> (&[u32], &[u32], Sorting) {
        (&self.connections, &self.order, self.sorting)
    }

    pub(crate) fn from_raw_parts(connections: Vec<u32>, order: Vec<u32>, sorting: Sorting) -> Self {
        Self {
            connections,
            order,
            sorting,
        }
    }
}

fn stop_to_word(stop: Stop) -> u32 {
    debug_assert!(stop.idx <= u32::MAX as usize);
    stop.idx as u32
}

fn trip_to_word(trip: Trip) -> u32 {
    debug_assert!(trip.idx <= u32::MAX as usize);
    trip.idx as u32
}

/// Cursor over the connections of a sorted database.
///
/// The cursor position is logical, counted in the enumerator's own
/// ordering; when that ordering is the alternate one, the position is
/// translated through the `order` permutation exactly once, at
/// physical-index computation.
pub struct ConnectionsEnumerator<'db> {
    db: &'db ConnectionsDb,
    through_order: bool,
    position: Option<usize>,
}

impl<'db> ConnectionsEnumerator<'db> {
    pub fn move_next(&mut self) -> bool {
        let next = match self.position {
            None => 0,
            Some(position) => position + 1,
        };
        if next >= self.db.nb_of_connections() {
            return false;
        }
        self.position = Some(next);
        true
    }

    pub fn move_previous(&mut self) -> bool {
        match self.position {
            None | Some(0) => false,
            Some(position) => {
                self.position = Some(position - 1);
                true
            }
        }
    }

    pub fn move_to(&mut self, position: usize) -> bool {
        if position >= self.db.nb_of_connections() {
            return false;
        }
        self.position = Some(position);
        true
    }

    pub fn current(&self) -> Option<Connection> {
        let position = self.position?;
        let physical = if self.through_order {
            self.db.order[position] as usize
        } else {
            position
        };
        Some(self.db.decode(physical))
    }
}

impl<'db> Iterator for ConnectionsEnumerator<'db> {
    type Item = Connection;

    fn next(&mut self) -> Option<Connection> {
        if self.move_next() {
            self.current()
        } else {
            None
        }
    }
}
