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

use chrono::NaiveDate;

use crate::connections::{ConnectionId, ConnectionsDb, InsertionError, ScanOrder};
use crate::schedule::{Calendar, Schedule, SchedulesDb};
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transfers::TransfersDb;

pub mod serialize;

/// A boarding/alighting point. Stop ids are dense from 0.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Stop {
    pub(crate) idx: usize,
}

/// A vehicle run bundling the connections that share it.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Trip {
    pub(crate) idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopData {
    pub lat: f32,
    pub lon: f32,
    pub meta_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripData {
    pub schedule: Schedule,
    pub agency_meta_id: u32,
    pub trip_meta_id: u32,
}

/// All timetable data needed to answer queries: stops, trips, the
/// connections database, footpath transfers and service calendars.
///
/// Built once, then immutable at query time; safe to share across
/// query threads. The builder methods are not thread-safe.
pub struct TransitData {
    stops_data: Vec<StopData>,
    trips_data: Vec<TripData>,
    schedules: SchedulesDb,
    connections: ConnectionsDb,
    transfers: TransfersDb,
}

impl TransitData {
    pub fn new(calendar: Calendar, max_transfer_duration: PositiveDuration) -> Self {
        Self {
            stops_data: Vec::new(),
            trips_data: Vec::new(),
            schedules: SchedulesDb::new(calendar),
            connections: ConnectionsDb::new(),
            transfers: TransfersDb::new(max_transfer_duration),
        }
    }

    pub fn add_stop(&mut self, lat: f32, lon: f32, meta_id: u32) -> Stop {
        let idx = self.stops_data.len();
        self.stops_data.push(StopData { lat, lon, meta_id });
        Stop { idx }
    }

    pub fn add_schedule(&mut self) -> Schedule {
        self.schedules.add()
    }

    pub fn set_schedule_active(&mut self, schedule: Schedule, date: &NaiveDate) -> Option<()> {
        self.schedules.set_active(schedule, date)
    }

    pub fn add_trip(&mut self, schedule: Schedule, agency_meta_id: u32, trip_meta_id: u32) -> Trip {
        debug_assert!(schedule.idx < self.schedules.nb_of_schedules());
        let idx = self.trips_data.len();
        self.trips_data.push(TripData {
            schedule,
            agency_meta_id,
            trip_meta_id,
        });
        Trip { idx }
    }

    pub fn add_connection(
        &mut self,
        departure_stop: Stop,
        arrival_stop: Stop,
        trip: Trip,
        departure_time: SecondsSinceDayStart,
        arrival_time: SecondsSinceDayStart,
    ) -> Result<ConnectionId, InsertionError> {
        debug_assert!(departure_stop.idx < self.stops_data.len());
        debug_assert!(arrival_stop.idx < self.stops_data.len());
        debug_assert!(trip.idx < self.trips_data.len());
        self.connections
            .add(departure_stop, arrival_stop, trip, departure_time, arrival_time)
    }

    pub fn add_transfer(&mut self, a: Stop, b: Stop, duration: PositiveDuration) -> bool {
        debug_assert!(a.idx < self.stops_data.len());
        debug_assert!(b.idx < self.stops_data.len());
        self.transfers.add(a, b, duration)
    }

    /// To be called once after the last insertion, before any query.
    pub fn sort_connections(&mut self, order: ScanOrder) {
        self.connections.sort(order);
    }

    pub fn nb_of_stops(&self) -> usize {
        self.stops_data.len()
    }

    pub fn nb_of_trips(&self) -> usize {
        self.trips_data.len()
    }

    pub fn stop_data(&self, stop: Stop) -> &StopData {
        &self.stops_data[stop.idx]
    }

    pub fn trip_data(&self, trip: Trip) -> &TripData {
        &self.trips_data[trip.idx]
    }

    pub fn stop_idx_to_usize(&self, stop: &Stop) -> usize {
        stop.idx
    }

    pub fn stop_from_idx(&self, idx: usize) -> Option<Stop> {
        if idx < self.stops_data.len() {
            Some(Stop { idx })
        } else {
            None
        }
    }

    pub fn connections(&self) -> &ConnectionsDb {
        &self.connections
    }

    pub fn transfers(&self) -> &TransfersDb {
        &self.transfers
    }

    pub fn schedules(&self) -> &SchedulesDb {
        &self.schedules
    }

    pub fn calendar(&self) -> &Calendar {
        self.schedules.calendar()
    }

    /// The schedule filter of the connection scan: does `trip` operate
    /// on `date`?
    pub fn trip_is_possible(&self, trip: Trip, date: &NaiveDate) -> bool {
        let schedule = self.trips_data[trip.idx].schedule;
        self.schedules.is_active(schedule, date)
    }

    pub(crate) fn from_raw_parts(
        stops_data: Vec<StopData>,
        trips_data: Vec<TripData>,
        schedules: SchedulesDb,
        connections: ConnectionsDb,
        transfers: TransfersDb,
    ) -> Self {
        Self {
            stops_data,
            trips_data,
            schedules,
            connections,
            transfers,
        }
    }
}
