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

use std::collections::HashMap;
use std::str::FromStr;

use hermod::chrono::NaiveDate;
use hermod::schedule::{Calendar, Schedule};
use hermod::time::{PositiveDuration, SecondsSinceDayStart};
use hermod::connections::ScanOrder;
use hermod::{Stop, TransitData, Trip};

const DEFAULT_CALENDAR_ID: &str = "default_service";

/// Builder used to easily create a `TransitData` fixture.
/// Note: if not explicitly set, all the vehicle journeys will be
/// attached to a default calendar active on 2020-01-01.
pub struct ModelBuilder {
    data: TransitData,
    stops: HashMap<String, Stop>,
    schedules: HashMap<String, Schedule>,
    trips: HashMap<String, Trip>,
}

/// Builder used to create a new vehicle journey; the connections
/// between its consecutive stop times are recorded when the builder is
/// dropped, at the end of the closure passed to `ModelBuilder::vj`.
pub struct VehicleJourneyBuilder<'a> {
    model: &'a mut ModelBuilder,
    name: String,
    calendar_id: String,
    stop_times: Vec<(String, SecondsSinceDayStart, SecondsSinceDayStart)>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        let date = "2020-01-01";
        Self::new(date, "2020-01-02")
            .calendar(DEFAULT_CALENDAR_ID, &[date])
    }
}

impl ModelBuilder {
    pub fn new(start_validity_period: &str, end_validity_period: &str) -> Self {
        let first_date = NaiveDate::from_str(start_validity_period).unwrap();
        let last_date = NaiveDate::from_str(end_validity_period).unwrap();
        let calendar = Calendar::new(first_date, last_date).unwrap();
        Self {
            data: TransitData::new(calendar, PositiveDuration::from_hms(0, 30, 0)),
            stops: HashMap::new(),
            schedules: HashMap::new(),
            trips: HashMap::new(),
        }
    }

    pub fn calendar(mut self, id: &str, dates: &[&str]) -> Self {
        let schedule = self.data.add_schedule();
        for date in dates {
            let date = NaiveDate::from_str(date).unwrap();
            self.data
                .set_schedule_active(schedule, &date)
                .unwrap_or_else(|| panic!("date {} is out of the validity period", date));
        }
        self.schedules.insert(id.to_string(), schedule);
        self
    }

    /// Add a new vehicle journey to the model:
    ///
    /// ```ignore
    /// let model = ModelBuilder::default()
    ///     .vj("toto", |vj| {
    ///         vj.st("A", "10:00:00", "10:00:00")
    ///             .st("B", "11:00:00", "11:00:00");
    ///     })
    ///     .build();
    /// ```
    pub fn vj<F>(mut self, name: &str, vj_initer: F) -> Self
    where
        F: FnOnce(VehicleJourneyBuilder),
    {
        let vj_builder = VehicleJourneyBuilder {
            model: &mut self,
            name: name.to_string(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            stop_times: Vec::new(),
        };
        vj_initer(vj_builder);
        self
    }

    pub fn add_transfer(mut self, from: &str, to: &str, seconds: u32) -> Self {
        let from = self.stop(from);
        let to = self.stop(to);
        assert!(self
            .data
            .add_transfer(from, to, PositiveDuration::from_seconds(seconds)));
        self
    }

    pub fn build(mut self) -> Model {
        self.data.sort_connections(ScanOrder::ByDepartureTime);
        Model {
            data: self.data,
            stops: self.stops,
            trips: self.trips,
        }
    }

    fn stop(&mut self, name: &str) -> Stop {
        if let Some(stop) = self.stops.get(name) {
            return *stop;
        }
        // synthetic coordinates: the scenarios only care about ids
        let idx = self.stops.len() as u32;
        let stop = self
            .data
            .add_stop(0.001 * idx as f32, 0.002 * idx as f32, idx);
        self.stops.insert(name.to_string(), stop);
        stop
    }
}

/// A built fixture, with its stops and trips accessible by name.
pub struct Model {
    pub data: TransitData,
    stops: HashMap<String, Stop>,
    trips: HashMap<String, Trip>,
}

impl Model {
    pub fn stop(&self, name: &str) -> Stop {
        *self
            .stops
            .get(name)
            .unwrap_or_else(|| panic!("unknown stop {}", name))
    }

    pub fn trip(&self, name: &str) -> Trip {
        *self
            .trips
            .get(name)
            .unwrap_or_else(|| panic!("unknown trip {}", name))
    }
}

impl<'a> VehicleJourneyBuilder<'a> {
    pub fn calendar(mut self, id: &str) -> Self {
        self.calendar_id = id.to_string();
        self
    }

    /// Adds a stop time: the vehicle arrives at `arrival` and leaves at
    /// `departure`.
    pub fn st(mut self, stop: &str, arrival: &str, departure: &str) -> Self {
        let arrival = parse_time(arrival);
        let departure = parse_time(departure);
        self.stop_times.push((stop.to_string(), arrival, departure));
        self
    }
}

impl<'a> Drop for VehicleJourneyBuilder<'a> {
    fn drop(&mut self) {
        let schedule = *self
            .model
            .schedules
            .get(&self.calendar_id)
            .unwrap_or_else(|| panic!("unknown calendar {}", self.calendar_id));
        let trip_meta_id = self.model.trips.len() as u32;
        let trip = self.model.data.add_trip(schedule, 0, trip_meta_id);
        assert!(
            self.model.trips.insert(self.name.clone(), trip).is_none(),
            "vj {} already exists",
            self.name
        );

        let stop_times = std::mem::take(&mut self.stop_times);
        for window in stop_times.windows(2) {
            let (from_name, _, departure) = &window[0];
            let (to_name, arrival, _) = &window[1];
            let from = self.model.stop(from_name);
            let to = self.model.stop(to_name);
            self.model
                .data
                .add_connection(from, to, trip, *departure, *arrival)
                .unwrap_or_else(|err| panic!("bad stop times on vj {}: {}", self.name, err));
        }
    }
}

fn parse_time(text: &str) -> SecondsSinceDayStart {
    let duration = PositiveDuration::from_str(text).unwrap();
    SecondsSinceDayStart::from_seconds(duration.total_seconds())
}
