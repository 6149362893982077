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

mod utils;

use failure::Error;
use hermod::connections::{ConnectionsDb, ScanOrder};
use hermod::schedule::Calendar;
use hermod::time::{PositiveDuration, SecondsSinceDayStart};
use hermod::{Stop, TransitData, Trip};
use utils::init_logger;

// deterministic pseudo-random sequence, good enough to shuffle a timetable
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self, bound: u32) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) as u32) % bound
    }
}

fn random_data(nb_of_connections: usize) -> TransitData {
    let calendar = Calendar::new(
        "2020-01-01".parse().unwrap(),
        "2020-01-07".parse().unwrap(),
    )
    .unwrap();
    let mut data = TransitData::new(calendar, PositiveDuration::from_hms(0, 10, 0));

    let mut lcg = Lcg::new(0x5eed);
    let stops: Vec<Stop> = (0..50)
        .map(|idx| data.add_stop(0.001 * idx as f32, 0.0, idx))
        .collect();
    let schedule = data.add_schedule();
    data.set_schedule_active(schedule, &"2020-01-01".parse().unwrap())
        .unwrap();
    let trips: Vec<Trip> = (0..20).map(|idx| data.add_trip(schedule, 0, idx)).collect();

    for _ in 0..nb_of_connections {
        let departure_stop = stops[lcg.next(50) as usize];
        let arrival_stop = stops[lcg.next(50) as usize];
        let trip = trips[lcg.next(20) as usize];
        let departure = lcg.next(100_000);
        let duration = 1 + lcg.next(3_000);
        data.add_connection(
            departure_stop,
            arrival_stop,
            trip,
            SecondsSinceDayStart::from_seconds(departure),
            SecondsSinceDayStart::from_seconds(departure + duration),
        )
        .unwrap();
    }
    data
}

#[test]
fn round_trip_yields_identical_records() -> Result<(), Error> {
    init_logger();

    let mut data = random_data(500);
    data.sort_connections(ScanOrder::ByDepartureTime);

    let mut bytes = Vec::new();
    data.connections().serialize(&mut bytes)?;
    let reopened = ConnectionsDb::deserialize(&mut bytes.as_slice())?;

    for order in [ScanOrder::ByDepartureTime, ScanOrder::ByArrivalTime] {
        let original: Vec<_> = data.connections().enumerator(order)?.collect();
        let read_back: Vec<_> = reopened.enumerator(order)?.collect();
        assert_eq!(original, read_back);
    }

    Ok(())
}

#[test]
fn whole_database_round_trip() -> Result<(), Error> {
    init_logger();

    let mut data = random_data(200);
    data.sort_connections(ScanOrder::ByDepartureTime);

    let mut bytes = Vec::new();
    data.serialize(&mut bytes)?;
    let reopened = TransitData::deserialize(&mut bytes.as_slice())?;

    assert_eq!(reopened.nb_of_stops(), data.nb_of_stops());
    assert_eq!(reopened.nb_of_trips(), data.nb_of_trips());
    let original: Vec<_> = data
        .connections()
        .enumerator(ScanOrder::ByDepartureTime)?
        .collect();
    let read_back: Vec<_> = reopened
        .connections()
        .enumerator(ScanOrder::ByDepartureTime)?
        .collect();
    assert_eq!(original, read_back);

    Ok(())
}

#[test]
fn sorting_is_total_on_both_keys() -> Result<(), Error> {
    init_logger();

    let mut data = random_data(500);
    data.sort_connections(ScanOrder::ByDepartureTime);
    let db = data.connections();

    let departures: Vec<_> = db
        .enumerator(ScanOrder::ByDepartureTime)?
        .map(|c| (c.departure_time, c.trip))
        .collect();
    for pair in departures.windows(2) {
        assert!(pair[0] <= pair[1], "departure ordering violated: {:?}", pair);
    }

    let arrivals: Vec<_> = db
        .enumerator(ScanOrder::ByArrivalTime)?
        .map(|c| (c.arrival_time, c.trip))
        .collect();
    for pair in arrivals.windows(2) {
        assert!(pair[0] <= pair[1], "arrival ordering violated: {:?}", pair);
    }

    // the two enumerations visit the same multiset of records
    let mut by_departure: Vec<_> = db.enumerator(ScanOrder::ByDepartureTime)?.collect();
    let mut by_arrival: Vec<_> = db.enumerator(ScanOrder::ByArrivalTime)?.collect();
    by_departure.sort_by_key(|c| c.id);
    by_arrival.sort_by_key(|c| c.id);
    assert_eq!(by_departure, by_arrival);

    Ok(())
}

#[test]
fn sorting_by_arrival_works_symmetrically() -> Result<(), Error> {
    init_logger();

    let mut data = random_data(200);
    data.sort_connections(ScanOrder::ByArrivalTime);
    let db = data.connections();

    let arrivals: Vec<_> = db
        .enumerator(ScanOrder::ByArrivalTime)?
        .map(|c| (c.arrival_time, c.trip))
        .collect();
    for pair in arrivals.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    let departures: Vec<_> = db
        .enumerator(ScanOrder::ByDepartureTime)?
        .map(|c| (c.departure_time, c.trip))
        .collect();
    for pair in departures.windows(2) {
        assert!(pair[0] <= pair[1]);
    }

    Ok(())
}
