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

//! Sectioned on-disk layout of a whole transit database, so that a
//! query server can build once and reopen read-only: stops, trips, the
//! service calendar with its per-schedule allowed days, the connections
//! section (its own self-describing layout) and the footpath transfers.

use std::io::{Read, Write};

use chrono::{Datelike, NaiveDate};

use crate::connections::serialize::{read_i64, read_u32, read_u8, CorruptedDb as CorruptedConnections};
use crate::connections::ConnectionsDb;
use crate::schedule::{Calendar, Schedule, SchedulesDb};
use crate::time::PositiveDuration;
use crate::transfers::TransfersDb;

use super::{StopData, TransitData, TripData};

const VERSION: u8 = 1;

#[derive(Debug)]
pub enum CorruptedDb {
    UnsupportedVersion(u8),
    BadCount(i64),
    BadValidityPeriod,
    BadStopIdx(u32),
    Connections(CorruptedConnections),
    Io(std::io::Error),
}

impl std::fmt::Display for CorruptedDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorruptedDb::UnsupportedVersion(version) => write!(
                f,
                "Cannot read a transit database with version {}, expected {}.",
                version, VERSION
            ),
            CorruptedDb::BadCount(count) => {
                write!(f, "Corrupted transit database: bad element count {}.", count)
            }
            CorruptedDb::BadValidityPeriod => {
                write!(f, "Corrupted transit database: bad validity period.")
            }
            CorruptedDb::BadStopIdx(idx) => {
                write!(f, "Corrupted transit database: unknown stop index {}.", idx)
            }
            CorruptedDb::Connections(err) => {
                write!(f, "Corrupted transit database: {}", err)
            }
            CorruptedDb::Io(err) => write!(f, "Failed to read transit database: {}", err),
        }
    }
}

impl std::error::Error for CorruptedDb {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CorruptedDb::Connections(err) => Some(err),
            CorruptedDb::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CorruptedDb {
    fn from(err: std::io::Error) -> Self {
        CorruptedDb::Io(err)
    }
}

impl From<CorruptedConnections> for CorruptedDb {
    fn from(err: CorruptedConnections) -> Self {
        CorruptedDb::Connections(err)
    }
}

impl TransitData {
    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        writer.write_all(&[VERSION])?;

        writer.write_all(&(self.stops_data.len() as i64).to_le_bytes())?;
        for stop_data in &self.stops_data {
            writer.write_all(&stop_data.lat.to_le_bytes())?;
            writer.write_all(&stop_data.lon.to_le_bytes())?;
            writer.write_all(&stop_data.meta_id.to_le_bytes())?;
        }

        writer.write_all(&(self.trips_data.len() as i64).to_le_bytes())?;
        for trip_data in &self.trips_data {
            writer.write_all(&(trip_data.schedule.idx as u32).to_le_bytes())?;
            writer.write_all(&trip_data.agency_meta_id.to_le_bytes())?;
            writer.write_all(&trip_data.trip_meta_id.to_le_bytes())?;
        }

        let calendar = self.schedules.calendar();
        writer.write_all(&calendar.first_date().num_days_from_ce().to_le_bytes())?;
        writer.write_all(&calendar.last_date().num_days_from_ce().to_le_bytes())?;
        writer.write_all(&(self.schedules.nb_of_schedules() as i64).to_le_bytes())?;
        for idx in 0..self.schedules.nb_of_schedules() {
            let days = self.schedules.allowed_days(Schedule { idx });
            for &allowed in days {
                writer.write_all(&[u8::from(allowed)])?;
            }
        }

        self.connections.serialize(writer)?;

        writer.write_all(
            &self
                .transfers
                .max_transfer_duration()
                .total_seconds()
                .to_le_bytes(),
        )?;
        let transfer_entries: Vec<_> = self.transfers.entries().collect();
        writer.write_all(&(transfer_entries.len() as i64).to_le_bytes())?;
        for (a, b, duration) in transfer_entries {
            writer.write_all(&(a.idx as u32).to_le_bytes())?;
            writer.write_all(&(b.idx as u32).to_le_bytes())?;
            writer.write_all(&duration.total_seconds().to_le_bytes())?;
        }

        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<TransitData, CorruptedDb> {
        let version = read_u8(reader)?;
        if version != VERSION {
            return Err(CorruptedDb::UnsupportedVersion(version));
        }

        let nb_of_stops = read_count(reader)?;
        let mut stops_data = Vec::with_capacity(nb_of_stops);
        for _ in 0..nb_of_stops {
            let lat = f32::from_le_bytes(read_u32(reader)?.to_le_bytes());
            let lon = f32::from_le_bytes(read_u32(reader)?.to_le_bytes());
            let meta_id = read_u32(reader)?;
            stops_data.push(StopData { lat, lon, meta_id });
        }

        let nb_of_trips = read_count(reader)?;
        let mut trips_data = Vec::with_capacity(nb_of_trips);
        for _ in 0..nb_of_trips {
            let schedule_idx = read_u32(reader)? as usize;
            let agency_meta_id = read_u32(reader)?;
            let trip_meta_id = read_u32(reader)?;
            trips_data.push(TripData {
                schedule: Schedule { idx: schedule_idx },
                agency_meta_id,
                trip_meta_id,
            });
        }

        let first_date = read_date(reader)?;
        let last_date = read_date(reader)?;
        let calendar =
            Calendar::new(first_date, last_date).map_err(|_| CorruptedDb::BadValidityPeriod)?;
        let nb_of_days = usize::from(calendar.nb_of_days());
        let nb_of_schedules = read_count(reader)?;
        let mut allowed_days = Vec::with_capacity(nb_of_schedules);
        for _ in 0..nb_of_schedules {
            let mut days = vec![false; nb_of_days];
            for day in days.iter_mut() {
                *day = read_u8(reader)? != 0;
            }
            allowed_days.push(days);
        }
        let schedules = SchedulesDb::from_raw_parts(calendar, allowed_days);

        let connections = ConnectionsDb::deserialize(reader)?;

        let max_transfer_duration = PositiveDuration::from_seconds(read_u32(reader)?);
        let mut transfers = TransfersDb::new(max_transfer_duration);
        let nb_of_transfers = read_count(reader)?;
        for _ in 0..nb_of_transfers {
            let a_idx = read_u32(reader)?;
            let b_idx = read_u32(reader)?;
            let seconds = read_u32(reader)?;
            let a = stop_from_word(a_idx, nb_of_stops)?;
            let b = stop_from_word(b_idx, nb_of_stops)?;
            transfers.add(a, b, PositiveDuration::from_seconds(seconds));
        }

        Ok(TransitData::from_raw_parts(
            stops_data,
            trips_data,
            schedules,
            connections,
            transfers,
        ))
    }
}

fn read_count<R: Read>(reader: &mut R) -> Result<usize, CorruptedDb> {
    let count = read_i64(reader)?;
    if count < 0 || count > u32::MAX as i64 {
        return Err(CorruptedDb::BadCount(count));
    }
    Ok(count as usize)
}

fn read_date<R: Read>(reader: &mut R) -> Result<NaiveDate, CorruptedDb> {
    let days = i32::from_le_bytes(read_u32(reader)?.to_le_bytes());
    NaiveDate::from_num_days_from_ce_opt(days).ok_or(CorruptedDb::BadValidityPeriod)
}

fn stop_from_word(word: u32, nb_of_stops: usize) -> Result<super::Stop, CorruptedDb> {
    let idx = word as usize;
    if idx >= nb_of_stops {
        return Err(CorruptedDb::BadStopIdx(word));
    }
    Ok(super::Stop { idx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::ScanOrder;
    use crate::time::SecondsSinceDayStart;
    use crate::transit_data::TransitData;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_data() -> TransitData {
        let calendar = Calendar::new(date("2020-01-01"), date("2020-01-07")).unwrap();
        let mut data = TransitData::new(calendar, PositiveDuration::from_hms(0, 10, 0));
        let stop_a = data.add_stop(48.85, 2.35, 10);
        let stop_b = data.add_stop(48.86, 2.36, 11);
        let stop_c = data.add_stop(48.87, 2.37, 12);
        let schedule = data.add_schedule();
        data.set_schedule_active(schedule, &date("2020-01-02")).unwrap();
        let trip = data.add_trip(schedule, 1, 2);
        data.add_connection(
            stop_a,
            stop_b,
            trip,
            SecondsSinceDayStart::from_hms(8, 0, 0),
            SecondsSinceDayStart::from_hms(8, 10, 0),
        )
        .unwrap();
        data.add_transfer(stop_b, stop_c, PositiveDuration::from_seconds(120));
        data.sort_connections(ScanOrder::ByDepartureTime);
        data
    }

    #[test]
    fn whole_db_round_trip() {
        let data = sample_data();
        let mut bytes = Vec::new();
        data.serialize(&mut bytes).unwrap();

        let reopened = TransitData::deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(reopened.nb_of_stops(), 3);
        assert_eq!(reopened.nb_of_trips(), 1);
        assert_eq!(reopened.stop_data(super::super::Stop { idx: 1 }).meta_id, 11);
        assert_eq!(reopened.calendar().first_date(), date("2020-01-01"));

        let trip = super::super::Trip { idx: 0 };
        assert!(reopened.trip_is_possible(trip, &date("2020-01-02")));
        assert!(!reopened.trip_is_possible(trip, &date("2020-01-03")));

        let original: Vec<_> = data
            .connections()
            .enumerator(ScanOrder::ByDepartureTime)
            .unwrap()
            .collect();
        let read_back: Vec<_> = reopened
            .connections()
            .enumerator(ScanOrder::ByDepartureTime)
            .unwrap()
            .collect();
        assert_eq!(original, read_back);

        assert_eq!(reopened.transfers().nb_of_transfers(), 1);
    }

    #[test]
    fn bad_version_is_refused() {
        let data = sample_data();
        let mut bytes = Vec::new();
        data.serialize(&mut bytes).unwrap();
        bytes[0] = 2;
        assert!(matches!(
            TransitData::deserialize(&mut bytes.as_slice()),
            Err(CorruptedDb::UnsupportedVersion(2))
        ));
    }
}
