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

/// Identifies a service calendar shared by one or more trips.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Schedule {
    pub(crate) idx: usize,
}

/// The validity period of the dataset.
pub struct Calendar {
    first_date: NaiveDate, //first date which may be allowed
    last_date: NaiveDate,  //last date (included) which may be allowed
    nb_of_days: u16,       // == (last_date - first_date).num_days() + 1
}

// we allow 36_600 days which is more than 100 years, and less than u16::MAX = 65_535 days
const MAX_DAYS_IN_CALENDAR: i64 = 100 * 366;

#[derive(Debug)]
pub struct BadValidityPeriod {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl std::fmt::Display for BadValidityPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bad validity period [{}, {}]. The first date must not be after \
             the last one, and the period must span less than {} days.",
            self.first_date, self.last_date, MAX_DAYS_IN_CALENDAR
        )
    }
}

impl std::error::Error for BadValidityPeriod {}

impl Calendar {
    pub fn new(first_date: NaiveDate, last_date: NaiveDate) -> Result<Self, BadValidityPeriod> {
        let nb_of_days = (last_date - first_date).num_days() + 1;
        if nb_of_days <= 0 || nb_of_days > MAX_DAYS_IN_CALENDAR {
            return Err(BadValidityPeriod {
                first_date,
                last_date,
            });
        }
        Ok(Self {
            first_date,
            last_date,
            nb_of_days: nb_of_days as u16,
        })
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn nb_of_days(&self) -> u16 {
        self.nb_of_days
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.first_date <= *date && *date <= self.last_date
    }

    pub fn date_to_offset(&self, date: &NaiveDate) -> Option<u16> {
        if !self.contains(date) {
            return None;
        }
        let offset = (*date - self.first_date).num_days();
        // contains() guarantees 0 <= offset < nb_of_days <= u16::MAX
        Some(offset as u16)
    }
}

/// Maps each schedule to the set of dates on which its trips operate.
///
/// One allowed-days bitset per schedule over the calendar's validity
/// period, so that the trip filter of the connection scan is a single
/// indexed lookup.
pub struct SchedulesDb {
    calendar: Calendar,
    allowed_days: Vec<Vec<bool>>, // one entry per schedule, nb_of_days bools each
}

impl SchedulesDb {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            allowed_days: Vec::new(),
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn nb_of_schedules(&self) -> usize {
        self.allowed_days.len()
    }

    pub fn add(&mut self) -> Schedule {
        let idx = self.allowed_days.len();
        self.allowed_days
            .push(vec![false; usize::from(self.calendar.nb_of_days)]);
        Schedule { idx }
    }

    /// Marks `date` as an operating day of `schedule`. Dates outside the
    /// validity period are refused.
    pub fn set_active(&mut self, schedule: Schedule, date: &NaiveDate) -> Option<()> {
        let offset = self.calendar.date_to_offset(date)?;
        let days = self.allowed_days.get_mut(schedule.idx)?;
        days[usize::from(offset)] = true;
        Some(())
    }

    pub fn is_active(&self, schedule: Schedule, date: &NaiveDate) -> bool {
        let has_offset = self.calendar.date_to_offset(date);
        match has_offset {
            None => false,
            Some(offset) => self
                .allowed_days
                .get(schedule.idx)
                .map_or(false, |days| days[usize::from(offset)]),
        }
    }

    pub(crate) fn allowed_days(&self, schedule: Schedule) -> &[bool] {
        &self.allowed_days[schedule.idx]
    }

    pub(crate) fn from_raw_parts(calendar: Calendar, allowed_days: Vec<Vec<bool>>) -> Self {
        Self {
            calendar,
            allowed_days,
        }
    }
}
