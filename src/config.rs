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

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::PositiveDuration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    /// maximum duration of a journey, counted from the requested
    /// departure time to the arrival at the target point
    #[serde(default = "default_max_journey_duration")]
    pub max_journey_duration: PositiveDuration,

    /// maximum walking time from the source point to a boarding stop,
    /// and from an alighting stop to the target point
    #[serde(default = "default_max_access_duration")]
    pub max_access_duration: PositiveDuration,

    /// maximum number of vehicle legs in a journey
    #[serde(default = "default_max_nb_of_legs")]
    pub max_nb_of_legs: u8,
}

pub const DEFAULT_MAX_JOURNEY_DURATION: &str = "24:00:00";
pub const DEFAULT_MAX_ACCESS_DURATION: &str = "00:20:00";
pub const DEFAULT_MAX_NB_LEGS: &str = "10";

pub fn default_max_journey_duration() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_MAX_JOURNEY_DURATION).unwrap()
}

pub fn default_max_access_duration() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_MAX_ACCESS_DURATION).unwrap()
}

pub fn default_max_nb_of_legs() -> u8 {
    u8::from_str(DEFAULT_MAX_NB_LEGS).unwrap()
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            max_journey_duration: default_max_journey_duration(),
            max_access_duration: default_max_access_duration(),
            max_nb_of_legs: default_max_nb_of_legs(),
        }
    }
}

impl Display for RequestParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "--max_journey_duration {} --max_access_duration {} --max_nb_of_legs {}",
            self.max_journey_duration, self.max_access_duration, self.max_nb_of_legs
        )
    }
}
