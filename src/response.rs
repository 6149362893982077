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

use crate::road::Coord;
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Stop, TransitData, Trip};

/// A ride aboard one vehicle, boarding at `from_stop` and alighting at
/// `to_stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleSection {
    pub trip: Trip,
    pub from_stop: Stop,
    pub to_stop: Stop,
    pub from_time: SecondsSinceDayStart,
    pub to_time: SecondsSinceDayStart,
}

/// A walk between two nearby stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSection {
    pub from_stop: Stop,
    pub to_stop: Stop,
    pub from_time: SecondsSinceDayStart,
    pub to_time: SecondsSinceDayStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Vehicle(VehicleSection),
    Transfer(TransferSection),
}

impl Section {
    pub fn from_stop(&self) -> Stop {
        match self {
            Section::Vehicle(vehicle) => vehicle.from_stop,
            Section::Transfer(transfer) => transfer.from_stop,
        }
    }

    pub fn to_stop(&self) -> Stop {
        match self {
            Section::Vehicle(vehicle) => vehicle.to_stop,
            Section::Transfer(transfer) => transfer.to_stop,
        }
    }

    pub fn from_time(&self) -> SecondsSinceDayStart {
        match self {
            Section::Vehicle(vehicle) => vehicle.from_time,
            Section::Transfer(transfer) => transfer.from_time,
        }
    }

    pub fn to_time(&self) -> SecondsSinceDayStart {
        match self {
            Section::Vehicle(vehicle) => vehicle.to_time,
            Section::Transfer(transfer) => transfer.to_time,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BadJourney {
    NoVehicleSection,
    DoesNotStartWithVehicle,
    DoesNotEndWithVehicle,
    DisconnectedSections(usize),
    TimeGoesBackwards(usize),
    DepartsBeforeBeingThere,
}

impl std::fmt::Display for BadJourney {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadJourney::NoVehicleSection => write!(f, "The journey has no vehicle section."),
            BadJourney::DoesNotStartWithVehicle => {
                write!(f, "The journey does not start with a vehicle section.")
            }
            BadJourney::DoesNotEndWithVehicle => {
                write!(f, "The journey does not end with a vehicle section.")
            }
            BadJourney::DisconnectedSections(idx) => write!(
                f,
                "Section {} does not start at the stop the previous one ends at.",
                idx
            ),
            BadJourney::TimeGoesBackwards(idx) => {
                write!(f, "Section {} goes backward in time.", idx)
            }
            BadJourney::DepartsBeforeBeingThere => write!(
                f,
                "The first section departs before the traveler reaches its stop."
            ),
        }
    }
}

impl std::error::Error for BadJourney {}

/// The transit part of an itinerary: vehicles and stop-to-stop walks,
/// from the boarding stop to the alighting stop.
#[derive(Debug, Clone)]
pub struct Journey {
    /// when the traveler is at the first stop, ready to board
    pub departure_time: SecondsSinceDayStart,
    sections: Vec<Section>,
    pub arrival_time: SecondsSinceDayStart,
}

impl Journey {
    pub fn new(
        departure_time: SecondsSinceDayStart,
        sections: Vec<Section>,
        arrival_time: SecondsSinceDayStart,
    ) -> Result<Self, BadJourney> {
        let journey = Self {
            departure_time,
            sections,
            arrival_time,
        };
        journey.is_valid()?;
        Ok(journey)
    }

    fn is_valid(&self) -> Result<(), BadJourney> {
        let first = self.sections.first().ok_or(BadJourney::NoVehicleSection)?;
        match first {
            Section::Vehicle(vehicle) => {
                if vehicle.from_time < self.departure_time {
                    return Err(BadJourney::DepartsBeforeBeingThere);
                }
            }
            Section::Transfer(_) => {
                return Err(BadJourney::DoesNotStartWithVehicle);
            }
        }
        match self.sections.last() {
            Some(Section::Vehicle(vehicle)) => {
                if vehicle.to_time != self.arrival_time {
                    return Err(BadJourney::TimeGoesBackwards(self.sections.len() - 1));
                }
            }
            _ => {
                return Err(BadJourney::DoesNotEndWithVehicle);
            }
        }
        for (idx, section) in self.sections.iter().enumerate() {
            if section.to_time() < section.from_time() {
                return Err(BadJourney::TimeGoesBackwards(idx));
            }
            if idx > 0 {
                let previous = &self.sections[idx - 1];
                if previous.to_stop() != section.from_stop() {
                    return Err(BadJourney::DisconnectedSections(idx));
                }
                if section.from_time() < previous.to_time() {
                    return Err(BadJourney::TimeGoesBackwards(idx));
                }
            }
        }
        Ok(())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn nb_of_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn first_vehicle(&self) -> &VehicleSection {
        // is_valid() checked the first section exists and is a vehicle
        match &self.sections[0] {
            Section::Vehicle(vehicle) => vehicle,
            Section::Transfer(_) => unreachable!("journey starts with a transfer"),
        }
    }

    pub fn nb_of_vehicle_sections(&self) -> usize {
        self.sections
            .iter()
            .filter(|section| matches!(section, Section::Vehicle(_)))
            .count()
    }

    pub fn nb_of_transfers(&self) -> usize {
        self.nb_of_vehicle_sections().saturating_sub(1)
    }

    pub fn first_vehicle_board_time(&self) -> SecondsSinceDayStart {
        self.first_vehicle().from_time
    }

    pub fn last_vehicle_debark_time(&self) -> SecondsSinceDayStart {
        self.arrival_time
    }

    /// Arrival minus departure; by construction the section durations
    /// and waits in between sum to exactly this.
    pub fn total_duration(&self) -> PositiveDuration {
        self.arrival_time
            .duration_since(&self.departure_time)
            .unwrap_or_else(PositiveDuration::zero)
    }
}

/// A leg on the road network, as a polyline with a travel time.
#[derive(Debug, Clone)]
pub struct RoadSection {
    pub points: Vec<Coord>,
    pub duration: PositiveDuration,
}

#[derive(Debug, Clone)]
pub enum BadRoute {
    DisconnectedAccess,
    DisconnectedEgress,
}

impl std::fmt::Display for BadRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadRoute::DisconnectedAccess => write!(
                f,
                "The access road path does not end at the first boarding stop."
            ),
            BadRoute::DisconnectedEgress => write!(
                f,
                "The egress road path does not start at the last alighting stop."
            ),
        }
    }
}

impl std::error::Error for BadRoute {}

/// tolerance when matching road path endpoints against stop coordinates
const COORD_EPSILON: f32 = 1e-4;

fn close_enough(a: &Coord, b: &Coord) -> bool {
    (a.lat - b.lat).abs() <= COORD_EPSILON && (a.lon - b.lon).abs() <= COORD_EPSILON
}

/// A complete multimodal itinerary:
/// source point → (access walk) → transit journey → (egress walk) → target point.
#[derive(Debug, Clone)]
pub struct Route {
    pub departure_time: SecondsSinceDayStart,
    pub access: RoadSection,
    pub journey: Journey,
    pub egress: RoadSection,
    pub arrival_time: SecondsSinceDayStart,
}

impl Route {
    /// Concatenates the three parts, checking that adjacent legs share
    /// an endpoint up to a small tolerance.
    pub fn new(
        departure_time: SecondsSinceDayStart,
        access: RoadSection,
        journey: Journey,
        egress: RoadSection,
        data: &TransitData,
    ) -> Result<Self, BadRoute> {
        let first_stop = data.stop_data(journey.first_vehicle().from_stop);
        let first_stop_coord = Coord {
            lat: first_stop.lat,
            lon: first_stop.lon,
        };
        if let Some(last_point) = access.points.last() {
            if !close_enough(last_point, &first_stop_coord) {
                return Err(BadRoute::DisconnectedAccess);
            }
        }

        let last_stop = data.stop_data(journey.sections().last().map(Section::to_stop).unwrap_or(
            journey.first_vehicle().to_stop,
        ));
        let last_stop_coord = Coord {
            lat: last_stop.lat,
            lon: last_stop.lon,
        };
        if let Some(first_point) = egress.points.first() {
            if !close_enough(first_point, &last_stop_coord) {
                return Err(BadRoute::DisconnectedEgress);
            }
        }

        let arrival_time = journey.arrival_time + egress.duration;
        Ok(Self {
            departure_time,
            access,
            journey,
            egress,
            arrival_time,
        })
    }

    pub fn total_duration(&self) -> PositiveDuration {
        self.arrival_time
            .duration_since(&self.departure_time)
            .unwrap_or_else(PositiveDuration::zero)
    }
}
