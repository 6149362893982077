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

use chrono::{NaiveDateTime, Timelike};
use log::{debug, warn};

use crate::cancellation::CancelToken;
use crate::config::RequestParams;
use crate::connections::EnumerationError;
use crate::engine::profile_search::{ProfileSearch, SearchTermination};
use crate::engine::route_builder::{self, ReconstructionError};
use crate::response::{BadRoute, RoadSection, Route};
use crate::road::closest_stops::AccessTermination;
use crate::road::{
    AccessProfile, ClosestStopsError, ClosestStopsSearch, Coord, RoadGraph, RouterPoint,
};
use crate::stop_links::{EdgeLinks, StopLinksDb};
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Stop, TransitData};

/// One routing request: from a geographic point to another, departing
/// at a date and time.
#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub datetime: NaiveDateTime,
    pub source: RouterPoint,
    pub target: RouterPoint,
}

pub enum SolverOutcome {
    Route(Route),
    /// nothing connects the two points under the request parameters;
    /// not an error
    NoRoute,
    Cancelled,
}

#[derive(Debug)]
pub enum BadRequest {
    DepartureDatetime,
}

impl std::fmt::Display for BadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadRequest::DepartureDatetime => write!(
                f,
                "The requested datetime is out of the validity period of the data."
            ),
        }
    }
}

impl std::error::Error for BadRequest {}

#[derive(Debug)]
pub enum SolverError {
    BadRequest(BadRequest),
    ClosestStops(ClosestStopsError),
    ConnectionsNotSorted(EnumerationError),
    Reconstruction(ReconstructionError),
    BadRoute(BadRoute),
    /// an access search reported a stop but cannot rebuild its path
    LostBoundaryPath(Stop),
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::BadRequest(err) => write!(f, "{}", err),
            SolverError::ClosestStops(err) => write!(f, "{}", err),
            SolverError::ConnectionsNotSorted(err) => write!(f, "{}", err),
            SolverError::Reconstruction(err) => write!(f, "{}", err),
            SolverError::BadRoute(err) => write!(f, "{}", err),
            SolverError::LostBoundaryPath(stop) => write!(
                f,
                "The access search reported stop {} but cannot rebuild its road path.",
                stop.idx
            ),
        }
    }
}

impl std::error::Error for SolverError {}

impl From<ClosestStopsError> for SolverError {
    fn from(err: ClosestStopsError) -> Self {
        SolverError::ClosestStops(err)
    }
}

impl From<EnumerationError> for SolverError {
    fn from(err: EnumerationError) -> Self {
        SolverError::ConnectionsNotSorted(err)
    }
}

impl From<ReconstructionError> for SolverError {
    fn from(err: ReconstructionError) -> Self {
        SolverError::Reconstruction(err)
    }
}

impl From<BadRoute> for SolverError {
    fn from(err: BadRoute) -> Self {
        SolverError::BadRoute(err)
    }
}

/// Answers one query: a forward access search seeds the boarding stops,
/// a backward access search seeds the alighting stops, a profile scan
/// sweeps the connections, and the chosen journey is stitched between
/// its two boundary road paths.
///
/// The pipeline is sequential and single-threaded; all stores are read
/// only here, so many queries may run concurrently against them.
pub fn solve<Graph, Profile>(
    data: &TransitData,
    graph: &Graph,
    profile: &Profile,
    links: &StopLinksDb,
    edge_links: &EdgeLinks,
    query: &Query,
    params: &RequestParams,
    cancel: &CancelToken,
) -> Result<SolverOutcome, SolverError>
where
    Graph: RoadGraph,
    Profile: AccessProfile,
{
    let date = query.datetime.date();
    if !data.calendar().contains(&date) {
        warn!(
            "The departure datetime {:?} is out of the allowed dates. \
             Allowed dates are between {:?} and {:?}.",
            query.datetime,
            data.calendar().first_date(),
            data.calendar().last_date(),
        );
        return Err(SolverError::BadRequest(BadRequest::DepartureDatetime));
    }
    let departure_time =
        SecondsSinceDayStart::from_seconds(query.datetime.time().num_seconds_from_midnight());
    let max_access_seconds = params.max_access_duration.total_seconds();

    // forward: from the source point towards boarding stops
    let mut forward = ClosestStopsSearch::new(
        graph,
        profile,
        query.source,
        false,
        max_access_seconds,
        links,
        edge_links,
    )?;
    if forward.run(cancel, |_, _| false) == AccessTermination::Cancelled {
        return Ok(SolverOutcome::Cancelled);
    }
    let sources: Vec<_> = forward.found_stops().collect();
    if sources.is_empty() {
        debug!("No stop reachable from the source point.");
        return Ok(SolverOutcome::NoRoute);
    }

    // backward: from alighting stops towards the target point
    let mut backward = ClosestStopsSearch::new(
        graph,
        profile,
        query.target,
        true,
        max_access_seconds,
        links,
        edge_links,
    )?;
    if backward.run(cancel, |_, _| false) == AccessTermination::Cancelled {
        return Ok(SolverOutcome::Cancelled);
    }
    let targets: Vec<_> = backward.found_stops().collect();
    if targets.is_empty() {
        debug!("No stop reaches the target point.");
        return Ok(SolverOutcome::NoRoute);
    }

    let max_transfers = 2 * usize::from(params.max_nb_of_legs) + 2;
    let mut search = ProfileSearch::new(
        data,
        date,
        |trip, day| data.trip_is_possible(trip, day),
        max_transfers,
    );
    for &(stop, seconds) in &sources {
        search.set_source_stop(
            stop,
            departure_time + PositiveDuration::from_seconds(seconds),
        );
    }
    for &(stop, seconds) in &targets {
        search.set_target_stop(stop, PositiveDuration::from_seconds(seconds));
    }
    search.set_max_arrival_time(departure_time + params.max_journey_duration);

    match search.run(cancel)? {
        SearchTermination::Cancelled => {
            return Ok(SolverOutcome::Cancelled);
        }
        SearchTermination::NoRoute => {
            return Ok(SolverOutcome::NoRoute);
        }
        SearchTermination::Succeeded => {}
    }

    let journey = route_builder::build_journey(&search)?;

    let board_stop = journey.first_vehicle().from_stop;
    let mut access = road_section(&forward, board_stop)?;
    access.points.push(stop_coord(data, board_stop));

    let alight_stop = journey
        .sections()
        .last()
        .map(crate::response::Section::to_stop)
        .unwrap_or(board_stop);
    let mut egress = road_section(&backward, alight_stop)?;
    egress.points.insert(0, stop_coord(data, alight_stop));

    let route = Route::new(departure_time, access, journey, egress, data)?;
    Ok(SolverOutcome::Route(route))
}

fn road_section<Graph, Profile>(
    search: &ClosestStopsSearch<'_, Graph, Profile>,
    stop: Stop,
) -> Result<RoadSection, SolverError>
where
    Graph: RoadGraph,
    Profile: AccessProfile,
{
    let path = search
        .path_to(stop)
        .ok_or(SolverError::LostBoundaryPath(stop))?;
    Ok(RoadSection {
        points: path.points,
        duration: PositiveDuration::from_seconds(path.weight),
    })
}

fn stop_coord(data: &TransitData, stop: Stop) -> Coord {
    let stop_data = data.stop_data(stop);
    Coord {
        lat: stop_data.lat,
        lon: stop_data.lon,
    }
}
