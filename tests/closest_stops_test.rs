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
use hermod::road::closest_stops::AccessTermination;
use hermod::road::{
    AccessProfile, ClosestStopsError, ClosestStopsSearch, Coord, EdgeDirection, EdgeId, Factor,
    Metric, RoadGraph, RoadNetwork, WalkingProfile,
};
use hermod::schedule::Calendar;
use hermod::stop_links::StopLinksDb;
use hermod::time::PositiveDuration;
use hermod::{CancelToken, Stop, TransitData};
use utils::init_logger;

/// walking, except edges with meta 1 are one-way in storage orientation
struct OneWayAwareProfile;

impl AccessProfile for OneWayAwareProfile {
    fn name(&self) -> &str {
        "pedestrian_one_way"
    }

    fn metric(&self) -> Metric {
        Metric::TimeInSeconds
    }

    fn factor(&self, edge_meta: u32) -> Factor {
        Factor {
            seconds_per_meter: 3600.0 / 4000.0,
            direction: if edge_meta == 1 {
                EdgeDirection::Forward
            } else {
                EdgeDirection::Both
            },
        }
    }
}

struct DistanceProfile;

impl AccessProfile for DistanceProfile {
    fn name(&self) -> &str {
        "shortest"
    }

    fn metric(&self) -> Metric {
        Metric::DistanceInMeters
    }

    fn factor(&self, _edge_meta: u32) -> Factor {
        Factor {
            seconds_per_meter: 1.0,
            direction: EdgeDirection::Both,
        }
    }
}

struct Fixture {
    road: RoadNetwork,
    links: StopLinksDb,
    edges: Vec<EdgeId>,
    stop_on_source_edge: Stop,
    stop_mid_network: Stop,
    stop_behind_one_way: Stop,
}

// v0 --e0 (100m)-- v1 --e1 (100m, one-way)-- v2
//                   |
//                  e2 (50m)
//                   |
//                  v3
//
// one stop at 25% of e0, one at 50% of e1, one at the v3 end of e2
fn fixture() -> Fixture {
    let mut road = RoadNetwork::new();
    let v0 = road.add_vertex(Coord { lat: 0.0, lon: 0.0 });
    let v1 = road.add_vertex(Coord { lat: 0.0, lon: 0.001 });
    let v2 = road.add_vertex(Coord { lat: 0.0, lon: 0.002 });
    let v3 = road.add_vertex(Coord {
        lat: -0.0005,
        lon: 0.001,
    });
    let e0 = road.add_edge(v0, v1, 100.0, 0);
    let e1 = road.add_edge(v1, v2, 100.0, 1);
    let e2 = road.add_edge(v1, v3, 50.0, 0);

    let calendar = Calendar::new(
        "2020-01-01".parse().unwrap(),
        "2020-01-02".parse().unwrap(),
    )
    .unwrap();
    let mut data = TransitData::new(calendar, PositiveDuration::from_hms(0, 10, 0));
    let stop_on_source_edge = data.add_stop(0.0, 0.00025, 0);
    let stop_mid_network = data.add_stop(0.0, 0.0015, 1);
    let stop_behind_one_way = data.add_stop(-0.0005, 0.001, 2);

    let mut links = StopLinksDb::new("pedestrian_one_way", road.guid());
    links.add(stop_on_source_edge, e0, fraction(0.25)).unwrap();
    links.add(stop_mid_network, e1, fraction(0.5)).unwrap();
    links.add(stop_behind_one_way, e2, fraction(1.0)).unwrap();

    Fixture {
        road,
        links,
        edges: vec![e0, e1, e2],
        stop_on_source_edge,
        stop_mid_network,
        stop_behind_one_way,
    }
}

fn fraction(value: f32) -> u16 {
    (value * f32::from(u16::MAX)) as u16
}

#[test]
fn forward_search_finds_stops_with_travel_times() -> Result<(), Error> {
    init_logger();
    let fixture = fixture();
    let profile = OneWayAwareProfile;
    let edge_links = fixture.links.by_edge();

    // halfway along e0; walking costs 0.9 s/m
    let source = fixture.road.point_on_edge(fixture.edges[0], 0.5);
    let mut search = ClosestStopsSearch::new(
        &fixture.road,
        &profile,
        source,
        false,
        600,
        &fixture.links,
        &edge_links,
    )?;
    let termination = search.run(&CancelToken::new(), |_, _| false);
    assert_eq!(termination, AccessTermination::Completed);

    // on the source edge itself, no vertex in between
    assert_eq!(search.weight_to(fixture.stop_on_source_edge), Some(23));
    // source -> v1 (45s) -> half of e1 (45s)
    assert_eq!(search.weight_to(fixture.stop_mid_network), Some(90));
    // source -> v1 (45s) -> all of e2 (45s)
    assert_eq!(search.weight_to(fixture.stop_behind_one_way), Some(90));

    let path = search.path_to(fixture.stop_mid_network).unwrap();
    assert_eq!(path.weight, 90);
    let first = path.points.first().unwrap();
    assert!((first.lon - source.coord.lon).abs() < 1e-6);
    let last = path.points.last().unwrap();
    assert!((last.lon - 0.0015).abs() < 1e-6);

    let snapped = search.target_point(fixture.stop_mid_network).unwrap();
    assert_eq!(snapped.edge, fixture.edges[1]);
    assert_eq!(snapped.offset, fraction(0.5));

    Ok(())
}

#[test]
fn backward_search_honors_one_way_edges() -> Result<(), Error> {
    init_logger();
    let fixture = fixture();
    let profile = OneWayAwareProfile;
    let edge_links = fixture.links.by_edge();

    let target = fixture.road.point_on_edge(fixture.edges[0], 0.5);
    let mut search = ClosestStopsSearch::new(
        &fixture.road,
        &profile,
        target,
        true,
        600,
        &fixture.links,
        &edge_links,
    )?;
    search.run(&CancelToken::new(), |_, _| false);

    // walking from the one-way edge towards v1 goes against its
    // direction: the stop cannot reach the target
    assert_eq!(search.weight_to(fixture.stop_mid_network), None);
    // the two-way stops still can
    assert_eq!(search.weight_to(fixture.stop_on_source_edge), Some(23));
    assert_eq!(search.weight_to(fixture.stop_behind_one_way), Some(90));

    // backward paths run from the stop to the target point
    let path = search.path_to(fixture.stop_behind_one_way).unwrap();
    let first = path.points.first().unwrap();
    assert!((first.lat - (-0.0005)).abs() < 1e-6);
    let last = path.points.last().unwrap();
    assert!((last.lon - target.coord.lon).abs() < 1e-6);

    Ok(())
}

#[test]
fn budget_bounds_the_search() -> Result<(), Error> {
    init_logger();
    let fixture = fixture();
    let profile = OneWayAwareProfile;
    let edge_links = fixture.links.by_edge();

    let source = fixture.road.point_on_edge(fixture.edges[0], 0.5);
    let mut search = ClosestStopsSearch::new(
        &fixture.road,
        &profile,
        source,
        false,
        50,
        &fixture.links,
        &edge_links,
    )?;
    search.run(&CancelToken::new(), |_, _| false);

    assert_eq!(search.weight_to(fixture.stop_on_source_edge), Some(23));
    assert_eq!(search.weight_to(fixture.stop_mid_network), None);
    assert_eq!(search.weight_to(fixture.stop_behind_one_way), None);

    Ok(())
}

#[test]
fn visitor_can_stop_the_search_early() -> Result<(), Error> {
    init_logger();
    let fixture = fixture();
    let profile = OneWayAwareProfile;
    let edge_links = fixture.links.by_edge();

    let source = fixture.road.point_on_edge(fixture.edges[0], 0.5);
    let mut search = ClosestStopsSearch::new(
        &fixture.road,
        &profile,
        source,
        false,
        600,
        &fixture.links,
        &edge_links,
    )?;
    let mut nb_of_reports = 0;
    let termination = search.run(&CancelToken::new(), |_, _| {
        nb_of_reports += 1;
        true
    });
    assert_eq!(termination, AccessTermination::StoppedEarly);
    assert_eq!(nb_of_reports, 1);

    Ok(())
}

#[test]
fn cancellation_interrupts_the_search() -> Result<(), Error> {
    init_logger();
    let fixture = fixture();
    let profile = OneWayAwareProfile;
    let edge_links = fixture.links.by_edge();

    let source = fixture.road.point_on_edge(fixture.edges[0], 0.5);
    let mut search = ClosestStopsSearch::new(
        &fixture.road,
        &profile,
        source,
        false,
        600,
        &fixture.links,
        &edge_links,
    )?;
    let cancel = CancelToken::new();
    cancel.cancel();
    let termination = search.run(&cancel, |_, _| false);
    assert_eq!(termination, AccessTermination::Cancelled);

    Ok(())
}

#[test]
fn non_time_profile_fails_fast() {
    init_logger();
    let fixture = fixture();
    let profile = DistanceProfile;
    let edge_links = fixture.links.by_edge();

    let source = fixture.road.point_on_edge(fixture.edges[0], 0.5);
    let result = ClosestStopsSearch::new(
        &fixture.road,
        &profile,
        source,
        false,
        600,
        &fixture.links,
        &edge_links,
    );
    assert!(matches!(
        result,
        Err(ClosestStopsError::NotTimeMetric(Metric::DistanceInMeters))
    ));
}

#[test]
fn foreign_road_network_fails_fast() {
    init_logger();
    let fixture = fixture();
    let profile = WalkingProfile;
    let edge_links = fixture.links.by_edge();

    let other_road = RoadNetwork::new();
    let source = fixture.road.point_on_edge(fixture.edges[0], 0.5);
    let result = ClosestStopsSearch::new(
        &other_road,
        &profile,
        source,
        false,
        600,
        &fixture.links,
        &edge_links,
    );
    assert!(matches!(
        result,
        Err(ClosestStopsError::RoadNetworkMismatch { .. })
    ));
}
