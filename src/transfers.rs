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

use crate::time::PositiveDuration;
use crate::transit_data::Stop;

/// Walk times between pairs of nearby stops.
///
/// The mapping is sparse and symmetric: `add(a, b, d)` makes `b` a
/// neighbor of `a` and `a` a neighbor of `b`. Pairs whose walk time
/// exceeds `max_transfer_duration` are not stored at all.
pub struct TransfersDb {
    max_transfer_duration: PositiveDuration,
    neighbors: Vec<Vec<(Stop, PositiveDuration)>>,
}

impl TransfersDb {
    pub fn new(max_transfer_duration: PositiveDuration) -> Self {
        Self {
            max_transfer_duration,
            neighbors: Vec::new(),
        }
    }

    pub fn max_transfer_duration(&self) -> PositiveDuration {
        self.max_transfer_duration
    }

    /// Records a walk of `duration` between `a` and `b`, in both
    /// directions. Returns false (and stores nothing) when the duration
    /// exceeds the allowed maximum.
    pub fn add(&mut self, a: Stop, b: Stop, duration: PositiveDuration) -> bool {
        if duration > self.max_transfer_duration {
            return false;
        }
        let needed = a.idx.max(b.idx) + 1;
        if self.neighbors.len() < needed {
            self.neighbors.resize(needed, Vec::new());
        }
        self.neighbors[a.idx].push((b, duration));
        self.neighbors[b.idx].push((a, duration));
        true
    }

    pub fn neighbors(&self, stop: Stop) -> impl Iterator<Item = &(Stop, PositiveDuration)> {
        self.neighbors
            .get(stop.idx)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
            .iter()
    }

    pub fn nb_of_transfers(&self) -> usize {
        // each stored pair appears once per direction
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (Stop, Stop, PositiveDuration)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(a_idx, list)| {
                list.iter().map(move |(b, duration)| {
                    (Stop { idx: a_idx }, *b, *duration)
                })
            })
            .filter(|(a, b, _)| a.idx <= b.idx)
    }
}
