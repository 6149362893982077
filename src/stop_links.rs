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
use std::io::{Read, Write};

use uuid::Uuid;

use crate::connections::serialize::{read_i64, read_u32_vec, read_u8};
use crate::road::EdgeId;
use crate::transit_data::Stop;

/// Where a stop snaps onto the road network: a point at `offset` along
/// edge `edge`, with `offset` a fraction of the edge length scaled to
/// `u16::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopLink {
    pub edge: EdgeId,
    pub offset: u16,
}

/// Stop-to-road-edge index for one access-mode profile.
///
/// Compact layout: `pointers` holds a `(start, count)` pair per stop,
/// `data` an `(edge, offset)` pair per link. Links of a stop are
/// contiguous in `data`, which is why insertion must be grouped by
/// ascending stop id: growing an earlier stop's list would shift
/// everything after it.
#[derive(Debug)]
pub struct StopLinksDb {
    profile_name: String,
    road_guid: Uuid,
    pointers: Vec<u32>,
    data: Vec<u32>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StopLinksError {
    /// links must be added grouped by ascending stop id
    StopOutOfOrder { stop_idx: usize, last_stop_idx: usize },
}

impl std::fmt::Display for StopLinksError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopLinksError::StopOutOfOrder {
                stop_idx,
                last_stop_idx,
            } => write!(
                f,
                "Cannot add a link for stop {}: links for stop {} were already added. \
                 Links must be added grouped by ascending stop id.",
                stop_idx, last_stop_idx
            ),
        }
    }
}

impl std::error::Error for StopLinksError {}

impl StopLinksDb {
    pub fn new(profile_name: &str, road_guid: Uuid) -> Self {
        Self {
            profile_name: profile_name.to_string(),
            road_guid,
            pointers: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn road_guid(&self) -> Uuid {
        self.road_guid
    }

    pub fn nb_of_stops(&self) -> usize {
        self.pointers.len() / 2
    }

    pub fn nb_of_links(&self) -> usize {
        self.data.len() / 2
    }

    /// Adds a link for `stop`. `stop` must be the stop most recently
    /// added to, or a stop with a higher id (skipped stops get an empty
    /// link list).
    pub fn add(&mut self, stop: Stop, edge: EdgeId, offset: u16) -> Result<(), StopLinksError> {
        let nb_of_stops = self.nb_of_stops();
        if nb_of_stops > 0 && stop.idx + 1 < nb_of_stops {
            return Err(StopLinksError::StopOutOfOrder {
                stop_idx: stop.idx,
                last_stop_idx: nb_of_stops - 1,
            });
        }
        let link_start = self.nb_of_links() as u32;
        while self.nb_of_stops() <= stop.idx {
            self.pointers.push(link_start);
            self.pointers.push(0);
        }
        self.pointers[2 * stop.idx + 1] += 1;
        self.data.push(edge);
        self.data.push(u32::from(offset));
        Ok(())
    }

    /// The links of `stop`, O(1) seek and O(count) walk.
    pub fn links(&self, stop: Stop) -> impl Iterator<Item = StopLink> + '_ {
        let (start, count) = if stop.idx < self.nb_of_stops() {
            (
                self.pointers[2 * stop.idx] as usize,
                self.pointers[2 * stop.idx + 1] as usize,
            )
        } else {
            (0, 0)
        };
        (start..start + count).map(move |link_idx| StopLink {
            edge: self.data[2 * link_idx],
            offset: self.data[2 * link_idx + 1] as u16,
        })
    }

    /// The inverted view needed by the closest-stops search: which
    /// stops snap onto which edge. Built once at query-server startup.
    pub fn by_edge(&self) -> EdgeLinks {
        let mut map: HashMap<EdgeId, Vec<(Stop, u16)>> = HashMap::new();
        for stop_idx in 0..self.nb_of_stops() {
            let stop = Stop { idx: stop_idx };
            for link in self.links(stop) {
                map.entry(link.edge).or_default().push((stop, link.offset));
            }
        }
        EdgeLinks { map }
    }
}

pub struct EdgeLinks {
    map: HashMap<EdgeId, Vec<(Stop, u16)>>,
}

impl EdgeLinks {
    pub fn on_edge(&self, edge: EdgeId) -> &[(Stop, u16)] {
        self.map.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edge(&self, edge: EdgeId) -> bool {
        self.map.contains_key(&edge)
    }
}

// On-disk layout:
//   byte  0      : version = 1
//   bytes 1..17  : guid of the road network the index was built against
//   then         : i64 profile name length in UTF-16 code units, the units
//   then         : i64 pointer-array length, i64 data-array length
//   then         : the pointer words, the data words
const VERSION: u8 = 1;

#[derive(Debug)]
pub enum CorruptedDb {
    UnsupportedVersion(u8),
    /// the index was built against another road network
    GuidMismatch { expected: Uuid, actual: Uuid },
    BadProfileName,
    BadCount(i64),
    Io(std::io::Error),
}

impl std::fmt::Display for CorruptedDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorruptedDb::UnsupportedVersion(version) => write!(
                f,
                "Cannot read a stop links database with version {}, expected {}.",
                version, VERSION
            ),
            CorruptedDb::GuidMismatch { expected, actual } => write!(
                f,
                "The stop links database was built against road network {}, \
                 but it is opened with road network {}.",
                actual, expected
            ),
            CorruptedDb::BadProfileName => {
                write!(f, "Corrupted stop links database: bad profile name.")
            }
            CorruptedDb::BadCount(count) => {
                write!(f, "Corrupted stop links database: bad array length {}.", count)
            }
            CorruptedDb::Io(err) => write!(f, "Failed to read stop links database: {}", err),
        }
    }
}

impl std::error::Error for CorruptedDb {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
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

impl StopLinksDb {
    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        writer.write_all(&[VERSION])?;
        writer.write_all(self.road_guid.as_bytes())?;

        let units: Vec<u16> = self.profile_name.encode_utf16().collect();
        writer.write_all(&(units.len() as i64).to_le_bytes())?;
        for unit in units {
            writer.write_all(&unit.to_le_bytes())?;
        }

        writer.write_all(&(self.pointers.len() as i64).to_le_bytes())?;
        writer.write_all(&(self.data.len() as i64).to_le_bytes())?;
        for word in &self.pointers {
            writer.write_all(&word.to_le_bytes())?;
        }
        for word in &self.data {
            writer.write_all(&word.to_le_bytes())?;
        }
        Ok(())
    }

    /// Reopens a serialized index. `road_guid` identifies the road
    /// network the caller is about to use the index with; a mismatch
    /// with the stored guid fails open.
    pub fn deserialize<R: Read>(reader: &mut R, road_guid: Uuid) -> Result<Self, CorruptedDb> {
        let version = read_u8(reader)?;
        if version != VERSION {
            return Err(CorruptedDb::UnsupportedVersion(version));
        }

        let mut guid_bytes = [0u8; 16];
        reader.read_exact(&mut guid_bytes)?;
        let stored_guid = Uuid::from_bytes(guid_bytes);
        if stored_guid != road_guid {
            return Err(CorruptedDb::GuidMismatch {
                expected: road_guid,
                actual: stored_guid,
            });
        }

        let name_len = read_i64(reader)?;
        if name_len < 0 || name_len > u32::MAX as i64 {
            return Err(CorruptedDb::BadCount(name_len));
        }
        let mut units = Vec::with_capacity(name_len as usize);
        for _ in 0..name_len {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            units.push(u16::from_le_bytes(buf));
        }
        let profile_name = String::from_utf16(&units).map_err(|_| CorruptedDb::BadProfileName)?;

        let pointers_len = read_len(reader)?;
        let data_len = read_len(reader)?;
        let pointers = read_u32_vec(reader, pointers_len)?;
        let data = read_u32_vec(reader, data_len)?;

        Ok(Self {
            profile_name,
            road_guid: stored_guid,
            pointers,
            data,
        })
    }
}

fn read_len<R: Read>(reader: &mut R) -> Result<usize, CorruptedDb> {
    let len = read_i64(reader)?;
    if len < 0 || len > u32::MAX as i64 {
        return Err(CorruptedDb::BadCount(len));
    }
    Ok(len as usize)
}
