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

//! On-disk layout of the connections database:
//!
//! ```text
//! byte  0     : version = 1
//! byte  1     : sorting (0 = none, 1 = by departure time, 2 = by arrival time)
//! bytes 2..10 : record count N as a little-endian i64
//! then        : 4*N u32 packed records
//! then        : N u32 order permutation
//! ```
//!
//! All three sorting states round-trip; any other marker byte is a
//! corruption error, never reinterpreted.

use std::io::{Read, Write};

use super::{ConnectionsDb, Sorting};

const VERSION: u8 = 1;

const SORTING_NONE: u8 = 0;
const SORTING_BY_DEPARTURE: u8 = 1;
const SORTING_BY_ARRIVAL: u8 = 2;

#[derive(Debug)]
pub enum CorruptedDb {
    UnsupportedVersion(u8),
    BadSortingMarker(u8),
    BadRecordCount(i64),
    Io(std::io::Error),
}

impl std::fmt::Display for CorruptedDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorruptedDb::UnsupportedVersion(version) => write!(
                f,
                "Cannot read a connections database with version {}, expected {}.",
                version, VERSION
            ),
            CorruptedDb::BadSortingMarker(marker) => write!(
                f,
                "Corrupted connections database: unknown sorting marker {}.",
                marker
            ),
            CorruptedDb::BadRecordCount(count) => write!(
                f,
                "Corrupted connections database: bad record count {}.",
                count
            ),
            CorruptedDb::Io(err) => write!(f, "Failed to read connections database: {}", err),
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

impl ConnectionsDb {
    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        let (connections, order, sorting) = self.raw_parts();
        let nb = self.nb_of_connections();

        writer.write_all(&[VERSION])?;
        let marker = match sorting {
            Sorting::NotSorted => SORTING_NONE,
            Sorting::ByDepartureTime => SORTING_BY_DEPARTURE,
            Sorting::ByArrivalTime => SORTING_BY_ARRIVAL,
        };
        writer.write_all(&[marker])?;
        writer.write_all(&(nb as i64).to_le_bytes())?;
        for word in connections {
            writer.write_all(&word.to_le_bytes())?;
        }
        if order.is_empty() {
            // never sorted: the permutation is the identity
            for idx in 0..nb as u32 {
                writer.write_all(&idx.to_le_bytes())?;
            }
        } else {
            for idx in order {
                writer.write_all(&idx.to_le_bytes())?;
            }
        }
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<ConnectionsDb, CorruptedDb> {
        let version = read_u8(reader)?;
        if version != VERSION {
            return Err(CorruptedDb::UnsupportedVersion(version));
        }
        let sorting = match read_u8(reader)? {
            SORTING_NONE => Sorting::NotSorted,
            SORTING_BY_DEPARTURE => Sorting::ByDepartureTime,
            SORTING_BY_ARRIVAL => Sorting::ByArrivalTime,
            marker => {
                return Err(CorruptedDb::BadSortingMarker(marker));
            }
        };
        let count = read_i64(reader)?;
        if count < 0 || count > u32::MAX as i64 {
            return Err(CorruptedDb::BadRecordCount(count));
        }
        let nb = count as usize;
        let connections = read_u32_vec(reader, nb * 4)?;
        let order = read_u32_vec(reader, nb)?;
        Ok(ConnectionsDb::from_raw_parts(connections, order, sorting))
    }
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8, std::io::Error> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_i64<R: Read>(reader: &mut R) -> Result<i64, std::io::Error> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32, std::io::Error> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u32_vec<R: Read>(
    reader: &mut R,
    len: usize,
) -> Result<Vec<u32>, std::io::Error> {
    let mut words = Vec::with_capacity(len);
    for _ in 0..len {
        words.push(read_u32(reader)?);
    }
    Ok(words)
}
