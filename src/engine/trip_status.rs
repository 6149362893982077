use crate::time::SecondsSinceDayStart;
use crate::transit_data::{Stop, Trip};

/// Where and with how many transfers a trip was entered during the
/// scan. Once a trip is reached, all its later connections can be
/// ridden without further boarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripStatus {
    pub board_stop: Stop,
    pub board_time: SecondsSinceDayStart,
    pub transfers_when_boarded: usize,
}

/// Dense per-trip bookkeeping, indexed by trip id.
pub struct TripStatuses {
    statuses: Vec<Option<TripStatus>>,
}

impl TripStatuses {
    pub fn new(nb_of_trips: usize) -> Self {
        Self {
            statuses: vec![None; nb_of_trips],
        }
    }

    pub fn clear(&mut self) {
        for status in self.statuses.iter_mut() {
            *status = None;
        }
    }

    pub fn status(&self, trip: Trip) -> Option<&TripStatus> {
        self.statuses[trip.idx].as_ref()
    }

    /// Records a boarding if it is the first for the trip or beats the
    /// recorded one in transfers.
    pub fn board(&mut self, trip: Trip, candidate: TripStatus) -> bool {
        let status = &mut self.statuses[trip.idx];
        match status {
            Some(current) if current.transfers_when_boarded <= candidate.transfers_when_boarded => {
                false
            }
            _ => {
                *status = Some(candidate);
                true
            }
        }
    }
}
