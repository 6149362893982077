pub mod cancellation;
pub mod config;
pub mod connections;
pub mod engine;
pub mod response;
pub mod road;
pub mod schedule;
pub mod solver;
pub mod stop_links;
pub mod time;
pub mod transfers;
pub mod transit_data;

pub use chrono;
pub use chrono::{NaiveDate, NaiveDateTime};
pub use log;

pub use cancellation::CancelToken;
pub use config::RequestParams;
pub use engine::{ProfileSearch, SearchTermination};
pub use response::{Journey, Route};
pub use solver::{solve, Query, SolverOutcome};
pub use time::{PositiveDuration, SecondsSinceDayStart};
pub use transit_data::{Stop, TransitData, Trip};
