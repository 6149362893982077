use std::fmt::{Display, Formatter};

/// A point in time during the day the timetable refers to.
///
/// The clock is not wrapped at midnight: a value of 25:00:00 means
/// "01:00:00 on the next day", so that overnight vehicle runs keep
/// increasing times. Values produced by the engine (an arrival plus a
/// walk) may exceed the range storable in the connections database;
/// the storage bound is enforced at insertion, not here.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceDayStart {
    seconds: u32,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct PositiveDuration {
    pub(crate) seconds: u32,
}

impl SecondsSinceDayStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            seconds: seconds + 60 * minutes + 60 * 60 * hours,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn duration_since(&self, earlier: &SecondsSinceDayStart) -> Option<PositiveDuration> {
        self.seconds
            .checked_sub(earlier.seconds)
            .map(|seconds| PositiveDuration { seconds })
    }
}

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> PositiveDuration {
        let total_seconds = seconds + 60 * minutes + 60 * 60 * hours;
        PositiveDuration {
            seconds: total_seconds,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

impl Display for SecondsSinceDayStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        )
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Add<PositiveDuration> for SecondsSinceDayStart {
    type Output = Self;

    fn add(self, rhs: PositiveDuration) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Sub<PositiveDuration> for SecondsSinceDayStart {
    type Output = Self;

    fn sub(self, rhs: PositiveDuration) -> Self::Output {
        Self {
            seconds: self.seconds - rhs.seconds,
        }
    }
}

impl std::ops::Mul<u32> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        PositiveDuration {
            seconds: self.seconds * rhs,
        }
    }
}

#[derive(Debug)]
pub struct DurationParseError {
    text: String,
}

impl Display for DurationParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unable to parse `{}` as a duration. Expected `HH:MM:SS`.",
            self.text
        )
    }
}

impl std::error::Error for DurationParseError {}

impl std::str::FromStr for PositiveDuration {
    type Err = DurationParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = text.split(':');
        let parse = |part: Option<&str>| {
            part.and_then(|s| s.parse::<u32>().ok())
                .ok_or_else(|| DurationParseError {
                    text: text.to_string(),
                })
        };
        let hours = parse(parts.next())?;
        let minutes = parse(parts.next())?;
        let seconds = parse(parts.next())?;
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return Err(DurationParseError {
                text: text.to_string(),
            });
        }
        Ok(PositiveDuration::from_hms(hours, minutes, seconds))
    }
}

impl serde::Serialize for PositiveDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&format_args!(
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        ))
    }
}

impl<'de> serde::Deserialize<'de> for PositiveDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
