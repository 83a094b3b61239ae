//! Module for working with snowflake IDs.
//!
//! Loosely in the shape of <https://discord.com/developers/docs/reference#snowflakes>,
//! but ids are assigned by a single process, so the bits below the timestamp
//! hold only a per-process sequence instead of worker and process ids.

use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

pub const TIMESTAMP_OFFSET: u64 = 22;
pub const TIMESTAMP_LENGTH: u64 = 42;

pub const SEQUENCE_OFFSET: u64 = 0;
pub const SEQUENCE_LENGTH: u64 = 22;
pub const SEQUENCE_BITMASK: u64 = (1 << SEQUENCE_LENGTH) - 1;

pub trait Epoch {
    const EPOCH_TIME: UtcDateTime;
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum SnowflakeTimestampFromDateTimeError {
    #[error("Specified time was before the snowflake epoch.")]
    TimeBeforeEpoch,
    #[error("Resulting timestamp uses too many bits.")]
    TimestampTooLarge,
}

#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct SnowflakeTimestamp<SnowflakeEpoch>(u64, PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> SnowflakeTimestamp<SnowflakeEpoch> {
    #[must_use]
    pub fn new(millis_since_epoch: u64) -> Option<Self> {
        (millis_since_epoch < 1 << TIMESTAMP_LENGTH)
            .then_some(Self(millis_since_epoch, PhantomData))
    }

    #[must_use]
    pub fn new_unchecked(millis_since_epoch: u64) -> Self {
        Self::new(millis_since_epoch).expect("SnowflakeTimestamp out of range.")
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn from_time_unchecked(value: UtcDateTime) -> Self
    where
        SnowflakeEpoch: Epoch,
    {
        Self::try_from(value).expect("Cannot create timestamp.")
    }

    #[must_use]
    pub fn now() -> Self
    where
        SnowflakeEpoch: Epoch,
    {
        Self::from_time_unchecked(UtcDateTime::now())
    }
}

impl<SnowflakeEpoch: Epoch> TryFrom<UtcDateTime> for SnowflakeTimestamp<SnowflakeEpoch> {
    type Error = SnowflakeTimestampFromDateTimeError;

    fn try_from(value: UtcDateTime) -> Result<Self, Self::Error> {
        let millis = (value - SnowflakeEpoch::EPOCH_TIME).whole_milliseconds();
        if millis < 0 {
            return Err(Self::Error::TimeBeforeEpoch);
        }
        let millis_u64 = u64::try_from(millis).map_err(|_| Self::Error::TimestampTooLarge)?;
        Self::new(millis_u64).ok_or(Self::Error::TimestampTooLarge)
    }
}

impl<SnowflakeEpoch: Epoch> From<SnowflakeTimestamp<SnowflakeEpoch>> for UtcDateTime {
    fn from(value: SnowflakeTimestamp<SnowflakeEpoch>) -> Self {
        let millis = i64::try_from(value.0).expect("Timestamp fits 42 bits");
        SnowflakeEpoch::EPOCH_TIME + Duration::milliseconds(millis)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct SnowflakeSequence(u32);

impl SnowflakeSequence {
    #[must_use]
    pub fn new(sequence: u32) -> Option<Self> {
        (u64::from(sequence) < 1 << SEQUENCE_LENGTH).then_some(Self(sequence))
    }

    #[must_use]
    pub fn new_unchecked(sequence: u32) -> Self {
        Self::new(sequence).expect("SnowflakeSequence out of range.")
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self((self.0 + 1) % (1 << SEQUENCE_LENGTH))
    }

    pub fn advance(&mut self) {
        *self = self.next();
    }
}

#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Snowflake<SnowflakeEpoch>(u64, #[serde(skip)] PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> Snowflake<SnowflakeEpoch> {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner, PhantomData)
    }

    #[must_use]
    pub fn from_parts(
        timestamp: SnowflakeTimestamp<SnowflakeEpoch>,
        sequence: SnowflakeSequence,
    ) -> Self {
        let snowflake =
            timestamp.get() << TIMESTAMP_OFFSET | u64::from(sequence.get()) << SEQUENCE_OFFSET;

        Snowflake(snowflake, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn timestamp(self) -> SnowflakeTimestamp<SnowflakeEpoch> {
        SnowflakeTimestamp(self.0 >> TIMESTAMP_OFFSET, PhantomData)
    }

    #[must_use]
    pub fn sequence(self) -> SnowflakeSequence {
        #[allow(clippy::cast_possible_truncation)]
        SnowflakeSequence((self.0 & SEQUENCE_BITMASK) as u32)
    }

    #[must_use]
    pub fn time(self) -> UtcDateTime
    where
        SnowflakeEpoch: Epoch,
    {
        self.timestamp().into()
    }
}

impl<SnowflakeEpoch> Display for Snowflake<SnowflakeEpoch> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<SnowflakeEpoch> From<u64> for Snowflake<SnowflakeEpoch> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<SnowflakeEpoch> From<Snowflake<SnowflakeEpoch>> for u64 {
    fn from(value: Snowflake<SnowflakeEpoch>) -> Self {
        value.get()
    }
}

#[derive_where(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SnowflakeGenerator<SnowflakeEpoch> {
    next_sequence: SnowflakeSequence,
    phantom_data: PhantomData<SnowflakeEpoch>,
}

impl<SnowflakeEpoch> SnowflakeGenerator<SnowflakeEpoch> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_sequence: SnowflakeSequence::new_unchecked(0),
            phantom_data: PhantomData,
        }
    }

    pub fn generate_at(&mut self, time: UtcDateTime) -> Snowflake<SnowflakeEpoch>
    where
        SnowflakeEpoch: Epoch,
    {
        let sequence = self.next_sequence;
        self.next_sequence.advance();

        Snowflake::from_parts(SnowflakeTimestamp::from_time_unchecked(time), sequence)
    }

    pub fn generate(&mut self) -> Snowflake<SnowflakeEpoch>
    where
        SnowflakeEpoch: Epoch,
    {
        self.generate_at(UtcDateTime::now())
    }
}

#[cfg(test)]
mod tests {
    use crate::snowflake::{
        Epoch, Snowflake, SnowflakeGenerator, SnowflakeSequence, SnowflakeTimestamp,
        SnowflakeTimestampFromDateTimeError,
    };
    use time::{Duration, UtcDateTime, macros::utc_datetime};

    struct MillennialEpoch;
    impl Epoch for MillennialEpoch {
        const EPOCH_TIME: UtcDateTime = utc_datetime!(2000-1-1 00:00);
    }

    #[test]
    fn legal_values() {
        let legal_timestamps = [0, 0xFFFF, 0x03FF_FFFF_FFFF];
        let illegal_timestamps = [0x0400_0000_0000, 0x08F0_0000_0000_0000, u64::MAX];

        for legal_timestamp in legal_timestamps {
            assert!(SnowflakeTimestamp::<MillennialEpoch>::new(legal_timestamp).is_some());
        }
        for illegal_timestamp in illegal_timestamps {
            assert!(SnowflakeTimestamp::<MillennialEpoch>::new(illegal_timestamp).is_none());
        }

        let legal_sequences = [0, 0xFFF, 0x3F_FFFF];
        let illegal_sequences = [0x40_0000, 0xFFFF_FFFF, u32::MAX];

        for legal_sequence in legal_sequences {
            assert!(SnowflakeSequence::new(legal_sequence).is_some());
        }
        for illegal_sequence in illegal_sequences {
            assert!(SnowflakeSequence::new(illegal_sequence).is_none());
        }
    }

    #[test]
    fn snowflake_timestamp() {
        let legal_date_times = [
            MillennialEpoch::EPOCH_TIME,
            utc_datetime!(2025-10-24 10:00),
            MillennialEpoch::EPOCH_TIME + Duration::milliseconds(0x03FF_FFFF_FFFF),
        ];

        for legal_date_time in legal_date_times {
            let timestamp =
                SnowflakeTimestamp::<MillennialEpoch>::try_from(legal_date_time).unwrap();
            assert_eq!(UtcDateTime::from(timestamp), legal_date_time);
        }

        assert_eq!(
            SnowflakeTimestamp::<MillennialEpoch>::try_from(
                MillennialEpoch::EPOCH_TIME - Duration::milliseconds(1)
            ),
            Err(SnowflakeTimestampFromDateTimeError::TimeBeforeEpoch)
        );

        assert_eq!(
            SnowflakeTimestamp::<MillennialEpoch>::try_from(
                MillennialEpoch::EPOCH_TIME + Duration::milliseconds(0x0400_0000_0000)
            ),
            Err(SnowflakeTimestampFromDateTimeError::TimestampTooLarge)
        );
    }

    #[test]
    fn snowflake_sequence() {
        assert_eq!(
            SnowflakeSequence::new_unchecked(0).next(),
            SnowflakeSequence::new_unchecked(1)
        );
        assert_eq!(
            SnowflakeSequence::new_unchecked(100).next(),
            SnowflakeSequence::new_unchecked(101)
        );
        assert_eq!(
            SnowflakeSequence::new_unchecked(0x3F_FFFF).next(),
            SnowflakeSequence::new_unchecked(0)
        );

        let mut sequence = SnowflakeSequence::new_unchecked(0x3F_FFFE);
        sequence.advance();
        assert_eq!(sequence, SnowflakeSequence::new_unchecked(0x3F_FFFF));
        sequence.advance();
        assert_eq!(sequence, SnowflakeSequence::new_unchecked(0));
    }

    #[test]
    fn snowflake_from_into_parts() {
        let timestamp = SnowflakeTimestamp::<MillennialEpoch>::new_unchecked(0xABCD);
        let sequence = SnowflakeSequence::new_unchecked(100);

        let snowflake = Snowflake::from_parts(timestamp, sequence);

        assert_eq!(snowflake.get(), (0xABCD << 22) | 100);
        assert_eq!(snowflake.timestamp(), timestamp);
        assert_eq!(snowflake.sequence(), sequence);
    }

    #[test]
    fn snowflakes_order_by_generation_time() {
        let earlier = utc_datetime!(2025-10-24 10:55);
        let later = earlier + Duration::milliseconds(1);

        let mut generator = SnowflakeGenerator::<MillennialEpoch>::new();

        let first = generator.generate_at(earlier);
        let second = generator.generate_at(earlier);
        let third = generator.generate_at(later);

        assert_eq!(first.sequence(), SnowflakeSequence::new_unchecked(0));
        assert_eq!(second.sequence(), SnowflakeSequence::new_unchecked(1));
        assert!(first < second);
        assert!(second < third);
        assert_eq!(first.time(), earlier);
        assert_eq!(third.time(), later);
    }
}
