use std::collections::HashSet;
use std::time::Duration;

use crate::decode::DecodeLevel;
use crate::error::InvalidConfig;

/// Frames that are silently dropped when received, causing another read
///
/// Entries are matched against the complete binary frame as it arrived: the raw RTU frame
/// including its CRC, the raw TCP frame including the MBAP header, or the decoded ASCII frame
/// including its LRC.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct IgnoreList {
    frames: HashSet<Vec<u8>>,
}

impl IgnoreList {
    /// an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from hex strings such as `"01 83 02 C0 F1"`
    ///
    /// Whitespace is ignored and digits may be upper or lower case.
    pub fn from_hex<I, S>(entries: I) -> Result<Self, InvalidConfig>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let digits: String = entry
                .as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let frame = hex::decode(digits).map_err(|_| InvalidConfig::BadIgnoreFrame(index))?;
            list.insert(frame);
        }
        Ok(list)
    }

    /// add a binary frame to the list
    pub fn insert(&mut self, frame: Vec<u8>) {
        self.frames.insert(frame);
    }

    /// true if the frame exactly matches an entry
    pub fn contains(&self, frame: &[u8]) -> bool {
        self.frames.contains(frame)
    }

    /// true if no frames are ignored
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Settings that govern how a master retries and validates each exchange
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct MasterConfig {
    /// number of times a request is re-sent after a retryable failure
    pub retries: usize,
    /// delay before re-sending, and before re-reading after an acknowledge or busy response
    pub wait_to_retry: Duration,
    /// TCP responses whose transaction id trails the request by less than this are discarded
    ///
    /// Ids are counted on the ring 1..=65535, so after a wrap the response to request 65535
    /// trails request 1 by one. Zero and one disable the check. Must be less than 65535.
    pub retry_on_old_response_threshold: u16,
    /// whether a busy response consumes the retry budget or retries indefinitely
    pub slave_busy_uses_retry_count: bool,
    /// read timeout applied to the byte stream, `None` blocks forever
    pub read_timeout: Option<Duration>,
    /// write timeout applied to the byte stream, `None` blocks forever
    pub write_timeout: Option<Duration>,
    /// spurious frames dropped on receipt
    pub ignore_list: IgnoreList,
    /// protocol decoding written to the log
    pub decode: DecodeLevel,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            wait_to_retry: Duration::from_millis(250),
            retry_on_old_response_threshold: 0,
            slave_busy_uses_retry_count: false,
            read_timeout: Some(Duration::from_secs(1)),
            write_timeout: Some(Duration::from_secs(1)),
            ignore_list: IgnoreList::default(),
            decode: DecodeLevel::default(),
        }
    }
}

impl MasterConfig {
    /// check the values that have bounds
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.retry_on_old_response_threshold == u16::MAX {
            return Err(InvalidConfig::RetryOnOldResponseThreshold(
                self.retry_on_old_response_threshold,
            ));
        }
        Ok(())
    }

    /// change the number of retries
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// change the delay between retries
    pub fn with_wait_to_retry(mut self, wait_to_retry: Duration) -> Self {
        self.wait_to_retry = wait_to_retry;
        self
    }

    /// change the stale TCP response threshold
    pub fn with_retry_on_old_response_threshold(mut self, threshold: u16) -> Self {
        self.retry_on_old_response_threshold = threshold;
        self
    }

    /// change whether busy responses consume the retry budget
    pub fn with_slave_busy_uses_retry_count(mut self, value: bool) -> Self {
        self.slave_busy_uses_retry_count = value;
        self
    }

    /// change the byte stream read timeout
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// change the byte stream write timeout
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// change the list of ignored frames
    pub fn with_ignore_list(mut self, ignore_list: IgnoreList) -> Self {
        self.ignore_list = ignore_list;
        self
    }

    /// change the decode level
    pub fn with_decode(mut self, decode: DecodeLevel) -> Self {
        self.decode = decode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_list_parses_loose_hex() {
        let list = IgnoreList::from_hex(["01 83 02 c0 f1", "\t0A0b\n"]).unwrap();
        assert!(list.contains(&[0x01, 0x83, 0x02, 0xC0, 0xF1]));
        assert!(list.contains(&[0x0A, 0x0B]));
        assert!(!list.contains(&[0x01, 0x83, 0x02]));
    }

    #[test]
    fn ignore_list_rejects_odd_digit_count() {
        assert_eq!(
            IgnoreList::from_hex(["0102", "ABC"]),
            Err(InvalidConfig::BadIgnoreFrame(1))
        );
        assert_eq!(
            IgnoreList::from_hex(["zz"]),
            Err(InvalidConfig::BadIgnoreFrame(0))
        );
    }

    #[test]
    fn default_config_is_valid() {
        let config = MasterConfig::default();
        assert_eq!(config.retries, 3);
        assert_eq!(config.wait_to_retry, Duration::from_millis(250));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn threshold_must_be_below_max() {
        let config = MasterConfig::default().with_retry_on_old_response_threshold(u16::MAX - 1);
        assert_eq!(config.validate(), Ok(()));
        let config = MasterConfig::default().with_retry_on_old_response_threshold(u16::MAX);
        assert_eq!(
            config.validate(),
            Err(InvalidConfig::RetryOnOldResponseThreshold(u16::MAX))
        );
    }
}
