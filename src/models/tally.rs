use crate::taxonomy::LicenseBucket;

/// Per-user bucket counts, built fresh for each user and consumed once by
/// the aggregate updater. Never persisted and never shared across users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseTally {
    counts: [u32; LicenseBucket::ALL.len()],
}

impl LicenseTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies each license key and accumulates the bucket counts.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tally = Self::new();
        for key in keys {
            tally.record(LicenseBucket::classify(Some(key.as_ref())));
        }
        tally
    }

    pub fn record(&mut self, bucket: LicenseBucket) {
        self.counts[bucket.index()] += 1;
    }

    pub fn count(&self, bucket: LicenseBucket) -> u32 {
        self.counts[bucket.index()]
    }

    /// True when no repository contributed a count.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Buckets with a non-zero count, in column order.
    pub fn nonzero(&self) -> impl Iterator<Item = (LicenseBucket, u32)> + '_ {
        LicenseBucket::ALL
            .iter()
            .map(|&bucket| (bucket, self.count(bucket)))
            .filter(|&(_, count)| count > 0)
    }
}
