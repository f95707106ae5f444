use std::time::Instant;

/// One recorded measurement, e.g. `("Insert: 1000 rows", "ms", 42)`.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub action: String,
    pub unit: String,
    pub value: u64,
}

impl Sample {
    #[must_use]
    pub fn new(action: impl Into<String>, unit: impl Into<String>, value: u64) -> Self {
        Self {
            action: action.into(),
            unit: unit.into(),
            value,
        }
    }
}

/// Append-only list of samples, in recording order.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementLog {
    samples: Vec<Sample>,
}

impl MeasurementLog {
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sum of all values recorded in `unit`.
    #[must_use]
    pub fn total(&self, unit: &str) -> u64 {
        self.samples
            .iter()
            .filter(|sample| sample.unit == unit)
            .map(|sample| sample.value)
            .sum()
    }
}

impl<'a> IntoIterator for &'a MeasurementLog {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An action that has been started and not yet ended.
#[derive(Debug, Clone)]
pub(crate) struct Stopwatch {
    pub(crate) action: String,
    pub(crate) started: Instant,
}

impl Stopwatch {
    pub(crate) fn start(action: String) -> Self {
        Self {
            action,
            started: Instant::now(),
        }
    }
}

/// Resident set size of this process in MB.
///
/// Read from `/proc/self/status`; `None` where that is not available.
#[must_use]
pub fn resident_memory_mb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss_kb(&status).map(|kb| kb / 1024)
}

fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}
