use serde::{Deserialize, Serialize};

/// Remaps a normalized height before it is scaled into world units.
///
/// Usually monotonic, but nothing here relies on it. Implementations must be
/// shareable with worker threads.
pub trait HeightCurve: Send + Sync {
    fn evaluate(&self, t: f32) -> f32;
}

impl<F> HeightCurve for F
where
    F: Fn(f32) -> f32 + Send + Sync,
{
    fn evaluate(&self, t: f32) -> f32 {
        self(t)
    }
}

/// Passes heights through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearCurve;

impl HeightCurve for LinearCurve {
    fn evaluate(&self, t: f32) -> f32 {
        t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Piecewise-linear curve through a list of keys. Inputs outside the key
/// range take the first/last key's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct CurveKeys {
    keys: Vec<CurveKey>,
}

impl From<Vec<CurveKey>> for CurveKeys {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<CurveKeys> for Vec<CurveKey> {
    fn from(curve: CurveKeys) -> Self {
        curve.keys
    }
}

impl CurveKeys {
    /// Keys are sorted by time on construction.
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn from_pairs(pairs: &[(f32, f32)]) -> Self {
        Self::new(pairs.iter().map(|&(time, value)| CurveKey { time, value }).collect())
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Flat water up to `sea_level`, then linear up to 1 (the usual terrain shape).
    pub fn flattened_below(sea_level: f32) -> Self {
        Self::from_pairs(&[(0.0, 0.0), (sea_level, 0.0), (1.0, 1.0)])
    }
}

impl Default for CurveKeys {
    fn default() -> Self {
        Self::from_pairs(&[(0.0, 0.0), (1.0, 1.0)])
    }
}

impl HeightCurve for CurveKeys {
    fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        // first key strictly after t; exists because t < last.time
        let upper = self.keys.partition_point(|k| k.time <= t);
        let (a, b) = (self.keys[upper - 1], self.keys[upper]);
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * (t - a.time) / span
    }
}
