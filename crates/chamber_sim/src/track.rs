use serde::{Deserialize, Serialize};

/// A value captured at an integer timeline frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub frame: i64,
    pub value: T,
}

/// Active window of an object's trailing effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TrailWindow {
    /// Whether the trail is emitting at `frame`
    pub fn contains(&self, frame: i64) -> bool {
        match self.start {
            Some(start) => frame >= start && self.end.is_none_or(|end| frame <= end),
            None => false,
        }
    }
}

/// Frame-sorted keyframes for one animated property.
///
/// Recording a key on a frame that already holds one replaces it, the same
/// way a DCC timeline overwrites a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T: Clone> Track<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the key at `frame`. Returns true if a new key was added.
    pub fn insert(&mut self, frame: i64, value: T) -> bool {
        match self.keys.binary_search_by_key(&frame, |k| k.frame) {
            Ok(i) => {
                self.keys[i].value = value;
                false
            }
            Err(i) => {
                self.keys.insert(i, Keyframe { frame, value });
                true
            }
        }
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn first_frame(&self) -> Option<i64> {
        self.keys.first().map(|k| k.frame)
    }

    pub fn last_frame(&self) -> Option<i64> {
        self.keys.last().map(|k| k.frame)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Value held at `frame` (constant interpolation). Before the first key
    /// the first value holds.
    pub fn sample(&self, frame: i64) -> Option<T> {
        let idx = match self.keys.binary_search_by_key(&frame, |k| k.frame) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        self.keys.get(idx).map(|k| k.value.clone())
    }
}

impl Track<[f32; 3]> {
    /// Linearly interpolated position at a fractional frame
    pub fn sample_linear(&self, frame: f64) -> Option<[f32; 3]> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if frame <= first.frame as f64 {
            return Some(first.value);
        }
        if frame >= last.frame as f64 {
            return Some(last.value);
        }

        let next = self.keys.partition_point(|k| (k.frame as f64) <= frame);
        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];
        let t = ((frame - k0.frame as f64) / (k1.frame - k0.frame) as f64) as f32;
        Some([
            k0.value[0] + (k1.value[0] - k0.value[0]) * t,
            k0.value[1] + (k1.value[1] - k0.value[1]) * t,
            k0.value[2] + (k1.value[2] - k0.value[2]) * t,
        ])
    }
}
