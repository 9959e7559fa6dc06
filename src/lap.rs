//! Geometric lap detection against the header's finish line.
//!
//! A lap boundary is a crossing of the finite finish-line segment by the
//! trajectory segment between two consecutive emitted positions. Two tests
//! are required: a strict sign change of the side function proves the
//! trajectory crosses the infinite line, and the parametric bound confines
//! the crossing to the segment between the two finish-line posts.

/// A geographic point in signed decimal degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// The finish line: a segment between two fixed geographic points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinishLine {
    /// One end of the line.
    pub p1: GeoPoint,
    /// The other end.
    pub p2: GeoPoint,
}

/// Segments closer to parallel than this do not intersect.
const PARALLEL_EPSILON: f64 = 1e-12;

impl FinishLine {
    /// Which side of the infinite finish line a point lies on.
    fn side(&self, point: GeoPoint) -> f64 {
        (self.p2.lng - self.p1.lng) * (point.lat - self.p1.lat)
            - (self.p2.lat - self.p1.lat) * (point.lng - self.p1.lng)
    }

    /// Returns true if the segment from `prev` to `curr` crosses the line.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctrk::{FinishLine, GeoPoint};
    ///
    /// let line = FinishLine {
    ///     p1: GeoPoint { lat: 0.0, lng: 0.0 },
    ///     p2: GeoPoint { lat: 0.0, lng: 1.0 },
    /// };
    /// let prev = GeoPoint { lat: -1.0, lng: 0.5 };
    /// let curr = GeoPoint { lat: 1.0, lng: 0.5 };
    /// assert!(line.crossed_by(prev, curr));
    /// ```
    pub fn crossed_by(&self, prev: GeoPoint, curr: GeoPoint) -> bool {
        // Strict sign change only: touching the line is not a crossing.
        if self.side(prev) * self.side(curr) >= 0.0 {
            return false;
        }
        let denominator = (self.p2.lng - self.p1.lng) * (curr.lat - prev.lat)
            - (self.p2.lat - self.p1.lat) * (curr.lng - prev.lng);
        if denominator.abs() < PARALLEL_EPSILON {
            return false;
        }
        let t = ((prev.lng - self.p1.lng) * (curr.lat - prev.lat)
            - (prev.lat - self.p1.lat) * (curr.lng - prev.lng))
            / denominator;
        (0.0..=1.0).contains(&t)
    }
}

/// Tracks finish-line crossings and the current lap number.
///
/// Laps count from 1. Without a finish line the tracker is inert and every
/// sample stays on lap 1.
#[derive(Clone, Debug)]
pub struct LapTracker {
    finish_line: Option<FinishLine>,
    prev: GeoPoint,
    current_lap: u32,
}

impl LapTracker {
    /// Creates a tracker for the given finish line, starting on lap 1.
    pub fn new(finish_line: Option<FinishLine>) -> LapTracker {
        LapTracker {
            finish_line,
            prev: GeoPoint::default(),
            current_lap: 1,
        }
    }

    /// Returns the current lap number.
    pub fn lap(&self) -> u32 {
        self.current_lap
    }

    /// Observes the position of a sample about to be emitted.
    ///
    /// Returns true when the segment from the previous observation crosses
    /// the finish line, after incrementing the lap counter.
    pub fn observe(&mut self, lat: f64, lng: f64) -> bool {
        let Some(finish_line) = self.finish_line else {
            return false;
        };
        let curr = GeoPoint { lat, lng };
        if self.prev.lat == 0.0 && self.prev.lng == 0.0 {
            self.prev = curr;
            return false;
        }
        let crossed = finish_line.crossed_by(self.prev, curr);
        if crossed {
            self.current_lap += 1;
        }
        self.prev = curr;
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> FinishLine {
        FinishLine {
            p1: GeoPoint { lat: 0.0, lng: 0.0 },
            p2: GeoPoint { lat: 0.0, lng: 1.0 },
        }
    }

    #[test]
    fn crossing_within_segment() {
        let prev = GeoPoint {
            lat: -1.0,
            lng: 0.5,
        };
        let curr = GeoPoint { lat: 1.0, lng: 0.5 };
        assert!(line().crossed_by(prev, curr));
    }

    #[test]
    fn crossing_beyond_segment_end() {
        // Crosses the extended line at t = 2, outside the posts.
        let prev = GeoPoint {
            lat: -1.0,
            lng: 2.0,
        };
        let curr = GeoPoint { lat: 1.0, lng: 2.0 };
        assert!(!line().crossed_by(prev, curr));
    }

    #[test]
    fn touching_is_not_crossing() {
        let prev = GeoPoint {
            lat: -1.0,
            lng: 0.5,
        };
        let curr = GeoPoint { lat: 0.0, lng: 0.5 };
        assert!(!line().crossed_by(prev, curr));
    }

    #[test]
    fn same_side_is_not_crossing() {
        let prev = GeoPoint { lat: 1.0, lng: 0.2 };
        let curr = GeoPoint { lat: 2.0, lng: 0.8 };
        assert!(!line().crossed_by(prev, curr));
    }

    #[test]
    fn tracker_counts_laps() {
        let mut tracker = LapTracker::new(Some(line()));
        assert_eq!(1, tracker.lap());
        assert!(!tracker.observe(-1.0, 0.5)); // seeds the previous position
        assert!(tracker.observe(1.0, 0.5));
        assert_eq!(2, tracker.lap());
        assert!(tracker.observe(-1.0, 0.5));
        assert_eq!(3, tracker.lap());
    }

    #[test]
    fn tracker_without_finish_line_is_inert() {
        let mut tracker = LapTracker::new(None);
        assert!(!tracker.observe(-1.0, 0.5));
        assert!(!tracker.observe(1.0, 0.5));
        assert_eq!(1, tracker.lap());
    }
}
