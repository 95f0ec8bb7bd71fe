//! Projectile - the bubble being shot.
//!
//! The projectile follows a solved path segment by segment at a constant
//! speed. Each segment is one suspension point: a tick never carries the
//! projectile past the end of the segment it is on, so hosts see every bounce.

use bevy::prelude::*;

use super::{
    bubble::Bubble,
    trajectory::{Segment, Snap},
};

/// How a tick of flight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStep {
    InFlight,
    /// Reached the end of a segment with more to go.
    SegmentComplete,
    /// Reached the snap cell.
    Arrived,
}

/// A bubble travelling along its path. The flight owns the bubble until it
/// lands.
#[derive(Debug, Clone)]
pub struct Flight {
    bubble: Bubble,
    segments: Vec<Segment>,
    index: usize,
    /// Distance covered on the current segment.
    traveled: f32,
    speed: f32,
    snap: Snap,
}

impl Flight {
    pub fn new(mut bubble: Bubble, segments: Vec<Segment>, snap: Snap, speed: f32) -> Self {
        if let Some(first) = segments.first() {
            bubble.position = first.start;
        }
        Self {
            bubble,
            segments,
            index: 0,
            traveled: 0.0,
            speed,
            snap,
        }
    }

    pub fn bubble(&self) -> &Bubble {
        &self.bubble
    }

    pub fn snap(&self) -> Snap {
        self.snap
    }

    pub fn position(&self) -> Vec2 {
        self.bubble.position
    }

    pub fn segment_index(&self) -> usize {
        self.index
    }

    /// Move along the current segment.
    pub fn advance(&mut self, dt: f32) -> FlightStep {
        let Some(segment) = self.segments.get(self.index).copied() else {
            self.bubble.position = self.snap.position;
            return FlightStep::Arrived;
        };

        let length = segment.length();
        self.traveled += self.speed * dt;
        if self.speed > 0.0 && self.traveled < length {
            self.bubble.position = segment.start + segment.direction() * self.traveled;
            return FlightStep::InFlight;
        }

        // Leftover distance is dropped at the segment end.
        self.index += 1;
        self.traveled = 0.0;
        if self.index < self.segments.len() {
            self.bubble.position = segment.end;
            FlightStep::SegmentComplete
        } else {
            self.bubble.position = self.snap.position;
            FlightStep::Arrived
        }
    }

    /// Hand the bubble back, e.g. to land it or to return it to the shooter.
    pub fn into_bubble(self) -> Bubble {
        self.bubble
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        bubble::{BubbleSpawner, BubbleType, SpecialKind},
        hex::HexCoord,
    };

    fn flight(speed: f32) -> Flight {
        let bubble = BubbleSpawner::default().spawn(BubbleType::Red, SpecialKind::None, Vec2::ZERO);
        let segments = vec![
            Segment {
                start: Vec2::ZERO,
                end: Vec2::new(30.0, 40.0),
                is_bounce: true,
            },
            Segment {
                start: Vec2::new(30.0, 40.0),
                end: Vec2::new(0.0, 80.0),
                is_bounce: false,
            },
        ];
        let snap = Snap {
            cell: HexCoord::new(0, 1),
            position: Vec2::new(2.0, 85.0),
            hit: HexCoord::new(0, 0),
        };
        Flight::new(bubble, segments, snap, speed)
    }

    #[test]
    fn moves_at_constant_speed() {
        let mut flight = flight(100.0);
        assert_eq!(flight.advance(0.2), FlightStep::InFlight);
        assert!((flight.position() - Vec2::new(12.0, 16.0)).length() < 1e-4);
    }

    #[test]
    fn stops_at_each_segment_end() {
        let mut flight = flight(100.0);
        // A huge step still only finishes the first segment.
        assert_eq!(flight.advance(10.0), FlightStep::SegmentComplete);
        assert_eq!(flight.position(), Vec2::new(30.0, 40.0));
        assert_eq!(flight.segment_index(), 1);

        assert_eq!(flight.advance(10.0), FlightStep::Arrived);
        assert_eq!(flight.position(), Vec2::new(2.0, 85.0));
    }
}
