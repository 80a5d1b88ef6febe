// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A pair of draggable trim handles over a waveform surface.
//!
//! Handles are positioned in pixels along the surface width. A handle is grabbed by its
//! triangular grip at the top of the surface, dragged horizontally and released. While
//! dragging, the handles always stay at least `min_distance` pixels apart.

use tracing::trace;

use crate::draw::{Color, Point, Shape};
use crate::samples::Trim;
use crate::util;

/// Default minimum gap between the handles, in pixels.
pub const DEFAULT_MIN_DISTANCE: f32 = 20.0;

/// Default grab radius around a grip, in pixels.
pub const DEFAULT_THRESHOLD: f32 = 15.0;

/// Vertical centre of a grip.
const GRIP_Y: f32 = 7.5;
const GRIP_HALF_WIDTH: f32 = 10.0;
const GRIP_HEIGHT: f32 = 15.0;
const LINE_WIDTH: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    Idle,
    /// The pointer is hovering over the grip.
    Selected,
    Dragging,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Handle {
    x: f32,
    state: HandleState,
}

impl Handle {
    fn new(x: f32) -> Handle {
        Handle {
            x,
            state: HandleState::Idle,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    fn is_dragging(&self) -> bool {
        self.state == HandleState::Dragging
    }

    fn is_highlighted(&self) -> bool {
        self.state != HandleState::Idle
    }

    fn grip_distance(&self, x: f32, y: f32) -> f32 {
        util::distance(x, y, self.x, GRIP_Y)
    }
}

/// The trim handle state machine.
pub struct TrimBars {
    width: f32,
    left: Handle,
    right: Handle,
    min_distance: f32,
    threshold: f32,
}

impl TrimBars {
    /// Creates trim bars over a surface of the given width. The handles are clamped onto the
    /// surface and spread to the minimum distance if needed.
    pub fn new(width: f32, left_x: f32, right_x: f32) -> TrimBars {
        let mut trim_bars = TrimBars {
            width: width.max(0.0),
            left: Handle::new(left_x),
            right: Handle::new(right_x),
            min_distance: DEFAULT_MIN_DISTANCE,
            threshold: DEFAULT_THRESHOLD,
        };
        trim_bars.settle();
        trim_bars
    }

    pub fn with_min_distance(mut self, min_distance: f32) -> TrimBars {
        self.min_distance = min_distance.max(0.0);
        self.settle();
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> TrimBars {
        self.threshold = threshold.max(0.0);
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn left(&self) -> &Handle {
        &self.left
    }

    pub fn right(&self) -> &Handle {
        &self.right
    }

    /// Returns the side currently being dragged, if any.
    pub fn dragging(&self) -> Option<Side> {
        if self.left.is_dragging() {
            Some(Side::Left)
        } else if self.right.is_dragging() {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging().is_some()
    }

    /// Highlights the handle whose grip is under the pointer. Ignored while dragging.
    pub fn pointer_hover(&mut self, x: f32, y: f32) {
        if self.is_dragging() {
            return;
        }
        let near = self.nearest(x, y);
        self.left.state = if near == Some(Side::Left) {
            HandleState::Selected
        } else {
            HandleState::Idle
        };
        self.right.state = if near == Some(Side::Right) {
            HandleState::Selected
        } else {
            HandleState::Idle
        };
    }

    /// Starts dragging the handle whose grip is under the pointer. The nearest grip wins,
    /// and the left handle wins a tie. Returns the grabbed side.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<Side> {
        let near = self.nearest(x, y);
        let (grabbed, other) = match near {
            Some(Side::Left) => (&mut self.left, &mut self.right),
            Some(Side::Right) => (&mut self.right, &mut self.left),
            None => {
                self.left.state = HandleState::Idle;
                self.right.state = HandleState::Idle;
                return None;
            }
        };
        grabbed.state = HandleState::Dragging;
        other.state = HandleState::Idle;
        trace!(side = ?near, x, "Grabbed trim handle");
        near
    }

    /// Moves the dragged handle to `x`, clamped so the handles stay `min_distance` apart and
    /// on the surface. Returns true if a handle is being dragged.
    pub fn pointer_move(&mut self, x: f32) -> bool {
        match self.dragging() {
            Some(Side::Left) => {
                let max = (self.right.x - self.min_distance).max(0.0);
                self.left.x = clamp(x, 0.0, max);
                true
            }
            Some(Side::Right) => {
                let min = (self.left.x + self.min_distance).min(self.width);
                self.right.x = clamp(x, min, self.width);
                true
            }
            None => false,
        }
    }

    /// Ends any drag.
    pub fn pointer_up(&mut self) {
        self.left.state = HandleState::Idle;
        self.right.state = HandleState::Idle;
    }

    /// The pointer left the surface. Same as releasing it.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Handle positions as fractions of the surface width.
    pub fn normalized(&self) -> Trim {
        if self.width <= 0.0 {
            return Trim::default();
        }
        Trim {
            start: (self.left.x / self.width) as f64,
            end: (self.right.x / self.width) as f64,
        }
    }

    /// Positions the handles from fractions of the surface width.
    pub fn set_normalized(&mut self, start: f64, end: f64) {
        self.left.x = (util::clamp(start, 0.0, 1.0) * self.width as f64) as f32;
        self.right.x = (util::clamp(end, 0.0, 1.0) * self.width as f64) as f32;
        self.settle();
    }

    /// Moves the handles and releases any selection or drag.
    pub fn reset(&mut self, left_x: f32, right_x: f32) {
        self.left = Handle::new(left_x);
        self.right = Handle::new(right_x);
        self.settle();
    }

    /// Produces the overlay display list: masks over the trimmed-off regions, then a line
    /// and grip per handle. Highlighted handles are drawn red.
    pub fn draw(&self, height: f32) -> Vec<Shape> {
        let mut shapes = vec![
            Shape::Rect {
                origin: Point::new(0.0, 0.0),
                width: self.left.x,
                height,
                fill: Color::MASK,
            },
            Shape::Rect {
                origin: Point::new(self.right.x, 0.0),
                width: self.width - self.right.x,
                height,
                fill: Color::MASK,
            },
        ];

        for handle in [&self.left, &self.right] {
            let color = if handle.is_highlighted() {
                Color::RED
            } else {
                Color::WHITE
            };
            shapes.push(Shape::Line {
                from: Point::new(handle.x, 0.0),
                to: Point::new(handle.x, height),
                color,
                width: LINE_WIDTH,
            });
            shapes.push(Shape::Polygon {
                points: vec![
                    Point::new(handle.x, 0.0),
                    Point::new(handle.x - GRIP_HALF_WIDTH, GRIP_HEIGHT),
                    Point::new(handle.x + GRIP_HALF_WIDTH, GRIP_HEIGHT),
                ],
                fill: color,
            });
        }
        shapes
    }

    /// The handle whose grip is within the threshold of the pointer, nearest first.
    fn nearest(&self, x: f32, y: f32) -> Option<Side> {
        let left = self.left.grip_distance(x, y);
        let right = self.right.grip_distance(x, y);
        match (left < self.threshold, right < self.threshold) {
            (true, true) if right < left => Some(Side::Right),
            (true, _) => Some(Side::Left),
            (false, true) => Some(Side::Right),
            (false, false) => None,
        }
    }

    /// Puts the handles on the surface, in order, at least `min_distance` apart.
    fn settle(&mut self) {
        let min_distance = self.min_distance.min(self.width);
        let mut left = clamp(self.left.x, 0.0, self.width);
        let mut right = clamp(self.right.x, 0.0, self.width);
        if left > right {
            std::mem::swap(&mut left, &mut right);
        }
        if right - left < min_distance {
            right = (left + min_distance).min(self.width);
            left = right - min_distance;
        }
        self.left.x = left;
        self.right.x = right;
    }
}

fn clamp(value: f32, min: f32, max: f32) -> f32 {
    util::clamp(value as f64, min as f64, max as f64) as f32
}
