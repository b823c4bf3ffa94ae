//! World Components
//!
//! Planar geometry, the three scheduling zones, and the home seating grid.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Vectors shorter than this cannot be normalized.
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// Tolerance used when checking that a direction has unit length.
pub const UNIT_TOLERANCE: f32 = 1e-3;

/// How far inside a boundary an agent is placed after bouncing.
pub const EDGE_MARGIN: f32 = 0.5;

/// 2D vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Returns the unit vector, or `None` if this vector is degenerate.
    pub fn try_normalize(self) -> Option<Vec2> {
        let len = self.length();
        if !len.is_finite() || len < DEGENERATE_EPSILON {
            return None;
        }
        Some(Vec2::new(self.x / len, self.y / len))
    }

    /// Reflects this vector off a surface with the given normal.
    ///
    /// Returns `None` if the normal is degenerate.
    pub fn reflect(self, normal: Vec2) -> Option<Vec2> {
        let n = normal.try_normalize()?;
        Some(self - n * (2.0 * self.dot(n)))
    }

    pub fn is_unit(self) -> bool {
        (self.length() - 1.0).abs() <= UNIT_TOLERANCE
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Draws a uniformly distributed unit vector.
///
/// Rejection-samples the unit disc so the direction is unbiased; never
/// returns a degenerate vector.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec2 {
    for _ in 0..16 {
        let candidate = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
        if candidate.length_squared() <= 1.0 {
            if let Some(unit) = candidate.try_normalize() {
                return unit;
            }
        }
    }
    Vec2::new(1.0, 0.0)
}

/// Axis-aligned rectangle; `y` grows downward like screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of the given size centred on `center`.
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Half-open containment: left/top edges inside, right/bottom edges outside.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// True if `point` lies strictly inside all four edges.
    pub fn strictly_contains(&self, point: Vec2) -> bool {
        point.x > self.left()
            && point.x < self.right()
            && point.y > self.top()
            && point.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Shrinks the rectangle by `padding` on every side, collapsing onto the
    /// centre line if the padding is larger than the rectangle.
    pub fn inset(&self, padding: f32) -> Rect {
        let pad_x = padding.min(self.width / 2.0).max(0.0);
        let pad_y = padding.min(self.height / 2.0).max(0.0);
        Rect::new(
            self.x + pad_x,
            self.y + pad_y,
            self.width - 2.0 * pad_x,
            self.height - 2.0 * pad_y,
        )
    }

    /// Uniformly random point strictly inside the rectangle.
    pub fn random_point(&self, rng: &mut impl Rng) -> Vec2 {
        let inner = self.inset(EDGE_MARGIN);
        let x = if inner.width > 0.0 {
            rng.gen_range(inner.left()..inner.right())
        } else {
            inner.x
        };
        let y = if inner.height > 0.0 {
            rng.gen_range(inner.top()..inner.bottom())
        } else {
            inner.y
        };
        Vec2::new(x, y)
    }
}

/// Named scheduling zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Home,
    Work,
    Social,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 3] = [ZoneKind::Home, ZoneKind::Work, ZoneKind::Social];
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneKind::Home => write!(f, "home"),
            ZoneKind::Work => write!(f, "work"),
            ZoneKind::Social => write!(f, "social"),
        }
    }
}

/// Resource holding the world bounds and zone rectangles.
#[derive(Resource, Debug, Clone)]
pub struct ZoneMap {
    pub world: Rect,
    pub home: Rect,
    pub work: Rect,
    pub social: Rect,
    /// Distance kept from zone edges when agents are placed or bounce.
    pub padding: f32,
}

impl ZoneMap {
    pub fn rect(&self, zone: ZoneKind) -> Rect {
        match zone {
            ZoneKind::Home => self.home,
            ZoneKind::Work => self.work,
            ZoneKind::Social => self.social,
        }
    }

    /// Interior of a zone after removing the padding.
    pub fn padded(&self, zone: ZoneKind) -> Rect {
        self.rect(zone).inset(self.padding)
    }

    /// Zone containing `point`, checked in home, work, social order.
    pub fn zone_at(&self, point: Vec2) -> Option<ZoneKind> {
        ZoneKind::ALL
            .into_iter()
            .find(|&zone| self.rect(zone).contains(point))
    }
}

/// Fixed rows x columns seating grid laid over the home zone.
///
/// Each cell holds at most `capacity` agents at once.
#[derive(Resource, Debug, Clone)]
pub struct HomeGrid {
    bounds: Rect,
    rows: usize,
    cols: usize,
    capacity: u32,
    occupancy: Vec<u32>,
}

impl HomeGrid {
    pub fn new(bounds: Rect, rows: usize, cols: usize, capacity: u32) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            bounds,
            rows,
            cols,
            capacity,
            occupancy: vec![0; rows * cols],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.occupancy.len()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupancy(&self, cell: usize) -> u32 {
        self.occupancy.get(cell).copied().unwrap_or(0)
    }

    /// Highest occupancy across all cells.
    pub fn max_occupancy(&self) -> u32 {
        self.occupancy.iter().copied().max().unwrap_or(0)
    }

    pub fn occupied_seats(&self) -> u32 {
        self.occupancy.iter().sum()
    }

    pub fn is_full(&self) -> bool {
        self.occupancy.iter().all(|&n| n >= self.capacity)
    }

    /// Rectangle covered by a cell (row-major index).
    pub fn cell_rect(&self, cell: usize) -> Rect {
        let row = (cell / self.cols) as f32;
        let col = (cell % self.cols) as f32;
        let width = self.bounds.width / self.cols as f32;
        let height = self.bounds.height / self.rows as f32;
        Rect::new(
            self.bounds.x + col * width,
            self.bounds.y + row * height,
            width,
            height,
        )
    }

    /// Seats an agent in the first under-capacity cell of a shuffled cell order.
    ///
    /// Returns `None` when every cell is full.
    pub fn assign(&mut self, rng: &mut impl Rng) -> Option<usize> {
        let mut order: Vec<usize> = (0..self.occupancy.len()).collect();
        order.shuffle(rng);
        let cell = order
            .into_iter()
            .find(|&cell| self.occupancy[cell] < self.capacity)?;
        self.occupancy[cell] += 1;
        Some(cell)
    }

    /// Frees one seat in `cell`.
    pub fn release(&mut self, cell: usize) {
        if let Some(slot) = self.occupancy.get_mut(cell) {
            *slot = slot.saturating_sub(1);
        }
    }
}
