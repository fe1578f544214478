// THEORY:
// A `ScoreMap` is the per-frame "heat map" of the tracker: for every pixel the
// search window covered, the color score that pixel earned. Keys are absolute
// frame coordinates, not window-relative ones, so the centroid of a map and any
// overlay drawn on the frame share one coordinate space, and two maps taken at
// different window positions can be compared key by key.
//
// A map is built fresh for every frame and never holds a coordinate twice.
// `insert` enforces that and reports a violation as an error instead of
// overwriting. The map is ordered so that iterating it (and therefore summing
// it) is reproducible run to run.

use crate::core_modules::color_matcher::Score;
use crate::error::{TrackerError, TrackerResult};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// An absolute pixel coordinate in frame space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Coordinate → score mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMap {
    scores: BTreeMap<Coordinate, Score>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a score for a coordinate that is not in the map yet.
    pub fn insert(&mut self, coordinate: Coordinate, score: Score) -> TrackerResult<()> {
        match self.scores.entry(coordinate) {
            Entry::Vacant(slot) => {
                slot.insert(score);
                Ok(())
            }
            Entry::Occupied(_) => Err(TrackerError::DuplicateCoordinate {
                x: coordinate.x,
                y: coordinate.y,
            }),
        }
    }

    /// Moves every entry of `other` into this map, failing on the first shared key.
    pub fn merge(&mut self, other: ScoreMap) -> TrackerResult<()> {
        for (coordinate, score) in other.scores {
            self.insert(coordinate, score)?;
        }
        Ok(())
    }

    pub fn get(&self, coordinate: &Coordinate) -> Option<Score> {
        self.scores.get(coordinate).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, Score)> + '_ {
        self.scores.iter().map(|(c, s)| (*c, *s))
    }

    pub fn keys(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.scores.keys().copied()
    }

    /// Sum of all scores.
    pub fn total(&self) -> Score {
        self.scores.values().sum()
    }

    /// Number of coordinates with a strictly positive score.
    pub fn hits(&self) -> usize {
        self.scores.values().filter(|s| **s > 0.0).count()
    }

    /// Builds a map over the same keys, with each score replaced by `f(coordinate, score)`.
    /// Keys come from a map that is already unique, so no duplicate check is needed.
    pub(crate) fn map_scores<F>(&self, mut f: F) -> ScoreMap
    where
        F: FnMut(Coordinate, Score) -> Score,
    {
        ScoreMap {
            scores: self.scores.iter().map(|(c, s)| (*c, f(*c, *s))).collect(),
        }
    }
}

impl FromIterator<(Coordinate, Score)> for ScoreMap {
    /// Collects pairs, letting a later duplicate replace an earlier one.
    /// Use `insert` where duplicates must be caught.
    fn from_iter<T: IntoIterator<Item = (Coordinate, Score)>>(iter: T) -> Self {
        ScoreMap {
            scores: iter.into_iter().collect(),
        }
    }
}
