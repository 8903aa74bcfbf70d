//! Faces and Grid Locations
//!
//! Every cell of the grid connects through six faces. A `FaceSet` is a
//! compact bitmask over those faces; it is what nodes declare as their
//! input and output sides.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// One of the six directions a cell can connect through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Face {
    Top,
    Left,
    Right,
    Front,
    Back,
    Bottom,
}

impl Face {
    /// All faces, in bit order.
    pub const ALL: [Face; 6] = [
        Face::Top,
        Face::Left,
        Face::Right,
        Face::Front,
        Face::Back,
        Face::Bottom,
    ];

    /// The face on the other side of the cell.
    pub fn opposite(self) -> Face {
        match self {
            Face::Top => Face::Bottom,
            Face::Bottom => Face::Top,
            Face::Left => Face::Right,
            Face::Right => Face::Left,
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }

    /// Unit offset of the neighbouring cell across this face.
    pub fn direction(self) -> (i32, i32, i32) {
        match self {
            Face::Top => (0, 1, 0),
            Face::Bottom => (0, -1, 0),
            Face::Left => (-1, 0, 0),
            Face::Right => (1, 0, 0),
            Face::Front => (0, 0, -1),
            Face::Back => (0, 0, 1),
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Upper-case name, as used by hosts keying per-face results.
    pub fn name(self) -> &'static str {
        match self {
            Face::Top => "TOP",
            Face::Left => "LEFT",
            Face::Right => "RIGHT",
            Face::Front => "FRONT",
            Face::Back => "BACK",
            Face::Bottom => "BOTTOM",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Face {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Face::ALL
            .into_iter()
            .find(|face| face.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SignalError::UnknownFace(s.to_string()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct FaceSet(u8);

impl FaceSet {
    const MASK: u8 = 0b0011_1111;

    /// The empty set.
    pub const EMPTY: FaceSet = FaceSet(0);

    /// All six faces.
    pub const ALL: FaceSet = FaceSet(Self::MASK);

    /// Build a set from a raw bitmask. Bits above the sixth are dropped.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    /// Raw bitmask.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn of(faces: &[Face]) -> Self {
        faces.iter().copied().collect()
    }

    pub fn single(face: Face) -> Self {
        Self(face.bit())
    }

    pub fn contains(self, face: Face) -> bool {
        self.0 & face.bit() != 0
    }

    pub fn insert(&mut self, face: Face) {
        self.0 |= face.bit();
    }

    pub fn remove(&mut self, face: Face) {
        self.0 &= !face.bit();
    }

    pub fn with(mut self, face: Face) -> Self {
        self.insert(face);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of faces in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate faces in bit order.
    pub fn iter(self) -> impl Iterator<Item = Face> {
        Face::ALL.into_iter().filter(move |face| self.contains(*face))
    }
}

impl From<u8> for FaceSet {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

impl From<FaceSet> for u8 {
    fn from(set: FaceSet) -> Self {
        set.0
    }
}

impl From<Face> for FaceSet {
    fn from(face: Face) -> Self {
        Self::single(face)
    }
}

impl FromIterator<Face> for FaceSet {
    fn from_iter<I: IntoIterator<Item = Face>>(iter: I) -> Self {
        let mut set = FaceSet::EMPTY;
        for face in iter {
            set.insert(face);
        }
        set
    }
}

impl BitOr for FaceSet {
    type Output = FaceSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        FaceSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for FaceSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FaceSet {
    type Output = FaceSet;

    fn bitand(self, rhs: Self) -> Self::Output {
        FaceSet(self.0 & rhs.0)
    }
}

impl fmt::Debug for FaceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Integer coordinates of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring cell across `face`.
    pub fn offset(self, face: Face) -> Location {
        let (dx, dy, dz) = face.direction();
        Location::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The face of `self` that touches `other`, if the two cells are adjacent.
    pub fn face_towards(self, other: Location) -> Option<Face> {
        Face::ALL.into_iter().find(|face| self.offset(*face) == other)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Location {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}
