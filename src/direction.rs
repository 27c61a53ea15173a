use glam::IVec3;
use serde::{Deserialize, Serialize};

/// One of the 8 horizontal directions around a cell, in clockwise order starting at +Z.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Direction8 {
    Forward,
    FrontRight,
    Right,
    BackRight,
    Back,
    BackLeft,
    Left,
    FrontLeft,
}

pub const ALL_DIRECTIONS: [Direction8; 8] = [
    Direction8::Forward,
    Direction8::FrontRight,
    Direction8::Right,
    Direction8::BackRight,
    Direction8::Back,
    Direction8::BackLeft,
    Direction8::Left,
    Direction8::FrontLeft,
];

/// The order here decides which direction wins when several are viable, e.g. the initial growth
/// direction of a room.
pub const ORTHOGONAL_DIRECTIONS: [Direction8; 4] = [
    Direction8::Forward,
    Direction8::Right,
    Direction8::Back,
    Direction8::Left,
];

pub const DIAGONAL_DIRECTIONS: [Direction8; 4] = [
    Direction8::FrontRight,
    Direction8::BackRight,
    Direction8::BackLeft,
    Direction8::FrontLeft,
];

impl Direction8 {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        ALL_DIRECTIONS[index % 8]
    }

    pub fn offset(self) -> IVec3 {
        let (x, z) = match self {
            Direction8::Forward => (0, 1),
            Direction8::FrontRight => (1, 1),
            Direction8::Right => (1, 0),
            Direction8::BackRight => (1, -1),
            Direction8::Back => (0, -1),
            Direction8::BackLeft => (-1, -1),
            Direction8::Left => (-1, 0),
            Direction8::FrontLeft => (-1, 1),
        };

        IVec3::new(x, 0, z)
    }

    pub fn from_offset(offset: IVec3) -> Option<Self> {
        ALL_DIRECTIONS.iter().copied().find(|d| d.offset() == offset)
    }

    pub fn is_orthogonal(self) -> bool {
        self.index() % 2 == 0
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 4)
    }

    /// 90 degrees clockwise, seen from above.
    pub fn turn_right(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// 90 degrees counter-clockwise, seen from above.
    pub fn turn_left(self) -> Self {
        Self::from_index(self.index() + 6)
    }

    /// Quarter turns of yaw an object gains when it is attached facing this way.
    pub fn yaw_quarter_turns(self) -> i32 {
        match self {
            Direction8::Left | Direction8::BackLeft | Direction8::FrontLeft => 1,
            Direction8::Right | Direction8::BackRight | Direction8::FrontRight => -1,
            Direction8::Back => 2,
            Direction8::Forward => 0,
        }
    }

    /// Parses the direction part of a condition identifier, e.g. `left` in `left0`.
    pub fn from_name(name: &str) -> Option<Self> {
        let dir = match name {
            "forward" | "front" | "n" => Direction8::Forward,
            "back" | "s" => Direction8::Back,
            "left" | "w" => Direction8::Left,
            "right" | "e" => Direction8::Right,
            "nw" | "frontleft" => Direction8::FrontLeft,
            "ne" | "frontright" => Direction8::FrontRight,
            "sw" | "backleft" => Direction8::BackLeft,
            "se" | "backright" => Direction8::BackRight,
            _ => return None,
        };

        Some(dir)
    }
}

/// One of the 4 yaw states a cell or object can take. Positive yaw turns counter-clockwise (left)
/// when seen from above.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Orientation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Deg0
    }
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    pub fn from_quarter_turns(turns: i32) -> Self {
        Self::ALL[turns.rem_euclid(4) as usize]
    }

    pub fn quarter_turns(self) -> i32 {
        self as i32
    }

    pub fn yaw_degrees(self) -> f32 {
        90.0 * self.quarter_turns() as f32
    }

    pub fn turned(self, quarter_turns: i32) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + quarter_turns)
    }

    pub fn opposite(self) -> Self {
        self.turned(2)
    }

    /// The orientation whose forward axis points along `dir` (angle measured from +Z).
    pub fn facing(dir: Direction8) -> Self {
        Self::from_quarter_turns(-((dir.index() / 2) as i32))
    }

    /// Rotates a lattice offset about the Y axis.
    pub fn rotate(self, offset: IVec3) -> IVec3 {
        let mut v = offset;
        for _ in 0..self.quarter_turns() {
            v = IVec3::new(-v.z, v.y, v.x);
        }

        v
    }

    pub fn rotate_direction(self, dir: Direction8) -> Direction8 {
        Direction8::from_index(dir.index() + 8 - 2 * self.quarter_turns() as usize)
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_offset_agrees_with_rotate_direction() {
        for o in Orientation::ALL.iter() {
            for d in ALL_DIRECTIONS.iter() {
                assert_eq!(o.rotate(d.offset()), o.rotate_direction(*d).offset());
            }
        }
    }

    #[test]
    fn test_quarter_turn_is_counter_clockwise() {
        assert_eq!(
            Orientation::Deg90.rotate_direction(Direction8::Forward),
            Direction8::Left
        );
        assert_eq!(
            Orientation::Deg270.rotate_direction(Direction8::Forward),
            Direction8::Right
        );
    }

    #[test]
    fn test_facing_measures_angle_from_forward() {
        assert_eq!(Orientation::facing(Direction8::Forward), Orientation::Deg0);
        assert_eq!(Orientation::facing(Direction8::Left), Orientation::Deg90);
        assert_eq!(Orientation::facing(Direction8::Back), Orientation::Deg180);
        assert_eq!(Orientation::facing(Direction8::Right), Orientation::Deg270);
        for d in ORTHOGONAL_DIRECTIONS.iter() {
            assert_eq!(Orientation::facing(*d).rotate_direction(Direction8::Forward), *d);
        }
    }

    #[test]
    fn test_yaw_quarter_turns_for_attachment_facings() {
        let base = Orientation::Deg0;
        assert_eq!(base.turned(Direction8::FrontLeft.yaw_quarter_turns()), Orientation::Deg90);
        assert_eq!(base.turned(Direction8::BackRight.yaw_quarter_turns()), Orientation::Deg270);
        assert_eq!(base.turned(Direction8::Back.yaw_quarter_turns()), Orientation::Deg180);
        assert_eq!(base.turned(Direction8::Forward.yaw_quarter_turns()), Orientation::Deg0);
    }

    #[test]
    fn test_direction_names() {
        assert_eq!(Direction8::from_name("nw"), Some(Direction8::FrontLeft));
        assert_eq!(Direction8::from_name("front"), Some(Direction8::Forward));
        assert_eq!(Direction8::from_name("up"), None);
    }

    #[test]
    fn test_turns_and_opposites() {
        for d in ALL_DIRECTIONS.iter() {
            assert_eq!(d.opposite().opposite(), *d);
            assert_eq!(d.turn_left().turn_right(), *d);
            assert_eq!(d.opposite().offset(), -d.offset());
            assert_eq!(Direction8::from_offset(d.offset()), Some(*d));
        }
        assert_eq!(Direction8::Forward.turn_right(), Direction8::Right);
    }
}
