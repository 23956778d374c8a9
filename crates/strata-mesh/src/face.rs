use strata_geom::Vec3;

/// One of the six axis-aligned boundary orientations of a voxel.
///
/// Layers stack along +Z; `x` grows to the right and `y` toward the back of
/// the build plate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    Top = 0,
    Bottom = 1,
    Right = 2,
    Left = 3,
    Back = 4,
    Front = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Top,
        Face::Bottom,
        Face::Right,
        Face::Left,
        Face::Back,
        Face::Front,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Converts a face index `[0..6)` back into a `Face` value.
    /// Falls back to `Top` for out-of-range indices.
    #[inline]
    pub fn from_index(i: usize) -> Face {
        match i {
            0 => Face::Top,
            1 => Face::Bottom,
            2 => Face::Right,
            3 => Face::Left,
            4 => Face::Back,
            5 => Face::Front,
            _ => Face::Top,
        }
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        match self {
            Face::Top => Vec3 {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
            Face::Bottom => Vec3 {
                x: 0.0,
                y: 0.0,
                z: -1.0,
            },
            Face::Right => Vec3 {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
            Face::Left => Vec3 {
                x: -1.0,
                y: 0.0,
                z: 0.0,
            },
            Face::Back => Vec3 {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
            Face::Front => Vec3 {
                x: 0.0,
                y: -1.0,
                z: 0.0,
            },
        }
    }

    /// Returns the grid delta `(dx, dy, dlayer)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::Top => (0, 0, 1),
            Face::Bottom => (0, 0, -1),
            Face::Right => (1, 0, 0),
            Face::Left => (-1, 0, 0),
            Face::Back => (0, 1, 0),
            Face::Front => (0, -1, 0),
        }
    }

    /// True for the four in-plane wall orientations.
    #[inline]
    pub fn is_side(self) -> bool {
        !matches!(self, Face::Top | Face::Bottom)
    }
}

/// Subset of the six orientations, as returned by the exposure detector.
/// A `Face` record always carries exactly one orientation; the set form only
/// exists on the detector's boundary.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FaceSet(u8);

impl FaceSet {
    pub const EMPTY: FaceSet = FaceSet(0);

    #[inline]
    pub fn insert(&mut self, face: Face) {
        self.0 |= 1 << face.index();
    }

    #[inline]
    pub fn contains(self, face: Face) -> bool {
        (self.0 >> face.index()) & 1 == 1
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates contained faces in index order.
    pub fn iter(self) -> impl Iterator<Item = Face> {
        (0..6).filter_map(move |i| {
            let f = Face::from_index(i);
            self.contains(f).then_some(f)
        })
    }
}

impl FromIterator<Face> for FaceSet {
    fn from_iter<T: IntoIterator<Item = Face>>(iter: T) -> Self {
        let mut set = FaceSet::EMPTY;
        for f in iter {
            set.insert(f);
        }
        set
    }
}
