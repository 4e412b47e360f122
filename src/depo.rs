//! Ionization deposits and deposit chains.
//!
//! A [`Depo`] is a point-like charge at a position and time with longitudinal
//! and transverse extents. Depos produced by drifting another depo keep a
//! non-owning link to it (`prior`), so a drifted depo can be traced back to
//! the step that originally created the charge.
//!
//! Deposits are owned by the upstream source. A [`DepoSet`] keeps every depo
//! of a cycle, and every ancestor those depos refer to, alive for as long as
//! the set lives; the sink only borrows from it.

use std::sync::{Arc, Weak};

/// Cartesian position in the geometry's native length unit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// x coordinate (drift axis in the reference geometry).
    pub x: f64,
    /// y coordinate.
    pub y: f64,
    /// z coordinate.
    pub z: f64,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product with another point treated as a vector.
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Component-wise difference `self - other`.
    pub fn sub(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Coordinates divided by `scale`, as an array.
    pub fn scaled(&self, scale: f64) -> [f64; 3] {
        [self.x / scale, self.y / scale, self.z / scale]
    }
}

/// A point-like ionization deposit.
#[derive(Clone, Debug)]
pub struct Depo {
    /// Position of the charge.
    pub pos: Point,
    /// Time of the charge.
    pub time: f64,
    /// Net charge. Electrons are conventionally negative.
    pub charge: f64,
    /// Longitudinal (drift direction) Gaussian extent, as a length.
    pub extent_long: f64,
    /// Transverse Gaussian extent, as a length.
    pub extent_tran: f64,
    /// Track identifier of the particle that made this deposit.
    pub id: i32,
    /// Deposited energy.
    pub energy: f64,
    prior: Option<Weak<Depo>>,
}

impl Depo {
    /// A fresh deposit with no prior.
    pub fn new(pos: Point, time: f64, charge: f64) -> Self {
        Self {
            pos,
            time,
            charge,
            extent_long: 0.0,
            extent_tran: 0.0,
            id: 0,
            energy: 0.0,
            prior: None,
        }
    }

    /// Set longitudinal and transverse extents.
    pub fn with_extent(mut self, extent_long: f64, extent_tran: f64) -> Self {
        self.extent_long = extent_long;
        self.extent_tran = extent_tran;
        self
    }

    /// Set the track identifier.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// Set the deposited energy.
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    /// A deposit derived from `prior` (e.g. by drifting it). Inherits the
    /// prior's id and energy and links back to it without owning it.
    pub fn drifted_from(prior: &Arc<Depo>, pos: Point, time: f64, charge: f64) -> Self {
        Self {
            pos,
            time,
            charge,
            extent_long: prior.extent_long,
            extent_tran: prior.extent_tran,
            id: prior.id,
            energy: prior.energy,
            prior: Some(Arc::downgrade(prior)),
        }
    }

    /// The deposit this one was derived from, if it is still alive.
    pub fn prior(&self) -> Option<Arc<Depo>> {
        self.prior.as_ref().and_then(Weak::upgrade)
    }

    /// Walk the chain of priors, starting with the immediate prior and ending
    /// at the earliest reachable ancestor. Does not include `self`.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors { next: self.prior() }
    }

    /// Position of the earliest reachable ancestor, or of `self` if it has
    /// no prior.
    pub fn origin_pos(&self) -> Point {
        self.ancestors().last().map_or(self.pos, |d| d.pos)
    }
}

/// Iterator over a depo's priors, nearest first.
pub struct Ancestors {
    next: Option<Arc<Depo>>,
}

impl Iterator for Ancestors {
    type Item = Arc<Depo>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.prior();
        Some(current)
    }
}

/// The deposits delivered for one cycle.
///
/// Entries may be `None`; the sink skips them. Ancestors registered through
/// [`DepoSet::keep_alive`] stay reachable through `prior` links while the set
/// lives.
#[derive(Clone, Debug, Default)]
pub struct DepoSet {
    /// Identifier of the set, usually the event number.
    pub ident: u32,
    depos: Vec<Option<Arc<Depo>>>,
    ancestry: Vec<Arc<Depo>>,
}

impl DepoSet {
    /// An empty set.
    pub fn new(ident: u32) -> Self {
        Self { ident, depos: Vec::new(), ancestry: Vec::new() }
    }

    /// Append a deposit (or a null entry).
    pub fn push(&mut self, depo: Option<Arc<Depo>>) {
        self.depos.push(depo);
    }

    /// Hold an ancestor alive for the lifetime of this set.
    pub fn keep_alive(&mut self, ancestor: Arc<Depo>) {
        self.ancestry.push(ancestor);
    }

    /// All entries, including nulls, in delivery order.
    pub fn depos(&self) -> &[Option<Arc<Depo>>] {
        &self.depos
    }

    /// Number of entries, including nulls.
    pub fn len(&self) -> usize {
        self.depos.len()
    }

    /// True when the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.depos.is_empty()
    }
}

impl FromIterator<Depo> for DepoSet {
    fn from_iter<I: IntoIterator<Item = Depo>>(iter: I) -> Self {
        Self {
            ident: 0,
            depos: iter.into_iter().map(|d| Some(Arc::new(d))).collect(),
            ancestry: Vec::new(),
        }
    }
}
