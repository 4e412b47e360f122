//! Geometry provider interface and a planar reference implementation.
//!
//! The sink never looks inside a detector description. It needs four
//! capabilities, expressed by the traits below:
//!
//! - which faces of an anode contain a position ([`Anode::faces_containing`]),
//! - the wire binning of a plane ([`WirePlane::pitch_binning`]),
//! - the pitch coordinate of a position in a plane ([`WirePlane::pitch`]),
//! - the readout channel of a wire ([`WirePlane::wire_channel`]).
//!
//! [`ReferenceAnode`] is a minimal concrete geometry: boxes for the sensitive
//! volume and straight, evenly spaced wires in the y–z plane. It is enough to
//! drive the sink in tests, demos and the Python bindings.

use crate::binning::Binning;
use crate::depo::Point;

/// Readout channel number.
pub type ChannelId = u32;

// ─── Plane index ────────────────────────────────────────────────────────────

/// The three wire planes of a face, in drift order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaneIndex {
    /// First induction plane.
    U,
    /// Second induction plane.
    V,
    /// Collection plane.
    W,
}

impl PlaneIndex {
    /// All planes, in order.
    pub const ALL: [PlaneIndex; 3] = [PlaneIndex::U, PlaneIndex::V, PlaneIndex::W];

    /// Map a raw plane number to a plane. Anything but 0, 1, 2 is `None`.
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(PlaneIndex::U),
            1 => Some(PlaneIndex::V),
            2 => Some(PlaneIndex::W),
            _ => None,
        }
    }

    /// Position in [`PlaneIndex::ALL`]; usable as an array index.
    pub fn index(self) -> usize {
        self as usize
    }
}

// ─── Provider traits ────────────────────────────────────────────────────────

/// One plane of sense wires.
pub trait WirePlane {
    /// Which of the three planes this is, or `None` for a plane the sink
    /// should ignore.
    fn plane_index(&self) -> Option<PlaneIndex>;

    /// Binning of the pitch axis; bin `i` is wire `i`.
    fn pitch_binning(&self) -> Binning;

    /// Pitch coordinate of `pos` in this plane.
    fn pitch(&self, pos: &Point) -> f64;

    /// Channel read out by wire `wire`, or `None` if there is no such wire.
    fn wire_channel(&self, wire: usize) -> Option<ChannelId>;
}

/// One face of an anode: a sensitive volume read out by a few wire planes.
pub trait AnodeFace {
    /// Wire plane type.
    type Plane: WirePlane;

    /// True if `pos` lies in this face's sensitive volume.
    fn contains(&self, pos: &Point) -> bool;

    /// Wire planes, in drift order.
    fn planes(&self) -> &[Self::Plane];
}

/// An anode: a group of faces sharing a channel space.
pub trait Anode {
    /// Face type.
    type Face: AnodeFace;

    /// Anode identifier.
    fn ident(&self) -> i32;

    /// All faces.
    fn faces(&self) -> &[Self::Face];

    /// Every channel this anode reads out, sorted and without duplicates.
    fn channels(&self) -> Vec<ChannelId>;

    /// Faces whose sensitive volume contains `pos`.
    fn faces_containing<'a>(&'a self, pos: &'a Point) -> impl Iterator<Item = &'a Self::Face> + 'a {
        self.faces().iter().filter(move |face| face.contains(pos))
    }
}

// ─── Reference implementation ───────────────────────────────────────────────

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Lower corner.
    pub min: Point,
    /// Upper corner.
    pub max: Point,
}

impl BoundingBox {
    /// Box spanned by two corners, in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// True if `pos` is inside or on the boundary.
    pub fn inside(&self, pos: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }
}

/// A plane of straight parallel wires in the y–z plane.
///
/// Wire `i` passes through `origin + i * pitch * pitch_dir`, so the pitch
/// coordinate of wire `i` is exactly `i * pitch`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanarWirePlane {
    /// Raw plane number; 0, 1, 2 are U, V, W.
    pub ident: i32,
    /// Point on wire 0.
    pub origin: Point,
    /// Unit vector along the pitch (perpendicular to the wires).
    pub pitch_dir: Point,
    /// Wire spacing.
    pub pitch: f64,
    /// Channel of each wire, indexed by wire number.
    pub wire_channels: Vec<ChannelId>,
}

impl PlanarWirePlane {
    /// Plane with wires at `angle` (radians) from the y axis, meaning the
    /// pitch direction is `(0, sin angle, cos angle)`. Wire `i` reads channel
    /// `first_channel + i`.
    pub fn new(ident: i32, origin: Point, angle: f64, pitch: f64, nwires: u32, first_channel: ChannelId) -> Self {
        Self {
            ident,
            origin,
            pitch_dir: Point::new(0.0, angle.sin(), angle.cos()),
            pitch,
            wire_channels: (0..nwires).map(|w| first_channel + w).collect(),
        }
    }

    /// Number of wires.
    pub fn nwires(&self) -> usize {
        self.wire_channels.len()
    }
}

impl WirePlane for PlanarWirePlane {
    fn plane_index(&self) -> Option<PlaneIndex> {
        PlaneIndex::from_index(self.ident)
    }

    fn pitch_binning(&self) -> Binning {
        let n = self.nwires() as i32;
        Binning::new(n, -0.5 * self.pitch, (n as f64 - 0.5) * self.pitch)
    }

    fn pitch(&self, pos: &Point) -> f64 {
        pos.sub(&self.origin).dot(&self.pitch_dir)
    }

    fn wire_channel(&self, wire: usize) -> Option<ChannelId> {
        self.wire_channels.get(wire).copied()
    }
}

/// A face of a [`ReferenceAnode`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceFace {
    /// Sensitive volume.
    pub sensitive: BoundingBox,
    /// Wire planes in drift order.
    pub planes: Vec<PlanarWirePlane>,
}

impl AnodeFace for ReferenceFace {
    type Plane = PlanarWirePlane;

    fn contains(&self, pos: &Point) -> bool {
        self.sensitive.inside(pos)
    }

    fn planes(&self) -> &[PlanarWirePlane] {
        &self.planes
    }
}

/// Box-and-wires anode.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceAnode {
    /// Anode identifier.
    pub ident: i32,
    /// Faces.
    pub faces: Vec<ReferenceFace>,
}

impl ReferenceAnode {
    /// Single-face anode with U (+60°), V (−60°) and W (0°) planes of
    /// `nwires` each, all sharing `origin`. Channels are numbered from
    /// `first_channel`, U first, then V, then W.
    pub fn three_plane(
        ident: i32,
        sensitive: BoundingBox,
        origin: Point,
        pitch: f64,
        nwires: u32,
        first_channel: ChannelId,
    ) -> Self {
        let angles = [60f64.to_radians(), -60f64.to_radians(), 0.0];
        let planes = angles
            .iter()
            .enumerate()
            .map(|(i, &angle)| {
                PlanarWirePlane::new(i as i32, origin, angle, pitch, nwires, first_channel + i as u32 * nwires)
            })
            .collect();
        Self { ident, faces: vec![ReferenceFace { sensitive, planes }] }
    }
}

impl Anode for ReferenceAnode {
    type Face = ReferenceFace;

    fn ident(&self) -> i32 {
        self.ident
    }

    fn faces(&self) -> &[ReferenceFace] {
        &self.faces
    }

    fn channels(&self) -> Vec<ChannelId> {
        let mut out: Vec<ChannelId> = self
            .faces
            .iter()
            .flat_map(|f| f.planes.iter())
            .flat_map(|p| p.wire_channels.iter().copied())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
