//! System of units.
//!
//! All lengths, times and charges inside the crate are plain `f64` values
//! expressed in this system: the millimetre and the nanosecond are `1.0`.
//! Multiply a literal by a unit to bring it in, divide by a unit to read it
//! out:
//!
//! ```
//! use depo_simchannel::units;
//!
//! let tick = 0.5 * units::US;
//! assert_eq!(tick / units::NS, 500.0);
//! ```

/// Millimetre (base length).
pub const MM: f64 = 1.0;
/// Micrometre.
pub const UM: f64 = 1e-3 * MM;
/// Centimetre.
pub const CM: f64 = 10.0 * MM;
/// Metre.
pub const M: f64 = 1000.0 * MM;

/// Nanosecond (base time).
pub const NS: f64 = 1.0;
/// Microsecond.
pub const US: f64 = 1000.0 * NS;
/// Millisecond.
pub const MS: f64 = 1000.0 * US;
/// Second.
pub const S: f64 = 1000.0 * MS;

/// Elementary charge. Deposit charges count electrons, so this is `1.0`.
pub const EPLUS: f64 = 1.0;

/// Mega-electronvolt, the energy unit carried through attribution.
pub const MEV: f64 = 1.0;
