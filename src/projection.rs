//! Coordinate reference systems for zone geometry.
//!
//! Zone coordinate files are surveyed in a projected system (state plane
//! coordinates in US survey feet), while AIS reports carry WGS84 degrees.
//! Every zone is converted once into [`WORKING_CRS`] when the registry is built.

use std::fmt;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use geo::{Coord, MapCoords};
use serde::{Deserialize, Serialize};

/// Coordinate system all containment tests run in
pub const WORKING_CRS: Crs = Crs::Wgs84;

/// One US survey foot in metres
pub const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic WGS84, x = longitude, y = latitude in degrees
    #[serde(rename = "epsg:4326", alias = "EPSG:4326")]
    Wgs84,
    /// NAD83 / Texas South Central (ftUS)
    #[serde(rename = "epsg:2278", alias = "EPSG:2278")]
    TexasSouthCentral,
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Wgs84 => f.write_str("EPSG:4326"),
            Crs::TexasSouthCentral => f.write_str("EPSG:2278"),
        }
    }
}

impl Crs {
    /// Convert a coordinate of this system to WGS84 longitude/latitude
    pub fn to_wgs84(&self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Crs::Wgs84 => c,
            Crs::TexasSouthCentral => {
                let (lat, lon) = LambertConformal::texas_south_central().inverse(c.x, c.y);
                Coord { x: lon, y: lat }
            }
        }
    }

    /// Convert a WGS84 longitude/latitude coordinate into this system
    pub fn from_wgs84(&self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Crs::Wgs84 => c,
            Crs::TexasSouthCentral => {
                let (x, y) = LambertConformal::texas_south_central().forward(c.y, c.x);
                Coord { x, y }
            }
        }
    }

    /// Reproject any geometry from this system into [`WORKING_CRS`]
    pub fn to_working<G>(&self, geometry: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
    {
        geometry.map_coords(|c| WORKING_CRS.from_wgs84(self.to_wgs84(c)))
    }
}

/// Reference ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub semi_major_axis: f64,
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const GRS80: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
    };

    pub const CLARKE_1866: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_206.4,
        inverse_flattening: 294.978_698_2,
    };

    fn eccentricity(&self) -> f64 {
        let f = 1.0 / self.inverse_flattening;
        (2.0 * f - f * f).sqrt()
    }
}

/// Lambert Conformal Conic with two standard parallels (EPSG method 9802)
///
/// Closed form forward transform, inverse iterates latitude to convergence.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    a: f64,
    e: f64,
    n: f64,
    f: f64,
    r_origin: f64,
    lon_origin: f64,
    false_easting: f64,
    false_northing: f64,
    /// Metres per output unit
    unit: f64,
}

impl LambertConformal {
    /// Build the projection, angles in degrees and false origin in metres.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ellipsoid: Ellipsoid,
        standard_parallel_1: f64,
        standard_parallel_2: f64,
        lat_origin: f64,
        lon_origin: f64,
        false_easting: f64,
        false_northing: f64,
        unit: f64,
    ) -> Self {
        let a = ellipsoid.semi_major_axis;
        let e = ellipsoid.eccentricity();
        let phi1 = standard_parallel_1.to_radians();
        let phi2 = standard_parallel_2.to_radians();
        let m1 = Self::m(e, phi1);
        let m2 = Self::m(e, phi2);
        let t1 = Self::t(e, phi1);
        let t2 = Self::t(e, phi2);
        let n = (m1.ln() - m2.ln()) / (t1.ln() - t2.ln());
        let f = m1 / (n * t1.powf(n));
        let r_origin = a * f * Self::t(e, lat_origin.to_radians()).powf(n);

        Self {
            a,
            e,
            n,
            f,
            r_origin,
            lon_origin: lon_origin.to_radians(),
            false_easting,
            false_northing,
            unit,
        }
    }

    /// NAD83 / Texas South Central (ftUS), EPSG:2278
    pub fn texas_south_central() -> Self {
        Self::new(
            Ellipsoid::GRS80,
            30.0 + 17.0 / 60.0,
            28.0 + 23.0 / 60.0,
            27.0 + 50.0 / 60.0,
            -99.0,
            600_000.0,
            4_000_000.0,
            US_SURVEY_FOOT,
        )
    }

    fn m(e: f64, phi: f64) -> f64 {
        phi.cos() / (1.0 - (e * phi.sin()).powi(2)).sqrt()
    }

    fn t(e: f64, phi: f64) -> f64 {
        let es = e * phi.sin();
        (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
    }

    /// Latitude/longitude in degrees to (easting, northing) in projection units
    pub fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let r = self.a * self.f * Self::t(self.e, lat.to_radians()).powf(self.n);
        let theta = self.n * (lon.to_radians() - self.lon_origin);
        let easting = self.false_easting + r * theta.sin();
        let northing = self.false_northing + self.r_origin - r * theta.cos();
        (easting / self.unit, northing / self.unit)
    }

    /// (easting, northing) in projection units to latitude/longitude in degrees
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let dx = easting * self.unit - self.false_easting;
        let dy = self.r_origin - (northing * self.unit - self.false_northing);
        let r = (dx * dx + dy * dy).sqrt().copysign(self.n);
        let t = (r / (self.a * self.f)).powf(1.0 / self.n);
        let theta = if self.n < 0.0 {
            (-dx).atan2(-dy)
        } else {
            dx.atan2(dy)
        };

        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        for _ in 0..20 {
            let es = self.e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(self.e / 2.0)).atan();
            let converged = (next - phi).abs() < 1e-14;
            phi = next;
            if converged {
                break;
            }
        }

        let lon = theta / self.n + self.lon_origin;
        (phi.to_degrees(), lon.to_degrees())
    }
}
