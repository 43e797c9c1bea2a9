//! Offline US zip code distance lookup.
//!
//! Coordinates come from a table loaded from disk at startup, either a
//! `zip,latitude,longitude` CSV or the Census ZCTA gazetteer file as published
//! (tab separated, `GEOID ... INTPTLAT INTPTLONG`).

use crate::errors::AppError;
use std::collections::HashMap;

/// Mean Earth radius in statute miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Smaller tables leave most customer zips unresolved (no travel fee).
pub const FULL_TABLE_MIN_ZIPS: usize = 30_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZipCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable zip-to-coordinate table.
#[derive(Debug, Clone, Default)]
pub struct ZipDirectory {
    entries: HashMap<String, ZipCoordinate>,
}

impl ZipDirectory {
    /// Loads a table from disk. An empty table is an error; a partial one is
    /// accepted with a warning.
    pub async fn load(path: &str) -> Result<Self, AppError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::InternalError(format!("Failed to read zip table {}: {}", path, e))
        })?;
        let directory = Self::parse(&text)?;

        if directory.is_empty() {
            return Err(AppError::InternalError(format!(
                "Zip table {} has no entries",
                path
            )));
        }
        if directory.len() < FULL_TABLE_MIN_ZIPS {
            tracing::warn!(
                "Zip table {} covers only {} zip codes, customers outside it get no travel fee",
                path,
                directory.len()
            );
        } else {
            tracing::info!("Loaded {} zip codes from {}", directory.len(), path);
        }

        Ok(directory)
    }

    /// Parses either supported table format, chosen by the header line.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let header = text.lines().map(str::trim).find(|l| !l.is_empty());
        match header {
            Some(h) if h.starts_with("GEOID") => Self::from_gazetteer(text),
            _ => Self::from_csv(text),
        }
    }

    /// Parses `zip,latitude,longitude` rows. A header row and blank lines are skipped.
    pub fn from_csv(text: &str) -> Result<Self, AppError> {
        let mut entries = HashMap::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("zip") {
                continue;
            }

            let mut fields = line.split(',').map(str::trim);
            let (Some(zip), Some(lat), Some(lon)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(AppError::BadRequest(format!(
                    "zip table line {}: expected zip,latitude,longitude",
                    line_no + 1
                )));
            };

            entries.insert(zip.to_string(), coordinate(line_no, lat, lon)?);
        }

        Ok(Self { entries })
    }

    /// Parses the Census ZCTA gazetteer: tab separated, columns located by name.
    pub fn from_gazetteer(text: &str) -> Result<Self, AppError> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let columns: Vec<&str> = lines
            .next()
            .map(|(_, header)| header.split('\t').map(str::trim).collect())
            .unwrap_or_default();
        let column = |name: &str| {
            columns.iter().position(|c| *c == name).ok_or_else(|| {
                AppError::BadRequest(format!("gazetteer header lacks {} column", name))
            })
        };
        let zip_col = column("GEOID")?;
        let lat_col = column("INTPTLAT")?;
        let lon_col = column("INTPTLONG")?;

        let mut entries = HashMap::new();
        for (line_no, line) in lines {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let (Some(zip), Some(lat), Some(lon)) =
                (fields.get(zip_col), fields.get(lat_col), fields.get(lon_col))
            else {
                return Err(AppError::BadRequest(format!(
                    "gazetteer line {}: missing columns",
                    line_no + 1
                )));
            };

            entries.insert(zip.to_string(), coordinate(line_no, lat, lon)?);
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, zip: &str) -> Option<ZipCoordinate> {
        self.entries.get(normalize_zip(zip)).copied()
    }

    /// Distance between two zip codes in whole miles, or 0 when either is unknown.
    pub fn distance_miles(&self, from_zip: &str, to_zip: &str) -> f64 {
        match (self.lookup(from_zip), self.lookup(to_zip)) {
            (Some(a), Some(b)) => haversine_miles(a, b).round(),
            _ => {
                tracing::debug!("Unresolvable zip pair {} -> {}", from_zip, to_zip);
                0.0
            }
        }
    }
}

fn coordinate(line_no: usize, lat: &str, lon: &str) -> Result<ZipCoordinate, AppError> {
    let parse = |raw: &str| {
        raw.parse::<f64>().map_err(|_| {
            AppError::BadRequest(format!(
                "zip table line {}: invalid coordinate '{}'",
                line_no + 1,
                raw
            ))
        })
    };

    Ok(ZipCoordinate {
        latitude: parse(lat)?,
        longitude: parse(lon)?,
    })
}

/// Strips whitespace and a ZIP+4 suffix.
fn normalize_zip(zip: &str) -> &str {
    let zip = zip.trim();
    zip.split_once('-').map_or(zip, |(five, _)| five)
}

fn haversine_miles(a: ZipCoordinate, b: ZipCoordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}
