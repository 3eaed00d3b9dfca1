//! Gym records as stored in the remote `ClimbingCenter` table.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Table holding gym rows.
pub const GYM_TABLE: &str = "ClimbingCenter";

/// A climbing gym. Read-only from this crate's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gym {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub setting_day: Option<String>,
    #[serde(default)]
    pub extra_info: Option<String>,
    /// Hold colors from easiest to hardest, joined by `" - "`.
    #[serde(default)]
    pub difficulty_levels: Option<String>,
    #[serde(default)]
    pub endurance_wall: Option<bool>,
    #[serde(default)]
    pub foot_wash_area: Option<bool>,
    #[serde(default)]
    pub kilter_board: Option<bool>,
    #[serde(default)]
    pub moon_board: Option<bool>,
    #[serde(default)]
    pub shower: Option<bool>,
    /// Free-form parking note; present means parking is available.
    #[serde(default)]
    pub parking: Option<String>,
}

/// Facilities a gym may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    Parking,
    Shower,
    FootWashArea,
    EnduranceWall,
    KilterBoard,
    MoonBoard,
}

impl Gym {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn difficulty_levels(&self) -> Vec<&str> {
        self.difficulty_levels
            .as_deref()
            .map(|levels| {
                levels
                    .split(" - ")
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Available facilities, in display order.
    pub fn amenities(&self) -> Vec<Amenity> {
        let parking = self.parking.as_deref().is_some_and(|p| !p.trim().is_empty());
        [
            (Amenity::Parking, parking),
            (Amenity::Shower, self.shower.unwrap_or(false)),
            (Amenity::FootWashArea, self.foot_wash_area.unwrap_or(false)),
            (Amenity::EnduranceWall, self.endurance_wall.unwrap_or(false)),
            (Amenity::KilterBoard, self.kilter_board.unwrap_or(false)),
            (Amenity::MoonBoard, self.moon_board.unwrap_or(false)),
        ]
        .into_iter()
        .filter_map(|(amenity, present)| present.then_some(amenity))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sparse_row() {
        let row = serde_json::json!({
            "id": 42,
            "name": "Boulder Lab",
            "address": "Jeju",
            "latitude": 33.35,
            "longitude": 126.48,
            "kilter_board": true,
            "parking": "2 spots",
            "difficulty_levels": "white - yellow - green"
        });
        let gym: Gym = serde_json::from_value(row).unwrap();

        assert_eq!(gym.coordinate(), Coordinate::new(33.35, 126.48).unwrap());
        assert_eq!(gym.difficulty_levels(), vec!["white", "yellow", "green"]);
        assert_eq!(gym.amenities(), vec![Amenity::Parking, Amenity::KilterBoard]);
        assert!(gym.phone.is_none());
    }

    #[test]
    fn missing_levels_yield_empty_list() {
        let gym: Gym = serde_json::from_value(serde_json::json!({
            "id": 1, "name": "A", "address": "B", "latitude": 0.0, "longitude": 0.0
        }))
        .unwrap();
        assert!(gym.difficulty_levels().is_empty());
        assert!(gym.amenities().is_empty());
    }
}
