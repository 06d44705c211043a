//! Profils de réseau (drive, walk, bike, all, drive_service)
//!
//! Chaque profil fixe le filtre Overpass appliqué aux ways `highway` et le
//! caractère orienté du graphe. Les filtres reprennent ceux d'OSMnx.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Profil de réseau demandé
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    /// Voies carrossables publiques, hors voies de service
    #[default]
    Drive,
    /// Voies carrossables, voies de service comprises
    DriveService,
    /// Voies piétonnes (graphe non orienté)
    Walk,
    /// Voies cyclables
    Bike,
    /// Toutes les voies non privées
    All,
}

impl NetworkType {
    /// Ordre de présentation, identique au paramètre d'origine
    pub const ALL: [Self; 5] = [
        Self::Drive,
        Self::All,
        Self::Walk,
        Self::Bike,
        Self::DriveService,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::DriveService => "drive_service",
            Self::Walk => "walk",
            Self::Bike => "bike",
            Self::All => "all",
        }
    }

    /// Les piétons circulent dans les deux sens, quel que soit `oneway`
    pub fn is_bidirectional(self) -> bool {
        matches!(self, Self::Walk)
    }

    /// Filtre de tags Overpass QL appliqué aux ways
    pub fn overpass_filter(self) -> &'static str {
        match self {
            Self::Drive => concat!(
                r#"["highway"]["area"!~"yes"]["access"!~"private"]"#,
                r#"["highway"!~"abandoned|bridleway|bus_guideway|construction|corridor|cycleway|elevator|"#,
                r#"escalator|footway|no|path|pedestrian|planned|platform|proposed|raceway|razed|service|"#,
                r#"steps|track"]"#,
                r#"["motor_vehicle"!~"no"]["motorcar"!~"no"]"#,
                r#"["service"!~"alley|driveway|emergency_access|parking|parking_aisle|private"]"#,
            ),
            Self::DriveService => concat!(
                r#"["highway"]["area"!~"yes"]["access"!~"private"]"#,
                r#"["highway"!~"abandoned|bridleway|bus_guideway|construction|corridor|cycleway|elevator|"#,
                r#"escalator|footway|no|path|pedestrian|planned|platform|proposed|raceway|razed|steps|"#,
                r#"track"]"#,
                r#"["motor_vehicle"!~"no"]["motorcar"!~"no"]"#,
                r#"["service"!~"emergency_access|parking|parking_aisle|private"]"#,
            ),
            Self::Walk => concat!(
                r#"["highway"]["area"!~"yes"]["access"!~"private"]"#,
                r#"["highway"!~"abandoned|bus_guideway|construction|cycleway|motor|no|planned|platform|"#,
                r#"proposed|raceway|razed"]"#,
                r#"["foot"!~"no"]["service"!~"private"]"#,
            ),
            Self::Bike => concat!(
                r#"["highway"]["area"!~"yes"]["access"!~"private"]"#,
                r#"["highway"!~"abandoned|bus_guideway|construction|corridor|elevator|escalator|footway|"#,
                r#"motor|no|planned|platform|proposed|raceway|razed|steps"]"#,
                r#"["bicycle"!~"no"]["service"!~"private"]"#,
            ),
            Self::All => concat!(
                r#"["highway"]["area"!~"yes"]["access"!~"private"]"#,
                r#"["highway"!~"abandoned|construction|no|planned|platform|proposed|raceway|razed"]"#,
                r#"["service"!~"private"]"#,
            ),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drive" => Ok(Self::Drive),
            "drive_service" => Ok(Self::DriveService),
            "walk" => Ok(Self::Walk),
            "bike" => Ok(Self::Bike),
            "all" => Ok(Self::All),
            _ => Err(format!(
                "Invalid network type: {}. Use: drive, all, walk, bike, drive_service",
                s
            )),
        }
    }
}
