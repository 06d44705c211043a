//! Types de données partagés par les étapes du pipeline

use std::fmt;

use geo::{Area, MultiPolygon};
use serde::Serialize;

use crate::code::AdministrativeCode;

/// Système de coordonnées identifié par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Crs {
    pub epsg: u32,
}

impl Crs {
    /// WGS84 géographique (EPSG:4326)
    pub const WGS84: Self = Self { epsg: 4326 };

    /// Web Mercator (EPSG:3857)
    pub const WEB_MERCATOR: Self = Self { epsg: 3857 };

    pub const fn new(epsg: u32) -> Self {
        Self { epsg }
    }

    /// Crs d'une zone UTM WGS84 (326zz au nord, 327zz au sud)
    pub const fn utm(zone: u8, south: bool) -> Self {
        let base = if south { 32700 } else { 32600 };
        Self {
            epsg: base + zone as u32,
        }
    }

    /// Retourne (zone, sud) si le Crs est une zone UTM WGS84
    pub fn utm_zone(self) -> Option<(u8, bool)> {
        match self.epsg {
            32601..=32660 => Some(((self.epsg - 32600) as u8, false)),
            32701..=32760 => Some(((self.epsg - 32700) as u8, true)),
            _ => None,
        }
    }

    /// Vrai pour les Crs en degrés
    pub fn is_geographic(self) -> bool {
        self.epsg == 4326
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Municipalité résolue par le service de lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaIdentity {
    /// Code IBGE
    pub code: AdministrativeCode,

    /// Nom de la municipalité (ex: "Porto Alegre")
    pub name: String,

    /// Sigle de l'UF (ex: "RS")
    pub uf: String,
}

impl AreaIdentity {
    /// Requête texte transmise au géocodeur
    pub fn place_query(&self) -> String {
        format!("{}, {}, Brasil", self.name, self.uf)
    }
}

/// Limite (éventuellement bufferisée) d'une municipalité
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    pub geometry: MultiPolygon<f64>,
    pub crs: Crs,
}

impl BoundaryPolygon {
    /// Crée une limite en WGS84
    pub fn wgs84(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            crs: Crs::WGS84,
        }
    }

    /// Vrai si aucun polygone ne porte de surface
    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty() || self.geometry.unsigned_area() == 0.0
    }
}
