//! Définitions des systèmes de référence pour `gpkg_spatial_ref_sys`

use osmnet::Crs;

/// srs_id des géométries sans Crs (cartésien non défini)
pub const UNDEFINED_CARTESIAN: i32 = -1;

/// srs_id géographique non défini
pub const UNDEFINED_GEOGRAPHIC: i32 = 0;

const WGS84_GEOGCS: &str = concat!(
    r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,"#,
    r#"AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],"#,
    r#"PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],"#,
    r#"UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],"#,
    r#"AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#,
);

/// Ligne de `gpkg_spatial_ref_sys`
#[derive(Debug, Clone, PartialEq)]
pub struct SrsRow {
    pub srs_name: String,
    pub srs_id: i32,
    pub organization: String,
    pub organization_coordsys_id: i32,
    pub definition: String,
    pub description: String,
}

/// Lignes obligatoires d'un GeoPackage (-1, 0 et 4326)
pub fn default_rows() -> Vec<SrsRow> {
    vec![
        SrsRow {
            srs_name: "Undefined cartesian SRS".into(),
            srs_id: UNDEFINED_CARTESIAN,
            organization: "NONE".into(),
            organization_coordsys_id: UNDEFINED_CARTESIAN,
            definition: "undefined".into(),
            description: "undefined cartesian coordinate reference system".into(),
        },
        SrsRow {
            srs_name: "Undefined geographic SRS".into(),
            srs_id: UNDEFINED_GEOGRAPHIC,
            organization: "NONE".into(),
            organization_coordsys_id: UNDEFINED_GEOGRAPHIC,
            definition: "undefined".into(),
            description: "undefined geographic coordinate reference system".into(),
        },
        row_for(Crs::WGS84),
    ]
}

/// Ligne décrivant un Crs EPSG
///
/// WGS84 et les zones UTM ont une définition WKT complète ; les autres
/// codes sont enregistrés avec la définition `undefined`.
pub fn row_for(crs: Crs) -> SrsRow {
    let (srs_name, definition) = if crs == Crs::WGS84 {
        ("WGS 84 geodetic".to_string(), WGS84_GEOGCS.to_string())
    } else if let Some((zone, south)) = crs.utm_zone() {
        let name = format!("WGS 84 / UTM zone {}{}", zone, if south { 'S' } else { 'N' });
        let wkt = utm_wkt(&name, crs.epsg, zone, south);
        (name, wkt)
    } else {
        (crs.to_string(), "undefined".to_string())
    };

    SrsRow {
        srs_name,
        srs_id: crs.epsg as i32,
        organization: "EPSG".into(),
        organization_coordsys_id: crs.epsg as i32,
        definition,
        description: String::new(),
    }
}

fn utm_wkt(name: &str, epsg: u32, zone: u8, south: bool) -> String {
    let central_meridian = zone as i32 * 6 - 183;
    let false_northing = if south { 10_000_000 } else { 0 };
    format!(
        concat!(
            r#"PROJCS["{}",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,"#,
            r#"AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],"#,
            r#"PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],"#,
            r#"UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],"#,
            r#"PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],"#,
            r#"PARAMETER["central_meridian",{}],PARAMETER["scale_factor",0.9996],"#,
            r#"PARAMETER["false_easting",500000],PARAMETER["false_northing",{}],"#,
            r#"UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],"#,
            r#"AUTHORITY["EPSG","{}"]]"#,
        ),
        name, central_meridian, false_northing, epsg
    )
}
