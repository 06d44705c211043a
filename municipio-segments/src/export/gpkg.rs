//! Archive GeoPackage multi-couches
//!
//! Une couche par municipalité, écrite dans une transaction : réécrire une
//! couche remplace uniquement cette couche. Les géométries sont encodées en
//! GeoPackage binary avec geozero.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use geo::{BoundingRect, Geometry};
use geozero::{CoordDimensions, ToWkb};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use tracing::{debug, info, warn};

use osmnet::graph::EDGE_TAGS;
use osmnet::{PipelineError, SegmentTable};

use super::srs::{self, SrsRow};
use super::ArchiveLayerRecord;

/// Extension imposée à l'archive
pub const GPKG_EXTENSION: &str = "gpkg";

/// `application_id` d'un GeoPackage ("GPKG")
const APPLICATION_ID: i32 = 0x4750_4B47;

/// `user_version` d'un GeoPackage 1.3.0
const USER_VERSION: i32 = 10300;

const GEOMETRY_COLUMN: &str = "geom";
const GEOMETRY_TYPE: &str = "LINESTRING";

/// Compteur de features tenu par GDAL (absent des archives créées ici)
const OGR_CONTENTS: &str = "gpkg_ogr_contents";

const CREATE_METADATA: &str = "
CREATE TABLE IF NOT EXISTS gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE IF NOT EXISTS gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT uk_gc_table_name UNIQUE (table_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
";

/// Force l'extension `.gpkg`
///
/// Un chemin `.shp` (format mono-couche) est converti avec un warning.
pub fn normalize_archive_path(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some(GPKG_EXTENSION) => path.to_path_buf(),
        Some("shp") => {
            let normalized = path.with_extension(GPKG_EXTENSION);
            warn!(
                requested = %path.display(),
                output = %normalized.display(),
                "Shapefile cannot hold several layers, writing a GeoPackage instead"
            );
            normalized
        }
        Some(other) => {
            let normalized = path.with_extension(GPKG_EXTENSION);
            info!(
                extension = other,
                output = %normalized.display(),
                "Only GeoPackage supports multiple layers, extension adjusted"
            );
            normalized
        }
        None => path.with_extension(GPKG_EXTENSION),
    }
}

/// Écrivain unique de l'archive partagée
#[derive(Debug, Clone)]
pub struct GpkgArchive {
    path: PathBuf,
    strip_crs: bool,
}

impl GpkgArchive {
    /// `path` doit déjà porter l'extension `.gpkg` (voir [`normalize_archive_path`])
    pub fn new(path: impl Into<PathBuf>, strip_crs: bool) -> Self {
        Self {
            path: path.into(),
            strip_crs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Vrai si les tables doivent être écrites sans Crs
    pub fn strips_crs(&self) -> bool {
        self.strip_crs
    }

    /// Crée l'archive et ses tables système si besoin
    ///
    /// Erreur fatale pour le run : répertoire absent, fichier illisible ou
    /// base SQLite qui n'est pas un GeoPackage.
    pub fn initialize(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !parent.is_dir() {
            bail!("Output directory does not exist: {}", parent.display());
        }

        let conn = self.open()?;

        let application_id: i32 = conn.query_row("PRAGMA application_id", [], |r| r.get(0))?;
        let table_count: i64 =
            conn.query_row("SELECT count(*) FROM sqlite_master", [], |r| r.get(0))?;
        if application_id != APPLICATION_ID && table_count > 0 {
            bail!(
                "Existing file is not a GeoPackage: {}",
                self.path.display()
            );
        }

        conn.pragma_update(None, "application_id", APPLICATION_ID)?;
        conn.pragma_update(None, "user_version", USER_VERSION)?;
        conn.execute_batch(CREATE_METADATA)
            .context("Failed to create GeoPackage metadata tables")?;
        for row in srs::default_rows() {
            insert_srs(&conn, &row)?;
        }

        debug!(path = %self.path.display(), "GeoPackage initialised");
        Ok(())
    }

    /// Écrit (ou remplace) une couche de segments
    ///
    /// # Errors
    ///
    /// `PipelineError::ArchiveWrite` en cas d'erreur SQLite ou d'E/S, ou si
    /// une table du même nom n'est pas une couche LINESTRING enregistrée.
    pub fn write_layer(
        &self,
        layer_id: &str,
        display_name: &str,
        table: &SegmentTable,
    ) -> Result<ArchiveLayerRecord, PipelineError> {
        let row_count = self
            .write_layer_inner(layer_id, display_name, table)
            .map_err(|e| PipelineError::archive_write(layer_id, format!("{:#}", e)))?;

        info!(layer = layer_id, rows = row_count, "Layer written");
        Ok(ArchiveLayerRecord {
            archive_layer_id: layer_id.to_string(),
            display_name: display_name.to_string(),
            row_count,
        })
    }

    fn write_layer_inner(&self, layer_id: &str, display_name: &str, table: &SegmentTable) -> Result<usize> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        drop_existing_layer(&tx, layer_id)?;

        let srs_id = match table.crs {
            Some(crs) => {
                let row = srs::row_for(crs);
                insert_srs(&tx, &row)?;
                row.srs_id
            }
            None => srs::UNDEFINED_CARTESIAN,
        };

        tx.execute_batch(&create_table_sql(layer_id))
            .context("Failed to create layer table")?;

        let (min_x, min_y, max_x, max_y) = match table.bounds() {
            Some((a, b, c, d)) => (Some(a), Some(b), Some(c), Some(d)),
            None => (None, None, None, None),
        };
        tx.execute(
            "INSERT INTO gpkg_contents
                (table_name, data_type, identifier, description, min_x, min_y, max_x, max_y, srs_id)
             VALUES (?1, 'features', ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![layer_id, display_name, min_x, min_y, max_x, max_y, srs_id],
        )?;
        tx.execute(
            "INSERT INTO gpkg_geometry_columns
                (table_name, column_name, geometry_type_name, srs_id, z, m)
             VALUES (?1, ?2, ?3, ?4, 0, 0)",
            params![layer_id, GEOMETRY_COLUMN, GEOMETRY_TYPE, srs_id],
        )?;

        {
            let mut stmt = tx.prepare(&insert_sql(layer_id))?;
            for segment in &table.segments {
                let geometry = Geometry::LineString(segment.geometry.clone());
                let envelope = geometry
                    .bounding_rect()
                    .map(|r| vec![r.min().x, r.max().x, r.min().y, r.max().y])
                    .unwrap_or_default();
                let blob = geometry
                    .to_gpkg_wkb(CoordDimensions::xy(), Some(srs_id), envelope)
                    .context("Failed to encode geometry")?;

                let mut values = vec![
                    Value::Blob(blob),
                    Value::Integer(segment.u),
                    Value::Integer(segment.v),
                    Value::Integer(segment.key as i64),
                    Value::Text(segment.osmid_text()),
                    Value::Integer(segment.oneway as i64),
                    Value::Integer(segment.reversed as i64),
                    Value::Real(segment.length),
                ];
                values.extend(EDGE_TAGS.iter().map(|tag| match segment.tags.get(*tag) {
                    Some(v) => Value::Text(v.clone()),
                    None => Value::Null,
                }));

                stmt.execute(params_from_iter(values.iter()))?;
            }
        }

        if table_exists(&tx, OGR_CONTENTS)? {
            tx.execute(
                "INSERT INTO gpkg_ogr_contents (table_name, feature_count) VALUES (?1, ?2)",
                params![layer_id, table.len() as i64],
            )?;
        }

        tx.commit().context("Failed to commit layer")?;
        Ok(table.len())
    }

    /// Couches de segments présentes dans l'archive
    pub fn layers(&self) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM gpkg_contents WHERE data_type = 'features' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Nombre de lignes d'une couche
    pub fn row_count(&self, layer_id: &str) -> Result<usize> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            &format!("SELECT count(*) FROM {}", quote_identifier(layer_id)),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .context(format!("Failed to open GeoPackage: {}", self.path.display()))
    }
}

fn insert_srs(conn: &Connection, row: &SrsRow) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO gpkg_spatial_ref_sys
            (srs_name, srs_id, organization, organization_coordsys_id, definition, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.srs_name,
            row.srs_id,
            row.organization,
            row.organization_coordsys_id,
            row.definition,
            row.description
        ],
    )?;
    Ok(())
}

/// Supprime une couche existante ; refuse toute table qui n'en est pas une
fn drop_existing_layer(tx: &Transaction<'_>, layer_id: &str) -> Result<()> {
    let exists: Option<String> = tx
        .query_row(
            "SELECT type FROM sqlite_master WHERE name = ?1",
            params![layer_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(());
    }

    let registered: Option<String> = tx
        .query_row(
            "SELECT g.geometry_type_name
               FROM gpkg_geometry_columns g
               JOIN gpkg_contents c ON c.table_name = g.table_name
              WHERE g.table_name = ?1 AND g.column_name = ?2 AND c.data_type = 'features'",
            params![layer_id, GEOMETRY_COLUMN],
            |r| r.get(0),
        )
        .optional()?;

    match registered {
        Some(kind) if kind.eq_ignore_ascii_case(GEOMETRY_TYPE) => {
            debug!(layer = layer_id, "Replacing existing layer");
            tx.execute(
                "DELETE FROM gpkg_geometry_columns WHERE table_name = ?1",
                params![layer_id],
            )?;
            tx.execute("DELETE FROM gpkg_contents WHERE table_name = ?1", params![layer_id])?;
            drop_gdal_side_tables(tx, layer_id)?;
            tx.execute_batch(&format!("DROP TABLE {}", quote_identifier(layer_id)))?;
            Ok(())
        }
        Some(kind) => bail!(
            "schema mismatch: existing layer has geometry type {}, expected {}",
            kind,
            GEOMETRY_TYPE
        ),
        None => bail!("schema mismatch: '{}' exists but is not a features layer", layer_id),
    }
}

/// Index, compteur et extensions qu'OGR maintient à côté d'une couche
fn drop_gdal_side_tables(tx: &Transaction<'_>, layer_id: &str) -> Result<()> {
    if table_exists(tx, OGR_CONTENTS)? {
        tx.execute(
            "DELETE FROM gpkg_ogr_contents WHERE lower(table_name) = lower(?1)",
            params![layer_id],
        )?;
    }
    if table_exists(tx, "gpkg_extensions")? {
        tx.execute(
            "DELETE FROM gpkg_extensions WHERE lower(table_name) = lower(?1)",
            params![layer_id],
        )?;
    }
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {}",
        quote_identifier(&rtree_name(layer_id))
    ))?;
    Ok(())
}

/// Nom de l'index spatial R*Tree créé par GDAL
fn rtree_name(layer_id: &str) -> String {
    format!("rtree_{}_{}", layer_id, GEOMETRY_COLUMN)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn create_table_sql(layer_id: &str) -> String {
    let mut columns = vec![
        "\"fid\" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL".to_string(),
        format!("{} {}", quote_identifier(GEOMETRY_COLUMN), GEOMETRY_TYPE),
        "\"u\" INTEGER".to_string(),
        "\"v\" INTEGER".to_string(),
        "\"key\" INTEGER".to_string(),
        "\"osmid\" TEXT".to_string(),
        "\"oneway\" BOOLEAN".to_string(),
        "\"reversed\" BOOLEAN".to_string(),
        "\"length\" REAL".to_string(),
    ];
    columns.extend(EDGE_TAGS.iter().map(|tag| format!("{} TEXT", quote_identifier(tag))));

    format!("CREATE TABLE {} ({})", quote_identifier(layer_id), columns.join(", "))
}

fn insert_sql(layer_id: &str) -> String {
    let mut names = vec![
        quote_identifier(GEOMETRY_COLUMN),
        "\"u\"".to_string(),
        "\"v\"".to_string(),
        "\"key\"".to_string(),
        "\"osmid\"".to_string(),
        "\"oneway\"".to_string(),
        "\"reversed\"".to_string(),
        "\"length\"".to_string(),
    ];
    names.extend(EDGE_TAGS.iter().map(|tag| quote_identifier(tag)));
    let placeholders = vec!["?"; names.len()].join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(layer_id),
        names.join(", "),
        placeholders
    )
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
