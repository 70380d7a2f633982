use crate::api::models::Plant;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn db_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "example", "Aarchid")?;
    let dir = proj.data_dir().to_path_buf();
    Some(dir.join("cache.sqlite"))
}

fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn open_conn() -> rusqlite::Result<Connection> {
    let path = db_path().ok_or_else(|| rusqlite::Error::InvalidPath("no data dir".into()))?;
    let _ = ensure_dir(&path);
    Connection::open(path)
}

fn now_secs() -> Result<i64, String> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| e.to_string())?
        .as_secs() as i64)
}

// Caching the plant registry to speed up load times and reduce api queries
pub fn init() -> Result<(), String> {
    let conn = open_conn().map_err(|e| e.to_string())?;
    init_schema(&conn)
}

fn init_schema(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS plants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            species TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            raw_json TEXT
        );
        "#,
    )
    .map_err(|e| e.to_string())
}

pub fn upsert_plants(plants: &[Plant]) -> Result<(), String> {
    let mut conn = open_conn().map_err(|e| e.to_string())?;
    upsert_plants_in(&mut conn, plants)
}

fn upsert_plants_in(conn: &mut Connection, plants: &[Plant]) -> Result<(), String> {
    let now = now_secs()?;
    let tx = conn.transaction().map_err(|e| e.to_string())?;
    for p in plants {
        let raw = serde_json::to_string(p).unwrap_or_default();
        tx.execute(
            r#"
            INSERT INTO plants (id, name, species, updated_at, raw_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name=excluded.name,
                species=excluded.species,
                updated_at=excluded.updated_at,
                raw_json=excluded.raw_json
            "#,
            params![p.id, p.name, p.species, now, raw],
        )
        .map_err(|e| e.to_string())?;
    }
    tx.commit().map_err(|e| e.to_string())?;
    Ok(())
}

pub fn get_plants(limit: Option<usize>) -> Result<Vec<Plant>, String> {
    let conn = open_conn().map_err(|e| e.to_string())?;
    get_plants_in(&conn, limit)
}

fn get_plants_in(conn: &Connection, limit: Option<usize>) -> Result<Vec<Plant>, String> {
    let mut stmt = conn
        .prepare("SELECT raw_json FROM plants ORDER BY updated_at DESC, name ASC LIMIT ?1")
        .map_err(|e| e.to_string())?;
    let lim = limit.unwrap_or(500) as i64;
    let rows = stmt
        .query_map(params![lim], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    for r in rows {
        let raw = r.map_err(|e| e.to_string())?;
        match serde_json::from_str::<Plant>(&raw) {
            Ok(plant) => out.push(plant),
            Err(e) => log::warn!("dropping unreadable cached plant: {}", e),
        }
    }
    Ok(out)
}

pub fn last_plant_updated_at(id: &str) -> Result<Option<i64>, String> {
    let conn = open_conn().map_err(|e| e.to_string())?;
    let mut stmt = conn
        .prepare("SELECT updated_at FROM plants WHERE id = ?1")
        .map_err(|e| e.to_string())?;
    let ts: Option<i64> = stmt
        .query_row(params![id], |row| row.get(0))
        .optional()
        .map_err(|e| e.to_string())?;
    Ok(ts)
}
