//! Storage layer for flightbook.
//!
//! This module provides `SQLite`-based persistent storage for the aircraft,
//! owners, pilots and flights, including the transactional usage
//! accumulation performed when a flight completes.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::lifecycle::usage::{self, UsageUpdate};
use crate::model::{
    format_timestamp, parse_timestamp, Aircraft, Flight, FlightStatus, FlightType, IdType, Owner,
    PayloadState, Phase, Pilot, PostFlight, Signatures, TimerLease,
};

const FLIGHT_COLUMNS: &str = "id, type, status, date, start_time, end_time, duration, crew, \
     equipment, prevuelo, postvuelo, carga, fases, signatures, pdf_path";

const AIRCRAFT_COLUMNS: &str = "id, name, code, part_num, serial_num, motors, batteries_main, \
     batteries_spare, cameras, total_hours";

/// Storage engine for flight records.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Aircraft, owner and pilot registration
/// - Guarded flight status transitions
/// - Usage accumulation in the same transaction as flight completion
/// - Logbook and missing-report queries
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Result of completing a flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Usage credited to the aircraft, if one is registered.
    pub usage: Option<UsageUpdate>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // --- aircraft ---

    /// Register an aircraft, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is already registered or the database
    /// operation fails.
    pub fn insert_aircraft(&self, aircraft: &Aircraft) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO aircraft (name, code, part_num, serial_num, motors, batteries_main,
                                  batteries_spare, cameras, total_hours)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                aircraft.name,
                aircraft.code,
                aircraft.part_num,
                aircraft.serial_num,
                to_json(&aircraft.motors)?,
                to_json(&aircraft.batteries_main)?,
                to_json(&aircraft.batteries_spare)?,
                to_json(&aircraft.cameras)?,
                minutes_to_sql(aircraft.total_minutes),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted aircraft {} with id {}", aircraft.code, id);
        Ok(id)
    }

    /// The aircraft flights accumulate into: the first registered row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row cannot
    /// be decoded.
    pub fn aircraft(&self) -> Result<Option<Aircraft>> {
        Ok(query_primary_aircraft(&self.conn)?)
    }

    /// Overwrite the stored aircraft record.
    ///
    /// # Errors
    ///
    /// Returns an error if the aircraft has no id or the database operation fails.
    pub fn update_aircraft(&self, aircraft: &Aircraft) -> Result<()> {
        let id = aircraft
            .id
            .ok_or_else(|| Error::internal("aircraft record has no id"))?;
        write_aircraft(&self.conn, id, aircraft)
    }

    // --- owners and pilots ---

    /// Register an owner, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_owner(&self, owner: &Owner) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO owners (name, id_type, id_num) VALUES (?1, ?2, ?3)",
            params![owner.name, owner.id_type.to_string(), owner.id_num],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All registered owners.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn owners(&self) -> Result<Vec<Owner>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, id_type, id_num FROM owners ORDER BY id")?;
        let owners = stmt
            .query_map([], row_to_owner)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(owners)
    }

    /// Register a pilot, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the national id is already registered or the
    /// database operation fails.
    pub fn insert_pilot(&self, pilot: &Pilot) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO pilots (name, cc, license_num, license_type, license_expiry)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                pilot.name,
                pilot.cc,
                pilot.license_num,
                pilot.license_type,
                format_timestamp(pilot.license_expiry),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All registered pilots, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pilots(&self) -> Result<Vec<Pilot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, cc, license_num, license_type, license_expiry FROM pilots ORDER BY name",
        )?;
        let pilots = stmt
            .query_map([], row_to_pilot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pilots)
    }

    /// Get a pilot by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pilot(&self, id: i64) -> Result<Option<Pilot>> {
        let pilot = self
            .conn
            .query_row(
                "SELECT id, name, cc, license_num, license_type, license_expiry FROM pilots WHERE id = ?1",
                [id],
                row_to_pilot,
            )
            .optional()?;
        Ok(pilot)
    }

    // --- flights ---

    /// Insert a new flight record, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_flight(&self, flight: &Flight) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO flights (type, status, date, start_time, end_time, duration, crew,
                                 equipment, prevuelo, postvuelo, carga, fases, signatures, pdf_path)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
            params![
                flight.flight_type.as_str(),
                flight.status.as_str(),
                format_timestamp(flight.date),
                flight.start_time.map(format_timestamp),
                flight.end_time.map(format_timestamp),
                flight.duration_secs,
                to_json(&flight.crew)?,
                to_json(&flight.equipment)?,
                to_json_opt(flight.preflight.as_ref())?,
                to_json_opt(flight.postflight.as_ref())?,
                to_json_opt(flight.payload.as_ref())?,
                to_json(&flight.phases)?,
                to_json_opt(flight.signatures.as_ref())?,
                flight.report_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted flight with id {}", id);
        Ok(id)
    }

    /// Get a flight by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row cannot
    /// be decoded.
    pub fn flight(&self, id: i64) -> Result<Option<Flight>> {
        let flight = self
            .conn
            .query_row(
                &format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = ?1"),
                [id],
                row_to_flight,
            )
            .optional()?;
        Ok(flight)
    }

    /// Current status of a flight, read without decoding the rest of the row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn flight_status(&self, id: i64) -> Result<Option<FlightStatus>> {
        let status: Option<String> = self
            .conn
            .query_row("SELECT status FROM flights WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(status.and_then(|s| s.parse().ok()))
    }

    /// The most recent flights, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn flights(&self, limit: usize) -> Result<Vec<Flight>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_flights(
            &format!("SELECT {FLIGHT_COLUMNS} FROM flights ORDER BY date DESC, id DESC LIMIT ?1"),
            params![limit_i64],
        )
    }

    /// Ids of flights currently in the given status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn flight_ids_with_status(&self, status: FlightStatus) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM flights WHERE status = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map([status.as_str()], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Id of the flight currently in progress, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn active_flight_id(&self) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM flights WHERE status = ?1 ORDER BY id LIMIT 1",
                [FlightStatus::InProgress.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Move a scheduled flight to in-progress.
    ///
    /// Returns `false` and writes nothing if the flight is not scheduled or
    /// another flight is already in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn start_flight(
        &self,
        id: i64,
        start_time: DateTime<Utc>,
        payload: &PayloadState,
    ) -> Result<bool> {
        let affected = self.conn.execute(
            r"
            UPDATE flights SET status = ?1, start_time = ?2, end_time = NULL, carga = ?3,
                               cronometro = ?4
            WHERE id = ?5 AND status = ?6
              AND NOT EXISTS (SELECT 1 FROM flights WHERE status = ?1)
            ",
            params![
                FlightStatus::InProgress.as_str(),
                format_timestamp(start_time),
                to_json(payload)?,
                to_json(&TimerLease {
                    last_seen: start_time,
                })?,
                id,
                FlightStatus::Scheduled.as_str(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Renew the timer lease of an in-progress flight.
    ///
    /// Returns `false` and writes nothing if the flight is not in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn touch_flight(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE flights SET cronometro = ?1 WHERE id = ?2 AND status = ?3",
            params![
                to_json(&TimerLease { last_seen: at })?,
                id,
                FlightStatus::InProgress.as_str(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// The timer lease of a flight.
    ///
    /// A missing or undecodable `cronometro` value reads as no lease.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn timer_lease(&self, id: i64) -> Result<Option<TimerLease>> {
        let raw: Option<Option<String>> = self
            .conn
            .query_row("SELECT cronometro FROM flights WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(text) = raw.flatten() else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(lease) => Ok(Some(lease)),
            Err(e) => {
                debug!("Flight {} has no usable timer lease: {}", id, e);
                Ok(None)
            }
        }
    }

    /// Persist the payload state of a flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_payload(&self, id: i64, payload: &PayloadState) -> Result<()> {
        self.conn.execute(
            "UPDATE flights SET carga = ?1 WHERE id = ?2",
            params![to_json(payload)?, id],
        )?;
        Ok(())
    }

    /// Persist the phase log of a flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_phases(&self, id: i64, phases: &[Phase]) -> Result<()> {
        self.conn.execute(
            "UPDATE flights SET fases = ?1 WHERE id = ?2",
            params![to_json(phases)?, id],
        )?;
        Ok(())
    }

    /// Complete an in-progress flight and credit its usage to the aircraft.
    ///
    /// The status change and the usage update commit together. Returns
    /// `None` and writes nothing if the flight is not in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is committed.
    pub fn complete_flight(
        &self,
        id: i64,
        end_time: DateTime<Utc>,
        duration_secs: i64,
        phases: &[Phase],
    ) -> Result<Option<Completion>> {
        let tx = self.conn.unchecked_transaction()?;

        let affected = tx.execute(
            r"
            UPDATE flights SET status = ?1, end_time = ?2, duration = ?3, fases = ?4
            WHERE id = ?5 AND status = ?6
            ",
            params![
                FlightStatus::Completed.as_str(),
                format_timestamp(end_time),
                duration_secs,
                to_json(phases)?,
                id,
                FlightStatus::InProgress.as_str(),
            ],
        )?;
        if affected == 0 {
            return Ok(None);
        }

        let minutes = usage::flown_minutes(duration_secs);
        let usage = match query_primary_aircraft(&tx)? {
            Some(mut aircraft) => {
                let aircraft_id = aircraft
                    .id
                    .ok_or_else(|| Error::internal("aircraft row has no id"))?;
                usage::apply(&mut aircraft, minutes);
                write_aircraft(&tx, aircraft_id, &aircraft)?;
                Some(UsageUpdate {
                    aircraft_id,
                    minutes,
                    total_minutes: aircraft.total_minutes,
                })
            }
            None => {
                warn!("Flight {} completed with no registered aircraft", id);
                None
            }
        };

        tx.commit()?;
        info!("Flight {} completed after {}s", id, duration_secs);
        Ok(Some(Completion { usage }))
    }

    /// Abort a scheduled or in-progress flight.
    ///
    /// Returns `false` and writes nothing if the flight is already terminal
    /// or does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn abort_flight(&self, id: i64, end_time: DateTime<Utc>, duration_secs: i64) -> Result<bool> {
        let affected = self.conn.execute(
            r"
            UPDATE flights SET status = ?1, end_time = ?2, duration = ?3
            WHERE id = ?4 AND status IN (?5, ?6)
            ",
            params![
                FlightStatus::Aborted.as_str(),
                format_timestamp(end_time),
                duration_secs,
                id,
                FlightStatus::Scheduled.as_str(),
                FlightStatus::InProgress.as_str(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Record where a flight's report was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_report_path(&self, id: i64, path: &Path) -> Result<()> {
        self.conn.execute(
            "UPDATE flights SET pdf_path = ?1 WHERE id = ?2",
            params![path.to_string_lossy(), id],
        )?;
        Ok(())
    }

    /// Persist the post-flight form, its signatures and the report path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_postflight(
        &self,
        id: i64,
        postflight: &PostFlight,
        signatures: &Signatures,
        report_path: &Path,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE flights SET postvuelo = ?1, signatures = ?2, pdf_path = ?3 WHERE id = ?4",
            params![
                to_json(postflight)?,
                to_json(signatures)?,
                report_path.to_string_lossy(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Terminal flights that have no report on record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn flights_missing_report(&self) -> Result<Vec<Flight>> {
        self.query_flights(
            &format!(
                "SELECT {FLIGHT_COLUMNS} FROM flights
                 WHERE status IN (?1, ?2) AND (pdf_path IS NULL OR pdf_path = '')
                 ORDER BY id"
            ),
            params![
                FlightStatus::Completed.as_str(),
                FlightStatus::Aborted.as_str()
            ],
        )
    }

    /// Flights with a report, newest first, optionally of one type only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn reports(&self, flight_type: Option<FlightType>) -> Result<Vec<Flight>> {
        match flight_type {
            Some(t) => self.query_flights(
                &format!(
                    "SELECT {FLIGHT_COLUMNS} FROM flights
                     WHERE pdf_path IS NOT NULL AND pdf_path != '' AND type = ?1
                     ORDER BY date DESC, id DESC"
                ),
                params![t.as_str()],
            ),
            None => self.query_flights(
                &format!(
                    "SELECT {FLIGHT_COLUMNS} FROM flights
                     WHERE pdf_path IS NOT NULL AND pdf_path != ''
                     ORDER BY date DESC, id DESC"
                ),
                params![],
            ),
        }
    }

    /// Count flights in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_flights(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM flights", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let mut stats = StorageStats {
            total_flights: self.count_flights()?,
            ..StorageStats::default()
        };

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM flights GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (status, count) in rows {
            match status.parse::<FlightStatus>() {
                Ok(FlightStatus::Scheduled) => stats.scheduled = count,
                Ok(FlightStatus::InProgress) => stats.in_progress = count,
                Ok(FlightStatus::Completed) => stats.completed = count,
                Ok(FlightStatus::Aborted) => stats.aborted = count,
                Err(e) => warn!("Ignoring flights with {}", e),
            }
        }

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT date FROM flights ORDER BY date DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        stats.newest_flight = newest.as_deref().and_then(parse_timestamp);

        stats.db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(stats)
    }

    fn query_flights(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Flight>> {
        let mut stmt = self.conn.prepare(sql)?;
        let flights = stmt
            .query_map(params, row_to_flight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(flights)
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of flights stored.
    pub total_flights: i64,
    /// Flights scheduled but not started.
    pub scheduled: i64,
    /// Flights in progress.
    pub in_progress: i64,
    /// Completed flights.
    pub completed: i64,
    /// Aborted flights.
    pub aborted: i64,
    /// Date of the newest flight.
    pub newest_flight: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

fn query_primary_aircraft(conn: &Connection) -> rusqlite::Result<Option<Aircraft>> {
    conn.query_row(
        &format!("SELECT {AIRCRAFT_COLUMNS} FROM aircraft ORDER BY id LIMIT 1"),
        [],
        row_to_aircraft,
    )
    .optional()
}

fn write_aircraft(conn: &Connection, id: i64, aircraft: &Aircraft) -> Result<()> {
    conn.execute(
        r"
        UPDATE aircraft SET name = ?1, code = ?2, part_num = ?3, serial_num = ?4, motors = ?5,
                            batteries_main = ?6, batteries_spare = ?7, cameras = ?8,
                            total_hours = ?9
        WHERE id = ?10
        ",
        params![
            aircraft.name,
            aircraft.code,
            aircraft.part_num,
            aircraft.serial_num,
            to_json(&aircraft.motors)?,
            to_json(&aircraft.batteries_main)?,
            to_json(&aircraft.batteries_spare)?,
            to_json(&aircraft.cameras)?,
            minutes_to_sql(aircraft.total_minutes),
            id,
        ],
    )?;
    Ok(())
}

fn minutes_to_sql(minutes: u64) -> i64 {
    i64::try_from(minutes).unwrap_or(i64::MAX)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn to_json_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(to_json).transpose()
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

/// Decode a nullable JSON column; SQL `NULL`, empty text and JSON `null` are `None`.
fn json_column<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    match raw.as_deref().map(str::trim) {
        None | Some("" | "null") => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
    }
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(text) => parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("invalid timestamp: {text}"))),
    }
}

fn row_to_flight(row: &rusqlite::Row) -> rusqlite::Result<Flight> {
    let type_str: String = row.get(1)?;
    let status_str: String = row.get(2)?;
    let flight_type: FlightType = type_str.parse().map_err(|e: String| conversion_error(1, e))?;
    let status: FlightStatus = status_str.parse().map_err(|e: String| conversion_error(2, e))?;
    let date = timestamp_column(row, 3)?.ok_or_else(|| conversion_error(3, "missing date"))?;
    let pdf_path: Option<String> = row.get(14)?;

    Ok(Flight {
        id: Some(row.get(0)?),
        flight_type,
        status,
        date,
        start_time: timestamp_column(row, 4)?,
        end_time: timestamp_column(row, 5)?,
        duration_secs: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        crew: json_column(row, 7)?,
        equipment: json_column(row, 8)?,
        preflight: json_column(row, 9)?,
        postflight: json_column(row, 10)?,
        payload: json_column(row, 11)?,
        phases: json_column(row, 12)?.unwrap_or_default(),
        signatures: json_column(row, 13)?,
        report_path: pdf_path.filter(|p| !p.is_empty()).map(PathBuf::from),
    })
}

fn row_to_aircraft(row: &rusqlite::Row) -> rusqlite::Result<Aircraft> {
    let total: Option<i64> = row.get(9)?;
    let mut aircraft = Aircraft {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        code: row.get(2)?,
        part_num: row.get(3)?,
        serial_num: row.get(4)?,
        motors: json_column(row, 5)?.unwrap_or_default(),
        batteries_main: json_column(row, 6)?.unwrap_or_default(),
        batteries_spare: json_column(row, 7)?.unwrap_or_default(),
        cameras: json_column(row, 8)?.unwrap_or_default(),
        total_minutes: u64::try_from(total.unwrap_or(0)).unwrap_or(0),
    };
    aircraft.assign_missing_ids();
    Ok(aircraft)
}

fn row_to_owner(row: &rusqlite::Row) -> rusqlite::Result<Owner> {
    let id_type_str: String = row.get(2)?;
    let id_type: IdType = id_type_str
        .parse()
        .map_err(|e: String| conversion_error(2, e))?;
    Ok(Owner {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        id_type,
        id_num: row.get(3)?,
    })
}

fn row_to_pilot(row: &rusqlite::Row) -> rusqlite::Result<Pilot> {
    let expiry =
        timestamp_column(row, 5)?.ok_or_else(|| conversion_error(5, "missing license expiry"))?;
    Ok(Pilot {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        cc: row.get(2)?,
        license_num: row.get(3)?,
        license_type: row.get(4)?,
        license_expiry: expiry,
    })
}
