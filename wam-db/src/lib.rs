//! In-memory SQLite store for well properties, pumping histories and
//! computed stream depletion.
//!
//! The store is the tabular reader/writer behind the depletion pipeline:
//! CSV inputs are loaded into tables, read back as typed records and wide
//! series, and depletion results are written next to them so that per-well
//! series and per-date totals can be queried.
//!
//! # Usage
//!
//! ```rust
//! use wam_db::Database;
//!
//! let db = Database::new().unwrap();
//! db.load_wells("wap,distance_m,storage_coefficient,transmissivity_m2d\nJ36/0001,500,0.002,300\n").unwrap();
//! db.load_pumping("Date,J36/0001\n2020-01-01,10\n2020-01-02,10\n").unwrap();
//!
//! let wells = db.query_wells().unwrap();
//! assert_eq!(wells.len(), 1);
//! let pumping = db.query_pumping("J36/0001").unwrap();
//! assert_eq!(pumping.len(), 2);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.
//! - `wells` - aquifer properties per WAP
//! - `pumping` - daily pumping rates, NULL where missing
//! - `depletion` - daily stream depletion per WAP
//!
//! Dates are stored as ISO `YYYY-MM-DD` text so that lexical and
//! chronological order agree. Totals are derived with `GROUP BY date`.

pub mod schema;
mod loader;
mod queries;
pub mod models;

use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;

/// In-memory SQLite database holding one model run's depletion inputs and
/// outputs. Cloning shares the connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}
