//! Peasys client for Rust
//!
//! An async client for the Peasys protocol, which runs SQL statements and
//! OS/400 CL commands on an IBM AS/400 (IBM i) server over plain TCP.
//!
//! # Example
//!
//! ```no_run
//! use peasys_rs::{Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Connect to the server
//!     let mut session = Session::connect(
//!         "as400.example.com:8000",
//!         "DIPS",
//!         "secret",
//!         "LICENSE-KEY"
//!     ).await?;
//!
//!     let response = session.execute_select("SELECT * FROM QGPL/CLIENTS").await?;
//!     for (name, values) in response.result.columns() {
//!         println!("{}: {} values", name, values.len());
//!     }
//!
//!     let outcome = session.run_os_command("CRTLIB LIB(MYLIB)").await?;
//!     println!("{:?}", outcome.lines());
//!
//!     // Close session
//!     session.close().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod license;
pub mod protocol;
pub mod session;

// Re-export main types
pub use error::{Error, ErrorKind, Result};
pub use license::{LicenseClient, LicenseToken, UsageEvent};
pub use protocol::connect::{ConnectParams, ConnectionState, Credentials};
pub use protocol::statement::StatementKind;
pub use protocol::types::{
    ColumnDescriptor, CommandOutcome, CommandReplyEntry, CreateOutcome, PackedDecimal,
    QueryOutcome, ResultSet, SelectResponse, Value,
};
pub use session::Session;
