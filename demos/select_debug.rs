//! Debug run of a SELECT and an OS command against a live server.
//!
//! Reads `PEASYS_*` settings from `tests/.env`. Set `RUST_LOG=peasys_rs=debug`
//! to see the wire exchange.

use peasys_rs::{ConnectParams, Credentials, Session};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::from_path("tests/.env").ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = std::env::var("PEASYS_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port: u16 = std::env::var("PEASYS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let username = std::env::var("PEASYS_USERNAME").expect("PEASYS_USERNAME required");
    let password = std::env::var("PEASYS_PASSWORD").expect("PEASYS_PASSWORD required");
    let license_key = std::env::var("PEASYS_LICENSE_KEY").expect("PEASYS_LICENSE_KEY required");
    let query = std::env::var("PEASYS_QUERY")
        .unwrap_or_else(|_| "SELECT * FROM QSYS2/SYSTABLES FETCH FIRST 5 ROWS ONLY".to_string());

    let mut params = ConnectParams::new(&host, port).with_read_timeout(Duration::from_secs(60));
    if let Ok(url) = std::env::var("PEASYS_LICENSE_SERVER") {
        params = params.with_license_server(url);
    }

    println!("Connecting to {}:{} as {}...", host, port, username);
    let creds = Credentials::new(&username, &password, &license_key);
    let mut session = Session::connect_with_params(&params, &creds).await.unwrap();
    println!("{}", session.connection_message());

    println!("\n--- {} ---", query);
    let response = session.query_for_rows(&query).await.unwrap();
    println!(
        "succeeded={} state={} message={}",
        response.succeeded(),
        response.outcome.sql_state,
        response.outcome.message
    );
    let rs = &response.result;
    println!("Columns: {:?}", rs.column_names());
    for i in 0..rs.len() {
        if let Some(row) = rs.row(i) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            println!("Row {}: {}", i + 1, cells.join(" | "));
        }
    }
    println!("Decoded rows: {} (estimate {})", rs.len(), rs.row_count());

    println!("\n--- DSPJOB OUTPUT(*PRINT) ---");
    let outcome = session.run_os_command("DSPJOB OUTPUT(*PRINT)").await.unwrap();
    println!("succeeded={}", outcome.succeeded);
    for line in outcome.lines() {
        println!("  {}", line);
    }

    session.close().await.unwrap();
    println!("\nDone!");
}
