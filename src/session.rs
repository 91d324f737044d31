//! High-level Session API for the Peasys client.
//!
//! A [`Session`] owns one TCP stream to the AS/400 server. Every operation is
//! a strict request/reply exchange and the protocol carries no request
//! identifiers, so a session can only have one command in flight. All query
//! methods take `&mut self`; callers sharing a session across tasks must wrap
//! it in a mutex themselves.
//!
//! There is no cancellation. Dropping a future in the middle of a request
//! leaves unread reply bytes on the stream and the session must not be used
//! again afterwards.

use crate::error::Result;
use crate::license::{LicenseClient, UsageEvent};
use crate::protocol::buffer::latin1_utf8_len;
use crate::protocol::command_reply::parse_command_reply;
use crate::protocol::connect::{login, open_stream, ConnectParams, ConnectionState, Credentials};
use crate::protocol::constants::*;
use crate::protocol::decode::decode_rows;
use crate::protocol::framer::{CommandStream, Verb};
use crate::protocol::message::Message;
use crate::protocol::messages::CommandMessage;
use crate::protocol::reply::{parse_header_reply, parse_mutation_reply, HeaderReply, SqlReply};
use crate::protocol::statement::{
    parse_create_target, require_text, validate_statement, CreateTarget, StatementKind,
};
use crate::protocol::types::{
    CommandOutcome, CreateOutcome, QueryOutcome, ResultSet, SelectResponse,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// A logged-in Peasys session.
pub struct Session<S = TcpStream> {
    /// Command stream for communication.
    stream: CommandStream<S>,
    host: String,
    port: u16,
    username: String,
    license_key: String,
    /// Handshake result. Always `Connected` for a live session.
    state: ConnectionState,
    /// License service client, if one is configured.
    license: Option<LicenseClient>,
    license_token: Option<String>,
    report_usage: bool,
}

impl Session<TcpStream> {
    /// Connect to a server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Server address in format "host:port"
    /// * `username` - AS/400 profile, at most 10 characters
    /// * `password` - Profile password, at most 10 characters
    /// * `license_key` - License key
    ///
    /// # Example
    ///
    /// ```no_run
    /// use peasys_rs::Session;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let session = Session::connect("as400.example.com:8000", "DIPS", "secret", "KEY").await?;
    ///     session.close().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(
        addr: &str,
        username: &str,
        password: &str,
        license_key: &str,
    ) -> Result<Self> {
        let params = ConnectParams::parse(addr)?;
        let creds = Credentials::new(username, password, license_key);
        Self::connect_with_params(&params, &creds).await
    }

    /// Connect with a separate host and port and an explicit usage-reporting choice.
    pub async fn open(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        license_key: &str,
        report_usage: bool,
    ) -> Result<Self> {
        let params = ConnectParams::new(host, port).with_usage_reporting(report_usage);
        let creds = Credentials::new(username, password, license_key);
        Self::connect_with_params(&params, &creds).await
    }

    /// Connect with explicit connection parameters.
    ///
    /// Credentials are checked before any I/O. The license key is then
    /// validated with the license service (when configured), the TCP stream
    /// is opened and the login handshake runs.
    pub async fn connect_with_params(params: &ConnectParams, creds: &Credentials) -> Result<Self> {
        params.validate()?;
        creds.validate()?;

        let (license, license_token) = match &params.license_server {
            Some(base_url) => {
                let client = LicenseClient::new(base_url, params.connect_timeout)?;
                let token = client.validate(&params.host, &creds.license_key).await?;
                (Some(client), token)
            }
            None => (None, None),
        };

        let tcp_stream = open_stream(params).await?;
        Self::establish(tcp_stream, params, creds, license, license_token).await
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Log in over an already-open stream.
    ///
    /// License validation and usage reporting are skipped.
    pub async fn from_stream(stream: S, params: &ConnectParams, creds: &Credentials) -> Result<Self> {
        creds.validate()?;
        Self::establish(stream, params, creds, None, None).await
    }

    async fn establish(
        stream: S,
        params: &ConnectParams,
        creds: &Credentials,
        license: Option<LicenseClient>,
        license_token: Option<String>,
    ) -> Result<Self> {
        let mut stream = CommandStream::new(stream);
        stream.set_read_timeout(params.read_timeout);

        let state = login(&mut stream, creds).await?.into_result()?;

        if let Some(client) = &license {
            client.report_detached(vec![UsageEvent::login(&creds.license_key)]);
        }

        info!(host = %params.host, port = params.port, "session opened");

        Ok(Self {
            stream,
            host: params.host.clone(),
            port: params.port,
            username: creds.username.clone(),
            license_key: creds.license_key.clone(),
            state,
            license,
            license_token,
            report_usage: params.report_usage,
        })
    }

    /// Run a row-returning statement.
    ///
    /// A statement rejected by the server is not an `Err`: the response has
    /// `succeeded == false`, the SQL state and message, and no rows.
    pub async fn query_for_rows(&mut self, sql: &str) -> Result<SelectResponse> {
        validate_statement(sql, StatementKind::Select)?;
        self.fetch_rows(sql).await
    }

    /// Same as [`query_for_rows`](Self::query_for_rows).
    pub async fn execute_select(&mut self, sql: &str) -> Result<SelectResponse> {
        self.query_for_rows(sql).await
    }

    /// Run any statement that does not return rows.
    ///
    /// The leading keyword still decides how the reply is classified:
    /// INSERT/UPDATE/DELETE report a row count and UPDATE accepts `01504`.
    pub async fn query_for_mutation(&mut self, sql: &str) -> Result<QueryOutcome> {
        require_text(sql)?;
        self.mutate(StatementKind::classify(sql), sql).await
    }

    /// Same as [`query_for_mutation`](Self::query_for_mutation).
    pub async fn execute(&mut self, sql: &str) -> Result<QueryOutcome> {
        self.query_for_mutation(sql).await
    }

    pub async fn execute_insert(&mut self, sql: &str) -> Result<QueryOutcome> {
        self.execute_kind(StatementKind::Insert, sql).await
    }

    pub async fn execute_update(&mut self, sql: &str) -> Result<QueryOutcome> {
        self.execute_kind(StatementKind::Update, sql).await
    }

    pub async fn execute_delete(&mut self, sql: &str) -> Result<QueryOutcome> {
        self.execute_kind(StatementKind::Delete, sql).await
    }

    pub async fn execute_alter(&mut self, sql: &str) -> Result<QueryOutcome> {
        self.execute_kind(StatementKind::Alter, sql).await
    }

    pub async fn execute_drop(&mut self, sql: &str) -> Result<QueryOutcome> {
        self.execute_kind(StatementKind::Drop, sql).await
    }

    /// Run a CREATE TABLE, CREATE INDEX or CREATE DATABASE statement.
    ///
    /// Other CREATE forms are rejected before anything is sent.
    pub async fn execute_create(&mut self, sql: &str) -> Result<CreateOutcome> {
        validate_statement(sql, StatementKind::Create)?;
        let target = parse_create_target(sql)?;
        let outcome = self.mutate(StatementKind::Create, sql).await?;

        let (database_name, index_name) = match target {
            CreateTarget::Table => (None, None),
            CreateTarget::Index(name) => (None, Some(name)),
            CreateTarget::Database(name) => (Some(name), None),
        };
        Ok(CreateOutcome {
            outcome,
            database_name,
            index_name,
        })
    }

    /// Run an OS/400 CL command.
    ///
    /// Never fails on reply content; see [`CommandOutcome`]. Command traffic
    /// is not reported to the license server.
    pub async fn run_os_command(&mut self, command: &str) -> Result<CommandOutcome> {
        require_text(command)?;
        let reply = self.stream.request(Verb::OsCommand, command).await?;
        let outcome = parse_command_reply(&reply);
        debug!(
            succeeded = outcome.succeeded,
            messages = outcome.messages.len(),
            "os command complete"
        );
        Ok(outcome)
    }

    /// Same as [`run_os_command`](Self::run_os_command).
    pub async fn execute_command(&mut self, command: &str) -> Result<CommandOutcome> {
        self.run_os_command(command).await
    }

    /// Send the disconnect sentinel and close the stream.
    ///
    /// The server does not reply.
    pub async fn close(mut self) -> Result<()> {
        let msg = CommandMessage::stop();
        debug!(bytes = msg.wire_size(), "sending disconnect");
        self.stream.send_message(&msg).await?;
        self.stream.shutdown().await?;
        info!(host = %self.host, port = self.port, "session closed");
        Ok(())
    }

    /// Same as [`close`](Self::close).
    pub async fn disconnect(self) -> Result<()> {
        self.close().await
    }

    /// Server host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn license_key(&self) -> &str {
        &self.license_key
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// `"Connected"` for a live session.
    pub fn connection_message(&self) -> &'static str {
        self.state.message()
    }

    /// Token handed out by the license service, if any.
    pub fn license_token(&self) -> Option<&str> {
        self.license_token.as_deref()
    }

    /// Whether traffic statistics are sent to the license service.
    pub fn reports_usage(&self) -> bool {
        self.report_usage && self.license.is_some()
    }

    async fn execute_kind(&mut self, kind: StatementKind, sql: &str) -> Result<QueryOutcome> {
        validate_statement(sql, kind)?;
        self.mutate(kind, sql).await
    }

    async fn mutate(&mut self, kind: StatementKind, sql: &str) -> Result<QueryOutcome> {
        let reply = self.stream.request(Verb::Mutate, sql).await?;
        self.report_traffic(sql, reply.len());
        let outcome = parse_mutation_reply(kind, &reply)?;
        if !outcome.succeeded {
            debug!(sql_state = %outcome.sql_state, message = %outcome.message, "statement failed");
        }
        Ok(outcome)
    }

    async fn fetch_rows(&mut self, sql: &str) -> Result<SelectResponse> {
        let header = self.stream.request(Verb::FetchHeader, sql).await?;
        let columns = match parse_header_reply(&header)? {
            HeaderReply::Columns(columns) => columns,
            HeaderReply::SqlError(SqlReply { sql_state, message }) => {
                debug!(sql_state = %sql_state, message = %message, "select rejected");
                return Ok(SelectResponse {
                    outcome: QueryOutcome {
                        succeeded: false,
                        sql_state,
                        message,
                        rows_affected: 0,
                    },
                    result: ResultSet::default(),
                });
            }
        };

        let data = self.stream.request_raw(Verb::FetchData, sql).await?;
        self.report_traffic(sql, latin1_utf8_len(&data));
        let result = decode_rows(&columns, data)?;
        debug!(
            columns = result.column_count(),
            rows = result.len(),
            "select complete"
        );

        Ok(SelectResponse {
            outcome: QueryOutcome {
                succeeded: true,
                sql_state: SQL_STATE_SUCCESS.to_string(),
                message: SELECT_SUCCESS_MESSAGE.to_string(),
                rows_affected: 0,
            },
            result,
        })
    }

    /// Report bytes sent and received, if usage reporting is on.
    fn report_traffic(&self, sent: &str, received: usize) {
        if !self.report_usage {
            return;
        }
        match &self.license {
            Some(client) => client.report_detached(vec![
                UsageEvent::data_in(sent.len() as u64),
                UsageEvent::data_out(received as u64),
            ]),
            None => warn!("usage reporting enabled without a license server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::types::Value;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

    fn params() -> ConnectParams {
        ConnectParams::new("as400", 8000).without_license_server()
    }

    fn creds() -> Credentials {
        Credentials::new("DIPS", "secret", "KEY")
    }

    /// Read one framed command from the client side.
    async fn read_command(server: &mut DuplexStream) -> String {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        while !buf.ends_with(TERMINATOR) {
            server.read_exact(&mut byte).await.unwrap();
            buf.push(byte[0]);
        }
        buf.truncate(buf.len() - TERMINATOR.len());
        buf.iter().map(|&b| b as char).collect()
    }

    async fn logged_in() -> (Session<DuplexStream>, DuplexStream) {
        let (client, mut server) = duplex(64 * 1024);
        let handshake = tokio::spawn(async move {
            let mut login = [0u8; 20];
            server.read_exact(&mut login).await.unwrap();
            server.write_all(b"1").await.unwrap();
            server
        });
        let session = Session::from_stream(client, &params(), &creds()).await.unwrap();
        (session, handshake.await.unwrap())
    }

    #[tokio::test]
    async fn test_handshake_connected() {
        let (session, _server) = logged_in().await;
        assert_eq!(session.connection_state(), ConnectionState::Connected);
        assert_eq!(session.connection_message(), "Connected");
        assert_eq!(session.username(), "DIPS");
        assert_eq!(session.host(), "as400");
        assert_eq!(session.port(), 8000);
        assert!(session.license_token().is_none());
        assert!(!session.reports_usage());
    }

    #[tokio::test]
    async fn test_handshake_rejected() {
        let (client, mut server) = duplex(1024);
        tokio::spawn(async move {
            let mut login = [0u8; 20];
            server.read_exact(&mut login).await.unwrap();
            server.write_all(b"4").await.unwrap();
        });
        let err = Session::from_stream(client, &params(), &creds())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidCredentials { .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_select_round_trip() {
        let (mut session, mut server) = logged_in().await;
        let server_task = tokio::spawn(async move {
            assert_eq!(read_command(&mut server).await, "gethSELECT ID, NAME FROM LIB/T");
            server
                .write_all(
                    br#"{"name":"ID","type":496,"scal":0,"prec":10},{"name":"NAME","type":452,"scal":0,"prec":5}]dipsjbiemg"#,
                )
                .await
                .unwrap();
            assert_eq!(read_command(&mut server).await, "getdSELECT ID, NAME FROM LIB/T");
            server
                .write_all(b"0000000001alice0000000002bob  dipsjbiemg")
                .await
                .unwrap();
            server
        });

        let response = session.execute_select("SELECT ID, NAME FROM LIB/T").await.unwrap();
        assert!(response.succeeded());
        assert_eq!(response.outcome.sql_state, "00000");
        assert_eq!(response.outcome.message, "SELECT query executed well");
        assert_eq!(response.result.len(), 2);
        assert_eq!(response.result.get(0, "id"), Some(&Value::Integer(1)));
        assert_eq!(response.result.get(1, "name"), Some(&Value::Text("bob".to_string())));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_select_sql_error() {
        let (mut session, mut server) = logged_in().await;
        tokio::spawn(async move {
            read_command(&mut server).await;
            server
                .write_all(b"42704MISSING in LIB type *FILE not found.dipsjbiemg")
                .await
                .unwrap();
            server
        });

        let response = session.query_for_rows("SELECT * FROM LIB/MISSING").await.unwrap();
        assert!(!response.succeeded());
        assert_eq!(response.outcome.sql_state, "42704");
        assert_eq!(response.outcome.message, "MISSING in LIB type *FILE not found.");
        assert!(response.result.is_empty());
        assert_eq!(response.result.column_count(), 0);
    }

    #[tokio::test]
    async fn test_update_no_rows_succeeds() {
        let (mut session, mut server) = logged_in().await;
        tokio::spawn(async move {
            assert_eq!(read_command(&mut server).await, "updtUPDATE LIB/T SET A = 1");
            server.write_all(b"01504no rows updateddipsjbiemg").await.unwrap();
            server
        });

        let outcome = session.query_for_mutation("UPDATE LIB/T SET A = 1").await.unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.rows_affected, 0);
    }

    #[tokio::test]
    async fn test_execute_create_index() {
        let (mut session, mut server) = logged_in().await;
        tokio::spawn(async move {
            read_command(&mut server).await;
            server.write_all(b"00000Index created.dipsjbiemg").await.unwrap();
            server
        });

        let created = session
            .execute_create("CREATE INDEX LIB/IDX1 ON LIB/T (A)")
            .await
            .unwrap();
        assert!(created.outcome.succeeded);
        assert_eq!(created.index_name.as_deref(), Some("LIB/IDX1"));
        assert!(created.database_name.is_none());
    }

    #[tokio::test]
    async fn test_validation_happens_before_io() {
        let (mut session, mut server) = logged_in().await;

        assert!(matches!(
            session.execute_insert("DELETE FROM LIB/T").await,
            Err(Error::InvalidSyntax { .. })
        ));
        assert!(session.execute_select("").await.is_err());
        assert!(session.execute_create("CREATE VIEW V AS SELECT 1").await.is_err());
        assert!(session.execute("SELECT 'dipsjbiemg'").await.is_err());
        assert!(matches!(
            session.execute("INSERT INTO T VALUES('€')").await,
            Err(Error::UnencodableCharacter { .. })
        ));
        assert!(session.run_os_command("").await.is_err());

        // Nothing was written: the next command is the first thing the server sees.
        tokio::spawn(async move {
            assert_eq!(read_command(&mut server).await, "updtDROP TABLE LIB/T");
            server.write_all(b"00000Dropped.dipsjbiemg").await.unwrap();
            server
        });
        assert!(session.execute_drop("DROP TABLE LIB/T").await.unwrap().succeeded);
    }

    #[tokio::test]
    async fn test_query_for_rows_rejects_non_select() {
        let (mut session, mut server) = logged_in().await;

        assert!(matches!(
            session.query_for_rows("DELETE FROM LIB/T").await,
            Err(Error::InvalidSyntax { .. })
        ));
        assert!(matches!(
            session.execute_select("UPDATE LIB/T SET A = 1").await,
            Err(Error::InvalidSyntax { .. })
        ));

        tokio::spawn(async move {
            assert_eq!(read_command(&mut server).await, "gethselect * from LIB/T");
            server
                .write_all(b"42704T in LIB type *FILE not found.dipsjbiemg")
                .await
                .unwrap();
            server
        });
        let response = session.query_for_rows("select * from LIB/T").await.unwrap();
        assert_eq!(response.outcome.sql_state, "42704");
    }

    #[tokio::test]
    async fn test_os_command_failure() {
        let (mut session, mut server) = logged_in().await;
        tokio::spawn(async move {
            assert_eq!(read_command(&mut server).await, "exasDLTLIB LIB(NOPE)");
            let reply = format!("CPF2110{}Library NOPE not found.dipsjbiemg", " ".repeat(105));
            server.write_all(reply.as_bytes()).await.unwrap();
            server
        });

        let outcome = session.run_os_command("DLTLIB LIB(NOPE)").await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.lines(), vec!["CPF2110 Library NOPE not found"]);
    }

    #[tokio::test]
    async fn test_close_sends_sentinel() {
        let (session, mut server) = logged_in().await;
        session.close().await.unwrap();
        let mut buf = Vec::new();
        server.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"stopdipsjbiemg");
    }
}
