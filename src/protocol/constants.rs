//! Peasys wire protocol constants.

// Framing
pub const TERMINATOR: &[u8; 10] = b"dipsjbiemg";
pub const HEADER_REPLY_SEED: u8 = b'[';

// Command verbs
pub const VERB_FETCH_HEADER: &str = "geth";
pub const VERB_FETCH_DATA: &str = "getd";
pub const VERB_MUTATE: &str = "updt";
pub const VERB_OS_COMMAND: &str = "exas";
pub const VERB_STOP: &str = "stop";

// Login block
pub const CREDENTIAL_FIELD_WIDTH: usize = 10;

// Handshake status digits
pub const STATUS_CONNECTED: u8 = 1;
pub const STATUS_PROFILE_REJECTED: u8 = 2;
pub const STATUS_INVALID_CREDENTIALS: u8 = 3;
pub const STATUS_INVALID_SERIAL_OR_MODEL: u8 = 4;
pub const STATUS_EXPIRED: u8 = 5;

// SQL states
pub const SQL_STATE_LEN: usize = 5;
pub const SQL_STATE_SUCCESS: &str = "00000";
pub const SQL_STATE_NO_ROWS_UPDATED: &str = "01504";
pub const SELECT_SUCCESS_MESSAGE: &str = "SELECT query executed well";

// Column type codes
pub const TYPE_DATE: i32 = 385;
pub const TYPE_TIME: i32 = 389;
pub const TYPE_DECIMAL: i32 = 484;
pub const TYPE_DECIMAL_NULLABLE: i32 = 485;
pub const TYPE_NUMERIC: i32 = 488;
pub const TYPE_NUMERIC_NULLABLE: i32 = 489;
pub const TYPE_BIGINT: i32 = 492;
pub const TYPE_BIGINT_NULLABLE: i32 = 493;
pub const TYPE_INTEGER: i32 = 496;
pub const TYPE_INTEGER_NULLABLE: i32 = 497;
pub const TYPE_SMALLINT: i32 = 500;
pub const TYPE_SMALLINT_NULLABLE: i32 = 501;

// Fixed field widths for binary integer columns
pub const BIGINT_WIDTH: usize = 20;
pub const INTEGER_WIDTH: usize = 10;
pub const SMALLINT_WIDTH: usize = 5;

// Largest DECIMAL/NUMERIC precision, and so scale, the server allows
pub const MAX_DECIMAL_SCALE: u32 = 63;

// OS command replies
pub const MESSAGE_DESCRIPTION_OFFSET: usize = 112;
pub const MESSAGE_PREFIX_INFO: &str = "CPI";
pub const MESSAGE_PREFIX_FAILURE: &str = "CPF";

// License side-channel
pub const DEFAULT_LICENSE_SERVER: &str = "http://localhost:8080";
pub const USAGE_EVENT_LOGIN: &str = "username";
pub const USAGE_EVENT_DATA_IN: &str = "data_in";
pub const USAGE_EVENT_DATA_OUT: &str = "data_out";
