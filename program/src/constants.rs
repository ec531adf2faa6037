use rust_decimal::Decimal;

/// Id prefixes for generated identifiers
pub mod prefixes {
    /// Prefix for action ids
    pub const ACTION: &str = "action";
    /// Prefix for snapshot ids
    pub const SNAPSHOT: &str = "snap";
    /// Prefix for payout ids
    pub const PAYOUT: &str = "payout";
}

/// Environment keys read by [`crate::config::EngineConfig::from_env`]
pub mod env {
    /// Ledger node endpoint
    pub const RPC_URL: &str = "XRPL_RPC_URL";
    /// Funding account payouts and announcements originate from
    pub const PLATFORM_ACCOUNT: &str = "XRPL_PLATFORM_ACCOUNT";
    /// Account receiving announcement memos
    pub const ANNOUNCE_DEST: &str = "XRPL_ANNOUNCE_DEST";
    /// Upper bound of concurrent gateway calls per payout run
    pub const MAX_IN_FLIGHT: &str = "PAYOUT_MAX_IN_FLIGHT";
    /// Per-call gateway timeout in seconds
    pub const SUBMIT_TIMEOUT_SECS: &str = "PAYOUT_SUBMIT_TIMEOUT_SECS";
}

/// Public testnet websocket endpoint
pub const DEFAULT_RPC_URL: &str = "wss://s.altnet.rippletest.net:51233";

/// Default number of gateway calls in flight during a payout run
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Default per-call gateway timeout in seconds
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;

/// Balance assigned to the configured demo holder when a snapshot is requested without holders
pub const DEMO_HOLDER_BALANCE: Decimal = Decimal::ONE_HUNDRED;

/// Decimal places kept for entitlements and payout amounts
pub const AMOUNT_SCALE: u32 = 6;

/// Drops per XRP
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Amount carried by an announcement memo transaction: one drop
pub const ANNOUNCEMENT_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Memo reason attached to dividend payments
pub const DIVIDEND_REASON: &str = "dividend";

/// `MemoType` plain value
pub const MEMO_TYPE: &str = "application/json";

/// `MemoFormat` plain value
pub const MEMO_FORMAT: &str = "text/plain";

/// Ledger engine result of a successful transaction
pub const ENGINE_SUCCESS: &str = "tesSUCCESS";

/// Version byte of a classic account address
pub const ACCOUNT_ID_VERSION: u8 = 0;

/// Account id length in bytes (without version byte)
pub const ACCOUNT_ID_LEN: usize = 20;
