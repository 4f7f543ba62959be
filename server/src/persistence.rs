//! SQLite write-through persistence.
//!
//! The engine mirrors every mutation into a [`PersistenceSink`]; rows flow
//! over a bounded channel to a dedicated worker thread that owns the
//! connection, so request handlers never block on disk. On startup the full
//! state is loaded back into memory.

use anyhow::Context;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use lexiloot_engine::{EngineState, StateSink};
use lexiloot_types::{
    AdCompletionEvent, GameRound, InventoryEntry, KycStatus, LedgerEntry, RedemptionRecord,
    RedemptionStatus, RewardMethod, UserAccount,
};

const PERSIST_BUFFER: usize = 1024;

enum PersistRequest {
    Account(UserAccount),
    LedgerEntry(LedgerEntry),
    Round(GameRound),
    AdEvent(AdCompletionEvent),
    Redemption(RedemptionRecord),
    Inventory(InventoryEntry),
    Flush(oneshot::Sender<()>),
}

pub struct Persistence {
    sender: mpsc::Sender<PersistRequest>,
}

impl Persistence {
    /// Opens (or creates) the database, loads the persisted state, and
    /// starts the background writer.
    pub fn load_and_start(path: &Path) -> anyhow::Result<(Self, EngineState)> {
        let conn = Connection::open(path).context("open lexiloot db")?;
        init_schema(&conn)?;
        let state = load_state(&conn)?;
        drop(conn);

        let (sender, receiver) = mpsc::channel(PERSIST_BUFFER);
        let path = path.to_path_buf();
        std::thread::spawn(move || persistence_worker(path, receiver));
        Ok((Self { sender }, state))
    }

    pub fn sink(&self) -> PersistenceSink {
        PersistenceSink {
            sender: self.sender.clone(),
        }
    }

    /// Waits until every previously enqueued write has been applied.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(PersistRequest::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }
}

/// Engine-facing side of the channel. Sends are non-blocking; when the
/// buffer is full the update is dropped with a warning rather than stalling
/// the request path (the next write of the same row restores it).
pub struct PersistenceSink {
    sender: mpsc::Sender<PersistRequest>,
}

impl PersistenceSink {
    fn send(&self, request: PersistRequest) {
        match self.sender.try_send(request) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("dropping persistence update (buffer full)");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("persistence channel closed");
            }
        }
    }
}

impl StateSink for PersistenceSink {
    fn account(&self, account: &UserAccount) {
        self.send(PersistRequest::Account(account.clone()));
    }

    fn ledger_entry(&self, entry: &LedgerEntry) {
        self.send(PersistRequest::LedgerEntry(entry.clone()));
    }

    fn round(&self, round: &GameRound) {
        self.send(PersistRequest::Round(round.clone()));
    }

    fn ad_event(&self, event: &AdCompletionEvent) {
        self.send(PersistRequest::AdEvent(event.clone()));
    }

    fn redemption(&self, record: &RedemptionRecord) {
        self.send(PersistRequest::Redemption(record.clone()));
    }

    fn inventory_entry(&self, entry: &InventoryEntry) {
        self.send(PersistRequest::Inventory(entry.clone()));
    }
}

fn persistence_worker(path: PathBuf, mut receiver: mpsc::Receiver<PersistRequest>) {
    let conn = match Connection::open(&path) {
        Ok(conn) => conn,
        Err(err) => {
            error!("failed to open persistence db: {err}");
            return;
        }
    };
    if let Err(err) = init_schema(&conn) {
        error!("failed to init persistence schema: {err:#}");
        return;
    }
    while let Some(request) = receiver.blocking_recv() {
        if let Err(err) = apply(&conn, request) {
            error!("persistence write failed: {err:#}");
        }
    }
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         CREATE TABLE IF NOT EXISTS accounts (
             user_id TEXT PRIMARY KEY,
             username TEXT NOT NULL,
             kyc_status TEXT NOT NULL,
             games_played INTEGER NOT NULL,
             wins INTEGER NOT NULL,
             fraud_flags TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS ledger_entries (
             id TEXT PRIMARY KEY,
             user_id TEXT NOT NULL,
             delta INTEGER NOT NULL,
             reason TEXT NOT NULL,
             created_at_ms INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS ledger_entries_user ON ledger_entries(user_id);
         CREATE TABLE IF NOT EXISTS rounds (
             round_id TEXT PRIMARY KEY,
             round_json TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS ad_events (
             event_id TEXT PRIMARY KEY,
             ad_unit_id TEXT NOT NULL,
             user_id TEXT NOT NULL,
             day_id TEXT NOT NULL,
             verified INTEGER NOT NULL,
             timestamp_ms INTEGER NOT NULL
         );
         CREATE TABLE IF NOT EXISTS redemptions (
             id TEXT PRIMARY KEY,
             user_id TEXT NOT NULL,
             method TEXT NOT NULL,
             coins_spent INTEGER NOT NULL,
             value_usd INTEGER NOT NULL,
             status TEXT NOT NULL,
             gift_card_code TEXT,
             created_at_ms INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS redemptions_user ON redemptions(user_id);
         CREATE TABLE IF NOT EXISTS inventory (
             id TEXT PRIMARY KEY,
             method TEXT NOT NULL,
             value_usd INTEGER NOT NULL,
             code TEXT NOT NULL,
             used INTEGER NOT NULL
         );",
    )
    .context("init lexiloot persistence schema")?;
    Ok(())
}

fn apply(conn: &Connection, request: PersistRequest) -> anyhow::Result<()> {
    match request {
        PersistRequest::Account(account) => {
            let fraud_flags = serde_json::to_string(&account.fraud_flags)?;
            conn.execute(
                "INSERT OR REPLACE INTO accounts
                 (user_id, username, kyc_status, games_played, wins, fraud_flags)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    account.user_id,
                    account.username,
                    account.kyc_status.as_str(),
                    account.games_played,
                    account.wins,
                    fraud_flags,
                ],
            )?;
        }
        PersistRequest::LedgerEntry(entry) => {
            // Entries are immutable facts; replays are ignored, never updated.
            conn.execute(
                "INSERT OR IGNORE INTO ledger_entries
                 (id, user_id, delta, reason, created_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id,
                    entry.user_id,
                    entry.delta,
                    entry.reason,
                    entry.created_at_ms,
                ],
            )?;
        }
        PersistRequest::Round(round) => {
            let round_json = serde_json::to_string(&round)?;
            conn.execute(
                "INSERT OR REPLACE INTO rounds (round_id, round_json) VALUES (?1, ?2)",
                params![round.round_id, round_json],
            )?;
        }
        PersistRequest::AdEvent(event) => {
            conn.execute(
                "INSERT OR IGNORE INTO ad_events
                 (event_id, ad_unit_id, user_id, day_id, verified, timestamp_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.event_id,
                    event.ad_unit_id,
                    event.user_id,
                    event.day_id,
                    event.verified,
                    event.timestamp_ms,
                ],
            )?;
        }
        PersistRequest::Redemption(record) => {
            conn.execute(
                "INSERT OR REPLACE INTO redemptions
                 (id, user_id, method, coins_spent, value_usd, status, gift_card_code, created_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.user_id,
                    record.method.as_str(),
                    record.coins_spent,
                    record.value_usd,
                    record.status.as_str(),
                    record.gift_card_code,
                    record.created_at_ms,
                ],
            )?;
        }
        PersistRequest::Inventory(entry) => {
            conn.execute(
                "INSERT OR REPLACE INTO inventory (id, method, value_usd, code, used)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id,
                    entry.method.as_str(),
                    entry.value_usd,
                    entry.code,
                    entry.used,
                ],
            )?;
        }
        PersistRequest::Flush(ack) => {
            let _ = ack.send(());
        }
    }
    Ok(())
}

fn load_state(conn: &Connection) -> anyhow::Result<EngineState> {
    let mut state = EngineState::default();

    let mut stmt = conn.prepare(
        "SELECT user_id, username, kyc_status, games_played, wins, fraud_flags FROM accounts",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, u64>(3)?,
            row.get::<_, u64>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;
    for row in rows {
        let (user_id, username, kyc_status, games_played, wins, fraud_flags) = row?;
        let account = UserAccount {
            user_id: user_id.clone(),
            username,
            kyc_status: KycStatus::from_str(&kyc_status)?,
            games_played,
            wins,
            fraud_flags: serde_json::from_str(&fraud_flags).context("decode fraud flags")?,
        };
        state.accounts.insert(user_id, account);
    }

    let mut stmt = conn.prepare(
        "SELECT id, user_id, delta, reason, created_at_ms FROM ledger_entries ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(LedgerEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            delta: row.get(2)?,
            reason: row.get(3)?,
            created_at_ms: row.get(4)?,
        })
    })?;
    for entry in rows {
        state.ledger.push(entry?);
    }

    let mut stmt = conn.prepare("SELECT round_json FROM rounds")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    for round_json in rows {
        let round: GameRound =
            serde_json::from_str(&round_json?).context("decode persisted round")?;
        state.rounds.insert(round.round_id.clone(), round);
    }

    let mut stmt = conn.prepare(
        "SELECT event_id, ad_unit_id, user_id, day_id, verified, timestamp_ms FROM ad_events",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(AdCompletionEvent {
            event_id: row.get(0)?,
            ad_unit_id: row.get(1)?,
            user_id: row.get(2)?,
            day_id: row.get(3)?,
            verified: row.get(4)?,
            timestamp_ms: row.get(5)?,
        })
    })?;
    for event in rows {
        let event = event?;
        state.ad_events.insert(event.event_id.clone(), event);
    }

    let mut stmt = conn.prepare(
        "SELECT id, user_id, method, coins_spent, value_usd, status, gift_card_code, created_at_ms
         FROM redemptions ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, u32>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, u64>(7)?,
        ))
    })?;
    for row in rows {
        let (id, user_id, method, coins_spent, value_usd, status, gift_card_code, created_at_ms) =
            row?;
        state.redemptions.push(RedemptionRecord {
            id,
            user_id,
            method: RewardMethod::from_str(&method)?,
            coins_spent,
            value_usd,
            status: RedemptionStatus::from_str(&status)?,
            gift_card_code,
            created_at_ms,
        });
    }

    let mut stmt =
        conn.prepare("SELECT id, method, value_usd, code, used FROM inventory ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, bool>(4)?,
        ))
    })?;
    for row in rows {
        let (id, method, value_usd, code, used) = row?;
        state.inventory.push(InventoryEntry {
            id,
            method: RewardMethod::from_str(&method)?,
            value_usd,
            code,
            used,
        });
    }

    Ok(state)
}
