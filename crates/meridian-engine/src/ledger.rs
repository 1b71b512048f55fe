//! # Cash Register Ledger
//!
//! Opens and closes registers and appends their ledger entries.
//!
//! ## Register Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open(draft, actor)                                                    │
//! │   ├── opening balance < 0                 → Validation                 │
//! │   ├── drawer/safe already open            → StateConflict              │
//! │   │   (up front, and again by idx_cash_registers_one_open)             │
//! │   ├── INSERT cash_registers (running total 0)                          │
//! │   └── balance > 0 → append OpeningBalance / Entry                      │
//! │                                                                         │
//! │  append_entry(conn, posting)        only while open                    │
//! │   ├── running_total += signed amount  (WHERE closed_at IS NULL)        │
//! │   └── INSERT ledger_entries                                            │
//! │                                                                         │
//! │  close(id, password, actor)                                            │
//! │   ├── blank password → Validation                                      │
//! │   ├── wrong password / unknown actor → Auth                            │
//! │   ├── unknown register → NotFound                                      │
//! │   ├── already closed → StateConflict                                   │
//! │   └── closed_at = now, closing balance = running total (frozen)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Open-register uniqueness is global per kind: one open drawer and one
//! open safe across all operators. Bank registers are unrestricted.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::collaborators::{Argon2Verifier, PasswordVerifier};
use crate::context::Actor;
use crate::error::{Failure, FailureResult, ServiceResult};
use meridian_core::validation::{
    normalize_digits, validate_opening_balance, validate_password, validate_text,
};
use meridian_core::{
    CashRegister, CoreError, Direction, LedgerEntry, LedgerEntryKind, Money, RegisterKind,
};
use meridian_db::{
    commit, Database, LedgerRepository, RegisterRepository, SqliteConnection, UserRepository,
};

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// What the caller supplies to open a register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDraft {
    pub kind: RegisterKind,
    /// Blank falls back to the kind's default description.
    pub description: Option<String>,
    pub opening_balance: Money,
    /// Bank only. Reduced to digits.
    pub agency: Option<String>,
    /// Bank only. Reduced to digits.
    pub account: Option<String>,
}

impl RegisterDraft {
    pub fn new(kind: RegisterKind, opening_balance: Money) -> Self {
        RegisterDraft {
            kind,
            description: None,
            opening_balance,
            agency: None,
            account: None,
        }
    }
}

/// Result of a successful close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedRegister {
    pub register_id: String,
    pub kind: RegisterKind,
    pub closing_balance: Money,
    pub closed_at: DateTime<Utc>,
}

/// One ledger line to append. `amount` is a magnitude; the direction signs it.
#[derive(Debug, Clone)]
pub(crate) struct Posting<'a> {
    pub register_id: &'a str,
    pub description: &'a str,
    pub amount: Money,
    pub direction: Direction,
    pub kind: LedgerEntryKind,
    pub user_id: &'a str,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone)]
pub struct CashRegisterLedger {
    db: Database,
    verifier: Arc<dyn PasswordVerifier>,
}

impl CashRegisterLedger {
    pub fn new(db: Database, verifier: Arc<dyn PasswordVerifier>) -> Self {
        CashRegisterLedger { db, verifier }
    }

    /// Ledger that verifies argon2 password hashes.
    pub fn with_argon2(db: Database) -> Self {
        Self::new(db, Arc::new(Argon2Verifier))
    }

    /// Opens a register and returns its id.
    pub async fn open(&self, draft: RegisterDraft, actor: &Actor) -> ServiceResult<String> {
        let kind = draft.kind;
        self.try_open(draft, actor)
            .await
            .map_err(|f| f.at_boundary("open_register", kind.as_str()))
    }

    async fn try_open(&self, draft: RegisterDraft, actor: &Actor) -> FailureResult<String> {
        let profile = draft.kind.profile();

        validate_opening_balance(draft.opening_balance)?;
        let description = validate_text("description", draft.description.as_deref())?
            .unwrap_or_else(|| profile.default_description.to_string());

        let (agency, account) = match draft.kind {
            RegisterKind::Bank => (
                normalize_digits(draft.agency.as_deref()),
                normalize_digits(draft.account.as_deref()),
            ),
            RegisterKind::Drawer | RegisterKind::Safe => (None, None),
        };

        let mut tx = self.db.begin().await?;
        actor.resolve(&mut tx).await?;

        if profile.unique_while_open && RegisterRepository::exists_open(&mut tx, draft.kind).await? {
            return Err(CoreError::RegisterAlreadyOpen { kind: draft.kind }.into());
        }

        let now = Utc::now();
        let register = CashRegister {
            id: Uuid::new_v4().to_string(),
            kind: draft.kind,
            description,
            opening_balance_cents: draft.opening_balance.cents(),
            running_total_cents: 0,
            closing_balance_cents: None,
            opened_by: actor.user_id.clone(),
            opened_on: now.date_naive(),
            agency,
            account,
            opened_at: now,
            closed_at: None,
        };
        RegisterRepository::insert(&mut tx, &register).await?;

        if draft.opening_balance.is_positive() {
            append_entry(
                &mut tx,
                &Posting {
                    register_id: &register.id,
                    description: profile.opening_reason,
                    amount: draft.opening_balance,
                    direction: Direction::Entry,
                    kind: LedgerEntryKind::OpeningBalance,
                    user_id: &actor.user_id,
                },
            )
            .await?;
        }

        commit(tx).await?;

        info!(
            register_id = %register.id,
            kind = %register.kind,
            opening_balance = %draft.opening_balance,
            user_id = %actor.user_id,
            "Register opened"
        );

        Ok(register.id)
    }

    /// Closes a register after re-checking the operator's password.
    pub async fn close(
        &self,
        register_id: &str,
        password: &str,
        actor: &Actor,
    ) -> ServiceResult<ClosedRegister> {
        self.try_close(register_id, password, actor)
            .await
            .map_err(|f| f.at_boundary("close_register", register_id))
    }

    async fn try_close(
        &self,
        register_id: &str,
        password: &str,
        actor: &Actor,
    ) -> FailureResult<ClosedRegister> {
        validate_password(password).map_err(|_| CoreError::PasswordRequired)?;

        let mut tx = self.db.begin().await?;

        let user = UserRepository::get_by_id(&mut tx, &actor.user_id)
            .await?
            .ok_or(CoreError::IncorrectPassword)?;
        if !self.verifier.verify(password, &user.password_hash) {
            return Err(CoreError::IncorrectPassword.into());
        }

        let register = RegisterRepository::get_by_id(&mut tx, register_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Register", register_id))?;
        if !register.is_open() {
            return Err(register_closed(register_id));
        }

        let closed_at = Utc::now();
        if !RegisterRepository::close(&mut tx, register_id, closed_at).await? {
            return Err(register_closed(register_id));
        }

        let closed = RegisterRepository::get_by_id(&mut tx, register_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Register", register_id))?;

        commit(tx).await?;

        let closing_balance = closed.closing_balance().unwrap_or_else(|| closed.running_total());
        info!(
            register_id = %register_id,
            closing_balance = %closing_balance,
            user_id = %actor.user_id,
            "Register closed"
        );

        Ok(ClosedRegister {
            register_id: closed.id,
            kind: closed.kind,
            closing_balance,
            closed_at,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get(&self, register_id: &str) -> ServiceResult<CashRegister> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(RegisterRepository::get_by_id(&mut conn, register_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Register", register_id))?)
        }
        .await
        .map_err(|f| f.at_boundary("get_register", register_id))
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<CashRegister>> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(RegisterRepository::list_all(&mut conn).await?)
        }
        .await
        .map_err(|f| f.at_boundary("list_registers", "*"))
    }

    pub async fn list_open(&self) -> ServiceResult<Vec<CashRegister>> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(RegisterRepository::list_open(&mut conn).await?)
        }
        .await
        .map_err(|f| f.at_boundary("list_open_registers", "*"))
    }

    pub async fn list_open_by_kind(&self, kind: RegisterKind) -> ServiceResult<Vec<CashRegister>> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(RegisterRepository::list_open_by_kind(&mut conn, kind).await?)
        }
        .await
        .map_err(|f| f.at_boundary("list_open_registers", kind.as_str()))
    }

    /// Registers opened on a business date, open or closed.
    pub async fn list_opened_on(&self, date: NaiveDate) -> ServiceResult<Vec<CashRegister>> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(RegisterRepository::list_opened_on(&mut conn, date).await?)
        }
        .await
        .map_err(|f| f.at_boundary("list_registers_opened_on", "*"))
    }

    /// The most recent register the actor opened that is still open.
    pub async fn open_register_of(&self, actor: &Actor) -> ServiceResult<Option<CashRegister>> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(RegisterRepository::find_open_by_user(&mut conn, &actor.user_id).await?)
        }
        .await
        .map_err(|f| f.at_boundary("open_register_of", &actor.user_id))
    }

    /// True while the drawer that receives cash sales is open.
    pub async fn drawer_is_open(&self) -> ServiceResult<bool> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(RegisterRepository::exists_open(&mut conn, RegisterKind::Drawer).await?)
        }
        .await
        .map_err(|f| f.at_boundary("drawer_is_open", "drawer"))
    }

    /// Ledger entries of a register in append order.
    pub async fn entries(&self, register_id: &str) -> ServiceResult<Vec<LedgerEntry>> {
        async {
            let mut conn = self.db.acquire().await?;
            if RegisterRepository::get_by_id(&mut conn, register_id).await?.is_none() {
                return Err(Failure::from(CoreError::not_found("Register", register_id)));
            }
            Ok::<_, Failure>(LedgerRepository::list_by_register(&mut conn, register_id).await?)
        }
        .await
        .map_err(|f| f.at_boundary("ledger_entries", register_id))
    }
}

// =============================================================================
// Crate-internal Operations
// =============================================================================

/// Appends one entry and moves the register's running total.
///
/// Runs on the caller's connection so it joins the caller's transaction.
/// A missing register is NotFound; a closed one is StateConflict.
pub(crate) async fn append_entry(
    conn: &mut SqliteConnection,
    posting: &Posting<'_>,
) -> FailureResult<LedgerEntry> {
    let signed = posting.direction.signed(posting.amount);

    if !RegisterRepository::apply_to_running_total(conn, posting.register_id, signed.cents()).await?
    {
        return match RegisterRepository::get_by_id(conn, posting.register_id).await? {
            Some(_) => Err(register_closed(posting.register_id)),
            None => Err(CoreError::not_found("Register", posting.register_id).into()),
        };
    }

    let entry = LedgerEntry {
        id: Uuid::new_v4().to_string(),
        register_id: posting.register_id.to_string(),
        description: posting.description.to_string(),
        amount_cents: signed.cents(),
        direction: posting.direction,
        kind: posting.kind,
        user_id: posting.user_id.to_string(),
        created_at: Utc::now(),
    };
    LedgerRepository::insert(conn, &entry).await?;

    debug!(register_id = %entry.register_id, amount = %signed, kind = ?entry.kind, "Ledger entry appended");

    Ok(entry)
}

/// The open drawer that receives cash sales, if any.
pub(crate) async fn open_drawer(conn: &mut SqliteConnection) -> FailureResult<Option<CashRegister>> {
    Ok(RegisterRepository::list_open_by_kind(conn, RegisterKind::Drawer)
        .await?
        .into_iter()
        .next())
}

fn register_closed(register_id: &str) -> Failure {
    CoreError::RegisterClosed {
        register_id: register_id.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::ErrorKind;
    use meridian_db::DbConfig;

    struct AcceptAll;

    impl PasswordVerifier for AcceptAll {
        fn verify(&self, _plain: &str, _hash: &str) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_append_entry_on_closed_register_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = {
            let mut conn = db.acquire().await.unwrap();
            UserRepository::insert(&mut conn, "ana", "unused-hash").await.unwrap()
        };
        let actor = Actor::new(user.id.clone());
        let ledger = CashRegisterLedger::new(db.clone(), Arc::new(AcceptAll));

        let register_id = ledger
            .open(
                RegisterDraft::new(RegisterKind::Drawer, Money::from_cents(1000)),
                &actor,
            )
            .await
            .unwrap();
        let closed = ledger.close(&register_id, "secret", &actor).await.unwrap();
        assert_eq!(closed.closing_balance, Money::from_cents(1000));

        let failure = {
            let mut conn = db.acquire().await.unwrap();
            let posting = Posting {
                register_id: &register_id,
                description: "Cash sale receipt",
                amount: Money::from_cents(500),
                direction: Direction::Entry,
                kind: LedgerEntryKind::Receipt,
                user_id: &user.id,
            };
            append_entry(&mut conn, &posting).await.unwrap_err()
        };

        assert!(matches!(
            &failure,
            Failure::Core(CoreError::RegisterClosed { register_id: id }) if id == &register_id
        ));
        assert_eq!(
            failure.at_boundary("append_entry", &register_id).kind,
            ErrorKind::StateConflict
        );

        let register = ledger.get(&register_id).await.unwrap();
        assert_eq!(register.running_total(), Money::from_cents(1000));
        assert_eq!(register.closing_balance(), Some(Money::from_cents(1000)));

        let mut conn = db.acquire().await.unwrap();
        let entries = LedgerRepository::list_by_register(&mut conn, &register_id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LedgerEntryKind::OpeningBalance);
    }
}
