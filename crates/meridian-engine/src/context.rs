//! Caller identity threaded through every service operation.

use serde::{Deserialize, Serialize};

use crate::error::FailureResult;
use meridian_core::{CoreError, User};
use meridian_db::{SqliteConnection, UserRepository};

/// The operator on whose behalf an operation runs.
///
/// Session handling lives outside this crate; whoever authenticated the
/// operator builds an `Actor` and passes it in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> Self {
        Actor {
            user_id: user_id.into(),
        }
    }

    /// Loads the operator record. An unknown operator is NotFound.
    pub(crate) async fn resolve(&self, conn: &mut SqliteConnection) -> FailureResult<User> {
        UserRepository::get_by_id(conn, &self.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", &self.user_id).into())
    }
}
