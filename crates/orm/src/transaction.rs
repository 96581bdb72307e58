//! Transaction pass-throughs
//!
//! Transactions run on the provider's default connection. There is no
//! nesting and nothing rolls back on its own: a caller that hits an error
//! inside a transaction must call `cancel_transaction` itself. Work against
//! another connector belongs on a provider from [`Database::scoped`].

use tracing::{debug, warn};

use crate::database::{Database, Target};
use crate::error::{OrmError, OrmResult};

impl Database {
    /// Start a transaction on the default connection
    pub async fn begin_transaction(&self) -> OrmResult<()> {
        let connection = self.connection(&Target::Default).await?;
        let mut connection = connection.lock().await;
        debug!("BEGIN");
        connection.begin().await
    }

    /// Commit the open transaction
    pub async fn valid_transaction(&self) -> OrmResult<()> {
        let connection = self.connection(&Target::Default).await?;
        let mut connection = connection.lock().await;
        debug!("COMMIT");
        connection.commit().await.map_err(|err| {
            warn!(error = %err, "commit failed, transaction left open");
            match err {
                OrmError::Transaction(_) => err,
                other => OrmError::Transaction(other.to_string()),
            }
        })
    }

    /// Roll back the open transaction
    pub async fn cancel_transaction(&self) -> OrmResult<()> {
        let connection = self.connection(&Target::Default).await?;
        let mut connection = connection.lock().await;
        debug!("ROLLBACK");
        connection.rollback().await
    }
}
