use super::repo_tx_mysql::MySqlTx;
use crate::application_port::RelationError;
use crate::domain_port::*;
use sqlx::mysql::MySqlDatabaseError;

const ER_DUP_ENTRY: u16 = 1062;
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

pub fn downcast<'a, 't>(
    tx: &'a mut dyn StorageTx<'t>,
) -> Result<&'a mut MySqlTx<'t>, RelationError> {
    // memory transactions identify themselves; MySqlTx never does
    if tx.as_any_mut().is_some() {
        return Err(RelationError::Store(
            "transaction does not belong to the mysql store".to_string(),
        ));
    }
    // SAFETY: MySqlTxManager is the only other producer of StorageTx, and the
    // server never mixes backends.
    unsafe {
        let p = tx as *mut dyn StorageTx<'t>;
        let p = p as *mut MySqlTx<'t>;
        Ok(&mut *p)
    }
}

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return Some(mysql_err.number());
        }
    }
    None
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    mysql_error_number(err) == Some(ER_DUP_ENTRY)
}

/// Deadlock victims and lock-wait timeouts roll the transaction back.
pub fn is_tx_aborted(err: &sqlx::Error) -> bool {
    matches!(
        mysql_error_number(err),
        Some(ER_LOCK_DEADLOCK | ER_LOCK_WAIT_TIMEOUT)
    )
}

pub fn store_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> RelationError {
    move |e| {
        if is_tx_aborted(&e) {
            RelationError::TransactionAborted(format!("{context}: {e}"))
        } else {
            RelationError::Store(format!("{context}: {e}"))
        }
    }
}
