//! Warning reporting with optional escalation.
//!
//! Non-fatal conditions (an unrecognized file extension falling back to a
//! generic reader, for instance) are logged by default. Under the
//! warning-escalation flag they are promoted to fatal source/sink errors
//! instead, so strict runs never proceed on a guess.

use crate::rowql::sql::error::{SqlError, SqlResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct WarningPolicy {
    escalate: bool,
}

impl WarningPolicy {
    pub fn new(escalate: bool) -> Self {
        WarningPolicy { escalate }
    }

    /// Reports a warning tied to a path. Logs and continues, unless
    /// escalation promotes it to an error.
    pub fn warn(&self, path: &str, message: &str) -> SqlResult<()> {
        if self.escalate {
            Err(SqlError::source_sink(
                path,
                format!("{} (warning escalated to error)", message),
            ))
        } else {
            log::warn!("{}: {}", path, message);
            Ok(())
        }
    }
}
