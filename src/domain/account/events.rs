use uuid::Uuid;

/// Events emitted by the Account aggregate
///
/// The login handler forwards these to `TeamProvisioning` explicitly;
/// there is no subscriber registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    /// Fired after every successful password check
    LoggedIn {
        account_id: Uuid,
        first_name: String,
        /// True when the account had never logged in before
        first_login: bool,
    },
}

impl AccountEvent {
    pub fn account_id(&self) -> Uuid {
        match self {
            AccountEvent::LoggedIn { account_id, .. } => *account_id,
        }
    }
}
