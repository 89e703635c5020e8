use super::events::AccountEvent;
use super::value_objects::Email;
use crate::domain::policy::Actor;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Consecutive failed logins after which an account is deactivated
pub const MAX_LOGIN_ATTEMPTS: i32 = 3;

/// Why a login attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRejection {
    /// The account is deactivated and needs an administrator
    Disabled,
    /// Wrong password; the account is still active
    InvalidPassword,
    /// Wrong password, and this attempt exhausted the allowance
    LockedOut,
}

impl LoginRejection {
    pub fn message(&self) -> &'static str {
        match self {
            LoginRejection::Disabled => "Account is disabled. Contact admin.",
            LoginRejection::InvalidPassword => "Invalid credentials",
            LoginRejection::LockedOut => "Number of login attempts exceeded. Contact admin.",
        }
    }
}

/// Account aggregate: the authenticated identity that owns a team
///
/// Holds the login-lockout bookkeeping. Successful logins return
/// `AccountEvent`s which the caller hands to interested services.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub login_attempt_count: i32,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new, active, non-admin account
    pub fn register(
        email: Email,
        first_name: String,
        last_name: String,
        password_hash: String,
    ) -> Result<Self, String> {
        if first_name.trim().is_empty() {
            return Err("Users must have a first name".to_string());
        }
        if last_name.trim().is_empty() {
            return Err("Users must have a last name".to_string());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            email,
            first_name,
            last_name,
            password_hash,
            is_active: true,
            is_admin: false,
            login_attempt_count: 0,
            last_login: None,
            created_at: Utc::now(),
        })
    }

    /// Refuses the login up front when the account is disabled
    pub fn ensure_active(&self) -> Result<(), LoginRejection> {
        if self.is_active {
            Ok(())
        } else {
            Err(LoginRejection::Disabled)
        }
    }

    /// Counts a failed password check, deactivating the account once the
    /// allowance is used up
    pub fn record_failed_login(&mut self) -> LoginRejection {
        self.login_attempt_count += 1;
        if self.login_attempt_count >= MAX_LOGIN_ATTEMPTS {
            self.is_active = false;
            self.login_attempt_count = 0;
            LoginRejection::LockedOut
        } else {
            LoginRejection::InvalidPassword
        }
    }

    /// Resets the failure counter and stamps the login time
    pub fn record_successful_login(&mut self) -> Vec<AccountEvent> {
        let first_login = self.last_login.is_none();
        self.login_attempt_count = 0;
        self.last_login = Some(Utc::now());

        vec![AccountEvent::LoggedIn {
            account_id: self.id,
            first_name: self.first_name.clone(),
            first_login,
        }]
    }

    pub fn actor(&self) -> Actor {
        Actor {
            account_id: self.id,
            is_admin: self.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::register(
            Email::new("coach@soccer.com").unwrap(),
            "John".to_string(),
            "Verified".to_string(),
            "hash".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn register_requires_names() {
        let result = Account::register(
            Email::new("a@b.c").unwrap(),
            "".to_string(),
            "Last".to_string(),
            "hash".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_account_is_active_regular_user() {
        let account = account();
        assert!(account.is_active);
        assert!(!account.is_admin);
        assert!(account.ensure_active().is_ok());
    }

    #[test]
    fn failed_logins_lock_account_at_limit() {
        let mut account = account();

        for _ in 0..MAX_LOGIN_ATTEMPTS - 1 {
            assert_eq!(account.record_failed_login(), LoginRejection::InvalidPassword);
            assert!(account.is_active);
        }

        assert_eq!(account.record_failed_login(), LoginRejection::LockedOut);
        assert!(!account.is_active);
        assert_eq!(account.login_attempt_count, 0);
        assert_eq!(account.ensure_active(), Err(LoginRejection::Disabled));
    }

    #[test]
    fn successful_login_resets_counter() {
        let mut account = account();
        account.record_failed_login();

        account.record_successful_login();

        assert_eq!(account.login_attempt_count, 0);
        assert!(account.last_login.is_some());
    }

    #[test]
    fn only_first_login_is_flagged() {
        let mut account = account();

        let first = account.record_successful_login();
        let second = account.record_successful_login();

        assert!(matches!(first[0], AccountEvent::LoggedIn { first_login: true, .. }));
        assert!(matches!(second[0], AccountEvent::LoggedIn { first_login: false, .. }));
    }

    #[test]
    fn actor_reflects_admin_flag() {
        let mut account = account();
        account.is_admin = true;

        let actor = account.actor();
        assert_eq!(actor.account_id, account.id);
        assert!(actor.is_admin);
    }
}
