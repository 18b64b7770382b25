//! Authentication lookup by email.
//!
//! # Responsibility
//! - Resolve a login name to a principal carrying the password hash and
//!   granted authorities.
//! - Check a raw password against that principal.

use crate::db::{DbError, TransactionManager, TxMode};
use crate::model::user::UserId;
use crate::repo::role_repo::RoleRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::security::{PasswordHashError, PasswordHasher};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authentication failure.
#[derive(Debug)]
pub enum AuthError {
    /// No user holds the given email.
    UsernameNotFound(String),
    /// The user exists but the password does not match.
    BadCredentials,
    /// The stored hash could not be checked.
    PasswordHash(PasswordHashError),
    Repo(RepoError),
}

impl AuthError {
    /// HTTP-equivalent status code for this error.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::UsernameNotFound(_) | Self::BadCredentials => 401,
            Self::PasswordHash(_) => 500,
            Self::Repo(err) => err.status_hint(),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameNotFound(message) => write!(f, "{message}"),
            Self::BadCredentials => write!(f, "Bad credentials"),
            Self::PasswordHash(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PasswordHash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for AuthError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(value: PasswordHashError) -> Self {
        Self::PasswordHash(value)
    }
}

/// Authenticated identity as seen by the security layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPrincipal {
    id: UserId,
    username: String,
    password_hash: String,
    authorities: Vec<String>,
}

impl UserPrincipal {
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Login name; always the user's email.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Granted role authorities, ordered by role id.
    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|granted| granted == authority)
    }
}

/// Loads principals from the user and role repositories.
pub struct AuthService<U, R, T, H> {
    users: U,
    roles: R,
    tx: T,
    hasher: H,
}

impl<U, R, T, H> AuthService<U, R, T, H>
where
    U: UserRepository,
    R: RoleRepository,
    T: TransactionManager,
    H: PasswordHasher,
{
    pub fn new(users: U, roles: R, tx: T, hasher: H) -> Self {
        Self {
            users,
            roles,
            tx,
            hasher,
        }
    }

    /// Resolves `email` to a principal.
    ///
    /// # Errors
    /// - `UsernameNotFound("Email not found")` when no user holds `email`.
    pub fn load_user_by_username(&self, email: &str) -> Result<UserPrincipal, AuthError> {
        self.tx.run(TxMode::ReadOnly, || {
            let Some(user) = self.users.find_by_email(email)? else {
                error!("event=auth_lookup module=service status=error reason=email_not_found email={email}");
                return Err(AuthError::UsernameNotFound("Email not found".to_string()));
            };
            info!("event=auth_lookup module=service status=ok email={email}");

            let authorities = self
                .roles
                .find_all_by_ids(&user.roles.ids())?
                .into_iter()
                .map(|role| role.authority)
                .collect();
            let id = user
                .id
                .ok_or_else(|| RepoError::InvalidData("user row without id".to_string()))?;
            Ok(UserPrincipal {
                id,
                username: user.email,
                password_hash: user.password,
                authorities,
            })
        })
    }

    /// Loads the principal for `email` and checks `raw_password` against it.
    pub fn authenticate(&self, email: &str, raw_password: &str) -> Result<UserPrincipal, AuthError> {
        let principal = self.load_user_by_username(email)?;
        if self.hasher.verify(raw_password, principal.password_hash())? {
            Ok(principal)
        } else {
            info!(
                "event=auth_verify module=service status=error reason=bad_credentials id={}",
                principal.id()
            );
            Err(AuthError::BadCredentials)
        }
    }
}
