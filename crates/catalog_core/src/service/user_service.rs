//! User use cases, including email uniqueness and password hashing.
//!
//! # Responsibility
//! - Create users with a hashed password and a full role set.
//! - Update user fields and roles without touching the stored password.
//!
//! # Invariants
//! - Field failures found before a write are reported together in one
//!   `FieldValidation` error; nothing is written.
//! - The raw password is hashed before it reaches the repository and is
//!   never logged.

use crate::db::{TransactionManager, TxMode};
use crate::dto::{UserDto, UserInsertDto, UserUpdateDto};
use crate::model::page::{Page, PageRequest};
use crate::model::user::{User, UserId};
use crate::model::validation::{FieldMessage, ValidationError};
use crate::repo::role_repo::RoleRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use crate::security::PasswordHasher;
use crate::service::relations::{declared_ids, sync_relations};
use crate::service::{
    entity_not_found, resolve_handle, translate_delete, translate_update, ServiceResult,
};
use log::info;

/// Rejects an email already held by another user.
pub struct EmailUniquenessValidator<'repo, U> {
    users: &'repo U,
}

impl<'repo, U: UserRepository> EmailUniquenessValidator<'repo, U> {
    pub fn new(users: &'repo U) -> Self {
        Self { users }
    }

    /// Returns the field failures for `email`.
    ///
    /// `own_id` is the user being updated; it may keep its current email.
    pub fn validate(&self, email: &str, own_id: Option<UserId>) -> RepoResult<Vec<FieldMessage>> {
        let mut fields = Vec::new();
        if let Some(existing) = self.users.find_by_email(email)? {
            if own_id.is_none() || existing.id != own_id {
                fields.push(FieldMessage::new("email", "Email already exists"));
            }
        }
        Ok(fields)
    }
}

/// User CRUD with role relation sync.
pub struct UserService<U, R, T, H> {
    users: U,
    roles: R,
    tx: T,
    hasher: H,
}

impl<U, R, T, H> UserService<U, R, T, H>
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

    pub fn find_all_paged(&self, request: &PageRequest) -> ServiceResult<Page<UserDto>> {
        self.tx.run(TxMode::ReadOnly, || {
            self.users
                .find_page(request)?
                .try_map(|user| self.to_dto(&user))
        })
    }

    pub fn find_by_id(&self, id: UserId) -> ServiceResult<UserDto> {
        self.tx.run(TxMode::ReadOnly, || {
            let user = self.users.find_by_id(id)?.ok_or_else(entity_not_found)?;
            self.to_dto(&user)
        })
    }

    pub fn insert(&self, dto: &UserInsertDto) -> ServiceResult<UserDto> {
        self.tx.run(TxMode::ReadWrite, || {
            let mut errors = ValidationError::new();
            errors
                .fields
                .extend(EmailUniquenessValidator::new(&self.users).validate(&dto.user.email, None)?);
            if dto.password.trim().is_empty() {
                errors.push("password", "Password is required");
            }

            let mut user = User::default();
            errors.merge(self.copy_dto_to_entity(&dto.user, &mut user));
            errors.merge(user.validate());
            errors.into_result()?;

            user.password = self.hasher.hash(&dto.password)?;
            let saved = self.users.save(&user)?;
            info!(
                "event=user_insert module=service status=ok id={} roles={}",
                saved.id.unwrap_or_default(),
                saved.roles.len()
            );
            self.to_dto(&saved)
        })
    }

    /// Updates names, email and roles; the stored password is kept.
    pub fn update(&self, id: UserId, dto: &UserUpdateDto) -> ServiceResult<UserDto> {
        self.tx.run(TxMode::ReadWrite, || {
            let reference = resolve_handle(self.users.get_reference(id), id)?;

            let mut errors = ValidationError::new();
            errors.fields.extend(
                EmailUniquenessValidator::new(&self.users).validate(&dto.user.email, Some(id))?,
            );
            let mut user = User::attached(reference);
            errors.merge(self.copy_dto_to_entity(&dto.user, &mut user));
            errors.merge(user.validate());
            errors.into_result()?;

            let saved = translate_update(self.users.save(&user), id)?;
            info!(
                "event=user_update module=service status=ok id={id} roles={}",
                saved.roles.len()
            );
            self.to_dto(&saved)
        })
    }

    /// Deletes one user together with its role links.
    pub fn delete(&self, id: UserId) -> ServiceResult<()> {
        let outcome = translate_delete(self.users.delete_by_id(id), id);
        match &outcome {
            Ok(()) => info!("event=user_delete module=service status=ok id={id}"),
            Err(err) => info!(
                "event=user_delete module=service status=error id={id} status_hint={}",
                err.status_hint()
            ),
        }
        outcome
    }

    fn copy_dto_to_entity(&self, dto: &UserDto, user: &mut User) -> Result<(), ValidationError> {
        user.first_name = dto.first_name.clone();
        user.last_name = dto.last_name.clone();
        user.email = dto.email.clone();

        let ids = declared_ids("roles", dto.roles.iter().map(|role| role.id))?;
        sync_relations(&mut user.roles, &self.roles, &ids);
        Ok(())
    }

    fn to_dto(&self, user: &User) -> ServiceResult<UserDto> {
        let roles = self.roles.find_all_by_ids(&user.roles.ids())?;
        Ok(UserDto::from_entity(user, &roles))
    }
}
