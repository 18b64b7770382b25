//! Catalog core: products, categories, users and roles over SQLite.
//!
//! Services take their repositories, transaction manager and password
//! hasher as constructor parameters; nothing is wired implicitly.

pub mod config;
pub mod db;
pub mod dto;
pub mod logging;
pub mod model;
pub mod repo;
pub mod security;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use db::{
    open_db, open_db_in_memory, DbError, DbResult, SqliteTransactionManager, TransactionManager,
    TxMode,
};
pub use db::fixtures::seed_demo_catalog;
pub use dto::{CategoryDto, ProductDto, RoleDto, UserDto, UserInsertDto, UserUpdateDto};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::page::{Page, PageRequest, Sort, SortDirection};
pub use model::validation::{FieldMessage, ValidationError};
pub use model::EntityId;
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::product_repo::{ProductRepository, SqliteProductRepository};
pub use repo::role_repo::{RoleRepository, SqliteRoleRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{CrudRepository, RepoError, RepoResult};
pub use rusqlite::Connection;
pub use security::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use service::auth_service::{AuthError, AuthService, UserPrincipal};
pub use service::category_service::CategoryService;
pub use service::product_service::ProductService;
pub use service::user_service::{EmailUniquenessValidator, UserService};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
