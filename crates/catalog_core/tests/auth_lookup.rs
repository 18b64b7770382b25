use catalog_core::db::fixtures::seed_demo_catalog;
use catalog_core::{
    open_db_in_memory, Argon2PasswordHasher, AuthError, AuthService, SqliteRoleRepository,
    SqliteTransactionManager, SqliteUserRepository, UserInsertDto, UserDto, UserService,
};
use rusqlite::Connection;

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    seed_demo_catalog(&conn).unwrap();
    conn
}

fn auth(
    conn: &Connection,
) -> AuthService<
    SqliteUserRepository<'_>,
    SqliteRoleRepository<'_>,
    SqliteTransactionManager<'_>,
    Argon2PasswordHasher,
> {
    AuthService::new(
        SqliteUserRepository::new(conn),
        SqliteRoleRepository::new(conn),
        SqliteTransactionManager::new(conn),
        Argon2PasswordHasher::new(),
    )
}

#[test]
fn known_email_yields_principal_with_authorities() {
    let conn = seeded();
    let principal = auth(&conn).load_user_by_username("maria@gmail.com").unwrap();

    assert_eq!(principal.id(), 2);
    assert_eq!(principal.username(), "maria@gmail.com");
    assert_eq!(principal.authorities(), ["ROLE_OPERATOR", "ROLE_ADMIN"]);
    assert!(principal.has_authority("ROLE_ADMIN"));
    assert!(!principal.password_hash().is_empty());
}

#[test]
fn unknown_email_is_username_not_found() {
    let conn = seeded();
    let err = auth(&conn)
        .load_user_by_username("nobody@gmail.com")
        .unwrap_err();
    assert!(matches!(err, AuthError::UsernameNotFound(ref message) if message == "Email not found"));
    assert_eq!(err.status_hint(), 401);
}

#[test]
fn authenticate_checks_argon2_password() {
    let conn = seeded();
    let users = UserService::new(
        SqliteUserRepository::new(&conn),
        SqliteRoleRepository::new(&conn),
        SqliteTransactionManager::new(&conn),
        Argon2PasswordHasher::new(),
    );
    users
        .insert(&UserInsertDto {
            user: UserDto {
                id: None,
                first_name: "Bob".to_string(),
                last_name: "Brown".to_string(),
                email: "bob@example.com".to_string(),
                roles: Vec::new(),
            },
            password: "123456".to_string(),
        })
        .unwrap();

    let auth = auth(&conn);
    let principal = auth.authenticate("bob@example.com", "123456").unwrap();
    assert!(principal.password_hash().starts_with("$argon2"));
    assert!(principal.authorities().is_empty());

    let err = auth.authenticate("bob@example.com", "wrong").unwrap_err();
    assert!(matches!(err, AuthError::BadCredentials));
}

#[test]
fn seeded_users_authenticate_with_demo_password() {
    let conn = seeded();
    let auth = auth(&conn);

    for email in ["alex@gmail.com", "maria@gmail.com"] {
        let principal = auth.authenticate(email, "123456").unwrap();
        assert_eq!(principal.username(), email);
        assert!(principal.password_hash().starts_with("$argon2id$"));
    }
    assert!(matches!(
        auth.authenticate("maria@gmail.com", "654321").unwrap_err(),
        AuthError::BadCredentials
    ));
}
