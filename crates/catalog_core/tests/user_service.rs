use catalog_core::db::fixtures::seed_demo_catalog;
use catalog_core::{
    open_db_in_memory, CrudRepository, EmailUniquenessValidator, PageRequest, PasswordHashError,
    PasswordHasher, RoleDto, RoleRepository, ServiceError, Sort, SqliteRoleRepository,
    SqliteTransactionManager, SqliteUserRepository, UserDto, UserInsertDto, UserRepository,
    UserService, UserUpdateDto,
};
use rusqlite::Connection;

/// Reversible stand-in so tests can inspect what was stored.
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, raw: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain:{raw}"))
    }

    fn verify(&self, raw: &str, hash: &str) -> Result<bool, PasswordHashError> {
        Ok(hash == format!("plain:{raw}"))
    }
}

type Service<'conn> = UserService<
    SqliteUserRepository<'conn>,
    SqliteRoleRepository<'conn>,
    SqliteTransactionManager<'conn>,
    PlainHasher,
>;

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    seed_demo_catalog(&conn).unwrap();
    conn
}

fn service(conn: &Connection) -> Service<'_> {
    UserService::new(
        SqliteUserRepository::new(conn),
        SqliteRoleRepository::new(conn),
        SqliteTransactionManager::new(conn),
        PlainHasher,
    )
}

fn user_dto(email: &str, role_ids: &[i64]) -> UserDto {
    UserDto {
        id: None,
        first_name: "Bob".to_string(),
        last_name: "Brown".to_string(),
        email: email.to_string(),
        roles: role_ids.iter().copied().map(RoleDto::with_id).collect(),
    }
}

fn insert_dto(email: &str, password: &str, role_ids: &[i64]) -> UserInsertDto {
    UserInsertDto {
        user: user_dto(email, role_ids),
        password: password.to_string(),
    }
}

fn stored_password(conn: &Connection, id: i64) -> String {
    conn.query_row("SELECT password FROM users WHERE id = ?1;", [id], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn insert_hashes_password_and_resolves_roles() {
    let conn = seeded();
    let saved = service(&conn)
        .insert(&insert_dto("bob@example.com", "secret", &[2, 1]))
        .unwrap();

    assert_eq!(saved.id, Some(3));
    let authorities: Vec<&str> = saved.roles.iter().map(|r| r.authority.as_str()).collect();
    assert_eq!(authorities, ["ROLE_OPERATOR", "ROLE_ADMIN"]);
    assert_eq!(stored_password(&conn, 3), "plain:secret");
}

#[test]
fn duplicate_email_is_a_field_error_on_email() {
    let conn = seeded();
    let service = service(&conn);

    service
        .insert(&insert_dto("bob@example.com", "secret", &[1]))
        .unwrap();
    let err = service
        .insert(&insert_dto("bob@example.com", "other", &[1]))
        .unwrap_err();

    match err {
        ServiceError::FieldValidation(fields) => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].field_name, "email");
            assert_eq!(fields[0].message, "Email already exists");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn insert_reports_all_field_failures_together() {
    let conn = seeded();
    let mut dto = insert_dto("maria@gmail.com", " ", &[1]);
    dto.user.first_name = String::new();

    let err = service(&conn).insert(&dto).unwrap_err();
    let fields: Vec<&str> = err
        .field_messages()
        .iter()
        .map(|field| field.field_name.as_str())
        .collect();
    assert_eq!(fields, ["email", "password", "firstName"]);
}

#[test]
fn malformed_email_is_rejected() {
    let conn = seeded();
    let err = service(&conn)
        .insert(&insert_dto("not-an-email", "secret", &[]))
        .unwrap_err();
    assert_eq!(err.field_messages()[0].field_name, "email");
}

#[test]
fn update_keeps_own_email_and_password() {
    let conn = seeded();
    let service = service(&conn);
    let before = stored_password(&conn, 1);

    let mut dto = user_dto("alex@gmail.com", &[2]);
    dto.first_name = "Alexander".to_string();
    let updated = service
        .update(1, &UserUpdateDto { user: dto })
        .unwrap();

    assert_eq!(updated.first_name, "Alexander");
    assert_eq!(updated.email, "alex@gmail.com");
    assert_eq!(updated.roles.len(), 1);
    assert_eq!(updated.roles[0].authority, "ROLE_ADMIN");
    assert_eq!(stored_password(&conn, 1), before);
}

#[test]
fn update_to_another_users_email_is_rejected() {
    let conn = seeded();
    let err = service(&conn)
        .update(
            1,
            &UserUpdateDto {
                user: user_dto("maria@gmail.com", &[1]),
            },
        )
        .unwrap_err();
    assert!(err.field_messages().iter().any(|f| f.field_name == "email"));
}

#[test]
fn update_of_missing_user_is_not_found() {
    let conn = seeded();
    let err = service(&conn)
        .update(
            1000,
            &UserUpdateDto {
                user: user_dto("ghost@example.com", &[]),
            },
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Id not found 1000");
}

#[test]
fn dangling_role_rolls_back_the_update() {
    let conn = seeded();
    let service = service(&conn);

    let err = service
        .update(
            2,
            &UserUpdateDto {
                user: user_dto("maria.new@gmail.com", &[1, 42]),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::DanglingReference { entity: "role", id: 42 }));

    let maria = service.find_by_id(2).unwrap();
    assert_eq!(maria.email, "maria@gmail.com");
    assert_eq!(maria.roles.len(), 2);
}

#[test]
fn dangling_role_rolls_back_the_insert() {
    let conn = seeded();
    let service = service(&conn);

    let err = service
        .insert(&insert_dto("ghost@example.com", "secret", &[1, 42]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::DanglingReference { entity: "role", id: 42 }));

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 2);
    assert!(conn.is_autocommit());

    let saved = service
        .insert(&insert_dto("ghost@example.com", "secret", &[1]))
        .unwrap();
    assert_eq!(saved.id, Some(3));
}

#[test]
fn paged_users_sort_by_first_name_without_passwords() {
    let conn = seeded();
    let page = service(&conn)
        .find_all_paged(&PageRequest::sorted(0, 10, Sort::desc("firstName")))
        .unwrap();
    let names: Vec<&str> = page.content.iter().map(|u| u.first_name.as_str()).collect();
    assert_eq!(names, ["Maria", "Alex"]);

    let json = serde_json::to_string(&page).unwrap();
    assert!(!json.contains("password"));
    assert!(!json.contains("$argon2"));
}

#[test]
fn delete_user_removes_role_links() {
    let conn = seeded();
    service(&conn).delete(2).unwrap();

    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM user_role WHERE user_id = 2;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(links, 0);
    assert!(matches!(
        service(&conn).delete(2).unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[test]
fn deleting_a_granted_role_is_an_integrity_violation() {
    let conn = seeded();
    let roles = SqliteRoleRepository::new(&conn);

    let err = roles.delete_by_id(1).unwrap_err();
    assert_eq!(err.status_hint(), 409);
    assert_eq!(roles.find_all_by_ids(&[1, 2, 99]).unwrap().len(), 2);
}

#[test]
fn email_validator_allows_the_owner_only() {
    let conn = seeded();
    let users = SqliteUserRepository::new(&conn);
    let validator = EmailUniquenessValidator::new(&users);

    assert!(validator.validate("alex@gmail.com", Some(1)).unwrap().is_empty());
    assert_eq!(validator.validate("alex@gmail.com", Some(2)).unwrap().len(), 1);
    assert_eq!(validator.validate("alex@gmail.com", None).unwrap().len(), 1);
    assert!(validator.validate("new@gmail.com", None).unwrap().is_empty());
    assert_eq!(
        users.find_by_email("maria@gmail.com").unwrap().unwrap().id,
        Some(2)
    );
}
