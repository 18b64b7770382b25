use catalog_core::db::fixtures::seed_demo_catalog;
use catalog_core::{
    open_db_in_memory, CategoryDto, CategoryService, CrudRepository, PageRequest, ServiceError,
    Sort, SqliteCategoryRepository, SqliteTransactionManager,
};
use rusqlite::Connection;

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    seed_demo_catalog(&conn).unwrap();
    conn
}

fn service(
    conn: &Connection,
) -> CategoryService<SqliteCategoryRepository<'_>, SqliteTransactionManager<'_>> {
    CategoryService::new(
        SqliteCategoryRepository::new(conn),
        SqliteTransactionManager::new(conn),
    )
}

fn named(name: &str) -> CategoryDto {
    CategoryDto {
        id: None,
        name: name.to_string(),
    }
}

#[test]
fn find_all_lists_categories_by_id() {
    let conn = seeded();
    let names: Vec<String> = service(&conn)
        .find_all()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, ["Livros", "Eletrônicos", "Computadores"]);
}

#[test]
fn find_all_on_empty_store_is_empty() {
    let conn = open_db_in_memory().unwrap();
    assert!(service(&conn).find_all().unwrap().is_empty());
}

#[test]
fn paged_listing_sorts_descending() {
    let conn = seeded();
    let page = service(&conn)
        .find_all_paged(&PageRequest::sorted(0, 2, Sort::desc("name")))
        .unwrap();
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
    let names: Vec<&str> = page.content.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Livros", "Eletrônicos"]);
}

#[test]
fn insert_then_find_by_id() {
    let conn = seeded();
    let service = service(&conn);

    let saved = service.insert(&named("Games")).unwrap();
    assert_eq!(saved.id, Some(4));
    assert_eq!(service.find_by_id(4).unwrap(), saved);

    let stored = SqliteCategoryRepository::new(&conn)
        .find_by_id(4)
        .unwrap()
        .unwrap();
    assert!(stored.created_at.is_some());
    assert!(stored.updated_at.is_none());
}

#[test]
fn insert_rejects_blank_name() {
    let conn = seeded();
    let err = service(&conn).insert(&named("   ")).unwrap_err();
    assert!(matches!(err, ServiceError::FieldValidation(ref fields) if fields[0].field_name == "name"));
}

#[test]
fn update_renames_and_stamps_update_time() {
    let conn = seeded();
    let service = service(&conn);

    let updated = service.update(1, &named("Books")).unwrap();
    assert_eq!(updated.name, "Books");

    let stored = SqliteCategoryRepository::new(&conn)
        .find_by_id(1)
        .unwrap()
        .unwrap();
    assert!(stored.updated_at.is_some());
    assert_eq!(stored.created_at, Some(1_594_673_407_000));
}

#[test]
fn update_and_find_of_missing_category_are_not_found() {
    let conn = seeded();
    let service = service(&conn);

    let err = service.update(1000, &named("Ghost")).unwrap_err();
    assert_eq!(err.to_string(), "Id not found 1000");
    let err = service.find_by_id(1000).unwrap_err();
    assert_eq!(err.to_string(), "Entity not found");
}

#[test]
fn delete_of_unreferenced_category_succeeds() {
    let conn = seeded();
    let service = service(&conn);

    let saved = service.insert(&named("Games")).unwrap();
    let id = saved.id.unwrap();
    service.delete(id).unwrap();
    assert!(matches!(service.delete(id).unwrap_err(), ServiceError::NotFound(_)));
}

#[test]
fn delete_of_referenced_category_is_an_integrity_violation() {
    let conn = seeded();
    let service = service(&conn);

    let err = service.delete(3).unwrap_err();
    assert!(matches!(err, ServiceError::Database(ref message) if message == "Integrity violation"));
    assert_eq!(err.status_hint(), 409);
    assert_eq!(service.find_by_id(3).unwrap().name, "Computadores");
}
