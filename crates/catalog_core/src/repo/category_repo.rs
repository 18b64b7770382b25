//! Category repository contract and SQLite implementation.

use crate::model::category::{Category, CategoryId};
use crate::model::page::{Page, PageRequest};
use crate::model::relation::Reference;
use crate::model::{Entity, EntityId};
use crate::repo::{
    count_rows, delete_row, existing_reference, in_placeholders, order_by_clause, CrudRepository,
    RepoError, RepoResult, SortColumn,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT id, name, created_at, updated_at FROM categories";
const CATEGORY_SORT_COLUMNS: &[SortColumn] = &[("id", "id"), ("name", "name")];

/// Category storage capability.
pub trait CategoryRepository: CrudRepository<Entity = Category> {
    /// Loads the given categories ordered by id; unknown ids are skipped.
    fn find_all_by_ids(&self, ids: &[CategoryId]) -> RepoResult<Vec<Category>>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        self.conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_category_row,
            )
            .optional()
            .map_err(RepoError::from)
    }

    fn query(&self, sql: &str, values: &[i64]) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }
}

impl CrudRepository for SqliteCategoryRepository<'_> {
    type Entity = Category;

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Category>> {
        self.load(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Category>> {
        self.query(&format!("{CATEGORY_SELECT_SQL} ORDER BY id ASC;"), &[])
    }

    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<Category>> {
        let order_by = order_by_clause(
            Category::NAME,
            request.sort.as_ref(),
            CATEGORY_SORT_COLUMNS,
        )?;
        let content = self.query(
            &format!("{CATEGORY_SELECT_SQL} {order_by} LIMIT ?1 OFFSET ?2;"),
            &[
                i64::from(request.effective_size()),
                i64::try_from(request.offset()).unwrap_or(i64::MAX),
            ],
        )?;
        let total = count_rows(self.conn, "categories")?;
        Ok(Page::new(content, request, total))
    }

    fn save(&self, category: &Category) -> RepoResult<Category> {
        category.validate()?;

        let id = match category.id {
            None => {
                self.conn.execute(
                    "INSERT INTO categories (name) VALUES (?1);",
                    [category.name.as_str()],
                )?;
                self.conn.last_insert_rowid()
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE categories
                     SET
                        name = ?2,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    params![id, category.name.as_str()],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: Category::NAME,
                        id,
                    });
                }
                id
            }
        };

        self.load(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("category {id} missing after save"))
        })
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        delete_row(self.conn, "categories", Category::NAME, id)
    }

    fn get_reference(&self, id: EntityId) -> RepoResult<Reference<Category>> {
        existing_reference(self.conn, "categories", Category::NAME, id)
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn find_all_by_ids(&self, ids: &[CategoryId]) -> RepoResult<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query(
            &format!(
                "{CATEGORY_SELECT_SQL} WHERE id IN ({}) ORDER BY id ASC;",
                in_placeholders(ids.len())
            ),
            ids,
        )
    }
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
