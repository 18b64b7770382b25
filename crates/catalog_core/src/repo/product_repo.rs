//! Product repository contract and SQLite implementation.
//!
//! # Invariants
//! - Saving a product rewrites its `product_category` links in the same
//!   transaction as the row itself.
//! - A category id that does not exist at save time fails the whole save with
//!   `DanglingReference`.

use crate::db::{SqliteTransactionManager, TransactionManager, TxMode};
use crate::model::now_epoch_ms;
use crate::model::page::{Page, PageRequest};
use crate::model::product::{Product, ProductId};
use crate::model::relation::{Reference, RelationSet};
use crate::model::{Entity, EntityId};
use crate::repo::{
    count_rows, delete_row, existing_reference, order_by_clause, CrudRepository, LinkTable,
    RepoError, RepoResult, SortColumn,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const PRODUCT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    price,
    img_url,
    date
FROM products";

const PRODUCT_SORT_COLUMNS: &[SortColumn] = &[
    ("id", "id"),
    ("name", "name"),
    ("price", "price"),
    ("date", "date"),
];

const PRODUCT_CATEGORY: LinkTable = LinkTable {
    table: "product_category",
    owner_column: "product_id",
    target_column: "category_id",
    target_table: "categories",
    target_entity: "category",
};

/// Product storage capability.
pub trait ProductRepository: CrudRepository<Entity = Product> {}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!("{PRODUCT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_product_row,
            )
            .optional()?;
        product.map(|product| self.with_categories(product)).transpose()
    }

    fn with_categories(&self, mut product: Product) -> RepoResult<Product> {
        let id = product
            .id
            .ok_or_else(|| RepoError::InvalidData("product row without id".to_string()))?;
        product.categories = RelationSet::from_ids(PRODUCT_CATEGORY.load_ids(self.conn, id)?);
        Ok(product)
    }

    fn query(&self, sql: &str, values: &[i64]) -> RepoResult<Vec<Product>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row)?);
        }
        drop(rows);
        products
            .into_iter()
            .map(|product| self.with_categories(product))
            .collect()
    }

    fn write_row(&self, product: &Product) -> RepoResult<ProductId> {
        match product.id {
            None => {
                self.conn.execute(
                    "INSERT INTO products (
                        name,
                        description,
                        price,
                        img_url,
                        date
                    ) VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        product.name.as_str(),
                        product.description.as_str(),
                        product.price,
                        product.img_url.as_str(),
                        product.date,
                    ],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE products
                     SET
                        name = ?2,
                        description = ?3,
                        price = ?4,
                        img_url = ?5,
                        date = ?6
                     WHERE id = ?1;",
                    params![
                        id,
                        product.name.as_str(),
                        product.description.as_str(),
                        product.price,
                        product.img_url.as_str(),
                        product.date,
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: Product::NAME,
                        id,
                    });
                }
                Ok(id)
            }
        }
    }
}

impl CrudRepository for SqliteProductRepository<'_> {
    type Entity = Product;

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Product>> {
        self.load(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Product>> {
        self.query(&format!("{PRODUCT_SELECT_SQL} ORDER BY id ASC;"), &[])
    }

    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<Product>> {
        let order_by = order_by_clause(
            Product::NAME,
            request.sort.as_ref(),
            PRODUCT_SORT_COLUMNS,
        )?;
        let content = self.query(
            &format!("{PRODUCT_SELECT_SQL} {order_by} LIMIT ?1 OFFSET ?2;"),
            &[
                i64::from(request.effective_size()),
                i64::try_from(request.offset()).unwrap_or(i64::MAX),
            ],
        )?;
        let total = count_rows(self.conn, "products")?;
        Ok(Page::new(content, request, total))
    }

    fn save(&self, product: &Product) -> RepoResult<Product> {
        product.validate(now_epoch_ms())?;

        SqliteTransactionManager::new(self.conn).run(TxMode::ReadWrite, || {
            let id = self.write_row(product)?;
            PRODUCT_CATEGORY.replace(self.conn, id, &product.categories.ids())?;
            self.load(id)?
                .ok_or_else(|| RepoError::InvalidData(format!("product {id} missing after save")))
        })
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        delete_row(self.conn, "products", Product::NAME, id)
    }

    fn get_reference(&self, id: EntityId) -> RepoResult<Reference<Product>> {
        existing_reference(self.conn, "products", Product::NAME, id)
    }
}

impl ProductRepository for SqliteProductRepository<'_> {}

fn parse_product_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        price: row.get("price")?,
        img_url: row.get("img_url")?,
        date: row.get("date")?,
        categories: RelationSet::new(),
    })
}
