//! Product use cases.
//!
//! # Invariants
//! - Insert and update replace the product's full category set with the ids
//!   declared in the representation.
//! - Output representations carry resolved categories, ordered by id.

use crate::db::{TransactionManager, TxMode};
use crate::dto::ProductDto;
use crate::model::page::{Page, PageRequest};
use crate::model::product::{Product, ProductId};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::product_repo::ProductRepository;
use crate::service::relations::{declared_ids, sync_relations};
use crate::service::{
    entity_not_found, resolve_handle, translate_delete, translate_update, ServiceResult,
};
use log::info;

/// Product CRUD with category relation sync.
pub struct ProductService<P, C, T> {
    products: P,
    categories: C,
    tx: T,
}

impl<P, C, T> ProductService<P, C, T>
where
    P: ProductRepository,
    C: CategoryRepository,
    T: TransactionManager,
{
    pub fn new(products: P, categories: C, tx: T) -> Self {
        Self {
            products,
            categories,
            tx,
        }
    }

    pub fn find_all_paged(&self, request: &PageRequest) -> ServiceResult<Page<ProductDto>> {
        self.tx.run(TxMode::ReadOnly, || {
            self.products
                .find_page(request)?
                .try_map(|product| self.to_dto(&product))
        })
    }

    pub fn find_by_id(&self, id: ProductId) -> ServiceResult<ProductDto> {
        self.tx.run(TxMode::ReadOnly, || {
            let product = self.products.find_by_id(id)?.ok_or_else(entity_not_found)?;
            self.to_dto(&product)
        })
    }

    pub fn insert(&self, dto: &ProductDto) -> ServiceResult<ProductDto> {
        self.tx.run(TxMode::ReadWrite, || {
            let mut product = Product::default();
            self.copy_dto_to_entity(dto, &mut product)?;
            let saved = self.products.save(&product)?;
            info!(
                "event=product_insert module=service status=ok id={} categories={}",
                saved.id.unwrap_or_default(),
                saved.categories.len()
            );
            self.to_dto(&saved)
        })
    }

    pub fn update(&self, id: ProductId, dto: &ProductDto) -> ServiceResult<ProductDto> {
        self.tx.run(TxMode::ReadWrite, || {
            let reference = resolve_handle(self.products.get_reference(id), id)?;
            let mut product = Product::attached(reference);
            self.copy_dto_to_entity(dto, &mut product)?;
            let saved = translate_update(self.products.save(&product), id)?;
            info!(
                "event=product_update module=service status=ok id={id} categories={}",
                saved.categories.len()
            );
            self.to_dto(&saved)
        })
    }

    /// Deletes one product together with its category links.
    pub fn delete(&self, id: ProductId) -> ServiceResult<()> {
        let outcome = translate_delete(self.products.delete_by_id(id), id);
        match &outcome {
            Ok(()) => info!("event=product_delete module=service status=ok id={id}"),
            Err(err) => info!(
                "event=product_delete module=service status=error id={id} status_hint={}",
                err.status_hint()
            ),
        }
        outcome
    }

    fn copy_dto_to_entity(&self, dto: &ProductDto, product: &mut Product) -> ServiceResult<()> {
        product.name = dto.name.clone();
        product.description = dto.description.clone();
        product.price = dto.price;
        product.img_url = dto.img_url.clone();
        product.date = dto.date;

        let ids = declared_ids("categories", dto.categories.iter().map(|category| category.id))?;
        sync_relations(&mut product.categories, &self.categories, &ids);
        Ok(())
    }

    fn to_dto(&self, product: &Product) -> ServiceResult<ProductDto> {
        let categories = self
            .categories
            .find_all_by_ids(&product.categories.ids())?;
        Ok(ProductDto::from_entity(product, &categories))
    }
}
