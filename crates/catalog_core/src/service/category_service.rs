//! Category use cases.

use crate::db::{TransactionManager, TxMode};
use crate::dto::CategoryDto;
use crate::model::category::{Category, CategoryId};
use crate::model::page::{Page, PageRequest};
use crate::repo::category_repo::CategoryRepository;
use crate::service::{
    entity_not_found, resolve_handle, translate_delete, translate_update, ServiceResult,
};
use log::info;

/// Category CRUD over an injected repository and transaction manager.
pub struct CategoryService<R, T> {
    repo: R,
    tx: T,
}

impl<R, T> CategoryService<R, T>
where
    R: CategoryRepository,
    T: TransactionManager,
{
    pub fn new(repo: R, tx: T) -> Self {
        Self { repo, tx }
    }

    /// All categories ordered by id.
    pub fn find_all(&self) -> ServiceResult<Vec<CategoryDto>> {
        self.tx.run(TxMode::ReadOnly, || {
            Ok(self
                .repo
                .find_all()?
                .iter()
                .map(CategoryDto::from)
                .collect())
        })
    }

    pub fn find_all_paged(&self, request: &PageRequest) -> ServiceResult<Page<CategoryDto>> {
        self.tx.run(TxMode::ReadOnly, || {
            Ok(self
                .repo
                .find_page(request)?
                .map(|category| CategoryDto::from(&category)))
        })
    }

    pub fn find_by_id(&self, id: CategoryId) -> ServiceResult<CategoryDto> {
        self.tx.run(TxMode::ReadOnly, || {
            self.repo
                .find_by_id(id)?
                .map(|category| CategoryDto::from(&category))
                .ok_or_else(entity_not_found)
        })
    }

    pub fn insert(&self, dto: &CategoryDto) -> ServiceResult<CategoryDto> {
        self.tx.run(TxMode::ReadWrite, || {
            let saved = self.repo.save(&Category::new(dto.name.clone()))?;
            info!(
                "event=category_insert module=service status=ok id={}",
                saved.id.unwrap_or_default()
            );
            Ok(CategoryDto::from(&saved))
        })
    }

    pub fn update(&self, id: CategoryId, dto: &CategoryDto) -> ServiceResult<CategoryDto> {
        self.tx.run(TxMode::ReadWrite, || {
            let reference = resolve_handle(self.repo.get_reference(id), id)?;
            let mut category = Category::attached(reference);
            category.name = dto.name.clone();
            let saved = translate_update(self.repo.save(&category), id)?;
            info!("event=category_update module=service status=ok id={id}");
            Ok(CategoryDto::from(&saved))
        })
    }

    /// Deletes one category; a category still linked to products is kept.
    pub fn delete(&self, id: CategoryId) -> ServiceResult<()> {
        let outcome = translate_delete(self.repo.delete_by_id(id), id);
        match &outcome {
            Ok(()) => info!("event=category_delete module=service status=ok id={id}"),
            Err(err) => info!(
                "event=category_delete module=service status=error id={id} status_hint={}",
                err.status_hint()
            ),
        }
        outcome
    }
}
