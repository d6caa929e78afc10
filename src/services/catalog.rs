//! Catalog access: products and categories. The invoice engine consumes
//! `find_product` and `adjust_stock`; the rest is the thin CRUD surface.

use bson::oid::ObjectId;
use bson::{doc, DateTime};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use crate::db;
use crate::models::{Category, Product};
use crate::services::error::ServiceError;

#[derive(Clone)]
pub struct CatalogService {
    products: Collection<Product>,
    categories: Collection<Category>,
}

impl CatalogService {
    pub fn new(db: &Database) -> Self {
        Self {
            products: db.collection(db::PRODUCTS),
            categories: db.collection(db::CATEGORIES),
        }
    }

    pub async fn find_product(&self, id: &ObjectId) -> Result<Option<Product>, ServiceError> {
        let product = self.products.find_one(doc! { "_id": id }, None).await?;
        Ok(product)
    }

    /// Look up by the external-facing product code.
    pub async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, ServiceError> {
        let product = self
            .products
            .find_one(doc! { "product_id": code }, None)
            .await?;
        Ok(product)
    }

    /// Atomically shift a product's stock by `delta` (negative to deduct).
    /// The counter update itself is atomic; the caller owns any preceding
    /// sufficiency check.
    pub async fn adjust_stock(&self, id: &ObjectId, delta: i64) -> Result<(), ServiceError> {
        self.products
            .update_one(
                doc! { "_id": id },
                doc! { "$inc": { "quantity": delta } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn create_product(&self, mut product: Product) -> Result<Product, ServiceError> {
        let category_id = ObjectId::parse_str(&product.category_id)
            .map_err(|_| ServiceError::CategoryNotFound)?;
        if self.find_category(&category_id).await?.is_none() {
            return Err(ServiceError::CategoryNotFound);
        }

        let result = self.products.insert_one(&product, None).await?;
        product.id = result.inserted_id.as_object_id();
        Ok(product)
    }

    pub async fn list_products(
        &self,
        skip: u64,
        limit: i64,
    ) -> Result<(Vec<Product>, u64), ServiceError> {
        let filter = doc! { "is_active": true };
        let total = self.products.count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "name": 1 })
            .skip(skip)
            .limit(limit)
            .build();
        let cursor = self.products.find(filter, options).await?;
        let products = cursor.try_collect().await?;

        Ok((products, total))
    }

    pub async fn set_product_stock(
        &self,
        id: &ObjectId,
        quantity: i64,
    ) -> Result<Product, ServiceError> {
        let result = self
            .products
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "quantity": quantity, "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(ServiceError::ProductNotFound(id.to_hex()));
        }

        self.find_product(id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(id.to_hex()))
    }

    pub async fn find_category(&self, id: &ObjectId) -> Result<Option<Category>, ServiceError> {
        let category = self.categories.find_one(doc! { "_id": id }, None).await?;
        Ok(category)
    }

    pub async fn create_category(&self, mut category: Category) -> Result<Category, ServiceError> {
        let existing = self
            .categories
            .find_one(doc! { "name": &category.name }, None)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Validation(format!(
                "Category '{}' already exists",
                category.name
            )));
        }

        let result = self.categories.insert_one(&category, None).await?;
        category.id = result.inserted_id.as_object_id();
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let cursor = self
            .categories
            .find(doc! { "is_active": true }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Hard-delete a category, refused while active products still point
    /// at it.
    pub async fn delete_category(&self, id: &ObjectId) -> Result<(), ServiceError> {
        if self.find_category(id).await?.is_none() {
            return Err(ServiceError::CategoryNotFound);
        }

        let referencing = self
            .products
            .count_documents(
                doc! { "category_id": id.to_hex(), "is_active": true },
                None,
            )
            .await?;
        if referencing > 0 {
            return Err(ServiceError::CategoryInUse);
        }

        self.categories.delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }
}
