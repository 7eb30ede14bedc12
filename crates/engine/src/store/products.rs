use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{EngineError, NewProduct, Product, ResultEngine, products};

use super::{ProductStore, with_tx};

impl ProductStore {
    pub async fn create(&self, product: &NewProduct) -> ResultEngine<Product> {
        let name = product.name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "product name must not be empty".to_string(),
            ));
        }
        let mut active: products::ActiveModel = product.into();
        active.name = sea_orm::ActiveValue::Set(name.to_string());
        let model = active.insert(&self.database).await?;
        tracing::debug!(product_id = model.id, "product created");
        Ok(Product::from(model))
    }

    pub async fn get_by_id(&self, product_id: i32) -> ResultEngine<Product> {
        let model = products::Entity::find_by_id(product_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("product {product_id}")))?;
        Ok(Product::from(model))
    }

    /// Products ordered by id.
    pub async fn list(&self, limit: u64, offset: u64) -> ResultEngine<Vec<Product>> {
        let models = products::Entity::find()
            .order_by_asc(products::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Product::from).collect())
    }

    pub async fn count(&self) -> ResultEngine<u64> {
        Ok(products::Entity::find().count(&self.database).await?)
    }

    /// Add `delta` to the product's availability.
    ///
    /// Same contract as [`WalletStore::apply_delta`]: the storage engine
    /// computes the sum and `ck_products_availability` rejects negative stock.
    ///
    /// [`WalletStore::apply_delta`]: super::WalletStore::apply_delta
    pub async fn apply_availability_delta(
        &self,
        product_id: i32,
        delta: i32,
    ) -> ResultEngine<Product> {
        with_tx!(self, |db_tx| {
            let updated = products::Entity::update_many()
                .col_expr(
                    products::Column::Availability,
                    Expr::col(products::Column::Availability).add(delta),
                )
                .filter(products::Column::Id.eq(product_id))
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!("product {product_id}")));
            }

            let model = products::Entity::find_by_id(product_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("product {product_id}")))?;
            Ok(Product::from(model))
        })
    }
}
