//! The module contains `Product` struct and its storage entity.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

/// A sellable product.
///
/// `price` is in the minor currency unit; `availability` is the stock count.
/// Both are non-negative, enforced by the storage engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub availability: i32,
}

/// Fields for a new product row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub availability: i32,
}

impl NewProduct {
    #[must_use]
    pub fn new(name: impl Into<String>, price: i64, availability: i32) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            availability,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub availability: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewProduct> for ActiveModel {
    fn from(value: &NewProduct) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            price: ActiveValue::Set(value.price),
            availability: ActiveValue::Set(value.availability),
        }
    }
}

impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            availability: model.availability,
        }
    }
}
