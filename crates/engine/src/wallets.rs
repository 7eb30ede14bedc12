//! The module contains `Wallet` struct and its storage entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

/// A wallet.
///
/// Every user owns at most one wallet. The balance is expressed in the minor
/// currency unit and can only move through delta mutations, never through a
/// wholesale overwrite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i32,
    pub user_id: i32,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which wallet a delta mutation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletSelector {
    /// The wallet owned by this user.
    User(i32),
    /// The wallet with this id.
    Wallet(i32),
}

impl WalletSelector {
    pub(crate) fn condition(self) -> sea_orm::Condition {
        match self {
            Self::User(user_id) => sea_orm::Condition::all().add(Column::UserId.eq(user_id)),
            Self::Wallet(wallet_id) => sea_orm::Condition::all().add(Column::Id.eq(wallet_id)),
        }
    }

    pub(crate) fn describe(self) -> String {
        match self {
            Self::User(user_id) => format!("wallet of user {user_id}"),
            Self::Wallet(wallet_id) => format!("wallet {wallet_id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub balance: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// A fresh row for `user_id`; the id is assigned by the database.
    pub(crate) fn new_for_user(user_id: i32, balance: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            balance: ActiveValue::Set(balance),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
    }
}

impl From<Model> for Wallet {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            balance: model.balance,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
