//! Identity store entities: credentials and password reset tokens.

use sea_orm::entity::prelude::*;

use crate::infra::repositories::{Credential, PasswordReset};

pub mod credential {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "credentials")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: Uuid,
        /// Lowercased
        #[sea_orm(unique)]
        pub email: String,
        pub password_hash: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Credential {
        fn from(model: Model) -> Self {
            Credential {
                user_id: model.user_id,
                email: model.email,
                password_hash: model.password_hash,
                created_at: model.created_at,
            }
        }
    }
}

pub mod password_reset {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "password_resets")]
    pub struct Model {
        /// SHA-256 of the mailed token
        #[sea_orm(primary_key, auto_increment = false)]
        pub token_hash: String,
        pub user_id: Uuid,
        pub expires_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for PasswordReset {
        fn from(model: Model) -> Self {
            PasswordReset {
                token_hash: model.token_hash,
                user_id: model.user_id,
                expires_at: model.expires_at,
            }
        }
    }
}
