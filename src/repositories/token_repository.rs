use async_trait::async_trait;
use log::info;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOneOptions, IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::AccessToken};

/// Result of the atomic unused -> used transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkUsedOutcome {
    Marked(AccessToken),
    AlreadyUsed,
    NotFound,
}

/// Persistence contract for access tokens.
///
/// `compare_and_mark_used` must be atomic against every other caller of the
/// same store, including callers in other processes: among concurrent callers
/// presenting the same identifier exactly one observes `Marked`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn get(&self, identifier: &str) -> AppResult<Option<AccessToken>>;
    async fn put(&self, token: AccessToken) -> AppResult<AccessToken>;
    async fn compare_and_mark_used(
        &self,
        identifier: &str,
        used_at: i64,
    ) -> AppResult<MarkUsedOutcome>;
    /// Newest unused token of the scope issued strictly after `issued_after`.
    async fn find_current(
        &self,
        scope_key: &str,
        issued_after: i64,
    ) -> AppResult<Option<AccessToken>>;
    async fn delete_issued_before(&self, cutoff: i64) -> AppResult<u64>;
    async fn health_check(&self) -> AppResult<()>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoTokenRepository {
    collection: Collection<AccessToken>,
    db: Database,
}

impl MongoTokenRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self {
            collection,
            db: db.clone(),
        }
    }
}

#[async_trait]
impl TokenRepository for MongoTokenRepository {
    async fn get(&self, identifier: &str) -> AppResult<Option<AccessToken>> {
        let token = self
            .collection
            .find_one(doc! { "identifier": identifier })
            .await?;
        Ok(token)
    }

    async fn put(&self, token: AccessToken) -> AppResult<AccessToken> {
        self.collection.insert_one(&token).await?;
        Ok(token)
    }

    async fn compare_and_mark_used(
        &self,
        identifier: &str,
        used_at: i64,
    ) -> AppResult<MarkUsedOutcome> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let marked = self
            .collection
            .find_one_and_update(
                doc! { "identifier": identifier, "used": false },
                doc! { "$set": { "used": true, "used_at": used_at } },
            )
            .with_options(options)
            .await?;

        if let Some(token) = marked {
            return Ok(MarkUsedOutcome::Marked(token));
        }

        // The conditional update missed: either someone else flipped it or it is gone.
        match self.get(identifier).await? {
            Some(_) => Ok(MarkUsedOutcome::AlreadyUsed),
            None => Ok(MarkUsedOutcome::NotFound),
        }
    }

    async fn find_current(
        &self,
        scope_key: &str,
        issued_after: i64,
    ) -> AppResult<Option<AccessToken>> {
        let options = FindOneOptions::builder()
            .sort(doc! { "issued_at": -1 })
            .build();

        let token = self
            .collection
            .find_one(doc! {
                "scope": scope_key,
                "used": false,
                "issued_at": { "$gt": issued_after },
            })
            .with_options(options)
            .await?;
        Ok(token)
    }

    async fn delete_issued_before(&self, cutoff: i64) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "issued_at": { "$lt": cutoff } })
            .await?;

        Ok(result.deleted_count)
    }

    async fn health_check(&self) -> AppResult<()> {
        self.db.health_check().await
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let identifier_options = IndexOptions::builder()
            .unique(true)
            .name("identifier_unique".to_string())
            .build();
        let identifier_model = IndexModel::builder()
            .keys(doc! { "identifier": 1 })
            .options(identifier_options)
            .build();
        self.collection.create_index(identifier_model).await?;
        info!("Created unique index on access_tokens.identifier");

        let current_model = IndexModel::builder()
            .keys(doc! { "scope": 1, "used": 1, "issued_at": -1 })
            .build();
        self.collection.create_index(current_model).await?;
        info!("Created index on access_tokens.(scope, used, issued_at)");

        let issued_at_model = IndexModel::builder()
            .keys(doc! { "issued_at": 1 })
            .build();
        self.collection.create_index(issued_at_model).await?;
        info!("Created index on access_tokens.issued_at");

        Ok(())
    }
}
