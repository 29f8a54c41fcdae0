//! Account directory
//!
//! Registers accounts and answers the existence check the transaction
//! service runs before every write.

use crate::cache::TtlCache;
use crate::store::{AccountLookup, AccountStore};
use crate::types::{Account, AccountId};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Document numbers are exactly this many ASCII digits
pub const DOCUMENT_LENGTH: usize = 11;

/// Account registry with an optional lookup cache
#[derive(Clone)]
pub struct AccountDirectory {
    store: Arc<dyn AccountStore>,
    cache: Option<Arc<TtlCache<AccountId, Account>>>,
}

impl AccountDirectory {
    /// Create a directory; `cache_ttl` of `None` disables the lookup cache
    pub fn new(store: Arc<dyn AccountStore>, cache_ttl: Option<Duration>) -> Self {
        Self {
            store,
            cache: cache_ttl.map(|ttl| Arc::new(TtlCache::new(ttl))),
        }
    }

    /// Register an account for a document number.
    ///
    /// Punctuation is stripped first, so `123.456.789-00` is stored as
    /// `12345678900`.
    pub async fn create(&self, document_number: &str) -> Result<Account> {
        let document_number = normalize_document(document_number);
        validate_document(&document_number)?;

        let account = Account {
            account_id: AccountId::generate(),
            document_number,
            created_at: Utc::now(),
        };

        self.store.insert_account(&account).await?;

        tracing::info!(account_id = %account.account_id, "Account created");
        Ok(account)
    }

    /// Lookup by ID, served from the cache when enabled
    pub async fn get_by_id(&self, account_id: &AccountId) -> Result<Account> {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(account_id)) {
            return Ok(cached);
        }

        let account = self
            .store
            .account_by_id(account_id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(account_id.clone()))?;

        if let Some(cache) = &self.cache {
            cache.insert(account_id.clone(), account.clone());
        }

        Ok(account)
    }

    /// Lookup by document number, punctuated or not
    pub async fn get_by_document(&self, document_number: &str) -> Result<Option<Account>> {
        let document_number = normalize_document(document_number);
        validate_document(&document_number)?;
        self.store.account_by_document(&document_number).await
    }
}

#[async_trait]
impl AccountLookup for AccountDirectory {
    async fn exists(&self, account_id: &AccountId) -> Result<bool> {
        match self.get_by_id(account_id).await {
            Ok(_) => Ok(true),
            Err(Error::AccountNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Strip the `.` and `-` separators of a formatted document number
pub fn normalize_document(document_number: &str) -> String {
    document_number
        .chars()
        .filter(|c| !matches!(c, '.' | '-'))
        .collect()
}

fn validate_document(document_number: &str) -> Result<()> {
    if document_number.len() != DOCUMENT_LENGTH
        || !document_number.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::InvalidDocument(document_number.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn directory() -> AccountDirectory {
        AccountDirectory::new(Arc::new(MemoryStore::new()), Some(Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let accounts = directory();

        let account = accounts.create("12345678900").await.unwrap();

        assert_eq!(
            accounts.get_by_id(&account.account_id).await.unwrap(),
            account
        );
        assert_eq!(
            accounts.get_by_document("12345678900").await.unwrap(),
            Some(account.clone())
        );
        assert!(accounts.exists(&account.account_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_documents_rejected() {
        let accounts = directory();

        for document in ["", "1234567890", "123456789012", "1234567890a", "١٢٣٤٥٦٧٨٩٠١"] {
            assert!(
                matches!(
                    accounts.create(document).await,
                    Err(Error::InvalidDocument(_))
                ),
                "accepted {:?}",
                document
            );
        }
    }

    #[test]
    fn test_normalize_document() {
        assert_eq!(normalize_document("123.456.789-00"), "12345678900");
        assert_eq!(normalize_document("12345678900"), "12345678900");
        assert_eq!(normalize_document("12 345"), "12 345");
    }

    #[tokio::test]
    async fn test_formatted_document_is_normalized() {
        let accounts = directory();

        let account = accounts.create("123.456.789-00").await.unwrap();
        assert_eq!(account.document_number, "12345678900");

        assert_eq!(
            accounts.get_by_document("123.456.789-00").await.unwrap(),
            Some(account.clone())
        );
        assert_eq!(
            accounts.get_by_document("12345678900").await.unwrap(),
            Some(account)
        );
        assert!(matches!(
            accounts.create("12345678900").await,
            Err(Error::DuplicateDocument(_))
        ));
        assert!(matches!(
            accounts.create("123.456.789-0").await,
            Err(Error::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_document_rejected() {
        let accounts = directory();

        accounts.create("12345678900").await.unwrap();
        assert!(matches!(
            accounts.create("12345678900").await,
            Err(Error::DuplicateDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let accounts = directory();
        let missing = AccountId::generate();

        assert!(!accounts.exists(&missing).await.unwrap());
        assert!(matches!(
            accounts.get_by_id(&missing).await,
            Err(Error::AccountNotFound(_))
        ));
    }
}
