//! Records the exporter looks up outside the paged report queries

use crate::domain::ids::{AccountId, TermId};
use serde::{Deserialize, Serialize};

/// An organizational account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    /// `None` for root accounts
    pub root_account_id: Option<AccountId>,
    pub parent_account_id: Option<AccountId>,
    pub name: String,
    /// Host name the account is served under, used for federated output
    pub domain: Option<String>,
}

impl AccountRecord {
    pub fn is_root(&self) -> bool {
        self.root_account_id.is_none() || self.root_account_id == Some(self.id)
    }

    /// The root account this account belongs to
    pub fn root(&self) -> AccountId {
        self.root_account_id.unwrap_or(self.id)
    }
}

/// An enrollment term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub id: TermId,
    pub root_account_id: AccountId,
    pub name: String,
}

/// An active login belonging to some account in the federation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRecord {
    pub id: i64,
    pub user_id: i64,
    pub account_id: AccountId,
    pub unique_id: String,
    pub sis_user_id: Option<String>,
    pub position: Option<i64>,
    /// Domain of the owning account
    pub account_domain: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: i64, root: Option<i64>) -> AccountRecord {
        AccountRecord {
            id: AccountId::new(id).unwrap(),
            root_account_id: root.map(|r| AccountId::new(r).unwrap()),
            parent_account_id: None,
            name: "A".to_string(),
            domain: None,
        }
    }

    #[test]
    fn test_is_root() {
        assert!(account(1, None).is_root());
        assert!(account(1, Some(1)).is_root());
        assert!(!account(2, Some(1)).is_root());
    }

    #[test]
    fn test_root() {
        assert_eq!(account(2, Some(1)).root().get(), 1);
        assert_eq!(account(1, None).root().get(), 1);
    }
}
