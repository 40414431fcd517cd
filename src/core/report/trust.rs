//! Cross-account login resolution for federated roots
//!
//! When a user has no login in the root account, the export looks for one in
//! the accounts the root trusts. Among several candidates the most specific
//! wins: the root itself, then trusted accounts in trust order, then logins
//! carrying an external id, then lower position, then lower id.

use crate::domain::{AccountId, LoginRecord};
use std::collections::HashMap;

/// Best login per user, chosen once per batch
#[derive(Debug, Default)]
pub struct LoginIndex {
    best: HashMap<i64, LoginRecord>,
}

impl LoginIndex {
    pub fn build(logins: Vec<LoginRecord>, root: AccountId, trusted: &[AccountId]) -> Self {
        let mut best: HashMap<i64, LoginRecord> = HashMap::new();
        for login in logins {
            let Some(rank) = rank(&login, root, trusted) else {
                continue;
            };
            match best.get(&login.user_id) {
                Some(current) if rank_or_max(current, root, trusted) <= rank => {}
                _ => {
                    best.insert(login.user_id, login);
                }
            }
        }
        Self { best }
    }

    pub fn get(&self, user_id: i64) -> Option<&LoginRecord> {
        self.best.get(&user_id)
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

type Rank = (usize, bool, i64, i64);

fn rank(login: &LoginRecord, root: AccountId, trusted: &[AccountId]) -> Option<Rank> {
    let account_order = if login.account_id == root {
        0
    } else {
        trusted.iter().position(|a| *a == login.account_id)? + 1
    };
    Some((
        account_order,
        login.sis_user_id.is_none(),
        login.position.unwrap_or(i64::MAX),
        login.id,
    ))
}

fn rank_or_max(login: &LoginRecord, root: AccountId, trusted: &[AccountId]) -> Rank {
    rank(login, root, trusted).unwrap_or((usize::MAX, true, i64::MAX, i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(id: i64, user: i64, account: i64, sis: Option<&str>, position: Option<i64>) -> LoginRecord {
        LoginRecord {
            id,
            user_id: user,
            account_id: AccountId::new(account).unwrap(),
            unique_id: format!("login{id}"),
            sis_user_id: sis.map(str::to_string),
            position,
            account_domain: Some(format!("a{account}.example.edu")),
        }
    }

    fn acct(id: i64) -> AccountId {
        AccountId::new(id).unwrap()
    }

    #[test]
    fn test_root_login_preferred() {
        let index = LoginIndex::build(
            vec![login(1, 7, 20, Some("T"), Some(1)), login(2, 7, 1, None, Some(5))],
            acct(1),
            &[acct(20)],
        );
        assert_eq!(index.get(7).unwrap().id, 2);
    }

    #[test]
    fn test_trust_order_wins() {
        let index = LoginIndex::build(
            vec![login(1, 7, 30, Some("B"), Some(1)), login(2, 7, 20, Some("A"), Some(9))],
            acct(1),
            &[acct(20), acct(30)],
        );
        assert_eq!(index.get(7).unwrap().sis_user_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_sis_then_position_then_id() {
        let index = LoginIndex::build(
            vec![
                login(5, 7, 20, None, Some(1)),
                login(4, 7, 20, Some("X"), Some(3)),
                login(3, 7, 20, Some("Y"), Some(3)),
            ],
            acct(1),
            &[acct(20)],
        );
        assert_eq!(index.get(7).unwrap().id, 3);
    }

    #[test]
    fn test_untrusted_accounts_ignored() {
        let index = LoginIndex::build(vec![login(1, 7, 99, Some("Z"), None)], acct(1), &[acct(20)]);
        assert!(index.get(7).is_none());
        assert!(index.is_empty());
    }
}
