// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! User and group principals known to a filesystem

use std::collections::BTreeSet;

use crate::error::{FsError, FsResult};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserPrincipal {
    User(String),
    Group(String),
}

impl UserPrincipal {
    pub fn name(&self) -> &str {
        match self {
            UserPrincipal::User(name) | UserPrincipal::Group(name) => name,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UserPrincipalLookupService {
    users: BTreeSet<String>,
    groups: BTreeSet<String>,
}

impl UserPrincipalLookupService {
    pub fn new(
        users: impl IntoIterator<Item = String>,
        groups: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            users: users.into_iter().collect(),
            groups: groups.into_iter().collect(),
        }
    }

    pub fn lookup_principal_by_name(&self, name: &str) -> FsResult<UserPrincipal> {
        if self.users.contains(name) {
            Ok(UserPrincipal::User(name.to_string()))
        } else {
            Err(FsError::PrincipalNotFound(name.to_string()))
        }
    }

    pub fn lookup_principal_by_group_name(&self, group: &str) -> FsResult<UserPrincipal> {
        if self.groups.contains(group) {
            Ok(UserPrincipal::Group(group.to_string()))
        } else {
            Err(FsError::PrincipalNotFound(group.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let service = UserPrincipalLookupService::new(["alice".to_string()], ["staff".to_string()]);
        assert_eq!(
            service.lookup_principal_by_name("alice").unwrap(),
            UserPrincipal::User("alice".into())
        );
        assert_eq!(service.lookup_principal_by_group_name("staff").unwrap().name(), "staff");
        assert!(matches!(
            service.lookup_principal_by_name("staff"),
            Err(FsError::PrincipalNotFound(_))
        ));
    }
}
