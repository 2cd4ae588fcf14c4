// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache key layout

use crate::model::{ItemId, Pagination, ProjectId};

/// Prefix shared by every cached list page
pub const LIST_NAMESPACE: &str = "items:list";

/// Key of one cached item
pub fn item_key(project_id: ProjectId, id: ItemId) -> String {
    format!("item:{}:{}", project_id, id)
}

/// Key of one cached list page
pub fn list_key(page: Pagination) -> String {
    format!("{}:{}:{}", LIST_NAMESPACE, page.limit, page.offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_is_scoped_by_project() {
        assert_eq!(item_key(ProjectId(1), ItemId(2)), "item:1:2");
        assert_ne!(
            item_key(ProjectId(1), ItemId(2)),
            item_key(ProjectId(2), ItemId(2))
        );
    }

    #[test]
    fn list_keys_live_under_the_namespace() {
        let key = list_key(Pagination::new(10, 20));
        assert_eq!(key, "items:list:10:20");
        assert!(key.starts_with(LIST_NAMESPACE));
    }
}
