//! UI affordance selection from client permissions.
//!
//! # Purpose
//! Decides which menu entries a role's client permissions produce and whether
//! a client may render a given path.
//!
//! # Key invariants
//! - Entries are ordered by `(sort, id)`; sections appear in the order of
//!   their first entry.
//! - Path checks use the same normalization and pattern rules as API routes.
use crate::{normalize_route, route_matches};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub id: i64,
    pub name: String,
    pub menu: String,
    pub path: String,
    pub sort: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    pub menu: String,
    pub items: Vec<MenuEntry>,
}

/// Group entries into ordered menu sections.
pub fn menu_for(entries: &[MenuEntry]) -> Vec<MenuSection> {
    let mut ordered: Vec<&MenuEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| (entry.sort, entry.id));

    let mut sections: Vec<MenuSection> = Vec::new();
    for entry in ordered {
        match sections.iter_mut().find(|section| section.menu == entry.menu) {
            Some(section) => section.items.push(entry.clone()),
            None => sections.push(MenuSection {
                menu: entry.menu.clone(),
                items: vec![entry.clone()],
            }),
        }
    }
    sections
}

/// Whether a client holding `entries` may render `path`.
pub fn can_render(entries: &[MenuEntry], super_admin: bool, path: &str) -> bool {
    if super_admin {
        return true;
    }
    let path = normalize_route(path);
    entries
        .iter()
        .any(|entry| route_matches(&entry.path, &path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, menu: &str, path: &str, sort: i32) -> MenuEntry {
        MenuEntry {
            id,
            name: format!("entry-{id}"),
            menu: menu.to_string(),
            path: path.to_string(),
            sort,
        }
    }

    #[test]
    fn menu_sorts_and_groups() {
        let entries = vec![
            entry(1, "Admin", "/admin/users", 3),
            entry(2, "Profile", "/account/profile", 1),
            entry(3, "Admin", "/admin/roles", 2),
            entry(4, "Admin", "/admin/permissions", 2),
        ];
        let menu = menu_for(&entries);
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].menu, "Profile");
        assert_eq!(menu[1].menu, "Admin");
        let admin_ids: Vec<i64> = menu[1].items.iter().map(|item| item.id).collect();
        assert_eq!(admin_ids, vec![3, 4, 1]);
    }

    #[test]
    fn empty_entries_give_empty_menu() {
        assert!(menu_for(&[]).is_empty());
    }

    #[test]
    fn can_render_checks_paths() {
        let entries = vec![
            entry(1, "Admin", "/admin/users", 1),
            entry(2, "Admin", "/admin/roles/:id", 2),
        ];
        assert!(can_render(&entries, false, "/admin/users/"));
        assert!(can_render(&entries, false, "/admin/roles/9"));
        assert!(!can_render(&entries, false, "/admin/permissions"));
        assert!(can_render(&[], true, "/admin/permissions"));
    }
}
