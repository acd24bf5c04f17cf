//! Caller capability levels.
//!
//! Permissions are resolved from the config per interaction and never
//! cached: edits to the user lists take effect on the next button press.

use crate::config::TelegramConfig;

/// Ordered capability level. `Read` lets a user inspect torrents; `Edit`
/// additionally allows mutations (pause, delete, priorities, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Permission {
    Read,
    Edit,
}

/// Resolves the capability of a Telegram user, or `None` for strangers.
pub fn resolve(user_id: u64, config: &TelegramConfig) -> Option<Permission> {
    if config.admin_user_ids.contains(&user_id) {
        Some(Permission::Edit)
    } else if config.user_ids.contains(&user_id) {
        Some(Permission::Read)
    } else {
        None
    }
}

/// Whether `level` satisfies `required`.
pub fn allows(level: Option<Permission>, required: Permission) -> bool {
    level.is_some_and(|l| l >= required)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelegramConfig {
        TelegramConfig {
            token: String::new(),
            admin_user_ids: vec![1],
            user_ids: vec![2],
            notifications_enabled: true,
            notify_chat_id: None,
            operator_chat_id: None,
            no_notify_tag: None,
        }
    }

    #[test]
    fn test_edit_implies_read() {
        assert!(Permission::Edit > Permission::Read);
        assert!(allows(Some(Permission::Edit), Permission::Read));
    }

    #[test]
    fn test_resolution() {
        let config = config();
        assert_eq!(resolve(1, &config), Some(Permission::Edit));
        assert_eq!(resolve(2, &config), Some(Permission::Read));
        assert_eq!(resolve(3, &config), None);
    }

    #[test]
    fn test_read_cannot_edit() {
        assert!(!allows(Some(Permission::Read), Permission::Edit));
        assert!(!allows(None, Permission::Read));
    }
}
