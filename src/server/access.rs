use crate::error::Result as StoreResult;
use crate::server::response::{ApiError, StoreResultExt};
use crate::store::Store;
use crate::types::{PermissionOverride, PermissionSet, User, resolve};

/// Everything that went into a user's effective permissions.
pub struct PermissionBreakdown {
    pub baseline: PermissionSet,
    pub overrides: Vec<PermissionOverride>,
    pub effective: PermissionSet,
}

/// Loads the role baseline, the user's overrides and the catalog, then
/// resolves them. A role without baseline rows resolves to nothing.
pub fn permission_breakdown(
    store: &dyn Store,
    user: &User,
) -> StoreResult<PermissionBreakdown> {
    let baseline: PermissionSet = store
        .list_role_permissions(user.role.as_str())?
        .into_iter()
        .collect();

    let overrides: Vec<PermissionOverride> = store
        .list_user_overrides(&user.id)?
        .into_iter()
        .map(|o| PermissionOverride {
            permission: o.permission,
            is_granted: o.is_granted,
        })
        .collect();

    let catalog: PermissionSet = store
        .list_permissions()?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let effective = resolve(user.role, &baseline, &overrides, &catalog);

    Ok(PermissionBreakdown {
        baseline,
        overrides,
        effective,
    })
}

pub fn effective_permissions(store: &dyn Store, user: &User) -> StoreResult<PermissionSet> {
    Ok(permission_breakdown(store, user)?.effective)
}

/// Fails with 403 unless the user's effective permissions contain `name`.
pub fn require_permission(store: &dyn Store, user: &User, name: &str) -> Result<(), ApiError> {
    let effective =
        effective_permissions(store, user).api_err("Failed to resolve permissions")?;

    if !effective.has(name) {
        tracing::debug!(user = %user.id, permission = name, "permission denied");
        return Err(ApiError::forbidden(format!("Missing permission: {name}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::store::SqliteStore;
    use crate::types::permission::{COURSES_WRITE, PERMISSIONS_MANAGE, STUDENTS_WRITE, UNITS_READ};
    use crate::types::{Role, UserPermissionOverride};

    fn setup(role: Role) -> (SqliteStore, User) {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: format!("{}@demo.com", role.as_str()),
            name: role.as_str().to_string(),
            role,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        store.create_user(&user).unwrap();
        (store, user)
    }

    fn set_override(store: &SqliteStore, user: &User, name: &str, is_granted: bool) {
        let permission = store.get_permission_by_name(name).unwrap().unwrap();
        let now = Utc::now();
        store
            .upsert_override(&UserPermissionOverride {
                user_id: user.id.clone(),
                permission_id: permission.id,
                permission: name.to_string(),
                is_granted,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    #[test]
    fn test_teacher_baseline() {
        let (store, teacher) = setup(Role::Teacher);
        assert!(require_permission(&store, &teacher, UNITS_READ).is_ok());

        let err = require_permission(&store, &teacher, STUDENTS_WRITE).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_grant_then_deny_replaces() {
        let (store, teacher) = setup(Role::Teacher);

        set_override(&store, &teacher, STUDENTS_WRITE, true);
        assert!(require_permission(&store, &teacher, STUDENTS_WRITE).is_ok());

        set_override(&store, &teacher, STUDENTS_WRITE, false);
        assert!(require_permission(&store, &teacher, STUDENTS_WRITE).is_err());
    }

    #[test]
    fn test_deny_removes_baseline_permission() {
        let (store, teacher) = setup(Role::Teacher);
        set_override(&store, &teacher, UNITS_READ, false);

        let breakdown = permission_breakdown(&store, &teacher).unwrap();
        assert!(breakdown.baseline.has(UNITS_READ));
        assert!(!breakdown.effective.has(UNITS_READ));
        assert_eq!(breakdown.overrides.len(), 1);
    }

    #[test]
    fn test_admin_ignores_overrides() {
        let (store, admin) = setup(Role::Admin);
        set_override(&store, &admin, COURSES_WRITE, false);

        assert!(require_permission(&store, &admin, COURSES_WRITE).is_ok());
        assert!(require_permission(&store, &admin, PERMISSIONS_MANAGE).is_ok());
    }

    #[test]
    fn test_admin_gets_custom_catalog_entries() {
        let (store, admin) = setup(Role::Admin);
        store
            .create_permission(&crate::types::Permission {
                id: Uuid::new_v4().to_string(),
                name: "reports:export".to_string(),
                display_name: "Export reports".to_string(),
                description: None,
            })
            .unwrap();

        assert!(effective_permissions(&store, &admin).unwrap().has("reports:export"));
    }

    #[test]
    fn test_empty_baseline_fails_closed() {
        let (store, student) = setup(Role::Student);
        store.set_role_permissions("student", &[]).unwrap();

        assert!(effective_permissions(&store, &student).unwrap().is_empty());
    }
}
