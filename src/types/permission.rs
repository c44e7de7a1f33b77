use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const UNITS_READ: &str = "units:read";
pub const UNITS_WRITE: &str = "units:write";
pub const STAFF_READ: &str = "staff:read";
pub const STAFF_WRITE: &str = "staff:write";
pub const STUDENTS_READ: &str = "students:read";
pub const STUDENTS_WRITE: &str = "students:write";
pub const COURSES_READ: &str = "courses:read";
pub const COURSES_WRITE: &str = "courses:write";
pub const CLASSES_READ: &str = "classes:read";
pub const CLASSES_WRITE: &str = "classes:write";
pub const ATTENDANCE_READ: &str = "attendance:read";
pub const ATTENDANCE_WRITE: &str = "attendance:write";
pub const PERMISSIONS_READ: &str = "permissions:read";
pub const PERMISSIONS_MANAGE: &str = "permissions:manage";

/// Built-in permissions as (name, display name, description).
pub const BUILTIN_PERMISSIONS: &[(&str, &str, &str)] = &[
    (UNITS_READ, "View units", "List and view school units"),
    (UNITS_WRITE, "Manage units", "Create, edit and delete school units"),
    (STAFF_READ, "View staff", "List and view staff members"),
    (STAFF_WRITE, "Manage staff", "Create, edit and delete staff members"),
    (STUDENTS_READ, "View students", "List and view students"),
    (STUDENTS_WRITE, "Manage students", "Create, edit and delete students"),
    (COURSES_READ, "View courses", "Browse courses, books, units and videos"),
    (COURSES_WRITE, "Manage courses", "Edit the curriculum"),
    (CLASSES_READ, "View classes", "View class slots, schedules and enrollments"),
    (CLASSES_WRITE, "Manage classes", "Create and edit class slots and enrollments"),
    (ATTENDANCE_READ, "View attendance", "View attendance rosters and history"),
    (ATTENDANCE_WRITE, "Take attendance", "Mark students present, absent or justified"),
    (PERMISSIONS_READ, "View permissions", "View roles, permissions and overrides"),
    (PERMISSIONS_MANAGE, "Manage permissions", "Edit role baselines and user overrides"),
];

/// Closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Director,
    Secretary,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Director,
        Role::Secretary,
        Role::Teacher,
        Role::Student,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Director => "director",
            Role::Secretary => "secretary",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "director" => Some(Role::Director),
            "secretary" => Some(Role::Secretary),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Baseline permissions installed for this role by `admin init`.
    #[must_use]
    pub fn default_baseline(self) -> &'static [&'static str] {
        match self {
            Role::Admin => &[],
            Role::Director => &[
                UNITS_READ,
                UNITS_WRITE,
                STAFF_READ,
                STAFF_WRITE,
                STUDENTS_READ,
                STUDENTS_WRITE,
                COURSES_READ,
                COURSES_WRITE,
                CLASSES_READ,
                CLASSES_WRITE,
                ATTENDANCE_READ,
                ATTENDANCE_WRITE,
                PERMISSIONS_READ,
            ],
            Role::Secretary => &[
                UNITS_READ,
                STAFF_READ,
                STUDENTS_READ,
                STUDENTS_WRITE,
                COURSES_READ,
                CLASSES_READ,
                CLASSES_WRITE,
                ATTENDANCE_READ,
                ATTENDANCE_WRITE,
            ],
            Role::Teacher => &[
                UNITS_READ,
                STUDENTS_READ,
                COURSES_READ,
                CLASSES_READ,
                ATTENDANCE_READ,
                ATTENDANCE_WRITE,
            ],
            Role::Student => &[COURSES_READ],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// A set of permission names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has(&self, required: &str) -> bool {
        self.0.contains(required)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    pub fn remove(&mut self, name: &str) {
        self.0.remove(name);
    }

    #[must_use]
    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        PermissionSet(self.0.union(&other.0).cloned().collect())
    }

    #[must_use]
    pub fn difference(&self, other: &PermissionSet) -> PermissionSet {
        PermissionSet(self.0.difference(&other.0).cloned().collect())
    }

    #[must_use]
    pub fn is_superset(&self, other: &PermissionSet) -> bool {
        self.0.is_superset(&other.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        PermissionSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

/// Per-user exception to the role baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    pub permission: String,
    pub is_granted: bool,
}

/// Computes the effective permission set of a user.
///
/// Admins get the whole catalog no matter what the tables say. Everyone else
/// starts from their role baseline, loses denied permissions, and then gains
/// granted ones, so a grant always wins over a deny for the same name.
#[must_use]
pub fn resolve(
    role: Role,
    baseline: &PermissionSet,
    overrides: &[PermissionOverride],
    catalog: &PermissionSet,
) -> PermissionSet {
    if role.is_admin() {
        let builtin: PermissionSet = BUILTIN_PERMISSIONS.iter().map(|(name, _, _)| *name).collect();
        return catalog.union(&builtin);
    }

    let denies: PermissionSet = overrides
        .iter()
        .filter(|o| !o.is_granted)
        .map(|o| o.permission.clone())
        .collect();
    let grants: PermissionSet = overrides
        .iter()
        .filter(|o| o.is_granted)
        .map(|o| o.permission.clone())
        .collect();

    baseline.difference(&denies).union(&grants)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> PermissionSet {
        names.iter().copied().collect()
    }

    fn grant(name: &str) -> PermissionOverride {
        PermissionOverride {
            permission: name.to_string(),
            is_granted: true,
        }
    }

    fn deny(name: &str) -> PermissionOverride {
        PermissionOverride {
            permission: name.to_string(),
            is_granted: false,
        }
    }

    #[test]
    fn test_resolve_baseline_only() {
        let baseline = set(&[COURSES_READ, CLASSES_READ]);
        let resolved = resolve(Role::Teacher, &baseline, &[], &PermissionSet::new());
        assert_eq!(resolved, baseline);
    }

    #[test]
    fn test_resolve_deny_removes_and_grant_adds() {
        let baseline = set(&[COURSES_READ, CLASSES_READ, ATTENDANCE_WRITE]);
        let overrides = [deny(ATTENDANCE_WRITE), grant(STUDENTS_WRITE)];
        let resolved = resolve(Role::Teacher, &baseline, &overrides, &PermissionSet::new());

        assert!(resolved.has(COURSES_READ));
        assert!(resolved.has(CLASSES_READ));
        assert!(!resolved.has(ATTENDANCE_WRITE));
        assert!(resolved.has(STUDENTS_WRITE));
    }

    #[test]
    fn test_resolve_grant_wins_over_deny() {
        let overrides = [deny(STAFF_READ), grant(STAFF_READ)];
        let resolved = resolve(Role::Secretary, &PermissionSet::new(), &overrides, &PermissionSet::new());
        assert!(resolved.has(STAFF_READ));
    }

    #[test]
    fn test_resolve_admin_ignores_tables() {
        let catalog = set(&["reports:export"]);
        let overrides = [deny(UNITS_READ), deny(PERMISSIONS_MANAGE)];
        let resolved = resolve(Role::Admin, &PermissionSet::new(), &overrides, &catalog);

        assert!(resolved.has("reports:export"));
        for (name, _, _) in BUILTIN_PERMISSIONS {
            assert!(resolved.has(name), "admin missing {name}");
        }
    }

    #[test]
    fn test_resolve_empty_baseline_fails_closed() {
        let resolved = resolve(Role::Student, &PermissionSet::new(), &[], &set(&[COURSES_READ]));
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_resolve_matches_set_formula() {
        let baseline = set(&[UNITS_READ, STAFF_READ, STUDENTS_READ]);
        let overrides = [deny(STAFF_READ), grant(COURSES_WRITE)];
        let resolved = resolve(Role::Director, &baseline, &overrides, &PermissionSet::new());

        let expected = baseline.difference(&set(&[STAFF_READ])).union(&set(&[COURSES_WRITE]));
        assert!(resolved.is_superset(&expected));
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("janitor"), None);
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn test_default_baselines_use_builtin_names() {
        for role in Role::ALL {
            for name in role.default_baseline() {
                assert!(
                    BUILTIN_PERMISSIONS.iter().any(|(n, _, _)| n == name),
                    "{role} baseline has unknown permission {name}"
                );
            }
        }
    }
}
