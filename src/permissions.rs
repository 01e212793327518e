//! Permission vocabulary, role defaults, and the checks route guards use.
//!
//! Permissions are `resource:action` strings on the wire. Admins pass every
//! check regardless of the permissions stored on their account.

use serde::{Deserialize, Serialize};

/// Account role. Serialized with the display names the frontend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    Admin,
    #[default]
    #[serde(rename = "Sales Executive")]
    SalesExecutive,
    #[serde(rename = "Service Engineer")]
    ServiceEngineer,
    #[serde(rename = "Project Manager")]
    ProjectManager,
    Accounts,
    Manager,
    Technician,
    Accountant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::SalesExecutive => "Sales Executive",
            Role::ServiceEngineer => "Service Engineer",
            Role::ProjectManager => "Project Manager",
            Role::Accounts => "Accounts",
            Role::Manager => "Manager",
            Role::Technician => "Technician",
            Role::Accountant => "Accountant",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ROLES.iter().copied().find(|r| r.as_str() == raw)
    }
}

const ROLES: [Role; 8] = [
    Role::Admin,
    Role::SalesExecutive,
    Role::ServiceEngineer,
    Role::ProjectManager,
    Role::Accounts,
    Role::Manager,
    Role::Technician,
    Role::Accountant,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "dashboard:view")]
    DashboardView,
    #[serde(rename = "leads:view")]
    LeadsView,
    #[serde(rename = "leads:create")]
    LeadsCreate,
    #[serde(rename = "leads:edit")]
    LeadsEdit,
    #[serde(rename = "leads:delete")]
    LeadsDelete,
    #[serde(rename = "quotations:view")]
    QuotationsView,
    #[serde(rename = "quotations:create")]
    QuotationsCreate,
    #[serde(rename = "quotations:approve")]
    QuotationsApprove,
    #[serde(rename = "projects:view")]
    ProjectsView,
    #[serde(rename = "projects:create")]
    ProjectsCreate,
    #[serde(rename = "projects:assign")]
    ProjectsAssign,
    #[serde(rename = "amc:view")]
    AmcView,
    #[serde(rename = "amc:update")]
    AmcUpdate,
    #[serde(rename = "users:view")]
    UsersView,
    #[serde(rename = "users:manage")]
    UsersManage,
    #[serde(rename = "reports:view")]
    ReportsView,
    #[serde(rename = "settings:manage")]
    SettingsManage,
    #[serde(rename = "form_submissions:view")]
    FormSubmissionsView,
    #[serde(rename = "form_submissions:delete")]
    FormSubmissionsDelete,
    #[serde(rename = "demo_requests:view")]
    DemoRequestsView,
    #[serde(rename = "demo_requests:delete")]
    DemoRequestsDelete,
}

impl Permission {
    pub const ALL: [Permission; 21] = [
        Permission::DashboardView,
        Permission::LeadsView,
        Permission::LeadsCreate,
        Permission::LeadsEdit,
        Permission::LeadsDelete,
        Permission::QuotationsView,
        Permission::QuotationsCreate,
        Permission::QuotationsApprove,
        Permission::ProjectsView,
        Permission::ProjectsCreate,
        Permission::ProjectsAssign,
        Permission::AmcView,
        Permission::AmcUpdate,
        Permission::UsersView,
        Permission::UsersManage,
        Permission::ReportsView,
        Permission::SettingsManage,
        Permission::FormSubmissionsView,
        Permission::FormSubmissionsDelete,
        Permission::DemoRequestsView,
        Permission::DemoRequestsDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::DashboardView => "dashboard:view",
            Permission::LeadsView => "leads:view",
            Permission::LeadsCreate => "leads:create",
            Permission::LeadsEdit => "leads:edit",
            Permission::LeadsDelete => "leads:delete",
            Permission::QuotationsView => "quotations:view",
            Permission::QuotationsCreate => "quotations:create",
            Permission::QuotationsApprove => "quotations:approve",
            Permission::ProjectsView => "projects:view",
            Permission::ProjectsCreate => "projects:create",
            Permission::ProjectsAssign => "projects:assign",
            Permission::AmcView => "amc:view",
            Permission::AmcUpdate => "amc:update",
            Permission::UsersView => "users:view",
            Permission::UsersManage => "users:manage",
            Permission::ReportsView => "reports:view",
            Permission::SettingsManage => "settings:manage",
            Permission::FormSubmissionsView => "form_submissions:view",
            Permission::FormSubmissionsDelete => "form_submissions:delete",
            Permission::DemoRequestsView => "demo_requests:view",
            Permission::DemoRequestsDelete => "demo_requests:delete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == raw)
    }

    /// "Leads View", "AMC Update", ...
    pub fn label(&self) -> String {
        let (resource, action) = self.as_str().split_once(':').unwrap_or((self.as_str(), ""));
        let resource = match resource {
            "amc" => "AMC".to_string(),
            other => title_case(&other.replace('_', " ")),
        };
        format!("{} {}", resource, title_case(action))
    }
}

fn title_case(raw: &str) -> String {
    raw.split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pseudo-permissions older clients still send; stripped before validation.
pub const LEGACY_PSEUDO_PERMISSIONS: [&str; 2] = ["form_submissions:update", "demo_requests:update"];

#[derive(Debug, Clone, Serialize)]
pub struct PermissionEntry {
    pub key: Permission,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionGroup {
    pub label: &'static str,
    pub permissions: Vec<PermissionEntry>,
}

/// Permission groups in the order the user-management screen renders them.
pub fn permission_groups() -> Vec<PermissionGroup> {
    let groups: [(&'static str, &[Permission]); 10] = [
        ("Dashboard", &[Permission::DashboardView]),
        (
            "Leads",
            &[
                Permission::LeadsView,
                Permission::LeadsCreate,
                Permission::LeadsEdit,
                Permission::LeadsDelete,
            ],
        ),
        (
            "Quotations",
            &[
                Permission::QuotationsView,
                Permission::QuotationsCreate,
                Permission::QuotationsApprove,
            ],
        ),
        (
            "Projects",
            &[
                Permission::ProjectsView,
                Permission::ProjectsCreate,
                Permission::ProjectsAssign,
            ],
        ),
        ("AMC & Services", &[Permission::AmcView, Permission::AmcUpdate]),
        ("Users", &[Permission::UsersView, Permission::UsersManage]),
        ("Reports", &[Permission::ReportsView]),
        ("Settings", &[Permission::SettingsManage]),
        (
            "Form Submissions",
            &[
                Permission::FormSubmissionsView,
                Permission::FormSubmissionsDelete,
            ],
        ),
        (
            "Demo Requests",
            &[
                Permission::DemoRequestsView,
                Permission::DemoRequestsDelete,
            ],
        ),
    ];

    groups
        .iter()
        .map(|&(label, perms)| PermissionGroup {
            label,
            permissions: perms
                .iter()
                .map(|p| PermissionEntry {
                    key: *p,
                    label: p.label(),
                })
                .collect(),
        })
        .collect()
}

/// Permissions a freshly created or approved account receives for `role`.
pub fn default_permissions(role: Role) -> Vec<Permission> {
    use Permission::*;
    match role {
        Role::Admin => Permission::ALL.to_vec(),
        Role::SalesExecutive => vec![
            DashboardView,
            LeadsView,
            LeadsCreate,
            LeadsEdit,
            QuotationsView,
            QuotationsCreate,
            ProjectsView,
            AmcView,
        ],
        Role::ServiceEngineer => vec![DashboardView, ProjectsView, AmcView, AmcUpdate],
        Role::ProjectManager => vec![
            DashboardView,
            ProjectsView,
            ProjectsCreate,
            ProjectsAssign,
            QuotationsView,
            QuotationsApprove,
        ],
        Role::Accounts | Role::Manager | Role::Technician | Role::Accountant => Vec::new(),
    }
}

/// Validate a permission list sent by a client.
///
/// Legacy pseudo-permissions are dropped silently; any other unknown string
/// is returned as the error so the caller can report it.
pub fn parse_permission_list(raw: &[String]) -> Result<Vec<Permission>, Vec<String>> {
    let mut parsed = Vec::new();
    let mut invalid = Vec::new();
    for entry in raw {
        if LEGACY_PSEUDO_PERMISSIONS.contains(&entry.as_str()) {
            continue;
        }
        match Permission::parse(entry) {
            Some(p) if !parsed.contains(&p) => parsed.push(p),
            Some(_) => {}
            None => invalid.push(entry.clone()),
        }
    }
    if invalid.is_empty() {
        Ok(parsed)
    } else {
        Err(invalid)
    }
}

pub fn has(role: Role, granted: &[Permission], required: Permission) -> bool {
    role == Role::Admin || granted.contains(&required)
}

pub fn has_any(role: Role, granted: &[Permission], required: &[Permission]) -> bool {
    role == Role::Admin || required.iter().any(|p| granted.contains(p))
}

pub fn has_all(role: Role, granted: &[Permission], required: &[Permission]) -> bool {
    role == Role::Admin || required.iter().all(|p| granted.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_strings_round_trip_through_serde() {
        for p in Permission::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.as_str()));
            assert_eq!(Permission::parse(p.as_str()), Some(p));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Permission::LeadsView.label(), "Leads View");
        assert_eq!(Permission::AmcUpdate.label(), "AMC Update");
        assert_eq!(
            Permission::FormSubmissionsDelete.label(),
            "Form Submissions Delete"
        );
    }

    #[test]
    fn test_groups_cover_every_permission_once() {
        let listed: Vec<Permission> = permission_groups()
            .into_iter()
            .flat_map(|g| g.permissions.into_iter().map(|e| e.key))
            .collect();
        assert_eq!(listed.len(), Permission::ALL.len());
        for p in Permission::ALL {
            assert!(listed.contains(&p), "{} missing from groups", p.as_str());
        }
    }

    #[test]
    fn test_role_defaults() {
        assert_eq!(default_permissions(Role::Admin).len(), 21);
        assert_eq!(
            default_permissions(Role::ServiceEngineer),
            vec![
                Permission::DashboardView,
                Permission::ProjectsView,
                Permission::AmcView,
                Permission::AmcUpdate
            ]
        );
        assert!(default_permissions(Role::SalesExecutive).contains(&Permission::LeadsEdit));
        assert!(!default_permissions(Role::SalesExecutive).contains(&Permission::LeadsDelete));
        assert!(default_permissions(Role::Technician).is_empty());
    }

    #[test]
    fn test_admin_bypasses_checks() {
        assert!(has(Role::Admin, &[], Permission::UsersManage));
        assert!(has_all(Role::Admin, &[], &Permission::ALL));
        assert!(!has(Role::Manager, &[], Permission::UsersManage));
    }

    #[test]
    fn test_any_and_all() {
        let granted = [Permission::LeadsView, Permission::LeadsEdit];
        assert!(has_any(
            Role::SalesExecutive,
            &granted,
            &[Permission::LeadsDelete, Permission::LeadsEdit]
        ));
        assert!(!has_all(
            Role::SalesExecutive,
            &granted,
            &[Permission::LeadsDelete, Permission::LeadsEdit]
        ));
    }

    #[test]
    fn test_parse_permission_list_filters_legacy_entries() {
        let raw = vec![
            "leads:view".to_string(),
            "form_submissions:update".to_string(),
            "demo_requests:update".to_string(),
            "leads:view".to_string(),
        ];
        assert_eq!(parse_permission_list(&raw), Ok(vec![Permission::LeadsView]));

        let bad = vec!["leads:view".to_string(), "leads:fly".to_string()];
        assert_eq!(parse_permission_list(&bad), Err(vec!["leads:fly".to_string()]));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Project Manager"), Some(Role::ProjectManager));
        assert_eq!(Role::parse("Janitor"), None);
    }
}
