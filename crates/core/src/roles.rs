//! Wiki membership roles and the capabilities they grant.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Membership role, in ascending order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WikiRole {
    Reader,
    Writer,
    Admin,
    SuperAdmin,
}

impl WikiRole {
    /// Every role, lowest first.
    pub const ALL: [WikiRole; 4] = [
        WikiRole::Reader,
        WikiRole::Writer,
        WikiRole::Admin,
        WikiRole::SuperAdmin,
    ];

    /// Wire name (`"SuperAdmin"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reader => "Reader",
            Self::Writer => "Writer",
            Self::Admin => "Admin",
            Self::SuperAdmin => "SuperAdmin",
        }
    }

    /// Human-readable label (`"Super Admin"`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for WikiRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an actor may do in a wiki.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Read pages and history.
    pub can_view: bool,
    /// Create, edit, delete and restore pages.
    pub can_write: bool,
    /// Change settings, invite users and manage members.
    pub can_admin: bool,
}

impl Capabilities {
    /// Nothing allowed; what a non-member gets.
    pub const NONE: Capabilities = Capabilities {
        can_view: false,
        can_write: false,
        can_admin: false,
    };
}

/// Capabilities granted by a role: every member can view, Writer and above
/// can write, Admin and above can administer.
pub fn capabilities(role: WikiRole) -> Capabilities {
    Capabilities {
        can_view: true,
        can_write: role >= WikiRole::Writer,
        can_admin: role >= WikiRole::Admin,
    }
}

/// Capabilities of `actor` given a wiki's membership map. Non-members get
/// none; public read access is decided by the server.
pub fn capabilities_for(members: &HashMap<String, WikiRole>, actor: &str) -> Capabilities {
    members
        .get(actor)
        .map_or(Capabilities::NONE, |role| capabilities(*role))
}

// ---------------------------------------------------------------------------
// Member management
// ---------------------------------------------------------------------------

/// A change to one wiki membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberAction {
    Add,
    Remove,
    Update,
}

impl MemberAction {
    /// Wire name (`"add"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for MemberAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles an actor with `actor_role` may hand out.
pub fn assignable_roles(actor_role: WikiRole) -> Vec<WikiRole> {
    match actor_role {
        WikiRole::SuperAdmin => WikiRole::ALL.to_vec(),
        WikiRole::Admin => vec![WikiRole::Reader, WikiRole::Writer, WikiRole::Admin],
        WikiRole::Reader | WikiRole::Writer => Vec::new(),
    }
}

/// Local precondition for a membership change.
///
/// Mirrors the rules the server enforces so the client can refuse early:
/// the actor must be Admin or above and may not target themself; only a
/// SuperAdmin may grant or revoke SuperAdmin or touch an Admin; SuperAdmins
/// are never removed.
pub fn check_member_change(
    members: &HashMap<String, WikiRole>,
    actor: &str,
    member_id: &str,
    action: MemberAction,
    role: Option<WikiRole>,
) -> Result<(), CoreError> {
    let actor_role = members
        .get(actor)
        .copied()
        .ok_or_else(|| CoreError::Forbidden("Not a member of this wiki".into()))?;
    if actor_role < WikiRole::Admin {
        return Err(CoreError::Forbidden(
            "Only admins can manage members".into(),
        ));
    }
    if actor == member_id {
        return Err(CoreError::Forbidden("You cannot change your own role".into()));
    }

    let target_role = members.get(member_id).copied();
    let is_super = actor_role == WikiRole::SuperAdmin;

    match (action, target_role) {
        (MemberAction::Add, Some(_)) => {
            return Err(CoreError::Conflict(format!(
                "{member_id} is already a member"
            )))
        }
        (MemberAction::Update | MemberAction::Remove, None) => {
            return Err(CoreError::NotFound {
                entity: "Member",
                id: member_id.to_string(),
            })
        }
        _ => {}
    }

    if !is_super && target_role.is_some_and(|r| r >= WikiRole::Admin) {
        return Err(CoreError::Forbidden(
            "Only a super admin can modify an admin".into(),
        ));
    }

    match action {
        MemberAction::Remove => {
            if target_role == Some(WikiRole::SuperAdmin) {
                return Err(CoreError::Forbidden(
                    "A super admin cannot be removed".into(),
                ));
            }
        }
        MemberAction::Add | MemberAction::Update => {
            let role = role.ok_or_else(|| {
                CoreError::Validation(format!("A role is required to {action} a member"))
            })?;
            if !assignable_roles(actor_role).contains(&role) {
                return Err(CoreError::Forbidden(format!(
                    "Only a super admin can grant {role}"
                )));
            }
        }
    }

    Ok(())
}

/// Members ordered for admin listings: highest role first, then by id.
pub fn members_by_priority(members: &HashMap<String, WikiRole>) -> Vec<(&str, WikiRole)> {
    let mut sorted: Vec<(&str, WikiRole)> = members
        .iter()
        .map(|(id, role)| (id.as_str(), *role))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
