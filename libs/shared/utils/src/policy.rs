use thiserror::Error;

use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

/// Every operation a caller can invoke, named once so role gating lives in a
/// single place instead of per-handler predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateSlot,
    UpdateSlot,
    DeleteSlot,
    ListOwnSlots,
    ListOpenSlots,
    RequestConsultation,
    DecideConsultation,
    CancelConsultation,
    ListSpecialistConsultations,
    ListClientConsultations,
    BlockUser,
    UnblockUser,
}

/// Relation between the caller and the record the action touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOwnership {
    /// No per-record owner involved (creation, listing).
    None,
    /// The target record belongs to the caller.
    Owned,
    /// The target record belongs to someone else.
    Foreign,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Your account is blocked")]
    Blocked,
    #[error("Operation requires the {0} role")]
    RoleRequired(UserRole),
    #[error("You are not the owner of this record")]
    NotOwner,
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        AppError::Forbidden(err.to_string())
    }
}

fn required_role(action: Action) -> UserRole {
    match action {
        Action::CreateSlot
        | Action::UpdateSlot
        | Action::DeleteSlot
        | Action::ListOwnSlots
        | Action::DecideConsultation
        | Action::ListSpecialistConsultations => UserRole::Specialist,

        Action::ListOpenSlots
        | Action::RequestConsultation
        | Action::CancelConsultation
        | Action::ListClientConsultations => UserRole::Client,

        Action::BlockUser | Action::UnblockUser => UserRole::Admin,
    }
}

/// The one allow/deny decision point. Callers compute `ownership` from the
/// record they loaded and must not apply further role checks of their own.
pub fn authorize(
    actor: &User,
    action: Action,
    ownership: TargetOwnership,
) -> Result<(), PolicyError> {
    if actor.is_blocked {
        return Err(PolicyError::Blocked);
    }

    let required = required_role(action);
    if actor.role != required {
        return Err(PolicyError::RoleRequired(required));
    }

    if ownership == TargetOwnership::Foreign {
        return Err(PolicyError::NotOwner);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            role,
            is_blocked: false,
        }
    }

    #[test]
    fn specialist_actions_denied_for_client() {
        let client = user(UserRole::Client);
        let err = authorize(&client, Action::CreateSlot, TargetOwnership::None).unwrap_err();
        assert_eq!(err, PolicyError::RoleRequired(UserRole::Specialist));
    }

    #[test]
    fn client_actions_denied_for_specialist() {
        let specialist = user(UserRole::Specialist);
        let err =
            authorize(&specialist, Action::RequestConsultation, TargetOwnership::None).unwrap_err();
        assert_eq!(err, PolicyError::RoleRequired(UserRole::Client));
    }

    #[test]
    fn admin_cannot_act_as_specialist() {
        let admin = user(UserRole::Admin);
        assert!(authorize(&admin, Action::CreateSlot, TargetOwnership::None).is_err());
        assert!(authorize(&admin, Action::BlockUser, TargetOwnership::None).is_ok());
    }

    #[test]
    fn foreign_ownership_is_denied() {
        let client = user(UserRole::Client);
        let err =
            authorize(&client, Action::CancelConsultation, TargetOwnership::Foreign).unwrap_err();
        assert_eq!(err, PolicyError::NotOwner);
    }

    #[test]
    fn owned_target_is_allowed() {
        let specialist = user(UserRole::Specialist);
        assert!(authorize(&specialist, Action::DecideConsultation, TargetOwnership::Owned).is_ok());
    }

    #[test]
    fn blocked_actor_is_denied_everything() {
        let mut specialist = user(UserRole::Specialist);
        specialist.is_blocked = true;
        let err = authorize(&specialist, Action::CreateSlot, TargetOwnership::None).unwrap_err();
        assert_eq!(err, PolicyError::Blocked);
    }
}
