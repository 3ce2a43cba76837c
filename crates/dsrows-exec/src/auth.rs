//! Edit permission checks.

use serde::{Deserialize, Serialize};

use dsrows_core::id::UserId;
use dsrows_core::schema::DataSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    SuperAdmin,
    #[default]
    User,
}

/// The authenticated user a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: UserId,
    pub user_type: UserType,
}

impl Caller {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            user_type: UserType::User,
        }
    }

    pub fn super_admin(user_id: UserId) -> Self {
        Self {
            user_id,
            user_type: UserType::SuperAdmin,
        }
    }
}

pub trait Authorizer: Send + Sync {
    fn can_edit(&self, caller: &Caller, data_set: &DataSet) -> bool;
}

/// Super admins edit everything; otherwise the owner and listed editors.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerAuthorizer;

impl Authorizer for OwnerAuthorizer {
    fn can_edit(&self, caller: &Caller, data_set: &DataSet) -> bool {
        caller.user_type == UserType::SuperAdmin
            || data_set.owner_id == caller.user_id
            || data_set.editors.contains(&caller.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsrows_core::id::DataSetId;

    fn owned_by(owner: u64) -> DataSet {
        DataSet::new(DataSetId::new(1), "Menu", UserId::new(owner))
    }

    #[test]
    fn owner_and_editors_may_edit() {
        let mut ds = owned_by(1);
        ds.editors.push(UserId::new(7));
        let auth = OwnerAuthorizer;
        assert!(auth.can_edit(&Caller::user(UserId::new(1)), &ds));
        assert!(auth.can_edit(&Caller::user(UserId::new(7)), &ds));
        assert!(!auth.can_edit(&Caller::user(UserId::new(2)), &ds));
    }

    #[test]
    fn super_admin_edits_anything() {
        assert!(OwnerAuthorizer.can_edit(&Caller::super_admin(UserId::new(99)), &owned_by(1)));
    }
}
