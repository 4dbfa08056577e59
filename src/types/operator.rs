//! Caller identity
//!
//! The core never looks identity up from ambient context; every operation
//! takes the [`Operator`] performing it as an explicit parameter and trusts
//! it (authentication happens outside this crate).

use crate::types::card::UserId;

/// Role granted to an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May administer cards, limits, and query any ledger entry
    Admin,
    /// May operate only on their own cards
    User,
}

/// The identity on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub id: UserId,
    pub roles: Vec<Role>,
}

impl Operator {
    /// An operator holding only the User role
    pub fn user(id: UserId) -> Self {
        Operator {
            id,
            roles: vec![Role::User],
        }
    }

    /// An operator holding the Admin role
    pub fn admin(id: UserId) -> Self {
        Operator {
            id,
            roles: vec![Role::Admin],
        }
    }

    /// Whether this operator holds the Admin role
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}
