//! Port for the member collection.

use async_trait::async_trait;

use crate::domain::{Member, MemberDraft, MemberId};

use super::GatewayError;

/// Member records; staff only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Every member.
    async fn list_members(&self) -> Result<Vec<Member>, GatewayError>;

    /// One member.
    async fn find_member(&self, id: MemberId) -> Result<Member, GatewayError>;

    /// Register a member; the backend assigns the id and start date.
    async fn create_member(&self, draft: &MemberDraft) -> Result<Member, GatewayError>;

    /// Replace a member's details.
    async fn update_member(&self, id: MemberId, draft: &MemberDraft)
    -> Result<Member, GatewayError>;

    /// Remove a member.
    async fn delete_member(&self, id: MemberId) -> Result<(), GatewayError>;
}
