// Who may run the admin-gated commands.
//
// The Discord layer extracts the member's permission bits and role ids and
// asks this policy; nothing here depends on serenity types.

/// What the Discord layer could learn about the invoking member.
#[derive(Debug, Clone, Default)]
pub struct MemberAccess {
    pub is_administrator: bool,
    pub can_manage_guild: bool,
    pub role_ids: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admin_role_ids: Vec<u64>,
}

impl AccessPolicy {
    pub fn new(admin_role_ids: Vec<u64>) -> Self {
        Self { admin_role_ids }
    }

    /// Administrators and server managers always pass. Otherwise the member
    /// needs one of the configured admin roles.
    pub fn is_economy_admin(&self, member: &MemberAccess) -> bool {
        member.is_administrator
            || member.can_manage_guild
            || member
                .role_ids
                .iter()
                .any(|role| self.admin_role_ids.contains(role))
    }
}
