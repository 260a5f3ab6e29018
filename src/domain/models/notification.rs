/// Outbound mail jobs consumed by the background notifier worker.
#[derive(Debug, Clone)]
pub enum Notification {
    InvitationAccepted {
        owner_id: String,
        enterprise_name: String,
        accepted_user_email: String,
        accepted_user_name: String,
        role: String,
    },
    UserCreated {
        recipient: String,
        enterprise_name: String,
        inviter_name: String,
    },
}
