use serde::{Deserialize, Serialize};

use crate::store::{PayrollRecord, Role, UserRecord};

/// A user as exposed over the API: the stored record minus `password` and
/// the verification token fields.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    pub created_at: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub profile_picture: Option<String>,
    pub department: String,
    pub position: String,
    pub phone: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub payroll_history: Vec<PayrollRecord>,
}

impl From<UserRecord> for PublicUser {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            created_at: user.created_at,
            is_active: user.is_active,
            email_verified: user.email_verified,
            profile_picture: user.profile_picture,
            department: user.department,
            position: user.position,
            phone: user.phone,
            emergency_contact_name: user.emergency_contact_name,
            emergency_contact_phone: user.emergency_contact_phone,
            payroll_history: user.payroll_history,
        }
    }
}

/// Admin-created user; `role` defaults to a regular user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub profile_picture: String,
}
