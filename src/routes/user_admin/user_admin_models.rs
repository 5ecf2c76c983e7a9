use serde::{Deserialize, Serialize};

use crate::models::user::{Role, UserUpdate};

// Body of PUT /api-users/{id}. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub position: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Option<Role>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(request: UpdateUserRequest) -> Self {
        UserUpdate {
            position: request.position,
            profile_image_url: request.profile_image_url,
            role: request.role,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserResponse {
    pub success: bool,
    pub message: String,
    pub updated_fields: Vec<&'static str>,
}
