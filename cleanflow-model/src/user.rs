#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::UserID;

/// Authenticated staff member (cleaner or auditor)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct User {
    pub id: UserID,
    pub display_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<UserID>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
