use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::GatewayError;

// Contact form body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
}

impl ContactSubmission {
    // Checks required fields and turns the submission into a store row
    pub fn into_row(self) -> Result<ContactMessageRow, GatewayError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();

        if name.is_empty() {
            return Err(GatewayError::Validation("name is required".into()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(GatewayError::Validation("a valid email is required".into()));
        }
        if message.is_empty() {
            return Err(GatewayError::Validation("message is required".into()));
        }

        Ok(ContactMessageRow {
            name: name.to_string(),
            email: email.to_string(),
            subject: self.subject.trim().to_string(),
            message: message.to_string(),
            status: MessageStatus::Unread,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Unread,
}

// Row inserted into the contact_messages table
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContactMessageRow {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: MessageStatus,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ContactAccepted {
    pub status: String,
    pub remaining: u32,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RemainingResponse {
    pub client: String,
    pub remaining: u32,
    pub limit: u32,
}

// Queued job - row + channel the worker answers on
pub struct ForwardJob {
    pub row: ContactMessageRow,
    pub response_tx: oneshot::Sender<Result<(), GatewayError>>,
}
