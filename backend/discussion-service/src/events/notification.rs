use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailTemplate {
    Generic,
    AssetModerationRejected,
}

/// E-mail request consumed by the notification pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailNotification {
    pub template: EmailTemplate,
    pub user_email: String,
    pub subject: String,
    pub message: String,
    pub user_id: String,
}

impl EmailNotification {
    pub fn new(
        template: EmailTemplate,
        user_id: impl Into<String>,
        user_email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            template,
            user_email: user_email.into(),
            subject: subject.into(),
            message: message.into(),
            user_id: user_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_names() {
        let n = EmailNotification::new(
            EmailTemplate::AssetModerationRejected,
            "u-1",
            "u1@example.org",
            "Post refused by moderation",
            "Post has been refused by the moderation: hi",
        );
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["template"], "ASSET_MODERATION_REJECTED");
        assert_eq!(value["user_email"], "u1@example.org");

        let value = serde_json::to_value(EmailTemplate::Generic).unwrap();
        assert_eq!(value, "GENERIC");
    }
}
