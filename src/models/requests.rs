use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to parse a subject line without booking anything
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ParseSubjectRequest {
    #[validate(length(min = 1))]
    pub subject: String,
}

/// Inbound email forwarded by the mail provider's webhook
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InboundEmailRequest {
    #[validate(length(min = 1))]
    pub subject: String,
    #[serde(default)]
    pub from: String,
    /// `Message-ID` header, used to drop redeliveries
    #[serde(default, alias = "messageId")]
    pub message_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_subject_rejected() {
        let req = InboundEmailRequest {
            subject: String::new(),
            from: "me@example.com".to_string(),
            message_id: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_from_is_optional() {
        let req: InboundEmailRequest = serde_json::from_str(r#"{"subject":"BOOK Yoga 18:00"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.from, "");
        assert!(req.message_id.is_none());
    }

    #[test]
    fn test_message_id_accepts_camel_case() {
        let req: InboundEmailRequest =
            serde_json::from_str(r#"{"subject":"BOOK Yoga 18:00","messageId":"<abc@mail>"}"#).unwrap();
        assert_eq!(req.message_id.as_deref(), Some("<abc@mail>"));
    }
}
