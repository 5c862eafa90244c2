use serde::{Deserialize, Serialize};

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

/// Prefix under which every store route is mounted.
pub const API_PREFIX: &str = "/api";

pub const SERVICE_NAME: &str = "Smart Reminders API";

// Reminders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDto {
    pub id: String,
    pub text: String,
    pub interval_minutes: i32,
    pub is_active: bool,
    pub created_at: String, // RFC3339 UTC
    pub updated_at: String, // RFC3339 UTC
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReminderReq {
    pub text: String,
    pub interval_minutes: i32,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReminderReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreateReminderReq {
    pub fn validate(&self) -> Result<(), String> {
        validate_text(&self.text)?;
        validate_interval(self.interval_minutes)
    }
}

impl UpdateReminderReq {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(t) = &self.text {
            validate_text(t)?;
        }
        if let Some(m) = self.interval_minutes {
            validate_interval(m)?;
        }
        Ok(())
    }
}

fn validate_text(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("text must not be empty".into());
    }
    Ok(())
}

fn validate_interval(minutes: i32) -> Result<(), String> {
    if minutes < 1 {
        return Err("interval_minutes must be at least 1".into());
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResp {
    pub message: String,
}

// Health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub timestamp: String, // RFC3339 UTC
    pub service: String,
}

// Legacy status checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheckCreateReq {
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheckDto {
    pub id: String,
    pub client_name: String,
    pub timestamp: String, // RFC3339 UTC
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_validation() {
        let ok = CreateReminderReq {
            text: "Take a break".into(),
            interval_minutes: 5,
        };
        assert!(ok.validate().is_ok());
        let blank = CreateReminderReq {
            text: "  ".into(),
            interval_minutes: 5,
        };
        assert!(blank.validate().is_err());
        let zero = CreateReminderReq {
            text: "x".into(),
            interval_minutes: 0,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn update_skips_absent_fields() {
        let req = UpdateReminderReq {
            is_active: Some(true),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"is_active":true}"#);
        let parsed: UpdateReminderReq = serde_json::from_str("{}").unwrap();
        assert!(parsed.text.is_none() && parsed.interval_minutes.is_none());
    }
}
