use bytes::Bytes;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::TrackingError,
    geopoint::GeoPoint,
    order::{OrderId, UserId},
};

const MAX_EXTENSION_LEN: usize = 8;

/// Photographic (or other) evidence attached to a bypass report.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Evidence {
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }

    /// Taken from the file name when it looks sane, otherwise derived from
    /// the content type.
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .filter(|extension| {
                !extension.is_empty()
                    && extension.len() <= MAX_EXTENSION_LEN
                    && extension.chars().all(|c| c.is_ascii_alphanumeric())
            });

        if let Some(extension) = from_name {
            return extension;
        }

        match self.content_type() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/heic" => "heic",
            "image/gif" => "gif",
            "application/pdf" => "pdf",
            _ => "bin",
        }
        .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct BypassSubmission {
    pub order_id: OrderId,
    pub reason: String,
    pub notes: Option<String>,
    pub position: Option<GeoPoint>,
    pub evidence: Evidence,
}

impl BypassSubmission {
    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.reason.trim().is_empty() {
            return Err(TrackingError::Validation(
                "reason must not be empty".to_string(),
            ));
        }

        if self.evidence.bytes.is_empty() {
            return Err(TrackingError::Validation(
                "evidence file must not be empty".to_string(),
            ));
        }

        match self.position {
            Some(position) if !position.is_valid() => {
                return Err(TrackingError::Validation(format!(
                    "position {position} is outside the valid coordinate range"
                )));
            }
            _ => {}
        }

        Ok(())
    }

    pub fn notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string)
    }
}

/// A driver's manual override of automated route tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BypassReport {
    pub id: Uuid,
    pub order_id: OrderId,
    pub driver_id: UserId,
    pub reason: String,
    pub notes: Option<String>,
    pub evidence_url: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: Timestamp,
}

/// Object key of the evidence, scoped by order.
pub fn evidence_path(order_id: &OrderId, report_id: &Uuid, evidence: &Evidence) -> String {
    format!("{}/{}.{}", order_id, report_id, evidence.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(file_name: Option<&str>, content_type: Option<&str>) -> Evidence {
        Evidence {
            file_name: file_name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(b"\xff\xd8\xff"),
        }
    }

    fn submission() -> BypassSubmission {
        BypassSubmission {
            order_id: OrderId::from("order-1"),
            reason: "Road closed".to_string(),
            notes: None,
            position: None,
            evidence: evidence(Some("photo.jpg"), Some("image/jpeg")),
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(evidence(Some("IMG_001.JPEG"), None).extension(), "jpeg");
        assert_eq!(evidence(Some("photo"), Some("image/png")).extension(), "png");
        assert_eq!(
            evidence(Some("../../etc/passwd"), Some("image/webp")).extension(),
            "webp"
        );
        assert_eq!(evidence(None, None).extension(), "bin");
    }

    #[test]
    fn test_evidence_path() {
        let report_id = Uuid::nil();
        let path = evidence_path(
            &OrderId::from("order-1"),
            &report_id,
            &evidence(Some("photo.png"), None),
        );

        assert_eq!(path, "order-1/00000000-0000-0000-0000-000000000000.png");
    }

    #[test]
    fn test_validate_accepts_complete_submission() {
        assert!(submission().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_reason() {
        let submission = BypassSubmission {
            reason: "  ".to_string(),
            ..submission()
        };

        assert!(matches!(
            submission.validate(),
            Err(TrackingError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_file() {
        let mut submission = submission();
        submission.evidence.bytes = Bytes::new();

        assert!(matches!(
            submission.validate(),
            Err(TrackingError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_invalid_position() {
        let submission = BypassSubmission {
            position: Some(GeoPoint::new(123.0, 0.0)),
            ..submission()
        };

        assert!(matches!(
            submission.validate(),
            Err(TrackingError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let submission = BypassSubmission {
            notes: Some("   ".to_string()),
            ..submission()
        };
        assert_eq!(submission.notes(), None);

        let submission = BypassSubmission {
            notes: Some(" gate locked ".to_string()),
            ..self::submission()
        };
        assert_eq!(submission.notes(), Some("gate locked".to_string()));
    }
}
