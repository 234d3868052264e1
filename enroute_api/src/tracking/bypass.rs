use std::sync::Arc;

use aide::{OperationInput, generate::GenContext, openapi::Operation};
use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::StatusCode,
};
use enroute_tracking::{
    bypass::{BypassSubmission, Evidence},
    geopoint::GeoPoint,
    order::OrderId,
};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::debug;

use crate::{auth::Caller, error::ApiError, state::AppState};

#[derive(Debug, Serialize, JsonSchema)]
pub struct BypassResponse {
    pub success: bool,
}

/// Raw multipart fields, before any validation.
#[derive(Debug, Default)]
pub struct BypassForm {
    pub order_id: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub file: Option<Evidence>,
}

impl<S> FromRequest<S> for BypassForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Self::read(multipart).await
    }
}

impl OperationInput for BypassForm {
    fn operation_input(ctx: &mut GenContext, operation: &mut Operation) {
        Multipart::operation_input(ctx, operation);
    }
}

impl BypassForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = BypassForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(multipart_error)?;

                    form.file = Some(Evidence {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                "orderId" => form.order_id = Some(field.text().await.map_err(multipart_error)?),
                "reason" => form.reason = Some(field.text().await.map_err(multipart_error)?),
                "notes" => form.notes = Some(field.text().await.map_err(multipart_error)?),
                "lat" => form.lat = Some(field.text().await.map_err(multipart_error)?),
                "lng" => form.lng = Some(field.text().await.map_err(multipart_error)?),
                other => debug!("Ignoring unknown bypass form field {:?}", other),
            }
        }

        Ok(form)
    }

    pub fn into_submission(self) -> Result<BypassSubmission, ApiError> {
        let order_id = required(self.order_id, "orderId")?;
        let reason = required(self.reason, "reason")?;

        let evidence = self
            .file
            .filter(|file| !file.bytes.is_empty())
            .ok_or_else(|| ApiError::BadRequest(String::from("file is required")))?;

        let lat = optional_coordinate(self.lat, "lat")?;
        let lng = optional_coordinate(self.lng, "lng")?;

        let position = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            (None, None) => None,
            _ => {
                return Err(ApiError::BadRequest(String::from(
                    "lat and lng must be provided together",
                )));
            }
        };

        Ok(BypassSubmission {
            order_id: OrderId::from(order_id),
            reason,
            notes: self.notes,
            position,
            evidence,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))
}

fn optional_coordinate(value: Option<String>, name: &str) -> Result<Option<f64>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{name} must be a number, got {value:?}"))),
    }
}

fn multipart_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(error.body_text())
    } else {
        ApiError::BadRequest(error.body_text())
    }
}

pub async fn bypass_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    form: BypassForm,
) -> Result<Json<BypassResponse>, ApiError> {
    let submission = form.into_submission()?;

    state
        .tracker
        .submit_bypass(&caller.user_id, submission)
        .await?;

    Ok(Json(BypassResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn form() -> BypassForm {
        BypassForm {
            order_id: Some("order-1".to_string()),
            reason: Some("Road closed".to_string()),
            notes: None,
            lat: None,
            lng: None,
            file: Some(Evidence {
                file_name: Some("closure.jpg".to_string()),
                content_type: Some("image/jpeg".to_string()),
                bytes: Bytes::from_static(b"jpeg"),
            }),
        }
    }

    #[test]
    fn test_minimal_form() {
        let submission = form().into_submission().unwrap();

        assert_eq!(submission.order_id, OrderId::from("order-1"));
        assert_eq!(submission.reason, "Road closed");
        assert!(submission.position.is_none());
    }

    #[test]
    fn test_form_with_position() {
        let submission = BypassForm {
            lat: Some("40.7128".to_string()),
            lng: Some(" -74.0060 ".to_string()),
            ..form()
        }
        .into_submission()
        .unwrap();

        assert_eq!(submission.position, Some(GeoPoint::new(40.7128, -74.006)));
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            BypassForm {
                order_id: None,
                ..form()
            }
            .into_submission(),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            BypassForm {
                reason: Some("   ".to_string()),
                ..form()
            }
            .into_submission(),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            BypassForm {
                file: None,
                ..form()
            }
            .into_submission(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_bad_coordinates() {
        assert!(matches!(
            BypassForm {
                lat: Some("north".to_string()),
                lng: Some("-74.0".to_string()),
                ..form()
            }
            .into_submission(),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            BypassForm {
                lat: Some("40.7".to_string()),
                ..form()
            }
            .into_submission(),
            Err(ApiError::BadRequest(_))
        ));
    }
}
