use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use chrono::NaiveDate;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sqlx::{MySql, Transaction};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::Databases;
use crate::model::{
    role::{DocumentType, Role},
    worker::Worker,
};
use crate::models::{ApiError, MessageResponse};
use crate::notify::{DomainEvent, EventBus};
use crate::utils::media::{PhotoField, save_photo};

const MAX_FORM_BYTES: usize = 256 * 1024;
const MAX_PART_BYTES: usize = 10 * 1024 * 1024;

/// Registration payload sent by the bot. Empty strings count as "not provided".
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterUser {
    #[schema(example = "123456789")]
    pub telegram_id: Option<String>,
    #[schema(example = "998901234567")]
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    #[schema(example = "1990-04-12", format = "date", value_type = Option<String>)]
    pub born_year: Option<NaiveDate>,
    #[schema(example = "passport")]
    pub type_of_document: Option<String>,
    pub card_number: Option<String>,
    pub card_holder_name: Option<String>,
    pub tranzit_number: Option<String>,
    pub bank_name: Option<String>,
    /// Specialization name; created if unknown
    #[schema(example = "Электрик")]
    pub specialization: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl RegisterUser {
    fn normalized(&self) -> Result<Self, ApiError> {
        let type_of_document = match non_empty(&self.type_of_document) {
            Some(value) => {
                let parsed: DocumentType = value
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("Unknown document type: {value}")))?;
                Some(parsed.to_string())
            }
            None => None,
        };

        Ok(Self {
            telegram_id: non_empty(&self.telegram_id),
            phone_number: non_empty(&self.phone_number),
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            middle_name: non_empty(&self.middle_name),
            born_year: self.born_year,
            type_of_document,
            card_number: non_empty(&self.card_number),
            card_holder_name: non_empty(&self.card_holder_name),
            tranzit_number: non_empty(&self.tranzit_number),
            bank_name: non_empty(&self.bank_name),
            specialization: non_empty(&self.specialization),
        })
    }

    /// Fields a brand-new user cannot be created without.
    fn missing_for_create(&self) -> Vec<&'static str> {
        [
            ("telegram_id", &self.telegram_id),
            ("phone_number", &self.phone_number),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A document photo sent along with the registration form.
#[derive(Debug)]
pub struct UploadedPhoto {
    pub field: PhotoField,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct Registration {
    pub data: RegisterUser,
    pub photos: Vec<UploadedPhoto>,
}

fn bad_form(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Malformed form data: {e}"))
}

/// Form fields to payload; blank values are dropped before parsing.
fn from_text_fields(fields: impl IntoIterator<Item = (String, String)>) -> Result<RegisterUser, ApiError> {
    let map: Map<String, Value> = fields
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ApiError::BadRequest(format!("Invalid registration data: {e}")))
}

async fn read_multipart(mut multipart: Multipart) -> Result<Registration, ApiError> {
    let mut text = Vec::new();
    let mut photos = Vec::new();

    while let Some(field) = multipart.next().await {
        let mut field = field.map_err(bad_form)?;
        let name = field.content_disposition().get_name().unwrap_or_default().to_string();
        let file_name = field.content_disposition().get_filename().map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(bad_form)?;
            if bytes.len() + chunk.len() > MAX_PART_BYTES {
                return Err(ApiError::BadRequest(format!("{name} is too large")));
            }
            bytes.extend_from_slice(&chunk);
        }

        match (name.parse::<PhotoField>(), file_name) {
            (Ok(field), Some(file_name)) => {
                // browsers send an empty part for an untouched file input
                if !bytes.is_empty() {
                    photos.push(UploadedPhoto {
                        field,
                        file_name,
                        bytes,
                    });
                }
            }
            _ => {
                let value = String::from_utf8(bytes)
                    .map_err(|_| ApiError::BadRequest(format!("{name} is not valid UTF-8")))?;
                text.push((name, value));
            }
        }
    }

    Ok(Registration {
        data: from_text_fields(text)?,
        photos,
    })
}

async fn read_body(payload: &mut web::Payload) -> Result<web::BytesMut, ApiError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(bad_form)?;
        if body.len() + chunk.len() > MAX_FORM_BYTES {
            return Err(ApiError::BadRequest("Request body is too large".into()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Multipart (with photos), urlencoded form or JSON, by content type.
async fn read_registration(req: &HttpRequest, mut payload: web::Payload) -> Result<Registration, ApiError> {
    let content_type = req.content_type().to_ascii_lowercase();
    if content_type == "multipart/form-data" {
        return read_multipart(Multipart::new(req.headers(), payload)).await;
    }

    let body = read_body(&mut payload).await?;
    let data = if content_type == "application/x-www-form-urlencoded" {
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(&body).map_err(bad_form)?;
        from_text_fields(fields)?
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {e}")))?
    };
    Ok(Registration {
        data,
        photos: Vec::new(),
    })
}

async fn specialization_id(
    tx: &mut Transaction<'_, MySql>,
    name: &str,
) -> Result<i64, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM api_specialization WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let result = sqlx::query(
        "INSERT INTO api_specialization (name, created, updated) VALUES (?, NOW(), NOW())",
    )
    .bind(name)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_id() as i64)
}

async fn find_user(
    tx: &mut Transaction<'_, MySql>,
    phone_number: Option<&str>,
    telegram_id: Option<&str>,
) -> Result<Option<i64>, sqlx::Error> {
    if let Some(phone) = phone_number {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM api_user WHERE phone_number = ? FOR UPDATE")
            .bind(phone)
            .fetch_optional(&mut **tx)
            .await?;
        if found.is_some() {
            return Ok(found);
        }
    }
    match telegram_id {
        Some(tid) => {
            sqlx::query_scalar::<_, i64>("SELECT id FROM api_user WHERE telegram_id = ? FOR UPDATE")
                .bind(tid)
                .fetch_optional(&mut **tx)
                .await
        }
        None => Ok(None),
    }
}

/// Register a user from the bot, or update the matching one
#[utoipa::path(
    post,
    path = "/api/register-user",
    request_body(
        content = RegisterUser,
        content_type = "multipart/form-data",
        description = "Form fields plus optional passport_photo, id_card_photo1 and id_card_photo2 files. \
                       urlencoded forms and JSON are accepted without photos."
    ),
    responses(
        (status = 200, description = "User created or updated", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = Object, example = json!({
            "message": "Missing fields: phone_number"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Worker"
)]
pub async fn register_user(
    req: HttpRequest,
    payload: web::Payload,
    dbs: web::Data<Databases>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let Registration { data, photos } = read_registration(&req, payload).await?;
    let data = data.normalized()?;
    if data.telegram_id.is_none() && data.phone_number.is_none() {
        return Err(ApiError::BadRequest(
            "telegram_id or phone_number is required".into(),
        ));
    }

    let mut tx = dbs.main.begin().await?;

    let specialization = match &data.specialization {
        Some(name) => Some(specialization_id(&mut tx, name).await?),
        None => None,
    };

    let existing = find_user(&mut tx, data.phone_number.as_deref(), data.telegram_id.as_deref()).await?;
    if existing.is_none() {
        let missing = data.missing_for_create();
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!("Missing fields: {}", missing.join(", "))));
        }
    }

    let mut stored: HashMap<PhotoField, String> = HashMap::new();
    for photo in &photos {
        let path = save_photo(&config.media_dir, photo.field, &photo.file_name, &photo.bytes).await?;
        stored.insert(photo.field, path);
    }
    let photo = |field: PhotoField| stored.get(&field).cloned();

    match existing {
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO api_user
                (password, username, telegram_id, phone_number, first_name, last_name, middle_name,
                 born_year, type_of_document, card_number, card_holder_name, tranzit_number,
                 bank_name, specialization_id, passport_photo, id_card_photo1, id_card_photo2,
                 role, is_staff, is_active, is_superuser, created, updated)
                VALUES ('', '', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                        FALSE, TRUE, FALSE, NOW(), NOW())
                "#,
            )
            .bind(&data.telegram_id)
            .bind(&data.phone_number)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(data.middle_name.as_deref().unwrap_or(""))
            .bind(data.born_year)
            .bind(data.type_of_document.as_deref().unwrap_or(""))
            .bind(data.card_number.as_deref().unwrap_or(""))
            .bind(data.card_holder_name.as_deref().unwrap_or(""))
            .bind(data.tranzit_number.as_deref().unwrap_or(""))
            .bind(data.bank_name.as_deref().unwrap_or(""))
            .bind(specialization)
            .bind(photo(PhotoField::Passport).unwrap_or_default())
            .bind(photo(PhotoField::IdCardFront).unwrap_or_default())
            .bind(photo(PhotoField::IdCardBack).unwrap_or_default())
            .bind(Role::Worker.as_ref())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            info!(user_id = result.last_insert_id(), photos = stored.len(), "User registered from bot");
        }
        Some(user_id) => {
            sqlx::query(
                r#"
                UPDATE api_user SET
                    telegram_id = COALESCE(?, telegram_id),
                    phone_number = COALESCE(?, phone_number),
                    first_name = COALESCE(?, first_name),
                    last_name = COALESCE(?, last_name),
                    middle_name = COALESCE(?, middle_name),
                    born_year = COALESCE(?, born_year),
                    type_of_document = COALESCE(?, type_of_document),
                    card_number = COALESCE(?, card_number),
                    card_holder_name = COALESCE(?, card_holder_name),
                    tranzit_number = COALESCE(?, tranzit_number),
                    bank_name = COALESCE(?, bank_name),
                    specialization_id = COALESCE(?, specialization_id),
                    passport_photo = COALESCE(?, passport_photo),
                    id_card_photo1 = COALESCE(?, id_card_photo1),
                    id_card_photo2 = COALESCE(?, id_card_photo2),
                    updated = NOW()
                WHERE id = ?
                "#,
            )
            .bind(&data.telegram_id)
            .bind(&data.phone_number)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.middle_name)
            .bind(data.born_year)
            .bind(&data.type_of_document)
            .bind(&data.card_number)
            .bind(&data.card_holder_name)
            .bind(&data.tranzit_number)
            .bind(&data.bank_name)
            .bind(specialization)
            .bind(photo(PhotoField::Passport))
            .bind(photo(PhotoField::IdCardFront))
            .bind(photo(PhotoField::IdCardBack))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            info!(user_id, photos = stored.len(), "User updated from bot");
        }
    }

    Ok(HttpResponse::Ok().json(MessageResponse::ok()))
}

#[derive(sqlx::FromRow)]
struct DeletedWorker {
    telegram_id: String,
    #[sqlx(flatten)]
    names: Worker,
}

/// A foreign key still pointing at the user (e.g. a brigade they lead) is the
/// caller's problem; anything else is a server error.
fn delete_failure(e: sqlx::Error, worker_id: i64) -> ApiError {
    let referenced = matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation());
    if referenced {
        warn!(error = %e, worker_id, "Worker is still referenced");
        ApiError::BadRequest("Worker is still referenced".into())
    } else {
        ApiError::from(e)
    }
}

/// Delete a worker, keeping their name on finished works
#[utoipa::path(
    delete,
    path = "/api/workers/{worker_id}",
    params(("worker_id", description = "Worker ID")),
    responses(
        (status = 200, description = "Worker deleted", body = Object, example = json!({
            "message": "Worker deleted"
        })),
        (status = 400, description = "Worker is still referenced"),
        (status = 404, description = "Worker not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Worker"
)]
pub async fn delete_worker(
    dbs: web::Data<Databases>,
    events: web::Data<EventBus>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let worker_id = path.into_inner();
    let mut tx = dbs.main.begin().await?;

    let worker = sqlx::query_as::<_, DeletedWorker>(
        r#"
        SELECT id, telegram_id, first_name, last_name, middle_name
        FROM api_user
        WHERE id = ? AND role = ?
        FOR UPDATE
        "#,
    )
    .bind(worker_id)
    .bind(Role::Worker.as_ref())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound("Worker not found".into()))?;

    let full_name = worker.names.full_name();
    sqlx::query("UPDATE api_finishedwork SET worker_fullname = ?, worker_id = NULL WHERE worker_id = ?")
        .bind(&full_name)
        .bind(worker_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM api_brigade_workers WHERE worker_id = ?")
        .bind(worker_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM api_user WHERE id = ?")
        .bind(worker_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| delete_failure(e, worker_id))?;

    tx.commit().await?;
    info!(worker_id, %full_name, "Worker deleted");

    events.publish(DomainEvent::WorkerDeleted {
        telegram_id: worker.telegram_id,
    });

    Ok(HttpResponse::Ok().json(json!({ "message": "Worker deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::FromRequest;
    use actix_web::test::TestRequest;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    async fn registration_from(req: TestRequest) -> Result<Registration, ApiError> {
        let (req, mut pl) = req.to_http_parts();
        let payload = web::Payload::from_request(&req, &mut pl).await.unwrap();
        read_registration(&req, payload).await
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str("--crewdeskboundary\r\n");
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str("--crewdeskboundary--\r\n");
        body
    }

    #[actix_web::test]
    async fn multipart_form_carries_fields_and_photos() {
        let body = multipart_body(&[
            ("telegram_id", None, "42"),
            ("phone_number", None, "998901234567"),
            ("middle_name", None, ""),
            ("born_year", None, "1990-04-12"),
            ("passport_photo", Some("pass port.jpg"), "JPEGDATA"),
            ("id_card_photo1", Some(""), ""),
        ]);
        let req = TestRequest::post()
            .insert_header(("content-type", "multipart/form-data; boundary=crewdeskboundary"))
            .set_payload(body);

        let Registration { data, photos } = registration_from(req).await.unwrap();

        assert_eq!(data.telegram_id.as_deref(), Some("42"));
        assert_eq!(data.phone_number.as_deref(), Some("998901234567"));
        assert_eq!(data.middle_name, None);
        assert_eq!(data.born_year, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].field, PhotoField::Passport);
        assert_eq!(photos[0].file_name, "pass port.jpg");
        assert_eq!(photos[0].bytes, b"JPEGDATA");
    }

    #[actix_web::test]
    async fn urlencoded_form_is_accepted() {
        let req = TestRequest::post()
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("telegram_id=42&first_name=%D0%90%D0%BB%D0%B8&last_name=&specialization=Electric");

        let Registration { data, photos } = registration_from(req).await.unwrap();

        assert_eq!(data.telegram_id.as_deref(), Some("42"));
        assert_eq!(data.first_name.as_deref(), Some("Али"));
        assert_eq!(data.last_name, None);
        assert_eq!(data.specialization.as_deref(), Some("Electric"));
        assert!(photos.is_empty());
    }

    #[actix_web::test]
    async fn json_body_is_still_accepted() {
        let req = TestRequest::post()
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"telegram_id": "42", "type_of_document": "passport"}"#);

        let Registration { data, .. } = registration_from(req).await.unwrap();
        assert_eq!(data.type_of_document.as_deref(), Some("passport"));
    }

    #[actix_web::test]
    async fn malformed_born_year_is_rejected() {
        let req = TestRequest::post()
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("telegram_id=42&born_year=12.04.1990");

        assert!(matches!(registration_from(req).await, Err(ApiError::BadRequest(_))));
    }

    #[derive(Debug)]
    struct ConstraintError {
        foreign_key: bool,
    }

    impl std::fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("constraint failed")
        }
    }

    impl std::error::Error for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint failed"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.foreign_key {
                ErrorKind::ForeignKeyViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    #[test]
    fn only_foreign_key_violation_blocks_delete() {
        let fk = sqlx::Error::from(ConstraintError { foreign_key: true });
        assert!(matches!(delete_failure(fk, 7), ApiError::BadRequest(m) if m == "Worker is still referenced"));

        let other = sqlx::Error::from(ConstraintError { foreign_key: false });
        assert!(matches!(delete_failure(other, 7), ApiError::Internal));

        assert!(matches!(delete_failure(sqlx::Error::PoolTimedOut, 7), ApiError::Internal));
    }

    #[test]
    fn blank_fields_are_treated_as_missing() {
        let payload = RegisterUser {
            telegram_id: Some(" 42 ".into()),
            phone_number: Some("".into()),
            first_name: Some("Алишер".into()),
            ..Default::default()
        };
        let data = payload.normalized().unwrap();
        assert_eq!(data.telegram_id.as_deref(), Some("42"));
        assert_eq!(data.phone_number, None);
        assert_eq!(data.missing_for_create(), vec!["phone_number", "last_name"]);
    }

    #[test]
    fn document_type_is_validated() {
        let payload = RegisterUser {
            type_of_document: Some("id_card".into()),
            ..Default::default()
        };
        assert_eq!(payload.normalized().unwrap().type_of_document.as_deref(), Some("id_card"));

        let payload = RegisterUser {
            type_of_document: Some("driver_license".into()),
            ..Default::default()
        };
        assert!(matches!(payload.normalized(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn payload_parses_from_bot_json() {
        let payload: RegisterUser = serde_json::from_str(
            r#"{"telegram_id": "42", "phone_number": "998901234567", "born_year": "1990-04-12"}"#,
        )
        .unwrap();
        assert_eq!(payload.born_year, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert!(payload.specialization.is_none());
    }
}
