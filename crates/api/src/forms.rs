//! Multipart project form parsing.
//!
//! Create and update requests share one form shape: scalar project fields as
//! text parts, `existing_images` as a JSON array of image ids to keep, and
//! any number of file parts whose name starts with `uploaded_images`.
//! Parsing collects every problem into per-field messages before failing.

use axum::extract::Multipart;
use chrono::NaiveDate;
use planner_core::project::{validate_image_file_name, Priority, Status, MAX_TITLE_LEN};
use planner_core::reconcile::ImageUpload;
use planner_core::types::{Date, DbId};
use planner_db::models::project::{CreateProject, UpdateProject};
use validator::Validate;

use crate::error::{collect_field_errors, AppError, AppResult, FieldErrors};

/// Text part carrying the JSON list of image ids to retain.
pub const EXISTING_IMAGES_FIELD: &str = "existing_images";

/// Prefix shared by all file parts holding new uploads.
pub const UPLOAD_FIELD_PREFIX: &str = "uploaded_images";

/// Text parts the form understands; anything else is skipped unread.
const TEXT_FIELDS: &[&str] = &[
    "title",
    "description",
    "start_date",
    "end_date",
    "category",
    "priority",
    "status",
    EXISTING_IMAGES_FIELD,
];

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw scalar fields as received. Every field is optional here; which ones
/// are required depends on whether the form creates or updates.
#[derive(Debug, Default, Validate)]
pub struct ProjectFields {
    #[validate(length(
        max = MAX_TITLE_LEN,
        message = "Ensure this field has no more than 255 characters."
    ))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

/// A fully read project form.
#[derive(Debug, Default)]
pub struct ProjectForm {
    pub fields: ProjectFields,
    /// Ids to keep attached, in request order. Defaults to empty.
    pub existing_images: Vec<DbId>,
    /// New files, in request order.
    pub uploads: Vec<ImageUpload>,
    /// Problems found while reading parts (bad JSON, bad extension).
    errors: FieldErrors,
}

impl ProjectForm {
    /// Drain a multipart body into a form. Unknown parts are ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = ProjectForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name.starts_with(UPLOAD_FIELD_PREFIX) {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.add_upload(&name, file_name, bytes.to_vec());
                continue;
            }

            if !TEXT_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.set_text(&name, text);
        }

        tracing::debug!(
            retained = form.existing_images.len(),
            uploads = form.uploads.len(),
            "Parsed project form"
        );
        Ok(form)
    }

    fn set_text(&mut self, name: &str, value: String) {
        let fields = &mut self.fields;
        match name {
            "title" => fields.title = Some(value.trim().to_string()),
            "description" => fields.description = Some(value.trim().to_string()),
            "start_date" => fields.start_date = Some(value),
            "end_date" => fields.end_date = Some(value),
            "category" => fields.category = Some(value),
            "priority" => fields.priority = Some(value),
            "status" => fields.status = Some(value),
            EXISTING_IMAGES_FIELD => match parse_image_ids(&value) {
                Ok(ids) => self.existing_images = ids,
                Err(msg) => push(&mut self.errors, EXISTING_IMAGES_FIELD, msg),
            },
            _ => {}
        }
    }

    fn add_upload(&mut self, field: &str, file_name: String, bytes: Vec<u8>) {
        if file_name.is_empty() {
            push(&mut self.errors, field, "No file was submitted.".to_string());
            return;
        }
        if let Err(e) = validate_image_file_name(&file_name) {
            push(&mut self.errors, field, e.to_string());
            return;
        }
        self.uploads.push(ImageUpload { file_name, bytes });
    }

    /// Validate for creation: title, description, both dates and the
    /// category are required.
    pub fn to_create(&self, owner_id: DbId) -> AppResult<CreateProject> {
        let mut errors = self.errors.clone();
        let parsed = self.parse_fields(&mut errors);

        for (field, present) in [
            ("title", parsed.title.is_some()),
            ("description", parsed.description.is_some()),
            ("start_date", parsed.start_date.is_some()),
            ("end_date", parsed.end_date.is_some()),
            ("category", parsed.category_id.is_some()),
        ] {
            if !present && !errors.contains_key(field) {
                push(&mut errors, field, REQUIRED.to_string());
            }
        }

        if !errors.is_empty() {
            return Err(AppError::FieldValidation(errors));
        }

        match parsed {
            UpdateProject {
                title: Some(title),
                description: Some(description),
                start_date: Some(start_date),
                end_date: Some(end_date),
                category_id: Some(category_id),
                priority,
                status,
            } => Ok(CreateProject {
                title,
                description,
                start_date,
                end_date,
                category_id,
                priority,
                status,
                owner_id,
            }),
            _ => Err(AppError::InternalError(
                "Required project fields missing after validation".into(),
            )),
        }
    }

    /// Validate for a partial update: only fields present are checked.
    pub fn to_update(&self) -> AppResult<UpdateProject> {
        let mut errors = self.errors.clone();
        let parsed = self.parse_fields(&mut errors);
        if errors.is_empty() {
            Ok(parsed)
        } else {
            Err(AppError::FieldValidation(errors))
        }
    }

    /// Convert present fields to typed values, recording failures.
    fn parse_fields(&self, errors: &mut FieldErrors) -> UpdateProject {
        if let Err(e) = self.fields.validate() {
            for (field, messages) in collect_field_errors(&e) {
                errors.entry(field).or_default().extend(messages);
            }
        }
        for (field, value) in [
            ("title", &self.fields.title),
            ("description", &self.fields.description),
        ] {
            if value.as_deref() == Some("") {
                push(errors, field, BLANK.to_string());
            }
        }

        let f = &self.fields;
        UpdateProject {
            title: f.title.clone().filter(|_| !errors.contains_key("title")),
            description: f
                .description
                .clone()
                .filter(|_| !errors.contains_key("description")),
            start_date: parse_present(f.start_date.as_deref(), "start_date", errors, parse_date),
            end_date: parse_present(f.end_date.as_deref(), "end_date", errors, parse_date),
            category_id: parse_present(f.category.as_deref(), "category", errors, |v| {
                v.parse::<DbId>()
                    .map_err(|_| "A valid integer is required.".to_string())
            }),
            priority: parse_present(f.priority.as_deref(), "priority", errors, |v| {
                v.parse::<Priority>().map_err(|e| e.to_string())
            }),
            status: parse_present(f.status.as_deref(), "status", errors, |v| {
                v.parse::<Status>().map_err(|e| e.to_string())
            }),
        }
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

/// Parse a non-blank value; blank or absent values count as not supplied.
fn parse_present<T>(
    value: Option<&str>,
    field: &str,
    errors: &mut FieldErrors,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Option<T> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(msg) => {
            push(errors, field, msg);
            None
        }
    }
}

fn parse_date(value: &str) -> Result<Date, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.".into())
}

/// Parse the `existing_images` JSON array. A blank value means no images.
fn parse_image_ids(value: &str) -> Result<Vec<DbId>, String> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<DbId>>(value)
        .map_err(|_| "Expected a JSON list of image ids.".to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    use super::*;

    const BOUNDARY: &str = "plannerboundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    async fn form_from(parts: &[Part<'_>]) -> ProjectForm {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        ProjectForm::from_multipart(multipart).await.unwrap()
    }

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::FieldValidation(fields) => fields,
            other => panic!("expected field validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_create_form_parses() {
        let form = form_from(&[
            Part::Text("title", "Website Redesign"),
            Part::Text("description", "Refresh the site"),
            Part::Text("start_date", "2024-03-01"),
            Part::Text("end_date", "2024-06-30"),
            Part::Text("category", "3"),
            Part::Text("priority", "High"),
            Part::Text("status", "In Progress"),
            Part::Text("existing_images", "[1, 3]"),
            Part::File("uploaded_images[0]", "hero.png", b"png-bytes"),
            Part::File("uploaded_images_1", "team.JPG", b"jpg-bytes"),
        ])
        .await;

        assert_eq!(form.existing_images, vec![1, 3]);
        let names: Vec<&str> = form.uploads.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(names, vec!["hero.png", "team.JPG"]);

        let create = form.to_create(7).unwrap();
        assert_eq!(create.title, "Website Redesign");
        assert_eq!(create.category_id, 3);
        assert_eq!(create.priority, Some(Priority::High));
        assert_eq!(create.status, Some(Status::InProgress));
        assert_eq!(create.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(create.owner_id, 7);
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let form = form_from(&[Part::Text("title", "Only a title")]).await;
        let fields = field_errors(form.to_create(1).unwrap_err());

        for field in ["description", "start_date", "end_date", "category"] {
            assert_eq!(fields[field], vec![REQUIRED.to_string()], "field {field}");
        }
        assert!(!fields.contains_key("title"));
    }

    #[tokio::test]
    async fn invalid_values_are_reported_per_field() {
        let form = form_from(&[
            Part::Text("title", ""),
            Part::Text("start_date", "03/01/2024"),
            Part::Text("category", "marketing"),
            Part::Text("priority", "Urgent"),
            Part::Text("existing_images", "1,2"),
            Part::File("uploaded_images", "notes.txt", b"text"),
        ])
        .await;
        let fields = field_errors(form.to_update().unwrap_err());

        assert!(fields.contains_key("title"));
        assert!(fields["start_date"][0].contains("YYYY-MM-DD"));
        assert_eq!(fields["category"], vec!["A valid integer is required."]);
        assert_eq!(
            fields["priority"],
            vec!["\"Urgent\" is not a valid choice for priority"]
        );
        assert!(fields.contains_key(EXISTING_IMAGES_FIELD));
        assert!(fields.contains_key("uploaded_images"));
    }

    #[tokio::test]
    async fn whitespace_only_text_is_blank() {
        let form = form_from(&[
            Part::Text("title", "   "),
            Part::Text("description", "  \n "),
            Part::Text("start_date", "2024-03-01"),
            Part::Text("end_date", "2024-06-30"),
            Part::Text("category", "3"),
        ])
        .await;

        let fields = field_errors(form.to_create(1).unwrap_err());
        assert_eq!(fields["title"], vec![BLANK.to_string()]);
        assert_eq!(fields["description"], vec![BLANK.to_string()]);

        let fields = field_errors(form.to_update().unwrap_err());
        assert_eq!(fields["title"], vec![BLANK.to_string()]);
    }

    #[tokio::test]
    async fn text_fields_are_trimmed() {
        let form = form_from(&[
            Part::Text("title", "  Website Redesign \n"),
            Part::Text("description", "\tRefresh the site  "),
        ])
        .await;

        let update = form.to_update().unwrap();
        assert_eq!(update.title.as_deref(), Some("Website Redesign"));
        assert_eq!(update.description.as_deref(), Some("Refresh the site"));
    }

    #[tokio::test]
    async fn update_accepts_partial_form_and_defaults_images_to_empty() {
        let form = form_from(&[Part::Text("status", "Done")]).await;
        assert!(form.existing_images.is_empty());
        assert!(form.uploads.is_empty());

        let update = form.to_update().unwrap();
        assert_matches!(update.status, Some(Status::Done));
        assert!(update.title.is_none());
        assert!(update.category_id.is_none());
    }

    #[test]
    fn image_ids_parse_from_json() {
        assert_eq!(parse_image_ids("[4, 5]").unwrap(), vec![4, 5]);
        assert!(parse_image_ids("").unwrap().is_empty());
        assert!(parse_image_ids("{\"id\": 1}").is_err());
    }
}
