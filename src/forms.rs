use crate::media::UploadedFile;
use crate::orm::groups;
use actix_multipart::Multipart;
use actix_web::{error, Error};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;

pub const POST_TEXT_REQUIRED: &str = "Please enter the text of the post";
pub const COMMENT_TEXT_REQUIRED: &str = "Please enter the text of the comment";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const FIELD_REQUIRED: &str = "This field is required.";

/// Largest accepted post image.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Raw post submission, as read from a multipart body.
#[derive(Debug, Default)]
pub struct PostFormData {
    pub text: String,
    pub group: String,
    pub image: Option<UploadedFile>,
}

/// Field-level messages of the post form.
#[derive(Debug, Default)]
pub struct PostFormErrors {
    pub text: Option<&'static str>,
    pub group: Option<&'static str>,
    pub image: Option<&'static str>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.group.is_none() && self.image.is_none()
    }
}

/// A submission that passed validation.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<UploadedFile>,
}

/// State of the post form as shown to the user.
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    pub group: Option<i32>,
    pub errors: PostFormErrors,
}

impl PostForm {
    /// A form pre-filled from an existing post.
    pub fn with_initial(text: &str, group: Option<i32>) -> Self {
        Self {
            text: text.to_owned(),
            group,
            errors: PostFormErrors::default(),
        }
    }

    pub fn is_selected(&self, group_id: i32) -> bool {
        self.group == Some(group_id)
    }

    /// Options of the group select, in the order given.
    pub fn choices(&self, groups: &[groups::Model]) -> Vec<GroupChoice> {
        groups
            .iter()
            .map(|g| GroupChoice {
                id: g.id,
                title: g.title.to_owned(),
                selected: self.is_selected(g.id),
            })
            .collect()
    }
}

/// One `<option>` of the group select.
#[derive(Debug)]
pub struct GroupChoice {
    pub id: i32,
    pub title: String,
    pub selected: bool,
}

/// Validates a post submission against the available groups.
/// On failure the returned form keeps what the user typed.
pub fn validate_post(
    data: PostFormData,
    groups: &[groups::Model],
) -> Result<CleanPost, PostForm> {
    let mut errors = PostFormErrors::default();

    let text = data.text.trim().to_owned();
    if text.is_empty() {
        errors.text = Some(POST_TEXT_REQUIRED);
    }

    let raw_group = data.group.trim();
    let group_id = if raw_group.is_empty() {
        None
    } else {
        match raw_group.parse::<i32>() {
            Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
            _ => {
                errors.group = Some(INVALID_CHOICE);
                None
            }
        }
    };

    if let Some(image) = &data.image {
        if !image.is_image() {
            errors.image = Some(INVALID_IMAGE);
        }
    }

    if errors.is_empty() {
        Ok(CleanPost {
            text,
            group_id,
            image: data.image,
        })
    } else {
        Err(PostForm {
            text: data.text,
            group: group_id,
            errors,
        })
    }
}

async fn read_field(field: &mut actix_multipart::Field) -> Result<Vec<u8>, Error> {
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::warn!("read_field: multipart read error: {}", e);
            error::ErrorBadRequest("Error reading upload data.")
        })?;
        if buf.len() + bytes.len() > MAX_UPLOAD_SIZE {
            return Err(error::ErrorPayloadTooLarge("Upload is too large."));
        }
        buf.extend_from_slice(&bytes);
    }
    Ok(buf)
}

/// Reads the post form out of a `multipart/form-data` body.
/// Unknown fields are ignored.
pub async fn read_post_form(mut multipart: Multipart) -> Result<PostFormData, Error> {
    let mut data = PostFormData::default();

    while let Some(mut field) = multipart.try_next().await.map_err(|e| {
        log::warn!("read_post_form: {}", e);
        error::ErrorBadRequest("Malformed form submission.")
    })? {
        let disposition = field.content_disposition().clone();
        let field_name = match disposition.get_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };

        match field_name.as_str() {
            "text" | "group" => {
                let bytes = read_field(&mut field).await?;
                let value = String::from_utf8(bytes)
                    .map_err(|_| error::ErrorBadRequest("Form fields must be UTF-8."))?;
                if field_name == "text" {
                    data.text = value;
                } else {
                    data.group = value;
                }
            }
            "image" => {
                let filename = disposition.get_filename().unwrap_or_default().to_owned();
                let content_type = Some(field.content_type().to_owned());
                let bytes = read_field(&mut field).await?;
                // Browsers send an empty part when no file was chosen.
                if !filename.is_empty() && !bytes.is_empty() {
                    data.image = Some(UploadedFile {
                        filename,
                        content_type,
                        data: bytes,
                    });
                }
            }
            other => {
                log::debug!("read_post_form: ignoring field '{}'", other);
                read_field(&mut field).await?;
            }
        }
    }

    Ok(data)
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

/// The comment box under a post. Always rendered empty; `error` is the
/// message left by a rejected submission, if any.
#[derive(Debug, Default)]
pub struct CommentForm {
    pub error: Option<String>,
}

/// Returns the normalized comment text or the field message.
pub fn validate_comment(data: &CommentFormData) -> Result<String, &'static str> {
    let text = data.text.trim();
    if text.is_empty() {
        Err(COMMENT_TEXT_REQUIRED)
    } else {
        Ok(text.to_owned())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Default)]
pub struct SignupFormErrors {
    pub username: Option<&'static str>,
    pub password1: Option<&'static str>,
    pub password2: Option<&'static str>,
}

impl SignupFormErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password1.is_none() && self.password2.is_none()
    }
}

pub const USERNAME_INVALID: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

/// Checks the signup fields that need no store access.
pub fn validate_signup(data: &SignupFormData) -> SignupFormErrors {
    let mut errors = SignupFormErrors::default();
    let username = data.username.trim();

    if username.is_empty() {
        errors.username = Some(FIELD_REQUIRED);
    } else if username.chars().count() > 150
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.username = Some(USERNAME_INVALID);
    }

    if data.password1.is_empty() {
        errors.password1 = Some(FIELD_REQUIRED);
    } else if data.password1.chars().count() < 8 {
        errors.password1 = Some(PASSWORD_TOO_SHORT);
    }

    if data.password2.is_empty() {
        errors.password2 = Some(FIELD_REQUIRED);
    } else if data.password1 != data.password2 {
        errors.password2 = Some(PASSWORD_MISMATCH);
    }

    errors
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}
