//! Local form checks run before anything is sent to the server.

use regex_lite::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

use crate::error::ApiError;
use crate::requests::auth::Registration;
use crate::requests::users::{ProfilePicture, ProfileUpdate};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static USERNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("username pattern"));
static CONTACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]+$").expect("contact pattern"));

pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field: &'static str,
  pub message: String,
}

impl FieldError {
  fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self {
      field,
      message: message.into(),
    }
  }
}

/// Every problem found in one form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|e| e.field == field)
      .map(|e| e.message.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
    self.0.iter()
  }

  fn push(&mut self, field: &'static str, problem: Option<String>) {
    if let Some(message) = problem {
      self.0.push(FieldError::new(field, message));
    }
  }

  fn into_result(self) -> Result<(), ValidationErrors> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
    f.write_str(&messages.join("; "))
  }
}

/// Field errors surface as a validation [`ApiError`] whose payload maps each
/// field to its message, the same shape the server uses.
impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self {
    let mut fields = Map::new();
    for error in errors.iter() {
      fields.insert(error.field.to_string(), Value::String(error.message.clone()));
    }
    let mut err = ApiError::validation(errors.to_string());
    err.payload = Some(Value::Object(fields));
    err
  }
}

pub fn validate_registration(form: &Registration) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();
  if form.username.chars().count() < 3 {
    errors.push("username", Some("Username must be at least 3 characters long".into()));
  }
  if !EMAIL.is_match(&form.email) {
    errors.push("email", Some("Please enter a valid email address".into()));
  }
  if form.password.chars().count() < 8 {
    errors.push("password", Some("Password must be at least 8 characters long".into()));
  }
  if form.password != form.password_confirmation {
    errors.push("password_confirmation", Some("Passwords do not match".into()));
  }
  errors.into_result()
}

/// One point each for length of at least 8, an uppercase letter, a
/// lowercase letter, a digit and a symbol.
pub fn password_strength(password: &str) -> u8 {
  let checks = [
    password.chars().count() >= 8,
    password.chars().any(|c| c.is_ascii_uppercase()),
    password.chars().any(|c| c.is_ascii_lowercase()),
    password.chars().any(|c| c.is_ascii_digit()),
    password.chars().any(|c| !c.is_ascii_alphanumeric()),
  ];
  checks.iter().filter(|passed| **passed).count() as u8
}

pub fn strength_label(strength: u8) -> &'static str {
  match strength {
    0 | 1 => "Very Weak",
    2 => "Weak",
    3 => "Medium",
    4 => "Strong",
    _ => "Very Strong",
  }
}

pub fn validate_full_name(full_name: &str) -> Option<String> {
  if full_name.trim().is_empty() {
    return Some("Full name is required".into());
  }
  if full_name.chars().count() > 100 {
    return Some("Full name must be less than 100 characters".into());
  }
  None
}

pub fn validate_username(username: &str) -> Option<String> {
  if username.trim().is_empty() {
    return Some("Username is required".into());
  }
  if username.chars().count() > 50 {
    return Some("Username must be less than 50 characters".into());
  }
  if !USERNAME.is_match(username) {
    return Some("Username can only contain letters, numbers, and underscores".into());
  }
  None
}

pub fn validate_email(email: &str) -> Option<String> {
  if email.trim().is_empty() {
    return Some("Email is required".into());
  }
  if !EMAIL.is_match(email) {
    return Some("Please enter a valid email address".into());
  }
  None
}

pub fn validate_bio(bio: &str) -> Option<String> {
  (bio.chars().count() > 500).then(|| "Bio must be less than 500 characters".into())
}

pub fn validate_contact(contact: &str) -> Option<String> {
  (!contact.is_empty() && !CONTACT.is_match(contact)).then(|| "Please enter a valid contact number".into())
}

pub fn validate_about(about: &str) -> Option<String> {
  (about.chars().count() > 1000).then(|| "About section must be less than 1000 characters".into())
}

pub fn validate_profile_picture(picture: &ProfilePicture) -> Option<String> {
  let mime = mime_guess::from_path(&picture.file_name).first_or_octet_stream();
  let accepted = mime.type_() == mime_guess::mime::IMAGE
    && matches!(mime.subtype().as_str(), "jpeg" | "jpg" | "png");
  if !accepted {
    return Some("Please upload a valid image file (JPG, JPEG, or PNG)".into());
  }
  if picture.bytes.len() > MAX_PICTURE_BYTES {
    return Some("Image size should be less than 5MB".into());
  }
  None
}

/// Check the fields an update actually sets. Unset fields stay as they are
/// on the server and are not checked.
pub fn validate_profile(update: &ProfileUpdate) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();
  errors.push("full_name", update.full_name.as_deref().and_then(validate_full_name));
  errors.push("username", update.username.as_deref().and_then(validate_username));
  errors.push("email", update.email.as_deref().and_then(validate_email));
  errors.push("bio", update.bio.as_deref().and_then(validate_bio));
  errors.push("contact", update.contact.as_deref().and_then(validate_contact));
  errors.push("about", update.about.as_deref().and_then(validate_about));
  errors.push(
    "profile_picture",
    update.profile_picture.as_ref().and_then(validate_profile_picture),
  );
  errors.into_result()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use pretty_assertions::assert_eq;

  fn registration(username: &str, email: &str, password: &str, confirmation: &str) -> Registration {
    Registration {
      username: username.into(),
      email: email.into(),
      password: password.into(),
      password_confirmation: confirmation.into(),
    }
  }

  #[test]
  fn test_valid_registration() {
    let form = registration("ana", "ana@example.com", "hunter22!", "hunter22!");
    assert!(validate_registration(&form).is_ok());
  }

  #[test]
  fn test_registration_collects_every_problem() {
    let form = registration("an", "not-an-email", "short", "other");
    let errors = validate_registration(&form).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
    assert_eq!(fields, vec!["username", "email", "password", "password_confirmation"]);
    assert_eq!(errors.get("password_confirmation"), Some("Passwords do not match"));
  }

  #[test]
  fn test_password_strength() {
    assert_eq!(password_strength(""), 0);
    assert_eq!(password_strength("abc"), 1);
    assert_eq!(password_strength("abcdefgh"), 2);
    assert_eq!(password_strength("Abcdefg1"), 4);
    assert_eq!(password_strength("Abcdef1!"), 5);
    assert_eq!(strength_label(0), "Very Weak");
    assert_eq!(strength_label(3), "Medium");
    assert_eq!(strength_label(5), "Very Strong");
  }

  #[test]
  fn test_profile_checks_only_set_fields() {
    assert!(validate_profile(&ProfileUpdate::default()).is_ok());

    let update = ProfileUpdate {
      full_name: Some("   ".into()),
      username: Some("bad name".into()),
      contact: Some("+1 (555) 010-2030".into()),
      bio: Some("x".repeat(501)),
      ..Default::default()
    };
    let errors = validate_profile(&update).unwrap_err();
    assert_eq!(errors.get("full_name"), Some("Full name is required"));
    assert_eq!(
      errors.get("username"),
      Some("Username can only contain letters, numbers, and underscores")
    );
    assert_eq!(errors.get("bio"), Some("Bio must be less than 500 characters"));
    assert_eq!(errors.get("contact"), None);
  }

  #[test]
  fn test_contact_format() {
    assert_eq!(validate_contact(""), None);
    assert_eq!(validate_contact("555-0100"), None);
    assert!(validate_contact("call me").is_some());
  }

  #[test]
  fn test_profile_picture_type_and_size() {
    let png = ProfilePicture {
      file_name: "me.png".into(),
      bytes: vec![0; 16],
    };
    assert_eq!(validate_profile_picture(&png), None);

    let gif = ProfilePicture {
      file_name: "me.gif".into(),
      bytes: vec![0; 16],
    };
    assert!(validate_profile_picture(&gif).is_some());

    let huge = ProfilePicture {
      file_name: "me.jpg".into(),
      bytes: vec![0; MAX_PICTURE_BYTES + 1],
    };
    assert_eq!(
      validate_profile_picture(&huge),
      Some("Image size should be less than 5MB".to_string())
    );
  }

  #[test]
  fn test_errors_become_validation_api_error() {
    let form = registration("ana", "ana@example.com", "hunter22!", "hunter23!");
    let err: ApiError = validate_registration(&form).unwrap_err().into();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Passwords do not match");
    assert_eq!(
      err.payload,
      Some(serde_json::json!({"password_confirmation": "Passwords do not match"}))
    );
  }
}
