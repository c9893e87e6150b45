use crate::server::response::FieldErrors;

const MAX_EMAIL_LEN: usize = 255;
const MAX_TAG_NAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_tag_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_TAG_NAME_LEN {
        return Err(format!(
            "Tag name cannot exceed {MAX_TAG_NAME_LEN} characters"
        ));
    }
    if name.chars().any(char::is_control) {
        return Err("Tag name cannot contain control characters".to_string());
    }
    Ok(())
}

/// Shape check only; deliverability is out of scope.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(format!("Email cannot exceed {MAX_EMAIL_LEN} characters"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Email must be a valid email address".to_string());
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err("Email must be a valid email address".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str, confirmation: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    } else if password != confirmation {
        errors.insert(
            "password",
            "Password confirmation does not match".to_string(),
        );
    }
    errors
}
