use crate::error::RegistrationError;
use crate::types::{CreateRegistrationInput, Registration, UpdateRegistrationInput};
use cr_vcs::BackendRegistry;

pub const NAME_MAX: usize = 255;
pub const SLUG_MAX: usize = 50;
pub const LOCATION_MAX: usize = 255;

pub fn validate_name(name: &str) -> Result<String, RegistrationError> {
    required_text("name", name, NAME_MAX)
}

pub fn validate_location(location: &str) -> Result<String, RegistrationError> {
    required_text("location", location, LOCATION_MAX)
}

pub fn validate_slug(slug: &str) -> Result<String, RegistrationError> {
    let slug = required_text("slug", slug, SLUG_MAX)?;
    if !slug
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(invalid(
            "slug",
            "may only contain letters, numbers, underscores or hyphens",
        ));
    }
    Ok(slug)
}

pub fn validate_repository_type(
    name: &str,
    registry: &BackendRegistry,
) -> Result<String, RegistrationError> {
    let name = name.trim();
    if !registry.contains(name) {
        return Err(RegistrationError::UnknownRepositoryType {
            name: name.to_string(),
        });
    }
    Ok(name.to_string())
}

/// Trims every field and checks it; the returned input is what gets stored.
pub fn validate_create(
    input: CreateRegistrationInput,
    registry: &BackendRegistry,
) -> Result<CreateRegistrationInput, RegistrationError> {
    Ok(CreateRegistrationInput {
        name: validate_name(&input.name)?,
        slug: validate_slug(&input.slug)?,
        repository_type: validate_repository_type(&input.repository_type, registry)?,
        location: validate_location(&input.location)?,
    })
}

/// Applies the editable fields of `input` onto `registration`.
pub fn apply_update(
    mut registration: Registration,
    input: UpdateRegistrationInput,
) -> Result<Registration, RegistrationError> {
    if let Some(name) = input.name {
        registration.name = validate_name(&name)?;
    }
    if let Some(slug) = input.slug {
        registration.slug = validate_slug(&slug)?;
    }
    if let Some(location) = input.location {
        registration.location = validate_location(&location)?;
    }
    Ok(registration)
}

fn required_text(field: &str, value: &str, max: usize) -> Result<String, RegistrationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(field, "this field is required"));
    }
    if value.chars().count() > max {
        return Err(invalid(
            field,
            &format!("must be at most {max} characters"),
        ));
    }
    Ok(value.to_string())
}

fn invalid(field: &str, reason: &str) -> RegistrationError {
    RegistrationError::Validation {
        message: format!("{field}: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateRegistrationInput {
        CreateRegistrationInput {
            name: "  Widgets ".to_string(),
            slug: "widgets_2-x".to_string(),
            repository_type: "git".to_string(),
            location: "/srv/git/widgets".to_string(),
        }
    }

    #[test]
    fn create_input_is_trimmed() {
        let registry = BackendRegistry::with_installed();
        let valid = validate_create(input(), &registry).unwrap();
        assert_eq!(valid.name, "Widgets");
        assert_eq!(valid.slug, "widgets_2-x");
    }

    #[test]
    fn slug_rejects_url_unsafe_characters() {
        for slug in ["with space", "dots.not.ok", "slash/y", "ümlaut"] {
            let err = validate_slug(slug).unwrap_err();
            assert!(matches!(err, RegistrationError::Validation { .. }), "{slug}");
        }
        assert!(validate_slug(&"s".repeat(SLUG_MAX)).is_ok());
        assert!(validate_slug(&"s".repeat(SLUG_MAX + 1)).is_err());
    }

    #[test]
    fn required_fields_reject_blank_values() {
        let err = validate_name("   ").unwrap_err();
        assert_eq!(err.to_string(), "name: this field is required");
        assert!(validate_location("").is_err());
        assert!(validate_location(&"x".repeat(LOCATION_MAX + 1)).is_err());
    }

    #[test]
    fn repository_type_must_be_registered() {
        let registry = BackendRegistry::with_installed();
        let err = validate_create(
            CreateRegistrationInput {
                repository_type: "svn".to_string(),
                ..input()
            },
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, RegistrationError::UnknownRepositoryType { name } if name == "svn"));
    }
}
