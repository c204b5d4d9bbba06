//! Contact form rules: email shape, phone length, consent

use serde::{Deserialize, Serialize};

/// Which contact fields the widget asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactFields {
    /// Email and phone number, both required
    EmailPhone,
    /// Email plus an explicit consent checkbox
    EmailConsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Email,
    Phone,
    Consent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub consent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("Email is required")]
    EmailRequired,

    #[error("Please enter a valid email address")]
    EmailInvalid,

    #[error("Phone number is required")]
    PhoneRequired,

    #[error("Please enter a valid phone number")]
    PhoneInvalid,

    #[error("Please accept the privacy terms")]
    ConsentRequired,
}

impl ContactError {
    pub fn field(&self) -> ContactField {
        match self {
            ContactError::EmailRequired | ContactError::EmailInvalid => ContactField::Email,
            ContactError::PhoneRequired | ContactError::PhoneInvalid => ContactField::Phone,
            ContactError::ConsentRequired => ContactField::Consent,
        }
    }
}

/// `local@domain.tld`: no whitespace, a single `@`, and a dot inside the domain
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Some dot must have text on both sides
    domain
        .match_indices('.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len())
}

/// International or national phone number, judged by length after cleanup
pub fn is_valid_phone(phone: &str) -> bool {
    let clean: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if clean.starts_with('+') {
        return (11..=16).contains(&clean.len());
    }

    (10..=15).contains(&clean.len())
}

fn check_email(email: &str) -> Option<ContactError> {
    if email.trim().is_empty() {
        Some(ContactError::EmailRequired)
    } else if !is_valid_email(email) {
        Some(ContactError::EmailInvalid)
    } else {
        None
    }
}

fn check_phone(phone: &str) -> Option<ContactError> {
    if phone.trim().is_empty() {
        Some(ContactError::PhoneRequired)
    } else if !is_valid_phone(phone) {
        Some(ContactError::PhoneInvalid)
    } else {
        None
    }
}

/// Check every required field; errors come back in field order
pub fn validate_contact(fields: ContactFields, info: &ContactInfo) -> Result<(), Vec<ContactError>> {
    let mut errors = Vec::new();

    errors.extend(check_email(&info.email));

    match fields {
        ContactFields::EmailPhone => errors.extend(check_phone(&info.phone)),
        ContactFields::EmailConsent => {
            if !info.consent {
                errors.push(ContactError::ConsentRequired);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The field that should receive focus after a failed submit
pub fn first_invalid_field(fields: ContactFields, info: &ContactInfo) -> Option<ContactField> {
    validate_contact(fields, info)
        .err()
        .and_then(|errors| errors.first().map(ContactError::field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("a@b@c.de"));
    }

    #[test]
    fn test_email_with_dot_run_in_domain() {
        // Dots count as ordinary domain text, so the second dot splits "b." and "co"
        assert!(is_valid_email("a@b..co"));
    }

    #[test]
    fn test_phone_lengths() {
        assert!(is_valid_phone("+491234567890"));
        assert!(is_valid_phone("02012345678"));
        assert!(is_valid_phone("(020) 123-45678"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+123456789"));
        assert!(is_valid_phone("+1234567890"));
        assert!(!is_valid_phone("1234567890123456"));
    }

    #[test]
    fn test_email_phone_rules() {
        let info = ContactInfo {
            email: "   ".to_string(),
            phone: "12345".to_string(),
            consent: false,
        };
        let errors = validate_contact(ContactFields::EmailPhone, &info).unwrap_err();
        assert_eq!(errors, vec![ContactError::EmailRequired, ContactError::PhoneInvalid]);
        assert_eq!(
            first_invalid_field(ContactFields::EmailPhone, &info),
            Some(ContactField::Email)
        );
    }

    #[test]
    fn test_email_consent_rules() {
        let mut info = ContactInfo {
            email: "a@b.co".to_string(),
            ..ContactInfo::default()
        };
        assert_eq!(
            validate_contact(ContactFields::EmailConsent, &info),
            Err(vec![ContactError::ConsentRequired])
        );

        info.consent = true;
        assert_eq!(validate_contact(ContactFields::EmailConsent, &info), Ok(()));
        assert_eq!(first_invalid_field(ContactFields::EmailConsent, &info), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ContactError::EmailRequired.to_string(), "Email is required");
        assert_eq!(ContactError::PhoneInvalid.to_string(), "Please enter a valid phone number");
        assert_eq!(ContactError::PhoneRequired.field(), ContactField::Phone);
    }
}
