use strum_macros::{AsRefStr, Display, EnumString};

/// Value stored in the `role` column of `api_user`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Worker,
    Brigader,
    Admin,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DocumentType {
    Passport,
    IdCard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_matches_db_values() {
        assert_eq!("worker".parse::<Role>().ok(), Some(Role::Worker));
        assert_eq!("brigader".parse::<Role>().ok(), Some(Role::Brigader));
        assert!("foreman".parse::<Role>().is_err());
        assert_eq!(Role::Admin.as_ref(), "admin");
    }

    #[test]
    fn document_type_is_snake_case() {
        assert_eq!("id_card".parse::<DocumentType>().ok(), Some(DocumentType::IdCard));
        assert_eq!(DocumentType::Passport.to_string(), "passport");
    }
}
