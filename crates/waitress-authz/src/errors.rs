use crate::CapabilityGroup;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("no permission entry for {group}/{subgroup}")]
    UnknownSubgroup {
        group: CapabilityGroup,
        subgroup: String,
    },
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::UnknownRole("root".to_string()),
            AuthzError::UnknownSubgroup {
                group: CapabilityGroup::Staff,
                subgroup: "night-shift".to_string(),
            },
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn unknown_subgroup_names_the_pair() {
        let err = AuthzError::UnknownSubgroup {
            group: CapabilityGroup::Admin,
            subgroup: "owner".to_string(),
        };
        assert_eq!(err.to_string(), "no permission entry for Admin/owner");
    }
}
