#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin,
    Hr,
    Employee,
}

impl Role {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(Role::Admin),
            "hr" => Some(Role::Hr),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Employee => "employee",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip() {
        for role in [Role::Admin, Role::Hr, Role::Employee] {
            assert_eq!(Role::from_name(role.as_str()), Some(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(Role::from_name("superuser"), None);
        assert_eq!(Role::from_name("Admin"), None);
    }
}
