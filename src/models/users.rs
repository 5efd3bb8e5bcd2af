use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Partner,
    Client,
    /// Any role name this portal has no dashboard for.
    #[serde(other)]
    Unrecognized,
}

impl Role {
    /// Root path of the role's own dashboard.
    pub fn dashboard_path(&self) -> Option<&'static str> {
        match self {
            Role::Admin => Some("/admin"),
            Role::Partner => Some("/partner"),
            Role::Client => Some("/client"),
            Role::Unrecognized => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Partner => "partner",
            Role::Client => "client",
            Role::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    #[serde(deserialize_with = "utils::string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub role: Role,
}

/// Account details kept by the portal API, richer than the session identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(deserialize_with = "utils::string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl From<&Identity> for Profile {
    fn from(identity: &Identity) -> Self {
        Profile {
            id: identity.id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            phone: None,
            company: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthResponse {
    pub user: Identity,
    pub token: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
    pub role: Role,
    #[serde(default)]
    pub company: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), String> {
        utils::require("name", &self.name)?;
        utils::require("email", &self.email)?;
        if !utils::is_valid_email(&self.email) {
            return Err("email is invalid".to_string());
        }
        utils::require("phone", &self.phone)?;

        if self.password.chars().count() < 6 {
            return Err("password must have at least 6 characters".to_string());
        }
        if self.password != self.confirm_password {
            return Err("passwords do not match".to_string());
        }

        match self.role {
            Role::Partner => {
                utils::require("company", self.company.as_deref().unwrap_or_default())?
            }
            Role::Client => {}
            other => return Err(format!("role {} cannot self-register", other)),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner_form() -> NewUser {
        NewUser {
            name: "Parceiro Novo".to_string(),
            email: "novo@parceiro.com".to_string(),
            phone: "(11) 90000-0000".to_string(),
            password: "segredo".to_string(),
            confirm_password: "segredo".to_string(),
            role: Role::Partner,
            company: Some("Obras Ltda".to_string()),
        }
    }

    #[test]
    fn unknown_role_names_are_unrecognized() {
        let identity: Identity = serde_json::from_str(
            r#"{"id": 9, "email": "x@y.com", "role": "superuser", "name": "X"}"#,
        )
        .unwrap();

        assert_eq!(identity.id, "9");
        assert_eq!(identity.role, Role::Unrecognized);
        assert_eq!(identity.role.dashboard_path(), None);
    }

    #[test]
    fn every_known_role_has_a_dashboard() {
        assert_eq!(Role::Admin.dashboard_path(), Some("/admin"));
        assert_eq!(Role::Partner.dashboard_path(), Some("/partner"));
        assert_eq!(Role::Client.dashboard_path(), Some("/client"));
    }

    #[test]
    fn registration_rules() {
        assert!(partner_form().validate().is_ok());

        let mut form = partner_form();
        form.company = None;
        assert!(form.validate().is_err());

        let mut form = partner_form();
        form.role = Role::Client;
        form.company = None;
        assert!(form.validate().is_ok());

        let mut form = partner_form();
        form.confirm_password = "outro".to_string();
        assert_eq!(form.validate().unwrap_err(), "passwords do not match");

        let mut form = partner_form();
        form.password = "12345".to_string();
        form.confirm_password = "12345".to_string();
        assert!(form.validate().is_err());

        let mut form = partner_form();
        form.role = Role::Admin;
        assert!(form.validate().is_err());
    }

    #[test]
    fn confirmation_is_not_sent_upstream() {
        let body = serde_json::to_value(partner_form()).unwrap();

        assert!(body.get("confirmPassword").is_none());
        assert_eq!(body["role"], "partner");
    }
}
