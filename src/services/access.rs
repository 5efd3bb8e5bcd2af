use super::ServiceError;
use crate::models::session::Session;
use crate::models::users::{Identity, Role};

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug)]
pub enum AccessDecision {
    /// The session is still being restored; nothing is decided yet.
    Loading,
    Allow(Identity),
    Redirect {
        location: &'static str,
        cause: ServiceError,
    },
}

/// Decides what a navigation to a view guarded by `required` resolves to.
///
/// A wrong role is sent to its own dashboard rather than shown an error, and
/// a role without a dashboard is sent to the login page.
pub fn authorize(required: Option<Role>, session: &Session) -> AccessDecision {
    if session.loading {
        return AccessDecision::Loading;
    }

    let Some(identity) = &session.identity else {
        return AccessDecision::Redirect {
            location: LOGIN_PATH,
            cause: ServiceError::Unauthenticated,
        };
    };

    match required {
        Some(role) if identity.role != role => AccessDecision::Redirect {
            location: identity.role.dashboard_path().unwrap_or(LOGIN_PATH),
            cause: ServiceError::WrongRole(identity.role),
        },
        _ => AccessDecision::Allow(identity.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 3] = [Role::Admin, Role::Partner, Role::Client];

    fn session_for(role: Role) -> Session {
        Session::authenticated(Identity {
            id: "1".to_string(),
            email: "someone@test".to_string(),
            display_name: "Someone".to_string(),
            role,
        })
    }

    fn location(decision: AccessDecision) -> Option<&'static str> {
        match decision {
            AccessDecision::Redirect { location, .. } => Some(location),
            _ => None,
        }
    }

    #[test]
    fn matching_role_is_allowed() {
        for role in ROLES {
            assert!(matches!(
                authorize(Some(role), &session_for(role)),
                AccessDecision::Allow(identity) if identity.role == role
            ));
        }
    }

    #[test]
    fn other_roles_go_to_their_own_dashboard() {
        for role in ROLES {
            for required in ROLES.into_iter().filter(|r| *r != role) {
                let decision = authorize(Some(required), &session_for(role));
                assert_eq!(location(decision), role.dashboard_path());
            }
        }
    }

    #[test]
    fn admin_on_a_client_view_lands_on_admin() {
        let decision = authorize(Some(Role::Client), &session_for(Role::Admin));

        assert!(matches!(
            decision,
            AccessDecision::Redirect {
                location: "/admin",
                cause: ServiceError::WrongRole(Role::Admin)
            }
        ));
    }

    #[test]
    fn unauthenticated_always_goes_to_login() {
        for required in ROLES.map(Some).into_iter().chain([None]) {
            let decision = authorize(required, &Session::unauthenticated());
            assert!(matches!(
                decision,
                AccessDecision::Redirect {
                    location: LOGIN_PATH,
                    cause: ServiceError::Unauthenticated
                }
            ));
        }
    }

    #[test]
    fn loading_defers_the_decision() {
        assert!(matches!(
            authorize(Some(Role::Admin), &Session::loading()),
            AccessDecision::Loading
        ));
    }

    #[test]
    fn any_authenticated_user_passes_an_unrestricted_guard() {
        let decision = authorize(None, &session_for(Role::Unrecognized));
        assert!(matches!(decision, AccessDecision::Allow(_)));
    }

    #[test]
    fn unmapped_role_falls_back_to_login() {
        let decision = authorize(Some(Role::Partner), &session_for(Role::Unrecognized));
        assert_eq!(location(decision), Some(LOGIN_PATH));
    }
}
