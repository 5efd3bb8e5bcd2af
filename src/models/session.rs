use serde::Serialize;

use super::users::Identity;

/// The portal's single authentication state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Session {
    pub identity: Option<Identity>,
    pub loading: bool,
}

impl Session {
    pub fn loading() -> Self {
        Session {
            identity: None,
            loading: true,
        }
    }

    pub fn unauthenticated() -> Self {
        Session {
            identity: None,
            loading: false,
        }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Session {
            identity: Some(identity),
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}
