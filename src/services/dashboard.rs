use chrono::NaiveDate;
use serde::Serialize;

use super::ServiceError;

/// What a dashboard view renders.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState<T> {
    Loading,
    Ready { data: T },
    /// The fetch failed; `data` is the empty default so the view still renders.
    Failed { error: String, data: T },
}

impl<T: Default> ViewState<T> {
    /// Turns a view result into its rendered state. Only a rejected session
    /// escapes as an error, since it has to end the session.
    pub fn resolve(view: &str, result: Result<T, ServiceError>) -> Result<Self, ServiceError> {
        match result {
            Ok(data) => Ok(ViewState::Ready { data }),
            Err(ServiceError::Unauthenticated) => Err(ServiceError::Unauthenticated),
            Err(e) => {
                log::error!("Failed to load {} view: {}", view, e);
                Ok(ViewState::Failed {
                    error: e.to_string(),
                    data: T::default(),
                })
            }
        }
    }
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_render_empty_data() {
        let state = ViewState::<Vec<u32>>::resolve(
            "listing",
            Err(ServiceError::DataFetch("referrals".to_string(), "timeout".to_string())),
        )
        .unwrap();

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["data"], serde_json::json!([]));
        assert_eq!(json["error"], "Could not load referrals: timeout");
    }

    #[test]
    fn rejected_sessions_escape() {
        let result = ViewState::<Vec<u32>>::resolve("listing", Err(ServiceError::Unauthenticated));
        assert!(matches!(result, Err(ServiceError::Unauthenticated)));
    }

    #[test]
    fn ready_and_loading_shapes() {
        let ready = ViewState::resolve("listing", Ok(vec![1u32, 2])).unwrap();
        assert_eq!(
            serde_json::to_value(&ready).unwrap(),
            serde_json::json!({"state": "ready", "data": [1, 2]})
        );

        let loading = ViewState::<()>::Loading;
        assert_eq!(
            serde_json::to_value(&loading).unwrap(),
            serde_json::json!({"state": "loading"})
        );
    }
}
