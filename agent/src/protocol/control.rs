//! The control/poll response (`ControlResponse`).

use serde::Deserialize;

/// Top-level document returned by `GET <BASE>/<board>-<devid>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlResponse {
    pub config: Option<PollingConfig>,
    #[serde(rename = "_links", default)]
    pub links: Option<ControlLinks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub polling: Option<Polling>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Polling {
    /// Strictly `HH:MM:SS`, 8 characters; see [`crate::descriptor::decode_sleep_seconds`].
    pub sleep: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlLinks {
    #[serde(rename = "cancelAction")]
    pub cancel_action: Option<Link>,
    #[serde(rename = "configData")]
    pub config_data: Option<Link>,
    #[serde(rename = "deploymentBase")]
    pub deployment_base: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_no_update_response() {
        let body = r#"{"config":{"polling":{"sleep":"00:05:00"}},"_links":{}}"#;
        let control: ControlResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            control.config.unwrap().polling.unwrap().sleep.as_deref(),
            Some("00:05:00")
        );
        assert!(control.links.unwrap().deployment_base.is_none());
    }

    #[test]
    fn decodes_cancel_link() {
        let body = r#"{"_links":{"cancelAction":{"href":"https://example.invalid/cancelAction/7"}}}"#;
        let control: ControlResponse = serde_json::from_str(body).unwrap();
        let links = control.links.unwrap();
        assert_eq!(
            links.cancel_action.unwrap().href,
            "https://example.invalid/cancelAction/7"
        );
    }
}
