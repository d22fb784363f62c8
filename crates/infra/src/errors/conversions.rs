//! Conversions from external infrastructure errors into domain errors.

use imds_tagger_domain::TaggerError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TaggerError);

impl From<InfraError> for TaggerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TaggerError> for InfraError {
    fn from(value: TaggerError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoTaggerError {
    fn into_tagger(self) -> TaggerError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TaggerError */
/* -------------------------------------------------------------------------- */

impl IntoTaggerError for HttpError {
    fn into_tagger(self) -> TaggerError {
        if self.is_timeout() {
            return TaggerError::Transport("metadata request timed out".into());
        }

        if self.is_connect() {
            return TaggerError::Transport(format!("metadata endpoint unreachable: {self}"));
        }

        if self.is_decode() {
            return TaggerError::Decode(format!("unreadable metadata response: {self}"));
        }

        if let Some(status) = self.status() {
            return TaggerError::Transport(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        if self.is_builder() {
            return TaggerError::Config(format!("invalid metadata request: {self}"));
        }

        TaggerError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_tagger())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → TaggerError */
/* -------------------------------------------------------------------------- */

impl IntoTaggerError for JsonError {
    fn into_tagger(self) -> TaggerError {
        TaggerError::Decode(format!("invalid metadata document: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_tagger())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_500_maps_to_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::INTERNAL_SERVER_ERROR))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: TaggerError = InfraError::from(error).into();
        match mapped {
            TaggerError::Transport(msg) => assert!(msg.contains("500")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: TaggerError = InfraError::from(error).into();
        assert!(matches!(mapped, TaggerError::Transport(_)), "got {mapped:?}");
    }

    #[test]
    fn json_error_maps_to_decode_error() {
        let error = serde_json::from_str::<serde_json::Value>("{\"location\":").unwrap_err();
        let mapped: TaggerError = InfraError::from(error).into();
        assert!(matches!(mapped, TaggerError::Decode(ref msg) if msg.contains("invalid metadata")));
    }
}
