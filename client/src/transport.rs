//! HTTPS transport adapter.
//!
//! A thin wrapper over blocking GET requests. Status codes are mapped to
//! typed errors before the body is touched; only a 200 body is ever handed
//! to the verifier.

use {
    crate::error::Error,
    log::debug,
    reqwest::{blocking, StatusCode},
    std::time::Duration,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub(crate) struct Transport {
    http: blocking::Client,
    api_base: String,
}

impl Transport {
    pub(crate) fn new(api_base: impl Into<String>) -> Result<Self, Error> {
        let http = blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::RequestFailed)?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        })
    }

    /// GET `{api_base}/{path_and_query}` and return the body bytes of a 200
    /// response. Every other status maps to its error kind without the body
    /// being read.
    pub(crate) fn get(&self, path_and_query: &str) -> Result<Vec<u8>, Error> {
        let url = format!("{}/{path_and_query}", self.api_base);
        debug!("GET {url}");

        let response = self.http.get(&url).send().map_err(Error::RequestFailed)?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::BAD_REQUEST => return Err(Error::BadRequest),
            StatusCode::UNAUTHORIZED => return Err(Error::Unauthorized),
            StatusCode::NOT_FOUND => return Err(Error::AppNotFound),
            StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimited),
            StatusCode::SERVICE_UNAVAILABLE => return Err(Error::AppPaused),
            status => return Err(Error::ServerError(status.as_u16())),
        }

        let body = response.bytes().map_err(Error::RequestFailed)?;
        Ok(body.to_vec())
    }
}
