use image::DynamicImage;
use reqwest::blocking::Client;
use std::time::Duration;

use crate::error::{AppError, Result};

use super::payload::{Prediction, UploadRequest, decode_prediction};
use super::{MaskConfigs, MaskPredictor, UploadError};

/// Blocking HTTP client for a remote instance-segmentation server
#[derive(Debug)]
pub struct HttpMaskClient {
    client: Client,
    url: String,
}

impl HttpMaskClient {
    pub fn new(configs: &MaskConfigs) -> Result<Self> {
        let mut builder = Client::builder();
        if !configs.use_system_proxy {
            builder = builder.no_proxy();
        }
        // `None` disables the client's built-in default timeout as well
        let client = builder
            .timeout(configs.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            url: configs.url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl MaskPredictor for HttpMaskClient {
    fn predict(&self, image: &DynamicImage) -> Result<Prediction, UploadError> {
        let request = UploadRequest::from_image(image)?;

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(UploadError::Connection)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        let body = response.text().map_err(UploadError::Connection)?;
        decode_prediction(&body)
    }
}
