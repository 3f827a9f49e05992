use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::UploadError;

/// Request body: `{"image": "<base64 PNG>"}`
#[derive(Debug, Serialize)]
pub struct UploadRequest {
    pub image: String,
}

/// Response body: `[vis_png_b64, boxes, labels, scores, [mask_png_b64, ...]]`
#[derive(Debug, Deserialize)]
struct PredictionResponse(String, Vec<[f32; 4]>, Vec<i64>, Vec<f32>, Vec<String>);

/// Decoded server answer for one image
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Server-side rendering of the detections
    pub visualization: RgbImage,

    /// `[x1, y1, x2, y2]` per instance
    pub boxes: Vec<[f32; 4]>,

    pub labels: Vec<i64>,

    pub scores: Vec<f32>,

    /// One binary mask per instance
    pub masks: Vec<GrayImage>,
}

impl UploadRequest {
    pub fn from_image(img: &DynamicImage) -> Result<Self, UploadError> {
        Ok(Self {
            image: encode_png_base64(img)?,
        })
    }
}

pub fn encode_png_base64(img: &DynamicImage) -> Result<String, UploadError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| UploadError::Encode(e.to_string()))?;
    Ok(STANDARD.encode(buffer))
}

fn decode_png_base64(data: &str) -> Result<DynamicImage, UploadError> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| UploadError::ImageDecode(e.to_string()))?;
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| UploadError::ImageDecode(e.to_string()))
}

/// Parse and decode a response body.
///
/// # Errors
///
/// - `EmptyResponse` if the body is blank
/// - `MalformedResponse` if the body is not the expected 5-element array
/// - `ImageDecode` if an embedded PNG cannot be decoded
pub fn decode_prediction(body: &str) -> Result<Prediction, UploadError> {
    if body.trim().is_empty() {
        return Err(UploadError::EmptyResponse);
    }

    let PredictionResponse(vis, boxes, labels, scores, masks) =
        serde_json::from_str(body).map_err(|e| UploadError::MalformedResponse(e.to_string()))?;

    if labels.len() != boxes.len() || scores.len() != boxes.len() || masks.len() != boxes.len() {
        return Err(UploadError::MalformedResponse(format!(
            "{} boxes, {} labels, {} scores and {} masks",
            boxes.len(),
            labels.len(),
            scores.len(),
            masks.len()
        )));
    }

    let visualization = decode_png_base64(&vis)?.to_rgb8();
    let masks = masks
        .iter()
        .map(|m| decode_png_base64(m).map(|img| img.to_luma8()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Prediction {
        visualization,
        boxes,
        labels,
        scores,
        masks,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Luma;

    /// A valid response body with one 4x4 instance mask
    pub(crate) fn sample_response_body() -> String {
        let vis = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([9, 9, 9])));
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(1, 1, Luma([1]));
        mask.put_pixel(2, 1, Luma([1]));

        serde_json::json!([
            encode_png_base64(&vis).unwrap(),
            [[0.5, 0.5, 3.0, 2.0]],
            [47],
            [0.93],
            [encode_png_base64(&DynamicImage::ImageLuma8(mask)).unwrap()],
        ])
        .to_string()
    }

    #[test]
    fn test_decode_valid_response() {
        let prediction = decode_prediction(&sample_response_body()).unwrap();
        assert_eq!(prediction.visualization.dimensions(), (4, 4));
        assert_eq!(prediction.boxes, vec![[0.5, 0.5, 3.0, 2.0]]);
        assert_eq!(prediction.labels, vec![47]);
        assert_eq!(prediction.masks.len(), 1);
        assert_eq!(prediction.masks[0].get_pixel(1, 1).0, [1]);
        assert_eq!(prediction.masks[0].get_pixel(0, 0).0, [0]);
    }

    #[test]
    fn test_request_round_trips_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3])));
        let request = UploadRequest::from_image(&img).unwrap();
        let decoded = decode_png_base64(&request.image).unwrap();
        assert_eq!(decoded.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_empty_body() {
        assert!(matches!(
            decode_prediction("  \n"),
            Err(UploadError::EmptyResponse)
        ));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        assert!(matches!(
            decode_prediction(r#"{"error": "boom"}"#),
            Err(UploadError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_prediction(r#"["", [[0, 0, 1, 1]], [], [], []]"#),
            Err(UploadError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_bad_image_data() {
        assert!(matches!(
            decode_prediction(r#"["bm90IGEgcG5n", [], [], [], []]"#),
            Err(UploadError::ImageDecode(_))
        ));
    }
}
