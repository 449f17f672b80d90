//! Request payload decoders selected by content type.

use crate::common::*;
use ndarray_npy::ReadNpyExt as _;

pub const CONTENT_TYPE_NPY: &str = "application/x-npy";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CSV: &str = "text/csv";
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";
pub const CONTENT_TYPE_PNG: &str = "image/png";
pub const CONTENT_TYPE_IMAGE: &str = "application/x-image";

/// Decodes a payload into a numeric array.
pub type DecodeFn = fn(&[u8]) -> Result<ArrayD<f32>>;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),
}

static DECODERS: Lazy<HashMap<&'static str, DecodeFn>> = Lazy::new(|| {
    let mut decoders: HashMap<&'static str, DecodeFn> = HashMap::new();
    decoders.insert(CONTENT_TYPE_NPY, decode_npy);
    decoders.insert(CONTENT_TYPE_JSON, decode_json);
    decoders.insert(CONTENT_TYPE_CSV, decode_csv);
    decoders.insert(CONTENT_TYPE_JPEG, decode_image);
    decoders.insert(CONTENT_TYPE_PNG, decode_image);
    decoders.insert(CONTENT_TYPE_IMAGE, decode_image);
    decoders
});

/// The content types with a registered decoder.
pub fn supported_content_types() -> Vec<&'static str> {
    let mut types: Vec<_> = DECODERS.keys().copied().collect();
    types.sort_unstable();
    types
}

/// Decodes `payload` with the decoder registered for `content_type`.
///
/// Media type parameters such as `; charset=utf-8` are ignored and the
/// comparison is case insensitive.
pub fn decode(payload: &[u8], content_type: &str) -> Result<ArrayD<f32>> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    let decoder = DECODERS
        .get(media_type.as_str())
        .ok_or_else(|| DecodeError::UnsupportedContentType(content_type.to_owned()))?;
    decoder(payload).with_context(|| format!("failed to decode '{}' payload", media_type))
}

fn decode_npy(payload: &[u8]) -> Result<ArrayD<f32>> {
    if let Ok(array) = ArrayD::<f32>::read_npy(payload) {
        return Ok(array);
    }
    if let Ok(array) = ArrayD::<u8>::read_npy(payload) {
        return Ok(array.mapv(f32::from));
    }
    if let Ok(array) = ArrayD::<f64>::read_npy(payload) {
        return Ok(array.mapv(|value| value as f32));
    }
    if let Ok(array) = ArrayD::<i32>::read_npy(payload) {
        return Ok(array.mapv(|value| value as f32));
    }
    let array = ArrayD::<i64>::read_npy(payload)
        .context("expect an npy array of u8, i32, i64, f32 or f64 elements")?;
    Ok(array.mapv(|value| value as f32))
}

fn decode_json(payload: &[u8]) -> Result<ArrayD<f32>> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    let mut shape = vec![];
    let mut data = vec![];
    flatten_json(&value, 0, &mut shape, &mut data)?;
    let array = ArrayD::from_shape_vec(IxDyn(&shape), data)?;
    Ok(array)
}

/// Collects the elements of a nested JSON array. The length of each nesting
/// level is recorded on first visit and must agree for all siblings.
fn flatten_json(
    value: &serde_json::Value,
    depth: usize,
    shape: &mut Vec<usize>,
    data: &mut Vec<f32>,
) -> Result<()> {
    use serde_json::Value;

    match value {
        Value::Number(number) => {
            ensure!(depth == shape.len(), "ragged nested array");
            let number = number
                .as_f64()
                .ok_or_else(|| format_err!("invalid number {}", number))?;
            data.push(number as f32);
        }
        Value::Array(values) => {
            match shape.get(depth) {
                Some(&len) => ensure!(len == values.len(), "ragged nested array"),
                None => {
                    ensure!(depth == shape.len() && data.is_empty(), "ragged nested array");
                    shape.push(values.len());
                }
            }
            values
                .iter()
                .try_for_each(|value| flatten_json(value, depth + 1, shape, data))?;
        }
        other => bail!("expect a number or an array, but get {}", other),
    }

    Ok(())
}

fn decode_csv(payload: &[u8]) -> Result<ArrayD<f32>> {
    let rows: Vec<Vec<f32>> = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(payload)
        .records()
        .map(|record| -> Result<_> {
            let row: Vec<f32> = record?
                .iter()
                .map(|field| field.parse::<f32>())
                .try_collect()?;
            Ok(row)
        })
        .try_collect()?;

    let num_cols = rows.first().map(|row| row.len()).unwrap_or(0);
    ensure!(num_cols > 0, "empty csv payload");
    ensure!(
        rows.iter().all(|row| row.len() == num_cols),
        "csv rows have different lengths"
    );

    let num_rows = rows.len();
    let data: Vec<f32> = rows.into_iter().flatten().collect();
    let array = ArrayD::from_shape_vec(IxDyn(&[num_rows, num_cols]), data)?;
    Ok(array)
}

/// Decodes an encoded image into an HWC array in BGR order.
fn decode_image(payload: &[u8]) -> Result<ArrayD<f32>> {
    let image = image::load_from_memory(payload)?.to_rgb8();
    let (width, height) = image.dimensions();
    let array = Array3::from_shape_fn(
        (height as usize, width as usize, 3),
        |(y, x, c)| image.get_pixel(x as u32, y as u32).0[2 - c] as f32,
    );
    Ok(array.into_dyn())
}
