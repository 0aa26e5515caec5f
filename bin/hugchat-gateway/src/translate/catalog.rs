use crate::schemas::v1::models::ModelInfo;

/// Appended to a native model id to advertise its web-search variant.
pub const WEB_SEARCH_SUFFIX: &str = "-internet";

pub const OWNED_BY: &str = "huggingface";

/// Advertised catalog: every native model as-is, then every native model
/// again with [`WEB_SEARCH_SUFFIX`], both halves in backend order.
pub fn advertise(native: &[String], created: i64) -> Vec<ModelInfo> {
    let entry = |id: String| ModelInfo {
        id,
        object: "model".to_owned(),
        created,
        owned_by: OWNED_BY.to_owned(),
    };

    native
        .iter()
        .cloned()
        .chain(native.iter().map(|id| format!("{id}{WEB_SEARCH_SUFFIX}")))
        .map(entry)
        .collect()
}
