use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("pod has neither a name nor a generateName")]
    MissingIdentity,

    #[error(
        "node {0} carries neither kubernetes.io/hostname nor node.kubernetes.io/instance-type"
    )]
    MissingNodeLabels(String),

    #[error("invalid quantity {value:?} for {field}")]
    InvalidQuantity { field: String, value: String },

    #[error("{resource} request {request} exceeds limit {limit}")]
    RequestExceedsLimit {
        resource: &'static str,
        request: f64,
        limit: f64,
    },
}
