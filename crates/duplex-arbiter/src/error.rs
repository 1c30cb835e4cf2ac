use thiserror::Error;

pub type Result<T, E = ArbiterError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("arbiter event channel closed")]
    ChannelClosed,
}
