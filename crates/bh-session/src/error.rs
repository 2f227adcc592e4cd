use bh_types::Identity;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no identity available")]
    NoIdentityAvailable,

    #[error("user declined the request")]
    UserDeclined,

    #[error("identity {0} is not controlled by this provider")]
    NotControlled(Identity),
}

pub type SessionResult<T> = Result<T, IdentityError>;
