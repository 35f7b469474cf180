use crate::error::Error as EsaErr;
pub type Result<T> = std::result::Result<T, EsaErr>;
