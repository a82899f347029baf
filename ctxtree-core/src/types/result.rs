use crate::ContextError;
use std::result::Result;

pub type ContextResult<T> = Result<T, ContextError>;
