//! Nullable column adapter.

use crate::error::CodecResult;
use crate::value::ColumnValue;
use crate::{FieldCodec, Storage};

/// Wraps a codec so that `None` is stored as SQL `NULL`.
///
/// `NULL` decodes to `None` without consulting the inner codec; every other
/// column value is handed to it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nullable<C> {
    inner: C,
}

impl<C> Nullable<C> {
    /// Wraps `inner`.
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Returns the wrapped codec.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C> FieldCodec for Nullable<C>
where
    C: FieldCodec,
    C::Input: Sized,
{
    type Input = Option<C::Input>;
    type Output = Option<C::Output>;

    fn storage(&self) -> Storage {
        self.inner.storage()
    }

    fn encode(&self, value: &Self::Input) -> CodecResult<ColumnValue> {
        match value {
            Some(value) => self.inner.encode(value),
            None => Ok(ColumnValue::Null),
        }
    }

    fn decode(&self, column: &ColumnValue) -> CodecResult<Self::Output> {
        match column {
            ColumnValue::Null => Ok(None),
            other => self.inner.decode(other).map(Some),
        }
    }
}
