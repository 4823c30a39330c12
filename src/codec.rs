//! Кодек payload задач.
//!
//! Движок работает со структурированным значением [`Value`]
//! (`serde_json::Value`), а брокер хранит непрозрачные байты. По умолчанию
//! используется MessagePack.

use bytes::Bytes;
use leasehold_error::CodecError;

/// Структурированное значение payload, которое видят обработчики.
pub type Value = serde_json::Value;

/// Преобразование payload между байтами брокера и [`Value`].
pub trait PayloadCodec: Send + Sync + 'static {
    fn encode(
        &self,
        value: &Value,
    ) -> Result<Bytes, CodecError>;

    fn decode(
        &self,
        bytes: &[u8],
    ) -> Result<Value, CodecError>;
}

/// MessagePack через `rmp-serde` (именованные поля).
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgPackCodec;

/// JSON через `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl PayloadCodec for MsgPackCodec {
    fn encode(
        &self,
        value: &Value,
    ) -> Result<Bytes, CodecError> {
        rmp_serde::to_vec_named(value)
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode {
                reason: e.to_string(),
            })
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> Result<Value, CodecError> {
        // Пустой payload: задача без данных.
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode {
            reason: e.to_string(),
        })
    }
}

impl PayloadCodec for JsonCodec {
    fn encode(
        &self,
        value: &Value,
    ) -> Result<Bytes, CodecError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode {
                reason: e.to_string(),
            })
    }

    fn decode(
        &self,
        bytes: &[u8],
    ) -> Result<Value, CodecError> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            reason: e.to_string(),
        })
    }
}
