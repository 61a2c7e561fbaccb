//! Object-graph mapping: the collaborator interface between domain objects
//! and messages.
//!
//! Reflection in the original maps to a registry of capability providers
//! keyed on the target type: each provider implements the
//! [`MessageBuilder`] pair `{build_message, build_object}`. The serializer
//! and deserializer are thin lookups over that registry; the vector builder
//! delegates element building and coerces the collected list.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::marker::PhantomData;

use crate::context::FudgeContext;
use crate::error::FudgeError;
use crate::message::{Field, FudgeMsg};
use crate::types::FieldValue;
use crate::wire::{FudgeMsgReader, FudgeMsgWriter};

/// The capability pair for one target type: build a message that encodes the
/// object's properties by name, and build an object back from such a
/// message.
pub trait MessageBuilder<T>: Send + Sync {
    fn build_message(&self, serializer: &FudgeSerializer, obj: &T) -> Result<FudgeMsg, FudgeError>;
    fn build_object(&self, deserializer: &FudgeDeserializer, msg: &FudgeMsg)
        -> Result<T, FudgeError>;
}

type BoxedBuilder<T> = Box<dyn MessageBuilder<T>>;

/// Registry of message builders keyed on the target type.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static>(&mut self, builder: impl MessageBuilder<T> + 'static) {
        let boxed: BoxedBuilder<T> = Box::new(builder);
        self.builders.insert(TypeId::of::<T>(), Box::new(boxed));
    }

    pub fn get<T: 'static>(&self) -> Option<&dyn MessageBuilder<T>> {
        self.builders
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<BoxedBuilder<T>>())
            .map(Box::as_ref)
    }
}

/// Serializes domain objects to messages through the registry.
pub struct FudgeSerializer<'a> {
    context: &'a FudgeContext,
    registry: &'a BuilderRegistry,
}

impl<'a> FudgeSerializer<'a> {
    pub fn new(context: &'a FudgeContext, registry: &'a BuilderRegistry) -> Self {
        Self { context, registry }
    }

    pub fn context(&self) -> &FudgeContext {
        self.context
    }

    /// Builds a message encoding the object's properties by name.
    pub fn serialize<T: 'static>(&self, obj: &T) -> Result<FudgeMsg, FudgeError> {
        let builder = self.registry.get::<T>().ok_or_else(|| {
            FudgeError::TypeMismatch(format!(
                "no message builder registered for {}",
                std::any::type_name::<T>()
            ))
        })?;
        builder.build_message(self, obj)
    }

    /// Adds a value to a message under construction.
    pub fn add_to_message(
        &self,
        msg: &mut FudgeMsg,
        name: Option<&str>,
        ordinal: Option<i16>,
        value: FieldValue,
    ) -> Result<(), FudgeError> {
        msg.add_full(name, ordinal, value)
    }
}

/// Deserializes domain objects from messages through the registry.
pub struct FudgeDeserializer<'a> {
    context: &'a FudgeContext,
    registry: &'a BuilderRegistry,
}

impl<'a> FudgeDeserializer<'a> {
    pub fn new(context: &'a FudgeContext, registry: &'a BuilderRegistry) -> Self {
        Self { context, registry }
    }

    pub fn context(&self) -> &FudgeContext {
        self.context
    }

    /// Produces an instance of `T` by matching field names to its
    /// properties.
    pub fn deserialize<T: 'static>(&self, msg: &FudgeMsg) -> Result<T, FudgeError> {
        let builder = self.registry.get::<T>().ok_or_else(|| {
            FudgeError::TypeMismatch(format!(
                "no message builder registered for {}",
                std::any::type_name::<T>()
            ))
        })?;
        builder.build_object(self, msg)
    }

    /// Interprets a field value as a sub-object of type `T`.
    pub fn field_to_object<T: 'static>(&self, field: &Field) -> Result<T, FudgeError> {
        match field.value() {
            FieldValue::Message(msg) => self.deserialize(msg),
            other => Err(FudgeError::TypeMismatch(format!(
                "expected a sub-message field, got {other}"
            ))),
        }
    }
}

/// Builder for vectors: elements are encoded as anonymous sub-message fields
/// in sequence; decoding delegates element building and collects the list.
pub struct VecBuilder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for VecBuilder<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> VecBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: 'static> MessageBuilder<Vec<T>> for VecBuilder<T> {
    fn build_message(
        &self,
        serializer: &FudgeSerializer,
        obj: &Vec<T>,
    ) -> Result<FudgeMsg, FudgeError> {
        let mut msg = FudgeMsg::new();
        for entry in obj {
            let encoded = serializer.serialize(entry)?;
            serializer.add_to_message(&mut msg, None, None, FieldValue::Message(encoded))?;
        }
        Ok(msg)
    }

    fn build_object(
        &self,
        deserializer: &FudgeDeserializer,
        msg: &FudgeMsg,
    ) -> Result<Vec<T>, FudgeError> {
        msg.iter()
            .map(|field| deserializer.field_to_object(field))
            .collect()
    }
}

/// Reads serialized objects from an underlying stream of messages.
pub struct FudgeObjectReader<'a, R: Read> {
    reader: FudgeMsgReader<R>,
    deserializer: FudgeDeserializer<'a>,
}

impl<'a, R: Read> FudgeObjectReader<'a, R> {
    pub fn new(
        context: &'a FudgeContext,
        registry: &'a BuilderRegistry,
        transport: R,
    ) -> Self {
        Self {
            reader: FudgeMsgReader::new(context.clone(), transport),
            deserializer: FudgeDeserializer::new(context, registry),
        }
    }

    pub fn has_next(&mut self) -> Result<bool, FudgeError> {
        self.reader.has_next()
    }

    /// Reads the next message and deserializes it to `T`, or `None` at a
    /// clean end of stream.
    pub fn read<T: 'static>(&mut self) -> Result<Option<T>, FudgeError> {
        match self.reader.next_message()? {
            Some(msg) => Ok(Some(self.deserializer.deserialize(&msg)?)),
            None => Ok(None),
        }
    }

    pub fn close(&mut self) -> Result<(), FudgeError> {
        self.reader.close()
    }
}

/// Writes serialized objects to an underlying stream of messages.
pub struct FudgeObjectWriter<'a, W: Write> {
    writer: FudgeMsgWriter<W>,
    serializer: FudgeSerializer<'a>,
}

impl<'a, W: Write> FudgeObjectWriter<'a, W> {
    pub fn new(
        context: &'a FudgeContext,
        registry: &'a BuilderRegistry,
        transport: W,
    ) -> Self {
        Self {
            writer: FudgeMsgWriter::new(context.clone(), transport),
            serializer: FudgeSerializer::new(context, registry),
        }
    }

    /// Serializes the object and writes it as one envelope.
    pub fn write<T: 'static>(&mut self, obj: &T) -> Result<(), FudgeError> {
        let msg = self.serializer.serialize(obj)?;
        self.writer.write_message(&msg, 0)
    }

    pub fn close(&mut self) -> Result<(), FudgeError> {
        self.writer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tick {
        symbol: String,
        price: f64,
        size: i64,
    }

    struct TickBuilder;

    impl MessageBuilder<Tick> for TickBuilder {
        fn build_message(
            &self,
            serializer: &FudgeSerializer,
            obj: &Tick,
        ) -> Result<FudgeMsg, FudgeError> {
            let mut msg = FudgeMsg::new();
            serializer.add_to_message(
                &mut msg,
                Some("symbol"),
                None,
                FieldValue::Str(obj.symbol.clone()),
            )?;
            serializer.add_to_message(&mut msg, Some("price"), None, obj.price.into())?;
            serializer.add_to_message(&mut msg, Some("size"), None, obj.size.into())?;
            Ok(msg)
        }

        fn build_object(
            &self,
            _deserializer: &FudgeDeserializer,
            msg: &FudgeMsg,
        ) -> Result<Tick, FudgeError> {
            Ok(Tick {
                symbol: msg
                    .get_str("symbol")
                    .ok_or_else(|| FudgeError::TypeMismatch("missing symbol".to_owned()))?
                    .to_owned(),
                price: msg
                    .get_f64("price")
                    .ok_or_else(|| FudgeError::TypeMismatch("missing price".to_owned()))?,
                size: msg
                    .get_i64("size")
                    .ok_or_else(|| FudgeError::TypeMismatch("missing size".to_owned()))?,
            })
        }
    }

    fn registry() -> BuilderRegistry {
        let mut registry = BuilderRegistry::new();
        registry.register(TickBuilder);
        registry.register(VecBuilder::<Tick>::new());
        registry
    }

    fn tick() -> Tick {
        Tick {
            symbol: "ACME".to_owned(),
            price: 101.25,
            size: 300,
        }
    }

    #[test]
    fn objects_round_trip_through_messages() {
        let context = FudgeContext::new();
        let registry = registry();
        let serializer = FudgeSerializer::new(&context, &registry);
        let deserializer = FudgeDeserializer::new(&context, &registry);
        let msg = serializer.serialize(&tick()).unwrap();
        assert_eq!(msg.get_str("symbol"), Some("ACME"));
        let back: Tick = deserializer.deserialize(&msg).unwrap();
        assert_eq!(back, tick());
    }

    #[test]
    fn vectors_encode_as_anonymous_submessages() {
        let context = FudgeContext::new();
        let registry = registry();
        let serializer = FudgeSerializer::new(&context, &registry);
        let deserializer = FudgeDeserializer::new(&context, &registry);
        let ticks = vec![tick(), Tick {
            symbol: "WIDG".to_owned(),
            price: 7.5,
            size: 10,
        }];
        let msg = serializer.serialize(&ticks).unwrap();
        assert_eq!(msg.len(), 2);
        assert!(msg.iter().all(|f| f.name().is_none() && f.ordinal().is_none()));
        let back: Vec<Tick> = deserializer.deserialize(&msg).unwrap();
        assert_eq!(back, ticks);
    }

    #[test]
    fn unregistered_types_surface_a_type_mismatch() {
        let context = FudgeContext::new();
        let registry = BuilderRegistry::new();
        let serializer = FudgeSerializer::new(&context, &registry);
        let err = serializer.serialize(&tick()).unwrap_err();
        assert!(matches!(err, FudgeError::TypeMismatch(_)));
    }

    #[test]
    fn object_reader_and_writer_stream_envelopes() {
        let context = FudgeContext::new();
        let registry = registry();
        let mut out = Vec::new();
        {
            let mut writer = FudgeObjectWriter::new(&context, &registry, &mut out);
            writer.write(&tick()).unwrap();
            writer.write(&tick()).unwrap();
            writer.close().unwrap();
        }
        let mut reader = FudgeObjectReader::new(&context, &registry, out.as_slice());
        let first: Tick = reader.read().unwrap().unwrap();
        let second: Tick = reader.read().unwrap().unwrap();
        assert_eq!(first, tick());
        assert_eq!(second, tick());
        assert!(reader.read::<Tick>().unwrap().is_none());
        reader.close().unwrap();
    }
}
